//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stagegate::config::PipelineConfig;
use stagegate::pipeline::{standard_pipeline, PipelineRunner};
use stagegate::testing::{ScriptedExecutor, ScriptedResponse};
use std::sync::Arc;

fn pipeline_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let pipeline = standard_pipeline(&PipelineConfig::default()).unwrap();

    c.bench_function("build_standard_pipeline", |b| {
        let config = PipelineConfig::default();
        b.iter(|| black_box(standard_pipeline(black_box(&config)).unwrap()));
    });

    c.bench_function("run_standard_pipeline", |b| {
        b.iter(|| {
            let executor = ScriptedExecutor::new()
                .respond("docker ps --format {{.Names}}", ScriptedResponse::stdout("standup"));
            let runner = PipelineRunner::new(Arc::new(executor));
            black_box(rt.block_on(runner.run(&pipeline)).unwrap())
        });
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
