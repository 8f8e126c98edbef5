//! The artifact a pipeline builds and the instance it launches.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A container image produced by the build stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    /// Image repository name.
    pub name: String,
    /// Image tag.
    pub tag: String,
}

impl Artifact {
    /// Creates a new artifact reference.
    #[must_use]
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }

    /// Returns the `name:tag` reference used by the container runtime.
    #[must_use]
    pub fn reference(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

/// A running container launched from an [`Artifact`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instance {
    /// Container name.
    pub name: String,
}

impl Instance {
    /// Creates a new instance reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns true if `listing` names this instance.
    ///
    /// `listing` is the output of a container listing with one container per
    /// line. A line may hold several comma-separated names, and names may
    /// carry a leading `/`.
    #[must_use]
    pub fn is_listed_in(&self, listing: &str) -> bool {
        listing
            .lines()
            .flat_map(|line| line.split(','))
            .map(|name| name.trim().trim_start_matches('/'))
            .any(|name| name == self.name)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_reference() {
        let artifact = Artifact::new("standup", "latest");
        assert_eq!(artifact.reference(), "standup:latest");
        assert_eq!(artifact.to_string(), "standup:latest");
    }

    #[test]
    fn test_instance_listed_exact_line() {
        let instance = Instance::new("standup");
        assert!(instance.is_listed_in("redis\nstandup\n"));
        assert!(instance.is_listed_in("  standup  "));
        assert!(instance.is_listed_in("/standup"));
        assert!(instance.is_listed_in("other,standup"));
    }

    #[test]
    fn test_instance_not_listed_by_prefix() {
        let instance = Instance::new("standup");
        assert!(!instance.is_listed_in(""));
        assert!(!instance.is_listed_in("standup-db\nmy-standup"));
    }
}
