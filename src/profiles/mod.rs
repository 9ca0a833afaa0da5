//! Built-in profile repository.
//!
//! Profiles are named, read-only bundles of rules and sections applied as a
//! low-precedence baseline under a config's own declared content. The
//! built-in set is embedded into the binary at compile time; the
//! [`ProfileRepository`] trait keeps the store swappable for tests and for
//! callers shipping their own profile sets.

use crate::config::Config;
use crate::core::{Result, RulezError};

/// Read-only access to named profile bundles.
pub trait ProfileRepository: Send + Sync {
    /// Fetch a profile by name.
    ///
    /// # Errors
    ///
    /// Returns [`RulezError::ProfileNotFound`] for unknown names.
    fn get(&self, name: &str) -> Result<Config>;

    /// All names this repository provides, in a stable order.
    fn names(&self) -> Vec<String>;
}

/// The compiled-in profile set.
///
/// The `default` profile is intentionally empty: profile baselines are
/// opt-in, and a config that selects nothing must load unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedProfiles;

const BUILTIN_PROFILES: &[(&str, &str)] = &[
    ("default", include_str!("default.yaml")),
    ("golang", include_str!("golang.yaml")),
    ("python", include_str!("python.yaml")),
    ("typescript", include_str!("typescript.yaml")),
];

impl ProfileRepository for EmbeddedProfiles {
    fn get(&self, name: &str) -> Result<Config> {
        let (_, source) = BUILTIN_PROFILES
            .iter()
            .find(|(profile_name, _)| *profile_name == name)
            .ok_or_else(|| RulezError::ProfileNotFound {
                name: name.to_string(),
                available: self.names(),
            })?;

        let mut config: Config = serde_yaml::from_str(source).map_err(|e| RulezError::Parse {
            file: format!("profiles/{name}.yaml"),
            reason: e.to_string(),
        })?;
        config.apply_priority_defaults();
        Ok(config)
    }

    fn names(&self) -> Vec<String> {
        BUILTIN_PROFILES.iter().map(|(name, _)| (*name).to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_builtin_profiles_parse() {
        let repo = EmbeddedProfiles;
        for name in repo.names() {
            let profile = repo.get(&name).unwrap();
            for rule in &profile.rules {
                assert!(rule.priority >= 1, "{name}: rule {} has priority 0", rule.name);
            }
        }
    }

    #[test]
    fn default_profile_is_empty() {
        let profile = EmbeddedProfiles.get("default").unwrap();
        assert!(profile.rules.is_empty());
        assert!(profile.sections.is_empty());
    }

    #[test]
    fn unknown_profile_reports_available_names() {
        let err = EmbeddedProfiles.get("cobol").unwrap_err();
        match err {
            RulezError::ProfileNotFound { name, available } => {
                assert_eq!(name, "cobol");
                assert!(available.contains(&"python".to_string()));
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn python_profile_has_content() {
        let profile = EmbeddedProfiles.get("python").unwrap();
        assert!(!profile.rules.is_empty());
    }
}
