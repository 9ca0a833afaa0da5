//! Configuration loading and resolution.
//!
//! [`ConfigLoader`] turns a file path into a fully resolved [`Config`]:
//!
//! 1. Read bytes, run the schema validator, decode YAML, default priorities.
//! 2. Merge the selected built-in profiles underneath declared content
//!    (declared always wins, profile priorities get a +10 visibility boost).
//! 3. Resolve `includes` depth-first. Later includes override earlier ones,
//!    and both override the including file's own declared content on key
//!    collision. `includes` is cleared afterwards.
//! 4. Merge a sibling `<name>.local.yaml`, if present, at highest
//!    precedence. The local file goes through the same full resolution.
//!
//! Cycle detection uses an ancestor-path stack pushed on entry and popped on
//! exit around each recursive load, so a path is only an error while it is
//! an active ancestor. Paths are lexically normalized (`.`/`..` collapsed)
//! before comparison, so two spellings of the same file close the cycle. The
//! same leaf reached from two independent branches (diamond inclusion) is
//! legal and reloaded per branch. The stack lives in the loader and is
//! threaded through `&mut self`, which also keeps the resolution pipeline
//! single-threaded by construction.
//!
//! Any error aborts the entire load; resolution is all-or-nothing.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::merge::merge;
use super::schema::{SchemaValidator, StructuralValidator};
use super::Config;
use crate::core::{Result, RulezError};
use crate::profiles::{EmbeddedProfiles, ProfileRepository};

/// Loads configuration files and resolves profiles, includes, and local
/// overrides.
pub struct ConfigLoader {
    profiles: Arc<dyn ProfileRepository>,
    validator: Arc<dyn SchemaValidator>,
    // Active ancestor paths, innermost last. Push/pop discipline around each
    // recursive load; never consulted across loads.
    ancestors: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader with the embedded profile set and the built-in
    /// structural validator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_repositories(Arc::new(EmbeddedProfiles), Arc::new(StructuralValidator))
    }

    /// Create a loader with a custom profile repository and schema validator.
    #[must_use]
    pub fn with_repositories(
        profiles: Arc<dyn ProfileRepository>,
        validator: Arc<dyn SchemaValidator>,
    ) -> Self {
        Self {
            profiles,
            validator,
            ancestors: Vec::new(),
        }
    }

    /// Load `path` and fully resolve it: profiles, includes, and the sibling
    /// `<name>.local.yaml` override when one exists.
    pub fn load(&mut self, path: &Path) -> Result<Config> {
        let abs = std::path::absolute(path).map_err(|e| RulezError::io(path, e))?;
        let abs = normalize(&abs);
        let mut config = self.load_resolved(&abs)?;

        let local_path = local_override_path(&abs);
        if local_path.exists() {
            tracing::debug!(path = %local_path.display(), "merging local override file");
            let local = self.load_resolved(&local_path)?;
            merge_local(&mut config, local);
        }

        Ok(config)
    }

    /// Load a single file without include or local-override resolution.
    ///
    /// Schema validation, priority defaulting, and profile merging still
    /// apply.
    pub fn load_file(&self, path: &Path) -> Result<Config> {
        tracing::debug!(path = %path.display(), "loading configuration file");

        let data = fs::read(path).map_err(|e| RulezError::io(path, e))?;

        self.validator
            .validate(&data)
            .map_err(|violations| RulezError::SchemaValidation {
                file: path.display().to_string(),
                violations,
            })?;

        let mut config: Config =
            serde_yaml::from_slice(&data).map_err(|e| RulezError::parse(path, &e))?;

        config.apply_priority_defaults();
        self.merge_profiles(&mut config)?;

        Ok(config)
    }

    /// Load a file and resolve its includes, guarding against cycles via the
    /// ancestor-path stack.
    fn load_resolved(&mut self, path: &Path) -> Result<Config> {
        let abs = &normalize(path);
        if self.ancestors.iter().any(|ancestor| ancestor == abs) {
            let mut chain: Vec<String> =
                self.ancestors.iter().map(|p| p.display().to_string()).collect();
            chain.push(abs.display().to_string());
            return Err(RulezError::CircularInclude {
                path: abs.display().to_string(),
                chain,
            });
        }

        self.ancestors.push(abs.to_path_buf());
        let result = self.load_with_includes(abs);
        self.ancestors.pop();
        result
    }

    fn load_with_includes(&mut self, abs: &Path) -> Result<Config> {
        let mut config = self.load_file(abs)?;
        let base_dir = abs.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        self.resolve_includes(&mut config, &base_dir)?;
        Ok(config)
    }

    /// Merge the selected profiles underneath declared content.
    ///
    /// Later profiles in the list win across profiles; declared rules and
    /// sections always win over profile content regardless of priority.
    fn merge_profiles(&self, config: &mut Config) -> Result<()> {
        let names = config.profile_names();
        tracing::trace!(profiles = ?names, "merging profiles");

        let mut profile_rule_sets = Vec::with_capacity(names.len());
        let mut profile_section_sets = Vec::with_capacity(names.len());

        for name in &names {
            let mut profile = self.profiles.get(name)?;

            // Boost keeps profile content visually prominent in output
            // without affecting merge precedence.
            for rule in &mut profile.rules {
                rule.priority = rule.priority.saturating_add(10);
            }
            for section in &mut profile.sections {
                section.priority = section.priority.saturating_add(10);
            }

            profile_rule_sets.push(profile.rules);
            profile_section_sets.push(profile.sections);
        }

        let profile_rules = merge(profile_rule_sets);
        let profile_sections = merge(profile_section_sets);

        config.rules = merge([profile_rules, std::mem::take(&mut config.rules)]);
        config.sections = merge([profile_sections, std::mem::take(&mut config.sections)]);

        Ok(())
    }

    /// Resolve every path in `includes`, depth-first and in list order, then
    /// clear the list.
    fn resolve_includes(&mut self, config: &mut Config, base_dir: &Path) -> Result<()> {
        if config.includes.is_empty() {
            return Ok(());
        }

        let includes = std::mem::take(&mut config.includes);
        let mut rule_sets = vec![std::mem::take(&mut config.rules)];
        let mut section_sets = vec![std::mem::take(&mut config.sections)];

        for include in &includes {
            let resolved = resolve_path(include, base_dir);
            tracing::debug!(include, resolved = %resolved.display(), "resolving include");

            if !resolved.exists() {
                return Err(RulezError::MissingInclude {
                    path: include.clone(),
                    resolved: resolved.display().to_string(),
                });
            }

            let included = self.load_resolved(&resolved)?;
            rule_sets.push(included.rules);
            section_sets.push(included.sections);
        }

        config.rules = merge(rule_sets);
        config.sections = merge(section_sets);
        config.apply_priority_defaults();

        Ok(())
    }
}

/// Merge a fully resolved local override into `config`. The local file is
/// passed last, so it wins unconditionally.
fn merge_local(config: &mut Config, local: Config) {
    config.rules = merge([std::mem::take(&mut config.rules), local.rules]);
    config.sections = merge([std::mem::take(&mut config.sections), local.sections]);

    if let Some(local_user) = local.user_rulez {
        match &mut config.user_rulez {
            Some(user) => {
                user.rules = merge([std::mem::take(&mut user.rules), local_user.rules]);
                user.sections = merge([std::mem::take(&mut user.sections), local_user.sections]);
            }
            None => config.user_rulez = Some(local_user),
        }
    }
}

/// `dir/name.yaml` -> `dir/name.local.yaml`.
fn local_override_path(abs: &Path) -> PathBuf {
    let stem = abs.file_stem().map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    abs.with_file_name(format!("{stem}.local.yaml"))
}

/// Lexically collapse `.` and `..` components of an absolute path.
///
/// `std::path::absolute` and `Path::join` both keep `..` as-is, so an
/// include written as `../d/a.yaml` would otherwise compare unequal to the
/// ancestor path of the very file it names and slip past cycle detection.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Relative include paths resolve against the including file's directory;
/// absolute paths are honored as-is.
fn resolve_path(include: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(include);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Metadata, ProfileSelector, Rule};
    use std::fs;
    use tempfile::TempDir;

    struct TestProfiles;

    impl ProfileRepository for TestProfiles {
        fn get(&self, name: &str) -> Result<Config> {
            match name {
                "default" => Ok(empty_config("default")),
                "base" => {
                    let mut config = empty_config("base");
                    config.rules.push(Rule {
                        id: None,
                        name: "R1".to_string(),
                        priority: 1,
                        content: "from profile".to_string(),
                    });
                    config.rules.push(Rule {
                        id: None,
                        name: "profile-only".to_string(),
                        priority: 2,
                        content: "profile extra".to_string(),
                    });
                    Ok(config)
                }
                other => Err(RulezError::ProfileNotFound {
                    name: other.to_string(),
                    available: self.names(),
                }),
            }
        }

        fn names(&self) -> Vec<String> {
            vec!["default".to_string(), "base".to_string()]
        }
    }

    fn empty_config(name: &str) -> Config {
        Config {
            metadata: Metadata {
                name: name.to_string(),
                version: None,
                description: None,
            },
            profile: None,
            includes: vec![],
            outputs: vec![],
            rules: vec![],
            sections: vec![],
            user_rulez: None,
        }
    }

    fn test_loader() -> ConfigLoader {
        ConfigLoader::with_repositories(Arc::new(TestProfiles), Arc::new(StructuralValidator))
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_defaults_missing_priorities_to_one() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ai-rulez.yaml",
            "metadata:\n  name: Test\nrules:\n  - name: r\n    content: c\n",
        );

        let config = test_loader().load(&path).unwrap();
        assert_eq!(config.rules[0].priority, 1);
    }

    #[test]
    fn declared_content_beats_profile_regardless_of_priority() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ai-rulez.yaml",
            "metadata:\n  name: Test\nprofile: base\nrules:\n  - name: R1\n    priority: 5\n    content: declared\n",
        );

        let config = test_loader().load(&path).unwrap();
        let r1 = config.rules.iter().find(|r| r.name == "R1").unwrap();
        assert_eq!(r1.content, "declared");
        assert_eq!(r1.priority, 5);

        // Profile-only content survives with the +10 boost.
        let extra = config.rules.iter().find(|r| r.name == "profile-only").unwrap();
        assert_eq!(extra.priority, 12);
    }

    #[test]
    fn unknown_profile_aborts_load() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ai-rulez.yaml",
            "metadata:\n  name: Test\nprofile: nonexistent\n",
        );

        let err = test_loader().load(&path).unwrap_err();
        assert!(matches!(err, RulezError::ProfileNotFound { .. }));
    }

    #[test]
    fn includes_override_own_rules_and_later_includes_win() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "first.yaml",
            "metadata:\n  name: First\nrules:\n  - name: shared\n    priority: 3\n    content: from first\n",
        );
        write(
            &dir,
            "second.yaml",
            "metadata:\n  name: Second\nrules:\n  - name: shared\n    priority: 4\n    content: from second\n",
        );
        let path = write(
            &dir,
            "ai-rulez.yaml",
            "metadata:\n  name: Main\nincludes:\n  - first.yaml\n  - second.yaml\nrules:\n  - name: shared\n    priority: 9\n    content: own\n  - name: mine\n    content: untouched\n",
        );

        let config = test_loader().load(&path).unwrap();
        assert!(config.includes.is_empty(), "includes must be cleared");

        let shared = config.rules.iter().find(|r| r.name == "shared").unwrap();
        assert_eq!(shared.content, "from second");
        assert_eq!(shared.priority, 4);
        assert!(config.rules.iter().any(|r| r.name == "mine"));
    }

    #[test]
    fn missing_include_aborts_load() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ai-rulez.yaml",
            "metadata:\n  name: Main\nincludes:\n  - nope.yaml\n",
        );

        let err = test_loader().load(&path).unwrap_err();
        match err {
            RulezError::MissingInclude { path, .. } => assert_eq!(path, "nope.yaml"),
            other => panic!("expected MissingInclude, got {other:?}"),
        }
    }

    #[test]
    fn include_cycle_is_detected() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "a.yaml",
            "metadata:\n  name: A\nincludes:\n  - b.yaml\n",
        );
        write(
            &dir,
            "b.yaml",
            "metadata:\n  name: B\nincludes:\n  - a.yaml\n",
        );

        let err = test_loader().load(&dir.path().join("a.yaml")).unwrap_err();
        match err {
            RulezError::CircularInclude { chain, .. } => assert!(chain.len() >= 3),
            other => panic!("expected CircularInclude, got {other:?}"),
        }
    }

    #[test]
    fn dotdot_spelled_cycle_is_detected() {
        let dir = TempDir::new().unwrap();
        // d/a.yaml includes itself through a `..` spelling of its own path.
        write(
            &dir,
            "d/a.yaml",
            "metadata:\n  name: A\nincludes:\n  - ../d/a.yaml\n",
        );

        let err = test_loader().load(&dir.path().join("d/a.yaml")).unwrap_err();
        assert!(matches!(err, RulezError::CircularInclude { .. }));
    }

    #[test]
    fn normalize_collapses_dot_components() {
        assert_eq!(normalize(Path::new("/a/b/../b/c.yaml")), Path::new("/a/b/c.yaml"));
        assert_eq!(normalize(Path::new("/a/./b/./c.yaml")), Path::new("/a/b/c.yaml"));
        assert_eq!(normalize(Path::new("/a/b/c.yaml")), Path::new("/a/b/c.yaml"));
    }

    #[test]
    fn profile_boost_saturates_at_u32_max() {
        struct ExtremeProfiles;
        impl ProfileRepository for ExtremeProfiles {
            fn get(&self, name: &str) -> Result<Config> {
                let mut config = empty_config(name);
                config.rules.push(Rule {
                    id: None,
                    name: "extreme".to_string(),
                    priority: u32::MAX,
                    content: "x".to_string(),
                });
                Ok(config)
            }
            fn names(&self) -> Vec<String> {
                vec!["default".to_string()]
            }
        }

        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ai-rulez.yaml", "metadata:\n  name: Main\n");

        let mut loader = ConfigLoader::with_repositories(
            Arc::new(ExtremeProfiles),
            Arc::new(StructuralValidator),
        );
        let config = loader.load(&path).unwrap();
        assert_eq!(config.rules[0].priority, u32::MAX);
    }

    #[test]
    fn diamond_inclusion_is_legal() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "leaf.yaml",
            "metadata:\n  name: Leaf\nrules:\n  - name: leaf-rule\n    content: leaf\n",
        );
        write(
            &dir,
            "left.yaml",
            "metadata:\n  name: Left\nincludes:\n  - leaf.yaml\n",
        );
        write(
            &dir,
            "right.yaml",
            "metadata:\n  name: Right\nincludes:\n  - leaf.yaml\n",
        );
        let path = write(
            &dir,
            "ai-rulez.yaml",
            "metadata:\n  name: Main\nincludes:\n  - left.yaml\n  - right.yaml\n",
        );

        let config = test_loader().load(&path).unwrap();
        let leaf_rules: Vec<_> = config.rules.iter().filter(|r| r.name == "leaf-rule").collect();
        assert_eq!(leaf_rules.len(), 1);
    }

    #[test]
    fn local_override_always_wins() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "inc.yaml",
            "metadata:\n  name: Inc\nrules:\n  - name: R1\n    priority: 3\n    content: include version\n",
        );
        write(
            &dir,
            "ai-rulez.local.yaml",
            "metadata:\n  name: Local\nrules:\n  - name: R1\n    priority: 9\n    content: local version\n",
        );
        let path = write(
            &dir,
            "ai-rulez.yaml",
            "metadata:\n  name: Main\nincludes:\n  - inc.yaml\nrules:\n  - name: R1\n    priority: 5\n    content: main version\n",
        );

        let config = test_loader().load(&path).unwrap();
        let r1 = config.rules.iter().find(|r| r.name == "R1").unwrap();
        assert_eq!(r1.content, "local version");
        assert_eq!(r1.priority, 9);
        assert_eq!(config.rules.iter().filter(|r| r.name == "R1").count(), 1);
    }

    #[test]
    fn local_override_merges_user_rulez() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "ai-rulez.local.yaml",
            "metadata:\n  name: Local\nuser_rulez:\n  rules:\n    - name: mine\n      content: personal\n",
        );
        let path = write(&dir, "ai-rulez.yaml", "metadata:\n  name: Main\n");

        let config = test_loader().load(&path).unwrap();
        let user = config.user_rulez.unwrap();
        assert_eq!(user.rules[0].name, "mine");
        assert_eq!(user.rules[0].priority, 1);
    }

    #[test]
    fn schema_violations_abort_load() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ai-rulez.yaml", "metadata:\n  version: \"1\"\n");

        let err = test_loader().load(&path).unwrap_err();
        match err {
            RulezError::SchemaValidation { violations, .. } => {
                assert!(violations.iter().any(|v| v.contains("metadata.name")));
            }
            other => panic!("expected SchemaValidation, got {other:?}"),
        }
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "ai-rulez.yaml", "metadata: [unclosed\n");

        let err = test_loader().load(&path).unwrap_err();
        assert!(matches!(err, RulezError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = test_loader().load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, RulezError::Io { .. }));
    }

    #[test]
    fn profile_list_later_profile_wins() {
        struct TwoProfiles;
        impl ProfileRepository for TwoProfiles {
            fn get(&self, name: &str) -> Result<Config> {
                let mut config = empty_config(name);
                config.rules.push(Rule {
                    id: None,
                    name: "shared".to_string(),
                    priority: 1,
                    content: format!("from {name}"),
                });
                Ok(config)
            }
            fn names(&self) -> Vec<String> {
                vec!["one".to_string(), "two".to_string()]
            }
        }

        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ai-rulez.yaml",
            "metadata:\n  name: Main\nprofile: [one, two]\n",
        );

        let mut loader = ConfigLoader::with_repositories(
            Arc::new(TwoProfiles),
            Arc::new(StructuralValidator),
        );
        let config = loader.load(&path).unwrap();
        let shared = config.rules.iter().find(|r| r.name == "shared").unwrap();
        assert_eq!(shared.content, "from two");
        assert_eq!(shared.priority, 11);
    }

    #[test]
    fn selector_deserialized_from_yaml_scalar() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "ai-rulez.yaml",
            "metadata:\n  name: Main\nprofile: base\n",
        );

        let config = test_loader().load(&path).unwrap();
        assert_eq!(
            config.profile,
            Some(ProfileSelector::Single("base".to_string()))
        );
    }
}
