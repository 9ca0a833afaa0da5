//! Configuration model for ai-rulez projects.
//!
//! An ai-rulez configuration is a YAML document describing project metadata,
//! an optional built-in profile selection, files to include, output files to
//! generate, and the prioritized rules and sections that feed generation.
//!
//! # Basic Structure
//!
//! ```yaml
//! metadata:
//!   name: My Project
//!   version: "1.0.0"
//!
//! profile: python
//!
//! includes:
//!   - shared/common.yaml
//!
//! outputs:
//!   - file: CLAUDE.md
//!   - file: docs/rules.md
//!     template: documentation
//!
//! rules:
//!   - name: Testing
//!     priority: 5
//!     content: Always write tests first.
//!
//! sections:
//!   - title: Overview
//!     content: Free-form project notes.
//! ```
//!
//! # Precedence
//!
//! Three tiers resolve into one flat rule set, lowest to highest:
//! built-in profile content, declared/included content, and the sibling
//! `<name>.local.yaml` override file. See [`crate::config::loader`].
//!
//! # Serialization
//!
//! Empty collections and absent optional fields are omitted from serialized
//! output so saved files stay minimal, and `save_config` followed by a load
//! (with no includes, profile, or local override in play) round-trips to an
//! equal `Config`.

pub mod finder;
pub mod loader;
pub mod merge;
pub mod schema;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::{Result, RulezError};
use crate::utils::fs::ensure_parent_dir;
use merge::MergeKey;

pub use finder::{CONFIG_FILE_NAMES, find_all_config_files, find_config_file};
pub use loader::ConfigLoader;
pub use merge::merge;
pub use schema::{PermissiveValidator, SchemaValidator, StructuralValidator};

/// Priority assigned to rules and sections that do not declare one.
pub const DEFAULT_PRIORITY: u32 = 1;

/// The main configuration structure, one per YAML document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Project metadata
    pub metadata: Metadata,

    /// Built-in profile selection (single name or ordered list)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileSelector>,

    /// Paths of configs to include, resolved relative to this file.
    /// Always empty after resolution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,

    /// Output files to generate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Output>,

    /// Name-keyed, prioritized rule fragments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,

    /// Title-keyed, prioritized section fragments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,

    /// User-specific overlay, merged only at render time and never
    /// persisted back into resolved content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rulez: Option<UserRulez>,
}

/// Project metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Project name (required)
    pub name: String,
    /// Optional project version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Optional project description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Where and how to generate one rule file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Target path, relative to the directory of the config that declared it
    pub file: String,
    /// Built-in template name, `@`-prefixed file reference, or inline
    /// template text. Absent means `default`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// A single rule: a keyed, prioritized text fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Optional stable identifier; the merge key when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Rule name; the merge key when no id is set
    pub name: String,
    /// Priority, >= 1 after load (0/absent coerced to 1)
    #[serde(default)]
    pub priority: u32,
    /// Free-text rule content
    pub content: String,
}

/// An informative section, keyed by title instead of name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Optional stable identifier; the merge key when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Section title; the merge key when no id is set
    pub title: String,
    /// Priority, >= 1 after load (0/absent coerced to 1)
    #[serde(default)]
    pub priority: u32,
    /// Free-text section content
    pub content: String,
}

/// User-specific overlay rules and sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRulez {
    /// Overlay rules, winning over resolved rules at render time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
    /// Overlay sections, winning over resolved sections at render time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

/// The `profile` field: a single name or an ordered list of names.
///
/// YAML accepts either form; both normalize to a canonical ordered list
/// before any merge logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileSelector {
    /// `profile: python`
    Single(String),
    /// `profile: [python, typescript]`
    Many(Vec<String>),
}

impl ProfileSelector {
    /// Normalize to an ordered, de-duplicated list of non-empty names,
    /// falling back to `["default"]` when nothing usable remains.
    #[must_use]
    pub fn normalized(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        };

        let mut seen = Vec::new();
        for name in raw {
            if !name.is_empty() && !seen.iter().any(|s| s == name) {
                seen.push(name.to_string());
            }
        }

        if seen.is_empty() {
            vec!["default".to_string()]
        } else {
            seen
        }
    }
}

impl MergeKey for Rule {
    fn merge_key(&self) -> &str {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => &self.name,
        }
    }
}

impl MergeKey for Section {
    fn merge_key(&self) -> &str {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => &self.title,
        }
    }
}

impl Config {
    /// The ordered profile names this config selects.
    ///
    /// Absent or empty selectors resolve to `["default"]`.
    #[must_use]
    pub fn profile_names(&self) -> Vec<String> {
        self.profile
            .as_ref()
            .map_or_else(|| vec!["default".to_string()], ProfileSelector::normalized)
    }

    /// Coerce every zero/absent priority to [`DEFAULT_PRIORITY`], including
    /// inside the `user_rulez` overlay.
    pub fn apply_priority_defaults(&mut self) {
        fn fix_rules(rules: &mut [Rule]) {
            for rule in rules {
                if rule.priority == 0 {
                    rule.priority = DEFAULT_PRIORITY;
                }
            }
        }
        fn fix_sections(sections: &mut [Section]) {
            for section in sections {
                if section.priority == 0 {
                    section.priority = DEFAULT_PRIORITY;
                }
            }
        }

        fix_rules(&mut self.rules);
        fix_sections(&mut self.sections);
        if let Some(user) = &mut self.user_rulez {
            fix_rules(&mut user.rules);
            fix_sections(&mut user.sections);
        }
    }

    /// Insert a rule, replacing any existing rule with the same merge key.
    pub fn upsert_rule(&mut self, rule: Rule) {
        match self.rules.iter_mut().find(|r| r.merge_key() == rule.merge_key()) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Insert a section, replacing any existing section with the same merge key.
    pub fn upsert_section(&mut self, section: Section) {
        match self.sections.iter_mut().find(|s| s.merge_key() == section.merge_key()) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    /// Add an output unless one with the same file path already exists.
    /// Returns whether the output was added.
    pub fn add_output(&mut self, output: Output) -> bool {
        if self.outputs.iter().any(|o| o.file == output.file) {
            return false;
        }
        self.outputs.push(output);
        true
    }
}

/// Serialize a configuration to YAML and write it to `path`, creating parent
/// directories as needed.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let data = serde_yaml::to_string(config).map_err(|e| RulezError::parse(path, &e))?;

    ensure_parent_dir(path)?;
    fs::write(path, data).map_err(|e| RulezError::io(path, e))?;

    tracing::debug!(path = %path.display(), "saved configuration");
    Ok(())
}
