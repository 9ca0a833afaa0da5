//! Template data construction.
//!
//! At render time (not load time) the resolved rules and sections are merged
//! with the `user_rulez` overlay and flattened into a deterministic, sorted
//! view. The sort here is load-bearing: the upstream merges run over keyed
//! maps with no iteration guarantees, so deterministic output depends
//! entirely on this final priority-descending, title-ascending order.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{Config, Rule, Section};
use crate::config::merge::merge;

/// Unified render-time view over one rule or section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    /// Rule name or section title
    pub title: String,
    /// Effective priority after resolution
    pub priority: u32,
    /// The text fragment
    pub content: String,
    /// Whether this item came from a rule (vs a section)
    pub is_rule: bool,
}

/// All variables available to templates.
///
/// Serialized into the template context, so field names here are the names
/// templates see.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    /// Project name from metadata
    pub project_name: String,
    /// Project version, when declared
    pub version: Option<String>,
    /// Project description, when declared
    pub description: Option<String>,
    /// Rules sorted by priority descending, name ascending
    pub rules: Vec<Rule>,
    /// Sections sorted by priority descending, title ascending
    pub sections: Vec<Section>,
    /// Rules and sections combined, sorted by priority descending then
    /// title ascending
    pub all_content: Vec<ContentItem>,
    /// Number of rules after overlay merge
    pub rule_count: usize,
    /// Number of sections after overlay merge
    pub section_count: usize,
    /// Generation timestamp (RFC 3339 in templates; format with the `date`
    /// filter)
    pub timestamp: DateTime<Utc>,
    /// Source configuration file name, for the generated-file header
    pub config_file: String,
    /// Target output file name, for the generated-file header
    pub output_file: String,
}

impl TemplateData {
    /// Build template data from a resolved config with the current time as
    /// the generation timestamp.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_timestamp(config, Utc::now())
    }

    /// Build template data with an explicit timestamp. Generation runs with
    /// a frozen clock use this to make output byte-reproducible.
    #[must_use]
    pub fn with_timestamp(config: &Config, timestamp: DateTime<Utc>) -> Self {
        // Overlay wins over resolved content, but is never persisted back.
        let (all_rules, all_sections) = match &config.user_rulez {
            Some(user) => (
                merge([config.rules.clone(), user.rules.clone()]),
                merge([config.sections.clone(), user.sections.clone()]),
            ),
            None => (config.rules.clone(), config.sections.clone()),
        };

        let mut all_content: Vec<ContentItem> = Vec::with_capacity(all_rules.len() + all_sections.len());
        for rule in &all_rules {
            all_content.push(ContentItem {
                title: rule.name.clone(),
                priority: rule.priority,
                content: rule.content.clone(),
                is_rule: true,
            });
        }
        for section in &all_sections {
            all_content.push(ContentItem {
                title: section.title.clone(),
                priority: section.priority,
                content: section.content.clone(),
                is_rule: false,
            });
        }
        all_content.sort_by(|a, b| {
            b.priority.cmp(&a.priority).then_with(|| a.title.cmp(&b.title))
        });

        let mut rules = all_rules;
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        let mut sections = all_sections;
        sections.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.title.cmp(&b.title)));

        Self {
            project_name: config.metadata.name.clone(),
            version: config.metadata.version.clone(),
            description: config.metadata.description.clone(),
            rule_count: rules.len(),
            section_count: sections.len(),
            rules,
            sections,
            all_content,
            timestamp,
            config_file: String::new(),
            output_file: String::new(),
        }
    }

    /// A copy of this data targeted at one output file, for header fields.
    #[must_use]
    pub fn for_output(&self, config_file: &str, output_file: &str) -> Self {
        let mut data = self.clone();
        data.config_file = config_file.to_string();
        data.output_file = output_file.to_string();
        data
    }
}
