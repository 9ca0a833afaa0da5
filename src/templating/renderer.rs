//! Template rendering engine with Tera.
//!
//! Per output, the template reference resolves in this order:
//!
//! 1. `@path` — read template text from a file relative to the config
//!    directory, parse, execute.
//! 2. Text containing a newline or a template-opening token (`{{` / `{%`) —
//!    inline template, parsed and executed directly.
//! 3. Anything else — a name looked up in a registry seeded with the
//!    built-ins `default` and `documentation` plus caller-registered
//!    templates.
//!
//! Parse failures map to [`RulezError::TemplateParse`] and execution
//! failures (for example a reference to an undefined field) to
//! [`RulezError::TemplateExecution`]; both are scoped to the single output
//! being rendered. A fresh `Tera` instance is created per render — it is
//! cheap, and it keeps renders free of shared mutable state.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

use super::data::TemplateData;
use crate::config::Output;
use crate::core::{Result, RulezError};

/// Name of the template used when an output does not declare one.
pub const DEFAULT_TEMPLATE: &str = "default";

const BUILTIN_DEFAULT: &str = r#"# {{ project_name }}
{% if description %}
{{ description }}
{% endif %}
{%- if version %}
Version: {{ version }}
{% endif %}
Generated on {{ timestamp | date(format="%Y-%m-%d %H:%M:%S") }}
{% if rule_count or section_count %}
Total content: {{ rule_count }} rules, {{ section_count }} sections
{% endif %}
{%- for item in all_content %}
{% if item.is_rule %}
## {{ item.title }}

**Priority:** {{ item.priority }}

{{ item.content }}
{%- else %}

{{ item.content }}
{%- endif %}
{%- endfor %}
"#;

const BUILTIN_DOCUMENTATION: &str = r#"# {{ project_name }} - Detailed Rules

**Project Information:**
- Name: {{ project_name }}
{% if version %}- Version: {{ version }}
{% endif %}{% if description %}- Description: {{ description }}
{% endif %}- Generated: {{ timestamp | date(format="%B %e, %Y at %l:%M %p") }}
- Total Rules: {{ rule_count }}

---

## Content

All content is sorted by priority (highest first), then alphabetically by title.
{% for item in all_content %}
{% if item.is_rule %}### [Rule] {{ item.title }} (Priority: {{ item.priority }})
{{ item.content }}
{%- else %}
{{ item.content }}
{%- endif %}
{% endfor %}
"#;

// Prepended to every generated file so agents and humans know not to edit
// it in place.
const GENERATED_HEADER: &str = r#"<!--
GENERATED FILE - DO NOT EDIT DIRECTLY

This file was generated by ai-rulez{% if config_file %} from {{ config_file }}{% endif %}.
Changes made here will be overwritten on the next generation run. To update
rules, edit the source configuration and regenerate.

Generated: {{ timestamp | date(format="%Y-%m-%d %H:%M:%S") }}
{% if config_file %}Source: {{ config_file }}
{% endif %}{% if output_file %}Target: {{ output_file }}
{% endif %}Content: {{ rule_count }} rules, {{ section_count }} sections
-->

"#;

/// Renders templates against [`TemplateData`].
///
/// Holds the named-template registry; the Tera engine itself is constructed
/// per render. Cloneable so concurrent generation tasks can each carry their
/// own copy.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    templates: HashMap<String, String>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create a renderer seeded with the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        let mut templates = HashMap::new();
        // Built-ins are hardcoded and parse-checked by tests.
        templates.insert(DEFAULT_TEMPLATE.to_string(), BUILTIN_DEFAULT.to_string());
        templates.insert("documentation".to_string(), BUILTIN_DOCUMENTATION.to_string());
        Self { templates }
    }

    /// Register a custom named template, validating it parses first.
    pub fn register(&mut self, name: &str, source: &str) -> Result<()> {
        validate_template(name, source)?;
        self.templates.insert(name.to_string(), source.to_string());
        Ok(())
    }

    /// All registered template names, sorted.
    #[must_use]
    pub fn supported(&self) -> Vec<String> {
        let mut names: Vec<String> = self.templates.keys().cloned().collect();
        names.sort();
        names
    }

    /// Render a registered template by name.
    pub fn render_named(&self, name: &str, data: &TemplateData) -> Result<String> {
        let source = self.templates.get(name).ok_or_else(|| RulezError::TemplateExecution {
            name: name.to_string(),
            reason: format!("unknown template name (registered: {})", self.supported().join(", ")),
        })?;
        execute(name, source, data)
    }

    /// Render one output's template, resolving `@file`, inline, and named
    /// references.
    pub fn render_output(
        &self,
        output: &Output,
        base_dir: &Path,
        data: &TemplateData,
    ) -> Result<String> {
        let spec = output.template.as_deref().unwrap_or(DEFAULT_TEMPLATE);

        if let Some(reference) = spec.strip_prefix('@') {
            let path = base_dir.join(reference);
            tracing::debug!(template = %path.display(), "rendering file template");
            let source = fs::read_to_string(&path).map_err(|e| RulezError::io(&path, e))?;
            let name = format!("file:{reference}");
            validate_template(&name, &source)?;
            return execute(&name, &source, data);
        }

        if spec.contains('\n') || spec.contains("{{") || spec.contains("{%") {
            validate_template("inline", spec)?;
            return execute("inline", spec, data);
        }

        self.render_named(spec, data)
    }

    /// Render the do-not-edit header prepended to every generated file.
    pub fn render_header(&self, data: &TemplateData) -> Result<String> {
        execute("header", GENERATED_HEADER, data)
    }
}

/// Check that template text parses, without executing it.
pub fn validate_template(name: &str, source: &str) -> Result<()> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, source).map_err(|e| RulezError::TemplateParse {
        name: name.to_string(),
        reason: describe_tera_error(&e),
    })?;
    Ok(())
}

fn execute(name: &str, source: &str, data: &TemplateData) -> Result<String> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);

    tera.add_raw_template(name, source).map_err(|e| RulezError::TemplateParse {
        name: name.to_string(),
        reason: describe_tera_error(&e),
    })?;

    let context = TeraContext::from_serialize(data).map_err(|e| RulezError::TemplateExecution {
        name: name.to_string(),
        reason: describe_tera_error(&e),
    })?;

    tera.render(name, &context).map_err(|e| RulezError::TemplateExecution {
        name: name.to_string(),
        reason: describe_tera_error(&e),
    })
}

/// Flatten a Tera error chain into one readable reason string. Tera's top
/// message alone is usually just "Failed to render ..."; the detail lives in
/// the source chain.
fn describe_tera_error(error: &tera::Error) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        parts.push(err.to_string());
        source = err.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Metadata, Rule};
    use chrono::{DateTime, Utc};

    fn fixed_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn sample_data() -> TemplateData {
        let config = Config {
            metadata: Metadata {
                name: "Test Project".to_string(),
                version: Some("1.2.3".to_string()),
                description: Some("A test".to_string()),
            },
            profile: None,
            includes: vec![],
            outputs: vec![],
            rules: vec![
                Rule {
                    id: None,
                    name: "B".to_string(),
                    priority: 5,
                    content: "rule b".to_string(),
                },
                Rule {
                    id: None,
                    name: "A".to_string(),
                    priority: 5,
                    content: "rule a".to_string(),
                },
                Rule {
                    id: None,
                    name: "C".to_string(),
                    priority: 9,
                    content: "rule c".to_string(),
                },
            ],
            sections: vec![],
            user_rulez: None,
        };
        TemplateData::with_timestamp(&config, fixed_time())
    }

    #[test]
    fn default_template_renders_in_sorted_order() {
        let rendered = TemplateRenderer::new()
            .render_named(DEFAULT_TEMPLATE, &sample_data())
            .unwrap();

        assert!(rendered.contains("# Test Project"));
        assert!(rendered.contains("Generated on 2024-01-02 03:04:05"));
        let c = rendered.find("## C").unwrap();
        let a = rendered.find("## A").unwrap();
        let b = rendered.find("## B").unwrap();
        assert!(c < a && a < b, "expected C before A before B:\n{rendered}");
    }

    #[test]
    fn documentation_template_renders() {
        let rendered = TemplateRenderer::new()
            .render_named("documentation", &sample_data())
            .unwrap();
        assert!(rendered.contains("Detailed Rules"));
        assert!(rendered.contains("[Rule] C (Priority: 9)"));
    }

    #[test]
    fn inline_template_is_detected_and_rendered() {
        let renderer = TemplateRenderer::new();
        let output = Output {
            file: "out.md".to_string(),
            template: Some("Rules: {{ rule_count }}".to_string()),
        };
        let rendered = renderer
            .render_output(&output, Path::new("."), &sample_data())
            .unwrap();
        assert_eq!(rendered, "Rules: 3");
    }

    #[test]
    fn file_template_reference_is_read_relative_to_base_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("custom.tmpl"), "Project {{ project_name }}").unwrap();

        let renderer = TemplateRenderer::new();
        let output = Output {
            file: "out.md".to_string(),
            template: Some("@custom.tmpl".to_string()),
        };
        let rendered = renderer.render_output(&output, dir.path(), &sample_data()).unwrap();
        assert_eq!(rendered, "Project Test Project");
    }

    #[test]
    fn missing_file_template_is_io_error() {
        let renderer = TemplateRenderer::new();
        let output = Output {
            file: "out.md".to_string(),
            template: Some("@absent.tmpl".to_string()),
        };
        let err = renderer
            .render_output(&output, Path::new("/nonexistent-base"), &sample_data())
            .unwrap_err();
        assert!(matches!(err, RulezError::Io { .. }));
    }

    #[test]
    fn malformed_template_fails_at_parse_time() {
        let mut renderer = TemplateRenderer::new();
        let err = renderer.register("broken", "{% if x %}no endif").unwrap_err();
        assert!(matches!(err, RulezError::TemplateParse { .. }));
    }

    #[test]
    fn undefined_field_fails_at_execution_time() {
        let renderer = TemplateRenderer::new();
        let output = Output {
            file: "out.md".to_string(),
            template: Some("{{ no_such_field }}".to_string()),
        };
        let err = renderer
            .render_output(&output, Path::new("."), &sample_data())
            .unwrap_err();
        match err {
            RulezError::TemplateExecution { reason, .. } => {
                assert!(reason.contains("no_such_field"), "reason: {reason}");
            }
            other => panic!("expected TemplateExecution, got {other:?}"),
        }
    }

    #[test]
    fn unknown_named_template_lists_registered_names() {
        let err = TemplateRenderer::new()
            .render_named("nope", &sample_data())
            .unwrap_err();
        match err {
            RulezError::TemplateExecution { reason, .. } => {
                assert!(reason.contains("default"));
            }
            other => panic!("expected TemplateExecution, got {other:?}"),
        }
    }

    #[test]
    fn custom_registered_template_renders() {
        let mut renderer = TemplateRenderer::new();
        renderer.register("brief", "{{ project_name }}: {{ rule_count }} rules").unwrap();
        assert!(renderer.supported().contains(&"brief".to_string()));

        let rendered = renderer.render_named("brief", &sample_data()).unwrap();
        assert_eq!(rendered, "Test Project: 3 rules");
    }

    #[test]
    fn header_names_source_and_target() {
        let data = sample_data().for_output("ai-rulez.yaml", "CLAUDE.md");
        let header = TemplateRenderer::new().render_header(&data).unwrap();
        assert!(header.contains("DO NOT EDIT"));
        assert!(header.contains("Source: ai-rulez.yaml"));
        assert!(header.contains("Target: CLAUDE.md"));
        assert!(header.contains("3 rules, 0 sections"));
    }
}
