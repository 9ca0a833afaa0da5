//! Structural validation seam.
//!
//! Validation runs on raw bytes before decoding, so a real JSON-Schema
//! validator can be plugged in without touching the loader. The default
//! [`StructuralValidator`] checks the same shape the published schema
//! describes: required keys, value types, and known top-level fields, and
//! reports every violation it finds rather than stopping at the first.

use serde_yaml::Value;

/// Validates a raw configuration document.
///
/// Implementations consume the undecoded byte buffer and either accept it or
/// return the full list of violation descriptions. The loader wraps a
/// non-empty list into [`crate::core::RulezError::SchemaValidation`].
pub trait SchemaValidator: Send + Sync {
    /// Validate `data`, returning all violations found.
    fn validate(&self, data: &[u8]) -> std::result::Result<(), Vec<String>>;
}

/// Accepts every document. Useful for tests and for callers that run an
/// external validator ahead of the loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissiveValidator;

impl SchemaValidator for PermissiveValidator {
    fn validate(&self, _data: &[u8]) -> std::result::Result<(), Vec<String>> {
        Ok(())
    }
}

/// The built-in structural validator.
///
/// Checks top-level shape, `metadata.name`, output/rule/section required
/// fields and types, and the string-or-string-list form of `profile`.
/// Malformed YAML is not reported here; the loader surfaces that as a parse
/// error with better positioning.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralValidator;

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &[
    "metadata", "profile", "includes", "outputs", "rules", "sections", "user_rulez",
];

impl SchemaValidator for StructuralValidator {
    fn validate(&self, data: &[u8]) -> std::result::Result<(), Vec<String>> {
        let Ok(doc) = serde_yaml::from_slice::<Value>(data) else {
            // Leave YAML syntax errors to the decode step.
            return Ok(());
        };

        let mut violations = Vec::new();

        let Some(root) = doc.as_mapping() else {
            return Err(vec!["document root must be a mapping".to_string()]);
        };

        for key in root.keys() {
            match key.as_str() {
                Some(name) if KNOWN_TOP_LEVEL_KEYS.contains(&name) => {}
                Some(name) => violations.push(format!("unknown top-level key '{name}'")),
                None => violations.push("top-level keys must be strings".to_string()),
            }
        }

        check_metadata(root.get("metadata"), &mut violations);
        check_profile(root.get("profile"), &mut violations);
        check_string_list(root.get("includes"), "includes", &mut violations);
        check_outputs(root.get("outputs"), &mut violations);
        check_items(root.get("rules"), "rules", "name", &mut violations);
        check_items(root.get("sections"), "sections", "title", &mut violations);

        if let Some(user) = root.get("user_rulez") {
            match user.as_mapping() {
                Some(map) => {
                    check_items(map.get("rules"), "user_rulez.rules", "name", &mut violations);
                    check_items(
                        map.get("sections"),
                        "user_rulez.sections",
                        "title",
                        &mut violations,
                    );
                }
                None => violations.push("user_rulez must be a mapping".to_string()),
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn check_metadata(metadata: Option<&Value>, violations: &mut Vec<String>) {
    let Some(metadata) = metadata else {
        violations.push("metadata is required".to_string());
        return;
    };
    let Some(map) = metadata.as_mapping() else {
        violations.push("metadata must be a mapping".to_string());
        return;
    };

    match map.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => {}
        Some(_) => violations.push("metadata.name must not be empty".to_string()),
        None => violations.push("metadata.name is required and must be a string".to_string()),
    }

    for field in ["version", "description"] {
        if let Some(value) = map.get(field) {
            if !value.is_string() {
                violations.push(format!("metadata.{field} must be a string"));
            }
        }
    }
}

fn check_profile(profile: Option<&Value>, violations: &mut Vec<String>) {
    let Some(profile) = profile else { return };
    match profile {
        Value::String(_) => {}
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    violations.push(format!("profile[{i}] must be a string"));
                }
            }
        }
        _ => violations.push("profile must be a string or a list of strings".to_string()),
    }
}

fn check_string_list(value: Option<&Value>, field: &str, violations: &mut Vec<String>) {
    let Some(value) = value else { return };
    let Some(items) = value.as_sequence() else {
        violations.push(format!("{field} must be a list"));
        return;
    };
    for (i, item) in items.iter().enumerate() {
        if !item.is_string() {
            violations.push(format!("{field}[{i}] must be a string"));
        }
    }
}

fn check_outputs(outputs: Option<&Value>, violations: &mut Vec<String>) {
    let Some(outputs) = outputs else { return };
    let Some(items) = outputs.as_sequence() else {
        violations.push("outputs must be a list".to_string());
        return;
    };

    for (i, item) in items.iter().enumerate() {
        let Some(map) = item.as_mapping() else {
            violations.push(format!("outputs[{i}] must be a mapping"));
            continue;
        };
        match map.get("file").and_then(Value::as_str) {
            Some(file) if !file.is_empty() => {}
            Some(_) => violations.push(format!("outputs[{i}].file must not be empty")),
            None => violations.push(format!("outputs[{i}].file is required and must be a string")),
        }
        if let Some(template) = map.get("template") {
            if !template.is_string() {
                violations.push(format!("outputs[{i}].template must be a string"));
            }
        }
    }
}

fn check_items(items: Option<&Value>, field: &str, key_field: &str, violations: &mut Vec<String>) {
    let Some(items) = items else { return };
    let Some(seq) = items.as_sequence() else {
        violations.push(format!("{field} must be a list"));
        return;
    };

    for (i, item) in seq.iter().enumerate() {
        let Some(map) = item.as_mapping() else {
            violations.push(format!("{field}[{i}] must be a mapping"));
            continue;
        };

        match map.get(key_field).and_then(Value::as_str) {
            Some(value) if !value.is_empty() => {}
            Some(_) => violations.push(format!("{field}[{i}].{key_field} must not be empty")),
            None => violations.push(format!(
                "{field}[{i}].{key_field} is required and must be a string"
            )),
        }

        if !map.get("content").is_some_and(Value::is_string) {
            violations.push(format!("{field}[{i}].content is required and must be a string"));
        }

        if let Some(id) = map.get("id") {
            if !id.is_string() {
                violations.push(format!("{field}[{i}].id must be a string"));
            }
        }

        if let Some(priority) = map.get("priority") {
            if priority.as_u64().is_none() {
                violations.push(format!(
                    "{field}[{i}].priority must be a non-negative integer"
                ));
            }
        }
    }
}
