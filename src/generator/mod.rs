//! Output file generation.
//!
//! The generator renders every declared output and writes it behind a
//! content-hash gate: the rendered bytes are SHA-256 fingerprinted and
//! compared against the existing file, and the write is skipped entirely
//! when they match. Regenerating from unchanged inputs therefore performs
//! zero filesystem writes.
//!
//! Two modes exist. Serial generation fails fast on the first error.
//! Concurrent generation spawns one task per output, joins on all of them,
//! and surfaces the first error observed — it does not cancel sibling tasks
//! and performs no rollback, so a failing output can coexist with
//! successfully written siblings from the same run. [`Generator::generate_all`]
//! switches to concurrent mode automatically for larger output sets.
//!
//! Two outputs resolving to the same file path are an unguarded race (last
//! writer wins); output paths are assumed disjoint.

use chrono::{DateTime, Utc};
use futures::future;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, Output};
use crate::core::{Result, RulezError};
use crate::templating::{TemplateData, TemplateRenderer};
use crate::utils::fs::{calculate_checksum, content_checksum, ensure_parent_dir};

/// Output count at which [`Generator::generate_all`] switches to concurrent
/// generation.
const CONCURRENT_OUTPUT_THRESHOLD: usize = 10;

/// Existing files at or above this size are hashed by streaming instead of
/// being read into memory.
const STREAMING_HASH_THRESHOLD: u64 = 1024 * 1024;

/// Generates output files from a resolved configuration.
pub struct Generator {
    renderer: TemplateRenderer,
    base_dir: PathBuf,
    /// Source config file name, shown in generated-file headers. Empty when
    /// the generator was not built from a config path.
    config_file: String,
    /// Frozen generation timestamp; `None` means "now" per run.
    timestamp: Option<DateTime<Utc>>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    /// Generator rooted at the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_dir(PathBuf::from("."))
    }

    /// Generator resolving output paths against `base_dir`.
    #[must_use]
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            renderer: TemplateRenderer::new(),
            base_dir,
            config_file: String::new(),
            timestamp: None,
        }
    }

    /// Generator rooted at the directory of `config_path`, with the file
    /// name recorded for generated-file headers.
    #[must_use]
    pub fn for_config_file(config_path: &Path) -> Self {
        let base_dir = config_path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let config_file = config_path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        Self {
            renderer: TemplateRenderer::new(),
            base_dir,
            config_file,
            timestamp: None,
        }
    }

    /// Freeze the generation timestamp, making repeated runs over the same
    /// config byte-reproducible.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Register a custom named template on the underlying renderer.
    pub fn register_template(&mut self, name: &str, source: &str) -> Result<()> {
        self.renderer.register(name, source)
    }

    /// All template names the renderer currently knows.
    #[must_use]
    pub fn supported_templates(&self) -> Vec<String> {
        self.renderer.supported()
    }

    /// Generate all outputs, picking concurrent mode for larger sets.
    pub async fn generate_all(&self, config: &Config) -> Result<()> {
        if config.outputs.is_empty() {
            return Err(RulezError::NoOutputs);
        }
        if config.outputs.len() >= CONCURRENT_OUTPUT_THRESHOLD {
            self.generate_all_concurrent(config).await
        } else {
            self.generate_all_serial(config).await
        }
    }

    /// Generate all outputs one at a time, failing fast on the first error.
    pub async fn generate_all_serial(&self, config: &Config) -> Result<()> {
        if config.outputs.is_empty() {
            return Err(RulezError::NoOutputs);
        }

        let data = self.template_data(config);
        for output in &config.outputs {
            write_output(&self.renderer, &self.base_dir, &self.config_file, output, &data).await?;
        }
        Ok(())
    }

    /// Generate all outputs concurrently, one task per output.
    ///
    /// All tasks run to completion; the first error observed is returned
    /// after the join, with successfully written siblings left in place.
    pub async fn generate_all_concurrent(&self, config: &Config) -> Result<()> {
        if config.outputs.is_empty() {
            return Err(RulezError::NoOutputs);
        }

        let data = Arc::new(self.template_data(config));
        let mut handles = Vec::with_capacity(config.outputs.len());

        for output in config.outputs.clone() {
            let renderer = self.renderer.clone();
            let base_dir = self.base_dir.clone();
            let config_file = self.config_file.clone();
            let data = Arc::clone(&data);
            handles.push(tokio::spawn(async move {
                write_output(&renderer, &base_dir, &config_file, &output, &data).await
            }));
        }

        let mut first_error = None;
        for result in future::join_all(handles).await {
            let outcome = result.unwrap_or_else(|join_error| {
                Err(RulezError::OutputWrite {
                    path: "<generation task>".to_string(),
                    reason: join_error.to_string(),
                })
            });
            if let Err(error) = outcome {
                tracing::debug!(%error, "output generation task failed");
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Generate a single output identified by its declared file path.
    pub async fn generate_output(&self, config: &Config, output_file: &str) -> Result<()> {
        let output = find_output(config, output_file)?;
        let data = self.template_data(config);
        write_output(&self.renderer, &self.base_dir, &self.config_file, output, &data).await
    }

    /// Render a single output without writing it.
    pub fn preview_output(&self, config: &Config, output_file: &str) -> Result<String> {
        let output = find_output(config, output_file)?;
        let data = self.template_data(config);
        render_content(&self.renderer, &self.base_dir, &self.config_file, output, &data)
    }

    /// Render every output without writing, keyed by declared file path.
    pub fn preview_all(&self, config: &Config) -> Result<BTreeMap<String, String>> {
        if config.outputs.is_empty() {
            return Err(RulezError::NoOutputs);
        }

        let data = self.template_data(config);
        let mut results = BTreeMap::new();
        for output in &config.outputs {
            let content =
                render_content(&self.renderer, &self.base_dir, &self.config_file, output, &data)?;
            results.insert(output.file.clone(), content);
        }
        Ok(results)
    }

    fn template_data(&self, config: &Config) -> TemplateData {
        match self.timestamp {
            Some(timestamp) => TemplateData::with_timestamp(config, timestamp),
            None => TemplateData::new(config),
        }
    }
}

fn find_output<'a>(config: &'a Config, output_file: &str) -> Result<&'a Output> {
    config.outputs.iter().find(|o| o.file == output_file).ok_or_else(|| {
        RulezError::OutputWrite {
            path: output_file.to_string(),
            reason: "not declared in configuration outputs".to_string(),
        }
    })
}

/// Header plus rendered body for one output.
fn render_content(
    renderer: &TemplateRenderer,
    base_dir: &Path,
    config_file: &str,
    output: &Output,
    data: &TemplateData,
) -> Result<String> {
    let targeted = data.for_output(config_file, &output.file);
    let body = renderer.render_output(output, base_dir, &targeted)?;
    let header = renderer.render_header(&targeted)?;
    Ok(format!("{header}{body}"))
}

async fn write_output(
    renderer: &TemplateRenderer,
    base_dir: &Path,
    config_file: &str,
    output: &Output,
    data: &TemplateData,
) -> Result<()> {
    let content = render_content(renderer, base_dir, config_file, output, data)?;
    let path = base_dir.join(&output.file);

    if !should_write(&path, content.as_bytes()).await? {
        tracing::debug!(path = %path.display(), "content unchanged, skipping write");
        return Ok(());
    }

    ensure_parent_dir(&path)?;
    tokio::fs::write(&path, &content).await.map_err(|e| RulezError::OutputWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote output file");
    Ok(())
}

/// The hash gate: compare fingerprints of the rendered content and the
/// existing file, buffering small files and streaming large ones.
async fn should_write(path: &Path, new_content: &[u8]) -> Result<bool> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(RulezError::io(path, e)),
    };

    let new_hash = content_checksum(new_content);

    let existing_hash = if metadata.len() < STREAMING_HASH_THRESHOLD {
        let existing = tokio::fs::read(path).await.map_err(|e| RulezError::io(path, e))?;
        content_checksum(&existing)
    } else {
        calculate_checksum(path)?
    };

    Ok(existing_hash != new_hash)
}
