//! ai-rulez - generated AI-assistant instruction files from declarative rules
//!
//! ai-rulez turns a declarative rule set (short text snippets with
//! priorities) into one or more generated text files such as `CLAUDE.md`,
//! resolving configuration spread across multiple YAML files.
//!
//! # Architecture Overview
//!
//! Configuration resolution is a three-tier merge, lowest precedence first:
//! - **Built-in profiles** (`profile:` selector) seed a baseline of rules
//!   and sections, priority-boosted for visibility
//! - **Declared and included content**: the config's own rules plus every
//!   file in `includes`, resolved recursively with cycle detection
//! - **Local overrides**: a sibling `<name>.local.yaml` (never committed)
//!   that always wins
//!
//! All three tiers run through one merge primitive ("first occurrence fixes
//! position, last occurrence wins content"); only argument order differs.
//! Generation then renders each declared output through a Tera template and
//! writes it behind a SHA-256 content-hash gate, so regenerating from
//! unchanged inputs performs zero filesystem writes.
//!
//! # Core Modules
//!
//! - [`config`] - data model, merge engine, loader with include/profile/
//!   local resolution, schema-validation seam, config-file discovery
//! - [`profiles`] - built-in profile bundles behind a swappable repository
//!   trait
//! - [`templating`] - sorted template data and the Tera-based renderer
//! - [`generator`] - serial and concurrent output generation with
//!   hash-gated writes
//! - [`core`] - the error taxonomy and user-facing error presentation
//! - [`utils`] - filesystem helpers (idempotent dir creation, checksums)
//!
//! # Example
//!
//! ```no_run
//! use ai_rulez::config::ConfigLoader;
//! use ai_rulez::generator::Generator;
//! use std::path::Path;
//!
//! # async fn run() -> ai_rulez::core::Result<()> {
//! let path = Path::new("ai-rulez.yaml");
//! let config = ConfigLoader::new().load(path)?;
//!
//! let generator = Generator::for_config_file(path);
//! generator.generate_all(&config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Format
//!
//! ```yaml
//! metadata:
//!   name: My Project
//!
//! profile: [python, typescript]
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
//!     content: Write tests first.
//! ```

pub mod config;
pub mod core;
pub mod generator;
pub mod profiles;
pub mod templating;
pub mod utils;

pub use config::{Config, ConfigLoader, Metadata, Output, ProfileSelector, Rule, Section, UserRulez};
pub use crate::core::{Result, RulezError};
pub use generator::Generator;
pub use profiles::{EmbeddedProfiles, ProfileRepository};
pub use templating::{ContentItem, TemplateData, TemplateRenderer};
