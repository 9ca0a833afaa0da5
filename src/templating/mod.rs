//! Template data and rendering.
//!
//! [`TemplateData`] is the unified, sorted view over a resolved config that
//! templates render against; [`TemplateRenderer`] executes built-in,
//! file-referenced, or inline Tera templates against it. Determinism comes
//! from the data builder's final sort, never from upstream merge order.

pub mod data;
pub mod renderer;

pub use data::{ContentItem, TemplateData};
pub use renderer::{DEFAULT_TEMPLATE, TemplateRenderer, validate_template};
