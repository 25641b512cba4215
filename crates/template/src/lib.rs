//! Inline templates for navbar configuration values.
//!
//! A configuration field may hold either a literal value or a template string of the form
//! `[[[ <script> ]]]`. Templates are compiled once per distinct body, cached for the lifetime of
//! the [`TemplateCache`], and evaluated against a [`TemplateContext`] snapshot of host state.
//!
//! - [`TemplateEvaluator`]: the entry point used by everything that needs an effective value
//! - [`Templatable`]: the `Literal | Template` sum type used by configuration records
//! - [`is_template`], [`clean_template`], [`wrap_template`]: delimiter helpers for editors

mod cache;
mod compiler;
mod context;
mod delimiters;
mod error;
mod evaluator;
mod hash;
mod templatable;

#[cfg(test)]
mod test_evaluator;

pub use cache::{CacheStats, TemplateCache};
pub use context::{EntityState, HostContext, NavbarState, TemplateContext, User};
pub use delimiters::{clean_template, is_template, is_template_value, wrap_template};
pub use error::TemplateError;
pub use evaluator::TemplateEvaluator;
pub use hash::hash;
pub use templatable::{FromTemplateValue, Resolved, Templatable, TemplateString, truthy};

pub use compiler::{CompiledTemplate, TemplateCompiler, TemplateSettings};
