//! Shared infrastructure for the Maps compiler: source spans, diagnostic
//! severities, scoped compiler options, pragmas and `maps.toml` config.

pub mod config;
pub mod error;
pub mod options;
pub mod pragma;
pub mod span;

pub use error::Severity;
pub use options::{CompilerOption, CompilerOptions, OptionsGuard};
pub use span::{SourceLocation, Span};
