pub mod api;
pub mod compiler;
pub mod config;
pub mod error;
pub mod lexer;
pub mod pitch;
pub mod score;
pub mod timeline;

pub use api::{compile, compile_with_options, Compilation};
pub use config::CompileOptions;
pub use error::{Diagnostic, OmniError, Severity};
pub use score::*;
