pub mod config;
pub mod core;
pub mod document;
pub mod embed;
pub mod figure;
pub mod output;
pub mod resources;
pub mod runtime;
pub mod session;
pub mod splat;
pub mod tools;
pub mod warnings;

use std::path::PathBuf;

/// Errors raised by the plotting front end.
///
/// Missing-state conditions (nothing to show, nothing saved, no session) are
/// not errors; they surface as [`warnings::Advisory`] values instead.
#[derive(Debug, thiserror::Error)]
pub enum PlottingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to write {}", .0.display())]
    Io(PathBuf),

    #[error("plot server request failed: {0}")]
    Transport(String),

    #[error("failed to serialize document")]
    Serialization,
}

pub type Result<T> = std::result::Result<T, error_stack::Report<PlottingError>>;

pub mod prelude {
    pub use crate::config::*;
    pub use crate::core::*;
    pub use crate::document::*;
    pub use crate::figure::*;
    pub use crate::output::*;
    pub use crate::resources::*;
    pub use crate::runtime::*;
    pub use crate::session::*;
    pub use crate::splat::*;
    pub use crate::tools::*;
    pub use crate::warnings::*;
}
