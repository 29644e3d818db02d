//! Non-fatal advisories.
//!
//! Missing output state never fails a call. The call logs one of these at
//! `warn` level, records it, and does nothing further.

use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advisory {
    /// Tool types present more than once on a figure (sorted type names)
    RepeatedTools(Vec<String>),
    /// Pan/zoom tools dropped because a range is categorical
    RemovedTools(Vec<String>),
    NothingToShow,
    NothingSaved,
    NoCurrentPlot,
    DefaultResources,
    DefaultTitle(String),
    NothingPushed,
    NothingPulled,
    OutputFileExists(PathBuf),
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::RepeatedTools(names) => write!(f, "{} are being repeated", names.join(",")),
            Advisory::RemovedTools(names) => write!(
                f,
                "categorical plots do not support pan and zoom operations; removing tool(s): {}",
                names.join(", ")
            ),
            Advisory::NothingToShow => write!(
                f,
                "no current plot to show; add glyphs to a figure (circle, rect, etc.) first"
            ),
            Advisory::NothingSaved => write!(
                f,
                "save() called but no filename was supplied and output_file(...) was never called, nothing saved"
            ),
            Advisory::NoCurrentPlot => write!(
                f,
                "no current plot to save; add glyphs to a figure (circle, rect, etc.) first"
            ),
            Advisory::DefaultResources => write!(
                f,
                "save() called but no resources were supplied and output_file(...) was never called, defaulting to inline resources"
            ),
            Advisory::DefaultTitle(title) => write!(
                f,
                "save() called but no title was supplied and output_file(...) was never called, using default title '{title}'"
            ),
            Advisory::NothingPushed => write!(
                f,
                "push() called but no session was supplied and output_server(...) was never called, nothing pushed"
            ),
            Advisory::NothingPulled => write!(
                f,
                "pull() called but output_server(...) was never called, nothing loaded"
            ),
            Advisory::OutputFileExists(path) => write!(
                f,
                "output file '{}' already exists, will be overwritten",
                path.display()
            ),
        }
    }
}

impl Advisory {
    pub(crate) fn emit(self) -> Self {
        tracing::warn!("{}", self);
        self
    }
}
