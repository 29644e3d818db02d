//! How the client-side script bundle is referenced from generated HTML.

use std::path::{Path, PathBuf};

pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CDN_ROOT: &str = "https://cdn.jsdelivr.net/npm/vidi-client";

const JS_FILE: &str = "vidi.min.js";
const CSS_FILE: &str = "vidi.min.css";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResourceMode {
    /// Script and styles embedded in the page
    #[default]
    Inline,
    Cdn,
    /// Paths relative to the output file's directory
    Relative,
    Absolute,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resources {
    pub mode: ResourceMode,
    /// Directory holding the bundle files for relative/absolute modes
    pub root_dir: Option<PathBuf>,
    /// Bundle contents for inline mode
    pub js_raw: String,
    pub css_raw: String,
}

impl Resources {
    pub fn new(mode: ResourceMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn inline() -> Self {
        Self::new(ResourceMode::Inline)
    }

    pub fn cdn() -> Self {
        Self::new(ResourceMode::Cdn)
    }

    pub fn with_root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(dir.into());
        self
    }

    pub fn with_inline_bundle(mut self, js: impl Into<String>, css: impl Into<String>) -> Self {
        self.js_raw = js.into();
        self.css_raw = css.into();
        self
    }

    /// Inline mode without a bundle cannot render, so it links the CDN.
    fn effective_mode(&self) -> ResourceMode {
        match self.mode {
            ResourceMode::Inline if self.js_raw.is_empty() => ResourceMode::Cdn,
            mode => mode,
        }
    }

    fn file_url(&self, file: &str) -> String {
        match self.effective_mode() {
            ResourceMode::Cdn => format!("{CDN_ROOT}@{CLIENT_VERSION}/dist/{file}"),
            ResourceMode::Relative => {
                let dir = self.root_dir.as_deref().unwrap_or(Path::new("."));
                dir.join(file).to_string_lossy().replace('\\', "/")
            }
            ResourceMode::Absolute => {
                let dir = self
                    .root_dir
                    .clone()
                    .or_else(|| std::env::current_dir().ok())
                    .unwrap_or_default();
                format!("file://{}", dir.join(file).display())
            }
            ResourceMode::Inline => String::new(),
        }
    }

    /// `<script>` tags loading the client bundle.
    pub fn render_js(&self) -> String {
        if self.mode != self.effective_mode() {
            tracing::warn!("no inline client bundle loaded, linking {CDN_ROOT} instead");
        }
        match self.effective_mode() {
            ResourceMode::Inline => {
                format!("<script type=\"text/javascript\">\n{}\n</script>", self.js_raw)
            }
            _ => format!(
                "<script type=\"text/javascript\" src=\"{}\"></script>",
                self.file_url(JS_FILE)
            ),
        }
    }

    /// `<style>`/`<link>` tags for the client bundle.
    pub fn render_css(&self) -> String {
        match self.effective_mode() {
            ResourceMode::Inline => format!("<style>\n{}\n</style>", self.css_raw),
            _ => format!(
                "<link rel=\"stylesheet\" href=\"{}\" type=\"text/css\" />",
                self.file_url(CSS_FILE)
            ),
        }
    }
}
