use std::path::PathBuf;

use crate::resources::{ResourceMode, Resources};
use crate::runtime::OpenMode;
use crate::session::Session;

pub const DEFAULT_TITLE: &str = "Vidi Plot";

/// Active file output, installed by `OutputContext::output_file`.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputFileConfig {
    pub filename: PathBuf,
    pub resources: Resources,
    /// Save after every drawing call
    pub autosave: bool,
    pub title: String,
}

/// Options for `OutputContext::output_file`
#[derive(Clone, Debug)]
pub struct FileOptions {
    pub title: String,
    pub autosave: bool,
    pub mode: ResourceMode,
    /// Bundle directory for relative/absolute resource modes
    pub root_dir: Option<PathBuf>,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            autosave: false,
            mode: ResourceMode::Inline,
            root_dir: None,
        }
    }
}

impl FileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn autosave(mut self, on: bool) -> Self {
        self.autosave = on;
        self
    }

    pub fn mode(mut self, mode: ResourceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(dir.into());
        self
    }

    pub(crate) fn into_config(self, filename: PathBuf) -> OutputFileConfig {
        let mut resources = Resources::new(self.mode);
        resources.root_dir = self.root_dir;
        OutputFileConfig {
            filename,
            resources,
            autosave: self.autosave,
            title: self.title,
        }
    }
}

/// Options for `OutputContext::output_server`
#[derive(Debug)]
pub struct ServerOptions {
    /// Use this session instead of creating one
    pub session: Option<Session>,
    pub url: Option<String>,
    /// Session name; defaults to the url
    pub name: Option<String>,
    /// Empty the current document after loading the remote one
    pub clear: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            session: None,
            url: None,
            name: None,
            clear: true,
        }
    }
}

impl ServerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }
}

/// Options for `OutputContext::output_notebook`
#[derive(Debug, Default)]
pub struct NotebookOptions {
    pub url: Option<String>,
    pub docname: Option<String>,
    pub session: Option<Session>,
    pub name: Option<String>,
    /// Reload the client bundle even if already loaded
    pub force: bool,
}

impl NotebookOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn docname(mut self, docname: impl Into<String>) -> Self {
        self.docname = Some(docname.into());
        self
    }

    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub(crate) fn wants_server(&self) -> bool {
        self.session.is_some() || self.url.is_some() || self.name.is_some()
    }
}

/// Options for `OutputContext::show`
#[derive(Clone, Debug, Default)]
pub struct ShowOptions {
    /// Browser application name; the system default when unset
    pub browser: Option<String>,
    pub new: OpenMode,
    /// Page to open in server mode instead of the document link
    pub url: Option<String>,
}

impl ShowOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn browser(mut self, browser: impl Into<String>) -> Self {
        self.browser = Some(browser.into());
        self
    }

    pub fn new_window(mut self) -> Self {
        self.new = OpenMode::Window;
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Options for `OutputContext::save`; unset fields fall back to the active
/// file output.
#[derive(Clone, Debug, Default)]
pub struct SaveOptions {
    pub filename: Option<PathBuf>,
    pub resources: Option<Resources>,
    pub title: Option<String>,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn resources(mut self, resources: Resources) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
