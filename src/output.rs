//! The output-mode state machine and display dispatch.
//!
//! An [`OutputContext`] owns the current document plus the three independent
//! output modes (file, server session, notebook). Drawing goes through the
//! context so that pushes and saves follow each change.

use std::fmt;
use std::path::PathBuf;

use error_stack::ResultExt;
use tracing::{debug, info, warn};

use crate::PlottingError;
use crate::config::{
    DEFAULT_TITLE, FileOptions, NotebookOptions, OutputFileConfig, SaveOptions, ServerOptions,
    ShowOptions,
};
use crate::document::{Document, GridPlot, PlotRef, Shared, shared};
use crate::embed;
use crate::figure::{Figure, FigureOptions};
use crate::resources::Resources;
use crate::runtime::{BrowserController, DisplaySink, EvcxrDisplay, SystemBrowser};
use crate::session::{DEFAULT_SERVER_URL, Session};
use crate::warnings::Advisory;

/// Something `show` and `save` can render.
#[derive(Clone, Debug)]
pub enum Showable {
    Plot(PlotRef),
    Document(Document),
}

impl Showable {
    fn into_document(self) -> Document {
        match self {
            Showable::Plot(plot) => Document::single(plot),
            Showable::Document(doc) => doc,
        }
    }
}

impl From<PlotRef> for Showable {
    fn from(p: PlotRef) -> Self {
        Self::Plot(p)
    }
}

impl From<Shared<Figure>> for Showable {
    fn from(f: Shared<Figure>) -> Self {
        Self::Plot(f.into())
    }
}

impl From<&Shared<Figure>> for Showable {
    fn from(f: &Shared<Figure>) -> Self {
        Self::Plot(f.into())
    }
}

impl From<Shared<GridPlot>> for Showable {
    fn from(g: Shared<GridPlot>) -> Self {
        Self::Plot(g.into())
    }
}

impl From<&Shared<GridPlot>> for Showable {
    fn from(g: &Shared<GridPlot>) -> Self {
        Self::Plot(g.clone().into())
    }
}

impl From<Document> for Showable {
    fn from(d: Document) -> Self {
        Self::Document(d)
    }
}

impl From<&Document> for Showable {
    fn from(d: &Document) -> Self {
        Self::Document(d.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    Skipped(Advisory),
}

enum ShowAction {
    Display(String),
    Open(String),
}

pub struct OutputContext {
    document: Document,
    session: Option<Session>,
    file: Option<OutputFileConfig>,
    notebook: bool,
    notebook_loaded: bool,
    browser: Box<dyn BrowserController>,
    display: Box<dyn DisplaySink>,
    advisories: Vec<Advisory>,
}

impl fmt::Debug for OutputContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputContext")
            .field("document", &self.document)
            .field("session", &self.session)
            .field("file", &self.file)
            .field("notebook", &self.notebook)
            .field("advisories", &self.advisories)
            .finish_non_exhaustive()
    }
}

impl Default for OutputContext {
    fn default() -> Self {
        Self {
            document: Document::new(),
            session: None,
            file: None,
            notebook: false,
            notebook_loaded: false,
            browser: Box::new(SystemBrowser),
            display: Box::new(EvcxrDisplay),
            advisories: vec![],
        }
    }
}

impl OutputContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_browser(mut self, browser: impl BrowserController + 'static) -> Self {
        self.browser = Box::new(browser);
        self
    }

    pub fn with_display(mut self, display: impl DisplaySink + 'static) -> Self {
        self.display = Box::new(display);
        self
    }

    /* -------------------- STATE -------------------- */

    pub fn curdoc(&self) -> &Document {
        &self.document
    }

    pub fn curdoc_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn curplot(&self) -> Option<PlotRef> {
        self.document.curplot().cloned()
    }

    pub fn cursession(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn cursession_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub fn file_output(&self) -> Option<&OutputFileConfig> {
        self.file.as_ref()
    }

    pub fn is_notebook(&self) -> bool {
        self.notebook
    }

    /// Advisories raised by this context, oldest first.
    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    pub fn take_advisories(&mut self) -> Vec<Advisory> {
        std::mem::take(&mut self.advisories)
    }

    fn advise(&mut self, advisory: Advisory) {
        self.advisories.push(advisory.emit());
    }

    fn skip(&mut self, advisory: Advisory) -> SaveOutcome {
        let advisory = advisory.emit();
        self.advisories.push(advisory.clone());
        SaveOutcome::Skipped(advisory)
    }

    /* -------------------- MODES -------------------- */

    /// Drop every output mode and start over with an empty document.
    pub fn reset_output(&mut self) {
        self.document = Document::new();
        self.session = None;
        self.file = None;
        self.notebook = false;
        debug!("output reset");
    }

    /// Direct `show` and autosave to an HTML file, replacing any previous
    /// file output.
    pub fn output_file(&mut self, filename: impl Into<PathBuf>, opts: FileOptions) {
        let filename = filename.into();
        if filename.exists() {
            self.advise(Advisory::OutputFileExists(filename.clone()));
        }
        debug!(path = %filename.display(), "file output enabled");
        self.file = Some(opts.into_config(filename));
    }

    /// Bind to `docname` on a plot server and merge its contents into the
    /// current document.
    pub fn output_server(&mut self, docname: &str, opts: ServerOptions) -> crate::Result<()> {
        let ServerOptions {
            session,
            url,
            name,
            clear,
        } = opts;

        let reused = session.is_none() && self.session.is_some();
        let mut session = match session.or_else(|| self.session.take()) {
            Some(session) => session,
            None => {
                let url = url.unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
                let name = name.unwrap_or_else(|| url.clone());
                Session::new(name, url)
            }
        };

        // Only a bound session is installed; a failed bind keeps the previous one.
        let bound = session
            .use_doc(docname)
            .and_then(|()| session.load_document(&mut self.document));
        if let Err(e) = bound {
            if reused {
                self.session = Some(session);
            }
            return Err(e);
        }

        if clear {
            self.document.clear();
        }
        info!(docname, root = session.root_url(), "server output enabled");
        self.session = Some(session);
        Ok(())
    }

    /// Render into notebook cells; with a session, url or name also binds a
    /// server document.
    pub fn output_notebook(&mut self, opts: NotebookOptions) -> crate::Result<()> {
        if !opts.wants_server() {
            self.notebook = true;
            self.load_notebook(opts.force);
            return Ok(());
        }

        let docname = opts.docname.unwrap_or_else(|| {
            format!(
                "Notebook Session at {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            )
        });
        let server = ServerOptions {
            session: opts.session,
            url: opts.url,
            name: opts.name,
            clear: true,
        };
        self.output_server(&docname, server)?;
        self.notebook = true;
        Ok(())
    }

    /// Send the client bundle to the display sink once per context.
    pub fn load_notebook(&mut self, force: bool) {
        if self.notebook_loaded && !force {
            return;
        }
        let resources = Resources::cdn();
        let html = format!("{}\n{}", resources.render_css(), resources.render_js());
        self.display_html(&html);
        self.notebook_loaded = true;
    }

    fn display_html(&mut self, html: &str) {
        if let Err(e) = self.display.display_html(html) {
            warn!("failed to publish display data: {e}");
        }
    }

    fn open_browser(&mut self, url: &str, opts: &ShowOptions) {
        if let Err(e) = self.browser.open(url, opts.browser.as_deref(), opts.new) {
            warn!(url, "failed to open browser: {e}");
        }
    }

    /* -------------------- DISPATCH -------------------- */

    fn resolve_target(&self, obj: Option<Showable>) -> Option<Showable> {
        match obj {
            Some(obj) => Some(obj),
            None if self.notebook => self.document.curplot().cloned().map(Showable::Plot),
            None if self.document.is_empty() => {
                self.document.curplot().cloned().map(Showable::Plot)
            }
            None => Some(Showable::Document(self.document.clone())),
        }
    }

    /// Display `obj` (or the current plot/document) on every active output.
    pub fn show(&mut self, obj: Option<Showable>, opts: ShowOptions) -> crate::Result<()> {
        let Some(target) = self.resolve_target(obj) else {
            self.advise(Advisory::NothingToShow);
            return Ok(());
        };

        if self.session.is_some() {
            match target {
                Showable::Document(doc) => {
                    for plot in doc.plots() {
                        self.document.add(plot.clone());
                    }
                }
                Showable::Plot(plot) => self.document.add(plot),
            }
            self.push()?;

            let action = match self.session.as_ref() {
                Some(session) if self.notebook => {
                    ShowAction::Display(embed::autoload_server(&self.document, session)?)
                }
                Some(session) => ShowAction::Open(
                    opts.url
                        .clone()
                        .unwrap_or_else(|| session.object_link(self.document.context_id())),
                ),
                None => return Ok(()),
            };
            match action {
                ShowAction::Display(html) => self.display_html(&html),
                ShowAction::Open(url) => self.open_browser(&url, &opts),
            }
        } else if self.notebook {
            let div = embed::notebook_div(&target.into_document())?;
            self.display_html(&div);
        } else if let Some(file) = &self.file {
            let opts_save = SaveOptions::new().filename(file.filename.clone());
            if let SaveOutcome::Saved(path) = self.save(Some(target), opts_save)? {
                let path = std::path::absolute(&path).unwrap_or(path);
                self.open_browser(&format!("file://{}", path.display()), &opts);
            }
        } else {
            debug!("show() called with no output configured");
        }
        Ok(())
    }

    /// Write `obj` (or the current plot) to an HTML file.
    ///
    /// Filename, resources and title come from `opts`, then the active file
    /// output, then defaults. A missing filename or current plot skips the
    /// write with an advisory.
    pub fn save(&mut self, obj: Option<Showable>, opts: SaveOptions) -> crate::Result<SaveOutcome> {
        let SaveOptions {
            filename,
            resources,
            title,
        } = opts;

        let Some(filename) = filename.or_else(|| self.file.as_ref().map(|f| f.filename.clone()))
        else {
            return Ok(self.skip(Advisory::NothingSaved));
        };

        let resources = match resources.or_else(|| self.file.as_ref().map(|f| f.resources.clone()))
        {
            Some(resources) => resources,
            None => {
                self.advise(Advisory::DefaultResources);
                Resources::inline()
            }
        };

        let title = match title.or_else(|| self.file.as_ref().map(|f| f.title.clone())) {
            Some(title) => title,
            None => {
                self.advise(Advisory::DefaultTitle(DEFAULT_TITLE.to_string()));
                DEFAULT_TITLE.to_string()
            }
        };

        let doc = match obj {
            Some(obj) => obj.into_document(),
            None => match self.document.curplot() {
                Some(plot) => Document::single(plot.clone()),
                None => return Ok(self.skip(Advisory::NoCurrentPlot)),
            },
        };

        let html = embed::file_html(&doc, &resources, &title)?;
        std::fs::write(&filename, html)
            .change_context_lazy(|| PlottingError::Io(filename.clone()))?;

        info!(path = %filename.display(), "saved plot");
        Ok(SaveOutcome::Saved(filename))
    }

    /// Store the current document through the active session.
    pub fn push(&mut self) -> crate::Result<()> {
        self.push_with(None, None)
    }

    /// Store `document` (default: the current one) through `session`
    /// (default: the active one).
    pub fn push_with(
        &mut self,
        session: Option<&mut Session>,
        document: Option<&Document>,
    ) -> crate::Result<()> {
        let document = document.unwrap_or(&self.document);
        let pushed = match session.or(self.session.as_mut()) {
            Some(session) => {
                session.store_document(document)?;
                true
            }
            None => false,
        };
        if !pushed {
            self.advise(Advisory::NothingPushed);
        }
        Ok(())
    }

    /// Reload the bound server document into the current document.
    pub fn pull(&mut self) -> crate::Result<()> {
        match self.session.as_mut() {
            Some(session) => session.load_document(&mut self.document),
            None => {
                self.advise(Advisory::NothingPulled);
                Ok(())
            }
        }
    }

    /* -------------------- BUILDING -------------------- */

    /// Create a figure and make it the current plot.
    pub fn figure(&mut self, opts: FigureOptions) -> crate::Result<Shared<Figure>> {
        let fig = shared(Figure::new(opts)?);
        if self.document.autoadd {
            self.document.add(&fig);
        }
        self.document.set_curplot(&fig);
        Ok(fig)
    }

    /// Apply `f` to the current figure (creating one if needed), then push
    /// and save according to the active outputs.
    pub fn draw<T>(&mut self, f: impl FnOnce(&mut Figure) -> T) -> crate::Result<T> {
        let fig = match self.document.curplot().and_then(PlotRef::as_figure) {
            Some(fig) => fig.clone(),
            None => self.figure(FigureOptions::new())?,
        };
        let out = f(&mut fig.write());
        self.push_or_save()?;
        Ok(out)
    }

    /// Arrange figures in rows. The subplots leave the document's top level
    /// and the grid becomes the current plot.
    pub fn gridplot(
        &mut self,
        rows: Vec<Vec<Shared<Figure>>>,
        name: Option<&str>,
    ) -> crate::Result<Shared<GridPlot>> {
        let mut grid = GridPlot::new(rows);
        if let Some(name) = name {
            grid = grid.with_name(name);
        }
        for id in grid.subplot_ids() {
            self.document.remove(id);
        }

        let grid = shared(grid);
        self.document.add(grid.clone());
        self.document.set_curplot(grid.clone());
        self.push_or_save()?;
        Ok(grid)
    }

    fn push_or_save(&mut self) -> crate::Result<()> {
        if self.session.is_some() && self.document.autostore {
            self.push()?;
        }
        if self.file.as_ref().is_some_and(|f| f.autosave) {
            self.save(None, SaveOptions::new())?;
        }
        Ok(())
    }
}
