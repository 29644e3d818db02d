//! Sinks outside the process: the system browser and a notebook display.

use std::io::{self, Write};

/// How a browser should present a newly opened page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpenMode {
    #[default]
    Tab,
    Window,
}

impl OpenMode {
    /// Conventional numeric code (1 = new window, 2 = new tab).
    pub fn code(self) -> u8 {
        match self {
            OpenMode::Tab => 2,
            OpenMode::Window => 1,
        }
    }
}

pub trait BrowserController: Send {
    /// Open `url`, in the named browser application when one is given.
    fn open(&mut self, url: &str, browser: Option<&str>, mode: OpenMode) -> io::Result<()>;
}

/// The platform's default URL handler.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemBrowser;

impl BrowserController for SystemBrowser {
    fn open(&mut self, url: &str, browser: Option<&str>, mode: OpenMode) -> io::Result<()> {
        tracing::debug!(url, browser, mode = mode.code(), "opening browser");
        match browser {
            Some(app) => open::with(url, app),
            None => open::that(url),
        }
    }
}

/// Discards every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoBrowser;

impl BrowserController for NoBrowser {
    fn open(&mut self, _url: &str, _browser: Option<&str>, _mode: OpenMode) -> io::Result<()> {
        Ok(())
    }
}

pub trait DisplaySink: Send {
    fn display_html(&mut self, html: &str) -> io::Result<()>;
}

/// Rich output for the evcxr Jupyter kernel, written to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct EvcxrDisplay;

impl EvcxrDisplay {
    pub fn write_to<W: Write>(out: &mut W, html: &str) -> io::Result<()> {
        writeln!(out, "EVCXR_BEGIN_CONTENT text/html")?;
        writeln!(out, "{html}")?;
        writeln!(out, "EVCXR_END_CONTENT")?;
        out.flush()
    }
}

impl DisplaySink for EvcxrDisplay {
    fn display_html(&mut self, html: &str) -> io::Result<()> {
        Self::write_to(&mut io::stdout().lock(), html)
    }
}
