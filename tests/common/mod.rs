#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Once};

use parking_lot::Mutex;
use vidi_plotting::prelude::*;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Clone, Default)]
pub struct RecordingBrowser {
    opened: Arc<Mutex<Vec<(String, Option<String>, OpenMode)>>>,
}

impl RecordingBrowser {
    pub fn urls(&self) -> Vec<String> {
        self.opened.lock().iter().map(|(u, _, _)| u.clone()).collect()
    }

    pub fn requests(&self) -> Vec<(String, Option<String>, OpenMode)> {
        self.opened.lock().clone()
    }
}

impl BrowserController for RecordingBrowser {
    fn open(&mut self, url: &str, browser: Option<&str>, mode: OpenMode) -> io::Result<()> {
        self.opened
            .lock()
            .push((url.to_string(), browser.map(str::to_string), mode));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingDisplay {
    published: Arc<Mutex<Vec<String>>>,
}

impl RecordingDisplay {
    pub fn published(&self) -> Vec<String> {
        self.published.lock().clone()
    }
}

impl DisplaySink for RecordingDisplay {
    fn display_html(&mut self, html: &str) -> io::Result<()> {
        self.published.lock().push(html.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub ctx: OutputContext,
    pub browser: RecordingBrowser,
    pub display: RecordingDisplay,
}

pub fn harness() -> Harness {
    init_tracing();
    let browser = RecordingBrowser::default();
    let display = RecordingDisplay::default();
    let ctx = OutputContext::new()
        .with_browser(browser.clone())
        .with_display(display.clone());
    Harness {
        ctx,
        browser,
        display,
    }
}

pub fn memory_session(transport: &MemoryTransport) -> Session {
    Session::with_transport("test", "http://plots.test:5006/", transport.clone())
}
