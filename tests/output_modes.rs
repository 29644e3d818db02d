mod common;

use std::fs;

use error_stack::Report;
use pretty_assertions::assert_eq;
use vidi_plotting::PlottingError;
use vidi_plotting::prelude::*;

use common::{harness, memory_session};

fn line(ctx: &mut OutputContext) -> ModelId {
    ctx.draw(|p| p.line([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], None))
        .unwrap()
}

/* -------------------- FILE -------------------- */

#[test]
fn later_output_file_replaces_earlier() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b) = (dir.path().join("a.html"), dir.path().join("b.html"));
    let mut h = harness();

    h.ctx.output_file(a, FileOptions::new());
    h.ctx.output_file(b.clone(), FileOptions::new().title("B"));

    let file = h.ctx.file_output().unwrap();
    assert_eq!(file.filename, b);
    assert_eq!(file.title, "B");
}

#[test]
fn output_file_warns_when_target_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("existing.html");
    fs::write(&path, "old").unwrap();

    let mut h = harness();
    h.ctx.output_file(path.clone(), FileOptions::new());
    assert_eq!(h.ctx.advisories(), &[Advisory::OutputFileExists(path)]);
}

#[test]
fn save_without_any_filename_writes_nothing() {
    let mut h = harness();
    line(&mut h.ctx);

    let outcome = h.ctx.save(None, SaveOptions::new()).unwrap();
    assert_eq!(outcome, SaveOutcome::Skipped(Advisory::NothingSaved));
    assert_eq!(h.ctx.advisories(), &[Advisory::NothingSaved]);
}

#[test]
fn save_with_explicit_filename_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plot.html");
    let mut h = harness();
    line(&mut h.ctx);

    let outcome = h
        .ctx
        .save(None, SaveOptions::new().filename(path.clone()))
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Saved(path.clone()));
    assert_eq!(
        h.ctx.advisories(),
        &[
            Advisory::DefaultResources,
            Advisory::DefaultTitle(DEFAULT_TITLE.to_string())
        ]
    );

    let html = fs::read_to_string(&path).unwrap();
    assert!(html.contains("<title>Vidi Plot</title>"));
    assert!(html.contains("\"Line\""));
}

#[test]
fn save_uses_output_file_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.html");
    let mut h = harness();
    h.ctx.output_file(
        path.clone(),
        FileOptions::new().title("Quarterly").mode(ResourceMode::Cdn),
    );
    line(&mut h.ctx);

    h.ctx.save(None, SaveOptions::new()).unwrap();
    assert!(h.ctx.advisories().is_empty());

    let html = fs::read_to_string(&path).unwrap();
    assert!(html.contains("<title>Quarterly</title>"));
    assert!(html.contains(CDN_ROOT));
}

#[test]
fn save_without_current_plot_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.html");
    let mut h = harness();
    h.ctx.output_file(path.clone(), FileOptions::new());

    let outcome = h.ctx.save(None, SaveOptions::new()).unwrap();
    assert_eq!(outcome, SaveOutcome::Skipped(Advisory::NoCurrentPlot));
    assert!(!path.exists());
}

#[test]
fn save_explicit_document_renders_every_plot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.html");
    let mut h = harness();
    let a = h.ctx.figure(FigureOptions::new().title("first")).unwrap();
    let b = h.ctx.figure(FigureOptions::new().title("second")).unwrap();

    let mut doc = Document::new();
    doc.add(&a);
    doc.add(&b);
    h.ctx
        .save(Some(doc.into()), SaveOptions::new().filename(path.clone()))
        .unwrap();

    let html = fs::read_to_string(&path).unwrap();
    assert!(html.contains("\"first\""));
    assert!(html.contains("\"second\""));
}

#[test]
fn autosave_follows_each_draw() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auto.html");
    let mut h = harness();
    h.ctx
        .output_file(path.clone(), FileOptions::new().autosave(true));

    line(&mut h.ctx);
    assert!(path.exists());
}

#[test]
fn show_in_file_mode_saves_and_opens_absolute_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shown.html");
    let mut h = harness();
    h.ctx.output_file(path.clone(), FileOptions::new());
    line(&mut h.ctx);

    h.ctx
        .show(None, ShowOptions::new().browser("firefox").new_window())
        .unwrap();

    assert!(path.exists());
    assert_eq!(
        h.browser.requests(),
        vec![(
            format!("file://{}", path.display()),
            Some("firefox".to_string()),
            OpenMode::Window
        )]
    );
}

#[test]
fn show_with_empty_document_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.html");
    let mut h = harness();
    h.ctx.output_file(path.clone(), FileOptions::new());

    h.ctx.show(None, ShowOptions::new()).unwrap();
    assert_eq!(h.ctx.advisories(), &[Advisory::NothingToShow]);
    assert!(!path.exists());
    assert!(h.browser.urls().is_empty());
}

#[test]
fn show_without_output_mode_is_silent() {
    let mut h = harness();
    line(&mut h.ctx);
    h.ctx.show(None, ShowOptions::new()).unwrap();
    assert!(h.ctx.advisories().is_empty());
    assert!(h.browser.urls().is_empty());
    assert!(h.display.published().is_empty());
}

/* -------------------- SERVER -------------------- */

#[test]
fn output_server_loads_then_clears_by_default() {
    let transport = MemoryTransport::new();
    let remote = Document::single(Figure::new(FigureOptions::new()).unwrap());
    transport.seed("shared", &remote).unwrap();

    let mut kept = harness();
    kept.ctx
        .output_server(
            "shared",
            ServerOptions::new()
                .session(memory_session(&transport))
                .clear(false),
        )
        .unwrap();
    assert_eq!(kept.ctx.curdoc().plots().len(), 1);
    assert_eq!(
        kept.ctx.curplot().map(|p| p.id()),
        Some(remote.plots()[0].id())
    );

    let mut cleared = harness();
    cleared
        .ctx
        .output_server(
            "shared",
            ServerOptions::new().session(memory_session(&transport)),
        )
        .unwrap();
    assert!(cleared.ctx.curdoc().is_empty());
    assert!(cleared.ctx.cursession().is_some());
}

#[test]
fn drawing_pushes_when_autostore_is_on() {
    let transport = MemoryTransport::new();
    let mut h = harness();
    h.ctx
        .output_server(
            "report",
            ServerOptions::new().session(memory_session(&transport)),
        )
        .unwrap();

    line(&mut h.ctx);
    assert_eq!(transport.store_count(), 1);
    let stored = transport.stored("report").unwrap();
    assert_eq!(stored["plots"].as_array().map(Vec::len), Some(1));

    h.ctx.curdoc_mut().autostore = false;
    line(&mut h.ctx);
    assert_eq!(transport.store_count(), 1);
}

#[test]
fn show_in_server_mode_opens_object_link() {
    let transport = MemoryTransport::new();
    let mut h = harness();
    h.ctx
        .output_server(
            "report",
            ServerOptions::new().session(memory_session(&transport)),
        )
        .unwrap();
    line(&mut h.ctx);

    h.ctx.show(None, ShowOptions::new()).unwrap();
    let context = h.ctx.curdoc().context_id();
    assert_eq!(
        h.browser.urls(),
        vec![format!("http://plots.test:5006/d/doc-1/{context}")]
    );

    h.ctx
        .show(None, ShowOptions::new().url("http://elsewhere/"))
        .unwrap();
    assert_eq!(h.browser.urls().last().map(String::as_str), Some("http://elsewhere/"));
}

#[test]
fn pull_merges_another_clients_plots() {
    let transport = MemoryTransport::new();

    let mut writer = harness();
    writer
        .ctx
        .output_server(
            "shared",
            ServerOptions::new().session(memory_session(&transport)),
        )
        .unwrap();
    line(&mut writer.ctx);

    let mut reader = harness();
    reader
        .ctx
        .output_server(
            "shared",
            ServerOptions::new().session(memory_session(&transport)),
        )
        .unwrap();
    assert!(reader.ctx.curdoc().is_empty());

    reader.ctx.pull().unwrap();
    assert_eq!(reader.ctx.curdoc().plots().len(), 1);
}

#[test]
fn push_with_explicit_session_and_document() {
    let transport = MemoryTransport::new();
    let mut session = memory_session(&transport);
    session.use_doc("explicit").unwrap();
    let doc = Document::single(Figure::new(FigureOptions::new()).unwrap());

    let mut h = harness();
    h.ctx.push_with(Some(&mut session), Some(&doc)).unwrap();

    assert!(h.ctx.advisories().is_empty());
    assert!(h.ctx.cursession().is_none());
    let stored = transport.stored("explicit").unwrap();
    assert_eq!(stored["context"], doc.context_id().0);
}

struct DownTransport;

impl Transport for DownTransport {
    fn use_doc(&mut self, root_url: &str, _title: &str) -> vidi_plotting::Result<RemoteDoc> {
        Err(Report::new(PlottingError::Transport(format!(
            "connection refused: {root_url}"
        ))))
    }

    fn load_document(
        &mut self,
        _root_url: &str,
        _remote: &RemoteDoc,
    ) -> vidi_plotting::Result<Option<DocumentState>> {
        Ok(None)
    }

    fn store_document(
        &mut self,
        _root_url: &str,
        _remote: &RemoteDoc,
        _state: &DocumentState,
    ) -> vidi_plotting::Result<()> {
        Ok(())
    }
}

#[test]
fn transport_failures_propagate() {
    let mut h = harness();
    let session = Session::with_transport("down", DEFAULT_SERVER_URL, DownTransport);
    let err = h
        .ctx
        .output_server("report", ServerOptions::new().session(session))
        .unwrap_err();
    assert!(matches!(
        err.current_context(),
        PlottingError::Transport(_)
    ));
}

/* -------------------- NOTEBOOK -------------------- */

#[test]
fn notebook_bundle_loads_once_unless_forced() {
    let mut h = harness();
    h.ctx.output_notebook(NotebookOptions::new()).unwrap();
    assert!(h.ctx.is_notebook());
    assert_eq!(h.display.published().len(), 1);
    assert!(h.display.published()[0].contains("vidi.min.js"));

    h.ctx.load_notebook(false);
    assert_eq!(h.display.published().len(), 1);
    h.ctx.load_notebook(true);
    assert_eq!(h.display.published().len(), 2);
}

#[test]
fn show_in_notebook_publishes_current_plot() {
    let mut h = harness();
    h.ctx.output_notebook(NotebookOptions::new()).unwrap();
    line(&mut h.ctx);

    h.ctx.show(None, ShowOptions::new()).unwrap();
    let published = h.display.published();
    assert_eq!(published.len(), 2);
    assert!(published[1].starts_with("<div class=\"vidi-root\""));
    assert!(h.browser.urls().is_empty());
}

#[test]
fn notebook_with_session_uses_autoload() {
    let transport = MemoryTransport::new();
    let mut h = harness();
    h.ctx
        .output_notebook(NotebookOptions::new().session(memory_session(&transport)))
        .unwrap();

    let title = h.ctx.cursession().unwrap().remote().unwrap().title.clone();
    assert!(title.starts_with("Notebook Session at "));
    assert!(h.display.published().is_empty());

    line(&mut h.ctx);
    h.ctx.show(None, ShowOptions::new()).unwrap();
    let published = h.display.published();
    assert_eq!(published.len(), 1);
    assert!(published[0].contains("autoload.js"));
    assert!(transport.stored(&title).is_some());
}

/* -------------------- LIFECYCLE -------------------- */

#[test]
fn reset_output_clears_every_mode() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::new();
    let mut h = harness();
    h.ctx
        .output_file(dir.path().join("x.html"), FileOptions::new());
    h.ctx
        .output_notebook(NotebookOptions::new().session(memory_session(&transport)))
        .unwrap();
    line(&mut h.ctx);
    let old_context = h.ctx.curdoc().context_id();

    h.ctx.reset_output();

    assert!(h.ctx.cursession().is_none());
    assert!(h.ctx.file_output().is_none());
    assert!(!h.ctx.is_notebook());
    assert!(h.ctx.curdoc().is_empty());
    assert_ne!(h.ctx.curdoc().context_id(), old_context);
}

#[test]
fn gridplot_replaces_subplots_at_top_level() {
    let mut h = harness();
    let figs: Vec<_> = (0..4)
        .map(|_| h.ctx.figure(FigureOptions::new()).unwrap())
        .collect();
    let p1_id = figs[0].read().id;

    let grid = h
        .ctx
        .gridplot(
            vec![
                vec![figs[0].clone(), figs[1].clone()],
                vec![figs[2].clone(), figs[3].clone()],
            ],
            Some("overview"),
        )
        .unwrap();

    let grid_id = grid.read().id;
    let doc = h.ctx.curdoc();
    assert!(!doc.contains(p1_id));
    assert!(doc.contains(grid_id));
    assert_eq!(doc.plots().len(), 1);
    assert_eq!(h.ctx.curplot().map(|p| p.id()), Some(grid_id));
    assert_eq!(grid.read().name.as_deref(), Some("overview"));
}

#[test]
fn draw_after_gridplot_starts_a_new_figure() {
    let mut h = harness();
    let a = h.ctx.figure(FigureOptions::new()).unwrap();
    h.ctx.gridplot(vec![vec![a]], None).unwrap();

    line(&mut h.ctx);
    let plot = h.ctx.curplot().unwrap();
    assert!(plot.as_figure().is_some());
    assert_eq!(h.ctx.curdoc().plots().len(), 2);
}

/* -------------------- FAILED TRANSITIONS -------------------- */

#[test]
fn failed_notebook_server_bind_leaves_context_untouched() {
    let mut h = harness();
    let down = Session::with_transport("down", DEFAULT_SERVER_URL, DownTransport);
    let result = h.ctx.output_notebook(NotebookOptions::new().session(down));

    assert!(result.is_err());
    assert!(!h.ctx.is_notebook());
    assert!(h.ctx.cursession().is_none());
    line(&mut h.ctx);
}

#[test]
fn failed_server_bind_keeps_previous_session() {
    let transport = MemoryTransport::new();
    let mut h = harness();
    h.ctx
        .output_server(
            "report",
            ServerOptions::new().session(memory_session(&transport)),
        )
        .unwrap();

    let down = Session::with_transport("down", DEFAULT_SERVER_URL, DownTransport);
    assert!(
        h.ctx
            .output_server("other", ServerOptions::new().session(down))
            .is_err()
    );
    assert_eq!(h.ctx.cursession().map(Session::name), Some("test"));

    line(&mut h.ctx);
    assert_eq!(transport.store_count(), 1);
}

/* -------------------- DEFAULT RESOURCES -------------------- */

#[test]
fn default_saved_page_loads_the_client_script() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("default.html");
    let mut h = harness();
    h.ctx.output_file(path.clone(), FileOptions::new());
    line(&mut h.ctx);

    h.ctx.save(None, SaveOptions::new()).unwrap();
    let html = fs::read_to_string(&path).unwrap();
    assert!(html.contains("vidi.embed.embedItems"));
    assert!(html.contains(&format!(
        "src=\"{CDN_ROOT}@{CLIENT_VERSION}/dist/vidi.min.js\""
    )));
}

/* -------------------- GRID SIDE EFFECTS -------------------- */

#[test]
fn gridplot_pushes_the_grid_as_the_only_top_level_plot() {
    let transport = MemoryTransport::new();
    let mut h = harness();
    h.ctx
        .output_server(
            "grid",
            ServerOptions::new().session(memory_session(&transport)),
        )
        .unwrap();
    let a = h.ctx.figure(FigureOptions::new()).unwrap();
    let b = h.ctx.figure(FigureOptions::new()).unwrap();
    assert_eq!(transport.store_count(), 0);

    h.ctx.gridplot(vec![vec![a, b]], None).unwrap();

    assert_eq!(transport.store_count(), 1);
    let stored = transport.stored("grid").unwrap();
    let plots = stored["plots"].as_array().unwrap();
    assert_eq!(plots.len(), 1);
    assert_eq!(plots[0]["type"], "GridPlot");
    assert_eq!(plots[0]["children"][0].as_array().map(Vec::len), Some(2));
}

#[test]
fn gridplot_autosaves_in_file_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.html");
    let mut h = harness();
    h.ctx
        .output_file(path.clone(), FileOptions::new().autosave(true));
    let a = h.ctx.figure(FigureOptions::new()).unwrap();
    assert!(!path.exists());

    h.ctx.gridplot(vec![vec![a]], Some("solo")).unwrap();
    let html = fs::read_to_string(&path).unwrap();
    assert!(html.contains("\"GridPlot\""));
    assert!(html.contains("\"solo\""));
}

/* -------------------- TARGET RESOLUTION -------------------- */

#[test]
fn show_falls_back_to_current_plot_without_autoadd() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("detached.html");
    let mut h = harness();
    h.ctx.curdoc_mut().autoadd = false;
    h.ctx.output_file(path.clone(), FileOptions::new());
    line(&mut h.ctx);
    assert!(h.ctx.curdoc().is_empty());

    h.ctx.show(None, ShowOptions::new()).unwrap();
    assert!(h.ctx.advisories().is_empty());
    assert!(path.exists());
    assert_eq!(h.browser.urls().len(), 1);
}

#[test]
fn show_explicit_document_in_server_mode_pushes_current_document() {
    let transport = MemoryTransport::new();
    let mut h = harness();
    h.ctx
        .output_server(
            "report",
            ServerOptions::new().session(memory_session(&transport)),
        )
        .unwrap();
    line(&mut h.ctx);

    let other = Document::single(Figure::new(FigureOptions::new()).unwrap());
    h.ctx.show(Some(other.clone().into()), ShowOptions::new()).unwrap();

    let context = h.ctx.curdoc().context_id();
    let stored = transport.stored("report").unwrap();
    assert_eq!(stored["context"], context.0);
    assert_eq!(stored["plots"].as_array().map(Vec::len), Some(2));
    assert!(h.ctx.curdoc().contains(other.plots()[0].id()));
    assert_eq!(
        h.browser.urls(),
        vec![format!("http://plots.test:5006/d/doc-1/{context}")]
    );
}
