//! HTML produced for each output sink.

use error_stack::{Report, ResultExt};
use serde::Serialize;

use crate::PlottingError;
use crate::document::Document;
use crate::resources::Resources;
use crate::session::Session;

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON safe to place inside a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> crate::Result<String> {
    let json = serde_json::to_string(value).change_context(PlottingError::Serialization)?;
    Ok(json.replace("</", "<\\/"))
}

fn embed_block(doc: &Document) -> crate::Result<String> {
    let context = doc.context_id();
    let json = script_json(&doc.state())?;
    Ok(format!(
        r#"<div class="vidi-root" id="vidi-{context}"></div>
<script type="application/json" id="vidi-doc-{context}">{json}</script>
<script type="text/javascript">
  vidi.embed.embedItems("vidi-doc-{context}", "vidi-{context}");
</script>"#
    ))
}

/// A standalone HTML page for `doc`.
pub fn file_html(doc: &Document, resources: &Resources, title: &str) -> crate::Result<String> {
    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
{css}
{js}
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
        css = resources.render_css(),
        js = resources.render_js(),
        body = embed_block(doc)?,
    ))
}

/// A fragment for a notebook cell; the client bundle must already be loaded.
pub fn notebook_div(doc: &Document) -> crate::Result<String> {
    embed_block(doc)
}

/// A script tag that fetches `doc` from the server `session` is bound to.
pub fn autoload_server(doc: &Document, session: &Session) -> crate::Result<String> {
    let Some(remote) = session.remote() else {
        return Err(Report::new(PlottingError::InvalidArgument(
            "session is not bound to a server document".into(),
        )));
    };
    let context = doc.context_id();
    let root = session.root_url();
    Ok(format!(
        r#"<script src="{src}" id="vidi-{context}" async="true" data-vidi-data="server" data-vidi-modelid="{context}" data-vidi-root-url="{root}" data-vidi-docid="{docid}" data-vidi-docapikey="{apikey}"></script>"#,
        src = session.autoload_url(),
        docid = escape_html(&remote.docid),
        apikey = escape_html(&remote.apikey),
    ))
}
