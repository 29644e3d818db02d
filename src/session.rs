//! Connections to a remote plot server.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use error_stack::{Report, ResultExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::PlottingError;
use crate::core::ModelId;
use crate::document::{Document, DocumentState};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5006/";

/// A server-side document a session is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDoc {
    pub docid: String,
    pub apikey: String,
    pub title: String,
}

/// Wire operations a [`Session`] needs from a plot server.
pub trait Transport: Send {
    /// Find or create the document titled `title`.
    fn use_doc(&mut self, root_url: &str, title: &str) -> crate::Result<RemoteDoc>;

    /// Fetch the stored state; `None` when nothing has been stored yet.
    fn load_document(
        &mut self,
        root_url: &str,
        remote: &RemoteDoc,
    ) -> crate::Result<Option<DocumentState>>;

    fn store_document(
        &mut self,
        root_url: &str,
        remote: &RemoteDoc,
        state: &DocumentState,
    ) -> crate::Result<()>;
}

fn api_url(root_url: &str, path: &str) -> String {
    format!("{}/api/v1/{}", root_url.trim_end_matches('/'), path)
}

/* -------------------- HTTP -------------------- */

/// JSON over HTTP.
pub struct HttpTransport {
    client: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn use_doc(&mut self, root_url: &str, title: &str) -> crate::Result<RemoteDoc> {
        let url = api_url(root_url, "documents");
        let payload = serde_json::json!({ "title": title });
        let body_str =
            serde_json::to_string(&payload).change_context(PlottingError::Serialization)?;

        let response = self
            .client
            .post(&url)
            .content_type("application/json")
            .send(body_str.as_bytes())
            .change_context_lazy(|| PlottingError::Transport(format!("POST {url}")))?;

        let body: serde_json::Value = response
            .into_body()
            .read_json()
            .change_context_lazy(|| PlottingError::Transport(format!("POST {url}")))?;

        let docid = body["docid"].as_str().ok_or_else(|| {
            Report::new(PlottingError::Transport(format!(
                "missing 'docid' in response from {url}"
            )))
        })?;

        Ok(RemoteDoc {
            docid: docid.to_string(),
            apikey: body["apikey"].as_str().unwrap_or_default().to_string(),
            title: title.to_string(),
        })
    }

    fn load_document(
        &mut self,
        root_url: &str,
        remote: &RemoteDoc,
    ) -> crate::Result<Option<DocumentState>> {
        let url = api_url(root_url, &format!("documents/{}", remote.docid));
        let response = match self
            .client
            .get(&url)
            .header("x-vidi-api-key", remote.apikey.as_str())
            .call()
        {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => return Ok(None),
            Err(e) => {
                return Err(Report::new(e)
                    .change_context(PlottingError::Transport(format!("GET {url}"))));
            }
        };

        let state: DocumentState = response
            .into_body()
            .read_json()
            .change_context_lazy(|| PlottingError::Transport(format!("GET {url}")))?;
        Ok(Some(state))
    }

    fn store_document(
        &mut self,
        root_url: &str,
        remote: &RemoteDoc,
        state: &DocumentState,
    ) -> crate::Result<()> {
        let url = api_url(root_url, &format!("documents/{}", remote.docid));
        let body_str =
            serde_json::to_string(state).change_context(PlottingError::Serialization)?;

        self.client
            .put(&url)
            .header("x-vidi-api-key", remote.apikey.as_str())
            .content_type("application/json")
            .send(body_str.as_bytes())
            .change_context_lazy(|| PlottingError::Transport(format!("PUT {url}")))?;

        Ok(())
    }
}

/* -------------------- MEMORY -------------------- */

#[derive(Default)]
struct MemoryServer {
    /// docid -> (title, stored JSON)
    docs: BTreeMap<String, (String, Option<serde_json::Value>)>,
    stores: usize,
}

/// In-process server: clones share state, so a handle kept outside the
/// session can inspect what was stored.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    server: Arc<Mutex<MemoryServer>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `doc` under `title` as if another client had pushed it.
    pub fn seed(&self, title: &str, doc: &Document) -> crate::Result<()> {
        let value =
            serde_json::to_value(doc.state()).change_context(PlottingError::Serialization)?;
        let mut server = self.server.lock();
        let docid = format!("doc-{}", server.docs.len() + 1);
        server.docs.insert(docid, (title.to_string(), Some(value)));
        Ok(())
    }

    pub fn stored(&self, title: &str) -> Option<serde_json::Value> {
        self.server
            .lock()
            .docs
            .values()
            .find(|(t, _)| t == title)
            .and_then(|(_, v)| v.clone())
    }

    pub fn store_count(&self) -> usize {
        self.server.lock().stores
    }
}

impl Transport for MemoryTransport {
    fn use_doc(&mut self, _root_url: &str, title: &str) -> crate::Result<RemoteDoc> {
        let mut server = self.server.lock();
        let existing = server
            .docs
            .iter()
            .find(|(_, (t, _))| t == title)
            .map(|(id, _)| id.clone());
        let docid = match existing {
            Some(id) => id,
            None => {
                let id = format!("doc-{}", server.docs.len() + 1);
                server.docs.insert(id.clone(), (title.to_string(), None));
                id
            }
        };
        Ok(RemoteDoc {
            apikey: format!("key-{docid}"),
            docid,
            title: title.to_string(),
        })
    }

    fn load_document(
        &mut self,
        _root_url: &str,
        remote: &RemoteDoc,
    ) -> crate::Result<Option<DocumentState>> {
        let stored = self
            .server
            .lock()
            .docs
            .get(&remote.docid)
            .and_then(|(_, v)| v.clone());
        match stored {
            Some(v) => Ok(Some(
                serde_json::from_value(v).change_context(PlottingError::Serialization)?,
            )),
            None => Ok(None),
        }
    }

    fn store_document(
        &mut self,
        _root_url: &str,
        remote: &RemoteDoc,
        state: &DocumentState,
    ) -> crate::Result<()> {
        let value = serde_json::to_value(state).change_context(PlottingError::Serialization)?;
        let mut server = self.server.lock();
        let Some(entry) = server.docs.get_mut(&remote.docid) else {
            return Err(Report::new(PlottingError::Transport(format!(
                "unknown document {}",
                remote.docid
            ))));
        };
        entry.1 = Some(value);
        server.stores += 1;
        Ok(())
    }
}

/* -------------------- SESSION -------------------- */

pub struct Session {
    name: String,
    root_url: String,
    remote: Option<RemoteDoc>,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("root_url", &self.root_url)
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A session speaking HTTP to `root_url`.
    pub fn new(name: impl Into<String>, root_url: impl Into<String>) -> Self {
        Self::with_transport(name, root_url, HttpTransport::new())
    }

    pub fn with_transport(
        name: impl Into<String>,
        root_url: impl Into<String>,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            root_url: root_url.into(),
            remote: None,
            transport: Box::new(transport),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn remote(&self) -> Option<&RemoteDoc> {
        self.remote.as_ref()
    }

    fn bound(&self) -> crate::Result<&RemoteDoc> {
        self.remote.as_ref().ok_or_else(|| {
            Report::new(PlottingError::InvalidArgument(
                "session is not bound to a server document; call use_doc first".into(),
            ))
        })
    }

    pub fn use_doc(&mut self, docname: &str) -> crate::Result<()> {
        let remote = self.transport.use_doc(&self.root_url, docname)?;
        debug!(docid = %remote.docid, "bound session to '{}'", docname);
        self.remote = Some(remote);
        Ok(())
    }

    /// Merge the bound server document into `doc`.
    pub fn load_document(&mut self, doc: &mut Document) -> crate::Result<()> {
        let remote = self.bound()?.clone();
        if let Some(state) = self.transport.load_document(&self.root_url, &remote)? {
            doc.load_state(state);
        }
        Ok(())
    }

    pub fn store_document(&mut self, doc: &Document) -> crate::Result<()> {
        let remote = self.bound()?.clone();
        self.transport
            .store_document(&self.root_url, &remote, &doc.state())?;
        info!(docid = %remote.docid, plots = doc.plots().len(), "stored document");
        Ok(())
    }

    /// Browser URL for the document whose context is `context`.
    pub fn object_link(&self, context: ModelId) -> String {
        let docid = self.remote.as_ref().map(|r| r.docid.as_str()).unwrap_or("");
        format!(
            "{}/d/{}/{}",
            self.root_url.trim_end_matches('/'),
            docid,
            context
        )
    }

    pub fn autoload_url(&self) -> String {
        let docid = self.remote.as_ref().map(|r| r.docid.as_str()).unwrap_or("");
        api_url(&self.root_url, &format!("documents/{docid}/autoload.js"))
    }
}
