use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::ModelId;
use crate::figure::Figure;

/// A model held by the caller, the document and any grids at once.
pub type Shared<T> = Arc<RwLock<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// Figures arranged in rows.
#[derive(Debug)]
pub struct GridPlot {
    pub id: ModelId,
    pub name: Option<String>,
    pub children: Vec<Vec<Shared<Figure>>>,
}

impl GridPlot {
    pub fn new(children: Vec<Vec<Shared<Figure>>>) -> Self {
        Self {
            id: ModelId::new(),
            name: None,
            children,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn subplot_ids(&self) -> Vec<ModelId> {
        self.children
            .iter()
            .flatten()
            .map(|f| f.read().id)
            .collect()
    }
}

/// Handle to a top-level plot object.
#[derive(Clone, Debug)]
pub enum PlotRef {
    Figure(Shared<Figure>),
    Grid(Shared<GridPlot>),
}

impl PlotRef {
    pub fn id(&self) -> ModelId {
        match self {
            PlotRef::Figure(f) => f.read().id,
            PlotRef::Grid(g) => g.read().id,
        }
    }

    pub fn as_figure(&self) -> Option<&Shared<Figure>> {
        match self {
            PlotRef::Figure(f) => Some(f),
            PlotRef::Grid(_) => None,
        }
    }
}

impl From<Shared<Figure>> for PlotRef {
    fn from(f: Shared<Figure>) -> Self {
        Self::Figure(f)
    }
}

impl From<&Shared<Figure>> for PlotRef {
    fn from(f: &Shared<Figure>) -> Self {
        Self::Figure(f.clone())
    }
}

impl From<Figure> for PlotRef {
    fn from(f: Figure) -> Self {
        Self::Figure(shared(f))
    }
}

impl From<Shared<GridPlot>> for PlotRef {
    fn from(g: Shared<GridPlot>) -> Self {
        Self::Grid(g)
    }
}

impl From<GridPlot> for PlotRef {
    fn from(g: GridPlot) -> Self {
        Self::Grid(shared(g))
    }
}

/* -------------------- WIRE FORM -------------------- */

#[derive(Serialize, Deserialize)]
struct GridPlotRepr {
    id: ModelId,
    name: Option<String>,
    children: Vec<Vec<Figure>>,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum PlotRepr {
    Figure(Figure),
    GridPlot(GridPlotRepr),
}

impl From<&PlotRef> for PlotRepr {
    fn from(plot: &PlotRef) -> Self {
        match plot {
            PlotRef::Figure(f) => PlotRepr::Figure(f.read().clone()),
            PlotRef::Grid(g) => {
                let g = g.read();
                PlotRepr::GridPlot(GridPlotRepr {
                    id: g.id,
                    name: g.name.clone(),
                    children: g
                        .children
                        .iter()
                        .map(|row| row.iter().map(|f| f.read().clone()).collect())
                        .collect(),
                })
            }
        }
    }
}

impl From<PlotRepr> for PlotRef {
    fn from(repr: PlotRepr) -> Self {
        match repr {
            PlotRepr::Figure(f) => PlotRef::from(f),
            PlotRepr::GridPlot(g) => PlotRef::from(GridPlot {
                id: g.id,
                name: g.name,
                children: g
                    .children
                    .into_iter()
                    .map(|row| row.into_iter().map(shared).collect())
                    .collect(),
            }),
        }
    }
}

impl Serialize for PlotRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PlotRepr::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlotRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PlotRepr::deserialize(deserializer).map(PlotRef::from)
    }
}

/* -------------------- DOCUMENT -------------------- */

/// Serializable snapshot of a document, as stored on a plot server.
#[derive(Serialize, Deserialize)]
pub struct DocumentState {
    pub context: ModelId,
    pub plots: Vec<PlotRef>,
    pub current: Option<ModelId>,
}

/// Ordered collection of top-level plots with at most one current plot.
#[derive(Clone, Debug)]
pub struct Document {
    context: ModelId,
    plots: Vec<PlotRef>,
    current: Option<PlotRef>,
    /// Push to the active session after every drawing call
    pub autostore: bool,
    /// Add figures created through the output context to this document
    pub autoadd: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            context: ModelId::new(),
            plots: vec![],
            current: None,
            autostore: true,
            autoadd: true,
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh document holding only `plot`, which is also current.
    pub fn single(plot: impl Into<PlotRef>) -> Self {
        let mut doc = Self::new();
        let plot = plot.into();
        doc.add(plot.clone());
        doc.current = Some(plot);
        doc
    }

    pub fn context_id(&self) -> ModelId {
        self.context
    }

    pub fn plots(&self) -> &[PlotRef] {
        &self.plots
    }

    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.plots.iter().any(|p| p.id() == id)
    }

    /// Add a top-level plot; adding the same model twice is a no-op.
    pub fn add(&mut self, plot: impl Into<PlotRef>) {
        let plot = plot.into();
        if !self.contains(plot.id()) {
            self.plots.push(plot);
        }
    }

    pub fn remove(&mut self, id: ModelId) -> bool {
        let before = self.plots.len();
        self.plots.retain(|p| p.id() != id);
        if self.current.as_ref().is_some_and(|c| c.id() == id) {
            self.current = None;
        }
        self.plots.len() != before
    }

    pub fn curplot(&self) -> Option<&PlotRef> {
        self.current.as_ref()
    }

    pub fn set_curplot(&mut self, plot: impl Into<PlotRef>) {
        self.current = Some(plot.into());
    }

    pub fn clear(&mut self) {
        self.plots.clear();
        self.current = None;
    }

    pub fn state(&self) -> DocumentState {
        DocumentState {
            context: self.context,
            plots: self.plots.clone(),
            current: self.current.as_ref().map(PlotRef::id),
        }
    }

    /// Merge a remote snapshot: unknown plots are appended, and the remote
    /// current plot becomes current when this document has none.
    pub fn load_state(&mut self, state: DocumentState) {
        for plot in state.plots {
            self.add(plot);
        }
        if self.current.is_none()
            && let Some(id) = state.current
        {
            self.current = self.plots.iter().find(|p| p.id() == id).cloned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::FigureOptions;

    fn figure() -> Shared<Figure> {
        shared(Figure::new(FigureOptions::new()).unwrap())
    }

    #[test]
    fn add_ignores_duplicates() {
        let mut doc = Document::new();
        let f = figure();
        doc.add(&f);
        doc.add(&f);
        assert_eq!(doc.plots().len(), 1);
    }

    #[test]
    fn remove_clears_current() {
        let f = figure();
        let mut doc = Document::single(&f);
        let id = f.read().id;
        assert_eq!(doc.curplot().map(PlotRef::id), Some(id));
        assert!(doc.remove(id));
        assert!(doc.curplot().is_none());
        assert!(doc.is_empty());
        assert!(!doc.remove(id));
    }

    #[test]
    fn grid_serializes_children_inline() {
        let (a, b) = (figure(), figure());
        let grid = PlotRef::from(GridPlot::new(vec![vec![a.clone(), b.clone()]]).with_name("g"));
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json["type"], "GridPlot");
        assert_eq!(json["name"], "g");
        assert_eq!(json["children"][0][1]["id"], b.read().id.0);
    }

    #[test]
    fn load_state_merges_remote_plots() {
        let remote = Document::single(figure());
        let remote_id = remote.plots()[0].id();
        let json = serde_json::to_string(&remote.state()).unwrap();
        let state: DocumentState = serde_json::from_str(&json).unwrap();

        let mut local = Document::new();
        local.add(figure());
        local.load_state(state);
        assert_eq!(local.plots().len(), 2);
        assert_eq!(local.curplot().map(PlotRef::id), Some(remote_id));
    }
}
