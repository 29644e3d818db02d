//! Interactive tools and the name registry used by figure construction.

use std::str::FromStr;

use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::PlottingError;
use crate::core::ModelId;

/// Tool string used when a figure is created without an explicit tool spec.
pub const DEFAULT_TOOLS: &str = "pan,wheel_zoom,box_zoom,save,resize,reset";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimensions {
    Both,
    Width,
    Height,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolKind {
    Pan { dimensions: Dimensions },
    WheelZoom { dimensions: Dimensions },
    BoxZoom,
    PreviewSave,
    Resize,
    Reset,
    Tap,
    Crosshair,
    BoxSelect,
    PolySelect,
    LassoSelect,
    Hover,
}

impl ToolKind {
    /// Concrete model type name; duplicate detection groups on this.
    pub fn type_name(&self) -> &'static str {
        match self {
            ToolKind::Pan { .. } => "PanTool",
            ToolKind::WheelZoom { .. } => "WheelZoomTool",
            ToolKind::BoxZoom => "BoxZoomTool",
            ToolKind::PreviewSave => "PreviewSaveTool",
            ToolKind::Resize => "ResizeTool",
            ToolKind::Reset => "ResetTool",
            ToolKind::Tap => "TapTool",
            ToolKind::Crosshair => "CrosshairTool",
            ToolKind::BoxSelect => "BoxSelectTool",
            ToolKind::PolySelect => "PolySelectTool",
            ToolKind::LassoSelect => "LassoSelectTool",
            ToolKind::Hover => "HoverTool",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: ModelId,
    pub kind: ToolKind,
}

impl Tool {
    pub fn new(kind: ToolKind) -> Self {
        Self {
            id: ModelId::new(),
            kind,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Pan and zoom tools are meaningless on categorical ranges.
    pub fn is_pan_or_zoom(&self) -> bool {
        let name = self.type_name().to_ascii_lowercase();
        name.contains("pan") || name.contains("zoom")
    }
}

const REGISTRY: [(&str, ToolKind); 18] = [
    ("pan", ToolKind::Pan { dimensions: Dimensions::Both }),
    ("xpan", ToolKind::Pan { dimensions: Dimensions::Width }),
    ("ypan", ToolKind::Pan { dimensions: Dimensions::Height }),
    ("wheel_zoom", ToolKind::WheelZoom { dimensions: Dimensions::Both }),
    ("xwheel_zoom", ToolKind::WheelZoom { dimensions: Dimensions::Width }),
    ("ywheel_zoom", ToolKind::WheelZoom { dimensions: Dimensions::Height }),
    ("box_zoom", ToolKind::BoxZoom),
    ("save", ToolKind::PreviewSave),
    ("previewsave", ToolKind::PreviewSave),
    ("resize", ToolKind::Resize),
    ("reset", ToolKind::Reset),
    ("tap", ToolKind::Tap),
    ("click", ToolKind::Tap),
    ("crosshair", ToolKind::Crosshair),
    ("box_select", ToolKind::BoxSelect),
    ("poly_select", ToolKind::PolySelect),
    ("lasso_select", ToolKind::LassoSelect),
    ("hover", ToolKind::Hover),
];

/// Names accepted by [`tool_from_name`].
pub fn tool_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}

pub fn tool_from_name(name: &str) -> crate::Result<Tool> {
    REGISTRY
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, kind)| Tool::new(*kind))
        .ok_or_else(|| {
            Report::new(PlottingError::InvalidArgument(format!(
                "unexpected tool name '{name}', expected one of: {}",
                tool_names().collect::<Vec<_>>().join(", ")
            )))
        })
}

impl FromStr for Tool {
    type Err = Report<PlottingError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        tool_from_name(s)
    }
}

/// One entry of a tool list: a registry name or a ready-made tool.
#[derive(Clone, Debug)]
pub enum ToolArg {
    Name(String),
    Instance(Tool),
}

impl From<&str> for ToolArg {
    fn from(s: &str) -> Self {
        Self::Name(s.to_string())
    }
}

impl From<String> for ToolArg {
    fn from(s: String) -> Self {
        Self::Name(s)
    }
}

impl From<Tool> for ToolArg {
    fn from(t: Tool) -> Self {
        Self::Instance(t)
    }
}

impl From<ToolKind> for ToolArg {
    fn from(k: ToolKind) -> Self {
        Self::Instance(Tool::new(k))
    }
}

#[derive(Clone, Debug)]
pub enum ToolSpec {
    /// Comma separated registry names, whitespace tolerant.
    Names(String),
    List(Vec<ToolArg>),
}

impl Default for ToolSpec {
    fn default() -> Self {
        Self::Names(DEFAULT_TOOLS.to_string())
    }
}

impl From<&str> for ToolSpec {
    fn from(s: &str) -> Self {
        Self::Names(s.to_string())
    }
}

impl From<String> for ToolSpec {
    fn from(s: String) -> Self {
        Self::Names(s)
    }
}

impl<T: Into<ToolArg>> From<Vec<T>> for ToolSpec {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// A parsed tool spec, before the categorical filter is applied.
#[derive(Debug, Default)]
pub(crate) struct ParsedTools {
    /// Pre-built instances, in the order given
    pub instances: Vec<Tool>,
    /// Individual registry names, in the order given
    pub names: Vec<String>,
}

impl ToolSpec {
    pub(crate) fn split(self) -> ParsedTools {
        let (instances, joined) = match self {
            ToolSpec::Names(s) => (vec![], s),
            ToolSpec::List(args) => {
                let mut instances = vec![];
                let mut joined = String::new();
                for arg in args {
                    match arg {
                        ToolArg::Instance(t) => instances.push(t),
                        ToolArg::Name(n) => {
                            joined.push_str(&n);
                            joined.push(',');
                        }
                    }
                }
                (instances, joined)
            }
        };

        let names = joined
            .trim()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        ParsedTools { instances, names }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_known_names() {
        let pan = tool_from_name("xpan").unwrap();
        assert_eq!(
            pan.kind,
            ToolKind::Pan {
                dimensions: Dimensions::Width
            }
        );
        assert_eq!(tool_from_name("click").unwrap().type_name(), "TapTool");
        assert_eq!(tool_from_name("save").unwrap().type_name(), "PreviewSaveTool");
    }

    #[test]
    fn unknown_tool_name_is_invalid_argument() {
        let err = tool_from_name("laser").unwrap_err();
        assert!(matches!(
            err.current_context(),
            PlottingError::InvalidArgument(msg) if msg.contains("laser")
        ));
    }

    #[test]
    fn split_tolerates_whitespace_and_empties() {
        let parsed = ToolSpec::from(" pan , wheel_zoom,,save ,").split();
        assert_eq!(parsed.names, vec!["pan", "wheel_zoom", "save"]);
        assert!(parsed.instances.is_empty());
    }

    #[test]
    fn split_separates_instances_from_names() {
        let spec = ToolSpec::List(vec![
            ToolArg::from("pan,reset"),
            ToolArg::from(ToolKind::Hover),
            ToolArg::from("save"),
        ]);
        let parsed = spec.split();
        assert_eq!(parsed.names, vec!["pan", "reset", "save"]);
        assert_eq!(parsed.instances.len(), 1);
        assert_eq!(parsed.instances[0].type_name(), "HoverTool");
    }

    #[test]
    fn pan_and_zoom_detection() {
        assert!(tool_from_name("ypan").unwrap().is_pan_or_zoom());
        assert!(tool_from_name("box_zoom").unwrap().is_pan_or_zoom());
        assert!(!tool_from_name("hover").unwrap().is_pan_or_zoom());
    }

    #[test]
    fn every_registry_name_resolves() {
        for name in tool_names() {
            assert!(tool_from_name(name).is_ok(), "{name}");
        }
    }
}
