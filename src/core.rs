use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::PlottingError;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ModelId(pub u64);

impl Default for ModelId {
    fn default() -> Self {
        static CTR: AtomicU64 = AtomicU64::new(1);
        Self(CTR.fetch_add(1, Ordering::Relaxed))
    }
}

impl ModelId {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/* -------------------- COLORS -------------------- */

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
    pub const fn with_a(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Self = Self::rgb(1.0, 1.0, 0.0);

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        let a = if hex.len() == 8 { channel(6)? } else { 1.0 };
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// CSS form: `#rrggbb` when opaque, `rgba(...)` otherwise.
    pub fn to_css(&self) -> String {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b) = (to_u8(self.r), to_u8(self.g), to_u8(self.b));
        if self.a >= 1.0 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("rgba({r}, {g}, {b}, {})", self.a.clamp(0.0, 1.0))
        }
    }
}

/// Colour cycle used when a glyph is added without any colour property.
pub const DEFAULT_PALETTE: [&str; 18] = [
    "#1f77b4", "#ff7f0e", "#ffbb78", "#2ca02c", "#98df8a", "#d62728", "#ff9896", "#9467bd",
    "#c5b0d5", "#8c564b", "#c49c94", "#e377c2", "#f7b6d2", "#7f7f7f", "#bcbd22", "#dbdb8d",
    "#17becf", "#9edae5",
];

pub const DEFAULT_ALPHA: f64 = 1.0;

pub fn default_color(glyph_count: usize) -> &'static str {
    DEFAULT_PALETTE[glyph_count % DEFAULT_PALETTE.len()]
}

/* -------------------- PROPS -------------------- */

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<f32> for PropValue {
    fn from(v: f32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Color> for PropValue {
    fn from(c: Color) -> Self {
        Self::Text(c.to_css())
    }
}

pub const COLOR_FIELDS: [&str; 3] = ["color", "fill_color", "line_color"];
pub const ALPHA_FIELDS: [&str; 3] = ["alpha", "fill_alpha", "line_alpha"];

/// Keyword-style properties for a glyph call.
///
/// Visual properties are free-form; `source`, `legend` and `marker` are
/// interpreted by the glyph methods themselves.
#[derive(Clone, Debug, Default)]
pub struct Props {
    values: BTreeMap<String, PropValue>,
    source: Option<ColumnDataSource>,
    legend: Option<String>,
    marker: Option<String>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn color(self, c: impl Into<PropValue>) -> Self {
        self.set("color", c)
    }

    pub fn fill_color(self, c: impl Into<PropValue>) -> Self {
        self.set("fill_color", c)
    }

    pub fn line_color(self, c: impl Into<PropValue>) -> Self {
        self.set("line_color", c)
    }

    pub fn alpha(self, a: f64) -> Self {
        self.set("alpha", a)
    }

    pub fn fill_alpha(self, a: f64) -> Self {
        self.set("fill_alpha", a)
    }

    pub fn line_alpha(self, a: f64) -> Self {
        self.set("line_alpha", a)
    }

    pub fn size(self, s: f64) -> Self {
        self.set("size", s)
    }

    pub fn line_width(self, w: f64) -> Self {
        self.set("line_width", w)
    }

    pub fn legend(mut self, label: impl Into<String>) -> Self {
        self.legend = Some(label.into());
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    /// Use an existing data source; field-name arguments then refer to its columns.
    pub fn source(mut self, source: ColumnDataSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    pub fn contains_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.values.contains_key(*k))
    }

    pub fn legend_label(&self) -> Option<&str> {
        self.legend.as_deref()
    }

    pub fn marker_name(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        BTreeMap<String, PropValue>,
        Option<ColumnDataSource>,
        Option<String>,
    ) {
        (self.values, self.source, self.legend)
    }
}

impl From<&Props> for Option<Props> {
    #[inline]
    fn from(p: &Props) -> Self {
        Some(p.clone())
    }
}

/* -------------------- DATA -------------------- */

/// A positional glyph argument as supplied by the caller.
///
/// Strings name a column of the data source; literals are moved into the
/// renderer's own source under the argument name.
#[derive(Clone, Debug, PartialEq)]
pub enum DataSpec {
    Field(String),
    Value(f64),
    Numbers(Vec<f64>),
    Strings(Vec<String>),
    Nested(Vec<Vec<f64>>),
}

impl From<&str> for DataSpec {
    fn from(v: &str) -> Self {
        Self::Field(v.to_string())
    }
}

impl From<String> for DataSpec {
    fn from(v: String) -> Self {
        Self::Field(v)
    }
}

impl From<f64> for DataSpec {
    fn from(v: f64) -> Self {
        Self::Value(v)
    }
}

impl From<i32> for DataSpec {
    fn from(v: i32) -> Self {
        Self::Value(v as f64)
    }
}

impl From<Vec<f64>> for DataSpec {
    fn from(v: Vec<f64>) -> Self {
        Self::Numbers(v)
    }
}

impl From<&[f64]> for DataSpec {
    fn from(v: &[f64]) -> Self {
        Self::Numbers(v.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for DataSpec {
    fn from(v: [f64; N]) -> Self {
        Self::Numbers(v.to_vec())
    }
}

impl From<Vec<&str>> for DataSpec {
    fn from(v: Vec<&str>) -> Self {
        Self::Strings(v.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for DataSpec {
    fn from(v: Vec<String>) -> Self {
        Self::Strings(v)
    }
}

impl From<Vec<Vec<f64>>> for DataSpec {
    fn from(v: Vec<Vec<f64>>) -> Self {
        Self::Nested(v)
    }
}

/// A resolved glyph property: a column reference or a constant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spec {
    Field(String),
    Value(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum Column {
    Numbers(Vec<f64>),
    Strings(Vec<String>),
    Nested(Vec<Vec<f64>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numbers(v) => v.len(),
            Column::Strings(v) => v.len(),
            Column::Nested(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ColumnDataSource {
    pub id: ModelId,
    pub columns: BTreeMap<String, Column>,
}

impl ColumnDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, column: Column) {
        self.columns.insert(name.into(), column);
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }
}

/// Columns of one source that feed an auto-ranging dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnsRef {
    pub source: ModelId,
    pub columns: Vec<String>,
}

/* -------------------- RANGES -------------------- */

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Range {
    DataRange1d { id: ModelId, sources: Vec<ColumnsRef> },
    Range1d { id: ModelId, start: f64, end: f64 },
    FactorRange { id: ModelId, factors: Vec<String> },
}

impl Range {
    pub fn id(&self) -> ModelId {
        match self {
            Range::DataRange1d { id, .. }
            | Range::Range1d { id, .. }
            | Range::FactorRange { id, .. } => *id,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, Range::FactorRange { .. })
    }

    /// Register columns on an auto range; other ranges ignore them.
    pub fn track(&mut self, source: ModelId, columns: Vec<String>) {
        if columns.is_empty() {
            return;
        }
        if let Range::DataRange1d { sources, .. } = self {
            match sources.iter_mut().find(|r| r.source == source) {
                Some(existing) => {
                    for c in columns {
                        if !existing.columns.contains(&c) {
                            existing.columns.push(c);
                        }
                    }
                }
                None => sources.push(ColumnsRef { source, columns }),
            }
        }
    }
}

/// How a figure dimension's range is requested.
#[derive(Clone, Debug, Default)]
pub enum RangeSpec {
    #[default]
    Auto,
    Numeric(f64, f64),
    Factors(Vec<String>),
    Explicit(Range),
}

impl RangeSpec {
    pub fn resolve(self) -> Range {
        match self {
            RangeSpec::Auto => Range::DataRange1d {
                id: ModelId::new(),
                sources: vec![],
            },
            RangeSpec::Numeric(start, end) => Range::Range1d {
                id: ModelId::new(),
                start,
                end,
            },
            RangeSpec::Factors(factors) => Range::FactorRange {
                id: ModelId::new(),
                factors,
            },
            RangeSpec::Explicit(range) => range,
        }
    }
}

impl From<(f64, f64)> for RangeSpec {
    fn from((start, end): (f64, f64)) -> Self {
        Self::Numeric(start, end)
    }
}

impl From<Vec<&str>> for RangeSpec {
    fn from(v: Vec<&str>) -> Self {
        Self::Factors(v.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for RangeSpec {
    fn from(v: Vec<String>) -> Self {
        Self::Factors(v)
    }
}

impl From<Range> for RangeSpec {
    fn from(r: Range) -> Self {
        Self::Explicit(r)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapperType {
    #[default]
    Linear,
    Log,
}

/* -------------------- AXES & GRIDS -------------------- */

/// Requested axis type. `None` at the call site suppresses the axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisType {
    #[default]
    Auto,
    Linear,
    Log,
    Datetime,
}

impl FromStr for AxisType {
    type Err = Report<PlottingError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "linear" => Ok(Self::Linear),
            "log" => Ok(Self::Log),
            "datetime" => Ok(Self::Datetime),
            other => Err(Report::new(PlottingError::InvalidArgument(format!(
                "unrecognized axis type '{other}'"
            )))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisKind {
    Linear,
    Log,
    Datetime,
    Categorical,
}

impl AxisKind {
    pub fn resolve(axis_type: Option<AxisType>, range: &Range) -> Option<Self> {
        match axis_type? {
            AxisType::Auto if range.is_categorical() => Some(Self::Categorical),
            AxisType::Auto | AxisType::Linear => Some(Self::Linear),
            AxisType::Log => Some(Self::Log),
            AxisType::Datetime => Some(Self::Datetime),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AxisKind::Linear => "LinearAxis",
            AxisKind::Log => "LogAxis",
            AxisKind::Datetime => "DatetimeAxis",
            AxisKind::Categorical => "CategoricalAxis",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MinorTicks {
    #[default]
    Auto,
    Count(u32),
    Disabled,
}

impl MinorTicks {
    pub fn resolve(self, kind: AxisKind) -> u32 {
        match self {
            MinorTicks::Auto if kind == AxisKind::Log => 10,
            MinorTicks::Auto => 5,
            MinorTicks::Count(n) => n,
            MinorTicks::Disabled => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Above,
    Below,
    Left,
    Right,
}

impl Side {
    /// 0 for the x dimension, 1 for y.
    pub fn dimension(&self) -> usize {
        match self {
            Side::Above | Side::Below => 0,
            Side::Left | Side::Right => 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ticker {
    pub id: ModelId,
    pub num_minor_ticks: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Axis {
    pub id: ModelId,
    pub kind: AxisKind,
    pub axis_label: Option<String>,
    pub ticker: Ticker,
}

impl Axis {
    pub fn new(kind: AxisKind, num_minor_ticks: u32) -> Self {
        Self {
            id: ModelId::new(),
            kind,
            axis_label: None,
            ticker: Ticker {
                id: ModelId::new(),
                num_minor_ticks,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grid {
    pub id: ModelId,
    pub dimension: usize,
    /// Ticker shared with the axis of the same dimension
    pub ticker: ModelId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LegendItem {
    pub label: String,
    pub renderers: Vec<ModelId>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Legend {
    pub id: ModelId,
    pub items: Vec<LegendItem>,
}

impl Legend {
    pub fn add(&mut self, label: &str, renderer: ModelId) {
        match self.items.iter_mut().find(|i| i.label == label) {
            Some(item) => item.renderers.push(renderer),
            None => self.items.push(LegendItem {
                label: label.to_string(),
                renderers: vec![renderer],
            }),
        }
    }
}

/* -------------------- GLYPHS -------------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlyphKind {
    AnnularWedge,
    Annulus,
    Arc,
    Asterisk,
    Bezier,
    Circle,
    CircleCross,
    CircleX,
    Cross,
    Diamond,
    DiamondCross,
    Image,
    ImageRGBA,
    ImageURL,
    InvertedTriangle,
    Line,
    MultiLine,
    Oval,
    Patch,
    Patches,
    Quad,
    Quadratic,
    Ray,
    Rect,
    Segment,
    Square,
    SquareCross,
    SquareX,
    Text,
    Triangle,
    Wedge,
    X,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Marker {
    Asterisk,
    Circle,
    CircleCross,
    CircleX,
    Cross,
    Diamond,
    DiamondCross,
    InvertedTriangle,
    Square,
    SquareCross,
    SquareX,
    Triangle,
    X,
}

const MARKER_NAMES: [(&str, Marker); 18] = [
    ("asterisk", Marker::Asterisk),
    ("circle", Marker::Circle),
    ("circle_cross", Marker::CircleCross),
    ("circle_x", Marker::CircleX),
    ("cross", Marker::Cross),
    ("diamond", Marker::Diamond),
    ("diamond_cross", Marker::DiamondCross),
    ("inverted_triangle", Marker::InvertedTriangle),
    ("square", Marker::Square),
    ("square_cross", Marker::SquareCross),
    ("square_x", Marker::SquareX),
    ("triangle", Marker::Triangle),
    ("x", Marker::X),
    ("*", Marker::Asterisk),
    ("+", Marker::Cross),
    ("o", Marker::Circle),
    ("ox", Marker::CircleX),
    ("o+", Marker::CircleCross),
];

impl Marker {
    /// Every accepted marker name, shorthands included, sorted.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<_> = MARKER_NAMES.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names
    }

    pub fn glyph_kind(&self) -> GlyphKind {
        match self {
            Marker::Asterisk => GlyphKind::Asterisk,
            Marker::Circle => GlyphKind::Circle,
            Marker::CircleCross => GlyphKind::CircleCross,
            Marker::CircleX => GlyphKind::CircleX,
            Marker::Cross => GlyphKind::Cross,
            Marker::Diamond => GlyphKind::Diamond,
            Marker::DiamondCross => GlyphKind::DiamondCross,
            Marker::InvertedTriangle => GlyphKind::InvertedTriangle,
            Marker::Square => GlyphKind::Square,
            Marker::SquareCross => GlyphKind::SquareCross,
            Marker::SquareX => GlyphKind::SquareX,
            Marker::Triangle => GlyphKind::Triangle,
            Marker::X => GlyphKind::X,
        }
    }
}

impl FromStr for Marker {
    type Err = Report<PlottingError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MARKER_NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, m)| *m)
            .ok_or_else(|| {
                Report::new(PlottingError::InvalidArgument(format!(
                    "invalid marker type '{s}', valid markers are: {}",
                    Marker::names().join(", ")
                )))
            })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Glyph {
    pub kind: GlyphKind,
    pub specs: BTreeMap<String, Spec>,
    pub visuals: BTreeMap<String, PropValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlyphRenderer {
    pub id: ModelId,
    pub glyph: Glyph,
    pub data_source: ColumnDataSource,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Renderer {
    Glyph(GlyphRenderer),
    Grid(Grid),
    Legend(Legend),
}

impl Renderer {
    pub fn id(&self) -> ModelId {
        match self {
            Renderer::Glyph(g) => g.id,
            Renderer::Grid(g) => g.id,
            Renderer::Legend(l) => l.id,
        }
    }
}
