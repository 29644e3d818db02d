use std::collections::BTreeMap;

use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::PlottingError;
use crate::core::{
    ALPHA_FIELDS, Axis, AxisKind, AxisType, COLOR_FIELDS, Column, DEFAULT_ALPHA, DataSpec,
    Glyph, GlyphKind, GlyphRenderer, Grid, Legend, MapperType, Marker, MinorTicks, ModelId,
    PropValue, Props, Range, RangeSpec, Renderer, Side, Spec, default_color,
};
use crate::splat::Splat;
use crate::tools::{ParsedTools, Tool, ToolSpec, tool_from_name};
use crate::warnings::Advisory;

/// Options for [`Figure::new`].
#[derive(Clone, Debug)]
pub struct FigureOptions {
    pub tools: ToolSpec,
    pub x_range: RangeSpec,
    pub y_range: RangeSpec,
    /// `None` suppresses the x axis and its grid
    pub x_axis_type: Option<AxisType>,
    pub y_axis_type: Option<AxisType>,
    /// `None` builds the grid but leaves the axis unattached
    pub x_axis_location: Option<Side>,
    pub y_axis_location: Option<Side>,
    pub x_axis_label: Option<String>,
    pub y_axis_label: Option<String>,
    pub x_minor_ticks: MinorTicks,
    pub y_minor_ticks: MinorTicks,
    pub title: Option<String>,
    pub plot_width: u32,
    pub plot_height: u32,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            tools: ToolSpec::default(),
            x_range: RangeSpec::Auto,
            y_range: RangeSpec::Auto,
            x_axis_type: Some(AxisType::Auto),
            y_axis_type: Some(AxisType::Auto),
            x_axis_location: Some(Side::Below),
            y_axis_location: Some(Side::Left),
            x_axis_label: None,
            y_axis_label: None,
            x_minor_ticks: MinorTicks::Auto,
            y_minor_ticks: MinorTicks::Auto,
            title: None,
            plot_width: 600,
            plot_height: 600,
        }
    }
}

impl FigureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tools(mut self, tools: impl Into<ToolSpec>) -> Self {
        self.tools = tools.into();
        self
    }

    pub fn x_range(mut self, range: impl Into<RangeSpec>) -> Self {
        self.x_range = range.into();
        self
    }

    pub fn y_range(mut self, range: impl Into<RangeSpec>) -> Self {
        self.y_range = range.into();
        self
    }

    pub fn x_axis_type(mut self, t: impl Into<Option<AxisType>>) -> Self {
        self.x_axis_type = t.into();
        self
    }

    pub fn y_axis_type(mut self, t: impl Into<Option<AxisType>>) -> Self {
        self.y_axis_type = t.into();
        self
    }

    pub fn x_axis_location(mut self, side: impl Into<Option<Side>>) -> Self {
        self.x_axis_location = side.into();
        self
    }

    pub fn y_axis_location(mut self, side: impl Into<Option<Side>>) -> Self {
        self.y_axis_location = side.into();
        self
    }

    pub fn x_axis_label(mut self, label: impl Into<String>) -> Self {
        self.x_axis_label = Some(label.into());
        self
    }

    pub fn y_axis_label(mut self, label: impl Into<String>) -> Self {
        self.y_axis_label = Some(label.into());
        self
    }

    pub fn x_minor_ticks(mut self, ticks: MinorTicks) -> Self {
        self.x_minor_ticks = ticks;
        self
    }

    pub fn y_minor_ticks(mut self, ticks: MinorTicks) -> Self {
        self.y_minor_ticks = ticks;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn plot_width(mut self, w: u32) -> Self {
        self.plot_width = w;
        self
    }

    pub fn plot_height(mut self, h: u32) -> Self {
        self.plot_height = h;
        self
    }
}

/// A plot with its axes, grids, tools and glyph renderers wired up.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Figure {
    pub id: ModelId,
    pub title: Option<String>,
    pub plot_width: u32,
    pub plot_height: u32,
    pub x_range: Range,
    pub y_range: Range,
    pub x_mapper_type: MapperType,
    pub y_mapper_type: MapperType,
    pub above: Vec<Axis>,
    pub below: Vec<Axis>,
    pub left: Vec<Axis>,
    pub right: Vec<Axis>,
    pub renderers: Vec<Renderer>,
    pub tools: Vec<Tool>,
    #[serde(skip)]
    warnings: Vec<Advisory>,
}

impl Figure {
    pub fn new(opts: FigureOptions) -> crate::Result<Self> {
        let mut fig = Self {
            id: ModelId::new(),
            title: opts.title,
            plot_width: opts.plot_width,
            plot_height: opts.plot_height,
            x_range: opts.x_range.resolve(),
            y_range: opts.y_range.resolve(),
            x_mapper_type: MapperType::Linear,
            y_mapper_type: MapperType::Linear,
            above: vec![],
            below: vec![],
            left: vec![],
            right: vec![],
            renderers: vec![],
            tools: vec![],
            warnings: vec![],
        };

        fig.attach_axis(
            0,
            opts.x_axis_type,
            opts.x_axis_location,
            opts.x_axis_label,
            opts.x_minor_ticks,
        )?;
        fig.attach_axis(
            1,
            opts.y_axis_type,
            opts.y_axis_location,
            opts.y_axis_label,
            opts.y_minor_ticks,
        )?;
        fig.attach_tools(opts.tools)?;

        Ok(fig)
    }

    /// Advisories raised while this figure was built.
    pub fn warnings(&self) -> &[Advisory] {
        &self.warnings
    }

    pub fn is_categorical(&self) -> bool {
        self.x_range.is_categorical() || self.y_range.is_categorical()
    }

    fn attach_axis(
        &mut self,
        dimension: usize,
        axis_type: Option<AxisType>,
        location: Option<Side>,
        label: Option<String>,
        minor_ticks: MinorTicks,
    ) -> crate::Result<()> {
        let range = if dimension == 0 {
            &self.x_range
        } else {
            &self.y_range
        };
        let Some(kind) = AxisKind::resolve(axis_type, range) else {
            return Ok(());
        };

        if let Some(side) = location
            && side.dimension() != dimension
        {
            let dim = if dimension == 0 { "x" } else { "y" };
            return Err(Report::new(PlottingError::InvalidArgument(format!(
                "{dim} axis cannot be placed {side:?}"
            ))));
        }

        if kind == AxisKind::Log {
            if dimension == 0 {
                self.x_mapper_type = MapperType::Log;
            } else {
                self.y_mapper_type = MapperType::Log;
            }
        }

        let mut axis = Axis::new(kind, minor_ticks.resolve(kind));
        axis.axis_label = label.filter(|l| !l.is_empty());

        self.renderers.push(Renderer::Grid(Grid {
            id: ModelId::new(),
            dimension,
            ticker: axis.ticker.id,
        }));

        match location {
            Some(Side::Above) => self.above.push(axis),
            Some(Side::Below) => self.below.push(axis),
            Some(Side::Left) => self.left.push(axis),
            Some(Side::Right) => self.right.push(axis),
            None => {}
        }
        Ok(())
    }

    fn attach_tools(&mut self, spec: ToolSpec) -> crate::Result<()> {
        let ParsedTools { instances, names } = spec.split();
        let categorical = self.is_categorical();

        let mut removed = vec![];
        let mut tools = vec![];

        for tool in instances {
            if categorical && tool.is_pan_or_zoom() {
                removed.push(tool.type_name().to_string());
            } else {
                tools.push(tool);
            }
        }

        for name in names {
            if categorical && (name.contains("pan") || name.contains("zoom")) {
                removed.push(name);
                continue;
            }
            tools.push(tool_from_name(&name)?);
        }

        self.tools.extend(tools);

        let mut type_names: Vec<&str> = self.tools.iter().map(Tool::type_name).collect();
        type_names.sort_unstable();
        let repeated: Vec<String> = type_names
            .chunk_by(|a, b| a == b)
            .filter(|group| group.len() > 1)
            .map(|group| group[0].to_string())
            .collect();

        if !repeated.is_empty() {
            self.warnings.push(Advisory::RepeatedTools(repeated).emit());
        }
        if !removed.is_empty() {
            self.warnings.push(Advisory::RemovedTools(removed).emit());
        }
        Ok(())
    }

    /* -------------------- ACCESSORS -------------------- */

    pub fn xaxis(&self) -> Splat<&Axis> {
        self.above.iter().chain(&self.below).collect()
    }

    pub fn yaxis(&self) -> Splat<&Axis> {
        self.left.iter().chain(&self.right).collect()
    }

    pub fn axis(&self) -> Splat<&Axis> {
        self.xaxis().chain(self.yaxis())
    }

    pub fn xaxis_mut(&mut self) -> Splat<&mut Axis> {
        self.above.iter_mut().chain(self.below.iter_mut()).collect()
    }

    pub fn yaxis_mut(&mut self) -> Splat<&mut Axis> {
        self.left.iter_mut().chain(self.right.iter_mut()).collect()
    }

    pub fn axis_mut(&mut self) -> Splat<&mut Axis> {
        self.above
            .iter_mut()
            .chain(self.below.iter_mut())
            .chain(self.left.iter_mut())
            .chain(self.right.iter_mut())
            .collect()
    }

    pub fn legend(&self) -> Splat<&Legend> {
        self.renderers
            .iter()
            .filter_map(|r| match r {
                Renderer::Legend(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn legend_mut(&mut self) -> Splat<&mut Legend> {
        self.renderers
            .iter_mut()
            .filter_map(|r| match r {
                Renderer::Legend(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    fn grids(&self, dimension: usize) -> Splat<&Grid> {
        self.renderers
            .iter()
            .filter_map(|r| match r {
                Renderer::Grid(g) if g.dimension == dimension => Some(g),
                _ => None,
            })
            .collect()
    }

    pub fn xgrid(&self) -> Splat<&Grid> {
        self.grids(0)
    }

    pub fn ygrid(&self) -> Splat<&Grid> {
        self.grids(1)
    }

    pub fn grid(&self) -> Splat<&Grid> {
        self.xgrid().chain(self.ygrid())
    }

    /// All grids, x dimension first.
    pub fn grid_mut(&mut self) -> Splat<&mut Grid> {
        let mut grids: Vec<&mut Grid> = self
            .renderers
            .iter_mut()
            .filter_map(|r| match r {
                Renderer::Grid(g) => Some(g),
                _ => None,
            })
            .collect();
        grids.sort_by_key(|g| g.dimension);
        Splat::new(grids)
    }

    pub fn glyph_renderers(&self) -> Splat<&GlyphRenderer> {
        self.renderers
            .iter()
            .filter_map(|r| match r {
                Renderer::Glyph(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    /* -------------------- GLYPHS -------------------- */

    /// Scatter plot with a selectable marker (`marker` prop, default `circle`).
    ///
    /// Shorthands `*`, `+`, `o`, `ox` and `o+` are accepted; see
    /// [`Marker::names`].
    pub fn scatter(
        &mut self,
        x: impl Into<DataSpec>,
        y: impl Into<DataSpec>,
        props: impl Into<Option<Props>>,
    ) -> crate::Result<ModelId> {
        let mut props = props.into().unwrap_or_default();
        let marker: Marker = props.marker_name().unwrap_or("circle").parse()?;

        if !props.contains_any(&COLOR_FIELDS) {
            props = props.color(default_color(0));
        }
        if !props.contains_any(&ALPHA_FIELDS) {
            props = props.alpha(DEFAULT_ALPHA);
        }

        Ok(self.add_glyph(
            marker.glyph_kind(),
            vec![("x", x.into()), ("y", y.into())],
            props,
        ))
    }

    fn add_glyph(
        &mut self,
        kind: GlyphKind,
        args: Vec<(&'static str, DataSpec)>,
        props: Props,
    ) -> ModelId {
        let (mut visuals, source, legend) = props.into_parts();
        let mut source = source.unwrap_or_default();

        let mut specs = BTreeMap::new();
        for (name, data) in args {
            let spec = match data {
                DataSpec::Field(f) => Spec::Field(f),
                DataSpec::Value(v) => Spec::Value(v),
                DataSpec::Numbers(v) => {
                    source.insert(name, Column::Numbers(v));
                    Spec::Field(name.to_string())
                }
                DataSpec::Strings(v) => {
                    source.insert(name, Column::Strings(v));
                    Spec::Field(name.to_string())
                }
                DataSpec::Nested(v) => {
                    source.insert(name, Column::Nested(v));
                    Spec::Field(name.to_string())
                }
            };
            specs.insert(name.to_string(), spec);
        }

        materialize_visuals(&mut visuals, self.glyph_renderers().len());

        let (mut x_cols, mut y_cols) = (vec![], vec![]);
        for (name, spec) in &specs {
            if let Spec::Field(column) = spec {
                match arg_dimension(name) {
                    Some(0) => x_cols.push(column.clone()),
                    Some(_) => y_cols.push(column.clone()),
                    None => {}
                }
            }
        }
        self.x_range.track(source.id, x_cols);
        self.y_range.track(source.id, y_cols);

        let id = ModelId::new();
        self.renderers.push(Renderer::Glyph(GlyphRenderer {
            id,
            glyph: Glyph {
                kind,
                specs,
                visuals,
            },
            data_source: source,
        }));

        if let Some(label) = legend {
            self.legend_entry(&label, id);
        }
        id
    }

    fn legend_entry(&mut self, label: &str, renderer: ModelId) {
        let existing = self.renderers.iter_mut().find_map(|r| match r {
            Renderer::Legend(l) => Some(l),
            _ => None,
        });
        match existing {
            Some(legend) => legend.add(label, renderer),
            None => {
                let mut legend = Legend::default();
                legend.add(label, renderer);
                self.renderers.push(Renderer::Legend(legend));
            }
        }
    }
}

/// Expand `color`/`alpha` shorthands and fill in defaults.
fn materialize_visuals(visuals: &mut BTreeMap<String, PropValue>, glyph_count: usize) {
    let color = visuals
        .remove("color")
        .unwrap_or_else(|| PropValue::from(default_color(glyph_count)));
    for key in ["fill_color", "line_color"] {
        visuals
            .entry(key.to_string())
            .or_insert_with(|| color.clone());
    }

    let alpha = visuals
        .remove("alpha")
        .unwrap_or(PropValue::Number(DEFAULT_ALPHA));
    for key in ["fill_alpha", "line_alpha"] {
        visuals
            .entry(key.to_string())
            .or_insert_with(|| alpha.clone());
    }
}

/// Which range a positional argument feeds: 0 for x, 1 for y.
fn arg_dimension(name: &str) -> Option<usize> {
    match name {
        "left" | "right" => Some(0),
        "top" | "bottom" => Some(1),
        n if n.starts_with('x') || n.starts_with("cx") => Some(0),
        n if n.starts_with('y') || n.starts_with("cy") => Some(1),
        _ => None,
    }
}

macro_rules! glyph_methods {
    ($($(#[$doc:meta])* $name:ident => $kind:ident($($arg:ident),+);)+) => {
        #[allow(clippy::too_many_arguments)]
        impl Figure {
            $(
                $(#[$doc])*
                pub fn $name(
                    &mut self,
                    $($arg: impl Into<DataSpec>,)+
                    props: impl Into<Option<Props>>,
                ) -> ModelId {
                    self.add_glyph(
                        GlyphKind::$kind,
                        vec![$((stringify!($arg), $arg.into())),+],
                        props.into().unwrap_or_default(),
                    )
                }
            )+
        }
    };
}

glyph_methods! {
    annular_wedge => AnnularWedge(x, y, inner_radius, outer_radius, start_angle, end_angle);
    annulus => Annulus(x, y, inner_radius, outer_radius);
    arc => Arc(x, y, radius, start_angle, end_angle);
    asterisk => Asterisk(x, y);
    /// Cubic bezier curves from `(x0, y0)` to `(x1, y1)`.
    bezier => Bezier(x0, y0, x1, y1, cx0, cy0, cx1, cy1);
    circle => Circle(x, y);
    circle_cross => CircleCross(x, y);
    circle_x => CircleX(x, y);
    cross => Cross(x, y);
    diamond => Diamond(x, y);
    diamond_cross => DiamondCross(x, y);
    /// Scalar image data colour-mapped on the client; `image` is row-major.
    image => Image(image, x, y, dw, dh);
    image_rgba => ImageRGBA(image, x, y, dw, dh);
    image_url => ImageURL(url, x, y);
    inverted_triangle => InvertedTriangle(x, y);
    line => Line(x, y);
    /// One line per entry of `xs`/`ys`.
    multi_line => MultiLine(xs, ys);
    oval => Oval(x, y, width, height);
    patch => Patch(x, y);
    patches => Patches(xs, ys);
    quad => Quad(left, right, top, bottom);
    quadratic => Quadratic(x0, y0, x1, y1, cx, cy);
    ray => Ray(x, y, length, angle);
    rect => Rect(x, y, width, height);
    segment => Segment(x0, y0, x1, y1);
    square => Square(x, y);
    square_cross => SquareCross(x, y);
    square_x => SquareX(x, y);
    text => Text(x, y, text);
    triangle => Triangle(x, y);
    wedge => Wedge(x, y, radius, start_angle, end_angle);
    x => X(x, y);
}
