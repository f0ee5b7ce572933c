use std::{ops::Range, path::Path};

use plotters::{coord::{types::RangedCoordf64, Shift}, prelude::*, series::DashedLineSeries, style::text_anchor::{HPos, Pos, VPos}};

use super::{error::{ScanError, ScanResult}, regions::RegimeBands, type_lib::NumericData};

const AXIS_AREA: u32 = 75;
const NO_AXIS_AREA: u32 = 20;
const TICKS: usize = 5;
const X_MARGIN: NumericData = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisSlot {
    Left,
    LeftOffset,
    Right,
    RightOffset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineKind {
    Solid,
    Dashed,
}

/// How an axis range follows its data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    /// `[lower * min, upper * max]`
    Scaled { lower: NumericData, upper: NumericData },
    /// `[0, upper * max]`
    FromZero(NumericData),
    Fixed(NumericData, NumericData),
}

impl Bounds {
    pub const TEN_PERCENT: Bounds = Bounds::Scaled { lower: 0.9, upper: 1.1 };

    pub fn resolve(&self, field: &str, values: &[NumericData]) -> ScanResult<Range<NumericData>> {
        let no_data = || ScanError::NoData { field: field.to_string() };
        let (lo, hi) = match *self {
            Bounds::Fixed(lo, hi) => return Ok(lo..hi),
            Bounds::Scaled { lower, upper } => {
                let (min, max) = min_max(values).ok_or_else(no_data)?;
                (min * lower, max * upper)
            }
            Bounds::FromZero(upper) => {
                let (_, max) = min_max(values).ok_or_else(no_data)?;
                (0.0, max * upper)
            }
        };
        Ok(padded(lo, hi))
    }
}

pub fn min_max(values: &[NumericData]) -> Option<(NumericData, NumericData)> {
    values.iter().filter(|v| v.is_finite()).fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Orders the ends and widens a zero-width range so it can be drawn.
pub fn padded(a: NumericData, b: NumericData) -> Range<NumericData> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if hi - lo > NumericData::EPSILON * hi.abs().max(1.0) {
        return lo..hi;
    }
    let pad = if lo == 0.0 { 1.0 } else { 0.1 * lo.abs() };
    (lo - pad)..(hi + pad)
}

pub fn format_tick(value: NumericData) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-2..1e4).contains(&magnitude) {
        format!("{:.2e}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Linear map from one axis range onto the primary axis range.
#[derive(Debug, Clone, Copy)]
pub struct AxisMap {
    from_start: NumericData,
    to_start: NumericData,
    scale: NumericData,
}

impl AxisMap {
    pub fn new(from: &Range<NumericData>, to: &Range<NumericData>) -> Self {
        let width = from.end - from.start;
        let scale = if width == 0.0 { 1.0 } else { (to.end - to.start) / width };
        AxisMap { from_start: from.start, to_start: to.start, scale }
    }

    pub fn apply(&self, value: NumericData) -> NumericData {
        self.to_start + (value - self.from_start) * self.scale
    }
}

#[derive(Debug, Clone)]
pub struct SeriesSpec {
    pub label: String,
    pub points: Vec<(NumericData, NumericData)>,
    pub color: RGBColor,
    pub line: LineKind,
    pub stroke_width: u32,
    pub marker_size: u32,
}

impl SeriesSpec {
    pub fn new(label: &str, points: Vec<(NumericData, NumericData)>, color: RGBColor) -> Self {
        SeriesSpec { label: label.to_string(), points, color, line: LineKind::Solid, stroke_width: 2, marker_size: 4 }
    }

    pub fn dashed(mut self) -> Self {
        self.line = LineKind::Dashed;
        self
    }

    pub fn weight(mut self, stroke_width: u32, marker_size: u32) -> Self {
        self.stroke_width = stroke_width;
        self.marker_size = marker_size;
        self
    }

    pub fn values(&self) -> Vec<NumericData> {
        self.points.iter().map(|p| p.1).collect()
    }
}

#[derive(Debug, Clone)]
pub struct AxisSpec {
    pub slot: AxisSlot,
    pub label: String,
    pub color: RGBColor,
    pub range: Range<NumericData>,
    pub series: Vec<SeriesSpec>,
}

impl AxisSpec {
    pub fn new(slot: AxisSlot, label: &str, color: RGBColor, range: Range<NumericData>) -> Self {
        AxisSpec { slot, label: label.to_string(), color, range, series: Vec::new() }
    }

    /// Axis holding one series, its range resolved from that series' values.
    pub fn single(slot: AxisSlot, label: &str, field: &str, series: SeriesSpec, bounds: Bounds) -> ScanResult<Self> {
        let range = bounds.resolve(field, &series.values())?;
        Ok(AxisSpec::new(slot, label, series.color, range).with(series))
    }

    pub fn with(mut self, series: SeriesSpec) -> Self {
        self.series.push(series);
        self
    }
}

/// A chart with one shared x axis and up to four independently scaled y axes.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub title: Option<String>,
    pub x_label: String,
    pub size: (u32, u32),
    pub axes: Vec<AxisSpec>,
    pub bands: Option<RegimeBands>,
    pub legend: bool,
    pub grid: bool,
}

impl ChartSpec {
    pub fn new(title: Option<String>, x_label: &str) -> Self {
        ChartSpec { title, x_label: x_label.to_string(), size: (700, 500), axes: Vec::new(), bands: None, legend: false, grid: false }
    }

    pub fn axis(&self, slot: AxisSlot) -> Option<&AxisSpec> {
        self.axes.iter().find(|axis| axis.slot == slot)
    }

    pub fn x_range(&self) -> ScanResult<Range<NumericData>> {
        if let Some(bands) = &self.bands {
            return Ok(bands.x_range());
        }
        let xs: Vec<NumericData> = self.axes.iter().flat_map(|axis| axis.series.iter()).flat_map(|series| series.points.iter().map(|p| p.0)).collect();
        let (lo, hi) = min_max(&xs).ok_or_else(|| ScanError::NoData { field: self.x_label.clone() })?;
        let margin = X_MARGIN * (hi - lo);
        Ok(padded(lo - margin, hi + margin))
    }

    pub fn render(&self, path: &Path) -> ScanResult<()> {
        let primary = self.axis(AxisSlot::Left).ok_or_else(|| ScanError::Plot("chart has no left axis".to_string()))?;
        let x_range = self.x_range()?;

        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let left_area = AXIS_AREA + if self.axis(AxisSlot::LeftOffset).is_some() { AXIS_AREA } else { 0 };
        let right_area = match (self.axis(AxisSlot::Right).is_some(), self.axis(AxisSlot::RightOffset).is_some()) {
            (false, false) => NO_AXIS_AREA,
            (true, false) | (false, true) => AXIS_AREA,
            (true, true) => 2 * AXIS_AREA,
        };

        let mut builder = ChartBuilder::on(&root);
        builder
            .margin(12)
            .x_label_area_size(45)
            .set_label_area_size(LabelAreaPosition::Left, left_area)
            .set_label_area_size(LabelAreaPosition::Right, right_area);
        if let Some(title) = &self.title {
            builder.caption(title, ("sans-serif", 22));
        }
        let secondary_range = self.axis(AxisSlot::Right).map(|axis| axis.range.clone()).unwrap_or_else(|| primary.range.clone());
        let mut chart = builder
            .build_cartesian_2d(x_range.clone(), primary.range.clone())?
            .set_secondary_coord(x_range.clone(), secondary_range);

        {
            let mut mesh = chart.configure_mesh();
            mesh.x_desc(self.x_label.as_str())
                .y_desc(primary.label.as_str())
                .y_label_style(("sans-serif", 12).into_font().color(&primary.color))
                .axis_desc_style(("sans-serif", 15));
            if !self.grid {
                mesh.disable_mesh();
            }
            mesh.draw()?;
        }

        if let Some(axis) = self.axis(AxisSlot::Right) {
            chart
                .configure_secondary_axes()
                .y_desc(axis.label.as_str())
                .label_style(("sans-serif", 12).into_font().color(&axis.color))
                .axis_desc_style(("sans-serif", 15))
                .draw()?;
        }

        if let Some(bands) = &self.bands {
            bands.draw(&mut *chart, &primary.range)?;
        }

        // every series is drawn in primary coordinates
        for axis in self.axes.iter() {
            let map = AxisMap::new(&axis.range, &primary.range);
            for series in axis.series.iter() {
                let points = series.points.iter().map(|&(x, y)| (x, map.apply(y))).collect();
                draw_line(&mut *chart, series, points, self.legend)?;
            }
        }

        if self.legend {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        let (left, top) = chart.backend_coord(&(x_range.start, primary.range.end));
        let (right, bottom) = chart.backend_coord(&(x_range.end, primary.range.start));
        if let Some(axis) = self.axis(AxisSlot::LeftOffset) {
            draw_offset_axis(&root, axis, left - AXIS_AREA as i32, top, bottom, -1)?;
        }
        if let Some(axis) = self.axis(AxisSlot::RightOffset) {
            let spine = if self.axis(AxisSlot::Right).is_some() { right + AXIS_AREA as i32 } else { right };
            draw_offset_axis(&root, axis, spine, top, bottom, 1)?;
        }

        root.present()?;
        Ok(())
    }
}

fn draw_line<DB: DrawingBackend>(chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>, series: &SeriesSpec, points: Vec<(NumericData, NumericData)>, legend: bool) -> ScanResult<()> {
    let style = series.color.stroke_width(series.stroke_width);
    let anno = match series.line {
        LineKind::Solid => chart.draw_series(LineSeries::new(points.clone(), style))?,
        LineKind::Dashed => chart.draw_series(DashedLineSeries::new(points.clone(), 8, 5, style))?,
    };
    if legend {
        let color = series.color;
        anno.label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }
    chart.draw_series(points.iter().map(|&point| Circle::new(point, series.marker_size, series.color.filled())))?;
    Ok(())
}

/// Draws a free-standing y axis (spine, ticks, labels) in pixel space.
/// `outward` is `1` for an axis right of the plot and `-1` for one on the left.
fn draw_offset_axis<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, axis: &AxisSpec, spine_x: i32, top: i32, bottom: i32, outward: i32) -> ScanResult<()> {
    let line = axis.color.stroke_width(1);
    root.draw(&PathElement::new(vec![(spine_x, top), (spine_x, bottom)], line))?;

    let h_pos = if outward > 0 { HPos::Left } else { HPos::Right };
    let tick_style = TextStyle::from(("sans-serif", 12).into_font()).color(&axis.color).pos(Pos::new(h_pos, VPos::Center));
    for k in 0..=TICKS {
        let fraction = k as NumericData / TICKS as NumericData;
        let value = axis.range.start + fraction * (axis.range.end - axis.range.start);
        let y = bottom - (fraction * (bottom - top) as NumericData).round() as i32;
        root.draw(&PathElement::new(vec![(spine_x, y), (spine_x + 5 * outward, y)], line))?;
        root.draw(&Text::new(format_tick(value), (spine_x + 8 * outward, y), tick_style.clone()))?;
    }

    let desc_style = TextStyle::from(("sans-serif", 15).into_font()).color(&axis.color).pos(Pos::new(HPos::Center, VPos::Center)).transform(FontTransform::Rotate270);
    root.draw(&Text::new(axis.label.clone(), (spine_x + 62 * outward, (top + bottom) / 2), desc_style))?;
    Ok(())
}
