use std::ops::Range;

use plotters::{coord::types::RangedCoordf64, prelude::*};
use serde::{Deserialize, Serialize};

use super::{error::ScanResult, palette::{TAB_GREEN, TAB_ORANGE, TAB_RED}, type_lib::NumericData};

pub const LOW_FIELD_LIMIT: NumericData = 6.25;
pub const HIGH_FIELD_LIMIT: NumericData = 6.5;
const BAND_ALPHA: f64 = 0.2;

/// Shaded field regimes over a fixed x window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeBands {
    pub x_min: NumericData,
    pub x_max: NumericData,
    #[serde(default = "default_labels")]
    pub labels: bool,
}

fn default_labels() -> bool {
    true
}

impl Default for RegimeBands {
    fn default() -> Self {
        RegimeBands { x_min: 5.0, x_max: 9.25, labels: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub x_start: NumericData,
    pub x_end: NumericData,
    pub color: RGBColor,
    pub label: &'static str,
    pub label_x: NumericData,
}

impl RegimeBands {
    pub fn x_range(&self) -> Range<NumericData> {
        self.x_min..self.x_max
    }

    /// Low, optimal and high field bands. Breakpoints do not depend on the data.
    pub fn bands(&self) -> [Band; 3] {
        [
            Band { x_start: self.x_min, x_end: LOW_FIELD_LIMIT, color: TAB_RED, label: "Low field", label_x: 5.8 },
            Band { x_start: LOW_FIELD_LIMIT, x_end: HIGH_FIELD_LIMIT, color: TAB_GREEN, label: "Optimal field", label_x: 6.35 },
            Band { x_start: HIGH_FIELD_LIMIT, x_end: self.x_max, color: TAB_ORANGE, label: "High field", label_x: 6.9 },
        ]
    }

    pub fn draw<DB: DrawingBackend>(&self, chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>, y_range: &Range<NumericData>) -> ScanResult<()> {
        let bands = self.bands();
        chart.draw_series(bands.iter().map(|band| {
            Rectangle::new([(band.x_start, y_range.start), (band.x_end, y_range.end)], band.color.mix(BAND_ALPHA).filled())
        }))?;

        if self.labels {
            let label_y = y_range.start + 0.95 * (y_range.end - y_range.start);
            let style = TextStyle::from(("sans-serif", 14).into_font().style(FontStyle::Bold)).transform(FontTransform::Rotate90);
            chart.draw_series(bands.iter().map(|band| Text::new(band.label, (band.label_x, label_y), style.clone())))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_adjacent_bands_with_fixed_breakpoints() {
        let bands = RegimeBands { x_min: 5.0, x_max: 9.25, labels: false }.bands();
        assert_eq!(bands.len(), 3);
        assert_eq!(bands[0].x_start, 5.0);
        assert_eq!(bands[0].x_end, 6.25);
        assert_eq!(bands[1].x_start, 6.25);
        assert_eq!(bands[1].x_end, 6.5);
        assert_eq!(bands[2].x_start, 6.5);
        assert_eq!(bands[2].x_end, 9.25);
        for pair in bands.windows(2) {
            assert_eq!(pair[0].x_end, pair[1].x_start);
        }
    }

    #[test]
    fn breakpoints_ignore_window() {
        let bands = RegimeBands { x_min: 4.0, x_max: 12.0, labels: true }.bands();
        assert_eq!(bands[0].x_end, LOW_FIELD_LIMIT);
        assert_eq!(bands[2].x_start, HIGH_FIELD_LIMIT);
        assert_eq!(bands.iter().map(|b| b.label).collect::<Vec<_>>(), vec!["Low field", "Optimal field", "High field"]);
    }

    #[test]
    fn default_window_matches_field_scan() {
        let bands: RegimeBands = serde_json::from_str(r#"{"x_min": 5.0, "x_max": 9.25}"#).unwrap();
        assert_eq!(bands, RegimeBands::default());
        assert_eq!(bands.x_range(), 5.0..9.25);
    }
}
