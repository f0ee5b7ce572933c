use std::path::{Path, PathBuf};

use clap::ValueEnum;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{collector::{log_results, ResultsDir}, error::ScanResult, palette::{cycle, tab20, INK, TAB_BLUE, TAB_GREEN, TAB_ORANGE, TAB_RED}, plotting::{AxisSlot, AxisSpec, Bounds, ChartSpec, SeriesSpec}, regions::RegimeBands, type_lib::{NumericData, ResultMap}};

/// Inequality constraints tracked in the constraint plot: residue code and label.
pub const CONSTRAINTS: [(&str, &str); 12] = [
    ("024", "Beta"),
    ("008", "Neutron_wall_load"),
    ("017", "Radiation_fraction"),
    ("018", "Divertor_heat_load"),
    ("067", "Radiation Wall load"),
    ("082", "toroidalgap"),
    ("083", "radialspace"),
    ("062", "f_alpha_confinement"),
    ("032", "TF_coil_stress"),
    ("034", "Dump voltage"),
    ("035", "J_WP / J_p"),
    ("065", "VV stress"),
];

pub struct PlotContext<'a> {
    pub results: &'a ResultsDir,
    pub var_name: &'a str,
    pub var_label: &'a str,
    pub bands: Option<RegimeBands>,
    pub selected_constraints: Option<&'a [String]>,
}

impl PlotContext<'_> {
    pub fn load(&self, field: &str) -> ResultMap {
        self.results.load_results(self.var_name, field)
    }

    pub fn points(&self, field: &str) -> Vec<(NumericData, NumericData)> {
        to_points(&self.load(field))
    }

    /// Images land next to the results directory.
    pub fn out_dir(&self) -> PathBuf {
        self.results.path.parent().map(Path::to_path_buf).unwrap_or_else(|| self.results.path.clone())
    }
}

pub fn to_points(results: &ResultMap) -> Vec<(NumericData, NumericData)> {
    results.iter().map(|(key, value)| (key.0, *value)).collect()
}

#[derive(Debug, Clone)]
pub struct ConstraintRecord {
    pub code: String,
    pub label: String,
    pub results: ResultMap,
}

pub fn load_constraints(ctx: &PlotContext, selected: Option<&[String]>) -> Vec<ConstraintRecord> {
    CONSTRAINTS.iter()
        .filter(|(code, _)| selected.map_or(true, |codes| codes.iter().any(|c| c == code)))
        .map(|(code, label)| ConstraintRecord {
            code: code.to_string(),
            label: label.to_string(),
            results: ctx.load(&format!("ineq_con{}", code)),
        })
        .collect()
}

#[enum_dispatch]
pub trait PlotTrait {
    fn file_name(&self) -> &'static str;
    fn chart(&self, ctx: &PlotContext) -> ScanResult<ChartSpec>;
}

pub struct CoeCapcost;
pub struct Parameters;
pub struct Parameters2;
pub struct Parameters3;
pub struct Constraints;
pub struct Power;
pub struct RMajor;

#[enum_dispatch(PlotTrait)]
pub enum PlotKinds {
    CoeCapcost(CoeCapcost),
    Parameters(Parameters),
    Parameters2(Parameters2),
    Parameters3(Parameters3),
    Constraints(Constraints),
    Power(Power),
    RMajor(RMajor),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RecipeName {
    CoeCapcost,
    Parameters,
    Parameters2,
    Parameters3,
    Constraints,
    Power,
    RMajor,
}

impl From<RecipeName> for PlotKinds {
    fn from(name: RecipeName) -> Self {
        match name {
            RecipeName::CoeCapcost => PlotKinds::CoeCapcost(CoeCapcost),
            RecipeName::Parameters => PlotKinds::Parameters(Parameters),
            RecipeName::Parameters2 => PlotKinds::Parameters2(Parameters2),
            RecipeName::Parameters3 => PlotKinds::Parameters3(Parameters3),
            RecipeName::Constraints => PlotKinds::Constraints(Constraints),
            RecipeName::Power => PlotKinds::Power(Power),
            RecipeName::RMajor => PlotKinds::RMajor(RMajor),
        }
    }
}

pub fn render_recipe(recipe: &PlotKinds, ctx: &PlotContext) -> ScanResult<PathBuf> {
    let path = ctx.out_dir().join(recipe.file_name());
    recipe.chart(ctx)?.render(&path)?;
    info!("saved {}", path.display());
    Ok(path)
}

fn series(ctx: &PlotContext, field: &str, label: &str, color: plotters::style::RGBColor) -> SeriesSpec {
    SeriesSpec::new(label, ctx.points(field), color)
}

/// Three fields on left, right and offset-right axes, each at ±10 %.
fn three_axis_chart(ctx: &PlotContext, title: Option<String>, fields: [(&str, &str, &str); 3]) -> ScanResult<ChartSpec> {
    let slots = [(AxisSlot::Left, TAB_BLUE), (AxisSlot::Right, TAB_GREEN), (AxisSlot::RightOffset, TAB_ORANGE)];
    let mut chart = ChartSpec::new(title, ctx.var_label);
    for ((field, axis_label, series_label), (slot, color)) in fields.into_iter().zip(slots) {
        chart.axes.push(AxisSpec::single(slot, axis_label, field, series(ctx, field, series_label, color), Bounds::TEN_PERCENT)?);
    }
    Ok(chart)
}

impl PlotTrait for CoeCapcost {
    fn file_name(&self) -> &'static str {
        "coe_capcost_plot.png"
    }

    fn chart(&self, ctx: &PlotContext) -> ScanResult<ChartSpec> {
        let coe = ctx.load("coe");
        let capcost = ctx.load("capcost");
        log_results(ctx.var_name, "coe", &coe);
        log_results(ctx.var_name, "capcost", &capcost);

        let mut chart = ChartSpec::new(Some(format!("Cost of electricity and capital cost vs {}", ctx.var_label)), ctx.var_label);
        chart.grid = true;
        chart.axes.push(AxisSpec::single(AxisSlot::Left, "COE ($/MWh)", "coe", SeriesSpec::new("COE", to_points(&coe), TAB_BLUE), Bounds::FromZero(1.1))?);
        chart.axes.push(AxisSpec::single(AxisSlot::Right, "Capital Cost (M$)", "capcost", SeriesSpec::new("Capital Cost", to_points(&capcost), TAB_RED), Bounds::FromZero(1.1))?);
        Ok(chart)
    }
}

impl PlotTrait for Parameters {
    fn file_name(&self) -> &'static str {
        "parameters_plot.png"
    }

    fn chart(&self, ctx: &PlotContext) -> ScanResult<ChartSpec> {
        three_axis_chart(ctx, Some(format!("Bt, Rmajor and coil scaling vs {}", ctx.var_label)), [
            ("b_plasma_toroidal_on_axis", "Bt (T)", "Bt"),
            ("rmajor", "Rmajor (m)", "Rmajor"),
            ("coil_aspect", "Coil Scaling Factor", "Coil Scaling Factor"),
        ])
    }
}

impl PlotTrait for Parameters2 {
    fn file_name(&self) -> &'static str {
        "parameters2_plot.png"
    }

    fn chart(&self, ctx: &PlotContext) -> ScanResult<ChartSpec> {
        let title = ctx.bands.is_none().then(|| format!("Te, ne and H-fact vs {}", ctx.var_label));
        let mut chart = three_axis_chart(ctx, title, [
            ("temp_plasma_electron_vol_avg_kev", "Electron temperature (keV)", "Te"),
            ("nd_plasma_electrons_vol_avg", "Electron density (1/m3)", "ne"),
            ("hfact", "H-factor", "h-fact"),
        ])?;
        chart.bands = ctx.bands;
        Ok(chart)
    }
}

impl PlotTrait for Parameters3 {
    fn file_name(&self) -> &'static str {
        "parameters3_plot.png"
    }

    fn chart(&self, ctx: &PlotContext) -> ScanResult<ChartSpec> {
        let wide = Bounds::Scaled { lower: 0.8, upper: 1.2 };
        let mut chart = ChartSpec::new(None, ctx.var_label);
        chart.bands = ctx.bands;
        chart.axes.push(AxisSpec::single(AxisSlot::Left, "Rmajor (m)", "rmajor", series(ctx, "rmajor", "Rmajor", INK).weight(3, 7), Bounds::Scaled { lower: 0.97, upper: 1.03 })?);
        chart.axes.push(AxisSpec::single(AxisSlot::LeftOffset, "Electron temperature (keV)", "temp_plasma_electron_vol_avg_kev", series(ctx, "temp_plasma_electron_vol_avg_kev", "Te", TAB_BLUE).dashed().weight(2, 3), wide)?);
        chart.axes.push(AxisSpec::single(AxisSlot::Right, "Electron density (1/m3)", "nd_plasma_electrons_vol_avg", series(ctx, "nd_plasma_electrons_vol_avg", "ne", TAB_GREEN).dashed().weight(2, 3), wide)?);
        chart.axes.push(AxisSpec::single(AxisSlot::RightOffset, "H-factor", "hfact", series(ctx, "hfact", "h-fact", TAB_ORANGE).dashed().weight(2, 3), wide)?);
        Ok(chart)
    }
}

impl PlotTrait for Constraints {
    fn file_name(&self) -> &'static str {
        "constrains_plot.png"
    }

    fn chart(&self, ctx: &PlotContext) -> ScanResult<ChartSpec> {
        let records = load_constraints(ctx, ctx.selected_constraints);
        let colors = tab20(records.len());
        let mut axis = AxisSpec::new(AxisSlot::Left, "normalised residue", INK, 0.0..1.0);
        for (record, color) in records.iter().zip(colors) {
            axis = axis.with(SeriesSpec::new(&record.label, to_points(&record.results), color));
        }

        let mut chart = ChartSpec::new(Some("Constraints".to_string()), ctx.var_label);
        chart.size = (1000, 700);
        chart.legend = true;
        chart.bands = ctx.bands;
        chart.axes.push(axis);
        Ok(chart)
    }
}

impl PlotTrait for Power {
    fn file_name(&self) -> &'static str {
        "power_plot.png"
    }

    fn chart(&self, ctx: &PlotContext) -> ScanResult<ChartSpec> {
        let fields = [
            ("p_plant_electric_net_mw", "P_net"),
            ("p_plant_electric_gross_mw", "P_gross"),
            ("p_plant_electric_recirc_mw", "P_rec"),
            ("p_fusion_total_mw", "P_fus"),
        ];
        let all_series: Vec<SeriesSpec> = fields.iter().enumerate().map(|(i, (field, label))| series(ctx, field, label, cycle(i))).collect();
        let range = Bounds::FromZero(1.05).resolve("p_fusion_total_mw", &all_series[3].values())?;

        let mut axis = AxisSpec::new(AxisSlot::Left, "Power (MW)", INK, range);
        for series in all_series {
            axis = axis.with(series);
        }
        let mut chart = ChartSpec::new(Some("Power".to_string()), ctx.var_label);
        chart.legend = true;
        chart.axes.push(axis);
        Ok(chart)
    }
}

impl PlotTrait for RMajor {
    fn file_name(&self) -> &'static str {
        "R_major_plot.png"
    }

    fn chart(&self, ctx: &PlotContext) -> ScanResult<ChartSpec> {
        let mut chart = ChartSpec::new(None, ctx.var_label);
        chart.bands = ctx.bands;
        chart.axes.push(AxisSpec::single(AxisSlot::Left, "Rmajor (m)", "rmajor", series(ctx, "rmajor", "Rmajor", INK), Bounds::Scaled { lower: 0.95, upper: 1.05 })?);
        Ok(chart)
    }
}

/// `param_y` against the swept variable on a single axis.
pub fn single_field_chart(results: &ResultMap, param_x: &str, param_y: &str) -> ScanResult<ChartSpec> {
    let mut chart = ChartSpec::new(Some(format!("{} vs {}", param_y, param_x)), param_x);
    chart.grid = true;
    chart.axes.push(AxisSpec::single(AxisSlot::Left, param_y, param_y, SeriesSpec::new(param_y, to_points(results), TAB_BLUE), Bounds::TEN_PERCENT)?);
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submodules::{collector::fixtures::write_case, error::ScanError};

    fn field_scan() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results");
        for (i, b) in [5.5, 6.25, 7.0].iter().enumerate() {
            let fields = [
                ("b_plasma_toroidal_on_axis", *b),
                ("rmajor", 22.0 - 2.0 * i as f64),
                ("temp_plasma_electron_vol_avg_kev", 6.0 + i as f64),
                ("nd_plasma_electrons_vol_avg", 1.5e20),
                ("hfact", 1.1),
                ("ineq_con024", 0.1 * (i + 1) as f64),
                ("ineq_con083", 0.5),
                ("p_plant_electric_net_mw", 1000.0),
                ("p_fusion_total_mw", 3000.0 + 100.0 * i as f64),
            ];
            write_case(&results, &format!("B_{}", b), &fields, 1.0);
        }
        dir
    }

    fn with_ctx<T>(dir: &Path, bands: Option<RegimeBands>, selected: Option<&[String]>, f: impl FnOnce(&PlotContext) -> T) -> T {
        let results = ResultsDir::open(&dir.join("results"), "squid").unwrap();
        let ctx = PlotContext { results: &results, var_name: "b_plasma_toroidal_on_axis", var_label: "B (T)", bands, selected_constraints: selected };
        f(&ctx)
    }

    #[test]
    fn images_go_next_to_results_dir() {
        let dir = field_scan();
        with_ctx(dir.path(), None, None, |ctx| {
            assert_eq!(ctx.out_dir(), dir.path());
            let recipe: PlotKinds = RecipeName::RMajor.into();
            assert_eq!(recipe.file_name(), "R_major_plot.png");
        });
    }

    #[test]
    fn parameters3_uses_four_axes_and_bands() {
        let dir = field_scan();
        let chart = with_ctx(dir.path(), Some(RegimeBands::default()), None, |ctx| Parameters3.chart(ctx)).unwrap();
        let slots: Vec<_> = chart.axes.iter().map(|a| a.slot).collect();
        assert_eq!(slots, vec![AxisSlot::Left, AxisSlot::LeftOffset, AxisSlot::Right, AxisSlot::RightOffset]);
        assert_eq!(chart.x_range().unwrap(), 5.0..9.25);
        let rmajor = &chart.axes[0];
        approx::assert_relative_eq!(rmajor.range.start, 18.0 * 0.97);
        approx::assert_relative_eq!(rmajor.range.end, 22.0 * 1.03);
    }

    #[test]
    fn constraint_selection_keeps_list_order() {
        let dir = field_scan();
        let selected = vec!["083".to_string(), "024".to_string()];
        let records = with_ctx(dir.path(), None, Some(selected.as_slice()), |ctx| load_constraints(ctx, ctx.selected_constraints));
        let codes: Vec<_> = records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["024", "083"]);
        assert_eq!(records[0].results.len(), 3);
    }

    #[test]
    fn all_constraints_get_a_series() {
        let dir = field_scan();
        let chart = with_ctx(dir.path(), None, None, |ctx| Constraints.chart(ctx)).unwrap();
        assert_eq!(chart.axes[0].series.len(), CONSTRAINTS.len());
        assert_eq!(chart.axes[0].range, 0.0..1.0);
        assert!(chart.legend);
    }

    #[test]
    fn power_axis_follows_fusion_power() {
        let dir = field_scan();
        let chart = with_ctx(dir.path(), None, None, |ctx| Power.chart(ctx)).unwrap();
        assert_eq!(chart.axes[0].range.start, 0.0);
        approx::assert_relative_eq!(chart.axes[0].range.end, 3200.0 * 1.05);
        assert_eq!(chart.axes[0].series[1].points.len(), 0);
    }

    #[test]
    fn missing_field_is_no_data() {
        let dir = field_scan();
        match with_ctx(dir.path(), None, None, |ctx| CoeCapcost.chart(ctx)) {
            Err(ScanError::NoData { field }) => assert_eq!(field, "coe"),
            other => panic!("unexpected {:?}", other.map(|c| c.title)),
        }
    }

    #[test]
    fn recipe_names_read_from_json() {
        let names: Vec<RecipeName> = serde_json::from_str(r#"["coe_capcost", "parameters3", "r_major"]"#).unwrap();
        assert_eq!(names, vec![RecipeName::CoeCapcost, RecipeName::Parameters3, RecipeName::RMajor]);
    }
}
