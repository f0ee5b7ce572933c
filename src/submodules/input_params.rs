use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{error::{IoContext, ScanError, ScanResult}, plot_recipes::RecipeName, regions::RegimeBands, type_lib::{input_file_name, NumericData}};

const GRID_DECIMALS: i32 = 10;
pub const MAX_SCAN_POINTS: usize = 100_000;

/// One study: which key to sweep, over what range, and how to collect and plot it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_case_name")]
    pub case_name: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    pub var_name: String,
    pub var_short_name: String,
    pub var_min: NumericData,
    pub var_max: NumericData,
    pub step: NumericData,
    #[serde(default)]
    pub clean_start: bool,
    #[serde(default = "default_solver")]
    pub solver: String,
    #[serde(default)]
    pub skip_completed: bool,
    /// Defaults to `var_name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_x: Option<String>,
    #[serde(default = "default_param_y")]
    pub param_y: String,
    #[serde(default)]
    pub plot: PlotSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotSettings {
    /// Output field used as the x axis. Falls back to the swept variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var_label: Option<String>,
    #[serde(default)]
    pub exclusion_list: Vec<String>,
    #[serde(default = "default_recipes")]
    pub recipes: Vec<RecipeName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_constraints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regime_bands: Option<RegimeBands>,
}

fn default_case_name() -> String {
    "results".to_string()
}
fn default_prefix() -> String {
    "squid".to_string()
}
fn default_solver() -> String {
    "process".to_string()
}
fn default_param_y() -> String {
    "coe".to_string()
}
fn default_recipes() -> Vec<RecipeName> {
    vec![RecipeName::CoeCapcost, RecipeName::Parameters, RecipeName::Parameters2, RecipeName::Constraints, RecipeName::Power]
}

impl Default for PlotSettings {
    fn default() -> Self {
        PlotSettings {
            var_name: None,
            var_label: None,
            exclusion_list: Vec::new(),
            recipes: default_recipes(),
            selected_constraints: None,
            regime_bands: None,
        }
    }
}

impl ScanConfig {
    pub fn load(path: &Path) -> ScanResult<Self> {
        let file = std::fs::read_to_string(path).at(path)?;
        let config: ScanConfig = serde_json::from_str(&file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ScanResult<()> {
        if self.var_name.trim().is_empty() {
            return Err(ScanError::Config("var_name must not be empty".to_string()));
        }
        if self.var_short_name.trim().is_empty() || self.var_short_name.contains(std::path::MAIN_SEPARATOR) {
            return Err(ScanError::Config(format!("invalid var_short_name `{}`", self.var_short_name)));
        }
        if self.prefix.trim().is_empty() || self.case_name.trim().is_empty() {
            return Err(ScanError::Config("prefix and case_name must not be empty".to_string()));
        }
        VarGrid::new_stepped(self.var_min, self.var_max, self.step).map(|_| ())
    }

    pub fn param_x(&self) -> &str {
        self.param_x.as_deref().unwrap_or(&self.var_name)
    }

    pub fn plot_var_name(&self) -> &str {
        self.plot.var_name.as_deref().unwrap_or(&self.var_name)
    }

    pub fn plot_var_label(&self) -> &str {
        self.plot.var_label.as_deref().unwrap_or_else(|| self.plot_var_name())
    }

    pub fn grid(&self) -> ScanResult<VarGrid> {
        VarGrid::new_stepped(self.var_min, self.var_max, self.step)
    }

    pub fn results_dir(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.case_name)
    }

    pub fn template_deck(&self, workdir: &Path) -> PathBuf {
        workdir.join(input_file_name(&self.prefix))
    }
}

/// Values of the swept variable, one per scan point.
#[derive(Debug, Clone)]
pub struct VarGrid {
    pub values: Vec<NumericData>,
}

impl VarGrid {
    pub fn new_stepped(var_min: NumericData, var_max: NumericData, step: NumericData) -> ScanResult<Self> {
        if !var_min.is_finite() || !var_max.is_finite() || !step.is_finite() {
            return Err(ScanError::Config(format!("non-finite scan range {}..{} step {}", var_min, var_max, step)));
        }
        if step <= 0.0 {
            return Err(ScanError::Config(format!("scan step must be positive, got {}", step)));
        }
        if var_max < var_min {
            return Err(ScanError::Config(format!("var_max {} is below var_min {}", var_max, var_min)));
        }
        let steps = ((var_max - var_min) / step + 1e-9).floor();
        if !steps.is_finite() || steps >= MAX_SCAN_POINTS as NumericData {
            return Err(ScanError::Config(format!("{}..{} step {} exceeds {} scan points", var_min, var_max, step, MAX_SCAN_POINTS)));
        }
        let n_steps = steps as usize;
        let values = (0..=n_steps).map(|i| round_grid_value(var_min + i as NumericData * step)).collect();
        Ok(VarGrid { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

pub fn round_grid_value(value: NumericData) -> NumericData {
    let scale = 10_f64.powi(GRID_DECIMALS);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn coil_config() -> ScanConfig {
        serde_json::from_str(r#"{
            "var_name": "f_st_coil_aspect",
            "var_short_name": "Ac",
            "var_min": 0.8,
            "var_max": 1.2,
            "step": 0.05
        }"#).unwrap()
    }

    #[test]
    fn stepped_grid_includes_upper_bound() {
        let grid = VarGrid::new_stepped(0.8, 1.2, 0.05).unwrap();
        assert_eq!(grid.len(), 9);
        assert_relative_eq!(grid.values[0], 0.8);
        assert_eq!(grid.values[1], 0.85);
        assert_relative_eq!(grid.values[8], 1.2);
    }

    #[test]
    fn field_grid_has_seventeen_points() {
        let grid = VarGrid::new_stepped(5.0, 9.0, 0.25).unwrap();
        assert_eq!(grid.len(), 17);
        assert_eq!(grid.values[5], 6.25);
    }

    #[test]
    fn degenerate_range_is_single_point() {
        let grid = VarGrid::new_stepped(2.0, 2.0, 0.5).unwrap();
        assert_eq!(grid.values, vec![2.0]);
    }

    #[test]
    fn bad_steps_rejected() {
        assert!(VarGrid::new_stepped(0.0, 1.0, 0.0).is_err());
        assert!(VarGrid::new_stepped(0.0, 1.0, -0.1).is_err());
        assert!(VarGrid::new_stepped(0.0, 1.0, f64::NAN).is_err());
        assert!(VarGrid::new_stepped(0.0, f64::INFINITY, 0.1).is_err());
        assert!(VarGrid::new_stepped(1.0, 0.0, 0.1).is_err());
    }

    #[test]
    fn tiny_steps_rejected_before_allocating() {
        assert!(matches!(VarGrid::new_stepped(0.0, 1.0, 1e-320), Err(ScanError::Config(_))));
        assert!(matches!(VarGrid::new_stepped(0.0, 1e12, 1e-6), Err(ScanError::Config(_))));
        assert_eq!(VarGrid::new_stepped(0.0, 1000.0, 0.5).unwrap().len(), 2001);
    }

    #[test]
    fn defaults_fill_in() {
        let config = coil_config();
        assert_eq!(config.case_name, "results");
        assert_eq!(config.prefix, "squid");
        assert_eq!(config.solver, "process");
        assert_eq!(config.param_x(), "f_st_coil_aspect");
        assert_eq!(config.plot_var_label(), "f_st_coil_aspect");
        assert_eq!(config.plot.recipes.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, serde_json::to_string(&coil_config()).unwrap()).unwrap();
        let loaded = ScanConfig::load(&path).unwrap();
        assert_eq!(loaded.var_short_name, "Ac");
        assert_eq!(loaded.template_deck(dir.path()), dir.path().join("squid.IN.DAT"));
    }

    #[test]
    fn load_rejects_empty_short_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        let mut config = coil_config();
        config.var_short_name = String::new();
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
        assert!(matches!(ScanConfig::load(&path), Err(ScanError::Config(_))));
    }
}
