use crate::submodules::input_params::{PlotSettings, ScanConfig};

/// Coil aspect ratio sweep, plotted against the `coil_aspect` output.
pub fn config() -> ScanConfig {
    let var_min = 0.8;
    let var_max = 1.2;
    let step = 0.05;

    ScanConfig {
        case_name: "results".to_string(),
        prefix: "squid".to_string(),
        var_name: "f_st_coil_aspect".to_string(),
        var_short_name: "Ac".to_string(),
        var_min,
        var_max,
        step,
        clean_start: false,
        solver: "process".to_string(),
        skip_completed: false,
        param_x: None,
        param_y: "rmajor".to_string(),
        plot: PlotSettings {
            var_name: Some("coil_aspect".to_string()),
            var_label: Some("Coil aspect".to_string()),
            ..PlotSettings::default()
        },
    }
}
