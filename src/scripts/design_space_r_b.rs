use crate::submodules::{input_params::{PlotSettings, ScanConfig}, plot_recipes::RecipeName, regions::RegimeBands};

/// Toroidal field sweep across the design space, with field regime bands.
pub fn config() -> ScanConfig {
    let var_min = 5.0;
    let var_max = 9.0;
    let step = 0.25;

    let selected_constraints = ["024", "008", "083", "062", "032"].iter().map(|c| c.to_string()).collect();

    ScanConfig {
        case_name: "results".to_string(),
        prefix: "squid".to_string(),
        var_name: "b_plasma_toroidal_on_axis".to_string(),
        var_short_name: "B".to_string(),
        var_min,
        var_max,
        step,
        clean_start: false,
        solver: "process".to_string(),
        skip_completed: false,
        param_x: None,
        param_y: "coe".to_string(),
        plot: PlotSettings {
            var_name: None,
            var_label: Some("B (T)".to_string()),
            exclusion_list: vec!["HTS_high_stress".to_string()],
            recipes: vec![RecipeName::Parameters2, RecipeName::Parameters3, RecipeName::Constraints, RecipeName::RMajor],
            selected_constraints: Some(selected_constraints),
            regime_bands: Some(RegimeBands::default()),
        },
    }
}
