use std::{collections::HashSet, path::{Path, PathBuf}};

use tracing::{debug, info, warn};

use super::{error::{IoContext, ScanError, ScanResult}, input_deck::{format_deck_value, InputDeck}, input_params::ScanConfig, type_lib::{input_file_name, NumericData}};

/// A single value of the swept variable and the directory holding its case.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPoint {
    pub value: NumericData,
    pub case_dir: PathBuf,
}

pub fn case_dir_name(short_name: &str, value: NumericData) -> String {
    format!("{}_{}", short_name, format_deck_value(value))
}

/// Writes one deck per grid value under `<workdir>/<case_name>/<short>_<value>/`.
pub fn generate(config: &ScanConfig, workdir: &Path) -> ScanResult<Vec<ScanPoint>> {
    let grid = config.grid()?;
    let template_path = config.template_deck(workdir);
    let template = InputDeck::read(&template_path)?;
    if template.get(&config.var_name).is_none() {
        warn!("{} not set in {}, it will be appended", config.var_name, template_path.display());
    }

    let results_dir = config.results_dir(workdir);
    if config.clean_start && results_dir.exists() {
        info!("clean start: removing {}", results_dir.display());
        std::fs::remove_dir_all(&results_dir).at(&results_dir)?;
    }
    std::fs::create_dir_all(&results_dir).at(&results_dir)?;

    let mut names = HashSet::new();
    let scan_points = grid.values.iter().map(|&value| {
        let name = case_dir_name(&config.var_short_name, value);
        if !names.insert(name.clone()) {
            return Err(ScanError::DuplicateCase(name));
        }
        Ok(ScanPoint { value, case_dir: results_dir.join(name) })
    }).collect::<ScanResult<Vec<_>>>()?;

    let deck_name = input_file_name(&config.prefix);
    for point in scan_points.iter() {
        std::fs::create_dir_all(&point.case_dir).at(&point.case_dir)?;
        let mut deck = template.clone();
        deck.set_value(&config.var_name, point.value);
        deck.write(&point.case_dir.join(&deck_name))?;
        debug!("wrote {} = {} to {}", config.var_name, point.value, point.case_dir.display());
    }

    info!("generated {} cases of {} in {}", scan_points.len(), config.var_name, results_dir.display());
    Ok(scan_points)
}
