use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{collector::{load_results, log_results, ResultsDir}, error::{IoContext, ScanError, ScanResult}, generator::{generate, ScanPoint}, input_params::ScanConfig, plot_recipes::{render_recipe, single_field_chart, PlotContext, PlotKinds, PlotTrait}, runner::{CaseRun, CaseRunner}, table::ScanTable, type_lib::ResultMap};

#[derive(Debug, Clone)]
pub struct CollectSummary {
    pub results: ResultMap,
    pub csv: PathBuf,
    pub plot: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct PlotReport {
    pub rendered: Vec<PathBuf>,
    pub failed: Vec<(String, String)>,
}

/// One study rooted at `workdir`: template deck in, case tree and images out.
pub struct ScanDriver {
    pub config: ScanConfig,
    pub workdir: PathBuf,
}

impl ScanDriver {
    pub fn new(config: ScanConfig, workdir: &Path) -> ScanResult<Self> {
        config.validate()?;
        Ok(ScanDriver { config, workdir: workdir.to_path_buf() })
    }

    pub fn results_dir(&self) -> PathBuf {
        self.config.results_dir(&self.workdir)
    }

    pub fn generate(&self) -> ScanResult<Vec<ScanPoint>> {
        generate(&self.config, &self.workdir)
    }

    pub fn run(&self) -> ScanResult<Vec<CaseRun>> {
        CaseRunner::new(&self.config.solver, &self.config.prefix, self.config.skip_completed).run_all(&self.results_dir())
    }

    pub fn collect(&self, plot: bool) -> ScanResult<CollectSummary> {
        let param_x = self.config.param_x();
        let param_y = &self.config.param_y;
        let results = load_results(&self.results_dir(), &self.config.prefix, param_x, param_y)?;
        log_results(param_x, param_y, &results);

        let table = ScanTable::from_columns(param_x, vec![(param_y.clone(), results.clone())]);
        let csv = self.workdir.join(format!("{}_{}.csv", self.config.case_name, param_y));
        table.save_csv(&csv)?;
        info!("wrote {}", csv.display());

        let plot = if plot {
            let path = self.workdir.join(format!("{}_vs_{}.png", param_y, param_x));
            single_field_chart(&results, param_x, param_y)?.render(&path)?;
            info!("saved {}", path.display());
            Some(path)
        } else {
            None
        };
        Ok(CollectSummary { results, csv, plot })
    }

    pub fn table(&self, fields: &[String]) -> ScanResult<(PathBuf, PathBuf)> {
        let results_dir = ResultsDir::open(&self.results_dir(), &self.config.prefix)?;
        let table = ScanTable::collect(&results_dir, self.config.param_x(), fields);
        let stem = format!("{}_table", self.config.case_name);
        let csv = self.workdir.join(format!("{}.csv", stem));
        let json = self.workdir.join(format!("{}.json", stem));
        table.save_csv(&csv)?;
        table.save_json(&json)?;
        info!("wrote {} rows x {} fields to {}", table.x.len(), table.fields.len(), csv.display());
        Ok((csv, json))
    }

    /// Generate, run and collect in sequence.
    pub fn run_all(&self, plot: bool) -> ScanResult<CollectSummary> {
        self.generate()?;
        self.run()?;
        self.collect(plot)
    }
}

/// Runs the configured recipes on one results directory. A failing recipe is
/// recorded and the remaining ones still run.
pub fn plot_results_dir(config: &ScanConfig, results_path: &Path, report: &mut PlotReport) -> ScanResult<()> {
    let results = ResultsDir::open(results_path, &config.prefix)?;
    let ctx = PlotContext {
        results: &results,
        var_name: config.plot_var_name(),
        var_label: config.plot_var_label(),
        bands: config.plot.regime_bands,
        selected_constraints: config.plot.selected_constraints.as_deref(),
    };
    for name in config.plot.recipes.iter() {
        let recipe = PlotKinds::from(*name);
        match render_recipe(&recipe, &ctx) {
            Ok(path) => report.rendered.push(path),
            Err(err) => {
                warn!("{} failed for {}: {}", recipe.file_name(), results_path.display(), err);
                report.failed.push((results_path.display().to_string(), format!("{}: {}", recipe.file_name(), err)));
            }
        }
    }
    Ok(())
}

/// Plots every study directory below `plot_root`, skipping the exclusion list.
pub fn plot_studies(config: &ScanConfig, plot_root: &Path) -> ScanResult<PlotReport> {
    let mut studies = Vec::new();
    for entry in std::fs::read_dir(plot_root).at(plot_root)? {
        let path = entry.at(plot_root)?.path();
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if path.is_dir() && !config.plot.exclusion_list.contains(&name) {
            studies.push(path);
        }
    }
    studies.sort();
    info!("studies: {:?}", studies.iter().filter_map(|p| p.file_name()).collect::<Vec<_>>());

    let mut report = PlotReport::default();
    for study in studies.iter() {
        let results_path = study.join(&config.case_name);
        if !results_path.is_dir() {
            warn!("no {} directory in {}, skipping", config.case_name, study.display());
            continue;
        }
        info!("processing study {}", study.display());
        plot_results_dir(config, &results_path, &mut report)?;
    }
    Ok(report)
}

impl PlotReport {
    pub fn into_result(self) -> ScanResult<Vec<PathBuf>> {
        if self.failed.is_empty() {
            return Ok(self.rendered);
        }
        let summary = self.failed.iter().map(|(study, err)| format!("{} ({})", err, study)).collect::<Vec<_>>().join("; ");
        Err(ScanError::Plot(summary))
    }
}
