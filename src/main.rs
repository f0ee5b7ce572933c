use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scripts::Preset;
use submodules::{input_params::ScanConfig, plot_recipes::RecipeName, scan::{plot_results_dir, plot_studies, PlotReport, ScanDriver}};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod scripts;
mod submodules;

#[derive(Parser, Debug)]
#[command(name = "stellscan", version, about = "Parameter scans of stellarator designs with the process solver")]
struct Cli {
    #[arg(long, global = true, conflicts_with = "preset", help = "Scan configuration (JSON)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, value_enum, help = "Built-in scan configuration")]
    preset: Option<Preset>,
    #[arg(long, global = true, default_value = ".", help = "Directory holding the template deck")]
    workdir: PathBuf,
    #[arg(long, global = true, help = "Solver executable, overrides the configuration")]
    solver: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write one input deck per scan point.
    Generate,
    /// Run the solver in every case directory.
    Run,
    /// Extract `param_y` against `param_x` from converged cases.
    Collect {
        #[arg(long, default_value_t = false)]
        no_plot: bool,
    },
    /// Generate, run and collect.
    Scan {
        #[arg(long, default_value_t = false)]
        no_plot: bool,
    },
    /// Render the configured plot recipes.
    Plot {
        #[arg(long, help = "Plot every study directory below this root instead of the workdir")]
        root: Option<PathBuf>,
        #[arg(long = "recipe", value_enum, help = "Recipes to render, overrides the configuration")]
        recipes: Vec<RecipeName>,
    },
    /// Export several output fields as CSV and JSON tables.
    Table {
        #[arg(long = "field", required = true)]
        fields: Vec<String>,
    },
}

fn load_config(cli: &Cli) -> Result<ScanConfig> {
    let mut config = match (&cli.config, cli.preset) {
        (Some(path), _) => ScanConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        (None, Some(preset)) => preset.config(),
        (None, None) => bail!("either --config or --preset is required"),
    };
    if let Some(solver) = &cli.solver {
        config.solver = solver.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    if let Commands::Plot { recipes, .. } = &cli.command {
        if !recipes.is_empty() {
            config.plot.recipes = recipes.clone();
        }
    }
    let driver = ScanDriver::new(config, &cli.workdir).context("invalid scan configuration")?;

    match &cli.command {
        Commands::Generate => {
            let points = driver.generate().context("generating input decks")?;
            info!("generated {} cases in {}", points.len(), driver.results_dir().display());
        }
        Commands::Run => {
            driver.run().context("running cases")?;
        }
        Commands::Collect { no_plot } => {
            let summary = driver.collect(!no_plot).context("collecting results")?;
            info!("{} converged cases written to {}", summary.results.len(), summary.csv.display());
        }
        Commands::Scan { no_plot } => {
            let summary = driver.run_all(!no_plot).context("running scan")?;
            info!("{} converged cases written to {}", summary.results.len(), summary.csv.display());
        }
        Commands::Plot { root, .. } => {
            let report = match root {
                Some(root) => plot_studies(&driver.config, root).with_context(|| format!("plotting studies below {}", root.display()))?,
                None => {
                    let mut report = PlotReport::default();
                    plot_results_dir(&driver.config, &driver.results_dir(), &mut report).context("plotting results")?;
                    report
                }
            };
            let rendered = report.into_result().context("some plots failed")?;
            info!("rendered {} plots", rendered.len());
        }
        Commands::Table { fields } => {
            let (csv, json) = driver.table(fields).context("exporting table")?;
            info!("wrote {} and {}", csv.display(), json.display());
        }
    }
    Ok(())
}
