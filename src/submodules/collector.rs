use std::path::{Path, PathBuf};

use ordered_float::OrderedFloat;
use tracing::{debug, info, warn};

use super::{error::{IoContext, ScanResult}, mfile::MFile, type_lib::{output_file_name, NumericData, ResultMap, CONVERGED, CONVERGENCE_FIELD}};

/// Why a case did or did not contribute a point.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Included { x: NumericData, y: NumericData },
    MissingFile,
    Unreadable,
    MissingField(String),
    MultipleScans(usize),
    NotConverged,
    NotNumeric(String),
}

#[derive(Debug, Clone)]
pub struct CaseRecord {
    pub case: String,
    pub outcome: CaseOutcome,
}

/// Output files of every case below one results directory, read once.
pub struct ResultsDir {
    pub path: PathBuf,
    pub cases: Vec<(String, Option<MFile>, bool)>,
}

impl ResultsDir {
    pub fn open(path: &Path, prefix: &str) -> ScanResult<Self> {
        let file_name = output_file_name(prefix);
        let mut case_dirs = Vec::new();
        for entry in std::fs::read_dir(path).at(path)? {
            let entry_path = entry.at(path)?.path();
            if entry_path.is_dir() {
                case_dirs.push(entry_path);
            }
        }
        case_dirs.sort();

        let cases = case_dirs.into_iter().map(|case_dir| {
            let case = case_dir.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
            let mfile_path = case_dir.join(&file_name);
            if !mfile_path.is_file() {
                return (case, None, false);
            }
            match MFile::read(&mfile_path) {
                Ok(mfile) => (case, Some(mfile), true),
                Err(err) => {
                    warn!("could not read {}: {}", mfile_path.display(), err);
                    (case, None, true)
                }
            }
        }).collect();

        Ok(ResultsDir { path: path.to_path_buf(), cases })
    }

    pub fn classify(mfile: &MFile, var_name: &str, field: &str) -> CaseOutcome {
        let Some(result) = mfile.get(field) else {
            return CaseOutcome::MissingField(field.to_string());
        };
        if result.scan_count() != 1 {
            return CaseOutcome::MultipleScans(result.scan_count());
        }
        let converged = mfile.get(CONVERGENCE_FIELD).and_then(|ifail| ifail.last_number()) == Some(CONVERGED);
        if !converged {
            return CaseOutcome::NotConverged;
        }
        let Some(var) = mfile.get(var_name) else {
            return CaseOutcome::MissingField(var_name.to_string());
        };
        match (var.last_number(), result.last_number()) {
            (Some(x), Some(y)) => CaseOutcome::Included { x, y },
            (None, _) => CaseOutcome::NotNumeric(var_name.to_string()),
            (_, None) => CaseOutcome::NotNumeric(field.to_string()),
        }
    }

    pub fn inspect(&self, var_name: &str, field: &str) -> Vec<CaseRecord> {
        self.cases.iter().map(|(case, mfile, present)| {
            let outcome = match (mfile, present) {
                (Some(mfile), _) => ResultsDir::classify(mfile, var_name, field),
                (None, true) => CaseOutcome::Unreadable,
                (None, false) => CaseOutcome::MissingFile,
            };
            CaseRecord { case: case.clone(), outcome }
        }).collect()
    }

    /// Swept value -> field value over converged single-scan cases, ascending.
    pub fn load_results(&self, var_name: &str, field: &str) -> ResultMap {
        let mut output = ResultMap::new();
        for record in self.inspect(var_name, field) {
            match record.outcome {
                CaseOutcome::Included { x, y } => {
                    output.insert(OrderedFloat(x), y);
                }
                other => debug!("{}: {} excluded ({:?})", self.path.display(), record.case, other),
            }
        }
        debug!("{} found for {}: {:?}", field, var_name, output);
        output
    }
}

pub fn load_results(results_dir: &Path, prefix: &str, var_name: &str, field: &str) -> ScanResult<ResultMap> {
    Ok(ResultsDir::open(results_dir, prefix)?.load_results(var_name, field))
}

pub fn log_results(var_name: &str, field: &str, results: &ResultMap) {
    info!("{} found for {}:", field, var_name);
    for (key, value) in results.iter() {
        info!("{}: {}", key, value);
    }
}

#[cfg(test)]
pub mod fixtures {
    use std::path::Path;

    /// Writes a minimal MFILE for one case below `results`.
    pub fn write_case(results: &Path, case: &str, fields: &[(&str, f64)], ifail: f64) {
        let dir = results.join(case);
        std::fs::create_dir_all(&dir).unwrap();
        let mut text = String::from(" # Numerics #\n");
        text.push_str(&format!(" PROCESS_status_flag____ (ifail)____ {:E}\n", ifail));
        for (name, value) in fields {
            text.push_str(&format!(" Some_description____ ({})____ {:E} OP\n", name, value));
        }
        std::fs::write(dir.join("squid.MFILE.DAT"), text).unwrap();
    }
}
