use std::{path::{Path, PathBuf}, process::Command};

use tracing::{debug, info, warn};

use super::{error::{IoContext, ScanError, ScanResult}, type_lib::{input_file_name, output_file_name}};

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Finished { code: Option<i32> },
    Skipped,
}

#[derive(Debug, Clone)]
pub struct CaseRun {
    pub case: String,
    pub status: RunStatus,
}

impl CaseRun {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, RunStatus::Finished { code: Some(0) })
    }
}

pub struct CaseRunner {
    pub solver: String,
    pub prefix: String,
    pub skip_completed: bool,
}

impl CaseRunner {
    /// A solver given as a path is made absolute here, since each case runs
    /// in its own directory. Bare names are still looked up on `PATH`.
    pub fn new(solver: &str, prefix: &str, skip_completed: bool) -> Self {
        CaseRunner { solver: resolve_solver(solver), prefix: prefix.to_string(), skip_completed }
    }

    /// Case directories below `results_dir` that hold an input deck, sorted by name.
    pub fn find_cases(&self, results_dir: &Path) -> ScanResult<Vec<PathBuf>> {
        let deck_name = input_file_name(&self.prefix);
        let mut cases = Vec::new();
        for entry in std::fs::read_dir(results_dir).at(results_dir)? {
            let path = entry.at(results_dir)?.path();
            if path.is_dir() && path.join(&deck_name).is_file() {
                cases.push(path);
            }
        }
        cases.sort();
        Ok(cases)
    }

    /// Runs the solver once in `case_dir` and blocks until it exits.
    pub fn run_case(&self, case_dir: &Path) -> ScanResult<CaseRun> {
        let case = case_dir.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        if self.skip_completed && case_dir.join(output_file_name(&self.prefix)).is_file() {
            info!("skipping completed case {}", case);
            return Ok(CaseRun { case, status: RunStatus::Skipped });
        }

        // a stale output would otherwise pass for this run's result
        let output = case_dir.join(output_file_name(&self.prefix));
        if output.is_file() {
            debug!("removing previous {}", output.display());
            std::fs::remove_file(&output).at(&output)?;
        }

        info!("running {} in {}", self.solver, case_dir.display());
        let status = Command::new(&self.solver)
            .arg("-i")
            .arg(input_file_name(&self.prefix))
            .current_dir(case_dir)
            .status()
            .map_err(|source| ScanError::SolverSpawn { program: self.solver.clone(), source })?;

        if !status.success() {
            warn!("{} exited with {} for case {}", self.solver, status, case);
        }
        Ok(CaseRun { case, status: RunStatus::Finished { code: status.code() } })
    }

    pub fn run_all(&self, results_dir: &Path) -> ScanResult<Vec<CaseRun>> {
        let cases = self.find_cases(results_dir)?;
        let runs = cases.iter().map(|case_dir| self.run_case(case_dir)).collect::<ScanResult<Vec<_>>>()?;
        let failed = runs.iter().filter(|run| matches!(run.status, RunStatus::Finished { .. }) && !run.succeeded()).count();
        info!("ran {} cases, {} exited with an error", runs.len(), failed);
        Ok(runs)
    }
}

fn resolve_solver(solver: &str) -> String {
    let path = Path::new(solver);
    if path.components().count() < 2 {
        return solver.to_string();
    }
    std::path::absolute(path).map(|p| p.to_string_lossy().into_owned()).unwrap_or_else(|_| solver.to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn stub_solver(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake_process.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn case(results: &Path, name: &str) -> PathBuf {
        let dir = results.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("squid.IN.DAT"), "rmajor = 20.0\n").unwrap();
        dir
    }

    #[test]
    fn runs_each_case_in_its_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let solver = stub_solver(tmp.path(), "echo \"$2\" > squid.MFILE.DAT");
        let results = tmp.path().join("results");
        case(&results, "Ac_0.9");
        case(&results, "Ac_1.1");
        std::fs::create_dir_all(results.join("no_deck")).unwrap();

        let runner = CaseRunner::new(solver.to_str().unwrap(), "squid", false);
        let runs = runner.run_all(&results).unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(CaseRun::succeeded));
        let written = std::fs::read_to_string(results.join("Ac_0.9").join("squid.MFILE.DAT")).unwrap();
        assert_eq!(written.trim(), "squid.IN.DAT");
        assert!(!results.join("no_deck").join("squid.MFILE.DAT").exists());
    }

    #[test]
    fn solver_failure_does_not_stop_the_scan() {
        let tmp = tempfile::tempdir().unwrap();
        let solver = stub_solver(tmp.path(), "exit 3");
        let results = tmp.path().join("results");
        case(&results, "B_5");
        case(&results, "B_6");

        let runs = CaseRunner::new(solver.to_str().unwrap(), "squid", false).run_all(&results).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].status, RunStatus::Finished { code: Some(3) });
    }

    #[test]
    fn completed_cases_can_be_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let solver = stub_solver(tmp.path(), "exit 0");
        let results = tmp.path().join("results");
        let done = case(&results, "B_5");
        std::fs::write(done.join("squid.MFILE.DAT"), "").unwrap();
        case(&results, "B_6");

        let runs = CaseRunner::new(solver.to_str().unwrap(), "squid", true).run_all(&results).unwrap();
        assert_eq!(runs[0].status, RunStatus::Skipped);
        assert!(runs[1].succeeded());
    }

    #[test]
    fn stale_output_is_removed_before_rerun() {
        let tmp = tempfile::tempdir().unwrap();
        let solver = stub_solver(tmp.path(), "exit 1");
        let results = tmp.path().join("results");
        let case_dir = case(&results, "B_5");
        std::fs::write(case_dir.join("squid.MFILE.DAT"), " (ifail)____ 1\n").unwrap();

        let runs = CaseRunner::new(solver.to_str().unwrap(), "squid", false).run_all(&results).unwrap();
        assert!(!runs[0].succeeded());
        assert!(!case_dir.join("squid.MFILE.DAT").exists());
    }

    #[test]
    fn relative_solver_paths_are_made_absolute() {
        let runner = CaseRunner::new("./bin/process", "squid", false);
        assert!(Path::new(&runner.solver).is_absolute());
        assert!(runner.solver.ends_with("bin/process"));
        assert_eq!(CaseRunner::new("process", "squid", false).solver, "process");
        assert_eq!(CaseRunner::new("/opt/process/bin/process", "squid", false).solver, "/opt/process/bin/process");
    }

    #[test]
    fn missing_solver_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let results = tmp.path().join("results");
        case(&results, "B_5");
        let runner = CaseRunner::new("definitely-not-a-solver-binary", "squid", false);
        assert!(matches!(runner.run_all(&results), Err(ScanError::SolverSpawn { .. })));
    }
}
