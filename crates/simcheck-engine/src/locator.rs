//! Resolution of `(execution, experiment)` pairs to result files.

use std::sync::OnceLock;

use regex::Regex;
use simcheck_core::{DatasetHandle, ResultFile, BASE_EXPERIMENT_ID};

const RESULT_FILE_PATTERN: &str =
    r"^results_(?P<exec>[A-Za-z0-9-]+)_(?P<exp>[A-Za-z0-9-]+)\.(?P<ext>[A-Za-z0-9]+)$";

fn result_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(RESULT_FILE_PATTERN).expect("result file pattern is valid"))
}

/// Split a result file name into `(execution_id, experiment_id)`.
///
/// Ids are `[A-Za-z0-9-]+`, so the first underscore after the prefix always
/// separates them.
pub fn parse_result_file_name(name: &str) -> Option<(&str, &str)> {
    let caps = result_file_regex().captures(name)?;
    let exec = caps.name("exec")?.as_str();
    let exp = caps.name("exp")?.as_str();
    Some((exec, exp))
}

/// Read-only view over the discovered result files.
#[derive(Debug, Clone, Copy)]
pub struct ResultSetLocator<'a> {
    universe: &'a [ResultFile],
}

impl<'a> ResultSetLocator<'a> {
    pub fn new(universe: &'a [ResultFile]) -> Self {
        Self { universe }
    }

    /// First file, in universe order, named for exactly this pair.
    pub fn find(&self, execution_id: &str, experiment_id: &str) -> Option<DatasetHandle> {
        self.universe.iter().find_map(|file| {
            let (exec, exp) = parse_result_file_name(file.file_name())?;
            (exec == execution_id && exp == experiment_id).then(|| DatasetHandle {
                execution_id: exec.to_string(),
                experiment_id: exp.to_string(),
                location: file.path.clone(),
            })
        })
    }

    /// The base dataset (experiment `0`) of an execution.
    pub fn find_base(&self, execution_id: &str) -> Option<DatasetHandle> {
        self.find(execution_id, BASE_EXPERIMENT_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe(names: &[&str]) -> Vec<ResultFile> {
        names
            .iter()
            .map(|n| ResultFile::new(format!("experiments/{n}")))
            .collect()
    }

    #[test]
    fn test_find_missing_experiment() {
        let files = universe(&["results_EXEC1_3.xlsx"]);
        let locator = ResultSetLocator::new(&files);

        assert!(locator.find("EXEC1", "5").is_none());
    }

    #[test]
    fn test_find_matching_experiment() {
        let files = universe(&["results_EXEC1_3.xlsx"]);
        let handle = ResultSetLocator::new(&files)
            .find("EXEC1", "3")
            .expect("handle");

        assert_eq!(handle.execution_id, "EXEC1");
        assert_eq!(handle.experiment_id, "3");
        assert_eq!(handle.location, files[0].path);
    }

    #[test]
    fn test_find_is_exact_and_case_sensitive() {
        let files = universe(&["results_EXEC1_31.csv", "results_exec1_3.csv", "results_EXEC10_3.csv"]);
        let locator = ResultSetLocator::new(&files);

        assert!(locator.find("EXEC1", "3").is_none());
        assert!(locator.find("EXEC1", "31").is_some());
    }

    #[test]
    fn test_first_match_wins() {
        let files = universe(&["results_EXEC1_3.csv", "results_EXEC1_3.xlsx"]);
        let handle = ResultSetLocator::new(&files).find("EXEC1", "3").expect("handle");

        assert!(handle.location.ends_with("results_EXEC1_3.csv"));
    }

    #[test]
    fn test_find_base() {
        let files = universe(&["results_a-1_0.csv", "results_a-1_2.csv"]);
        let handle = ResultSetLocator::new(&files).find_base("a-1").expect("base");

        assert!(handle.is_base());
    }

    #[test]
    fn test_parse_result_file_name_rejects_junk() {
        assert_eq!(parse_result_file_name("results_E_1.csv"), Some(("E", "1")));
        assert_eq!(parse_result_file_name("results_E_1"), None);
        assert_eq!(parse_result_file_name("results_E.csv"), None);
        assert_eq!(parse_result_file_name("output_E_1.csv"), None);
        assert_eq!(parse_result_file_name("results_E_x_1.csv"), None);
    }
}
