//! @ai:module:intent JSONL dataset loader for test cases
//! @ai:module:layer infrastructure
//! @ai:module:public_api DatasetLoader
//! @ai:module:stateless true

use crate::dataset::case::TestCase;
use crate::error::DataError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Trait for loading test case datasets
pub trait DatasetLoaderTrait: Send + Sync {
    /// @ai:intent Load every test case from a JSONL file or a directory of them
    fn load(&self, path: &Path) -> Result<Vec<TestCase>, DataError>;

    /// @ai:intent Load at most `max_items` test cases, in dataset order
    fn load_limited(&self, path: &Path, max_items: Option<usize>) -> Result<Vec<TestCase>, DataError> {
        let mut cases = self.load(path)?;
        if let Some(max) = max_items {
            cases.truncate(max);
        }
        Ok(cases)
    }
}

/// @ai:intent Loads test cases from JSONL files, one case per line
pub struct DatasetLoader;

impl DatasetLoader {
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Parse one JSONL file; blank lines are skipped
    /// @ai:effects fs:read
    fn parse_file(path: &Path) -> Result<Vec<TestCase>, DataError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse_lines(path, &content)
    }

    /// @ai:intent Parse JSONL content, validating each case
    /// @ai:effects pure
    fn parse_lines(path: &Path, content: &str) -> Result<Vec<TestCase>, DataError> {
        let mut cases = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let case: TestCase =
                serde_json::from_str(line).map_err(|source| DataError::Malformed {
                    path: path.to_path_buf(),
                    line: index + 1,
                    source,
                })?;
            case.validate()?;
            cases.push(case);
        }

        Ok(cases)
    }

    /// @ai:intent Find all JSONL files below a directory, sorted by path
    /// @ai:effects fs:read
    fn find_dataset_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "jsonl")
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoaderTrait for DatasetLoader {
    /// @ai:effects fs:read
    fn load(&self, path: &Path) -> Result<Vec<TestCase>, DataError> {
        let files = if path.is_dir() {
            Self::find_dataset_files(path)
        } else {
            vec![path.to_path_buf()]
        };

        let mut cases = Vec::new();
        for file in files {
            cases.extend(Self::parse_file(&file)?);
        }

        let mut seen = HashSet::new();
        for case in &cases {
            if !seen.insert(case.id.as_str()) {
                return Err(DataError::DuplicateId(case.id.clone()));
            }
        }

        tracing::debug!("Loaded {} test cases from {}", cases.len(), path.display());
        Ok(cases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_jsonl_preserves_order_and_skips_blank_lines() {
        let temp = TempDir::new().unwrap();
        let path = write(
            temp.path(),
            "cases.jsonl",
            "{\"id\":\"b\",\"turns\":[\"one\"]}\n\n{\"id\":\"a\",\"category\":\"menu_qa\",\"turns\":[\"two\",\"three\"]}\n",
        );

        let cases = DatasetLoader::new().load(&path).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].id, "b");
        assert_eq!(cases[1].turns.len(), 2);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let temp = TempDir::new().unwrap();
        let path = write(
            temp.path(),
            "cases.jsonl",
            "{\"id\":\"a\",\"turns\":[\"x\"]}\nnot json\n",
        );

        let err = DatasetLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, DataError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_rejects_case_without_turns() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "cases.jsonl", "{\"id\":\"a\",\"turns\":[]}\n");

        let err = DatasetLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, DataError::NoTurns(_)));
    }

    #[test]
    fn test_rejects_duplicate_ids_across_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.jsonl", "{\"id\":\"x\",\"turns\":[\"hi\"]}\n");
        write(temp.path(), "nested/b.jsonl", "{\"id\":\"x\",\"turns\":[\"hi\"]}\n");

        let err = DatasetLoader::new().load(temp.path()).unwrap_err();
        assert!(matches!(err, DataError::DuplicateId(id) if id == "x"));
    }

    #[test]
    fn test_load_limited_truncates() {
        let temp = TempDir::new().unwrap();
        let path = write(
            temp.path(),
            "cases.jsonl",
            "{\"id\":\"1\",\"turns\":[\"a\"]}\n{\"id\":\"2\",\"turns\":[\"b\"]}\n{\"id\":\"3\",\"turns\":[\"c\"]}\n",
        );

        let cases = DatasetLoader::new().load_limited(&path, Some(2)).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[1].id, "2");
    }
}
