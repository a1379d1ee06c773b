use crate::core::Storage;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Reads inputs from the paths given and writes outputs under `base_path`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    type Reader = BufReader<File>;
    type Writer = File;

    fn open_input(&self, path: &str) -> io::Result<Self::Reader> {
        Ok(BufReader::new(File::open(path)?))
    }

    /// Only the output directory itself is created; a name that points into a
    /// missing subdirectory fails like any other unwritable destination.
    fn create_output(&self, name: &str) -> io::Result<Self::Writer> {
        fs::create_dir_all(&self.base_path)?;
        File::create(self.base_path.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, Write};
    use tempfile::TempDir;

    #[test]
    fn test_outputs_land_under_base_path() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("nested"));

        let mut file = storage.create_output("(A) 01-01-2024 10.00-10.05.txt").unwrap();
        writeln!(file, "hello").unwrap();
        drop(file);

        let written = temp_dir
            .path()
            .join("nested")
            .join("(A) 01-01-2024 10.00-10.05.txt");
        let reader = storage.open_input(written.to_str().unwrap()).unwrap();
        let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["hello"]);
    }

    #[test]
    fn test_name_with_separator_does_not_create_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        let err = storage.create_output("(a/b) 01-01-2024 10.00-10.05.txt").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!temp_dir.path().join("(a").exists());
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let storage = LocalStorage::new(".");
        let err = storage.open_input("definitely/not/here.txt").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
