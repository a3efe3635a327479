//! Local CSV sources, for offline use and tests

use std::path::{Path, PathBuf};

use fichas_core::{SourceError, Tab};
use tracing::info;

use crate::SheetSource;

/// Directory holding one `<slug>.csv` per tab
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvDirectory {
    root: PathBuf,
}

impl CsvDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File backing a tab
    pub fn path_for(&self, tab: Tab) -> PathBuf {
        self.root.join(format!("{}.csv", tab.slug()))
    }
}

impl SheetSource for CsvDirectory {
    fn source_id(&self, tab: Tab) -> String {
        self.path_for(tab).display().to_string()
    }

    fn fetch_csv(&self, tab: Tab) -> Result<Vec<u8>, SourceError> {
        read_file(&self.path_for(tab))
    }
}

/// A single CSV file served for every tab
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvFile {
    path: PathBuf,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SheetSource for CsvFile {
    fn source_id(&self, _tab: Tab) -> String {
        self.path.display().to_string()
    }

    fn fetch_csv(&self, _tab: Tab) -> Result<Vec<u8>, SourceError> {
        read_file(&self.path)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, SourceError> {
    info!(path = %path.display(), "reading local CSV");
    std::fs::read(path).map_err(|err| SourceError::Unavailable {
        source_id: path.display().to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatasetLoader;
    use std::io::Write;

    #[test]
    fn directory_uses_tab_slug() {
        let dir = CsvDirectory::new("/data");
        assert_eq!(dir.path_for(Tab::Ophthalmologic), PathBuf::from("/data/oftalmologicas.csv"));
    }

    #[test]
    fn directory_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("juridicas.csv"), "Nome Completo\nAna\n").unwrap();

        let source = CsvDirectory::new(dir.path());
        assert_eq!(source.fetch_csv(Tab::Legal).unwrap(), b"Nome Completo\nAna\n");
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvDirectory::new(dir.path());
        let err = source.fetch_csv(Tab::Health).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
        assert!(err.source_id().ends_with("saude.csv"));
    }

    #[test]
    fn latin1_file_loads_as_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gerais.csv"), b"Nome Completo\nJo\xe3o\n").unwrap();

        let loader = DatasetLoader::new(CsvDirectory::new(dir.path()));
        let err = loader.load(Tab::General).unwrap_err();
        assert!(matches!(err, SourceError::Malformed { .. }));
        assert!(err.source_id().ends_with("gerais.csv"));
    }

    #[test]
    fn single_file_serves_every_tab() {
        let mut file = tempfile::NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "Nome Completo").unwrap();
        writeln!(file, "Rui").unwrap();

        let source = CsvFile::new(file.path());
        for tab in Tab::ALL {
            assert_eq!(source.fetch_csv(tab).unwrap(), b"Nome Completo\nRui\n");
            assert_eq!(source.source_id(tab), file.path().display().to_string());
        }
    }
}
