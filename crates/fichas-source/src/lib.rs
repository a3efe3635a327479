//! # fichas-source
//!
//! Data sources for fichas datasets.
//!
//! This crate provides:
//! - The `SheetSource` trait and its implementations: `SheetExport` (HTTP CSV
//!   export of a spreadsheet), `CsvDirectory` and `CsvFile` (local files)
//! - CSV reading with spreadsheet-style header naming
//! - `ColumnMapper`: raw headers to canonical fields
//! - `DatasetLoader`: source + mapper, with an optional read-through cache
//!
//! ## Example
//!
//! ```rust
//! use fichas_core::{Field, Tab};
//! use fichas_source::{parse_dataset, ColumnMapper};
//!
//! let csv = "Nome Completo,Situação da  Demanda,Carimbo\nAna,Solucionado,x\n";
//! let dataset = parse_dataset(csv.as_bytes(), Tab::General, "inline", &ColumnMapper::default()).unwrap();
//!
//! assert_eq!(dataset.columns, vec![Field::Name, Field::Status]);
//! assert_eq!(dataset.records[0].get(Field::Status), Some("Solucionado"));
//! ```

pub mod columns;
pub mod loader;
pub mod local;
pub mod reader;
pub mod remote;

pub use columns::ColumnMapper;
pub use loader::DatasetLoader;
pub use local::{CsvDirectory, CsvFile};
pub use reader::{decode_csv, read_csv, RawTable};
pub use remote::{SheetExport, DEFAULT_SPREADSHEET_ID, DEFAULT_URL_TEMPLATE};

use fichas_core::{Dataset, SourceError, Tab};

/// Where the CSV text of a tab comes from
pub trait SheetSource: Send + Sync {
    /// Identifier of the data for a tab (URL or path), used as cache key and in errors
    fn source_id(&self, tab: Tab) -> String;

    /// Fetch the raw CSV document of a tab, undecoded
    fn fetch_csv(&self, tab: Tab) -> Result<Vec<u8>, SourceError>;
}

impl<S: SheetSource + ?Sized> SheetSource for Box<S> {
    fn source_id(&self, tab: Tab) -> String {
        (**self).source_id(tab)
    }

    fn fetch_csv(&self, tab: Tab) -> Result<Vec<u8>, SourceError> {
        (**self).fetch_csv(tab)
    }
}

/// Decode and parse a CSV document and map it onto canonical fields
pub fn parse_dataset(
    bytes: &[u8],
    tab: Tab,
    source_id: &str,
    mapper: &ColumnMapper,
) -> Result<Dataset, SourceError> {
    let text = decode_csv(bytes, source_id)?;
    let table = read_csv(text, source_id)?;
    let (columns, records) = mapper.map_table(&table);
    Ok(Dataset::new(tab, columns, records))
}
