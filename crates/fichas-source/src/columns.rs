//! Column mapping from spreadsheet headers to canonical fields
//!
//! The source spreadsheet has long, irregular headers (and two blank ones for
//! the street number and neighborhood). [`ColumnMapper`] holds, per canonical
//! field, the source headers accepted for it.

use fichas_core::{collapse_whitespace, Field, Record};
use tracing::{debug, warn};

use crate::reader::RawTable;

/// Header aliases recognized out of the box
const DEFAULT_ALIASES: [(Field, &str); 11] = [
    (Field::Name, "Nome Completo"),
    (Field::Phone, "Telefone (31)9xxxx-xxxx"),
    (Field::Street, "Endereço"),
    (Field::Number, "Unnamed: 9"),
    (Field::Neighborhood, "Unnamed: 10"),
    (Field::DemandArea, "Área da Demanda"),
    (Field::Summary, "Resumo da Demanda"),
    (Field::Responsible, "Servidor Responsável"),
    (Field::Status, "Situação da Demanda"),
    (Field::StatusDescription, "Descrição da Situação"),
    (Field::UpdatedAt, "Data da Atualização"),
];

/// Maps raw headers to canonical fields
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMapper {
    /// Accepted headers per field, whitespace-normalized
    aliases: Vec<(Field, Vec<String>)>,
}

impl Default for ColumnMapper {
    fn default() -> Self {
        DEFAULT_ALIASES
            .iter()
            .fold(Self::empty(), |mapper, (field, alias)| mapper.alias(*field, *alias))
    }
}

impl ColumnMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapper that recognizes nothing
    pub fn empty() -> Self {
        Self {
            aliases: Field::ALL.iter().map(|f| (*f, Vec::new())).collect(),
        }
    }

    /// Accept an additional source header for a field
    pub fn alias(mut self, field: Field, header: impl AsRef<str>) -> Self {
        let header = collapse_whitespace(header.as_ref());
        if let Some((_, list)) = self.aliases.iter_mut().find(|(f, _)| *f == field) {
            if !list.contains(&header) {
                list.push(header);
            }
        }
        self
    }

    /// Headers accepted for a field
    pub fn aliases(&self, field: Field) -> &[String] {
        self.aliases
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, list)| list.as_slice())
            .unwrap_or_default()
    }

    fn field_for(&self, header: &str) -> impl Iterator<Item = Field> + '_ {
        let header = collapse_whitespace(header);
        self.aliases
            .iter()
            .filter(move |(_, list)| list.contains(&header))
            .map(|(f, _)| *f)
    }

    /// Column index for each recognized field, canonical order.
    ///
    /// When several columns match a field, the leftmost one wins.
    pub fn resolve(&self, headers: &[String]) -> Vec<(Field, usize)> {
        let normalized: Vec<String> = headers.iter().map(|h| collapse_whitespace(h)).collect();

        self.aliases
            .iter()
            .filter_map(|(field, list)| {
                normalized
                    .iter()
                    .position(|h| list.contains(h))
                    .map(|index| (*field, index))
            })
            .collect()
    }

    /// Map a single raw record given as `(header, value)` pairs
    pub fn map_record<'a>(&self, raw: impl IntoIterator<Item = (&'a str, &'a str)>) -> Record {
        let mut pairs: Vec<(Field, String)> = Vec::new();
        for (header, value) in raw {
            for field in self.field_for(header) {
                if !pairs.iter().any(|(f, _)| *f == field) {
                    pairs.push((field, value.to_string()));
                }
            }
        }
        pairs.into_iter().collect()
    }

    /// Map every row of a table, returning the present columns and the records
    pub fn map_table(&self, table: &RawTable) -> (Vec<Field>, Vec<Record>) {
        let resolved = self.resolve(&table.headers);
        debug!(
            recognized = resolved.len(),
            headers = table.headers.len(),
            "resolved spreadsheet columns"
        );
        let unmapped: Vec<&str> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !resolved.iter().any(|(_, index)| index == i))
            .map(|(_, h)| h.as_str())
            .collect();
        if !unmapped.is_empty() {
            debug!(?unmapped, "ignoring unmapped columns");
        }
        if !resolved.iter().any(|(field, _)| *field == Field::Name) {
            warn!("no name column found; every record will be filtered out");
        }

        let columns: Vec<Field> = resolved.iter().map(|(field, _)| *field).collect();
        let records: Vec<Record> = table
            .rows
            .iter()
            .map(|row| {
                resolved
                    .iter()
                    .filter_map(|(field, index)| row.get(*index).map(|cell| (*field, cell.clone())))
                    .collect::<Record>()
            })
            .collect();

        (columns, records)
    }
}
