use std::collections::HashMap;
use std::io::Read;

/// Index of a resolved column inside a [`RawTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column(usize);

/// Untyped tabular data as delivered by the upstream feeds.
///
/// Both feeds rename and re-case their columns between exports, so rows are
/// kept as plain strings and every consumer resolves columns through
/// [`RawTable::column`] with the full list of acceptable name variants.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    lookup: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self::from_parts(headers, rows))
    }

    pub fn from_parts(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let lookup = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header(name), idx))
            .collect();
        Self {
            headers,
            lookup,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Resolve the first present column among `variants`, case-insensitively.
    ///
    /// Returns `None` when no variant exists; callers treat that as
    /// "feature unavailable" and fall back to empty values.
    pub fn column(&self, variants: &[&str]) -> Option<Column> {
        variants
            .iter()
            .find_map(|variant| self.lookup.get(&normalize_header(variant)).copied())
            .map(Column)
    }

    /// Value at `(row, column)`; missing columns and short rows read as "".
    pub fn value(&self, row: usize, column: Option<Column>) -> &str {
        let Some(Column(idx)) = column else {
            return "";
        };
        self.rows
            .get(row)
            .and_then(|r| r.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        (0..self.rows.len()).map(move |idx| RowView { table: self, idx })
    }

    /// New table containing only rows matching `keep`. The copy owns its
    /// rows, so later stages never mutate the caller's snapshot.
    pub fn filter<F>(&self, mut keep: F) -> RawTable
    where
        F: FnMut(RowView<'_>) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(idx, _)| keep(RowView { table: self, idx: *idx }))
            .map(|(_, row)| row.clone())
            .collect();
        Self::from_parts(self.headers.clone(), rows)
    }
}

/// Borrowed view of one row, carrying the table's column resolution.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a RawTable,
    idx: usize,
}

impl<'a> RowView<'a> {
    pub fn field(&self, column: Option<Column>) -> &'a str {
        self.table.value(self.idx, column)
    }

    pub fn index(&self) -> usize {
        self.idx
    }
}

fn normalize_header(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}
