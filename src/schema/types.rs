//! Dataset schema descriptors
//!
//! A schema is discovered at upload time, so it is carried around as a
//! runtime value rather than expressed as a Rust type:
//! - columns are positional (`col1..colN`), text only
//! - the tabular format is remembered so export can reproduce it
//! - original header text is kept as informational metadata only

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix shared by every generated column identifier.
const COLUMN_PREFIX: &str = "col";

/// Positional column identifier.
///
/// Stores the 1-based position; renders as `col<N>`. This is the only
/// identifier namespace predicates and storage ever see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(usize);

impl ColumnId {
    /// Creates the identifier for a 1-based position.
    ///
    /// Returns `None` for position 0.
    pub fn new(position: usize) -> Option<Self> {
        if position == 0 {
            None
        } else {
            Some(Self(position))
        }
    }

    /// Identifier for a 0-based field index.
    pub fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    /// 1-based position.
    pub fn position(&self) -> usize {
        self.0
    }

    /// 0-based index into a row.
    pub fn index(&self) -> usize {
        self.0 - 1
    }

    /// Parses `col<N>` strictly: no sign, no leading zeros, N >= 1.
    pub fn parse(name: &str) -> Option<Self> {
        let digits = name.strip_prefix(COLUMN_PREFIX)?;
        if digits.is_empty()
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        digits.parse::<usize>().ok().and_then(Self::new)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", COLUMN_PREFIX, self.0)
    }
}

impl Serialize for ColumnId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Delimited formats accepted for upload and produced on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabularFormat {
    /// Comma separated
    Csv,
    /// Tab separated
    Tsv,
}

impl TabularFormat {
    /// Field delimiter byte
    pub fn delimiter(&self) -> u8 {
        match self {
            TabularFormat::Csv => b',',
            TabularFormat::Tsv => b'\t',
        }
    }

    /// Canonical file extension (without dot)
    pub fn extension(&self) -> &'static str {
        match self {
            TabularFormat::Csv => "csv",
            TabularFormat::Tsv => "tsv",
        }
    }

    /// MIME type used when serving an export
    pub fn content_type(&self) -> &'static str {
        match self {
            TabularFormat::Csv => "text/csv",
            TabularFormat::Tsv => "text/tab-separated-values",
        }
    }

    /// Detects the format from a declared filename's extension.
    ///
    /// Matching is case-insensitive. Unknown or missing extensions yield `None`.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (stem, ext) = filename.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        ext.parse().ok()
    }
}

impl FromStr for TabularFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(TabularFormat::Csv),
            "tsv" => Ok(TabularFormat::Tsv),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TabularFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Column layout of one ingestion generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSchema {
    /// Positional columns, in order
    columns: Vec<ColumnId>,
    /// Format the dataset was uploaded in
    format: TabularFormat,
    /// Header text as uploaded; never used as an identifier
    source_headers: Vec<String>,
}

impl DatasetSchema {
    /// Builds a schema with `column_count` positional columns.
    ///
    /// `source_headers` must have exactly `column_count` entries; callers
    /// inside the crate guarantee this (see `SchemaInferencer`).
    pub(crate) fn new(format: TabularFormat, source_headers: Vec<String>) -> Self {
        let columns = (0..source_headers.len()).map(ColumnId::from_index).collect();
        Self {
            columns,
            format,
            source_headers,
        }
    }

    /// Ordered column identifiers
    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    /// Number of columns every row must carry
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Upload format
    pub fn format(&self) -> TabularFormat {
        self.format
    }

    /// Header text as it appeared in the upload
    pub fn source_headers(&self) -> &[String] {
        &self.source_headers
    }

    /// Resolves a filter key to a column of this schema.
    ///
    /// Only `col<N>` names with `N <= column_count` resolve.
    pub fn resolve(&self, name: &str) -> Option<ColumnId> {
        ColumnId::parse(name).filter(|c| c.position() <= self.columns.len())
    }

    /// Column identifiers rendered as strings, for header records
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(ToString::to_string).collect()
    }
}
