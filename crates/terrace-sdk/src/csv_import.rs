//! Loading CSV files as value triples.
//!
//! Each data row becomes a subject `{data_prefix}row{n}`, counting data rows
//! from 0. Each column becomes a predicate `{predicate_prefix}{header}`, or
//! `{predicate_prefix}col{i}` when the file has no header row or the header
//! is skipped. Every field is stored as a value whose lexical form is the
//! quoted, escaped field tagged as `xsd:string`.

use std::io::Read;

use csv::ReaderBuilder;
use terrace_types::StringTriple;
use tracing::debug;

use crate::builder::StoreLayerBuilder;
use crate::error::Result;

/// Datatype IRI attached to every imported field.
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// How to map a CSV file onto triples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvOptions {
    /// Prepended to `row{n}` to form row subjects.
    pub data_prefix: String,
    /// Prepended to column names to form predicates.
    pub predicate_prefix: String,
    /// The first row holds column names.
    pub has_header: bool,
    /// Discard the header row and name columns by position instead.
    pub skip_header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            data_prefix: String::new(),
            predicate_prefix: String::new(),
            has_header: true,
            skip_header: false,
        }
    }
}

/// The stored form of one CSV field.
pub fn csv_value(field: &str) -> String {
    format!("{field:?}^^'{XSD_STRING}'")
}

impl StoreLayerBuilder {
    /// Add one value triple per field of a CSV document.
    ///
    /// The input must be UTF-8 and every row must have as many fields as the
    /// first. The whole document is parsed before anything is added, so on
    /// error the builder is unchanged. Returns the number of data rows.
    pub fn import_csv<R: Read>(&mut self, input: R, options: &CsvOptions) -> Result<usize> {
        let mut reader = ReaderBuilder::new()
            .has_headers(options.has_header)
            .from_reader(input);
        let prefix = &options.predicate_prefix;
        let columns: Vec<String> = if options.has_header && !options.skip_header {
            reader
                .headers()?
                .iter()
                .map(|name| format!("{prefix}{name}"))
                .collect()
        } else {
            (0..reader.headers()?.len())
                .map(|i| format!("{prefix}col{i}"))
                .collect()
        };

        let mut triples = Vec::new();
        let mut rows = 0;
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let subject = format!("{}row{row}", options.data_prefix);
            for (column, field) in columns.iter().zip(record.iter()) {
                triples.push(StringTriple::new_value(&subject, column, &csv_value(field)));
            }
            rows += 1;
        }

        let fields = triples.len();
        for t in triples {
            self.add_string_triple(t)?;
        }
        debug!(rows, columns = columns.len(), fields, "imported CSV");
        Ok(rows)
    }
}
