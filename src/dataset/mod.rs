//! Columnar tables, CSV persistence and per-variant normalization of the raw
//! source data.

pub mod csv_io;
pub mod source;
pub mod table;

use std::path::PathBuf;

use thiserror::Error;

pub use csv_io::{Header, read_table, read_table_file, write_table, write_table_file};
pub use table::{Cell, Column, Table};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("table has no rows")]
    Empty,
    #[error("row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("column {column} has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("column {column} row {row} is not numeric: {value:?}")]
    NotNumeric {
        column: String,
        row: usize,
        value: String,
    },
    #[error("column {column} row {row} is not a date: {value:?}")]
    InvalidDate {
        column: String,
        row: usize,
        value: String,
    },
}
