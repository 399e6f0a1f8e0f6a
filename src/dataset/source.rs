//! Shape of each variant's raw download and how it becomes the persisted table.

use time::Date;
use time::format_description::FormatItem;
use time::macros::format_description;

use super::csv_io::{Header, read_table};
use super::table::{Cell, Table};
use super::DatasetError;
use crate::pipeline::PipelineVariant;

/// Column names assigned to the headerless iris download.
pub const IRIS_COLUMNS: [&str; 5] = [
    "sepal_length",
    "sepal_width",
    "petal_length",
    "petal_width",
    "species",
];
/// Categorical target of the classification variant.
pub const IRIS_TARGET: &str = "species";

/// Time index of the airline table.
pub const MONTH_COLUMN: &str = "month";
/// Count target of the airline table.
pub const PASSENGERS_COLUMN: &str = "passengers";

const RAW_MONTH: &str = "Month";
const RAW_PASSENGERS: &str = "Passengers";

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// How the variant's raw download is laid out.
pub fn source_header(variant: PipelineVariant) -> Header<'static> {
    match variant {
        PipelineVariant::Iris => Header::Assign(&IRIS_COLUMNS),
        PipelineVariant::Airline => Header::FirstRow,
    }
}

/// Parse a raw download and normalize it into the table the trainer expects.
pub fn parse_source(variant: PipelineVariant, bytes: &[u8]) -> Result<Table, DatasetError> {
    let raw = read_table(bytes, source_header(variant))?;
    normalize(variant, raw)
}

/// Normalize a raw table. Columns are renamed or reformatted, never dropped.
pub fn normalize(variant: PipelineVariant, mut table: Table) -> Result<Table, DatasetError> {
    match variant {
        PipelineVariant::Iris => {
            table.numeric_column(IRIS_COLUMNS[0])?;
            table.column(IRIS_TARGET)?;
        }
        PipelineVariant::Airline => {
            if table.column(MONTH_COLUMN).is_err() {
                table.rename(RAW_MONTH, MONTH_COLUMN)?;
            }
            if table.column(PASSENGERS_COLUMN).is_err() {
                table.rename(RAW_PASSENGERS, PASSENGERS_COLUMN)?;
            }
            let mut row = 0usize;
            table.map_column(MONTH_COLUMN, |cell| {
                let text = cell.to_string();
                let date = parse_month(&text).ok_or_else(|| DatasetError::InvalidDate {
                    column: MONTH_COLUMN.to_string(),
                    row,
                    value: text.clone(),
                })?;
                row += 1;
                Ok(Cell::Text(format_date(date)))
            })?;
            table.numeric_column(PASSENGERS_COLUMN)?;
        }
    }
    Ok(table)
}

/// Parse `YYYY-MM` or `YYYY-MM-DD`; a bare month maps to its first day.
pub fn parse_month(text: &str) -> Option<Date> {
    let text = text.trim();
    let full = if text.len() == 7 {
        format!("{text}-01")
    } else {
        text.to_string()
    };
    Date::parse(&full, DATE_FORMAT).ok()
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn iris_download_gets_fixed_column_names() {
        let raw = b"5.1,3.5,1.4,0.2,Iris-setosa\n4.9,3.0,1.4,0.2,Iris-setosa\n\n";
        let table = parse_source(PipelineVariant::Iris, raw).unwrap();
        assert_eq!(table.column_names(), IRIS_COLUMNS.to_vec());
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn airline_download_is_renamed_and_dated() {
        let raw = b"\"Month\",\"Passengers\"\n\"1949-01\",112\n\"1949-02\",118\n";
        let table = parse_source(PipelineVariant::Airline, raw).unwrap();
        assert_eq!(table.column_names(), vec![MONTH_COLUMN, PASSENGERS_COLUMN]);
        assert_eq!(
            table.text_column(MONTH_COLUMN).unwrap(),
            vec!["1949-01-01", "1949-02-01"]
        );
        assert_eq!(
            table.numeric_column(PASSENGERS_COLUMN).unwrap(),
            vec![112.0, 118.0]
        );
    }

    #[test]
    fn normalizing_twice_is_stable() {
        let raw = b"Month,Passengers\n1949-01,112\n";
        let once = parse_source(PipelineVariant::Airline, raw).unwrap();
        let twice = normalize(PipelineVariant::Airline, once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn bad_month_reports_row() {
        let raw = b"Month,Passengers\n1949-01,112\nsoon,118\n";
        let err = parse_source(PipelineVariant::Airline, raw).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidDate { row: 1, .. }));
    }

    #[test]
    fn parses_both_month_forms() {
        let date = parse_month("1960-12").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (1960, Month::December, 1));
        assert_eq!(parse_month("1960-12-15").unwrap().day(), 15);
        assert!(parse_month("12/1960").is_none());
    }
}
