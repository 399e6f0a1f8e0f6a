use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use super::DatasetError;
use super::table::{Cell, Table};

/// Where column names come from when reading CSV.
#[derive(Clone, Copy, Debug)]
pub enum Header<'a> {
    /// The first record names the columns.
    FirstRow,
    /// The data has no header row; use these names in order.
    Assign(&'a [&'a str]),
}

/// Parse CSV from any reader into a [`Table`], inferring numeric cells.
///
/// Blank lines are skipped. Rows whose width differs from the header are errors.
pub fn read_table<R: Read>(reader: R, header: Header<'_>) -> Result<Table, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(matches!(header, Header::FirstRow))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let names: Vec<String> = match header {
        Header::FirstRow => csv_reader.headers()?.iter().map(str::to_string).collect(),
        Header::Assign(names) => names.iter().map(|name| name.to_string()).collect(),
    };
    if names.is_empty() || names.iter().all(String::is_empty) {
        return Err(DatasetError::Empty);
    }

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(Cell::infer).collect());
    }
    if rows.is_empty() {
        return Err(DatasetError::Empty);
    }
    Table::from_rows(&names, rows)
}

/// Read a CSV file that carries its own header row.
pub fn read_table_file(path: &Path) -> Result<Table, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_table(BufReader::new(file), Header::FirstRow)
}

/// Write a table as CSV with a header row and no index column.
pub fn write_table<W: Write>(writer: W, table: &Table) -> Result<(), DatasetError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table.column_names())?;
    for row in table.rows() {
        csv_writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write a table to `path`, replacing any previous file.
pub fn write_table_file(path: &Path, table: &Table) -> Result<(), DatasetError> {
    let file = File::create(path).map_err(|source| DatasetError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_table(file, table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IRIS_SNIPPET: &str = "5.1,3.5,1.4,0.2,Iris-setosa\n\
        7.0,3.2,4.7,1.4,Iris-versicolor\n\
        6.3,3.3,6.0,2.5,Iris-virginica\n\
        \n\
        \n";

    const COLUMNS: &[&str] = &["a", "b", "c", "d", "species"];

    #[test]
    fn assigns_names_to_headerless_data_and_skips_blank_lines() {
        let table = read_table(IRIS_SNIPPET.as_bytes(), Header::Assign(COLUMNS)).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_names(), COLUMNS.to_vec());
        assert_eq!(table.numeric_column("a").unwrap(), vec![5.1, 7.0, 6.3]);
        assert_eq!(
            table.text_column("species").unwrap(),
            vec!["Iris-setosa", "Iris-versicolor", "Iris-virginica"]
        );
    }

    #[test]
    fn written_csv_has_header_and_reads_back_identically() {
        let table = read_table(IRIS_SNIPPET.as_bytes(), Header::Assign(COLUMNS)).unwrap();
        let mut out = Vec::new();
        write_table(&mut out, &table).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with("a,b,c,d,species\n5.1,3.5,1.4,0.2,Iris-setosa\n"));

        let reread = read_table(out.as_slice(), Header::FirstRow).unwrap();
        assert_eq!(reread, table);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = read_table("x,y\n1,2\n3\n".as_bytes(), Header::FirstRow).unwrap_err();
        assert!(matches!(err, DatasetError::RaggedRow { row: 1, .. }));
    }

    #[test]
    fn header_only_input_is_empty() {
        let err = read_table("x,y\n".as_bytes(), Header::FirstRow).unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }
}
