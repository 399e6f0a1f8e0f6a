use std::fmt;

use super::DatasetError;

/// A single table value.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    /// Interpret a raw CSV field, preferring a number when it parses as one.
    pub fn infer(raw: &str) -> Cell {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(value) if !trimmed.is_empty() => Cell::Number(value),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Text(text) => f.write_str(text),
        }
    }
}

/// A named column of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }
}

/// Ordered, named columns sharing one row count.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build a table, rejecting ragged columns and duplicate names.
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        if columns.is_empty() {
            return Err(DatasetError::Empty);
        }
        let rows = columns[0].cells.len();
        for (idx, column) in columns.iter().enumerate() {
            if column.cells.len() != rows {
                return Err(DatasetError::RaggedColumn {
                    column: column.name.clone(),
                    expected: rows,
                    found: column.cells.len(),
                });
            }
            if columns[..idx].iter().any(|other| other.name == column.name) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from row-major cells under the given column names.
    pub fn from_rows(names: &[String], rows: Vec<Vec<Cell>>) -> Result<Self, DatasetError> {
        let mut columns: Vec<Column> = names
            .iter()
            .map(|name| Column::new(name.clone(), Vec::with_capacity(rows.len())))
            .collect();
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(DatasetError::RaggedRow {
                    row: row_idx,
                    expected: names.len(),
                    found: row.len(),
                });
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.cells.push(cell);
            }
        }
        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column, DatasetError> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    }

    /// Rename a column in place, keeping its position.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), DatasetError> {
        if from != to && self.columns.iter().any(|column| column.name == to) {
            return Err(DatasetError::DuplicateColumn(to.to_string()));
        }
        let column = self
            .columns
            .iter_mut()
            .find(|column| column.name == from)
            .ok_or_else(|| DatasetError::MissingColumn(from.to_string()))?;
        column.name = to.to_string();
        Ok(())
    }

    /// Replace every cell of a column with `map(cell)`.
    pub fn map_column(
        &mut self,
        name: &str,
        mut map: impl FnMut(&Cell) -> Result<Cell, DatasetError>,
    ) -> Result<(), DatasetError> {
        let column = self
            .columns
            .iter_mut()
            .find(|column| column.name == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))?;
        for cell in &mut column.cells {
            *cell = map(cell)?;
        }
        Ok(())
    }

    /// Read a column as numbers; any text cell is an error.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, DatasetError> {
        let column = self.column(name)?;
        column
            .cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.as_number().ok_or_else(|| DatasetError::NotNumeric {
                    column: name.to_string(),
                    row,
                    value: cell.to_string(),
                })
            })
            .collect()
    }

    /// Read a column as strings, formatting numbers the way they are written to CSV.
    pub fn text_column(&self, name: &str) -> Result<Vec<String>, DatasetError> {
        Ok(self.column(name)?.cells.iter().map(Cell::to_string).collect())
    }

    /// Iterate rows as borrowed cells in column order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Cell>> + '_ {
        (0..self.rows).map(move |row| self.columns.iter().map(|column| &column.cells[row]).collect())
    }
}
