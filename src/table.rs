use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader};

use crate::error::TableError;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Render the cell as text; whole numbers lose their trailing `.0`.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            Cell::Number(value) => value.to_string(),
            Cell::Text(text) => text.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// A header row plus data rows, as read from the first sheet of an upload.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        Self::from_bytes(&bytes, filename)
    }

    pub fn from_bytes(bytes: &[u8], filename: &str) -> Result<Self, TableError> {
        match extension(filename).as_deref() {
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => Self::from_workbook(bytes),
            Some("csv") => Self::from_csv(bytes),
            _ => Err(TableError::UnsupportedFormat(filename.to_string())),
        }
    }

    fn from_workbook(bytes: &[u8]) -> Result<Self, TableError> {
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(TableError::NoWorksheet)??;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .ok_or(TableError::NoHeader)?
            .iter()
            .map(|cell| workbook_cell(cell).to_text().trim().to_string())
            .collect();
        let rows = rows
            .map(|row| row.iter().map(workbook_cell).collect())
            .collect();

        Ok(Self::new(headers, rows))
    }

    fn from_csv(bytes: &[u8]) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();
        if headers.iter().all(|header| header.is_empty()) {
            return Err(TableError::NoHeader);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(csv_cell).collect());
        }

        Ok(Self::new(headers, rows))
    }

    fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let rows = rows
            .into_iter()
            .filter(|row: &Vec<Cell>| !row.iter().all(Cell::is_empty))
            .collect();
        Self { headers, rows }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

pub fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::Number(*value),
        Data::String(text) if text.is_empty() => Cell::Empty,
        Data::String(text) => Cell::Text(text.clone()),
        other => Cell::Text(other.to_string()),
    }
}

fn csv_cell(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Cell::Number(value),
        _ => Cell::Text(field.to_string()),
    }
}
