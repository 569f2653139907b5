use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader};

use crate::error::IngestError;
use crate::models::Request;

/// Two banner rows sit above the column labels in the pipeline export.
pub const DEFAULT_HEADER_ROW: usize = 2;

pub const NAME: &str = "Name";
pub const STAKEHOLDER: &str = "Requesting Stakeholder";
pub const QUARTER: &str = "Quarter Date";
pub const TOOL_NAME: &str = "Tool Name";
pub const STATUS: &str = "Status";
pub const PRIORITY: &str = "Total Priority Score";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
            _ => Err(IngestError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Cell grid of the first sheet. `None` marks a blank cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub rows: Vec<Vec<Option<String>>>,
}

pub fn read_source(path: &Path) -> Result<(Vec<u8>, SourceFormat), IngestError> {
    let format = SourceFormat::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), ?format, "read source file");
    Ok((bytes, format))
}

pub fn read_sheet(bytes: &[u8], format: SourceFormat) -> Result<RawSheet, IngestError> {
    match format {
        SourceFormat::Csv => read_csv(bytes),
        SourceFormat::Workbook => read_workbook(bytes),
    }
}

fn read_csv(bytes: &[u8]) -> Result<RawSheet, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| (!field.is_empty()).then(|| field.to_string()))
                .collect(),
        );
    }

    Ok(RawSheet { rows })
}

fn read_workbook(bytes: &[u8]) -> Result<RawSheet, IngestError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::NoWorksheet)??;

    // calamine trims leading blank rows and columns; restore absolute positions
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Option<String>>> = vec![Vec::new(); first_row as usize];

    for cells in range.rows() {
        let mut row = vec![None; first_col as usize];
        row.extend(cells.iter().map(cell_text));
        rows.push(row);
    }

    Ok(RawSheet { rows })
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

struct Columns {
    name: usize,
    stakeholder: usize,
    quarter: usize,
    tool_name: usize,
    status: usize,
    priority: usize,
}

impl Columns {
    fn locate(header: &[Option<String>]) -> Result<Self, IngestError> {
        let find = |label: &'static str| {
            header
                .iter()
                .position(|cell| cell.as_deref().map(str::trim) == Some(label))
                .ok_or(IngestError::MissingColumn(label))
        };

        Ok(Self {
            name: find(NAME)?,
            stakeholder: find(STAKEHOLDER)?,
            quarter: find(QUARTER)?,
            tool_name: find(TOOL_NAME)?,
            status: find(STATUS)?,
            priority: find(PRIORITY)?,
        })
    }
}

fn cell(row: &[Option<String>], index: usize) -> Option<&str> {
    row.get(index).and_then(|value| value.as_deref())
}

fn text(row: &[Option<String>], index: usize) -> String {
    cell(row, index).unwrap_or_default().to_string()
}

/// Turns the grid below `header_row` into requests, dropping rows without a name.
pub fn clean(sheet: &RawSheet, header_row: usize) -> Result<Vec<Request>, IngestError> {
    let header = sheet
        .rows
        .get(header_row)
        .ok_or(IngestError::MissingHeader(header_row))?;
    let columns = Columns::locate(header)?;

    let mut requests = Vec::new();
    let mut dropped = 0usize;

    for row in sheet.rows.iter().skip(header_row + 1) {
        let name = match cell(row, columns.name) {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => {
                dropped += 1;
                continue;
            }
        };

        requests.push(Request {
            name,
            stakeholder: text(row, columns.stakeholder),
            tool_name: text(row, columns.tool_name),
            status: text(row, columns.status),
            time_bucket: text(row, columns.quarter),
            priority_score_raw: text(row, columns.priority),
        });
    }

    tracing::info!(kept = requests.len(), dropped, "cleaned request rows");
    Ok(requests)
}

pub fn load_bytes(
    bytes: &[u8],
    format: SourceFormat,
    header_row: usize,
) -> Result<Vec<Request>, IngestError> {
    let sheet = read_sheet(bytes, format)?;
    clean(&sheet, header_row)
}
