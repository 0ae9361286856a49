use std::collections::HashSet;
use std::io::Cursor;

use bytes::Bytes;
use calamine::{open_workbook_from_rs, Data, DataType, Reader, Xlsx};

use crate::error::AppError;
use crate::models::{Dataset, RawValue, RowRecord};
use crate::services::values::parse_date_text;

/// One non-empty worksheet turned into a dataset.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub dataset: Dataset,
}

/// Reads every worksheet of an xlsx file. The first row of each sheet is
/// taken as its header row; sheets without any rows are skipped.
pub fn read_workbook(file_data: Bytes) -> Result<Vec<Sheet>, AppError> {
    let start = std::time::Instant::now();
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(file_data)).map_err(|e| {
        tracing::error!("Failed to open Excel file: {}", e);
        AppError::FileProcessingError(format!("Failed to open Excel file: {}", e))
    })?;

    let mut sheets = Vec::new();
    for (name, range) in workbook.worksheets() {
        let rows: Vec<&[Data]> = range.rows().collect();
        let Some((header_row, body)) = rows.split_first() else {
            tracing::warn!("Sheet {} is empty, skipping", name);
            continue;
        };

        let dataset = sheet_to_dataset(header_row, body)?;
        tracing::info!(
            "Read sheet {} with {} rows and {} columns",
            name,
            dataset.row_count(),
            dataset.column_count()
        );
        sheets.push(Sheet { name, dataset });
    }

    tracing::info!("Workbook read in {:?}, {} sheets with data", start.elapsed(), sheets.len());
    Ok(sheets)
}

pub(crate) fn sheet_to_dataset(header_row: &[Data], body: &[&[Data]]) -> Result<Dataset, AppError> {
    let mut existing_names = HashSet::new();
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| clean_header(&cell.to_string(), idx, &mut existing_names))
        .collect();

    let rows = body
        .iter()
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (header.clone(), cells.get(idx).map(cell_value).unwrap_or_default()))
                .collect::<RowRecord>()
        })
        .collect();

    Ok(Dataset::new(headers, rows)?)
}

/// Blank headers become `Column N`; repeats get a numeric suffix.
pub(crate) fn clean_header(raw: &str, idx: usize, existing_names: &mut HashSet<String>) -> String {
    let trimmed = raw.trim();
    let base = if trimmed.is_empty() {
        format!("Column {}", idx + 1)
    } else {
        trimmed.to_string()
    };

    let mut cleaned = base.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", base, counter);
        counter += 1;
    }
    cleaned
}

pub(crate) fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Null,
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::Float(f) => RawValue::Number(*f),
        Data::Bool(b) => RawValue::Bool(*b),
        Data::String(s) => RawValue::Text(s.clone()),
        Data::DateTime(d) => cell
            .as_datetime()
            .map(RawValue::Date)
            .unwrap_or_else(|| RawValue::Number(d.as_f64())),
        Data::DateTimeIso(s) => parse_date_text(s)
            .map(RawValue::Date)
            .unwrap_or_else(|| RawValue::Text(s.clone())),
        Data::DurationIso(s) => RawValue::Text(s.clone()),
    }
}
