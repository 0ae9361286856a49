use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// A single spreadsheet cell as it arrives from ingestion.
///
/// Columns are only homogeneous in practice, so every cell carries its own
/// tag. Coercions live in `services::values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}

static NULL: RawValue = RawValue::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Date,
    Boolean,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Boolean => "boolean",
        }
    }
}

pub type RowRecord = HashMap<String, RawValue>;

/// Headers and rows as received, before the shape check.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDataset {
    pub headers: Vec<String>,
    pub rows: Vec<RowRecord>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = AnalysisError;

    fn try_from(raw: RawDataset) -> Result<Self, Self::Error> {
        Dataset::new(raw.headers, raw.rows)
    }
}

/// One parsed sheet: ordered headers plus row records in insertion order.
///
/// The shape is checked once here, so every calculator can index rows by
/// header without re-validating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<RowRecord>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<RowRecord>) -> AnalysisResult<Self> {
        if headers.is_empty() && !rows.is_empty() {
            return Err(AnalysisError::StructuralInput(format!(
                "{} rows supplied without any headers",
                rows.len()
            )));
        }

        let mut seen = HashSet::with_capacity(headers.len());
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(AnalysisError::StructuralInput(format!(
                    "duplicate header '{}'",
                    header
                )));
            }
        }

        for (idx, row) in rows.iter().enumerate() {
            if let Some(missing) = headers.iter().find(|h| !row.contains_key(h.as_str())) {
                return Err(AnalysisError::StructuralInput(format!(
                    "row {} has no value for header '{}'",
                    idx + 1,
                    missing
                )));
            }
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RowRecord] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> AnalysisResult<()> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(AnalysisError::UnknownColumn(name.to_string()))
        }
    }

    /// Cell lookup; rows are validated, so absence only happens for
    /// undeclared names and reads as null.
    pub fn value<'a>(&self, row: &'a RowRecord, column: &str) -> &'a RawValue {
        row.get(column).unwrap_or(&NULL)
    }

    /// Every value of `column`, in row order.
    pub fn column_values(&self, column: &str) -> AnalysisResult<Vec<&RawValue>> {
        self.require_column(column)?;
        Ok(self.rows.iter().map(|row| self.value(row, column)).collect())
    }
}

/// Statistical profile of one column. Optional fields are filled by the
/// numeric or text branch only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub data_type: ColumnType,
    pub count: usize,
    pub null_count: usize,
    pub unique_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_deviation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_length: Option<f64>,
}

impl ColumnProfile {
    pub(crate) fn base(data_type: ColumnType, count: usize, null_count: usize, unique_count: usize) -> Self {
        Self {
            data_type,
            count,
            null_count,
            unique_count,
            mean: None,
            median: None,
            mode: None,
            min: None,
            max: None,
            range: None,
            variance: None,
            standard_deviation: None,
            average_length: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub total_records: usize,
    pub total_columns: usize,
    pub numeric_columns: usize,
    pub text_columns: usize,
    pub missing_values: usize,
    /// Percentage of non-missing cells, 0..=100.
    pub data_quality: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsArtifact {
    pub columns: BTreeMap<String, ColumnProfile>,
    pub summary: DatasetSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl ChartPoint {
    pub fn named(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            x: None,
            y: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Scatter,
    Radar,
    Aggregate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Average,
    Count,
}

/// What the presentation layer asks for. Leaving `kind` out lets the
/// projector pick one through `choose_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    #[serde(default)]
    pub kind: Option<ChartKind>,
    pub x_column: String,
    #[serde(default)]
    pub y_column: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub limit: Option<usize>,
}
