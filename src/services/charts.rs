use std::collections::{HashMap, HashSet};

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{Aggregation, ChartKind, ChartPoint, ChartRequest, Dataset, RawValue};
use crate::services::column_stats::FrequencyTable;
use crate::services::values::numeric_fraction;

const UNKNOWN_GROUP: &str = "Unknown";

/// Thresholds for [`ChartProjector::choose_type`] and the default point
/// limits of every projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    /// Share of parseable values above which a column counts as numeric.
    pub numeric_fraction: f64,
    /// Below this distinct-x share a numeric y reads as categorical bars.
    pub unique_x_fraction: f64,
    /// Scatter needs strictly more rows than this.
    pub scatter_min_rows: usize,
    /// Pie needs strictly fewer distinct x values than this (and more than one).
    pub pie_max_categories: usize,
    pub bar_limit: usize,
    pub line_limit: usize,
    pub pie_limit: usize,
    pub scatter_limit: usize,
    pub aggregate_limit: usize,
    pub radar_limit: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            numeric_fraction: 0.8,
            unique_x_fraction: 0.5,
            scatter_min_rows: 20,
            pie_max_categories: 10,
            bar_limit: 20,
            line_limit: 50,
            pie_limit: 8,
            scatter_limit: 100,
            aggregate_limit: 20,
            radar_limit: 8,
        }
    }
}

/// Turns raw rows into chart-shaped points.
///
/// Unparseable cells never fail a projection. Bar charts drop points whose
/// value does not parse, line charts plot them as 0, scatter drops points
/// with either axis unparseable. Only unknown columns are errors.
#[derive(Debug, Clone, Default)]
pub struct ChartProjector {
    config: ChartConfig,
}

impl ChartProjector {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn bar(&self, dataset: &Dataset, x: &str, y: &str, limit: Option<usize>) -> AnalysisResult<Vec<ChartPoint>> {
        require_columns(dataset, &[x, y])?;
        let limit = limit.unwrap_or(self.config.bar_limit);

        Ok(dataset
            .rows()
            .iter()
            .take(limit)
            .enumerate()
            .filter_map(|(idx, row)| {
                let value = dataset.value(row, y).as_number()?;
                Some(ChartPoint::named(label(dataset.value(row, x), idx), value))
            })
            .collect())
    }

    pub fn line(&self, dataset: &Dataset, x: &str, y: &str, limit: Option<usize>) -> AnalysisResult<Vec<ChartPoint>> {
        require_columns(dataset, &[x, y])?;
        let limit = limit.unwrap_or(self.config.line_limit);

        Ok(dataset
            .rows()
            .iter()
            .take(limit)
            .enumerate()
            .map(|(idx, row)| {
                let value = dataset.value(row, y).as_number().unwrap_or(0.0);
                ChartPoint::named(label(dataset.value(row, x), idx), value)
            })
            .collect())
    }

    /// Occurrence counts per distinct value, largest first. Equal counts
    /// keep first-seen order.
    pub fn pie(&self, dataset: &Dataset, column: &str, limit: Option<usize>) -> AnalysisResult<Vec<ChartPoint>> {
        dataset.require_column(column)?;
        let limit = limit.unwrap_or(self.config.pie_limit);

        let mut groups = FrequencyTable::new();
        for row in dataset.rows() {
            groups.add(group_key(dataset.value(row, column)));
        }

        let mut entries = groups.into_entries();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(limit);

        Ok(entries
            .into_iter()
            .map(|(name, count)| ChartPoint::named(name, count as f64))
            .collect())
    }

    pub fn scatter(&self, dataset: &Dataset, x: &str, y: &str, limit: Option<usize>) -> AnalysisResult<Vec<ChartPoint>> {
        require_columns(dataset, &[x, y])?;
        let limit = limit.unwrap_or(self.config.scatter_limit);

        Ok(dataset
            .rows()
            .iter()
            .take(limit)
            .enumerate()
            .filter_map(|(idx, row)| {
                let x_value = dataset.value(row, x);
                let px = x_value.as_number()?;
                let py = dataset.value(row, y).as_number()?;
                Some(ChartPoint {
                    name: label(x_value, idx),
                    value: py,
                    x: Some(px),
                    y: Some(py),
                })
            })
            .collect())
    }

    /// One axis per column, valued at the column mean (0 when nothing parses).
    pub fn radar(&self, dataset: &Dataset, columns: &[String], limit: Option<usize>) -> AnalysisResult<Vec<ChartPoint>> {
        let limit = limit.unwrap_or(self.config.radar_limit);
        columns
            .iter()
            .take(limit)
            .map(|column| {
                let values = dataset.column_values(column)?;
                let parsed: Vec<f64> = values.iter().filter_map(|v| v.as_number()).collect();
                let mean = if parsed.is_empty() {
                    0.0
                } else {
                    parsed.iter().sum::<f64>() / parsed.len() as f64
                };
                Ok(ChartPoint::named(column.clone(), mean))
            })
            .collect()
    }

    /// Groups rows by `x` and folds `y` per group. Groups stay in first-seen
    /// order. `Count` ignores the values of `y`; the other aggregations require it.
    pub fn aggregate(
        &self,
        dataset: &Dataset,
        x: &str,
        y: Option<&str>,
        aggregation: Aggregation,
        limit: Option<usize>,
    ) -> AnalysisResult<Vec<ChartPoint>> {
        dataset.require_column(x)?;
        if let Some(y) = y {
            dataset.require_column(y)?;
        }
        let y = match aggregation {
            Aggregation::Count => None,
            _ => Some(require_axis(y)?),
        };
        let limit = limit.unwrap_or(self.config.aggregate_limit);

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(String, GroupTotals)> = Vec::new();
        for row in dataset.rows() {
            let key = group_key(dataset.value(row, x));
            let slot = match index.get(&key) {
                Some(&slot) => slot,
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push((key, GroupTotals::default()));
                    groups.len() - 1
                }
            };
            let totals = &mut groups[slot].1;
            totals.rows += 1;
            if let Some(n) = y.and_then(|y| dataset.value(row, y).as_number()) {
                totals.sum += n;
                totals.parsed += 1;
            }
        }

        Ok(groups
            .into_iter()
            .take(limit)
            .map(|(name, totals)| ChartPoint::named(name, totals.value(aggregation)))
            .collect())
    }

    /// Picks a chart shape for an x/y pair.
    ///
    /// Rules, first match wins: both axes numeric with enough rows is
    /// scatter; few distinct x with numeric y is bar; both numeric is line;
    /// a handful of distinct x is pie; anything else is bar.
    pub fn choose_type(&self, dataset: &Dataset, x: &str, y: &str) -> AnalysisResult<ChartKind> {
        require_columns(dataset, &[x, y])?;
        let rows = dataset.rows();
        if rows.is_empty() {
            return Ok(ChartKind::Bar);
        }

        let cfg = &self.config;
        let x_numeric = numeric_fraction(rows.iter().map(|row| dataset.value(row, x)));
        let y_numeric = numeric_fraction(rows.iter().map(|row| dataset.value(row, y)));
        let unique_x = rows
            .iter()
            .map(|row| dataset.value(row, x).as_string())
            .collect::<HashSet<_>>()
            .len();
        let unique_x_fraction = unique_x as f64 / rows.len() as f64;

        let both_numeric = x_numeric > cfg.numeric_fraction && y_numeric > cfg.numeric_fraction;
        let kind = if both_numeric && rows.len() > cfg.scatter_min_rows {
            ChartKind::Scatter
        } else if unique_x_fraction < cfg.unique_x_fraction && y_numeric > cfg.numeric_fraction {
            ChartKind::Bar
        } else if both_numeric {
            ChartKind::Line
        } else if unique_x > 1 && unique_x < cfg.pie_max_categories {
            ChartKind::Pie
        } else {
            ChartKind::Bar
        };

        tracing::debug!(
            x_numeric,
            y_numeric,
            unique_x_fraction,
            chosen = ?kind,
            "chose chart type for {} vs {}",
            x,
            y
        );
        Ok(kind)
    }

    /// Dispatches a request. Without an explicit kind the shape comes from
    /// [`Self::choose_type`], or pie when only one column is given.
    pub fn project(&self, dataset: &Dataset, request: &ChartRequest) -> AnalysisResult<(ChartKind, Vec<ChartPoint>)> {
        let x = request.x_column.as_str();
        let y = request.y_column.as_deref();

        let kind = match (request.kind, y) {
            (Some(kind), _) => kind,
            (None, Some(y)) => self.choose_type(dataset, x, y)?,
            (None, None) => ChartKind::Pie,
        };

        let points = match kind {
            ChartKind::Bar => self.bar(dataset, x, require_axis(y)?, request.limit)?,
            ChartKind::Line => self.line(dataset, x, require_axis(y)?, request.limit)?,
            ChartKind::Scatter => self.scatter(dataset, x, require_axis(y)?, request.limit)?,
            ChartKind::Pie => self.pie(dataset, x, request.limit)?,
            ChartKind::Aggregate => self.aggregate(dataset, x, y, request.aggregation, request.limit)?,
            ChartKind::Radar => {
                let columns: Vec<String> = if request.columns.is_empty() {
                    std::iter::once(request.x_column.clone())
                        .chain(request.y_column.clone())
                        .collect()
                } else {
                    request.columns.clone()
                };
                self.radar(dataset, &columns, request.limit)?
            }
        };

        tracing::debug!(kind = ?kind, points = points.len(), "projected chart");
        Ok((kind, points))
    }
}

#[derive(Debug, Default)]
struct GroupTotals {
    rows: usize,
    parsed: usize,
    sum: f64,
}

impl GroupTotals {
    fn value(&self, aggregation: Aggregation) -> f64 {
        match aggregation {
            Aggregation::Sum => self.sum,
            Aggregation::Average if self.parsed == 0 => 0.0,
            Aggregation::Average => self.sum / self.parsed as f64,
            Aggregation::Count => self.rows as f64,
        }
    }
}

fn require_columns(dataset: &Dataset, columns: &[&str]) -> AnalysisResult<()> {
    columns.iter().try_for_each(|c| dataset.require_column(c))
}

fn require_axis(y: Option<&str>) -> AnalysisResult<&str> {
    y.ok_or_else(|| AnalysisError::UnknownColumn("<none>".to_string()))
}

fn label(value: &RawValue, idx: usize) -> String {
    if value.is_missing() {
        format!("Item {}", idx + 1)
    } else {
        value.as_string()
    }
}

fn group_key(value: &RawValue) -> String {
    if value.is_missing() {
        UNKNOWN_GROUP.to_string()
    } else {
        value.as_string()
    }
}
