use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;

use crate::models::{ColumnProfile, ColumnType, Dataset, StatisticsArtifact};
use crate::services::column_stats::compute_stats_refs;
use crate::services::summary::summarize;

/// Runs one statistics pass over a sheet: a profile per column plus the
/// dataset summary. Columns are independent, so they are profiled in
/// parallel.
pub struct SheetAnalyzer;

impl SheetAnalyzer {
    pub fn analyze(&self, dataset: &Dataset) -> StatisticsArtifact {
        self.analyze_with_hints(dataset, &HashMap::new())
    }

    /// Same as [`Self::analyze`], reporting `hints[column]` as the column
    /// type instead of inferring it.
    pub fn analyze_with_hints(
        &self,
        dataset: &Dataset,
        hints: &HashMap<String, ColumnType>,
    ) -> StatisticsArtifact {
        let start = std::time::Instant::now();
        tracing::info!(
            "Starting statistics pass over {} rows x {} columns",
            dataset.row_count(),
            dataset.column_count()
        );

        let columns: BTreeMap<String, ColumnProfile> = dataset
            .headers()
            .par_iter()
            .map(|header| {
                let values: Vec<_> = dataset
                    .rows()
                    .iter()
                    .map(|row| dataset.value(row, header))
                    .collect();
                let profile = compute_stats_refs(&values, hints.get(header).copied());
                tracing::debug!(
                    column = %header,
                    data_type = profile.data_type.as_str(),
                    nulls = profile.null_count,
                    unique = profile.unique_count,
                    "profiled column"
                );
                (header.clone(), profile)
            })
            .collect();

        let summary = summarize(dataset);
        tracing::info!(
            "Statistics pass completed in {:?}: {} numeric / {} text columns, quality {}%",
            start.elapsed(),
            summary.numeric_columns,
            summary.text_columns,
            summary.data_quality
        );

        StatisticsArtifact { columns, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawValue, RowRecord};

    fn region_sales() -> Dataset {
        let headers = vec!["Region".to_string(), "Sales".to_string()];
        let rows = [("East", Some("100")), ("East", Some("200")), ("West", None)]
            .iter()
            .map(|(region, sales)| {
                let mut row = RowRecord::new();
                row.insert("Region".to_string(), RawValue::from(*region));
                row.insert("Sales".to_string(), RawValue::from(*sales));
                row
            })
            .collect();
        Dataset::new(headers, rows).unwrap()
    }

    #[test]
    fn profiles_every_column_and_summarizes() {
        let artifact = SheetAnalyzer.analyze(&region_sales());

        assert_eq!(artifact.columns.len(), 2);
        let region = &artifact.columns["Region"];
        assert_eq!(region.data_type, ColumnType::Text);
        assert_eq!(region.mode, Some(RawValue::Text("East".to_string())));

        let sales = &artifact.columns["Sales"];
        assert_eq!(sales.data_type, ColumnType::Number);
        assert_eq!(sales.mean, Some(150.0));
        assert_eq!(artifact.summary.data_quality, 83);
    }

    #[test]
    fn count_matches_row_count_for_every_column() {
        let ds = region_sales();
        let artifact = SheetAnalyzer.analyze(&ds);
        assert!(artifact.columns.values().all(|p| p.count == ds.row_count()));
    }

    #[test]
    fn hints_override_inferred_types() {
        let mut hints = HashMap::new();
        hints.insert("Sales".to_string(), ColumnType::Text);
        let artifact = SheetAnalyzer.analyze_with_hints(&region_sales(), &hints);
        assert_eq!(artifact.columns["Sales"].data_type, ColumnType::Text);
        assert_eq!(artifact.columns["Region"].data_type, ColumnType::Text);
    }
}
