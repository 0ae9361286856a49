use crate::models::{Dataset, DatasetSummary};
use crate::services::values::numeric_fraction;

/// A column counts as numeric in the summary once more than half of its
/// non-missing cells parse as numbers. Boolean and date columns fall on
/// whichever side that puts them.
pub const NUMERIC_COLUMN_MAJORITY: f64 = 0.5;

/// Dataset-wide counts and the 0..=100 data-quality score.
///
/// Recomputes numeric-ness from the rows rather than reading column
/// profiles, so it can run without a statistics pass.
pub fn summarize(dataset: &Dataset) -> DatasetSummary {
    let total_records = dataset.row_count();
    let total_columns = dataset.column_count();

    let mut numeric_columns = 0;
    let mut text_columns = 0;
    let mut missing_values = 0;

    for header in dataset.headers() {
        let present: Vec<_> = dataset
            .rows()
            .iter()
            .map(|row| dataset.value(row, header))
            .filter(|v| !v.is_missing())
            .collect();

        missing_values += total_records - present.len();
        if numeric_fraction(present.iter().copied()) > NUMERIC_COLUMN_MAJORITY {
            numeric_columns += 1;
        } else {
            text_columns += 1;
        }
    }

    DatasetSummary {
        total_records,
        total_columns,
        numeric_columns,
        text_columns,
        missing_values,
        data_quality: data_quality(total_records * total_columns, missing_values),
    }
}

fn data_quality(total_cells: usize, missing: usize) -> u32 {
    if total_cells == 0 {
        return 100;
    }
    let filled = total_cells.saturating_sub(missing) as f64;
    (100.0 * filled / total_cells as f64).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawValue, RowRecord};

    fn dataset(headers: &[&str], rows: Vec<Vec<RawValue>>) -> Dataset {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|cells| headers.iter().cloned().zip(cells).collect::<RowRecord>())
            .collect();
        Dataset::new(headers, rows).unwrap()
    }

    #[test]
    fn region_sales_scenario() {
        let ds = dataset(
            &["Region", "Sales"],
            vec![
                vec!["East".into(), "100".into()],
                vec!["East".into(), "200".into()],
                vec!["West".into(), RawValue::Null],
            ],
        );
        let s = summarize(&ds);
        assert_eq!(s.total_records, 3);
        assert_eq!(s.total_columns, 2);
        assert_eq!(s.numeric_columns, 1);
        assert_eq!(s.text_columns, 1);
        assert_eq!(s.missing_values, 1);
        assert_eq!(s.data_quality, 83);
    }

    #[test]
    fn no_rows_is_full_quality() {
        let ds = dataset(&["a", "b"], vec![]);
        let s = summarize(&ds);
        assert_eq!(s.data_quality, 100);
        assert_eq!(s.numeric_columns + s.text_columns, 2);
    }

    #[test]
    fn complete_rows_are_full_quality() {
        let ds = dataset(&["a"], vec![vec!["x".into()], vec!["y".into()]]);
        assert_eq!(summarize(&ds).data_quality, 100);
    }

    #[test]
    fn boolean_columns_fold_by_numeric_fraction() {
        let ds = dataset(
            &["flag", "answer"],
            vec![
                vec!["1".into(), "yes".into()],
                vec!["0".into(), "no".into()],
            ],
        );
        let s = summarize(&ds);
        assert_eq!(s.numeric_columns, 1);
        assert_eq!(s.text_columns, 1);
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let ds = dataset(&["a"], vec![vec!["".into()], vec![RawValue::Null], vec!["1".into()], vec!["2".into()]]);
        let s = summarize(&ds);
        assert_eq!(s.missing_values, 2);
        assert_eq!(s.data_quality, 50);
        assert_eq!(s.numeric_columns, 1);
    }
}
