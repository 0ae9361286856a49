use rayon::prelude::*;

use crate::models::{ColumnType, RawValue};

/// Share of non-missing cells that must agree before a column gets a type.
pub const TYPE_MAJORITY: f64 = 0.8;

/// Classifies a column by majority vote over its non-missing cells.
///
/// Candidates are tried boolean, number, date; the first one claiming more
/// than [`TYPE_MAJORITY`] of the cells wins, so `"1"`/`"0"` columns read as
/// boolean. A column with no values at all is `Text`.
pub fn infer_type(values: &[RawValue]) -> ColumnType {
    infer_type_refs(&values.iter().collect::<Vec<_>>())
}

pub(crate) fn infer_type_refs(values: &[&RawValue]) -> ColumnType {
    let (total, bool_count, num_count, date_count) = values
        .par_iter()
        .filter(|v| !v.is_missing())
        .fold(
            || (0usize, 0usize, 0usize, 0usize),
            |(total, bools, nums, dates), value| {
                (
                    total + 1,
                    bools + usize::from(value.is_boolean_token()),
                    nums + usize::from(value.as_number().is_some()),
                    dates + usize::from(value.is_date_like()),
                )
            },
        )
        .reduce(
            || (0, 0, 0, 0),
            |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2, a.3 + b.3),
        );

    if total == 0 {
        return ColumnType::Text;
    }

    let threshold = total as f64 * TYPE_MAJORITY;
    match () {
        _ if bool_count as f64 > threshold => ColumnType::Boolean,
        _ if num_count as f64 > threshold => ColumnType::Number,
        _ if date_count as f64 > threshold => ColumnType::Date,
        _ => ColumnType::Text,
    }
}
