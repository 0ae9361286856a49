pub mod analyzer;
pub mod charts;
pub mod column_stats;
pub mod inference;
pub mod summary;
pub mod values;
pub mod workbook;

pub use analyzer::SheetAnalyzer;
pub use charts::{ChartConfig, ChartProjector};
pub use column_stats::compute_stats;
pub use inference::infer_type;
pub use summary::summarize;
