//! Filter-and-aggregate pipeline for chatbot usage statistics.
//!
//! Turns the loaded dataset plus user filter criteria into per-day views,
//! summary statistics, Plotly figures, a word cloud, and markdown reports.

pub mod charts;
pub mod pipeline;
pub mod reports;
pub mod wordcloud;

pub use charts::{build_figures, DashboardFigures, Figure};
pub use pipeline::{
    aggregate_by_day, apply_filters, compute_summary, feedback_distribution, region_totals,
    weekday_heatmap, DailyAggregate, DashboardView, DurationDisplay, Pipeline, SummaryStats,
};
pub use reports::ReportGenerator;
