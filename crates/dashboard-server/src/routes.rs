use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use dashboard_analytics::{build_figures, DashboardFigures, DashboardView, Pipeline};
use dashboard_core::types::{Feedback, FilterCriteria};
use serde::{Deserialize, Serialize};

const NO_DATA: &str = "Sem dados";

// ── Health ──────────────────────────────────────────────────────────────

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "records": state.pipeline.dataset().len(),
    }))
}

// ── Page ────────────────────────────────────────────────────────────────

pub fn page_routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

// ── Filter options ──────────────────────────────────────────────────────

pub fn options_routes() -> Router<AppState> {
    Router::new().route("/api/options", get(options))
}

#[derive(Debug, Serialize)]
struct FilterOptions {
    min_date: NaiveDate,
    max_date: NaiveDate,
    regions: Vec<String>,
    feedback: Vec<Feedback>,
}

async fn options(State(state): State<AppState>) -> impl IntoResponse {
    let dataset = state.pipeline.dataset();
    let (min_date, max_date) = dataset.date_range();
    Json(FilterOptions {
        min_date,
        max_date,
        regions: dataset.regions().map(str::to_string).collect(),
        feedback: dataset.feedback_labels(),
    })
}

// ── Dashboard ───────────────────────────────────────────────────────────

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route(
        "/api/dashboard",
        get(dashboard_query).post(dashboard_body),
    )
}

/// Query-string filters. Multi-valued filters are comma-separated.
#[derive(Debug, Deserialize)]
struct DashboardQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    regions: Option<String>,
    feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DashboardRequest {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    #[serde(default)]
    regions: Vec<String>,
    #[serde(default)]
    feedback: Vec<Feedback>,
}

/// Display strings for the two summary panels.
#[derive(Debug, Serialize)]
struct SummaryText {
    duration: String,
    duration_simple: String,
    messages: String,
}

#[derive(Debug, Serialize)]
struct DashboardResponse {
    view: DashboardView,
    figures: DashboardFigures,
    summary_text: SummaryText,
}

async fn dashboard_query(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let criteria = resolve_criteria(
        &state.pipeline,
        query.start,
        query.end,
        split_list(query.regions.as_deref()),
        split_list(query.feedback.as_deref())
            .into_iter()
            .map(Feedback::from)
            .collect(),
    )?;
    Ok(Json(render(&state, &criteria)))
}

async fn dashboard_body(
    State(state): State<AppState>,
    Json(req): Json<DashboardRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let criteria = resolve_criteria(
        &state.pipeline,
        req.start_date,
        req.end_date,
        req.regions,
        req.feedback,
    )?;
    Ok(Json(render(&state, &criteria)))
}

/// Fill missing bounds from the dataset and reject inverted ranges.
fn resolve_criteria(
    pipeline: &Pipeline,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    regions: Vec<String>,
    feedback: Vec<Feedback>,
) -> Result<FilterCriteria, (StatusCode, String)> {
    let defaults = pipeline.default_criteria();
    let criteria = FilterCriteria::between(
        start.unwrap_or(defaults.start_date),
        end.unwrap_or(defaults.end_date),
    )
    .with_regions(regions)
    .with_feedback(feedback);

    criteria
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(criteria)
}

fn render(state: &AppState, criteria: &FilterCriteria) -> DashboardResponse {
    let view = state.pipeline.run(criteria);
    let figures = build_figures(&view, &state.config.map);
    let summary_text = match &view.summary {
        Some(summary) => SummaryText {
            duration: summary.duration_display().to_string(),
            duration_simple: summary.duration_text(),
            messages: summary.messages_text(),
        },
        None => SummaryText {
            duration: NO_DATA.into(),
            duration_simple: NO_DATA.into(),
            messages: NO_DATA.into(),
        },
    };

    DashboardResponse {
        view,
        figures,
        summary_text,
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert!(split_list(None).is_empty());
        assert!(split_list(Some("")).is_empty());
        assert_eq!(
            split_list(Some("Bahia, São Paulo,,")),
            vec!["Bahia".to_string(), "São Paulo".to_string()]
        );
    }
}
