//! Plotly figure descriptions for the dashboard panels.
//!
//! Each figure is a `{data, layout}` object the page hands straight to
//! `Plotly.react`. Titles follow the dashboard's Portuguese labels.

use crate::pipeline::{DailyAggregate, DashboardView};
use dashboard_core::config::MapConfig;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

const BACKGROUND: &str = "rgba(255, 255, 255, 0.9)";
const LINE_COLOR: &str = "#636EFA";

/// A single chart: traces plus layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
}

impl Figure {
    fn new(title: &str, data: Vec<Value>) -> Self {
        Self {
            data,
            layout: json!({
                "title": { "text": title },
                "plot_bgcolor": BACKGROUND,
                "paper_bgcolor": BACKGROUND,
                "margin": { "t": 60, "l": 50, "r": 20, "b": 50 },
            }),
        }
    }

    fn with_layout(mut self, key: &str, value: Value) -> Self {
        if let Some(layout) = self.layout.as_object_mut() {
            layout.insert(key.to_string(), value);
        }
        self
    }
}

/// Figures keyed by panel id, in page order. Serializes as a JSON object.
#[derive(Debug, Clone)]
pub struct DashboardFigures {
    pub panels: Vec<(&'static str, Figure)>,
}

impl Serialize for DashboardFigures {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.panels.len()))?;
        for (id, figure) in &self.panels {
            map.serialize_entry(id, figure)?;
        }
        map.end()
    }
}

impl DashboardFigures {
    pub fn get(&self, id: &str) -> Option<&Figure> {
        self.panels.iter().find(|(k, _)| *k == id).map(|(_, f)| f)
    }
}

/// Build every panel from one pipeline run.
pub fn build_figures(view: &DashboardView, map: &MapConfig) -> DashboardFigures {
    let daily = &view.daily;
    let panels = vec![
        (
            "respostas-por-dia",
            line(daily, "Número de Respostas por Dia", "respostas", |d| {
                json!(d.responses)
            }),
        ),
        (
            "media-conversas-por-dia",
            line(
                daily,
                "Número Médio de Conversas por Dia",
                "media_conversas_por_dia",
                |d| json!(d.avg_conversations_per_day),
            ),
        ),
        ("mapa-origem", choropleth(view, map)),
        (
            "tempo-medio-chat",
            line(daily, "Tempo Médio de um Chat", "tempo_medio_chat", |d| {
                json!(d.avg_chat_duration)
            }),
        ),
        (
            "total-diario",
            bar(daily, "Total de Conversas por Dia", "respostas", |d| {
                json!(d.responses)
            }),
        ),
        ("heatmap", heatmap(view)),
        ("demandas-dia-semana", demands(daily)),
        (
            "total-interacoes",
            bar(daily, "Total de Interações", "total_interacoes", |d| {
                json!(d.total_interactions)
            }),
        ),
        (
            "avaliacao-conversa",
            bar(daily, "Avaliação da Conversa", "avaliacao_conversa", |d| {
                json!(d.conversation_rating)
            }),
        ),
        ("feedback", feedback(view)),
    ];
    DashboardFigures { panels }
}

fn dates(daily: &[DailyAggregate]) -> Vec<String> {
    daily.iter().map(|d| d.date.to_string()).collect()
}

fn line(
    daily: &[DailyAggregate],
    title: &str,
    name: &str,
    value: impl Fn(&DailyAggregate) -> Value,
) -> Figure {
    Figure::new(
        title,
        vec![json!({
            "type": "scatter",
            "mode": "lines",
            "name": name,
            "x": dates(daily),
            "y": daily.iter().map(value).collect::<Vec<_>>(),
            "line": { "color": LINE_COLOR },
        })],
    )
    .with_layout("xaxis", json!({ "title": { "text": "data" } }))
    .with_layout("yaxis", json!({ "title": { "text": name } }))
}

fn bar(
    daily: &[DailyAggregate],
    title: &str,
    name: &str,
    value: impl Fn(&DailyAggregate) -> Value,
) -> Figure {
    Figure::new(
        title,
        vec![json!({
            "type": "bar",
            "name": name,
            "x": dates(daily),
            "y": daily.iter().map(value).collect::<Vec<_>>(),
        })],
    )
    .with_layout("xaxis", json!({ "title": { "text": "data" } }))
    .with_layout("yaxis", json!({ "title": { "text": name } }))
}

fn demands(daily: &[DailyAggregate]) -> Figure {
    let x = dates(daily);
    Figure::new(
        "Demandas por Dia e Semana",
        vec![
            json!({
                "type": "bar",
                "name": "demanda_diaria",
                "x": x,
                "y": daily.iter().map(|d| d.daily_demand).collect::<Vec<_>>(),
            }),
            json!({
                "type": "bar",
                "name": "demanda_semanal",
                "x": x,
                "y": daily.iter().map(|d| d.weekly_demand).collect::<Vec<_>>(),
            }),
        ],
    )
    .with_layout("barmode", json!("relative"))
}

fn choropleth(view: &DashboardView, map: &MapConfig) -> Figure {
    let locations: Vec<&str> = view.regions.iter().map(|r| r.region.as_str()).collect();
    let values: Vec<u64> = view.regions.iter().map(|r| r.total_interactions).collect();

    Figure::new(
        "Origem das Conversas por Estado (Brasil)",
        vec![json!({
            "type": "choropleth",
            "geojson": map.geojson_url,
            "featureidkey": map.feature_id_key,
            "locations": locations,
            "z": values,
            "text": locations,
            "hovertemplate": "<b>%{text}</b><br>total_interacoes=%{z}<extra></extra>",
            "colorscale": "Blues",
            "colorbar": { "title": { "text": "total_interacoes" } },
        })],
    )
    .with_layout(
        "geo",
        json!({
            "scope": "south america",
            "fitbounds": "locations",
            "visible": false,
            "center": { "lat": map.center_lat, "lon": map.center_lon },
        }),
    )
}

fn heatmap(view: &DashboardView) -> Figure {
    Figure::new(
        "Distribuição de Conversas por Estado e Dia",
        vec![json!({
            "type": "heatmap",
            "x": view.heatmap.x,
            "y": view.heatmap.y,
            "z": view.heatmap.z,
            "colorscale": "Blues",
            "colorbar": { "title": { "text": "Conversas" } },
        })],
    )
    .with_layout("xaxis", json!({ "title": { "text": "Dia da Semana" } }))
    .with_layout("yaxis", json!({ "title": { "text": "Estado" } }))
}

fn feedback(view: &DashboardView) -> Figure {
    let labels: Vec<&str> = view.feedback.iter().map(|(f, _)| f.as_str()).collect();
    let counts: Vec<usize> = view.feedback.iter().map(|(_, c)| *c).collect();

    Figure::new(
        "Distribuição de Feedback",
        vec![json!({
            "type": "bar",
            "name": "count",
            "x": labels,
            "y": counts,
        })],
    )
    .with_layout("xaxis", json!({ "title": { "text": "feedback" } }))
    .with_layout("yaxis", json!({ "title": { "text": "count" } }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::*;
    use crate::pipeline::Pipeline;
    use dashboard_core::types::{Feedback, FilterCriteria};
    use dashboard_core::Dataset;
    use std::sync::Arc;

    fn figures_for(criteria: impl FnOnce(&Pipeline) -> FilterCriteria) -> DashboardFigures {
        let pipeline = Pipeline::new(Arc::new(Dataset::from_records(scenario()).unwrap()));
        let view = pipeline.run(&criteria(&pipeline));
        build_figures(&view, &MapConfig::default())
    }

    #[test]
    fn test_all_panels_present_in_order() {
        let figures = figures_for(|p| p.default_criteria());
        let ids: Vec<&str> = figures.panels.iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            vec![
                "respostas-por-dia",
                "media-conversas-por-dia",
                "mapa-origem",
                "tempo-medio-chat",
                "total-diario",
                "heatmap",
                "demandas-dia-semana",
                "total-interacoes",
                "avaliacao-conversa",
                "feedback",
            ]
        );
    }

    #[test]
    fn test_line_uses_daily_view() {
        let figures = figures_for(|p| p.default_criteria());
        let fig = figures.get("respostas-por-dia").unwrap();
        assert_eq!(fig.data[0]["x"], json!(["2024-01-01", "2024-01-02"]));
        assert_eq!(fig.data[0]["y"], json!([30, 20]));
        assert_eq!(fig.layout["title"]["text"], "Número de Respostas por Dia");
        assert_eq!(fig.layout["paper_bgcolor"], BACKGROUND);
    }

    #[test]
    fn test_choropleth_references_geojson() {
        let figures = figures_for(|p| p.default_criteria());
        let fig = figures.get("mapa-origem").unwrap();
        assert_eq!(fig.data[0]["type"], "choropleth");
        assert!(fig.data[0]["geojson"]
            .as_str()
            .unwrap()
            .ends_with("brazil-states.geojson"));
        assert_eq!(fig.data[0]["locations"], json!(["Bahia", "Ceará", "São Paulo"]));
        assert_eq!(fig.data[0]["z"], json!([300, 100, 100]));
    }

    #[test]
    fn test_feedback_bar_reflects_filter() {
        let figures = figures_for(|p| p.default_criteria().with_feedback([Feedback::Negativo]));
        let fig = figures.get("feedback").unwrap();
        assert_eq!(fig.data[0]["x"], json!(["negativo"]));
        assert_eq!(fig.data[0]["y"], json!([2]));
    }

    #[test]
    fn test_empty_view_produces_empty_traces() {
        let figures = figures_for(|_| FilterCriteria::between(date(2023, 1, 1), date(2023, 1, 1)));
        let fig = figures.get("total-interacoes").unwrap();
        assert_eq!(fig.data[0]["x"], json!([]));
        let demands = figures.get("demandas-dia-semana").unwrap();
        assert_eq!(demands.data.len(), 2);
    }

    #[test]
    fn test_figures_serialize_as_object() {
        let figures = figures_for(|p| p.default_criteria());
        let value = serde_json::to_value(&figures).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 10);
        assert_eq!(value["heatmap"]["data"][0]["type"], "heatmap");
    }
}
