//! Filter-and-aggregate pipeline.
//!
//! Every call recomputes from the immutable dataset; nothing is cached
//! between invocations.

use chrono::{Datelike, NaiveDate};
use dashboard_core::types::{Feedback, FilterCriteria, Record};
use dashboard_core::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Weekday labels used by the heatmap, Monday first.
pub const WEEKDAYS: [&str; 7] = ["SEG", "TER", "QUA", "QUI", "SEX", "SAB", "DOM"];

/// Per-day reduction of the filtered records.
///
/// Count metrics are summed, rate metrics are averaged over the day's rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    /// Number of filtered rows that fell on this date.
    pub row_count: usize,
    // Sums.
    pub responses: u64,
    pub total_interactions: u64,
    pub total_conversations: u64,
    pub daily_demand: u64,
    pub weekly_demand: u64,
    // Means.
    pub avg_conversations_per_day: f64,
    pub avg_chat_duration: f64,
    pub conversation_rating: f64,
    pub estimated_conversation_minutes: f64,
    pub avg_messages_per_conversation: f64,
    pub response_accuracy: f64,
}

/// Scalar averages over the filtered (not day-grouped) rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Mean conversation duration, in minutes.
    pub mean_conversation_duration: f64,
    pub mean_messages_per_conversation: f64,
}

/// A duration in minutes split into whole minutes and rounded seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationDisplay {
    pub minutes: u64,
    pub seconds: u64,
}

impl DurationDisplay {
    pub fn from_minutes(value: f64) -> Self {
        let value = value.max(0.0);
        let mut minutes = value.floor() as u64;
        let mut seconds = ((value - value.floor()) * 60.0).round() as u64;
        if seconds == 60 {
            minutes += 1;
            seconds = 0;
        }
        Self { minutes, seconds }
    }
}

impl std::fmt::Display for DurationDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} min {} s", self.minutes, self.seconds)
    }
}

impl SummaryStats {
    pub fn duration_display(&self) -> DurationDisplay {
        DurationDisplay::from_minutes(self.mean_conversation_duration)
    }

    /// Raw mean duration rounded to two decimals, e.g. `"7.25 min"`.
    pub fn duration_text(&self) -> String {
        format!("{:.2} min", self.mean_conversation_duration)
    }

    pub fn messages_text(&self) -> String {
        format!("{:.2}", self.mean_messages_per_conversation)
    }
}

/// Sum of interactions for one region (choropleth input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTotal {
    pub region: String,
    pub total_interactions: u64,
}

/// Conversations per region and weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    /// Column labels (weekdays).
    pub x: Vec<String>,
    /// Row labels (regions).
    pub y: Vec<String>,
    /// `z[row][col]`, summed `total_conversations`.
    pub z: Vec<Vec<u64>>,
}

/// Every derived view for one set of filter criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub criteria: FilterCriteria,
    pub matched_rows: usize,
    pub daily: Vec<DailyAggregate>,
    pub summary: Option<SummaryStats>,
    pub feedback: Vec<(Feedback, usize)>,
    pub regions: Vec<RegionTotal>,
    pub heatmap: Heatmap,
}

/// Return the records satisfying every active predicate, order preserved.
pub fn apply_filters<'a, I>(records: I, criteria: &FilterCriteria) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|record| criteria.matches(record))
        .collect()
}

/// Group records by calendar date, ascending, one row per distinct date.
pub fn aggregate_by_day(records: &[&Record]) -> Vec<DailyAggregate> {
    let mut groups: BTreeMap<NaiveDate, Vec<&Record>> = BTreeMap::new();
    for record in records {
        groups.entry(record.date).or_default().push(*record);
    }

    groups
        .into_iter()
        .map(|(date, rows)| {
            let n = rows.len() as f64;
            let sum_u = |f: fn(&Record) -> u64| rows.iter().map(|r| f(*r)).sum::<u64>();
            let mean = |f: fn(&Record) -> f64| rows.iter().map(|r| f(*r)).sum::<f64>() / n;

            DailyAggregate {
                date,
                row_count: rows.len(),
                responses: sum_u(|r| r.responses),
                total_interactions: sum_u(|r| r.total_interactions),
                total_conversations: sum_u(|r| r.total_conversations),
                daily_demand: sum_u(|r| r.daily_demand),
                weekly_demand: sum_u(|r| r.weekly_demand),
                avg_conversations_per_day: mean(|r| r.avg_conversations_per_day),
                avg_chat_duration: mean(|r| r.avg_chat_duration),
                conversation_rating: mean(|r| r.conversation_rating),
                estimated_conversation_minutes: mean(|r| r.estimated_conversation_minutes),
                avg_messages_per_conversation: mean(|r| r.avg_messages_per_conversation),
                response_accuracy: mean(|r| r.response_accuracy),
            }
        })
        .collect()
}

/// Mean duration and mean messages per conversation; `None` when no rows match.
pub fn compute_summary(records: &[&Record]) -> Option<SummaryStats> {
    if records.is_empty() {
        return None;
    }
    let n = records.len() as f64;
    Some(SummaryStats {
        mean_conversation_duration: records
            .iter()
            .map(|r| r.estimated_conversation_minutes)
            .sum::<f64>()
            / n,
        mean_messages_per_conversation: records
            .iter()
            .map(|r| r.avg_messages_per_conversation)
            .sum::<f64>()
            / n,
    })
}

/// Occurrences of each feedback label present, most frequent first.
pub fn feedback_distribution(records: &[&Record]) -> Vec<(Feedback, usize)> {
    let mut counts: HashMap<&Feedback, usize> = HashMap::new();
    for record in records {
        *counts.entry(&record.feedback).or_insert(0) += 1;
    }
    let mut sorted: Vec<(Feedback, usize)> =
        counts.into_iter().map(|(k, v)| (k.clone(), v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

/// Total interactions per region, sorted by region name.
pub fn region_totals(records: &[&Record]) -> Vec<RegionTotal> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.region.as_str()).or_insert(0) += record.total_interactions;
    }
    totals
        .into_iter()
        .map(|(region, total_interactions)| RegionTotal {
            region: region.to_string(),
            total_interactions,
        })
        .collect()
}

/// Conversations per (region, weekday) cell.
pub fn weekday_heatmap(records: &[&Record]) -> Heatmap {
    let mut rows: BTreeMap<&str, [u64; 7]> = BTreeMap::new();
    for record in records {
        let col = record.date.weekday().num_days_from_monday() as usize;
        rows.entry(record.region.as_str()).or_insert([0; 7])[col] += record.total_conversations;
    }

    Heatmap {
        x: WEEKDAYS.iter().map(|d| d.to_string()).collect(),
        y: rows.keys().map(|r| r.to_string()).collect(),
        z: rows.values().map(|cells| cells.to_vec()).collect(),
    }
}

/// The pipeline bound to one immutable dataset.
#[derive(Debug, Clone)]
pub struct Pipeline {
    dataset: Arc<Dataset>,
}

impl Pipeline {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Criteria spanning the whole dataset with no region or feedback filter.
    pub fn default_criteria(&self) -> FilterCriteria {
        let (start, end) = self.dataset.date_range();
        FilterCriteria::between(start, end)
    }

    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<&Record> {
        apply_filters(self.dataset.records(), criteria)
    }

    /// Recompute every view for `criteria`.
    pub fn run(&self, criteria: &FilterCriteria) -> DashboardView {
        let rows = self.filter(criteria);
        tracing::debug!(
            start = %criteria.start_date,
            end = %criteria.end_date,
            regions = criteria.regions.len(),
            feedback = criteria.feedback.len(),
            matched = rows.len(),
            "Pipeline run"
        );

        DashboardView {
            criteria: criteria.clone(),
            matched_rows: rows.len(),
            daily: aggregate_by_day(&rows),
            summary: compute_summary(&rows),
            feedback: feedback_distribution(&rows),
            regions: region_totals(&rows),
            heatmap: weekday_heatmap(&rows),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn record(date: NaiveDate, region: &str, feedback: Feedback) -> Record {
        Record {
            date,
            region: region.into(),
            feedback,
            responses: 10,
            avg_conversations_per_day: 4.0,
            total_interactions: 100,
            avg_chat_duration: 5.0,
            conversation_rating: 4.0,
            total_conversations: 8,
            estimated_conversation_minutes: 6.0,
            avg_messages_per_conversation: 7.0,
            daily_demand: 3,
            weekly_demand: 21,
            response_accuracy: 0.9,
            top_words: "ajuda pedido".into(),
        }
    }

    /// Three positive rows on 2024-01-01 and two negative rows on 2024-01-02.
    pub fn scenario() -> Vec<Record> {
        let mut rows = Vec::new();
        for region in ["Bahia", "Ceará", "Bahia"] {
            rows.push(record(date(2024, 1, 1), region, Feedback::Positivo));
        }
        for region in ["São Paulo", "Bahia"] {
            rows.push(record(date(2024, 1, 2), region, Feedback::Negativo));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_feedback_filter_scenario() {
        let records = scenario();
        let criteria = FilterCriteria::between(date(2024, 1, 1), date(2024, 1, 2))
            .with_feedback([Feedback::Positivo]);

        let filtered = apply_filters(&records, &criteria);
        assert_eq!(filtered.len(), 3);

        let daily = aggregate_by_day(&filtered);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].date, date(2024, 1, 1));

        assert_eq!(
            feedback_distribution(&filtered),
            vec![(Feedback::Positivo, 3)]
        );
    }

    #[test]
    fn test_filter_output_satisfies_predicates() {
        let records = scenario();
        let criteria = FilterCriteria::between(date(2024, 1, 2), date(2024, 1, 2))
            .with_regions(["Bahia", "Ceará"]);

        let filtered = apply_filters(&records, &criteria);
        assert_eq!(filtered.len(), 1);
        for record in &filtered {
            assert!(records.iter().any(|r| std::ptr::eq(r, *record)));
            assert!(criteria.matches(record));
        }
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = scenario();
        let criteria = FilterCriteria::between(date(2024, 1, 1), date(2024, 1, 2))
            .with_regions(["Bahia"])
            .with_feedback([Feedback::Positivo, Feedback::Negativo]);

        let once = apply_filters(&records, &criteria);
        let twice = apply_filters(once.iter().copied(), &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_preserves_order() {
        let records = scenario();
        let criteria =
            FilterCriteria::between(date(2024, 1, 1), date(2024, 1, 2)).with_regions(["Bahia"]);
        let filtered = apply_filters(&records, &criteria);
        let dates: Vec<NaiveDate> = filtered.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![date(2024, 1, 1), date(2024, 1, 1), date(2024, 1, 2)]
        );
    }

    #[test]
    fn test_empty_sets_equal_date_only_filter() {
        let records = scenario();
        let date_only = FilterCriteria::between(date(2024, 1, 2), date(2024, 1, 2));
        let with_empty_sets = date_only
            .clone()
            .with_regions(Vec::<String>::new())
            .with_feedback(Vec::new());

        let a = apply_filters(&records, &date_only);
        let b = apply_filters(&records, &with_empty_sets);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_single_day_without_matches() {
        let records = scenario();
        let criteria = FilterCriteria::between(date(2024, 1, 5), date(2024, 1, 5));

        let filtered = apply_filters(&records, &criteria);
        assert!(filtered.is_empty());
        assert!(aggregate_by_day(&filtered).is_empty());
        assert!(compute_summary(&filtered).is_none());
        assert!(feedback_distribution(&filtered).is_empty());
        assert!(region_totals(&filtered).is_empty());
        assert!(weekday_heatmap(&filtered).z.is_empty());
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let records = scenario();
        let criteria = FilterCriteria::between(date(2024, 1, 2), date(2024, 1, 1));
        assert!(apply_filters(&records, &criteria).is_empty());
    }

    #[test]
    fn test_aggregate_sums_and_means() {
        let mut a = record(date(2024, 3, 1), "Bahia", Feedback::Positivo);
        a.responses = 10;
        a.total_interactions = 50;
        a.avg_chat_duration = 4.0;
        a.conversation_rating = 3.0;
        let mut b = record(date(2024, 3, 1), "Ceará", Feedback::Neutro);
        b.responses = 30;
        b.total_interactions = 70;
        b.avg_chat_duration = 8.0;
        b.conversation_rating = 5.0;
        let c = record(date(2024, 2, 29), "Bahia", Feedback::Neutro);

        let records = [a, b, c];
        let refs: Vec<&Record> = records.iter().collect();
        let daily = aggregate_by_day(&refs);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, date(2024, 2, 29));
        assert_eq!(daily[1].row_count, 2);
        assert_eq!(daily[1].responses, 40);
        assert_eq!(daily[1].total_interactions, 120);
        assert_eq!(daily[1].total_conversations, 16);
        assert!((daily[1].avg_chat_duration - 6.0).abs() < 1e-9);
        assert!((daily[1].conversation_rating - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_distribution_sums_to_input_len() {
        let records = scenario();
        let refs: Vec<&Record> = records.iter().collect();
        let dist = feedback_distribution(&refs);
        assert_eq!(dist.iter().map(|(_, c)| c).sum::<usize>(), refs.len());
        assert_eq!(dist[0], (Feedback::Positivo, 3));
        assert_eq!(dist[1], (Feedback::Negativo, 2));
    }

    #[test]
    fn test_compute_summary_means() {
        let mut a = record(date(2024, 1, 1), "Bahia", Feedback::Positivo);
        a.estimated_conversation_minutes = 5.0;
        a.avg_messages_per_conversation = 6.0;
        let mut b = a.clone();
        b.estimated_conversation_minutes = 8.5;
        b.avg_messages_per_conversation = 9.0;

        let records = [a, b];
        let refs: Vec<&Record> = records.iter().collect();
        let summary = compute_summary(&refs).unwrap();
        assert!((summary.mean_conversation_duration - 6.75).abs() < 1e-9);
        assert!((summary.mean_messages_per_conversation - 7.5).abs() < 1e-9);
        assert_eq!(summary.duration_text(), "6.75 min");
        assert_eq!(summary.messages_text(), "7.50");
        assert_eq!(
            summary.duration_display(),
            DurationDisplay {
                minutes: 6,
                seconds: 45
            }
        );
    }

    #[test]
    fn test_duration_display_carries_seconds() {
        assert_eq!(
            DurationDisplay::from_minutes(2.999),
            DurationDisplay {
                minutes: 3,
                seconds: 0
            }
        );
        assert_eq!(DurationDisplay::from_minutes(0.5).to_string(), "0 min 30 s");
    }

    #[test]
    fn test_region_totals() {
        let records = scenario();
        let refs: Vec<&Record> = records.iter().collect();
        let totals = region_totals(&refs);
        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0].region, "Bahia");
        assert_eq!(totals[0].total_interactions, 300);
    }

    #[test]
    fn test_weekday_heatmap() {
        // 2024-01-01 was a Monday.
        let records = scenario();
        let refs: Vec<&Record> = records.iter().collect();
        let heatmap = weekday_heatmap(&refs);
        assert_eq!(heatmap.x.len(), 7);
        assert_eq!(heatmap.y, vec!["Bahia", "Ceará", "São Paulo"]);
        assert_eq!(heatmap.z[0][0], 16);
        assert_eq!(heatmap.z[0][1], 8);
        assert_eq!(heatmap.z[2][1], 8);
    }

    #[test]
    fn test_pipeline_run_default_criteria() {
        let dataset = Arc::new(Dataset::from_records(scenario()).unwrap());
        let pipeline = Pipeline::new(dataset);
        let criteria = pipeline.default_criteria();
        assert_eq!(criteria.start_date, date(2024, 1, 1));
        assert_eq!(criteria.end_date, date(2024, 1, 2));

        let view = pipeline.run(&criteria);
        assert_eq!(view.matched_rows, 5);
        assert_eq!(view.daily.len(), 2);
        assert!(view.summary.is_some());
        assert_eq!(view.feedback.len(), 2);
    }
}
