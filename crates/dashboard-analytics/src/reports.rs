//! Markdown report generation from a pipeline run.

use crate::pipeline::DashboardView;

/// Report generator for creating markdown summaries.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Generate a report for one filtered view.
    pub fn markdown(view: &DashboardView) -> String {
        let criteria = &view.criteria;
        let mut report = String::new();

        report.push_str(&format!(
            "# Chatbot Usage Report\n\n**{} - {}**\n\n",
            criteria.start_date.format("%d/%m/%Y"),
            criteria.end_date.format("%d/%m/%Y")
        ));

        if !criteria.regions.is_empty() {
            let regions: Vec<&str> = criteria.regions.iter().map(String::as_str).collect();
            report.push_str(&format!("- **Regions:** {}\n", regions.join(", ")));
        }
        if !criteria.feedback.is_empty() {
            let labels: Vec<&str> = criteria.feedback.iter().map(|f| f.as_str()).collect();
            report.push_str(&format!("- **Feedback:** {}\n", labels.join(", ")));
        }

        // Overview.
        let total_responses: u64 = view.daily.iter().map(|d| d.responses).sum();
        let total_interactions: u64 = view.daily.iter().map(|d| d.total_interactions).sum();
        let total_conversations: u64 = view.daily.iter().map(|d| d.total_conversations).sum();

        report.push_str("\n## Overview\n\n");
        report.push_str(&format!("- **Rows:** {}\n", view.matched_rows));
        report.push_str(&format!("- **Active Days:** {}\n", view.daily.len()));
        report.push_str(&format!("- **Responses:** {}\n", total_responses));
        report.push_str(&format!("- **Interactions:** {}\n", total_interactions));
        report.push_str(&format!("- **Conversations:** {}\n", total_conversations));

        match &view.summary {
            Some(summary) => {
                report.push_str(&format!(
                    "- **Avg Conversation Time:** {} ({})\n",
                    summary.duration_text(),
                    summary.duration_display()
                ));
                report.push_str(&format!(
                    "- **Avg Messages per Conversation:** {}\n\n",
                    summary.messages_text()
                ));
            }
            None => report.push_str("- **Averages:** no data\n\n"),
        }

        if view.daily.is_empty() {
            report.push_str("_No records match the selected filters._\n");
            return report;
        }

        // Daily breakdown table.
        report.push_str("## Daily Breakdown\n\n");
        report.push_str("| Day | Responses | Interactions | Conversations | Avg Chat | Rating |\n");
        report.push_str("|-----|-----------|--------------|---------------|----------|--------|\n");
        for day in &view.daily {
            report.push_str(&format!(
                "| {} | {} | {} | {} | {:.2} | {:.2} |\n",
                day.date.format("%Y-%m-%d"),
                day.responses,
                day.total_interactions,
                day.total_conversations,
                day.avg_chat_duration,
                day.conversation_rating,
            ));
        }
        report.push('\n');

        // Feedback.
        report.push_str("## Feedback\n\n");
        for (label, count) in &view.feedback {
            let share = *count as f64 / view.matched_rows as f64 * 100.0;
            report.push_str(&format!("- `{}` - {} ({:.1}%)\n", label, count, share));
        }
        report.push('\n');

        // Top regions.
        let mut regions: Vec<_> = view.regions.iter().collect();
        regions.sort_by(|a, b| b.total_interactions.cmp(&a.total_interactions));
        report.push_str("## Top Regions\n\n");
        for (i, region) in regions.iter().take(10).enumerate() {
            report.push_str(&format!(
                "{}. {} - {} interactions\n",
                i + 1,
                region.region,
                region.total_interactions
            ));
        }
        report.push('\n');

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::*;
    use crate::pipeline::Pipeline;
    use dashboard_core::types::{Feedback, FilterCriteria};
    use dashboard_core::Dataset;
    use std::sync::Arc;

    fn pipeline() -> Pipeline {
        Pipeline::new(Arc::new(Dataset::from_records(scenario()).unwrap()))
    }

    #[test]
    fn test_report_structure() {
        let pipeline = pipeline();
        let view = pipeline.run(&pipeline.default_criteria());
        let report = ReportGenerator::markdown(&view);

        assert!(report.contains("# Chatbot Usage Report"));
        assert!(report.contains("01/01/2024 - 02/01/2024"));
        assert!(report.contains("## Overview"));
        assert!(report.contains("- **Rows:** 5"));
        assert!(report.contains("## Daily Breakdown"));
        assert!(report.contains("| 2024-01-01 | 30 |"));
        assert!(report.contains("`positivo` - 3 (60.0%)"));
        assert!(report.contains("1. Bahia - 300 interactions"));
    }

    #[test]
    fn test_report_lists_active_filters() {
        let pipeline = pipeline();
        let criteria = pipeline
            .default_criteria()
            .with_regions(["Bahia"])
            .with_feedback([Feedback::Negativo]);
        let report = ReportGenerator::markdown(&pipeline.run(&criteria));

        assert!(report.contains("- **Regions:** Bahia"));
        assert!(report.contains("- **Feedback:** negativo"));
        assert!(report.contains("- **Rows:** 1"));
    }

    #[test]
    fn test_empty_report() {
        let pipeline = pipeline();
        let criteria = FilterCriteria::between(date(2024, 2, 1), date(2024, 2, 1));
        let report = ReportGenerator::markdown(&pipeline.run(&criteria));

        assert!(report.contains("no data"));
        assert!(report.contains("No records match"));
        assert!(!report.contains("## Daily Breakdown"));
    }
}
