use std::fmt::Write;

use serde::Serialize;

use crate::aggregate::{self, AggregateOptions};
use crate::filter::{self, FilterOptions, FilterSpec};
use crate::models::{AggregateReport, CountEntry, DerivedRequest};

const NO_MATCHES: &str = "No data matches your current filter selection. Please adjust the filters.";

/// Everything a front end needs to draw the dashboard for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub source: String,
    pub filter: FilterSpec,
    pub options: FilterOptions,
    pub restricted: bool,
    pub rows: Vec<DerivedRequest>,
    pub report: AggregateReport,
}

impl DashboardView {
    pub fn build(
        source: impl Into<String>,
        rows: &[DerivedRequest],
        spec: FilterSpec,
        options: &AggregateOptions,
    ) -> Self {
        let selection = filter::apply(rows, &spec);
        if selection.is_empty() && selection.restricted {
            tracing::info!("no rows match the current filters");
        }
        let report = aggregate::aggregate(&selection.rows, options);

        Self {
            source: source.into(),
            options: FilterOptions::from_rows(rows),
            restricted: selection.restricted,
            rows: selection.rows.into_iter().cloned().collect(),
            report,
            filter: spec,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn cell(value: &str) -> String {
    value.replace('|', "\\|")
}

fn write_counts(output: &mut String, entries: &[CountEntry], unit: &str) {
    for entry in entries {
        let label = if entry.label.is_empty() {
            "(blank)"
        } else {
            entry.label.as_str()
        };
        let _ = writeln!(output, "- {}: {} {}", label, entry.count, unit);
    }
}

/// Headline tiles and quick statistics, for terminal output.
pub fn summarize(view: &DashboardView) -> String {
    let mut output = String::new();

    if view.is_empty() {
        let _ = writeln!(output, "{NO_MATCHES}");
        return output;
    }

    let headline = &view.report.headline;
    let _ = writeln!(output, "Total Items: {}", headline.total);
    let _ = writeln!(output, "Budget Evaluation: {}", headline.budget_evaluation);
    let _ = writeln!(output, "Evaluating: {}", headline.evaluating);
    let _ = writeln!(output, "In Progress: {}", headline.in_progress);
    let _ = writeln!(output);
    write_quick_stats(&mut output, &view.report);
    output
}

fn write_quick_stats(output: &mut String, report: &AggregateReport) {
    let _ = writeln!(output, "Quarterly Distribution:");
    write_counts(output, &report.bucket_counts, "items");

    let _ = writeln!(output);
    let _ = writeln!(output, "Top Tools:");
    if report.top_tools.is_empty() {
        let _ = writeln!(output, "- none recorded");
    } else {
        write_counts(output, &report.top_tools, "requests");
    }

    if let Some(stats) = report.priority_stats {
        let _ = writeln!(output);
        let _ = writeln!(output, "Priority Insights:");
        let _ = writeln!(output, "- Average Priority: {:.1}", stats.mean);
        let _ = writeln!(output, "- High Priority Items: {}", stats.above_mean_count);
    }
}

pub fn build_report(view: &DashboardView) -> String {
    let mut output = String::new();
    let report = &view.report;

    let _ = writeln!(output, "# Strategic Priorities Roadmap");
    let _ = writeln!(output, "Generated from {}", view.source);
    if view.restricted {
        let _ = writeln!(output, "{}", describe_filter(&view.filter));
    }
    let _ = writeln!(output);

    if view.is_empty() {
        let _ = writeln!(output, "{NO_MATCHES}");
        return output;
    }

    let headline = &report.headline;
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "| Total Items | Budget Evaluation | Evaluating | In Progress |");
    let _ = writeln!(output, "|---|---|---|---|");
    let _ = writeln!(
        output,
        "| {} | {} | {} | {} |",
        headline.total, headline.budget_evaluation, headline.evaluating, headline.in_progress
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Timeline");
    if report.chart_rows.is_empty() {
        let _ = writeln!(output, "No items have a recognised quarter to place on the timeline.");
    } else {
        for row in &report.chart_rows {
            let _ = writeln!(
                output,
                "- {} ({} to {}) {} / {} / {}",
                row.label,
                row.start,
                row.end,
                row.stakeholder,
                row.status,
                row.tool_name
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Distribution");
    write_counts(&mut output, &report.status_counts, "items");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Stakeholder Breakdown");
    write_counts(&mut output, &report.stakeholder_counts, "requests");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Detailed View");
    let _ = writeln!(
        output,
        "| Name | Requesting Stakeholder | Timeline | Tool Name | Status | Total Priority Score |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|");
    for row in &view.rows {
        let request = &row.request;
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} |",
            cell(&request.name),
            cell(&request.stakeholder),
            cell(&request.time_bucket),
            cell(&request.tool_name),
            cell(&request.status),
            cell(&request.priority_score_raw)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Quick Statistics");
    write_quick_stats(&mut output, report);

    output
}

fn describe_filter(spec: &FilterSpec) -> String {
    let mut parts = Vec::new();
    if let Some(bucket) = spec.active_time_bucket() {
        parts.push(format!("quarter {bucket}"));
    }
    if let Some(statuses) = spec.active_statuses() {
        let joined: Vec<&str> = statuses.iter().map(String::as_str).collect();
        parts.push(format!("status {}", joined.join(", ")));
    }
    if let Some(stakeholder) = spec.active_stakeholder() {
        parts.push(format!("stakeholder {stakeholder}"));
    }
    format!("Filtered by {}", parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::{derive, request};

    fn rows() -> Vec<DerivedRequest> {
        let mut first = request("Contract | summarizer", "Q1 2025", "In Progress");
        first.stakeholder = "Legal".to_string();
        first.tool_name = "DocBot".to_string();
        first.priority_score_raw = "40".to_string();

        let mut second = request("Forecast assistant", "Q5 2099", "Budget Evaluation");
        second.stakeholder = "Finance".to_string();
        second.priority_score_raw = "20".to_string();

        vec![derive(first), derive(second)]
    }

    #[test]
    fn report_contains_every_section() {
        let view = DashboardView::build(
            "pipeline.xlsx",
            &rows(),
            FilterSpec::default(),
            &AggregateOptions::default(),
        );
        let report = build_report(&view);

        assert!(report.contains("Generated from pipeline.xlsx"));
        assert!(report.contains("| 2 | 1 | 0 | 1 |"));
        assert!(report.contains("- Contract | summarizer (2024-12-31 to 2025-03-31) Legal / In Progress / DocBot"));
        assert!(!report.contains("Forecast assistant (")); // no schedule
        assert!(report.contains("| Contract \\| summarizer | Legal |"));
        assert!(report.contains("- Q1 2025: 1 items"));
        assert!(report.contains("- DocBot: 1 requests"));
        assert!(report.contains("- Average Priority: 30.0"));
        assert!(report.contains("- High Priority Items: 1"));
        assert!(!report.contains("Filtered by"));
    }

    #[test]
    fn empty_selection_reports_no_matches() {
        let filter = FilterSpec {
            stakeholder: Some("Marketing".to_string()),
            ..FilterSpec::default()
        };
        let view = DashboardView::build("pipeline.xlsx", &rows(), filter, &AggregateOptions::default());

        assert!(view.is_empty());
        assert!(view.restricted);
        let report = build_report(&view);
        assert!(report.contains("Filtered by stakeholder Marketing"));
        assert!(report.contains(NO_MATCHES));
        assert_eq!(summarize(&view), format!("{NO_MATCHES}\n"));
    }

    #[test]
    fn filter_description_skips_unrestricted_dimensions() {
        let spec = FilterSpec {
            time_bucket: Some(filter::ALL.to_string()),
            statuses: Some(["Planning", "On Hold"].iter().map(|s| s.to_string()).collect()),
            stakeholder: Some("Legal".to_string()),
        };
        assert_eq!(
            describe_filter(&spec),
            "Filtered by status On Hold, Planning; stakeholder Legal"
        );

        let spec = FilterSpec {
            time_bucket: Some("Q2 2025".to_string()),
            statuses: Some([filter::ALL, "Planning"].iter().map(|s| s.to_string()).collect()),
            stakeholder: None,
        };
        assert_eq!(describe_filter(&spec), "Filtered by quarter Q2 2025");
    }

    #[test]
    fn summary_lists_headline_and_stats() {
        let view = DashboardView::build(
            "pipeline.csv",
            &rows(),
            FilterSpec::default(),
            &AggregateOptions::default(),
        );
        let summary = summarize(&view);
        assert!(summary.starts_with("Total Items: 2\nBudget Evaluation: 1\n"));
        assert!(summary.contains("- Q5 2099: 1 items"));
    }

    #[test]
    fn view_serializes_for_front_ends() {
        let view = DashboardView::build(
            "pipeline.csv",
            &rows(),
            FilterSpec::default(),
            &AggregateOptions::default(),
        );
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["report"]["total_count"], 2);
        assert_eq!(json["rows"][0]["name"], "Contract | summarizer");
        assert_eq!(json["rows"][0]["schedule"]["start"], "2024-12-31");
        assert_eq!(json["rows"][1]["schedule"], serde_json::Value::Null);
        assert_eq!(json["report"]["chart_rows"][0]["color"], "#32CD32");
        assert_eq!(json["options"]["stakeholders"][0], "All");
    }
}
