use std::collections::HashMap;

use crate::derive::quarter_order;
use crate::models::{AggregateReport, ChartRow, CountEntry, DerivedRequest, Headline, PriorityStats};

pub const DEFAULT_LABEL_MAX_CHARS: usize = 50;
pub const DEFAULT_TOP_TOOLS_LIMIT: usize = 5;

const ELLIPSIS: &str = "...";

/// Qualitative palette for stakeholder lanes, assigned in order of first appearance.
const LANE_PALETTE: [&str; 12] = [
    "#8DD3C7", "#FFFFB3", "#BEBADA", "#FB8072", "#80B1D3", "#FDB462", "#B3DE69", "#FCCDE5",
    "#D9D9D9", "#BC80BD", "#CCEBC5", "#FFED6F",
];
const LANE_FALLBACK: &str = "#1f77b4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub label_max_chars: usize,
    pub top_tools_limit: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            label_max_chars: DEFAULT_LABEL_MAX_CHARS,
            top_tools_limit: DEFAULT_TOP_TOOLS_LIMIT,
        }
    }
}

/// Counts labels, keeping the order in which each label was first seen.
fn tally<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<CountEntry> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<CountEntry> = Vec::new();

    for label in labels {
        match index.get(label) {
            Some(&position) => entries[position].count += 1,
            None => {
                index.insert(label, entries.len());
                entries.push(CountEntry {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    entries
}

fn by_count_then_label(mut entries: Vec<CountEntry>) -> Vec<CountEntry> {
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    entries
}

pub fn status_counts(rows: &[&DerivedRequest]) -> Vec<CountEntry> {
    by_count_then_label(tally(rows.iter().map(|row| row.request.status.as_str())))
}

pub fn stakeholder_counts(rows: &[&DerivedRequest]) -> Vec<CountEntry> {
    by_count_then_label(tally(
        rows.iter().map(|row| row.request.stakeholder.as_str()),
    ))
}

/// Quarter labels in calendar order; labels that are not `Qn YYYY` trail, sorted by text.
pub fn bucket_counts(rows: &[&DerivedRequest]) -> Vec<CountEntry> {
    let mut entries = tally(rows.iter().map(|row| row.request.time_bucket.as_str()));
    entries.sort_by(|a, b| {
        let key_a = quarter_order(&a.label);
        let key_b = quarter_order(&b.label);
        key_a
            .is_none()
            .cmp(&key_b.is_none())
            .then(key_a.cmp(&key_b))
            .then_with(|| a.label.cmp(&b.label))
    });
    entries
}

pub fn top_tools(rows: &[&DerivedRequest], limit: usize) -> Vec<CountEntry> {
    let mut entries = tally(
        rows.iter()
            .map(|row| row.request.tool_name.as_str())
            .filter(|tool| !tool.is_empty()),
    );
    // stable sort keeps first-seen order among equal counts
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(limit);
    entries
}

pub fn priority_stats(rows: &[&DerivedRequest]) -> Option<PriorityStats> {
    let scores: Vec<f64> = rows.iter().filter_map(|row| row.priority_score).collect();
    if scores.is_empty() {
        return None;
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let above_mean_count = scores.iter().filter(|score| **score > mean).count();
    Some(PriorityStats {
        mean,
        above_mean_count,
    })
}

/// Headline tiles read from an existing status tally.
pub fn headline(total: usize, status_counts: &[CountEntry]) -> Headline {
    let count = |status: &str| {
        status_counts
            .iter()
            .find(|entry| entry.label == status)
            .map_or(0, |entry| entry.count)
    };

    Headline {
        total,
        budget_evaluation: count("Budget Evaluation"),
        evaluating: count("Evaluating"),
        in_progress: count("In Progress"),
    }
}

pub fn truncate_label(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let mut label: String = name.chars().take(max_chars).collect();
    label.push_str(ELLIPSIS);
    label
}

pub fn chart_rows(rows: &[&DerivedRequest], label_max_chars: usize) -> Vec<ChartRow> {
    let mut lanes: HashMap<&str, &'static str> = HashMap::new();

    rows.iter()
        .filter_map(|row| {
            let (start, end) = (row.start_date()?, row.end_date()?);
            let request = &row.request;
            let next_lane = lanes.len();
            let lane_color = *lanes
                .entry(request.stakeholder.as_str())
                .or_insert_with(|| LANE_PALETTE.get(next_lane).copied().unwrap_or(LANE_FALLBACK));

            Some(ChartRow {
                label: truncate_label(&request.name, label_max_chars),
                full_name: request.name.clone(),
                start,
                end,
                stakeholder: request.stakeholder.clone(),
                status: request.status.clone(),
                tool_name: request.tool_name.clone(),
                time_bucket: request.time_bucket.clone(),
                color: row.color,
                lane_color,
            })
        })
        .collect()
}

pub fn aggregate(rows: &[&DerivedRequest], options: &AggregateOptions) -> AggregateReport {
    let status_counts = status_counts(rows);
    let report = AggregateReport {
        total_count: rows.len(),
        headline: headline(rows.len(), &status_counts),
        status_counts,
        stakeholder_counts: stakeholder_counts(rows),
        bucket_counts: bucket_counts(rows),
        top_tools: top_tools(rows, options.top_tools_limit),
        priority_stats: priority_stats(rows),
        chart_rows: chart_rows(rows, options.label_max_chars),
    };
    tracing::debug!(
        total = report.total_count,
        charted = report.chart_rows.len(),
        "aggregated selection"
    );
    report
}
