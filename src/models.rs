use chrono::NaiveDate;
use serde::Serialize;

/// One cleaned row of the request pipeline sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub name: String,
    pub stakeholder: String,
    pub tool_name: String,
    pub status: String,
    pub time_bucket: String,
    pub priority_score_raw: String,
}

/// Start and end of a timeline bar. Both dates exist or neither does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRequest {
    #[serde(flatten)]
    pub request: Request,
    pub schedule: Option<Schedule>,
    pub color: &'static str,
    pub priority_score: Option<f64>,
}

impl DerivedRequest {
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.schedule.map(|schedule| schedule.start)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.schedule.map(|schedule| schedule.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriorityStats {
    pub mean: f64,
    pub above_mean_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Headline {
    pub total: usize,
    pub budget_evaluation: usize,
    pub evaluating: usize,
    pub in_progress: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub label: String,
    pub full_name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub stakeholder: String,
    pub status: String,
    pub tool_name: String,
    pub time_bucket: String,
    pub color: &'static str,
    pub lane_color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AggregateReport {
    pub total_count: usize,
    pub headline: Headline,
    pub status_counts: Vec<CountEntry>,
    pub stakeholder_counts: Vec<CountEntry>,
    pub bucket_counts: Vec<CountEntry>,
    pub top_tools: Vec<CountEntry>,
    pub priority_stats: Option<PriorityStats>,
    pub chart_rows: Vec<ChartRow>,
}
