use chrono::{Months, NaiveDate};

use crate::models::{DerivedRequest, Request, Schedule};

pub const DEFAULT_COLOR: &str = "#D3D3D3";

/// Every bar spans the three calendar months before the quarter end.
const SCHEDULE_SPAN: Months = Months::new(3);

pub fn quarter_end(label: &str) -> Option<NaiveDate> {
    let (year, month, day) = match label {
        "Q1 2025" => (2025, 3, 31),
        "Q2 2025" => (2025, 6, 30),
        "Q3 2025" => (2025, 9, 30),
        "Q4 2025" => (2025, 12, 31),
        "Q1 2026" => (2026, 3, 31),
        "Q2 2026" => (2026, 6, 30),
        "Q3 2026" => (2026, 9, 30),
        "Q4 2026" => (2026, 12, 31),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn status_color(status: &str) -> &'static str {
    match status {
        "Budget Evaluation" => "#FFA500",
        "Evaluating" => "#87CEEB",
        "In Progress" => "#32CD32",
        "Completed" => "#228B22",
        "On Hold" => "#FF6347",
        "Planning" => "#9370DB",
        _ => DEFAULT_COLOR,
    }
}

pub fn parse_priority(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Sort key for `Qn YYYY` labels, `(year, quarter)`.
pub fn quarter_order(label: &str) -> Option<(i32, u32)> {
    let (quarter, year) = label.trim().split_once(' ')?;
    let quarter: u32 = quarter.strip_prefix('Q')?.parse().ok()?;
    if !(1..=4).contains(&quarter) {
        return None;
    }
    let year: i32 = year.trim().parse().ok()?;
    Some((year, quarter))
}

pub fn schedule_for(time_bucket: &str) -> Option<Schedule> {
    let end = quarter_end(time_bucket)?;
    let start = end.checked_sub_months(SCHEDULE_SPAN)?;
    Some(Schedule { start, end })
}

pub fn derive(request: Request) -> DerivedRequest {
    let schedule = schedule_for(&request.time_bucket);
    let color = status_color(&request.status);
    let priority_score = parse_priority(&request.priority_score_raw);

    DerivedRequest {
        request,
        schedule,
        color,
        priority_score,
    }
}

pub fn derive_all(requests: Vec<Request>) -> Vec<DerivedRequest> {
    let derived: Vec<DerivedRequest> = requests.into_iter().map(derive).collect();
    let unscheduled = derived.iter().filter(|row| row.schedule.is_none()).count();
    tracing::debug!(rows = derived.len(), unscheduled, "derived request fields");
    derived
}

#[cfg(test)]
pub(crate) fn request(name: &str, time_bucket: &str, status: &str) -> Request {
    Request {
        name: name.to_string(),
        stakeholder: String::new(),
        tool_name: String::new(),
        status: status.to_string(),
        time_bucket: time_bucket.to_string(),
        priority_score_raw: String::new(),
    }
}
