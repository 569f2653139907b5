use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::DerivedRequest;

/// Control value meaning "do not restrict this dimension".
pub const ALL: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    pub time_bucket: Option<String>,
    pub statuses: Option<BTreeSet<String>>,
    pub stakeholder: Option<String>,
}

impl FilterSpec {
    fn active(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|value| *value != ALL)
    }

    /// Quarter restriction in force, ignoring the `All` sentinel.
    pub(crate) fn active_time_bucket(&self) -> Option<&str> {
        Self::active(&self.time_bucket)
    }

    /// Status set in force; empty sets and sets holding `All` restrict nothing.
    pub(crate) fn active_statuses(&self) -> Option<&BTreeSet<String>> {
        self.statuses
            .as_ref()
            .filter(|statuses| !statuses.is_empty() && !statuses.contains(ALL))
    }

    pub(crate) fn active_stakeholder(&self) -> Option<&str> {
        Self::active(&self.stakeholder)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.active_time_bucket().is_none()
            && self.active_statuses().is_none()
            && self.active_stakeholder().is_none()
    }

    pub fn matches(&self, row: &DerivedRequest) -> bool {
        let request = &row.request;

        if let Some(bucket) = self.active_time_bucket() {
            if request.time_bucket != bucket {
                return false;
            }
        }

        if let Some(statuses) = self.active_statuses() {
            if !statuses.contains(&request.status) {
                return false;
            }
        }

        if let Some(stakeholder) = self.active_stakeholder() {
            if request.stakeholder != stakeholder {
                return false;
            }
        }

        true
    }
}

/// Rows that passed a filter, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub rows: Vec<&'a DerivedRequest>,
    /// False when no predicate was active, so every row passed by default.
    pub restricted: bool,
}

impl Selection<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn apply<'a>(rows: &'a [DerivedRequest], spec: &FilterSpec) -> Selection<'a> {
    let restricted = !spec.is_unrestricted();
    let selected: Vec<&DerivedRequest> = rows.iter().filter(|row| spec.matches(row)).collect();
    tracing::debug!(
        input = rows.len(),
        selected = selected.len(),
        restricted,
        "applied filters"
    );

    Selection {
        rows: selected,
        restricted,
    }
}

/// Choices offered by the dashboard controls: `All` then sorted distinct values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub quarters: Vec<String>,
    pub statuses: Vec<String>,
    pub stakeholders: Vec<String>,
}

impl FilterOptions {
    pub fn from_rows(rows: &[DerivedRequest]) -> Self {
        Self {
            quarters: choices(rows, |row| row.request.time_bucket.as_str()),
            statuses: choices(rows, |row| row.request.status.as_str()),
            stakeholders: choices(rows, |row| row.request.stakeholder.as_str()),
        }
    }
}

fn choices<'a>(
    rows: &'a [DerivedRequest],
    field: impl Fn(&'a DerivedRequest) -> &'a str,
) -> Vec<String> {
    let distinct: BTreeSet<&str> = rows.iter().map(field).collect();
    std::iter::once(ALL)
        .chain(distinct)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::{derive, request};
    use proptest::prelude::*;

    fn row(name: &str, bucket: &str, status: &str, stakeholder: &str) -> DerivedRequest {
        let mut request = request(name, bucket, status);
        request.stakeholder = stakeholder.to_string();
        derive(request)
    }

    fn fixture() -> Vec<DerivedRequest> {
        vec![
            row("a", "Q1 2025", "In Progress", "Legal"),
            row("b", "Q2 2025", "Planning", "Finance"),
            row("c", "Q1 2025", "Evaluating", "Finance"),
            row("d", "Q1 2025", "In Progress", "Finance"),
        ]
    }

    fn names(selection: &Selection<'_>) -> Vec<String> {
        selection
            .rows
            .iter()
            .map(|row| row.request.name.clone())
            .collect()
    }

    fn statuses(labels: &[&str]) -> Option<BTreeSet<String>> {
        Some(labels.iter().map(|label| label.to_string()).collect())
    }

    #[test]
    fn empty_spec_passes_everything() {
        let rows = fixture();
        let selection = apply(&rows, &FilterSpec::default());
        assert_eq!(selection.rows.len(), 4);
        assert!(!selection.restricted);
    }

    #[test]
    fn all_sentinel_is_unrestricted() {
        let rows = fixture();
        let spec = FilterSpec {
            time_bucket: Some(ALL.to_string()),
            statuses: statuses(&[ALL, "Planning"]),
            stakeholder: Some(ALL.to_string()),
        };
        assert!(spec.is_unrestricted());
        assert_eq!(apply(&rows, &spec).rows.len(), rows.len());
    }

    #[test]
    fn empty_status_set_is_unrestricted() {
        let spec = FilterSpec {
            statuses: statuses(&[]),
            ..FilterSpec::default()
        };
        assert!(spec.is_unrestricted());
    }

    #[test]
    fn dimensions_combine_with_and() {
        let rows = fixture();
        let spec = FilterSpec {
            time_bucket: Some("Q1 2025".to_string()),
            statuses: statuses(&["In Progress", "Evaluating"]),
            stakeholder: Some("Finance".to_string()),
        };
        assert_eq!(names(&apply(&rows, &spec)), vec!["c", "d"]);
    }

    #[test]
    fn no_match_is_empty_but_restricted() {
        let rows = fixture();
        let spec = FilterSpec {
            stakeholder: Some("Marketing".to_string()),
            ..FilterSpec::default()
        };
        let selection = apply(&rows, &spec);
        assert!(selection.is_empty());
        assert!(selection.restricted);
    }

    #[test]
    fn options_lead_with_all_and_are_sorted() {
        let options = FilterOptions::from_rows(&fixture());
        assert_eq!(options.quarters, vec!["All", "Q1 2025", "Q2 2025"]);
        assert_eq!(
            options.statuses,
            vec!["All", "Evaluating", "In Progress", "Planning"]
        );
        assert_eq!(options.stakeholders, vec!["All", "Finance", "Legal"]);
    }

    fn arb_rows() -> impl Strategy<Value = Vec<DerivedRequest>> {
        let bucket = prop::sample::select(vec!["Q1 2025", "Q2 2025", "Q3 2026", "TBD"]);
        let status = prop::sample::select(vec!["In Progress", "Planning", "On Hold", ""]);
        let stakeholder = prop::sample::select(vec!["Legal", "Finance", ""]);
        prop::collection::vec((bucket, status, stakeholder), 0..24).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (bucket, status, stakeholder))| {
                    row(&format!("row-{i}"), bucket, status, stakeholder)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn filter_order_does_not_matter(rows in arb_rows()) {
            let by_bucket = FilterSpec {
                time_bucket: Some("Q1 2025".to_string()),
                ..FilterSpec::default()
            };
            let by_status = FilterSpec {
                statuses: statuses(&["In Progress", "On Hold"]),
                ..FilterSpec::default()
            };

            let bucket_first: Vec<DerivedRequest> = apply(&rows, &by_bucket)
                .rows
                .into_iter()
                .cloned()
                .collect();
            let bucket_then_status = names(&apply(&bucket_first, &by_status));

            let status_first: Vec<DerivedRequest> = apply(&rows, &by_status)
                .rows
                .into_iter()
                .cloned()
                .collect();
            let status_then_bucket = names(&apply(&status_first, &by_bucket));

            prop_assert_eq!(bucket_then_status, status_then_bucket);
        }
    }
}
