//! Industry-average salary lookup.

use jobmatch_common::{PredictSalaryRequest, PredictSalaryResponse};

/// Salary returned for titles not in the table.
pub const DEFAULT_SALARY: u64 = 100_000;

const TITLE_AVERAGES: &[(&str, u64)] = &[
    ("software engineer", 130_000),
    ("senior software engineer", 165_000),
    ("staff software engineer", 200_000),
    ("principal engineer", 230_000),
    ("data scientist", 140_000),
    ("senior data scientist", 170_000),
    ("machine learning engineer", 155_000),
    ("senior machine learning engineer", 185_000),
    ("product manager", 145_000),
    ("senior product manager", 175_000),
    ("frontend developer", 110_000),
    ("backend developer", 125_000),
    ("full stack developer", 130_000),
    ("devops engineer", 135_000),
    ("data analyst", 85_000),
    ("business analyst", 90_000),
    ("ux designer", 105_000),
];

pub fn predict_salary(request: &PredictSalaryRequest) -> PredictSalaryResponse {
    let (predicted_salary, confidence_interval) = match lookup(&request.job_title) {
        Some(average) => (average, percent_interval(average, 85, 115)),
        None => (DEFAULT_SALARY, default_interval()),
    };

    PredictSalaryResponse {
        predicted_salary,
        confidence_interval,
        comparable_jobs: vec![],
        method: Some("industry_average".to_string()),
    }
}

pub(super) fn default_interval() -> [u64; 2] {
    percent_interval(DEFAULT_SALARY, 70, 130)
}

/// Longest table title contained in the normalized `title`.
fn lookup(title: &str) -> Option<u64> {
    let normalized = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    TITLE_AVERAGES
        .iter()
        .filter(|(key, _)| normalized.contains(key))
        .max_by_key(|(key, _)| key.len())
        .map(|(_, average)| *average)
}

fn percent_interval(value: u64, low_pct: u64, high_pct: u64) -> [u64; 2] {
    [value * low_pct / 100, value * high_pct / 100]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predict(title: &str) -> PredictSalaryResponse {
        predict_salary(&PredictSalaryRequest {
            job_title: title.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_known_title_uses_narrow_interval() {
        let response = predict("Data Scientist");
        assert_eq!(response.predicted_salary, 140_000);
        assert_eq!(response.confidence_interval, [119_000, 161_000]);
        assert_eq!(response.method.as_deref(), Some("industry_average"));
    }

    #[test]
    fn test_longest_contained_title_wins() {
        assert_eq!(predict("  Senior   Software Engineer II ").predicted_salary, 165_000);
        assert_eq!(predict("Lead software engineer, payments").predicted_salary, 130_000);
    }

    #[test]
    fn test_unknown_title_uses_default_tuple() {
        let response = predict("Chief Vibes Officer");
        assert_eq!(response.predicted_salary, DEFAULT_SALARY);
        assert_eq!(response.confidence_interval, [70_000, 130_000]);
        assert!(response.comparable_jobs.is_empty());
    }

    #[test]
    fn test_empty_title_uses_default() {
        assert_eq!(predict("   ").predicted_salary, DEFAULT_SALARY);
    }
}
