use crate::domain::{StatisticsSummary, ValidationReport};

/// Format a rate as `12.34%`.
pub fn format_percent(rate: f64) -> String {
    format!("{:.2}%", rate)
}

/// Render a boolean sub-check as a report cell; missing checks render empty.
pub fn format_check(check: Option<bool>) -> String {
    check.map(|passed| passed.to_string()).unwrap_or_default()
}

/// Pretty JSON rendering of the full report.
pub fn render_report_json(report: &ValidationReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Render the statistics table shown to reviewers.
pub fn render_statistics_md(report: &ValidationReport) -> String {
    let stats: &StatisticsSummary = &report.statistics;
    let mut out = String::new();
    out.push_str("# Validation Statistics\n\n");
    out.push_str(&format!("- run: `{}`\n", report.run_id));
    out.push_str(&format!("- suite digest: `{}`\n", report.suite_digest));
    out.push_str(&format!(
        "- cases: {} passed, {} failed\n\n",
        report.passed_count(),
        report.failed_count()
    ));

    out.push_str("| Metric | Value |\n|---|---|\n");
    out.push_str(&format!(
        "| Trend checks passed | {} |\n",
        format_percent(stats.trend_pass_rate)
    ));
    out.push_str(&format!(
        "| Linkage checks passed | {} |\n",
        format_percent(stats.linkage_pass_rate)
    ));
    out.push_str(&format!(
        "| Trend checks failed | {} |\n",
        format_percent(stats.trend_fail_rate)
    ));
    out.push_str(&format!(
        "| Linkage checks failed | {} |\n",
        format_percent(stats.linkage_fail_rate)
    ));
    out.push_str(&format!(
        "| Mean relative error | {:.2} |\n",
        stats.mean_relative_error
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn sample_report() -> ValidationReport {
        let at = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .expect("parse RFC3339")
            .with_timezone(&Utc);
        ValidationReport {
            run_id: Uuid::parse_str("11111111-1111-1111-1111-111111111111").expect("valid UUID"),
            suite_digest: "abc".to_string(),
            started_at: at,
            finished_at: at,
            qualitative: vec![],
            quantitative: vec![],
            statistics: StatisticsSummary {
                qualitative_total: 2,
                trend_passed: 1,
                trend_failed: 1,
                linkage_passed: 2,
                linkage_failed: 0,
                trend_pass_rate: 50.0,
                linkage_pass_rate: 100.0,
                trend_fail_rate: 50.0,
                linkage_fail_rate: 0.0,
                quantitative_total: 1,
                mean_relative_error: 3.456,
            },
        }
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(50.0), "50.00%");
        assert_eq!(format_percent(33.3333), "33.33%");
    }

    #[test]
    fn statistics_markdown_render_is_stable() {
        let actual = render_statistics_md(&sample_report());
        let expected = "# Validation Statistics\n\n- run: `11111111-1111-1111-1111-111111111111`\n- suite digest: `abc`\n- cases: 0 passed, 0 failed\n\n| Metric | Value |\n|---|---|\n| Trend checks passed | 50.00% |\n| Linkage checks passed | 100.00% |\n| Trend checks failed | 50.00% |\n| Linkage checks failed | 0.00% |\n| Mean relative error | 3.46 |\n";
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_format_check() {
        assert_eq!(format_check(Some(true)), "true");
        assert_eq!(format_check(Some(false)), "false");
        assert_eq!(format_check(None), "");
    }

    #[test]
    fn report_json_has_expected_keys() {
        let json = render_report_json(&sample_report()).expect("render");
        let raw: serde_json::Value = serde_json::from_str(&json).expect("json");
        let obj = raw.as_object().expect("report object");
        for key in ["run_id", "suite_digest", "started_at", "qualitative", "quantitative", "statistics"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(raw["statistics"]["trend_pass_rate"], serde_json::json!(50.0));
    }
}
