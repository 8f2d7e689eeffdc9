//! `report`: print a brand's summary report.

use std::fmt::Write as _;

use aeo_perception::{load_summary, DateRange, SummaryReport};

use crate::load_brand;

/// # Errors
///
/// Returns an error if the brand is unknown or a query fails.
pub(crate) async fn run_report(
    pool: &sqlx::PgPool,
    slug: &str,
    range: DateRange,
) -> anyhow::Result<()> {
    let brand = load_brand(pool, slug).await?;
    let report = load_summary(pool, brand.id, range).await?;
    print!("{}", render_report(&brand.name, &report));
    Ok(())
}

pub(crate) fn render_report(brand_name: &str, report: &SummaryReport) -> String {
    let s = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "# {brand_name} ({})", s.date_range.as_str());
    if s.total_scans == 0 {
        let _ = writeln!(out, "no completed scans in range; run `aeo-cli scan` first");
        return out;
    }

    let _ = writeln!(
        out,
        "overall {} ({:+}), quadrant {}{}",
        s.overall_score,
        s.score_change,
        s.quadrant,
        match (&s.previous_quadrant, s.quadrant_changed) {
            (Some(prev), true) => format!(" (was {prev})"),
            _ => String::new(),
        }
    );
    let _ = writeln!(
        out,
        "{} scans, last {}",
        s.total_scans,
        s.last_scan_at
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
    );

    if !report.platform_breakdown.is_empty() {
        let _ = writeln!(out, "\n{:<16}{:<8}PREVIOUS", "PLATFORM", "SCORE");
        for (platform, row) in &report.platform_breakdown {
            let previous = row
                .previous_score
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            let _ = writeln!(out, "{platform:<16}{:<8}{previous}", row.score);
        }
    }

    if !report.category_breakdown.is_empty() {
        let _ = writeln!(out, "\n{:<16}{:<8}PROMPTS", "CATEGORY", "SCORE");
        for (category, row) in &report.category_breakdown {
            let _ = writeln!(out, "{category:<16}{:<8}{}", row.score, row.count);
        }
    }

    if !report.top_insights.is_empty() {
        let _ = writeln!(out, "\ntop insights:");
        for insight in &report.top_insights {
            let _ = writeln!(out, "  [{}] {}", insight.priority, insight.title);
        }
    }

    if !report.recent_corrections.is_empty() {
        let _ = writeln!(out, "\nrecent corrections:");
        for c in &report.recent_corrections {
            let scores = match (c.pre_fix_score, c.post_fix_score) {
                (Some(pre), Some(post)) => format!(" {pre} -> {post}"),
                _ => String::new(),
            };
            let _ = writeln!(out, "  {} {}{scores}", c.problem_type, c.status);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeo_perception::report::{build_summary, ReportInputs};

    #[test]
    fn empty_report_points_at_scan_command() {
        let report = build_summary(&ReportInputs {
            range: DateRange::Week,
            scans: &[],
            latest_results: &[],
            previous_results: &[],
            insights: &[],
            corrections: &[],
        });
        let text = render_report("Acme", &report);
        assert!(text.starts_with("# Acme (7d)"));
        assert!(text.contains("aeo-cli scan"));
    }
}
