//! Plain-text report rendering and persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::analysis::{AnalysisResult, GroupCount};
use crate::model;

pub const TITLE: &str = "Incident Analysis Report";

const NOTES: [&str; 2] = [
    "- Dataset is simulated for portfolio purposes.",
    "- SQL used: GROUP BY, ORDER BY, LIMIT, filtering by severity.",
];

/// Render `result` as the report text. Lines are `\n`-separated with no trailing newline.
pub fn render(result: &AnalysisResult, generated_at: &NaiveDateTime) -> String {
    let mut lines = vec![
        TITLE.to_string(),
        "=".repeat(TITLE.len()),
        format!("Generated at: {}", model::format_timestamp(generated_at)),
        String::new(),
        format!("Total incidents: {}", result.total),
        String::new(),
    ];

    for (title, groups) in [
        ("Incidents by severity", &result.by_severity),
        ("Top 5 source IPs", &result.top_ips),
        ("Top 5 affected users", &result.top_users),
        ("Top 5 incident types", &result.top_types),
    ] {
        push_counts(&mut lines, title, groups);
    }

    push_header(&mut lines, "Most recent Critical incidents (last 10)");
    if result.recent_critical.is_empty() {
        lines.push("- None".to_string());
    } else {
        for c in &result.recent_critical {
            lines.push(format!(
                "- {} | {} | {} | {}",
                model::format_timestamp(&c.timestamp),
                c.incident_type,
                c.username,
                c.source_ip
            ));
        }
    }

    lines.push(String::new());
    push_header(&mut lines, "Notes");
    lines.extend(NOTES.iter().map(|n| n.to_string()));

    lines.join("\n")
}

fn push_header(lines: &mut Vec<String>, title: &str) {
    lines.push(title.to_string());
    lines.push("-".repeat(title.len()));
}

fn push_counts(lines: &mut Vec<String>, title: &str, groups: &[GroupCount]) {
    push_header(lines, title);
    for g in groups {
        lines.push(format!("- {}: {}", g.key, g.count));
    }
    lines.push(String::new());
}

/// Write the report, replacing any previous one. Creates the parent directory if needed.
pub fn write_report(path: &Path, text: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create report directory: {}", dir.display()))?;
    }
    std::fs::write(path, text)
        .with_context(|| format!("failed to write report: {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = text.len(), "Report written");
    Ok(())
}
