//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of a batch,
//! including table counts, failed URLs and broken links by status.

use crate::output::stats::AuditStatistics;
use crate::output::traits::OutputResult;
use crate::storage::RunRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown summary of a batch
///
/// # Arguments
///
/// * `stats` - Statistics over the batch state
/// * `run` - The most recent run, when persistence is enabled
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(
    stats: &AuditStatistics,
    run: Option<&RunRecord>,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(stats, run);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Wrote summary to {}", output_path.display());
    Ok(())
}

/// Formats batch statistics as markdown
pub fn format_markdown_summary(stats: &AuditStatistics, run: Option<&RunRecord>) -> String {
    let mut md = String::new();

    md.push_str("# Content Audit Summary\n\n");

    if let Some(run) = run {
        md.push_str("## Run Information\n\n");
        md.push_str(&format!("- **Run ID**: {}\n", run.id));
        md.push_str(&format!("- **Started**: {}\n", run.started_at));
        if let Some(finished) = &run.finished_at {
            md.push_str(&format!("- **Finished**: {}\n", finished));
        }
        md.push_str(&format!("- **Status**: {}\n", run.status));
        md.push_str(&format!("- **Mapping Hash**: {}\n\n", run.mapping_hash));
    }

    md.push_str("## Tables\n\n");
    md.push_str("| Table | Rows |\n");
    md.push_str("|-------|------|\n");
    md.push_str(&format!("| Pages | {} |\n", stats.pages_processed));
    md.push_str(&format!("| Content | {} |\n", stats.content_rows));
    md.push_str(&format!("| Assets | {} |\n", stats.asset_rows));
    md.push_str(&format!("| Links | {} |\n\n", stats.broken_links));

    md.push_str(&format!(
        "- **Block Instances**: {}\n",
        stats.block_instances
    ));
    match stats.average_readability {
        Some(average) => md.push_str(&format!(
            "- **Average Reading Ease**: {:.2} ({} scored components)\n\n",
            average, stats.scored_rows
        )),
        None => md.push_str("- **Average Reading Ease**: n/a\n\n"),
    }

    if !stats.links_by_status.is_empty() {
        md.push_str("## Broken Links by Status\n\n");
        md.push_str("| Status | Links |\n");
        md.push_str("|--------|-------|\n");
        for (status, count) in &stats.links_by_status {
            md.push_str(&format!("| {} | {} |\n", status, count));
        }
        md.push('\n');
    }

    if !stats.failures.is_empty() {
        md.push_str("## Failed URLs\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");
        for failure in &stats.failures {
            md.push_str(&format!(
                "| {} | {} |\n",
                failure.url,
                failure.error.replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    md
}
