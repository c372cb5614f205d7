use crate::error::{PomcrawlError, Result};
use crate::types::PageModel;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// Mean element confidence across all pages; 0.0 for an empty crawl.
pub fn average_confidence(pages: &[PageModel]) -> f64 {
    let total_elements: usize = pages.iter().map(|p| p.element_count()).sum();
    if total_elements == 0 {
        return 0.0;
    }
    let sum: f64 = pages
        .iter()
        .flat_map(|p| p.elements())
        .map(|e| e.confidence.value())
        .sum();
    sum / total_elements as f64
}

/// Writes the Markdown crawl summary under `<output>/reports/`.
pub struct ReportWriter {
    report_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: &Path) -> Result<Self> {
        let report_dir = output_dir.join("reports");
        fs::create_dir_all(&report_dir).map_err(|e| {
            PomcrawlError::storage_error("initialization", e.to_string())
        })?;
        Ok(Self { report_dir })
    }

    pub fn write_summary(&self, pages: &[PageModel]) -> Result<PathBuf> {
        let total_elements: usize = pages.iter().map(|p| p.element_count()).sum();
        let lines = [
            "# Crawl Report".to_string(),
            String::new(),
            format!("- Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC")),
            format!("- Pages modeled: {}", pages.len()),
            format!("- Elements mapped: {total_elements}"),
            format!(
                "- Average selector confidence: {:.2}",
                average_confidence(pages)
            ),
        ];
        let target = self.report_dir.join("crawl_summary.md");
        fs::write(&target, lines.join("\n"))?;
        Ok(target)
    }
}
