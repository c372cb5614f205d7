use crate::actions::ActionRuleSet;
use crate::engine::{Driver, Engine, NullSink, ProgressSink};
use crate::error::{PomcrawlError, Result};
use crate::services::{
    average_confidence, HttpDriver, MockDriver, ModelStore, ReportWriter,
    LocalFsStore,
};
use crate::types::{CrawlConfig, CrawlSummary, Domain};
use std::path::Path;
use std::time::Instant;
use url::Url;

// Helper function for logging - ignores errors to not break main operations
fn log_info(domain: Option<&str>, event: &str, details: Option<&str>) -> Result<()> {
    match crate::services::ActivityLogger::new() {
        Ok(logger) => logger.info(domain, event, details),
        Err(_) => Ok(()), // Silently ignore logging errors
    }
}

fn log_error(domain: Option<&str>, event: &str, details: Option<&str>) -> Result<()> {
    match crate::services::ActivityLogger::new() {
        Ok(logger) => logger.error(domain, event, details),
        Err(_) => Ok(()), // Silently ignore logging errors
    }
}

/* ------------ public facade components ------------ */

pub struct Components {
    pub driver: Box<dyn Driver>,
    pub rules: ActionRuleSet,
    pub sink: Box<dyn ProgressSink>,
}

impl Components {
    /// Deterministic two-page site, no network. The default for tests
    /// and dry runs.
    pub fn mock(base_url: &str) -> Self {
        Self {
            driver: Box::new(MockDriver::new(base_url)),
            rules: ActionRuleSet::builtin(),
            sink: Box::new(NullSink),
        }
    }

    /// Live adapter over a blocking HTTP client.
    pub fn http() -> Result<Self> {
        Ok(Self {
            driver: Box::new(HttpDriver::new()?),
            rules: ActionRuleSet::builtin(),
            sink: Box::new(NullSink),
        })
    }

    pub fn with_sink(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }
}

/* ------------ crawl entrypoint ------------ */

/// Run a full crawl, persist every page model, and write the summary
/// report. The single library entrypoint the CLI wraps.
pub fn crawl(
    config: &CrawlConfig,
    components: &mut Components,
    output_dir: &Path,
) -> Result<CrawlSummary> {
    let start_time = Instant::now();
    let domain = Url::parse(&config.base_url)
        .ok()
        .as_ref()
        .and_then(Domain::from_url);
    let domain_str = domain.as_ref().map(|d| d.0.as_str());

    if Url::parse(&config.base_url).is_err() {
        let _ = log_error(None, "crawl", Some("invalid base url"));
        return Err(PomcrawlError::InvalidUrl(config.base_url.clone()));
    }

    let result = run_and_persist(config, components, output_dir);
    components.driver.close();
    let duration = start_time.elapsed();

    match &result {
        Ok(summary) => {
            let details = format!(
                "{} pages in {}ms",
                summary.pages_modeled,
                duration.as_millis()
            );
            let _ = log_info(domain_str, "crawl", Some(&details));
        }
        Err(_) => {
            let details = format!("failed in {}ms", duration.as_millis());
            let _ = log_error(domain_str, "crawl", Some(&details));
        }
    }

    result
}

fn run_and_persist(
    config: &CrawlConfig,
    components: &mut Components,
    output_dir: &Path,
) -> Result<CrawlSummary> {
    let outcome = Engine::new(
        config,
        &mut *components.driver,
        &components.rules,
        &*components.sink,
    )
    .run();

    let store = LocalFsStore::new(output_dir)?;
    let mut model_paths = Vec::with_capacity(outcome.pages.len());
    for page in &outcome.pages {
        model_paths.push(store.write_page_model(page)?);
    }
    let report_path = ReportWriter::new(output_dir)?.write_summary(&outcome.pages)?;

    Ok(CrawlSummary {
        pages_modeled: outcome.page_count,
        duplicate_hits: outcome.duplicate_hits,
        average_confidence: average_confidence(&outcome.pages),
        model_paths,
        report_path,
    })
}

/* ------------ activity log ------------ */

pub fn read_logs(domain_filter: Option<&str>, errors_only: bool) -> Result<Vec<String>> {
    crate::services::ActivityLogger::new()?.read_logs(domain_filter, errors_only)
}
