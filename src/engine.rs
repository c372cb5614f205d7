//! Crawl orchestration: one engine owns one `CrawlState`, drives the
//! frontier breadth-first, and composes the URL policy, extractor, and
//! verifier around an opaque browser driver. The only two ways the loop
//! ends are an empty frontier and an exhausted page budget — per-page
//! failures degrade and the run continues.

use crate::actions::ActionRuleSet;
use crate::error::Result;
use crate::extract::Extractor;
use crate::policy;
use crate::state::{make_signature, CrawlState};
use crate::types::{CrawlConfig, CrawlOutcome, DomSummary, FrontierItem};
use crate::verify::{SelectorVerifier, VisibilityOracle};
use serde::Serialize;
use url::Url;

/// Capability surface of a browser driver. The engine never branches on
/// the concrete implementation; swap a deterministic mock for a live
/// adapter freely.
pub trait Driver: VisibilityOracle + Send {
    fn name(&self) -> &'static str;
    /// Navigate to a URL. An error is a degraded page, not a crawl
    /// failure — callers proceed with whatever state is available.
    fn goto(&mut self, url: &str) -> Result<()>;
    fn current_url(&self) -> String;
    /// Interaction summary of the current page. Infallible by contract:
    /// a failed extraction is an empty summary.
    fn extract_summary(&mut self, max_nodes: usize) -> DomSummary;
    fn close(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    DepthExceeded,
    PolicyRejected,
    DuplicateSignature,
}

/// Progress notifications fired during a run. A pure notification
/// channel: sinks have no return value and must never block the crawl.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum CrawlEvent {
    Dequeue {
        url: String,
        depth: u32,
    },
    Modeled {
        url: String,
        page_name: String,
        page_count: usize,
    },
    Skip {
        url: String,
        depth: u32,
        reason: SkipReason,
    },
}

pub trait ProgressSink {
    fn notify(&self, _event: &CrawlEvent) {}
}

/// Default sink: drops every event.
pub struct NullSink;
impl ProgressSink for NullSink {}

/// Writes one line per event to stderr; stdout stays JSON-clean.
pub struct StderrSink;
impl ProgressSink for StderrSink {
    fn notify(&self, event: &CrawlEvent) {
        match event {
            CrawlEvent::Dequeue { url, depth } => {
                eprintln!("dequeue depth={depth} {url}");
            }
            CrawlEvent::Modeled {
                url,
                page_name,
                page_count,
            } => {
                eprintln!("modeled #{page_count} {page_name} {url}");
            }
            CrawlEvent::Skip { url, depth, reason } => {
                eprintln!("skip depth={depth} reason={reason:?} {url}");
            }
        }
    }
}

pub struct Engine<'a> {
    config: &'a CrawlConfig,
    driver: &'a mut dyn Driver,
    rules: &'a ActionRuleSet,
    sink: &'a dyn ProgressSink,
    state: CrawlState,
}

impl<'a> Engine<'a> {
    pub fn new(
        config: &'a CrawlConfig,
        driver: &'a mut dyn Driver,
        rules: &'a ActionRuleSet,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        let mut state = CrawlState::new();
        state.enqueue(FrontierItem::seed(config.base_url.clone()));
        Self {
            config,
            driver,
            rules,
            sink,
            state,
        }
    }

    /// Drive the crawl to completion. There is no fatal-error class in
    /// this loop by design; it returns once the frontier empties or the
    /// page budget is reached.
    pub fn run(&mut self) -> CrawlOutcome {
        let mut pages = Vec::new();

        while self.state.has_pending() && self.state.page_count < self.config.max_pages {
            let current = match self.state.dequeue() {
                Some(item) => item,
                None => break,
            };
            self.sink.notify(&CrawlEvent::Dequeue {
                url: current.url.clone(),
                depth: current.depth,
            });

            if current.depth > self.config.max_depth {
                self.skip(&current, SkipReason::DepthExceeded);
                continue;
            }
            if !self.is_allowed(&current.url) {
                self.skip(&current, SkipReason::PolicyRejected);
                continue;
            }

            // a failed navigation still gets a best-effort extraction pass
            let _ = self.driver.goto(&current.url);
            let summary = self.driver.extract_summary(self.config.max_nodes);
            let live_url = self.driver.current_url();

            let signature = make_signature(
                &policy::normalize_url(&live_url),
                &summary.fingerprint,
                &summary.landmarks,
            );
            if !self.state.claim_signature(&signature) {
                self.skip(&current, SkipReason::DuplicateSignature);
                continue;
            }

            let extractor = Extractor::new(&self.config.preferred_testid_attrs, self.rules);
            let mut page = extractor.build_page_model(&live_url, &summary);
            SelectorVerifier::new(&*self.driver).verify_and_heal(&mut page);

            self.state.page_count += 1;
            self.sink.notify(&CrawlEvent::Modeled {
                url: live_url,
                page_name: page.page_name.clone(),
                page_count: self.state.page_count,
            });

            self.enqueue_links(&summary.links, current.depth + 1);
            pages.push(page);
        }

        CrawlOutcome {
            pages,
            page_count: self.state.page_count,
            duplicate_hits: self.state.duplicate_hits,
        }
    }

    pub fn frontier_len(&self) -> usize {
        self.state.frontier_len()
    }

    fn skip(&self, item: &FrontierItem, reason: SkipReason) {
        self.sink.notify(&CrawlEvent::Skip {
            url: item.url.clone(),
            depth: item.depth,
            reason,
        });
    }

    fn is_allowed(&self, url: &str) -> bool {
        if policy::is_denied_domain(url, &self.config.denied_domains) {
            return false;
        }
        if self.config.same_origin_only && !policy::same_origin(&self.config.base_url, url) {
            return false;
        }
        true
    }

    fn enqueue_links(&mut self, links: &[String], depth: u32) {
        let base = match Url::parse(&self.config.base_url) {
            Ok(u) => u,
            Err(_) => return,
        };
        for link in links {
            let absolute = match base.join(link) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            };
            if !self.is_allowed(&absolute) {
                continue;
            }
            self.state.enqueue(FrontierItem::discovered(absolute, depth));
        }
    }
}
