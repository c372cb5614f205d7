use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain(pub String);

impl Domain {
    /// Canonicalize host to a stable key: lowercase + IDNA/Punycode
    fn canonicalize(host: &str) -> String {
        let lower = host.to_ascii_lowercase();
        idna::domain_to_ascii(&lower).unwrap_or(lower)
    }

    pub fn from_url(url: &Url) -> Option<Self> {
        url.host_str().map(|h| Domain(Self::canonicalize(h)))
    }

    /// Build a Domain from raw user text (CLI, API callers, etc.)
    pub fn from_raw(host: &str) -> Self {
        Domain(Self::canonicalize(host))
    }
}

/* ===========================
CONFIGURATION
=========================== */

/// One-run crawl configuration. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub base_url: String,
    pub max_depth: u32,
    pub max_pages: usize,
    /// Upper bound on interactive nodes kept per extraction call.
    pub max_nodes: usize,
    pub same_origin_only: bool,
    pub denied_domains: Vec<String>,
    /// Attributes considered stable test ids, most preferred first.
    pub preferred_testid_attrs: Vec<String>,
}

impl CrawlConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_depth: 3,
            max_pages: 80,
            max_nodes: 120,
            same_origin_only: true,
            denied_domains: vec![
                "facebook.com".into(),
                "twitter.com".into(),
                "linkedin.com".into(),
            ],
            preferred_testid_attrs: vec![
                "data-testid".into(),
                "data-test".into(),
                "data-qa".into(),
            ],
        }
    }
}

/* ===========================
FRONTIER
=========================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OriginAction {
    Seed,
    DiscoveredLink,
}

/// One not-yet-visited URL, tagged with its discovery depth.
/// Consumed exactly once when dequeued; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierItem {
    pub url: String,
    pub depth: u32,
    pub origin_action: OriginAction,
}

impl FrontierItem {
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth: 0,
            origin_action: OriginAction::Seed,
        }
    }

    pub fn discovered(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
            origin_action: OriginAction::DiscoveredLink,
        }
    }
}

/* ===========================
DRIVER-SIDE RAW SHAPES
=========================== */

/// One raw interactive element as reported by a driver. Every field is
/// optional: a malformed capture degrades to placeholders downstream
/// instead of failing extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawElement {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
}

/// Interaction summary of one live page. A failed navigation or
/// extraction is represented as the default (empty) summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomSummary {
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub landmarks: Vec<String>,
    #[serde(default)]
    pub elements: Vec<RawElement>,
    #[serde(default)]
    pub links: Vec<String>,
}

/// Uncompacted node capture, the input to DOM compaction.
/// Expected shape: tag, role, text, ariaLabel, attributes, selector, section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub section: Option<String>,
}

/* ===========================
PAGE MODEL
=========================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Button,
    Input,
    Link,
}

/// Bounded selector-confidence scalar with saturating arithmetic.
/// The caps and floor are healing policy, supplied at each call site.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Self {
        Confidence(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Increase by `step`, saturating at `cap`.
    pub fn boosted(self, step: f64, cap: f64) -> Self {
        Confidence((self.0 + step).min(cap))
    }

    /// Decrease by `penalty`, saturating at `floor`.
    pub fn decayed(self, penalty: f64, floor: f64) -> Self {
        Confidence((self.0 - penalty).max(floor))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementModel {
    /// Semantic camelCase id, unique within its page.
    pub element_id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub role: String,
    pub label: String,
    /// Primary locator. Replaced in place when healing promotes a fallback.
    pub selector: String,
    pub fallback_selectors: Vec<String>,
    pub confidence: Confidence,
    pub section: String,
}

/// One micro-instruction of an inferred action. The string form
/// (`fill(target, arg)`) is a rendering for downstream generators,
/// not the stored shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ActionStep {
    Fill { target: String, arg: String },
    Click { target: String },
}

impl fmt::Display for ActionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStep::Fill { target, arg } => write!(f, "fill({target}, {arg})"),
            ActionStep::Click { target } => write!(f, "click({target})"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionModel {
    pub name: String,
    pub params: Vec<String>,
    pub steps: Vec<ActionStep>,
    pub post_condition: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionModel {
    pub name: String,
    pub elements: Vec<ElementModel>,
}

/// Structured representation of one visited page's interactive surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageModel {
    pub page_id: String,
    pub page_name: String,
    pub url: String,
    pub route: String,
    pub sections: Vec<SectionModel>,
    pub actions: Vec<ActionModel>,
    pub discovered_links: Vec<String>,
    pub navigation_hints: Vec<String>,
    pub modeled_at: DateTime<Utc>,
}

impl PageModel {
    pub fn elements(&self) -> impl Iterator<Item = &ElementModel> {
        self.sections.iter().flat_map(|s| s.elements.iter())
    }

    pub fn element_count(&self) -> usize {
        self.sections.iter().map(|s| s.elements.len()).sum()
    }
}

/* ===========================
RUN RESULTS
=========================== */

/// What one engine run produced, before any downstream consumers run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    pub pages: Vec<PageModel>,
    pub page_count: usize,
    pub duplicate_hits: u64,
}

/// API-level summary, after persistence and reporting.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub pages_modeled: usize,
    pub duplicate_hits: u64,
    pub average_confidence: f64,
    pub model_paths: Vec<PathBuf>,
    pub report_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}
impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_saturates_at_cap_and_floor() {
        let c = Confidence::new(0.97).boosted(0.05, 0.99);
        assert_eq!(c.value(), 0.99);
        let c = Confidence::new(0.35).decayed(0.2, 0.3);
        assert_eq!(c.value(), 0.3);
    }

    #[test]
    fn action_step_renders_generator_syntax() {
        let fill = ActionStep::Fill {
            target: "usernameInput".into(),
            arg: "username".into(),
        };
        let click = ActionStep::Click {
            target: "signInButton".into(),
        };
        assert_eq!(fill.to_string(), "fill(usernameInput, username)");
        assert_eq!(click.to_string(), "click(signInButton)");
    }

    #[test]
    fn raw_summary_tolerates_missing_fields() {
        let summary: DomSummary = serde_json::from_str(r#"{"elements":[{}]}"#).unwrap();
        assert_eq!(summary.fingerprint, "");
        assert!(summary.elements[0].label.is_none());
    }

    #[test]
    fn domain_canonicalizes_case() {
        assert_eq!(Domain::from_raw("M.Facebook.COM").0, "m.facebook.com");
    }
}
