//! Browser driver implementations behind the `Driver` capability trait:
//! a deterministic in-memory mock and a blocking HTTP adapter.

use crate::engine::Driver;
use crate::error::Result;
use crate::extract::compact_dom;
use crate::types::{DomSummary, RawElement, RawNode};
use crate::verify::VisibilityOracle;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/* ===========================
MOCK DRIVER
=========================== */

/// Local, deterministic driver for scaffolding and tests: a two-page
/// site where `/` links to `/login` and `/login` links to
/// `/forgot-password`. Visibility assumes summary selectors are valid.
pub struct MockDriver {
    base_url: String,
    current: String,
    links_override: Option<Vec<String>>,
}

impl MockDriver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            current: String::new(),
            links_override: None,
        }
    }

    /// Replace every page's discovered links, e.g. to simulate a site
    /// that only links off-origin.
    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links_override = Some(links);
        self
    }

    fn absolute(&self, path: &str) -> String {
        Url::parse(&self.base_url)
            .ok()
            .and_then(|base| base.join(path).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| format!("{}{path}", self.base_url.trim_end_matches('/')))
    }
}

impl VisibilityOracle for MockDriver {
    fn is_visible(&self, selector: &str, _timeout_ms: u64) -> bool {
        !selector.is_empty()
    }
}

impl Driver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn goto(&mut self, url: &str) -> Result<()> {
        self.current = url.to_string();
        Ok(())
    }

    fn current_url(&self) -> String {
        if self.current.is_empty() {
            self.base_url.clone()
        } else {
            self.current.clone()
        }
    }

    fn extract_summary(&mut self, max_nodes: usize) -> DomSummary {
        let path = Url::parse(&self.current_url())
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/".to_string());

        let (mut elements, links) = if path == "/login" {
            (
                vec![
                    raw_element("textbox", "Username", "input[name='username']"),
                    raw_element("textbox", "Password", "input[name='password']"),
                    raw_element("button", "Sign In", "button:has-text('Sign In')"),
                ],
                vec![self.absolute("/forgot-password")],
            )
        } else {
            (
                vec![raw_element("link", "Login", "a[href='/login']")],
                vec![self.absolute("/login")],
            )
        };

        let fingerprint = format!("mock::{path}::{}", elements.len());
        elements.truncate(max_nodes);

        DomSummary {
            fingerprint,
            landmarks: vec!["main".to_string()],
            elements,
            links: self.links_override.clone().unwrap_or(links),
        }
    }
}

fn raw_element(role: &str, label: &str, selector: &str) -> RawElement {
    RawElement {
        role: Some(role.to_string()),
        label: Some(label.to_string()),
        selector: Some(selector.to_string()),
    }
}

/* ===========================
HTTP DRIVER
=========================== */

const TESTID_ATTRS: [&str; 3] = ["data-testid", "data-test", "data-qa"];

/// Live adapter over blocking reqwest + scraper: fetches a page, keeps
/// the source, and answers extraction and visibility queries against
/// it. Transport failures leave an empty document behind so the crawl
/// degrades instead of aborting.
pub struct HttpDriver {
    client: Client,
    current: String,
    last_html: String,
}

impl HttpDriver {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            current: String::new(),
            last_html: String::new(),
        })
    }

    #[cfg(test)]
    fn from_html(url: &str, html: &str) -> Self {
        Self {
            client: Client::new(),
            current: url.to_string(),
            last_html: html.to_string(),
        }
    }

    fn collect_raw_nodes(doc: &Html) -> Vec<RawNode> {
        let group = match Selector::parse("a, button, input, select, textarea, [role], [tabindex]")
        {
            Ok(sel) => sel,
            Err(_) => return Vec::new(),
        };

        let mut nodes = Vec::new();
        for el in doc.select(&group) {
            let tag = el.value().name().to_lowercase();
            let attributes: BTreeMap<String, String> = el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();

            let role = attributes
                .get("role")
                .cloned()
                .unwrap_or_else(|| implied_role(&tag, &attributes));
            let text = collapse_text(&el);
            let aria_label = attributes
                .get("aria-label")
                .or_else(|| attributes.get("placeholder"))
                .or_else(|| attributes.get("name"))
                .cloned();

            nodes.push(RawNode {
                selector: css_for(&tag, &attributes),
                section: Some(section_of(&el)),
                tag,
                role,
                text,
                aria_label,
                attributes,
            });
        }
        nodes
    }
}

impl VisibilityOracle for HttpDriver {
    fn is_visible(&self, selector: &str, _timeout_ms: u64) -> bool {
        if selector.is_empty() || self.last_html.is_empty() {
            return false;
        }
        let doc = Html::parse_document(&self.last_html);

        if let Some(wanted) = selector.strip_prefix("text=") {
            let all = match Selector::parse("*") {
                Ok(sel) => sel,
                Err(_) => return false,
            };
            return doc
                .select(&all)
                .any(|el| el.text().collect::<String>().trim() == wanted);
        }

        match Selector::parse(selector) {
            Ok(sel) => doc.select(&sel).next().is_some(),
            Err(_) => false,
        }
    }
}

impl Driver for HttpDriver {
    fn name(&self) -> &'static str {
        "http"
    }

    fn goto(&mut self, url: &str) -> Result<()> {
        self.current = url.to_string();
        match self.client.get(url).send() {
            Ok(resp) => {
                self.current = resp.url().to_string();
                // error pages still carry a DOM worth modeling
                self.last_html = resp.text().unwrap_or_default();
                Ok(())
            }
            Err(e) => {
                self.last_html.clear();
                Err(e.into())
            }
        }
    }

    fn current_url(&self) -> String {
        self.current.clone()
    }

    fn extract_summary(&mut self, max_nodes: usize) -> DomSummary {
        if self.last_html.is_empty() {
            return DomSummary::default();
        }
        let doc = Html::parse_document(&self.last_html);
        compact_dom(&Self::collect_raw_nodes(&doc), max_nodes)
    }
}

fn implied_role(tag: &str, attributes: &BTreeMap<String, String>) -> String {
    match tag {
        "a" => "link".to_string(),
        "button" => "button".to_string(),
        "textarea" => "textbox".to_string(),
        "select" => "combobox".to_string(),
        "input" => match attributes.get("type").map(String::as_str) {
            Some("submit") | Some("button") | Some("reset") => "button".to_string(),
            Some("checkbox") => "checkbox".to_string(),
            _ => "textbox".to_string(),
        },
        _ => String::new(),
    }
}

fn collapse_text(el: &ElementRef<'_>) -> Option<String> {
    let text = el
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn css_for(tag: &str, attributes: &BTreeMap<String, String>) -> String {
    for attr in TESTID_ATTRS {
        if let Some(value) = attributes.get(attr) {
            return format!("[{attr}='{value}']");
        }
    }
    if let Some(id) = attributes.get("id") {
        return format!("#{id}");
    }
    if let Some(name) = attributes.get("name") {
        return format!("{tag}[name='{name}']");
    }
    if tag == "a" {
        if let Some(href) = attributes.get("href") {
            return format!("a[href='{href}']");
        }
    }
    tag.to_string()
}

fn section_of(el: &ElementRef<'_>) -> String {
    for ancestor in el.ancestors() {
        if let Some(parent) = ElementRef::wrap(ancestor) {
            let section = match parent.value().name() {
                "main" => "mainContent",
                "nav" => "navbar",
                "header" => "header",
                "footer" => "footer",
                "aside" => "sidebar",
                _ => continue,
            };
            return section.to_string();
        }
    }
    "mainContent".to_string()
}
