//! Page-model extraction: turns a driver interaction summary into a
//! typed `PageModel`. Extraction never fails — malformed input degrades
//! to placeholder labels and roles so one bad page cannot abort a crawl.

use crate::actions::ActionRuleSet;
use crate::types::{
    DomSummary, ElementKind, ElementModel, PageModel, RawNode, SectionModel,
};
use chrono::Utc;
use std::collections::{BTreeSet, HashSet};
use url::Url;

pub const MAIN_SECTION: &str = "mainContent";
pub const BASELINE_CONFIDENCE: f64 = 0.85;

const INTERACTIVE_TAGS: [&str; 5] = ["a", "button", "input", "select", "textarea"];
const INTERACTIVE_ROLES: [&str; 5] = ["button", "textbox", "link", "combobox", "checkbox"];

pub struct Extractor<'a> {
    testid_attrs: &'a [String],
    rules: &'a ActionRuleSet,
}

impl<'a> Extractor<'a> {
    pub fn new(testid_attrs: &'a [String], rules: &'a ActionRuleSet) -> Self {
        Self {
            testid_attrs,
            rules,
        }
    }

    pub fn build_page_model(&self, url: &str, summary: &DomSummary) -> PageModel {
        let route = route_of(url);
        let page_name = page_name_from_route(&route);

        let mut used_ids = HashSet::new();
        let mut elements = Vec::with_capacity(summary.elements.len());
        for raw in &summary.elements {
            let label = raw
                .label
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "Element".to_string());
            let role = raw
                .role
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| "generic".to_string());
            let selector = raw.selector.clone().unwrap_or_default();

            let element_id = unique_id(semantic_element_id(&label, &role), &mut used_ids);
            let kind = match role.as_str() {
                "button" => ElementKind::Button,
                "textbox" => ElementKind::Input,
                _ => ElementKind::Link,
            };
            let fallback_selectors = fallback_selectors(&selector, &label, self.testid_attrs);

            elements.push(ElementModel {
                element_id,
                kind,
                role,
                label,
                selector,
                fallback_selectors,
                confidence: crate::types::Confidence::new(BASELINE_CONFIDENCE),
                section: MAIN_SECTION.to_string(),
            });
        }

        let actions = self.rules.infer(&route, &elements);

        PageModel {
            page_id: page_name.replace("Page", "").to_lowercase(),
            page_name,
            url: url.to_string(),
            route,
            sections: vec![SectionModel {
                name: MAIN_SECTION.to_string(),
                elements,
            }],
            actions,
            discovered_links: summary.links.clone(),
            navigation_hints: vec![
                "Continue crawl for newly discovered same-origin pages.".to_string(),
            ],
            modeled_at: Utc::now(),
        }
    }
}

fn route_of(url: &str) -> String {
    match Url::parse(url) {
        Ok(u) => {
            let path = u.path();
            if path.is_empty() {
                "/".to_string()
            } else {
                path.to_string()
            }
        }
        Err(_) => "/".to_string(),
    }
}

/// `/` → `HomePage`; otherwise each path segment capitalized and
/// concatenated, with a `Page` suffix.
pub fn page_name_from_route(route: &str) -> String {
    if route.is_empty() || route == "/" {
        return "HomePage".to_string();
    }
    let mut name: String = route
        .split('/')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect();
    name.push_str("Page");
    name
}

/// Derive the semantic camelCase element id: title-cased alphanumeric
/// label content plus a role suffix. `x`/`close` labels canonicalize to
/// `closeModalButton` — close icons are too common across UIs to end up
/// as ids like `xButton`.
pub fn semantic_element_id(label: &str, role: &str) -> String {
    let mut normalized: String = title_case(label)
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .collect();
    let mut suffix = match role {
        "button" => "Button",
        "textbox" => "Input",
        _ => "Link",
    };

    let lowered = normalized.to_lowercase();
    if lowered == "x" || lowered == "close" {
        normalized = "CloseModal".to_string();
        suffix = "Button";
    } else if normalized.is_empty() {
        // icon-only labels (glyphs, emoji) carry no alphanumerics
        if let Some(icon_id) = infer_icon_semantic_name(label) {
            return icon_id;
        }
    }

    let mut id = String::with_capacity(normalized.len() + suffix.len());
    let mut chars = normalized.chars();
    if let Some(first) = chars.next() {
        id.extend(first.to_lowercase());
        id.push_str(chars.as_str());
    }
    id.push_str(suffix);
    id
}

/// Ranked fallbacks, tried in insertion order by the healer: a text
/// locator first, then a synthesized test-id locator when the primary
/// selector carries no stable test-id attribute.
pub fn fallback_selectors(selector: &str, label: &str, testid_attrs: &[String]) -> Vec<String> {
    let mut fallbacks = Vec::new();
    if !label.is_empty() {
        fallbacks.push(format!("text={label}"));
    }
    let has_testid = testid_attrs.iter().any(|attr| selector.contains(attr.as_str()));
    if !selector.is_empty() && !has_testid {
        let attr = testid_attrs
            .first()
            .map(String::as_str)
            .unwrap_or("data-testid");
        fallbacks.push(format!(
            "[{attr}='{}']",
            label.to_lowercase().replace(' ', "-")
        ));
    }
    fallbacks
}

/// Heuristic mapper for icon-only hints, consulted before any expensive
/// recognition path.
pub fn infer_icon_semantic_name(visible_hint: &str) -> Option<String> {
    let normalized = visible_hint.trim().to_lowercase();
    match normalized.as_str() {
        "x" | "close" | "dismiss" => Some("closeModalButton".to_string()),
        "\u{2630}" | "menu" | "hamburger" => Some("openMenuButton".to_string()),
        "\u{1F50D}" | "search" => Some("searchButton".to_string()),
        _ => None,
    }
}

/// Reduce a raw node capture to interactive, high-signal context only,
/// capped at `max_nodes`. Landmarks are the sorted distinct section
/// labels of the kept nodes; links are the hrefs of kept link nodes.
pub fn compact_dom(raw_nodes: &[RawNode], max_nodes: usize) -> DomSummary {
    let mut kept = Vec::new();
    let mut sections = BTreeSet::new();
    let mut links = Vec::new();

    for node in raw_nodes {
        let tag = node.tag.to_lowercase();
        let role = node.role.to_lowercase();
        let is_interactive = INTERACTIVE_TAGS.contains(&tag.as_str())
            || INTERACTIVE_ROLES.contains(&role.as_str())
            || node.attributes.contains_key("tabindex");
        if !is_interactive {
            continue;
        }

        sections.insert(
            node.section
                .clone()
                .unwrap_or_else(|| MAIN_SECTION.to_string()),
        );
        let label = node
            .text
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| node.aria_label.clone().filter(|t| !t.is_empty()))
            .unwrap_or_else(|| "Element".to_string());
        let role_out = if role.is_empty() {
            "generic".to_string()
        } else {
            role
        };
        if role_out == "link" {
            if let Some(href) = node.attributes.get("href") {
                if is_followable_href(href) {
                    links.push(href.clone());
                }
            }
        }
        kept.push(crate::types::RawElement {
            role: Some(role_out),
            label: Some(label),
            selector: Some(node.selector.clone()),
        });
        if kept.len() >= max_nodes {
            break;
        }
    }

    let landmarks: Vec<String> = sections.into_iter().collect();
    DomSummary {
        fingerprint: format!("compact::{}::{}", kept.len(), landmarks.join(",")),
        landmarks,
        elements: kept,
        links,
    }
}

fn is_followable_href(href: &str) -> bool {
    !href.is_empty()
        && !href.starts_with('#')
        && !href.starts_with("mailto:")
        && !href.starts_with("javascript:")
        && !href.starts_with("tel:")
}

fn unique_id(candidate: String, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let mut n = 2usize;
    loop {
        let alternate = format!("{candidate}{n}");
        if used.insert(alternate.clone()) {
            return alternate;
        }
        n += 1;
    }
}

// python-style str.capitalize: first char upper, the rest lower
fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

// python-style str.title: a letter opening a word is uppercased, the
// rest lowered; word boundaries are non-alphabetic characters
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawElement;
    use std::collections::BTreeMap;

    fn extractor_parts() -> (Vec<String>, ActionRuleSet) {
        (
            vec![
                "data-testid".to_string(),
                "data-test".to_string(),
                "data-qa".to_string(),
            ],
            ActionRuleSet::builtin(),
        )
    }

    fn raw(role: &str, label: &str, selector: &str) -> RawElement {
        RawElement {
            role: Some(role.into()),
            label: Some(label.into()),
            selector: Some(selector.into()),
        }
    }

    #[test]
    fn page_names_from_routes() {
        assert_eq!(page_name_from_route("/"), "HomePage");
        assert_eq!(page_name_from_route(""), "HomePage");
        assert_eq!(page_name_from_route("/login"), "LoginPage");
        assert_eq!(page_name_from_route("/admin/users"), "AdminUsersPage");
        assert_eq!(
            page_name_from_route("/forgot-password"),
            "Forgot-passwordPage"
        );
    }

    #[test]
    fn semantic_ids_follow_role_suffixes() {
        assert_eq!(semantic_element_id("Sign In", "button"), "signInButton");
        assert_eq!(semantic_element_id("Username", "textbox"), "usernameInput");
        assert_eq!(semantic_element_id("Login", "link"), "loginLink");
        assert_eq!(semantic_element_id("Search results", "generic"), "searchResultsLink");
    }

    #[test]
    fn close_icons_canonicalize_to_close_modal() {
        assert_eq!(semantic_element_id("x", "button"), "closeModalButton");
        assert_eq!(semantic_element_id("X", "link"), "closeModalButton");
        assert_eq!(semantic_element_id("CLOSE", "link"), "closeModalButton");
    }

    #[test]
    fn icon_only_labels_use_the_icon_mapper() {
        assert_eq!(semantic_element_id("\u{2630}", "button"), "openMenuButton");
        assert_eq!(semantic_element_id("\u{1F50D}", "button"), "searchButton");
        // unknown glyph falls back to the bare suffix
        assert_eq!(semantic_element_id("%", "button"), "Button");
    }

    #[test]
    fn icon_mapper_knows_common_hints() {
        assert_eq!(
            infer_icon_semantic_name(" Dismiss "),
            Some("closeModalButton".to_string())
        );
        assert_eq!(
            infer_icon_semantic_name("hamburger"),
            Some("openMenuButton".to_string())
        );
        assert_eq!(infer_icon_semantic_name("submit"), None);
    }

    #[test]
    fn fallbacks_are_text_first_then_synthesized_testid() {
        let attrs = extractor_parts().0;
        let fallbacks = fallback_selectors("button.primary", "Sign In", &attrs);
        assert_eq!(
            fallbacks,
            vec!["text=Sign In".to_string(), "[data-testid='sign-in']".to_string()]
        );
    }

    #[test]
    fn testid_primary_suppresses_synthesized_fallback() {
        let attrs = extractor_parts().0;
        let fallbacks = fallback_selectors("[data-testid='sign-in']", "Sign In", &attrs);
        assert_eq!(fallbacks, vec!["text=Sign In".to_string()]);
        // any preferred attribute counts as stable, not just the first
        let fallbacks = fallback_selectors("[data-qa='sign-in']", "Sign In", &attrs);
        assert_eq!(fallbacks, vec!["text=Sign In".to_string()]);
    }

    #[test]
    fn build_page_model_for_login_summary() {
        let (attrs, rules) = extractor_parts();
        let extractor = Extractor::new(&attrs, &rules);
        let summary = DomSummary {
            fingerprint: "fp".into(),
            landmarks: vec!["main".into()],
            elements: vec![
                raw("textbox", "Username", "input[name='username']"),
                raw("textbox", "Password", "input[name='password']"),
                raw("button", "Sign In", "button.primary"),
            ],
            links: vec!["https://example.com/forgot-password".into()],
        };

        let page = extractor.build_page_model("https://example.com/login", &summary);
        assert_eq!(page.page_name, "LoginPage");
        assert_eq!(page.page_id, "login");
        assert_eq!(page.route, "/login");
        assert_eq!(page.sections.len(), 1);
        assert_eq!(page.sections[0].name, MAIN_SECTION);

        let ids: Vec<&str> = page.elements().map(|e| e.element_id.as_str()).collect();
        assert_eq!(ids, vec!["usernameInput", "passwordInput", "signInButton"]);
        assert_eq!(page.actions.len(), 1);
        assert_eq!(page.actions[0].name, "login");
        assert_eq!(page.discovered_links, summary.links);

        for element in page.elements() {
            assert_eq!(element.confidence.value(), BASELINE_CONFIDENCE);
            assert_eq!(element.section, MAIN_SECTION);
        }
    }

    #[test]
    fn malformed_elements_default_instead_of_failing() {
        let (attrs, rules) = extractor_parts();
        let extractor = Extractor::new(&attrs, &rules);
        let summary = DomSummary {
            elements: vec![RawElement::default()],
            ..Default::default()
        };

        let page = extractor.build_page_model("::broken::", &summary);
        assert_eq!(page.page_name, "HomePage");
        let element = page.elements().next().unwrap();
        assert_eq!(element.label, "Element");
        assert_eq!(element.role, "generic");
        assert_eq!(element.element_id, "elementLink");
        assert_eq!(element.selector, "");
    }

    #[test]
    fn colliding_ids_get_numeric_suffixes() {
        let (attrs, rules) = extractor_parts();
        let extractor = Extractor::new(&attrs, &rules);
        let summary = DomSummary {
            elements: vec![
                raw("link", "Login", "a[href='/login']"),
                raw("link", "Login", "footer a[href='/login']"),
                raw("link", "Login", "nav a[href='/login']"),
            ],
            ..Default::default()
        };

        let page = extractor.build_page_model("https://example.com/", &summary);
        let ids: Vec<&str> = page.elements().map(|e| e.element_id.as_str()).collect();
        assert_eq!(ids, vec!["loginLink", "loginLink2", "loginLink3"]);
    }

    #[test]
    fn compact_dom_keeps_interactive_nodes_only() {
        let nodes = vec![
            RawNode {
                tag: "div".into(),
                text: Some("Welcome".into()),
                selector: "div.hero".into(),
                ..Default::default()
            },
            RawNode {
                tag: "a".into(),
                role: "link".into(),
                text: Some("Login".into()),
                attributes: BTreeMap::from([("href".to_string(), "/login".to_string())]),
                selector: "a[href='/login']".into(),
                ..Default::default()
            },
            RawNode {
                tag: "button".into(),
                role: "button".into(),
                text: Some("Sign In".into()),
                selector: "button.primary".into(),
                section: Some("navbar".into()),
                ..Default::default()
            },
            RawNode {
                tag: "span".into(),
                attributes: BTreeMap::from([("tabindex".to_string(), "0".to_string())]),
                aria_label: Some("Expand".into()),
                selector: "span.expander".into(),
                ..Default::default()
            },
        ];

        let summary = compact_dom(&nodes, 120);
        assert_eq!(summary.elements.len(), 3);
        assert_eq!(summary.landmarks, vec!["mainContent", "navbar"]);
        assert_eq!(summary.fingerprint, "compact::3::mainContent,navbar");
        assert_eq!(summary.links, vec!["/login"]);
        // aria label backs up missing text
        assert_eq!(summary.elements[2].label.as_deref(), Some("Expand"));
        assert_eq!(summary.elements[2].role.as_deref(), Some("generic"));
    }

    #[test]
    fn compact_dom_caps_at_max_nodes() {
        let nodes: Vec<RawNode> = (0..10)
            .map(|i| RawNode {
                tag: "button".into(),
                role: "button".into(),
                text: Some(format!("B{i}")),
                selector: format!("button#b{i}"),
                ..Default::default()
            })
            .collect();

        let summary = compact_dom(&nodes, 4);
        assert_eq!(summary.elements.len(), 4);
        assert_eq!(summary.fingerprint, "compact::4::mainContent");
    }

    #[test]
    fn compact_dom_skips_unfollowable_hrefs() {
        let nodes = vec![
            RawNode {
                tag: "a".into(),
                role: "link".into(),
                text: Some("Anchor".into()),
                attributes: BTreeMap::from([("href".to_string(), "#top".to_string())]),
                selector: "a.anchor".into(),
                ..Default::default()
            },
            RawNode {
                tag: "a".into(),
                role: "link".into(),
                text: Some("Mail".into()),
                attributes: BTreeMap::from([(
                    "href".to_string(),
                    "mailto:hi@example.com".to_string(),
                )]),
                selector: "a.mail".into(),
                ..Default::default()
            },
        ];
        let summary = compact_dom(&nodes, 120);
        assert_eq!(summary.elements.len(), 2);
        assert!(summary.links.is_empty());
    }
}
