//! Rule-based action inference. Each rule is an independent predicate
//! over the route and the page's element-id set paired with an action
//! template; adding a rule never touches existing ones.

use crate::types::{ActionModel, ActionStep, ElementModel};
use std::collections::BTreeSet;

pub struct ActionRule {
    pub name: &'static str,
    pub applies: fn(route: &str, element_ids: &BTreeSet<&str>) -> bool,
    pub build: fn() -> ActionModel,
}

pub struct ActionRuleSet {
    rules: Vec<ActionRule>,
}

impl ActionRuleSet {
    /// The built-in registry. Currently one rule: login-form detection.
    pub fn builtin() -> Self {
        Self {
            rules: vec![login_rule()],
        }
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: ActionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn infer(&self, route: &str, elements: &[ElementModel]) -> Vec<ActionModel> {
        let element_ids: BTreeSet<&str> =
            elements.iter().map(|e| e.element_id.as_str()).collect();
        self.rules
            .iter()
            .filter(|rule| (rule.applies)(route, &element_ids))
            .map(|rule| (rule.build)())
            .collect()
    }
}

fn login_rule() -> ActionRule {
    ActionRule {
        name: "login",
        applies: |route, ids| {
            route == "/login"
                && ["usernameInput", "passwordInput", "signInButton"]
                    .iter()
                    .all(|id| ids.contains(id))
        },
        build: || ActionModel {
            name: "login".into(),
            params: vec!["username".into(), "password".into()],
            steps: vec![
                ActionStep::Fill {
                    target: "usernameInput".into(),
                    arg: "username".into(),
                },
                ActionStep::Fill {
                    target: "passwordInput".into(),
                    arg: "password".into(),
                },
                ActionStep::Click {
                    target: "signInButton".into(),
                },
            ],
            post_condition: Some("dashboardLoaded".into()),
        },
    }
}
