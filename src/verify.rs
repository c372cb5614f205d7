//! Selector verification and healing. One pass per element, three
//! terminal states: primary verified, healed from a fallback, or
//! decayed. The constants here are behavioral policy and are pinned by
//! tests.

use crate::types::PageModel;

pub const PRIMARY_BOOST: f64 = 0.05;
pub const PRIMARY_CAP: f64 = 0.99;
pub const FALLBACK_BOOST: f64 = 0.02;
pub const HEALED_CAP: f64 = 0.95;
pub const MISS_PENALTY: f64 = 0.2;
pub const CONFIDENCE_FLOOR: f64 = 0.3;
pub const VISIBILITY_TIMEOUT_MS: u64 = 1500;

/// Narrow live-page oracle the verifier depends on. Every driver
/// implements it; tests substitute a fixed-set fake.
pub trait VisibilityOracle {
    fn is_visible(&self, selector: &str, timeout_ms: u64) -> bool;
}

pub struct SelectorVerifier<'a, O: VisibilityOracle + ?Sized> {
    oracle: &'a O,
}

impl<'a, O: VisibilityOracle + ?Sized> SelectorVerifier<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self { oracle }
    }

    /// Verify every element of the page in place. Re-running converges:
    /// each call lands every element in exactly one terminal state.
    pub fn verify_and_heal(&self, page: &mut PageModel) {
        for section in &mut page.sections {
            for element in &mut section.elements {
                if self
                    .oracle
                    .is_visible(&element.selector, VISIBILITY_TIMEOUT_MS)
                {
                    element.confidence = element.confidence.boosted(PRIMARY_BOOST, PRIMARY_CAP);
                    continue;
                }

                let healed = element
                    .fallback_selectors
                    .iter()
                    .find(|candidate| self.oracle.is_visible(candidate, VISIBILITY_TIMEOUT_MS))
                    .cloned();
                match healed {
                    Some(candidate) => {
                        element.selector = candidate;
                        element.confidence =
                            element.confidence.boosted(FALLBACK_BOOST, HEALED_CAP);
                    }
                    None => {
                        // a broken locator is reported via decay, never dropped
                        element.confidence =
                            element.confidence.decayed(MISS_PENALTY, CONFIDENCE_FLOOR);
                    }
                }
            }
        }
    }
}
