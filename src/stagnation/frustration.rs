//! User frustration detection.

use super::types::FrustrationIndicator;
use regex::Regex;

/// Matches user text against the frustration indicator families.
#[derive(Debug)]
pub struct FrustrationDetector {
    families: Vec<(Regex, FrustrationIndicator)>,
}

impl FrustrationDetector {
    /// Builds a detector with every indicator family.
    #[must_use]
    pub fn new() -> Self {
        let families = FrustrationIndicator::all()
            .into_iter()
            .filter_map(|indicator| Regex::new(indicator.pattern()).ok().map(|re| (re, indicator)))
            .collect();

        Self { families }
    }

    /// Returns the first indicator family that matches, in declaration order.
    ///
    /// Later families are not consulted once one matches, so a message yields
    /// at most one indicator.
    #[must_use]
    pub fn detect(&self, text: &str) -> Option<FrustrationIndicator> {
        self.families
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, indicator)| *indicator)
    }
}

impl Default for FrustrationDetector {
    fn default() -> Self {
        Self::new()
    }
}
