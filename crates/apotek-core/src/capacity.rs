//! # Capacity Parsing
//!
//! Splits a free-text capacity string like `"500mg"` or `"12.5 ml"` into a
//! numeric magnitude and a unit token. The parsed pair feeds the tier-2
//! alternative matching rule (same unit, magnitude within ±20%).
//!
//! Malformed strings are not an error: parsing simply yields `None` and the
//! medicine keeps its raw capacity text with the numeric fields unset.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CAPACITY_TOLERANCE;

/// Leading numeric token followed by an alphabetic unit: `500mg`, `12.5 ml`.
fn capacity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*([a-z]+)").expect("valid capacity regex"))
}

/// A parsed capacity: magnitude plus lowercase unit token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capacity {
    pub value: f64,
    pub unit: String,
}

impl Capacity {
    /// Parses a capacity string.
    ///
    /// The input is lowercased first, so `"500MG"` and `"500mg"` parse the
    /// same. Returns `None` when no leading numeric token is found.
    ///
    /// ## Example
    /// ```rust
    /// use apotek_core::capacity::Capacity;
    ///
    /// let c = Capacity::parse("500mg").unwrap();
    /// assert_eq!(c.value, 500.0);
    /// assert_eq!(c.unit, "mg");
    ///
    /// assert!(Capacity::parse("botol besar").is_none());
    /// ```
    pub fn parse(capacity: &str) -> Option<Capacity> {
        let lowered = capacity.trim().to_lowercase();
        let caps = capacity_re().captures(&lowered)?;
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str().to_string();
        Some(Capacity { value, unit })
    }

    /// Whether `other` lies within the default ±20% tolerance band of this
    /// capacity. Units must match exactly; `500mg` never matches `500ml`.
    pub fn within_tolerance(&self, other: &Capacity) -> bool {
        if self.unit != other.unit {
            return false;
        }
        let tolerance = self.value * CAPACITY_TOLERANCE;
        (self.value - tolerance..=self.value + tolerance).contains(&other.value)
    }

    /// Inclusive (min, max) bounds of the tolerance band, for SQL BETWEEN.
    pub fn tolerance_bounds(&self) -> (f64, f64) {
        let tolerance = self.value * CAPACITY_TOLERANCE;
        (self.value - tolerance, self.value + tolerance)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
