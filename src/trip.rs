//! Trip request - the structured form of a free-text travel ask.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Structured trip parameters pulled out of the user's text.
///
/// Every field other than `raw_text` is best-effort. An empty destination list
/// and unset optionals are valid and simply mean the model has to work from
/// the raw text alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    /// The user's text exactly as given
    pub raw_text: String,
    /// Candidate destinations in order of first appearance
    pub destinations: Vec<String>,
    /// Trip length in days, only when stated
    pub duration_days: Option<u32>,
    /// First explicit calendar date found in the text
    pub start_date: Option<NaiveDate>,
    /// Every date-like phrase (months, seasons, explicit dates) in order
    pub date_hints: Vec<String>,
    /// Whatever is left once the recognised fields are removed
    pub notes: String,
}

impl TripRequest {
    /// A request with nothing extracted beyond the raw text
    pub fn bare(raw_text: &str) -> Self {
        Self {
            raw_text: raw_text.to_string(),
            destinations: Vec::new(),
            duration_days: None,
            start_date: None,
            date_hints: Vec::new(),
            notes: String::new(),
        }
    }

    /// The destination that gets weather and attraction enrichment.
    ///
    /// Multi-city requests are passed through to the prompt in full, but only
    /// the first city is enriched.
    pub fn primary_destination(&self) -> Option<&str> {
        self.destinations.first().map(String::as_str)
    }

    /// Check if extraction found anything at all
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
            && self.duration_days.is_none()
            && self.start_date.is_none()
            && self.date_hints.is_empty()
    }
}
