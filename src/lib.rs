//! # Itinera
//!
//! Turns a free-text travel request into a day-by-day Markdown itinerary.
//!
//! ## Pipeline
//!
//! - **Extraction**: destinations, duration and dates pulled from the text with
//!   hand-written scanners, never failing
//! - **Enrichment**: current weather or a short-range forecast for the first
//!   destination, plus a few notable attractions
//! - **Composition**: one deterministic, size-bounded prompt
//! - **Generation**: a single language model call, the only hard dependency
//!
//! Weather and the language model sit behind traits, so the whole pipeline runs
//! against stubs in tests.

pub mod agent;
pub mod attractions;
pub mod config;
pub mod extract;
pub mod planner;
pub mod prompt;
pub mod trip;
pub mod weather;

pub use agent::{AgentError, Itinerary, LanguageModel};
pub use attractions::AttractionHint;
pub use config::Config;
pub use planner::{PlanDraft, PlanError, Planner};
pub use prompt::{ComposedPrompt, PromptSettings};
pub use trip::TripRequest;
pub use weather::{WeatherEnricher, WeatherProvider, WeatherSummary};
