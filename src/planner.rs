//! Trip planning pipeline: extract, enrich, compose, generate.
//!
//! Everything before generation is soft-fail and always produces a
//! `PlanDraft`. Generation is the single hard dependency.

use crate::agent::{self, AgentError, GeminiModelClient, Itinerary, LanguageModel};
use crate::attractions::{fetch_attractions, AttractionHint};
use crate::config::Config;
use crate::extract::extract;
use crate::prompt::{compose, ComposedPrompt, PromptSettings};
use crate::trip::TripRequest;
use crate::weather::{WeatherEnricher, WeatherSummary};
use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("itinerary generation failed: {0}")]
    Generation(#[from] AgentError),
}

/// Every intermediate value of a plan, ready to hand to the model
#[derive(Debug, Clone)]
pub struct PlanDraft {
    pub trip: TripRequest,
    pub weather: WeatherSummary,
    pub attractions: Vec<AttractionHint>,
    pub prompt: ComposedPrompt,
}

/// Owns the collaborators for one planning session
pub struct Planner {
    model: Box<dyn LanguageModel>,
    weather: WeatherEnricher,
    settings: PromptSettings,
    attraction_count: usize,
}

impl Planner {
    pub fn new(
        model: Box<dyn LanguageModel>,
        weather: WeatherEnricher,
        settings: PromptSettings,
        attraction_count: usize,
    ) -> Self {
        Self {
            model,
            weather,
            settings,
            attraction_count,
        }
    }

    /// Gemini plus OpenWeatherMap (when keyed), both from config.
    ///
    /// Fails only when the Gemini key is missing.
    pub fn from_config(config: &Config) -> Result<Self, AgentError> {
        let model = GeminiModelClient::from_config(config)?;
        Ok(Self::new(
            Box::new(model),
            WeatherEnricher::from_config(config),
            PromptSettings::from_config(config),
            config.prompt.attraction_count,
        ))
    }

    /// Turn a free-text request into an itinerary
    pub async fn plan_trip(&self, raw_text: &str) -> Result<Itinerary, PlanError> {
        let draft = self.prepare(raw_text).await;
        self.generate(&draft).await
    }

    /// Run every stage up to, but not including, generation
    pub async fn prepare(&self, raw_text: &str) -> PlanDraft {
        self.prepare_on(raw_text, Utc::now().date_naive()).await
    }

    /// `prepare` with an explicit "today" for the weather window
    pub async fn prepare_on(&self, raw_text: &str, today: NaiveDate) -> PlanDraft {
        let trip = extract(raw_text);
        let destination = trip.primary_destination().unwrap_or_default();

        let weather = self
            .weather
            .fetch_weather_on(destination, trip.start_date, today)
            .await;

        let attractions = if destination.is_empty() {
            Vec::new()
        } else {
            fetch_attractions(self.model.as_ref(), destination, self.attraction_count).await
        };

        let prompt = compose(&trip, &weather, &attractions, &self.settings);

        PlanDraft {
            trip,
            weather,
            attractions,
            prompt,
        }
    }

    /// Send a prepared draft to the model
    pub async fn generate(&self, draft: &PlanDraft) -> Result<Itinerary, PlanError> {
        info!(
            destination = draft.trip.primary_destination().unwrap_or("unspecified"),
            prompt_chars = draft.prompt.char_count(),
            "generating itinerary"
        );
        let itinerary = agent::generate(self.model.as_ref(), &draft.prompt).await?;
        Ok(itinerary)
    }
}
