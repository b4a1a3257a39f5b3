//! End-to-end planning scenarios with stub collaborators.

use async_trait::async_trait;
use chrono::NaiveDate;
use itinera::weather::{Observation, UnavailableReason, WeatherError};
use itinera::{
    AgentError, LanguageModel, PlanError, Planner, PromptSettings, WeatherEnricher, WeatherProvider,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Answers attraction prompts with a fixed list and itinerary prompts with
/// `itinerary`, recording every prompt
struct StubModel {
    itinerary: Result<String, String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.starts_with("List ") {
            return Ok("- Louvre Museum: Art museum\n- Eiffel Tower: Iron tower".to_string());
        }
        match &self.itinerary {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(AgentError::from_provider_message(message.clone())),
        }
    }
}

struct StubWeather {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl WeatherProvider for StubWeather {
    async fn current(&self, place: &str) -> Result<Observation, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Observation {
            location: format!("{place}, FR"),
            condition: "clear sky".to_string(),
            temperature_c: 22.5,
        })
    }

    async fn forecast(&self, place: &str, _date: NaiveDate) -> Result<Observation, WeatherError> {
        self.current(place).await
    }
}

struct Harness {
    planner: Planner,
    prompts: Arc<Mutex<Vec<String>>>,
    weather_calls: Arc<AtomicUsize>,
}

fn harness(itinerary: Result<&str, &str>) -> Harness {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let weather_calls = Arc::new(AtomicUsize::new(0));

    let model = StubModel {
        itinerary: itinerary.map(str::to_string).map_err(str::to_string),
        prompts: prompts.clone(),
    };
    let weather = StubWeather {
        calls: weather_calls.clone(),
    };

    Harness {
        planner: Planner::new(
            Box::new(model),
            WeatherEnricher::new(Some(Box::new(weather)), 5),
            PromptSettings::default(),
            5,
        ),
        prompts,
        weather_calls,
    }
}

#[tokio::test]
async fn paris_request_gets_weather_and_attractions() {
    let h = harness(Ok("# 5 Days in Paris\n## Day 1"));

    let itinerary = h.planner.plan_trip("5 days in Paris in June").await.unwrap();
    assert_eq!(itinerary.as_str(), "# 5 Days in Paris\n## Day 1");
    assert_eq!(h.weather_calls.load(Ordering::SeqCst), 1);

    let prompts = h.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    let final_prompt = prompts.last().unwrap();
    assert!(final_prompt.contains("5 days in Paris in June"));
    assert!(final_prompt.contains("- Destinations: Paris"));
    assert!(final_prompt.contains("- Duration: 5 days"));
    assert!(final_prompt.contains("- Dates: June"));
    assert!(final_prompt.contains("Current weather in Paris, FR: clear sky, 22.5°C"));
    assert!(final_prompt.contains("- Eiffel Tower: Iron tower"));
}

#[tokio::test]
async fn vague_request_still_produces_an_itinerary() {
    let h = harness(Ok("# A relaxing getaway"));

    let draft = h.planner.prepare("I just want a vacation").await;
    assert!(draft.trip.destinations.is_empty());
    assert_eq!(draft.trip.duration_days, None);
    assert_eq!(draft.weather.unavailable_reason, Some(UnavailableReason::NoDestination));
    assert!(draft.attractions.is_empty());

    let itinerary = h.planner.generate(&draft).await.unwrap();
    assert_eq!(itinerary.as_str(), "# A relaxing getaway");
    assert_eq!(h.weather_calls.load(Ordering::SeqCst), 0);

    let prompts = h.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("I just want a vacation"));
    assert!(!prompts[0].contains("Current weather in"));
}

#[tokio::test]
async fn quota_exhaustion_fails_the_plan() {
    let h = harness(Err("429 RESOURCE_EXHAUSTED: quota exceeded"));

    let result = h.planner.plan_trip("5 days in Paris in June").await;
    match result {
        Err(PlanError::Generation(AgentError::QuotaExceeded(message))) => {
            assert!(message.contains("429"));
        }
        other => panic!("expected a quota failure, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_weather_provider_is_a_degraded_mode() {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let model = StubModel {
        itinerary: Ok("# Rome".to_string()),
        prompts: prompts.clone(),
    };
    let planner = Planner::new(
        Box::new(model),
        WeatherEnricher::new(None, 5),
        PromptSettings::default(),
        3,
    );

    let draft = planner.prepare("3 days in Rome").await;
    assert_eq!(draft.weather.unavailable_reason, Some(UnavailableReason::MissingCredential));
    assert_eq!(draft.attractions.len(), 2);
    assert!(prompts.lock().unwrap()[0].starts_with("List 3 "));

    let itinerary = planner.generate(&draft).await.unwrap();
    assert_eq!(itinerary.as_str(), "# Rome");
}
