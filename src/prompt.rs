//! Prompt composition for the itinerary call.
//!
//! `compose` is a pure function of its inputs. Context sections are added
//! only when there is something to say, and dropped lowest-value first when the
//! prompt grows past the configured size.

use crate::attractions::AttractionHint;
use crate::config::Config;
use crate::trip::TripRequest;
use crate::weather::WeatherSummary;
use std::fmt;
use tracing::debug;

/// Output requirements appended to every itinerary prompt
const INSTRUCTIONS: &str = "Create a comprehensive day-by-day itinerary in Markdown format with:
1. A title and brief introduction
2. Key information (dates, duration, destinations)
3. A day-by-day breakdown with:
   - Morning, afternoon, and evening activities
   - Specific attraction recommendations, preferring any listed above
   - Meal suggestions
   - Accommodation recommendations
4. A budget estimate
5. Travel tips that take the weather and local conditions into account

If the duration is not specified, choose a sensible trip length and say so.

IMPORTANT: Do not use asterisks (**) for emphasis. Use headers (##) instead.";

/// The single prompt sent to the itinerary model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt(String);

impl ComposedPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for ComposedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed prompt settings, taken from config once
#[derive(Debug, Clone)]
pub struct PromptSettings {
    /// Opening line
    pub persona: String,
    /// Soft size ceiling in characters
    pub max_chars: usize,
}

impl PromptSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            persona: config.agent.persona.clone(),
            max_chars: config.prompt.max_chars,
        }
    }
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Copy)]
struct Sections {
    attractions: bool,
    weather: bool,
    notes: bool,
}

/// Build the itinerary prompt.
///
/// The raw request, extracted fields and instructions are always present. If
/// the result is over `settings.max_chars`, attractions are dropped, then
/// weather, then the notes line.
pub fn compose(
    trip: &TripRequest,
    weather: &WeatherSummary,
    attractions: &[AttractionHint],
    settings: &PromptSettings,
) -> ComposedPrompt {
    let mut include = Sections {
        attractions: !attractions.is_empty(),
        weather: !weather.source_unavailable,
        notes: !trip.notes.trim().is_empty(),
    };

    let mut prompt = render(trip, weather, attractions, settings, include);

    let trims: [fn(&mut Sections); 3] = [
        |s| s.attractions = false,
        |s| s.weather = false,
        |s| s.notes = false,
    ];
    for trim in trims {
        if prompt.chars().count() <= settings.max_chars {
            break;
        }
        trim(&mut include);
        prompt = render(trip, weather, attractions, settings, include);
    }

    debug!(
        chars = prompt.chars().count(),
        max_chars = settings.max_chars,
        attractions = include.attractions,
        weather = include.weather,
        notes = include.notes,
        "composed itinerary prompt"
    );

    ComposedPrompt(prompt)
}

fn render(
    trip: &TripRequest,
    weather: &WeatherSummary,
    attractions: &[AttractionHint],
    settings: &PromptSettings,
    include: Sections,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(settings.persona.trim().to_string());
    lines.push(String::new());

    let fence = fence_for(&trip.raw_text);
    lines.push(fence.clone());
    lines.push(trip.raw_text.clone());
    lines.push(fence);
    lines.push(String::new());

    lines.push("Extracted information:".to_string());
    lines.push(format!("- Destinations: {}", or_unspecified(&trip.destinations.join(", "))));
    lines.push(format!(
        "- Duration: {}",
        trip.duration_days
            .map_or_else(|| "Not specified".to_string(), |d| format!("{d} days"))
    ));
    lines.push(format!("- Dates: {}", or_unspecified(&trip.date_hints.join(", "))));
    if let Some(start) = trip.start_date {
        lines.push(format!("- Start date: {}", start.format("%Y-%m-%d")));
    }
    if include.notes {
        lines.push(format!("- Notes: {}", trip.notes.trim()));
    }
    lines.push(String::new());

    if include.weather {
        lines.push(weather_clause(weather));
        lines.push(String::new());
    }

    if include.attractions {
        let place = trip.primary_destination().unwrap_or("the destination");
        lines.push(format!("Notable attractions in {place}:"));
        for hint in attractions {
            if hint.descriptor.is_empty() {
                lines.push(format!("- {}", hint.name));
            } else {
                lines.push(format!("- {}: {}", hint.name, hint.descriptor));
            }
        }
        lines.push(String::new());
    }

    lines.push(INSTRUCTIONS.to_string());
    lines.join("\n")
}

fn weather_clause(weather: &WeatherSummary) -> String {
    let reading = match weather.format_temperature() {
        Some(temp) => format!("{}, {temp}", weather.condition_text),
        None => weather.condition_text.clone(),
    };

    match weather.observed_for {
        Some(day) if weather.forecast_available => format!(
            "Weather forecast for {} on {}: {reading}",
            weather.location(),
            day.format("%Y-%m-%d")
        ),
        _ => format!("Current weather in {}: {reading}", weather.location()),
    }
}

fn or_unspecified(value: &str) -> &str {
    if value.is_empty() {
        "Not specified"
    } else {
        value
    }
}

/// A backtick fence longer than any backtick run inside `text`
fn fence_for(text: &str) -> String {
    let longest_run = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat((longest_run + 1).max(3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::weather::UnavailableReason;
    use chrono::NaiveDate;

    fn sunny(destination: &str) -> WeatherSummary {
        WeatherSummary {
            destination: destination.to_string(),
            condition_text: "clear sky".to_string(),
            temperature_c: Some(24.0),
            forecast_available: false,
            source_unavailable: false,
            reported_location: Some(format!("{destination}, FR")),
            observed_for: None,
            unavailable_reason: None,
        }
    }

    fn hints() -> Vec<AttractionHint> {
        vec![
            AttractionHint {
                name: "Louvre Museum".to_string(),
                descriptor: "World's largest art museum".to_string(),
            },
            AttractionHint {
                name: "Sainte-Chapelle".to_string(),
                descriptor: String::new(),
            },
        ]
    }

    fn has_weather_clause(prompt: &ComposedPrompt) -> bool {
        prompt.as_str().contains("Current weather in")
            || prompt.as_str().contains("Weather forecast for")
    }

    #[test]
    fn contains_raw_text_verbatim() {
        for raw in [
            "5 days in Paris in June",
            "",
            "quote \"\"\" and ``` fences ``` inside",
            "multi\nline\n\nrequest",
        ] {
            let trip = extract(raw);
            let prompt = compose(&trip, &sunny("Paris"), &hints(), &PromptSettings::default());
            assert!(prompt.as_str().contains(raw));
        }
    }

    #[test]
    fn fence_outgrows_backticks_in_text() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("has ``` inside"), "````");
        assert_eq!(fence_for("`````"), "``````");

        let trip = extract("use ``` here");
        let prompt = compose(&trip, &sunny("x"), &[], &PromptSettings::default());
        assert!(prompt.as_str().contains("````\nuse ``` here\n````"));
    }

    #[test]
    fn weather_clause_follows_availability() {
        let trip = extract("5 days in Paris in June");
        let settings = PromptSettings::default();

        let with = compose(&trip, &sunny("Paris"), &[], &settings);
        assert!(has_weather_clause(&with));
        assert!(with.as_str().contains("Current weather in Paris, FR: clear sky, 24.0°C"));

        let without = compose(
            &trip,
            &WeatherSummary::unavailable("Paris", UnavailableReason::ProviderFailure),
            &[],
            &settings,
        );
        assert!(!has_weather_clause(&without));
    }

    #[test]
    fn forecast_clause_names_the_day() {
        let trip = extract("Paris on 2026-06-12");
        let mut weather = sunny("Paris");
        weather.forecast_available = true;
        weather.observed_for = NaiveDate::from_ymd_opt(2026, 6, 12);
        let prompt = compose(&trip, &weather, &[], &PromptSettings::default());
        assert!(prompt
            .as_str()
            .contains("Weather forecast for Paris, FR on 2026-06-12: clear sky, 24.0°C"));
        assert!(prompt.as_str().contains("- Start date: 2026-06-12"));
    }

    #[test]
    fn attractions_clause_only_when_present() {
        let trip = extract("5 days in Paris in June");
        let settings = PromptSettings::default();

        let with = compose(&trip, &sunny("Paris"), &hints(), &settings);
        assert!(with.as_str().contains("Notable attractions in Paris:"));
        assert!(with.as_str().contains("- Louvre Museum: World's largest art museum"));
        assert!(with.as_str().contains("- Sainte-Chapelle\n"));

        let without = compose(&trip, &sunny("Paris"), &[], &settings);
        assert!(!without.as_str().contains("Notable attractions"));
    }

    #[test]
    fn lists_extracted_fields() {
        let trip = extract("Plan a 7-day trip to Tokyo and Kyoto in autumn for a solo traveler");
        let prompt = compose(
            &trip,
            &WeatherSummary::unavailable("Tokyo", UnavailableReason::MissingCredential),
            &[],
            &PromptSettings::default(),
        );
        assert!(prompt.as_str().contains("- Destinations: Tokyo, Kyoto"));
        assert!(prompt.as_str().contains("- Duration: 7 days"));
        assert!(prompt.as_str().contains("- Dates: autumn"));
        assert!(prompt.as_str().ends_with(INSTRUCTIONS));
    }

    #[test]
    fn unspecified_fields_say_so() {
        let trip = extract("I just want a vacation");
        let prompt = compose(
            &trip,
            &WeatherSummary::unavailable("", UnavailableReason::NoDestination),
            &[],
            &PromptSettings::default(),
        );
        assert!(prompt.as_str().contains("- Destinations: Not specified"));
        assert!(prompt.as_str().contains("- Duration: Not specified"));
        assert!(prompt.as_str().contains("- Dates: Not specified"));
    }

    #[test]
    fn is_deterministic() {
        let trip = extract("5 days in Paris in June with my family");
        let settings = PromptSettings::default();
        let first = compose(&trip, &sunny("Paris"), &hints(), &settings);
        let second = compose(&trip, &sunny("Paris"), &hints(), &settings);
        assert_eq!(first.as_str().as_bytes(), second.as_str().as_bytes());
    }

    #[test]
    fn trims_lowest_value_context_first() {
        let trip = extract("5 days in Paris in June with my family");
        assert_eq!(trip.notes, "with my family");

        let roomy = PromptSettings::default();
        let weather = sunny("Paris");
        let unavailable = WeatherSummary::unavailable("Paris", UnavailableReason::ProviderFailure);

        let full = compose(&trip, &weather, &hints(), &roomy);
        let no_attractions = compose(&trip, &weather, &[], &roomy);
        let no_weather = compose(&trip, &unavailable, &[], &roomy);
        let mut bare_trip = trip.clone();
        bare_trip.notes.clear();
        let no_notes = compose(&bare_trip, &unavailable, &[], &roomy);

        let tight = |max_chars| PromptSettings {
            max_chars,
            ..PromptSettings::default()
        };

        assert_eq!(compose(&trip, &weather, &hints(), &tight(full.char_count())), full);
        assert_eq!(
            compose(&trip, &weather, &hints(), &tight(no_attractions.char_count())),
            no_attractions
        );
        assert_eq!(
            compose(&trip, &weather, &hints(), &tight(no_weather.char_count())),
            no_weather
        );

        let squeezed = compose(&trip, &weather, &hints(), &tight(10));
        assert_eq!(squeezed, no_notes);
        assert!(squeezed.as_str().contains(&trip.raw_text));
        assert!(squeezed.as_str().ends_with(INSTRUCTIONS));
    }
}
