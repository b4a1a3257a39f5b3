//! Attraction hints: a short list of notable sights used as prompt context.
//!
//! Best-effort only. Any failure yields an empty list.

use crate::agent::{strip_code_fence, LanguageModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One notable attraction with a one-line descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttractionHint {
    pub name: String,
    /// May be empty when the model gave only a name
    pub descriptor: String,
}

/// Ask the model for `count` attractions in `destination`.
pub async fn fetch_attractions(
    model: &dyn LanguageModel,
    destination: &str,
    count: usize,
) -> Vec<AttractionHint> {
    let destination = destination.trim();
    if destination.is_empty() || count == 0 {
        return Vec::new();
    }

    let response = match model.complete(&attractions_prompt(destination, count)).await {
        Ok(text) => text,
        Err(e) => {
            warn!(destination, error = %e, "attraction lookup failed, continuing without");
            return Vec::new();
        }
    };

    let hints = parse_attractions(&response, count);
    if hints.is_empty() {
        warn!(destination, "could not parse any attractions from the model response");
    } else {
        debug!(destination, count = hints.len(), "attraction hints ready");
    }
    hints
}

fn attractions_prompt(destination: &str, count: usize) -> String {
    format!(
        r#"List {count} real, popular tourist attractions in {destination}.

Write one attraction per line, formatted exactly as:
- Name: one-line description

Do not include any introduction, headings, or closing remarks."#
    )
}

/// The shape the model sometimes answers in despite the line format
#[derive(Debug, Deserialize)]
struct JsonAttraction {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Option<String>,
}

/// Parse a model response into at most `count` hints.
///
/// Accepts a JSON array of `{name, description}` objects or a bulleted or
/// numbered list; anything else gives an empty list.
pub fn parse_attractions(text: &str, count: usize) -> Vec<AttractionHint> {
    let body = strip_code_fence(text);

    if body.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<JsonAttraction>>(body) {
            return items
                .into_iter()
                .filter_map(from_json)
                .take(count)
                .collect();
        }
    }

    body.lines()
        .filter_map(strip_list_marker)
        .filter_map(split_hint)
        .take(count)
        .collect()
}

fn from_json(item: JsonAttraction) -> Option<AttractionHint> {
    let name = clean(&item.name);
    if name.is_empty() {
        return None;
    }

    let description = clean(&item.description);
    let descriptor = match item.category.as_deref().map(clean) {
        Some(category) if !category.is_empty() && !description.is_empty() => {
            format!("{description} ({category})")
        }
        Some(category) if !category.is_empty() => category,
        _ => description,
    };

    Some(AttractionHint { name, descriptor })
}

fn strip_list_marker(line: &str) -> Option<&str> {
    let line = line.trim();

    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return Some(rest.trim());
        }
    }

    // "1. " or "1) "
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if (1..=2).contains(&digits) {
        let rest = &line[digits..];
        return rest
            .strip_prefix(". ")
            .or_else(|| rest.strip_prefix(") "))
            .map(str::trim);
    }

    None
}

fn split_hint(item: &str) -> Option<AttractionHint> {
    let item = clean(item);

    // Earliest separator wins, so "Tower - views: great" splits at " - "
    let split = [": ", " - ", " – ", " — "]
        .iter()
        .filter_map(|sep| item.find(sep).map(|at| (at, sep.len())))
        .min_by_key(|(at, _)| *at);

    let (name, descriptor) = match split {
        Some((at, len)) => (item[..at].trim(), item[at + len..].trim()),
        None => (item.as_str(), ""),
    };

    if name.is_empty() {
        return None;
    }

    Some(AttractionHint {
        name: name.to_string(),
        descriptor: descriptor.to_string(),
    })
}

fn clean(text: &str) -> String {
    text.replace("**", "").trim().to_string()
}
