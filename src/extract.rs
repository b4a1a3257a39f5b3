//! Field extraction from free-text travel requests.
//!
//! A few small token scanners (dates, number + unit, capitalised phrases) run
//! over the same token list and mark the tokens they consume. None of them can
//! fail: `extract` returns a `TripRequest` for any input, possibly with every
//! optional field unset, and leaves interpretation to the model.

use crate::trip::TripRequest;
use chrono::NaiveDate;
use std::ops::Range;
use tracing::debug;

/// Bare capitalised phrases shorter than this need a connector in front
const MIN_BARE_DESTINATION_CHARS: usize = 3;

/// Words that introduce a place ("trip to", "holiday in", "visit")
const DESTINATION_CONNECTORS: &[&str] = &[
    "to", "in", "into", "visit", "visiting", "explore", "exploring", "see", "seeing", "at",
    "around", "through", "across", "from", "via", "near", "and",
];

/// Extra lead-in words dropped from the notes when they precede an extracted field
const NOTE_CONNECTORS: &[&str] = &[
    "for", "on", "during", "of", "until", "by", "a", "an", "the", "this", "next", "late",
    "early", "mid",
];

/// Lowercase words allowed inside a place name ("Rio de Janeiro")
const NAME_JOINERS: &[&str] = &[
    "de", "del", "da", "di", "do", "dos", "la", "le", "of", "upon", "sur",
];

/// Capitalised words that are never destinations on their own
const STOP_WORDS: &[&str] = &[
    "i", "i'm", "i'd", "i'll", "i've", "we", "we're", "we'd", "my", "our", "me", "us", "you",
    "your", "he", "she", "they", "it", "a", "an", "the", "this", "that", "these", "those", "plan",
    "planning", "trip", "trips", "day", "days", "week", "weeks", "weekend", "night", "nights",
    "itinerary", "visit", "travel", "traveling", "travelling", "holiday", "holidays", "vacation",
    "getaway", "tour", "please", "help", "want", "would", "could", "can", "will", "create",
    "make", "give", "show", "suggest", "recommend", "looking", "going", "hi", "hello", "hey",
    "thanks", "next", "last", "budget", "family", "solo", "christmas", "easter", "thanksgiving",
    "what", "where", "when", "how", "which", "is", "are", "also", "then", "some", "any", "best",
    "top", "fly", "flying", "go", "drive", "head", "spend", "book", "find", "need", "take",
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
    "spring", "summer", "autumn", "fall", "winter",
];

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Pronouns that turn a leading "May" or "March" into a verb
const SENTENCE_OPENER_PRONOUNS: &[&str] = &["i", "we", "you", "he", "she", "they"];

const SEASONS: &[&str] = &["spring", "summer", "autumn", "winter"];

const NUMBER_WORDS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve", "thirteen", "fourteen",
];

/// Extract structured trip fields from a free-text request.
pub fn extract(raw_text: &str) -> TripRequest {
    let tokens = tokenize(raw_text);
    let mut consumed = vec![false; tokens.len()];

    let dates = scan_dates(&tokens);
    for date in &dates {
        consumed[date.tokens.clone()].fill(true);
    }

    let duration = scan_duration(&tokens, &consumed);
    if let Some(duration) = &duration {
        consumed[duration.tokens.clone()].fill(true);
    }

    let destinations = scan_destinations(&tokens, &mut consumed);
    let notes = remainder(raw_text, &tokens, &mut consumed);

    let trip = TripRequest {
        raw_text: raw_text.to_string(),
        destinations,
        duration_days: duration.map(|d| d.days),
        start_date: dates.iter().find_map(|d| d.date),
        date_hints: dates.into_iter().map(|d| d.text).collect(),
        notes,
    };

    debug!(
        destinations = ?trip.destinations,
        duration_days = ?trip.duration_days,
        start_date = ?trip.start_date,
        date_hints = ?trip.date_hints,
        "extracted trip fields"
    );

    trip
}

/// Candidate destinations in order of first appearance
pub fn extract_destinations(text: &str) -> Vec<String> {
    extract(text).destinations
}

/// Trip length in days, if one is stated
pub fn extract_duration(text: &str) -> Option<u32> {
    let tokens = tokenize(text);
    let consumed = vec![false; tokens.len()];
    scan_duration(&tokens, &consumed).map(|d| d.days)
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    /// The word with surrounding punctuation removed
    word: &'a str,
    /// Byte span of the whole whitespace-delimited chunk
    start: usize,
    end: usize,
    /// Chunk is followed by clause punctuation, which breaks place names
    closes_clause: bool,
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chunk_start = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = chunk_start.take() {
                push_chunk(&mut tokens, text, start, idx);
            }
        } else if chunk_start.is_none() {
            chunk_start = Some(idx);
        }
    }
    if let Some(start) = chunk_start {
        push_chunk(&mut tokens, text, start, text.len());
    }

    tokens
}

fn push_chunk<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str, start: usize, end: usize) {
    let chunk = &text[start..end];
    let word = chunk.trim_matches(|c: char| !c.is_alphanumeric());

    // Free-standing punctuation ("-", "&", "...") only separates its neighbours
    if word.is_empty() {
        if let Some(last) = tokens.last_mut() {
            last.closes_clause = true;
        }
        return;
    }

    let closes_clause = chunk
        .trim_end_matches(|c: char| matches!(c, '"' | '\'' | ')' | ']'))
        .ends_with(|c: char| matches!(c, ',' | '.' | '!' | '?' | ';' | ':' | '/'));

    tokens.push(Token {
        word,
        start,
        end,
        closes_clause,
    });
}

fn is_one_of(word: &str, list: &[&str]) -> bool {
    list.iter().any(|w| w.eq_ignore_ascii_case(word))
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct DateMatch {
    text: String,
    date: Option<NaiveDate>,
    tokens: Range<usize>,
}

fn scan_dates(tokens: &[Token<'_>]) -> Vec<DateMatch> {
    let mut found = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let matched = numeric_date(tokens, i)
            .or_else(|| day_month_year(tokens, i))
            .or_else(|| month_day_year(tokens, i))
            .or_else(|| day_and_month(tokens, i))
            .or_else(|| month_name(tokens, i))
            .or_else(|| season(tokens, i));

        match matched {
            Some(date) => {
                i = date.tokens.end;
                found.push(date);
            }
            None => i += 1,
        }
    }

    found
}

fn phrase(tokens: &[Token<'_>], range: Range<usize>) -> String {
    tokens[range]
        .iter()
        .map(|t| t.word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `2025-06-12` or `6/12/2025` in a single token
fn numeric_date(tokens: &[Token<'_>], i: usize) -> Option<DateMatch> {
    let word = tokens[i].word;

    let date = if let Some([y, m, d]) = split_three(word, '-') {
        if !is_year(y) {
            return None;
        }
        NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
    } else if let Some([a, b, y]) = split_three(word, '/') {
        if !is_year(y) {
            return None;
        }
        let year: i32 = y.parse().ok()?;
        let first: u32 = a.parse().ok()?;
        let second: u32 = b.parse().ok()?;
        // Month first, unless the first field can only be a day
        if first > 12 {
            NaiveDate::from_ymd_opt(year, second, first)
        } else {
            NaiveDate::from_ymd_opt(year, first, second)
        }
    } else {
        return None;
    };

    Some(DateMatch {
        text: word.to_string(),
        date,
        tokens: i..i + 1,
    })
}

fn split_three(word: &str, sep: char) -> Option<[&str; 3]> {
    let mut parts = word.split(sep);
    let parts = [parts.next()?, parts.next()?, parts.next()?];
    let all_digits = parts
        .iter()
        .all(|p| !p.is_empty() && p.len() <= 4 && p.bytes().all(|b| b.is_ascii_digit()));
    if word.matches(sep).count() == 2 && all_digits {
        Some(parts)
    } else {
        None
    }
}

/// `12th June 2025`
fn day_month_year(tokens: &[Token<'_>], i: usize) -> Option<DateMatch> {
    let day = parse_day(tokens[i].word)?;
    let month = parse_month(tokens.get(i + 1)?.word)?;
    let year = parse_year(tokens.get(i + 2)?.word)?;
    if tokens[i].closes_clause {
        return None;
    }

    Some(DateMatch {
        text: phrase(tokens, i..i + 3),
        date: NaiveDate::from_ymd_opt(year, month, day),
        tokens: i..i + 3,
    })
}

/// `June 12, 2025` or `June 12th 2025`
fn month_day_year(tokens: &[Token<'_>], i: usize) -> Option<DateMatch> {
    let month = parse_month(tokens[i].word)?;
    let day = parse_day(tokens.get(i + 1)?.word)?;
    let year = parse_year(tokens.get(i + 2)?.word)?;
    if tokens[i].closes_clause {
        return None;
    }

    Some(DateMatch {
        text: phrase(tokens, i..i + 3),
        date: NaiveDate::from_ymd_opt(year, month, day),
        tokens: i..i + 3,
    })
}

/// `June 12` or `12 June`, no year so no calendar date
fn day_and_month(tokens: &[Token<'_>], i: usize) -> Option<DateMatch> {
    let next = tokens.get(i + 1)?;
    if tokens[i].closes_clause {
        return None;
    }

    let month_first = is_full_month(tokens[i].word) && parse_day(next.word).is_some();
    let day_first = parse_day(tokens[i].word).is_some() && is_full_month(next.word);
    if !(month_first || day_first) {
        return None;
    }

    Some(DateMatch {
        text: phrase(tokens, i..i + 2),
        date: None,
        tokens: i..i + 2,
    })
}

/// A capitalised month name, optionally followed by a year
fn month_name(tokens: &[Token<'_>], i: usize) -> Option<DateMatch> {
    let word = tokens[i].word;
    if !is_capitalized(word) || !is_full_month(word) {
        return None;
    }

    // "May I ..." opens a question, not a date
    let sentence_start = i == 0 || tokens[i - 1].closes_clause;
    if sentence_start
        && tokens
            .get(i + 1)
            .is_some_and(|next| is_one_of(next.word, SENTENCE_OPENER_PRONOUNS))
    {
        return None;
    }

    let with_year = !tokens[i].closes_clause
        && tokens
            .get(i + 1)
            .is_some_and(|next| parse_year(next.word).is_some());
    let end = if with_year { i + 2 } else { i + 1 };

    Some(DateMatch {
        text: phrase(tokens, i..end),
        date: None,
        tokens: i..end,
    })
}

fn season(tokens: &[Token<'_>], i: usize) -> Option<DateMatch> {
    let word = tokens[i].word;
    let is_fall = word.eq_ignore_ascii_case("fall")
        && i > 0
        && is_one_of(tokens[i - 1].word, &["in", "this", "next", "during", "late", "early"]);
    if !is_one_of(word, SEASONS) && !is_fall {
        return None;
    }

    Some(DateMatch {
        text: word.to_string(),
        date: None,
        tokens: i..i + 1,
    })
}

fn parse_month(word: &str) -> Option<u32> {
    let lower = word.to_lowercase();
    if lower == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .position(|m| *m == lower || (lower.len() == 3 && m.starts_with(&lower)))
        .map(|idx| idx as u32 + 1)
}

fn is_full_month(word: &str) -> bool {
    is_one_of(word, &MONTHS)
}

fn parse_day(word: &str) -> Option<u32> {
    let digits = word.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let suffix = &word[digits.len()..];
    if !suffix.is_empty() && !is_one_of(suffix, &["st", "nd", "rd", "th"]) {
        return None;
    }
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|d| (1..=31).contains(d))
}

fn is_year(word: &str) -> bool {
    word.len() == 4 && word.bytes().all(|b| b.is_ascii_digit())
}

fn parse_year(word: &str) -> Option<i32> {
    if is_year(word) {
        word.parse().ok()
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Duration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct DurationMatch {
    days: u32,
    tokens: Range<usize>,
}

fn scan_duration(tokens: &[Token<'_>], consumed: &[bool]) -> Option<DurationMatch> {
    for (i, token) in tokens.iter().enumerate() {
        if consumed[i] {
            continue;
        }

        // "7-day", "ten-day"
        if let Some((count, unit)) = token.word.split_once('-') {
            if let Some(days) = days_for(count, unit) {
                return Some(DurationMatch {
                    days,
                    tokens: i..i + 1,
                });
            }
            continue;
        }

        // "5 days", "two weeks"
        let Some(next) = tokens.get(i + 1) else {
            continue;
        };
        if token.closes_clause || consumed[i + 1] {
            continue;
        }
        if let Some(days) = days_for(token.word, next.word) {
            return Some(DurationMatch {
                days,
                tokens: i..i + 2,
            });
        }
    }

    None
}

fn days_for(count: &str, unit: &str) -> Option<u32> {
    let count = parse_count(count)?;
    let per_unit = unit_days(unit)?;
    count.checked_mul(per_unit).filter(|days| *days > 0)
}

fn parse_count(word: &str) -> Option<u32> {
    if !word.is_empty() && word.bytes().all(|b| b.is_ascii_digit()) {
        return word.parse().ok();
    }
    NUMBER_WORDS
        .iter()
        .position(|w| w.eq_ignore_ascii_case(word))
        .map(|idx| idx as u32 + 1)
}

fn unit_days(unit: &str) -> Option<u32> {
    if is_one_of(unit, &["day", "days", "night", "nights"]) {
        Some(1)
    } else if is_one_of(unit, &["week", "weeks"]) {
        Some(7)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Destinations
// ---------------------------------------------------------------------------

fn is_place_word(token: &Token<'_>) -> bool {
    is_capitalized(token.word)
        && !is_one_of(token.word, STOP_WORDS)
        && !is_one_of(token.word, DESTINATION_CONNECTORS)
        && !is_full_month(token.word)
}

/// A run of place words and whether a connector anchors it
struct PlaceRun {
    name: String,
    tokens: Range<usize>,
    anchored: bool,
}

/// Anchored runs win. Bare capitalised runs are used only when no run
/// follows a connector, so "Honeymoon in Bali" yields just "Bali".
fn scan_destinations(tokens: &[Token<'_>], consumed: &mut [bool]) -> Vec<String> {
    let mut runs: Vec<PlaceRun> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        if consumed[i] || !is_place_word(&tokens[i]) {
            i += 1;
            continue;
        }

        let start = i;
        let mut end = i + 1;
        while end < tokens.len() && !tokens[end - 1].closes_clause {
            let extends = |at: usize| {
                tokens
                    .get(at)
                    .is_some_and(|t| !consumed[at] && is_place_word(t))
            };
            if extends(end) {
                end += 1;
            } else if is_one_of(tokens[end].word, NAME_JOINERS)
                && !tokens[end].closes_clause
                && extends(end + 1)
            {
                end += 2;
            } else {
                break;
            }
        }

        let after_connector = start > 0
            && !tokens[start - 1].closes_clause
            && is_one_of(tokens[start - 1].word, DESTINATION_CONNECTORS);
        // "Goa, India" continues the list an anchored run started
        let continues_list = runs
            .last()
            .is_some_and(|prev| prev.anchored && prev.tokens.end == start);

        runs.push(PlaceRun {
            name: phrase(tokens, start..end),
            tokens: start..end,
            anchored: after_connector || continues_list,
        });

        i = end;
    }

    let any_anchored = runs.iter().any(|run| run.anchored);
    let mut found: Vec<String> = Vec::new();
    for run in runs {
        let keep = if any_anchored {
            run.anchored
        } else {
            run.name.chars().count() >= MIN_BARE_DESTINATION_CHARS
        };
        if !keep {
            continue;
        }

        consumed[run.tokens].fill(true);
        if !found.contains(&run.name) {
            found.push(run.name);
        }
    }

    found
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

fn remainder(text: &str, tokens: &[Token<'_>], consumed: &mut [bool]) -> String {
    // Right to left so chains like "for a" before "7-day" go together
    for i in (0..tokens.len()).rev() {
        let leads_into_field = consumed.get(i + 1).copied().unwrap_or(false);
        let word = tokens[i].word;
        if !consumed[i]
            && leads_into_field
            && (is_one_of(word, DESTINATION_CONNECTORS) || is_one_of(word, NOTE_CONNECTORS))
        {
            consumed[i] = true;
        }
    }

    tokens
        .iter()
        .zip(consumed.iter())
        .filter(|(_, used)| !**used)
        .map(|(t, _)| &text[t.start..t.end])
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-'))
        .to_string()
}
