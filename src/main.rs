//! Itinera CLI - free-text travel requests to day-by-day itineraries
//!
//! The planning logic is contained in lib.rs, and this file is responsible
//! for parsing arguments, setting up logging and printing results.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Input;
use itinera::extract::extract;
use itinera::weather::UnavailableReason;
use itinera::{Config, PlanDraft, Planner, WeatherEnricher, WeatherSummary};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "itinera")]
#[command(author, version, about = "Turn a travel request into a day-by-day itinerary", long_about = None)]
struct Cli {
    /// Path to an itinera.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a trip, e.g. `itinera plan 5 days in Paris in June`
    Plan {
        /// Free-text travel request
        #[arg(required = true)]
        request: Vec<String>,
    },
    /// Show the fields extracted from a request as JSON
    Extract {
        /// Free-text travel request
        #[arg(required = true)]
        request: Vec<String>,
    },
    /// Look up the weather for a place
    Weather {
        /// City or place name
        place: String,
        /// Day to forecast (YYYY-MM-DD), defaults to current conditions
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn setup_logging(verbose: bool) {
    let default_directive = if verbose { "itinera=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Config::load().context("Failed to load configuration"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    info!(
        provider = %config.agent.provider,
        model = %config.agent.model,
        weather = config.weather_key().is_some(),
        "loaded configuration"
    );

    match cli.command {
        Some(Commands::Plan { request }) => {
            let planner =
                Planner::from_config(&config).context("Failed to set up the language model")?;
            plan(&planner, &request.join(" ")).await?;
        }
        Some(Commands::Extract { request }) => {
            let trip = extract(&request.join(" "));
            println!("{}", serde_json::to_string_pretty(&trip)?);
        }
        Some(Commands::Weather { place, date }) => {
            let enricher = WeatherEnricher::from_config(&config);
            let summary = enricher.fetch_weather(&place, date).await;
            print_weather(&summary);
        }
        None => {
            // Default: interactive session
            interactive(&config).await?;
        }
    }

    Ok(())
}

async fn interactive(config: &Config) -> Result<()> {
    let planner = Planner::from_config(config).context("Failed to set up the language model")?;

    println!("{}", "🌍 Itinera - AI travel planner".bold().cyan());
    println!("Describe your trip, or type 'exit' to quit.\n");

    loop {
        let input: String = Input::new()
            .with_prompt("Where to?")
            .allow_empty(true)
            .interact_text()?;

        let request = input.trim();
        if request.is_empty() {
            continue;
        }
        if matches!(request.to_lowercase().as_str(), "exit" | "quit" | "q") {
            println!("Safe travels!");
            break;
        }

        if let Err(e) = plan(&planner, request).await {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }
        println!();
    }

    Ok(())
}

async fn plan(planner: &Planner, request: &str) -> Result<()> {
    println!("{}", "Planning your trip...".dimmed());

    let draft = planner.prepare(request).await;
    print_draft(&draft);

    let itinerary = planner
        .generate(&draft)
        .await
        .context("Could not generate an itinerary")?;

    println!("\n{}", itinerary.without_bold());
    Ok(())
}

fn print_draft(draft: &PlanDraft) {
    let trip = &draft.trip;

    println!("\n{}", "📋 Trip Summary".bold());
    let destinations = if trip.destinations.is_empty() {
        "Not specified".to_string()
    } else {
        trip.destinations.join(", ")
    };
    println!("  Destinations: {}", destinations);
    match trip.duration_days {
        Some(days) => println!("  Duration: {} days", days),
        None => println!("  Duration: Not specified"),
    }
    if !trip.date_hints.is_empty() {
        println!("  Dates: {}", trip.date_hints.join(", "));
    }
    if !trip.notes.is_empty() {
        println!("  Notes: {}", trip.notes);
    }

    if !draft.weather.source_unavailable {
        println!();
        print_weather(&draft.weather);
    }

    if !draft.attractions.is_empty() {
        println!("\n{}", "📍 Attractions".bold());
        for hint in &draft.attractions {
            println!("  • {}", hint.name);
        }
    }
}

fn print_weather(summary: &WeatherSummary) {
    if summary.source_unavailable {
        let reason = match summary.unavailable_reason {
            Some(UnavailableReason::NoDestination) => "no destination given",
            Some(UnavailableReason::MissingCredential) => "OPENWEATHERMAP_API_KEY is not set",
            Some(UnavailableReason::HorizonExceeded) => "date is outside the forecast range",
            Some(UnavailableReason::ProviderFailure) | None => "the weather service did not answer",
        };
        println!("{} {}", "Weather unavailable:".yellow(), reason);
        return;
    }

    let heading = match summary.observed_for {
        Some(day) if summary.forecast_available => {
            format!("🌤️  Forecast for {} on {}", summary.location(), day.format("%Y-%m-%d"))
        }
        _ => format!("🌤️  Current weather in {}", summary.location()),
    };
    println!("{}", heading.bold());
    println!("  Condition: {}", summary.condition_text);
    if let Some(temp) = summary.format_temperature() {
        println!("  Temperature: {}", temp);
    }
}
