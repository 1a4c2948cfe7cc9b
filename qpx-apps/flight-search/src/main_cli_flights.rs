//!  QPX Flight Search
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! CLI for QPX Express flight search.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use qpx_flight_search::{
    Cabin, ClientConfig, DictProjection, QpxClient, Route, SearchRequest, SearchResult, Slice,
    Trip,
};
use std::cmp::max;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "qpx-flights")]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// QPX Express API key
    #[arg(long, env = "QPX_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Origin airport code (e.g., SFO, FRA)
    #[arg(short, long)]
    from: String,

    /// Destination airport code (e.g., LAX, ACE)
    #[arg(short, long)]
    to: String,

    /// Departure date (YYYY-MM-DD or YYYY/MM/DD)
    #[arg(short, long)]
    date: String,

    /// Return date for round trips (YYYY-MM-DD or YYYY/MM/DD)
    #[arg(short = 'R', long)]
    return_date: Option<String>,

    /// Preferred cabin: coach, premium_coach, business, first
    #[arg(short, long)]
    cabin: Option<String>,

    /// Number of adults
    #[arg(short, long, default_value = "1")]
    adults: u32,

    /// Number of children
    #[arg(long, default_value = "0")]
    children: u32,

    /// Number of seniors
    #[arg(long, default_value = "0")]
    seniors: u32,

    /// Number of solutions to ask for (1-500)
    #[arg(short, long, default_value = "10")]
    solutions: u32,

    /// Maximum price, currency code and amount (e.g., USD400)
    #[arg(long)]
    max_price: Option<String>,

    /// Maximum number of stops per slice (0 = nonstop only)
    #[arg(long)]
    max_stops: Option<u32>,

    /// Daily query quota, 0 disables client-side pacing
    #[arg(long, default_value = "0")]
    queries_per_day: u64,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Verbose output
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Dump the decoded result as JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// Logs go to stderr so `--json` output stays clean.
fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn parse_cabin(s: &str) -> Result<Cabin> {
    match s.to_lowercase().as_str() {
        "coach" | "economy" | "e" => Ok(Cabin::Coach),
        "premium_coach" | "premium" | "pe" => Ok(Cabin::PremiumCoach),
        "business" | "b" => Ok(Cabin::Business),
        "first" | "f" => Ok(Cabin::First),
        _ => anyhow::bail!(
            "Invalid cabin: {}. Use: coach, premium_coach, business, first",
            s
        ),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .context(format!(
            "Invalid date format: {}. Use YYYY-MM-DD or YYYY/MM/DD",
            s
        ))
}

/// Format duration in hours/minutes.
fn fmt_duration(minutes: u32) -> String {
    let hrs = minutes / 60;
    let mins = minutes % 60;
    if mins == 0 {
        format!("{}h", hrs)
    } else if hrs == 0 {
        format!("{}m", mins)
    } else {
        format!("{}h {:02}m", hrs, mins)
    }
}

/// "07:20 → 08:35" for the first and last flight of a route.
fn fmt_times(route: &Route) -> String {
    let hhmm = |t: Option<chrono::DateTime<chrono::FixedOffset>>| {
        t.map_or("??:??".to_string(), |t| t.format("%H:%M").to_string())
    };
    let flights = route.segments.iter().flat_map(|s| s.flights.iter());
    let dep = flights.clone().next().and_then(|f| f.departs_at().ok());
    let arr = flights.last().and_then(|f| f.arrives_at().ok());
    format!("{} → {}", hhmm(dep), hhmm(arr))
}

fn fmt_carriers(route: &Route) -> String {
    let mut carriers: Vec<String> = Vec::new();
    for seg in &route.segments {
        let flight = format!("{}{}", seg.flight_carrier, seg.flight_number);
        if !carriers.contains(&flight) {
            carriers.push(flight);
        }
    }
    carriers.join("/")
}

fn fmt_stops(route: &Route) -> String {
    match route.stops() {
        0 => "direct".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{} stops", n),
    }
}

fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(100)
}

fn dash_bar() -> String {
    "-".repeat(get_terminal_width().min(100))
}

/// Terminal-aware column widths for flights, times, duration, stops.
fn calc_column_widths(trips: &[Trip]) -> (usize, usize, usize, usize) {
    let mut max_flights = 7;
    let mut max_times = 15;
    let mut max_duration = 10;
    let mut max_stops = 8;

    for route in trips.iter().flat_map(|t| t.routes.iter()) {
        max_flights = max(max_flights, fmt_carriers(route).len());
        max_times = max(max_times, fmt_times(route).chars().count());
        max_duration = max(max_duration, fmt_duration(route.duration).len());
        max_stops = max(max_stops, fmt_stops(route).len());
    }

    let available_width = get_terminal_width().saturating_sub(25);
    let total_content = max_flights + max_times + max_duration + max_stops;
    if total_content > available_width && available_width > 40 {
        let ratio = available_width as f64 / total_content as f64;
        max_flights = max((max_flights as f64 * ratio).floor() as usize, 4);
        max_times = max((max_times as f64 * ratio).floor() as usize, 10);
        max_duration = max((max_duration as f64 * ratio).floor() as usize, 5);
        max_stops = max((max_stops as f64 * ratio).floor() as usize, 6);
    }

    (max_flights, max_times, max_duration, max_stops)
}

fn render_results(result: &SearchResult, args: &CliArgs) {
    let title_bar = format!(
        "================================================================================================\n  🛫  {} → {} on {}\n================================================================================================",
        args.from.to_uppercase(),
        args.to.to_uppercase(),
        args.date
    );
    println!("{}\n", title_bar);

    println!("🆔 Request:     {}", result);
    if let Some(best) = result.trips.first() {
        println!("💰 Best Price:  {}", best.total_price);
    }
    println!("📊 Total Trips: {}", result.len());

    let (fw, tw, dw, sw) = calc_column_widths(&result.trips);
    println!("\n{}\n", dash_bar());

    let h1 = format!("  {:>4}", "#");
    let h2 = format!("{:<w$}", "FLIGHTS", w = fw);
    let h3 = format!("{:<w$}", "DEP → ARR", w = tw);
    let h4 = format!("{:<w$}", "DURATION", w = dw);
    let h5 = format!("{:<w$}", "STOPS", w = sw);
    println!("{}  {}  {}  {}  {}   PRICE", h1, h2, h3, h4, h5);
    println!("{}\n", dash_bar());

    for (i, trip) in result.iter().enumerate() {
        // one line per slice, price on the first
        for (j, route) in trip.routes.iter().enumerate() {
            let rank = if j == 0 { (i + 1).to_string() } else { String::new() };
            let price = if j == 0 { trip.total_price.as_str() } else { "" };
            let c1 = format!("  {:>4}", rank);
            let c2 = format!("{:<w$}", fmt_carriers(route), w = fw);
            let c3 = format!("{:<w$}", fmt_times(route), w = tw);
            let c4 = format!("{:<w$}", fmt_duration(route.duration), w = dw);
            let c5 = format!("{:<w$}", fmt_stops(route), w = sw);
            println!("{}  {}  {}  {}  {}   {}", c1, c2, c3, c4, c5, price);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    tracing::info!("Starting qpx-flights CLI");

    let depart_date = parse_date(&args.date)?;
    let return_date = args.return_date.as_deref().map(parse_date).transpose()?;
    let cabin = args.cabin.as_deref().map(parse_cabin).transpose()?;

    let mut outbound = Slice::new(args.from.to_uppercase(), args.to.to_uppercase(), depart_date);
    if let Some(cabin) = cabin {
        outbound = outbound.preferred_cabin(cabin);
    }
    if let Some(max_stops) = args.max_stops {
        outbound = outbound.max_stops(max_stops);
    }

    let mut builder = SearchRequest::builder()
        .adults(args.adults)
        .children(args.children)
        .seniors(args.seniors)
        .solution_count(args.solutions)?
        .slice(outbound.clone());
    if let Some(rd) = return_date {
        builder = builder.slice(outbound.reversed(rd));
    }
    if let Some(max_price) = &args.max_price {
        builder = builder.max_price(max_price)?;
    }

    let request = builder
        .build()
        .context("Failed to build search request")?;

    tracing::info!(
        "Searching {} slice(s) for {} passenger(s)",
        request.slices().len(),
        request.passengers().total()
    );

    let client = QpxClient::new(ClientConfig {
        queries_per_day: args.queries_per_day,
        timeout: Some(Duration::from_secs(args.timeout_secs)),
        ..ClientConfig::new(args.api_key.clone())
    });

    let result = client.search(&request).await.context("Search failed")?;
    tracing::info!("Search completed: {} trips found", result.len());

    if args.json {
        let dump = serde_json::to_string_pretty(&result.as_dict()).context("Serialize result")?;
        println!("{}", dump);
    } else {
        render_results(&result, &args);
    }

    Ok(())
}
