//! Food Log CLI
//!
//! Command-line interface to a running `foodlog-api` server:
//! - Search foods and log what you ate
//! - Log and import blood sugar readings
//! - Show daily nutrition and nutrient / blood sugar correlations

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, TimeDelta};
use clap::{Parser, Subcommand, ValueEnum};
use foodlog::analysis::{AnalysisResult, Nutrient};
use foodlog::api::dto::{CreatedResponse, ImportResponse, NutritionRangeRow};
use foodlog::import::ReadingsImporter;
use foodlog::nutrition::{FoodDetails, FoodSearchResult};
use foodlog::storage::{BloodSugarReading, DailyNutrition, FoodEntryWithNutrition};
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "foodlog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Food and blood sugar log")]
#[command(long_about = "Log meals and glucose readings, then see how each nutrient tracks your blood sugar.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, env = "FOODLOG_API_URL", default_value = "http://localhost:3001", global = true)]
    pub api_url: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search USDA FoodData Central
    Search {
        /// Free-text query, e.g. "brown rice"
        query: Vec<String>,
    },

    /// Show (and cache) a food's composition per 100 units
    Details {
        /// FDC id from `search`
        fdc_id: i64,
    },

    /// Log a food entry
    LogFood {
        /// Food name
        name: String,
        /// Amount eaten
        amount: f64,
        /// Unit, e.g. g, ml, cup
        #[arg(short, long, default_value = "g")]
        unit: String,
        /// Date: YYYY-MM-DD, "today" or "yesterday"
        #[arg(short, long, default_value = "today")]
        date: String,
        /// Meal type (breakfast, lunch, dinner, snack)
        #[arg(short, long)]
        meal: Option<String>,
        /// FDC id to link nutrition data (run `details` first)
        #[arg(long)]
        fdc_id: Option<i64>,
    },

    /// List food entries for a day
    Entries {
        #[arg(default_value = "today")]
        date: String,
    },

    /// Delete a food entry
    DeleteFood { id: i64 },

    /// Nutrition totals for a day
    Daily {
        #[arg(default_value = "today")]
        date: String,
    },

    /// Nutrition totals per day over a range
    Range {
        /// Range length ending today (e.g. 7d, 4w)
        #[arg(short, long, default_value = "7d")]
        last: String,
    },

    /// Log a blood sugar reading
    LogSugar {
        /// Reading in mg/dL
        reading: f64,
        /// Timestamp (RFC 3339 or "YYYY-MM-DD HH:MM"); default now
        #[arg(short, long)]
        time: Option<String>,
        /// Notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List blood sugar readings
    Readings {
        /// A single date
        #[arg(short, long, conflicts_with = "last")]
        date: Option<String>,
        /// Range length ending today (e.g. 7d)
        #[arg(short, long, default_value = "7d")]
        last: String,
    },

    /// Delete a blood sugar reading
    DeleteReading { id: i64 },

    /// Import readings from a `timestamp,reading,notes` CSV
    Import {
        /// Path to CSV file
        path: PathBuf,
        /// Parse and report only
        #[arg(long)]
        dry_run: bool,
    },

    /// Correlate daily nutrients with mean blood sugar
    Analyze {
        /// Range length ending today (e.g. 30d, 3m)
        #[arg(short, long, default_value = "30d")]
        last: String,
    },

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Thin JSON client for the food log API
struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.client.get(self.url(path)).query(query);
        self.send(request).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let request = self.client.post(self.url(path)).json(body);
        self.send(request).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let _: serde_json::Value = self.send(self.client.delete(self.url(path))).await?;
        Ok(())
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await.with_context(|| {
            format!(
                "Cannot connect to food log API at {}. Start it with: cargo run --bin foodlog-api",
                self.base_url
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body["error"]["message"].as_str().unwrap_or("request failed");
            bail!("API error ({}): {}", status, message);
        }

        response.json().await.context("Invalid response from API")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.api_url);
    let json = cli.format == OutputFormat::Json;

    match cli.command {
        Commands::Search { query } => {
            let query = query.join(" ");
            let results: Vec<FoodSearchResult> =
                api.get("/food/search", &[("query", query)]).await?;

            if json {
                return print_json(&results);
            }
            if results.is_empty() {
                println!("No foods found.");
            } else {
                println!("{:<10} {}", "FDC ID", "Description");
                println!("{}", "-".repeat(60));
                for food in results {
                    match food.brand_owner {
                        Some(brand) => println!("{:<10} {} ({})", food.fdc_id, food.description, brand),
                        None => println!("{:<10} {}", food.fdc_id, food.description),
                    }
                }
            }
        }

        Commands::Details { fdc_id } => {
            let details: FoodDetails = api.get(&format!("/food/details/{}", fdc_id), &[]).await?;

            if json {
                return print_json(&details);
            }
            println!("{} (FDC {})", details.food_name, details.fdc_id);
            println!("Per 100 units:");
            for (label, value) in [
                ("Calories", details.calories),
                ("Protein", details.protein),
                ("Carbs", details.carbs),
                ("Fat", details.fat),
                ("Fiber", details.fiber),
                ("Sugar", details.sugar),
                ("Sodium", details.sodium),
            ] {
                println!("  {:<10} {:>8.1}", label, value);
            }
        }

        Commands::LogFood {
            name,
            amount,
            unit,
            date,
            meal,
            fdc_id,
        } => {
            let date = resolve_date(&date)?;
            let body = serde_json::json!({
                "foodName": name,
                "amount": amount,
                "unit": unit,
                "date": date.to_string(),
                "mealType": meal,
                "nutritionId": fdc_id,
            });

            let created: CreatedResponse = api.post("/food/entry", &body).await?;
            println!("Logged {} {} of {} on {} (entry {})", amount, unit, name, date, created.id);
        }

        Commands::Entries { date } => {
            let date = resolve_date(&date)?;
            let entries: Vec<FoodEntryWithNutrition> =
                api.get("/food/entries", &[("date", date.to_string())]).await?;

            if json {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("No entries for {}.", date);
            } else {
                println!("{:<6} {:<28} {:>8} {:<6} {:<10} {:>8}", "ID", "Food", "Amount", "Unit", "Meal", "kcal");
                println!("{}", "-".repeat(72));
                for e in entries {
                    let kcal = e
                        .calories
                        .map(|c| format!("{:.0}", c * e.entry.amount / 100.0))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<6} {:<28} {:>8.1} {:<6} {:<10} {:>8}",
                        e.entry.id,
                        truncate(&e.entry.food_name, 28),
                        e.entry.amount,
                        e.entry.unit,
                        e.entry.meal_type.as_deref().unwrap_or("-"),
                        kcal
                    );
                }
            }
        }

        Commands::DeleteFood { id } => {
            api.delete(&format!("/food/entry/{}", id)).await?;
            println!("Deleted food entry {}", id);
        }

        Commands::Daily { date } => {
            let date = resolve_date(&date)?;
            let daily: DailyNutrition = api.get(&format!("/nutrition/daily/{}", date), &[]).await?;

            if json {
                return print_json(&daily);
            }
            println!("Nutrition for {}", daily.date);
            for nutrient in Nutrient::ALL {
                println!("  {:<10} {:>8.1}", nutrient, daily.totals.get(nutrient));
            }
        }

        Commands::Range { last } => {
            let (start, end) = last_range(&last)?;
            let rows: Vec<NutritionRangeRow> = api
                .get(
                    "/nutrition/range",
                    &[("startDate", start.to_string()), ("endDate", end.to_string())],
                )
                .await?;

            if json {
                return print_json(&rows);
            }
            if rows.is_empty() {
                println!("No nutrition data between {} and {}.", start, end);
            } else {
                println!("{:<12} {:>8} {:>8} {:>8} {:>8}", "Date", "kcal", "Protein", "Carbs", "Fat");
                println!("{}", "-".repeat(48));
                for row in rows {
                    println!(
                        "{:<12} {:>8} {:>8} {:>8} {:>8}",
                        row.date,
                        fmt_opt(row.total_calories),
                        fmt_opt(row.total_protein),
                        fmt_opt(row.total_carbs),
                        fmt_opt(row.total_fat)
                    );
                }
            }
        }

        Commands::LogSugar {
            reading,
            time,
            notes,
        } => {
            let timestamp = time.unwrap_or_else(|| chrono::Local::now().to_rfc3339());
            let body = serde_json::json!({
                "reading": reading,
                "timestamp": timestamp,
                "notes": notes,
            });

            let created: CreatedResponse = api.post("/blood-sugar/reading", &body).await?;
            println!("Logged {} mg/dL at {} (reading {})", reading, timestamp, created.id);
        }

        Commands::Readings { date, last } => {
            let query = match date {
                Some(d) => vec![("date", resolve_date(&d)?.to_string())],
                None => {
                    let (start, end) = last_range(&last)?;
                    vec![("startDate", start.to_string()), ("endDate", end.to_string())]
                }
            };
            let readings: Vec<BloodSugarReading> = api.get("/blood-sugar/readings", &query).await?;

            if json {
                return print_json(&readings);
            }
            if readings.is_empty() {
                println!("No readings.");
            } else {
                println!("{:<6} {:<12} {:<10} {:>8}  {}", "ID", "Date", "Time", "mg/dL", "Notes");
                println!("{}", "-".repeat(60));
                for r in readings {
                    println!(
                        "{:<6} {:<12} {:<10} {:>8.1}  {}",
                        r.id,
                        r.date,
                        r.time,
                        r.reading,
                        r.notes.as_deref().unwrap_or("")
                    );
                }
            }
        }

        Commands::DeleteReading { id } => {
            api.delete(&format!("/blood-sugar/reading/{}", id)).await?;
            println!("Deleted reading {}", id);
        }

        Commands::Import { path, dry_run } => {
            let result = ReadingsImporter::new()
                .import(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;

            println!("Import results:");
            println!("  Rows accepted: {}", result.rows_processed());
            println!("  Rows failed: {}", result.rows_failed);

            if !result.errors.is_empty() {
                println!();
                println!("Errors (first 10):");
                for error in result.errors.iter().take(10) {
                    println!("  {}", error);
                }
            }

            if dry_run {
                println!();
                println!("(Dry run - no data was imported)");
            } else if !result.readings.is_empty() {
                let body = serde_json::json!({ "readings": result.readings });
                let imported: ImportResponse = api.post("/blood-sugar/import", &body).await?;
                println!();
                println!("Imported {} readings", imported.count);
            }
        }

        Commands::Analyze { last } => {
            let (start, end) = last_range(&last)?;
            let result: AnalysisResult = api
                .get(
                    "/correlation/analysis",
                    &[("startDate", start.to_string()), ("endDate", end.to_string())],
                )
                .await?;

            if json {
                return print_json(&result);
            }
            print_analysis(&result, start, end);
        }

        Commands::Status => {
            let response = api
                .client
                .get(format!("{}/health", api.base_url))
                .send()
                .await
                .with_context(|| format!("Cannot connect to food log API at {}", api.base_url))?;

            if !response.status().is_success() {
                bail!("API returned error: {}", response.status());
            }
            let health: serde_json::Value = response.json().await?;

            println!("Food Log v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("API Status: {}", health["status"].as_str().unwrap_or("unknown"));
            println!("Backend: {}", health["backend"].as_str().unwrap_or("unknown"));
            if let Some(uptime) = health["uptime_seconds"].as_u64() {
                println!("Uptime: {}", format_duration(uptime));
            }
        }

        Commands::Config { output } => {
            let config = foodlog::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_analysis(result: &AnalysisResult, start: NaiveDate, end: NaiveDate) {
    println!("Analysis {} to {}", start, end);
    println!();

    if result.data.is_empty() {
        println!("No nutrition data in range.");
        return;
    }

    println!("{:<12} {:>8} {:>8} {:>8}  {}", "Date", "kcal", "Carbs", "Sugar", "Blood sugar (avg/min/max, n)");
    println!("{}", "-".repeat(72));
    for day in &result.data {
        let sugar = day
            .blood_sugar
            .as_ref()
            .map(|b| format!("{:.0}/{:.0}/{:.0}, {}", b.avg, b.min, b.max, b.count))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:>8.0} {:>8.1} {:>8.1}  {}",
            day.date, day.nutrition.calories, day.nutrition.carbs, day.nutrition.sugar, sugar
        );
    }

    println!();
    match &result.correlations {
        None => println!("Not enough data: need at least 2 days with both food and readings."),
        Some(correlations) => {
            println!("Correlation with mean blood sugar:");
            for (nutrient, r) in correlations {
                println!("  {:<10} {:>6.2}  {}", nutrient, r, describe_strength(*r));
            }
        }
    }
}

fn describe_strength(r: f64) -> &'static str {
    let strength = r.abs();
    if strength >= 0.7 {
        if r > 0.0 { "strong positive" } else { "strong negative" }
    } else if strength >= 0.4 {
        if r > 0.0 { "moderate positive" } else { "moderate negative" }
    } else if strength >= 0.2 {
        "weak"
    } else {
        "none"
    }
}

/// `today`, `yesterday` or `YYYY-MM-DD`
fn resolve_date(s: &str) -> Result<NaiveDate> {
    let today = Local::now().date_naive();
    match s.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => Ok(today - TimeDelta::days(1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD, today or yesterday", s)),
    }
}

/// Inclusive range of `last` ending today
fn last_range(last: &str) -> Result<(NaiveDate, NaiveDate)> {
    let end = Local::now().date_naive();
    let span = parse_duration(last)?;
    let start = end
        .checked_sub_signed(span - TimeDelta::days(1))
        .with_context(|| format!("Range '{}' reaches before the earliest supported date", last))?;
    Ok((start, end))
}

/// Positive whole-day span: `7d`, `4w`, `3m` (30 days), `1y` (365 days)
fn parse_duration(s: &str) -> Result<TimeDelta> {
    let s = s.trim().to_lowercase();

    let (count, days_per_unit) = if let Some(n) = s.strip_suffix('d') {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('w') {
        (n, 7)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 30)
    } else if let Some(n) = s.strip_suffix('y') {
        (n, 365)
    } else {
        bail!("Invalid duration format: {}. Use: 7d, 4w, 3m, 1y", s)
    };

    let count: i64 = count
        .parse()
        .with_context(|| format!("Invalid duration '{}'", s))?;
    if count <= 0 {
        bail!("Duration must be positive, got '{}'", s);
    }

    count
        .checked_mul(days_per_unit)
        .and_then(TimeDelta::try_days)
        .with_context(|| format!("Duration '{}' is too large", s))
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
