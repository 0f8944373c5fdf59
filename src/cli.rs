//! CLI mode implementation
//!
//! Argument structs double as MCP tool input schemas via `schemars`.

use crate::reports::{PackageEntry, Transaction};
use crate::search::PackageRecord;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_TIER: &str = "normal";

fn default_tier() -> String {
    DEFAULT_TIER.to_string()
}

/// Shalom CLI
#[derive(Parser)]
#[command(name = "shalom")]
#[command(about = "Shipping quotes, package search and tracking utilities", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to <config dir>/shalom/config.json)
    #[arg(long, global = true, env = "SHALOM_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Price a shipment
    Quote(QuoteArgs),
    /// Search package records
    Search(SearchArgs),
    /// Replay GPS fixes and summarize routes
    Track(TrackReplayArgs),
    /// Render and dispatch a customer notification
    Notify(NotifyArgs),
    /// Build a report over package and transaction logs
    Report(ReportArgs),
}

/// Quote tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct QuoteArgs {
    /// Destination city as listed in the rate table, e.g. Lima
    #[arg(short = 'd', long)]
    #[serde(alias = "destino")]
    #[schemars(description = "Destination city as listed in the rate table (case-sensitive), e.g. Lima")]
    pub destination: String,

    /// Service tier: normal, express or urgent
    #[arg(short = 't', long, default_value = DEFAULT_TIER)]
    #[serde(default = "default_tier", alias = "servicio")]
    #[schemars(description = "Service tier: normal, express or urgent (default normal)")]
    pub tier: String,

    /// Package weight in kg
    #[arg(short = 'w', long)]
    #[serde(alias = "peso")]
    #[schemars(description = "Package weight in kg (non-negative)")]
    pub weight: f64,

    /// Fragile handling surcharge
    #[arg(long)]
    #[serde(default, alias = "fragil")]
    #[schemars(description = "Apply the fragile handling surcharge")]
    pub fragile: bool,

    /// Insurance surcharge
    #[arg(long)]
    #[serde(default, alias = "seguro")]
    #[schemars(description = "Apply the insurance surcharge")]
    pub insured: bool,

    /// Holiday surcharge
    #[arg(long)]
    #[serde(default, alias = "esFeriado", alias = "feriado", alias = "is_holiday")]
    #[schemars(description = "Apply the holiday surcharge")]
    pub holiday: bool,

    /// Peak season surcharge
    #[arg(long)]
    #[serde(default, alias = "temporadaAlta")]
    #[schemars(description = "Apply the peak season surcharge")]
    pub peak_season: bool,

    /// Print only the amount, without the breakdown
    #[arg(long)]
    #[serde(default)]
    #[schemars(description = "Return only the amount instead of the full breakdown")]
    pub amount_only: bool,
}

/// Search tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct SearchArgs {
    /// Free text: code, name, DNI, city, address...
    #[arg(short = 'q', long)]
    #[schemars(description = "Free text matched against code, recipient, DNI, city, address, content, status and user (case and accent insensitive)")]
    pub query: String,

    /// JSON file holding an array of package records
    #[arg(short = 'r', long = "records")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Path to a JSON file holding an array of package records")]
    pub records_file: Option<PathBuf>,

    #[arg(skip)]
    #[serde(default)]
    #[schemars(description = "Package records to search, used together with records_file")]
    pub records: Vec<PackageRecord>,

    /// Maximum number of results (default 20, max 200)
    #[arg(short = 'l', long)]
    #[schemars(description = "Maximum number of results (default 20, max 200)")]
    pub limit: Option<usize>,
}

/// Suggest tool arguments
#[derive(JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct SuggestArgs {
    #[schemars(description = "Start of a previous query (case-insensitive)")]
    pub prefix: String,
}

/// Track tool arguments
#[derive(JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct TrackArgs {
    #[serde(alias = "codigo")]
    #[schemars(description = "Package code")]
    pub code: String,
    #[serde(alias = "lat")]
    #[schemars(description = "Latitude in degrees, -90 to 90")]
    pub latitude: f64,
    #[serde(alias = "lng")]
    #[schemars(description = "Longitude in degrees, -180 to 180")]
    pub longitude: f64,
    #[serde(default)]
    #[schemars(description = "RFC 3339 time of the fix (defaults to now)")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Route tool arguments
#[derive(JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct RouteArgs {
    #[serde(alias = "codigo")]
    #[schemars(description = "Package code")]
    pub code: String,
}

/// Track command arguments
#[derive(Parser, Debug)]
pub struct TrackReplayArgs {
    /// JSON file holding an array of fixes ({code, latitude, longitude, timestamp})
    #[arg(short = 'f', long)]
    pub fixes: PathBuf,

    /// Only summarize this package
    #[arg(short = 'c', long)]
    pub code: Option<String>,
}

/// Notify tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct NotifyArgs {
    /// package_created, in_transit, delivered or delayed
    #[arg(short = 'k', long)]
    #[serde(alias = "tipo")]
    #[schemars(description = "Notification type: package_created, in_transit, delivered or delayed (Spanish names accepted)")]
    pub kind: String,

    /// Channel to deliver on; repeat for several (default email)
    #[arg(short = 'c', long = "channel")]
    #[serde(default, alias = "canales")]
    #[schemars(description = "Channels: email, sms, push, whatsapp (default email)")]
    pub channels: Vec<String>,

    #[arg(skip)]
    #[serde(default, alias = "datos")]
    #[schemars(description = "Template values such as codigo, destino, eta, email, telefono")]
    pub data: BTreeMap<String, Value>,

    /// Template value as KEY=VALUE; repeat for several
    #[arg(long = "set", value_name = "KEY=VALUE")]
    #[serde(skip)]
    #[schemars(skip)]
    pub vars: Vec<String>,
}

/// Report tool arguments
#[derive(Parser, JsonSchema, Deserialize, Serialize, Clone, Debug)]
pub struct ReportArgs {
    /// daily_sales or packages_by_status
    #[arg(short = 'k', long)]
    #[serde(alias = "tipo")]
    #[schemars(description = "Report type: daily_sales or packages_by_status (Spanish names accepted)")]
    pub kind: String,

    /// First day, YYYY-MM-DD
    #[arg(long)]
    #[schemars(description = "First day included, YYYY-MM-DD")]
    pub from: String,

    /// Last day, YYYY-MM-DD
    #[arg(long)]
    #[schemars(description = "Last day included, YYYY-MM-DD")]
    pub to: String,

    /// JSON file holding an array of {date, status} package entries
    #[arg(long = "packages")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Path to a JSON file holding an array of {date, status} entries")]
    pub packages_file: Option<PathBuf>,

    /// JSON file holding an array of {date, amount} transactions
    #[arg(long = "transactions")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Path to a JSON file holding an array of {date, amount} transactions")]
    pub transactions_file: Option<PathBuf>,

    #[arg(skip)]
    #[serde(default)]
    #[schemars(description = "Package entries, used together with packages_file")]
    pub packages: Vec<PackageEntry>,

    #[arg(skip)]
    #[serde(default)]
    #[schemars(description = "Transactions, used together with transactions_file")]
    pub transactions: Vec<Transaction>,
}
