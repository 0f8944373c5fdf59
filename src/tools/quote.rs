//! Quote tool implementation
//!
//! Implements the `quote(destination, tier, weight, ...)` MCP tool

use crate::cli::QuoteArgs;
use crate::error::AppError;
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use crate::tariff::{Quote, QuoteOptions, QuoteRequest, RateEngine, ServiceTier};
use crate::tools::util::{format_money, parse_args};
use serde_json::{json, Value};
use tracing::info;

/// Handle quote tool call (MCP)
pub fn handle_quote(id: Option<Value>, args: Value, engine: &RateEngine) -> McpResponse {
    let result = parse_args::<QuoteArgs>(args).and_then(|args| execute_quote(engine, args));
    McpResponse::from_tool_result(id, result)
}

/// Shared implementation for quote (used by MCP and CLI)
pub fn execute_quote(engine: &RateEngine, args: QuoteArgs) -> Result<ToolResult, AppError> {
    let tier: ServiceTier = args.tier.parse()?;
    let request = QuoteRequest {
        destination: args.destination.trim().to_string(),
        tier,
        weight_kg: args.weight,
        options: QuoteOptions {
            fragile: args.fragile,
            insured: args.insured,
            holiday: args.holiday,
            peak_season: args.peak_season,
        },
    };

    if args.amount_only {
        let amount = engine.quote(&request.destination, tier, request.weight_kg, request.options)?;
        info!("Quote for {} / {} / {} kg: {}", request.destination, tier, request.weight_kg, amount);
        return Ok(ToolResult::from_items(vec![ContentItem::text_with_metadata(
            format!("{:.2}", amount),
            json!({ "amount": amount }),
        )]));
    }

    let quote = engine.quote_detailed(&request)?;
    info!(
        "Quote for {} / {} / {} kg: {}",
        quote.destination, quote.tier, quote.weight_kg, quote.amount
    );

    let metadata = serde_json::to_value(&quote)?;
    Ok(ToolResult::from_items(vec![ContentItem::text_with_metadata(
        format_quote(&quote),
        metadata,
    )]))
}

fn format_quote(quote: &Quote) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Quote · {} · {}\n\n", quote.destination, quote.tier));
    md.push_str(&format!("**Total:** {}\n\n", format_money(quote.amount)));

    md.push_str(&format!("- Base rate: {}", format_money(quote.base_rate)));
    if quote.default_rate_used {
        md.push_str(" (default rate, destination or tier not in the rate table)");
    }
    md.push('\n');
    md.push_str(&format!(
        "- Weight: {} kg, bracket {} ×{}\n",
        quote.weight_kg, quote.bracket, quote.bracket_factor
    ));
    for surcharge in &quote.surcharges {
        md.push_str(&format!("- Surcharge {}: ×{}\n", surcharge.name, surcharge.factor));
    }

    md
}
