//! Search tool implementation
//!
//! Implements the `search(query, records)` and `suggest(prefix)` MCP tools

use crate::cli::{SearchArgs, SuggestArgs};
use crate::error::{validate_query, AppError};
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use crate::search::{normalize, PackageRecord, SearchEngine, SearchHit};
use crate::tools::util::{load_json_file, parse_args, table_cell};
use serde_json::{json, Value};
use tracing::debug;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 200;

/// Handle search tool call (MCP)
pub fn handle_search(id: Option<Value>, args: Value, engine: &mut SearchEngine) -> McpResponse {
    let result = parse_args::<SearchArgs>(args).and_then(|args| execute_search(engine, args));
    McpResponse::from_tool_result(id, result)
}

/// Handle suggest tool call (MCP)
pub fn handle_suggest(id: Option<Value>, args: Value, engine: &SearchEngine) -> McpResponse {
    let result = parse_args::<SuggestArgs>(args).and_then(|args| execute_suggest(engine, args));
    McpResponse::from_tool_result(id, result)
}

/// Shared implementation for search (used by MCP and CLI)
pub fn execute_search(engine: &mut SearchEngine, args: SearchArgs) -> Result<ToolResult, AppError> {
    validate_query(&args.query)?;

    let limit = args.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(AppError::InvalidInput(format!(
            "limit must be between 1 and {}, got {}",
            MAX_LIMIT, limit
        )));
    }

    let mut records = args.records;
    if let Some(path) = &args.records_file {
        let from_file: Vec<PackageRecord> = load_json_file(path)?;
        debug!("Loaded {} records from {}", from_file.len(), path.display());
        records.extend(from_file);
    }

    let hits = engine.search(&args.query, &records);
    debug!("Search '{}' over {} records: {} hits", args.query, records.len(), hits.len());

    Ok(ToolResult::text(format_hits(&args.query, &hits, limit)))
}

/// Shared implementation for suggest
pub fn execute_suggest(engine: &SearchEngine, args: SuggestArgs) -> Result<ToolResult, AppError> {
    validate_query(&args.prefix)?;

    let suggestions = engine.suggest(&args.prefix);
    let entries = engine.suggest_entries(&args.prefix);
    let mut md = format!("# Suggestions · {}\n\n", entries.len());
    if entries.is_empty() {
        md.push_str("No previous searches match this prefix.\n");
    }
    for entry in entries {
        let plural = if entry.frequency == 1 { "search" } else { "searches" };
        md.push_str(&format!(
            "- `{}` · {} {} · {} results last time\n",
            entry.query, entry.frequency, plural, entry.last_result_count
        ));
    }
    Ok(ToolResult::from_items(vec![ContentItem::text_with_metadata(
        md,
        json!({ "suggestions": suggestions }),
    )]))
}

fn format_hits(query: &str, hits: &[SearchHit<'_, PackageRecord>], limit: usize) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Search Results · {} packages\n\n", hits.len()));

    let Some(first) = hits.first() else {
        md.push_str(&format!("No packages match '{}'.\n", normalize(query)));
        return md;
    };
    md.push_str(&format!("Match type: {}\n\n", first.score.tier.as_str()));

    md.push_str("| # | Code | Recipient | City | Status | Score |\n");
    md.push_str("|---|------|-----------|------|--------|-------|\n");
    for (rank, hit) in hits.iter().take(limit).enumerate() {
        let field = |value: &Option<String>| table_cell(value.as_deref().unwrap_or("-"));
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {:.2} |\n",
            rank + 1,
            field(&hit.record.code),
            field(&hit.record.recipient),
            field(&hit.record.city),
            field(&hit.record.status),
            hit.score.similarity
        ));
    }

    if hits.len() > limit {
        md.push_str(&format!("\n{} more not shown.\n", hits.len() - limit));
    }
    md
}
