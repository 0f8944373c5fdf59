//! Report tool implementation
//!
//! Implements the `report(kind, from, to, ...)` MCP tool

use crate::cli::ReportArgs;
use crate::error::AppError;
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use crate::reports::{self, DateRange, PackageEntry, Report, ReportKind, Transaction};
use crate::tools::util::{format_money, load_json_file, parse_args, table_cell};
use serde_json::Value;
use tracing::info;

/// Handle report tool call (MCP)
pub fn handle_report(id: Option<Value>, args: Value) -> McpResponse {
    let result = parse_args::<ReportArgs>(args).and_then(execute_report);
    McpResponse::from_tool_result(id, result)
}

/// Shared implementation for report (used by MCP and CLI)
pub fn execute_report(args: ReportArgs) -> Result<ToolResult, AppError> {
    let kind: ReportKind = args.kind.parse()?;
    let range = DateRange::parse(&args.from, &args.to)?;

    let mut packages = args.packages;
    if let Some(path) = &args.packages_file {
        packages.extend(load_json_file::<Vec<PackageEntry>>(path)?);
    }
    let mut transactions = args.transactions;
    if let Some(path) = &args.transactions_file {
        transactions.extend(load_json_file::<Vec<Transaction>>(path)?);
    }

    let report = reports::generate(kind, range, &packages, &transactions);
    info!("Generated {} report for {} to {}", kind, range.from, range.to);

    let metadata = serde_json::to_value(&report)?;
    Ok(ToolResult::from_items(vec![ContentItem::text_with_metadata(
        format_report(&report, &range),
        metadata,
    )]))
}

fn format_report(report: &Report, range: &DateRange) -> String {
    let mut md = format!("# {} · {} to {}\n\n", report.title(), range.from, range.to);
    match report {
        Report::DailySales(sales) => {
            if sales.rows.is_empty() {
                md.push_str("No sales in this period.\n\n");
            } else {
                md.push_str("| Date | Amount | Packages |\n|------|--------|----------|\n");
                for row in &sales.rows {
                    md.push_str(&format!(
                        "| {} | {} | {} |\n",
                        row.date,
                        format_money(row.amount),
                        row.packages
                    ));
                }
                md.push('\n');
            }
            md.push_str(&format!("**Total:** {}\n", format_money(sales.total)));
            md.push_str(&format!("**Daily average:** {}\n", format_money(sales.average)));
        }
        Report::PackagesByStatus(status) => {
            if !status.rows.is_empty() {
                md.push_str("| Status | Count | Share |\n|--------|-------|-------|\n");
                for row in &status.rows {
                    md.push_str(&format!(
                        "| {} | {} | {:.2}% |\n",
                        table_cell(&row.status),
                        row.count,
                        row.percentage
                    ));
                }
                md.push('\n');
            }
            md.push_str(&format!("**Total packages:** {}\n", status.total));
        }
    }
    md
}
