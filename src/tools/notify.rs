//! Notify tool implementation
//!
//! Implements the `notify(kind, channels, data)` MCP tool

use crate::cli::NotifyArgs;
use crate::error::AppError;
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use crate::notify::{Channel, DispatchRecord, DispatchStatus, NotificationKind, Notifier};
use crate::tools::util::parse_args;
use serde_json::Value;
use std::collections::BTreeMap;

/// Handle notify tool call (MCP)
pub fn handle_notify(id: Option<Value>, args: Value, notifier: &mut Notifier) -> McpResponse {
    let result = parse_args::<NotifyArgs>(args).and_then(|args| execute_notify(notifier, args));
    McpResponse::from_tool_result(id, result)
}

/// Shared implementation for notify (used by MCP and CLI)
pub fn execute_notify(notifier: &mut Notifier, args: NotifyArgs) -> Result<ToolResult, AppError> {
    let kind: NotificationKind = args.kind.parse()?;
    let channels = args
        .channels
        .iter()
        .map(|c| c.parse::<Channel>())
        .collect::<Result<Vec<_>, _>>()?;
    let data = template_data(args.data, &args.vars)?;

    let record = notifier.send(kind, &data, &channels);
    let session_total = notifier.sent().count();
    let metadata = serde_json::to_value(&record)?;
    Ok(ToolResult::from_items(vec![ContentItem::text_with_metadata(
        format_dispatch(&record, session_total),
        metadata,
    )]))
}

/// Flatten JSON values to template strings, then apply `KEY=VALUE` overrides
fn template_data(
    data: BTreeMap<String, Value>,
    vars: &[String],
) -> Result<BTreeMap<String, String>, AppError> {
    let mut out: BTreeMap<String, String> = data
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((key, text))
        })
        .collect();

    for var in vars {
        let (key, value) = var.split_once('=').ok_or_else(|| {
            AppError::InvalidInput(format!("Expected KEY=VALUE, got '{}'", var))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::InvalidInput(format!("Empty key in '{}'", var)));
        }
        out.insert(key.to_string(), value.to_string());
    }
    Ok(out)
}

fn format_dispatch(record: &DispatchRecord, session_total: usize) -> String {
    let status = match record.status {
        DispatchStatus::Sent => "sent",
        DispatchStatus::PartiallySent => "partially sent",
        DispatchStatus::Failed => "failed",
    };
    let channels: Vec<&str> = record.channels.iter().map(Channel::as_str).collect();

    let mut md = format!("# Notification {} · {}\n\n", status, record.kind);
    md.push_str(&format!("**{}**\n\n", record.title));
    md.push_str(&format!("> {}\n\n", record.body));
    md.push_str(&format!("- Channels: {}\n", channels.join(", ")));
    if let Some(recipient) = &record.recipient {
        md.push_str(&format!("- Recipient: {}\n", recipient));
    }
    if !record.failed_channels.is_empty() {
        let failed: Vec<&str> = record.failed_channels.iter().map(Channel::as_str).collect();
        md.push_str(&format!("- Failed: {}\n", failed.join(", ")));
    }
    md.push_str(&format!("- Notifications this session: {}\n", session_total));
    md
}
