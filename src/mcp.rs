//! MCP (Model Context Protocol) handling module
//!
//! This module implements the JSON-RPC 2.0 protocol for MCP communication.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::notify::Notifier;
use crate::search::SearchEngine;
use crate::tariff::RateEngine;
use crate::tracking::GpsTracker;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader as AsyncBufReader};
use tracing::{debug, error, info};

/// Server context: client information plus the engines a session works with
///
/// Search history and tracked routes live here, so they persist across
/// tool calls for the lifetime of the stdio session.
pub struct ServerContext {
    pub client_info: Option<ClientInfo>,
    pub rates: RateEngine,
    pub search: SearchEngine,
    pub tracker: GpsTracker,
    pub notifier: Notifier,
}

impl ServerContext {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            client_info: None,
            rates: RateEngine::new(config.tariffs.clone())?,
            search: SearchEngine::with_config(&config.search)?,
            tracker: GpsTracker::new(&config.tracking),
            notifier: Notifier::default(),
        })
    }

    pub fn get_client_name(&self) -> String {
        self.client_info
            .as_ref()
            .and_then(|info| info.name.as_ref())
            .cloned()
            .unwrap_or_else(|| "Unknown Client".to_string())
    }
}

/// MCP JSON-RPC 2.0 request structure
#[derive(Debug, Deserialize)]
pub struct McpRequest {
    /// JSON-RPC version field - required by the protocol but not accessed in code
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

/// Initialize request parameters
#[derive(Debug, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

/// Client information
#[derive(Debug, Deserialize, Clone)]
pub struct ClientInfo {
    pub name: Option<String>,
    #[allow(dead_code)]
    pub version: Option<String>,
}

/// MCP JSON-RPC 2.0 response structure
#[derive(Debug, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP Error structure
#[derive(Debug, Serialize)]
pub struct McpError {
    pub code: String,
    pub message: String,
}

/// MCP Tool call arguments
#[derive(Debug, Deserialize)]
pub struct ToolCallArgs {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// MCP Content item
#[derive(Debug, Serialize)]
pub struct ContentItem {
    pub r#type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// MCP Tool result
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub content: Vec<ContentItem>,
}

impl McpResponse {
    /// Create a successful response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: &str, message: &str) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }

    /// Wrap the outcome of a tool execution
    pub fn from_tool_result(id: Option<Value>, result: Result<ToolResult, AppError>) -> Self {
        match result.and_then(|content| serde_json::to_value(content).map_err(AppError::from)) {
            Ok(value) => Self::success(id, value),
            Err(e) => Self::error(id, e.error_code(), &e.message()),
        }
    }
}

impl ToolResult {
    /// Create a text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(content)],
        }
    }

    /// Create a result from explicit content items
    pub fn from_items(content: Vec<ContentItem>) -> Self {
        Self { content }
    }

    /// Text of the first content item, as printed in CLI mode
    pub fn into_text(self) -> String {
        self.content
            .into_iter()
            .next()
            .map(|c| c.text)
            .unwrap_or_default()
    }
}

impl ContentItem {
    /// Helper to create plain text content
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            r#type: "text".to_string(),
            text: content.into(),
            metadata: None,
        }
    }

    /// Text content with a structured copy of the same data attached
    pub fn text_with_metadata(content: impl Into<String>, metadata: Value) -> Self {
        Self {
            r#type: "text".to_string(),
            text: content.into(),
            metadata: Some(metadata),
        }
    }
}

/// Parse MCP request from JSON string
pub fn parse_request(json: &str) -> Result<McpRequest> {
    let request: McpRequest = serde_json::from_str(json)?;
    Ok(request)
}

/// Serialize MCP response to JSON string
pub fn serialize_response(response: &McpResponse) -> Result<String> {
    Ok(serde_json::to_string(response)?)
}

/// Handle stdio MCP communication
pub async fn handle_stdio(mut context: ServerContext) -> Result<()> {
    info!("Starting shalom MCP server on stdio");

    let stdin = tokio::io::stdin();
    let mut reader = AsyncBufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = reader.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Received request: {}", line);

        let response = match parse_request(&line) {
            Ok(request) => handle_request(request, &mut context),
            Err(e) => {
                error!("Failed to parse request: {}", e);
                McpResponse::error(None, "parse_error", &format!("Invalid JSON: {}", e))
            }
        };

        let response_json = serialize_response(&response)?;
        debug!("Sending response: {}", response_json);

        stdout.write_all(response_json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

/// Handle a single MCP request
pub fn handle_request(request: McpRequest, context: &mut ServerContext) -> McpResponse {
    match request.method.as_str() {
        "initialize" => handle_initialize(request, context),
        "tools/call" => handle_tool_call(request, context),
        "tools/list" => handle_tools_list(request),
        _ => McpResponse::error(
            request.id,
            "method_not_found",
            &format!("Method '{}' not found", request.method),
        ),
    }
}

/// Handle tools/call method
fn handle_tool_call(request: McpRequest, context: &mut ServerContext) -> McpResponse {
    let args: ToolCallArgs = match serde_json::from_value(request.params.unwrap_or_default()) {
        Ok(args) => args,
        Err(e) => {
            return McpResponse::error(
                request.id.clone(),
                "invalid_params",
                &format!("Invalid parameters: {}", e),
            )
        }
    };

    debug!("{} called tool '{}'", context.get_client_name(), args.name);

    use crate::tools;
    match args.name.as_str() {
        "quote" => tools::quote::handle_quote(request.id, args.arguments, &context.rates),
        "search" => tools::search::handle_search(request.id, args.arguments, &mut context.search),
        "suggest" => tools::search::handle_suggest(request.id, args.arguments, &context.search),
        "track" => tools::track::handle_track(request.id, args.arguments, &mut context.tracker),
        "route" => tools::track::handle_route(request.id, args.arguments, &context.tracker),
        "notify" => tools::notify::handle_notify(request.id, args.arguments, &mut context.notifier),
        "report" => tools::report::handle_report(request.id, args.arguments),
        _ => McpResponse::error(
            request.id,
            "tool_not_found",
            &format!("Tool '{}' not found", args.name),
        ),
    }
}

/// Handle tools/list method
fn handle_tools_list(request: McpRequest) -> McpResponse {
    let tools = build_tools_array();

    McpResponse::success(request.id, serde_json::json!({ "tools": tools }))
}

/// Handle initialize method
fn handle_initialize(request: McpRequest, context: &mut ServerContext) -> McpResponse {
    if let Some(params) = request.params {
        if let Ok(init_params) = serde_json::from_value::<InitializeParams>(params) {
            context.client_info = init_params.client_info;
        }
    }
    info!("Session initialized by {}", context.get_client_name());

    let tools = build_tools_array();
    let result = serde_json::json!({
        "serverInfo": {
            "name": "shalom",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "tools": { "list": true, "call": true }
        },
        "tools": tools
    });
    McpResponse::success(request.id, result)
}

/// Build the tools array returned from tools/list and initialize
fn build_tools_array() -> serde_json::Value {
    use crate::cli::{NotifyArgs, QuoteArgs, ReportArgs, RouteArgs, SearchArgs, SuggestArgs, TrackArgs};
    use schemars::schema_for;

    // Generate JSON schemas from the CLI argument structs
    let quote_schema = schema_for!(QuoteArgs);
    let search_schema = schema_for!(SearchArgs);
    let suggest_schema = schema_for!(SuggestArgs);
    let track_schema = schema_for!(TrackArgs);
    let route_schema = schema_for!(RouteArgs);
    let notify_schema = schema_for!(NotifyArgs);
    let report_schema = schema_for!(ReportArgs);

    serde_json::json!([
        {
            "name": "quote",
            "description": "Price a shipment by destination, service tier, weight and surcharges",
            "inputSchema": quote_schema
        },
        {
            "name": "search",
            "description": "Search package records with exact, partial and fuzzy matching",
            "inputSchema": search_schema
        },
        {
            "name": "suggest",
            "description": "Suggest previous search queries starting with a prefix",
            "inputSchema": suggest_schema
        },
        {
            "name": "track",
            "description": "Record a GPS position for a package",
            "inputSchema": track_schema
        },
        {
            "name": "route",
            "description": "Show the recorded route of a package",
            "inputSchema": route_schema
        },
        {
            "name": "notify",
            "description": "Render and dispatch a customer notification",
            "inputSchema": notify_schema
        },
        {
            "name": "report",
            "description": "Daily sales or packages-by-status report over a date range",
            "inputSchema": report_schema
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> ServerContext {
        ServerContext::new(&AppConfig::default()).unwrap()
    }

    fn request(id: i64, method: &str, params: Option<Value>) -> McpRequest {
        McpRequest {
            jsonrpc: "2.0".into(),
            id: Some(json!(id)),
            method: method.into(),
            params,
        }
    }

    fn call(context: &mut ServerContext, id: i64, name: &str, arguments: Value) -> McpResponse {
        handle_request(
            request(id, "tools/call", Some(json!({ "name": name, "arguments": arguments }))),
            context,
        )
    }

    fn text_of(resp: &McpResponse) -> String {
        resp.result
            .as_ref()
            .and_then(|r| r.get("content"))
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .expect("text content")
            .to_string()
    }

    #[test]
    fn test_initialize_response_contains_fields() {
        let mut context = context();
        let resp = handle_request(
            request(1, "initialize", Some(json!({ "clientInfo": { "name": "inspector" } }))),
            &mut context,
        );
        assert!(resp.error.is_none());
        let result = resp.result.expect("result present");
        assert_eq!(
            result
                .get("serverInfo")
                .and_then(|v| v.get("name"))
                .and_then(|v| v.as_str()),
            Some("shalom")
        );
        assert_eq!(
            result
                .get("capabilities")
                .and_then(|v| v.get("tools"))
                .and_then(|v| v.get("list"))
                .and_then(|v| v.as_bool()),
            Some(true)
        );
        assert!(result.get("tools").and_then(|v| v.as_array()).is_some());
        assert_eq!(context.get_client_name(), "inspector");
    }

    #[test]
    fn test_tools_list_contains_every_tool() {
        let mut context = context();
        let resp = handle_request(request(2, "tools/list", None), &mut context);
        assert!(resp.error.is_none());
        let result = resp.result.expect("result present");
        let tools = result
            .get("tools")
            .and_then(|v| v.as_array())
            .expect("tools array");
        let names: Vec<&str> = tools
            .iter()
            .filter_map(|t| t.get("name").and_then(|n| n.as_str()))
            .collect();
        assert_eq!(
            names,
            vec!["quote", "search", "suggest", "track", "route", "notify", "report"]
        );
        for tool in tools {
            assert!(tool.get("inputSchema").and_then(|s| s.get("properties")).is_some());
        }
    }

    #[test]
    fn test_unknown_method_and_tool() {
        let mut context = context();
        let resp = handle_request(request(3, "resources/list", None), &mut context);
        assert_eq!(resp.error.map(|e| e.code), Some("method_not_found".to_string()));

        let resp = call(&mut context, 4, "teleport", json!({}));
        assert_eq!(resp.error.map(|e| e.code), Some("tool_not_found".to_string()));
    }

    #[test]
    fn test_quote_tool_call() {
        let mut context = context();
        let resp = call(
            &mut context,
            5,
            "quote",
            json!({ "destination": "Lima", "tier": "express", "weight": 3.5, "fragile": true }),
        );
        assert!(resp.error.is_none());
        assert!(text_of(&resp).contains("S/ 39.00"));
    }

    #[test]
    fn test_invalid_weight_is_invalid_input() {
        let mut context = context();
        let resp = call(&mut context, 6, "quote", json!({ "destination": "Lima", "weight": -1.0 }));
        assert_eq!(resp.error.map(|e| e.code), Some("invalid_input".to_string()));
    }

    #[test]
    fn test_search_history_persists_across_calls() {
        let mut context = context();
        let records = json!([{ "codigo": "2025ABC1", "ciudad": "Lima" }]);
        for id in 0..2 {
            let resp = call(&mut context, id, "search", json!({ "query": "Lima ", "records": records.clone() }));
            assert!(resp.error.is_none());
        }
        let resp = call(&mut context, 9, "suggest", json!({ "prefix": "lim" }));
        let text = text_of(&resp);
        assert!(text.contains("lima "));
        assert!(text.contains("2 searches"));
    }

    #[test]
    fn test_route_follows_tracked_fixes() {
        let mut context = context();
        for (id, (lat, lng, ts)) in [
            (-12.0464, -77.0428, "2025-01-15T08:00:00Z"),
            (-13.5320, -71.9675, "2025-01-15T18:00:00Z"),
        ]
        .into_iter()
        .enumerate()
        {
            let resp = call(
                &mut context,
                id as i64,
                "track",
                json!({ "code": "P1", "latitude": lat, "longitude": lng, "timestamp": ts }),
            );
            assert!(resp.error.is_none());
        }
        let resp = call(&mut context, 10, "route", json!({ "code": "P1" }));
        assert!(text_of(&resp).contains("**Fixes:** 2"));

        let resp = call(&mut context, 11, "route", json!({ "code": "P2" }));
        assert_eq!(resp.error.map(|e| e.code), Some("not_found".to_string()));
    }

    #[test]
    fn test_parse_request_rejects_garbage() {
        assert!(parse_request("{not json").is_err());
        let req = parse_request(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).unwrap();
        assert_eq!(req.method, "tools/list");
        assert!(req.params.is_none());
    }
}
