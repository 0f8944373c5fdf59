//! Tracking tool implementation
//!
//! Implements the `track(code, latitude, longitude)` and `route(code)` MCP tools

use crate::cli::{RouteArgs, TrackArgs};
use crate::error::AppError;
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use crate::tools::util::parse_args;
use crate::tracking::GpsTracker;
use chrono::Utc;
use serde_json::Value;
use tracing::info;

/// Handle track tool call (MCP)
pub fn handle_track(id: Option<Value>, args: Value, tracker: &mut GpsTracker) -> McpResponse {
    let result = parse_args::<TrackArgs>(args).and_then(|args| execute_track(tracker, args));
    McpResponse::from_tool_result(id, result)
}

/// Handle route tool call (MCP)
pub fn handle_route(id: Option<Value>, args: Value, tracker: &GpsTracker) -> McpResponse {
    let result = parse_args::<RouteArgs>(args).and_then(|args| execute_route(tracker, args));
    McpResponse::from_tool_result(id, result)
}

/// Record one fix
pub fn execute_track(tracker: &mut GpsTracker, args: TrackArgs) -> Result<ToolResult, AppError> {
    let code = args.code.trim();
    let timestamp = args.timestamp.unwrap_or_else(Utc::now);
    let fix = tracker.update(code, args.latitude, args.longitude, timestamp)?;
    info!("Tracked {} at ({}, {})", code, fix.latitude, fix.longitude);

    let md = format!(
        "# Position · {}\n\n- Location: {:.5}, {:.5}\n- Time: {}\n- Speed: {:.1} km/h\n",
        code,
        fix.latitude,
        fix.longitude,
        fix.timestamp.to_rfc3339(),
        fix.speed_kmh
    );
    let metadata = serde_json::to_value(&fix)?;
    Ok(ToolResult::from_items(vec![ContentItem::text_with_metadata(md, metadata)]))
}

/// Summarize the recorded route of a package
pub fn execute_route(tracker: &GpsTracker, args: RouteArgs) -> Result<ToolResult, AppError> {
    let code = args.code.trim();
    let current = tracker
        .current(code)
        .ok_or_else(|| AppError::NotFound(format!("No positions recorded for package {}", code)))?;
    let route = tracker.route(code);

    let mut md = format!("# Route · {}\n\n", code);
    md.push_str(&format!("**Fixes:** {}\n", route.len()));
    md.push_str(&format!("**Distance:** {:.1} km\n", tracker.distance_km(code)));
    md.push_str(&format!(
        "**Current:** {:.5}, {:.5} at {} ({:.1} km/h)\n\n",
        current.latitude,
        current.longitude,
        current.timestamp.to_rfc3339(),
        current.speed_kmh
    ));
    for fix in tracker.fixes(code) {
        md.push_str(&format!(
            "- {} · {:.5}, {:.5}\n",
            fix.timestamp.to_rfc3339(),
            fix.latitude,
            fix.longitude
        ));
    }

    Ok(ToolResult::text(md))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(code: &str, latitude: f64, longitude: f64, timestamp: &str) -> TrackArgs {
        TrackArgs {
            code: code.to_string(),
            latitude,
            longitude,
            timestamp: Some(timestamp.parse().unwrap()),
        }
    }

    #[test]
    fn test_track_reports_speed() {
        let mut tracker = GpsTracker::default();
        execute_track(&mut tracker, track("P1", 0.0, 0.0, "2025-01-15T08:00:00Z")).unwrap();
        // one degree of latitude is about 111.2 km
        let result =
            execute_track(&mut tracker, track("P1", 1.0, 0.0, "2025-01-15T10:00:00Z")).unwrap();
        let item = &result.content[0];
        assert!(item.text.contains("Speed: 55.6 km/h"), "{}", item.text);
        assert_eq!(item.metadata.as_ref().unwrap()["latitude"], serde_json::json!(1.0));
    }

    #[test]
    fn test_track_without_timestamp_uses_now() {
        let mut tracker = GpsTracker::default();
        let before = Utc::now();
        execute_track(
            &mut tracker,
            TrackArgs {
                code: " P1 ".to_string(),
                latitude: -12.0,
                longitude: -77.0,
                timestamp: None,
            },
        )
        .unwrap();
        let fix = tracker.current("P1").unwrap();
        assert!(fix.timestamp >= before);
    }

    #[test]
    fn test_track_rejects_bad_coordinates() {
        let mut tracker = GpsTracker::default();
        let err = execute_track(&mut tracker, track("P1", 120.0, 0.0, "2025-01-15T08:00:00Z"))
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_input");
    }

    #[test]
    fn test_route_summary() {
        let mut tracker = GpsTracker::default();
        execute_track(&mut tracker, track("P1", 0.0, 0.0, "2025-01-15T08:00:00Z")).unwrap();
        execute_track(&mut tracker, track("P1", 1.0, 0.0, "2025-01-15T10:00:00Z")).unwrap();

        let text = execute_route(&tracker, RouteArgs { code: "P1".to_string() })
            .unwrap()
            .into_text();
        assert!(text.contains("**Fixes:** 2"));
        assert!(text.contains("**Distance:** 111.2 km"));
        assert!(text.contains("**Current:** 1.00000, 0.00000"));
    }

    #[test]
    fn test_route_for_unknown_package() {
        let tracker = GpsTracker::default();
        let err = execute_route(&tracker, RouteArgs { code: "nope".to_string() }).unwrap_err();
        assert_eq!(err.error_code(), "not_found");
    }
}
