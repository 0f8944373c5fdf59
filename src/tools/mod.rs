//! MCP tools implementation
//!
//! Each tool has an `execute_*` function shared by CLI and MCP modes and a
//! `handle_*` wrapper that turns MCP arguments into a JSON-RPC response.

pub mod notify;
pub mod quote;
pub mod report;
pub mod search;
pub mod track;
pub mod util;
