//! MCP tool modules.

pub mod format;
