//! Tool definitions and dispatch
//!
//! Each tool maps onto one aggregation service operation. Listings are
//! returned as JSON text of structure summaries.

use crate::rpc::protocol::{CallToolResult, Tool};
use crate::service::AggregationService;
use crate::structure::{StructureDefinition, StructureSummary};
use crate::types::Scope;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

fn tool(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn pid_schema() -> Value {
    json!({
        "type": "integer",
        "description": "Storage location (page id)"
    })
}

fn scope_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["page", "fce"],
        "description": "Structure scope: page template or flexible content element"
    })
}

/// Get all tool definitions
pub fn get_tool_definitions() -> Vec<Tool> {
    vec![
        tool(
            "ds_by_location",
            "List data structures available at a storage location, sorted by title.",
            json!({
                "type": "object",
                "properties": { "pid": pid_schema() },
                "required": ["pid"]
            }),
        ),
        tool(
            "ds_by_location_and_scope",
            "List data structures of one scope available at a storage location.",
            json!({
                "type": "object",
                "properties": { "pid": pid_schema(), "scope": scope_schema() },
                "required": ["pid", "scope"]
            }),
        ),
        tool(
            "ds_by_scope",
            "List data structures of one scope regardless of location.",
            json!({
                "type": "object",
                "properties": { "scope": scope_schema() },
                "required": ["scope"]
            }),
        ),
        tool(
            "ds_all",
            "List every known data structure, static files and records alike.",
            json!({ "type": "object", "properties": {} }),
        ),
        tool(
            "ds_count_for_location",
            "Count distinct data structures used by template objects at a storage location.",
            json!({
                "type": "object",
                "properties": { "pid": pid_schema() },
                "required": ["pid"]
            }),
        ),
        tool(
            "ds_resolve",
            "Resolve a single data structure by uid or by static file path.",
            json!({
                "type": "object",
                "properties": {
                    "token": {
                        "type": "string",
                        "description": "Positive uid or site-relative file path"
                    }
                },
                "required": ["token"]
            }),
        ),
        tool(
            "ds_static_config",
            "Show the merged static data structure configuration.",
            json!({ "type": "object", "properties": {} }),
        ),
    ]
}

/// Dispatch a tool call
pub fn call_tool(name: &str, args: Value, service: &AggregationService) -> CallToolResult {
    match name {
        "ds_by_location" => with_args(args, |a: PidArgs| {
            listing(service.by_location(a.pid))
        }),
        "ds_by_location_and_scope" => with_args(args, |a: PidScopeArgs| {
            match parse_scope(&a.scope) {
                Ok(scope) => listing(service.by_location_and_scope(a.pid, scope)),
                Err(result) => result,
            }
        }),
        "ds_by_scope" => with_args(args, |a: ScopeArgs| match parse_scope(&a.scope) {
            Ok(scope) => listing(service.by_scope(scope)),
            Err(result) => result,
        }),
        "ds_all" => listing(service.all()),
        "ds_count_for_location" => with_args(args, |a: PidArgs| {
            match service.count_for_location(a.pid) {
                Ok(count) => json_text(&json!({ "pid": a.pid, "count": count })),
                Err(e) => failure("ds_count_for_location", e),
            }
        }),
        "ds_resolve" => with_args(args, |a: TokenArgs| match service.resolve(&a.token) {
            Ok(ds) => json_text(&ds.summary()),
            Err(e) => failure("ds_resolve", e),
        }),
        "ds_static_config" => match service.static_configuration() {
            Ok(entries) => json_text(&entries),
            Err(e) => failure("ds_static_config", e),
        },
        _ => CallToolResult::error(format!("Unknown tool: {}", name)),
    }
}

#[derive(Debug, Deserialize)]
struct PidArgs {
    pid: i64,
}

#[derive(Debug, Deserialize)]
struct ScopeArgs {
    scope: String,
}

#[derive(Debug, Deserialize)]
struct PidScopeArgs {
    pid: i64,
    scope: String,
}

#[derive(Debug, Deserialize)]
struct TokenArgs {
    token: String,
}

fn with_args<A, F>(args: Value, handler: F) -> CallToolResult
where
    A: DeserializeOwned,
    F: FnOnce(A) -> CallToolResult,
{
    match serde_json::from_value(args) {
        Ok(args) => handler(args),
        Err(e) => CallToolResult::error(format!("Invalid arguments: {}", e)),
    }
}

fn parse_scope(raw: &str) -> Result<Scope, CallToolResult> {
    Scope::parse(raw).ok_or_else(|| CallToolResult::error(format!("Unknown scope: {}", raw)))
}

fn listing(result: crate::types::Result<Vec<StructureDefinition>>) -> CallToolResult {
    match result {
        Ok(structures) => {
            let summaries: Vec<StructureSummary> =
                structures.iter().map(StructureDefinition::summary).collect();
            json_text(&summaries)
        }
        Err(e) => failure("listing", e),
    }
}

fn json_text<T: Serialize>(value: &T) -> CallToolResult {
    match serde_json::to_string_pretty(value) {
        Ok(text) => CallToolResult::text(text),
        Err(e) => CallToolResult::error(format!("Failed to serialize result: {}", e)),
    }
}

fn failure(tool: &str, e: crate::types::RegistryError) -> CallToolResult {
    error!("{} error: {}", tool, e);
    CallToolResult::error(format!("Error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigRegistry, StaticConfigEntry, StaticDsSettings};
    use crate::rpc::protocol::ToolContent;
    use crate::storage::{LocalFileSystem, MemoryStore};
    use std::sync::Arc;

    fn service() -> AggregationService {
        let registry = Arc::new(ConfigRegistry::new());
        registry.register_entry(&StaticConfigEntry::new("ds/teaser.xml", "Teaser", Scope::Fce));
        registry.register_entry(&StaticConfigEntry::new("ds/main.xml", "Main", Scope::Page));

        let store = MemoryStore::from_json(
            r#"{
                "datastructure": [ { "uid": 4, "pid": 2, "title": "Columns", "scope": 2 } ],
                "template_object": [ { "uid": 1, "pid": 2, "datastructure": 4 } ]
            }"#,
        )
        .unwrap();

        AggregationService::new(
            registry,
            Arc::new(LocalFileSystem::new("/srv/site")),
            Arc::new(store),
            Arc::new(StaticDsSettings::default()),
        )
    }

    fn text(result: &CallToolResult) -> &str {
        match &result.content[0] {
            ToolContent::Text { text } => text.as_str(),
        }
    }

    #[test]
    fn test_definitions_are_unique() {
        let tools = get_tool_definitions();
        let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn test_by_location_and_scope() {
        let result = call_tool(
            "ds_by_location_and_scope",
            json!({ "pid": 2, "scope": "fce" }),
            &service(),
        );
        assert!(result.is_error.is_none());

        let listed: Vec<Value> = serde_json::from_str(text(&result)).unwrap();
        let keys: Vec<&str> = listed.iter().map(|v| v["key"].as_str().unwrap()).collect();
        assert_eq!(keys, vec!["4", "ds/teaser.xml"]);
    }

    #[test]
    fn test_count_for_location() {
        let result = call_tool("ds_count_for_location", json!({ "pid": 2 }), &service());
        let value: Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(value["count"], 1);
    }

    #[test]
    fn test_resolve_errors_are_tool_errors() {
        let result = call_tool("ds_resolve", json!({ "token": "missing.xml" }), &service());
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("missing.xml"));
    }

    #[test]
    fn test_invalid_arguments() {
        let result = call_tool("ds_by_scope", json!({ "scope": "section" }), &service());
        assert_eq!(result.is_error, Some(true));

        let result = call_tool("ds_by_location", json!({}), &service());
        assert_eq!(result.is_error, Some(true));

        let result = call_tool("ds_nothing", Value::Null, &service());
        assert_eq!(result.is_error, Some(true));
    }
}
