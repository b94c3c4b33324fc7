//! Small builders for the OpenAPI fragments each module contributes.

use serde_json::{json, Value};

pub fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

pub fn array_of(name: &str) -> Value {
    json!({ "type": "array", "items": schema_ref(name) })
}

/// `200` with a JSON body plus the shared error responses.
pub fn responses(description: &str, schema: Value, error_statuses: &[&str]) -> Value {
    let mut responses = json!({
        "200": {
            "description": description,
            "content": { "application/json": { "schema": schema } }
        }
    });
    for status in error_statuses {
        responses[*status] = json!({
            "description": error_description(status),
            "content": { "application/json": { "schema": schema_ref("ErrorResponse") } }
        });
    }
    responses
}

fn error_description(status: &str) -> &'static str {
    match status {
        "400" => "Invalid input",
        "404" => "Not found",
        _ => "Internal server error",
    }
}

pub fn path_param(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "description": description,
        "schema": { "type": "string" }
    })
}

pub fn json_body(name: &str) -> Value {
    json!({
        "required": true,
        "content": { "application/json": { "schema": schema_ref(name) } }
    })
}

pub fn operation(summary: &str, tag: &str, responses: Value) -> Value {
    json!({ "summary": summary, "tags": [tag], "responses": responses })
}
