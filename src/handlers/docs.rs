//! Static OpenAPI description of the demo API.
//!
//! Served under an `/api-docs` path so it stays reachable without a
//! signature. Only the machine-readable document is provided; there is no
//! bundled documentation UI.

use axum::Json;
use serde_json::{Value, json};

use crate::signing::{SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Where the OpenAPI document is served.
pub const API_DOCS_PATH: &str = "/v3/api-docs";

const HMAC_SECURITY_SCHEME: &str = "hmacAuth";

/// OpenAPI 3 document for the demo endpoints.
pub async fn api_docs() -> Json<Value> {
    Json(openapi_document())
}

fn openapi_document() -> Value {
    let timestamp_param = json!({
        "name": TIMESTAMP_HEADER.to_ascii_uppercase(),
        "in": "header",
        "required": true,
        "description": "Request time in milliseconds since the Unix epoch",
        "schema": { "type": "string" }
    });

    let responses = json!({
        "200": {
            "description": "Sum computed",
            "content": { "application/json": { "schema": { "type": "integer", "format": "int32" } } }
        },
        "400": { "description": "Invalid input" },
        "401": { "description": "Missing or invalid HMAC signature or timestamp" }
    });

    json!({
        "openapi": "3.0.1",
        "info": {
            "title": "HMAC Demo API",
            "description": "All requests must include an HMAC signature in the X-HMAC-SIGNATURE header.",
            "version": "v1.0.0"
        },
        "security": [ { HMAC_SECURITY_SCHEME: [] } ],
        "components": {
            "securitySchemes": {
                HMAC_SECURITY_SCHEME: {
                    "type": "apiKey",
                    "in": "header",
                    "name": SIGNATURE_HEADER.to_ascii_uppercase(),
                    "description": "HMAC signature calculated using HmacSHA256"
                }
            },
            "schemas": {
                "SumRequest": {
                    "type": "object",
                    "required": ["a", "b"],
                    "properties": {
                        "a": { "type": "integer", "format": "int32" },
                        "b": { "type": "integer", "format": "int32" }
                    }
                }
            }
        },
        "paths": {
            "/api/demo/sum": {
                "get": {
                    "summary": "Add two integers",
                    "parameters": [
                        { "name": "a", "in": "query", "required": true, "schema": { "type": "integer", "format": "int32" } },
                        { "name": "b", "in": "query", "required": true, "schema": { "type": "integer", "format": "int32" } },
                        timestamp_param.clone()
                    ],
                    "responses": responses.clone()
                },
                "post": {
                    "summary": "Add two integers from a JSON body",
                    "parameters": [ timestamp_param ],
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/SumRequest" } } }
                    },
                    "responses": responses
                }
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_document_declares_hmac_scheme() {
        let doc = openapi_document();
        let scheme = &doc["components"]["securitySchemes"][HMAC_SECURITY_SCHEME];
        assert_eq!(scheme["name"], "X-HMAC-SIGNATURE");
        assert_eq!(scheme["in"], "header");
    }

    #[test]
    fn test_document_lists_both_sum_operations() {
        let doc = openapi_document();
        let sum = &doc["paths"]["/api/demo/sum"];
        assert!(sum.get("get").is_some());
        assert!(sum.get("post").is_some());
    }
}
