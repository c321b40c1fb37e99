//! Static `tools/list` catalog

use serde_json::{json, Value};

/// Tool descriptors advertised to MCP clients. Independent of repository state.
pub fn catalog() -> Value {
    json!({
        "tools": [
            {
                "name": "getRules",
                "description": "Get coding rules for a specific project",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "project_id": {
                            "type": "string",
                            "description": "The project ID to get rules for"
                        },
                        "language": {
                            "type": "string",
                            "description": "Programming language (optional)"
                        }
                    },
                    "required": ["project_id"]
                }
            },
            {
                "name": "validateCode",
                "description": "Validate code against project rules",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "project_id": {
                            "type": "string",
                            "description": "The project ID to validate against"
                        },
                        "code": {
                            "type": "string",
                            "description": "The code to validate"
                        },
                        "language": {
                            "type": "string",
                            "description": "Programming language (optional)"
                        }
                    },
                    "required": ["project_id", "code"]
                }
            },
            {
                "name": "getProjectInfo",
                "description": "Get information about a specific project",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "project_id": {
                            "type": "string",
                            "description": "The project ID to get info for"
                        }
                    },
                    "required": ["project_id"]
                }
            },
            {
                "name": "autoDetectProject",
                "description": "Automatically detect project from path and get appropriate rules",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "The path to detect project from"
                        }
                    },
                    "required": ["path"]
                }
            },
            {
                "name": "scanLocalProjects",
                "description": "Scan local directory to detect multiple projects",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "base_path": {
                            "type": "string",
                            "description": "The base path to scan for projects (optional, defaults to /)"
                        }
                    }
                }
            }
        ]
    })
}
