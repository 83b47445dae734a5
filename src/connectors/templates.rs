//! Built-in connector templates and pre-flight validation.

use super::types::{ConnectorSpec, ConnectorTemplate, ValidationCheck};
use crate::mcp_client::TransportDescriptor;

fn template(
    id: &str,
    name: &str,
    description: &str,
    command: &str,
    args: &[&str],
) -> ConnectorTemplate {
    ConnectorTemplate {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        transport: TransportDescriptor::stdio(command, args.iter().map(|a| a.to_string()).collect()),
        required_fields: ["name", "transport", "command"]
            .iter()
            .map(|f| f.to_string())
            .collect(),
    }
}

/// Templates offered when creating a connector.
pub fn builtin_templates() -> Vec<ConnectorTemplate> {
    vec![
        template(
            "filesystem",
            "Filesystem",
            "Read/write files through MCP filesystem server",
            "npx",
            &["-y", "@modelcontextprotocol/server-filesystem", "."],
        ),
        template(
            "fetch",
            "Fetch",
            "HTTP fetch and web retrieval connector",
            "uvx",
            &["mcp-server-fetch"],
        ),
        template(
            "github",
            "GitHub",
            "GitHub API connector via MCP",
            "npx",
            &["-y", "@modelcontextprotocol/server-github"],
        ),
    ]
}

/// Named checks run against a spec before it is added.
pub fn validation_checks(spec: &ConnectorSpec) -> Vec<ValidationCheck> {
    let mut checks = Vec::with_capacity(2);

    let id_ok = !spec.id.trim().is_empty();
    checks.push(ValidationCheck {
        name: "id_not_empty".into(),
        ok: id_ok,
        message: if id_ok {
            "Connector id is set".into()
        } else {
            "Connector id must not be empty".into()
        },
    });

    match &spec.transport {
        TransportDescriptor::Stdio { command, .. } => {
            let ok = !command.trim().is_empty();
            checks.push(ValidationCheck {
                name: "stdio_command".into(),
                ok,
                message: if ok {
                    format!("Command '{command}' will be launched over stdio")
                } else {
                    "stdio transport requires a command".into()
                },
            });
        }
        TransportDescriptor::HttpStream { endpoint } => {
            let trimmed = endpoint.trim();
            let ok = !trimmed.is_empty();
            checks.push(ValidationCheck {
                name: "http_endpoint".into(),
                ok,
                message: if ok {
                    format!("Endpoint '{trimmed}' will be used for streamable HTTP")
                } else {
                    "http_stream transport requires an endpoint".into()
                },
            });
        }
    }

    checks
}

/// First failing check, if any.
pub fn first_failure(spec: &ConnectorSpec) -> Option<ValidationCheck> {
    validation_checks(spec).into_iter().find(|check| !check.ok)
}
