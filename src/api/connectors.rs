//! Connector catalog and tool-server lifecycle calls.

use super::types::{
    Api, ApiResponse, ApiResult, ConnectorBody, ConnectorListBody, DisconnectedBody, RemovedBody,
    TemplateListBody, ToolListBody, ValidationBody,
};
use crate::connectors::ConnectorSpec;
use crate::mcp_client::ToolServerSummary;

impl Api {
    pub fn list_connectors(&self, correlation_id: Option<&str>) -> ApiResponse<ConnectorListBody> {
        ApiResponse::ok(
            correlation_id,
            ConnectorListBody {
                connectors: self.runtime().connectors.list(),
            },
        )
    }

    pub fn connector_templates(
        &self,
        correlation_id: Option<&str>,
    ) -> ApiResponse<TemplateListBody> {
        ApiResponse::ok(
            correlation_id,
            TemplateListBody {
                templates: self.runtime().connectors.templates(),
            },
        )
    }

    /// Dry-run the checks `add_connector` applies.
    pub fn validate_connector(
        &self,
        correlation_id: Option<&str>,
        spec: &ConnectorSpec,
    ) -> ApiResponse<ValidationBody> {
        let checks = self.runtime().connectors.validate(spec);
        ApiResponse::ok(
            correlation_id,
            ValidationBody {
                ok: checks.iter().all(|c| c.ok),
                checks,
            },
        )
    }

    /// Add a connector in the disconnected state. Answers 201.
    pub fn add_connector(
        &self,
        correlation_id: Option<&str>,
        spec: ConnectorSpec,
    ) -> ApiResult<ConnectorBody> {
        self.call("add_connector", correlation_id, 201, |rt| {
            rt.connectors.add(spec).map(|connector| ConnectorBody { connector })
        })
    }

    pub fn remove_connector(
        &self,
        correlation_id: Option<&str>,
        connector_id: &str,
    ) -> ApiResult<RemovedBody> {
        self.call("remove_connector", correlation_id, 200, |rt| {
            rt.connectors.remove(connector_id).map(|entry| RemovedBody {
                status: "removed",
                connector_id: entry.id,
            })
        })
    }

    pub fn connect_connector(
        &self,
        correlation_id: Option<&str>,
        connector_id: &str,
    ) -> ApiResult<ToolServerSummary> {
        self.call("connect_connector", correlation_id, 200, |rt| {
            rt.connectors.connect(connector_id)
        })
    }

    pub fn disconnect_connector(
        &self,
        correlation_id: Option<&str>,
        connector_id: &str,
    ) -> ApiResult<DisconnectedBody> {
        self.call("disconnect_connector", correlation_id, 200, |rt| {
            rt.connectors.disconnect(connector_id).map(|entry| DisconnectedBody {
                status: "disconnected",
                server_id: entry.id,
            })
        })
    }

    pub fn refresh_connector_tools(
        &self,
        correlation_id: Option<&str>,
        connector_id: &str,
    ) -> ApiResult<ToolListBody> {
        self.call("refresh_connector_tools", correlation_id, 200, |rt| {
            rt.connectors
                .refresh_tools(connector_id)
                .map(|tools| ToolListBody {
                    connector_id: connector_id.to_string(),
                    tools,
                })
        })
    }

    pub fn list_connector_tools(
        &self,
        correlation_id: Option<&str>,
        connector_id: &str,
    ) -> ApiResult<ToolListBody> {
        self.call("list_connector_tools", correlation_id, 200, |rt| {
            rt.connectors.list_tools(connector_id).map(|tools| ToolListBody {
                connector_id: connector_id.to_string(),
                tools,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegisterModel;
    use crate::test_support::test_runtime;

    #[test]
    fn test_connector_lifecycle() {
        let fx = test_runtime();
        fx.runtime
            .models
            .register(RegisterModel::new(&fx.model_path))
            .unwrap();
        fx.runtime.agent.select("tiny", None).unwrap();
        let api = Api::new(fx.runtime.clone());

        let added = api
            .add_connector(None, ConnectorSpec::stdio("fs", "npx", vec![]))
            .unwrap();
        assert_eq!(added.status, 201);
        let json = serde_json::to_value(&added).unwrap();
        assert_eq!(json["connector"]["status"], "disconnected");
        assert_eq!(json["connector"]["transport"], "stdio");

        let summary = api.connect_connector(None, "fs").unwrap().body;
        assert!(summary.connected);
        assert_eq!(summary.discovered_tool_count, 2);

        let tools = api.list_connector_tools(None, "fs").unwrap().body;
        assert_eq!(tools.connector_id, "fs");
        assert_eq!(tools.tools.len(), 2);

        fx.factory.transports().set_tools(&["read_file"]);
        let refreshed = api.refresh_connector_tools(None, "fs").unwrap().body;
        assert_eq!(refreshed.tools.len(), 1);

        let disconnected = api.disconnect_connector(None, "fs").unwrap();
        assert_eq!(
            serde_json::to_value(&disconnected).unwrap(),
            serde_json::json!({"status": "disconnected", "server_id": "fs"})
        );

        let removed = api.remove_connector(None, "fs").unwrap().body;
        assert_eq!(removed.connector_id, "fs");
        assert!(api.list_connectors(None).body.connectors.is_empty());
    }

    #[test]
    fn test_connect_unknown_connector() {
        let fx = test_runtime();
        let api = Api::new(fx.runtime.clone());
        let err = api.connect_connector(Some("cor_n"), "ghost").unwrap_err();
        assert_eq!(err.status, 404);
        assert_eq!(err.code(), "APP-MCP-404");
        assert_eq!(err.to_json()["error"]["details"]["connector_id"], "ghost");
    }

    #[test]
    fn test_connect_without_model_is_conflict() {
        let fx = test_runtime();
        let api = Api::new(fx.runtime.clone());
        api.add_connector(None, ConnectorSpec::http_stream("remote", "http://localhost:8931/mcp"))
            .unwrap();
        let err = api.connect_connector(None, "remote").unwrap_err();
        assert_eq!(err.code(), "APP-STATE-409");
    }

    #[test]
    fn test_duplicate_connector_is_conflict() {
        let fx = test_runtime();
        let api = Api::new(fx.runtime.clone());
        api.add_connector(None, ConnectorSpec::stdio("fs", "npx", vec![]))
            .unwrap();
        let err = api
            .add_connector(None, ConnectorSpec::stdio("fs", "npx", vec![]))
            .unwrap_err();
        assert_eq!(err.status, 409);
        assert_eq!(err.code(), "APP-MCP-409");
    }

    #[test]
    fn test_validate_and_templates() {
        let fx = test_runtime();
        let api = Api::new(fx.runtime.clone());

        let report = api
            .validate_connector(None, &ConnectorSpec::stdio("", "npx", vec![]))
            .body;
        assert!(!report.ok);
        assert!(report.checks.iter().any(|c| !c.ok));

        let templates = api.connector_templates(None).body.templates;
        assert!(templates.iter().any(|t| t.id == "filesystem"));
    }
}
