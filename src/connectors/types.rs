//! Connector catalog types.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::mcp_client::{ToolDescriptor, ToolServerConfig, TransportDescriptor};

/// Live connection state of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorStatus {
    Disconnected,
    Connected,
    /// Last connect or refresh failed. The entry is kept so it can be retried.
    Degraded,
}

/// Input to `ConnectorRegistry::add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub transport: TransportDescriptor,
    #[serde(default)]
    pub protocol_version: Option<String>,
}

impl ConnectorSpec {
    pub fn stdio(id: impl Into<String>, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            transport: TransportDescriptor::stdio(command, args),
            protocol_version: None,
        }
    }

    pub fn http_stream(id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            transport: TransportDescriptor::http_stream(endpoint),
            protocol_version: None,
        }
    }
}

/// A registered tool connector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorEntry {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub transport: TransportDescriptor,
    pub protocol_version: String,
    pub status: ConnectorStatus,
    #[serde(serialize_with = "rfc3339_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "rfc3339_millis")]
    pub updated_at: DateTime<Utc>,
    pub discovered_tool_count: usize,
    pub tools: Vec<ToolDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ConnectorEntry {
    pub fn tool_server_config(&self) -> ToolServerConfig {
        ToolServerConfig {
            server_id: self.id.clone(),
            transport: self.transport.clone(),
            protocol_version: self.protocol_version.clone(),
        }
    }

    /// Move to `status`, bumping `updated_at`.
    pub(crate) fn transition(&mut self, status: ConnectorStatus) {
        self.status = status;
        self.updated_at = now_millis();
    }
}

/// A built-in starting point for a new connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub transport: TransportDescriptor,
    pub required_fields: Vec<String>,
}

/// Outcome of one pre-flight check on a connector spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationCheck {
    pub name: String,
    pub ok: bool,
    pub message: String,
}

/// Current UTC time truncated to milliseconds, the precision timestamps are
/// rendered with.
pub(crate) fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Render a timestamp as RFC 3339 UTC with millisecond precision.
pub(crate) fn rfc3339_millis<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp_client::DEFAULT_PROTOCOL_VERSION;
    use chrono::TimeZone;

    fn entry() -> ConnectorEntry {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        ConnectorEntry {
            id: "fs".into(),
            name: Some("Filesystem".into()),
            transport: TransportDescriptor::stdio("npx", vec!["-y".into()]),
            protocol_version: DEFAULT_PROTOCOL_VERSION.into(),
            status: ConnectorStatus::Disconnected,
            created_at: at,
            updated_at: at,
            discovered_tool_count: 0,
            tools: vec![],
            last_error: None,
        }
    }

    #[test]
    fn test_entry_serialization() {
        let json = serde_json::to_value(entry()).unwrap();
        assert_eq!(json["transport"], "stdio");
        assert_eq!(json["command"], "npx");
        assert_eq!(json["status"], "disconnected");
        assert_eq!(json["created_at"], "2026-03-01T12:00:00.000Z");
        assert!(json.get("last_error").is_none());
    }

    #[test]
    fn test_tool_server_config_from_entry() {
        let config = entry().tool_server_config();
        assert_eq!(config.server_id, "fs");
        assert_eq!(config.protocol_version, DEFAULT_PROTOCOL_VERSION);
    }

    #[test]
    fn test_transition_bumps_updated_at() {
        let mut e = entry();
        let before = e.updated_at;
        e.transition(ConnectorStatus::Degraded);
        assert_eq!(e.status, ConnectorStatus::Degraded);
        assert!(e.updated_at > before);
    }

    #[test]
    fn test_spec_deserializes_from_yaml() {
        let yaml = r#"
            id: remote
            transport: http_stream
            endpoint: http://localhost:8931/mcp
        "#;
        let spec: ConnectorSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.transport, TransportDescriptor::http_stream("http://localhost:8931/mcp"));
        assert!(spec.protocol_version.is_none());
    }

    #[test]
    fn test_now_millis_has_no_sub_millisecond_part() {
        let now = now_millis();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
