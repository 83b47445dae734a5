//! Liveness probe.

use chrono::{SecondsFormat, Utc};

use super::types::{Api, ApiResponse, HealthBody};

pub const SERVICE_NAME: &str = "petting-zoo-server";

impl Api {
    pub fn health(&self, correlation_id: Option<&str>) -> ApiResponse<HealthBody> {
        ApiResponse::ok(
            correlation_id,
            HealthBody {
                status: "ok",
                service: SERVICE_NAME,
                version: env!("CARGO_PKG_VERSION"),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        )
    }
}
