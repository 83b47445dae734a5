//! Model catalog and selection calls.

use super::errors::ApiError;
use super::types::{
    ActiveModelBody, Api, ApiResponse, ApiResult, ModelBody, ModelListBody, ModelStatusBody,
    SelectModelRequest,
};
use crate::models::RegisterModel;

impl Api {
    pub fn list_models(&self, correlation_id: Option<&str>) -> ApiResponse<ModelListBody> {
        let rt = self.runtime();
        ApiResponse::ok(
            correlation_id,
            ModelListBody {
                models: rt.models.list(),
                active_model_id: rt.agent.active_model_id(),
            },
        )
    }

    /// Register a model file. Answers 201 with the stored entry.
    pub fn register_model(
        &self,
        correlation_id: Option<&str>,
        request: RegisterModel,
    ) -> ApiResult<ModelBody> {
        self.call("register_model", correlation_id, 201, |rt| {
            rt.models.register(request).map(|model| ModelBody { model })
        })
    }

    pub fn select_model(
        &self,
        correlation_id: Option<&str>,
        request: SelectModelRequest,
    ) -> ApiResult<ActiveModelBody> {
        if request.model_id.trim().is_empty() {
            return Err(ApiError::validation(
                "model_id is required",
                Some(serde_json::json!({ "field": "model_id" })),
                &super::correlation::correlation_id(correlation_id),
            ));
        }
        self.call("select_model", correlation_id, 200, |rt| {
            rt.agent
                .select(request.model_id.trim(), request.context_size)
                .map(|active_model| ActiveModelBody { active_model })
        })
    }

    pub fn unload_model(&self, correlation_id: Option<&str>) -> ApiResponse<ModelStatusBody> {
        let model_id = self.runtime().agent.unload();
        ApiResponse::ok(
            correlation_id,
            ModelStatusBody {
                status: "unloaded",
                model_id,
            },
        )
    }
}
