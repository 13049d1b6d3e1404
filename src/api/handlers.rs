//! Control API handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::coordinator::{CoordinatorHandle, InterfaceStatus, Phase};
use crate::error::FailoverError;
use crate::route::RoutingEntry;

#[derive(Debug, Serialize, Deserialize)]
pub struct DefaultGwResponse {
    /// Empty while no gateway is applied.
    pub default_gw_interface: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IfStatusResponse {
    pub interfaces: Vec<InterfaceStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ForceGatewayRequest {
    pub if_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ForceGatewayResponse {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub phase: Phase,
    pub default_gw_interface: String,
}

/// Coordinator failures that are not answers to the question asked.
pub struct ApiError(FailoverError);

impl From<FailoverError> for ApiError {
    fn from(e: FailoverError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            FailoverError::CoordinatorStopped => StatusCode::SERVICE_UNAVAILABLE,
            FailoverError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

pub async fn get_default_gw(
    State(handle): State<CoordinatorHandle>,
) -> Result<Json<DefaultGwResponse>, ApiError> {
    let gateway = handle.default_gateway().await?;
    Ok(Json(DefaultGwResponse {
        default_gw_interface: gateway.unwrap_or_default(),
    }))
}

pub async fn get_if_status(
    State(handle): State<CoordinatorHandle>,
) -> Result<Json<IfStatusResponse>, ApiError> {
    let interfaces = handle.interface_status().await?;
    Ok(Json(IfStatusResponse { interfaces }))
}

pub async fn force_gateway(
    State(handle): State<CoordinatorHandle>,
    Json(request): Json<ForceGatewayRequest>,
) -> Result<Json<ForceGatewayResponse>, ApiError> {
    match handle.force_gateway(&request.if_name).await {
        Ok(()) => Ok(Json(ForceGatewayResponse {
            accepted: true,
            error: None,
        })),
        Err(e @ (FailoverError::Timeout(_) | FailoverError::CoordinatorStopped)) => Err(e.into()),
        Err(e) => Ok(Json(ForceGatewayResponse {
            accepted: false,
            error: Some(e.to_string()),
        })),
    }
}

pub async fn get_status(
    State(handle): State<CoordinatorHandle>,
) -> Result<Json<SystemStatus>, ApiError> {
    let phase = handle.phase().await?;
    let gateway = handle.default_gateway().await?;
    Ok(Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        phase,
        default_gw_interface: gateway.unwrap_or_default(),
    }))
}

pub async fn get_routes(
    State(handle): State<CoordinatorHandle>,
) -> Result<Json<Vec<RoutingEntry>>, ApiError> {
    Ok(Json(handle.routes().await?))
}
