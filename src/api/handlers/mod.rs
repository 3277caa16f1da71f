pub mod inverters;
pub mod plants;
pub mod reports;

use serde_json::Value;
use utoipa::OpenApi;

use super::{dto, errors::AppError};

// ---------------------------------------------------------------------------
// Shared request parsing
// ---------------------------------------------------------------------------

/// Parse an integer path identifier. Blank → `missing`, non-integer →
/// `"<name> deve ser um número inteiro"`.
pub(crate) fn parse_path_id(raw: &str, name: &str, missing: &str) -> Result<i64, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::bad_request(missing));
    }
    raw.parse()
        .map_err(|_| AppError::bad_request(format!("{name} deve ser um número inteiro")))
}

/// Required text field of a create request; blank counts as missing.
pub(crate) fn required_text(value: Option<String>, missing: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(missing))
}

/// Optional text field of an update request.
///
/// Absent → `Ok(None)`; a non-empty string → `Ok(Some(..))`; `null`, blank or
/// a non-string value → validation error naming `field`.
pub(crate) fn optional_text(value: Option<Value>, field: &str) -> Result<Option<String>, AppError> {
    match value {
        None => Ok(None),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.trim().to_owned())),
        Some(Value::String(_)) | Some(Value::Null) => Err(AppError::bad_request(format!(
            "Falha na validação: o campo {field} é obrigatório"
        ))),
        Some(_) => Err(AppError::bad_request(format!(
            "Falha na validação: o campo {field} deve ser texto"
        ))),
    }
}

/// `true` when the body tries to set an immutable identifier.
pub(crate) fn sets_identifier(value: &Option<Value>) -> bool {
    value.as_ref().is_some_and(|v| !v.is_null())
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        plants::create_plant,
        plants::list_plants,
        plants::get_plant,
        plants::update_plant,
        plants::delete_plant,
        inverters::create_inverter,
        inverters::list_inverters,
        inverters::get_inverter,
        inverters::update_inverter,
        inverters::delete_inverter,
        reports::inverter_generation,
        reports::inverter_summary,
        reports::average_temperature_per_day,
        reports::maximum_power_per_day,
        reports::plant_generation,
        health,
    ),
    components(schemas(
        dto::PlantDto,
        dto::CreatePlantRequest,
        dto::UpdatePlantRequest,
        dto::InverterDto,
        dto::CreateInverterRequest,
        dto::UpdateInverterRequest,
        dto::MessageResponse,
        dto::InverterDeletedResponse,
        dto::InverterGenerationResponse,
        dto::InverterSummaryResponse,
        dto::DailyTemperatureDto,
        dto::AverageTemperatureResponse,
        dto::DailyMaxPowerDto,
        dto::MaximumPowerDayResponse,
        dto::InverterTotalDto,
        dto::PlantGenerationResponse,
    )),
    tags(
        (name = "plants", description = "Plant CRUD"),
        (name = "inverters", description = "Inverter CRUD"),
        (name = "reports", description = "Generation and temperature reports"),
        (name = "system", description = "System endpoints"),
    ),
    info(
        title = "Solar Telemetry API",
        version = "0.1.0",
        description = "Plants, inverters and generation reports over inverter telemetry"
    )
)]
pub struct ApiDoc;
