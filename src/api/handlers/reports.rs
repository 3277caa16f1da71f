use axum::{
    extract::{Path, State},
    Json,
};

use super::parse_path_id;
use crate::{
    api::{
        dto::{
            AverageTemperatureResponse, DailyTemperatureDto, InverterGenerationResponse,
            InverterSummaryResponse, MaximumPowerDayResponse, PlantGenerationResponse,
        },
        errors::AppError,
        AppState,
    },
    reports::DateRange,
};

const PARAMS_REQUIRED: &str =
    r#"Os parâmetros "inversor_id", "data_inicio" e "data_fim" são obrigatórios."#;
const INVALID_PLANT: &str = "ID Usina inválido";

const READINGS_FAILED: &str = "Erro ao buscar leituras do inversor.";
const TEMPERATURE_FAILED: &str = "Erro ao buscar temperatura média diária do inversor.";
const MAX_POWER_FAILED: &str = "Erro ao buscar potência máxima diária do inversor.";
const PLANT_FAILED: &str = "Erro ao buscar geração da usina.";

type ReportPath = Path<(String, String, String)>;

fn require_params(id: &str, start: &str, end: &str) -> Result<(), AppError> {
    if [id, start, end].iter().any(|p| p.trim().is_empty()) {
        return Err(AppError::bad_request(PARAMS_REQUIRED));
    }
    Ok(())
}

/// Validate `(inversor_id, data_inicio, data_fim)` before touching the store.
fn inverter_params(id: &str, start: &str, end: &str) -> Result<(i64, DateRange), AppError> {
    require_params(id, start, end)?;
    let inverter_id = parse_path_id(id, "inversor_id", PARAMS_REQUIRED)?;
    let range = DateRange::from_days(start, end)?;
    Ok((inverter_id, range))
}

/// Power totals of one inverter over a date range.
#[utoipa::path(
    get,
    path = "/geracaoInversorRangeDeData/{inversor_id}/{data_inicio}/{data_fim}",
    params(
        ("inversor_id" = i64, Path, description = "Inverter id"),
        ("data_inicio" = String, Path, description = "First day, YYYY-MM-DD (inclusive)"),
        ("data_fim" = String, Path, description = "Last day, YYYY-MM-DD (inclusive)"),
    ),
    responses(
        (status = 200, description = "Generation totals", body = InverterGenerationResponse),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "No readings in range"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "reports"
)]
pub async fn inverter_generation(
    State(state): State<AppState>,
    Path((id, start, end)): ReportPath,
) -> Result<Json<InverterGenerationResponse>, AppError> {
    let (inverter_id, range) = inverter_params(&id, &start, &end)?;

    let totals = state
        .reports
        .range_totals(inverter_id, &range)
        .await
        .map_err(AppError::internal(READINGS_FAILED))?
        .ok_or(AppError::NoReadings)?;

    Ok(Json(InverterGenerationResponse::new(inverter_id, &range, &totals)))
}

/// Power totals plus mean temperature of one inverter over a date range.
#[utoipa::path(
    get,
    path = "/resumoInversor/{inversor_id}/{data_inicio}/{data_fim}",
    params(
        ("inversor_id" = i64, Path, description = "Inverter id"),
        ("data_inicio" = String, Path, description = "First day, YYYY-MM-DD (inclusive)"),
        ("data_fim" = String, Path, description = "Last day, YYYY-MM-DD (inclusive)"),
    ),
    responses(
        (status = 200, description = "Generation totals and mean temperature", body = InverterSummaryResponse),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "No readings in range"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "reports"
)]
pub async fn inverter_summary(
    State(state): State<AppState>,
    Path((id, start, end)): ReportPath,
) -> Result<Json<InverterSummaryResponse>, AppError> {
    let (inverter_id, range) = inverter_params(&id, &start, &end)?;

    let totals = state
        .reports
        .range_totals(inverter_id, &range)
        .await
        .map_err(AppError::internal(READINGS_FAILED))?
        .ok_or(AppError::NoReadings)?;

    Ok(Json(InverterSummaryResponse {
        generation: InverterGenerationResponse::new(inverter_id, &range, &totals),
        media_temperatura: totals.avg_temperature,
    }))
}

/// Mean temperature per day of one inverter, rounded to 2 decimals.
#[utoipa::path(
    get,
    path = "/temperaturaMediaInversor/{inversor_id}/{data_inicio}/{data_fim}",
    params(
        ("inversor_id" = i64, Path, description = "Inverter id"),
        ("data_inicio" = String, Path, description = "First day, YYYY-MM-DD (inclusive)"),
        ("data_fim" = String, Path, description = "Last day, YYYY-MM-DD (inclusive)"),
    ),
    responses(
        (status = 200, description = "Daily mean temperatures", body = AverageTemperatureResponse),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "No readings in range"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "reports"
)]
pub async fn average_temperature_per_day(
    State(state): State<AppState>,
    Path((id, start, end)): ReportPath,
) -> Result<Json<AverageTemperatureResponse>, AppError> {
    let (inverter_id, range) = inverter_params(&id, &start, &end)?;

    let days = state
        .reports
        .daily_average_temperature(inverter_id, &range)
        .await
        .map_err(AppError::internal(TEMPERATURE_FAILED))?;
    if days.is_empty() {
        return Err(AppError::NoReadings);
    }

    Ok(Json(AverageTemperatureResponse {
        inversor_id: inverter_id,
        data_inicio: range.start_iso(),
        data_fim: range.end_iso(),
        temperaturas: days.iter().map(DailyTemperatureDto::from).collect(),
    }))
}

/// Maximum power per day of one inverter, and the sum of those maxima.
#[utoipa::path(
    get,
    path = "/potenciaMaximaDia/{inversor_id}/{data_inicio}/{data_fim}",
    params(
        ("inversor_id" = i64, Path, description = "Inverter id"),
        ("data_inicio" = String, Path, description = "First day, YYYY-MM-DD (inclusive)"),
        ("data_fim" = String, Path, description = "Last day, YYYY-MM-DD (inclusive)"),
    ),
    responses(
        (status = 200, description = "Daily maximum power", body = MaximumPowerDayResponse),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "No readings in range"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "reports"
)]
pub async fn maximum_power_per_day(
    State(state): State<AppState>,
    Path((id, start, end)): ReportPath,
) -> Result<Json<MaximumPowerDayResponse>, AppError> {
    let (inverter_id, range) = inverter_params(&id, &start, &end)?;

    let maxima = state
        .reports
        .daily_max_power(inverter_id, &range)
        .await
        .map_err(AppError::internal(MAX_POWER_FAILED))?
        .ok_or(AppError::NoReadings)?;

    Ok(Json(MaximumPowerDayResponse::new(inverter_id, &range, maxima)))
}

/// Generation of a whole plant: grand total and per-inverter subtotals.
///
/// Unlike the per-inverter reports, an empty range is not a 404: the total is
/// `0` and the per-inverter list is empty.
#[utoipa::path(
    get,
    path = "/geracaoUsina/{usina_id}/{data_inicio}/{data_fim}",
    params(
        ("usina_id" = i64, Path, description = "Plant id"),
        ("data_inicio" = String, Path, description = "First day, YYYY-MM-DD (inclusive)"),
        ("data_fim" = String, Path, description = "Last day, YYYY-MM-DD (inclusive)"),
    ),
    responses(
        (status = 200, description = "Plant generation", body = PlantGenerationResponse),
        (status = 400, description = "Unknown plant or invalid parameters"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "reports"
)]
pub async fn plant_generation(
    State(state): State<AppState>,
    Path((id, start, end)): ReportPath,
) -> Result<Json<PlantGenerationResponse>, AppError> {
    require_params(&id, &start, &end)?;

    let plant_id: i64 = id
        .trim()
        .parse()
        .map_err(|_| AppError::bad_request(INVALID_PLANT))?;
    let inverters = state
        .plants
        .inverters_for(plant_id)
        .ok_or_else(|| AppError::bad_request(INVALID_PLANT))?;

    let range = DateRange::from_days(&start, &end)?;

    let totals = state
        .reports
        .plant_totals(inverters, &range)
        .await
        .map_err(AppError::internal(PLANT_FAILED))?;

    Ok(Json(PlantGenerationResponse::new(plant_id, &range, &totals)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
