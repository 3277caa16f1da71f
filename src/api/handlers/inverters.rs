use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::{optional_text, parse_path_id, required_text, sets_identifier};
use crate::{
    api::{
        dto::{
            CreateInverterRequest, InverterDeletedResponse, InverterDto, UpdateInverterRequest,
        },
        errors::AppError,
        AppState,
    },
    db::{models::Inverter, StoreError},
};

const ID_REQUIRED: &str = "inversor_id é obrigatório!";
const NOT_FOUND: &str = "Inversor não encontrado!";

/// Register an inverter.
#[utoipa::path(
    post,
    path = "/inversor",
    request_body = CreateInverterRequest,
    responses(
        (status = 201, description = "Inverter created", body = InverterDto),
        (status = 400, description = "Missing or malformed field"),
        (status = 409, description = "inversor_id already exists"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inverters"
)]
pub async fn create_inverter(
    State(state): State<AppState>,
    payload: Result<Json<CreateInverterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InverterDto>), AppError> {
    let Json(req) = payload?;
    let inverter_id = req
        .inversor_id
        .ok_or_else(|| AppError::bad_request("O campo inversor_id é obrigatório!"))?;
    let location = required_text(
        req.inversor_localizacao,
        "O campo inversor_localizacao é obrigatório",
    )?;

    let inverter = state
        .store
        .create_inverter(&Inverter { inverter_id, location })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::Conflict("inversor_id já existente!".into()),
            other => AppError::internal("Erro desconhecido ao criar inversor")(other),
        })?;

    info!(inverter_id = inverter.inverter_id, "Inverter created");
    Ok((StatusCode::CREATED, Json(inverter.into())))
}

/// List every inverter, ordered by id.
#[utoipa::path(
    get,
    path = "/inversor",
    responses(
        (status = 200, description = "All inverters", body = Vec<InverterDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inverters"
)]
pub async fn list_inverters(
    State(state): State<AppState>,
) -> Result<Json<Vec<InverterDto>>, AppError> {
    let inverters = state
        .store
        .list_inverters()
        .await
        .map_err(AppError::internal("Erro desconhecido ao buscar inversores"))?;

    Ok(Json(inverters.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/inversor/{inversor_id}",
    params(("inversor_id" = i64, Path, description = "Inverter id")),
    responses(
        (status = 200, description = "Inverter", body = InverterDto),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Inverter not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inverters"
)]
pub async fn get_inverter(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<InverterDto>, AppError> {
    let inverter_id = parse_path_id(&raw_id, "inversor_id", ID_REQUIRED)?;

    let inverter = state
        .store
        .get_inverter(inverter_id)
        .await
        .map_err(AppError::internal("Erro desconhecido ao buscar inversor"))?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    Ok(Json(inverter.into()))
}

/// Change an inverter's location. The id itself cannot change.
#[utoipa::path(
    put,
    path = "/inversor/{inversor_id}",
    params(("inversor_id" = i64, Path, description = "Inverter id")),
    request_body = UpdateInverterRequest,
    responses(
        (status = 200, description = "Updated inverter", body = InverterDto),
        (status = 400, description = "Attempt to change the id, or invalid field"),
        (status = 404, description = "Inverter not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inverters"
)]
pub async fn update_inverter(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateInverterRequest>, JsonRejection>,
) -> Result<Json<InverterDto>, AppError> {
    let inverter_id = parse_path_id(&raw_id, "inversor_id", ID_REQUIRED)?;
    let Json(req) = payload?;

    if sets_identifier(&req.inversor_id) || sets_identifier(&req.id) {
        return Err(AppError::bad_request("Não é permitido alterar o inversor_id"));
    }
    let location = optional_text(req.inversor_localizacao, "inversor_localizacao")?;

    let inverter = state
        .store
        .update_inverter(inverter_id, location.as_deref())
        .await
        .map_err(AppError::internal("Erro desconhecido ao atualizar inversor"))?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    info!(inverter_id, "Inverter updated");
    Ok(Json(inverter.into()))
}

/// Remove an inverter and return the deleted record.
#[utoipa::path(
    delete,
    path = "/inversor/{inversor_id}",
    params(("inversor_id" = i64, Path, description = "Inverter id")),
    responses(
        (status = 200, description = "Inverter removed", body = InverterDeletedResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Inverter not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "inverters"
)]
pub async fn delete_inverter(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<InverterDeletedResponse>, AppError> {
    let inverter_id = parse_path_id(&raw_id, "inversor_id", ID_REQUIRED)?;

    let deleted = state
        .store
        .delete_inverter(inverter_id)
        .await
        .map_err(AppError::internal("Erro desconhecido ao deletar inversor!"))?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    info!(inverter_id, "Inverter deleted");
    Ok(Json(InverterDeletedResponse {
        message: "Inversor deletado com sucesso!".into(),
        deleted_inversor: deleted.into(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
