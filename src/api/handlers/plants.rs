use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::{optional_text, parse_path_id, required_text, sets_identifier};
use crate::{
    api::{
        dto::{CreatePlantRequest, MessageResponse, PlantDto, UpdatePlantRequest},
        errors::AppError,
        AppState,
    },
    db::{models::Plant, StoreError},
};

const ID_REQUIRED: &str = "ID da usina é obrigatório";
const NOT_FOUND: &str = "Usina não encontrada";

/// Create a plant.
#[utoipa::path(
    post,
    path = "/plants",
    request_body = CreatePlantRequest,
    responses(
        (status = 201, description = "Plant created", body = PlantDto),
        (status = 400, description = "Missing or malformed field"),
        (status = 409, description = "Plant id already exists"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "plants"
)]
pub async fn create_plant(
    State(state): State<AppState>,
    payload: Result<Json<CreatePlantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PlantDto>), AppError> {
    let Json(req) = payload?;
    let id = req
        .id
        .ok_or_else(|| AppError::bad_request("O campo id é obrigatório"))?;
    let name = required_text(req.name, "O campo name é obrigatório")?;

    let plant = state
        .store
        .create_plant(&Plant { id, name })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::Conflict("Id de usina já existente!".into()),
            other => AppError::internal("Erro desconhecido ao criar usina")(other),
        })?;

    info!(plant_id = plant.id, "Plant created");
    Ok((StatusCode::CREATED, Json(plant.into())))
}

/// List every plant, ordered by id.
#[utoipa::path(
    get,
    path = "/plants",
    responses(
        (status = 200, description = "All plants", body = Vec<PlantDto>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "plants"
)]
pub async fn list_plants(State(state): State<AppState>) -> Result<Json<Vec<PlantDto>>, AppError> {
    let plants = state
        .store
        .list_plants()
        .await
        .map_err(AppError::internal("Erro desconhecido ao buscar usinas"))?;

    Ok(Json(plants.into_iter().map(Into::into).collect()))
}

/// Fetch one plant.
#[utoipa::path(
    get,
    path = "/plants/{id}",
    params(("id" = i64, Path, description = "Plant id")),
    responses(
        (status = 200, description = "Plant", body = PlantDto),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Plant not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "plants"
)]
pub async fn get_plant(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<PlantDto>, AppError> {
    let id = parse_path_id(&raw_id, "id", ID_REQUIRED)?;

    let plant = state
        .store
        .get_plant(id)
        .await
        .map_err(AppError::internal("Erro desconhecido ao buscar usina"))?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    Ok(Json(plant.into()))
}

/// Rename a plant. The id itself cannot change.
#[utoipa::path(
    put,
    path = "/plants/{id}",
    params(("id" = i64, Path, description = "Plant id")),
    request_body = UpdatePlantRequest,
    responses(
        (status = 200, description = "Updated plant", body = PlantDto),
        (status = 400, description = "Attempt to change the id, or invalid field"),
        (status = 404, description = "Plant not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "plants"
)]
pub async fn update_plant(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdatePlantRequest>, JsonRejection>,
) -> Result<Json<PlantDto>, AppError> {
    let id = parse_path_id(&raw_id, "id", ID_REQUIRED)?;
    let Json(req) = payload?;

    if sets_identifier(&req.id) {
        return Err(AppError::bad_request("Não é permitido alterar o ID da usina"));
    }
    let name = optional_text(req.name, "name")?;

    let plant = state
        .store
        .update_plant(id, name.as_deref())
        .await
        .map_err(AppError::internal("Erro desconhecido ao atualizar usina"))?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    info!(plant_id = plant.id, "Plant updated");
    Ok(Json(plant.into()))
}

/// Delete a plant.
#[utoipa::path(
    delete,
    path = "/plants/{id}",
    params(("id" = i64, Path, description = "Plant id")),
    responses(
        (status = 200, description = "Plant removed", body = MessageResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Plant not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "plants"
)]
pub async fn delete_plant(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_path_id(&raw_id, "id", ID_REQUIRED)?;

    state
        .store
        .delete_plant(id)
        .await
        .map_err(AppError::internal("Erro desconhecido ao remover usina"))?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    info!(plant_id = id, "Plant deleted");
    Ok(Json(MessageResponse {
        message: "Usina removida com sucesso".into(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
