pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use utoipa::{
    openapi::{OpenApi as OpenApiDoc, Server},
    OpenApi,
};
use utoipa_axum::router::OpenApiRouter;

use crate::{config::PlantRegistry, db::Store, reports::ReportService};
use handlers::{inverters, plants, reports, ApiDoc};

/// Shared by every handler; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub reports: ReportService,
    pub plants: Arc<PlantRegistry>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, plants: PlantRegistry) -> Self {
        Self {
            reports: ReportService::new(store.clone()),
            store,
            plants: Arc::new(plants),
        }
    }
}

/// The OpenAPI document as served under `prefix`: its `servers` entry points
/// at the prefix so generated clients resolve the nested paths.
pub fn api_doc(prefix: &str) -> OpenApiDoc {
    let mut doc = ApiDoc::openapi();
    if !prefix.is_empty() {
        doc.servers = Some(vec![Server::new(prefix)]);
    }
    doc
}

/// Build the application router. Every API route is mounted under `prefix`
/// (`""` mounts them at the root); `/health` and the OpenAPI document are not.
pub fn router(state: AppState, prefix: &str) -> Router {
    let (api_router, api) = OpenApiRouter::with_openapi(api_doc(prefix))
        .route("/plants", get(plants::list_plants).post(plants::create_plant))
        .route(
            "/plants/{id}",
            get(plants::get_plant)
                .put(plants::update_plant)
                .delete(plants::delete_plant),
        )
        .route(
            "/inversor",
            get(inverters::list_inverters).post(inverters::create_inverter),
        )
        .route(
            "/inversor/{inversor_id}",
            get(inverters::get_inverter)
                .put(inverters::update_inverter)
                .delete(inverters::delete_inverter),
        )
        .route(
            "/geracaoInversorRangeDeData/{inversor_id}/{data_inicio}/{data_fim}",
            get(reports::inverter_generation),
        )
        .route(
            "/resumoInversor/{inversor_id}/{data_inicio}/{data_fim}",
            get(reports::inverter_summary),
        )
        .route(
            "/temperaturaMediaInversor/{inversor_id}/{data_inicio}/{data_fim}",
            get(reports::average_temperature_per_day),
        )
        .route(
            "/potenciaMaximaDia/{inversor_id}/{data_inicio}/{data_fim}",
            get(reports::maximum_power_per_day),
        )
        .route(
            "/geracaoUsina/{usina_id}/{data_inicio}/{data_fim}",
            get(reports::plant_generation),
        )
        .with_state(state)
        .split_for_parts();

    let app = if prefix.is_empty() {
        api_router
    } else {
        Router::new().nest(prefix, api_router)
    };

    app.route("/health", get(handlers::health)).route(
        "/api-docs/openapi.json",
        get(move || async move { axum::Json(api) }),
    )
}
