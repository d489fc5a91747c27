use axum::{
    response::IntoResponse,
    routing::{get, on},
    Json, Router,
};
use serde_json::json;
use world::database::Database;

mod city_data;
mod locations;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

pub fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route("/", get(greeting))
        .route("/ping", get(ping))
        .nest_service("/locations", locations::routes(state.clone()))
        .nest_service("/city-data", city_data::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn greeting() -> &'static str {
    "Hello from the World Map Dashboard API!"
}

async fn ping() -> impl IntoResponse {
    Json(json!({
        "message": "pong!"
    }))
}
