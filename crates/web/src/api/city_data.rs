use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, State},
    http::Method,
    routing::{delete, get, on, patch, post},
    Json, Router,
};
use model::{
    building::BuildingUpdate, city_data::CityData, district::DistrictUpdate,
    response::WriteResponse, WithId,
};
use serde_json::Value;
use utility::{id::Id, let_also::LetAlso};
use world::database::Database;

use crate::{
    common::{route_not_found, RouteErrorResponse, RouteResult, WriteResult, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes<D: Database>(state: WebState<D>) -> Router {
    Router::new()
        .route(
            "/:location_id",
            get(get_city_data::<D>).post(import_city_data::<D>),
        )
        .route("/:location_id/derive", post(derive_city_data::<D>))
        .route(
            "/:location_id/building/:building_id",
            patch(update_building::<D>),
        )
        .route(
            "/:location_id/building/:building_id/poi",
            delete(clear_poi::<D>),
        )
        .route(
            "/:location_id/district/:district_id",
            patch(update_district::<D>),
        )
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// `null` when the location has no city data yet.
async fn get_city_data<D: Database>(
    OriginalUri(original_uri): OriginalUri,
    Path(location_id): Path<String>,
    State(WebState { client }): State<WebState<D>>,
) -> RouteResult<Json<Option<WithId<CityData>>>> {
    client
        .get_city_data(&Id::new(location_id))
        .await
        .map(Json)
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

async fn import_city_data<D: Database>(
    Path(location_id): Path<String>,
    State(WebState { client }): State<WebState<D>>,
    body: Result<Json<Value>, JsonRejection>,
) -> WriteResult {
    let Json(raw_data) = body?;
    client
        .import_city_data(&Id::new(location_id), raw_data)
        .await?
        .let_owned(|city_data| Ok(Json(WriteResponse::city_data(city_data))))
}

async fn derive_city_data<D: Database>(
    Path(location_id): Path<String>,
    State(WebState { client }): State<WebState<D>>,
) -> WriteResult {
    client
        .derive_city_data(&Id::new(location_id))
        .await?
        .let_owned(|city_data| Ok(Json(WriteResponse::city_data(city_data))))
}

async fn update_building<D: Database>(
    Path((location_id, building_id)): Path<(String, String)>,
    State(WebState { client }): State<WebState<D>>,
    body: Result<Json<BuildingUpdate>, JsonRejection>,
) -> WriteResult {
    let Json(update) = body?;
    client
        .update_building(&Id::new(location_id), &Id::new(building_id), &update)
        .await?
        .let_owned(|building| Ok(Json(WriteResponse::building(building))))
}

async fn clear_poi<D: Database>(
    Path((location_id, building_id)): Path<(String, String)>,
    State(WebState { client }): State<WebState<D>>,
) -> WriteResult {
    client
        .clear_poi(&Id::new(location_id), &Id::new(building_id))
        .await?;
    Ok(Json(WriteResponse::ok()))
}

async fn update_district<D: Database>(
    Path((location_id, district_id)): Path<(String, String)>,
    State(WebState { client }): State<WebState<D>>,
    body: Result<Json<DistrictUpdate>, JsonRejection>,
) -> WriteResult {
    let Json(update) = body?;
    client
        .update_district(&Id::new(location_id), &Id::new(district_id), &update)
        .await?
        .let_owned(|district| Ok(Json(WriteResponse::district(district))))
}
