pub use crate::common::RouteResult;

use std::{env, path::PathBuf};

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use world::{database::Database, Client};

pub mod api;
pub mod common;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_STATIC_DIR: &str = "./resources/www";

#[derive(Debug, Clone)]
pub struct WebState<D: Database> {
    pub client: Client<D>,
}

impl<D: Database> WebState<D> {
    pub fn new(database: D) -> Self {
        Self {
            client: Client::new(database),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    pub bind_address: String,
    /// Served under `/static`, e.g. the world map image.
    pub static_dir: PathBuf,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_owned(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl WebConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        }
    }
}

pub fn router<D: Database>(state: WebState<D>, config: &WebConfig) -> Router {
    api::routes(state)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server<D: Database>(
    state: WebState<D>,
    config: &WebConfig,
) -> std::io::Result<()> {
    let routes = router(state, config);

    let listener = TcpListener::bind(&config.bind_address).await?;
    log::info!("listening on {}", config.bind_address);
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use model::{location::Location, ExampleData};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use world::memory::MemoryDatabase;

    use super::*;

    async fn app() -> (Router, String) {
        let state = WebState::new(MemoryDatabase::default());
        let stored = state
            .client
            .replace_locations(&[Location::example_data()])
            .await
            .unwrap();
        let location_id = stored[0].id.to_string();
        (router(state, &WebConfig::default()), location_id)
    }

    async fn call(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    fn export() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "type": "building", "ward": 1 },
                  "geometry": { "type": "Polygon",
                                "coordinates": [[[0, 0], [4, 0], [4, 4], [0, 4], [0, 0]]] } },
                { "type": "Feature", "properties": { "type": "road" },
                  "geometry": { "type": "LineString", "coordinates": [[0, 10], [40, 10]] } }
            ]
        })
    }

    /// Imports and derives the export, returning the id of its building.
    async fn derived_building(router: &Router, location_id: &str) -> String {
        let uri = format!("/city-data/{}", location_id);
        call(router, Method::POST, &uri, Some(export())).await;
        let (status, body) = call(router, Method::POST, &format!("{}/derive", uri), None).await;
        assert_eq!(status, StatusCode::OK);
        body["cityData"]["buildings"][0]["id"]
            .as_str()
            .unwrap()
            .to_owned()
    }

    #[tokio::test]
    async fn greeting_and_ping() {
        let (router, _) = app().await;
        let (status, body) = call(&router, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_str().unwrap().contains("World Map"));
        let (_, body) = call(&router, Method::GET, "/ping", None).await;
        assert_eq!(body, json!({ "message": "pong!" }));
    }

    #[tokio::test]
    async fn lists_locations() {
        let (router, location_id) = app().await;
        let (status, body) = call(&router, Method::GET, "/locations", None).await;
        assert_eq!(status, StatusCode::OK);
        let locations = body.as_array().unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0]["id"], location_id.as_str());
        assert_eq!(locations[0]["type"], "Capital");
        assert_eq!(locations[0]["azgaarId"], Location::example_data().azgaar_id);

        let (status, schema) = call(&router, Method::GET, "/locations/schema", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(schema["properties"].get("azgaarId").is_some());
    }

    #[tokio::test]
    async fn missing_city_data_is_null() {
        let (router, location_id) = app().await;
        let uri = format!("/city-data/{}", location_id);
        let (status, body) = call(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn import_then_fetch() {
        let (router, location_id) = app().await;
        let uri = format!("/city-data/{}", location_id);
        let raw = json!({ "features": [], "anything": { "goes": [1, 2, 3] } });
        let (status, body) = call(&router, Method::POST, &uri, Some(raw.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["cityData"]["locationId"], location_id.as_str());

        let (_, body) = call(&router, Method::GET, &uri, None).await;
        assert_eq!(body["rawData"], raw);
        assert_eq!(body["buildings"], json!([]));
    }

    #[tokio::test]
    async fn import_for_unknown_location_fails() {
        let (router, _) = app().await;
        let (status, body) =
            call(&router, Method::POST, "/city-data/nowhere", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "error": "Location not found" }));
    }

    #[tokio::test]
    async fn import_rejects_malformed_body() {
        let (router, location_id) = app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/city-data/{}", location_id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{ not json"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn building_update_failures_are_distinct() {
        let (router, location_id) = app().await;
        let (status, body) = call(
            &router,
            Method::PATCH,
            "/city-data/nowhere/building/1",
            Some(json!({ "name": "Mill" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "error": "City data not found" }));

        derived_building(&router, &location_id).await;
        let (status, body) = call(
            &router,
            Method::PATCH,
            &format!("/city-data/{}/building/nothing", location_id),
            Some(json!({ "name": "Mill" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "success": false, "error": "Building not found" }));
    }

    #[tokio::test]
    async fn building_update_validates_body() {
        let (router, location_id) = app().await;
        let building_id = derived_building(&router, &location_id).await;
        let uri = format!("/city-data/{}/building/{}", location_id, building_id);

        let (status, body) =
            call(&router, Method::PATCH, &uri, Some(json!({ "watabouId": "9" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = call(&router, Method::PATCH, &uri, Some(json!({ "isPOI": true }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "poiType is required when isPOI is true");
    }

    #[tokio::test]
    async fn promote_then_clear_poi() {
        let (router, location_id) = app().await;
        let building_id = derived_building(&router, &location_id).await;
        let uri = format!("/city-data/{}/building/{}", location_id, building_id);

        let (status, body) = call(
            &router,
            Method::PATCH,
            &uri,
            Some(json!({
                "isPOI": true,
                "poiType": "tavern",
                "name": "The Leaky Kettle",
                "description": "Loud.",
                "customData": { "rooms": 4 }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["building"]["isPOI"], true);
        assert_eq!(body["building"]["name"], "The Leaky Kettle");

        let (status, body) = call(&router, Method::DELETE, &format!("{}/poi", uri), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (_, city_data) = call(
            &router,
            Method::GET,
            &format!("/city-data/{}", location_id),
            None,
        )
        .await;
        let building = &city_data["buildings"][0];
        assert_eq!(building["isPOI"], false);
        assert!(building.get("name").is_none());
        assert!(building.get("description").is_none());
        assert!(building.get("poiType").is_none());
        assert_eq!(building["watabouId"], "0");
        assert_eq!(building["type"], "building");
        assert_eq!(building["coordinates"], json!({ "x": 2.0, "y": 2.0 }));
        assert_eq!(building["customData"], json!({ "rooms": 4 }));
    }

    #[tokio::test]
    async fn null_clears_building_field() {
        let (router, location_id) = app().await;
        let building_id = derived_building(&router, &location_id).await;
        let uri = format!("/city-data/{}/building/{}", location_id, building_id);

        let (status, body) = call(
            &router,
            Method::PATCH,
            &uri,
            Some(json!({ "owner": "Marta Quill", "notes": "Pays late" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["building"]["owner"], "Marta Quill");

        let (status, body) = call(&router, Method::PATCH, &uri, Some(json!({ "owner": null }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["building"].get("owner").is_none());
        assert_eq!(body["building"]["notes"], "Pays late");

        let (_, city_data) = call(
            &router,
            Method::GET,
            &format!("/city-data/{}", location_id),
            None,
        )
        .await;
        assert!(city_data["buildings"][0].get("owner").is_none());
        assert_eq!(city_data["buildings"][0]["notes"], "Pays late");
    }

    #[tokio::test]
    async fn renames_district() {
        let (router, location_id) = app().await;
        derived_building(&router, &location_id).await;
        let (_, city_data) = call(
            &router,
            Method::GET,
            &format!("/city-data/{}", location_id),
            None,
        )
        .await;
        let district_id = city_data["districts"][0]["id"].as_str().unwrap();
        let (status, body) = call(
            &router,
            Method::PATCH,
            &format!("/city-data/{}/district/{}", location_id, district_id),
            Some(json!({ "name": "Tanners' Row" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["district"]["name"], "Tanners' Row");
        assert_eq!(body["district"]["buildings"], json!(["0"]));
    }

    #[tokio::test]
    async fn derive_without_city_data_fails() {
        let (router, location_id) = app().await;
        let (status, body) = call(
            &router,
            Method::POST,
            &format!("/city-data/{}/derive", location_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "City data not found");
    }

    #[tokio::test]
    async fn unknown_routes_are_json() {
        let (router, _) = app().await;
        let (status, body) = call(&router, Method::GET, "/nothing/here", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["requestedUri"], "/nothing/here");
        assert_eq!(body["httpMethod"], "GET");
    }
}
