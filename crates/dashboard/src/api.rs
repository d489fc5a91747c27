//! HTTP client for the dashboard backend.

use std::{error, fmt, sync::Arc};

use model::{
    building::{Building, BuildingUpdate},
    city_data::CityData,
    district::{District, DistrictUpdate},
    location::Location,
    response::WriteResponse,
    WithId,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use utility::id::Id;

#[derive(Debug, Clone)]
pub enum ApiError {
    RequestError(Arc<reqwest::Error>),
    JsonError(Arc<serde_json::Error>),
    InvalidResponse {
        status_code: StatusCode,
        url: String,
        response: Option<String>,
    },
    /// The backend answered a write with `success: false`.
    Rejected {
        status_code: StatusCode,
        message: String,
    },
    /// A successful write without the record it should have returned.
    MissingRecord(&'static str),
}

impl error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            ApiError::JsonError(e) => write!(f, "JSON parse error: {}", e),
            ApiError::InvalidResponse {
                status_code,
                url,
                response,
            } => match response {
                Some(text) => {
                    write!(f, "Invalid Response ({}) {}: {}", status_code, text, url)
                }
                None => write!(f, "Invalid Response({}) {}", status_code, url),
            },
            ApiError::Rejected { message, .. } => f.write_str(message),
            ApiError::MissingRecord(record) => {
                write!(f, "Response did not contain the {}", record)
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::RequestError(Arc::new(e))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::JsonError(Arc::new(e))
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> (String, RequestBuilder) {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("{} {}", method, url);
        let request = self.http.request(method, &url);
        (url, request)
    }

    async fn read<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let (url, request) = self.request(Method::GET, path);
        let response = request.send().await?;
        match response.status() {
            StatusCode::OK => Ok(serde_json::from_str(&response.text().await?)?),
            other => Err(ApiError::InvalidResponse {
                status_code: other,
                url,
                response: response.text().await.ok(),
            }),
        }
    }

    /// Sends a write request and unwraps the `{success, error}` envelope.
    async fn write<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<WriteResponse, ApiError> {
        let (url, mut request) = self.request(method, path);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status_code = response.status();
        let text = response.text().await?;
        let Ok(envelope) = serde_json::from_str::<WriteResponse>(&text) else {
            return Err(ApiError::InvalidResponse {
                status_code,
                url,
                response: Some(text),
            });
        };
        if envelope.success {
            Ok(envelope)
        } else {
            Err(ApiError::Rejected {
                status_code,
                message: envelope.error.unwrap_or_else(|| status_code.to_string()),
            })
        }
    }

    pub async fn get_locations(&self) -> Result<Vec<WithId<Location>>, ApiError> {
        self.read("/locations").await
    }

    /// `None` while the location has no imported city.
    pub async fn get_city_data(
        &self,
        location_id: &Id<Location>,
    ) -> Result<Option<WithId<CityData>>, ApiError> {
        self.read(&format!("/city-data/{}", location_id)).await
    }

    pub async fn save_city_data(
        &self,
        location_id: &Id<Location>,
        raw_data: &Value,
    ) -> Result<WithId<CityData>, ApiError> {
        self.write(
            Method::POST,
            &format!("/city-data/{}", location_id),
            Some(raw_data),
        )
        .await?
        .city_data
        .ok_or(ApiError::MissingRecord("city data"))
    }

    pub async fn derive_city_data(
        &self,
        location_id: &Id<Location>,
    ) -> Result<WithId<CityData>, ApiError> {
        self.write::<Value>(
            Method::POST,
            &format!("/city-data/{}/derive", location_id),
            None,
        )
        .await?
        .city_data
        .ok_or(ApiError::MissingRecord("city data"))
    }

    pub async fn update_building(
        &self,
        location_id: &Id<Location>,
        building_id: &Id<Building>,
        update: &BuildingUpdate,
    ) -> Result<WithId<Building>, ApiError> {
        self.write(
            Method::PATCH,
            &format!("/city-data/{}/building/{}", location_id, building_id),
            Some(update),
        )
        .await?
        .building
        .ok_or(ApiError::MissingRecord("building"))
    }

    pub async fn clear_poi(
        &self,
        location_id: &Id<Location>,
        building_id: &Id<Building>,
    ) -> Result<(), ApiError> {
        self.write::<Value>(
            Method::DELETE,
            &format!("/city-data/{}/building/{}/poi", location_id, building_id),
            None,
        )
        .await?;
        Ok(())
    }

    pub async fn update_district(
        &self,
        location_id: &Id<Location>,
        district_id: &Id<District>,
        update: &DistrictUpdate,
    ) -> Result<WithId<District>, ApiError> {
        self.write(
            Method::PATCH,
            &format!("/city-data/{}/district/{}", location_id, district_id),
            Some(update),
        )
        .await?
        .district
        .ok_or(ApiError::MissingRecord("district"))
    }
}
