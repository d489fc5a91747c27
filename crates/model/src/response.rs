use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{building::Building, city_data::CityData, district::District, WithId};

/// Body of every write endpoint. `error` is set exactly when `success` is
/// false; at most one of the records is set.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WriteResponse {
    pub success: bool,
    pub error: Option<String>,
    pub city_data: Option<WithId<CityData>>,
    pub building: Option<WithId<Building>>,
    pub district: Option<WithId<District>>,
}

impl WriteResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn city_data(city_data: WithId<CityData>) -> Self {
        Self {
            city_data: Some(city_data),
            ..Self::ok()
        }
    }

    pub fn building(building: WithId<Building>) -> Self {
        Self {
            building: Some(building),
            ..Self::ok()
        }
    }

    pub fn district(district: WithId<District>) -> Self {
        Self {
            district: Some(district),
            ..Self::ok()
        }
    }
}
