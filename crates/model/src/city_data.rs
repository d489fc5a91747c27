use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utility::id::{HasId, Id};

use crate::{building::Building, district::District, location::Location, WithId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CityMap {
    pub width: f64,
    pub height: f64,
}

/// Detail record of a location, built from an imported city generator export.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityData {
    pub location_id: Id<Location>,
    /// The export exactly as it was imported.
    pub raw_data: Value,
    #[serde(default)]
    pub buildings: Vec<WithId<Building>>,
    #[serde(default)]
    pub districts: Vec<WithId<District>>,
    pub city_map: Option<CityMap>,
    pub imported_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl CityData {
    pub fn new(location_id: Id<Location>, raw_data: Value, now: DateTime<Utc>) -> Self {
        Self {
            location_id,
            raw_data,
            buildings: vec![],
            districts: vec![],
            city_map: None,
            imported_at: now,
            last_modified: now,
        }
    }

    pub fn building(&self, id: &Id<Building>) -> Option<&WithId<Building>> {
        self.buildings.iter().find(|building| &building.id == id)
    }

    pub fn building_by_watabou_id(&self, watabou_id: &str) -> Option<&WithId<Building>> {
        self.buildings
            .iter()
            .find(|building| building.content.watabou_id == watabou_id)
    }

    pub fn points_of_interest(&self) -> impl Iterator<Item = &WithId<Building>> {
        self.buildings.iter().filter(|building| building.content.is_poi())
    }
}

impl HasId for CityData {
    type IdType = String;
}
