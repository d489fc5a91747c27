use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utility::id::HasId;

use crate::{ExampleData, InvalidUpdate, Point, UnknownVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PoiType {
    Tavern,
    Guild,
    Temple,
    Shop,
    Blacksmith,
    Library,
    Marketplace,
    Barracks,
    NobleHouse,
    CityHall,
    Custom,
}

impl PoiType {
    pub const ALL: [PoiType; 11] = [
        Self::Tavern,
        Self::Guild,
        Self::Temple,
        Self::Shop,
        Self::Blacksmith,
        Self::Library,
        Self::Marketplace,
        Self::Barracks,
        Self::NobleHouse,
        Self::CityHall,
        Self::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tavern => "tavern",
            Self::Guild => "guild",
            Self::Temple => "temple",
            Self::Shop => "shop",
            Self::Blacksmith => "blacksmith",
            Self::Library => "library",
            Self::Marketplace => "marketplace",
            Self::Barracks => "barracks",
            Self::NobleHouse => "noble_house",
            Self::CityHall => "city_hall",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for PoiType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|poi_type| poi_type.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("point of interest type", s))
    }
}

/// Gameplay overlay of a building. Everything in here can be reset without
/// touching the generator data of the building.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterest {
    #[serde(rename = "isPOI", default)]
    pub is_poi: bool,
    pub poi_type: Option<PoiType>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub notes: Option<String>,
}

impl PointOfInterest {
    /// A flagged point of interest needs a category.
    pub fn check(&self) -> Result<(), InvalidUpdate> {
        if self.is_poi && self.poi_type.is_none() {
            return Err(InvalidUpdate(
                "poiType is required when isPOI is true".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    /// Id of the shape in the generator export this building was derived from.
    pub watabou_id: String,
    pub coordinates: Point,
    #[serde(rename = "type")]
    pub building_type: String,
    #[serde(flatten)]
    pub poi: PointOfInterest,
    pub custom_data: Option<Value>,
}

impl Building {
    pub fn new<S, T>(watabou_id: S, coordinates: Point, building_type: T) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            watabou_id: watabou_id.into(),
            coordinates,
            building_type: building_type.into(),
            poi: PointOfInterest::default(),
            custom_data: None,
        }
    }

    pub fn is_poi(&self) -> bool {
        self.poi.is_poi
    }

    pub fn clear_poi(&mut self) {
        self.poi = PointOfInterest::default();
    }
}

impl HasId for Building {
    type IdType = String;
}

impl ExampleData for Building {
    fn example_data() -> Self {
        Self {
            watabou_id: "7.42".to_owned(),
            coordinates: Point::new(-12.5, 40.25),
            building_type: "building".to_owned(),
            poi: PointOfInterest {
                is_poi: true,
                poi_type: Some(PoiType::Tavern),
                name: Some("The Drowned Lantern".to_owned()),
                description: Some("Smoky riverside inn.".to_owned()),
                owner: Some("Marta Quill".to_owned()),
                notes: None,
            },
            custom_data: None,
        }
    }
}

/// The fields of a building a client may change. Absent fields stay as they
/// are, `null` clears a field, unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuildingUpdate {
    #[serde(rename = "isPOI", default, skip_serializing_if = "Option::is_none")]
    pub is_poi: Option<bool>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<PoiType>")]
    pub poi_type: Option<Option<PoiType>>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub name: Option<Option<String>>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub owner: Option<Option<String>>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub notes: Option<Option<String>>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<Value>")]
    pub custom_data: Option<Option<Value>>,
}

impl BuildingUpdate {
    /// Update marking a building as a point of interest of the given type.
    pub fn promote(poi_type: PoiType) -> Self {
        Self {
            is_poi: Some(true),
            poi_type: Some(Some(poi_type)),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the update to a copy of `building` and checks the result.
    pub fn apply(&self, building: &Building) -> Result<Building, InvalidUpdate> {
        let mut updated = building.clone();
        let poi = &mut updated.poi;
        if let Some(is_poi) = self.is_poi {
            poi.is_poi = is_poi;
        }
        overwrite(&mut poi.poi_type, &self.poi_type);
        overwrite(&mut poi.name, &self.name);
        overwrite(&mut poi.description, &self.description);
        overwrite(&mut poi.owner, &self.owner);
        overwrite(&mut poi.notes, &self.notes);
        overwrite(&mut updated.custom_data, &self.custom_data);
        updated.poi.check()?;
        Ok(updated)
    }
}

fn overwrite<T: Clone>(target: &mut Option<T>, value: &Option<Option<T>>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn plain() -> Building {
        Building::new("3", Point::new(1.0, 2.0), "building")
    }

    #[test]
    fn serializes_overlay_flat() {
        let json = serde_json::to_value(Building::example_data()).unwrap();
        assert_eq!(json["isPOI"], true);
        assert_eq!(json["poiType"], "tavern");
        assert_eq!(json["watabouId"], "7.42");
        assert_eq!(json["type"], "building");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn update_rejects_unknown_fields() {
        let result = serde_json::from_value::<BuildingUpdate>(json!({
            "name": "Old Mill",
            "watabouId": "99"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn update_merges_supplied_fields_only() {
        let mut building = plain();
        building.poi.notes = Some("keep me".to_owned());
        let update: BuildingUpdate =
            serde_json::from_value(json!({ "isPOI": true, "poiType": "guild", "name": "Weavers" }))
                .unwrap();
        let updated = update.apply(&building).unwrap();
        assert!(updated.is_poi());
        assert_eq!(updated.poi.poi_type, Some(PoiType::Guild));
        assert_eq!(updated.poi.name.as_deref(), Some("Weavers"));
        assert_eq!(updated.poi.notes.as_deref(), Some("keep me"));
        assert_eq!(updated.watabou_id, "3");
    }

    #[test]
    fn null_clears_a_field() {
        let building = Building::example_data();
        let update: BuildingUpdate =
            serde_json::from_value(json!({ "owner": null, "notes": "Watch the cellar" })).unwrap();
        assert_eq!(update.owner, Some(None));
        assert_eq!(update.name, None);
        let updated = update.apply(&building).unwrap();
        assert_eq!(updated.poi.owner, None);
        assert_eq!(updated.poi.notes.as_deref(), Some("Watch the cellar"));
        assert_eq!(updated.poi.name.as_deref(), Some("The Drowned Lantern"));

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, json!({ "owner": null, "notes": "Watch the cellar" }));
    }

    #[test]
    fn clearing_poi_type_of_a_poi_is_invalid() {
        let update: BuildingUpdate = serde_json::from_value(json!({ "poiType": null })).unwrap();
        assert!(update.apply(&Building::example_data()).is_err());
        let demoted: BuildingUpdate =
            serde_json::from_value(json!({ "isPOI": false, "poiType": null })).unwrap();
        assert_eq!(demoted.apply(&Building::example_data()).unwrap().poi.poi_type, None);
    }

    #[test]
    fn poi_without_type_is_invalid() {
        let update = BuildingUpdate {
            is_poi: Some(true),
            ..Default::default()
        };
        assert!(update.apply(&plain()).is_err());

        let mut typed = plain();
        typed.poi.poi_type = Some(PoiType::Shop);
        assert!(update.apply(&typed).unwrap().is_poi());
    }

    #[test]
    fn clearing_keeps_origin_fields() {
        let mut building = Building::example_data();
        building.custom_data = Some(json!({ "floors": 3 }));
        building.clear_poi();
        assert!(!building.is_poi());
        assert!(building.poi.is_blank());
        assert_eq!(building.watabou_id, "7.42");
        assert_eq!(building.coordinates, Point::new(-12.5, 40.25));
        assert_eq!(building.custom_data, Some(json!({ "floors": 3 })));
    }

    #[test]
    fn poi_type_parses_snake_case() {
        assert_eq!("noble_house".parse::<PoiType>(), Ok(PoiType::NobleHouse));
        assert!("dungeon".parse::<PoiType>().is_err());
    }
}
