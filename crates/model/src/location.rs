use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;

use crate::{ExampleData, Point, UnknownVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum SettlementType {
    Capital,
    Town,
}

impl SettlementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capital => "Capital",
            Self::Town => "Town",
        }
    }
}

impl FromStr for SettlementType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Capital" => Ok(Self::Capital),
            "Town" => Ok(Self::Town),
            other => Err(UnknownVariant::new("settlement type", other)),
        }
    }
}

/// A place on the world map. The generator hints are handed to the city
/// generator when the location is opened.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub azgaar_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub settlement_type: SettlementType,
    pub coordinates: Point,
    pub population: u64,
    pub description: Option<String>,
    /// Settlement subtype of the source map, e.g. `River`, `Naval` or `Highland`.
    pub city_type: Option<String>,
    #[serde(default)]
    pub citadel: bool,
    #[serde(default)]
    pub plaza: bool,
    #[serde(default)]
    pub walls: bool,
    #[serde(default)]
    pub shantytown: bool,
    #[serde(default)]
    pub temple: bool,
    #[serde(default)]
    pub port: bool,
    pub seed: Option<i64>,
}

impl Location {
    pub fn is_capital(&self) -> bool {
        self.settlement_type == SettlementType::Capital
    }

    pub fn is_river_city(&self) -> bool {
        self.city_type.as_deref() == Some("River")
    }
}

impl HasId for Location {
    type IdType = String;
}

impl ExampleData for Location {
    fn example_data() -> Self {
        Self {
            azgaar_id: 12,
            name: "Vasholm".to_owned(),
            settlement_type: SettlementType::Capital,
            coordinates: Point::new(845.2, 412.7),
            population: 29245,
            description: None,
            city_type: Some("River".to_owned()),
            citadel: true,
            plaza: true,
            walls: true,
            shantytown: false,
            temple: true,
            port: false,
            seed: Some(7311200012),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_settlement_type_as_type() {
        let json = serde_json::to_value(Location::example_data()).unwrap();
        assert_eq!(json["type"], "Capital");
        assert_eq!(json["azgaarId"], 12);
        assert_eq!(json["cityType"], "River");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn missing_flags_default_to_false() {
        let location: Location = serde_json::from_str(
            r#"{"azgaarId":1,"name":"Ost","type":"Town","coordinates":{"x":1,"y":2},"population":500}"#,
        )
        .unwrap();
        assert!(!location.walls);
        assert!(!location.port);
        assert_eq!(location.seed, None);
        assert!(!location.is_capital());
    }

    #[test]
    fn settlement_type_round_trips_through_text() {
        for kind in [SettlementType::Capital, SettlementType::Town] {
            assert_eq!(kind.as_str().parse::<SettlementType>(), Ok(kind));
        }
        assert!("Village".parse::<SettlementType>().is_err());
    }
}
