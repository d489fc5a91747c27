//! The parts of an Azgaar "full JSON" map export the importer reads.

use serde::Deserialize;
use serde_json::Value;
use utility::serde::{flag, lenient_number};

#[derive(Debug, Clone, Deserialize)]
pub struct MapData {
    #[serde(default)]
    pub info: Option<MapInfo>,
    pub pack: Pack,
}

impl MapData {
    /// The map seed as text. Exports store it as a string or a number.
    pub fn seed(&self) -> Option<String> {
        match self.info.as_ref()?.seed.as_ref()? {
            Value::String(seed) if !seed.trim().is_empty() => Some(seed.trim().to_owned()),
            Value::Number(seed) => Some(seed.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapInfo {
    #[serde(default)]
    pub seed: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pack {
    /// Entry 0 is an empty placeholder, removed burgs stay in the list.
    #[serde(default)]
    pub burgs: Vec<Value>,
}

/// A settlement of the map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Burg {
    #[serde(default)]
    pub i: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number::deserialize")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number::deserialize")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub capital: bool,
    /// Population in thousands.
    #[serde(default, deserialize_with = "lenient_number::deserialize")]
    pub population: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number::deserialize")]
    pub pop: Option<f64>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub citadel: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub plaza: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub walls: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub shanty: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub temple: bool,
    /// Id of the water body the port lies on, `0` for inland burgs.
    #[serde(default, deserialize_with = "lenient_number::deserialize")]
    pub port: Option<f64>,
    #[serde(default, rename = "type")]
    pub burg_type: Option<String>,
    /// Seed of the city generator, set when the burg was opened there.
    #[serde(default, rename = "MFCG", deserialize_with = "lenient_number::deserialize")]
    pub mfcg: Option<f64>,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub removed: bool,
}
