use std::{error::Error, fmt, fs, io, path::Path};

use model::{
    location::{Location, SettlementType},
    Point, WithId,
};
use world::{database::Database, Client, RequestError};

pub mod data_model;

use data_model::{Burg, MapData};

/// Population assumed for burgs without a usable population value.
pub const DEFAULT_POPULATION: u64 = 500;

#[derive(Debug)]
pub enum ImportError {
    Io(io::Error),
    Json(serde_json::Error),
    Database(RequestError),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(why) => write!(f, "could not read map file: {}", why),
            Self::Json(why) => write!(f, "could not parse map file: {}", why),
            Self::Database(why) => write!(f, "could not store locations: {}", why),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(why) => Some(why),
            Self::Json(why) => Some(why),
            Self::Database(why) => Some(why),
        }
    }
}

impl From<io::Error> for ImportError {
    fn from(why: io::Error) -> Self {
        Self::Io(why)
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(why: serde_json::Error) -> Self {
        Self::Json(why)
    }
}

impl From<RequestError> for ImportError {
    fn from(why: RequestError) -> Self {
        Self::Database(why)
    }
}

pub fn read_map_data<P: AsRef<Path>>(path: P) -> Result<MapData, ImportError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Seed of the city generator for a burg. The generator seed stored by Azgaar
/// wins, otherwise the map seed and the burg index are combined.
fn seed(burg: &Burg, index: i64, map_seed: Option<&str>) -> i64 {
    if let Some(mfcg) = burg.mfcg {
        return mfcg as i64;
    }
    map_seed
        .and_then(|map_seed| format!("{}{:04}", map_seed, index).parse::<i64>().ok())
        .unwrap_or(index)
}

fn population(burg: &Burg) -> u64 {
    burg.population
        .or(burg.pop)
        .map(|thousands| (thousands * 1000.0).round().max(0.0) as u64)
        .unwrap_or(DEFAULT_POPULATION)
}

/// Converts a burg into a location. Placeholders and burgs without index or
/// name yield `None`.
pub fn burg_location(burg: &Burg, map_seed: Option<&str>) -> Option<Location> {
    let index = burg.i.filter(|index| *index != 0)?;
    let name = burg.name.as_ref().filter(|name| !name.is_empty())?;
    if burg.removed {
        return None;
    }
    if burg.x.is_none() || burg.y.is_none() {
        log::warn!("burg {} `{}` has no coordinates", index, name);
    }
    Some(Location {
        azgaar_id: index,
        name: name.clone(),
        settlement_type: if burg.capital {
            SettlementType::Capital
        } else {
            SettlementType::Town
        },
        coordinates: Point::new(burg.x.unwrap_or_default(), burg.y.unwrap_or_default()),
        population: population(burg),
        description: None,
        city_type: burg.burg_type.clone(),
        citadel: burg.citadel,
        plaza: burg.plaza,
        walls: burg.walls,
        shantytown: burg.shanty,
        temple: burg.temple,
        port: burg.port.is_some_and(|port| port != 0.0),
        seed: Some(seed(burg, index, map_seed)),
    })
}

/// All importable burgs of a map as locations.
pub fn locations(map: &MapData) -> Vec<Location> {
    let map_seed = map.seed();
    map.pack
        .burgs
        .iter()
        .filter(|entry| entry.as_object().is_some_and(|object| !object.is_empty()))
        .filter_map(|entry| match serde_json::from_value::<Burg>(entry.clone()) {
            Ok(burg) => Some(burg),
            Err(why) => {
                log::warn!("skipping unreadable burg: {}", why);
                None
            }
        })
        .filter_map(|burg| burg_location(&burg, map_seed.as_deref()))
        .collect()
}

/// Replaces all stored locations with the given ones in a single transaction.
pub async fn import_world<D: Database>(
    client: &Client<D>,
    locations: &[Location],
) -> Result<Vec<WithId<Location>>, ImportError> {
    Ok(client.replace_locations(locations).await?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use world::memory::MemoryDatabase;

    use super::*;

    fn map() -> MapData {
        serde_json::from_value(json!({
            "info": { "seed": "73112" },
            "pack": {
                "burgs": [
                    {},
                    {
                        "i": 1, "name": "Vasholm", "x": 812.4, "y": 301.9,
                        "capital": 1, "population": 29.245, "citadel": 1,
                        "plaza": 1, "walls": 1, "shanty": 0, "temple": 1,
                        "port": 14, "type": "River"
                    },
                    { "i": 2, "name": "Low Ashby", "x": 10, "y": 20, "pop": "abc",
                      "port": 0, "MFCG": 4242 },
                    { "i": 3, "x": 1, "y": 1 },
                    { "i": 4, "name": "Gone", "x": 1, "y": 1, "removed": true },
                    0
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn converts_burgs() {
        let locations = locations(&map());
        assert_eq!(locations.len(), 2);

        let capital = &locations[0];
        assert_eq!(capital.azgaar_id, 1);
        assert_eq!(capital.settlement_type, SettlementType::Capital);
        assert_eq!(capital.population, 29245);
        assert_eq!(capital.coordinates, Point::new(812.4, 301.9));
        assert!(capital.citadel && capital.plaza && capital.walls && capital.temple);
        assert!(!capital.shantytown);
        assert!(capital.port);
        assert_eq!(capital.city_type.as_deref(), Some("River"));
        assert_eq!(capital.seed, Some(731120001));

        let town = &locations[1];
        assert_eq!(town.settlement_type, SettlementType::Town);
        assert_eq!(town.population, DEFAULT_POPULATION);
        assert!(!town.port);
        assert_eq!(town.seed, Some(4242));
    }

    #[test]
    fn seed_without_map_seed_is_the_index() {
        let burg = Burg {
            i: Some(17),
            name: Some("Fenwick".to_owned()),
            ..Default::default()
        };
        assert_eq!(burg_location(&burg, None).unwrap().seed, Some(17));
        assert_eq!(burg_location(&burg, Some("not a number")).unwrap().seed, Some(17));
    }

    #[test]
    fn placeholder_burg_is_skipped() {
        let burg = Burg {
            i: Some(0),
            name: Some("Nowhere".to_owned()),
            ..Default::default()
        };
        assert!(burg_location(&burg, None).is_none());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = read_map_data("./does/not/exist.json");
        assert!(matches!(result, Err(ImportError::Io(_))));
    }

    #[tokio::test]
    async fn import_replaces_locations() {
        let client = Client::new(MemoryDatabase::default());
        let locations = locations(&map());
        import_world(&client, &locations).await.unwrap();
        import_world(&client, &locations[..1]).await.unwrap();
        let stored = client.get_locations().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content.name, "Vasholm");
    }
}
