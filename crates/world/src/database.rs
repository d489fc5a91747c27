use std::{error, fmt, result};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{
    building::{Building, BuildingUpdate},
    city_data::{CityData, CityMap},
    district::{District, DistrictUpdate},
    location::Location,
    WithId,
};
use serde_json::Value;
use utility::id::Id;

#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    Other(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("record vanished while it was in use"),
            Self::Other(why) => write!(f, "database error: {}", why),
        }
    }
}

impl error::Error for DatabaseError {}

pub type Result<T> = result::Result<T, DatabaseError>;

#[async_trait]
pub trait LocationRepo {
    /// All locations ordered by their azgaar id.
    async fn locations(&mut self) -> Result<Vec<WithId<Location>>>;

    async fn location_exists(&mut self, id: &Id<Location>) -> Result<bool>;

    /// Deletes every location, and with them all city data, and inserts the
    /// given ones.
    async fn replace_locations(
        &mut self,
        locations: &[Location],
    ) -> Result<Vec<WithId<Location>>>;
}

#[async_trait]
pub trait CityDataRepo {
    /// The complete record of a location, including buildings and districts.
    async fn city_data(
        &mut self,
        location_id: &Id<Location>,
    ) -> Result<Option<WithId<CityData>>>;

    /// Id of the record of a location. Implementations lock the record until
    /// the end of the transaction.
    async fn city_data_id(
        &mut self,
        location_id: &Id<Location>,
    ) -> Result<Option<Id<CityData>>>;

    /// Inserts the record without its buildings and districts.
    async fn insert_city_data(&mut self, city_data: &CityData) -> Result<Id<CityData>>;

    async fn replace_raw_data(
        &mut self,
        id: &Id<CityData>,
        raw_data: &Value,
        now: DateTime<Utc>,
    ) -> Result<()>;

    async fn set_city_map(
        &mut self,
        id: &Id<CityData>,
        city_map: Option<CityMap>,
        now: DateTime<Utc>,
    ) -> Result<()>;

    /// Bumps `lastModified`.
    async fn touch_city_data(&mut self, id: &Id<CityData>, now: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait BuildingRepo {
    /// Looks up a building of a record and locks it for the rest of the
    /// transaction.
    async fn lock_building(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
    ) -> Result<Option<WithId<Building>>>;

    /// Writes the fields present in `update`, leaving all others untouched.
    async fn update_building(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
        update: &BuildingUpdate,
    ) -> Result<WithId<Building>>;

    /// Resets the point of interest overlay of a building.
    async fn clear_poi(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
    ) -> Result<WithId<Building>>;

    async fn replace_buildings(
        &mut self,
        city_data_id: &Id<CityData>,
        buildings: &[Building],
    ) -> Result<Vec<WithId<Building>>>;
}

#[async_trait]
pub trait DistrictRepo {
    async fn lock_district(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<District>,
    ) -> Result<Option<WithId<District>>>;

    async fn update_district(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<District>,
        update: &DistrictUpdate,
    ) -> Result<WithId<District>>;

    async fn replace_districts(
        &mut self,
        city_data_id: &Id<CityData>,
        districts: &[District],
    ) -> Result<Vec<WithId<District>>>;
}

pub trait DatabaseOperations:
    LocationRepo + CityDataRepo + BuildingRepo + DistrictRepo
{
}

impl<T> DatabaseOperations for T where
    T: LocationRepo + CityDataRepo + BuildingRepo + DistrictRepo
{
}

#[async_trait]
pub trait DatabaseTransaction: DatabaseOperations {
    async fn commit(self) -> Result<()>;
}

pub trait DatabaseAutocommit: DatabaseOperations {}

/// A store for locations and their city data.
/// Concurrent access happens through clones of the database object.
#[async_trait]
pub trait Database: Clone + Send + Sync + Sized + 'static {
    type Transaction: DatabaseTransaction + Send;
    type Autocommit: DatabaseAutocommit + Send;

    async fn transaction(&self) -> Result<Self::Transaction>;

    fn auto(&self) -> Self::Autocommit;
}
