use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{
    building::Building,
    city_data::{CityData, CityMap},
    district::District,
    location::Location,
    WithId,
};
use serde_json::Value;
use sqlx::FromRow;
use utility::id::Id;
use world::database::{CityDataRepo, Result};

use super::DatabaseRow;
use crate::{
    queries::{city_data, convert_error},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

/// Table: `city_data`
#[derive(Debug, Clone, FromRow)]
pub struct CityDataRow {
    pub id: String,
    pub location_id: String,
    pub raw_data: Value,
    pub map_width: Option<f64>,
    pub map_height: Option<f64>,
    pub imported_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl CityDataRow {
    pub fn with_children(
        self,
        buildings: Vec<WithId<Building>>,
        districts: Vec<WithId<District>>,
    ) -> Result<WithId<CityData>> {
        let id = self.get_id();
        self.to_model().map(|city_data| {
            WithId::new(
                id,
                CityData {
                    buildings,
                    districts,
                    ..city_data
                },
            )
        })
    }
}

impl DatabaseRow for CityDataRow {
    type Model = CityData;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Result<Self::Model> {
        let city_map = match (self.map_width, self.map_height) {
            (Some(width), Some(height)) => Some(CityMap { width, height }),
            _ => None,
        };
        Ok(CityData {
            location_id: Id::new(self.location_id),
            raw_data: self.raw_data,
            buildings: vec![],
            districts: vec![],
            city_map,
            imported_at: self.imported_at,
            last_modified: self.last_modified,
        })
    }
}

// City Data Repo

#[async_trait]
impl CityDataRepo for PgDatabaseAutocommit {
    async fn city_data(
        &mut self,
        location_id: &Id<Location>,
    ) -> Result<Option<WithId<CityData>>> {
        let mut connection = self.pool.acquire().await.map_err(convert_error)?;
        city_data::get(&mut *connection, location_id).await
    }

    async fn city_data_id(
        &mut self,
        location_id: &Id<Location>,
    ) -> Result<Option<Id<CityData>>> {
        city_data::id_for_update(&self.pool, location_id).await
    }

    async fn insert_city_data(&mut self, city_data: &CityData) -> Result<Id<CityData>> {
        city_data::insert(&self.pool, city_data).await
    }

    async fn replace_raw_data(
        &mut self,
        id: &Id<CityData>,
        raw_data: &Value,
        now: DateTime<Utc>,
    ) -> Result<()> {
        city_data::replace_raw_data(&self.pool, id, raw_data, now).await
    }

    async fn set_city_map(
        &mut self,
        id: &Id<CityData>,
        city_map: Option<CityMap>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        city_data::set_city_map(&self.pool, id, city_map, now).await
    }

    async fn touch_city_data(&mut self, id: &Id<CityData>, now: DateTime<Utc>) -> Result<()> {
        city_data::touch(&self.pool, id, now).await
    }
}

#[async_trait]
impl<'a> CityDataRepo for PgDatabaseTransaction<'a> {
    async fn city_data(
        &mut self,
        location_id: &Id<Location>,
    ) -> Result<Option<WithId<CityData>>> {
        city_data::get(&mut *self.tx, location_id).await
    }

    async fn city_data_id(
        &mut self,
        location_id: &Id<Location>,
    ) -> Result<Option<Id<CityData>>> {
        city_data::id_for_update(&mut *self.tx, location_id).await
    }

    async fn insert_city_data(&mut self, city_data: &CityData) -> Result<Id<CityData>> {
        city_data::insert(&mut *self.tx, city_data).await
    }

    async fn replace_raw_data(
        &mut self,
        id: &Id<CityData>,
        raw_data: &Value,
        now: DateTime<Utc>,
    ) -> Result<()> {
        city_data::replace_raw_data(&mut *self.tx, id, raw_data, now).await
    }

    async fn set_city_map(
        &mut self,
        id: &Id<CityData>,
        city_map: Option<CityMap>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        city_data::set_city_map(&mut *self.tx, id, city_map, now).await
    }

    async fn touch_city_data(&mut self, id: &Id<CityData>, now: DateTime<Utc>) -> Result<()> {
        city_data::touch(&mut *self.tx, id, now).await
    }
}
