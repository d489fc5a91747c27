use async_trait::async_trait;
use model::{
    building::{Building, BuildingUpdate, PoiType, PointOfInterest},
    city_data::CityData,
    Point, WithId,
};
use serde_json::Value;
use sqlx::FromRow;
use utility::id::Id;
use world::database::{BuildingRepo, Result};

use super::{invalid_column, DatabaseRow};
use crate::{
    queries::{building, convert_error},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

/// Table: `buildings`
#[derive(Debug, Clone, FromRow)]
pub struct BuildingRow {
    pub id: String,
    pub watabou_id: String,
    pub x: f64,
    pub y: f64,
    pub building_type: String,
    pub is_poi: bool,
    pub poi_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub notes: Option<String>,
    pub custom_data: Option<Value>,
}

impl DatabaseRow for BuildingRow {
    type Model = Building;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Result<Self::Model> {
        let poi_type = self
            .poi_type
            .map(|poi_type| poi_type.parse::<PoiType>())
            .transpose()
            .map_err(invalid_column)?;
        Ok(Building {
            watabou_id: self.watabou_id,
            coordinates: Point::new(self.x, self.y),
            building_type: self.building_type,
            poi: PointOfInterest {
                is_poi: self.is_poi,
                poi_type,
                name: self.name,
                description: self.description,
                owner: self.owner,
                notes: self.notes,
            },
            custom_data: self.custom_data,
        })
    }
}

// Building Repo

#[async_trait]
impl BuildingRepo for PgDatabaseAutocommit {
    async fn lock_building(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
    ) -> Result<Option<WithId<Building>>> {
        building::get_for_update(&self.pool, city_data_id, id).await
    }

    async fn update_building(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
        update: &BuildingUpdate,
    ) -> Result<WithId<Building>> {
        building::update(&self.pool, city_data_id, id, update).await
    }

    async fn clear_poi(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
    ) -> Result<WithId<Building>> {
        building::clear_poi(&self.pool, city_data_id, id).await
    }

    async fn replace_buildings(
        &mut self,
        city_data_id: &Id<CityData>,
        buildings: &[Building],
    ) -> Result<Vec<WithId<Building>>> {
        let mut tx = self.pool.begin().await.map_err(convert_error)?;
        let inserted = building::replace_all(&mut *tx, city_data_id, buildings).await?;
        tx.commit().await.map_err(convert_error)?;
        Ok(inserted)
    }
}

#[async_trait]
impl<'a> BuildingRepo for PgDatabaseTransaction<'a> {
    async fn lock_building(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
    ) -> Result<Option<WithId<Building>>> {
        building::get_for_update(&mut *self.tx, city_data_id, id).await
    }

    async fn update_building(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
        update: &BuildingUpdate,
    ) -> Result<WithId<Building>> {
        building::update(&mut *self.tx, city_data_id, id, update).await
    }

    async fn clear_poi(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
    ) -> Result<WithId<Building>> {
        building::clear_poi(&mut *self.tx, city_data_id, id).await
    }

    async fn replace_buildings(
        &mut self,
        city_data_id: &Id<CityData>,
        buildings: &[Building],
    ) -> Result<Vec<WithId<Building>>> {
        building::replace_all(&mut *self.tx, city_data_id, buildings).await
    }
}
