use async_trait::async_trait;
use model::{
    city_data::CityData,
    district::{District, DistrictUpdate},
    WithId,
};
use sqlx::FromRow;
use utility::id::Id;
use world::database::{DistrictRepo, Result};

use super::DatabaseRow;
use crate::{
    queries::{convert_error, district},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

/// Table: `districts`
#[derive(Debug, Clone, FromRow)]
pub struct DistrictRow {
    pub id: String,
    pub watabou_ward_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub buildings: Vec<String>,
}

impl DatabaseRow for DistrictRow {
    type Model = District;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Result<Self::Model> {
        Ok(District {
            watabou_ward_id: self.watabou_ward_id,
            name: self.name,
            description: self.description,
            buildings: self.buildings,
        })
    }
}

// District Repo

#[async_trait]
impl DistrictRepo for PgDatabaseAutocommit {
    async fn lock_district(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<District>,
    ) -> Result<Option<WithId<District>>> {
        district::get_for_update(&self.pool, city_data_id, id).await
    }

    async fn update_district(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<District>,
        update: &DistrictUpdate,
    ) -> Result<WithId<District>> {
        district::update(&self.pool, city_data_id, id, update).await
    }

    async fn replace_districts(
        &mut self,
        city_data_id: &Id<CityData>,
        districts: &[District],
    ) -> Result<Vec<WithId<District>>> {
        let mut tx = self.pool.begin().await.map_err(convert_error)?;
        let inserted = district::replace_all(&mut *tx, city_data_id, districts).await?;
        tx.commit().await.map_err(convert_error)?;
        Ok(inserted)
    }
}

#[async_trait]
impl<'a> DistrictRepo for PgDatabaseTransaction<'a> {
    async fn lock_district(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<District>,
    ) -> Result<Option<WithId<District>>> {
        district::get_for_update(&mut *self.tx, city_data_id, id).await
    }

    async fn update_district(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<District>,
        update: &DistrictUpdate,
    ) -> Result<WithId<District>> {
        district::update(&mut *self.tx, city_data_id, id, update).await
    }

    async fn replace_districts(
        &mut self,
        city_data_id: &Id<CityData>,
        districts: &[District],
    ) -> Result<Vec<WithId<District>>> {
        district::replace_all(&mut *self.tx, city_data_id, districts).await
    }
}
