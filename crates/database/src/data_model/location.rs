use async_trait::async_trait;
use model::{
    location::{Location, SettlementType},
    Point, WithId,
};
use sqlx::FromRow;
use utility::id::Id;
use world::database::{LocationRepo, Result};

use super::{invalid_column, DatabaseRow};
use crate::{
    queries::{convert_error, location},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

/// Table: `locations`
#[derive(Debug, Clone, FromRow)]
pub struct LocationRow {
    pub id: String,
    pub azgaar_id: i64,
    pub name: String,
    pub settlement_type: String,
    pub x: f64,
    pub y: f64,
    pub population: i64,
    pub description: Option<String>,
    pub city_type: Option<String>,
    pub citadel: bool,
    pub plaza: bool,
    pub walls: bool,
    pub shantytown: bool,
    pub temple: bool,
    pub port: bool,
    pub seed: Option<i64>,
}

impl DatabaseRow for LocationRow {
    type Model = Location;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Result<Self::Model> {
        Ok(Location {
            azgaar_id: self.azgaar_id,
            name: self.name,
            settlement_type: self
                .settlement_type
                .parse::<SettlementType>()
                .map_err(invalid_column)?,
            coordinates: Point::new(self.x, self.y),
            population: u64::try_from(self.population).map_err(invalid_column)?,
            description: self.description,
            city_type: self.city_type,
            citadel: self.citadel,
            plaza: self.plaza,
            walls: self.walls,
            shantytown: self.shantytown,
            temple: self.temple,
            port: self.port,
            seed: self.seed,
        })
    }
}

// Location Repo

#[async_trait]
impl LocationRepo for PgDatabaseAutocommit {
    async fn locations(&mut self) -> Result<Vec<WithId<Location>>> {
        location::get_all(&self.pool).await
    }

    async fn location_exists(&mut self, id: &Id<Location>) -> Result<bool> {
        location::exists(&self.pool, id).await
    }

    async fn replace_locations(
        &mut self,
        locations: &[Location],
    ) -> Result<Vec<WithId<Location>>> {
        let mut tx = self.pool.begin().await.map_err(convert_error)?;
        let inserted = location::replace_all(&mut *tx, locations).await?;
        tx.commit().await.map_err(convert_error)?;
        Ok(inserted)
    }
}

#[async_trait]
impl<'a> LocationRepo for PgDatabaseTransaction<'a> {
    async fn locations(&mut self) -> Result<Vec<WithId<Location>>> {
        location::get_all(&mut *self.tx).await
    }

    async fn location_exists(&mut self, id: &Id<Location>) -> Result<bool> {
        location::exists(&mut *self.tx, id).await
    }

    async fn replace_locations(
        &mut self,
        locations: &[Location],
    ) -> Result<Vec<WithId<Location>>> {
        location::replace_all(&mut *self.tx, locations).await
    }
}
