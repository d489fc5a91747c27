//! Database kept in process memory. Transactions take the whole store for
//! their lifetime and work on a copy that replaces the store on commit.

use std::sync::Arc;

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
use tokio::sync::{Mutex, OwnedMutexGuard};
use utility::{
    id::{HasId, Id},
    let_also::LetAlso,
};

use crate::database::{
    BuildingRepo, CityDataRepo, Database, DatabaseAutocommit, DatabaseError,
    DatabaseTransaction, DistrictRepo, LocationRepo, Result,
};

#[derive(Debug, Clone, Default)]
pub struct State {
    last_id: u64,
    locations: Vec<WithId<Location>>,
    cities: Vec<WithId<CityData>>,
}

impl State {
    fn next_id<T: HasId<IdType = String>>(&mut self) -> Id<T> {
        self.last_id += 1;
        Id::new(self.last_id.to_string())
    }

    fn city(&mut self, id: &Id<CityData>) -> Result<&mut CityData> {
        find(&mut self.cities, id)
            .map(|city| &mut city.content)
            .ok_or(DatabaseError::NotFound)
    }
}

fn find<'a, T>(items: &'a mut [WithId<T>], id: &Id<T>) -> Option<&'a mut WithId<T>>
where
    T: HasId<IdType = String>,
{
    items.iter_mut().find(|item| &item.id == id)
}

/// Gives the repository implementations access to the state they work on.
#[async_trait]
pub trait StateAccess: Send {
    async fn with_state<R, F>(&mut self, f: F) -> R
    where
        R: Send,
        F: FnOnce(&mut State) -> R + Send;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
pub struct MemoryAutocommit {
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<State>,
    staged: State,
}

#[async_trait]
impl Database for MemoryDatabase {
    type Transaction = MemoryTransaction;
    type Autocommit = MemoryAutocommit;

    async fn transaction(&self) -> Result<Self::Transaction> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTransaction { guard, staged })
    }

    fn auto(&self) -> Self::Autocommit {
        MemoryAutocommit {
            state: self.state.clone(),
        }
    }
}

#[async_trait]
impl StateAccess for MemoryAutocommit {
    async fn with_state<R, F>(&mut self, f: F) -> R
    where
        R: Send,
        F: FnOnce(&mut State) -> R + Send,
    {
        let mut state = self.state.lock().await;
        f(&mut state)
    }
}

#[async_trait]
impl StateAccess for MemoryTransaction {
    async fn with_state<R, F>(&mut self, f: F) -> R
    where
        R: Send,
        F: FnOnce(&mut State) -> R + Send,
    {
        f(&mut self.staged)
    }
}

impl DatabaseAutocommit for MemoryAutocommit {}

#[async_trait]
impl DatabaseTransaction for MemoryTransaction {
    async fn commit(self) -> Result<()> {
        let MemoryTransaction { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl<T: StateAccess> LocationRepo for T {
    async fn locations(&mut self) -> Result<Vec<WithId<Location>>> {
        self.with_state(|state| {
            Ok(state
                .locations
                .clone()
                .also(|locations| locations.sort_by_key(|location| location.content.azgaar_id)))
        })
        .await
    }

    async fn location_exists(&mut self, id: &Id<Location>) -> Result<bool> {
        self.with_state(|state| Ok(state.locations.iter().any(|location| &location.id == id)))
            .await
    }

    async fn replace_locations(
        &mut self,
        locations: &[Location],
    ) -> Result<Vec<WithId<Location>>> {
        self.with_state(|state| {
            state.cities.clear();
            let mut inserted = Vec::with_capacity(locations.len());
            for location in locations {
                inserted.push(WithId::new(state.next_id(), location.clone()));
            }
            state.locations = inserted.clone();
            Ok(inserted)
        })
        .await
    }
}

#[async_trait]
impl<T: StateAccess> CityDataRepo for T {
    async fn city_data(
        &mut self,
        location_id: &Id<Location>,
    ) -> Result<Option<WithId<CityData>>> {
        self.with_state(|state| {
            Ok(state
                .cities
                .iter()
                .find(|city| &city.content.location_id == location_id)
                .cloned())
        })
        .await
    }

    async fn city_data_id(
        &mut self,
        location_id: &Id<Location>,
    ) -> Result<Option<Id<CityData>>> {
        Ok(self
            .city_data(location_id)
            .await?
            .map(|city_data| city_data.id))
    }

    async fn insert_city_data(&mut self, city_data: &CityData) -> Result<Id<CityData>> {
        self.with_state(|state| {
            let id = state.next_id();
            state.cities.push(WithId::new(
                id.clone(),
                CityData {
                    buildings: vec![],
                    districts: vec![],
                    ..city_data.clone()
                },
            ));
            Ok(id)
        })
        .await
    }

    async fn replace_raw_data(
        &mut self,
        id: &Id<CityData>,
        raw_data: &Value,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.with_state(|state| {
            let city = state.city(id)?;
            city.raw_data = raw_data.clone();
            city.imported_at = now;
            city.last_modified = now;
            Ok(())
        })
        .await
    }

    async fn set_city_map(
        &mut self,
        id: &Id<CityData>,
        city_map: Option<CityMap>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.with_state(|state| {
            let city = state.city(id)?;
            city.city_map = city_map;
            city.last_modified = now;
            Ok(())
        })
        .await
    }

    async fn touch_city_data(&mut self, id: &Id<CityData>, now: DateTime<Utc>) -> Result<()> {
        self.with_state(|state| {
            state.city(id)?.last_modified = now;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl<T: StateAccess> BuildingRepo for T {
    async fn lock_building(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
    ) -> Result<Option<WithId<Building>>> {
        self.with_state(|state| {
            let city = state.city(city_data_id)?;
            Ok(find(&mut city.buildings, id).map(|building| building.clone()))
        })
        .await
    }

    async fn update_building(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
        update: &BuildingUpdate,
    ) -> Result<WithId<Building>> {
        self.with_state(|state| {
            let city = state.city(city_data_id)?;
            let building = find(&mut city.buildings, id).ok_or(DatabaseError::NotFound)?;
            building.content = update
                .apply(&building.content)
                .map_err(|why| DatabaseError::Other(Box::new(why)))?;
            Ok(building.clone())
        })
        .await
    }

    async fn clear_poi(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<Building>,
    ) -> Result<WithId<Building>> {
        self.with_state(|state| {
            let city = state.city(city_data_id)?;
            let building = find(&mut city.buildings, id).ok_or(DatabaseError::NotFound)?;
            building.content.clear_poi();
            Ok(building.clone())
        })
        .await
    }

    async fn replace_buildings(
        &mut self,
        city_data_id: &Id<CityData>,
        buildings: &[Building],
    ) -> Result<Vec<WithId<Building>>> {
        self.with_state(|state| {
            let buildings = buildings
                .iter()
                .map(|building| WithId::new(state.next_id(), building.clone()))
                .collect::<Vec<_>>();
            state.city(city_data_id)?.buildings = buildings.clone();
            Ok(buildings)
        })
        .await
    }
}

#[async_trait]
impl<T: StateAccess> DistrictRepo for T {
    async fn lock_district(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<District>,
    ) -> Result<Option<WithId<District>>> {
        self.with_state(|state| {
            let city = state.city(city_data_id)?;
            Ok(find(&mut city.districts, id).map(|district| district.clone()))
        })
        .await
    }

    async fn update_district(
        &mut self,
        city_data_id: &Id<CityData>,
        id: &Id<District>,
        update: &DistrictUpdate,
    ) -> Result<WithId<District>> {
        self.with_state(|state| {
            let city = state.city(city_data_id)?;
            let district = find(&mut city.districts, id).ok_or(DatabaseError::NotFound)?;
            district.content = update.apply(&district.content);
            Ok(district.clone())
        })
        .await
    }

    async fn replace_districts(
        &mut self,
        city_data_id: &Id<CityData>,
        districts: &[District],
    ) -> Result<Vec<WithId<District>>> {
        self.with_state(|state| {
            let districts = districts
                .iter()
                .map(|district| WithId::new(state.next_id(), district.clone()))
                .collect::<Vec<_>>();
            state.city(city_data_id)?.districts = districts.clone();
            Ok(districts)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use model::ExampleData;

    use super::*;

    #[tokio::test]
    async fn dropped_transaction_changes_nothing() {
        let database = MemoryDatabase::default();
        {
            let mut tx = database.transaction().await.unwrap();
            tx.replace_locations(&[Location::example_data()])
                .await
                .unwrap();
        }
        assert!(database.auto().locations().await.unwrap().is_empty());

        let mut tx = database.transaction().await.unwrap();
        tx.replace_locations(&[Location::example_data()])
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(database.auto().locations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn locations_are_ordered_by_azgaar_id() {
        let database = MemoryDatabase::default();
        let mut late = Location::example_data();
        late.azgaar_id = 9;
        let mut early = Location::example_data();
        early.azgaar_id = 2;
        database.auto().replace_locations(&[late, early]).await.unwrap();
        let ids = database
            .auto()
            .locations()
            .await
            .unwrap()
            .into_iter()
            .map(|location| location.content.azgaar_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 9]);
    }
}
