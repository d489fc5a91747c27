use std::collections::HashMap;

use chrono::Utc;
use model::{
    building::{Building, BuildingUpdate},
    city_data::CityData,
    district::{District, DistrictUpdate},
    location::Location,
    WithId,
};
use serde_json::Value;
use utility::{id::Id, let_also::LetAlso};
use watabou::{CityExport, DerivedCity};

use crate::{
    database::{
        BuildingRepo, CityDataRepo, Database, DatabaseTransaction, DistrictRepo,
        LocationRepo,
    },
    RequestError, RequestResult, Subject,
};

/// Service operations on locations and city data. All writes happen in a
/// single transaction each.
#[derive(Debug, Clone)]
pub struct Client<D>
where
    D: Database,
{
    pub database: D,
}

impl<D> Client<D>
where
    D: Database,
{
    pub fn new(database: D) -> Self {
        Self { database }
    }
}

impl<D> Client<D>
where
    D: Database,
{
    pub async fn get_locations(&self) -> RequestResult<Vec<WithId<Location>>> {
        self.database.auto().locations().await?.let_owned(Ok)
    }

    /// Replaces all locations. Existing city data is dropped along with
    /// the locations it belongs to.
    pub async fn replace_locations(
        &self,
        locations: &[Location],
    ) -> RequestResult<Vec<WithId<Location>>> {
        let mut tx = self.database.transaction().await?;
        let inserted = tx.replace_locations(locations).await?;
        tx.commit().await?;
        log::info!("replaced all locations with {} new ones", inserted.len());
        Ok(inserted)
    }
}

impl<D> Client<D>
where
    D: Database,
{
    pub async fn get_city_data(
        &self,
        location_id: &Id<Location>,
    ) -> RequestResult<Option<WithId<CityData>>> {
        self.database
            .auto()
            .city_data(location_id)
            .await?
            .let_owned(Ok)
    }

    /// Stores an export for a location. An existing record keeps its id and
    /// districts but loses its buildings, which belonged to the previous
    /// export. Both timestamps are set to now.
    pub async fn import_city_data(
        &self,
        location_id: &Id<Location>,
        raw_data: Value,
    ) -> RequestResult<WithId<CityData>> {
        let now = Utc::now();
        let mut tx = self.database.transaction().await?;
        if !tx.location_exists(location_id).await? {
            return Err(RequestError::NotFound(Subject::Location));
        }
        match tx.city_data_id(location_id).await? {
            Some(id) => {
                tx.replace_raw_data(&id, &raw_data, now).await?;
                tx.replace_buildings(&id, &[]).await?;
                log::debug!("replaced export of city data `{}`", id);
            }
            None => {
                let id = tx
                    .insert_city_data(&CityData::new(location_id.clone(), raw_data, now))
                    .await?;
                log::debug!("created city data `{}` for `{}`", id, location_id);
            }
        }
        let city_data = tx
            .city_data(location_id)
            .await?
            .ok_or(RequestError::NotFound(Subject::CityData))?;
        tx.commit().await?;
        Ok(city_data)
    }

    /// Rebuilds buildings and districts from the stored export.
    pub async fn derive_city_data(
        &self,
        location_id: &Id<Location>,
    ) -> RequestResult<WithId<CityData>> {
        let now = Utc::now();
        let mut tx = self.database.transaction().await?;
        let id = tx
            .city_data_id(location_id)
            .await?
            .ok_or(RequestError::NotFound(Subject::CityData))?;
        let previous = tx
            .city_data(location_id)
            .await?
            .ok_or(RequestError::NotFound(Subject::CityData))?;
        let export = CityExport::from_value(&previous.content.raw_data)
            .map_err(|why| RequestError::Invalid(format!("Invalid city export: {}", why)))?;
        let derived = watabou::derive(&export);
        let city_map = derived.city_map();
        let (buildings, districts) = carry_over(&previous.content, derived);

        tx.replace_buildings(&id, &buildings).await?;
        tx.replace_districts(&id, &districts).await?;
        tx.set_city_map(&id, city_map, now).await?;
        let city_data = tx
            .city_data(location_id)
            .await?
            .ok_or(RequestError::NotFound(Subject::CityData))?;
        tx.commit().await?;
        log::info!(
            "derived {} buildings and {} districts for `{}`",
            city_data.content.buildings.len(),
            city_data.content.districts.len(),
            location_id
        );
        Ok(city_data)
    }
}

/// Keeps the annotations of the previous derivation for buildings and
/// districts that are derived again.
fn carry_over(previous: &CityData, derived: DerivedCity) -> (Vec<Building>, Vec<District>) {
    let buildings = derived
        .buildings
        .into_iter()
        .map(|mut building| {
            if let Some(old) = previous.building_by_watabou_id(&building.watabou_id) {
                building.poi = old.content.poi.clone();
                building.custom_data = old.content.custom_data.clone();
            }
            building
        })
        .collect();

    let by_ward = previous
        .districts
        .iter()
        .filter_map(|district| {
            district
                .content
                .watabou_ward_id
                .map(|ward| (ward, &district.content))
        })
        .collect::<HashMap<_, _>>();
    let districts = derived
        .districts
        .into_iter()
        .map(|mut district| {
            let old = district.watabou_ward_id.and_then(|ward| by_ward.get(&ward));
            if let Some(old) = old {
                district.name = old.name.clone().or(district.name);
                district.description = old.description.clone().or(district.description);
            }
            district
        })
        .collect();

    (buildings, districts)
}

impl<D> Client<D>
where
    D: Database,
{
    pub async fn update_building(
        &self,
        location_id: &Id<Location>,
        building_id: &Id<Building>,
        update: &BuildingUpdate,
    ) -> RequestResult<WithId<Building>> {
        let mut tx = self.database.transaction().await?;
        let city_data_id = tx
            .city_data_id(location_id)
            .await?
            .ok_or(RequestError::NotFound(Subject::CityData))?;
        let current = tx
            .lock_building(&city_data_id, building_id)
            .await?
            .ok_or(RequestError::NotFound(Subject::Building))?;
        update.apply(&current.content)?;
        let building = tx
            .update_building(&city_data_id, building_id, update)
            .await?;
        tx.touch_city_data(&city_data_id, Utc::now()).await?;
        tx.commit().await?;
        Ok(building)
    }

    pub async fn clear_poi(
        &self,
        location_id: &Id<Location>,
        building_id: &Id<Building>,
    ) -> RequestResult<WithId<Building>> {
        let mut tx = self.database.transaction().await?;
        let city_data_id = tx
            .city_data_id(location_id)
            .await?
            .ok_or(RequestError::NotFound(Subject::CityData))?;
        tx.lock_building(&city_data_id, building_id)
            .await?
            .ok_or(RequestError::NotFound(Subject::Building))?;
        let building = tx.clear_poi(&city_data_id, building_id).await?;
        tx.touch_city_data(&city_data_id, Utc::now()).await?;
        tx.commit().await?;
        Ok(building)
    }

    pub async fn update_district(
        &self,
        location_id: &Id<Location>,
        district_id: &Id<District>,
        update: &DistrictUpdate,
    ) -> RequestResult<WithId<District>> {
        let mut tx = self.database.transaction().await?;
        let city_data_id = tx
            .city_data_id(location_id)
            .await?
            .ok_or(RequestError::NotFound(Subject::CityData))?;
        tx.lock_district(&city_data_id, district_id)
            .await?
            .ok_or(RequestError::NotFound(Subject::District))?;
        let district = tx
            .update_district(&city_data_id, district_id, update)
            .await?;
        tx.touch_city_data(&city_data_id, Utc::now()).await?;
        tx.commit().await?;
        Ok(district)
    }
}
