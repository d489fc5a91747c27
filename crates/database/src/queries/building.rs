use model::{
    building::{Building, BuildingUpdate},
    city_data::CityData,
    WithId,
};
use sqlx::{Executor, PgConnection, Postgres};
use utility::id::Id;
use world::database::Result;

use crate::data_model::{building::BuildingRow, with_id, with_ids};

use super::{convert_error, insert_all_returning, MAX_CHUNK_SIZE};

const COLUMNS: [&str; 13] = [
    "city_data_id",
    "position",
    "watabou_id",
    "x",
    "y",
    "building_type",
    "is_poi",
    "poi_type",
    "name",
    "description",
    "owner",
    "notes",
    "custom_data",
];

const RETURNING: [&str; 12] = [
    "id",
    "watabou_id",
    "x",
    "y",
    "building_type",
    "is_poi",
    "poi_type",
    "name",
    "description",
    "owner",
    "notes",
    "custom_data",
];

pub async fn get_all<'c, E>(
    executor: E,
    city_data_id: &Id<CityData>,
) -> Result<Vec<WithId<Building>>>
where
    E: Executor<'c, Database = Postgres>,
{
    let rows: Vec<BuildingRow> = sqlx::query_as(
        "
        SELECT id, watabou_id, x, y, building_type, is_poi, poi_type,
               name, description, owner, notes, custom_data
        FROM buildings
        WHERE city_data_id = $1
        ORDER BY position ASC;
        ",
    )
    .bind(city_data_id.raw())
    .fetch_all(executor)
    .await
    .map_err(convert_error)?;
    with_ids(rows)
}

pub async fn get_for_update<'c, E>(
    executor: E,
    city_data_id: &Id<CityData>,
    id: &Id<Building>,
) -> Result<Option<WithId<Building>>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: Option<BuildingRow> = sqlx::query_as(
        "
        SELECT id, watabou_id, x, y, building_type, is_poi, poi_type,
               name, description, owner, notes, custom_data
        FROM buildings
        WHERE city_data_id = $1 AND id = $2
        FOR UPDATE;
        ",
    )
    .bind(city_data_id.raw())
    .bind(id.raw())
    .fetch_optional(executor)
    .await
    .map_err(convert_error)?;
    row.map(with_id).transpose()
}

/// Writes the supplied fields in one statement. Each nullable column comes
/// with a flag telling whether it was supplied, so `null` clears it and an
/// absent field keeps the stored value.
pub async fn update<'c, E>(
    executor: E,
    city_data_id: &Id<CityData>,
    id: &Id<Building>,
    update: &BuildingUpdate,
) -> Result<WithId<Building>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        UPDATE buildings
        SET is_poi = COALESCE($3, is_poi),
            poi_type = CASE WHEN $4 THEN $5 ELSE poi_type END,
            name = CASE WHEN $6 THEN $7 ELSE name END,
            description = CASE WHEN $8 THEN $9 ELSE description END,
            owner = CASE WHEN $10 THEN $11 ELSE owner END,
            notes = CASE WHEN $12 THEN $13 ELSE notes END,
            custom_data = CASE WHEN $14 THEN $15 ELSE custom_data END
        WHERE city_data_id = $1 AND id = $2
        RETURNING id, watabou_id, x, y, building_type, is_poi, poi_type,
                  name, description, owner, notes, custom_data;
        ",
    )
    .bind(city_data_id.raw())
    .bind(id.raw())
    .bind(update.is_poi)
    .bind(update.poi_type.is_some())
    .bind(update.poi_type.flatten().map(|poi_type| poi_type.as_str()))
    .bind(update.name.is_some())
    .bind(update.name.clone().flatten())
    .bind(update.description.is_some())
    .bind(update.description.clone().flatten())
    .bind(update.owner.is_some())
    .bind(update.owner.clone().flatten())
    .bind(update.notes.is_some())
    .bind(update.notes.clone().flatten())
    .bind(update.custom_data.is_some())
    .bind(update.custom_data.clone().flatten())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .and_then(|row: BuildingRow| with_id(row))
}

pub async fn clear_poi<'c, E>(
    executor: E,
    city_data_id: &Id<CityData>,
    id: &Id<Building>,
) -> Result<WithId<Building>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        UPDATE buildings
        SET is_poi = FALSE,
            poi_type = NULL,
            name = NULL,
            description = NULL,
            owner = NULL,
            notes = NULL
        WHERE city_data_id = $1 AND id = $2
        RETURNING id, watabou_id, x, y, building_type, is_poi, poi_type,
                  name, description, owner, notes, custom_data;
        ",
    )
    .bind(city_data_id.raw())
    .bind(id.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .and_then(|row: BuildingRow| with_id(row))
}

/// Replaces all buildings of a record, keeping the given order.
pub async fn replace_all(
    connection: &mut PgConnection,
    city_data_id: &Id<CityData>,
    buildings: &[Building],
) -> Result<Vec<WithId<Building>>> {
    sqlx::query("DELETE FROM buildings WHERE city_data_id = $1;")
        .bind(city_data_id.raw())
        .execute(&mut *connection)
        .await
        .map_err(convert_error)?;

    let positioned = buildings.iter().enumerate().collect::<Vec<_>>();
    let mut inserted = Vec::with_capacity(buildings.len());
    for chunk in positioned.chunks(MAX_CHUNK_SIZE) {
        let rows: Vec<BuildingRow> = insert_all_returning(
            &mut *connection,
            "buildings",
            &COLUMNS,
            &RETURNING,
            chunk,
            |query, (position, building)| {
                let poi = &building.poi;
                query
                    .bind(city_data_id.raw())
                    .bind(i32::try_from(*position).unwrap_or(i32::MAX))
                    .bind(building.watabou_id.clone())
                    .bind(building.coordinates.x)
                    .bind(building.coordinates.y)
                    .bind(building.building_type.clone())
                    .bind(poi.is_poi)
                    .bind(poi.poi_type.map(|poi_type| poi_type.as_str()))
                    .bind(poi.name.clone())
                    .bind(poi.description.clone())
                    .bind(poi.owner.clone())
                    .bind(poi.notes.clone())
                    .bind(building.custom_data.clone())
            },
        )
        .await
        .map_err(convert_error)?;
        inserted.extend(with_ids(rows)?);
    }
    log::debug!(
        "stored {} buildings for city data `{}`",
        inserted.len(),
        city_data_id
    );
    Ok(inserted)
}
