use chrono::{DateTime, Utc};
use model::{
    city_data::{CityData, CityMap},
    location::Location,
    WithId,
};
use serde_json::Value;
use sqlx::{postgres::PgQueryResult, Executor, PgConnection, Postgres};
use utility::id::Id;
use world::database::{DatabaseError, Result};

use crate::data_model::city_data::CityDataRow;

use super::{building, convert_error, district};

fn expect_one(result: PgQueryResult) -> Result<()> {
    match result.rows_affected() {
        0 => Err(DatabaseError::NotFound),
        _ => Ok(()),
    }
}

pub async fn get_row<'c, E>(executor: E, location_id: &Id<Location>) -> Result<Option<CityDataRow>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT id, location_id, raw_data, map_width, map_height, imported_at, last_modified
        FROM city_data
        WHERE location_id = $1;
        ",
    )
    .bind(location_id.raw())
    .fetch_optional(executor)
    .await
    .map_err(convert_error)
}

/// The complete record of a location with its buildings and districts.
pub async fn get(
    connection: &mut PgConnection,
    location_id: &Id<Location>,
) -> Result<Option<WithId<CityData>>> {
    let Some(row) = get_row(&mut *connection, location_id).await? else {
        return Ok(None);
    };
    let id = Id::new(row.id.clone());
    let buildings = building::get_all(&mut *connection, &id).await?;
    let districts = district::get_all(&mut *connection, &id).await?;
    row.with_children(buildings, districts).map(Some)
}

pub async fn id_for_update<'c, E>(
    executor: E,
    location_id: &Id<Location>,
) -> Result<Option<Id<CityData>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar("SELECT id FROM city_data WHERE location_id = $1 FOR UPDATE;")
        .bind(location_id.raw())
        .fetch_optional(executor)
        .await
        .map(|id: Option<String>| id.map(Id::new))
        .map_err(convert_error)
}

pub async fn insert<'c, E>(executor: E, city_data: &CityData) -> Result<Id<CityData>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar(
        "
        INSERT INTO city_data(
            location_id,
            raw_data,
            map_width,
            map_height,
            imported_at,
            last_modified
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id;
        ",
    )
    .bind(city_data.location_id.raw())
    .bind(&city_data.raw_data)
    .bind(city_data.city_map.map(|city_map| city_map.width))
    .bind(city_data.city_map.map(|city_map| city_map.height))
    .bind(city_data.imported_at)
    .bind(city_data.last_modified)
    .fetch_one(executor)
    .await
    .map(Id::new)
    .map_err(convert_error)
}

pub async fn replace_raw_data<'c, E>(
    executor: E,
    id: &Id<CityData>,
    raw_data: &Value,
    now: DateTime<Utc>,
) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        UPDATE city_data
        SET raw_data = $2, imported_at = $3, last_modified = $3
        WHERE id = $1;
        ",
    )
    .bind(id.raw())
    .bind(raw_data)
    .bind(now)
    .execute(executor)
    .await
    .map_err(convert_error)
    .and_then(expect_one)
}

pub async fn set_city_map<'c, E>(
    executor: E,
    id: &Id<CityData>,
    city_map: Option<CityMap>,
    now: DateTime<Utc>,
) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        UPDATE city_data
        SET map_width = $2, map_height = $3, last_modified = $4
        WHERE id = $1;
        ",
    )
    .bind(id.raw())
    .bind(city_map.map(|city_map| city_map.width))
    .bind(city_map.map(|city_map| city_map.height))
    .bind(now)
    .execute(executor)
    .await
    .map_err(convert_error)
    .and_then(expect_one)
}

pub async fn touch<'c, E>(executor: E, id: &Id<CityData>, now: DateTime<Utc>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query("UPDATE city_data SET last_modified = $2 WHERE id = $1;")
        .bind(id.raw())
        .bind(now)
        .execute(executor)
        .await
        .map_err(convert_error)
        .and_then(expect_one)
}
