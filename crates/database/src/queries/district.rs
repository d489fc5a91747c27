use model::{
    city_data::CityData,
    district::{District, DistrictUpdate},
    WithId,
};
use sqlx::{Executor, PgConnection, Postgres};
use utility::id::Id;
use world::database::Result;

use crate::data_model::{district::DistrictRow, with_id, with_ids};

use super::{convert_error, insert_all_returning, MAX_CHUNK_SIZE};

const COLUMNS: [&str; 6] = [
    "city_data_id",
    "position",
    "watabou_ward_id",
    "name",
    "description",
    "buildings",
];

const RETURNING: [&str; 5] = ["id", "watabou_ward_id", "name", "description", "buildings"];

pub async fn get_all<'c, E>(
    executor: E,
    city_data_id: &Id<CityData>,
) -> Result<Vec<WithId<District>>>
where
    E: Executor<'c, Database = Postgres>,
{
    let rows: Vec<DistrictRow> = sqlx::query_as(
        "
        SELECT id, watabou_ward_id, name, description, buildings
        FROM districts
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
    id: &Id<District>,
) -> Result<Option<WithId<District>>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: Option<DistrictRow> = sqlx::query_as(
        "
        SELECT id, watabou_ward_id, name, description, buildings
        FROM districts
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

pub async fn update<'c, E>(
    executor: E,
    city_data_id: &Id<CityData>,
    id: &Id<District>,
    update: &DistrictUpdate,
) -> Result<WithId<District>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        UPDATE districts
        SET name = CASE WHEN $3 THEN $4 ELSE name END,
            description = CASE WHEN $5 THEN $6 ELSE description END
        WHERE city_data_id = $1 AND id = $2
        RETURNING id, watabou_ward_id, name, description, buildings;
        ",
    )
    .bind(city_data_id.raw())
    .bind(id.raw())
    .bind(update.name.is_some())
    .bind(update.name.clone().flatten())
    .bind(update.description.is_some())
    .bind(update.description.clone().flatten())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .and_then(|row: DistrictRow| with_id(row))
}

pub async fn replace_all(
    connection: &mut PgConnection,
    city_data_id: &Id<CityData>,
    districts: &[District],
) -> Result<Vec<WithId<District>>> {
    sqlx::query("DELETE FROM districts WHERE city_data_id = $1;")
        .bind(city_data_id.raw())
        .execute(&mut *connection)
        .await
        .map_err(convert_error)?;

    let positioned = districts.iter().enumerate().collect::<Vec<_>>();
    let mut inserted = Vec::with_capacity(districts.len());
    for chunk in positioned.chunks(MAX_CHUNK_SIZE) {
        let rows: Vec<DistrictRow> = insert_all_returning(
            &mut *connection,
            "districts",
            &COLUMNS,
            &RETURNING,
            chunk,
            |query, (position, district)| {
                query
                    .bind(city_data_id.raw())
                    .bind(i32::try_from(*position).unwrap_or(i32::MAX))
                    .bind(district.watabou_ward_id)
                    .bind(district.name.clone())
                    .bind(district.description.clone())
                    .bind(district.buildings.clone())
            },
        )
        .await
        .map_err(convert_error)?;
        inserted.extend(with_ids(rows)?);
    }
    Ok(inserted)
}
