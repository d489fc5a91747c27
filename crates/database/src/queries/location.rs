use model::{location::Location, WithId};
use sqlx::{Executor, PgConnection, Postgres};
use utility::id::Id;
use world::database::Result;

use crate::data_model::{location::LocationRow, with_ids};

use super::{convert_error, insert_all_returning, MAX_CHUNK_SIZE};

const COLUMNS: [&str; 15] = [
    "azgaar_id",
    "name",
    "settlement_type",
    "x",
    "y",
    "population",
    "description",
    "city_type",
    "citadel",
    "plaza",
    "walls",
    "shantytown",
    "temple",
    "port",
    "seed",
];

const RETURNING: [&str; 16] = [
    "id",
    "azgaar_id",
    "name",
    "settlement_type",
    "x",
    "y",
    "population",
    "description",
    "city_type",
    "citadel",
    "plaza",
    "walls",
    "shantytown",
    "temple",
    "port",
    "seed",
];

pub async fn get_all<'c, E>(executor: E) -> Result<Vec<WithId<Location>>>
where
    E: Executor<'c, Database = Postgres>,
{
    let rows: Vec<LocationRow> = sqlx::query_as(
        "
        SELECT id, azgaar_id, name, settlement_type, x, y, population,
               description, city_type, citadel, plaza, walls, shantytown,
               temple, port, seed
        FROM locations
        ORDER BY azgaar_id ASC, id ASC;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)?;
    with_ids(rows)
}

pub async fn exists<'c, E>(executor: E, id: &Id<Location>) -> Result<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM locations WHERE id = $1);")
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
}

/// Deletes all locations, cascading to their city data, and inserts the
/// given ones in chunks.
pub async fn replace_all(
    connection: &mut PgConnection,
    locations: &[Location],
) -> Result<Vec<WithId<Location>>> {
    let deleted = sqlx::query("DELETE FROM locations;")
        .execute(&mut *connection)
        .await
        .map_err(convert_error)?
        .rows_affected();
    log::debug!("deleted {} locations", deleted);

    let mut inserted = Vec::with_capacity(locations.len());
    for chunk in locations.chunks(MAX_CHUNK_SIZE) {
        let rows: Vec<LocationRow> = insert_all_returning(
            &mut *connection,
            "locations",
            &COLUMNS,
            &RETURNING,
            chunk,
            |query, location| {
                query
                    .bind(location.azgaar_id)
                    .bind(location.name.clone())
                    .bind(location.settlement_type.as_str())
                    .bind(location.coordinates.x)
                    .bind(location.coordinates.y)
                    .bind(i64::try_from(location.population).unwrap_or(i64::MAX))
                    .bind(location.description.clone())
                    .bind(location.city_type.clone())
                    .bind(location.citadel)
                    .bind(location.plaza)
                    .bind(location.walls)
                    .bind(location.shantytown)
                    .bind(location.temple)
                    .bind(location.port)
                    .bind(location.seed)
            },
        )
        .await
        .map_err(convert_error)?;
        inserted.extend(with_ids(rows)?);
    }
    inserted.sort_by_key(|location| location.content.azgaar_id);
    Ok(inserted)
}
