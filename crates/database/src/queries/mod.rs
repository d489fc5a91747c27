use itertools::Itertools;
use sqlx::{
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    Executor, FromRow, Postgres,
};
use world::database::DatabaseError;

pub mod building;
pub mod city_data;
pub mod district;
pub mod location;

/// Rows per multi-row insert. Keeps the number of bind parameters far below
/// the limit of postgres.
pub(crate) const MAX_CHUNK_SIZE: usize = 500;

pub(crate) fn convert_error(why: sqlx::Error) -> DatabaseError {
    match why {
        sqlx::Error::RowNotFound => DatabaseError::NotFound,
        _ => DatabaseError::Other(Box::new(why)),
    }
}

fn placeholders(rows: usize, columns: usize) -> String {
    (0..rows)
        .map(|row| {
            let values = (1..=columns)
                .map(|column| format!("${}", row * columns + column))
                .join(", ");
            format!("({})", values)
        })
        .join(", ")
}

// bulk insert

pub async fn insert_all_returning<'c, E, T, B, O>(
    executor: E,
    table: &str,
    columns: &[&str],
    returning: &[&str],
    values: &[T],
    bind: B,
) -> Result<Vec<O>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
    for<'a> B: Fn(
        QueryAs<'a, Postgres, O, PgArguments>,
        &T,
    ) -> QueryAs<'a, Postgres, O, PgArguments>,
    for<'r> O: FromRow<'r, PgRow> + Send + Unpin,
{
    if values.is_empty() {
        return Ok(vec![]);
    }
    let query_str = format!(
        "INSERT INTO {} ({}) VALUES {} RETURNING {};",
        table,
        columns.join(", "),
        placeholders(values.len(), columns.len()),
        returning.join(", ")
    );

    let mut query = sqlx::query_as::<Postgres, O>(&query_str);
    for value in values {
        query = bind(query, value);
    }
    query.fetch_all(executor).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_row_by_row() {
        assert_eq!(placeholders(2, 3), "($1, $2, $3), ($4, $5, $6)");
        assert_eq!(placeholders(1, 1), "($1)");
        assert_eq!(placeholders(0, 4), "");
    }
}
