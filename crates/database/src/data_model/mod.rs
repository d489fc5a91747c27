use std::fmt::Debug;

use model::WithId;
use serde::Serialize;
use utility::id::{HasId, Id};
use world::database::{DatabaseError, Result};

pub mod building;
pub mod city_data;
pub mod district;
pub mod location;

pub trait DatabaseRow {
    type Model: Serialize + HasId;

    fn get_id(&self) -> Id<Self::Model>;
    fn to_model(self) -> Result<Self::Model>;
}

pub fn with_ids<R: DatabaseRow>(rows: Vec<R>) -> Result<Vec<WithId<R::Model>>>
where
    <R::Model as HasId>::IdType: Debug + Clone + Serialize,
{
    rows.into_iter().map(with_id).collect()
}

pub fn with_id<R: DatabaseRow>(row: R) -> Result<WithId<R::Model>>
where
    <R::Model as HasId>::IdType: Debug + Clone + Serialize,
{
    let id = row.get_id();
    row.to_model().map(|model| WithId::new(id, model))
}

/// A stored value the model can not represent.
pub(crate) fn invalid_column<E>(why: E) -> DatabaseError
where
    E: std::error::Error + Send + Sync + 'static,
{
    DatabaseError::Other(Box::new(why))
}
