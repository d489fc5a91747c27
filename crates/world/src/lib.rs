use std::{error::Error, fmt};

pub mod client;
pub mod database;
#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use client::Client;

/// The kind of record a request could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Location,
    CityData,
    Building,
    District,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Location => "Location",
            Self::CityData => "City data",
            Self::Building => "Building",
            Self::District => "District",
        })
    }
}

#[derive(Debug)]
pub enum RequestError {
    NotFound(Subject),
    /// The request was understood but its content is not acceptable.
    Invalid(String),
    Other(Box<dyn Error + Send + Sync>),
}

impl RequestError {
    pub fn other<T: Error + Send + Sync + 'static>(why: T) -> Self {
        Self::Other(Box::new(why))
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(subject) => write!(f, "{} not found", subject),
            Self::Invalid(reason) => f.write_str(reason),
            Self::Other(why) => write!(f, "{}", why),
        }
    }
}

impl Error for RequestError {}

impl From<database::DatabaseError> for RequestError {
    fn from(value: database::DatabaseError) -> Self {
        match value {
            database::DatabaseError::Other(why) => Self::Other(why),
            not_found @ database::DatabaseError::NotFound => Self::other(not_found),
        }
    }
}

impl From<model::InvalidUpdate> for RequestError {
    fn from(value: model::InvalidUpdate) -> Self {
        Self::Invalid(value.0)
    }
}

pub type RequestResult<O> = Result<O, RequestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_missing_record() {
        assert_eq!(
            RequestError::NotFound(Subject::CityData).to_string(),
            "City data not found"
        );
        assert_eq!(
            RequestError::NotFound(Subject::Building).to_string(),
            "Building not found"
        );
        assert_eq!(
            RequestError::from(model::InvalidUpdate("nope".to_owned())).to_string(),
            "nope"
        );
    }
}
