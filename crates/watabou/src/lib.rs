//! Integration of the hosted medieval fantasy city generator: links to the
//! generator page, parsing of its JSON export and derivation of buildings and
//! districts from it.

pub mod derive;
pub mod export;
pub mod generator;
pub mod geometry;

pub use derive::{derive, DerivedCity};
pub use export::{CityExport, ExportError, FeatureKind, Shape};
pub use generator::{city_size, GeneratorLink};
