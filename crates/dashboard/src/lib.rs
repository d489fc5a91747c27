//! View-models of the world map dashboard and the client for its backend.
//!
//! The map view places location markers over the world map image, the
//! inspector shows an imported city export and links it to the stored
//! buildings.

pub mod api;
pub mod drawing;
pub mod import;
pub mod inspector;
pub mod map_view;

pub use api::{ApiClient, ApiError};
pub use import::{import_city, ImportError};
pub use inspector::Inspector;
pub use map_view::MapView;
