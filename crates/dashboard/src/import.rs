use std::{error::Error, fmt};

use model::location::Location;
use serde_json::Value;
use utility::id::Id;
use watabou::ExportError;

use crate::{
    api::{ApiClient, ApiError},
    inspector::{Inspector, Stats, ViewMode},
};

#[derive(Debug)]
pub enum ImportError {
    /// The file is not a city export.
    Parse(ExportError),
    /// The export could not be stored.
    Save(ApiError),
    /// The export was stored but no buildings could be derived from it.
    Derive(ApiError),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(why) => write!(f, "Could not read city export: {}", why),
            Self::Save(why) => write!(f, "Could not save city data: {}", why),
            Self::Derive(why) => write!(f, "Could not derive buildings: {}", why),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(why) => Some(why),
            Self::Save(why) | Self::Derive(why) => Some(why),
        }
    }
}

impl From<ExportError> for ImportError {
    fn from(value: ExportError) -> Self {
        Self::Parse(value)
    }
}

impl From<ApiError> for ImportError {
    fn from(value: ApiError) -> Self {
        Self::Save(value)
    }
}

/// Loads an export file into the inspector, stores it for the location,
/// derives its buildings and districts and switches to the interactive view.
/// The derived record backs promotions and the key-location filter.
///
/// A file that does not parse leaves the inspector untouched. When saving
/// fails the export stays loaded but the view is not switched. When deriving
/// fails the saved export is shown without stored buildings.
pub async fn import_city(
    api: &ApiClient,
    inspector: &mut Inspector,
    location_id: &Id<Location>,
    text: &str,
) -> Result<Stats, ImportError> {
    let raw_data = serde_json::from_str::<Value>(text).map_err(ExportError::from)?;
    let stats = inspector.load_value(&raw_data)?;
    let saved = api.save_city_data(location_id, &raw_data).await?;
    inspector.set_record(&saved.content);
    inspector.set_view_mode(ViewMode::Interactive);
    let derived = api
        .derive_city_data(location_id)
        .await
        .map_err(ImportError::Derive)?;
    inspector.set_record(&derived.content);
    log::info!(
        "imported city with {} features and {} buildings for location `{}`",
        stats.total_features,
        derived.content.buildings.len(),
        location_id
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use model::building::PoiType;
    use serde_json::json;

    use super::*;
    use crate::{api::tests::serve, inspector::InspectorState};

    fn file(kind: &str) -> String {
        json!({
            "features": [
                { "type": "Feature", "properties": { "type": kind },
                  "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1]]] } },
                { "type": "Feature", "properties": { "type": "road" },
                  "geometry": { "type": "LineString", "coordinates": [[0, 3], [9, 3]] } }
            ]
        })
        .to_string()
    }

    #[tokio::test]
    async fn import_saves_and_switches_view() {
        let (api, location_id) = serve().await;
        let mut inspector = Inspector::new();
        let stats = import_city(&api, &mut inspector, &location_id, &file("building"))
            .await
            .unwrap();
        assert_eq!(stats.total_features, 2);
        assert_eq!(stats.buildings, 1);
        assert_eq!(inspector.view_mode(), ViewMode::Interactive);
        let stored = api.get_city_data(&location_id).await.unwrap().unwrap();
        assert_eq!(stored.content.raw_data.to_string(), file("building"));
    }

    #[tokio::test]
    async fn imported_buildings_can_be_promoted() {
        let (api, location_id) = serve().await;
        let mut inspector = Inspector::new();
        import_city(&api, &mut inspector, &location_id, &file("building"))
            .await
            .unwrap();
        let stored = api.get_city_data(&location_id).await.unwrap().unwrap();
        assert_eq!(stored.content.buildings.len(), 1);

        assert!(inspector.select("0"));
        let (building_id, update) = inspector.promote(PoiType::Shop).unwrap();
        assert_eq!(building_id, stored.content.buildings[0].id);
        let promoted = api
            .update_building(&location_id, &building_id, &update)
            .await
            .unwrap();
        assert!(promoted.content.is_poi());
    }

    #[tokio::test]
    async fn second_import_replaces_features() {
        let (api, location_id) = serve().await;
        let mut inspector = Inspector::new();
        import_city(&api, &mut inspector, &location_id, &file("building"))
            .await
            .unwrap();
        inspector.select("0");
        let stats = import_city(&api, &mut inspector, &location_id, &file("castle"))
            .await
            .unwrap();
        assert_eq!(stats.buildings, 0);
        assert_eq!(inspector.selected(), None);
        assert_eq!(inspector.shapes()[0].kind.name(), "castle");
    }

    #[tokio::test]
    async fn unparseable_file_changes_nothing() {
        let (api, location_id) = serve().await;
        let mut inspector = Inspector::new();
        let error = import_city(&api, &mut inspector, &location_id, "<svg/>")
            .await
            .unwrap_err();
        assert!(matches!(error, ImportError::Parse(_)));
        assert_eq!(*inspector.state(), InspectorState::NoData);
        assert_eq!(api.get_city_data(&location_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_save_is_reported() {
        let (api, _) = serve().await;
        let mut inspector = Inspector::new();
        let error = import_city(&api, &mut inspector, &Id::from("nowhere"), &file("building"))
            .await
            .unwrap_err();
        assert!(matches!(error, ImportError::Save(_)));
        assert_eq!(error.to_string(), "Could not save city data: Location not found");
        assert_eq!(inspector.view_mode(), ViewMode::Generator);
    }
}
