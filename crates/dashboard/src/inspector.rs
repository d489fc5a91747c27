//! State of the city view: which layout is shown, the imported export and
//! the shapes a user points at.

use std::collections::{HashMap, HashSet};

use model::{
    building::{Building, BuildingUpdate, PoiType},
    city_data::CityData,
    WithId,
};
use serde_json::Value;
use svg::{node::element::Path, Document};
use utility::id::Id;
use watabou::{
    export::WardKey,
    geometry::{Bounds, ViewBox},
    CityExport, ExportError, FeatureKind,
};

use crate::drawing::{self, Highlight, Style};

/// Padding around the export's bounds in the SVG view box.
pub const VIEW_PADDING: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// The hosted generator page.
    #[default]
    Generator,
    /// The imported export drawn locally.
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    /// Only shapes whose building is a point of interest.
    KeyLocations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total_features: usize,
    pub buildings: usize,
    pub roads: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeView {
    pub id: String,
    pub kind: FeatureKind,
    pub path: String,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDetails {
    pub id: String,
    pub kind: String,
    pub name: Option<String>,
    pub ward: Option<String>,
    /// Whether the shape can be marked as a key location.
    pub promotable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCity {
    export: CityExport,
    bounds: Option<Bounds>,
    hovered: Option<String>,
    selected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InspectorState {
    #[default]
    NoData,
    Loaded(LoadedCity),
}

#[derive(Debug, Clone, Default)]
pub struct Inspector {
    state: InspectorState,
    view_mode: ViewMode,
    filter: Filter,
    /// Stored buildings by `watabouId`.
    buildings: HashMap<String, WithId<Building>>,
    /// `watabouId`s of the stored points of interest.
    key_locations: HashSet<String>,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InspectorState {
        &self.state
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, InspectorState::Loaded(_))
    }

    fn loaded(&self) -> Option<&LoadedCity> {
        match &self.state {
            InspectorState::Loaded(city) => Some(city),
            InspectorState::NoData => None,
        }
    }

    fn loaded_mut(&mut self) -> Option<&mut LoadedCity> {
        match &mut self.state {
            InspectorState::Loaded(city) => Some(city),
            InspectorState::NoData => None,
        }
    }

    /// Parses an export file. On success the previous features, hover and
    /// selection are dropped; on failure nothing changes.
    pub fn load_str(&mut self, text: &str) -> Result<Stats, ExportError> {
        let export = text.parse::<CityExport>()?;
        Ok(self.load(export))
    }

    pub fn load_value(&mut self, value: &Value) -> Result<Stats, ExportError> {
        let export = CityExport::from_value(value)?;
        Ok(self.load(export))
    }

    fn load(&mut self, export: CityExport) -> Stats {
        let bounds = export.bounds();
        self.state = InspectorState::Loaded(LoadedCity {
            export,
            bounds,
            hovered: None,
            selected: None,
        });
        let stats = self.stats();
        log::debug!(
            "loaded city export with {} features, {} buildings",
            stats.total_features,
            stats.buildings
        );
        stats
    }

    /// Takes the stored record of the city. Its points of interest define
    /// the key locations, its buildings are the targets of promotions.
    pub fn set_record(&mut self, city_data: &CityData) {
        self.buildings = city_data
            .buildings
            .iter()
            .map(|building| (building.content.watabou_id.clone(), building.clone()))
            .collect();
        self.key_locations = city_data
            .points_of_interest()
            .map(|building| building.content.watabou_id.clone())
            .collect();
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// The interactive view needs an export. Returns the mode in effect.
    pub fn set_view_mode(&mut self, view_mode: ViewMode) -> ViewMode {
        if view_mode == ViewMode::Generator || self.is_loaded() {
            self.view_mode = view_mode;
        }
        self.view_mode
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn stats(&self) -> Stats {
        let Some(city) = self.loaded() else {
            return Stats::default();
        };
        let features = &city.export.features;
        let count = |kind: FeatureKind| {
            features
                .iter()
                .filter(|feature| feature.kind == kind)
                .count()
        };
        Stats {
            total_features: features.len(),
            buildings: count(FeatureKind::Building),
            roads: count(FeatureKind::Road),
        }
    }

    pub fn view_box(&self) -> Option<ViewBox> {
        self.loaded()?
            .bounds
            .map(|bounds| bounds.view_box(VIEW_PADDING))
    }

    fn has_shape(&self, id: &str) -> bool {
        self.loaded()
            .is_some_and(|city| city.export.shapes().iter().any(|shape| shape.id == id))
    }

    /// Unknown ids clear the hover.
    pub fn hover(&mut self, id: Option<&str>) {
        let id = id.filter(|id| self.has_shape(id)).map(str::to_owned);
        if let Some(city) = self.loaded_mut() {
            city.hovered = id;
        }
    }

    /// Returns `false` for unknown ids, leaving the selection as it was.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.has_shape(id) {
            return false;
        }
        if let Some(city) = self.loaded_mut() {
            city.selected = Some(id.to_owned());
        }
        true
    }

    pub fn deselect(&mut self) {
        if let Some(city) = self.loaded_mut() {
            city.selected = None;
        }
    }

    pub fn hovered(&self) -> Option<&str> {
        self.loaded()?.hovered.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.loaded()?.selected.as_deref()
    }

    /// The shapes to draw under the current filter, in export order.
    pub fn shapes(&self) -> Vec<ShapeView> {
        let Some(city) = self.loaded() else {
            return vec![];
        };
        city.export
            .shapes()
            .iter()
            .filter(|shape| match self.filter {
                Filter::All => true,
                Filter::KeyLocations => self.key_locations.contains(&shape.id),
            })
            .map(|shape| {
                let highlight = if city.selected.as_deref() == Some(shape.id.as_str()) {
                    Highlight::Selected
                } else if city.hovered.as_deref() == Some(shape.id.as_str()) {
                    Highlight::Hovered
                } else {
                    Highlight::None
                };
                ShapeView {
                    id: shape.id.clone(),
                    kind: shape.kind().clone(),
                    path: drawing::path_string(&drawing::shape_path(shape)),
                    style: drawing::style(shape.kind(), highlight),
                }
            })
            .collect()
    }

    /// Details of the selected shape.
    pub fn selected_details(&self) -> Option<FeatureDetails> {
        let city = self.loaded()?;
        let selected = city.selected.as_deref()?;
        let shapes = city.export.shapes();
        let shape = shapes.iter().find(|shape| shape.id == selected)?;
        Some(FeatureDetails {
            id: shape.id.clone(),
            kind: shape.kind().name().to_owned(),
            name: shape.name.map(str::to_owned),
            ward: shape.ward.map(|ward| match ward {
                WardKey::Number(number) => number.to_string(),
                WardKey::Name(name) => name.clone(),
            }),
            promotable: shape.kind().is_building() && self.buildings.contains_key(&shape.id),
        })
    }

    /// Update that marks the selected building as a point of interest, along
    /// with the id of the stored building it applies to.
    pub fn promote(&self, poi_type: PoiType) -> Option<(Id<Building>, BuildingUpdate)> {
        let details = self.selected_details()?;
        if !details.promotable {
            return None;
        }
        let building = self.buildings.get(&details.id)?;
        Some((building.id.clone(), BuildingUpdate::promote(poi_type)))
    }

    /// The visible shapes as a standalone SVG document.
    pub fn render_svg(&self) -> Option<Document> {
        let view_box = self.view_box()?;
        let document = self.shapes().into_iter().fold(
            Document::new().set("viewBox", view_box.to_string()),
            |document, shape| {
                document.add(
                    Path::new()
                        .set("id", shape.id)
                        .set("d", shape.path)
                        .set("fill", shape.style.fill)
                        .set("stroke", shape.style.stroke)
                        .set("stroke-width", shape.style.stroke_width.to_string())
                        .set("opacity", shape.style.opacity.to_string()),
                )
            },
        );
        Some(document)
    }
}
