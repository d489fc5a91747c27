use model::{location::Location, WithId};
use utility::id::Id;
use watabou::GeneratorLink;

/// Width in pixels of the world map image the location coordinates refer to.
pub const REFERENCE_WIDTH: f64 = 1690.0;

pub const CAPITAL_COLOR: &str = "#ffd700";
pub const TOWN_COLOR: &str = "#ff4444";

/// A clickable dot on the map, positioned relative to the image's top left
/// corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: Id<Location>,
    pub name: String,
    pub left: f64,
    pub top: f64,
    pub color: &'static str,
    pub selected: bool,
    pub hovered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPanel {
    pub name: String,
    pub settlement_type: &'static str,
    pub population: String,
    /// Generator page showing the city of the location.
    pub generator_url: String,
}

/// `29245` → `"29,245"`.
pub fn format_population(population: u64) -> String {
    let digits = population.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    formatted
}

/// State of the world map: the locations, the size the image is shown at
/// and the selected and hovered city.
#[derive(Debug, Clone, Default)]
pub struct MapView {
    locations: Vec<WithId<Location>>,
    displayed_width: Option<f64>,
    selected: Option<Id<Location>>,
    hovered: Option<Id<Location>>,
}

impl MapView {
    pub fn new(locations: Vec<WithId<Location>>) -> Self {
        Self {
            locations,
            ..Default::default()
        }
    }

    pub fn locations(&self) -> &[WithId<Location>] {
        &self.locations
    }

    /// Replaces the locations. Selection and hover survive if their location
    /// is still present.
    pub fn set_locations(&mut self, locations: Vec<WithId<Location>>) {
        self.locations = locations;
        if self.selected.as_ref().is_some_and(|id| self.location(id).is_none()) {
            self.selected = None;
        }
        if self.hovered.as_ref().is_some_and(|id| self.location(id).is_none()) {
            self.hovered = None;
        }
    }

    /// The image finished loading at the given displayed width.
    pub fn image_loaded(&mut self, displayed_width: f64) {
        self.resized(displayed_width);
    }

    pub fn resized(&mut self, displayed_width: f64) {
        if displayed_width.is_finite() && displayed_width > 0.0 {
            self.displayed_width = Some(displayed_width);
        } else {
            log::warn!("ignoring map width {}", displayed_width);
        }
    }

    /// `None` until the image has loaded.
    pub fn scale(&self) -> Option<f64> {
        self.displayed_width.map(|width| width / REFERENCE_WIDTH)
    }

    pub fn markers(&self) -> Vec<Marker> {
        let Some(scale) = self.scale() else {
            return vec![];
        };
        self.locations
            .iter()
            .map(|location| Marker {
                id: location.id.clone(),
                name: location.content.name.clone(),
                left: location.content.coordinates.x * scale,
                top: location.content.coordinates.y * scale,
                color: if location.content.is_capital() {
                    CAPITAL_COLOR
                } else {
                    TOWN_COLOR
                },
                selected: self.selected.as_ref() == Some(&location.id),
                hovered: self.hovered.as_ref() == Some(&location.id),
            })
            .collect()
    }

    fn location(&self, id: &Id<Location>) -> Option<&WithId<Location>> {
        self.locations.iter().find(|location| &location.id == id)
    }

    /// Returns `false` for unknown ids, leaving the selection as it was.
    pub fn select(&mut self, id: &Id<Location>) -> bool {
        if self.location(id).is_none() {
            return false;
        }
        self.selected = Some(id.clone());
        true
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn hover(&mut self, id: Option<&Id<Location>>) {
        self.hovered = id.filter(|id| self.location(id).is_some()).cloned();
    }

    pub fn selected(&self) -> Option<&WithId<Location>> {
        self.selected.as_ref().and_then(|id| self.location(id))
    }

    pub fn hovered(&self) -> Option<&WithId<Location>> {
        self.hovered.as_ref().and_then(|id| self.location(id))
    }

    pub fn info_panel(&self) -> Option<InfoPanel> {
        self.selected().map(|location| InfoPanel {
            name: location.content.name.clone(),
            settlement_type: location.content.settlement_type.as_str(),
            population: format_population(location.content.population),
            generator_url: GeneratorLink::new(&location.content).url(),
        })
    }
}

#[cfg(test)]
mod tests {
    use model::{location::SettlementType, ExampleData, Point};

    use super::*;

    fn view() -> MapView {
        let capital = Location::example_data();
        let town = Location {
            name: "Low Ashby".to_owned(),
            settlement_type: SettlementType::Town,
            coordinates: Point::new(845.0, 169.0),
            population: 1200,
            ..Location::example_data()
        };
        MapView::new(vec![
            WithId::new(Id::from("a"), capital),
            WithId::new(Id::from("b"), town),
        ])
    }

    #[test]
    fn no_markers_before_image_loads() {
        let view = view();
        assert_eq!(view.scale(), None);
        assert!(view.markers().is_empty());
    }

    #[test]
    fn markers_follow_displayed_width() {
        let mut view = view();
        view.image_loaded(1690.0);
        let marker = &view.markers()[1];
        assert_eq!((marker.left, marker.top), (845.0, 169.0));
        assert_eq!(marker.color, TOWN_COLOR);

        view.resized(845.0);
        let marker = &view.markers()[1];
        assert_eq!((marker.left, marker.top), (845.0 * 0.5, 169.0 * 0.5));
        assert_eq!(view.markers()[0].color, CAPITAL_COLOR);
    }

    #[test]
    fn marker_position_is_coordinate_times_scale() {
        let mut view = view();
        for width in [320.0, 1024.0, 1690.0, 2560.0] {
            view.resized(width);
            for (marker, location) in view.markers().iter().zip(view.locations()) {
                let scale = width / REFERENCE_WIDTH;
                assert_eq!(marker.left, location.content.coordinates.x * scale);
                assert_eq!(marker.top, location.content.coordinates.y * scale);
            }
        }
    }

    #[test]
    fn invalid_width_keeps_previous_scale() {
        let mut view = view();
        view.resized(0.0);
        assert_eq!(view.scale(), None);
        view.resized(1690.0);
        view.resized(f64::NAN);
        assert_eq!(view.scale(), Some(1.0));
    }

    #[test]
    fn selection_and_info_panel() {
        let mut view = view();
        assert!(view.info_panel().is_none());
        assert!(!view.select(&Id::from("missing")));
        assert!(view.select(&Id::from("b")));
        view.hover(Some(&Id::from("a")));
        let panel = view.info_panel().unwrap();
        assert_eq!(panel.name, "Low Ashby");
        assert_eq!(panel.settlement_type, "Town");
        assert_eq!(panel.population, "1,200");
        assert!(panel.generator_url.starts_with(
            "https://watabou.github.io/city-generator/?size=10&seed=7311200012&name=Low+Ashby&"
        ));
        assert_eq!(view.hovered().unwrap().content.name, "Vasholm");

        view.resized(1690.0);
        let markers = view.markers();
        assert!(markers[1].selected && !markers[1].hovered);
        assert!(markers[0].hovered && !markers[0].selected);

        view.set_locations(vec![]);
        assert!(view.selected().is_none());
        assert!(view.hovered().is_none());
    }

    #[test]
    fn population_has_thousands_separators() {
        assert_eq!(format_population(0), "0");
        assert_eq!(format_population(999), "999");
        assert_eq!(format_population(1000), "1,000");
        assert_eq!(format_population(29245), "29,245");
        assert_eq!(format_population(1234567), "1,234,567");
    }
}
