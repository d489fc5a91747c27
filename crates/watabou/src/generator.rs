use chrono::Utc;
use model::location::Location;
use url::form_urlencoded;

/// Hosted generator page. Appending `export=json` makes it download the
/// generated city instead of showing it.
pub const GENERATOR_URL: &str = "https://watabou.github.io/city-generator/";

pub const MIN_CITY_SIZE: u64 = 10;
pub const MAX_CITY_SIZE: u64 = 60;

/// Generator size parameter for a population:
/// `clamp(floor(sqrt(population / 15)), 10, 60)`.
pub fn city_size(population: u64) -> u64 {
    let size = (population as f64 / 15.0).sqrt().floor() as u64;
    size.clamp(MIN_CITY_SIZE, MAX_CITY_SIZE)
}

/// Seed used for locations without a stored one. Reopening such a location
/// yields a different layout every time.
fn fallback_seed() -> i64 {
    Utc::now().timestamp_millis()
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_owned()
}

/// Link to the generator page for one location.
#[derive(Debug, Clone)]
pub struct GeneratorLink<'a> {
    location: &'a Location,
    seed: i64,
    export: bool,
}

impl<'a> GeneratorLink<'a> {
    pub fn new(location: &'a Location) -> Self {
        let seed = location.seed.unwrap_or_else(|| {
            log::debug!(
                "location `{}` has no stored seed, using the current time",
                location.name
            );
            fallback_seed()
        });
        Self {
            location,
            seed,
            export: false,
        }
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Requests the JSON export of the same city instead of the interactive page.
    pub fn export_json(mut self) -> Self {
        self.export = true;
        self
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let location = self.location;
        let mut params = vec![
            ("size", city_size(location.population).to_string()),
            ("seed", self.seed.to_string()),
            ("name", location.name.clone()),
            ("population", location.population.to_string()),
            ("citadel", flag(location.citadel)),
            ("urban_castle", flag(location.citadel)),
            ("plaza", flag(location.plaza)),
            ("temple", flag(location.temple)),
            ("walls", flag(location.walls)),
            ("shantytown", flag(location.shantytown)),
            ("coast", flag(location.port)),
            ("river", flag(location.is_river_city())),
            ("greens", flag(false)),
            ("hub", flag(true)),
        ];
        if self.export {
            params.push(("export", "json".to_owned()));
        }
        params
    }

    pub fn url(&self) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params())
            .finish();
        format!("{}?{}", GENERATOR_URL, query)
    }
}

#[cfg(test)]
mod tests {
    use model::{location::SettlementType, ExampleData, Point};

    use super::*;

    fn town(population: u64) -> Location {
        Location {
            azgaar_id: 3,
            name: "Low Ashby".to_owned(),
            settlement_type: SettlementType::Town,
            coordinates: Point::new(10.0, 20.0),
            population,
            description: None,
            city_type: Some("Naval".to_owned()),
            citadel: false,
            plaza: true,
            walls: false,
            shantytown: true,
            temple: false,
            port: true,
            seed: Some(4242),
        }
    }

    #[test]
    fn size_follows_square_root_rule() {
        assert_eq!(city_size(29245), 44);
        assert_eq!(city_size(0), 10);
        assert_eq!(city_size(1500), 10);
        assert_eq!(city_size(1515), 10);
        assert_eq!(city_size(15 * 11 * 11), 11);
        assert_eq!(city_size(15 * 11 * 11 - 1), 10);
        assert_eq!(city_size(54000), 60);
        assert_eq!(city_size(10_000_000), 60);
    }

    #[test]
    fn size_is_clamped_for_all_populations() {
        for population in (0..200_000).step_by(997) {
            let expected = ((population as f64 / 15.0).sqrt().floor() as u64).clamp(10, 60);
            assert_eq!(city_size(population), expected);
        }
    }

    #[test]
    fn builds_interactive_url() {
        let location = town(29245);
        let url = GeneratorLink::new(&location).url();
        assert_eq!(
            url,
            "https://watabou.github.io/city-generator/?size=44&seed=4242&name=Low+Ashby\
             &population=29245&citadel=0&urban_castle=0&plaza=1&temple=0&walls=0\
             &shantytown=1&coast=1&river=0&greens=0&hub=1"
        );
    }

    #[test]
    fn export_variant_appends_flag() {
        let location = Location::example_data();
        let url = GeneratorLink::new(&location).export_json().url();
        assert!(url.ends_with("&hub=1&export=json"));
        assert!(url.contains("river=1"));
        assert!(url.contains("citadel=1&urban_castle=1"));
    }

    #[test]
    fn stored_seed_is_reused() {
        let location = town(900);
        let first = GeneratorLink::new(&location);
        let second = GeneratorLink::new(&location);
        assert_eq!(first.seed(), 4242);
        assert_eq!(first.url(), second.url());
    }

    #[test]
    fn missing_seed_falls_back_to_clock() {
        let mut location = town(900);
        location.seed = None;
        let before = Utc::now().timestamp_millis();
        let link = GeneratorLink::new(&location);
        assert!(link.seed() >= before);
        let pinned = link.with_seed(1).url();
        assert!(pinned.contains("seed=1&"));
    }
}
