use indexmap::IndexMap;
use model::{building::Building, city_data::CityMap, district::District};

use crate::{
    export::{CityExport, FeatureKind, Shape, WardKey},
    geometry::{self, Bounds},
};

/// Structured records extracted from a city export.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedCity {
    pub buildings: Vec<Building>,
    pub districts: Vec<District>,
    pub bounds: Option<Bounds>,
}

impl DerivedCity {
    pub fn city_map(&self) -> Option<CityMap> {
        self.bounds.map(|bounds| CityMap {
            width: bounds.width(),
            height: bounds.height(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DistrictKey {
    Ward(WardKey),
    Outline(String),
}

fn district_for(key: &DistrictKey, shape: Option<&Shape<'_>>) -> District {
    let (watabou_ward_id, name) = match key {
        DistrictKey::Ward(WardKey::Number(number)) => (Some(*number), None),
        DistrictKey::Ward(WardKey::Name(name)) => (None, Some(name.clone())),
        DistrictKey::Outline(_) => (None, None),
    };
    District {
        watabou_ward_id,
        name: shape
            .and_then(|shape| shape.name.map(str::to_owned))
            .or(name),
        description: None,
        buildings: vec![],
    }
}

/// Extracts buildings and districts from an export.
///
/// Every polygon of a building, castle or temple feature becomes one building
/// located at the centroid of its outer ring. Buildings are grouped into
/// districts by their `ward` property; buildings without one are put into the
/// first district outline containing their centroid.
pub fn derive(export: &CityExport) -> DerivedCity {
    let shapes = export.shapes();
    let mut districts: IndexMap<DistrictKey, District> = IndexMap::new();

    let outlines = shapes
        .iter()
        .filter(|shape| *shape.kind() == FeatureKind::District)
        .filter_map(|shape| {
            let key = match shape.ward {
                Some(ward) => DistrictKey::Ward(ward.clone()),
                None => DistrictKey::Outline(shape.id.clone()),
            };
            shape.outer_ring().map(|ring| (key, shape, ring))
        })
        .collect::<Vec<_>>();

    let mut buildings = vec![];
    for shape in shapes.iter().filter(|shape| shape.kind().is_building()) {
        let (Some(_), Some(centroid)) = (shape.outer_ring(), shape.centroid()) else {
            continue;
        };
        let key = match shape.ward {
            Some(ward) => Some(DistrictKey::Ward(ward.clone())),
            None => outlines
                .iter()
                .find(|(_, _, ring)| geometry::contains(ring, centroid))
                .map(|(key, _, _)| key.clone()),
        };
        if let Some(key) = key {
            districts
                .entry(key.clone())
                .or_insert_with(|| district_for(&key, None))
                .buildings
                .push(shape.id.clone());
        }
        buildings.push(Building::new(
            shape.id.clone(),
            centroid,
            shape.kind().name(),
        ));
    }

    for (key, shape, _) in &outlines {
        let district = districts
            .entry(key.clone())
            .or_insert_with(|| district_for(key, Some(*shape)));
        if district.name.is_none() {
            district.name = shape.name.map(str::to_owned);
        }
    }

    log::debug!(
        "derived {} buildings in {} districts from {} shapes",
        buildings.len(),
        districts.len(),
        shapes.len()
    );

    DerivedCity {
        buildings,
        districts: districts.into_values().collect(),
        bounds: export.bounds(),
    }
}

#[cfg(test)]
mod tests {
    use model::Point;
    use serde_json::json;

    use super::*;

    fn export(value: serde_json::Value) -> CityExport {
        CityExport::from_value(&value).unwrap()
    }

    fn square(x: f64, y: f64, size: f64) -> serde_json::Value {
        json!([[[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]])
    }

    #[test]
    fn buildings_sit_at_their_centroid() {
        let city = derive(&export(json!({
            "features": [
                { "type": "Feature", "properties": { "type": "castle" },
                  "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0, 10.0) } },
                { "type": "Feature", "properties": { "type": "road" },
                  "geometry": { "type": "LineString", "coordinates": [[0, 0], [50, 0]] } }
            ]
        })));
        assert_eq!(city.buildings.len(), 1);
        let keep = &city.buildings[0];
        assert_eq!(keep.watabou_id, "0");
        assert_eq!(keep.building_type, "castle");
        assert_eq!(keep.coordinates, Point::new(5.0, 5.0));
        assert!(!keep.is_poi());
        assert_eq!(city.city_map().map(|map| map.width), Some(50.0));
    }

    #[test]
    fn groups_by_ward_property() {
        let city = derive(&export(json!({
            "features": [
                { "type": "Feature", "properties": { "type": "building", "ward": 1 },
                  "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0, 1.0) } },
                { "type": "Feature", "properties": { "type": "building", "ward": "Docks" },
                  "geometry": { "type": "Polygon", "coordinates": square(5.0, 0.0, 1.0) } },
                { "type": "Feature", "properties": { "type": "building", "ward": 1 },
                  "geometry": { "type": "Polygon", "coordinates": square(9.0, 0.0, 1.0) } }
            ]
        })));
        assert_eq!(city.districts.len(), 2);
        assert_eq!(city.districts[0].watabou_ward_id, Some(1));
        assert_eq!(city.districts[0].buildings, vec!["0", "2"]);
        assert_eq!(city.districts[1].name.as_deref(), Some("Docks"));
        assert_eq!(city.districts[1].buildings, vec!["1"]);
    }

    #[test]
    fn wardless_buildings_fall_into_outlines() {
        let city = derive(&export(json!({
            "features": [
                { "type": "Feature", "properties": { "type": "district", "name": "Old Town" },
                  "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0, 100.0) } },
                { "type": "MultiPolygon", "id": "buildings",
                  "coordinates": [square(10.0, 10.0, 2.0), square(200.0, 200.0, 2.0)] }
            ]
        })));
        assert_eq!(city.buildings.len(), 2);
        assert_eq!(city.districts.len(), 1);
        assert_eq!(city.districts[0].name.as_deref(), Some("Old Town"));
        assert_eq!(city.districts[0].buildings, vec!["1.0"]);
    }

    #[test]
    fn collection_outlines_keep_their_own_names() {
        let city = derive(&export(json!({
            "features": [
                { "type": "GeometryCollection", "id": "districts",
                  "geometries": [
                      { "type": "Polygon", "name": "Craftsmen's Quarter",
                        "coordinates": square(0.0, 0.0, 50.0) },
                      { "type": "Polygon", "name": "Temple Hill",
                        "coordinates": square(100.0, 0.0, 50.0) }
                  ] },
                { "type": "MultiPolygon", "id": "buildings",
                  "coordinates": [square(110.0, 10.0, 2.0), square(10.0, 10.0, 2.0)] }
            ]
        })));
        let districts = city
            .districts
            .iter()
            .map(|district| (district.name.as_deref(), district.buildings.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            districts,
            vec![
                (Some("Temple Hill"), vec!["1.0".to_owned()]),
                (Some("Craftsmen's Quarter"), vec!["1.1".to_owned()]),
            ]
        );
    }

    #[test]
    fn derivation_is_stable() {
        let value = json!({
            "features": [
                { "type": "MultiPolygon", "id": "buildings",
                  "coordinates": [square(0.0, 0.0, 2.0), square(4.0, 0.0, 2.0)] }
            ]
        });
        assert_eq!(derive(&export(value.clone())), derive(&export(value)));
    }

    #[test]
    fn empty_export_derives_nothing() {
        let city = derive(&export(json!({ "features": [] })));
        assert!(city.buildings.is_empty());
        assert!(city.districts.is_empty());
        assert_eq!(city.city_map(), None);
    }
}
