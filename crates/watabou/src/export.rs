use std::{error::Error, fmt, str::FromStr};

use model::Point;
use serde_json::{Map, Value};

use crate::geometry::{self, Bounds};

#[derive(Debug)]
pub enum ExportError {
    Json(serde_json::Error),
    NotAnObject,
    MissingFeatures,
    InvalidFeature { index: usize, reason: String },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(why) => write!(f, "not valid JSON: {}", why),
            Self::NotAnObject => f.write_str("expected a JSON object"),
            Self::MissingFeatures => f.write_str("missing `features` array"),
            Self::InvalidFeature { index, reason } => {
                write!(f, "feature {}: {}", index, reason)
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(why) => Some(why),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(why: serde_json::Error) -> Self {
        Self::Json(why)
    }
}

/// What a feature depicts, taken from `properties.type` or, for the bare
/// geometry objects the generator writes, from the feature id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Building,
    Castle,
    Temple,
    Road,
    Path,
    River,
    Water,
    Wall,
    District,
    Other(String),
}

impl FeatureKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "building" | "buildings" => Self::Building,
            "castle" | "castles" | "citadel" => Self::Castle,
            "temple" | "temples" => Self::Temple,
            "road" | "roads" => Self::Road,
            "path" | "paths" => Self::Path,
            "river" | "rivers" => Self::River,
            "water" => Self::Water,
            "wall" | "walls" => Self::Wall,
            "district" | "districts" | "ward" | "wards" => Self::District,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Building => "building",
            Self::Castle => "castle",
            Self::Temple => "temple",
            Self::Road => "road",
            Self::Path => "path",
            Self::River => "river",
            Self::Water => "water",
            Self::Wall => "wall",
            Self::District => "district",
            Self::Other(name) => name,
        }
    }

    /// Kinds that become building records.
    pub fn is_building(&self) -> bool {
        matches!(self, Self::Building | Self::Castle | Self::Temple)
    }
}

/// Ward a shape belongs to, as written by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WardKey {
    Number(i64),
    Name(String),
}

pub type Ring = Vec<Point>;

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Empty,
    Point(Point),
    LineString(Vec<Point>),
    MultiLineString(Vec<Vec<Point>>),
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
    Collection(Vec<Member>),
    Unsupported(String),
}

/// A geometry inside a collection. The generator writes all ward outlines
/// as one collection and names each of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: Option<String>,
    pub ward: Option<WardKey>,
    pub geometry: Geometry,
}

/// Name and ward a part inherits, innermost first.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Label<'a> {
    name: Option<&'a str>,
    ward: Option<&'a WardKey>,
}

impl Geometry {
    fn collect_parts<'a>(
        &'a self,
        label: Label<'a>,
        parts: &mut Vec<(ShapeGeometry<'a>, Label<'a>)>,
    ) {
        match self {
            Self::LineString(line) => parts.push((ShapeGeometry::Line(line), label)),
            Self::MultiLineString(lines) => {
                parts.extend(lines.iter().map(|line| (ShapeGeometry::Line(line), label)))
            }
            Self::Polygon(rings) => parts.push((ShapeGeometry::Polygon(rings), label)),
            Self::MultiPolygon(polygons) => parts.extend(
                polygons
                    .iter()
                    .map(|rings| (ShapeGeometry::Polygon(rings), label)),
            ),
            Self::Collection(members) => members.iter().for_each(|member| {
                let label = Label {
                    name: member.name.as_deref().or(label.name),
                    ward: member.ward.as_ref().or(label.ward),
                };
                member.geometry.collect_parts(label, parts)
            }),
            Self::Empty | Self::Point(_) | Self::Unsupported(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportFeature {
    pub index: usize,
    pub id: Option<String>,
    pub kind: FeatureKind,
    pub name: Option<String>,
    pub ward: Option<WardKey>,
    pub geometry: Geometry,
}

/// A parsed city export. Parsing is lenient about the shape of each feature
/// but rejects coordinates that are not numbers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CityExport {
    pub features: Vec<ExportFeature>,
}

impl FromStr for CityExport {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_value(&value)
    }
}

impl CityExport {
    pub fn from_value(value: &Value) -> Result<Self, ExportError> {
        let object = value.as_object().ok_or(ExportError::NotAnObject)?;
        let features = object
            .get("features")
            .and_then(Value::as_array)
            .ok_or(ExportError::MissingFeatures)?;
        features
            .iter()
            .enumerate()
            .map(|(index, feature)| {
                parse_feature(index, feature)
                    .map_err(|reason| ExportError::InvalidFeature { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|features| Self { features })
    }

    /// Every polygon and line of the export, in feature order.
    pub fn shapes(&self) -> Vec<Shape<'_>> {
        let mut shapes = vec![];
        for feature in &self.features {
            let label = Label {
                name: feature.name.as_deref(),
                ward: feature.ward.as_ref(),
            };
            let mut parts = vec![];
            feature.geometry.collect_parts(label, &mut parts);
            let single = parts.len() == 1;
            shapes.extend(parts.into_iter().enumerate().map(|(part, (geometry, label))| {
                let id = if single {
                    feature.index.to_string()
                } else {
                    format!("{}.{}", feature.index, part)
                };
                Shape {
                    id,
                    feature,
                    geometry,
                    name: label.name,
                    ward: label.ward,
                }
            }));
        }
        shapes
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let shapes = self.shapes();
        Bounds::of(shapes.iter().flat_map(|shape| shape.vertices()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeGeometry<'a> {
    /// Outer ring first, holes after it.
    Polygon(&'a [Ring]),
    Line(&'a [Point]),
}

/// A single polygon or line of a feature, identified by `"{feature}"` or
/// `"{feature}.{part}"` for features with several parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape<'a> {
    pub id: String,
    pub feature: &'a ExportFeature,
    pub geometry: ShapeGeometry<'a>,
    /// Name of the collection member the part came from, else the feature's.
    pub name: Option<&'a str>,
    pub ward: Option<&'a WardKey>,
}

impl<'a> Shape<'a> {
    pub fn kind(&self) -> &'a FeatureKind {
        &self.feature.kind
    }

    pub fn outer_ring(&self) -> Option<&'a [Point]> {
        match self.geometry {
            ShapeGeometry::Polygon(rings) => rings.first().map(|ring| ring.as_slice()),
            ShapeGeometry::Line(_) => None,
        }
    }

    pub fn vertices(&self) -> Box<dyn Iterator<Item = &'a Point> + 'a> {
        match self.geometry {
            ShapeGeometry::Polygon(rings) => Box::new(rings.iter().flatten()),
            ShapeGeometry::Line(points) => Box::new(points.iter()),
        }
    }

    pub fn centroid(&self) -> Option<Point> {
        match self.geometry {
            ShapeGeometry::Polygon(_) => self.outer_ring().and_then(geometry::centroid),
            ShapeGeometry::Line(points) => geometry::centroid(points),
        }
    }
}

fn parse_feature(index: usize, value: &Value) -> Result<ExportFeature, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "expected an object".to_owned())?;
    let properties = object.get("properties").and_then(Value::as_object);
    let id = object.get("id").and_then(scalar_to_string);
    let kind = properties
        .and_then(|properties| properties.get("type"))
        .and_then(Value::as_str)
        .or(id.as_deref())
        .map(FeatureKind::from_name)
        .unwrap_or_else(|| FeatureKind::Other("feature".to_owned()));
    let geometry = match object.get("type").and_then(Value::as_str) {
        Some("Feature") => match object.get("geometry") {
            None | Some(Value::Null) => Geometry::Empty,
            Some(geometry) => parse_geometry(geometry)?,
        },
        _ => parse_geometry(value)?,
    };
    Ok(ExportFeature {
        index,
        id,
        kind,
        name: lookup(object, properties, "name").and_then(scalar_to_string),
        ward: lookup(object, properties, "ward").and_then(ward_key),
        geometry,
    })
}

/// Reads a key from `properties`, falling back to the feature object itself.
fn lookup<'a>(
    object: &'a Map<String, Value>,
    properties: Option<&'a Map<String, Value>>,
    key: &str,
) -> Option<&'a Value> {
    properties
        .and_then(|properties| properties.get(key))
        .or_else(|| object.get(key))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn ward_key(value: &Value) -> Option<WardKey> {
    match value {
        Value::Number(number) => number.as_i64().map(WardKey::Number),
        Value::String(text) if !text.is_empty() => Some(
            text.parse::<i64>()
                .map(WardKey::Number)
                .unwrap_or_else(|_| WardKey::Name(text.clone())),
        ),
        _ => None,
    }
}

fn parse_geometry(value: &Value) -> Result<Geometry, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "geometry is not an object".to_owned())?;
    let kind = object.get("type").and_then(Value::as_str).unwrap_or("");
    if kind == "GeometryCollection" {
        return object
            .get("geometries")
            .and_then(Value::as_array)
            .ok_or_else(|| "geometry collection without geometries".to_owned())?
            .iter()
            .map(parse_member)
            .collect::<Result<Vec<_>, _>>()
            .map(Geometry::Collection);
    }
    let coordinates = match object.get("coordinates") {
        None | Some(Value::Null) => return Ok(Geometry::Empty),
        Some(coordinates) => coordinates,
    };
    Ok(match kind {
        "Point" => Geometry::Point(point(coordinates)?),
        "LineString" => Geometry::LineString(points(coordinates)?),
        "MultiLineString" => Geometry::MultiLineString(nested(coordinates, points)?),
        "Polygon" => Geometry::Polygon(nested(coordinates, points)?),
        "MultiPolygon" => {
            Geometry::MultiPolygon(nested(coordinates, |rings| nested(rings, points))?)
        }
        other => Geometry::Unsupported(other.to_owned()),
    })
}

fn parse_member(value: &Value) -> Result<Member, String> {
    let geometry = parse_geometry(value)?;
    let (name, ward) = match value.as_object() {
        Some(object) => {
            let properties = object.get("properties").and_then(Value::as_object);
            (
                lookup(object, properties, "name").and_then(scalar_to_string),
                lookup(object, properties, "ward").and_then(ward_key),
            )
        }
        None => (None, None),
    };
    Ok(Member {
        name,
        ward,
        geometry,
    })
}

fn point(value: &Value) -> Result<Point, String> {
    match value.as_array().map(Vec::as_slice) {
        Some([x, y, ..]) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => Ok(Point::new(x, y)),
            _ => Err(format!("coordinate `{}` is not numeric", value)),
        },
        _ => Err(format!("expected a coordinate pair, got `{}`", value)),
    }
}

fn points(value: &Value) -> Result<Vec<Point>, String> {
    nested(value, point)
}

fn nested<T, F>(value: &Value, parse: F) -> Result<Vec<T>, String>
where
    F: Fn(&Value) -> Result<T, String>,
{
    value
        .as_array()
        .ok_or_else(|| format!("expected an array, got `{}`", value))?
        .iter()
        .map(parse)
        .collect()
}
