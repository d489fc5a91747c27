//! Drawing helpers for the city inspector.

use model::Point;
use svg::node::{element::path::Data, Value};
use watabou::{export::ShapeGeometry, FeatureKind, Shape};

pub const SELECTED_STROKE: &str = "#ff6b00";
pub const HOVERED_STROKE: &str = "#ff9933";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    None,
    Hovered,
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub fill: &'static str,
    pub stroke: &'static str,
    pub stroke_width: f64,
    pub opacity: f64,
}

pub fn fill_color(kind: &FeatureKind) -> &'static str {
    match kind {
        FeatureKind::Building => "#d4c5b9",
        FeatureKind::Castle => "#8b7355",
        FeatureKind::Temple => "#9b8b7e",
        FeatureKind::Road => "#ffffff",
        FeatureKind::Path => "#e8dcc8",
        FeatureKind::River | FeatureKind::Water => "#7ea5c4",
        FeatureKind::Wall => "#4a4a4a",
        FeatureKind::District | FeatureKind::Other(_) => "#c4b5a0",
    }
}

pub fn stroke_color(kind: &FeatureKind) -> &'static str {
    match kind {
        FeatureKind::Wall => "#2a2a2a",
        _ => "#8b7d6b",
    }
}

/// Selection wins over hovering.
pub fn style(kind: &FeatureKind, highlight: Highlight) -> Style {
    let (stroke, stroke_width) = match highlight {
        Highlight::Selected => (SELECTED_STROKE, 2.0),
        Highlight::Hovered => (HOVERED_STROKE, 1.5),
        Highlight::None => (stroke_color(kind), 0.5),
    };
    Style {
        fill: fill_color(kind),
        stroke,
        stroke_width,
        opacity: if *kind == FeatureKind::Building { 0.9 } else { 1.0 },
    }
}

fn path_data(points: &[Point], closed: bool) -> Data {
    let Some((first, rest)) = points.split_first() else {
        return Data::new();
    };
    let data = rest.iter().fold(
        Data::new().move_to((first.x as f32, first.y as f32)),
        |data, point| data.line_to((point.x as f32, point.y as f32)),
    );
    if closed {
        data.close()
    } else {
        data
    }
}

/// A closed path over the outer ring.
pub fn polygon_path(ring: &[Point]) -> Data {
    path_data(ring, true)
}

pub fn line_path(points: &[Point]) -> Data {
    path_data(points, false)
}

pub fn shape_path(shape: &Shape<'_>) -> Data {
    match shape.geometry {
        ShapeGeometry::Polygon(_) => shape
            .outer_ring()
            .map(polygon_path)
            .unwrap_or_else(Data::new),
        ShapeGeometry::Line(points) => line_path(points),
    }
}

/// The `d` attribute a path is written with.
pub fn path_string(data: &Data) -> String {
    Value::from(data.clone()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 2.5),
        ]
    }

    #[test]
    fn polygon_is_closed() {
        assert_eq!(path_string(&polygon_path(&ring())), "M0,0 L4,0 L4,2.5 z");
        assert_eq!(path_string(&polygon_path(&[])), "");
    }

    #[test]
    fn line_stays_open() {
        assert_eq!(path_string(&line_path(&ring())), "M0,0 L4,0 L4,2.5");
    }

    #[test]
    fn colors_by_kind() {
        assert_eq!(fill_color(&FeatureKind::Castle), "#8b7355");
        assert_eq!(fill_color(&FeatureKind::Water), "#7ea5c4");
        assert_eq!(fill_color(&FeatureKind::Other("fields".to_owned())), "#c4b5a0");
        assert_eq!(stroke_color(&FeatureKind::Wall), "#2a2a2a");
        assert_eq!(stroke_color(&FeatureKind::Road), "#8b7d6b");
    }

    #[test]
    fn highlight_changes_stroke() {
        let plain = style(&FeatureKind::Building, Highlight::None);
        assert_eq!((plain.stroke, plain.stroke_width), ("#8b7d6b", 0.5));
        assert_eq!(plain.opacity, 0.9);
        let hovered = style(&FeatureKind::Wall, Highlight::Hovered);
        assert_eq!((hovered.stroke, hovered.stroke_width), (HOVERED_STROKE, 1.5));
        assert_eq!(hovered.opacity, 1.0);
        let selected = style(&FeatureKind::Road, Highlight::Selected);
        assert_eq!((selected.stroke, selected.stroke_width), (SELECTED_STROKE, 2.0));
    }
}
