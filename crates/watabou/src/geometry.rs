use std::fmt;

use geo::{BoundingRect, Contains, Coord, LineString, MultiPoint, Polygon, Rect};
use model::Point;

fn coord(point: &Point) -> Coord {
    Coord {
        x: point.x,
        y: point.y,
    }
}

/// Axis aligned bounding box of an export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds(Rect);

impl Bounds {
    /// Bounds of all given points, `None` if there are none.
    pub fn of<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        points
            .into_iter()
            .map(|point| geo::Point::from(coord(point)))
            .collect::<MultiPoint>()
            .bounding_rect()
            .map(Self)
    }

    pub fn min(&self) -> Point {
        let min = self.0.min();
        Point::new(min.x, min.y)
    }

    pub fn max(&self) -> Point {
        let max = self.0.max();
        Point::new(max.x, max.y)
    }

    pub fn width(&self) -> f64 {
        self.0.width()
    }

    pub fn height(&self) -> f64 {
        self.0.height()
    }

    pub fn view_box(&self, padding: f64) -> ViewBox {
        let min = self.0.min();
        ViewBox {
            x: min.x - padding,
            y: min.y - padding,
            width: self.width() + padding * 2.0,
            height: self.height() + padding * 2.0,
        }
    }
}

/// An SVG `viewBox`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

/// Drops the closing vertex of a ring that repeats its first vertex.
fn open_ring(ring: &[Point]) -> &[Point] {
    match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// Average of the distinct vertices of a ring.
pub fn centroid(ring: &[Point]) -> Option<Point> {
    let ring = open_ring(ring);
    if ring.is_empty() {
        return None;
    }
    let count = ring.len() as f64;
    let (x, y) = ring
        .iter()
        .fold((0.0, 0.0), |(x, y), point| (x + point.x, y + point.y));
    Some(Point::new(x / count, y / count))
}

/// Whether the point lies inside the ring. Points on the outline are
/// outside.
pub fn contains(ring: &[Point], point: Point) -> bool {
    if open_ring(ring).len() < 3 {
        return false;
    }
    let exterior = ring.iter().map(coord).collect::<LineString>();
    Polygon::new(exterior, vec![]).contains(&geo::Point::from(coord(&point)))
}
