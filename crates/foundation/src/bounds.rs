use std::fmt;
use std::str::FromStr;

/// Geographic rectangle in WGS84 degrees.
///
/// Field order follows the Overpass bbox convention (south, west, north, east),
/// which is also the order used by `Display` / `FromStr`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Degenerate bounds covering a single `(lon, lat)` point.
    pub fn point(lon: f64, lat: f64) -> Self {
        Self::new(lat, lon, lat, lon)
    }

    /// Smallest bounds covering every `(lon, lat)` point, or `None` for an empty input.
    pub fn from_lon_lats(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut out: Option<Self> = None;
        for (lon, lat) in points {
            match out.as_mut() {
                Some(b) => b.extend(lon, lat),
                None => out = Some(Self::point(lon, lat)),
            }
        }
        out
    }

    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.south = self.south.min(lat);
        self.north = self.north.max(lat);
        self.west = self.west.min(lon);
        self.east = self.east.max(lon);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.south.min(other.south),
            self.west.min(other.west),
            self.north.max(other.north),
            self.east.max(other.east),
        )
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }

    /// `(lon, lat)` of the rectangle's center.
    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * (self.west + self.east),
            0.5 * (self.south + self.north),
        )
    }

    pub fn is_valid(&self) -> bool {
        [self.south, self.west, self.north, self.east]
            .iter()
            .all(|v| v.is_finite())
            && self.south <= self.north
            && self.west <= self.east
            && (-90.0..=90.0).contains(&self.south)
            && (-90.0..=90.0).contains(&self.north)
    }
}

impl fmt::Display for GeoBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBoundsError(pub String);

impl fmt::Display for ParseBoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid bounds (expected south,west,north,east): {}", self.0)
    }
}

impl std::error::Error for ParseBoundsError {}

impl FromStr for GeoBounds {
    type Err = ParseBoundsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| ParseBoundsError(s.to_string()))?;
        let [south, west, north, east] = parts[..] else {
            return Err(ParseBoundsError(s.to_string()));
        };
        let b = Self::new(south, west, north, east);
        if !b.is_valid() {
            return Err(ParseBoundsError(s.to_string()));
        }
        Ok(b)
    }
}
