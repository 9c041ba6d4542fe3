//! Mapping between in-memory entities and the configuration document.
//!
//! The document keys every entity by id and stores coordinates as
//! two-element tuples. Over JSON a pair is `[x, y]`; in the persisted YAML
//! file every pair is written as the literal string `(x, y)`. Reading accepts
//! either form, and individual coordinates may be numbers or numeric strings.

use crate::entities::{Door, Line, Region};
use indexmap::IndexMap;
use kurbo::Point;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Configuration mapping errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for configuration mapping.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A coordinate pair as stored in a configuration document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordPair(pub f64, pub f64);

impl From<Point> for CoordPair {
    fn from(p: Point) -> Self {
        Self(p.x, p.y)
    }
}

impl From<CoordPair> for Point {
    fn from(c: CoordPair) -> Self {
        Point::new(c.0, c.1)
    }
}

impl fmt::Display for CoordPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        write_number(f, self.0)?;
        write!(f, ", ")?;
        write_number(f, self.1)?;
        write!(f, ")")
    }
}

/// Write a coordinate the way the persisted files spell numbers: `-0` as
/// `0`, and exponent notation with a signed exponent outside `[1e-6, 1e21)`.
fn write_number(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v == 0.0 {
        return write!(f, "0");
    }
    if v.is_nan() {
        return write!(f, "NaN");
    }
    if v.is_infinite() {
        return write!(f, "{}Infinity", if v < 0.0 { "-" } else { "" });
    }
    let magnitude = v.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return write!(f, "{}", v);
    }
    let scientific = format!("{:e}", v);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => write!(f, "{}e+{}", mantissa, exponent),
        _ => write!(f, "{}", scientific),
    }
}

impl std::str::FromStr for CoordPair {
    type Err = String;

    /// Parse the persisted `(x, y)` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| format!("expected \"(x, y)\", got {:?}", s))?;
        let mut parts = inner.split(',');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(x), Some(y), None) => Ok(Self(parse_coordinate(x)?, parse_coordinate(y)?)),
            _ => Err(format!("expected two coordinates in {:?}", s)),
        }
    }
}

fn parse_coordinate(s: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| format!("coordinate {:?} is not a number", s.trim()))
}

impl Serialize for CoordPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.0, self.1).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CoordPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CoordPairVisitor)
    }
}

struct CoordPairVisitor;

impl<'de> Visitor<'de> for CoordPairVisitor {
    type Value = CoordPair;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a coordinate pair as [x, y] or \"(x, y)\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<CoordPair, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<CoordPair, A::Error> {
        let x: Coordinate = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let y: Coordinate = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(3, &self));
        }
        Ok(CoordPair(x.0, y.0))
    }
}

/// A single coordinate, given as a number or a numeric string.
struct Coordinate(f64);

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CoordinateVisitor;

        impl Visitor<'_> for CoordinateVisitor {
            type Value = Coordinate;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Coordinate, E> {
                Ok(Coordinate(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Coordinate, E> {
                Ok(Coordinate(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Coordinate, E> {
                Ok(Coordinate(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Coordinate, E> {
                parse_coordinate(v).map(Coordinate).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(CoordinateVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEntry {
    pub points: Vec<CoordPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineEntry {
    pub start: CoordPair,
    pub end: CoordPair,
}

/// Doors persist only their walked path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorEntry {
    #[serde(rename = "pathPoints")]
    pub path_points: Vec<CoordPair>,
}

/// The serialized configuration: three id-keyed categories, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub regions: IndexMap<String, RegionEntry>,
    pub lines: IndexMap<String, LineEntry>,
    pub doors: IndexMap<String, DoorEntry>,
}

impl ConfigDocument {
    /// Check if the document holds no entities.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.lines.is_empty() && self.doors.is_empty()
    }

    /// Parse a document from a JSON request body.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Render the persisted YAML form, with every pair written as `(x, y)`.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        serde_yaml::to_string(&PersistedDocument::from(self))
            .map_err(|e| ConfigError::Serialization(e.to_string()))
    }

    /// Parse the persisted YAML form.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Serialize)]
struct PersistedDocument<'a> {
    regions: IndexMap<&'a str, PersistedRegion>,
    lines: IndexMap<&'a str, PersistedLine>,
    doors: IndexMap<&'a str, PersistedDoor>,
}

#[derive(Serialize)]
struct PersistedRegion {
    points: Vec<String>,
}

#[derive(Serialize)]
struct PersistedLine {
    start: String,
    end: String,
}

#[derive(Serialize)]
struct PersistedDoor {
    #[serde(rename = "pathPoints")]
    path_points: Vec<String>,
}

fn render_pairs(pairs: &[CoordPair]) -> Vec<String> {
    pairs.iter().map(ToString::to_string).collect()
}

impl<'a> From<&'a ConfigDocument> for PersistedDocument<'a> {
    fn from(doc: &'a ConfigDocument) -> Self {
        Self {
            regions: doc
                .regions
                .iter()
                .map(|(id, r)| (id.as_str(), PersistedRegion { points: render_pairs(&r.points) }))
                .collect(),
            lines: doc
                .lines
                .iter()
                .map(|(id, l)| {
                    (
                        id.as_str(),
                        PersistedLine {
                            start: l.start.to_string(),
                            end: l.end.to_string(),
                        },
                    )
                })
                .collect(),
            doors: doc
                .doors
                .iter()
                .map(|(id, d)| (id.as_str(), PersistedDoor { path_points: render_pairs(&d.path_points) }))
                .collect(),
        }
    }
}

/// The editor's entity lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySet {
    pub regions: Vec<Region>,
    pub lines: Vec<Line>,
    pub doors: Vec<Door>,
}

fn to_pairs(points: &[Point]) -> Vec<CoordPair> {
    points.iter().copied().map(CoordPair::from).collect()
}

fn to_points(pairs: &[CoordPair]) -> Vec<Point> {
    pairs.iter().copied().map(Point::from).collect()
}

/// Flatten entities into a configuration document.
///
/// Doors keep only their path; their snapped endpoints are not written.
pub fn serialize(entities: &EntitySet) -> ConfigDocument {
    ConfigDocument {
        regions: entities
            .regions
            .iter()
            .map(|r| (r.id.clone(), RegionEntry { points: to_pairs(&r.points) }))
            .collect(),
        lines: entities
            .lines
            .iter()
            .map(|l| {
                (
                    l.id.clone(),
                    LineEntry {
                        start: l.start.into(),
                        end: l.end.into(),
                    },
                )
            })
            .collect(),
        doors: entities
            .doors
            .iter()
            .map(|d| (d.id.clone(), DoorEntry { path_points: to_pairs(&d.path_points) }))
            .collect(),
    }
}

/// Rebuild entities from a configuration document.
///
/// Map keys become entity ids. Doors come back detached: only `id` and
/// `path_points` are restored.
pub fn deserialize(doc: &ConfigDocument) -> EntitySet {
    EntitySet {
        regions: doc
            .regions
            .iter()
            .map(|(id, r)| Region::new(id.clone(), to_points(&r.points)))
            .collect(),
        lines: doc
            .lines
            .iter()
            .map(|(id, l)| Line::new(id.clone(), l.start.into(), l.end.into()))
            .collect(),
        doors: doc
            .doors
            .iter()
            .map(|(id, d)| Door::detached(id.clone(), to_points(&d.path_points)))
            .collect(),
    }
}
