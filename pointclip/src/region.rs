use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{ClipError, ClipResult};

/// An axis-aligned box in the point files' native coordinate frame.
///
/// Construction always goes through [`Region::from_bounds`] or
/// [`Region::from_corners`], so a `Region` value is finite and ordered
/// (`min_x <= max_x`, `min_y <= max_y`). It is `Copy` and never mutated
/// once a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Region {
    /// Builds a region from min/max per axis. Reversed pairs are swapped.
    pub fn from_bounds(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> ClipResult<Self> {
        for (name, value) in [
            ("min_x", min_x),
            ("max_x", max_x),
            ("min_y", min_y),
            ("max_y", max_y),
        ] {
            if !value.is_finite() {
                return Err(ClipError::invalid_region(format!(
                    "{} is not a finite number ({})",
                    name, value
                )));
            }
        }

        Ok(Self {
            min_x: min_x.min(max_x),
            max_x: min_x.max(max_x),
            min_y: min_y.min(max_y),
            max_y: min_y.max(max_y),
        })
    }

    /// Builds a region from two opposite corners given in any order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> ClipResult<Self> {
        Self::from_bounds(a.0, b.0, a.1, b.1)
    }

    /// Parses `"x1,y1,x2,y2"` (two opposite corners).
    pub fn parse_corners(s: &str) -> ClipResult<Self> {
        let [x1, y1, x2, y2] = parse_four(s)?;
        Self::from_corners((x1, y1), (x2, y2))
    }

    /// Inclusive containment test. NaN coordinates never match.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn min_x(&self) -> f64 {
        self.min_x
    }

    pub fn max_x(&self) -> f64 {
        self.max_x
    }

    pub fn min_y(&self) -> f64 {
        self.min_y
    }

    pub fn max_y(&self) -> f64 {
        self.max_y
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] x [{}, {}]",
            self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}

/// Parses `"minX,maxX,minY,maxY"`. Semicolons are accepted as separators too.
impl FromStr for Region {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [min_x, max_x, min_y, max_y] = parse_four(s)?;
        Self::from_bounds(min_x, max_x, min_y, max_y)
    }
}

fn parse_four(s: &str) -> ClipResult<[f64; 4]> {
    let parts: Vec<&str> = s
        .split([',', ';'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.len() != 4 {
        return Err(ClipError::invalid_region(format!(
            "expected 4 numbers, got {} in '{}'",
            parts.len(),
            s
        )));
    }

    let mut values = [0.0; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|e| ClipError::invalid_region(format!("'{}': {}", part, e)))?;
    }
    Ok(values)
}

/// Region as written in a configuration file.
///
/// ```yaml
/// region:
///   bounds: { min_x: 450000, max_x: 460000, min_y: 100000, max_y: 110000 }
/// ```
///
/// or
///
/// ```yaml
/// region:
///   corners: { x1: 460000, y1: 100000, x2: 450000, y2: 110000 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSpec {
    Bounds {
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
    },
    Corners {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
}

impl RegionSpec {
    /// Normalizes either convention into a canonical [`Region`].
    pub fn into_region(self) -> ClipResult<Region> {
        match self {
            RegionSpec::Bounds {
                min_x,
                max_x,
                min_y,
                max_y,
            } => Region::from_bounds(min_x, max_x, min_y, max_y),
            RegionSpec::Corners { x1, y1, x2, y2 } => Region::from_corners((x1, y1), (x2, y2)),
        }
    }
}

impl From<Region> for RegionSpec {
    fn from(region: Region) -> Self {
        RegionSpec::Bounds {
            min_x: region.min_x,
            max_x: region.max_x,
            min_y: region.min_y,
            max_y: region.max_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Region {
        Region::from_bounds(0.0, 10.0, 0.0, 10.0).unwrap()
    }

    #[test]
    fn test_contains_interior_and_boundary() {
        let region = unit_box();
        assert!(region.contains(5.0, 5.0));

        // Edges
        assert!(region.contains(0.0, 5.0));
        assert!(region.contains(10.0, 5.0));
        assert!(region.contains(5.0, 0.0));
        assert!(region.contains(5.0, 10.0));

        // Corners
        assert!(region.contains(0.0, 0.0));
        assert!(region.contains(0.0, 10.0));
        assert!(region.contains(10.0, 0.0));
        assert!(region.contains(10.0, 10.0));
    }

    #[test]
    fn test_contains_outside() {
        let region = unit_box();
        assert!(!region.contains(-0.000001, 5.0));
        assert!(!region.contains(10.000001, 5.0));
        assert!(!region.contains(5.0, -0.000001));
        assert!(!region.contains(5.0, 10.000001));
        assert!(!region.contains(11.0, 11.0));
    }

    #[test]
    fn test_contains_non_finite() {
        let region = unit_box();
        assert!(!region.contains(f64::NAN, 5.0));
        assert!(!region.contains(5.0, f64::NAN));
        assert!(!region.contains(f64::INFINITY, 5.0));
        assert!(!region.contains(5.0, f64::NEG_INFINITY));
    }

    #[test]
    fn test_corner_order_normalizes() {
        let expected = unit_box();
        assert_eq!(Region::from_corners((0.0, 0.0), (10.0, 10.0)).unwrap(), expected);
        assert_eq!(Region::from_corners((10.0, 10.0), (0.0, 0.0)).unwrap(), expected);
        assert_eq!(Region::from_corners((0.0, 10.0), (10.0, 0.0)).unwrap(), expected);
        assert_eq!(Region::from_corners((10.0, 0.0), (0.0, 10.0)).unwrap(), expected);
        assert_eq!(Region::from_bounds(10.0, 0.0, 10.0, 0.0).unwrap(), expected);
    }

    #[test]
    fn test_degenerate_region() {
        let region = Region::from_bounds(3.0, 3.0, 4.0, 4.0).unwrap();
        assert!(region.contains(3.0, 4.0));
        assert!(!region.contains(3.0, 4.5));
    }

    #[test]
    fn test_rejects_non_finite_bounds() {
        assert!(matches!(
            Region::from_bounds(f64::NAN, 1.0, 0.0, 1.0),
            Err(ClipError::InvalidRegion(_))
        ));
        assert!(Region::from_corners((0.0, f64::INFINITY), (1.0, 1.0)).is_err());
    }

    #[test]
    fn test_parse_bounds() {
        let region: Region = "0,10,0,10".parse().unwrap();
        assert_eq!(region, unit_box());

        let region: Region = " 0 ; 10 ; 0 ; 10 ".parse().unwrap();
        assert_eq!(region, unit_box());

        assert!("0,10,0".parse::<Region>().is_err());
        assert!("0,10,0,ten".parse::<Region>().is_err());
        assert!("".parse::<Region>().is_err());
    }

    #[test]
    fn test_parse_corners() {
        let region = Region::parse_corners("10,0,0,10").unwrap();
        assert_eq!(region, unit_box());
        assert!(Region::parse_corners("1,2,3").is_err());
    }

    #[test]
    fn test_region_spec_into_region() {
        let bounds = RegionSpec::Bounds {
            min_x: 0.0,
            max_x: 10.0,
            min_y: 0.0,
            max_y: 10.0,
        };
        assert_eq!(bounds.into_region().unwrap(), unit_box());

        let corners = RegionSpec::Corners {
            x1: 10.0,
            y1: 0.0,
            x2: 0.0,
            y2: 10.0,
        };
        assert_eq!(corners.into_region().unwrap(), unit_box());

        assert_eq!(RegionSpec::from(unit_box()), bounds);
    }

    #[test]
    fn test_display() {
        assert_eq!(unit_box().to_string(), "[0, 10] x [0, 10]");
    }
}
