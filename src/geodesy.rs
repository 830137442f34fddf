//! Reprojection of WGS84 longitude/latitude
//!
//! Supports the identity projection (EPSG:4326) and the WGS84 UTM zones
//! (EPSG:326zz north, EPSG:327zz south). The transform itself is done by
//! `proj4rs` from PROJ definition strings.

use crate::error::{Result, SyncError};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

const WGS84_LONGLAT: &str = "+proj=longlat +datum=WGS84";

/// Target coordinate system for survey points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Longitude/latitude degrees
    Wgs84,
    Utm { zone: u8, north: bool },
}

impl Projection {
    /// Parse an `EPSG:xxxx` code (the `EPSG:` prefix is optional and case-insensitive)
    pub fn from_epsg(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        let digits = match trimmed.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("epsg:") => &trimmed[5..],
            _ => trimmed,
        };
        let number: u32 = digits
            .parse()
            .map_err(|_| SyncError::format("EPSG code", code))?;

        match number {
            4326 => Ok(Projection::Wgs84),
            32601..=32660 => Ok(Projection::Utm {
                zone: (number - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(Projection::Utm {
                zone: (number - 32700) as u8,
                north: false,
            }),
            _ => Err(SyncError::format("supported EPSG code", code)),
        }
    }

    pub fn epsg_code(&self) -> u32 {
        match *self {
            Projection::Wgs84 => 4326,
            Projection::Utm { zone, north: true } => 32600 + zone as u32,
            Projection::Utm { zone, north: false } => 32700 + zone as u32,
        }
    }

    /// PROJ definition of the target system
    pub fn proj_string(&self) -> String {
        match *self {
            Projection::Wgs84 => WGS84_LONGLAT.to_string(),
            Projection::Utm { zone, north: true } => {
                format!("+proj=utm +zone={zone} +datum=WGS84 +units=m")
            }
            Projection::Utm { zone, north: false } => {
                format!("+proj=utm +zone={zone} +south +datum=WGS84 +units=m")
            }
        }
    }

    /// Build the transform from WGS84 longitude/latitude into this system
    pub fn projector(&self) -> Result<Projector> {
        let target = match self {
            Projection::Wgs84 => None,
            Projection::Utm { .. } => Some(parse_proj(&self.proj_string())?),
        };
        Ok(Projector {
            source: parse_proj(WGS84_LONGLAT)?,
            target,
        })
    }
}

fn parse_proj(definition: &str) -> Result<Proj> {
    Proj::from_proj_string(definition)
        .map_err(|e| SyncError::External(format!("Invalid projection '{}': {}", definition, e)))
}

/// Ready-to-use reprojection, built once per survey
pub struct Projector {
    source: Proj,
    target: Option<Proj>,
}

impl Projector {
    /// Project longitude/latitude degrees to `(x, y)` in the target system
    pub fn project(&self, longitude: f64, latitude: f64) -> Result<(f64, f64)> {
        let target = match self.target {
            Some(ref target) => target,
            None => return Ok((longitude, latitude)),
        };

        // Geographic input is in radians; projected output is in metres
        let mut point = (longitude.to_radians(), latitude.to_radians(), 0.0);
        transform(&self.source, target, &mut point).map_err(|e| {
            SyncError::External(format!(
                "Reprojection of ({}, {}) failed: {}",
                longitude, latitude, e
            ))
        })?;
        Ok((point.0, point.1))
    }
}
