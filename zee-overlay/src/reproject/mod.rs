//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Couvre les systèmes rencontrés dans les données CAR / ZEE du Brésil :
//! - SIRGAS 2000 (EPSG:4674), WGS84 (EPSG:4326) géographiques
//! - SIRGAS 2000 / UTM 18S à 25S (EPSG:31978 à 31985), WGS84 / UTM (326xx, 327xx)
//! - SIRGAS 2000 / Brazil Polyconic (EPSG:5880)
//!
//! SIRGAS 2000 et WGS84 sont confondus (écart centimétrique). SAD69 et les
//! autres couples passent par PROJ avec la feature `proj`.

mod ellipsoid;
mod polyconic;
#[cfg(feature = "proj")]
mod proj;
mod smart;
mod utm;

pub use smart::SmartReprojector;

use geo::{Coord, MapCoords, MultiPolygon};
use thiserror::Error;

pub use ellipsoid::GRS80;
use utm::UtmZone;

/// Échec de reprojection (message court, sans état interne)
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ReprojectError(String);

impl ReprojectError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, ReprojectError>;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Famille de projection d'un code EPSG supporté
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    Geographic,
    Utm(UtmZone),
    Polyconic,
}

impl Projection {
    fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            4326 | 4674 => Some(Self::Geographic),
            5880 => Some(Self::Polyconic),
            _ => UtmZone::from_epsg(epsg).map(Self::Utm),
        }
    }
}

/// Reprojection légère entre deux EPSG supportés
pub struct ReprojectorLite {
    source: Projection,
    target: Projection,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let source = Projection::from_epsg(source_epsg).ok_or_else(|| {
            ReprojectError::new(format!(
                "EPSG:{} not supported (supported: 4326, 4674, 5880, UTM)",
                source_epsg
            ))
        })?;
        let target = Projection::from_epsg(target_epsg).ok_or_else(|| {
            ReprojectError::new(format!(
                "EPSG:{} not supported (supported: 4326, 4674, 5880, UTM)",
                target_epsg
            ))
        })?;

        Ok(Self { source, target })
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source_epsg: u32, target_epsg: u32) -> bool {
        Projection::from_epsg(source_epsg).is_some() && Projection::from_epsg(target_epsg).is_some()
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        // Étape 1: Source → Géographique
        let geo = self.source_to_geographic(x, y)?;

        // Étape 2: Géographique → Cible
        self.geographic_to_target(geo)
    }

    fn source_to_geographic(&self, x: f64, y: f64) -> Result<Geographic> {
        match self.source {
            Projection::Geographic => Ok(Geographic::from_degrees(x, y)),
            Projection::Utm(zone) => utm::utm_to_geographic(x, y, zone),
            Projection::Polyconic => polyconic::polyconic_to_geographic(x, y),
        }
    }

    fn geographic_to_target(&self, geo: Geographic) -> Result<(f64, f64)> {
        match self.target {
            Projection::Geographic => Ok(geo.to_degrees()),
            Projection::Utm(zone) => utm::geographic_to_utm(geo, zone),
            Projection::Polyconic => polyconic::geographic_to_polyconic(geo),
        }
    }

    /// Transforme un multipolygone
    pub fn transform_multipolygon(&self, geom: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        geom.try_map_coords(|c| {
            let (x, y) = self.transform_point(c.x, c.y)?;
            if !x.is_finite() || !y.is_finite() {
                return Err(ReprojectError::new(format!(
                    "coordinate ({}, {}) is outside the projection domain",
                    c.x, c.y
                )));
            }
            Ok(Coord { x, y })
        })
    }
}
