//! Reprojection intelligente : reproject lite en priorité, fallback sur proj
//!
//! Utilise automatiquement la meilleure option disponible.

use super::{ReprojectorLite, Result};
use geo::MultiPolygon;

/// Reprojection intelligente
///
/// Essaie d'abord la version légère (pure Rust), puis PROJ si la feature est activée.
pub enum SmartReprojector {
    /// Reprojection légère (pure Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "proj")]
    Proj(super::proj::ProjReprojector),
    /// Pas de reprojection (source == cible)
    Identity,
}

impl SmartReprojector {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        if source_epsg == target_epsg {
            return Ok(Self::Identity);
        }

        if ReprojectorLite::is_supported(source_epsg, target_epsg) {
            let lite = ReprojectorLite::new(source_epsg, target_epsg)?;
            return Ok(Self::Lite(lite));
        }

        #[cfg(feature = "proj")]
        {
            let proj = super::proj::ProjReprojector::new(source_epsg, target_epsg)?;
            return Ok(Self::Proj(proj));
        }

        #[cfg(not(feature = "proj"))]
        Err(super::ReprojectError::new(format!(
            "EPSG:{} → EPSG:{} not supported without the 'proj' feature",
            source_epsg, target_epsg
        )))
    }

    /// Transforme un multipolygone
    pub fn transform_multipolygon(&self, geom: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        match self {
            Self::Identity => Ok(geom.clone()),
            Self::Lite(lite) => lite.transform_multipolygon(geom),
            #[cfg(feature = "proj")]
            Self::Proj(proj) => proj.transform_multipolygon(geom),
        }
    }

    /// Retourne une description du reprojector utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Lite(_) => "lite (pure Rust)",
            #[cfg(feature = "proj")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}
