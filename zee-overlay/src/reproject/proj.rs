//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec la feature `proj`.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use proj::Proj;

use super::{ReprojectError, Result};

/// Reprojection de géométries entre deux systèmes de coordonnées
pub struct ProjReprojector {
    proj: Proj,
}

impl ProjReprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        let proj = Proj::new_known_crs(&source, &target, None).map_err(|e| {
            ReprojectError::new(format!(
                "Failed to create projection from {} to {}: {}",
                source, target, e
            ))
        })?;

        Ok(Self { proj })
    }

    /// Transforme un MultiPolygon
    pub fn transform_multipolygon(&self, mp: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        let polys: Result<Vec<Polygon<f64>>> = mp.0.iter().map(|p| self.transform_polygon(p)).collect();
        Ok(MultiPolygon::new(polys?))
    }

    /// Transforme une LineString (batch conversion)
    fn transform_linestring(&self, ls: &LineString<f64>) -> Result<LineString<f64>> {
        let mut coords: Vec<(f64, f64)> = ls.0.iter().map(|c| (c.x, c.y)).collect();

        // Transformation batch - beaucoup plus rapide que point par point
        self.proj
            .convert_array(&mut coords)
            .map_err(|e| ReprojectError::new(format!("Batch coordinate transformation failed: {}", e)))?;

        let result: Vec<Coord<f64>> = coords.into_iter().map(|(x, y)| Coord { x, y }).collect();
        Ok(LineString::new(result))
    }

    fn transform_polygon(&self, p: &Polygon<f64>) -> Result<Polygon<f64>> {
        let exterior = self.transform_linestring(p.exterior())?;
        let interiors: Result<Vec<LineString<f64>>> = p
            .interiors()
            .iter()
            .map(|ls| self.transform_linestring(ls))
            .collect();
        Ok(Polygon::new(exterior, interiors?))
    }
}
