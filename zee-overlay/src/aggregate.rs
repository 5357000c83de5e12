//! Surfaces (ha) et pourcentages des fragments

use geo::{Area, MultiPolygon};
use tracing::warn;

use crate::overlay::Fragment;

/// m² → ha
pub const M2_PER_HECTARE: f64 = 10_000.0;

/// Part de l'imóvel dans une catégorie, pour un fragment
#[derive(Debug, Clone, PartialEq)]
pub struct AreaShare {
    /// Valeur de la colonne de catégorie (`zona`, `serv_ecos`)
    pub category: String,
    pub area_ha: f64,
    /// Pourcentage de la surface totale de l'imóvel
    pub percentage: f64,
}

/// Surface en hectares d'une géométrie en CRS métrique
pub fn hectares(geometry: &MultiPolygon<f64>) -> f64 {
    geometry.unsigned_area() / M2_PER_HECTARE
}

/// Un `AreaShare` par fragment, sans regroupement par catégorie
///
/// Le dénominateur est la surface de l'imóvel entier, pas la somme des
/// fragments. La catégorie est lue dans les attributs de la référence ;
/// les fragments sans valeur pour `field` sont ignorés.
pub fn aggregate(fragments: &[Fragment], field: &str, total_area_ha: f64) -> Vec<AreaShare> {
    if total_area_ha <= 0.0 {
        return Vec::new();
    }

    fragments
        .iter()
        .filter_map(|fragment| {
            let Some(category) = fragment.get(field) else {
                warn!(source_id = %fragment.source_id, field, "Fragment without category value skipped");
                return None;
            };

            let area_ha = hectares(&fragment.geometry);
            Some(AreaShare {
                category: category.to_string(),
                area_ha,
                percentage: area_ha / total_area_ha * 100.0,
            })
        })
        .collect()
}
