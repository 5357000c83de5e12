//! Intersection polygonale imóvel × couche de référence

use std::collections::HashMap;

use geo::{Area, BooleanOps, MultiPolygon};
use rayon::prelude::*;
use tracing::debug;

use crate::filter::rects_overlap;
use crate::types::{Feature, FeatureCollection};

/// En dessous de cette surface (m²), une intersection est considérée vide
pub const MIN_FRAGMENT_AREA: f64 = 1e-9;

/// Morceau de l'imóvel situé dans un polygone de la couche de référence
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Identifiant de l'enregistrement de référence
    pub source_id: String,

    /// Intersection (peut être multipartie)
    pub geometry: MultiPolygon<f64>,

    /// Attributs de l'enregistrement de référence, seuls porteurs de la catégorie
    pub properties: HashMap<String, String>,

    /// Attributs de l'imóvel
    pub subject_properties: HashMap<String, String>,
}

impl Fragment {
    /// Attribut de l'enregistrement de référence
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Attributs de l'imóvel puis de la référence (la référence l'emporte)
    pub fn attributes(&self) -> HashMap<&str, &str> {
        self.subject_properties
            .iter()
            .chain(&self.properties)
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Surface en m²
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }
}

/// Un fragment par polygone de référence réellement intersecté
///
/// Les fragments sortent dans l'ordre de la collection de référence.
pub fn intersect(subject: &Feature, reference: &FeatureCollection) -> Vec<Fragment> {
    let Some(subject_bbox) = subject.bounding_rect() else {
        return Vec::new();
    };

    let fragments: Vec<Fragment> = reference
        .features
        .par_iter()
        .filter(|f| f.bounding_rect().is_some_and(|r| rects_overlap(&r, &subject_bbox)))
        .filter_map(|f| {
            let geometry = subject.geometry.intersection(&f.geometry);
            if geometry.unsigned_area() <= MIN_FRAGMENT_AREA {
                return None;
            }

            Some(Fragment {
                source_id: f.id.clone(),
                geometry,
                properties: f.properties.clone(),
                subject_properties: subject.properties.clone(),
            })
        })
        .collect();

    debug!(
        layer = %reference.name,
        candidates = reference.len(),
        fragments = fragments.len(),
        "Overlay done"
    );

    fragments
}
