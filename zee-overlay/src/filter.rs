//! Pré-filtre spatial par emprise

use geo::Rect;
use tracing::debug;

use crate::types::FeatureCollection;

/// Test d'emprise inclusif : deux rectangles qui se touchent se chevauchent
pub fn rects_overlap(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x && b.min().x <= a.max().x && a.min().y <= b.max().y && b.min().y <= a.max().y
}

/// Garde les enregistrements dont l'emprise croise `bbox`
///
/// Filtre grossier sans faux négatif : il peut garder des polygones qui ne
/// croisent pas réellement l'imóvel, l'overlay les élimine ensuite.
pub fn clip_to_bbox(collection: &FeatureCollection, bbox: &Rect<f64>) -> FeatureCollection {
    let features: Vec<_> = collection
        .features
        .iter()
        .filter(|f| f.bounding_rect().is_some_and(|r| rects_overlap(&r, bbox)))
        .cloned()
        .collect();

    debug!(
        layer = %collection.name,
        kept = features.len(),
        total = collection.len(),
        "Bounding box pre-filter"
    );

    FeatureCollection::new(collection.name.clone(), collection.crs, features)
}
