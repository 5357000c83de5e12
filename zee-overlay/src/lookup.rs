//! Recherche d'un imóvel par son numéro CAR

use tracing::{debug, warn};

use crate::types::{Feature, FeatureCollection};
use crate::OverlayError;

/// Retourne le premier enregistrement dont `field` vaut exactement `identifier`
///
/// Comparaison stricte : ni trim ni changement de casse.
pub fn find_property<'a>(
    collection: &'a FeatureCollection,
    field: &str,
    identifier: &str,
) -> Result<&'a Feature, OverlayError> {
    let mut matches = collection
        .features
        .iter()
        .filter(|f| f.get(field) == Some(identifier));

    let first = matches
        .next()
        .ok_or_else(|| OverlayError::PropertyNotFound(identifier.to_string()))?;

    let duplicates = matches.count();
    if duplicates > 0 {
        warn!(car = identifier, duplicates, "Duplicate CAR number, using first record");
    }
    debug!(car = identifier, id = %first.id, "Property found");

    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;

    fn property(id: &str, car: &str, name: &str) -> Feature {
        Feature {
            id: id.to_string(),
            geometry: MultiPolygon::new(vec![]),
            properties: [
                ("numero_car".to_string(), car.to_string()),
                ("nom_imovel".to_string(), name.to_string()),
            ]
            .into_iter()
            .collect(),
        }
    }

    fn registry() -> FeatureCollection {
        FeatureCollection::new(
            "car",
            None,
            vec![
                property("0", "TO-1700251-AAAA", "Fazenda Boa Vista"),
                property("1", "TO-123456", "FAZ-001"),
                property("2", "TO-123456", "FAZ-001 (duplicata)"),
            ],
        )
    }

    #[test]
    fn test_first_match_wins() {
        let layer = registry();
        let found = find_property(&layer, "numero_car", "TO-123456").unwrap();
        assert_eq!(found.id, "1");
        assert_eq!(found.get("nom_imovel"), Some("FAZ-001"));
    }

    #[test]
    fn test_exact_match_only() {
        let layer = registry();
        for candidate in [" TO-123456", "to-123456", "TO-123456 ", "TO-12345"] {
            let err = find_property(&layer, "numero_car", candidate).unwrap_err();
            assert!(matches!(err, OverlayError::PropertyNotFound(ref id) if id == candidate));
        }
    }

    #[test]
    fn test_missing_identifier_field() {
        let layer = registry();
        assert!(find_property(&layer, "cod_imovel", "TO-123456").is_err());
    }
}
