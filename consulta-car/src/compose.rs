//! Assemblage du résultat final (aucun calcul métier ici)

use std::collections::BTreeMap;

use zee_overlay::{AreaShare, Crs};

use crate::metadata::{ApseNotice, MetadataTable, ZoneMetadata};

/// Identité de l'imóvel consulté
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    /// Numéro CAR
    pub identifier: String,
    /// `nom_imovel`
    pub name: String,
    /// Surface de l'imóvel entier
    pub total_area_ha: f64,
    /// CRS des calculs de surface
    pub crs: Crs,
}

/// Réponse structurée d'une consultation réussie
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub property: PropertyInfo,

    /// Un élément par fragment, dans l'ordre de la couche ZEE
    pub zee_overlaps: Vec<AreaShare>,

    /// Zones distinctes, triées
    pub zee_categories_present: Vec<String>,

    pub category_metadata: BTreeMap<String, ZoneMetadata>,

    pub apse_overlaps: Vec<AreaShare>,

    /// Présent seulement si `apse_overlaps` n'est pas vide
    pub apse_notice: Option<ApseNotice>,

    /// Légende de la source des données
    pub source: String,

    /// Avertissements sur les données de référence
    pub warnings: Vec<String>,
}

/// Fusionne les overlays agrégés avec la table statique
pub fn compose(
    property: PropertyInfo,
    zee_overlaps: Vec<AreaShare>,
    apse_overlaps: Vec<AreaShare>,
    metadata: &MetadataTable,
) -> QueryResult {
    let mut zee_categories_present: Vec<String> =
        zee_overlaps.iter().map(|s| s.category.clone()).collect();
    zee_categories_present.sort();
    zee_categories_present.dedup();

    let category_metadata = zee_categories_present
        .iter()
        .map(|zona| (zona.clone(), metadata.lookup(zona).into_owned()))
        .collect();

    let apse_notice = (!apse_overlaps.is_empty()).then(|| metadata.apse.clone());

    QueryResult {
        property,
        zee_overlaps,
        zee_categories_present,
        category_metadata,
        apse_overlaps,
        apse_notice,
        source: metadata.source.clone(),
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(category: &str, percentage: f64) -> AreaShare {
        AreaShare {
            category: category.to_string(),
            area_ha: percentage,
            percentage,
        }
    }

    fn property() -> PropertyInfo {
        PropertyInfo {
            identifier: "TO-123456".to_string(),
            name: "FAZ-001".to_string(),
            total_area_ha: 100.0,
            crs: Crs::BRAZIL_POLYCONIC,
        }
    }

    #[test]
    fn test_distinct_sorted_categories() {
        let table = MetadataTable::embedded().unwrap();
        let zee = vec![
            share("Zonas de Desenvolvimento Integrado 3", 40.0),
            share("Zonas de Consolidação Estratégica 2", 35.0),
            share("Zonas de Desenvolvimento Integrado 3", 20.0),
            share("Zona Desconhecida", 5.0),
        ];

        let result = compose(property(), zee, vec![], &table);

        // Granularité par fragment conservée
        assert_eq!(result.zee_overlaps.len(), 4);
        assert_eq!(
            result.zee_categories_present,
            vec![
                "Zona Desconhecida",
                "Zonas de Consolidação Estratégica 2",
                "Zonas de Desenvolvimento Integrado 3",
            ]
        );
        assert_eq!(result.category_metadata.len(), 3);
        assert_eq!(result.category_metadata["Zona Desconhecida"].title, "Zona Desconhecida");
        assert_eq!(
            result.category_metadata["Zonas de Desenvolvimento Integrado 3"].class,
            "Intermediária"
        );
        assert!(result.apse_notice.is_none());
    }

    #[test]
    fn test_apse_notice_only_with_apse() {
        let table = MetadataTable::embedded().unwrap();
        let result = compose(
            property(),
            vec![share("Zonas de Consolidação Estratégica 1", 100.0)],
            vec![share("Recarga hídrica", 12.5)],
            &table,
        );
        assert_eq!(result.apse_overlaps.len(), 1);
        assert_eq!(result.apse_notice.as_ref(), Some(&table.apse));
    }
}
