//! Table statique des catégories du ZEE-TO
//!
//! Construite une seule fois au démarrage puis partagée en lecture seule.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConsultaError;

/// Description réglementaire d'une zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneMetadata {
    /// Titre lisible (avec sigle)
    pub title: String,

    /// Restritiva / Intermediária / Produtiva
    pub class: String,

    pub description: String,
}

impl ZoneMetadata {
    /// Entrée dégradée pour une zone absente de la table
    pub fn placeholder(category: &str) -> Self {
        Self {
            title: category.to_string(),
            class: "—".to_string(),
            description: "_sem descrição_".to_string(),
        }
    }
}

/// Bloc explicatif des APSE, affiché quand l'imóvel en croise au moins une
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApseNotice {
    pub title: String,
    pub composition: String,
    pub objective: String,
    pub guidelines: Vec<String>,
    pub legal_reserve: String,
}

/// Table complète
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataTable {
    /// Légende de la source des données
    pub source: String,

    pub zones: HashMap<String, ZoneMetadata>,

    pub apse: ApseNotice,
}

impl MetadataTable {
    /// Table embarquée (ZEE Tocantins, version 2025)
    pub fn embedded() -> Result<Self, ConsultaError> {
        Self::from_json(include_str!("zee_to.json"))
            .map_err(|e| ConsultaError::Metadata(format!("embedded table: {e}")))
    }

    /// Charge une table depuis un fichier JSON de même structure
    pub fn load(path: &Path) -> Result<Self, ConsultaError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConsultaError::Metadata(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
            .map_err(|e| ConsultaError::Metadata(format!("{}: {e}", path.display())))
    }

    fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Recherche sans échec : une zone inconnue donne une entrée dégradée
    pub fn lookup(&self, category: &str) -> Cow<'_, ZoneMetadata> {
        match self.zones.get(category) {
            Some(meta) => Cow::Borrowed(meta),
            None => Cow::Owned(ZoneMetadata::placeholder(category)),
        }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_table() {
        let table = MetadataTable::embedded().unwrap();
        assert_eq!(table.len(), 11);

        let zce1 = table.lookup("Zonas de Consolidação Estratégica 1");
        assert_eq!(zce1.title, "Zonas de Consolidação Estratégica 1 (ZCEs-1)");
        assert_eq!(zce1.class, "Produtiva");
        assert!(zce1.description.starts_with("Áreas de uso intensivo consolidado"));

        let classes: std::collections::HashSet<&str> =
            table.zones.values().map(|z| z.class.as_str()).collect();
        assert_eq!(classes.len(), 3);
        assert!(classes.contains("Restritiva"));
        assert!(classes.contains("Intermediária"));

        assert_eq!(table.apse.guidelines.len(), 6);
        assert!(table.source.contains("Tocantins"));
    }

    #[test]
    fn test_unknown_zone_degrades() {
        let table = MetadataTable::embedded().unwrap();
        let meta = table.lookup("Zona Urbana");
        assert!(matches!(meta, Cow::Owned(_)));
        assert_eq!(meta.title, "Zona Urbana");
        assert_eq!(meta.class, "—");
        assert_eq!(meta.description, "_sem descrição_");
    }

    #[test]
    fn test_load_missing_file() {
        let err = MetadataTable::load(Path::new("/nonexistent/zee.json")).unwrap_err();
        assert!(matches!(err, ConsultaError::Metadata(_)));
    }
}
