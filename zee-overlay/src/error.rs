//! Types d'erreurs pour le crate zee-overlay

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Erreurs pouvant survenir pendant le croisement CAR × ZEE
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Jeu de données absent ou illisible
    #[error("Dataset not found: {path}: {source}")]
    DatasetNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Jeu de données lisible mais pas une collection de polygones valide
    #[error("Invalid dataset {path}: {reason}")]
    DatasetFormatError { path: PathBuf, reason: String },

    /// Reprojection impossible (CRS indéfini ou non supporté)
    #[error("Reprojection failed for {layer}: {reason}")]
    ReprojectionError { layer: String, reason: String },

    /// Aucun imóvel avec cet identifiant
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    /// L'imóvel ne croise aucune zone de la couche de zonage
    #[error("Property {0} does not intersect any zoning polygon")]
    NoOverlap(String),

    /// La couche de référence n'a pas la colonne de catégorie attendue
    #[error("Missing category field '{field}' in layer {layer}")]
    MissingCategoryField { layer: String, field: String },
}

impl OverlayError {
    /// Crée une erreur de fichier introuvable avec contexte
    pub fn dataset_not_found(path: &Path, source: std::io::Error) -> Self {
        Self::DatasetNotFound {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Crée une erreur de format avec contexte
    pub fn format(path: &Path, reason: impl Into<String>) -> Self {
        Self::DatasetFormatError {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de reprojection avec contexte
    pub fn reprojection(layer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ReprojectionError {
            layer: layer.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_field(layer: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingCategoryField {
            layer: layer.into(),
            field: field.into(),
        }
    }

    /// Résultat métier attendu (pas une panne)
    pub fn is_business_outcome(&self) -> bool {
        matches!(self, Self::PropertyNotFound(_) | Self::NoOverlap(_))
    }
}
