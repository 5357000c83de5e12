//! Erreurs de la consultation

use thiserror::Error;
use zee_overlay::OverlayError;

/// Pannes d'une consultation (jamais les résultats métier attendus)
#[derive(Debug, Error)]
pub enum ConsultaError {
    /// Erreur du moteur d'overlay (fichiers, CRS)
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    /// Table de métadonnées illisible
    #[error("Invalid zone metadata: {0}")]
    Metadata(String),
}

impl ConsultaError {
    /// Message court destiné à l'utilisateur final
    pub fn user_message(&self) -> String {
        let cause = match self {
            Self::Overlay(OverlayError::DatasetNotFound { .. }) => "base de dados indisponível",
            Self::Overlay(OverlayError::DatasetFormatError { .. }) => "base de dados inválida",
            Self::Overlay(OverlayError::ReprojectionError { .. }) => {
                "sistema de coordenadas indefinido ou não suportado"
            }
            Self::Overlay(OverlayError::MissingCategoryField { .. }) => {
                "camada de referência sem o campo de categoria"
            }
            Self::Overlay(OverlayError::PropertyNotFound(_)) => return NOT_FOUND_MESSAGE.to_string(),
            Self::Overlay(OverlayError::NoOverlap(_)) => return NO_OVERLAP_MESSAGE.to_string(),
            Self::Metadata(_) => "tabela de zonas inválida",
        };
        format!("Falha ao processar a consulta: {cause}")
    }
}

/// Imóvel absent du registre
pub const NOT_FOUND_MESSAGE: &str = "Número do CAR não encontrado";

/// Imóvel hors de toute zone du ZEE
pub const NO_OVERLAP_MESSAGE: &str = "O imóvel não intersecta com nenhuma zona do ZEE.";
