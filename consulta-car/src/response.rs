//! Sérialisation JSON de la réponse
//!
//! Les pourcentages restent numériques dans le cœur ; ils ne deviennent des
//! chaînes « dd,dd » (virgule décimale) qu'ici.

use std::collections::BTreeMap;

use serde::Serialize;
use zee_overlay::AreaShare;

use crate::compose::QueryResult;
use crate::error::{NOT_FOUND_MESSAGE, NO_OVERLAP_MESSAGE};
use crate::metadata::{ApseNotice, ZoneMetadata};
use crate::query::QueryOutcome;
use crate::ConsultaError;

/// Arrondi à deux décimales avec virgule : 12.345 → "12,35"
pub fn format_decimal_br(value: f64) -> String {
    format!("{:.2}", value).replace('.', ",")
}

/// Ligne ZEE
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneOverlap {
    pub category: String,
    pub percentage: String,
    pub area_ha: String,
}

/// Ligne APSE
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceOverlap {
    pub service: String,
    pub percentage: String,
    pub area_ha: String,
}

/// Corps d'une réponse réussie
#[derive(Debug, Clone, Serialize)]
pub struct SuccessBody {
    pub identifier: String,
    pub property_name: String,
    pub total_area_ha: String,
    pub epsg: u32,
    pub zee_overlaps: Vec<ZoneOverlap>,
    pub zee_categories_present: Vec<String>,
    pub category_metadata: BTreeMap<String, ZoneMetadata>,
    pub apse_overlaps: Vec<ServiceOverlap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apse_notice: Option<ApseNotice>,
    pub source: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Réponse exposée à l'appelant : succès ou `{ "error": ... }`
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Success(Box<SuccessBody>),
    Failure { error: String },
}

impl QueryResponse {
    pub fn from_outcome(outcome: QueryOutcome) -> Self {
        match outcome {
            QueryOutcome::Found(result) => Self::Success(Box::new(SuccessBody::from(*result))),
            QueryOutcome::NotFound { .. } => Self::failure(NOT_FOUND_MESSAGE),
            QueryOutcome::NoOverlap { .. } => Self::failure(NO_OVERLAP_MESSAGE),
        }
    }

    pub fn from_error(error: &ConsultaError) -> Self {
        Self::failure(error.user_message())
    }

    pub fn from_result(result: Result<QueryOutcome, ConsultaError>) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(outcome),
            Err(e) => Self::from_error(&e),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<QueryResult> for SuccessBody {
    fn from(result: QueryResult) -> Self {
        let zee_overlaps = result
            .zee_overlaps
            .iter()
            .map(|s| ZoneOverlap {
                category: s.category.clone(),
                percentage: format_decimal_br(s.percentage),
                area_ha: format_decimal_br(s.area_ha),
            })
            .collect();

        let apse_overlaps = result
            .apse_overlaps
            .iter()
            .map(|s: &AreaShare| ServiceOverlap {
                service: s.category.clone(),
                percentage: format_decimal_br(s.percentage),
                area_ha: format_decimal_br(s.area_ha),
            })
            .collect();

        Self {
            identifier: result.property.identifier,
            property_name: result.property.name,
            total_area_ha: format_decimal_br(result.property.total_area_ha),
            epsg: result.property.crs.epsg,
            zee_overlaps,
            zee_categories_present: result.zee_categories_present,
            category_metadata: result.category_metadata,
            apse_overlaps,
            apse_notice: result.apse_notice,
            source: result.source,
            warnings: result.warnings,
        }
    }
}
