//! Tests d'intégration de la consultation sur des jeux GeoJSON de test
//!
//! Les fixtures sont sous `tests/fixtures/` :
//! - `*_5880.geojson` : couches déjà en Brazil Polyconic
//! - `*_4674.geojson` : couches SIRGAS 2000 géographiques
//! - `*_shp_4674.shp` : mêmes couches en Shapefile, CRS dans le `.prj`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use consulta_car::{
    query, Consulta, ConsultaError, Datasets, MetadataTable, QueryOptions, QueryOutcome,
    QueryResponse, QueryResult,
};
use zee_overlay::{DatasetLoader, LayerCache, OverlayError};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn datasets(car: &str, zee: &str, apse: &str) -> Datasets {
    Datasets {
        car: fixture(car),
        zee: fixture(zee),
        apse: fixture(apse),
    }
}

fn consulta() -> Consulta {
    Consulta::new(MetadataTable::embedded().unwrap(), QueryOptions::default())
}

fn found(outcome: QueryOutcome) -> QueryResult {
    match outcome {
        QueryOutcome::Found(result) => *result,
        other => panic!("expected a result, got {:?}", other),
    }
}

#[test]
fn test_property_inside_single_zone() {
    let outcome = query(
        "TO-123456",
        &fixture("car_5880.geojson"),
        &fixture("zee_5880.geojson"),
        &fixture("apse_5880.geojson"),
    )
    .unwrap();
    let result = found(outcome.clone());

    assert_eq!(result.property.name, "FAZ-001");
    assert!((result.property.total_area_ha - 100.0).abs() < 1e-6);
    assert_eq!(result.zee_overlaps.len(), 1);
    assert!((result.zee_overlaps[0].percentage - 100.0).abs() < 1e-6);
    assert!(result.apse_overlaps.is_empty());
    assert!(result.apse_notice.is_none());

    let json = serde_json::to_value(QueryResponse::from_outcome(outcome)).unwrap();
    assert_eq!(json["zee_overlaps"][0]["category"], "Zonas de Consolidação Estratégica 1");
    assert_eq!(json["zee_overlaps"][0]["percentage"], "100,00");
    assert_eq!(json["zee_overlaps"][0]["area_ha"], "100,00");
    assert_eq!(
        json["zee_categories_present"],
        serde_json::json!(["Zonas de Consolidação Estratégica 1"])
    );
    assert_eq!(
        json["category_metadata"]["Zonas de Consolidação Estratégica 1"]["title"],
        "Zonas de Consolidação Estratégica 1 (ZCEs-1)"
    );
    assert_eq!(json["apse_overlaps"], serde_json::json!([]));
}

#[test]
fn test_unknown_car_is_not_found() {
    let outcome = consulta()
        .query(
            "TO-000000",
            &datasets("car_5880.geojson", "zee_5880.geojson", "apse_5880.geojson"),
        )
        .unwrap();
    assert_eq!(
        outcome,
        QueryOutcome::NotFound {
            identifier: "TO-000000".into()
        }
    );

    let json = serde_json::to_value(QueryResponse::from_outcome(outcome)).unwrap();
    assert_eq!(json, serde_json::json!({ "error": "Número do CAR não encontrado" }));
}

#[test]
fn test_property_outside_zoning() {
    let outcome = consulta()
        .query(
            "TO-777777",
            &datasets("car_5880.geojson", "zee_5880.geojson", "apse_5880.geojson"),
        )
        .unwrap();
    assert!(matches!(outcome, QueryOutcome::NoOverlap { .. }));

    let json = serde_json::to_value(QueryResponse::from_outcome(outcome)).unwrap();
    assert_eq!(json["error"], "O imóvel não intersecta com nenhuma zona do ZEE.");
}

#[test]
fn test_geographic_layers_are_normalized() {
    let result = found(
        consulta()
            .query(
                "TO-1721000-GEO1",
                &datasets("car_4674.geojson", "zee_4674.geojson", "apse_4674.geojson"),
            )
            .unwrap(),
    );

    assert_eq!(result.property.crs.epsg, 5880);
    assert_eq!(result.zee_overlaps.len(), 2);

    let total: f64 = result.zee_overlaps.iter().map(|s| s.percentage).sum();
    assert!((total - 100.0).abs() < 0.01, "total={}", total);

    let west = &result.zee_overlaps[0];
    assert_eq!(west.category, "Zonas de Desenvolvimento Integrado 3");
    assert!((west.percentage - 66.667).abs() < 0.02, "west={}", west.percentage);

    assert_eq!(result.apse_overlaps.len(), 1);
    let apse = result.apse_overlaps[0].percentage;
    assert!((66.0..67.5).contains(&apse), "apse={}", apse);
    assert!(result.apse_notice.is_some());
    assert_eq!(
        result.zee_categories_present,
        vec![
            "Zonas de Consolidação Estratégica 2".to_string(),
            "Zonas de Desenvolvimento Integrado 3".to_string(),
        ]
    );
}

#[test]
fn test_normalized_layers_are_reused_across_queries() {
    let consulta = consulta();
    let ds = datasets("car_4674.geojson", "zee_4674.geojson", "apse_4674.geojson");

    let first = consulta.query("TO-1721000-GEO1", &ds).unwrap();
    assert_eq!(consulta.normalized_layers(), 2);

    let second = consulta.query("TO-1721000-GEO1", &ds).unwrap();
    assert_eq!(consulta.normalized_layers(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_shapefile_datasets() {
    let result = found(
        consulta()
            .query(
                "TO-1721000-SHP1",
                &datasets("car_shp_4674.shp", "zee_shp_4674.shp", "apse_4674.geojson"),
            )
            .unwrap(),
    );

    assert_eq!(result.property.name, "Fazenda Shapefile");
    assert_eq!(result.property.crs.epsg, 5880);
    assert_eq!(result.zee_overlaps.len(), 2);

    let west = &result.zee_overlaps[0];
    assert_eq!(west.category, "Zonas de Desenvolvimento Integrado 3");
    assert!((west.percentage - 66.667).abs() < 0.02, "west={}", west.percentage);
    assert_eq!(result.apse_overlaps.len(), 1);
}

#[test]
fn test_shapefile_without_prj_is_a_fault() {
    let err = consulta()
        .query(
            "TO-1721000-SHP1",
            &datasets("car_shp_4674.shp", "zee_sem_prj.shp", "apse_4674.geojson"),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ConsultaError::Overlay(OverlayError::ReprojectionError { .. })
    ));
}

#[test]
fn test_zoning_without_category_column() {
    let result = found(
        consulta()
            .query(
                "TO-123456",
                &datasets(
                    "car_5880.geojson",
                    "zee_sem_zona_5880.geojson",
                    "apse_half_5880.geojson",
                ),
            )
            .unwrap(),
    );

    assert!(result.zee_overlaps.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("zona"));

    assert_eq!(result.apse_overlaps.len(), 1);
    assert_eq!(result.apse_overlaps[0].category, "Recursos Hídricos");
    assert!((result.apse_overlaps[0].percentage - 50.0).abs() < 1e-6);
}

#[test]
fn test_undefined_crs_is_a_fault() {
    let err = consulta()
        .query(
            "TO-123456",
            &datasets("car_5880.geojson", "zee_sem_crs.geojson", "apse_5880.geojson"),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ConsultaError::Overlay(OverlayError::ReprojectionError { .. })
    ));

    let json = serde_json::to_value(QueryResponse::from_error(&err)).unwrap();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Falha ao processar a consulta: "));
}

#[test]
fn test_missing_dataset_is_a_fault() {
    let err = consulta()
        .query(
            "TO-123456",
            &datasets("car_5880.geojson", "absent.geojson", "apse_5880.geojson"),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ConsultaError::Overlay(OverlayError::DatasetNotFound { .. })
    ));
}

#[test]
fn test_prefilter_does_not_change_results() {
    let ds = datasets("car_4674.geojson", "zee_4674.geojson", "apse_4674.geojson");
    let with = consulta().query("TO-1721000-GEO1", &ds).unwrap();

    let options = QueryOptions {
        prefilter: false,
        ..QueryOptions::default()
    };
    let without = Consulta::new(MetadataTable::embedded().unwrap(), options)
        .query("TO-1721000-GEO1", &ds)
        .unwrap();

    assert_eq!(with, without);
}

#[test]
fn test_concurrent_queries_share_layers() {
    let consulta = Arc::new(
        consulta().with_registry_source(Arc::new(LayerCache::new(DatasetLoader))),
    );
    let ds = datasets("car_5880.geojson", "zee_5880.geojson", "apse_half_5880.geojson");

    let outcomes: Vec<QueryOutcome> = std::thread::scope(|s| {
        let handles: Vec<_> = ["TO-123456", "TO-777777", "TO-000000", "TO-123456"]
            .into_iter()
            .map(|car| {
                let consulta = Arc::clone(&consulta);
                let ds = &ds;
                s.spawn(move || consulta.query(car, ds).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(matches!(outcomes[0], QueryOutcome::Found(_)));
    assert!(matches!(outcomes[1], QueryOutcome::NoOverlap { .. }));
    assert!(matches!(outcomes[2], QueryOutcome::NotFound { .. }));
    assert_eq!(outcomes[0], outcomes[3]);
}

#[test]
fn test_fragments_are_returned_for_export() {
    let (outcome, fragments) = consulta()
        .query_with_fragments(
            "TO-123456",
            &datasets("car_5880.geojson", "zee_5880.geojson", "apse_half_5880.geojson"),
        )
        .unwrap();
    assert!(matches!(outcome, QueryOutcome::Found(_)));

    let fragments = fragments.unwrap();
    assert_eq!(fragments.crs.epsg, 5880);
    assert_eq!(fragments.zee.len(), 1);
    assert_eq!(fragments.apse.len(), 1);
    // Attributs de l'imóvel gardés à part de ceux de la référence
    assert_eq!(fragments.apse[0].get("numero_car"), None);
    assert_eq!(fragments.apse[0].attributes()["numero_car"], "TO-123456");
    assert_eq!(fragments.apse[0].get("serv_ecos"), Some("Recursos Hídricos"));
}
