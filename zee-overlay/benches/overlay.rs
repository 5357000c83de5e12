//! Benchmarks de l'overlay imóvel × ZEE

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::{polygon, MultiPolygon, Polygon};
use zee_overlay::{aggregate, clip_to_bbox, intersect, Crs, Feature, FeatureCollection};

/// Couche de zonage synthétique : grille n×n de cellules de 1 km
fn zoning_grid(n: usize) -> FeatureCollection {
    let mut features = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let x0 = 5_000_000.0 + i as f64 * 1_000.0;
            let y0 = 8_800_000.0 + j as f64 * 1_000.0;
            features.push(Feature {
                id: format!("{i}-{j}"),
                geometry: MultiPolygon::new(vec![polygon![
                    (x: x0, y: y0),
                    (x: x0 + 1_000.0, y: y0),
                    (x: x0 + 1_000.0, y: y0 + 1_000.0),
                    (x: x0, y: y0 + 1_000.0),
                    (x: x0, y: y0),
                ]]),
                properties: [("zona".to_string(), format!("Zona {}", (i + j) % 11))]
                    .into_iter()
                    .collect(),
            });
        }
    }
    FeatureCollection::new("zee", Some(Crs::BRAZIL_POLYCONIC), features)
}

/// Imóvel polygonal de 64 sommets (~1 250 ha)
fn property() -> Feature {
    let ring: Vec<(f64, f64)> = (0..=64)
        .map(|k| {
            let a = k as f64 / 64.0 * std::f64::consts::TAU;
            (5_020_000.0 + 2_000.0 * a.cos(), 8_820_000.0 + 2_000.0 * a.sin())
        })
        .collect();
    Feature {
        id: "imovel".to_string(),
        geometry: MultiPolygon::new(vec![Polygon::new(ring.into(), vec![])]),
        properties: Default::default(),
    }
}

fn bench_overlay(c: &mut Criterion) {
    let imovel = property();
    let total_ha = imovel.area_ha();
    let bbox = imovel.bounding_rect().unwrap();

    let mut group = c.benchmark_group("overlay");
    for n in [50usize, 100, 200] {
        let zee = zoning_grid(n);

        group.bench_with_input(BenchmarkId::new("prefiltered", n * n), &zee, |b, zee| {
            b.iter(|| {
                let clipped = clip_to_bbox(black_box(zee), &bbox);
                let fragments = intersect(&imovel, &clipped);
                black_box(aggregate(&fragments, "zona", total_ha))
            })
        });

        group.bench_with_input(BenchmarkId::new("full", n * n), &zee, |b, zee| {
            b.iter(|| {
                let fragments = intersect(&imovel, black_box(zee));
                black_box(aggregate(&fragments, "zona", total_ha))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_overlay);
criterion_main!(benches);
