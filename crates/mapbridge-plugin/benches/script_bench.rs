// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for script rendering and acknowledgment parsing
// in the mapbridge-plugin crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use mapbridge_core::BridgeConfig;
use mapbridge_core::types::{Coordinates, MapHandle};
use mapbridge_plugin::script::{self, ScriptContext};

/// Render the three mutating scripts against one handle.
fn bench_render_scripts(c: &mut Criterion) {
    let ctx = ScriptContext::from_config(&BridgeConfig::default());
    let handle = MapHandle::new();
    let center = Coordinates::SEOUL;

    c.bench_function("render initializeMap", |b| {
        b.iter(|| black_box(script::initialize_map(&ctx, black_box(&handle), center)));
    });

    c.bench_function("render addMarker (escaped title)", |b| {
        let title = "Seoul City Hall \"서울시청\" </script>";
        b.iter(|| black_box(script::add_marker(&ctx, &handle, center, black_box(title))));
    });

    c.bench_function("render setMapCenter", |b| {
        b.iter(|| black_box(script::set_map_center(&ctx, &handle, black_box(center))));
    });
}

/// Parse success and failure acknowledgments.
fn bench_parse_ack(c: &mut Criterion) {
    c.bench_function("parse_ack ok", |b| {
        b.iter(|| script::parse_ack(black_box(r#"{"ok":true}"#)).is_ok());
    });

    c.bench_function("parse_ack exception", |b| {
        let raw = r#"{"ok":false,"error":"exception","detail":"Map is not a constructor"}"#;
        b.iter(|| script::parse_ack(black_box(raw)).is_err());
    });
}

criterion_group!(benches, bench_render_scripts, bench_parse_ack);
criterion_main!(benches);
