// Copyright 2025 the Terrella Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edge candidates.
//!
//! Indexes a coastline-like loop and a few meridians, then asks which of
//! their edges a handful of query edges may cross, filtering the candidates
//! with an exact crossing test.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p terrella_demos --example edge_candidates`

use glam::DVec3;
use terrella_cell::{FaceSegmentVec, face_segments};
use terrella_index::{EdgeMap, EdgeQuery, MemoryIndex, Polyline, ShapeId, ShapeIndex};

fn lat_lng(lat_deg: f64, lng_deg: f64) -> DVec3 {
    let (lat, lng) = (lat_deg.to_radians(), lng_deg.to_radians());
    DVec3::new(lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin())
}

fn crosses(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> bool {
    let ab = a.cross(b);
    let acb = -ab.dot(c);
    let bda = ab.dot(d);
    if acb * bda <= 0.0 {
        return false;
    }
    let cd = c.cross(d);
    acb * -cd.dot(b) > 0.0 && acb * cd.dot(a) > 0.0
}

fn main() {
    env_logger::init();

    // A wavy loop around latitude 20, and three meridians.
    let coast = Polyline::closed(
        (0..180)
            .map(|k| {
                let lng = f64::from(k) * 2.0;
                lat_lng(20.0 + 5.0 * (lng * 3.0).to_radians().sin(), lng)
            })
            .collect(),
    );
    let meridian = |lng: f64| {
        Polyline::open((-8..=8).map(|k| lat_lng(f64::from(k) * 10.0, lng)).collect())
    };
    let index = MemoryIndex::new(vec![coast, meridian(0.0), meridian(90.0), meridian(200.0)]);
    log::info!("{index:?}");

    let queries = [
        ("short hop", lat_lng(15.0, 10.0), lat_lng(25.0, 11.0)),
        ("across two faces", lat_lng(18.0, 30.0), lat_lng(22.0, 60.0)),
        ("open ocean", lat_lng(-60.0, 120.0), lat_lng(-55.0, 125.0)),
        ("over the pole", lat_lng(80.0, 0.0), lat_lng(80.0, 180.0)),
    ];

    let mut query = EdgeQuery::new(&index);
    let mut map = EdgeMap::new();
    let mut segments = FaceSegmentVec::new();
    for (name, a, b) in queries {
        face_segments(a, b, &mut segments);
        let faces: Vec<u8> = segments.iter().map(|s| s.face).collect();
        if !query.candidates(a, b, &mut map) {
            println!("{name}: faces {faces:?}, no candidates");
            continue;
        }
        println!("{name}: faces {faces:?}");
        let mut ids: Vec<ShapeId> = map.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let Some(shape) = index.shape(id) else {
                continue;
            };
            let edges = &map[&id];
            let hits: Vec<usize> = edges
                .iter()
                .copied()
                .filter(|&e| {
                    let (c, d) = shape.edge(e);
                    crosses(a, b, c, d)
                })
                .collect();
            println!(
                "  shape {}: {} candidates of {}, crossing {hits:?}",
                id.get(),
                edges.len(),
                shape.polyline().num_edges()
            );
        }
    }
}
