use std::path::{Path, PathBuf};
use std::sync::Arc;

use inkframe::{
    AnnotationOpts, AnnotationStore, Document, DocumentErrorKind, MovieRef, Sample, Size, Stroke,
    StrokeId, StrokeStyle, TickRate,
};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "inkframe_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn rate() -> TickRate {
    TickRate::new(600).unwrap()
}

fn opts() -> AnnotationOpts {
    AnnotationOpts {
        full_frame_size: Size::new(32.0, 32.0),
        thumbnail_size: Size::new(8.0, 8.0),
        pixel_ratio: 1.0,
        style: StrokeStyle::default(),
    }
}

fn sample(seq: i64, x: f64, y: f64) -> Sample {
    Sample {
        sequence_number: seq,
        timestamp: seq as f64 * 0.01,
        force: 0.5 + seq as f64 * 0.1,
        x,
        y,
        altitude_angle: 1.1,
        azimuth_angle: 0.3,
    }
}

fn stroke(seq0: i64, pts: &[(f64, f64)]) -> Stroke {
    let samples = pts
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| sample(seq0 + i as i64, x, y))
        .collect();
    Stroke::from_committed(samples).unwrap()
}

fn movie() -> MovieRef {
    MovieRef {
        location: PathBuf::from("clip.mov"),
        rate: rate(),
    }
}

fn populated_store() -> AnnotationStore {
    let mut store = AnnotationStore::new(rate(), opts());
    let _ = store
        .record_stroke(rate().tick(1200), stroke(1, &[(1.0, 1.0), (9.0, 9.0)]))
        .unwrap();
    let _ = store
        .record_stroke(rate().tick(1200), stroke(5, &[(20.0, 2.0), (3.0, 30.0), (4.0, 4.0)]))
        .unwrap();
    let _ = store
        .record_stroke(rate().tick(-600), stroke(9, &[(5.0, 5.0)]))
        .unwrap();
    let id = StrokeId::next();
    store
        .record_dynamic_sample(rate().tick(1000), id, sample(2, 3.0, 4.0))
        .unwrap();
    store
        .record_dynamic_sample(rate().tick(1000), id, sample(3, 5.0, 6.0))
        .unwrap();
    store
}

#[test]
fn save_then_load_reproduces_entries() {
    let dir = temp_dir("bundle_round_trip");
    let store = populated_store();
    Document::from_store(&store, Some(movie()))
        .save(&dir)
        .unwrap();

    let loaded = Document::load(&dir).unwrap();
    assert_eq!(loaded.movie, Some(movie()));
    let summary = loaded.summary();
    assert_eq!(summary.static_ticks, 2);
    assert_eq!(summary.strokes, 3);
    assert_eq!(summary.samples, 6);
    assert_eq!(summary.dynamic_ticks, 1);
    assert_eq!(summary.dynamic_samples, 2);

    let mut reloaded = loaded.into_store(opts()).unwrap();
    for (tick, strokes) in store.static_entries() {
        let back = reloaded.strokes_at(tick).unwrap();
        assert_eq!(back.len(), strokes.len());
        for (a, b) in strokes.iter().zip(back) {
            assert_eq!(a.committed_samples(), b.committed_samples());
            assert!(b.is_committed());
        }
    }
    let dynamic = reloaded.dynamic_at(rate().tick(1000)).unwrap();
    assert_eq!(dynamic.len(), 2);
    assert_eq!(dynamic[1].sample, sample(3, 5.0, 6.0));
    assert_ne!(dynamic[0].stroke, dynamic[1].stroke);

    let mut original = store;
    let a = original.rendered_images_at(rate().tick(1200)).unwrap().unwrap();
    let b = reloaded.rendered_images_at(rate().tick(1200)).unwrap().unwrap();
    assert_eq!(a.full, b.full);
    assert_eq!(a.thumb, b.thumb);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn static_keys_are_written_as_decimal_strings() {
    let dir = temp_dir("bundle_keys");
    Document::from_store(&populated_store(), Some(movie()))
        .save(&dir)
        .unwrap();
    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.join("staticDrawings.json")).unwrap()).unwrap();
    let obj = raw.as_object().unwrap();
    assert!(obj.contains_key("1200"));
    assert!(obj.contains_key("-600"));
    assert_eq!(
        obj["1200"][0]["sequenceNumber"],
        serde_json::json!([1, 2])
    );
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_member_is_malformed_package() {
    let dir = temp_dir("bundle_missing_member");
    Document::from_store(&populated_store(), Some(movie()))
        .save(&dir)
        .unwrap();
    std::fs::remove_file(dir.join("dynamicDrawings.json")).unwrap();

    let err = Document::load(&dir).unwrap_err();
    assert_eq!(err.document_kind(), Some(DocumentErrorKind::MalformedPackage));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn mismatched_columns_abort_the_load() {
    let dir = temp_dir("bundle_bad_columns");
    std::fs::create_dir_all(&dir).unwrap();
    write(
        &dir,
        "staticDrawings.json",
        r#"{"0":[{"sequenceNumber":[1,2],"timestamp":[0.0,0.1],"force":[1.0,1.0],"x":[1.0],"y":[1.0,2.0],"altitudeAngle":[1.0,1.0],"azimuthAngle":[0.0,0.0]}]}"#,
    );
    write(&dir, "dynamicDrawings.json", "{}");
    write(
        &dir,
        "movie.json",
        r#"{"location":"clip.mov","rate":{"per_second":600}}"#,
    );

    let err = Document::load(&dir).unwrap_err();
    assert!(err.to_string().starts_with("decode error: "), "{err}");
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn legacy_flat_maps_load() {
    let dir = temp_dir("bundle_legacy");
    std::fs::create_dir_all(&dir).unwrap();
    write(
        &dir,
        "staticDrawings.json",
        r#"[600,[{"sequenceNumber":[1,2],"timestamp":[0.0,0.1],"force":[1.0,1.0],"x":[1.0,3.0],"y":[1.0,2.0],"altitudeAngle":[1.0,1.0],"azimuthAngle":[0.0,0.0]}]]"#,
    );
    write(
        &dir,
        "dynamicDrawings.json",
        r#"[590,[{"sequenceNumber":1,"timestamp":0.0,"force":1.0,"x":1.0,"y":1.0,"altitudeAngle":1.0,"azimuthAngle":0.0}]]"#,
    );
    write(
        &dir,
        "movie.json",
        r#"{"location":"clip.mov","rate":{"per_second":600}}"#,
    );

    let doc = Document::load(&dir).unwrap();
    assert_eq!(doc.static_drawings[&600][0].committed_samples().len(), 2);
    assert_eq!(doc.dynamic_drawings[&590].len(), 1);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn zero_rate_movie_is_malformed() {
    let dir = temp_dir("bundle_zero_rate");
    std::fs::create_dir_all(&dir).unwrap();
    write(&dir, "staticDrawings.json", "{}");
    write(&dir, "dynamicDrawings.json", "{}");
    write(
        &dir,
        "movie.json",
        r#"{"location":"clip.mov","rate":{"per_second":0}}"#,
    );
    let err = Document::load(&dir).unwrap_err();
    assert_eq!(err.document_kind(), Some(DocumentErrorKind::MalformedPackage));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn movie_resolves_relative_to_base() {
    let dir = temp_dir("bundle_movie_resolve");
    std::fs::create_dir_all(&dir).unwrap();
    write(&dir, "clip.mov", "not really a movie");
    let resolved = movie().resolve(&dir).unwrap();
    assert_eq!(resolved, dir.join("clip.mov"));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn replaced_entry_survives_round_trip_as_arc() {
    let dir = temp_dir("bundle_replace");
    let mut store = AnnotationStore::new(rate(), opts());
    store
        .replace_strokes(
            rate().tick(42),
            vec![Arc::new(stroke(1, &[(0.0, 0.0), (4.0, 4.0)]))],
        )
        .unwrap();
    Document::from_store(&store, Some(movie())).save(&dir).unwrap();
    let back = Document::load(&dir).unwrap().into_store(opts()).unwrap();
    assert_eq!(back.strokes_at(rate().tick(42)).unwrap().len(), 1);
    std::fs::remove_dir_all(&dir).unwrap();
}

fn write(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).unwrap();
}
