use std::sync::Arc;

use inkframe::{
    AnnotationOpts, AnnotationStore, CpuSurface, Sample, Size, Stroke, StrokeStyle, StrokeSurface,
    TickRate, fingerprint_image,
};

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "inkframe_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn sample(seq: i64, x: f64, y: f64, force: f64) -> Sample {
    Sample {
        sequence_number: seq,
        timestamp: 0.0,
        force,
        x,
        y,
        altitude_angle: 1.0,
        azimuth_angle: 0.0,
    }
}

fn zigzag() -> Stroke {
    Stroke::from_committed(vec![
        sample(1, 4.0, 4.0, 0.2),
        sample(2, 40.0, 20.0, 1.0),
        sample(3, 8.0, 40.0, 0.6),
        sample(4, 56.0, 56.0, 0.1),
    ])
    .unwrap()
}

fn opts(pixel_ratio: f64) -> AnnotationOpts {
    AnnotationOpts {
        full_frame_size: Size::new(64.0, 64.0),
        thumbnail_size: Size::new(16.0, 16.0),
        pixel_ratio,
        style: StrokeStyle::default(),
    }
}

#[test]
fn separate_stores_render_identical_pixels() {
    let rate = TickRate::new(600).unwrap();
    let tick = rate.tick(300);
    let stroke = Arc::new(zigzag());

    let mut a = AnnotationStore::new(rate, opts(2.0));
    let mut b = AnnotationStore::new(rate, opts(2.0));
    a.replace_strokes(tick, vec![stroke.clone()]).unwrap();
    b.replace_strokes(tick, vec![stroke]).unwrap();

    let ra = a.rendered_images_at(tick).unwrap().unwrap();
    let rb = b.rendered_images_at(tick).unwrap().unwrap();
    assert_eq!(fingerprint_image(&ra.full), fingerprint_image(&rb.full));
    assert_eq!(ra.thumb, rb.thumb);
    assert_eq!((ra.full.width, ra.full.height), (128, 128));
    assert_eq!((ra.thumb.width, ra.thumb.height), (32, 32));
    assert!(!ra.thumb.is_blank());
}

#[test]
fn pressure_changes_the_image() {
    let mut flat = CpuSurface::new(1.0, StrokeStyle::default());
    let mut pressed = CpuSurface::new(1.0, StrokeStyle::default());
    let samples = zigzag().committed_samples().to_vec();
    for (surface, pressure) in [(&mut flat, false), (&mut pressed, true)] {
        surface.clear(Size::new(64.0, 64.0));
        surface.draw_polyline(&samples, pressure);
    }
    assert_ne!(flat.snapshot_image(), pressed.snapshot_image());
}

#[test]
fn rendered_annotation_writes_png() {
    let rate = TickRate::new(600).unwrap();
    let tick = rate.tick(0);
    let mut store = AnnotationStore::new(rate, opts(1.0));
    let _ = store.record_stroke(tick, zigzag()).unwrap();
    let rendered = store.rendered_images_at(tick).unwrap().unwrap();

    let dir = temp_dir("render_png");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("full.png");
    rendered.full.save_png(&path).unwrap();

    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (64, 64));
    assert!(decoded.pixels().any(|p| p.0[3] > 0));
    std::fs::remove_dir_all(&dir).unwrap();
}
