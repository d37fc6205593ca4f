use std::sync::Arc;

use crate::render::image::FrameImage;
use crate::stroke::model::{Sample, Stroke};

/// 128-bit content fingerprint built from two independently seeded FNV-1a streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// First stream.
    pub hi: u64,
    /// Second stream.
    pub lo: u64,
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Fingerprint the committed content of a stroke list, in order.
///
/// Two lists with equal stroke counts but different samples fingerprint differently.
pub fn fingerprint_strokes(strokes: &[Arc<Stroke>]) -> Fingerprint {
    let mut a = Fnv1a64::new(0xcbf29ce484222325);
    let mut b = Fnv1a64::new(0x9ae16a3b2f90404f);

    write_u64_pair(&mut a, &mut b, strokes.len() as u64);
    for stroke in strokes {
        let samples = stroke.committed_samples();
        write_u64_pair(&mut a, &mut b, samples.len() as u64);
        for s in samples {
            write_sample_pair(&mut a, &mut b, s);
        }
    }

    Fingerprint {
        hi: a.finish(),
        lo: b.finish(),
    }
}

/// Fingerprint image dimensions and pixels.
pub fn fingerprint_image(img: &FrameImage) -> Fingerprint {
    let mut a = Fnv1a64::new(0xcbf29ce484222325);
    let mut b = Fnv1a64::new(0x9ae16a3b2f90404f);
    write_u64_pair(&mut a, &mut b, u64::from(img.width));
    write_u64_pair(&mut a, &mut b, u64::from(img.height));
    a.write_bytes(&img.rgba8_premul);
    b.write_bytes(&img.rgba8_premul);
    Fingerprint {
        hi: a.finish(),
        lo: b.finish(),
    }
}

fn write_sample_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, s: &Sample) {
    write_u64_pair(a, b, s.sequence_number as u64);
    for v in [
        s.timestamp,
        s.force,
        s.x,
        s.y,
        s.altitude_angle,
        s.azimuth_angle,
    ] {
        write_u64_pair(a, b, v.to_bits());
    }
}

fn write_u64_pair(a: &mut Fnv1a64, b: &mut Fnv1a64, v: u64) {
    a.write_u64(v);
    b.write_u64(v);
}

#[derive(Clone, Copy)]
struct Fnv1a64(u64);

impl Fnv1a64 {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        self.0 = h;
    }

    fn finish(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::model::sample_at;

    fn stroke(points: &[(f64, f64)]) -> Arc<Stroke> {
        let samples = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| sample_at(i as i64, x, y))
            .collect();
        Arc::new(Stroke::from_committed(samples).unwrap())
    }

    #[test]
    fn same_content_same_fingerprint() {
        let a = vec![stroke(&[(0.0, 0.0), (1.0, 1.0)])];
        let b = vec![stroke(&[(0.0, 0.0), (1.0, 1.0)])];
        assert_eq!(fingerprint_strokes(&a), fingerprint_strokes(&b));
    }

    #[test]
    fn equal_count_different_content_differs() {
        let a = vec![stroke(&[(0.0, 0.0), (1.0, 1.0)])];
        let b = vec![stroke(&[(0.0, 0.0), (2.0, 1.0)])];
        assert_ne!(fingerprint_strokes(&a), fingerprint_strokes(&b));
    }

    #[test]
    fn image_fingerprint_tracks_pixels() {
        let a = FrameImage::new(1, 1, vec![0, 0, 0, 0]).unwrap();
        let b = FrameImage::new(1, 1, vec![0, 0, 0, 1]).unwrap();
        assert_ne!(fingerprint_image(&a), fingerprint_image(&b));
        assert_eq!(fingerprint_image(&a), fingerprint_image(&a.clone()));
        assert_eq!(fingerprint_image(&a).to_string().len(), 32);
    }
}
