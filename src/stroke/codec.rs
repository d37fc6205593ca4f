use crate::foundation::error::{InkError, InkResult};
use crate::stroke::model::{Sample, Stroke};

/// Columnar form of a stroke: seven equal-length arrays, one per sample field.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnarRecord {
    /// Sequence numbers.
    pub sequence_number: Vec<i64>,
    /// Timestamps in seconds.
    pub timestamp: Vec<f64>,
    /// Forces.
    pub force: Vec<f64>,
    /// Location x values.
    pub x: Vec<f64>,
    /// Location y values.
    pub y: Vec<f64>,
    /// Altitude angles.
    pub altitude_angle: Vec<f64>,
    /// Azimuth angles.
    pub azimuth_angle: Vec<f64>,
}

/// A single sample in the persisted dynamic-drawing form.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    /// Sequence number.
    pub sequence_number: i64,
    /// Timestamp in seconds.
    pub timestamp: f64,
    /// Force.
    pub force: f64,
    /// Location x.
    pub x: f64,
    /// Location y.
    pub y: f64,
    /// Altitude angle.
    pub altitude_angle: f64,
    /// Azimuth angle.
    pub azimuth_angle: f64,
}

impl From<&Sample> for SampleRecord {
    fn from(s: &Sample) -> Self {
        Self {
            sequence_number: s.sequence_number,
            timestamp: s.timestamp,
            force: s.force,
            x: s.x,
            y: s.y,
            altitude_angle: s.altitude_angle,
            azimuth_angle: s.azimuth_angle,
        }
    }
}

impl From<SampleRecord> for Sample {
    fn from(r: SampleRecord) -> Self {
        Self {
            sequence_number: r.sequence_number,
            timestamp: r.timestamp,
            force: r.force,
            x: r.x,
            y: r.y,
            altitude_angle: r.altitude_angle,
            azimuth_angle: r.azimuth_angle,
        }
    }
}

impl ColumnarRecord {
    /// Number of samples, if every column agrees.
    pub fn len(&self) -> Option<usize> {
        let n = self.sequence_number.len();
        let lens = [
            self.timestamp.len(),
            self.force.len(),
            self.x.len(),
            self.y.len(),
            self.altitude_angle.len(),
            self.azimuth_angle.len(),
        ];
        lens.iter().all(|&l| l == n).then_some(n)
    }

    /// Return `true` when the record holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

/// Encode the committed samples of `stroke`. Pending samples are not persisted.
pub fn encode(stroke: &Stroke) -> ColumnarRecord {
    let samples = stroke.committed_samples();
    let n = samples.len();
    let mut rec = ColumnarRecord {
        sequence_number: Vec::with_capacity(n),
        timestamp: Vec::with_capacity(n),
        force: Vec::with_capacity(n),
        x: Vec::with_capacity(n),
        y: Vec::with_capacity(n),
        altitude_angle: Vec::with_capacity(n),
        azimuth_angle: Vec::with_capacity(n),
    };
    for s in samples {
        rec.sequence_number.push(s.sequence_number);
        rec.timestamp.push(s.timestamp);
        rec.force.push(s.force);
        rec.x.push(s.x);
        rec.y.push(s.y);
        rec.altitude_angle.push(s.altitude_angle);
        rec.azimuth_angle.push(s.azimuth_angle);
    }
    rec
}

/// Zip the columns back into a committed stroke.
///
/// Columns of unequal length are rejected outright rather than truncated.
pub fn decode(rec: &ColumnarRecord) -> InkResult<Stroke> {
    let n = rec.len().ok_or_else(|| {
        InkError::codec(format!(
            "column lengths differ: sequenceNumber={} timestamp={} force={} x={} y={} altitudeAngle={} azimuthAngle={}",
            rec.sequence_number.len(),
            rec.timestamp.len(),
            rec.force.len(),
            rec.x.len(),
            rec.y.len(),
            rec.altitude_angle.len(),
            rec.azimuth_angle.len(),
        ))
    })?;

    let samples = (0..n)
        .map(|i| Sample {
            sequence_number: rec.sequence_number[i],
            timestamp: rec.timestamp[i],
            force: rec.force[i],
            x: rec.x[i],
            y: rec.y[i],
            altitude_angle: rec.altitude_angle[i],
            azimuth_angle: rec.azimuth_angle[i],
        })
        .collect::<Vec<_>>();

    Stroke::from_committed(samples).map_err(|e| InkError::codec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::model::sample_at;

    fn committed(n: i64) -> Stroke {
        let mut s = Stroke::new();
        for i in 0..n {
            let mut p = sample_at(i + 10, i as f64 * 1.5, 100.0 - i as f64);
            p.force = 0.1 * i as f64;
            p.azimuth_angle = -0.3 * i as f64;
            s.append_pending(p).unwrap();
        }
        s.commit().unwrap();
        s
    }

    #[test]
    fn decode_reproduces_committed_samples() {
        let s = committed(5);
        let back = decode(&encode(&s)).unwrap();
        assert!(back.is_committed());
        assert_eq!(back.committed_samples(), s.committed_samples());
    }

    #[test]
    fn pending_samples_are_not_encoded() {
        let mut s = Stroke::new();
        s.append_pending(sample_at(1, 0.0, 0.0)).unwrap();
        let rec = encode(&s);
        assert!(rec.is_empty());
    }

    #[test]
    fn length_mismatch_is_a_decode_error() {
        let mut rec = encode(&committed(3));
        rec.force.pop();
        let err = decode(&rec).unwrap_err();
        assert!(matches!(err, InkError::Codec(_)));
        assert!(err.to_string().contains("force=2"));
    }

    #[test]
    fn out_of_order_sequence_is_a_decode_error() {
        let mut rec = encode(&committed(3));
        rec.sequence_number.swap(0, 2);
        assert!(matches!(decode(&rec), Err(InkError::Codec(_))));
    }

    #[test]
    fn json_uses_camel_case_columns() {
        let json = serde_json::to_value(encode(&committed(1))).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "sequenceNumber",
            "timestamp",
            "force",
            "x",
            "y",
            "altitudeAngle",
            "azimuthAngle",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
    }
}
