use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::annotations::store::{AnnotationOpts, AnnotationStore};
use crate::foundation::core::TickRate;
use crate::foundation::error::{DocumentErrorKind, InkError, InkResult};
use crate::stroke::codec::{self, ColumnarRecord, SampleRecord};
use crate::stroke::model::{Sample, Stroke, StrokeId};

/// Bundle member holding completed strokes per tick.
pub const STATIC_DRAWINGS_FILE: &str = "staticDrawings.json";
/// Bundle member holding dynamic samples per tick.
pub const DYNAMIC_DRAWINGS_FILE: &str = "dynamicDrawings.json";
/// Bundle member referencing the annotated video.
pub const MOVIE_FILE: &str = "movie.json";

/// Reference to the annotated video.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MovieRef {
    /// Video location; relative paths resolve against the bundle's parent directory.
    pub location: PathBuf,
    /// Tick rate all bundle keys are expressed in.
    pub rate: TickRate,
}

impl MovieRef {
    /// Absolute path of the video, which must exist.
    pub fn resolve(&self, base: &Path) -> InkResult<PathBuf> {
        let path = if self.location.is_absolute() {
            self.location.clone()
        } else {
            base.join(&self.location)
        };
        if !path.is_file() {
            return Err(InkError::document(
                DocumentErrorKind::MovieUnresolvable,
                format!("'{}' does not exist", path.display()),
            ));
        }
        Ok(path)
    }
}

/// Counts reported by [`Document::summary`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Ticks with completed strokes.
    pub static_ticks: usize,
    /// Completed strokes.
    pub strokes: usize,
    /// Committed samples across all strokes.
    pub samples: usize,
    /// Ticks with dynamic samples.
    pub dynamic_ticks: usize,
    /// Dynamic samples.
    pub dynamic_samples: usize,
}

/// In-memory form of an annotation bundle directory.
#[derive(Clone, Debug, Default)]
pub struct Document {
    /// Completed strokes keyed by tick value.
    pub static_drawings: BTreeMap<i64, Vec<Arc<Stroke>>>,
    /// Dynamic samples keyed by tick value. Stroke identity is not persisted.
    pub dynamic_drawings: BTreeMap<i64, Vec<Sample>>,
    /// Annotated video; required to save.
    pub movie: Option<MovieRef>,
}

impl Document {
    /// Empty document for `movie`.
    pub fn new(movie: Option<MovieRef>) -> Self {
        Self {
            movie,
            ..Self::default()
        }
    }

    /// Snapshot the entries of `store`.
    pub fn from_store(store: &AnnotationStore, movie: Option<MovieRef>) -> Self {
        let static_drawings = store
            .static_entries()
            .map(|(t, strokes)| (t.value, strokes.to_vec()))
            .collect();
        let dynamic_drawings = store
            .dynamic_entries()
            .map(|(t, entries)| (t.value, entries.iter().map(|d| d.sample).collect()))
            .collect();
        Self {
            static_drawings,
            dynamic_drawings,
            movie,
        }
    }

    /// Build a store in the movie's rate. Every dynamic sample gets a fresh stroke identity.
    pub fn into_store(self, opts: AnnotationOpts) -> InkResult<AnnotationStore> {
        let rate = self
            .movie
            .as_ref()
            .map(|m| m.rate)
            .ok_or_else(|| InkError::document(DocumentErrorKind::MovieNotSet, "no movie set"))?;
        let mut store = AnnotationStore::new(rate, opts);
        for (k, strokes) in self.static_drawings {
            store.replace_strokes(rate.tick(k), strokes)?;
        }
        for (k, samples) in self.dynamic_drawings {
            for sample in samples {
                store.record_dynamic_sample(rate.tick(k), StrokeId::next(), sample)?;
            }
        }
        Ok(store)
    }

    /// Entry counts.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            static_ticks: self.static_drawings.len(),
            strokes: self.static_drawings.values().map(Vec::len).sum(),
            samples: self
                .static_drawings
                .values()
                .flatten()
                .map(|s| s.committed_samples().len())
                .sum(),
            dynamic_ticks: self.dynamic_drawings.len(),
            dynamic_samples: self.dynamic_drawings.values().map(Vec::len).sum(),
        }
    }

    /// Write the bundle members into `dir`, creating it if needed.
    #[tracing::instrument(skip(self))]
    pub fn save(&self, dir: &Path) -> InkResult<()> {
        let movie = self
            .movie
            .as_ref()
            .ok_or_else(|| InkError::document(DocumentErrorKind::MovieNotSet, "no movie set"))?;

        let static_codable: BTreeMap<i64, Vec<ColumnarRecord>> = self
            .static_drawings
            .iter()
            .map(|(&k, strokes)| (k, strokes.iter().map(|s| codec::encode(s)).collect()))
            .collect();
        let dynamic_codable: BTreeMap<i64, Vec<SampleRecord>> = self
            .dynamic_drawings
            .iter()
            .map(|(&k, samples)| (k, samples.iter().map(SampleRecord::from).collect()))
            .collect();

        std::fs::create_dir_all(dir)
            .with_context(|| format!("create bundle dir '{}'", dir.display()))?;
        write_member(dir, STATIC_DRAWINGS_FILE, &static_codable)?;
        write_member(dir, DYNAMIC_DRAWINGS_FILE, &dynamic_codable)?;
        write_member(dir, MOVIE_FILE, movie)?;
        tracing::debug!(summary = ?self.summary(), "bundle saved");
        Ok(())
    }

    /// Read a bundle from `dir`.
    ///
    /// Every member must be present and every stroke must decode; otherwise nothing is returned.
    #[tracing::instrument]
    pub fn load(dir: &Path) -> InkResult<Self> {
        let static_bytes = read_member(dir, STATIC_DRAWINGS_FILE)?;
        let dynamic_bytes = read_member(dir, DYNAMIC_DRAWINGS_FILE)?;
        let movie_bytes = read_member(dir, MOVIE_FILE)?;

        let static_codable: BTreeMap<i64, Vec<ColumnarRecord>> =
            parse_tick_map(STATIC_DRAWINGS_FILE, &static_bytes)?;
        let dynamic_codable: BTreeMap<i64, Vec<SampleRecord>> =
            parse_tick_map(DYNAMIC_DRAWINGS_FILE, &dynamic_bytes)?;
        let movie: MovieRef = serde_json::from_slice(&movie_bytes)
            .map_err(|e| InkError::serde(format!("{MOVIE_FILE}: {e}")))?;
        TickRate::new(movie.rate.per_second).map_err(|e| {
            InkError::document(DocumentErrorKind::MalformedPackage, format!("{MOVIE_FILE}: {e}"))
        })?;

        let mut static_drawings = BTreeMap::new();
        for (k, records) in static_codable {
            let strokes = records
                .iter()
                .map(|r| codec::decode(r).map(Arc::new))
                .collect::<InkResult<Vec<_>>>()?;
            static_drawings.insert(k, strokes);
        }
        let dynamic_drawings = dynamic_codable
            .into_iter()
            .map(|(k, records)| (k, records.into_iter().map(Sample::from).collect()))
            .collect();

        let doc = Self {
            static_drawings,
            dynamic_drawings,
            movie: Some(movie),
        };
        tracing::debug!(summary = ?doc.summary(), "bundle loaded");
        Ok(doc)
    }
}

fn write_member<T: serde::Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> InkResult<()> {
    let bytes =
        serde_json::to_vec_pretty(value).map_err(|e| InkError::serde(format!("{name}: {e}")))?;
    let path = dir.join(name);
    std::fs::write(&path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

fn read_member(dir: &Path, name: &str) -> InkResult<Vec<u8>> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(InkError::document(
            DocumentErrorKind::MalformedPackage,
            format!("missing member '{name}' in '{}'", dir.display()),
        ));
    }
    let bytes = std::fs::read(&path).with_context(|| format!("read '{}'", path.display()))?;
    Ok(bytes)
}

/// Parse a tick-keyed map from either a JSON object with decimal keys or the legacy flat
/// `[key, value, key, value, ...]` array.
fn parse_tick_map<V: DeserializeOwned>(name: &str, bytes: &[u8]) -> InkResult<BTreeMap<i64, V>> {
    let parsed: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| InkError::serde(format!("{name}: {e}")))?;
    let pairs: Vec<(serde_json::Value, serde_json::Value)> = match parsed {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| (serde_json::Value::String(k), v))
            .collect(),
        serde_json::Value::Array(flat) => {
            if flat.len() % 2 != 0 {
                return Err(InkError::serde(format!(
                    "{name}: flat key/value array has odd length {}",
                    flat.len()
                )));
            }
            let mut it = flat.into_iter();
            let mut pairs = Vec::new();
            while let (Some(k), Some(v)) = (it.next(), it.next()) {
                pairs.push((k, v));
            }
            pairs
        }
        other => {
            return Err(InkError::serde(format!(
                "{name}: expected an object or array, got {other}"
            )));
        }
    };

    let mut out = BTreeMap::new();
    for (k, v) in pairs {
        let key = match &k {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse::<i64>().ok(),
            _ => None,
        }
        .ok_or_else(|| InkError::serde(format!("{name}: invalid tick key {k}")))?;
        let value =
            serde_json::from_value::<V>(v).map_err(|e| InkError::serde(format!("{name}: {e}")))?;
        out.insert(key, value);
    }
    Ok(out)
}
