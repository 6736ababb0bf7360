//! File-backed feature stores.
//!
//! A store is a single CSV or GeoJSON file. Reads materialise the whole
//! table; writes go to a temporary sibling file that is renamed over the
//! target only once every row has been written, so a reader never sees a
//! partially written score table.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};
use superblock_common::{AttributeValue, BuildingRecord, CandidateFeature, ScoredFeature, ScoringError};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{DbError, Result};
use crate::schema::{BuildingFieldMapping, FieldMapping, ScoreRow};

/// On-disk layout of a store, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    Csv,
    /// A GeoJSON FeatureCollection, or a plain JSON array of attribute objects.
    GeoJson,
}

impl StoreFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(StoreFormat::Csv),
            "geojson" | "json" => Ok(StoreFormat::GeoJson),
            _ => Err(DbError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Handle to one dataset file.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    path: PathBuf,
    format: StoreFormat,
}

impl FeatureStore {
    /// Open an existing dataset for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DbError::NotFound(path.display().to_string()));
        }
        Self::create(path)
    }

    /// Handle for a dataset that will be written. The file need not exist.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = StoreFormat::from_path(&path)?;
        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> StoreFormat {
        self.format
    }

    /// Read candidate blocks. The id, building-sum, width and height fields
    /// must all exist.
    pub fn read_candidates(&self, fields: &FieldMapping) -> Result<Vec<CandidateFeature>> {
        self.read_candidates_inner(fields, true)
    }

    /// Read candidate blocks whose building sums will be derived from a
    /// building dataset; the building-sum field may be absent.
    pub fn read_candidate_shapes(&self, fields: &FieldMapping) -> Result<Vec<CandidateFeature>> {
        self.read_candidates_inner(fields, false)
    }

    fn read_candidates_inner(
        &self,
        fields: &FieldMapping,
        require_building_sum: bool,
    ) -> Result<Vec<CandidateFeature>> {
        let table = self.read_table()?;
        if require_building_sum {
            table.require(&fields.building_score_sum)?;
        }
        table.require(&fields.width)?;
        table.require(&fields.height)?;
        if !table.has(&fields.id) && table.records.iter().any(|r| r.feature_id.is_none()) {
            return Err(table.missing(&fields.id).into());
        }

        let mut candidates = Vec::with_capacity(table.records.len());
        for (idx, record) in table.records.into_iter().enumerate() {
            let row = idx + 1;
            let id_value = record
                .attributes
                .get(&fields.id)
                .filter(|v| !v.is_null())
                .or(record.feature_id.as_ref())
                .ok_or_else(|| DbError::InvalidRecord { row, reason: "missing feature id".into() })?;
            let id = integer_value(id_value).ok_or_else(|| DbError::InvalidRecord {
                row,
                reason: format!("feature id '{id_value}' is not an integer"),
            })?;

            let building_score_sum = record
                .attributes
                .get(&fields.building_score_sum)
                .cloned()
                .unwrap_or_default();
            let width = real_cell(&record, &fields.width, row)?;
            let height = real_cell(&record, &fields.height, row)?;

            candidates.push(CandidateFeature {
                id,
                building_score_sum,
                width,
                height,
                geometry: record.geometry,
            });
        }

        info!(path = %self.path.display(), count = candidates.len(), "Loaded candidate features");
        Ok(candidates)
    }

    /// Read building records. The parcel field and at least one of the
    /// building class fields (GWR or cantonal) must exist.
    pub fn read_buildings(&self, fields: &BuildingFieldMapping) -> Result<Vec<BuildingRecord>> {
        let table = self.read_table()?;
        table.require(&fields.parcel_id)?;
        if !table.has(&fields.gklas) && !table.has(&fields.gebkatego) {
            return Err(table
                .missing(&format!("{} or {}", fields.gklas, fields.gebkatego))
                .into());
        }

        let code = |record: &RawRecord, field: &str| -> Option<i64> {
            record.attributes.get(field).and_then(integer_value)
        };

        let buildings: Vec<BuildingRecord> = table
            .records
            .iter()
            .map(|r| BuildingRecord {
                parcel_id: code(r, &fields.parcel_id),
                gklas: code(r, &fields.gklas),
                gstat: code(r, &fields.gstat),
                gebkatego: code(r, &fields.gebkatego),
                gebstatus: code(r, &fields.gebstatus),
            })
            .collect();

        info!(path = %self.path.display(), count = buildings.len(), "Loaded building records");
        Ok(buildings)
    }

    /// Persist a complete score table in one atomic replace.
    /// Only the output fields (plus geometry for GeoJSON) are retained.
    pub fn write_scored(&self, features: &[ScoredFeature]) -> Result<usize> {
        match self.format {
            StoreFormat::Csv => {
                let rows: Vec<ScoreRow> = features.iter().map(ScoreRow::from).collect();
                self.write_rows(&rows)?;
            }
            StoreFormat::GeoJson => {
                let mut out = Vec::with_capacity(features.len());
                for f in features {
                    out.push(json!({
                        "type": "Feature",
                        "id": f.id,
                        "geometry": f.geometry.clone().unwrap_or(Value::Null),
                        "properties": serde_json::to_value(ScoreRow::from(f))?,
                    }));
                }
                let collection = json!({ "type": "FeatureCollection", "features": out });
                let bytes = serde_json::to_vec_pretty(&collection)?;
                write_atomic(&self.path, |w| Ok(w.write_all(&bytes)?))?;
            }
        }
        info!(path = %self.path.display(), count = features.len(), "Score table written");
        Ok(features.len())
    }

    /// Write arbitrary serialisable rows as CSV, atomically.
    pub fn write_rows<T: Serialize>(&self, rows: &[T]) -> Result<()> {
        if self.format != StoreFormat::Csv {
            return Err(DbError::UnsupportedFormat(format!(
                "{} (tabular rows require .csv)",
                self.path.display()
            )));
        }
        write_atomic(&self.path, |w| {
            let mut wtr = csv::Writer::from_writer(w);
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
            Ok(())
        })
    }

    fn read_table(&self) -> Result<RawTable> {
        debug!(path = %self.path.display(), format = ?self.format, "Reading dataset");
        match self.format {
            StoreFormat::Csv => read_csv(&self.path),
            StoreFormat::GeoJson => read_geojson(&self.path),
        }
    }
}

/// Write through a temporary file in the target directory, then rename.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut std::fs::File) -> Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

// ── Raw tables ────────────────────────────────────────────────────────────────

struct RawRecord {
    attributes: HashMap<String, AttributeValue>,
    /// GeoJSON feature-level `id`, used when the id property is absent.
    feature_id: Option<AttributeValue>,
    geometry: Option<Value>,
}

struct RawTable {
    fields: Vec<String>,
    records: Vec<RawRecord>,
}

impl RawTable {
    fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    fn missing(&self, field: &str) -> ScoringError {
        ScoringError::MissingField {
            field: field.to_string(),
            available: self.fields.join(", "),
        }
    }

    fn require(&self, field: &str) -> Result<()> {
        if self.has(field) {
            Ok(())
        } else {
            Err(self.missing(field).into())
        }
    }
}

fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)?;
    let fields: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let attributes = fields
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| (name.clone(), AttributeValue::from_text(cell)))
            .collect();
        records.push(RawRecord { attributes, feature_id: None, geometry: None });
    }
    Ok(RawTable { fields, records })
}

fn read_geojson(path: &Path) -> Result<RawTable> {
    let content = std::fs::read_to_string(path)?;
    let root: Value = serde_json::from_str(&content)?;

    let items: Vec<&Value> = match &root {
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => match obj.get("features") {
            Some(Value::Array(features)) => features.iter().collect(),
            _ => return Err(DbError::InvalidGeoJson("expected a FeatureCollection with a 'features' array".into())),
        },
        _ => return Err(DbError::InvalidGeoJson("expected an object or an array at top level".into())),
    };

    let mut fields: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| DbError::InvalidRecord {
            row: idx + 1,
            reason: "feature is not an object".into(),
        })?;
        // A GeoJSON feature keeps its attributes under "properties";
        // a plain array element is the attribute object itself.
        let is_feature = obj.get("type").and_then(Value::as_str) == Some("Feature");
        let props = if is_feature {
            obj.get("properties").and_then(Value::as_object)
        } else {
            Some(obj)
        };

        let mut attributes = HashMap::new();
        if let Some(props) = props {
            for (key, value) in props {
                if !fields.iter().any(|f| f == key) {
                    fields.push(key.clone());
                }
                attributes.insert(key.clone(), AttributeValue::from_json(value));
            }
        }
        let (feature_id, geometry) = if is_feature {
            (
                obj.get("id").map(AttributeValue::from_json),
                obj.get("geometry").filter(|g| !g.is_null()).cloned(),
            )
        } else {
            (None, None)
        };
        records.push(RawRecord { attributes, feature_id, geometry });
    }
    Ok(RawTable { fields, records })
}

// ── Cell conversion ───────────────────────────────────────────────────────────

fn integer_value(value: &AttributeValue) -> Option<i64> {
    // 2^63 is exactly representable; anything at or above it would saturate.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let integral = |r: f64| (r.fract() == 0.0 && (-LIMIT..LIMIT).contains(&r)).then_some(r as i64);
    match value {
        AttributeValue::Integer(i) => Some(*i),
        AttributeValue::Real(r) => integral(*r),
        AttributeValue::Text(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        AttributeValue::Null => None,
    }
}

fn real_cell(record: &RawRecord, field: &str, row: usize) -> Result<Option<f64>> {
    match record.attributes.get(field) {
        None => Ok(None),
        Some(value) => value.to_real().map_err(|raw| DbError::InvalidRecord {
            row,
            reason: format!("field '{field}' value '{raw}' is not numeric"),
        }),
    }
}
