use crate::error::LfResult;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumIter, EnumString};

pub const RESULT_FILE: &str = "results.json";

/// How much of the analysis ends up on disk.
#[derive(
    Debug, Clone, Copy, EnumIter, EnumString, Display, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum SavingMode {
    /// Every statistic family.
    Data,
    /// Parameters and headline scalars only, for parameter maps.
    Map,
}

/// One value of a result record.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Text(String),
    Int(i64),
    Float(f64),
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
    Missing,
}

/// Serializes non-finite floats as `null`.
struct Nullable(f64);

impl Serialize for Nullable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_none()
        }
    }
}

struct NullableSlice<'a>(&'a [f64]);

impl Serialize for NullableSlice<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for &v in self.0 {
            seq.serialize_element(&Nullable(v))?;
        }
        seq.end()
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Text(s) => serializer.serialize_str(s),
            Field::Int(i) => serializer.serialize_i64(*i),
            Field::Float(v) => Nullable(*v).serialize(serializer),
            Field::Vector(v) => NullableSlice(v).serialize(serializer),
            Field::Matrix(rows) => {
                let mut seq = serializer.serialize_seq(Some(rows.len()))?;
                for row in rows {
                    seq.serialize_element(&NullableSlice(row))?;
                }
                seq.end()
            }
            Field::Missing => serializer.serialize_none(),
        }
    }
}

/// Insertion-ordered mapping from keys to typed fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRecord {
    entries: Vec<(String, Field)>,
}

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`.
    pub fn push(&mut self, key: &str, field: Field) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = field,
            None => self.entries.push((key.to_string(), field)),
        }
    }

    pub fn text(&mut self, key: &str, value: impl Into<String>) {
        self.push(key, Field::Text(value.into()));
    }

    pub fn int(&mut self, key: &str, value: i64) {
        self.push(key, Field::Int(value));
    }

    pub fn float(&mut self, key: &str, value: f64) {
        self.push(key, Field::Float(value));
    }

    pub fn optional(&mut self, key: &str, value: Option<f64>) {
        self.push(key, value.map_or(Field::Missing, Field::Float));
    }

    pub fn vector(&mut self, key: &str, values: &[f64]) {
        self.push(key, Field::Vector(values.to_vec()));
    }

    pub fn counts(&mut self, key: &str, values: &[u64]) {
        self.push(
            key,
            Field::Vector(values.iter().map(|&c| c as f64).collect()),
        );
    }

    pub fn matrix(&mut self, key: &str, rows: &[Vec<f64>]) {
        self.push(key, Field::Matrix(rows.to_vec()));
    }

    pub fn add<R: RecordFields + ?Sized>(&mut self, family: &R) {
        family.write_fields(self);
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, f)| f)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scalar lookup; `None` for missing, non-finite or non-scalar fields.
    pub fn scalar(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Field::Float(v) if v.is_finite() => Some(*v),
            Field::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A statistic family that knows how to lay itself out in a record.
pub trait RecordFields {
    fn write_fields(&self, record: &mut ResultRecord);
}

/// Writes `record` as `<dir>/results.json`, creating `dir` if needed.
pub fn write_record(dir: &Path, record: &ResultRecord) -> LfResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(RESULT_FILE);
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer(&mut writer, record)?;
    writer.flush()?;
    Ok(path)
}
