//! Request payloads and their wire encodings.
//!
//! A [`Payload`] is a string-keyed map of [`PayloadValue`]s. Depending on the
//! request it is sent as a JSON body, as `multipart/form-data` fields, or as
//! query parameters. The form and query encodings [`flatten`] nested arrays
//! and objects into bracketed keys (`parent[0][child]`).

use std::collections::BTreeMap;

use reqwest::multipart::{Form, Part};
use serde_json::{Map, Number, Value};

use crate::Error;

/// Binary content attached to a multipart request.
#[derive(Clone, PartialEq)]
pub struct FilePart {
    pub filename: String,
    pub data: Vec<u8>,
    /// Defaults to `application/octet-stream` when unset.
    pub mime_type: Option<String>,
}

impl FilePart {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
            mime_type: None,
        }
    }
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("filename", &self.filename)
            .field("len", &self.data.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// A single payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<PayloadValue>),
    Object(Payload),
    File(FilePart),
}

/// String-keyed request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(BTreeMap<String, PayloadValue>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PayloadValue)> {
        self.0.iter()
    }

    /// Converts to a JSON object. Fails if any value is a [`FilePart`].
    pub fn to_json(&self) -> Result<Value, Error> {
        object_to_json(self, "")
    }

    /// Flattens the payload into `(key, text)` query parameters.
    ///
    /// `null` and binary values are skipped.
    pub fn to_query(&self) -> Vec<(String, String)> {
        flatten(self)
            .0
            .into_iter()
            .filter_map(|(key, value)| leaf_text(&value).map(|text| (key, text)))
            .collect()
    }

    /// Encodes the payload as a multipart form.
    ///
    /// Nested values are flattened; binary values become file parts.
    pub fn into_form(self) -> Result<Form, Error> {
        let mut form = Form::new();
        for (key, value) in flatten(&self).0 {
            match value {
                PayloadValue::File(file) => {
                    let mime = file
                        .mime_type
                        .unwrap_or_else(|| "application/octet-stream".into());
                    let part = Part::bytes(file.data)
                        .file_name(file.filename)
                        .mime_str(&mime)?;
                    form = form.part(key, part);
                }
                other => {
                    if let Some(text) = leaf_text(&other) {
                        form = form.text(key, text);
                    }
                }
            }
        }
        Ok(form)
    }
}

impl FromIterator<(String, PayloadValue)> for Payload {
    fn from_iter<I: IntoIterator<Item = (String, PayloadValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Payload {
    type Item = (String, PayloadValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, PayloadValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Flattens nested arrays and objects into bracket-suffixed keys.
///
/// `{"a": [{"b": 1}, {"b": 2}]}` becomes `{"a[0][b]": 1, "a[1][b]": 2}`.
/// Scalars and files are kept as leaves; an already flat payload is
/// returned unchanged.
pub fn flatten(payload: &Payload) -> Payload {
    let mut out = Payload::new();
    for (key, value) in payload.iter() {
        flatten_into(&mut out, key.clone(), value);
    }
    out
}

fn flatten_into(out: &mut Payload, key: String, value: &PayloadValue) {
    match value {
        PayloadValue::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(out, format!("{key}[{i}]"), item);
            }
        }
        PayloadValue::Object(map) => {
            for (k, v) in map.iter() {
                flatten_into(out, format!("{key}[{k}]"), v);
            }
        }
        leaf => out.insert(key, leaf.clone()),
    }
}

/// Text form of a scalar leaf; `None` for values with no text form.
fn leaf_text(value: &PayloadValue) -> Option<String> {
    match value {
        PayloadValue::String(s) => Some(s.clone()),
        PayloadValue::Bool(b) => Some(b.to_string()),
        PayloadValue::Number(n) => Some(n.to_string()),
        PayloadValue::Null
        | PayloadValue::File(_)
        | PayloadValue::Array(_)
        | PayloadValue::Object(_) => None,
    }
}

fn object_to_json(payload: &Payload, prefix: &str) -> Result<Value, Error> {
    let mut map = Map::new();
    for (key, value) in payload.iter() {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}[{key}]")
        };
        map.insert(key.clone(), value_to_json(value, &path)?);
    }
    Ok(Value::Object(map))
}

fn value_to_json(value: &PayloadValue, path: &str) -> Result<Value, Error> {
    Ok(match value {
        PayloadValue::Null => Value::Null,
        PayloadValue::Bool(b) => Value::Bool(*b),
        PayloadValue::Number(n) => Value::Number(n.clone()),
        PayloadValue::String(s) => Value::String(s.clone()),
        PayloadValue::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| value_to_json(item, &format!("{path}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        PayloadValue::Object(map) => object_to_json(map, path)?,
        PayloadValue::File(_) => return Err(Error::BinaryInJson(path.to_string())),
    })
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<&str> for PayloadValue {
    fn from(s: &str) -> Self {
        PayloadValue::String(s.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(s: String) -> Self {
        PayloadValue::String(s)
    }
}

impl From<bool> for PayloadValue {
    fn from(b: bool) -> Self {
        PayloadValue::Bool(b)
    }
}

impl From<i64> for PayloadValue {
    fn from(n: i64) -> Self {
        PayloadValue::Number(n.into())
    }
}

impl From<u64> for PayloadValue {
    fn from(n: u64) -> Self {
        PayloadValue::Number(n.into())
    }
}

impl From<f64> for PayloadValue {
    /// Non-finite floats have no JSON representation and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(PayloadValue::Null, PayloadValue::Number)
    }
}

impl From<FilePart> for PayloadValue {
    fn from(file: FilePart) -> Self {
        PayloadValue::File(file)
    }
}

impl From<Payload> for PayloadValue {
    fn from(map: Payload) -> Self {
        PayloadValue::Object(map)
    }
}

impl<T: Into<PayloadValue>> From<Vec<T>> for PayloadValue {
    fn from(items: Vec<T>) -> Self {
        PayloadValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PayloadValue>> From<Option<T>> for PayloadValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PayloadValue::Null, Into::into)
    }
}

impl From<Value> for PayloadValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PayloadValue::Null,
            Value::Bool(b) => PayloadValue::Bool(b),
            Value::Number(n) => PayloadValue::Number(n),
            Value::String(s) => PayloadValue::String(s),
            Value::Array(items) => {
                PayloadValue::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(map) => PayloadValue::Object(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}
