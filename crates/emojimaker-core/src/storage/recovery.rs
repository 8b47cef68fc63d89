//! Tolerant loading of persisted element sequences.
//!
//! Entries that are not objects are dropped; missing or malformed fields
//! are backfilled from defaults instead of failing the whole load.

use std::collections::HashSet;

use kurbo::Point;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::element::{
    DEFAULT_INITIAL_CENTER, Element, ElementId, ElementKind, Geometry, SerializableColor,
    VisualStyle,
};

/// Result of recovering a persisted sequence.
#[derive(Debug, Clone, Default)]
pub struct Recovered {
    pub elements: Vec<Element>,
    /// Number of entries that could not be recovered.
    pub dropped: usize,
}

impl Recovered {
    pub fn is_clean(&self) -> bool {
        self.dropped == 0
    }
}

/// Parse a persisted element sequence, dropping invalid entries.
///
/// Returns `Err` only when `json` is not valid JSON at all; the caller
/// should then discard the stored value.
pub fn recover_elements(json: &str) -> Result<Recovered, serde_json::Error> {
    let value: Value = serde_json::from_str(json)?;
    Ok(recover_value(value))
}

fn recover_value(value: Value) -> Recovered {
    let Value::Array(entries) = value else {
        log::warn!("Persisted elements are not an array, starting empty");
        return Recovered {
            elements: Vec::new(),
            dropped: 1,
        };
    };

    let mut recovered = Recovered::default();
    let mut seen = HashSet::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            Value::Object(fields) => {
                let element = recover_element(fields, &mut seen);
                recovered.elements.push(element);
            }
            other => {
                log::warn!("Skipping invalid element at index {}: {}", index, other);
                recovered.dropped += 1;
            }
        }
    }
    recovered
}

fn recover_element(mut fields: Map<String, Value>, seen: &mut HashSet<ElementId>) -> Element {
    let kind = fields
        .remove("type")
        .and_then(|v| serde_json::from_value::<ElementKind>(v).ok())
        .unwrap_or_default();

    let content = match fields.remove("content") {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };

    let id = fields
        .remove("id")
        .and_then(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
        .filter(|id| !seen.contains(id))
        .unwrap_or_else(Uuid::new_v4);
    seen.insert(id);

    let mut geometry = fields
        .remove("geometry")
        .and_then(|v| serde_json::from_value::<Geometry>(v).ok())
        .unwrap_or_default();
    geometry.sanitize();

    let mut style = match fields.remove("style") {
        Some(Value::Object(style)) => recover_style(style),
        _ => VisualStyle::default(),
    };
    style.sanitize();

    let initial_center = fields
        .remove("initialCenter")
        .and_then(|v| serde_json::from_value::<Point>(v).ok())
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .unwrap_or(DEFAULT_INITIAL_CENTER);

    Element::reconstruct(id, kind, content, geometry, style, initial_center)
}

/// Overlay persisted style fields onto the default style one at a time,
/// keeping only the fields that parse.
fn recover_style(fields: Map<String, Value>) -> VisualStyle {
    let mut merged = match serde_json::to_value(VisualStyle::default()) {
        Ok(Value::Object(map)) => map,
        _ => return VisualStyle::default(),
    };

    for (key, value) in fields {
        let value = match (key.as_str(), value) {
            // Colors may be stored as CSS hex strings.
            ("color" | "background", Value::String(hex)) => {
                match SerializableColor::from_hex(&hex).and_then(|c| serde_json::to_value(c).ok()) {
                    Some(v) => v,
                    None => {
                        log::warn!("Ignoring unparseable {} {:?}", key, hex);
                        continue;
                    }
                }
            }
            (_, value) => value,
        };

        let previous = merged.insert(key.clone(), value);
        if serde_json::from_value::<VisualStyle>(Value::Object(merged.clone())).is_err() {
            log::warn!("Ignoring malformed style field {:?}", key);
            match previous {
                Some(previous) => merged.insert(key, previous),
                None => merged.remove(&key),
            };
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or_default()
}
