//! # Metadata Module
//!
//! Reads EXIF/IPTC/XMP tags for the files of one roll.
//!
//! ## Sources
//! - `ExifToolSource` - one `exiftool` process per roll, every tag group
//! - `EmbeddedExifSource` - EXIF only, read in-process; no IPTC/XMP fields
//! - `InMemorySource` - fixed tag maps, for testing
//!
//! A source returns a flat [`TagMap`] per path. Failure of the source is a
//! [`MetadataError`](crate::error::MetadataError) and aborts the roll.

mod cache;
mod embedded;
mod exiftool;
mod memory;
mod traits;

pub use cache::RollMetadataCache;
pub use embedded::EmbeddedExifSource;
pub use exiftool::ExifToolSource;
pub use memory::InMemorySource;
pub use traits::MetadataSource;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Flat `Group:Tag` → value map for one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagMap(BTreeMap<String, Value>);

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value for a key; null, empty and `NaN` values count as absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !is_absent(value))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Flatten one object of `exiftool -j -g1` output.
    ///
    /// Group objects become `Group:Tag` keys; top-level scalars such as
    /// `SourceFile` keep their bare name.
    pub fn from_grouped(object: &Map<String, Value>) -> Self {
        let mut tags = Self::new();
        for (group, value) in object {
            match value {
                Value::Object(inner) => {
                    for (tag, tag_value) in inner {
                        tags.insert(format!("{}:{}", group, tag), tag_value.clone());
                    }
                }
                other => tags.insert(group.clone(), other.clone()),
            }
        }
        tags
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let s = s.trim();
            s.is_empty() || s.eq_ignore_ascii_case("nan")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_grouped_output() {
        let object = json!({
            "SourceFile": "/rolls/2/a 1.jpg",
            "ExifIFD": { "DateTimeOriginal": "2022:06:12 10:00:00", "ISO": 200 },
            "IPTC": { "City": "Zurich" }
        });

        let tags = TagMap::from_grouped(object.as_object().unwrap());

        assert_eq!(tags.get("SourceFile"), Some(&json!("/rolls/2/a 1.jpg")));
        assert_eq!(tags.get("ExifIFD:ISO"), Some(&json!(200)));
        assert_eq!(tags.get("IPTC:City"), Some(&json!("Zurich")));
        assert_eq!(tags.len(), 4);
    }

    #[test]
    fn absent_values() {
        let tags: TagMap = [
            ("a", json!(null)),
            ("b", json!("  ")),
            ("c", json!("NaN")),
            ("d", json!(0)),
        ]
        .into_iter()
        .collect();

        assert!(!tags.contains("a"));
        assert!(!tags.contains("b"));
        assert!(!tags.contains("c"));
        assert!(tags.contains("d"));
    }
}
