//! GeoJSON feature collections and the record-to-feature join.
//!
//! Features are never edited in place. Joining an aggregate produces a new
//! collection whose features share the original geometry (`Arc`) and copy every
//! property, with only the derived value property replaced.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::aggregate::AggregateMap;
use crate::config::GeoJoin;
use crate::errors::PipelineError;
use crate::types::{AggregateKey, LocationKey};

/// One GeoJSON feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// GeoJSON member type, `"Feature"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque geometry object, shared between derived collections.
    #[serde(default)]
    pub geometry: Arc<Value>,
    /// Property object; GeoJSON allows `null` here.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    /// Any other members (`id`, `bbox`, ...), preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Feature {
    /// Property value by name.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.as_ref()?.get(name)
    }

    /// Join key read from `property`.
    ///
    /// Strings are used verbatim and numbers by their decimal rendering; any
    /// other value (or a missing property) yields `None`.
    pub fn join_key(&self, property: &str) -> Option<LocationKey> {
        match self.property(property)? {
            Value::String(key) => Some(key.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }

    /// Copy of this feature with `property` set to `value`.
    fn with_property(&self, property: &str, value: Value) -> Feature {
        let mut properties = self.properties.clone().unwrap_or_default();
        properties.insert(property.to_string(), value);
        Feature {
            kind: self.kind.clone(),
            geometry: Arc::clone(&self.geometry),
            properties: Some(properties),
            extra: self.extra.clone(),
        }
    }
}

/// GeoJSON `FeatureCollection`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// GeoJSON member type, `"FeatureCollection"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Member features in document order.
    pub features: Vec<Feature>,
    /// Any other top-level members (`name`, `crs`, `bbox`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureCollection {
    /// Parse a GeoJSON document, requiring `"type": "FeatureCollection"`.
    pub fn from_json_str(source_id: &str, text: &str) -> Result<Self, PipelineError> {
        let collection: FeatureCollection = serde_json::from_str(text)?;
        if collection.kind != "FeatureCollection" {
            return Err(PipelineError::SourceInconsistent {
                source_id: source_id.to_string(),
                details: format!("expected a FeatureCollection, found '{}'", collection.kind),
            });
        }
        Ok(collection)
    }

    /// Serialize back to compact GeoJSON.
    pub fn to_json_string(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True when the collection has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Join keys of every feature that has one, in feature order.
    pub fn join_keys(&self, property: &str) -> Vec<LocationKey> {
        self.features
            .iter()
            .filter_map(|feature| feature.join_key(property))
            .collect()
    }

    /// New collection with `join.value_property` set on every feature.
    ///
    /// Features whose key has no aggregate entry get `0`. Aggregate keys that
    /// match no feature are reported in `unmatched_keys`; they still count in
    /// every non-map output.
    pub fn with_values(&self, values: &AggregateMap, join: &GeoJoin) -> JoinedFeatures {
        let mut feature_keys: HashSet<LocationKey> = HashSet::with_capacity(self.features.len());
        let mut matched = 0usize;
        let features = self
            .features
            .iter()
            .map(|feature| {
                let key = feature.join_key(&join.join_property);
                let value = key
                    .as_ref()
                    .and_then(|key| values.get(key))
                    .copied()
                    .inspect(|_| matched += 1)
                    .unwrap_or(0.0);
                if let Some(key) = key {
                    feature_keys.insert(key);
                }
                feature.with_property(&join.value_property, number_value(value))
            })
            .collect();

        let unmatched_keys: Vec<AggregateKey> = values
            .keys()
            .filter(|key| !feature_keys.contains(*key))
            .cloned()
            .collect();
        if !unmatched_keys.is_empty() {
            debug!(
                "[regionpulse:geo] {} aggregate keys match no feature (first: {:?})",
                unmatched_keys.len(),
                unmatched_keys.first()
            );
        }

        JoinedFeatures {
            features: FeatureCollection {
                kind: self.kind.clone(),
                features,
                extra: self.extra.clone(),
            },
            matched,
            unmatched_keys,
        }
    }
}

/// Output of [`FeatureCollection::with_values`].
#[derive(Clone, Debug, PartialEq)]
pub struct JoinedFeatures {
    /// Derived collection.
    pub features: FeatureCollection,
    /// Features that found an aggregate entry.
    pub matched: usize,
    /// Aggregate keys with no feature.
    pub unmatched_keys: Vec<AggregateKey>,
}

/// JSON number for a derived value; integral values serialize without a fraction.
fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STATES: &str = r#"{
        "type": "FeatureCollection",
        "name": "us-states",
        "features": [
            {"type": "Feature", "id": "06", "properties": {"name": "California", "density": 241.7},
             "geometry": {"type": "Polygon", "coordinates": [[[-124.0, 42.0], [-120.0, 42.0], [-120.0, 39.0], [-124.0, 42.0]]]}},
            {"type": "Feature", "properties": {"name": "Texas"},
             "geometry": {"type": "Polygon", "coordinates": [[[-106.0, 32.0], [-94.0, 33.0], [-97.0, 26.0], [-106.0, 32.0]]]}},
            {"type": "Feature", "properties": null, "geometry": null}
        ]
    }"#;

    fn join() -> GeoJoin {
        GeoJoin::default()
    }

    #[test]
    fn parses_and_preserves_unknown_members() {
        let collection = FeatureCollection::from_json_str("states", STATES).unwrap();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.extra.get("name"), Some(&json!("us-states")));
        assert_eq!(collection.features[0].extra.get("id"), Some(&json!("06")));
        assert_eq!(collection.join_keys("name"), vec!["California", "Texas"]);
    }

    #[test]
    fn rejects_non_collections() {
        let err = FeatureCollection::from_json_str("bad", r#"{"type": "Feature", "features": []}"#)
            .unwrap_err();
        assert!(matches!(err, PipelineError::SourceInconsistent { .. }));
        assert!(matches!(
            FeatureCollection::from_json_str("bad", "{"),
            Err(PipelineError::GeoJson(_))
        ));
    }

    #[test]
    fn with_values_builds_new_collection_without_touching_original() {
        let collection = FeatureCollection::from_json_str("states", STATES).unwrap();
        let original = collection.clone();
        let mut values = AggregateMap::new();
        values.insert("California".to_string(), 50.0);
        values.insert("Puerto Rico".to_string(), 4.5);

        let joined = collection.with_values(&values, &join());
        assert_eq!(collection, original);
        assert_eq!(joined.matched, 1);
        assert_eq!(joined.unmatched_keys, vec!["Puerto Rico".to_string()]);

        let features = &joined.features.features;
        assert_eq!(features[0].property("value"), Some(&json!(50)));
        assert_eq!(features[0].property("density"), Some(&json!(241.7)));
        assert_eq!(features[1].property("value"), Some(&json!(0)));
        assert_eq!(features[2].property("value"), Some(&json!(0)));
        assert!(Arc::ptr_eq(&features[0].geometry, &collection.features[0].geometry));
        assert_eq!(joined.features.extra, collection.extra);
    }

    #[test]
    fn numeric_join_properties_match_decimal_keys() {
        let collection = FeatureCollection::from_json_str(
            "beats",
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"beat": 112}, "geometry": null}
            ]}"#,
        )
        .unwrap();
        let mut values = AggregateMap::new();
        values.insert("112".to_string(), 3.0);
        let joined = collection.with_values(
            &values,
            &GeoJoin {
                join_property: "beat".to_string(),
                value_property: "count".to_string(),
            },
        );
        assert_eq!(joined.matched, 1);
        assert_eq!(joined.features.features[0].property("count"), Some(&json!(3)));
    }

    #[test]
    fn fractional_values_serialize_as_floats() {
        assert_eq!(number_value(2.5), json!(2.5));
        assert_eq!(number_value(7.0), json!(7));
    }

    #[test]
    fn serializes_back_to_geojson() {
        let collection = FeatureCollection::from_json_str("states", STATES).unwrap();
        let text = collection.to_json_string().unwrap();
        let reparsed = FeatureCollection::from_json_str("states", &text).unwrap();
        assert_eq!(reparsed, collection);
    }
}
