//! Properties: the metadata bundle attached to a node or a link.
//!
//! Serialized form is a JSON object whose first two keys are always
//! `core-descriptor` and `core-link`, followed by every named attribute set
//! in lexicographic order. The two core keys are emitted with zero values
//! when unset so downstream tooling can rely on their presence.

use std::collections::BTreeMap;

use linkpack_common::error::{LinkpackError, Result};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::attributes::AttributeSet;

/// Key of the descriptor attributes in serialized properties.
pub const CORE_DESCRIPTOR_KEY: &str = "core-descriptor";

/// Key of the link attributes in serialized properties.
pub const CORE_LINK_KEY: &str = "core-link";

/// Hints describing how a reference to a blob should be expressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkAttributes {
    /// Registry expected to host the referenced content.
    pub registry_hint: String,
    /// Namespace (repository) expected to host the referenced content.
    pub namespace_hint: String,
    /// Whether consumers should follow the link when pulling.
    pub transitive: bool,
}

impl LinkAttributes {
    /// Returns `true` when every field holds its zero value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Identity and provenance of the component a blob represents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Component {
    /// Stable component identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Component version.
    pub version: String,
    /// Component type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Tool or process that discovered the component.
    pub found_by: String,
    /// Locations the component was found at.
    pub locations: Option<Vec<String>>,
    /// License identifiers.
    pub licenses: Option<Vec<String>>,
    /// Implementation language.
    pub language: String,
    /// CPE identifiers.
    pub cpes: Option<Vec<String>>,
    /// Package URL.
    pub purl: String,
}

/// Descriptor-level attributes: the component a blob describes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorAttributes {
    /// Component identity.
    #[serde(flatten)]
    pub component: Component,
}

impl DescriptorAttributes {
    /// Returns `true` when every field holds its zero value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Link, descriptor, and named attribute sets for one node or edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    /// Link attributes, if any were assigned.
    pub link: Option<LinkAttributes>,
    /// Descriptor attributes, if any were assigned.
    pub descriptor: Option<DescriptorAttributes>,
    others: BTreeMap<String, AttributeSet>,
}

impl Properties {
    /// Creates empty properties.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the link attributes.
    #[must_use]
    pub fn with_link(mut self, link: LinkAttributes) -> Self {
        self.link = Some(link);
        self
    }

    /// Sets the descriptor attributes.
    #[must_use]
    pub fn with_descriptor(mut self, descriptor: DescriptorAttributes) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Adds or replaces a named attribute set.
    ///
    /// # Errors
    ///
    /// Returns `LinkpackError::Config` if `name` collides with a core key.
    pub fn insert_set(&mut self, name: impl Into<String>, set: AttributeSet) -> Result<()> {
        let name = name.into();
        if name == CORE_DESCRIPTOR_KEY || name == CORE_LINK_KEY {
            return Err(LinkpackError::Config {
                message: format!("attribute set name {name} is reserved"),
            });
        }
        let _ = self.others.insert(name, set);
        Ok(())
    }

    /// Looks up a named attribute set.
    #[must_use]
    pub fn set(&self, name: &str) -> Option<&AttributeSet> {
        self.others.get(name)
    }

    /// Iterates over named attribute sets in name order.
    pub fn sets(&self) -> impl Iterator<Item = (&str, &AttributeSet)> {
        self.others.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the link attributes, or their zero value.
    #[must_use]
    pub fn link_or_default(&self) -> LinkAttributes {
        self.link.clone().unwrap_or_default()
    }

    /// Layers `overlay` on top of these properties.
    ///
    /// Link and descriptor attributes present in the overlay replace the
    /// current ones; named sets are merged key by key.
    pub fn merge(&mut self, overlay: Self) {
        if overlay.link.is_some() {
            self.link = overlay.link;
        }
        if overlay.descriptor.is_some() {
            self.descriptor = overlay.descriptor;
        }
        for (name, set) in overlay.others {
            self.others.entry(name).or_default().merge(set);
        }
    }

    /// Returns `true` if nothing beyond zero values is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.link.as_ref().is_none_or(LinkAttributes::is_empty)
            && self
                .descriptor
                .as_ref()
                .is_none_or(DescriptorAttributes::is_empty)
            && self.others.is_empty()
    }

    /// Serializes to the canonical compact JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if an attribute set holds a non-finite float.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let descriptor = self.descriptor.clone().unwrap_or_default();
        let link = self.link_or_default();
        let mut map = serializer.serialize_map(Some(self.others.len() + 2))?;
        map.serialize_entry(CORE_DESCRIPTOR_KEY, &descriptor)?;
        map.serialize_entry(CORE_LINK_KEY, &link)?;
        for (name, set) in &self.others {
            map.serialize_entry(name, set)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let descriptor = raw
            .remove(CORE_DESCRIPTOR_KEY)
            .map(serde_json::from_value::<DescriptorAttributes>)
            .transpose()
            .map_err(D::Error::custom)?
            .filter(|d| !d.is_empty());
        let link = raw
            .remove(CORE_LINK_KEY)
            .map(serde_json::from_value::<LinkAttributes>)
            .transpose()
            .map_err(D::Error::custom)?
            .filter(|l| !l.is_empty());
        let others = raw
            .into_iter()
            .map(|(name, value)| {
                let serde_json::Value::Object(entries) = value else {
                    return Err(D::Error::custom(format!(
                        "attribute set {name} is not an object"
                    )));
                };
                let set = AttributeSet::from_json(&entries).map_err(D::Error::custom)?;
                Ok((name, set))
            })
            .collect::<std::result::Result<_, D::Error>>()?;
        Ok(Self {
            link,
            descriptor,
            others,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeValue;

    #[test]
    fn marshal_emits_core_keys_first_then_sorted_sets() {
        let set: AttributeSet = [
            ("name", AttributeValue::from("test")),
            ("size", AttributeValue::from(2_i64)),
        ]
        .into_iter()
        .collect();
        let mut props = Properties::new()
            .with_link(LinkAttributes {
                registry_hint: "test".into(),
                namespace_hint: "namespace".into(),
                transitive: false,
            })
            .with_descriptor(DescriptorAttributes {
                component: Component {
                    id: "id".into(),
                    ..Component::default()
                },
            });
        props.insert_set("test", set).expect("insert");

        let expected = concat!(
            r#"{"core-descriptor":{"id":"id","name":"","version":"","type":"","foundBy":"","locations":null,"licenses":null,"language":"","cpes":null,"purl":""},"#,
            r#""core-link":{"registryHint":"test","namespaceHint":"namespace","transitive":false},"#,
            r#""test":{"name":"test","size":2}}"#,
        );
        assert_eq!(props.to_json().expect("json"), expected);
    }

    #[test]
    fn empty_properties_still_emit_core_keys() {
        let json = Properties::new().to_json().expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        let object = value.as_object().expect("object");
        assert_eq!(object.len(), 2);
        assert!(object.contains_key(CORE_DESCRIPTOR_KEY));
        assert!(object.contains_key(CORE_LINK_KEY));
        assert_eq!(object[CORE_LINK_KEY]["transitive"], serde_json::json!(false));
        assert!(json.starts_with(r#"{"core-descriptor":"#));
    }

    #[test]
    fn named_sets_serialize_in_name_order() {
        let mut forward = Properties::new();
        forward
            .insert_set("zeta", [("k", 1_i64)].into_iter().collect())
            .expect("insert");
        forward
            .insert_set("alpha", [("k", 2_i64)].into_iter().collect())
            .expect("insert");

        let mut reverse = Properties::new();
        reverse
            .insert_set("alpha", [("k", 2_i64)].into_iter().collect())
            .expect("insert");
        reverse
            .insert_set("zeta", [("k", 1_i64)].into_iter().collect())
            .expect("insert");

        let json = forward.to_json().expect("json");
        assert_eq!(json, reverse.to_json().expect("json"));
        let alpha = json.find("\"alpha\"").expect("alpha");
        let zeta = json.find("\"zeta\"").expect("zeta");
        assert!(alpha < zeta);
    }

    #[test]
    fn reserved_set_names_are_rejected() {
        let mut props = Properties::new();
        assert!(props.insert_set(CORE_LINK_KEY, AttributeSet::new()).is_err());
        assert!(
            props
                .insert_set(CORE_DESCRIPTOR_KEY, AttributeSet::new())
                .is_err()
        );
    }

    #[test]
    fn merge_layers_overlay_on_base() {
        let mut base = Properties::new().with_link(LinkAttributes {
            registry_hint: "base".into(),
            ..LinkAttributes::default()
        });
        base.insert_set("custom", [("a", 1_i64), ("b", 1_i64)].into_iter().collect())
            .expect("insert");

        let mut overlay = Properties::new().with_descriptor(DescriptorAttributes {
            component: Component {
                name: "app".into(),
                ..Component::default()
            },
        });
        overlay
            .insert_set("custom", [("b", 2_i64)].into_iter().collect())
            .expect("insert");

        base.merge(overlay);
        assert_eq!(base.link_or_default().registry_hint, "base");
        assert_eq!(
            base.descriptor.as_ref().map(|d| d.component.name.as_str()),
            Some("app")
        );
        let custom = base.set("custom").expect("custom");
        assert_eq!(custom.get("a"), Some(&AttributeValue::Int(1)));
        assert_eq!(custom.get("b"), Some(&AttributeValue::Int(2)));
    }

    #[test]
    fn deserialize_restores_sets_and_drops_zero_core_values() {
        let mut props = Properties::new().with_link(LinkAttributes {
            namespace_hint: "ns".into(),
            transitive: true,
            ..LinkAttributes::default()
        });
        props
            .insert_set("custom", [("k", "v")].into_iter().collect())
            .expect("insert");

        let json = props.to_json().expect("json");
        let back: Properties = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, props);
        assert!(back.descriptor.is_none());
    }

    #[test]
    fn is_empty_ignores_zero_valued_core_attributes() {
        let props = Properties::new().with_link(LinkAttributes::default());
        assert!(props.is_empty());
        let props = props.with_link(LinkAttributes {
            transitive: true,
            ..LinkAttributes::default()
        });
        assert!(!props.is_empty());
    }
}
