//! Document, layer and concept records plus their mutators.
//!
//! # Responsibility
//! - Describe the JSON document shape with optional fields defaulted on read.
//! - Assign layer and concept ids.
//! - Maintain the symmetric `refs` relation on link and delete.
//!
//! # Invariants
//! - Layer ids are decimal strings; concept ids are `<layer_id>.<seq>`.
//! - Newly assigned ids never collide with a live id in the same scope.
//! - Lookups by unknown id are silent no-ops, never errors.
//! - Stored keys outside the typed fields, and typed fields whose stored
//!   value does not parse, survive a load/save cycle unchanged.

use log::warn;
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Concept identifier, formatted as `<layer_id>.<seq>`.
pub type ConceptId = String;

/// Layer identifier, a decimal string.
pub type LayerId = String;

/// Lowest descriptive level a layer may carry.
pub const MIN_LAYER_LEVEL: u32 = 1;
/// Highest descriptive level a layer may carry.
pub const MAX_LAYER_LEVEL: u32 = 99;

/// Semantic category suggested for a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentationType {
    State,
    Event,
    Action,
    Modality,
}

impl Display for RepresentationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Self::State => "state",
            Self::Event => "event",
            Self::Action => "action",
            Self::Modality => "modality",
        };
        f.write_str(value)
    }
}

impl FromStr for RepresentationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "state" => Ok(Self::State),
            "event" => Ok(Self::Event),
            "action" => Ok(Self::Action),
            "modality" => Ok(Self::Modality),
            other => Err(format!(
                "unknown representation type `{other}`; expected state|event|action|modality"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for RepresentationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Pole of a bipolar axis the term sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AxisRole {
    A,
    B,
}

impl FromStr for AxisRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            other => Err(format!("unknown axis role `{other}`; expected A|B")),
        }
    }
}

impl<'de> Deserialize<'de> for AxisRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// One bipolar semantic dimension, e.g. `axis=temperature, role=A, dual_term=cold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub axis: String,
    pub role: AxisRole,
    #[serde(default)]
    pub dual_term: String,
}

/// One glossary term.
///
/// Fields added over time are optional and default to empty on read, so older
/// documents load without migration. An optional field whose stored value
/// does not parse is kept verbatim in `extra` instead of failing the load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConceptRecord")]
pub struct Concept {
    pub id: ConceptId,
    pub term: String,
    pub definition: String,
    /// Ids of linked concepts. Kept symmetric by the document mutators.
    pub refs: Vec<ConceptId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representation_type: Option<RepresentationType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub axes: Vec<Axis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Stored keys this version does not model; written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wire shape of a concept before its optional fields are decoded.
#[derive(Deserialize)]
struct ConceptRecord {
    id: ConceptId,
    term: String,
    #[serde(default)]
    definition: String,
    #[serde(default)]
    refs: Vec<ConceptId>,
    #[serde(default)]
    representation_type: Option<Value>,
    #[serde(default)]
    axes: Option<Value>,
    #[serde(default)]
    tags: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<ConceptRecord> for Concept {
    fn from(record: ConceptRecord) -> Self {
        let ConceptRecord {
            id,
            term,
            definition,
            refs,
            representation_type,
            axes,
            tags,
            mut extra,
        } = record;

        let representation_type =
            decode_or_keep(&id, "representation_type", representation_type, &mut extra);
        let axes = decode_or_keep(&id, "axes", axes, &mut extra).unwrap_or_default();
        let tags = decode_or_keep(&id, "tags", tags, &mut extra).unwrap_or_default();
        Self {
            id,
            term,
            definition,
            refs,
            representation_type,
            axes,
            tags,
            extra,
        }
    }
}

/// Decodes an optional stored field, parking an undecodable value in `extra`
/// under its own key so the next save writes it back.
fn decode_or_keep<T: DeserializeOwned>(
    concept_id: &str,
    key: &str,
    raw: Option<Value>,
    extra: &mut Map<String, Value>,
) -> Option<T> {
    let raw = raw?;
    match serde_json::from_value(raw.clone()) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "event=decode_field module=model status=kept_raw concept_id={} field={} error={}",
                concept_id, key, err
            );
            extra.insert(key.to_string(), raw);
            None
        }
    }
}

impl Concept {
    /// Returns whether `id` appears in this concept's `refs`.
    pub fn references(&self, id: &str) -> bool {
        self.refs.iter().any(|value| value == id)
    }

    fn add_ref(&mut self, id: &str) -> bool {
        if self.id == id || self.references(id) {
            return false;
        }
        self.refs.push(id.to_string());
        true
    }
}

/// Optional attributes copied onto a concept at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptExtra {
    pub representation_type: Option<RepresentationType>,
    pub axes: Vec<Axis>,
    pub tags: Vec<String>,
    pub refs: Vec<ConceptId>,
}

/// One grouping level of the glossary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub alias: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub concepts: Vec<Concept>,
    /// Stored keys this version does not model; written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_level() -> u32 {
    MIN_LAYER_LEVEL
}

impl Layer {
    /// Appends a new concept and returns it.
    ///
    /// The id is `<layer_id>.<k+1>` for a layer holding `k` concepts, bumped
    /// past the highest live sequence so a deletion never causes a reissue
    /// of an id still in use. Identical terms are allowed.
    pub fn create_concept(
        &mut self,
        term: impl Into<String>,
        definition: impl Into<String>,
        extra: ConceptExtra,
    ) -> &Concept {
        let id = self.next_concept_id();
        let mut refs = Vec::with_capacity(extra.refs.len());
        for value in extra.refs {
            if value != id && !refs.contains(&value) {
                refs.push(value);
            }
        }

        self.concepts.push(Concept {
            id,
            term: term.into(),
            definition: definition.into(),
            refs,
            representation_type: extra.representation_type,
            axes: extra.axes,
            tags: extra.tags,
            extra: Map::new(),
        });
        &self.concepts[self.concepts.len() - 1]
    }

    /// Returns the id the next created concept will receive.
    pub fn next_concept_id(&self) -> ConceptId {
        let prefix = format!("{}.", self.id);
        let highest = self
            .concepts
            .iter()
            .filter_map(|concept| concept.id.strip_prefix(prefix.as_str()))
            .filter_map(|seq| seq.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let seq = (self.concepts.len() as u64 + 1).max(highest + 1);
        format!("{prefix}{seq}")
    }

    fn owns_id(&self, id: &str) -> bool {
        id.strip_prefix(self.id.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Root persisted object. Every mutation rewrites it whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Free-form metadata; never interpreted.
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Top-level keys other than `meta` and `layers`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Creates `{meta: {}, layers: []}`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates every concept in layer order, then concept order.
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.layers.iter().flat_map(|layer| layer.concepts.iter())
    }

    /// Total number of concepts across layers.
    pub fn concept_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.concepts.len()).sum()
    }

    /// Finds a concept and its owning layer by id.
    pub fn find_concept(&self, id: &str) -> Option<(&Layer, &Concept)> {
        self.layers.iter().find_map(|layer| {
            layer
                .concepts
                .iter()
                .find(|concept| concept.id == id)
                .map(|concept| (layer, concept))
        })
    }

    /// Finds the first concept whose term matches case-insensitively.
    pub fn find_concept_by_term(&self, term: &str) -> Option<&Concept> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.concepts()
            .find(|concept| concept.term.trim().to_lowercase() == needle)
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layer_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.id == id)
    }

    /// Finds a layer by alias, ignoring case and surrounding whitespace.
    pub fn layer_by_alias(&self, alias: &str) -> Option<&Layer> {
        self.alias_position(alias).map(|index| &self.layers[index])
    }

    fn alias_position(&self, alias: &str) -> Option<usize> {
        let needle = alias.trim().to_lowercase();
        self.layers
            .iter()
            .position(|layer| layer.alias.trim().to_lowercase() == needle)
    }

    /// Returns the layer matching `alias`, creating it when absent.
    ///
    /// New layers get the next sequential id and `level = 1 + len(layers)`
    /// unless a level is provided. Levels are clamped to `1..=99`.
    pub fn ensure_layer(
        &mut self,
        alias: &str,
        level: Option<u32>,
        description: Option<&str>,
    ) -> &mut Layer {
        if let Some(index) = self.alias_position(alias) {
            return &mut self.layers[index];
        }

        let id = self.next_layer_id();
        let level = level
            .unwrap_or(self.layers.len() as u32 + 1)
            .clamp(MIN_LAYER_LEVEL, MAX_LAYER_LEVEL);
        self.layers.push(Layer {
            id,
            alias: alias.trim().to_string(),
            level,
            description: description.unwrap_or_default().to_string(),
            concepts: Vec::new(),
            extra: Map::new(),
        });
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    /// Returns the id the next created layer will receive.
    pub fn next_layer_id(&self) -> LayerId {
        let highest = self
            .layers
            .iter()
            .filter_map(|layer| layer.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (self.layers.len() as u64 + 1).max(highest + 1).to_string()
    }

    /// Removes every concept carrying `id` and strips the id from all
    /// remaining `refs`.
    ///
    /// Returns `false` when the id is unknown.
    pub fn delete_concept(&mut self, id: &str) -> bool {
        let mut removed = false;
        for layer in &mut self.layers {
            let before = layer.concepts.len();
            layer.concepts.retain(|concept| concept.id != id);
            removed |= layer.concepts.len() != before;
        }
        if !removed {
            return false;
        }

        for concept in self.layers.iter_mut().flat_map(|layer| layer.concepts.iter_mut()) {
            concept.refs.retain(|value| value != id);
        }
        true
    }

    /// Removes a layer with all its concepts, then strips every ref pointing
    /// into it (by owned id or by `<layer_id>.` prefix).
    ///
    /// Returns `false` when the id is unknown.
    pub fn delete_layer(&mut self, id: &str) -> bool {
        let Some(index) = self.layers.iter().position(|layer| layer.id == id) else {
            return false;
        };
        let removed = self.layers.remove(index);
        let removed_ids: Vec<ConceptId> = removed
            .concepts
            .iter()
            .map(|concept| concept.id.clone())
            .collect();

        for concept in self.layers.iter_mut().flat_map(|layer| layer.concepts.iter_mut()) {
            concept
                .refs
                .retain(|value| !removed.owns_id(value) && !removed_ids.contains(value));
        }
        true
    }

    /// Links two concepts in both directions without duplicating entries.
    ///
    /// No-op when `a == b` or either id is unknown. Returns whether any
    /// `refs` entry was added.
    pub fn link_symmetric(&mut self, a: &str, b: &str) -> bool {
        if a == b || self.find_concept(a).is_none() || self.find_concept(b).is_none() {
            return false;
        }

        let mut changed = false;
        for concept in self.layers.iter_mut().flat_map(|layer| layer.concepts.iter_mut()) {
            if concept.id == a {
                changed |= concept.add_ref(b);
            } else if concept.id == b {
                changed |= concept.add_ref(a);
            }
        }
        changed
    }
}
