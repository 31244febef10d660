//! `$ref` resolution over the engine's registry, used by the normalizing
//! and keyword walkers. The compiled validators resolve references
//! themselves through [`Retriever`].

use std::collections::{BTreeMap, HashMap};

use jsonschema::{Retrieve, Uri};
use serde_json::Value;

use crate::engine::SCHEMA_URI_PREFIX;

/// Maximum `$ref` hops followed at a single data location.
pub(crate) const MAX_REF_HOPS: u8 = 32;

/// Registered schema sources, keyed by name.
pub(crate) struct Resolver<'s> {
    sources: &'s BTreeMap<String, Value>,
}

impl<'s> Resolver<'s> {
    pub(crate) fn new(sources: &'s BTreeMap<String, Value>) -> Self {
        Self { sources }
    }

    /// Resolve `reference` relative to the document `current`. Returns the
    /// document the target lives in together with the target node.
    pub(crate) fn resolve(
        &self,
        current: &'s Value,
        reference: &str,
    ) -> Option<(&'s Value, &'s Value)> {
        let (base, fragment) = match reference.split_once('#') {
            Some((b, f)) => (b, f),
            None => (reference, ""),
        };
        let doc = if base.is_empty() {
            current
        } else {
            self.document(base)?
        };
        if fragment.is_empty() {
            Some((doc, doc))
        } else {
            doc.pointer(fragment).map(|node| (doc, node))
        }
    }

    fn document(&self, base: &str) -> Option<&'s Value> {
        let name = base.strip_prefix(SCHEMA_URI_PREFIX).unwrap_or(base);
        self.sources.get(name).or_else(|| {
            self.sources
                .values()
                .find(|v| v.get("$id").and_then(Value::as_str) == Some(base))
        })
    }
}

/// Resolves cross-schema `$ref`s for the `jsonschema` compiler from an
/// in-memory snapshot of the registry. Unknown URIs are an error; nothing
/// is fetched over the network.
pub(crate) struct Retriever {
    by_uri: HashMap<String, Value>,
}

impl Retriever {
    pub(crate) fn new(sources: &BTreeMap<String, Value>) -> Self {
        let mut by_uri = HashMap::new();
        for (name, value) in sources {
            by_uri.insert(name.clone(), value.clone());
            by_uri.insert(format!("{SCHEMA_URI_PREFIX}{name}"), value.clone());
            if let Some(id) = value.get("$id").and_then(Value::as_str) {
                by_uri.insert(id.to_string(), value.clone());
            }
        }
        Self { by_uri }
    }
}

impl Retrieve for Retriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let raw = uri.as_str();
        let key = raw.split_once('#').map(|(b, _)| b).unwrap_or(raw);

        if let Some(v) = self.by_uri.get(key) {
            return Ok(v.clone());
        }
        if let Some(name) = key.rsplit('/').next() {
            if let Some(v) = self.by_uri.get(name) {
                return Ok(v.clone());
            }
        }
        Err(format!("schema '{raw}' is not registered").into())
    }
}
