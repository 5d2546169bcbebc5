//! Conversion of the authorization service's resolved-ACL payload into an [`AclDocument`].
//!
//! The payload is an untyped mapping whose recognized keys are `exact_paths`,
//! `glob_paths` and `root`:
//!
//! ```json
//! {
//!   "exact_paths": { "secret/data/app": { "capabilities": ["read", "list"] } },
//!   "glob_paths":  { "kv/": { "capabilities": ["read"] } },
//!   "root": false
//! }
//! ```
//!
//! Any other top-level key, and any per-path attribute other than
//! `capabilities`, is ignored. A shape violation aborts the whole ingest.

use serde_json::{Map, Value};
use tracing::debug;

use crate::capability::CapabilitySet;
use crate::document::AclDocument;
use crate::error::AclError;
use crate::rule::PermissionRule;
use crate::table::RuleTable;

pub const EXACT_PATHS_KEY: &str = "exact_paths";
pub const GLOB_PATHS_KEY: &str = "glob_paths";
pub const ROOT_KEY: &str = "root";
pub const CAPABILITIES_KEY: &str = "capabilities";

impl AclDocument {
    /// Builds a document from a resolved-ACL payload.
    ///
    /// Fails with [`AclError::MalformedAcl`] if `root` is not a boolean, if a
    /// path table or a per-path entry is not a mapping, or if `capabilities`
    /// is not a list of strings. A `null` `capabilities` value counts as
    /// absent, which yields a deny-only rule.
    pub fn from_payload(payload: &Value) -> Result<Self, AclError> {
        let Value::Object(payload) = payload else {
            return Err(AclError::malformed("payload", "a mapping", payload));
        };

        let root = match payload.get(ROOT_KEY) {
            None => false,
            Some(Value::Bool(root)) => *root,
            Some(other) => return Err(AclError::malformed(ROOT_KEY, "a boolean", other)),
        };

        let exact = rule_table(payload, EXACT_PATHS_KEY)?;
        let prefix = rule_table(payload, GLOB_PATHS_KEY)?;

        for key in payload.keys() {
            if ![EXACT_PATHS_KEY, GLOB_PATHS_KEY, ROOT_KEY].contains(&key.as_str()) {
                debug!(key = key.as_str(), "ignoring informational payload key");
            }
        }

        debug!(
            root,
            exact = exact.len(),
            prefix = prefix.len(),
            "ingested resolved ACL"
        );
        Ok(AclDocument::new(exact, prefix, root))
    }

    /// Builds a document from the outcome of a resolved-ACL read.
    ///
    /// A read that returned no data produces an empty, non-root document.
    pub fn from_response(response: Option<&Value>) -> Result<Self, AclError> {
        match require_data(response) {
            Ok(payload) => AclDocument::from_payload(payload),
            Err(AclError::NoData) => {
                debug!("resolved ACL read returned no data; treating as no grants");
                Ok(AclDocument::empty())
            }
            Err(err) => Err(err),
        }
    }
}

/// Returns the payload, or [`AclError::NoData`] when the read produced none.
///
/// A JSON `null` counts as no data.
pub fn require_data(response: Option<&Value>) -> Result<&Value, AclError> {
    match response {
        None | Some(Value::Null) => Err(AclError::NoData),
        Some(payload) => Ok(payload),
    }
}

fn rule_table(payload: &Map<String, Value>, key: &str) -> Result<RuleTable, AclError> {
    let entries = match payload.get(key) {
        None => return Ok(RuleTable::new()),
        Some(Value::Object(entries)) => entries,
        Some(other) => return Err(AclError::malformed(key, "a mapping", other)),
    };

    let mut table = RuleTable::new();
    for (path, attributes) in entries {
        let Value::Object(attributes) = attributes else {
            return Err(AclError::malformed(
                format!("{key}.{path}"),
                "a mapping",
                attributes,
            ));
        };

        let names = capability_names(attributes, || format!("{key}.{path}.{CAPABILITIES_KEY}"))?;
        debug!(partition = key, path = path.as_str(), capabilities = ?names, "parsed path rule");

        let rule = PermissionRule::new(path.as_str()).with_capabilities(CapabilitySet::from_names(names));
        table.insert(rule);
    }
    Ok(table)
}

fn capability_names(
    attributes: &Map<String, Value>,
    location: impl Fn() -> String,
) -> Result<Vec<String>, AclError> {
    let items = match attributes.get(CAPABILITIES_KEY) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(AclError::malformed(location(), "a list of strings", other)),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(name) => Ok(name.clone()),
            other => Err(AclError::malformed(
                format!("{}[{i}]", location()),
                "a string",
                other,
            )),
        })
        .collect()
}
