//! Vaultacl: a library for inspecting and querying resolved Vault ACLs.
//!
//! Vaultacl turns the **resolved ACL** an authorization service reports for
//! a session into an [`AclDocument`], then answers what the caller may do at
//! a path, and which rule says so.
//!
//! # Example
//!
//! ```
//! use vaultacl::{AclDocument, Capability, Outcome};
//! use serde_json::json;
//!
//! let doc = AclDocument::from_payload(&json!({
//!     "exact_paths": {
//!         "secret/data/app": { "capabilities": ["read", "list"] },
//!     },
//!     "glob_paths": {
//!         "kv/": { "capabilities": ["read"] },
//!         "kv/app/": { "capabilities": ["read", "update"] },
//!     },
//!     "root": false,
//! }))
//! .unwrap();
//!
//! // Exact rules are authoritative
//! assert!(doc.resolve("secret/data/app").allows(Capability::List));
//!
//! // Otherwise the longest prefix applies
//! let outcome = doc.resolve("kv/app/config");
//! assert_eq!(outcome.rule().map(|rule| rule.path()), Some("kv/app/"));
//! assert!(outcome.allows(Capability::Update));
//!
//! // Everything else is denied
//! assert_eq!(doc.resolve("sys/mounts"), Outcome::Denied);
//! ```

mod capability;
mod document;
mod error;
mod handle;
mod outcome;
mod query;
mod rule;
mod table;

pub mod ingest;

#[cfg(feature = "policy")]
pub mod policy;

pub use capability::{CAPABILITY_BITS, Capability, CapabilitySet, ROOT_CAPABILITY};
pub use document::{AclDocument, Partition, Tint};
pub use error::{AclError, RefreshError, SourceError};
pub use handle::{AclHandle, AclSource, RESULTANT_ACL_PATH};
pub use outcome::Outcome;
pub use rule::{ControlGroup, ControlGroupFactor, IdentityFactor, ParameterMap, PermissionRule};
pub use table::RuleTable;

#[cfg(feature = "policy")]
pub use policy::Policy;
