//! Offline policy documents.
//!
//! A policy is a named set of path rules in the JSON form accepted by the
//! authorization service:
//!
//! ```json
//! {
//!   "path": {
//!     "secret/data/*": { "capabilities": ["read", "list"] },
//!     "secret/+/config": { "capabilities": ["read"], "required_parameters": ["version"] }
//!   }
//! }
//! ```
//!
//! Policies are compiled into the same [`PermissionRule`]s the resolved-ACL
//! payload produces, with every optional attribute populated.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::capability::{Capability, CapabilitySet, ROOT_CAPABILITY};
use crate::document::{AclDocument, Partition};
use crate::error::AclError;
use crate::rule::{ControlGroup, ControlGroupFactor, IdentityFactor, ParameterMap, PermissionRule};
use crate::table::RuleTable;

/// A named policy: path patterns mapped to their rules.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "path")]
    pub paths: BTreeMap<String, PathRules>,
}

/// The attributes of one path in a policy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathRules {
    pub capabilities: Vec<String>,
    /// Legacy single-keyword form: `deny`, `read`, `write` or `sudo`.
    pub policy: Option<String>,
    pub min_wrapping_ttl: Option<Ttl>,
    pub max_wrapping_ttl: Option<Ttl>,
    pub allowed_parameters: ParameterMap,
    pub denied_parameters: ParameterMap,
    pub required_parameters: Vec<String>,
    pub mfa_methods: Vec<String>,
    pub control_group: Option<ControlGroupRules>,
}

/// A duration given either as whole seconds or as a string such as `90s` or `1h`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Ttl {
    Seconds(u64),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ControlGroupRules {
    pub ttl: Option<Ttl>,
    pub factor: BTreeMap<String, FactorRules>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FactorRules {
    pub identity: Option<IdentityRules>,
    pub controlled_capabilities: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityRules {
    pub group_ids: Vec<String>,
    pub group_names: Vec<String>,
    pub approvals: u32,
}

impl Policy {
    /// Parses a policy from its JSON form, naming it `name`.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        let mut policy: Policy = serde_json::from_str(json)?;
        policy.name = name.into();
        Ok(policy)
    }

    /// Compiles every path of this policy into a rule and its partition.
    pub fn rules(&self) -> Result<Vec<(Partition, PermissionRule)>, AclError> {
        self.paths
            .iter()
            .map(|(path, rules)| compile_path(&self.name, path, rules))
            .collect()
    }
}

impl AclDocument {
    /// Builds a document from offline policies.
    ///
    /// A policy named `root` grants root. Rules for the same path and
    /// partition are combined with [`PermissionRule::merge`], in policy order.
    ///
    /// # Example
    ///
    /// ```
    /// use vaultacl::{AclDocument, Capability, Policy};
    ///
    /// let dev = Policy::from_json("dev", r#"{"path": {"kv/*": {"capabilities": ["read"]}}}"#).unwrap();
    /// let ops = Policy::from_json("ops", r#"{"path": {"kv/*": {"capabilities": ["update"]}}}"#).unwrap();
    ///
    /// let doc = AclDocument::from_policies(&[dev, ops]).unwrap();
    /// let outcome = doc.resolve("kv/app");
    /// assert!(outcome.allows(Capability::Read));
    /// assert!(outcome.allows(Capability::Update));
    /// ```
    pub fn from_policies(policies: &[Policy]) -> Result<Self, AclError> {
        let mut root = false;
        let mut exact = RuleTable::new();
        let mut prefix = RuleTable::new();

        for policy in policies {
            if policy.name == ROOT_CAPABILITY {
                root = true;
            }

            for (partition, rule) in policy.rules()? {
                let table = match partition {
                    Partition::Exact => &mut exact,
                    Partition::Prefix => &mut prefix,
                };
                let rule = match table.remove(rule.path()) {
                    Some(existing) => existing.merge(rule),
                    None => rule,
                };
                table.insert(rule);
            }
            debug!(policy = %policy.name, paths = policy.paths.len(), "compiled policy");
        }

        Ok(AclDocument::new(exact, prefix, root))
    }
}

fn compile_path(
    policy: &str,
    raw_path: &str,
    rules: &PathRules,
) -> Result<(Partition, PermissionRule), AclError> {
    let invalid = |reason: String| AclError::InvalidPolicy {
        policy: policy.to_string(),
        path: raw_path.to_string(),
        reason,
    };

    let path = raw_path.strip_prefix('/').unwrap_or(raw_path);
    let (partition, path) = match path.strip_suffix('*') {
        Some(stripped) => (Partition::Prefix, stripped),
        None => (Partition::Exact, path),
    };

    let mut names = rules.capabilities.clone();
    if let Some(keyword) = &rules.policy {
        let expanded = legacy_capabilities(keyword)
            .ok_or_else(|| invalid(format!("unknown policy keyword `{keyword}`")))?;
        names.extend(expanded.iter().map(|name| name.to_string()));
    }
    let capabilities = if names.iter().any(|name| name == Capability::Deny.name()) {
        CapabilitySet::deny()
    } else {
        CapabilitySet::from_names(names)
    };

    let min = parse_ttl(rules.min_wrapping_ttl.as_ref()).map_err(&invalid)?;
    let max = parse_ttl(rules.max_wrapping_ttl.as_ref()).map_err(&invalid)?;
    if !max.is_zero() && min > max {
        return Err(invalid(
            "max_wrapping_ttl cannot be less than min_wrapping_ttl".to_string(),
        ));
    }

    let mut rule = PermissionRule::new(path)
        .with_capabilities(capabilities)
        .with_wrapping_ttl(min, max)
        .with_allowed_parameters(rules.allowed_parameters.clone())
        .with_denied_parameters(rules.denied_parameters.clone())
        .with_required_parameters(rules.required_parameters.iter().cloned())
        .with_mfa_methods(rules.mfa_methods.iter().cloned());

    if let Some(control_group) = &rules.control_group {
        rule = rule.with_control_group(compile_control_group(control_group).map_err(&invalid)?);
    }

    Ok((partition, rule))
}

fn compile_control_group(rules: &ControlGroupRules) -> Result<ControlGroup, String> {
    if rules.factor.is_empty() {
        return Err("control group must have at least one factor".to_string());
    }

    let ttl = parse_ttl(rules.ttl.as_ref())?;
    let factors = rules
        .factor
        .iter()
        .map(|(name, factor)| ControlGroupFactor {
            name: name.clone(),
            identity: factor.identity.as_ref().map(|identity| IdentityFactor {
                group_ids: identity.group_ids.clone(),
                group_names: identity.group_names.clone(),
                approvals_required: identity.approvals,
            }),
            controlled_capabilities: factor.controlled_capabilities.clone(),
        })
        .collect();

    Ok(ControlGroup {
        ttl: (!ttl.is_zero()).then_some(ttl),
        factors,
    })
}

/// Capabilities implied by the legacy `policy` keyword.
fn legacy_capabilities(keyword: &str) -> Option<&'static [&'static str]> {
    match keyword {
        "deny" => Some(&["deny"]),
        "read" => Some(&["read", "list"]),
        "write" => Some(&["read", "create", "update", "delete", "list"]),
        "sudo" => Some(&["read", "create", "update", "delete", "list", "sudo"]),
        _ => None,
    }
}

/// Parses an optional TTL. Absent and empty values are zero.
fn parse_ttl(ttl: Option<&Ttl>) -> Result<Duration, String> {
    let text = match ttl {
        None => return Ok(Duration::ZERO),
        Some(Ttl::Seconds(secs)) => return Ok(Duration::from_secs(*secs)),
        Some(Ttl::Text(text)) => text.trim(),
    };
    if text.is_empty() {
        return Ok(Duration::ZERO);
    }

    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, unit) = text.split_at(split);
    let invalid = || format!("invalid duration `{text}`");

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let scale = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return Err(invalid()),
    };
    value
        .checked_mul(scale)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}
