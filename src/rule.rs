use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde_json::Value;

use crate::capability::{Capability, CapabilitySet};
use crate::document::Tint;

/// Parameter name to the literal values permitted (or denied) for it.
///
/// An absent key leaves the parameter unconstrained. A key with an empty
/// value list constrains it to nothing beyond what is enumerated.
pub type ParameterMap = BTreeMap<String, Vec<Value>>;

/// An approval workflow gate: a TTL plus the factors that must approve.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControlGroup {
    pub ttl: Option<Duration>,
    pub factors: Vec<ControlGroupFactor>,
}

/// One named approval factor of a control group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControlGroupFactor {
    pub name: String,
    pub identity: Option<IdentityFactor>,
    pub controlled_capabilities: Vec<String>,
}

/// The identities allowed to approve, and how many approvals are needed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentityFactor {
    pub group_ids: Vec<String>,
    pub group_names: Vec<String>,
    pub approvals_required: u32,
}

/// The resolved access grant for exactly one path.
///
/// The capability set is optional: `None` means the permissions were never
/// populated, which is not the same thing as an explicit deny.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionRule {
    path: String,
    capabilities: Option<CapabilitySet>,
    min_wrapping_ttl: Option<Duration>,
    max_wrapping_ttl: Option<Duration>,
    allowed_parameters: ParameterMap,
    denied_parameters: ParameterMap,
    required_parameters: BTreeSet<String>,
    mfa_methods: Vec<String>,
    control_group: Option<ControlGroup>,
}

impl PermissionRule {
    /// Creates a rule for `path` with unpopulated permissions.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            capabilities: None,
            min_wrapping_ttl: None,
            max_wrapping_ttl: None,
            allowed_parameters: ParameterMap::new(),
            denied_parameters: ParameterMap::new(),
            required_parameters: BTreeSet::new(),
            mfa_methods: Vec::new(),
            control_group: None,
        }
    }

    /// Sets the capability set of this rule.
    ///
    /// # Example
    ///
    /// ```
    /// use vaultacl::{Capability, CapabilitySet, PermissionRule};
    ///
    /// let rule = PermissionRule::new("secret/data/app")
    ///     .with_capabilities(CapabilitySet::from_names(["read"]));
    /// assert!(rule.allows(Capability::Read));
    /// ```
    pub fn with_capabilities(mut self, capabilities: CapabilitySet) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Sets the wrapping TTL bounds. A zero duration leaves the bound unset.
    pub fn with_wrapping_ttl(mut self, min: Duration, max: Duration) -> Self {
        self.min_wrapping_ttl = (!min.is_zero()).then_some(min);
        self.max_wrapping_ttl = (!max.is_zero()).then_some(max);
        self
    }

    pub fn with_allowed_parameters(mut self, parameters: ParameterMap) -> Self {
        self.allowed_parameters = parameters;
        self
    }

    pub fn with_denied_parameters(mut self, parameters: ParameterMap) -> Self {
        self.denied_parameters = parameters;
        self
    }

    pub fn with_required_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_parameters = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mfa_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mfa_methods = methods.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_control_group(mut self, control_group: ControlGroup) -> Self {
        self.control_group = Some(control_group);
        self
    }

    /// Returns the path this rule applies to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the capability set, or `None` if permissions were not populated.
    pub fn capabilities(&self) -> Option<&CapabilitySet> {
        self.capabilities.as_ref()
    }

    /// Returns the retained capability names, empty when unpopulated.
    pub fn capability_names(&self) -> &[String] {
        self.capabilities
            .as_ref()
            .map(CapabilitySet::names)
            .unwrap_or_default()
    }

    pub fn min_wrapping_ttl(&self) -> Option<Duration> {
        self.min_wrapping_ttl
    }

    pub fn max_wrapping_ttl(&self) -> Option<Duration> {
        self.max_wrapping_ttl
    }

    pub fn allowed_parameters(&self) -> &ParameterMap {
        &self.allowed_parameters
    }

    pub fn denied_parameters(&self) -> &ParameterMap {
        &self.denied_parameters
    }

    pub fn required_parameters(&self) -> &BTreeSet<String> {
        &self.required_parameters
    }

    pub fn mfa_methods(&self) -> &[String] {
        &self.mfa_methods
    }

    pub fn control_group(&self) -> Option<&ControlGroup> {
        self.control_group.as_ref()
    }

    /// Tests whether this rule effectively grants `capability`.
    ///
    /// Unpopulated rules grant nothing.
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities
            .as_ref()
            .is_some_and(|set| set.allows(capability))
    }

    /// Classifies the rule for display.
    pub fn tint(&self) -> Tint {
        match &self.capabilities {
            None => Tint::Unpopulated,
            Some(set) if set.is_deny_only() => Tint::Deny,
            Some(_) => Tint::Grant,
        }
    }

    /// Combines this rule with another rule for the same path.
    ///
    /// Capabilities merge through [`CapabilitySet::union`]; a resulting deny
    /// clears every other constraint. Otherwise the smaller minimum and the
    /// larger maximum wrapping TTL are kept, parameter maps and lists are
    /// unioned, and an existing control group is kept over the incoming one.
    pub fn merge(self, other: PermissionRule) -> PermissionRule {
        let capabilities = match (self.capabilities, other.capabilities) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (a, b) => a.or(b),
        };

        if capabilities.as_ref().is_some_and(|set| set.has_capability(Capability::Deny)) {
            return PermissionRule::new(self.path).with_capabilities(CapabilitySet::deny());
        }

        let mut mfa_methods = self.mfa_methods;
        for method in other.mfa_methods {
            if !mfa_methods.contains(&method) {
                mfa_methods.push(method);
            }
        }

        let mut required_parameters = self.required_parameters;
        required_parameters.extend(other.required_parameters);

        PermissionRule {
            path: self.path,
            capabilities,
            min_wrapping_ttl: merge_ttl(self.min_wrapping_ttl, other.min_wrapping_ttl, std::cmp::min),
            max_wrapping_ttl: merge_ttl(self.max_wrapping_ttl, other.max_wrapping_ttl, std::cmp::max),
            allowed_parameters: merge_parameters(self.allowed_parameters, other.allowed_parameters),
            denied_parameters: merge_parameters(self.denied_parameters, other.denied_parameters),
            required_parameters,
            mfa_methods,
            control_group: self.control_group.or(other.control_group),
        }
    }
}

fn merge_ttl(
    a: Option<Duration>,
    b: Option<Duration>,
    pick: fn(Duration, Duration) -> Duration,
) -> Option<Duration> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, b) => a.or(b),
    }
}

fn merge_parameters(mut into: ParameterMap, from: ParameterMap) -> ParameterMap {
    for (name, values) in from {
        let entry = into.entry(name).or_default();
        for value in values {
            if !entry.contains(&value) {
                entry.push(value);
            }
        }
    }
    into
}
