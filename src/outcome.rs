use crate::capability::Capability;
use crate::document::Partition;
use crate::rule::PermissionRule;

/// The result of resolving a path against an ACL document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<'a> {
    /// The document carries the root grant; every capability is allowed.
    Root,
    /// A rule applies; it alone decides what is allowed.
    Rule {
        partition: Partition,
        rule: &'a PermissionRule,
    },
    /// No rule applies, so the path is denied by default.
    Denied,
}

impl<'a> Outcome<'a> {
    /// Returns the applicable rule, if a rule decided the outcome.
    pub fn rule(&self) -> Option<&'a PermissionRule> {
        match self {
            Outcome::Rule { rule, .. } => Some(*rule),
            _ => None,
        }
    }

    /// Tests whether `capability` is allowed by this outcome.
    pub fn allows(&self, capability: Capability) -> bool {
        match self {
            Outcome::Root => capability != Capability::Deny,
            Outcome::Rule { rule, .. } => rule.allows(capability),
            Outcome::Denied => false,
        }
    }

    /// Returns true when nothing at all is allowed.
    pub fn is_denied(&self) -> bool {
        match self {
            Outcome::Root => false,
            Outcome::Rule { rule, .. } => !Capability::ALL.iter().any(|cap| rule.allows(*cap)),
            Outcome::Denied => true,
        }
    }
}
