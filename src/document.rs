use std::fmt;

use crate::rule::PermissionRule;
use crate::table::RuleTable;

/// Which of a document's two tables a rule lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Rules that apply to one fully specified path.
    Exact,
    /// Rules that apply to every path starting with their own.
    Prefix,
}

impl Partition {
    /// The label the viewer shows for this partition.
    pub fn label(self) -> &'static str {
        match self {
            Partition::Exact => "ExactRules",
            Partition::Prefix => "PrefixRules",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a rule should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tint {
    /// The rule grants something.
    Grant,
    /// The rule's mask is exactly `deny`.
    Deny,
    /// The rule carries no capability set at all.
    Unpopulated,
}

/// A resolved ACL: exact rules, prefix rules, and the root flag.
///
/// Documents are built whole by ingest and never modified afterwards; a
/// refresh produces a new document (see [`AclHandle`](crate::AclHandle)).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AclDocument {
    exact: RuleTable,
    prefix: RuleTable,
    root: bool,
}

impl AclDocument {
    /// Creates an empty, non-root document. Every query against it is denied.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assembles a document from already built tables.
    pub fn new(exact: RuleTable, prefix: RuleTable, root: bool) -> Self {
        Self { exact, prefix, root }
    }

    /// Returns true if the principal holds the unrestricted superuser grant.
    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn exact_rules(&self) -> &RuleTable {
        &self.exact
    }

    pub fn prefix_rules(&self) -> &RuleTable {
        &self.prefix
    }

    /// Returns the table for `partition`.
    pub fn rules(&self, partition: Partition) -> &RuleTable {
        match partition {
            Partition::Exact => &self.exact,
            Partition::Prefix => &self.prefix,
        }
    }

    /// Iterates over the exact-rule paths in ascending order.
    pub fn exact_paths(&self) -> impl Iterator<Item = &str> {
        self.exact.paths()
    }

    /// Iterates over the prefix-rule paths in ascending order.
    pub fn prefix_paths(&self) -> impl Iterator<Item = &str> {
        self.prefix.paths()
    }

    /// Returns the rule stored for `path` in `partition`, without any matching.
    pub fn rule(&self, partition: Partition, path: &str) -> Option<&PermissionRule> {
        self.rules(partition).get(path)
    }

    /// Returns the tint of a partition heading: `Deny` when it holds no rules.
    pub fn partition_tint(&self, partition: Partition) -> Tint {
        if self.rules(partition).is_empty() {
            Tint::Deny
        } else {
            Tint::Grant
        }
    }

    /// Returns true if the document grants nothing at all.
    pub fn is_empty(&self) -> bool {
        !self.root && self.exact.is_empty() && self.prefix.is_empty()
    }
}
