use tracing::trace;

use crate::document::{AclDocument, Partition};
use crate::outcome::Outcome;

impl AclDocument {
    /// Resolves `path` against this document.
    ///
    /// Root short-circuits everything. Otherwise an exact rule is
    /// authoritative, then the longest prefix rule applies, and a path with
    /// neither is denied by default.
    ///
    /// # Example
    ///
    /// ```
    /// use vaultacl::{AclDocument, Capability, Outcome};
    /// use serde_json::json;
    ///
    /// let doc = AclDocument::from_payload(&json!({
    ///     "exact_paths": { "secret/data/app": { "capabilities": ["read", "list"] } },
    ///     "glob_paths": {},
    ///     "root": false,
    /// }))
    /// .unwrap();
    ///
    /// assert!(doc.resolve("secret/data/app").allows(Capability::Read));
    /// assert_eq!(doc.resolve("secret/data/other"), Outcome::Denied);
    /// ```
    pub fn resolve(&self, path: &str) -> Outcome<'_> {
        if self.is_root() {
            trace!(path, "resolved by root grant");
            return Outcome::Root;
        }

        if let Some(rule) = self.exact_rules().find_exact(path) {
            trace!(path, rule = rule.path(), "resolved by exact rule");
            return Outcome::Rule {
                partition: Partition::Exact,
                rule,
            };
        }

        if let Some(rule) = self.prefix_rules().find_longest_prefix(path) {
            trace!(path, rule = rule.path(), "resolved by prefix rule");
            return Outcome::Rule {
                partition: Partition::Prefix,
                rule,
            };
        }

        trace!(path, "no rule applies");
        Outcome::Denied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, CapabilitySet};
    use crate::rule::PermissionRule;
    use crate::table::RuleTable;

    fn rule(path: &str, caps: &[&str]) -> PermissionRule {
        PermissionRule::new(path).with_capabilities(CapabilitySet::from_names(caps.iter().copied()))
    }

    fn document() -> AclDocument {
        let exact: RuleTable = [
            rule("secret/data/app", &["read", "list"]),
            rule("kv/app/locked", &["deny"]),
        ]
        .into_iter()
        .collect();
        let prefix: RuleTable = [rule("kv/", &["read"]), rule("kv/app/", &["read", "update"])]
            .into_iter()
            .collect();
        AclDocument::new(exact, prefix, false)
    }

    #[test]
    fn test_exact_rule() {
        let doc = document();
        let outcome = doc.resolve("secret/data/app");
        assert_eq!(outcome.rule().map(PermissionRule::path), Some("secret/data/app"));
        assert!(outcome.allows(Capability::List));
        assert!(!outcome.allows(Capability::Update));
    }

    #[test]
    fn test_exact_beats_prefix() {
        let doc = document();
        let outcome = doc.resolve("kv/app/locked");
        assert!(matches!(outcome, Outcome::Rule { partition: Partition::Exact, .. }));
        assert!(outcome.is_denied());
    }

    #[test]
    fn test_longest_prefix() {
        let doc = document();
        let outcome = doc.resolve("kv/app/config");
        assert_eq!(outcome.rule().map(PermissionRule::path), Some("kv/app/"));
        assert!(outcome.allows(Capability::Update));

        let outcome = doc.resolve("kv/other");
        assert_eq!(outcome.rule().map(PermissionRule::path), Some("kv/"));
        assert!(!outcome.allows(Capability::Update));
    }

    #[test]
    fn test_no_match_is_denied() {
        let doc = document();
        assert_eq!(doc.resolve("secret/data/other"), Outcome::Denied);
        assert!(doc.resolve("sys/mounts").is_denied());
    }

    #[test]
    fn test_root_short_circuits() {
        let doc = AclDocument::new(RuleTable::new(), RuleTable::new(), true);
        for path in ["", "sys/mounts", "secret/data/app"] {
            assert_eq!(doc.resolve(path), Outcome::Root);
        }
        assert!(doc.resolve("anything").allows(Capability::Sudo));
    }

    #[test]
    fn test_root_ignores_deny_rules() {
        let exact: RuleTable = [rule("sys/", &["deny"])].into_iter().collect();
        let doc = AclDocument::new(exact, RuleTable::new(), true);
        assert_eq!(doc.resolve("sys/"), Outcome::Root);
    }

    #[test]
    fn test_plus_in_exact_rule_does_not_shadow_prefix() {
        let exact: RuleTable = [rule("secret/+/config", &["deny"])].into_iter().collect();
        let prefix: RuleTable = [rule("secret/app/", &["read", "update"])].into_iter().collect();
        let doc = AclDocument::new(exact, prefix, false);

        let outcome = doc.resolve("secret/app/config");
        assert!(matches!(outcome, Outcome::Rule { partition: Partition::Prefix, .. }));
        assert_eq!(outcome.rule().map(PermissionRule::path), Some("secret/app/"));
        assert!(outcome.allows(Capability::Update));
    }

    #[test]
    fn test_unpopulated_rule_is_reported_not_hidden() {
        let exact: RuleTable = [PermissionRule::new("sys/health")].into_iter().collect();
        let doc = AclDocument::new(exact, RuleTable::new(), false);
        let outcome = doc.resolve("sys/health");
        assert!(outcome.rule().is_some());
        assert!(outcome.is_denied());
    }
}
