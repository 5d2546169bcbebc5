use crate::rule::PermissionRule;

/// An ordered collection of rules, sorted ascending by path (byte-wise).
///
/// A table holds at most one rule per path. Lookups depend only on the
/// table's contents, never on the order in which rules were inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    rules: Vec<PermissionRule>,
}

impl RuleTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Inserts a rule at its sorted position.
    ///
    /// If a rule for the same path is already present it is replaced and
    /// returned.
    pub fn insert(&mut self, rule: PermissionRule) -> Option<PermissionRule> {
        match self.position(rule.path()) {
            Ok(index) => Some(std::mem::replace(&mut self.rules[index], rule)),
            Err(index) => {
                self.rules.insert(index, rule);
                None
            }
        }
    }

    /// Removes and returns the rule for `path`, if any.
    pub fn remove(&mut self, path: &str) -> Option<PermissionRule> {
        self.position(path).ok().map(|index| self.rules.remove(index))
    }

    /// Returns the rule stored under exactly `path`.
    pub fn get(&self, path: &str) -> Option<&PermissionRule> {
        self.position(path).ok().map(|index| &self.rules[index])
    }

    /// Returns the rules in ascending path order.
    pub fn rules(&self) -> &[PermissionRule] {
        &self.rules
    }

    /// Iterates over the rule paths in ascending order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(PermissionRule::path)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Finds the rule stored under exactly `path`, by binary search.
    pub fn find_exact(&self, path: &str) -> Option<&PermissionRule> {
        self.get(path)
    }

    /// Finds the rule with the longest path that is a prefix of `path`.
    ///
    /// Candidate prefixes are tried longest first, each by binary search, so
    /// the first hit is the answer. Matching is plain string prefixing: a
    /// `+` in a stored path is an ordinary character.
    ///
    /// # Example
    ///
    /// ```
    /// use vaultacl::{CapabilitySet, PermissionRule, RuleTable};
    ///
    /// let mut table = RuleTable::new();
    /// for path in ["kv/", "kv/app/"] {
    ///     table.insert(PermissionRule::new(path).with_capabilities(CapabilitySet::from_names(["read"])));
    /// }
    ///
    /// let rule = table.find_longest_prefix("kv/app/config").unwrap();
    /// assert_eq!(rule.path(), "kv/app/");
    /// assert!(table.find_longest_prefix("secret/app").is_none());
    /// ```
    pub fn find_longest_prefix(&self, path: &str) -> Option<&PermissionRule> {
        (0..=path.len())
            .rev()
            .filter(|&len| path.is_char_boundary(len))
            .find_map(|len| self.get(&path[..len]))
    }

    fn position(&self, path: &str) -> Result<usize, usize> {
        self.rules
            .binary_search_by(|rule| rule.path().as_bytes().cmp(path.as_bytes()))
    }
}

impl FromIterator<PermissionRule> for RuleTable {
    fn from_iter<I: IntoIterator<Item = PermissionRule>>(iter: I) -> Self {
        let mut table = RuleTable::new();
        for rule in iter {
            table.insert(rule);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilitySet;
    use proptest::prelude::*;

    fn rule(path: &str) -> PermissionRule {
        PermissionRule::new(path).with_capabilities(CapabilitySet::from_names(["read"]))
    }

    fn table(paths: &[&str]) -> RuleTable {
        paths.iter().map(|p| rule(p)).collect()
    }

    #[test]
    fn test_empty_table() {
        let table = RuleTable::new();
        assert!(table.is_empty());
        assert!(table.find_exact("a").is_none());
        assert!(table.find_longest_prefix("a").is_none());
    }

    #[test]
    fn test_insert_keeps_sorted() {
        let table = table(&["sys/", "auth/token/", "secret/", "auth/"]);
        let paths: Vec<_> = table.paths().collect();
        assert_eq!(paths, vec!["auth/", "auth/token/", "secret/", "sys/"]);
    }

    #[test]
    fn test_sort_is_bytewise() {
        let table = table(&["b", "B", "a", "_"]);
        let paths: Vec<_> = table.paths().collect();
        assert_eq!(paths, vec!["B", "_", "a", "b"]);
    }

    #[test]
    fn test_insert_replaces_same_path() {
        let mut table = table(&["kv/"]);
        let displaced = table.insert(PermissionRule::new("kv/"));
        assert_eq!(displaced, Some(rule("kv/")));
        assert_eq!(table.len(), 1);
        assert_eq!(table.rules()[0].capabilities(), None);
    }

    #[test]
    fn test_remove() {
        let mut table = table(&["a", "b"]);
        assert!(table.remove("a").is_some());
        assert!(table.remove("a").is_none());
        assert_eq!(table.paths().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_find_exact() {
        let table = table(&["secret/data/app", "secret/data/other"]);
        assert_eq!(table.find_exact("secret/data/app").map(PermissionRule::path), Some("secret/data/app"));
        assert!(table.find_exact("secret/data").is_none());
        assert!(table.find_exact("secret/data/app/x").is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let table = table(&["kv/", "kv/app/"]);
        let found = table.find_longest_prefix("kv/app/config").map(PermissionRule::path);
        assert_eq!(found, Some("kv/app/"));
        let found = table.find_longest_prefix("kv/other").map(PermissionRule::path);
        assert_eq!(found, Some("kv/"));
    }

    #[test]
    fn test_prefix_is_not_segment_aware() {
        let table = table(&["secret/app"]);
        let found = table.find_longest_prefix("secret/application").map(PermissionRule::path);
        assert_eq!(found, Some("secret/app"));
    }

    #[test]
    fn test_empty_prefix_matches_everything() {
        let table = table(&[""]);
        assert_eq!(table.find_longest_prefix("anything/at/all").map(PermissionRule::path), Some(""));
    }

    #[test]
    fn test_prefix_with_multibyte_path() {
        let table = table(&["kv/é"]);
        assert_eq!(table.find_longest_prefix("kv/éa").map(PermissionRule::path), Some("kv/é"));
        assert!(table.find_longest_prefix("kv/e").is_none());
    }

    #[test]
    fn test_plus_is_literal() {
        let table = table(&["secret/+/config"]);
        assert!(table.find_exact("secret/app/config").is_none());
        let found = table.find_exact("secret/+/config").map(PermissionRule::path);
        assert_eq!(found, Some("secret/+/config"));
    }

    #[test]
    fn test_prefix_only_matches_real_prefixes() {
        let table = table(&["kv/", "kv/+/conf"]);
        let found = table.find_longest_prefix("kv/app/config/db").map(PermissionRule::path);
        assert_eq!(found, Some("kv/"));
        let found = table.find_longest_prefix("kv/+/config").map(PermissionRule::path);
        assert_eq!(found, Some("kv/+/conf"));
    }

    fn path_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(prop_oneof![Just("kv"), Just("app"), Just("+"), Just("c"), Just("")], 1..4)
            .prop_map(|segments| segments.join("/"))
    }

    proptest! {
        #[test]
        fn test_lookup_is_order_independent(
            paths in prop::collection::btree_set(path_strategy(), 0..10),
            query in path_strategy(),
            seed in any::<u64>(),
        ) {
            let forward: RuleTable = paths.iter().map(|p| rule(p)).collect();

            let mut shuffled: Vec<_> = paths.iter().cloned().collect();
            let len = shuffled.len();
            if len > 1 {
                let mut state = seed;
                for i in (1..len).rev() {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    shuffled.swap(i, (state >> 33) as usize % (i + 1));
                }
            }
            let backward: RuleTable = shuffled.iter().map(|p| rule(p)).collect();

            prop_assert_eq!(&forward, &backward);
            prop_assert_eq!(forward.find_exact(&query), backward.find_exact(&query));
            prop_assert_eq!(
                forward.find_longest_prefix(&query),
                backward.find_longest_prefix(&query)
            );
        }

        #[test]
        fn test_table_is_sorted(paths in prop::collection::vec(path_strategy(), 0..16)) {
            let table: RuleTable = paths.iter().map(|p| rule(p)).collect();
            let sorted: Vec<_> = table.paths().collect();
            prop_assert!(sorted.windows(2).all(|w| w[0].as_bytes() < w[1].as_bytes()));
        }
    }
}
