use std::fmt;

/// The capability name reserved for the document-level superuser grant.
///
/// It never appears inside a [`CapabilitySet`]; see [`AclDocument::is_root`](crate::AclDocument::is_root).
pub const ROOT_CAPABILITY: &str = "root";

/// A single action that a path rule may grant, or the `deny` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Deny,
    Create,
    Read,
    Update,
    Delete,
    List,
    Sudo,
    Patch,
}

/// Capability names and their reserved mask bits.
///
/// The bit layout matches the one used by the authorization service itself.
pub const CAPABILITY_BITS: [(&str, Capability, u32); 8] = [
    ("deny", Capability::Deny, 1 << 0),
    ("create", Capability::Create, 1 << 1),
    ("read", Capability::Read, 1 << 2),
    ("update", Capability::Update, 1 << 3),
    ("delete", Capability::Delete, 1 << 4),
    ("list", Capability::List, 1 << 5),
    ("sudo", Capability::Sudo, 1 << 6),
    ("patch", Capability::Patch, 1 << 7),
];

impl Capability {
    /// Every capability in bit order.
    pub const ALL: [Capability; 8] = [
        Capability::Deny,
        Capability::Create,
        Capability::Read,
        Capability::Update,
        Capability::Delete,
        Capability::List,
        Capability::Sudo,
        Capability::Patch,
    ];

    /// Looks up a capability by its wire name.
    ///
    /// Returns `None` for names outside the fixed vocabulary, including `root`.
    pub fn from_name(name: &str) -> Option<Self> {
        CAPABILITY_BITS
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, cap, _)| *cap)
    }

    /// Returns the wire name of this capability.
    pub fn name(self) -> &'static str {
        CAPABILITY_BITS[self as usize].0
    }

    /// Returns the reserved mask bit of this capability.
    pub fn bit(self) -> u32 {
        CAPABILITY_BITS[self as usize].2
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The capabilities granted on one path, as retained names plus a bitmask.
///
/// The mask is authoritative for capability tests. Names are kept exactly as
/// they arrived (minus blanks) so that unknown, newer capability names still
/// show up when the set is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    names: Vec<String>,
    mask: u32,
}

impl CapabilitySet {
    /// Builds a capability set from a sequence of capability names.
    ///
    /// Blank names are dropped. Unrecognized names are kept in the name list
    /// but contribute no bit. When no recognized name remains, the mask
    /// collapses to the `deny` bit.
    ///
    /// # Example
    ///
    /// ```
    /// use vaultacl::{Capability, CapabilitySet};
    ///
    /// let set = CapabilitySet::from_names(["read", "list", "frobnicate"]);
    /// assert!(set.has_capability(Capability::Read));
    /// assert_eq!(set.names(), ["read", "list", "frobnicate"]);
    ///
    /// let empty = CapabilitySet::from_names(Vec::<String>::new());
    /// assert!(empty.is_deny_only());
    /// ```
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|name| !name.is_empty())
            .collect();

        let mask = names
            .iter()
            .filter_map(|name| Capability::from_name(name))
            .fold(0, |mask, cap| mask | cap.bit());

        Self {
            names,
            mask: if mask == 0 { Capability::Deny.bit() } else { mask },
        }
    }

    /// Builds a set holding only the `deny` capability.
    pub fn deny() -> Self {
        Self::from_names(["deny"])
    }

    /// Returns the retained capability names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the capability bitmask.
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Tests whether the capability's bit is set in the mask.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.mask & capability.bit() != 0
    }

    /// Returns true iff the mask is exactly the `deny` bit.
    pub fn is_deny_only(&self) -> bool {
        self.mask == Capability::Deny.bit()
    }

    /// Tests whether the capability is effectively granted.
    ///
    /// A set with the `deny` bit grants nothing, whatever else it carries.
    pub fn allows(&self, capability: Capability) -> bool {
        capability != Capability::Deny
            && !self.has_capability(Capability::Deny)
            && self.has_capability(capability)
    }

    /// Iterates over the recognized capabilities present in the mask, in bit order.
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL
            .into_iter()
            .filter(|cap| self.has_capability(*cap))
    }

    /// Merges two sets the way overlapping policies combine.
    ///
    /// Names and bits are unioned, except that `deny` on either side wins
    /// outright and yields a deny-only set.
    pub fn union(&self, other: &CapabilitySet) -> CapabilitySet {
        if self.has_capability(Capability::Deny) || other.has_capability(Capability::Deny) {
            return CapabilitySet::deny();
        }

        let mut names = self.names.clone();
        for name in &other.names {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }

        CapabilitySet {
            names,
            mask: self.mask | other.mask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bits_are_distinct() {
        let all = CAPABILITY_BITS.iter().fold(0u32, |acc, (_, _, bit)| {
            assert_eq!(acc & bit, 0);
            acc | bit
        });
        assert_eq!(all, 0xff);
    }

    #[test]
    fn test_table_order_matches_enum() {
        for (name, cap, bit) in CAPABILITY_BITS {
            assert_eq!(cap.name(), name);
            assert_eq!(cap.bit(), bit);
            assert_eq!(Capability::from_name(name), Some(cap));
        }
    }

    #[test]
    fn test_root_is_not_a_set_capability() {
        assert_eq!(Capability::from_name(ROOT_CAPABILITY), None);
        let set = CapabilitySet::from_names([ROOT_CAPABILITY]);
        assert!(set.is_deny_only());
        assert_eq!(set.names(), [ROOT_CAPABILITY]);
    }

    #[test]
    fn test_read_list_mask() {
        let set = CapabilitySet::from_names(["read", "list"]);
        assert_eq!(set.mask(), Capability::Read.bit() | Capability::List.bit());
        assert!(set.allows(Capability::Read));
        assert!(!set.allows(Capability::Update));
        assert!(!set.is_deny_only());
    }

    #[test]
    fn test_blank_names_are_dropped() {
        let set = CapabilitySet::from_names(["", "update", ""]);
        assert_eq!(set.names(), ["update"]);
        assert_eq!(set.mask(), Capability::Update.bit());
    }

    #[test]
    fn test_only_blank_names_collapse_to_deny() {
        let set = CapabilitySet::from_names(["", ""]);
        assert!(set.names().is_empty());
        assert!(set.is_deny_only());
    }

    #[test]
    fn test_unknown_names_are_retained() {
        let set = CapabilitySet::from_names(["subscribe"]);
        assert_eq!(set.names(), ["subscribe"]);
        assert!(set.is_deny_only());
    }

    #[test]
    fn test_deny_overrides_grants() {
        let set = CapabilitySet::from_names(["read", "deny"]);
        assert!(set.has_capability(Capability::Read));
        assert!(!set.allows(Capability::Read));
        assert!(!set.is_deny_only());
    }

    #[test]
    fn test_capabilities_in_bit_order() {
        let set = CapabilitySet::from_names(["sudo", "create", "list"]);
        let caps: Vec<_> = set.capabilities().collect();
        assert_eq!(caps, vec![Capability::Create, Capability::List, Capability::Sudo]);
    }

    #[test]
    fn test_union() {
        let a = CapabilitySet::from_names(["read"]);
        let b = CapabilitySet::from_names(["read", "list"]);
        let merged = a.union(&b);
        assert_eq!(merged.names(), ["read", "list"]);
        assert_eq!(merged.mask(), Capability::Read.bit() | Capability::List.bit());
    }

    #[test]
    fn test_union_with_deny() {
        let a = CapabilitySet::from_names(["read", "update"]);
        let merged = a.union(&CapabilitySet::deny());
        assert!(merged.is_deny_only());
        assert_eq!(merged.names(), ["deny"]);
    }

    fn name_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("bogus".to_string()),
            Just(ROOT_CAPABILITY.to_string()),
            (0..CAPABILITY_BITS.len()).prop_map(|i| CAPABILITY_BITS[i].0.to_string()),
        ]
    }

    proptest! {
        #[test]
        fn test_mask_is_or_of_recognized_bits(names in prop::collection::vec(name_strategy(), 0..12)) {
            let set = CapabilitySet::from_names(names.clone());
            let expected = names
                .iter()
                .filter_map(|n| Capability::from_name(n))
                .fold(0, |acc, cap| acc | cap.bit());
            let expected = if expected == 0 { Capability::Deny.bit() } else { expected };
            prop_assert_eq!(set.mask(), expected);
            prop_assert_eq!(set.names().len(), names.iter().filter(|n| !n.is_empty()).count());
        }
    }
}
