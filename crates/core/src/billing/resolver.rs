//! Resolver from source groups to billing groups for one structure version.

use std::collections::HashMap;

use bordereau_shared::types::{GroupId, GroupStructureId};

/// One source→billing mapping row of a structure version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry {
    /// Team the subscription originates from.
    pub source_group_id: GroupId,
    /// Parent that receives the consolidated statement.
    pub billing_group_id: GroupId,
}

/// Resolves a subscription's originating team to its billing parent.
///
/// Built once per batch from the structure's mapping rows; lookups are then
/// pure and infallible. A source group without a mapping entry resolves to
/// itself, so unmapped teams bill themselves instead of failing resolution.
#[derive(Debug, Clone)]
pub struct BillingResolver {
    structure_id: GroupStructureId,
    map: HashMap<GroupId, GroupId>,
}

impl BillingResolver {
    /// Builds a resolver from the mapping rows of one structure version.
    #[must_use]
    pub fn new(
        structure_id: GroupStructureId,
        entries: impl IntoIterator<Item = MappingEntry>,
    ) -> Self {
        let map = entries
            .into_iter()
            .map(|e| (e.source_group_id, e.billing_group_id))
            .collect();
        Self { structure_id, map }
    }

    /// Returns the structure version this resolver was built from.
    #[must_use]
    pub const fn structure_id(&self) -> GroupStructureId {
        self.structure_id
    }

    /// Resolves a source group to its billing group.
    #[must_use]
    pub fn resolve(&self, source_group_id: GroupId) -> GroupId {
        self.map
            .get(&source_group_id)
            .copied()
            .unwrap_or(source_group_id)
    }

    /// Number of mapping entries loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true when the structure has no mapping rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(entries: Vec<MappingEntry>) -> BillingResolver {
        BillingResolver::new(GroupStructureId::new(), entries)
    }

    #[test]
    fn test_mapped_source_resolves_to_billing_parent() {
        let source = GroupId::new();
        let billing = GroupId::new();
        let r = resolver(vec![MappingEntry {
            source_group_id: source,
            billing_group_id: billing,
        }]);

        assert_eq!(r.resolve(source), billing);
    }

    #[test]
    fn test_unmapped_source_bills_itself() {
        let mapped = GroupId::new();
        let unmapped = GroupId::new();
        let r = resolver(vec![MappingEntry {
            source_group_id: mapped,
            billing_group_id: GroupId::new(),
        }]);

        assert_eq!(r.resolve(unmapped), unmapped);
    }

    #[test]
    fn test_empty_structure_is_identity() {
        let r = resolver(Vec::new());
        assert!(r.is_empty());

        let any = GroupId::new();
        assert_eq!(r.resolve(any), any);
    }

    #[test]
    fn test_len_counts_entries() {
        let r = resolver(vec![
            MappingEntry {
                source_group_id: GroupId::new(),
                billing_group_id: GroupId::new(),
            },
            MappingEntry {
                source_group_id: GroupId::new(),
                billing_group_id: GroupId::new(),
            },
        ]);
        assert_eq!(r.len(), 2);
    }
}
