//! Node mutations: insert splits one node into two, remove merges two into
//! one. Plans are pure; the transaction builders turn them into spends.

use crate::datum::{Authorities, RegistryRecord};
use crate::error::{Error, Result};
use crate::registry::RegistryNode;

/// Split `covering` around `key`: `(updated covering, new node)`.
pub fn insert_records(
    covering: &RegistryRecord,
    key: &[u8],
    authorities: Authorities,
) -> Result<(RegistryRecord, RegistryRecord)> {
    if !covering.covers(key) {
        return Err(Error::InconsistentChain(format!(
            "node {} does not cover {}",
            hex::encode(&covering.key),
            hex::encode(key)
        )));
    }
    let updated = RegistryRecord {
        next: key.to_vec(),
        ..covering.clone()
    };
    let inserted = RegistryRecord {
        key: key.to_vec(),
        next: covering.next.clone(),
        authorities,
    };
    Ok((updated, inserted))
}

/// Merge `victim` into its predecessor.
pub fn remove_record(
    predecessor: &RegistryRecord,
    victim: &RegistryRecord,
) -> Result<RegistryRecord> {
    if victim.is_origin() {
        return Err(Error::InconsistentChain("the origin node cannot be removed".into()));
    }
    if predecessor.next != victim.key {
        return Err(Error::InconsistentChain(format!(
            "predecessor {} points at {}, not {}",
            hex::encode(&predecessor.key),
            hex::encode(&predecessor.next),
            hex::encode(&victim.key)
        )));
    }
    Ok(RegistryRecord {
        next: victim.next.clone(),
        ..predecessor.clone()
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    /// Spent; its directory token carries over to `updated`.
    pub covering: RegistryNode,
    pub updated: RegistryRecord,
    /// Gets a freshly minted directory token named after its key.
    pub inserted: RegistryRecord,
}

pub fn plan_insert(
    covering: &RegistryNode,
    key: &[u8],
    authorities: Authorities,
) -> Result<InsertPlan> {
    let (updated, inserted) = insert_records(&covering.record, key, authorities)?;
    Ok(InsertPlan {
        covering: covering.clone(),
        updated,
        inserted,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovePlan {
    /// Spent; its directory token carries over to `merged`.
    pub predecessor: RegistryNode,
    /// Spent; its directory token is burned.
    pub victim: RegistryNode,
    pub merged: RegistryRecord,
}

pub fn plan_remove(predecessor: &RegistryNode, victim: &RegistryNode) -> Result<RemovePlan> {
    let merged = remove_record(&predecessor.record, &victim.record)?;
    Ok(RemovePlan {
        predecessor: predecessor.clone(),
        victim: victim.clone(),
        merged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::MAX_SENTINEL;
    use crate::hash::ScriptHash;
    use crate::registry::test_support::{chain, node};

    #[test]
    fn first_registration_splits_origin() {
        let origin = RegistryRecord::origin();
        let auth = Authorities::new(ScriptHash([0x77; 28]));
        let (updated, inserted) = insert_records(&origin, &[0x0a], auth.clone()).unwrap();

        assert!(updated.is_origin());
        assert_eq!(updated.next, vec![0x0a]);
        assert_eq!(updated.authorities, Authorities::default());

        assert_eq!(inserted.key, vec![0x0a]);
        assert_eq!(inserted.next, MAX_SENTINEL.to_vec());
        assert_eq!(inserted.authorities, auth);
    }

    #[test]
    fn insert_keeps_covering_authorities() {
        let mut covering = RegistryRecord::origin();
        covering.key = vec![0x05];
        covering.authorities = Authorities::new(ScriptHash([1; 28]));
        let (updated, _) = insert_records(&covering, &[0x06], Authorities::default()).unwrap();
        assert_eq!(updated.authorities, covering.authorities);
    }

    #[test]
    fn insert_outside_range_is_inconsistent() {
        let nodes = chain(&[&[0x05]]);
        assert!(matches!(
            plan_insert(&nodes[0], &[0x06], Authorities::default()),
            Err(Error::InconsistentChain(_))
        ));
    }

    #[test]
    fn remove_merges_into_predecessor() {
        let nodes = chain(&[&[0x05], &[0x06]]);
        let plan = plan_remove(&nodes[1], &nodes[2]).unwrap();
        assert_eq!(plan.merged.key, vec![0x05]);
        assert_eq!(plan.merged.next, MAX_SENTINEL.to_vec());
    }

    #[test]
    fn remove_detects_moved_predecessor() {
        // Predecessor was updated by a concurrent insert of 0x05 0x80.
        let pred = node(1, &[0x05], &[0x05, 0x80]);
        let victim = node(2, &[0x06], &MAX_SENTINEL);
        assert!(matches!(
            plan_remove(&pred, &victim),
            Err(Error::InconsistentChain(_))
        ));
    }

    #[test]
    fn origin_is_never_removed() {
        let nodes = chain(&[]);
        assert!(remove_record(&nodes[0].record, &nodes[0].record).is_err());
    }
}
