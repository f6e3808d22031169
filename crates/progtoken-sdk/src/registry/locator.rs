//! Covering-node search over the live registry.
//!
//! Keys compare byte-lexicographically: the empty origin key sorts first and
//! a proper prefix sorts before its extensions, which is exactly `[u8]`'s
//! `Ord`.

use std::collections::{HashMap, HashSet};

use crate::datum::{MAX_SENTINEL, RegistryRecord};
use crate::error::{Error, Result};
use crate::registry::RegistryNode;

/// Node whose range brackets `key` for an insertion: `node.key < key < node.next`.
///
/// Fails with `DuplicateKey` if `key` is already registered.
pub fn find_insert_covering<'a>(
    nodes: &'a [RegistryNode],
    key: &[u8],
) -> Result<&'a RegistryNode> {
    if nodes.iter().any(|n| n.record.key == key) {
        return Err(Error::DuplicateKey(hex::encode(key)));
    }
    let mut covering = nodes.iter().filter(|n| n.record.covers(key));
    match (covering.next(), covering.next()) {
        (Some(node), None) => {
            log::debug!(
                "registry: key {} covered by node {} at {}",
                hex::encode(key),
                hex::encode(&node.record.key),
                node.out_ref()
            );
            Ok(node)
        }
        (None, _) => Err(Error::NoCoveringNode(hex::encode(key))),
        (Some(_), Some(_)) => Err(Error::InconsistentChain(format!(
            "more than one node covers {}",
            hex::encode(key)
        ))),
    }
}

/// Victim node (`key == key`) and its predecessor (`next == key`) for a removal.
pub fn find_remove_covering<'a>(
    nodes: &'a [RegistryNode],
    key: &[u8],
) -> Result<(&'a RegistryNode, &'a RegistryNode)> {
    let victim = find_by_key(nodes, key)
        .ok_or_else(|| Error::UnregisteredPolicy(hex::encode(key)))?;
    let predecessor = nodes
        .iter()
        .filter(|n| n.out_ref() != victim.out_ref())
        .find(|n| n.record.next == key)
        .ok_or_else(|| Error::NoCoveringNode(hex::encode(key)))?;
    Ok((victim, predecessor))
}

pub fn find_by_key<'a>(nodes: &'a [RegistryNode], key: &[u8]) -> Option<&'a RegistryNode> {
    nodes.iter().find(|n| n.record.key == key)
}

/// Order nodes along the chain, origin first.
///
/// Fails with `InconsistentChain` on a missing origin, duplicate keys, a
/// dangling or cyclic `next`, or nodes unreachable from the origin.
pub fn order_chain(nodes: &[RegistryNode]) -> Result<Vec<&RegistryNode>> {
    let mut by_key: HashMap<&[u8], &RegistryNode> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        if by_key.insert(node.record.key.as_slice(), node).is_some() {
            return Err(Error::InconsistentChain(format!(
                "duplicate key {}",
                hex::encode(&node.record.key)
            )));
        }
    }

    let origin_key: &[u8] = &[];
    let mut current = *by_key
        .get(origin_key)
        .ok_or_else(|| Error::InconsistentChain("no origin node".into()))?;
    let mut ordered = Vec::with_capacity(nodes.len());
    let mut seen = HashSet::new();
    loop {
        if !seen.insert(current.record.key.as_slice()) {
            return Err(Error::InconsistentChain(format!(
                "cycle at {}",
                hex::encode(&current.record.key)
            )));
        }
        ordered.push(current);
        if current.record.is_terminal() {
            break;
        }
        current = by_key.get(current.record.next.as_slice()).copied().ok_or_else(|| {
            Error::InconsistentChain(format!(
                "dangling next {}",
                hex::encode(&current.record.next)
            ))
        })?;
    }

    if ordered.len() != nodes.len() {
        return Err(Error::InconsistentChain(format!(
            "{} nodes unreachable from origin",
            nodes.len() - ordered.len()
        )));
    }
    Ok(ordered)
}

/// Check the chain invariants on records already in chain order: origin
/// first, each `next` equal to the following key, keys strictly
/// increasing, terminal `next` the maximum sentinel.
pub fn verify_chain(records: &[RegistryRecord]) -> Result<()> {
    let first = records
        .first()
        .ok_or_else(|| Error::InconsistentChain("empty registry".into()))?;
    if !first.is_origin() {
        return Err(Error::InconsistentChain("chain does not start at origin".into()));
    }
    for pair in records.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.next != b.key {
            return Err(Error::InconsistentChain(format!(
                "{} points at {}, followed by {}",
                hex::encode(&a.key),
                hex::encode(&a.next),
                hex::encode(&b.key)
            )));
        }
        if a.key >= b.key {
            return Err(Error::InconsistentChain(format!(
                "keys not increasing at {}",
                hex::encode(&b.key)
            )));
        }
    }
    let last = &records[records.len() - 1];
    if last.next != MAX_SENTINEL || last.key.as_slice() >= MAX_SENTINEL.as_slice() {
        return Err(Error::InconsistentChain(
            "chain does not end at the maximum sentinel".into(),
        ));
    }
    Ok(())
}
