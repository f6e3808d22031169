//! The on-chain registry: a sorted linked list of [`RegistryRecord`]s, one
//! per output at the registry address.
//!
//! Nothing here is cached. Callers fetch the live outputs immediately before
//! each plan, decode them with [`decode_nodes`], and hand the result to the
//! [`locator`] and [`planner`].

pub mod locator;
pub mod planner;

use crate::datum::RegistryRecord;
use crate::error::{Error, Result};
use crate::hash::PolicyId;
use crate::utxo::{LedgerOutput, OutputRef};
use crate::value::{AssetName, TokenUnit};

/// A registry record together with the output carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryNode {
    pub output: LedgerOutput,
    pub record: RegistryRecord,
}

impl RegistryNode {
    pub fn from_output(output: LedgerOutput) -> Result<Self> {
        let datum = output.datum.as_ref().ok_or_else(|| {
            Error::MalformedRecord(format!(
                "registry output {} has no inline datum",
                output.out_ref
            ))
        })?;
        let record = RegistryRecord::from_data(datum)?;
        Ok(Self { output, record })
    }

    pub fn out_ref(&self) -> OutputRef {
        self.output.out_ref
    }

    /// Directory token authenticating this node: the directory policy with
    /// the node's key as asset name.
    pub fn directory_unit(&self, directory_policy: PolicyId) -> Result<TokenUnit> {
        Ok(TokenUnit::new(
            directory_policy,
            AssetName::new(self.record.key.clone())?,
        ))
    }
}

/// Decode the outputs found at the registry address.
///
/// Outputs whose datum does not parse, or that do not carry exactly one
/// directory token, are not part of the registry; they are logged and
/// skipped.
pub fn decode_nodes(outputs: Vec<LedgerOutput>, directory_policy: &PolicyId) -> Vec<RegistryNode> {
    let fetched = outputs.len();
    let nodes: Vec<RegistryNode> = outputs
        .into_iter()
        .filter_map(|output| {
            let out_ref = output.out_ref;
            if output.value.policy_quantity(directory_policy) != 1 {
                log::warn!("skipping registry output {out_ref}: no directory token");
                return None;
            }
            match RegistryNode::from_output(output) {
                Ok(node) => Some(node),
                Err(e) => {
                    log::warn!("skipping unparseable registry output {out_ref}: {e}");
                    None
                }
            }
        })
        .collect();
    log::debug!("registry: decoded {} of {fetched} outputs", nodes.len());
    nodes
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::plutus_data::PlutusData;
    use crate::value::Value;

    #[test]
    fn decode_skips_foreign_outputs() {
        let good = node(1, &[], &[0x0a]);

        let mut bad_datum = node(2, &[0x0a], &[0xff]).output;
        bad_datum.datum = Some(PlutusData::int(3));

        let mut no_token = node(3, &[0x0b], &[0xff]).output;
        no_token.value = Value::lovelace(2_000_000);

        let mut no_datum = node(4, &[0x0c], &[0xff]).output;
        no_datum.datum = None;

        let nodes = decode_nodes(
            vec![good.output.clone(), bad_datum, no_token, no_datum],
            &DIR_POLICY,
        );
        assert_eq!(nodes, vec![good]);
    }

    #[test]
    fn directory_unit_uses_key_as_name() {
        let n = node(1, &[0x0a; 28], &[0xff]);
        let unit = n.directory_unit(DIR_POLICY).unwrap();
        assert_eq!(unit.name.as_bytes(), &[0x0a; 28]);
        assert_eq!(n.output.value.quantity_of(&unit), 1);
    }
}
