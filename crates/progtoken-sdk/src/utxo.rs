use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::hash::{ScriptHash, TxHash};
use crate::plutus_data::PlutusData;
use crate::value::Value;

/// Reference to a transaction output. Orders by `(tx_hash, index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    pub tx_hash: TxHash,
    pub index: u32,
}

impl OutputRef {
    pub fn new(tx_hash: TxHash, index: u32) -> Self {
        Self { tx_hash, index }
    }

    /// `Constr 0 [tx_hash, index]`, the form one-shot policies are
    /// parameterized with.
    pub fn to_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                PlutusData::bytes(self.tx_hash.as_bytes()),
                PlutusData::int(self.index as i128),
            ],
        )
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.index)
    }
}

/// An unspent output as reported by the ledger query facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOutput {
    pub out_ref: OutputRef,
    pub address: Address,
    pub value: Value,
    /// Inline datum, if any.
    pub datum: Option<PlutusData>,
    /// Hash of the reference script carried by this output, if any.
    pub script_ref: Option<ScriptHash>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_by_hash_then_index() {
        let a = OutputRef::new(TxHash([1; 32]), 5);
        let b = OutputRef::new(TxHash([1; 32]), 7);
        let c = OutputRef::new(TxHash([2; 32]), 0);
        let mut refs = vec![c, b, a];
        refs.sort();
        assert_eq!(refs, vec![a, b, c]);
    }

    #[test]
    fn display_and_data() {
        let r = OutputRef::new(TxHash([0; 32]), 3);
        assert!(r.to_string().ends_with("#3"));
        let (tag, fields) = r.to_data().as_constr().map(|(t, f)| (t, f.to_vec())).unwrap();
        assert_eq!(tag, 0);
        assert_eq!(fields[1], PlutusData::int(3));
    }
}
