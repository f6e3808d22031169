use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::{PolicyId, ScriptHash, TxHash};
use crate::utxo::OutputRef;

/// Output index of the protocol-params singleton in the bootstrap transaction.
pub const PROTOCOL_PARAMS_INDEX: u32 = 0;
/// Output index of the origin registry node.
pub const DIRECTORY_ORIGIN_INDEX: u32 = 1;
/// Output index of the issuance-template singleton.
pub const ISSUANCE_TEMPLATE_INDEX: u32 = 2;
/// Output index of the custody base reference script.
pub const CUSTODY_BASE_REF_INDEX: u32 = 3;
/// Output index of the custody global reference script.
pub const CUSTODY_GLOBAL_REF_INDEX: u32 = 4;

/// Output reference in the deployment file's `{txHash, outputIndex}` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInputRef {
    pub tx_hash: TxHash,
    pub output_index: u32,
}

impl From<OutputRef> for TxInputRef {
    fn from(r: OutputRef) -> Self {
        Self {
            tx_hash: r.tx_hash,
            output_index: r.index,
        }
    }
}

impl From<TxInputRef> for OutputRef {
    fn from(r: TxInputRef) -> Self {
        OutputRef::new(r.tx_hash, r.output_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolParamsRef {
    pub tx_input: TxInputRef,
    pub script_hash: ScriptHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicGlobalParams {
    pub protocol_params_script_hash: ScriptHash,
    pub script_hash: ScriptHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicBaseParams {
    pub programmable_logic_global_script_hash: ScriptHash,
    pub script_hash: ScriptHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceParams {
    pub tx_input: TxInputRef,
    pub script_hash: ScriptHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryMintParams {
    pub tx_input: TxInputRef,
    pub issuance_script_hash: ScriptHash,
    pub script_hash: ScriptHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySpendParams {
    pub protocol_params_policy_id: PolicyId,
    pub script_hash: ScriptHash,
}

/// Everything later operations need to know about a deployed protocol.
///
/// Produced once by the bootstrap and read-only afterwards. The JSON layout
/// is the one deployment files use, including the `programmableLogicGlobalPrams`
/// key spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolBootstrapParams {
    pub tx_hash: TxHash,
    pub protocol_params: ProtocolParamsRef,
    #[serde(rename = "programmableLogicGlobalPrams")]
    pub programmable_logic_global_params: LogicGlobalParams,
    pub programmable_logic_base_params: LogicBaseParams,
    pub issuance_params: IssuanceParams,
    pub directory_mint_params: DirectoryMintParams,
    pub directory_spend_params: DirectorySpendParams,
    pub programmable_base_ref_input: TxInputRef,
    pub programmable_global_ref_input: TxInputRef,
}

impl ProtocolBootstrapParams {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(format!("bootstrap params: {e}")))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn protocol_params_ref(&self) -> OutputRef {
        OutputRef::new(self.tx_hash, PROTOCOL_PARAMS_INDEX)
    }

    pub fn issuance_template_ref(&self) -> OutputRef {
        OutputRef::new(self.tx_hash, ISSUANCE_TEMPLATE_INDEX)
    }

    pub fn custody_base_ref(&self) -> OutputRef {
        self.programmable_base_ref_input.into()
    }

    pub fn custody_global_ref(&self) -> OutputRef {
        self.programmable_global_ref_input.into()
    }

    /// Policy of the directory tokens that authenticate registry nodes.
    pub fn directory_policy(&self) -> PolicyId {
        self.directory_mint_params.script_hash
    }

    pub fn custody_base_hash(&self) -> ScriptHash {
        self.programmable_logic_base_params.script_hash
    }
}

/// Where a validator derivation takes its parameter from.
#[derive(Debug, Clone, Copy)]
pub enum ParamSource<'a> {
    /// Read the needed hash out of deployed parameters.
    Resolved(&'a ProtocolBootstrapParams),
    /// Use this hash directly; used while the parameters are being created.
    HashOnly(ScriptHash),
}

impl<'a> From<&'a ProtocolBootstrapParams> for ParamSource<'a> {
    fn from(p: &'a ProtocolBootstrapParams) -> Self {
        ParamSource::Resolved(p)
    }
}

#[cfg(test)]
pub(crate) fn sample_params() -> ProtocolBootstrapParams {
    let tx = TxHash([0x11; 32]);
    let h = |b: u8| ScriptHash([b; 28]);
    ProtocolBootstrapParams {
        tx_hash: tx,
        protocol_params: ProtocolParamsRef {
            tx_input: TxInputRef {
                tx_hash: TxHash([0x22; 32]),
                output_index: 0,
            },
            script_hash: h(1),
        },
        programmable_logic_global_params: LogicGlobalParams {
            protocol_params_script_hash: h(1),
            script_hash: h(2),
        },
        programmable_logic_base_params: LogicBaseParams {
            programmable_logic_global_script_hash: h(2),
            script_hash: h(3),
        },
        issuance_params: IssuanceParams {
            tx_input: TxInputRef {
                tx_hash: TxHash([0x22; 32]),
                output_index: 1,
            },
            script_hash: h(4),
        },
        directory_mint_params: DirectoryMintParams {
            tx_input: TxInputRef {
                tx_hash: TxHash([0x22; 32]),
                output_index: 0,
            },
            issuance_script_hash: h(4),
            script_hash: h(5),
        },
        directory_spend_params: DirectorySpendParams {
            protocol_params_policy_id: h(1),
            script_hash: h(6),
        },
        programmable_base_ref_input: TxInputRef {
            tx_hash: tx,
            output_index: CUSTODY_BASE_REF_INDEX,
        },
        programmable_global_ref_input: TxInputRef {
            tx_hash: tx,
            output_index: CUSTODY_GLOBAL_REF_INDEX,
        },
    }
}
