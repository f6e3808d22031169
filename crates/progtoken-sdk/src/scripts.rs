//! Parameterized protocol validators.
//!
//! The compiled blueprint and the parameter application live outside this
//! crate behind [`ValidatorSource`]. [`ProtocolScripts`] knows which
//! parameters each validator takes and where they come from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{Error, Result};
use crate::hash::ScriptHash;
use crate::params::ParamSource;
use crate::plutus_data::PlutusData;
use crate::utxo::OutputRef;

/// Serialized script together with its hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub hash: ScriptHash,
    #[serde(with = "hex")]
    pub code: Vec<u8>,
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("hash", &self.hash)
            .field("code_len", &self.code.len())
            .finish()
    }
}

/// Protocol validators in the blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Validator {
    RegistrySpend,
    RegistryMint,
    ProgrammableLogicBase,
    ProgrammableLogicGlobal,
    IssuanceMint,
    IssuanceCborHexMint,
    ProtocolParamsMint,
}

impl Validator {
    /// Blueprint title, `<module>.<validator>.<purpose>`.
    pub fn title(self) -> &'static str {
        match self {
            Validator::RegistrySpend => "registry_spend.registry_spend.spend",
            Validator::RegistryMint => "registry_mint.registry_mint.mint",
            Validator::ProgrammableLogicBase => {
                "programmable_logic_base.programmable_logic_base.spend"
            }
            Validator::ProgrammableLogicGlobal => {
                "programmable_logic_global.programmable_logic_global.withdraw"
            }
            Validator::IssuanceMint => "issuance_mint.issuance_mint.mint",
            Validator::IssuanceCborHexMint => "issuance_cbor_hex_mint.issuance_cbor_hex_mint.mint",
            Validator::ProtocolParamsMint => "protocol_params_mint.protocol_params_mint.mint",
        }
    }
}

/// Applies parameters to a blueprint validator.
pub trait ValidatorSource: Send + Sync {
    fn apply_params(&self, validator: Validator, params: &[PlutusData]) -> Result<Script>;
}

/// Derives every protocol script from a [`ValidatorSource`].
pub struct ProtocolScripts<'a> {
    source: &'a dyn ValidatorSource,
    network_id: u8,
}

impl<'a> ProtocolScripts<'a> {
    pub fn new(source: &'a dyn ValidatorSource, network_id: u8) -> Self {
        Self { source, network_id }
    }

    /// Locks registry nodes. Parameter: protocol-params policy.
    pub fn registry_spend(&self, params: ParamSource<'_>) -> Result<Script> {
        let hash = match params {
            ParamSource::Resolved(p) => p.protocol_params.script_hash,
            ParamSource::HashOnly(h) => h,
        };
        self.source
            .apply_params(Validator::RegistrySpend, &[PlutusData::bytes(hash.as_bytes())])
    }

    /// Address registry nodes live at.
    pub fn registry_address(&self, params: ParamSource<'_>) -> Result<Address> {
        Ok(Address::script(self.network_id, self.registry_spend(params)?.hash))
    }

    /// Directory-token policy. Parameters: the one-shot seed and the
    /// issuance-template policy. `HashOnly` needs the seed passed explicitly.
    pub fn registry_mint(
        &self,
        params: ParamSource<'_>,
        seed: Option<OutputRef>,
    ) -> Result<Script> {
        let (hash, seed) = match params {
            ParamSource::Resolved(p) => (
                p.directory_mint_params.issuance_script_hash,
                p.directory_mint_params.tx_input.into(),
            ),
            ParamSource::HashOnly(h) => {
                let seed = seed.ok_or_else(|| {
                    Error::Script("registry mint needs a seed reference".into())
                })?;
                (h, seed)
            }
        };
        self.source.apply_params(
            Validator::RegistryMint,
            &[seed.to_data(), PlutusData::bytes(hash.as_bytes())],
        )
    }

    /// Custody base (holder spending) script. Parameter: custody global
    /// script as a script credential.
    pub fn programmable_logic_base(&self, params: ParamSource<'_>) -> Result<Script> {
        let hash = match params {
            ParamSource::Resolved(p) => p.programmable_logic_global_params.script_hash,
            ParamSource::HashOnly(h) => h,
        };
        self.source.apply_params(
            Validator::ProgrammableLogicBase,
            &[PlutusData::constr(1, vec![PlutusData::bytes(hash.as_bytes())])],
        )
    }

    /// Custody global (withdraw) script. Parameter: protocol-params policy.
    pub fn programmable_logic_global(&self, params: ParamSource<'_>) -> Result<Script> {
        let hash = match params {
            ParamSource::Resolved(p) => p.protocol_params.script_hash,
            ParamSource::HashOnly(h) => h,
        };
        self.source.apply_params(
            Validator::ProgrammableLogicGlobal,
            &[PlutusData::bytes(hash.as_bytes())],
        )
    }

    /// Programmable-token issuance policy for one minting logic. Its hash is
    /// the token's policy id and registry key.
    pub fn issuance_mint(
        &self,
        minting_logic: ScriptHash,
        params: ParamSource<'_>,
    ) -> Result<Script> {
        let base = match params {
            ParamSource::Resolved(p) => p.programmable_logic_base_params.script_hash,
            ParamSource::HashOnly(h) => h,
        };
        self.source.apply_params(
            Validator::IssuanceMint,
            &[
                PlutusData::constr(1, vec![PlutusData::bytes(base.as_bytes())]),
                PlutusData::constr(1, vec![PlutusData::bytes(minting_logic.as_bytes())]),
            ],
        )
    }

    /// One-shot policy of the issuance-template singleton.
    pub fn issuance_cbor_hex_mint(&self, seed: OutputRef) -> Result<Script> {
        self.source
            .apply_params(Validator::IssuanceCborHexMint, &[seed.to_data()])
    }

    /// One-shot policy of the protocol-params singleton.
    pub fn protocol_params_mint(&self, seed: OutputRef) -> Result<Script> {
        self.source
            .apply_params(Validator::ProtocolParamsMint, &[seed.to_data()])
    }
}
