//! Unsigned transaction plans and the per-operation builders.
//!
//! A builder takes an `XParams` struct with every resolved input and returns
//! an [`UnsignedTx`] or an error; it never talks to the ledger. Fee
//! balancing is left to the signer, which may draw on `wallet_inputs` and
//! sends leftovers to `change_address`.

pub mod bootstrap;
pub mod deregistration;
pub mod mint;
pub mod registration;
pub mod split;
pub mod stake_registration;
pub mod transfer;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::{Address, Credential};
use crate::datum::ToData;
use crate::error::{Error, Result};
use crate::hash::{KeyHash, PolicyId, ScriptHash, TxHash};
use crate::plutus_data::PlutusData;
use crate::scripts::Script;
use crate::utxo::{LedgerOutput, OutputRef};
use crate::value::{AssetName, TokenUnit, Value};

/// How a script witness is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptSource {
    /// Script bytes carried in the transaction witness set.
    Inline(Script),
    /// Script read from a reference output.
    Reference { out_ref: OutputRef, hash: ScriptHash },
}

impl ScriptSource {
    pub fn hash(&self) -> ScriptHash {
        match self {
            ScriptSource::Inline(s) => s.hash,
            ScriptSource::Reference { hash, .. } => *hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputWitness {
    /// Spent with a key signature.
    PubKey,
    Script {
        source: ScriptSource,
        redeemer: PlutusData,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub output: LedgerOutput,
    pub witness: InputWitness,
}

impl TxInput {
    pub fn out_ref(&self) -> OutputRef {
        self.output.out_ref
    }
}

/// Mint (positive) or burn (negative) under one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintAction {
    pub policy: PolicyId,
    pub script: ScriptSource,
    pub redeemer: PlutusData,
    pub assets: BTreeMap<AssetName, i64>,
}

/// Zero-value withdrawal used to run a script's checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub reward_address: Address,
    pub amount: u64,
    pub script: ScriptSource,
    pub redeemer: PlutusData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Certificate {
    StakeRegistration { credential: Credential },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: Address,
    pub value: Value,
    pub datum: Option<PlutusData>,
    pub script_ref: Option<Script>,
}

/// A script that is consulted through a zero-value withdrawal, together with
/// the redeemer it is run with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub script: Script,
    pub redeemer: PlutusData,
}

impl Invocation {
    pub fn new(script: Script, redeemer: PlutusData) -> Self {
        Self { script, redeemer }
    }
}

/// A fully planned, unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTx {
    pub network_id: u8,
    pub inputs: Vec<TxInput>,
    /// Kept sorted; redeemers refer to reference inputs by sorted position.
    pub reference_inputs: BTreeSet<OutputRef>,
    pub mints: Vec<MintAction>,
    pub withdrawals: Vec<Withdrawal>,
    pub certificates: Vec<Certificate>,
    pub outputs: Vec<TxOutput>,
    pub collateral: Option<OutputRef>,
    pub required_signers: BTreeSet<KeyHash>,
    /// Wallet outputs the signer may add to cover fees and coin.
    pub wallet_inputs: Vec<LedgerOutput>,
    pub change_address: Address,
}

impl UnsignedTx {
    /// Body hash: SHA-256 over the canonical JSON form.
    pub fn id(&self) -> Result<TxHash> {
        let body = serde_json::to_vec(self).map_err(|e| Error::Submission(e.to_string()))?;
        TxHash::from_slice(&Sha256::digest(&body))
    }

    pub fn spent_refs(&self) -> impl Iterator<Item = OutputRef> + '_ {
        self.inputs.iter().map(TxInput::out_ref)
    }

    pub fn spends(&self, out_ref: &OutputRef) -> bool {
        self.spent_refs().any(|r| r == *out_ref)
    }

    /// Position of `out_ref` among the sorted reference inputs.
    pub fn reference_index(&self, out_ref: &OutputRef) -> Option<u32> {
        self.reference_inputs
            .iter()
            .position(|r| r == out_ref)
            .map(|i| i as u32)
    }

    /// Net quantity minted (negative when burned) of `unit`.
    pub fn minted(&self, unit: &TokenUnit) -> i64 {
        self.mints
            .iter()
            .filter(|m| m.policy == unit.policy)
            .filter_map(|m| m.assets.get(&unit.name))
            .sum()
    }
}

/// Key witness added by a [`Signer`](crate::chain::Signer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyWitness {
    pub key: KeyHash,
    #[serde(with = "hex")]
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    pub tx: UnsignedTx,
    pub witnesses: Vec<KeyWitness>,
}

impl SignedTx {
    pub fn id(&self) -> Result<TxHash> {
        self.tx.id()
    }
}

// ── Builder helpers ─────────────────────────────────────────────────────

pub(crate) fn new_tx(network_id: u8, change_address: Address) -> UnsignedTx {
    UnsignedTx {
        network_id,
        inputs: Vec::new(),
        reference_inputs: BTreeSet::new(),
        mints: Vec::new(),
        withdrawals: Vec::new(),
        certificates: Vec::new(),
        outputs: Vec::new(),
        collateral: None,
        required_signers: BTreeSet::new(),
        wallet_inputs: Vec::new(),
        change_address,
    }
}

/// Attach a reference script's output as a reference input.
fn register_source(tx: &mut UnsignedTx, source: &ScriptSource) {
    if let ScriptSource::Reference { out_ref, .. } = source {
        tx.reference_inputs.insert(*out_ref);
    }
}

pub(crate) fn add_script_input(
    tx: &mut UnsignedTx,
    output: &LedgerOutput,
    source: ScriptSource,
    redeemer: &impl ToData,
) {
    register_source(tx, &source);
    tx.inputs.push(TxInput {
        output: output.clone(),
        witness: InputWitness::Script {
            source,
            redeemer: redeemer.to_data(),
        },
    });
}

pub(crate) fn add_pubkey_input(tx: &mut UnsignedTx, output: &LedgerOutput) {
    tx.inputs.push(TxInput {
        output: output.clone(),
        witness: InputWitness::PubKey,
    });
}

pub(crate) fn add_reference_input(tx: &mut UnsignedTx, out_ref: OutputRef) {
    tx.reference_inputs.insert(out_ref);
}

pub(crate) fn add_output(tx: &mut UnsignedTx, output: TxOutput) {
    tx.outputs.push(output);
}

/// Add `quantity` (negative to burn) of `name` under `script`'s policy,
/// merging with an existing action for the same policy.
pub(crate) fn add_mint(
    tx: &mut UnsignedTx,
    source: ScriptSource,
    name: AssetName,
    quantity: i64,
    redeemer: &impl ToData,
) {
    let policy = source.hash();
    register_source(tx, &source);
    if let Some(action) = tx.mints.iter_mut().find(|m| m.policy == policy) {
        *action.assets.entry(name).or_insert(0) += quantity;
        return;
    }
    let mut assets = BTreeMap::new();
    assets.insert(name, quantity);
    tx.mints.push(MintAction {
        policy,
        script: source,
        redeemer: redeemer.to_data(),
        assets,
    });
}

pub(crate) fn add_withdrawal(
    tx: &mut UnsignedTx,
    source: ScriptSource,
    redeemer: PlutusData,
) {
    register_source(tx, &source);
    tx.withdrawals.push(Withdrawal {
        reward_address: Address::script_reward(tx.network_id, source.hash()),
        amount: 0,
        script: source,
        redeemer,
    });
}

pub(crate) fn add_invocation(tx: &mut UnsignedTx, invocation: &Invocation) {
    add_withdrawal(
        tx,
        ScriptSource::Inline(invocation.script.clone()),
        invocation.redeemer.clone(),
    );
}

/// Set collateral. It must not also be spent by the transaction.
pub(crate) fn set_collateral(tx: &mut UnsignedTx, collateral: &LedgerOutput) -> Result<()> {
    if tx.spends(&collateral.out_ref) {
        return Err(Error::NoCollateral);
    }
    tx.collateral = Some(collateral.out_ref);
    Ok(())
}

/// Offer wallet outputs for fee balancing, excluding anything the
/// transaction already spends or reserves as collateral.
pub(crate) fn set_wallet_inputs(tx: &mut UnsignedTx, wallet: &[LedgerOutput]) {
    let reserved = tx.collateral;
    tx.wallet_inputs = wallet
        .iter()
        .filter(|o| Some(o.out_ref) != reserved && !tx.spends(&o.out_ref))
        .cloned()
        .collect();
}

/// Output carrying coin plus `quantity` of `unit`, with an inline datum.
pub(crate) fn token_output(
    address: Address,
    coin: u64,
    unit: TokenUnit,
    quantity: u64,
    datum: &impl ToData,
) -> Result<TxOutput> {
    Ok(TxOutput {
        address,
        value: Value::lovelace(coin).with_asset(unit, quantity)?,
        datum: Some(datum.to_data()),
        script_ref: None,
    })
}

pub(crate) fn coin_output(address: Address, coin: u64) -> TxOutput {
    TxOutput {
        address,
        value: Value::lovelace(coin),
        datum: None,
        script_ref: None,
    }
}

pub(crate) fn checked_i64(quantity: u64) -> Result<i64> {
    i64::try_from(quantity).map_err(|_| Error::AmountOverflow)
}
