//! In-memory collaborators for exercising the full plan, sign and submit
//! path without a live ledger.
//!
//! [`MemoryLedger`] applies submitted transactions with the ledger's
//! compare-and-swap rule: every spent, referenced or collateral output must
//! still be unspent, otherwise the submission fails with `StaleState`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::address::{Address, Credential};
use crate::chain::{LedgerQuery, Signer, Submitter, WalletQuery};
use crate::error::{Error, Result};
use crate::hash::{KeyHash, ScriptHash, TxHash};
use crate::plutus_data::PlutusData;
use crate::scripts::{Script, Validator, ValidatorSource};
use crate::tx::{KeyWitness, SignedTx, UnsignedTx};
use crate::utxo::{LedgerOutput, OutputRef};
use crate::value::Value;

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Default)]
struct LedgerState {
    utxos: BTreeMap<OutputRef, LedgerOutput>,
    /// Outputs of accepted transactions not yet visible to queries.
    pending: Vec<LedgerOutput>,
    withhold: bool,
    submitted: Vec<TxHash>,
    funded: u64,
}

/// Shared in-memory output set. Clones see the same ledger.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<Mutex<LedgerState>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.inner.lock().expect("ledger lock poisoned")
    }

    /// Create an output out of thin air, as a faucet would.
    pub fn fund(&self, address: Address, value: Value) -> LedgerOutput {
        let mut st = self.state();
        st.funded += 1;
        let seed = Sha256::digest(st.funded.to_be_bytes());
        let out_ref = OutputRef::new(TxHash::from_slice(&seed).expect("32-byte digest"), 0);
        let output = LedgerOutput {
            out_ref,
            address,
            value,
            datum: None,
            script_ref: None,
        };
        st.utxos.insert(out_ref, output.clone());
        output
    }

    /// Insert a prepared output as is.
    pub fn insert(&self, output: LedgerOutput) {
        self.state().utxos.insert(output.out_ref, output);
    }

    /// Spend an output outside of any transaction.
    pub fn spend(&self, out_ref: &OutputRef) -> Option<LedgerOutput> {
        self.state().utxos.remove(out_ref)
    }

    pub fn output(&self, out_ref: &OutputRef) -> Option<LedgerOutput> {
        self.state().utxos.get(out_ref).cloned()
    }

    pub fn outputs_at(&self, address: &Address) -> Vec<LedgerOutput> {
        self.state()
            .utxos
            .values()
            .filter(|o| o.address == *address)
            .cloned()
            .collect()
    }

    /// While set, accepted transactions' outputs stay invisible until
    /// [`release_pending`](Self::release_pending).
    pub fn withhold_outputs(&self, withhold: bool) {
        self.state().withhold = withhold;
    }

    pub fn release_pending(&self) {
        let mut st = self.state();
        let pending = std::mem::take(&mut st.pending);
        for output in pending {
            st.utxos.insert(output.out_ref, output);
        }
    }

    /// Hashes of accepted transactions, in order.
    pub fn submitted(&self) -> Vec<TxHash> {
        self.state().submitted.clone()
    }

    /// Apply `tx` if every output it touches is still live.
    pub fn apply(&self, tx: &UnsignedTx) -> Result<TxHash> {
        let id = tx.id()?;
        let mut st = self.state();

        let touched = tx
            .spent_refs()
            .chain(tx.reference_inputs.iter().copied())
            .chain(tx.collateral);
        for out_ref in touched {
            if !st.utxos.contains_key(&out_ref) {
                return Err(Error::StaleState(format!("{out_ref} is no longer unspent")));
            }
        }
        for out_ref in tx.spent_refs() {
            st.utxos.remove(&out_ref);
        }

        for (i, output) in tx.outputs.iter().enumerate() {
            let created = LedgerOutput {
                out_ref: OutputRef::new(id, i as u32),
                address: output.address,
                value: output.value.clone(),
                datum: output.datum.clone(),
                script_ref: output.script_ref.as_ref().map(|s| s.hash),
            };
            if st.withhold {
                st.pending.push(created);
            } else {
                st.utxos.insert(created.out_ref, created);
            }
        }
        st.submitted.push(id);
        Ok(id)
    }
}

#[async_trait]
impl LedgerQuery for MemoryLedger {
    async fn fetch_outputs_at(&self, address: &Address) -> Result<Vec<LedgerOutput>> {
        Ok(self.outputs_at(address))
    }

    async fn fetch_outputs_by_ref(
        &self,
        tx_hash: &TxHash,
        index: Option<u32>,
    ) -> Result<Vec<LedgerOutput>> {
        Ok(self
            .state()
            .utxos
            .values()
            .filter(|o| o.out_ref.tx_hash == *tx_hash)
            .filter(|o| index.is_none_or(|i| o.out_ref.index == i))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Submitter for MemoryLedger {
    async fn submit(&self, tx: &SignedTx) -> Result<TxHash> {
        for signer in &tx.tx.required_signers {
            if !tx.witnesses.iter().any(|w| w.key == *signer) {
                return Err(Error::Submission(format!("missing signature of {signer}")));
            }
        }
        self.apply(&tx.tx)
    }
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// Single-address wallet over a [`MemoryLedger`]; signs with the keys of its
/// payment and stake credentials.
#[derive(Clone)]
pub struct MemoryWallet {
    ledger: MemoryLedger,
    address: Address,
    collateral: Option<OutputRef>,
}

impl MemoryWallet {
    pub fn new(ledger: MemoryLedger, address: Address) -> Self {
        Self {
            ledger,
            address,
            collateral: None,
        }
    }

    /// Fund the wallet and reserve a fresh 5 ADA output as collateral.
    pub fn funded(ledger: MemoryLedger, address: Address, coins: &[u64]) -> Self {
        let collateral = ledger.fund(address, Value::lovelace(5_000_000)).out_ref;
        for coin in coins {
            ledger.fund(address, Value::lovelace(*coin));
        }
        Self {
            ledger,
            address,
            collateral: Some(collateral),
        }
    }

    pub fn with_collateral(mut self, out_ref: OutputRef) -> Self {
        self.collateral = Some(out_ref);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn keys(&self) -> Vec<KeyHash> {
        [
            self.address.payment_credential(),
            self.address.stake_credential(),
        ]
        .into_iter()
        .flatten()
        .filter_map(|c| match c {
            Credential::Key(k) => Some(*k),
            Credential::Script(_) => None,
        })
        .collect()
    }
}

#[async_trait]
impl WalletQuery for MemoryWallet {
    async fn wallet_outputs(&self) -> Result<Vec<LedgerOutput>> {
        Ok(self.ledger.outputs_at(&self.address))
    }

    async fn collateral(&self) -> Result<Option<LedgerOutput>> {
        Ok(self.collateral.and_then(|r| self.ledger.output(&r)))
    }

    async fn change_address(&self) -> Result<Address> {
        Ok(self.address)
    }
}

#[async_trait]
impl Signer for MemoryWallet {
    async fn sign(&self, tx: &UnsignedTx) -> Result<SignedTx> {
        let id = tx.id()?;
        let witnesses = self
            .keys()
            .into_iter()
            .map(|key| {
                let mut hasher = Sha256::new();
                hasher.update(key.as_bytes());
                hasher.update(id.as_bytes());
                KeyWitness {
                    key,
                    signature: hasher.finalize().to_vec(),
                }
            })
            .collect();
        Ok(SignedTx {
            tx: tx.clone(),
            witnesses,
        })
    }
}

/// Base address with key payment and stake credentials derived from `seed`.
pub fn key_address(network_id: u8, seed: u8) -> Address {
    Address::Base {
        network_id,
        payment: Credential::Key(KeyHash([seed; 28])),
        stake: Credential::Key(KeyHash([seed.wrapping_add(0x80); 28])),
    }
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

/// Deterministic stand-in for blueprint parameterization: the script code is
/// the validator title followed by each parameter's CBOR, and the hash is
/// SHA-256 of the code truncated to 28 bytes.
///
/// Every parameter's bytes appear verbatim in the code, so the issuance
/// template split works as it does on compiled policies.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashingValidators;

impl HashingValidators {
    pub fn hash_code(code: &[u8]) -> ScriptHash {
        let digest = Sha256::digest(code);
        ScriptHash::from_slice(&digest[..ScriptHash::LEN]).expect("28-byte prefix")
    }

    /// A standalone script, e.g. a minting or transfer logic.
    pub fn script(label: &str) -> Script {
        let code = label.as_bytes().to_vec();
        Script {
            hash: Self::hash_code(&code),
            code,
        }
    }
}

impl ValidatorSource for HashingValidators {
    fn apply_params(&self, validator: Validator, params: &[PlutusData]) -> Result<Script> {
        let mut code = validator.title().as_bytes().to_vec();
        for param in params {
            code.extend_from_slice(&param.to_cbor());
        }
        Ok(Script {
            hash: Self::hash_code(&code),
            code,
        })
    }
}
