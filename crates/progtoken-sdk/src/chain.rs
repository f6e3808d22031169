//! Collaborators the SDK consumes: ledger queries, the wallet, and the
//! signer / submitter pair.
//!
//! Empty query results mean "not yet visible" and are not errors.
//! Transport failures surface as `Error::Network`.

use async_trait::async_trait;

use crate::address::Address;
use crate::error::Result;
use crate::hash::TxHash;
use crate::tx::{SignedTx, UnsignedTx};
use crate::utxo::{LedgerOutput, OutputRef};

/// Read access to the ledger's unspent outputs.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Unspent outputs at an address.
    async fn fetch_outputs_at(&self, address: &Address) -> Result<Vec<LedgerOutput>>;

    /// Unspent outputs of a transaction; `None` for all of them.
    async fn fetch_outputs_by_ref(
        &self,
        tx_hash: &TxHash,
        index: Option<u32>,
    ) -> Result<Vec<LedgerOutput>>;

    /// A single unspent output, if it exists.
    async fn fetch_output(&self, out_ref: &OutputRef) -> Result<Option<LedgerOutput>> {
        Ok(self
            .fetch_outputs_by_ref(&out_ref.tx_hash, Some(out_ref.index))
            .await?
            .into_iter()
            .find(|o| o.out_ref == *out_ref))
    }
}

/// The operator's wallet.
#[async_trait]
pub trait WalletQuery: Send + Sync {
    async fn wallet_outputs(&self) -> Result<Vec<LedgerOutput>>;

    /// Output reserved as collateral, if the wallet has one.
    async fn collateral(&self) -> Result<Option<LedgerOutput>>;

    async fn change_address(&self) -> Result<Address>;
}

#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, tx: &UnsignedTx) -> Result<SignedTx>;
}

#[async_trait]
pub trait Submitter: Send + Sync {
    /// Submit and return the accepted transaction's hash.
    async fn submit(&self, tx: &SignedTx) -> Result<TxHash>;
}

/// Wallet outputs free to fund a transaction: coin only, no reference
/// script, and not the collateral.
pub async fn spendable_wallet_outputs(
    wallet: &dyn WalletQuery,
    collateral: Option<&OutputRef>,
) -> Result<Vec<LedgerOutput>> {
    Ok(wallet
        .wallet_outputs()
        .await?
        .into_iter()
        .filter(|o| Some(&o.out_ref) != collateral)
        .filter(|o| !o.value.has_assets() && o.script_ref.is_none())
        .collect())
}

/// Sign `tx` and hand it to the submitter.
pub async fn sign_and_submit(
    signer: &dyn Signer,
    submitter: &dyn Submitter,
    tx: &UnsignedTx,
) -> Result<TxHash> {
    let signed = signer.sign(tx).await?;
    let hash = submitter.submit(&signed).await?;
    log::info!("submitted transaction {hash}");
    Ok(hash)
}
