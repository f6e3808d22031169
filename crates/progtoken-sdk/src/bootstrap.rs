//! One-shot protocol deployment.
//!
//! The bootstrap spends two seed outputs, which the singleton policies are
//! parameterized with, so it can succeed at most once per seed pair. If the
//! wallet does not have enough spendable outputs it first fans one out with
//! a split transaction and waits, bounded, for the result to appear.

use crate::address::Address;
use crate::chain::{
    LedgerQuery, Signer, Submitter, WalletQuery, sign_and_submit, spendable_wallet_outputs,
};
use crate::config::BootstrapConfig;
use crate::datum::IssuanceTemplateDatum;
use crate::error::{Error, Result};
use crate::hash::{ScriptHash, TxHash};
use crate::network::Network;
use crate::params::{
    CUSTODY_BASE_REF_INDEX, CUSTODY_GLOBAL_REF_INDEX, DirectoryMintParams, DirectorySpendParams,
    IssuanceParams, LogicBaseParams, LogicGlobalParams, ParamSource, ProtocolBootstrapParams,
    ProtocolParamsRef, TxInputRef,
};
use crate::scripts::{ProtocolScripts, ValidatorSource};
use crate::state::BootstrapState;
use crate::tx::bootstrap::{BootstrapTxParams, build_bootstrap_tx};
use crate::tx::split::{SplitParams, build_split_tx};
use crate::utxo::{LedgerOutput, OutputRef};

/// Tracks bootstrap progress and rejects out-of-order steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapSequencer {
    state: BootstrapState,
}

impl Default for BootstrapSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapSequencer {
    pub fn new() -> Self {
        Self {
            state: BootstrapState::Idle,
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Move to `to`, which must be the current state's successor.
    pub fn advance(&mut self, to: BootstrapState) -> Result<()> {
        if self.state.successor() != Some(to) {
            return Err(Error::InvalidBootstrapState(self.state));
        }
        log::info!("bootstrap: {:?} -> {:?}", self.state, to);
        self.state = to;
        Ok(())
    }
}

/// Collaborators the bootstrap drives.
pub struct BootstrapContext<'a> {
    pub ledger: &'a dyn LedgerQuery,
    pub wallet: &'a dyn WalletQuery,
    pub signer: &'a dyn Signer,
    pub submitter: &'a dyn Submitter,
    pub validators: &'a dyn ValidatorSource,
    pub network: Network,
    pub config: BootstrapConfig,
}

/// Deploy the protocol.
///
/// `template_logic` is the minting logic the issuance policy is compiled
/// with to produce the issuance template; any script hash that occurs once
/// in the compiled policy works.
pub async fn bootstrap(
    ctx: &BootstrapContext<'_>,
    template_logic: ScriptHash,
) -> Result<ProtocolBootstrapParams> {
    let mut sequencer = BootstrapSequencer::new();
    let network_id = ctx.network.network_id();
    let config = &ctx.config;

    let collateral = ctx.wallet.collateral().await?.ok_or(Error::NoCollateral)?;
    let change_address = ctx.wallet.change_address().await?;

    let mut spendable = spendable_wallet_outputs(ctx.wallet, Some(&collateral.out_ref)).await?;
    if spendable.len() < config.min_wallet_outputs {
        log::info!(
            "bootstrap: wallet has {} spendable outputs, need {}; splitting",
            spendable.len(),
            config.min_wallet_outputs
        );
        let split = build_split_tx(&SplitParams {
            network_id,
            wallet_outputs: spendable,
            collateral: Some(collateral.out_ref),
            destination: change_address,
            count: config.split_count,
            output_coin: config.split_output_coin,
            change_address,
        })?;
        let split_hash = sign_and_submit(ctx.signer, ctx.submitter, &split).await?;
        wait_for_outputs(ctx.ledger, &split_hash, config).await?;

        spendable = spendable_wallet_outputs(ctx.wallet, Some(&collateral.out_ref)).await?;
        if spendable.len() < config.min_wallet_outputs {
            return Err(Error::EmptyWallet);
        }
    }

    spendable.sort_by_key(|o| o.out_ref);
    let (params_seed, template_seed) = match spendable.as_slice() {
        [a, b, ..] => (a.clone(), b.clone()),
        _ => return Err(Error::EmptyWallet),
    };
    for seed in [&params_seed, &template_seed] {
        if ctx.ledger.fetch_output(&seed.out_ref).await?.is_none() {
            return Err(Error::ReferenceSpent(seed.out_ref.to_string()));
        }
    }
    log::debug!(
        "bootstrap: seeds {} and {}",
        params_seed.out_ref,
        template_seed.out_ref
    );

    let scripts = ProtocolScripts::new(ctx.validators, network_id);

    let protocol_params_mint = scripts.protocol_params_mint(params_seed.out_ref)?;
    let issuance_cbor_hex_mint = scripts.issuance_cbor_hex_mint(template_seed.out_ref)?;
    let directory_mint = scripts.registry_mint(
        ParamSource::HashOnly(issuance_cbor_hex_mint.hash),
        Some(params_seed.out_ref),
    )?;
    let registry_spend = scripts.registry_spend(ParamSource::HashOnly(protocol_params_mint.hash))?;

    let custody_global =
        scripts.programmable_logic_global(ParamSource::HashOnly(protocol_params_mint.hash))?;
    let custody_base =
        scripts.programmable_logic_base(ParamSource::HashOnly(custody_global.hash))?;
    let issuance = scripts.issuance_mint(template_logic, ParamSource::HashOnly(custody_base.hash))?;
    let issuance_template = IssuanceTemplateDatum::split(&issuance.code, &template_logic)?;

    let tx = build_bootstrap_tx(&BootstrapTxParams {
        network_id,
        params_seed: params_seed.clone(),
        template_seed: template_seed.clone(),
        protocol_params_mint: protocol_params_mint.clone(),
        issuance_cbor_hex_mint: issuance_cbor_hex_mint.clone(),
        directory_mint: directory_mint.clone(),
        registry_address: Address::script(network_id, registry_spend.hash),
        custody_base: custody_base.clone(),
        custody_global: custody_global.clone(),
        issuance_template,
        reference_address: change_address,
        coins: config.clone(),
        collateral,
        wallet_outputs: spendable.clone(),
        change_address,
    })?;
    let tx_hash = sign_and_submit(ctx.signer, ctx.submitter, &tx).await?;
    sequencer.advance(BootstrapState::ParamsMinted)?;

    // The custody reference scripts must be readable before anything can
    // spend against them.
    let published = wait_for_outputs(ctx.ledger, &tx_hash, config).await?;
    for index in [CUSTODY_BASE_REF_INDEX, CUSTODY_GLOBAL_REF_INDEX] {
        let out_ref = OutputRef::new(tx_hash, index);
        if !published.iter().any(|o| o.out_ref == out_ref) {
            return Err(Error::MissingReference(out_ref.to_string()));
        }
    }
    sequencer.advance(BootstrapState::CustodyDeployed)?;

    let params_input = TxInputRef::from(params_seed.out_ref);
    let params = ProtocolBootstrapParams {
        tx_hash,
        protocol_params: ProtocolParamsRef {
            tx_input: params_input,
            script_hash: protocol_params_mint.hash,
        },
        programmable_logic_global_params: LogicGlobalParams {
            protocol_params_script_hash: protocol_params_mint.hash,
            script_hash: custody_global.hash,
        },
        programmable_logic_base_params: LogicBaseParams {
            programmable_logic_global_script_hash: custody_global.hash,
            script_hash: custody_base.hash,
        },
        issuance_params: IssuanceParams {
            tx_input: template_seed.out_ref.into(),
            script_hash: issuance_cbor_hex_mint.hash,
        },
        directory_mint_params: DirectoryMintParams {
            tx_input: params_input,
            issuance_script_hash: issuance_cbor_hex_mint.hash,
            script_hash: directory_mint.hash,
        },
        directory_spend_params: DirectorySpendParams {
            protocol_params_policy_id: protocol_params_mint.hash,
            script_hash: registry_spend.hash,
        },
        programmable_base_ref_input: OutputRef::new(tx_hash, CUSTODY_BASE_REF_INDEX).into(),
        programmable_global_ref_input: OutputRef::new(tx_hash, CUSTODY_GLOBAL_REF_INDEX).into(),
    };
    sequencer.advance(BootstrapState::Sealed)?;
    Ok(params)
}

/// Poll until `tx_hash` has visible outputs, up to the configured timeout.
pub async fn wait_for_outputs(
    ledger: &dyn LedgerQuery,
    tx_hash: &TxHash,
    config: &BootstrapConfig,
) -> Result<Vec<LedgerOutput>> {
    let poll = async {
        loop {
            let outputs = ledger.fetch_outputs_by_ref(tx_hash, None).await?;
            if !outputs.is_empty() {
                log::debug!("{} outputs of {tx_hash} visible", outputs.len());
                return Ok::<_, Error>(outputs);
            }
            tokio::time::sleep(config.poll_interval()).await;
        }
    };
    tokio::time::timeout(config.poll_timeout(), poll)
        .await
        .map_err(|_| Error::Timeout {
            what: format!("outputs of {tx_hash}"),
            seconds: config.poll_timeout_secs,
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequencer_is_linear() {
        let mut seq = BootstrapSequencer::new();
        assert!(matches!(
            seq.advance(BootstrapState::CustodyDeployed),
            Err(Error::InvalidBootstrapState(BootstrapState::Idle))
        ));
        seq.advance(BootstrapState::ParamsMinted).unwrap();
        seq.advance(BootstrapState::CustodyDeployed).unwrap();
        seq.advance(BootstrapState::Sealed).unwrap();
        assert!(seq.state().is_sealed());
        assert!(seq.advance(BootstrapState::Sealed).is_err());
        assert!(seq.advance(BootstrapState::Idle).is_err());
    }
}
