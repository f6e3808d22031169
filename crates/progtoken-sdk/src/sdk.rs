use std::collections::BTreeMap;

use crate::address::{Address, Credential, holder_address};
use crate::bootstrap::{BootstrapContext, bootstrap};
use crate::chain::{
    LedgerQuery, Signer, Submitter, WalletQuery, sign_and_submit, spendable_wallet_outputs,
};
use crate::config::SdkConfig;
use crate::datum::{Authorities, RegistryRecord};
use crate::error::{Error, Result};
use crate::hash::{KeyHash, PolicyId, ScriptHash, TxHash};
use crate::network::Network;
use crate::params::{ParamSource, ProtocolBootstrapParams};
use crate::registry::locator::{
    find_by_key, find_insert_covering, find_remove_covering, order_chain, verify_chain,
};
use crate::registry::planner::{plan_insert, plan_remove};
use crate::registry::{RegistryNode, decode_nodes};
use crate::scripts::{ProtocolScripts, Script, ValidatorSource};
use crate::selector::{balances, select};
use crate::tx::deregistration::{DeregistrationParams, build_deregistration_tx};
use crate::tx::mint::{MintParams, build_mint_tx};
use crate::tx::registration::{RegistrationParams, build_registration_tx};
use crate::tx::stake_registration::{StakeRegistrationParams, build_stake_registration_tx};
use crate::tx::transfer::{TransferParams, build_transfer_tx};
use crate::tx::{Invocation, ScriptSource, UnsignedTx};
use crate::utxo::{LedgerOutput, OutputRef};
use crate::value::{AssetName, TokenUnit};

/// Register a new programmable token and mint its first supply.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub asset_name: AssetName,
    pub quantity: u64,
    /// Minting logic the issuance policy is parameterized with, invoked
    /// through a zero-value withdrawal.
    pub minting_logic: Invocation,
    /// Authorities recorded in the new registry node.
    pub authorities: Authorities,
    /// Wallet address whose holder address receives the tokens; the
    /// operator's own when `None`.
    pub recipient: Option<Address>,
}

/// Mint more of an already-registered token.
#[derive(Debug, Clone)]
pub struct MintRequest {
    pub asset_name: AssetName,
    pub quantity: u64,
    pub minting_logic: Invocation,
    pub recipient: Option<Address>,
}

/// Move tokens from the operator's holder address to a recipient's.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub unit: TokenUnit,
    pub quantity: u64,
    /// Recipient wallet address; tokens land at its holder address.
    pub recipient: Address,
    /// The token's registered transfer authority.
    pub transfer_logic: Invocation,
}

/// Remove a policy from the registry.
#[derive(Debug, Clone, Copy)]
pub struct DeregisterRequest {
    pub policy: PolicyId,
}

/// Wallet resources every plan draws on.
struct Funding {
    collateral: LedgerOutput,
    wallet_outputs: Vec<LedgerOutput>,
    change_address: Address,
}

/// Plans programmable-token transactions against a deployed protocol.
///
/// Every operation re-reads the live registry and wallet, plans, and returns
/// an unsigned transaction. Nothing is submitted until the caller signs and
/// submits the plan; a plan that lost a race fails at submission with
/// `StaleState` and must be recomputed from scratch.
pub struct ProgTokenSdk<L, W, V> {
    network: Network,
    ledger: L,
    wallet: W,
    validators: V,
    params: ProtocolBootstrapParams,
    config: SdkConfig,
}

impl<L, W, V> ProgTokenSdk<L, W, V>
where
    L: LedgerQuery,
    W: WalletQuery,
    V: ValidatorSource,
{
    pub fn new(
        network: Network,
        ledger: L,
        wallet: W,
        validators: V,
        params: ProtocolBootstrapParams,
        config: SdkConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            network,
            ledger,
            wallet,
            validators,
            params,
            config,
        })
    }

    /// Deploy the protocol and return an SDK bound to the new deployment.
    #[allow(clippy::too_many_arguments)]
    pub async fn deploy(
        network: Network,
        ledger: L,
        wallet: W,
        validators: V,
        config: SdkConfig,
        signer: &dyn Signer,
        submitter: &dyn Submitter,
        template_logic: ScriptHash,
    ) -> Result<Self> {
        config.validate()?;
        let params = bootstrap(
            &BootstrapContext {
                ledger: &ledger,
                wallet: &wallet,
                signer,
                submitter,
                validators: &validators,
                network,
                config: config.bootstrap.clone(),
            },
            template_logic,
        )
        .await?;
        log::info!("protocol deployed in {}", params.tx_hash);
        Self::new(network, ledger, wallet, validators, params, config)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn params(&self) -> &ProtocolBootstrapParams {
        &self.params
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    fn network_id(&self) -> u8 {
        self.network.network_id()
    }

    fn scripts(&self) -> ProtocolScripts<'_> {
        ProtocolScripts::new(&self.validators, self.network_id())
    }

    fn resolved(&self) -> ParamSource<'_> {
        ParamSource::Resolved(&self.params)
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// Insert a new policy into the registry and mint its first supply.
    pub async fn register(&self, req: RegisterRequest) -> Result<UnsignedTx> {
        let scripts = self.scripts();
        let minting_logic = req.minting_logic.script.hash;

        // A. Derive the policy, which is also the registry key
        let issuance_mint = scripts.issuance_mint(minting_logic, self.resolved())?;
        let key = issuance_mint.hash;

        // B. Locate the covering node in the live registry
        let nodes = self.live_registry().await?;
        let covering = find_insert_covering(&nodes, key.as_bytes())?;
        let plan = plan_insert(covering, key.as_bytes(), req.authorities)?;

        // C. Wallet and protocol references
        let funding = self.funding().await?;
        let holder = self.recipient_holder(req.recipient, &funding)?;
        self.require_reference(&self.params.protocol_params_ref(), None)
            .await?;
        self.require_reference(&self.params.issuance_template_ref(), None)
            .await?;

        log::info!(
            "planning registration of {key} ({} x {})",
            req.quantity,
            req.asset_name
        );
        build_registration_tx(&RegistrationParams {
            network_id: self.network_id(),
            plan,
            registry_spend: scripts.registry_spend(self.resolved())?,
            directory_mint: scripts.registry_mint(self.resolved(), None)?,
            issuance_mint,
            minting_logic,
            invocation: req.minting_logic,
            asset_name: req.asset_name,
            quantity: req.quantity,
            holder,
            protocol_params_ref: self.params.protocol_params_ref(),
            issuance_template_ref: self.params.issuance_template_ref(),
            collateral: funding.collateral,
            wallet_outputs: funding.wallet_outputs,
            change_address: funding.change_address,
            node_coin: self.config.registry_node_coin,
            token_coin: self.config.minted_output_coin,
        })
    }

    /// Mint more of a registered token. The registry is only read.
    pub async fn mint(&self, req: MintRequest) -> Result<UnsignedTx> {
        let minting_logic = req.minting_logic.script.hash;
        let issuance_mint = self.scripts().issuance_mint(minting_logic, self.resolved())?;

        let nodes = self.live_registry().await?;
        if find_by_key(&nodes, issuance_mint.hash.as_bytes()).is_none() {
            return Err(Error::UnregisteredPolicy(issuance_mint.hash.to_string()));
        }

        let funding = self.funding().await?;
        let holder = self.recipient_holder(req.recipient, &funding)?;
        self.require_reference(&self.params.protocol_params_ref(), None)
            .await?;
        self.require_reference(&self.params.issuance_template_ref(), None)
            .await?;

        log::info!(
            "planning mint of {} x {} under {}",
            req.quantity,
            req.asset_name,
            issuance_mint.hash
        );
        build_mint_tx(&MintParams {
            network_id: self.network_id(),
            issuance_mint,
            minting_logic,
            invocation: req.minting_logic,
            asset_name: req.asset_name,
            quantity: req.quantity,
            holder,
            protocol_params_ref: self.params.protocol_params_ref(),
            issuance_template_ref: self.params.issuance_template_ref(),
            collateral: funding.collateral,
            wallet_outputs: funding.wallet_outputs,
            change_address: funding.change_address,
            token_coin: self.config.minted_output_coin,
        })
    }

    /// Move `quantity` of `unit` from the operator's holder address.
    pub async fn transfer(&self, req: TransferRequest) -> Result<UnsignedTx> {
        if req.quantity == 0 {
            return Err(Error::InvalidAmount);
        }

        // A. Registry node of the token
        let nodes = self.live_registry().await?;
        let node = find_by_key(&nodes, req.unit.policy.as_bytes())
            .ok_or_else(|| Error::UnregisteredPolicy(req.unit.policy.to_string()))?
            .clone();
        let authority = node.record.authorities.transfer_authority.as_slice();
        if authority != req.transfer_logic.script.hash.as_bytes() {
            return Err(Error::Script(format!(
                "transfer logic {} is not the registered authority {}",
                req.transfer_logic.script.hash,
                hex::encode(authority)
            )));
        }

        // B. Holder addresses and signer
        let funding = self.funding().await?;
        let custody_base = self.params.custody_base_hash();
        let sender_holder = holder_address(custody_base, &funding.change_address)?;
        let recipient_holder = holder_address(custody_base, &req.recipient)?;
        let sender_key = stake_key(&funding.change_address)?;

        // C. Select holdings
        let holdings = self.ledger.fetch_outputs_at(&sender_holder).await?;
        log::debug!("{} outputs at {sender_holder}", holdings.len());
        let selection = select(
            &holdings,
            &req.unit,
            req.quantity,
            self.config.selection_order,
        )?;

        // D. Reference scripts and parameters
        let global_hash = self.params.programmable_logic_global_params.script_hash;
        self.require_reference(&self.params.protocol_params_ref(), None)
            .await?;
        self.require_reference(&self.params.custody_base_ref(), Some(custody_base))
            .await?;
        self.require_reference(&self.params.custody_global_ref(), Some(global_hash))
            .await?;

        log::info!(
            "planning transfer of {} {} to {recipient_holder} ({} inputs, change {})",
            req.quantity,
            req.unit,
            selection.selected.len(),
            selection.change
        );
        build_transfer_tx(&TransferParams {
            network_id: self.network_id(),
            unit: req.unit,
            quantity: req.quantity,
            selection,
            custody_base: ScriptSource::Reference {
                out_ref: self.params.custody_base_ref(),
                hash: custody_base,
            },
            custody_global: ScriptSource::Reference {
                out_ref: self.params.custody_global_ref(),
                hash: global_hash,
            },
            invocation: req.transfer_logic,
            registry_node: node,
            protocol_params_ref: self.params.protocol_params_ref(),
            sender_holder,
            recipient_holder,
            sender_key,
            collateral: funding.collateral,
            wallet_outputs: funding.wallet_outputs,
            change_address: funding.change_address,
            output_coin: self.config.transfer_output_coin,
        })
    }

    /// Unlink a policy's node from the registry and burn its directory token.
    pub async fn deregister(&self, req: DeregisterRequest) -> Result<UnsignedTx> {
        let scripts = self.scripts();
        let nodes = self.live_registry().await?;
        let (victim, predecessor) = find_remove_covering(&nodes, req.policy.as_bytes())?;
        let plan = plan_remove(predecessor, victim)?;

        let funding = self.funding().await?;
        self.require_reference(&self.params.protocol_params_ref(), None)
            .await?;

        log::info!("planning deregistration of {}", req.policy);
        build_deregistration_tx(&DeregistrationParams {
            network_id: self.network_id(),
            plan,
            registry_spend: scripts.registry_spend(self.resolved())?,
            directory_mint: scripts.registry_mint(self.resolved(), None)?,
            protocol_params_ref: self.params.protocol_params_ref(),
            collateral: funding.collateral,
            wallet_outputs: funding.wallet_outputs,
            change_address: funding.change_address,
        })
    }

    /// Register `script`'s stake credential so withdrawals against it work.
    pub async fn register_withdraw_credential(&self, script: &Script) -> Result<UnsignedTx> {
        let collateral = self.wallet.collateral().await?.map(|c| c.out_ref);
        let wallet_outputs = spendable_wallet_outputs(&self.wallet, collateral.as_ref()).await?;
        build_stake_registration_tx(&StakeRegistrationParams {
            network_id: self.network_id(),
            script: script.clone(),
            wallet_outputs,
            change_address: self.wallet.change_address().await?,
        })
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Custody address holding tokens for the owner of `wallet`.
    pub fn holder_address(&self, wallet: &Address) -> Result<Address> {
        holder_address(self.params.custody_base_hash(), wallet)
    }

    /// Every unit held at `wallet`'s holder address.
    pub async fn balances(&self, wallet: &Address) -> Result<BTreeMap<TokenUnit, u64>> {
        let holder = self.holder_address(wallet)?;
        let outputs = self.ledger.fetch_outputs_at(&holder).await?;
        balances(&outputs)
    }

    /// Live registry records in chain order, origin first.
    pub async fn registry_snapshot(&self) -> Result<Vec<RegistryRecord>> {
        let nodes = self.live_registry().await?;
        let records: Vec<RegistryRecord> = order_chain(&nodes)?
            .into_iter()
            .map(|n| n.record.clone())
            .collect();
        verify_chain(&records)?;
        Ok(records)
    }

    /// Fail with `StaleState` if anything `tx` spends or reads is gone.
    pub async fn ensure_fresh(&self, tx: &UnsignedTx) -> Result<()> {
        let touched = tx
            .spent_refs()
            .chain(tx.reference_inputs.iter().copied())
            .chain(tx.collateral);
        for out_ref in touched {
            if self.ledger.fetch_output(&out_ref).await?.is_none() {
                return Err(Error::StaleState(format!("{out_ref} was spent")));
            }
        }
        Ok(())
    }

    /// Check freshness, then sign and submit.
    pub async fn submit(
        &self,
        tx: &UnsignedTx,
        signer: &dyn Signer,
        submitter: &dyn Submitter,
    ) -> Result<TxHash> {
        self.ensure_fresh(tx).await?;
        sign_and_submit(signer, submitter, tx).await
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    async fn live_registry(&self) -> Result<Vec<RegistryNode>> {
        let address = self.scripts().registry_address(self.resolved())?;
        let outputs = self.ledger.fetch_outputs_at(&address).await?;
        Ok(decode_nodes(outputs, &self.params.directory_policy()))
    }

    async fn funding(&self) -> Result<Funding> {
        let collateral = self.wallet.collateral().await?.ok_or(Error::NoCollateral)?;
        let wallet_outputs =
            spendable_wallet_outputs(&self.wallet, Some(&collateral.out_ref)).await?;
        if wallet_outputs.is_empty() {
            return Err(Error::EmptyWallet);
        }
        Ok(Funding {
            collateral,
            wallet_outputs,
            change_address: self.wallet.change_address().await?,
        })
    }

    fn recipient_holder(&self, recipient: Option<Address>, funding: &Funding) -> Result<Address> {
        let wallet = recipient.unwrap_or(funding.change_address);
        self.holder_address(&wallet)
    }

    /// The output at `out_ref` must exist and, if `script` is given, carry
    /// that reference script.
    async fn require_reference(
        &self,
        out_ref: &OutputRef,
        script: Option<ScriptHash>,
    ) -> Result<()> {
        let output = self
            .ledger
            .fetch_output(out_ref)
            .await?
            .ok_or_else(|| Error::MissingReference(out_ref.to_string()))?;
        if let Some(hash) = script
            && output.script_ref != Some(hash)
        {
            return Err(Error::MissingReference(format!(
                "{out_ref} does not carry script {hash}"
            )));
        }
        Ok(())
    }
}

/// The key hash behind a wallet's stake credential.
fn stake_key(wallet: &Address) -> Result<KeyHash> {
    match wallet.stake_credential() {
        Some(Credential::Key(key)) => Ok(*key),
        Some(Credential::Script(_)) => Err(Error::Signer(format!(
            "stake credential of {wallet} is a script"
        ))),
        None => Err(Error::Signer(format!("{wallet} has no stake credential"))),
    }
}
