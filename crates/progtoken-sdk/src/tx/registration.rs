use crate::address::Address;
use crate::datum::{
    DirectoryMintRedeemer, HolderMarker, IssuanceRedeemer, RegistrySpendRedeemer, ToData,
};
use crate::error::{Error, Result};
use crate::hash::ScriptHash;
use crate::registry::planner::InsertPlan;
use crate::scripts::Script;
use crate::tx::{
    Invocation, ScriptSource, TxOutput, UnsignedTx, add_invocation, add_mint, add_output,
    add_reference_input, add_script_input, checked_i64, new_tx, set_collateral,
    set_wallet_inputs, token_output,
};
use crate::utxo::{LedgerOutput, OutputRef};
use crate::value::{AssetName, TokenUnit, Value};

/// Parameters for registering a new programmable token.
pub struct RegistrationParams {
    pub network_id: u8,
    /// Split of the covering node around the new policy id.
    pub plan: InsertPlan,
    pub registry_spend: Script,
    pub directory_mint: Script,
    /// Issuance policy; its hash is the key being inserted.
    pub issuance_mint: Script,
    /// Minting logic the issuance policy is parameterized with.
    pub minting_logic: ScriptHash,
    /// Zero-value withdrawal the issuance policy requires.
    pub invocation: Invocation,
    pub asset_name: AssetName,
    pub quantity: u64,
    /// Custody address receiving the minted tokens.
    pub holder: Address,
    pub protocol_params_ref: OutputRef,
    pub issuance_template_ref: OutputRef,
    pub collateral: LedgerOutput,
    pub wallet_outputs: Vec<LedgerOutput>,
    pub change_address: Address,
    pub node_coin: u64,
    pub token_coin: u64,
}

/// Build the registration transaction.
///
/// ```text
/// Inputs:      [0] covering registry node (registry spend)
/// Mints:       issuance policy  +Q asset_name
///              directory policy +1 <new key>
/// Withdrawals: minting-logic invocation (zero value)
/// Outputs:     [0] Q tokens to holder (marker datum)
///              [1] covering node, next = new key (keeps its directory token)
///              [2] new node (fresh directory token)
/// Reference:   protocol params, issuance template
/// ```
pub fn build_registration_tx(params: &RegistrationParams) -> Result<UnsignedTx> {
    if params.quantity == 0 {
        return Err(Error::InvalidAmount);
    }
    let key = params.issuance_mint.hash;
    if params.plan.inserted.key != key.as_bytes() {
        return Err(Error::InconsistentChain(format!(
            "plan inserts {}, issuance policy is {key}",
            hex::encode(&params.plan.inserted.key)
        )));
    }

    let covering = &params.plan.covering.output;
    let registry_address = covering.address;
    let mut tx = new_tx(params.network_id, params.change_address);

    // Input 0: covering node
    add_script_input(
        &mut tx,
        covering,
        ScriptSource::Inline(params.registry_spend.clone()),
        &RegistrySpendRedeemer,
    );

    add_invocation(&mut tx, &params.invocation);

    add_mint(
        &mut tx,
        ScriptSource::Inline(params.issuance_mint.clone()),
        params.asset_name.clone(),
        checked_i64(params.quantity)?,
        &IssuanceRedeemer {
            minting_logic: params.minting_logic,
        },
    );
    let node_name = AssetName::new(key.as_bytes().to_vec())?;
    add_mint(
        &mut tx,
        ScriptSource::Inline(params.directory_mint.clone()),
        node_name.clone(),
        1,
        &DirectoryMintRedeemer::Insert {
            key,
            hashed_param: params.minting_logic,
        },
    );

    // Output 0: minted tokens
    add_output(
        &mut tx,
        token_output(
            params.holder,
            params.token_coin,
            TokenUnit::new(key, params.asset_name.clone()),
            params.quantity,
            &HolderMarker,
        )?,
    );

    // Output 1: covering node, same value
    add_output(
        &mut tx,
        TxOutput {
            address: registry_address,
            value: covering.value.clone(),
            datum: Some(params.plan.updated.to_data()),
            script_ref: None,
        },
    );

    // Output 2: new node
    add_output(
        &mut tx,
        TxOutput {
            address: registry_address,
            value: Value::lovelace(params.node_coin)
                .with_asset(TokenUnit::new(params.directory_mint.hash, node_name), 1)?,
            datum: Some(params.plan.inserted.to_data()),
            script_ref: None,
        },
    );

    add_reference_input(&mut tx, params.protocol_params_ref);
    add_reference_input(&mut tx, params.issuance_template_ref);

    set_collateral(&mut tx, &params.collateral)?;
    set_wallet_inputs(&mut tx, &params.wallet_outputs);

    Ok(tx)
}
