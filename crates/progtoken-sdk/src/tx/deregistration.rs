use crate::address::Address;
use crate::datum::{DirectoryMintRedeemer, RegistrySpendRedeemer, ToData};
use crate::error::{Error, Result};
use crate::hash::ScriptHash;
use crate::registry::planner::RemovePlan;
use crate::scripts::Script;
use crate::tx::{
    ScriptSource, TxOutput, UnsignedTx, add_mint, add_output, add_reference_input,
    add_script_input, new_tx, set_collateral, set_wallet_inputs,
};
use crate::utxo::{LedgerOutput, OutputRef};
use crate::value::AssetName;

/// Parameters for removing a policy from the registry.
pub struct DeregistrationParams {
    pub network_id: u8,
    pub plan: RemovePlan,
    pub registry_spend: Script,
    pub directory_mint: Script,
    pub protocol_params_ref: OutputRef,
    pub collateral: LedgerOutput,
    pub wallet_outputs: Vec<LedgerOutput>,
    pub change_address: Address,
}

/// Build the deregistration transaction.
///
/// ```text
/// Inputs:    [0] predecessor node (registry spend)
///            [1] victim node (registry spend)
/// Mints:     directory policy -1 <victim key>
/// Outputs:   [0] predecessor, next = victim.next (keeps its value)
/// Reference: protocol params
/// ```
///
/// The victim's coin flows to the change address.
pub fn build_deregistration_tx(params: &DeregistrationParams) -> Result<UnsignedTx> {
    let plan = &params.plan;
    let victim_key = ScriptHash::from_slice(&plan.victim.record.key).map_err(|_| {
        Error::InconsistentChain(format!(
            "victim key {} is not a policy id",
            hex::encode(&plan.victim.record.key)
        ))
    })?;
    let predecessor = &plan.predecessor.output;
    let mut tx = new_tx(params.network_id, params.change_address);

    // Input 0: predecessor
    add_script_input(
        &mut tx,
        predecessor,
        ScriptSource::Inline(params.registry_spend.clone()),
        &RegistrySpendRedeemer,
    );
    // Input 1: victim
    add_script_input(
        &mut tx,
        &plan.victim.output,
        ScriptSource::Inline(params.registry_spend.clone()),
        &RegistrySpendRedeemer,
    );

    add_mint(
        &mut tx,
        ScriptSource::Inline(params.directory_mint.clone()),
        AssetName::new(victim_key.as_bytes().to_vec())?,
        -1,
        &DirectoryMintRedeemer::Remove { key: victim_key },
    );

    // Output 0: merged predecessor
    add_output(
        &mut tx,
        TxOutput {
            address: predecessor.address,
            value: predecessor.value.clone(),
            datum: Some(plan.merged.to_data()),
            script_ref: None,
        },
    );

    add_reference_input(&mut tx, params.protocol_params_ref);

    set_collateral(&mut tx, &params.collateral)?;
    set_wallet_inputs(&mut tx, &params.wallet_outputs);

    Ok(tx)
}
