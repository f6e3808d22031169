use crate::address::Address;
use crate::config::BootstrapConfig;
use crate::datum::{
    DirectoryMintRedeemer, IssuanceTemplateDatum, ProtocolParamsDatum, RegistryRecord,
    SingletonMintRedeemer, ToData,
};
use crate::error::{Error, Result};
use crate::scripts::Script;
use crate::tx::{
    ScriptSource, TxOutput, UnsignedTx, add_mint, add_output, add_pubkey_input, new_tx,
    set_collateral, set_wallet_inputs, token_output,
};
use crate::utxo::LedgerOutput;
use crate::value::{AssetName, TokenUnit, Value};

/// Asset name of the protocol-params singleton.
pub const PROTOCOL_PARAMS_TOKEN: &str = "ProtocolParams";
/// Asset name of the issuance-template singleton.
pub const ISSUANCE_TEMPLATE_TOKEN: &str = "IssuanceCborHex";

/// Parameters for the one-shot protocol deployment.
pub struct BootstrapTxParams {
    pub network_id: u8,
    /// Seed of the protocol-params and directory policies.
    pub params_seed: LedgerOutput,
    /// Seed of the issuance-template policy.
    pub template_seed: LedgerOutput,
    pub protocol_params_mint: Script,
    pub issuance_cbor_hex_mint: Script,
    pub directory_mint: Script,
    pub registry_address: Address,
    pub custody_base: Script,
    pub custody_global: Script,
    pub issuance_template: IssuanceTemplateDatum,
    /// Where the two reference scripts are parked.
    pub reference_address: Address,
    pub coins: BootstrapConfig,
    pub collateral: LedgerOutput,
    pub wallet_outputs: Vec<LedgerOutput>,
    pub change_address: Address,
}

/// Build the bootstrap transaction.
///
/// ```text
/// Inputs:  [0] params seed
///          [1] template seed
/// Mints:   directory policy      +1 ""                (Init)
///          protocol-params policy +1 "ProtocolParams"
///          template policy        +1 "IssuanceCborHex"
/// Outputs: [0] protocol params singleton + datum
///          [1] origin registry node
///          [2] issuance template singleton + datum
///          [3] custody base reference script
///          [4] custody global reference script
/// ```
pub fn build_bootstrap_tx(params: &BootstrapTxParams) -> Result<UnsignedTx> {
    if params.params_seed.out_ref == params.template_seed.out_ref {
        // Each one-shot policy needs its own seed.
        return Err(Error::ReferenceSpent(params.template_seed.out_ref.to_string()));
    }
    let coins = &params.coins;
    let pp_name = AssetName::from_text(PROTOCOL_PARAMS_TOKEN)?;
    let template_name = AssetName::from_text(ISSUANCE_TEMPLATE_TOKEN)?;

    let mut tx = new_tx(params.network_id, params.change_address);

    // Inputs 0, 1: one-shot seeds
    add_pubkey_input(&mut tx, &params.params_seed);
    add_pubkey_input(&mut tx, &params.template_seed);

    add_mint(
        &mut tx,
        ScriptSource::Inline(params.directory_mint.clone()),
        AssetName::empty(),
        1,
        &DirectoryMintRedeemer::Init,
    );
    add_mint(
        &mut tx,
        ScriptSource::Inline(params.protocol_params_mint.clone()),
        pp_name.clone(),
        1,
        &SingletonMintRedeemer::ProtocolParams,
    );
    add_mint(
        &mut tx,
        ScriptSource::Inline(params.issuance_cbor_hex_mint.clone()),
        template_name.clone(),
        1,
        &SingletonMintRedeemer::IssuanceTemplate,
    );

    // Output 0: protocol params
    add_output(
        &mut tx,
        token_output(
            Address::script(params.network_id, params.protocol_params_mint.hash),
            coins.protocol_params_coin,
            TokenUnit::new(params.protocol_params_mint.hash, pp_name),
            1,
            &ProtocolParamsDatum {
                directory_mint: params.directory_mint.hash,
                custody_base: params.custody_base.hash,
            },
        )?,
    );

    // Output 1: origin node
    add_output(
        &mut tx,
        token_output(
            params.registry_address,
            coins.directory_origin_coin,
            TokenUnit::new(params.directory_mint.hash, AssetName::empty()),
            1,
            &RegistryRecord::origin(),
        )?,
    );

    // Output 2: issuance template
    add_output(
        &mut tx,
        token_output(
            Address::script(params.network_id, params.issuance_cbor_hex_mint.hash),
            coins.issuance_template_coin,
            TokenUnit::new(params.issuance_cbor_hex_mint.hash, template_name),
            1,
            &params.issuance_template,
        )?,
    );

    // Outputs 3, 4: reference scripts
    for (script, coin) in [
        (&params.custody_base, coins.custody_base_ref_coin),
        (&params.custody_global, coins.custody_global_ref_coin),
    ] {
        add_output(
            &mut tx,
            TxOutput {
                address: params.reference_address,
                value: Value::lovelace(coin),
                datum: None,
                script_ref: Some(script.clone()),
            },
        );
    }

    set_collateral(&mut tx, &params.collateral)?;
    set_wallet_inputs(&mut tx, &params.wallet_outputs);

    Ok(tx)
}
