use crate::address::Address;
use crate::datum::{HolderMarker, IssuanceRedeemer};
use crate::error::{Error, Result};
use crate::hash::ScriptHash;
use crate::scripts::Script;
use crate::tx::{
    Invocation, ScriptSource, UnsignedTx, add_invocation, add_mint, add_output,
    add_reference_input, checked_i64, new_tx, set_collateral, set_wallet_inputs, token_output,
};
use crate::utxo::{LedgerOutput, OutputRef};
use crate::value::{AssetName, TokenUnit};

/// Parameters for minting an already-registered token.
pub struct MintParams {
    pub network_id: u8,
    pub issuance_mint: Script,
    pub minting_logic: ScriptHash,
    pub invocation: Invocation,
    pub asset_name: AssetName,
    pub quantity: u64,
    pub holder: Address,
    pub protocol_params_ref: OutputRef,
    pub issuance_template_ref: OutputRef,
    pub collateral: LedgerOutput,
    pub wallet_outputs: Vec<LedgerOutput>,
    pub change_address: Address,
    pub token_coin: u64,
}

/// Build the mint transaction. No registry node is touched.
///
/// ```text
/// Mints:       issuance policy +Q asset_name
/// Withdrawals: authority invocation (zero value)
/// Outputs:     [0] Q tokens to holder (marker datum)
/// Reference:   protocol params, issuance template
/// ```
pub fn build_mint_tx(params: &MintParams) -> Result<UnsignedTx> {
    if params.quantity == 0 {
        return Err(Error::InvalidAmount);
    }
    let policy = params.issuance_mint.hash;
    let mut tx = new_tx(params.network_id, params.change_address);

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

    // Output 0: minted tokens
    add_output(
        &mut tx,
        token_output(
            params.holder,
            params.token_coin,
            TokenUnit::new(policy, params.asset_name.clone()),
            params.quantity,
            &HolderMarker,
        )?,
    );

    add_reference_input(&mut tx, params.protocol_params_ref);
    add_reference_input(&mut tx, params.issuance_template_ref);

    set_collateral(&mut tx, &params.collateral)?;
    set_wallet_inputs(&mut tx, &params.wallet_outputs);

    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::ToData;
    use crate::hash::TxHash;
    use crate::plutus_data::PlutusData;
    use crate::tx::test_support::{coin_utxo, script, wallet_address};

    fn params(quantity: u64) -> MintParams {
        let wallet = wallet_address(1);
        MintParams {
            network_id: 0,
            issuance_mint: script(0x0a),
            minting_logic: ScriptHash([0x33; 28]),
            invocation: Invocation::new(script(0x55), PlutusData::constr(0, vec![])),
            asset_name: AssetName::from_text("TOK").unwrap(),
            quantity,
            holder: wallet_address(9),
            protocol_params_ref: OutputRef::new(TxHash([0xaa; 32]), 0),
            issuance_template_ref: OutputRef::new(TxHash([0xaa; 32]), 2),
            collateral: coin_utxo(0xc0, 0, wallet, 5_000_000),
            wallet_outputs: vec![coin_utxo(0xc1, 0, wallet, 50_000_000)],
            change_address: wallet,
            token_coin: 1_500_000,
        }
    }

    #[test]
    fn mints_to_holder_without_inputs() {
        let p = params(42);
        let tx = build_mint_tx(&p).unwrap();
        assert!(tx.inputs.is_empty());
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].address, p.holder);
        let unit = TokenUnit::new(p.issuance_mint.hash, p.asset_name.clone());
        assert_eq!(tx.outputs[0].value.quantity_of(&unit), 42);
        assert_eq!(tx.outputs[0].datum, Some(HolderMarker.to_data()));
        assert_eq!(tx.minted(&unit), 42);
        assert_eq!(
            tx.mints[0].redeemer,
            IssuanceRedeemer {
                minting_logic: p.minting_logic
            }
            .to_data()
        );
        assert_eq!(
            tx.withdrawals[0].reward_address,
            Address::script_reward(0, ScriptHash([0x55; 28]))
        );
    }

    #[test]
    fn zero_quantity_rejected() {
        assert!(matches!(build_mint_tx(&params(0)), Err(Error::InvalidAmount)));
    }

    #[test]
    fn quantity_beyond_i64_overflows() {
        assert!(matches!(
            build_mint_tx(&params(u64::MAX)),
            Err(Error::AmountOverflow)
        ));
    }
}
