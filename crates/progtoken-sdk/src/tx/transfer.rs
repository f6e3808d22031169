use crate::address::Address;
use crate::datum::{CustodySpendRedeemer, GlobalStateRedeemer, HolderMarker, ToData};
use crate::error::{Error, Result};
use crate::hash::KeyHash;
use crate::registry::RegistryNode;
use crate::selector::Selection;
use crate::tx::{
    Invocation, ScriptSource, TxOutput, UnsignedTx, add_invocation, add_output,
    add_reference_input, add_script_input, add_withdrawal, new_tx, set_collateral,
    set_wallet_inputs, token_output,
};
use crate::utxo::{LedgerOutput, OutputRef};
use crate::value::{TokenUnit, Value};

/// Parameters for moving programmable tokens between holders.
pub struct TransferParams {
    pub network_id: u8,
    pub unit: TokenUnit,
    pub quantity: u64,
    /// Sender's holder outputs covering `quantity`.
    pub selection: Selection,
    pub custody_base: ScriptSource,
    pub custody_global: ScriptSource,
    /// Transfer-authority withdrawal registered for the token.
    pub invocation: Invocation,
    /// Registry node of `unit.policy`, attached read-only.
    pub registry_node: RegistryNode,
    pub protocol_params_ref: OutputRef,
    pub sender_holder: Address,
    pub recipient_holder: Address,
    /// Sender's stake key; the custody script requires its signature.
    pub sender_key: KeyHash,
    pub collateral: LedgerOutput,
    pub wallet_outputs: Vec<LedgerOutput>,
    pub change_address: Address,
    pub output_coin: u64,
}

/// Build the transfer transaction.
///
/// ```text
/// Inputs:      [0..n] selected holder outputs (custody base spend)
/// Withdrawals: transfer authority (zero value)
///              custody global, proof -> registry node reference index
/// Outputs:     [0] Q to recipient holder (marker datum)
///              [1] change + other assets back to sender holder (optional)
/// Reference:   protocol params, registry node, custody script refs
/// Signers:     sender stake key
/// ```
pub fn build_transfer_tx(params: &TransferParams) -> Result<UnsignedTx> {
    if params.quantity == 0 {
        return Err(Error::InvalidAmount);
    }
    if params.selection.selected.is_empty() || params.selection.total < params.quantity {
        return Err(Error::InsufficientBalance {
            requested: params.quantity,
            available: params.selection.total,
        });
    }
    if params.registry_node.record.key != params.unit.policy.as_bytes() {
        return Err(Error::UnregisteredPolicy(params.unit.policy.to_string()));
    }

    let mut tx = new_tx(params.network_id, params.change_address);

    // Inputs 0..n: holder outputs
    let mut returned = Value::default();
    for output in &params.selection.selected {
        add_script_input(
            &mut tx,
            output,
            params.custody_base.clone(),
            &CustodySpendRedeemer,
        );
        for (unit, q) in &output.value.assets {
            if unit != &params.unit {
                returned.add_asset(unit.clone(), *q)?;
            }
        }
    }
    let change = params.selection.total - params.quantity;
    returned.add_asset(params.unit.clone(), change)?;

    add_reference_input(&mut tx, params.protocol_params_ref);
    add_reference_input(&mut tx, params.registry_node.out_ref());

    add_invocation(&mut tx, &params.invocation);

    add_withdrawal(
        &mut tx,
        params.custody_global.clone(),
        GlobalStateRedeemer::default().to_data(),
    );
    // Reference inputs are complete now; the proof is a sorted position.
    let node_ref = params.registry_node.out_ref();
    let proof = tx
        .reference_index(&node_ref)
        .ok_or_else(|| Error::MissingReference(node_ref.to_string()))?;
    if let Some(global) = tx.withdrawals.last_mut() {
        global.redeemer = GlobalStateRedeemer {
            proofs: vec![proof],
        }
        .to_data();
    }

    tx.required_signers.insert(params.sender_key);

    // Output 0: recipient
    add_output(
        &mut tx,
        token_output(
            params.recipient_holder,
            params.output_coin,
            params.unit.clone(),
            params.quantity,
            &HolderMarker,
        )?,
    );

    // Output 1: change
    if returned.has_assets() {
        returned.coin = params.output_coin;
        add_output(
            &mut tx,
            TxOutput {
                address: params.sender_holder,
                value: returned,
                datum: Some(HolderMarker.to_data()),
                script_ref: None,
            },
        );
    }

    set_collateral(&mut tx, &params.collateral)?;
    set_wallet_inputs(&mut tx, &params.wallet_outputs);

    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionOrder;
    use crate::hash::{ScriptHash, TxHash};
    use crate::plutus_data::PlutusData;
    use crate::registry::test_support::node;
    use crate::selector::select;
    use crate::tx::test_support::{coin_utxo, script, wallet_address};
    use crate::value::AssetName;

    const POLICY: ScriptHash = ScriptHash([0x0a; 28]);

    fn unit() -> TokenUnit {
        TokenUnit::new(POLICY, AssetName::from_text("TOK").unwrap())
    }

    fn holding(tx: u8, q: u64, extra: Option<(TokenUnit, u64)>) -> LedgerOutput {
        let mut value = Value::lovelace(1_300_000).with_asset(unit(), q).unwrap();
        if let Some((u, n)) = extra {
            value.add_asset(u, n).unwrap();
        }
        LedgerOutput {
            out_ref: OutputRef::new(TxHash([tx; 32]), 0),
            address: wallet_address(0x50),
            value,
            datum: Some(PlutusData::unit()),
            script_ref: None,
        }
    }

    fn params(outputs: &[LedgerOutput], quantity: u64) -> TransferParams {
        let wallet = wallet_address(1);
        let deploy = TxHash([0xdd; 32]);
        TransferParams {
            network_id: 0,
            unit: unit(),
            quantity,
            selection: select(outputs, &unit(), quantity, SelectionOrder::AscendingByReference)
                .unwrap(),
            custody_base: ScriptSource::Reference {
                out_ref: OutputRef::new(deploy, 3),
                hash: ScriptHash([0xba; 28]),
            },
            custody_global: ScriptSource::Reference {
                out_ref: OutputRef::new(deploy, 4),
                hash: ScriptHash([0x91; 28]),
            },
            invocation: Invocation::new(script(0x77), PlutusData::unit()),
            registry_node: node(0x20, POLICY.as_bytes(), &[0xff; 30]),
            protocol_params_ref: OutputRef::new(deploy, 0),
            sender_holder: wallet_address(0x50),
            recipient_holder: wallet_address(0x60),
            sender_key: KeyHash([2; 28]),
            collateral: coin_utxo(0xc0, 0, wallet, 5_000_000),
            wallet_outputs: vec![coin_utxo(0xc1, 0, wallet, 20_000_000)],
            change_address: wallet,
            output_coin: 1_300_000,
        }
    }

    #[test]
    fn transfer_with_change() {
        let outputs = vec![holding(1, 10, None), holding(2, 20, None), holding(3, 70, None)];
        let p = params(&outputs, 25);
        let tx = build_transfer_tx(&p).unwrap();

        assert_eq!(tx.inputs.len(), 2);
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.outputs[0].address, p.recipient_holder);
        assert_eq!(tx.outputs[0].value.quantity_of(&unit()), 25);
        assert_eq!(tx.outputs[1].address, p.sender_holder);
        assert_eq!(tx.outputs[1].value.quantity_of(&unit()), 5);
        assert!(tx.required_signers.contains(&p.sender_key));
        assert_eq!(tx.withdrawals.len(), 2);
        // protocol params, two script refs, registry node
        assert_eq!(tx.reference_inputs.len(), 4);
    }

    #[test]
    fn global_proof_points_at_registry_node() {
        let outputs = vec![holding(1, 10, None)];
        let p = params(&outputs, 10);
        let tx = build_transfer_tx(&p).unwrap();
        let index = tx.reference_index(&p.registry_node.out_ref()).unwrap();
        let global = tx
            .withdrawals
            .iter()
            .find(|w| w.script.hash() == ScriptHash([0x91; 28]))
            .unwrap();
        assert_eq!(global.redeemer, GlobalStateRedeemer { proofs: vec![index] }.to_data());
    }

    #[test]
    fn exact_amount_has_no_change_output() {
        let outputs = vec![holding(1, 10, None), holding(2, 20, None)];
        let tx = build_transfer_tx(&params(&outputs, 30)).unwrap();
        assert_eq!(tx.outputs.len(), 1);
    }

    #[test]
    fn foreign_assets_return_to_sender() {
        let other = TokenUnit::new(ScriptHash([0x0b; 28]), AssetName::empty());
        let outputs = vec![holding(1, 10, Some((other.clone(), 3)))];
        let tx = build_transfer_tx(&params(&outputs, 10)).unwrap();
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.outputs[1].value.quantity_of(&other), 3);
        assert_eq!(tx.outputs[1].value.quantity_of(&unit()), 0);
    }

    #[test]
    fn wrong_registry_node_rejected() {
        let outputs = vec![holding(1, 10, None)];
        let mut p = params(&outputs, 10);
        p.registry_node = node(0x21, &[0x0c; 28], &[0xff; 30]);
        assert!(matches!(
            build_transfer_tx(&p),
            Err(Error::UnregisteredPolicy(_))
        ));
    }
}
