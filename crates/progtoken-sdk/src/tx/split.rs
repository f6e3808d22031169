use crate::address::Address;
use crate::error::{Error, Result};
use crate::tx::{UnsignedTx, add_output, add_pubkey_input, coin_output, new_tx, set_wallet_inputs};
use crate::utxo::{LedgerOutput, OutputRef};

/// Parameters for fanning wallet funds out into several outputs.
pub struct SplitParams {
    pub network_id: u8,
    /// Spendable wallet outputs; the largest one funds the split.
    pub wallet_outputs: Vec<LedgerOutput>,
    /// Excluded from funding.
    pub collateral: Option<OutputRef>,
    pub destination: Address,
    pub count: usize,
    pub output_coin: u64,
    pub change_address: Address,
}

/// Build a wallet split transaction.
///
/// ```text
/// Inputs:  [0] largest wallet output
/// Outputs: [0..count] output_coin each to destination
/// ```
pub fn build_split_tx(params: &SplitParams) -> Result<UnsignedTx> {
    if params.count == 0 || params.output_coin == 0 {
        return Err(Error::InvalidAmount);
    }
    let spendable: Vec<LedgerOutput> = params
        .wallet_outputs
        .iter()
        .filter(|o| Some(o.out_ref) != params.collateral)
        .cloned()
        .collect();
    let funding = spendable
        .iter()
        .max_by_key(|o| (o.value.coin, std::cmp::Reverse(o.out_ref)))
        .ok_or(Error::EmptyWallet)?;

    let mut tx = new_tx(params.network_id, params.change_address);
    add_pubkey_input(&mut tx, funding);
    for _ in 0..params.count {
        add_output(&mut tx, coin_output(params.destination, params.output_coin));
    }
    set_wallet_inputs(&mut tx, &spendable);

    Ok(tx)
}
