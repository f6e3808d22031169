//! Greedy selection of a holder's outputs for a transfer.

use std::collections::BTreeMap;

use crate::config::SelectionOrder;
use crate::error::{Error, Result};
use crate::utxo::LedgerOutput;
use crate::value::TokenUnit;

/// Outputs chosen to cover a transfer. Whole outputs only; the remainder
/// comes back as `change`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub selected: Vec<LedgerOutput>,
    /// Sum of `unit` over `selected`.
    pub total: u64,
    /// `total - requested`.
    pub change: u64,
}

/// Total quantity of `unit` across `outputs`.
pub fn aggregate(outputs: &[LedgerOutput], unit: &TokenUnit) -> Result<u64> {
    outputs.iter().try_fold(0u64, |acc, o| {
        acc.checked_add(o.value.quantity_of(unit))
            .ok_or(Error::AmountOverflow)
    })
}

/// Every unit held across `outputs`, with totals.
pub fn balances(outputs: &[LedgerOutput]) -> Result<BTreeMap<TokenUnit, u64>> {
    let mut totals = BTreeMap::new();
    for output in outputs {
        for (unit, q) in &output.value.assets {
            let slot = totals.entry(unit.clone()).or_insert(0u64);
            *slot = slot.checked_add(*q).ok_or(Error::AmountOverflow)?;
        }
    }
    Ok(totals)
}

/// Pick outputs holding `unit`, in `order`, until their sum reaches `requested`.
pub fn select(
    outputs: &[LedgerOutput],
    unit: &TokenUnit,
    requested: u64,
    order: SelectionOrder,
) -> Result<Selection> {
    if requested == 0 {
        return Err(Error::InvalidAmount);
    }

    let available = aggregate(outputs, unit)?;
    if available < requested {
        return Err(Error::InsufficientBalance {
            requested,
            available,
        });
    }

    let mut candidates: Vec<&LedgerOutput> = outputs
        .iter()
        .filter(|o| o.value.quantity_of(unit) > 0)
        .collect();
    if order == SelectionOrder::AscendingByReference {
        candidates.sort_by_key(|o| o.out_ref);
    }

    let mut selected = Vec::new();
    let mut total = 0u64;
    for output in candidates {
        if total >= requested {
            break;
        }
        // Cannot overflow: bounded by `available`.
        total += output.value.quantity_of(unit);
        selected.push(output.clone());
    }

    log::debug!(
        "selected {} outputs holding {total} of {unit} for {requested}",
        selected.len()
    );
    Ok(Selection {
        selected,
        total,
        change: total - requested,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::hash::{ScriptHash, TxHash};
    use crate::utxo::OutputRef;
    use crate::value::{AssetName, Value};

    fn unit() -> TokenUnit {
        TokenUnit::new(ScriptHash([0xaa; 28]), AssetName::from_text("TOK").unwrap())
    }

    fn holding(tx: u8, quantity: u64) -> LedgerOutput {
        LedgerOutput {
            out_ref: OutputRef::new(TxHash([tx; 32]), 0),
            address: Address::script(0, ScriptHash([0x01; 28])),
            value: Value::lovelace(1_300_000).with_asset(unit(), quantity).unwrap(),
            datum: None,
            script_ref: None,
        }
    }

    #[test]
    fn ten_twenty_seventy_for_twenty_five() {
        let outputs = vec![holding(1, 10), holding(2, 20), holding(3, 70)];
        let sel = select(&outputs, &unit(), 25, SelectionOrder::AscendingByReference).unwrap();
        assert_eq!(sel.selected, vec![outputs[0].clone(), outputs[1].clone()]);
        assert_eq!(sel.total, 30);
        assert_eq!(sel.change, 5);
    }

    #[test]
    fn exact_cover_has_no_change() {
        let outputs = vec![holding(1, 10), holding(2, 20)];
        let sel = select(&outputs, &unit(), 10, SelectionOrder::AsFetched).unwrap();
        assert_eq!(sel.selected.len(), 1);
        assert_eq!(sel.change, 0);
    }

    #[test]
    fn order_policy_is_respected() {
        let outputs = vec![holding(3, 70), holding(1, 10), holding(2, 20)];
        let fetched = select(&outputs, &unit(), 25, SelectionOrder::AsFetched).unwrap();
        assert_eq!(fetched.selected.len(), 1);
        assert_eq!(fetched.change, 45);

        let sorted = select(&outputs, &unit(), 25, SelectionOrder::AscendingByReference).unwrap();
        assert_eq!(sorted.selected.len(), 2);
        assert_eq!(sorted.change, 5);
    }

    #[test]
    fn skips_outputs_without_the_unit() {
        let mut bare = holding(1, 0);
        bare.value = Value::lovelace(5_000_000);
        let outputs = vec![bare, holding(2, 20)];
        let sel = select(&outputs, &unit(), 5, SelectionOrder::AsFetched).unwrap();
        assert_eq!(sel.selected, vec![outputs[1].clone()]);
    }

    #[test]
    fn insufficient_and_zero() {
        let outputs = vec![holding(1, 10)];
        assert!(matches!(
            select(&outputs, &unit(), 11, SelectionOrder::AsFetched),
            Err(Error::InsufficientBalance {
                requested: 11,
                available: 10
            })
        ));
        assert!(matches!(
            select(&outputs, &unit(), 0, SelectionOrder::AsFetched),
            Err(Error::InvalidAmount)
        ));
    }

    #[test]
    fn balances_sum_per_unit() {
        let outputs = vec![holding(1, 10), holding(2, 20)];
        let totals = balances(&outputs).unwrap();
        assert_eq!(totals.get(&unit()), Some(&30));
    }
}
