use crate::address::{Address, Credential};
use crate::error::{Error, Result};
use crate::scripts::Script;
use crate::tx::{Certificate, UnsignedTx, new_tx, set_wallet_inputs};
use crate::utxo::LedgerOutput;

/// Parameters for registering a withdraw script's stake credential.
pub struct StakeRegistrationParams {
    pub network_id: u8,
    pub script: Script,
    pub wallet_outputs: Vec<LedgerOutput>,
    pub change_address: Address,
}

/// Build a stake-registration transaction so zero-value withdrawals against
/// `script` are accepted.
///
/// ```text
/// Certificates: [0] stake registration, script credential
/// ```
///
/// The deposit and fee are drawn from `wallet_outputs`.
pub fn build_stake_registration_tx(params: &StakeRegistrationParams) -> Result<UnsignedTx> {
    if params.wallet_outputs.is_empty() {
        return Err(Error::EmptyWallet);
    }
    let mut tx = new_tx(params.network_id, params.change_address);
    tx.certificates.push(Certificate::StakeRegistration {
        credential: Credential::Script(params.script.hash),
    });
    set_wallet_inputs(&mut tx, &params.wallet_outputs);
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::test_support::{coin_utxo, script, wallet_address};

    #[test]
    fn registers_script_credential() {
        let wallet = wallet_address(1);
        let tx = build_stake_registration_tx(&StakeRegistrationParams {
            network_id: 0,
            script: script(0x33),
            wallet_outputs: vec![coin_utxo(1, 0, wallet, 10_000_000)],
            change_address: wallet,
        })
        .unwrap();
        assert_eq!(
            tx.certificates,
            vec![Certificate::StakeRegistration {
                credential: Credential::Script(script(0x33).hash)
            }]
        );
        assert!(tx.inputs.is_empty());
        assert_eq!(tx.wallet_inputs.len(), 1);
    }

    #[test]
    fn needs_funds() {
        let wallet = wallet_address(1);
        assert!(matches!(
            build_stake_registration_tx(&StakeRegistrationParams {
                network_id: 0,
                script: script(0x33),
                wallet_outputs: Vec::new(),
                change_address: wallet,
            }),
            Err(Error::EmptyWallet)
        ));
    }
}
