use async_trait::async_trait;
use progtoken_sdk::testing::{HashingValidators, MemoryLedger, MemoryWallet, key_address};
use progtoken_sdk::{
    Address, BootstrapConfig, BootstrapContext, Error, LedgerOutput, LedgerQuery, Network,
    ProtocolBootstrapParams, WalletQuery, bootstrap,
};

fn template_logic() -> progtoken_sdk::ScriptHash {
    HashingValidators::script("template-logic").hash
}

async fn run(
    ledger: &MemoryLedger,
    wallet: &dyn WalletQuery,
    signer: &MemoryWallet,
) -> progtoken_sdk::Result<ProtocolBootstrapParams> {
    bootstrap(
        &BootstrapContext {
            ledger,
            wallet,
            signer,
            submitter: ledger,
            validators: &HashingValidators,
            network: Network::Preview,
            config: BootstrapConfig::default(),
        },
        template_logic(),
    )
    .await
}

/// Wallet view frozen at construction time, as a lagging indexer would
/// report it.
struct SnapshotWallet {
    outputs: Vec<LedgerOutput>,
    collateral: LedgerOutput,
    address: Address,
}

#[async_trait]
impl WalletQuery for SnapshotWallet {
    async fn wallet_outputs(&self) -> progtoken_sdk::Result<Vec<LedgerOutput>> {
        Ok(self.outputs.clone())
    }

    async fn collateral(&self) -> progtoken_sdk::Result<Option<LedgerOutput>> {
        Ok(Some(self.collateral.clone()))
    }

    async fn change_address(&self) -> progtoken_sdk::Result<Address> {
        Ok(self.address)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bootstrap_publishes_protocol_outputs() {
    let ledger = MemoryLedger::new();
    let wallet = MemoryWallet::funded(
        ledger.clone(),
        key_address(0, 1),
        &[20_000_000, 20_000_000, 20_000_000],
    );

    let params = run(&ledger, &wallet, &wallet).await.unwrap();
    assert_eq!(ledger.submitted(), vec![params.tx_hash]);

    let outputs = ledger
        .fetch_outputs_by_ref(&params.tx_hash, None)
        .await
        .unwrap();
    assert_eq!(outputs.len(), 5);

    let base = ledger
        .fetch_output(&params.custody_base_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(base.script_ref, Some(params.custody_base_hash()));
    assert_eq!(base.address, wallet.address());

    let global = ledger
        .fetch_output(&params.custody_global_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        global.script_ref,
        Some(params.programmable_logic_global_params.script_hash)
    );

    // Seeds are consumed, so the singletons cannot be minted again.
    let seed = params.protocol_params.tx_input;
    assert!(
        ledger
            .fetch_outputs_by_ref(&seed.tx_hash, Some(seed.output_index))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn bootstrap_splits_a_thin_wallet_first() {
    let ledger = MemoryLedger::new();
    let wallet = MemoryWallet::funded(ledger.clone(), key_address(0, 1), &[100_000_000]);

    let params = run(&ledger, &wallet, &wallet).await.unwrap();

    let submitted = ledger.submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[1], params.tx_hash);
    // Both seeds come out of the split.
    assert_eq!(params.protocol_params.tx_input.tx_hash, submitted[0]);
    assert_eq!(params.issuance_params.tx_input.tx_hash, submitted[0]);
}

#[tokio::test(start_paused = true)]
async fn split_that_never_lands_times_out() {
    let ledger = MemoryLedger::new();
    let wallet = MemoryWallet::funded(ledger.clone(), key_address(0, 1), &[100_000_000]);
    ledger.withhold_outputs(true);

    let err = run(&ledger, &wallet, &wallet).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { seconds: 120, .. }));
    assert!(err.is_retriable());
    assert_eq!(ledger.submitted().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn deployment_waits_for_reference_scripts() {
    let ledger = MemoryLedger::new();
    let wallet = MemoryWallet::funded(
        ledger.clone(),
        key_address(0, 1),
        &[20_000_000, 20_000_000, 20_000_000],
    );
    ledger.withhold_outputs(true);

    // Accepted but never visible: the custody scripts are not deployed yet.
    let err = run(&ledger, &wallet, &wallet).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { seconds: 120, .. }));
    assert_eq!(ledger.submitted().len(), 1);
}

#[tokio::test]
async fn spent_seed_is_rejected() {
    let ledger = MemoryLedger::new();
    let wallet = MemoryWallet::funded(
        ledger.clone(),
        key_address(0, 1),
        &[20_000_000, 20_000_000, 20_000_000, 20_000_000],
    );
    let collateral = wallet.collateral().await.unwrap().unwrap();
    let mut outputs: Vec<LedgerOutput> = wallet
        .wallet_outputs()
        .await
        .unwrap()
        .into_iter()
        .filter(|o| o.out_ref != collateral.out_ref)
        .collect();
    outputs.sort_by_key(|o| o.out_ref);
    ledger.spend(&outputs[0].out_ref).unwrap();

    let stale = SnapshotWallet {
        outputs,
        collateral,
        address: wallet.address(),
    };
    let err = run(&ledger, &stale, &wallet).await.unwrap_err();
    assert!(matches!(err, Error::ReferenceSpent(_)));
    assert!(ledger.submitted().is_empty());
}

#[tokio::test]
async fn bootstrap_requires_collateral() {
    let ledger = MemoryLedger::new();
    let wallet = MemoryWallet::new(ledger.clone(), key_address(0, 1));
    for _ in 0..3 {
        ledger.fund(wallet.address(), progtoken_sdk::Value::lovelace(20_000_000));
    }

    let err = run(&ledger, &wallet, &wallet).await.unwrap_err();
    assert!(matches!(err, Error::NoCollateral));
}
