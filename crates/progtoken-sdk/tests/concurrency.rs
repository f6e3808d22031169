use progtoken_sdk::testing::{HashingValidators, MemoryLedger, MemoryWallet, key_address};
use progtoken_sdk::{
    AssetName, Authorities, Error, ErrorKind, Invocation, Network, PlutusData, ProgTokenSdk,
    RegisterRequest, SdkConfig, verify_chain,
};

type Sdk = ProgTokenSdk<MemoryLedger, MemoryWallet, HashingValidators>;

async fn deploy() -> (Sdk, MemoryLedger, MemoryWallet) {
    let ledger = MemoryLedger::new();
    let wallet = MemoryWallet::funded(
        ledger.clone(),
        key_address(0, 1),
        &[40_000_000, 40_000_000, 40_000_000],
    );
    let signer = wallet.clone();
    let sdk = Sdk::deploy(
        Network::Preview,
        ledger.clone(),
        wallet,
        HashingValidators,
        SdkConfig::default(),
        &signer,
        &ledger,
        HashingValidators::script("transfer-logic").hash,
    )
    .await
    .unwrap();
    (sdk, ledger, signer)
}

fn request(label: &str) -> RegisterRequest {
    RegisterRequest {
        asset_name: AssetName::from_text("TOK").unwrap(),
        quantity: 1,
        minting_logic: Invocation::new(HashingValidators::script(label), PlutusData::unit()),
        authorities: Authorities::new(HashingValidators::script("transfer-logic").hash),
        recipient: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn racing_registrations_one_wins() {
    let (sdk, ledger, signer) = deploy().await;

    // Both plans are made against the single origin node.
    let first = sdk.register(request("issue-a")).await.unwrap();
    let second = sdk.register(request("issue-b")).await.unwrap();
    assert_eq!(first.inputs[0].out_ref(), second.inputs[0].out_ref());

    sdk.submit(&first, &signer, &ledger).await.unwrap();

    let err = sdk.submit(&second, &signer, &ledger).await.unwrap_err();
    assert!(matches!(err, Error::StaleState(_)));
    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert!(err.is_retriable());

    // The ledger enforces the same rule without the pre-check.
    assert!(matches!(ledger.apply(&second), Err(Error::StaleState(_))));
    assert_eq!(ledger.submitted().len(), 2);

    // Replanning against the new state succeeds.
    let retry = sdk.register(request("issue-b")).await.unwrap();
    sdk.submit(&retry, &signer, &ledger).await.unwrap();

    let records = sdk.registry_snapshot().await.unwrap();
    assert_eq!(records.len(), 3);
    verify_chain(&records).unwrap();
    assert!(records[1].key < records[2].key);
}

#[tokio::test]
async fn spent_reference_input_makes_plan_stale() {
    let (sdk, ledger, signer) = deploy().await;
    let plan = sdk.register(request("issue-a")).await.unwrap();

    let pp = sdk.params().protocol_params_ref();
    ledger.spend(&pp).unwrap();

    let err = sdk.ensure_fresh(&plan).await.unwrap_err();
    assert!(matches!(err, Error::StaleState(_)));
    assert!(sdk.submit(&plan, &signer, &ledger).await.is_err());
}

#[tokio::test]
async fn missing_protocol_params_is_reported_at_planning() {
    let (sdk, ledger, _signer) = deploy().await;
    ledger.spend(&sdk.params().protocol_params_ref()).unwrap();

    let err = sdk.register(request("issue-a")).await.unwrap_err();
    assert!(matches!(err, Error::MissingReference(_)));
}
