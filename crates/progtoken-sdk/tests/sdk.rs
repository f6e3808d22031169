use progtoken_sdk::testing::{HashingValidators, MemoryLedger, MemoryWallet, key_address};
use progtoken_sdk::{
    AssetName, Authorities, DeregisterRequest, Error, Invocation, MAX_SENTINEL, MintRequest,
    Network, PlutusData, ProgTokenSdk, RegisterRequest, Script, SdkConfig, TokenUnit,
    TransferRequest, TxHash, UnsignedTx, Value,
};

type Sdk = ProgTokenSdk<MemoryLedger, MemoryWallet, HashingValidators>;

struct Harness {
    sdk: Sdk,
    ledger: MemoryLedger,
    signer: MemoryWallet,
}

impl Harness {
    async fn deploy() -> Self {
        let ledger = MemoryLedger::new();
        let wallet = MemoryWallet::funded(
            ledger.clone(),
            key_address(0, 1),
            &[50_000_000, 50_000_000, 50_000_000, 50_000_000],
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
            transfer_logic().hash,
        )
        .await
        .unwrap();
        Self {
            sdk,
            ledger,
            signer,
        }
    }

    async fn submit(&self, tx: &UnsignedTx) -> progtoken_sdk::Result<TxHash> {
        self.sdk.submit(tx, &self.signer, &self.ledger).await
    }

    fn operator(&self) -> progtoken_sdk::Address {
        self.signer.address()
    }
}

fn transfer_logic() -> Script {
    HashingValidators::script("transfer-logic")
}

fn issue_logic(label: &str) -> Invocation {
    Invocation::new(HashingValidators::script(label), PlutusData::unit())
}

fn register_request(label: &str, quantity: u64) -> RegisterRequest {
    RegisterRequest {
        asset_name: AssetName::from_text("TOK").unwrap(),
        quantity,
        minting_logic: issue_logic(label),
        authorities: Authorities::new(transfer_logic().hash),
        recipient: None,
    }
}

fn mint_request(label: &str, quantity: u64) -> MintRequest {
    MintRequest {
        asset_name: AssetName::from_text("TOK").unwrap(),
        quantity,
        minting_logic: issue_logic(label),
        recipient: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_deployment_has_only_origin() {
    let h = Harness::deploy().await;
    let records = h.sdk.registry_snapshot().await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].is_origin());
    assert_eq!(records[0].next, MAX_SENTINEL.to_vec());
}

#[tokio::test]
async fn register_inserts_node_and_mints() {
    let h = Harness::deploy().await;
    let tx = h.sdk.register(register_request("issue-a", 100)).await.unwrap();
    h.submit(&tx).await.unwrap();

    let records = h.sdk.registry_snapshot().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].next, records[1].key);
    assert_eq!(records[1].next, MAX_SENTINEL.to_vec());
    assert_eq!(
        records[1].authorities.transfer_authority,
        transfer_logic().hash.as_bytes()
    );

    let balances = h.sdk.balances(&h.operator()).await.unwrap();
    assert_eq!(balances.len(), 1);
    let (unit, quantity) = balances.iter().next().unwrap();
    assert_eq!(unit.policy.as_bytes(), records[1].key.as_slice());
    assert_eq!(*quantity, 100);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let h = Harness::deploy().await;
    let tx = h.sdk.register(register_request("issue-a", 1)).await.unwrap();
    h.submit(&tx).await.unwrap();

    let again = h.sdk.register(register_request("issue-a", 1)).await;
    assert!(matches!(again, Err(Error::DuplicateKey(_))));
}

#[tokio::test]
async fn mint_requires_registration() {
    let h = Harness::deploy().await;
    let result = h.sdk.mint(mint_request("never-registered", 5)).await;
    assert!(matches!(result, Err(Error::UnregisteredPolicy(_))));
}

#[tokio::test]
async fn mint_leaves_registry_untouched() {
    let h = Harness::deploy().await;
    let tx = h.sdk.register(register_request("issue-a", 10)).await.unwrap();
    h.submit(&tx).await.unwrap();
    let before = h.sdk.registry_snapshot().await.unwrap();

    let tx = h.sdk.mint(mint_request("issue-a", 20)).await.unwrap();
    assert!(tx.inputs.is_empty());
    h.submit(&tx).await.unwrap();

    assert_eq!(h.sdk.registry_snapshot().await.unwrap(), before);
    let balances = h.sdk.balances(&h.operator()).await.unwrap();
    assert_eq!(balances.values().copied().sum::<u64>(), 30);
}

#[tokio::test]
async fn transfer_moves_tokens_and_returns_change() {
    let h = Harness::deploy().await;
    let tx = h.sdk.register(register_request("issue-a", 10)).await.unwrap();
    h.submit(&tx).await.unwrap();
    for q in [20, 70] {
        let tx = h.sdk.mint(mint_request("issue-a", q)).await.unwrap();
        h.submit(&tx).await.unwrap();
    }
    let unit: TokenUnit = h
        .sdk
        .balances(&h.operator())
        .await
        .unwrap()
        .into_keys()
        .next()
        .unwrap();

    let recipient = key_address(0, 9);
    let tx = h
        .sdk
        .transfer(TransferRequest {
            unit: unit.clone(),
            quantity: 25,
            recipient,
            transfer_logic: Invocation::new(transfer_logic(), PlutusData::unit()),
        })
        .await
        .unwrap();
    assert_eq!(tx.withdrawals.len(), 2);
    h.submit(&tx).await.unwrap();

    let sender = h.sdk.balances(&h.operator()).await.unwrap();
    let received = h.sdk.balances(&recipient).await.unwrap();
    assert_eq!(sender.get(&unit), Some(&75));
    assert_eq!(received.get(&unit), Some(&25));
}

#[tokio::test]
async fn transfer_beyond_balance_fails() {
    let h = Harness::deploy().await;
    let tx = h.sdk.register(register_request("issue-a", 10)).await.unwrap();
    h.submit(&tx).await.unwrap();
    let unit = h
        .sdk
        .balances(&h.operator())
        .await
        .unwrap()
        .into_keys()
        .next()
        .unwrap();

    let result = h
        .sdk
        .transfer(TransferRequest {
            unit,
            quantity: 11,
            recipient: key_address(0, 9),
            transfer_logic: Invocation::new(transfer_logic(), PlutusData::unit()),
        })
        .await;
    assert!(matches!(
        result,
        Err(Error::InsufficientBalance {
            requested: 11,
            available: 10
        })
    ));
}

#[tokio::test]
async fn transfer_to_enterprise_address_is_rejected() {
    let h = Harness::deploy().await;
    let tx = h.sdk.register(register_request("issue-a", 10)).await.unwrap();
    h.submit(&tx).await.unwrap();
    let unit = h
        .sdk
        .balances(&h.operator())
        .await
        .unwrap()
        .into_keys()
        .next()
        .unwrap();

    let result = h
        .sdk
        .transfer(TransferRequest {
            unit,
            quantity: 1,
            recipient: progtoken_sdk::Address::script(0, transfer_logic().hash),
            transfer_logic: Invocation::new(transfer_logic(), PlutusData::unit()),
        })
        .await;
    assert!(matches!(result, Err(Error::InvalidRecipient(_))));
}

#[tokio::test]
async fn deregister_restores_origin() {
    let h = Harness::deploy().await;
    let tx = h.sdk.register(register_request("issue-a", 1)).await.unwrap();
    h.submit(&tx).await.unwrap();
    let policy = h
        .sdk
        .balances(&h.operator())
        .await
        .unwrap()
        .into_keys()
        .next()
        .unwrap()
        .policy;

    let tx = h.sdk.deregister(DeregisterRequest { policy }).await.unwrap();
    h.submit(&tx).await.unwrap();

    let records = h.sdk.registry_snapshot().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].next, MAX_SENTINEL.to_vec());

    let again = h.sdk.deregister(DeregisterRequest { policy }).await;
    assert!(matches!(again, Err(Error::UnregisteredPolicy(_))));
}

#[tokio::test]
async fn missing_collateral_is_a_resource_error() {
    let h = Harness::deploy().await;
    let bare = MemoryWallet::new(h.ledger.clone(), key_address(0, 3));
    h.ledger.fund(bare.address(), Value::lovelace(10_000_000));
    let sdk = Sdk::new(
        Network::Preview,
        h.ledger.clone(),
        bare,
        HashingValidators,
        h.sdk.params().clone(),
        SdkConfig::default(),
    )
    .unwrap();
    let err = sdk.register(register_request("issue-a", 1)).await.unwrap_err();
    assert!(matches!(err, Error::NoCollateral));
    assert_eq!(err.kind(), progtoken_sdk::ErrorKind::Resource);
}

#[tokio::test]
async fn withdraw_credential_registration() {
    let h = Harness::deploy().await;
    let tx = h
        .sdk
        .register_withdraw_credential(&transfer_logic())
        .await
        .unwrap();
    assert_eq!(tx.certificates.len(), 1);
    assert!(!tx.wallet_inputs.is_empty());
    assert!(
        tx.wallet_inputs
            .iter()
            .all(|o| o.script_ref.is_none() && !o.value.has_assets())
    );
}
