pub mod address;
pub mod bootstrap;
pub mod chain;
pub mod config;
pub mod datum;
pub mod error;
pub mod hash;
pub mod network;
pub mod params;
pub mod plutus_data;
pub mod registry;
pub mod scripts;
pub mod sdk;
pub mod selector;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tx;
pub mod utxo;
pub mod value;

// Core types
pub use address::{Address, Credential, holder_address};
pub use chain::{LedgerQuery, Signer, Submitter, WalletQuery, sign_and_submit};
pub use config::{BootstrapConfig, SdkConfig, SelectionOrder};
pub use error::{Error, ErrorKind, Result};
pub use hash::{KeyHash, PolicyId, ScriptHash, TxHash};
pub use network::Network;
pub use params::{ParamSource, ProtocolBootstrapParams};
pub use plutus_data::PlutusData;
pub use sdk::{DeregisterRequest, MintRequest, ProgTokenSdk, RegisterRequest, TransferRequest};
pub use state::BootstrapState;
pub use utxo::{LedgerOutput, OutputRef};
pub use value::{AssetName, TokenUnit, Value};

// Registry records and redeemers
pub use datum::{
    Authorities, CustodySpendRedeemer, DirectoryMintRedeemer, GlobalStateRedeemer, HolderMarker,
    IssuanceRedeemer, IssuanceTemplateDatum, MAX_SENTINEL, ProtocolParamsDatum, RegistryRecord,
    RegistrySpendRedeemer, SingletonMintRedeemer, ToData,
};
pub use registry::locator::{
    find_by_key, find_insert_covering, find_remove_covering, order_chain, verify_chain,
};
pub use registry::planner::{InsertPlan, RemovePlan, plan_insert, plan_remove};
pub use registry::{RegistryNode, decode_nodes};

// Validators
pub use scripts::{ProtocolScripts, Script, Validator, ValidatorSource};

// Transaction plans and builders
pub use bootstrap::{BootstrapContext, BootstrapSequencer, bootstrap};
pub use selector::{Selection, select};
pub use tx::bootstrap::{BootstrapTxParams, build_bootstrap_tx};
pub use tx::deregistration::{DeregistrationParams, build_deregistration_tx};
pub use tx::mint::{MintParams, build_mint_tx};
pub use tx::registration::{RegistrationParams, build_registration_tx};
pub use tx::split::{SplitParams, build_split_tx};
pub use tx::stake_registration::{StakeRegistrationParams, build_stake_registration_tx};
pub use tx::transfer::{TransferParams, build_transfer_tx};
pub use tx::{Invocation, ScriptSource, SignedTx, UnsignedTx};
