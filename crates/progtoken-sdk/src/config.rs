use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Order in which a holder's outputs are fed to the balance selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOrder {
    /// Ascending by `(tx_hash, index)`. Deterministic across query backends.
    #[default]
    AscendingByReference,
    /// Whatever order the query facade returned.
    AsFetched,
}

/// Coin amounts and timing for the one-shot protocol bootstrap.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub protocol_params_coin: u64,
    pub directory_origin_coin: u64,
    pub issuance_template_coin: u64,
    pub custody_base_ref_coin: u64,
    pub custody_global_ref_coin: u64,
    /// Spendable wallet outputs required before the bootstrap transaction can
    /// be assembled (two seeds plus one for fees).
    pub min_wallet_outputs: usize,
    /// Number of outputs a wallet split fans into.
    pub split_count: usize,
    pub split_output_coin: u64,
    pub poll_timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            protocol_params_coin: 1_500_000,
            directory_origin_coin: 1_500_000,
            issuance_template_coin: 6_500_000,
            custody_base_ref_coin: 2_500_000,
            custody_global_ref_coin: 15_500_000,
            min_wallet_outputs: 3,
            split_count: 3,
            split_output_coin: 5_000_000,
            poll_timeout_secs: 120,
            poll_interval_secs: 30,
        }
    }
}

impl BootstrapConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Configuration for [`ProgTokenSdk`](crate::sdk::ProgTokenSdk).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Coin locked with every registry node output.
    pub registry_node_coin: u64,
    /// Coin locked with freshly minted token outputs.
    pub minted_output_coin: u64,
    /// Coin locked with transfer recipient and change outputs.
    pub transfer_output_coin: u64,
    pub selection_order: SelectionOrder,
    pub bootstrap: BootstrapConfig,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            registry_node_coin: 1_500_000,
            minted_output_coin: 1_500_000,
            transfer_output_coin: 1_300_000,
            selection_order: SelectionOrder::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

impl SdkConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SdkConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let b = &self.bootstrap;
        if b.poll_interval_secs == 0 {
            return Err(Error::Config("poll_interval_secs must be non-zero".into()));
        }
        if b.poll_interval_secs > b.poll_timeout_secs {
            return Err(Error::Config(
                "poll_interval_secs exceeds poll_timeout_secs".into(),
            ));
        }
        if b.min_wallet_outputs < 3 {
            return Err(Error::Config(
                "bootstrap needs at least 3 wallet outputs".into(),
            ));
        }
        if b.split_count < b.min_wallet_outputs {
            return Err(Error::Config(format!(
                "split_count {} cannot satisfy min_wallet_outputs {}",
                b.split_count, b.min_wallet_outputs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SdkConfig::default();
        config.validate().unwrap();
        assert_eq!(config.bootstrap.poll_timeout(), Duration::from_secs(120));
        assert_eq!(config.selection_order, SelectionOrder::AscendingByReference);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SdkConfig::from_json(
            r#"{"transfer_output_coin": 2000000, "selection_order": "as_fetched",
                "bootstrap": {"poll_interval_secs": 5}}"#,
        )
        .unwrap();
        assert_eq!(config.transfer_output_coin, 2_000_000);
        assert_eq!(config.registry_node_coin, 1_500_000);
        assert_eq!(config.selection_order, SelectionOrder::AsFetched);
        assert_eq!(config.bootstrap.poll_interval_secs, 5);
        assert_eq!(config.bootstrap.poll_timeout_secs, 120);
    }

    #[test]
    fn rejects_interval_longer_than_timeout() {
        let err = SdkConfig::from_json(
            r#"{"bootstrap": {"poll_interval_secs": 300, "poll_timeout_secs": 60}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
