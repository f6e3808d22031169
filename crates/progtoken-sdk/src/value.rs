use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::hash::PolicyId;

/// Token name within a policy. At most 32 bytes; may be empty.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub const MAX_LEN: usize = 32;

    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() > Self::MAX_LEN {
            return Err(Error::MalformedRecord(format!(
                "asset name is {} bytes, max {}",
                bytes.len(),
                Self::MAX_LEN
            )));
        }
        Ok(Self(bytes))
    }

    /// Asset name from human-readable text (its UTF-8 bytes).
    pub fn from_text(text: &str) -> Result<Self> {
        Self::new(text.as_bytes().to_vec())
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetName({})", hex::encode(&self.0))
    }
}

impl Serialize for AssetName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for AssetName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        AssetName::new(bytes).map_err(serde::de::Error::custom)
    }
}

/// A `(policy, asset name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenUnit {
    pub policy: PolicyId,
    pub name: AssetName,
}

impl TokenUnit {
    pub fn new(policy: PolicyId, name: AssetName) -> Self {
        Self { policy, name }
    }
}

/// Ledger "unit" form: policy hex immediately followed by asset-name hex.
impl fmt::Display for TokenUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.policy, self.name)
    }
}

impl FromStr for TokenUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let split = PolicyId::LEN * 2;
        if s.len() < split || !s.is_char_boundary(split) {
            return Err(Error::MalformedRecord(format!("unit too short: {s}")));
        }
        let (policy, name) = s.split_at(split);
        let name =
            hex::decode(name).map_err(|e| Error::MalformedRecord(format!("bad hex: {e}")))?;
        Ok(Self {
            policy: policy.parse()?,
            name: AssetName::new(name)?,
        })
    }
}

impl Serialize for TokenUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A bundle of coin plus native tokens held by one output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Value {
    pub coin: u64,
    pub assets: BTreeMap<TokenUnit, u64>,
}

impl Value {
    pub fn lovelace(coin: u64) -> Self {
        Self {
            coin,
            assets: BTreeMap::new(),
        }
    }

    /// Builder-style: add `quantity` of `unit`. Zero quantities are dropped.
    pub fn with_asset(mut self, unit: TokenUnit, quantity: u64) -> Result<Self> {
        self.add_asset(unit, quantity)?;
        Ok(self)
    }

    pub fn add_asset(&mut self, unit: TokenUnit, quantity: u64) -> Result<()> {
        if quantity == 0 {
            return Ok(());
        }
        let slot = self.assets.entry(unit).or_insert(0);
        *slot = slot.checked_add(quantity).ok_or(Error::AmountOverflow)?;
        Ok(())
    }

    pub fn quantity_of(&self, unit: &TokenUnit) -> u64 {
        self.assets.get(unit).copied().unwrap_or(0)
    }

    /// Total quantity of every asset under `policy`.
    pub fn policy_quantity(&self, policy: &PolicyId) -> u64 {
        self.assets
            .iter()
            .filter(|(unit, _)| &unit.policy == policy)
            .map(|(_, q)| *q)
            .sum()
    }

    pub fn checked_add(&self, other: &Value) -> Result<Value> {
        let mut out = self.clone();
        out.coin = out.coin.checked_add(other.coin).ok_or(Error::AmountOverflow)?;
        for (unit, q) in &other.assets {
            out.add_asset(unit.clone(), *q)?;
        }
        Ok(out)
    }

    /// Value with `unit` removed entirely.
    pub fn without(&self, unit: &TokenUnit) -> Value {
        let mut out = self.clone();
        out.assets.remove(unit);
        out
    }

    pub fn has_assets(&self) -> bool {
        !self.assets.is_empty()
    }
}
