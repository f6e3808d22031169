use std::fmt;
use std::str::FromStr;

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::hash::{KeyHash, ScriptHash};
use crate::plutus_data::PlutusData;

/// A payment or stake credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
    Key(KeyHash),
    Script(ScriptHash),
}

impl Credential {
    pub fn hash_bytes(&self) -> &[u8] {
        match self {
            Credential::Key(h) => h.as_bytes(),
            Credential::Script(h) => h.as_bytes(),
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Credential::Script(_))
    }

    /// On-chain form: `Constr 0 [key_hash]` or `Constr 1 [script_hash]`.
    pub fn to_data(&self) -> PlutusData {
        match self {
            Credential::Key(h) => PlutusData::constr(0, vec![PlutusData::bytes(h.as_bytes())]),
            Credential::Script(h) => PlutusData::constr(1, vec![PlutusData::bytes(h.as_bytes())]),
        }
    }

    fn from_bytes(is_script: bool, bytes: &[u8]) -> Result<Self> {
        Ok(if is_script {
            Credential::Script(ScriptHash::from_slice(bytes)?)
        } else {
            Credential::Key(KeyHash::from_slice(bytes)?)
        })
    }
}

/// Shelley-era address in raw header-byte form.
///
/// ```text
/// header = (type << 4) | network_id
///   base        0b00ps   payment(28) ++ stake(28)
///   enterprise  0b011p   payment(28)
///   reward      0b111s   stake(28)
/// p / s = 1 when the payment / stake credential is a script
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Address {
    Base {
        network_id: u8,
        payment: Credential,
        stake: Credential,
    },
    Enterprise {
        network_id: u8,
        payment: Credential,
    },
    Reward {
        network_id: u8,
        stake: Credential,
    },
}

const CRED_LEN: usize = 28;
const MAINNET_ID: u8 = 1;

impl Address {
    /// Enterprise address locked by a script.
    pub fn script(network_id: u8, hash: ScriptHash) -> Self {
        Address::Enterprise {
            network_id,
            payment: Credential::Script(hash),
        }
    }

    /// Reward (withdrawal) address of a script credential.
    pub fn script_reward(network_id: u8, hash: ScriptHash) -> Self {
        Address::Reward {
            network_id,
            stake: Credential::Script(hash),
        }
    }

    pub fn network_id(&self) -> u8 {
        match self {
            Address::Base { network_id, .. }
            | Address::Enterprise { network_id, .. }
            | Address::Reward { network_id, .. } => *network_id,
        }
    }

    pub fn payment_credential(&self) -> Option<&Credential> {
        match self {
            Address::Base { payment, .. } | Address::Enterprise { payment, .. } => Some(payment),
            Address::Reward { .. } => None,
        }
    }

    pub fn stake_credential(&self) -> Option<&Credential> {
        match self {
            Address::Base { stake, .. } | Address::Reward { stake, .. } => Some(stake),
            Address::Enterprise { .. } => None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 2 * CRED_LEN);
        match self {
            Address::Base {
                network_id,
                payment,
                stake,
            } => {
                let kind = (payment.is_script() as u8) | ((stake.is_script() as u8) << 1);
                out.push((kind << 4) | (network_id & 0x0f));
                out.extend_from_slice(payment.hash_bytes());
                out.extend_from_slice(stake.hash_bytes());
            }
            Address::Enterprise {
                network_id,
                payment,
            } => {
                let kind = 0b0110 | payment.is_script() as u8;
                out.push((kind << 4) | (network_id & 0x0f));
                out.extend_from_slice(payment.hash_bytes());
            }
            Address::Reward { network_id, stake } => {
                let kind = 0b1110 | stake.is_script() as u8;
                out.push((kind << 4) | (network_id & 0x0f));
                out.extend_from_slice(stake.hash_bytes());
            }
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (&header, body) = bytes
            .split_first()
            .ok_or_else(|| Error::MalformedRecord("empty address".into()))?;
        let kind = header >> 4;
        let network_id = header & 0x0f;
        let expect = |len: usize| -> Result<()> {
            if body.len() == len {
                Ok(())
            } else {
                Err(Error::MalformedRecord(format!(
                    "address body is {} bytes, expected {len}",
                    body.len()
                )))
            }
        };
        match kind {
            0b0000..=0b0011 => {
                expect(2 * CRED_LEN)?;
                Ok(Address::Base {
                    network_id,
                    payment: Credential::from_bytes(kind & 0b01 != 0, &body[..CRED_LEN])?,
                    stake: Credential::from_bytes(kind & 0b10 != 0, &body[CRED_LEN..])?,
                })
            }
            0b0110 | 0b0111 => {
                expect(CRED_LEN)?;
                Ok(Address::Enterprise {
                    network_id,
                    payment: Credential::from_bytes(kind & 1 != 0, body)?,
                })
            }
            0b1110 | 0b1111 => {
                expect(CRED_LEN)?;
                Ok(Address::Reward {
                    network_id,
                    stake: Credential::from_bytes(kind & 1 != 0, body)?,
                })
            }
            other => Err(Error::MalformedRecord(format!(
                "unsupported address type {other:#06b}"
            ))),
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Human-readable prefix: `addr`/`stake`, with `_test` off mainnet.
    fn hrp(&self) -> String {
        let kind = match self {
            Address::Reward { .. } => "stake",
            _ => "addr",
        };
        if self.network_id() == MAINNET_ID {
            kind.to_string()
        } else {
            format!("{kind}_test")
        }
    }

    pub fn to_bech32(&self) -> Result<String> {
        let hrp = Hrp::parse(&self.hrp())
            .map_err(|e| Error::MalformedRecord(format!("bech32 prefix: {e}")))?;
        bech32::encode::<Bech32>(hrp, &self.to_bytes())
            .map_err(|e| Error::MalformedRecord(format!("bech32 error: {e}")))
    }

    pub fn from_bech32(s: &str) -> Result<Self> {
        let (hrp, bytes) = bech32::decode(s)
            .map_err(|e| Error::MalformedRecord(format!("bech32 error: {e}")))?;
        let addr = Self::from_bytes(&bytes)?;
        if hrp.as_str() != addr.hrp() {
            return Err(Error::MalformedRecord(format!(
                "prefix {} does not match address header, expected {}",
                hrp.as_str(),
                addr.hrp()
            )));
        }
        Ok(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Accepts bech32 (`addr...`, `stake...`) or raw hex.
    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("addr") || s.starts_with("stake") {
            return Self::from_bech32(s);
        }
        let bytes = hex::decode(s).map_err(|e| Error::MalformedRecord(format!("bad hex: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Custody address holding programmable tokens for the owner of `wallet`.
///
/// Payment is the shared custody script; stake is the wallet's own stake
/// credential, which is what the custody script checks for authorization.
pub fn holder_address(custody_base: ScriptHash, wallet: &Address) -> Result<Address> {
    match wallet {
        Address::Base {
            network_id, stake, ..
        } => Ok(Address::Base {
            network_id: *network_id,
            payment: Credential::Script(custody_base),
            stake: *stake,
        }),
        other => Err(Error::InvalidRecipient(format!(
            "{other} has no stake credential"
        ))),
    }
}
