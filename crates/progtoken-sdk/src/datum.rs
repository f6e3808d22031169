//! Typed datums and redeemers.
//!
//! Each on-chain value the SDK writes has its own type with a [`ToData`]
//! impl; nothing assembles positional constructor fields ad hoc.

use crate::error::{Error, Result};
use crate::hash::{PolicyId, ScriptHash};
use crate::plutus_data::PlutusData;

/// Width of the maximum sentinel key.
pub const SENTINEL_LEN: usize = 30;

/// `next` of the terminal registry record.
pub const MAX_SENTINEL: [u8; SENTINEL_LEN] = [0xff; SENTINEL_LEN];

pub trait ToData {
    fn to_data(&self) -> PlutusData;

    /// Binary (CBOR) form of [`to_data`](ToData::to_data).
    fn encode(&self) -> Vec<u8> {
        self.to_data().to_cbor()
    }
}

impl ToData for PlutusData {
    fn to_data(&self) -> PlutusData {
        self.clone()
    }
}

// ── Registry record ─────────────────────────────────────────────────────

/// Auxiliary script / metadata hashes stored with a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Authorities {
    pub transfer_authority: Vec<u8>,
    pub third_party_authority: Vec<u8>,
    pub metadata_hash: Vec<u8>,
}

impl Authorities {
    pub fn new(transfer: ScriptHash) -> Self {
        Self {
            transfer_authority: transfer.as_bytes().to_vec(),
            ..Default::default()
        }
    }

    pub fn with_third_party(mut self, script: ScriptHash) -> Self {
        self.third_party_authority = script.as_bytes().to_vec();
        self
    }

    pub fn with_metadata(mut self, hash: impl Into<Vec<u8>>) -> Self {
        self.metadata_hash = hash.into();
        self
    }
}

/// One node of the on-chain sorted linked list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryRecord {
    pub key: Vec<u8>,
    pub next: Vec<u8>,
    pub authorities: Authorities,
}

impl RegistryRecord {
    /// The origin record: minimum key, pointing at the maximum sentinel.
    pub fn origin() -> Self {
        Self {
            key: Vec::new(),
            next: MAX_SENTINEL.to_vec(),
            authorities: Authorities::default(),
        }
    }

    pub fn is_origin(&self) -> bool {
        self.key.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.next == MAX_SENTINEL
    }

    /// `key < k < next` under byte-lexicographic order.
    pub fn covers(&self, k: &[u8]) -> bool {
        self.key.as_slice() < k && k < self.next.as_slice()
    }

    pub fn from_data(data: &PlutusData) -> Result<Self> {
        let (_, fields) = data
            .as_constr()
            .ok_or_else(|| Error::MalformedRecord("registry datum is not a constructor".into()))?;
        if fields.len() < 5 {
            return Err(Error::MalformedRecord(format!(
                "registry datum has {} fields, expected 5",
                fields.len()
            )));
        }
        let field = |i: usize| -> Result<Vec<u8>> {
            fields[i].as_bytes().map(<[u8]>::to_vec).ok_or_else(|| {
                Error::MalformedRecord(format!("registry datum field {i} is not a byte string"))
            })
        };
        Ok(Self {
            key: field(0)?,
            next: field(1)?,
            authorities: Authorities {
                transfer_authority: field(2)?,
                third_party_authority: field(3)?,
                metadata_hash: field(4)?,
            },
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::from_data(&PlutusData::from_cbor(bytes)?)
    }
}

impl ToData for RegistryRecord {
    fn to_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                PlutusData::bytes(&self.key),
                PlutusData::bytes(&self.next),
                PlutusData::bytes(&self.authorities.transfer_authority),
                PlutusData::bytes(&self.authorities.third_party_authority),
                PlutusData::bytes(&self.authorities.metadata_hash),
            ],
        )
    }
}

// ── Redeemers ───────────────────────────────────────────────────────────

/// Spending a registry node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySpendRedeemer;

impl ToData for RegistrySpendRedeemer {
    fn to_data(&self) -> PlutusData {
        PlutusData::unit()
    }
}

/// Minting or burning a directory token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryMintRedeemer {
    /// Origin node at bootstrap.
    Init,
    /// New node for `key`, registered through minting logic `hashed_param`.
    Insert { key: PolicyId, hashed_param: ScriptHash },
    /// Burn the node for `key`.
    Remove { key: PolicyId },
}

impl ToData for DirectoryMintRedeemer {
    fn to_data(&self) -> PlutusData {
        match self {
            DirectoryMintRedeemer::Init => PlutusData::constr(0, vec![]),
            DirectoryMintRedeemer::Insert { key, hashed_param } => PlutusData::constr(
                1,
                vec![
                    PlutusData::bytes(key.as_bytes()),
                    PlutusData::bytes(hashed_param.as_bytes()),
                ],
            ),
            DirectoryMintRedeemer::Remove { key } => {
                PlutusData::constr(2, vec![PlutusData::bytes(key.as_bytes())])
            }
        }
    }
}

/// Minting programmable tokens through the issuance policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuanceRedeemer {
    pub minting_logic: ScriptHash,
}

impl ToData for IssuanceRedeemer {
    fn to_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![PlutusData::constr(
                1,
                vec![PlutusData::bytes(self.minting_logic.as_bytes())],
            )],
        )
    }
}

/// Spending a holder output under the custody base script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustodySpendRedeemer;

impl ToData for CustodySpendRedeemer {
    fn to_data(&self) -> PlutusData {
        PlutusData::unit()
    }
}

/// Zero-value withdrawal against the custody global script. Each proof is
/// the reference-input index of a transferred policy's registry node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlobalStateRedeemer {
    pub proofs: Vec<u32>,
}

impl ToData for GlobalStateRedeemer {
    fn to_data(&self) -> PlutusData {
        let proofs = self
            .proofs
            .iter()
            .map(|i| PlutusData::constr(0, vec![PlutusData::int(*i as i128)]))
            .collect();
        PlutusData::constr(0, vec![PlutusData::List(proofs)])
    }
}

/// Redeemers of the two bootstrap singleton policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingletonMintRedeemer {
    ProtocolParams,
    IssuanceTemplate,
}

impl ToData for SingletonMintRedeemer {
    fn to_data(&self) -> PlutusData {
        match self {
            SingletonMintRedeemer::ProtocolParams => PlutusData::constr(1, vec![]),
            SingletonMintRedeemer::IssuanceTemplate => PlutusData::constr(2, vec![]),
        }
    }
}

// ── Datums ──────────────────────────────────────────────────────────────

/// Inline datum marking an output as a programmable-token holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolderMarker;

impl ToData for HolderMarker {
    fn to_data(&self) -> PlutusData {
        PlutusData::unit()
    }
}

/// Global configuration read by every protocol script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolParamsDatum {
    pub directory_mint: ScriptHash,
    pub custody_base: ScriptHash,
}

impl ProtocolParamsDatum {
    pub fn from_data(data: &PlutusData) -> Result<Self> {
        let malformed = || Error::MalformedRecord("bad protocol params datum".into());
        let (_, fields) = data.as_constr().ok_or_else(malformed)?;
        let [dir, base, ..] = fields else {
            return Err(malformed());
        };
        let directory_mint = ScriptHash::from_slice(dir.as_bytes().ok_or_else(malformed)?)?;
        let (_, base_fields) = base.as_constr().ok_or_else(malformed)?;
        let base_bytes = base_fields
            .first()
            .and_then(PlutusData::as_bytes)
            .ok_or_else(malformed)?;
        Ok(Self {
            directory_mint,
            custody_base: ScriptHash::from_slice(base_bytes)?,
        })
    }
}

impl ToData for ProtocolParamsDatum {
    fn to_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![
                PlutusData::bytes(self.directory_mint.as_bytes()),
                PlutusData::constr(1, vec![PlutusData::bytes(self.custody_base.as_bytes())]),
            ],
        )
    }
}

/// Serialized issuance policy split around its minting-logic parameter, so
/// scripts can recompute the policy id for any minting logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceTemplateDatum {
    pub prefix: Vec<u8>,
    pub postfix: Vec<u8>,
}

impl IssuanceTemplateDatum {
    /// Split `code` around the single occurrence of `placeholder`.
    pub fn split(code: &[u8], placeholder: &ScriptHash) -> Result<Self> {
        let needle = placeholder.as_bytes();
        let hits: Vec<usize> = code
            .windows(needle.len())
            .enumerate()
            .filter(|(_, w)| *w == needle)
            .map(|(i, _)| i)
            .collect();
        match hits.as_slice() {
            [at] => Ok(Self {
                prefix: code[..*at].to_vec(),
                postfix: code[at + needle.len()..].to_vec(),
            }),
            _ => Err(Error::Script(format!(
                "issuance template needs exactly one placeholder, found {}",
                hits.len()
            ))),
        }
    }

    /// Reassemble the policy code for `minting_logic`.
    pub fn instantiate(&self, minting_logic: &ScriptHash) -> Vec<u8> {
        let mut code = self.prefix.clone();
        code.extend_from_slice(minting_logic.as_bytes());
        code.extend_from_slice(&self.postfix);
        code
    }
}

impl ToData for IssuanceTemplateDatum {
    fn to_data(&self) -> PlutusData {
        PlutusData::constr(
            0,
            vec![PlutusData::bytes(&self.prefix), PlutusData::bytes(&self.postfix)],
        )
    }
}
