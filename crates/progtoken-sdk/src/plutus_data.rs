//! Structured on-chain data and its binary (CBOR) and JSON encodings.
//!
//! Every datum and redeemer the SDK produces is a [`PlutusData`] tree. The
//! binary form follows the ledger's canonical layout: constructors as CBOR
//! tags 121..=127 / 1280..=1400 / 102, non-empty lists as indefinite arrays,
//! and byte strings chunked at 64 bytes.

use minicbor::data::{Int, Tag, Type};
use minicbor::encode::{self, Write};
use minicbor::{Decoder, Encode, Encoder, decode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value as Json, json};

use crate::error::{Error, Result};

const MAX_DEPTH: usize = 128;
const BYTES_CHUNK: usize = 64;

const POS_BIGNUM_TAG: u64 = 2;
const NEG_BIGNUM_TAG: u64 = 3;
const GENERAL_CONSTR_TAG: u64 = 102;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlutusData {
    Constr { tag: u64, fields: Vec<PlutusData> },
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Integer(i128),
    Bytes(Vec<u8>),
}

impl PlutusData {
    pub fn constr(tag: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr { tag, fields }
    }

    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        PlutusData::Bytes(b.as_ref().to_vec())
    }

    pub fn int(v: i128) -> Self {
        PlutusData::Integer(v)
    }

    /// `Constr 0 []`, the unit-like value used for marker datums and
    /// argument-less redeemers.
    pub fn unit() -> Self {
        PlutusData::constr(0, vec![])
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PlutusData::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_constr(&self) -> Option<(u64, &[PlutusData])> {
        match self {
            PlutusData::Constr { tag, fields } => Some((*tag, fields)),
            _ => None,
        }
    }

    // ── CBOR ────────────────────────────────────────────────────────────

    pub fn to_cbor(&self) -> Vec<u8> {
        // Writing into a Vec cannot fail.
        minicbor::to_vec(self).unwrap_or_default()
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let mut d = Decoder::new(bytes);
        let data = read_item(&mut d, 0)?;
        if d.position() != bytes.len() {
            return Err(malformed(format!(
                "{} trailing bytes after data item",
                bytes.len() - d.position()
            )));
        }
        Ok(data)
    }

    pub fn to_cbor_hex(&self) -> String {
        hex::encode(self.to_cbor())
    }

    pub fn from_cbor_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| malformed(format!("bad hex: {e}")))?;
        Self::from_cbor(&bytes)
    }

    // ── JSON ────────────────────────────────────────────────────────────

    /// Detailed-schema JSON: `{"constructor":n,"fields":[..]}`, `{"bytes":".."}`,
    /// `{"int":n}`, `{"list":[..]}`, `{"map":[{"k":..,"v":..}]}`.
    pub fn to_json(&self) -> Json {
        match self {
            PlutusData::Constr { tag, fields } => json!({
                "constructor": tag,
                "fields": fields.iter().map(PlutusData::to_json).collect::<Vec<_>>(),
            }),
            PlutusData::Map(entries) => json!({
                "map": entries
                    .iter()
                    .map(|(k, v)| json!({"k": k.to_json(), "v": v.to_json()}))
                    .collect::<Vec<_>>(),
            }),
            PlutusData::List(items) => json!({
                "list": items.iter().map(PlutusData::to_json).collect::<Vec<_>>(),
            }),
            PlutusData::Integer(v) => {
                if let Ok(small) = i64::try_from(*v) {
                    json!({ "int": small })
                } else if let Ok(big) = u64::try_from(*v) {
                    json!({ "int": big })
                } else {
                    json!({ "int": v.to_string() })
                }
            }
            PlutusData::Bytes(b) => json!({ "bytes": hex::encode(b) }),
        }
    }

    pub fn from_json(value: &Json) -> Result<Self> {
        Self::from_json_at(value, 0)
    }

    fn from_json_at(value: &Json, depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(malformed("nesting too deep".into()));
        }
        let obj = value
            .as_object()
            .ok_or_else(|| malformed("expected JSON object".into()))?;

        if let Some(tag) = obj.get("constructor") {
            let tag = tag
                .as_u64()
                .ok_or_else(|| malformed("constructor must be an unsigned integer".into()))?;
            let fields = obj
                .get("fields")
                .and_then(Json::as_array)
                .ok_or_else(|| malformed("constructor without fields array".into()))?
                .iter()
                .map(|f| Self::from_json_at(f, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            return Ok(PlutusData::Constr { tag, fields });
        }
        if let Some(b) = obj.get("bytes") {
            let s = b
                .as_str()
                .ok_or_else(|| malformed("bytes must be a hex string".into()))?;
            let bytes = hex::decode(s).map_err(|e| malformed(format!("bad hex: {e}")))?;
            return Ok(PlutusData::Bytes(bytes));
        }
        if let Some(i) = obj.get("int") {
            let v = match i {
                Json::Number(n) => n
                    .as_i64()
                    .map(i128::from)
                    .or_else(|| n.as_u64().map(i128::from))
                    .ok_or_else(|| malformed("int out of range".into()))?,
                Json::String(s) => s
                    .parse::<i128>()
                    .map_err(|e| malformed(format!("bad int: {e}")))?,
                _ => return Err(malformed("int must be a number".into())),
            };
            return Ok(PlutusData::Integer(v));
        }
        if let Some(items) = obj.get("list") {
            let items = items
                .as_array()
                .ok_or_else(|| malformed("list must be an array".into()))?
                .iter()
                .map(|f| Self::from_json_at(f, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            return Ok(PlutusData::List(items));
        }
        if let Some(entries) = obj.get("map") {
            let entries = entries
                .as_array()
                .ok_or_else(|| malformed("map must be an array".into()))?
                .iter()
                .map(|e| {
                    let k = e.get("k").ok_or_else(|| malformed("map entry without k".into()))?;
                    let v = e.get("v").ok_or_else(|| malformed("map entry without v".into()))?;
                    Ok((Self::from_json_at(k, depth + 1)?, Self::from_json_at(v, depth + 1)?))
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(PlutusData::Map(entries));
        }
        Err(malformed("unrecognised data object".into()))
    }
}

impl Serialize for PlutusData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlutusData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Json::deserialize(deserializer)?;
        PlutusData::from_json(&value).map_err(serde::de::Error::custom)
    }
}

fn malformed(msg: String) -> Error {
    Error::MalformedRecord(msg)
}

// ── Encoder ─────────────────────────────────────────────────────────────

fn encode_list<C, W: Write>(
    items: &[PlutusData],
    e: &mut Encoder<W>,
    ctx: &mut C,
) -> std::result::Result<(), encode::Error<W::Error>> {
    if items.is_empty() {
        e.array(0)?;
    } else {
        e.begin_array()?;
        for item in items {
            item.encode(e, ctx)?;
        }
        e.end()?;
    }
    Ok(())
}

fn encode_bytes<W: Write>(
    b: &[u8],
    e: &mut Encoder<W>,
) -> std::result::Result<(), encode::Error<W::Error>> {
    if b.len() <= BYTES_CHUNK {
        e.bytes(b)?;
    } else {
        e.begin_bytes()?;
        for chunk in b.chunks(BYTES_CHUNK) {
            e.bytes(chunk)?;
        }
        e.end()?;
    }
    Ok(())
}

fn minimal_be(v: u128) -> Vec<u8> {
    let bytes = v.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

impl<C> Encode<C> for PlutusData {
    fn encode<W: Write>(
        &self,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> std::result::Result<(), encode::Error<W::Error>> {
        match self {
            PlutusData::Constr { tag, fields } => match *tag {
                0..=6 => {
                    e.tag(Tag::new(121 + tag))?;
                    encode_list(fields, e, ctx)?;
                }
                7..=127 => {
                    e.tag(Tag::new(1280 + (tag - 7)))?;
                    encode_list(fields, e, ctx)?;
                }
                _ => {
                    e.tag(Tag::new(GENERAL_CONSTR_TAG))?.array(2)?.u64(*tag)?;
                    encode_list(fields, e, ctx)?;
                }
            },
            PlutusData::Map(entries) => {
                e.map(entries.len() as u64)?;
                for (k, v) in entries {
                    k.encode(e, ctx)?;
                    v.encode(e, ctx)?;
                }
            }
            PlutusData::List(items) => encode_list(items, e, ctx)?,
            PlutusData::Integer(v) => match Int::try_from(*v) {
                Ok(n) => {
                    e.int(n)?;
                }
                Err(_) if *v >= 0 => {
                    e.tag(Tag::new(POS_BIGNUM_TAG))?;
                    encode_bytes(&minimal_be(*v as u128), e)?;
                }
                Err(_) => {
                    // Negative bignums carry -1 - n.
                    e.tag(Tag::new(NEG_BIGNUM_TAG))?;
                    encode_bytes(&minimal_be((-1 - *v) as u128), e)?;
                }
            },
            PlutusData::Bytes(b) => encode_bytes(b, e)?,
        }
        Ok(())
    }
}

// ── Decoder ─────────────────────────────────────────────────────────────

fn cbor_err(e: decode::Error) -> Error {
    malformed(e.to_string())
}

/// Consumes the break that closes an indefinite container, if it is next.
fn at_break(d: &mut Decoder<'_>) -> Result<bool> {
    if d.datatype().map_err(cbor_err)? == Type::Break {
        d.set_position(d.position() + 1);
        return Ok(true);
    }
    Ok(false)
}

fn read_bytes(d: &mut Decoder<'_>) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for chunk in d.bytes_iter().map_err(cbor_err)? {
        out.extend_from_slice(chunk.map_err(cbor_err)?);
    }
    Ok(out)
}

fn read_array(d: &mut Decoder<'_>, depth: usize) -> Result<Vec<PlutusData>> {
    let mut items = Vec::new();
    match d.array().map_err(cbor_err)? {
        Some(n) => {
            for _ in 0..n {
                items.push(read_item(d, depth + 1)?);
            }
        }
        None => {
            while !at_break(d)? {
                items.push(read_item(d, depth + 1)?);
            }
        }
    }
    Ok(items)
}

fn read_map(d: &mut Decoder<'_>, depth: usize) -> Result<Vec<(PlutusData, PlutusData)>> {
    let mut entries = Vec::new();
    match d.map().map_err(cbor_err)? {
        Some(n) => {
            for _ in 0..n {
                let k = read_item(d, depth + 1)?;
                let v = read_item(d, depth + 1)?;
                entries.push((k, v));
            }
        }
        None => {
            while !at_break(d)? {
                let k = read_item(d, depth + 1)?;
                let v = read_item(d, depth + 1)?;
                entries.push((k, v));
            }
        }
    }
    Ok(entries)
}

fn read_bignum(d: &mut Decoder<'_>) -> Result<i128> {
    let bytes = read_bytes(d)?;
    let trimmed: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    if trimmed.len() > 16 {
        return Err(malformed("integer exceeds 128 bits".into()));
    }
    let mut buf = [0u8; 16];
    buf[16 - trimmed.len()..].copy_from_slice(&trimmed);
    i128::try_from(u128::from_be_bytes(buf))
        .map_err(|_| malformed("integer exceeds i128".into()))
}

fn read_constr(d: &mut Decoder<'_>, tag: u64, depth: usize) -> Result<PlutusData> {
    match tag {
        121..=127 => Ok(PlutusData::Constr {
            tag: tag - 121,
            fields: read_array(d, depth)?,
        }),
        1280..=1400 => Ok(PlutusData::Constr {
            tag: tag - 1280 + 7,
            fields: read_array(d, depth)?,
        }),
        GENERAL_CONSTR_TAG => {
            if d.array().map_err(cbor_err)? != Some(2) {
                return Err(malformed("general constructor must be a pair".into()));
            }
            let tag = d.u64().map_err(cbor_err)?;
            let fields = read_array(d, depth)?;
            Ok(PlutusData::Constr { tag, fields })
        }
        POS_BIGNUM_TAG => Ok(PlutusData::Integer(read_bignum(d)?)),
        NEG_BIGNUM_TAG => Ok(PlutusData::Integer(-1 - read_bignum(d)?)),
        other => Err(malformed(format!("unsupported tag {other}"))),
    }
}

fn read_item(d: &mut Decoder<'_>, depth: usize) -> Result<PlutusData> {
    if depth > MAX_DEPTH {
        return Err(malformed("nesting too deep".into()));
    }
    match d.datatype().map_err(cbor_err)? {
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => Ok(PlutusData::Integer(i128::from(d.int().map_err(cbor_err)?))),
        Type::Bytes | Type::BytesIndef => Ok(PlutusData::Bytes(read_bytes(d)?)),
        Type::Array | Type::ArrayIndef => Ok(PlutusData::List(read_array(d, depth)?)),
        Type::Map | Type::MapIndef => Ok(PlutusData::Map(read_map(d, depth)?)),
        Type::Tag => {
            let tag = d.tag().map_err(cbor_err)?.as_u64();
            read_constr(d, tag, depth)
        }
        other => Err(malformed(format!("unsupported data type {other:?}"))),
    }
}
