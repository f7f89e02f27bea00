use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::{is_hex_of_len, normalize_hex};

pub(crate) const TXID_LEN: usize = 64;

/// `<txid>i<index>`, the reveal transaction and the envelope index within it.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct InscriptionId {
    pub txid: String,
    pub index: u32,
}

impl<'de> Deserialize<'de> for InscriptionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for InscriptionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl Display for InscriptionId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}i{}", self.txid, self.index)
    }
}

#[derive(Debug, PartialEq)]
pub enum ParseError {
    Character(char),
    Length(usize),
    Separator(char),
    Txid(String),
    Index(std::num::ParseIntError),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Character(c) => write!(f, "invalid character: '{c}'"),
            Self::Length(len) => write!(f, "invalid length: {len}"),
            Self::Separator(c) => write!(f, "invalid separator: `{c}`"),
            Self::Txid(txid) => write!(f, "invalid txid: {txid}"),
            Self::Index(err) => write!(f, "invalid index: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl FromStr for InscriptionId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(char) = s.chars().find(|char| !char.is_ascii()) {
            return Err(ParseError::Character(char));
        }

        let s = s.strip_prefix("0x").unwrap_or(s);

        const MIN_LEN: usize = TXID_LEN + 2;

        if s.len() < MIN_LEN {
            return Err(ParseError::Length(s.len()));
        }

        let txid = normalize_hex(&s[..TXID_LEN]);
        if !is_hex_of_len(&txid, TXID_LEN) {
            return Err(ParseError::Txid(txid));
        }

        let separator = s.as_bytes()[TXID_LEN] as char;

        if separator != 'i' {
            return Err(ParseError::Separator(separator));
        }

        let index = &s[TXID_LEN + 1..];

        Ok(Self {
            txid,
            index: index.parse().map_err(ParseError::Index)?,
        })
    }
}
