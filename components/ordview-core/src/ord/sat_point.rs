use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use super::inscription_id::TXID_LEN;
use crate::utils::{is_hex_of_len, normalize_hex};

/// `<txid>:<vout>:<offset>`, a single sat inside a transaction output.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct SatPoint {
    pub txid: String,
    pub vout: u32,
    pub offset: u64,
}

impl SatPoint {
    /// `<txid>:<vout>`
    pub fn output(&self) -> String {
        format!("{}:{}", self.txid, self.vout)
    }
}

impl Display for SatPoint {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.txid, self.vout, self.offset)
    }
}

#[derive(Debug, PartialEq)]
pub enum ParseError {
    Components(usize),
    Txid(String),
    Vout(std::num::ParseIntError),
    Offset(std::num::ParseIntError),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Components(n) => write!(f, "expected 3 components, found {n}"),
            Self::Txid(txid) => write!(f, "invalid txid: {txid}"),
            Self::Vout(err) => write!(f, "invalid output index: {err}"),
            Self::Offset(err) => write!(f, "invalid offset: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

impl FromStr for SatPoint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = s.split(':').collect::<Vec<_>>();
        let [txid, vout, offset] = components[..] else {
            return Err(ParseError::Components(components.len()));
        };
        let txid = normalize_hex(txid);
        if !is_hex_of_len(&txid, TXID_LEN) {
            return Err(ParseError::Txid(txid));
        }
        Ok(SatPoint {
            txid,
            vout: vout.parse().map_err(ParseError::Vout)?,
            offset: offset.parse().map_err(ParseError::Offset)?,
        })
    }
}
