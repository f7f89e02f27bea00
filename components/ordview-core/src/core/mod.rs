pub mod pipeline;
pub mod protocol;

#[cfg(test)]
pub mod test_utils;

use crate::ord::{inscription_id::InscriptionId, sat_point::SatPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainDirection {
    Apply,
    Rollback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContext {
    pub height: u64,
    pub hash: String,
    /// Seconds since epoch.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevealOperation {
    pub genesis_id: InscriptionId,
    pub inscription_number: i64,
    pub ordinal_number: u64,
    pub address: Option<String>,
    pub content_type: String,
    pub content_length: u64,
    pub recursion_refs: Vec<String>,
    pub fee: u64,
    pub output_value: u64,
    pub satpoint: SatPoint,
    pub block: BlockContext,
    pub tx_id: String,
    pub tx_index: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferOperation {
    pub genesis_id: InscriptionId,
    pub updated_address: Option<String>,
    pub satpoint_pre: SatPoint,
    pub satpoint_post: SatPoint,
    pub output_value: Option<u64>,
    pub block: BlockContext,
    pub tx_id: String,
    pub tx_index: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Reveal(RevealOperation),
    Transfer(TransferOperation),
}

/// One block of a chainhook occurrence, reduced to its ordinal operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainEvent {
    pub direction: ChainDirection,
    pub block: BlockContext,
    /// In transaction order, as delivered.
    pub operations: Vec<Operation>,
}
