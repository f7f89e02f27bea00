//! Bitcoin occurrence payloads posted by a chainhook node for an
//! `ordinals_protocol` predicate.

use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinChainhookPayload {
    #[serde(default)]
    pub apply: Vec<BitcoinBlockPayload>,
    #[serde(default)]
    pub rollback: Vec<BitcoinBlockPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chainhook: Option<ChainhookInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainhookInfo {
    pub uuid: String,
    #[serde(default)]
    pub predicate: JsonValue,
    #[serde(default)]
    pub is_streaming_blocks: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockIdentifier {
    pub index: u64,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinBlockPayload {
    pub block_identifier: BlockIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_block_identifier: Option<BlockIdentifier>,
    pub timestamp: i64,
    #[serde(default)]
    pub transactions: Vec<BitcoinTransactionPayload>,
    #[serde(default)]
    pub metadata: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIdentifier {
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitcoinTransactionPayload {
    pub transaction_identifier: TransactionIdentifier,
    #[serde(default)]
    pub operations: Vec<JsonValue>,
    #[serde(default)]
    pub metadata: BitcoinTransactionMetadata,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BitcoinTransactionMetadata {
    #[serde(default)]
    pub ordinal_operations: Vec<OrdinalOperation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrdinalOperation {
    InscriptionRevealed(OrdinalInscriptionRevealData),
    InscriptionTransferred(OrdinalInscriptionTransferData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalInscriptionRevealData {
    #[serde(default)]
    pub content_bytes: String,
    pub content_type: String,
    pub content_length: u64,
    pub inscription_number: i64,
    pub inscription_fee: u64,
    pub inscription_output_value: u64,
    pub inscription_id: String,
    #[serde(default)]
    pub inscriber_address: Option<String>,
    pub ordinal_number: u64,
    #[serde(default)]
    pub ordinal_block_height: u64,
    #[serde(default)]
    pub ordinal_offset: u64,
    pub satpoint_post_inscription: String,
    #[serde(default)]
    pub inscription_input_index: usize,
    #[serde(default)]
    pub transfers_pre_inscription: u32,
    pub tx_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalInscriptionTransferData {
    pub inscription_id: String,
    #[serde(default)]
    pub updated_address: Option<String>,
    pub satpoint_pre_transfer: String,
    pub satpoint_post_transfer: String,
    #[serde(default)]
    pub post_transfer_output_value: Option<u64>,
    pub tx_index: usize,
}
