use regex::Regex;

use crate::{
    chainhook::{
        BitcoinBlockPayload, BitcoinChainhookPayload, OrdinalInscriptionRevealData,
        OrdinalInscriptionTransferData, OrdinalOperation,
    },
    core::{
        BlockContext, ChainDirection, ChainEvent, Operation, RevealOperation, TransferOperation,
    },
    ord::{inscription_id::InscriptionId, sat_point::SatPoint},
    utils::{is_hex_of_len, normalize_hex},
    OrdviewError,
};

lazy_static! {
    static ref RECURSIVE_CONTENT_REF: Regex =
        Regex::new(r"/content/([a-fA-F0-9]{64}i\d+)").unwrap();
}

pub fn parse_chainhook_payload(body: &[u8]) -> Result<BitcoinChainhookPayload, OrdviewError> {
    serde_json::from_slice(body).map_err(|e| {
        OrdviewError::MalformedEvent(format!("unable to decode chainhook payload: {e}"))
    })
}

/// Splits an occurrence into per-block chain events: rollback blocks first, then
/// apply blocks, each in the order they were delivered.
pub fn normalize_chainhook_payload(
    payload: &BitcoinChainhookPayload,
) -> Result<Vec<ChainEvent>, OrdviewError> {
    let mut events = Vec::with_capacity(payload.rollback.len() + payload.apply.len());
    for block in payload.rollback.iter() {
        events.push(normalize_block(block, ChainDirection::Rollback)?);
    }
    for block in payload.apply.iter() {
        events.push(normalize_block(block, ChainDirection::Apply)?);
    }
    Ok(events)
}

pub fn normalize_block(
    block: &BitcoinBlockPayload,
    direction: ChainDirection,
) -> Result<ChainEvent, OrdviewError> {
    let block_context = BlockContext {
        height: block.block_identifier.index,
        hash: normalize_hash(&block.block_identifier.hash, "block hash")?,
        timestamp: block.timestamp,
    };
    let mut operations = vec![];
    for tx in block.transactions.iter() {
        if tx.metadata.ordinal_operations.is_empty() {
            continue;
        }
        let tx_id = normalize_hash(&tx.transaction_identifier.hash, "transaction hash")?;
        for op in tx.metadata.ordinal_operations.iter() {
            let operation = match op {
                OrdinalOperation::InscriptionRevealed(data) => {
                    Operation::Reveal(normalize_reveal(data, &block_context, &tx_id)?)
                }
                OrdinalOperation::InscriptionTransferred(data) => {
                    Operation::Transfer(normalize_transfer(data, &block_context, &tx_id)?)
                }
            };
            operations.push(operation);
        }
    }
    Ok(ChainEvent {
        direction,
        block: block_context,
        operations,
    })
}

fn normalize_reveal(
    data: &OrdinalInscriptionRevealData,
    block: &BlockContext,
    tx_id: &str,
) -> Result<RevealOperation, OrdviewError> {
    let content_bytes = decode_content_bytes(&data.content_bytes)?;
    Ok(RevealOperation {
        genesis_id: parse_inscription_id(&data.inscription_id)?,
        inscription_number: data.inscription_number,
        ordinal_number: data.ordinal_number,
        address: data.inscriber_address.clone(),
        content_type: data.content_type.clone(),
        content_length: data.content_length,
        recursion_refs: get_inscription_recursion(&content_bytes),
        fee: data.inscription_fee,
        output_value: data.inscription_output_value,
        satpoint: parse_satpoint(&data.satpoint_post_inscription)?,
        block: block.clone(),
        tx_id: tx_id.to_string(),
        tx_index: data.tx_index as u64,
    })
}

fn normalize_transfer(
    data: &OrdinalInscriptionTransferData,
    block: &BlockContext,
    tx_id: &str,
) -> Result<TransferOperation, OrdviewError> {
    Ok(TransferOperation {
        genesis_id: parse_inscription_id(&data.inscription_id)?,
        updated_address: data.updated_address.clone(),
        satpoint_pre: parse_satpoint(&data.satpoint_pre_transfer)?,
        satpoint_post: parse_satpoint(&data.satpoint_post_transfer)?,
        output_value: data.post_transfer_output_value,
        block: block.clone(),
        tx_id: tx_id.to_string(),
        tx_index: data.tx_index as u64,
    })
}

fn normalize_hash(value: &str, field: &str) -> Result<String, OrdviewError> {
    let hash = normalize_hex(value);
    if !is_hex_of_len(&hash, 64) {
        return Err(OrdviewError::MalformedEvent(format!(
            "invalid {field}: {value}"
        )));
    }
    Ok(hash)
}

fn parse_inscription_id(value: &str) -> Result<InscriptionId, OrdviewError> {
    value
        .parse()
        .map_err(|e| OrdviewError::MalformedEvent(format!("invalid inscription id {value}: {e}")))
}

fn parse_satpoint(value: &str) -> Result<SatPoint, OrdviewError> {
    value
        .parse()
        .map_err(|e| OrdviewError::MalformedEvent(format!("invalid satpoint {value}: {e}")))
}

fn decode_content_bytes(value: &str) -> Result<Vec<u8>, OrdviewError> {
    let value = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(value)
        .map_err(|e| OrdviewError::MalformedEvent(format!("invalid content bytes: {e}")))
}

/// Inscription ids referenced by `/content/<id>` paths inside utf-8 content.
pub fn get_inscription_recursion(content: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(content);
    RECURSIVE_CONTENT_REF
        .captures_iter(&text)
        .filter_map(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
        .collect()
}

/// `text/plain;charset=utf-8` -> `text/plain`
pub fn get_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
