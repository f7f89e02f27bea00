use std::sync::{Arc, Mutex};

use crate::{
    chainhook::{
        BitcoinBlockPayload, BitcoinChainhookPayload, BitcoinTransactionMetadata,
        BitcoinTransactionPayload, BlockIdentifier, ChainhookInfo, OrdinalInscriptionRevealData,
        OrdinalInscriptionTransferData, OrdinalOperation, TransactionIdentifier,
    },
    core::{protocol::inscription_normalizing::normalize_block, ChainDirection, Operation},
    core::{RevealOperation, TransferOperation},
    utils::Context,
};

pub const TEST_PREDICATE_UUID: &str = "1d3f5a8b-4c2e-4f6a-9b7d-0e1c2a3b4c5d";

pub fn get_test_ctx() -> Context {
    let logger = hiro_system_kit::log::setup_logger();
    let _guard = hiro_system_kit::log::setup_global_logger(logger.clone());
    Context {
        logger: Some(logger),
        tracer: false,
    }
}

struct CapturingDrain(Arc<Mutex<Vec<String>>>);

impl hiro_system_kit::slog::Drain for CapturingDrain {
    type Ok = ();
    type Err = hiro_system_kit::slog::Never;

    fn log(
        &self,
        record: &hiro_system_kit::slog::Record,
        _values: &hiro_system_kit::slog::OwnedKVList,
    ) -> Result<(), Self::Err> {
        if let Ok(mut lines) = self.0.lock() {
            lines.push(format!("{} {}", record.level().as_short_str(), record.msg()));
        }
        Ok(())
    }
}

/// A context whose log lines are kept in memory, prefixed with their level.
pub fn get_capturing_ctx() -> (Context, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(vec![]));
    let logger = hiro_system_kit::slog::Logger::root(
        CapturingDrain(lines.clone()),
        hiro_system_kit::slog::o!(),
    );
    let ctx = Context {
        logger: Some(logger),
        tracer: false,
    };
    (ctx, lines)
}

pub struct RevealBuilder {
    pub inscription_id: String,
    pub inscription_number: i64,
    pub ordinal_number: u64,
    pub inscriber_address: Option<String>,
    pub satpoint: String,
    pub content_bytes: String,
    pub content_type: String,
    pub content_length: u64,
    pub fee: u64,
    pub output_value: u64,
    pub tx_index: usize,
}

impl RevealBuilder {
    pub fn new() -> Self {
        RevealBuilder {
            inscription_id:
                "9bb2314d666ae0b1db8161cb373fcc1381681f71445c4e0335aa80ea9c37fcddi0".to_string(),
            inscription_number: 0,
            ordinal_number: 5,
            inscriber_address: Some(
                "bc1p3cyx5e2hgh53w7kpxcvm8s4kkega9gv5wfw7c4qxsvxl0u8x834qf0u2td".to_string(),
            ),
            satpoint: "9bb2314d666ae0b1db8161cb373fcc1381681f71445c4e0335aa80ea9c37fcdd:0:0"
                .to_string(),
            content_bytes: "0x48656C6C6F".to_string(),
            content_type: "text/plain;charset=utf-8".to_string(),
            content_length: 5,
            fee: 2805,
            output_value: 10000,
            tx_index: 0,
        }
    }

    pub fn inscription_id(mut self, val: &str) -> Self {
        self.inscription_id = val.to_string();
        self
    }

    pub fn inscription_number(mut self, val: i64) -> Self {
        self.inscription_number = val;
        self
    }

    pub fn ordinal_number(mut self, val: u64) -> Self {
        self.ordinal_number = val;
        self
    }

    pub fn inscriber_address(mut self, val: Option<String>) -> Self {
        self.inscriber_address = val;
        self
    }

    pub fn satpoint(mut self, val: &str) -> Self {
        self.satpoint = val.to_string();
        self
    }

    pub fn content_bytes(mut self, val: &str) -> Self {
        self.content_bytes = val.to_string();
        self
    }

    pub fn content_type(mut self, val: &str) -> Self {
        self.content_type = val.to_string();
        self
    }

    pub fn output_value(mut self, val: u64) -> Self {
        self.output_value = val;
        self
    }

    pub fn tx_index(mut self, val: usize) -> Self {
        self.tx_index = val;
        self
    }

    pub fn build(self) -> OrdinalInscriptionRevealData {
        OrdinalInscriptionRevealData {
            content_bytes: self.content_bytes,
            content_type: self.content_type,
            content_length: self.content_length,
            inscription_number: self.inscription_number,
            inscription_fee: self.fee,
            inscription_output_value: self.output_value,
            inscription_id: self.inscription_id,
            inscriber_address: self.inscriber_address,
            ordinal_number: self.ordinal_number,
            ordinal_block_height: 0,
            ordinal_offset: 0,
            satpoint_post_inscription: self.satpoint,
            inscription_input_index: 0,
            transfers_pre_inscription: 0,
            tx_index: self.tx_index,
        }
    }
}

pub struct TransferBuilder {
    pub inscription_id: String,
    pub updated_address: Option<String>,
    pub satpoint_pre: String,
    pub satpoint_post: String,
    pub output_value: Option<u64>,
    pub tx_index: usize,
}

impl TransferBuilder {
    pub fn new() -> Self {
        TransferBuilder {
            inscription_id:
                "9bb2314d666ae0b1db8161cb373fcc1381681f71445c4e0335aa80ea9c37fcddi0".to_string(),
            updated_address: Some("bc1qcf3dgqgvylmd5ayl4njm4ephqfdazy93ssu28j".to_string()),
            satpoint_pre: "9bb2314d666ae0b1db8161cb373fcc1381681f71445c4e0335aa80ea9c37fcdd:0:0"
                .to_string(),
            satpoint_post: "9e2414153b1893f799477f7e1a00a52fafc235de72fd215cb3321f253c4464ac:0:0"
                .to_string(),
            output_value: Some(9000),
            tx_index: 0,
        }
    }

    pub fn inscription_id(mut self, val: &str) -> Self {
        self.inscription_id = val.to_string();
        self
    }

    pub fn updated_address(mut self, val: Option<String>) -> Self {
        self.updated_address = val;
        self
    }

    pub fn satpoint_pre(mut self, val: &str) -> Self {
        self.satpoint_pre = val.to_string();
        self
    }

    pub fn satpoint_post(mut self, val: &str) -> Self {
        self.satpoint_post = val.to_string();
        self
    }

    pub fn output_value(mut self, val: Option<u64>) -> Self {
        self.output_value = val;
        self
    }

    pub fn tx_index(mut self, val: usize) -> Self {
        self.tx_index = val;
        self
    }

    pub fn build(self) -> OrdinalInscriptionTransferData {
        OrdinalInscriptionTransferData {
            inscription_id: self.inscription_id,
            updated_address: self.updated_address,
            satpoint_pre_transfer: self.satpoint_pre,
            satpoint_post_transfer: self.satpoint_post,
            post_transfer_output_value: self.output_value,
            tx_index: self.tx_index,
        }
    }
}

/// Assembles occurrence payloads block by block: `apply()`/`rollback()` pick the
/// list new blocks go to, `transaction()` opens a transaction in the last block.
pub struct ChainhookPayloadBuilder {
    payload: BitcoinChainhookPayload,
    direction: ChainDirection,
}

impl ChainhookPayloadBuilder {
    pub fn new() -> Self {
        ChainhookPayloadBuilder {
            payload: BitcoinChainhookPayload {
                apply: vec![],
                rollback: vec![],
                chainhook: Some(ChainhookInfo {
                    uuid: TEST_PREDICATE_UUID.to_string(),
                    predicate: serde_json::json!({ "scope": "ordinals_protocol", "operation": "inscription_feed" }),
                    is_streaming_blocks: true,
                }),
            },
            direction: ChainDirection::Apply,
        }
    }

    pub fn apply(mut self) -> Self {
        self.direction = ChainDirection::Apply;
        self
    }

    pub fn rollback(mut self) -> Self {
        self.direction = ChainDirection::Rollback;
        self
    }

    fn blocks(&mut self) -> &mut Vec<BitcoinBlockPayload> {
        match self.direction {
            ChainDirection::Apply => &mut self.payload.apply,
            ChainDirection::Rollback => &mut self.payload.rollback,
        }
    }

    pub fn block(mut self, height: u64, hash: &str, timestamp: i64) -> Self {
        self.blocks().push(BitcoinBlockPayload {
            block_identifier: BlockIdentifier {
                index: height,
                hash: hash.to_string(),
            },
            parent_block_identifier: None,
            timestamp,
            transactions: vec![],
            metadata: serde_json::json!({}),
        });
        self
    }

    pub fn transaction(mut self, hash: &str) -> Self {
        self.blocks()
            .last_mut()
            .expect("block() must be called before transaction()")
            .transactions
            .push(BitcoinTransactionPayload {
                transaction_identifier: TransactionIdentifier {
                    hash: hash.to_string(),
                },
                operations: vec![],
                metadata: BitcoinTransactionMetadata::default(),
            });
        self
    }

    fn push_operation(mut self, operation: OrdinalOperation) -> Self {
        self.blocks()
            .last_mut()
            .and_then(|block| block.transactions.last_mut())
            .expect("transaction() must be called before adding operations")
            .metadata
            .ordinal_operations
            .push(operation);
        self
    }

    pub fn inscription_revealed(self, data: OrdinalInscriptionRevealData) -> Self {
        self.push_operation(OrdinalOperation::InscriptionRevealed(data))
    }

    pub fn inscription_transferred(self, data: OrdinalInscriptionTransferData) -> Self {
        self.push_operation(OrdinalOperation::InscriptionTransferred(data))
    }

    pub fn build(self) -> BitcoinChainhookPayload {
        self.payload
    }

    pub fn build_body(self) -> String {
        serde_json::to_string(&self.payload).expect("unable to serialize payload")
    }
}

/// Runs a single reveal through the normalizer, mined at `height`.
pub fn reveal_operation(
    reveal: OrdinalInscriptionRevealData,
    height: u64,
    block_hash: &str,
    tx_id: &str,
) -> RevealOperation {
    let payload = ChainhookPayloadBuilder::new()
        .block(height, block_hash, 1676913207)
        .transaction(tx_id)
        .inscription_revealed(reveal)
        .build();
    match normalize_block(&payload.apply[0], ChainDirection::Apply)
        .expect("invalid reveal")
        .operations
        .remove(0)
    {
        Operation::Reveal(reveal) => reveal,
        _ => unreachable!(),
    }
}

pub fn transfer_operation(
    transfer: OrdinalInscriptionTransferData,
    height: u64,
    block_hash: &str,
    tx_id: &str,
) -> TransferOperation {
    let payload = ChainhookPayloadBuilder::new()
        .block(height, block_hash, 1676913207)
        .transaction(tx_id)
        .inscription_transferred(transfer)
        .build();
    match normalize_block(&payload.apply[0], ChainDirection::Apply)
        .expect("invalid transfer")
        .operations
        .remove(0)
    {
        Operation::Transfer(transfer) => transfer,
        _ => unreachable!(),
    }
}
