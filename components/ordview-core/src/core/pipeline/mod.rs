pub mod processors;

use std::thread::JoinHandle;

use crate::{chainhook::BitcoinChainhookPayload, OrdviewError};

use self::processors::chain_event_processing::ProcessingReport;

pub type ProcessingResult = Result<ProcessingReport, OrdviewError>;

pub enum ProcessorCommand {
    /// Apply one chainhook occurrence and report the outcome on the given channel.
    ProcessPayload(
        BitcoinChainhookPayload,
        crossbeam_channel::Sender<ProcessingResult>,
    ),
    Terminate,
}

pub enum ProcessorEvent {
    Terminated,
}

pub struct ProcessorController {
    pub commands_tx: crossbeam_channel::Sender<ProcessorCommand>,
    pub events_rx: crossbeam_channel::Receiver<ProcessorEvent>,
    pub thread_handle: JoinHandle<()>,
}

impl ProcessorController {
    pub fn process_payload(&self, payload: BitcoinChainhookPayload) -> ProcessingResult {
        submit_payload(&self.commands_tx, payload)
    }

    pub fn terminate(self) {
        let _ = self.commands_tx.send(ProcessorCommand::Terminate);
        let _ = self.events_rx.recv();
        let _ = self.thread_handle.join();
    }
}

/// Hands a payload to the writer thread and blocks until it is committed or rejected.
pub fn submit_payload(
    commands_tx: &crossbeam_channel::Sender<ProcessorCommand>,
    payload: BitcoinChainhookPayload,
) -> ProcessingResult {
    let (result_tx, result_rx) = crossbeam_channel::bounded(1);
    commands_tx
        .send(ProcessorCommand::ProcessPayload(payload, result_tx))
        .map_err(|e| OrdviewError::Storage(format!("chain event processor is gone: {e}")))?;
    result_rx.recv().map_err(|e| {
        OrdviewError::Storage(format!("chain event processor dropped the request: {e}"))
    })?
}
