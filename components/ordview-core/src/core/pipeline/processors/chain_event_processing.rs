use std::thread::JoinHandle;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    chainhook::BitcoinChainhookPayload,
    config::{Config, NumberingMode},
    core::{
        pipeline::{ProcessorCommand, ProcessorController, ProcessorEvent},
        protocol::inscription_normalizing::normalize_chainhook_payload,
        ChainDirection, ChainEvent, Operation,
    },
    db::{
        open_readwrite_ordview_db_conn,
        projection::{apply_reveal, apply_transfer, rollback_reveal, rollback_transfer},
    },
    try_error, try_info, try_warn,
    utils::Context,
    OrdviewError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingReport {
    pub blocks_applied: usize,
    pub blocks_rolled_back: usize,
    pub reveals_applied: usize,
    pub reveals_rolled_back: usize,
    pub transfers_applied: usize,
    pub transfers_rolled_back: usize,
    pub unlinked_transfers: usize,
    pub skipped_rollbacks: usize,
}

/// Spawns the single writer: every payload is applied by this thread, one at a time.
pub fn start_chain_event_processor(
    config: &Config,
    ctx: &Context,
) -> Result<ProcessorController, String> {
    let (commands_tx, commands_rx) = crossbeam_channel::bounded::<ProcessorCommand>(16);
    let (events_tx, events_rx) = crossbeam_channel::unbounded::<ProcessorEvent>();

    let mut conn = open_readwrite_ordview_db_conn(&config.expected_cache_path(), ctx)?;
    let numbering = config.ingestion.numbering;
    let ctx = ctx.clone();
    let processor_ctx = match config.logs.ordinals_internals {
        true => ctx.clone(),
        false => Context::empty(),
    };

    let handle: JoinHandle<()> = hiro_system_kit::thread_named("Chain event processor")
        .spawn(move || loop {
            match commands_rx.recv() {
                Ok(ProcessorCommand::ProcessPayload(payload, result_tx)) => {
                    let result =
                        process_chainhook_payload(&payload, numbering, &mut conn, &processor_ctx);
                    if let Err(ref e) = result {
                        try_error!(ctx, "Unable to process chain event: {}", e.to_string());
                    }
                    let _ = result_tx.send(result);
                }
                Ok(ProcessorCommand::Terminate) | Err(_) => {
                    try_info!(ctx, "Chain event processor terminating");
                    let _ = events_tx.send(ProcessorEvent::Terminated);
                    break;
                }
            }
        })
        .map_err(|e| format!("unable to spawn chain event processor: {e}"))?;

    Ok(ProcessorController {
        commands_tx,
        events_rx,
        thread_handle: handle,
    })
}

pub fn process_chainhook_payload(
    payload: &BitcoinChainhookPayload,
    numbering: NumberingMode,
    conn: &mut Connection,
    ctx: &Context,
) -> Result<ProcessingReport, OrdviewError> {
    let events = normalize_chainhook_payload(payload)?;
    process_chain_events(&events, numbering, conn, ctx)
}

/// Applies the events inside a single SQLite transaction. Any fatal error drops
/// the transaction, so nothing from the payload is persisted.
pub fn process_chain_events(
    events: &[ChainEvent],
    numbering: NumberingMode,
    conn: &mut Connection,
    ctx: &Context,
) -> Result<ProcessingReport, OrdviewError> {
    let db_tx = begin_payload_transaction(conn)?;
    let mut report = ProcessingReport::default();
    for event in events.iter() {
        process_chain_event(event, numbering, &db_tx, &mut report, ctx)?;
    }
    db_tx.commit()?;

    try_info!(
        ctx,
        "Chain event processed: {} block(s) rolled back, {} block(s) applied, reveals +{}/-{}, transfers +{}/-{} ({} unlinked), {} rollback(s) skipped",
        report.blocks_rolled_back,
        report.blocks_applied,
        report.reveals_applied,
        report.reveals_rolled_back,
        report.transfers_applied,
        report.transfers_rolled_back,
        report.unlinked_transfers,
        report.skipped_rollbacks
    );
    Ok(report)
}

/// Takes the write lock up front, so a concurrent writer waits out the busy timeout.
pub fn begin_payload_transaction(conn: &mut Connection) -> Result<Transaction, OrdviewError> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

pub fn process_chain_event(
    event: &ChainEvent,
    numbering: NumberingMode,
    db_tx: &Connection,
    report: &mut ProcessingReport,
    ctx: &Context,
) -> Result<(), OrdviewError> {
    match event.direction {
        ChainDirection::Apply => {
            for operation in event.operations.iter() {
                apply_operation(operation, numbering, db_tx, report, ctx)?;
            }
            report.blocks_applied += 1;
        }
        ChainDirection::Rollback => {
            for operation in event.operations.iter().rev() {
                match rollback_operation(operation, db_tx, report, ctx) {
                    Err(e) if !e.is_fatal() => {
                        try_warn!(
                            ctx,
                            "Skipping rollback in block #{}: {}",
                            event.block.height,
                            e.to_string()
                        );
                        report.skipped_rollbacks += 1;
                    }
                    result => result?,
                }
            }
            report.blocks_rolled_back += 1;
        }
    }
    Ok(())
}

fn apply_operation(
    operation: &Operation,
    numbering: NumberingMode,
    db_tx: &Connection,
    report: &mut ProcessingReport,
    ctx: &Context,
) -> Result<(), OrdviewError> {
    match operation {
        Operation::Reveal(reveal) => {
            let applied = apply_reveal(reveal, numbering, db_tx, ctx).map_err(|e| {
                if let OrdviewError::Conflict(_) = e {
                    try_error!(
                        ctx,
                        "Inconsistent reveal in block #{}: {}",
                        reveal.block.height,
                        e.to_string()
                    );
                }
                e
            })?;
            try_info!(
                ctx,
                "Inscription {} revealed at block #{} (number {}, {} pending location(s) linked)",
                reveal.genesis_id,
                reveal.block.height,
                applied.number,
                applied.linked_locations
            );
            report.reveals_applied += 1;
        }
        Operation::Transfer(transfer) => {
            let applied = apply_transfer(transfer, db_tx, ctx)?;
            try_info!(
                ctx,
                "Inscription {} transferred to {} at block #{}",
                transfer.genesis_id,
                transfer.satpoint_post,
                transfer.block.height
            );
            report.transfers_applied += 1;
            if !applied.linked {
                report.unlinked_transfers += 1;
            }
        }
    }
    Ok(())
}

fn rollback_operation(
    operation: &Operation,
    db_tx: &Connection,
    report: &mut ProcessingReport,
    ctx: &Context,
) -> Result<(), OrdviewError> {
    match operation {
        Operation::Reveal(reveal) => {
            let rolled_back = rollback_reveal(reveal, db_tx, ctx)?;
            try_info!(
                ctx,
                "Inscription {} (number {}) rolled back from block #{}, {} location(s) unlinked",
                reveal.genesis_id,
                rolled_back.number,
                reveal.block.height,
                rolled_back.unlinked_locations
            );
            report.reveals_rolled_back += 1;
        }
        Operation::Transfer(transfer) => {
            rollback_transfer(transfer, db_tx, ctx)?;
            try_info!(
                ctx,
                "Transfer of inscription {} to {} rolled back from block #{}",
                transfer.genesis_id,
                transfer.satpoint_post,
                transfer.block.height
            );
            report.transfers_rolled_back += 1;
        }
    }
    Ok(())
}
