//! Mutations of the `inscriptions` / `locations` projection.
//!
//! Every function expects to run inside the chain event's SQLite transaction
//! and leaves committing or rolling back to the caller.

use rusqlite::{params, Connection, OptionalExtension};

use crate::{
    config::NumberingMode,
    core::{
        protocol::inscription_normalizing::get_mime_type, RevealOperation, TransferOperation,
    },
    ord::classify,
    try_debug, try_warn,
    utils::Context,
    OrdviewError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealApplied {
    pub number: i64,
    pub linked_locations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealRolledBack {
    pub number: i64,
    pub unlinked_locations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferApplied {
    pub linked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LocationLink {
    id: i64,
    is_genesis: bool,
    pre_satpoint: Option<String>,
    post_satpoint: String,
}

/// Inserts the inscription, its genesis location, and links any location that
/// reached the store before this reveal did.
pub fn apply_reveal(
    reveal: &RevealOperation,
    numbering: NumberingMode,
    conn: &Connection,
    ctx: &Context,
) -> Result<RevealApplied, OrdviewError> {
    let genesis_id = reveal.genesis_id.to_string();
    if find_inscription_row_id(&genesis_id, conn)?.is_some() {
        return Err(OrdviewError::Conflict(format!(
            "inscription {genesis_id} already revealed"
        )));
    }

    let number = match numbering {
        NumberingMode::Sequence => next_sequence_number(conn)?,
        NumberingMode::Upstream => reveal.inscription_number,
    };
    let number_taken = conn
        .query_row(
            "SELECT 1 FROM inscriptions WHERE number = ?",
            params![number],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if number_taken {
        return Err(OrdviewError::Conflict(format!(
            "inscription number {number} already assigned (revealing {genesis_id})"
        )));
    }

    let ordinal_number = i64::try_from(reveal.ordinal_number).map_err(|_| {
        OrdviewError::MalformedEvent(format!(
            "ordinal number {} out of range",
            reveal.ordinal_number
        ))
    })?;
    let classification = classify(reveal.ordinal_number);
    let recursion_refs = match reveal.recursion_refs.is_empty() {
        true => None,
        false => Some(serde_json::to_string(&reveal.recursion_refs).map_err(|e| {
            OrdviewError::Storage(format!("unable to encode recursion refs: {e}"))
        })?),
    };
    let output = reveal.satpoint.output();

    conn.execute(
        "INSERT INTO inscriptions (
            genesis_id, number, sat_ordinal, sat_rarity, sat_coinbase_height, mime_type,
            content_type, content_length, fee, recursive, recursion_refs, genesis_block_height,
            genesis_block_hash, genesis_tx_id, genesis_address, genesis_timestamp, address,
            tx_id, output, output_offset, value, timestamp, location_block_height
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?15, ?14, ?17, ?18, ?19, ?16, ?12)",
        params![
            &genesis_id,
            number,
            ordinal_number,
            classification.rarity.as_str(),
            classification.coinbase_height,
            get_mime_type(&reveal.content_type),
            &reveal.content_type,
            reveal.content_length,
            reveal.fee,
            recursion_refs.is_some(),
            recursion_refs,
            reveal.block.height,
            &reveal.block.hash,
            &reveal.tx_id,
            &reveal.address,
            reveal.block.timestamp,
            &output,
            reveal.satpoint.offset,
            reveal.output_value,
        ],
    )?;
    let inscription_row_id = conn.last_insert_rowid();

    conn.execute(
        "INSERT INTO locations (
            inscription_id, genesis_id, block_height, block_hash, tx_id, tx_index, address,
            output, output_offset, value, timestamp, pre_satpoint, post_satpoint, is_genesis
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL, ?12, 1)",
        params![
            inscription_row_id,
            &genesis_id,
            reveal.block.height,
            &reveal.block.hash,
            &reveal.tx_id,
            reveal.tx_index,
            &reveal.address,
            &output,
            reveal.satpoint.offset,
            reveal.output_value,
            reveal.block.timestamp,
            reveal.satpoint.to_string(),
        ],
    )?;

    let linked_locations = conn.execute(
        "UPDATE locations SET inscription_id = ?1 WHERE genesis_id = ?2 AND inscription_id IS NULL",
        params![inscription_row_id, &genesis_id],
    )?;
    if linked_locations > 0 {
        try_debug!(
            ctx,
            "Linked {} pending location(s) to inscription {}",
            linked_locations,
            genesis_id
        );
        verify_location_chain(inscription_row_id, &genesis_id, conn, ctx)?;
        update_current_location(inscription_row_id, conn)?;
    }

    Ok(RevealApplied {
        number,
        linked_locations,
    })
}

/// Appends a location. Transfers for unknown inscriptions are kept unlinked.
pub fn apply_transfer(
    transfer: &TransferOperation,
    conn: &Connection,
    ctx: &Context,
) -> Result<TransferApplied, OrdviewError> {
    let genesis_id = transfer.genesis_id.to_string();
    let inscription_row_id = find_inscription_row_id(&genesis_id, conn)?;

    conn.execute(
        "INSERT INTO locations (
            inscription_id, genesis_id, block_height, block_hash, tx_id, tx_index, address,
            output, output_offset, value, timestamp, pre_satpoint, post_satpoint, is_genesis
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0)",
        params![
            inscription_row_id,
            &genesis_id,
            transfer.block.height,
            &transfer.block.hash,
            &transfer.tx_id,
            transfer.tx_index,
            &transfer.updated_address,
            transfer.satpoint_post.output(),
            transfer.satpoint_post.offset,
            transfer.output_value,
            transfer.block.timestamp,
            transfer.satpoint_pre.to_string(),
            transfer.satpoint_post.to_string(),
        ],
    )?;

    match inscription_row_id {
        Some(inscription_row_id) => {
            verify_location_chain(inscription_row_id, &genesis_id, conn, ctx)?;
            update_current_location(inscription_row_id, conn)?;
            Ok(TransferApplied { linked: true })
        }
        None => {
            try_debug!(
                ctx,
                "Stored unlinked location for inscription {} at block #{}",
                genesis_id,
                transfer.block.height
            );
            Ok(TransferApplied { linked: false })
        }
    }
}

/// Deletes the inscription and its genesis location. Later locations survive,
/// unlinked, so the reveal can be applied again.
pub fn rollback_reveal(
    reveal: &RevealOperation,
    conn: &Connection,
    ctx: &Context,
) -> Result<RevealRolledBack, OrdviewError> {
    let genesis_id = reveal.genesis_id.to_string();
    let stored: Option<(i64, i64, String)> = conn
        .query_row(
            "SELECT id, number, genesis_block_hash FROM inscriptions WHERE genesis_id = ?",
            params![&genesis_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    let (inscription_row_id, number) = match stored {
        Some((id, number, block_hash)) if block_hash == reveal.block.hash => (id, number),
        Some((_, _, block_hash)) => {
            return Err(OrdviewError::NotFound(format!(
                "inscription {genesis_id} was revealed in block {block_hash}, not {}",
                reveal.block.hash
            )))
        }
        None => {
            return Err(OrdviewError::NotFound(format!(
                "inscription {genesis_id} is not revealed"
            )))
        }
    };

    conn.execute(
        "DELETE FROM locations WHERE inscription_id = ? AND is_genesis = 1",
        params![inscription_row_id],
    )?;
    let unlinked_locations = conn.execute(
        "UPDATE locations SET inscription_id = NULL WHERE inscription_id = ?",
        params![inscription_row_id],
    )?;
    conn.execute(
        "DELETE FROM inscriptions WHERE id = ?",
        params![inscription_row_id],
    )?;
    try_debug!(
        ctx,
        "Deleted inscription {} (number {}), {} location(s) left unlinked",
        genesis_id,
        number,
        unlinked_locations
    );

    Ok(RevealRolledBack {
        number,
        unlinked_locations,
    })
}

/// Deletes the single location written by the matching `apply_transfer`.
pub fn rollback_transfer(
    transfer: &TransferOperation,
    conn: &Connection,
    ctx: &Context,
) -> Result<(), OrdviewError> {
    let genesis_id = transfer.genesis_id.to_string();
    let location: Option<(i64, Option<i64>)> = conn
        .query_row(
            "SELECT id, inscription_id FROM locations
            WHERE genesis_id = ?1 AND pre_satpoint = ?2 AND post_satpoint = ?3
                AND block_height = ?4 AND block_hash = ?5 AND tx_id = ?6 AND tx_index = ?7
                AND is_genesis = 0
            ORDER BY id DESC LIMIT 1",
            params![
                &genesis_id,
                transfer.satpoint_pre.to_string(),
                transfer.satpoint_post.to_string(),
                transfer.block.height,
                &transfer.block.hash,
                &transfer.tx_id,
                transfer.tx_index,
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((location_id, inscription_row_id)) = location else {
        return Err(OrdviewError::NotFound(format!(
            "no location for inscription {genesis_id} moving {} -> {} in block #{}",
            transfer.satpoint_pre, transfer.satpoint_post, transfer.block.height
        )));
    };

    conn.execute("DELETE FROM locations WHERE id = ?", params![location_id])?;
    match inscription_row_id {
        Some(inscription_row_id) => {
            update_current_location(inscription_row_id, conn)?;
            try_debug!(
                ctx,
                "Deleted location of inscription {} at block #{}, current location recomputed",
                genesis_id,
                transfer.block.height
            );
        }
        None => {
            try_debug!(
                ctx,
                "Deleted unlinked location of inscription {} at block #{}",
                genesis_id,
                transfer.block.height
            );
        }
    }
    Ok(())
}

pub fn find_inscription_row_id(
    genesis_id: &str,
    conn: &Connection,
) -> Result<Option<i64>, OrdviewError> {
    let id = conn
        .query_row(
            "SELECT id FROM inscriptions WHERE genesis_id = ?",
            params![genesis_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Zero-based, taken from the AUTOINCREMENT sequence so a rolled back reveal
/// never hands its number out again.
fn next_sequence_number(conn: &Connection) -> Result<i64, OrdviewError> {
    let seq = conn.query_row(
        "SELECT COALESCE((SELECT seq FROM sqlite_sequence WHERE name = 'inscriptions'), 0)",
        [],
        |row| row.get(0),
    )?;
    Ok(seq)
}

/// Copies the tail of the location chain onto the inscription row.
fn update_current_location(inscription_row_id: i64, conn: &Connection) -> Result<(), OrdviewError> {
    conn.execute(
        "UPDATE inscriptions SET (address, tx_id, output, output_offset, value, timestamp, location_block_height) = (
            SELECT address, tx_id, output, output_offset, value, timestamp, block_height
            FROM locations
            WHERE inscription_id = ?1
            ORDER BY block_height DESC, tx_index DESC, is_genesis ASC, id DESC
            LIMIT 1
        )
        WHERE id = ?1 AND EXISTS (SELECT 1 FROM locations WHERE inscription_id = ?1)",
        params![inscription_row_id],
    )?;
    Ok(())
}

/// Counts the places where a location does not pick up where its predecessor
/// left the sat. Breaks are logged, never fatal.
pub fn verify_location_chain(
    inscription_row_id: i64,
    genesis_id: &str,
    conn: &Connection,
    ctx: &Context,
) -> Result<usize, OrdviewError> {
    let mut stmt = conn.prepare(
        "SELECT id, is_genesis, pre_satpoint, post_satpoint FROM locations
        WHERE inscription_id = ?
        ORDER BY block_height ASC, tx_index ASC, is_genesis DESC, id ASC",
    )?;
    let chain = stmt
        .query_map(params![inscription_row_id], |row| {
            Ok(LocationLink {
                id: row.get(0)?,
                is_genesis: row.get(1)?,
                pre_satpoint: row.get(2)?,
                post_satpoint: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut breaks = 0;
    if let Some(first) = chain.first() {
        if !first.is_genesis {
            breaks += 1;
            try_warn!(
                ctx,
                "Location chain of {} starts with location {} instead of its genesis",
                genesis_id,
                first.id
            );
        }
    }
    for pair in chain.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.pre_satpoint.as_deref() != Some(previous.post_satpoint.as_str()) {
            breaks += 1;
            try_warn!(
                ctx,
                "Location chain of {} broken: location {} leaves {} but location {} starts from {}",
                genesis_id,
                previous.id,
                previous.post_satpoint,
                current.id,
                current.pre_satpoint.as_deref().unwrap_or("nothing")
            );
        }
    }
    Ok(breaks)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;
    use crate::{
        core::test_utils::{
            get_capturing_ctx, get_test_ctx, reveal_operation, transfer_operation, RevealBuilder,
            TransferBuilder,
        },
        db::{get_db_stats, initialize_ordview_db, DbStats},
    };

    const GENESIS_TX: &str = "38c46a8bf7ec90bc7f6b797e7dc84baa97f4e5fd4286b92fe1b50176d03b18dc";
    const TX_1: &str = "9e2414153b1893f799477f7e1a00a52fafc235de72fd215cb3321f253c4464ac";
    const TX_2: &str = "2fa1640d61f04a699833f0f6a884f543c835fc60f0fd4da8627ebb857acdce84";
    const HASH_A: &str = "00000000000000000002a90330a99f67e3f01eb2ce070b45930581e82fb7a91d";
    const HASH_B: &str = "00000000000000000003dd4738355bedb73796de9b1099e59ff7adc235e967a6";

    fn genesis_id() -> String {
        format!("{GENESIS_TX}i0")
    }

    fn reveal() -> RevealOperation {
        reveal_operation(
            RevealBuilder::new()
                .inscription_id(&genesis_id())
                .satpoint(&format!("{GENESIS_TX}:0:0"))
                .inscription_number(7)
                .build(),
            775618,
            HASH_A,
            GENESIS_TX,
        )
    }

    fn first_transfer() -> TransferOperation {
        transfer_operation(
            TransferBuilder::new()
                .inscription_id(&genesis_id())
                .satpoint_pre(&format!("{GENESIS_TX}:0:0"))
                .satpoint_post(&format!("{TX_1}:0:0"))
                .output_value(Some(9000))
                .build(),
            775620,
            HASH_A,
            TX_1,
        )
    }

    fn second_transfer() -> TransferOperation {
        transfer_operation(
            TransferBuilder::new()
                .inscription_id(&genesis_id())
                .satpoint_pre(&format!("{TX_1}:0:0"))
                .satpoint_post(&format!("{TX_2}:1:250"))
                .updated_address(Some("bc1qnewowner".to_string()))
                .output_value(Some(8000))
                .build(),
            775621,
            HASH_B,
            TX_2,
        )
    }

    fn linked_flags(conn: &Connection) -> Vec<bool> {
        let mut stmt = conn
            .prepare("SELECT inscription_id IS NOT NULL FROM locations ORDER BY block_height")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<bool>, _>>()
            .unwrap()
    }

    fn current_location(conn: &Connection) -> (Option<String>, String, u64, Option<u64>) {
        conn.query_row(
            "SELECT address, output, output_offset, value FROM inscriptions WHERE genesis_id = ?",
            params![genesis_id()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap()
    }

    #[test]
    fn reveal_then_rollback_leaves_nothing_behind() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        let op = reveal_operation(
            RevealBuilder::new()
                .inscription_id(
                    "0268dd9743c862d80ab02cb1d0228036cfe172522850eb96be60cfee14b31fb8i0",
                )
                .satpoint("0x0268dd9743c862d80ab02cb1d0228036cfe172522850eb96be60cfee14b31fb8:0:0")
                .ordinal_number(125348773618236)
                .build(),
            107,
            "0x163de66dc9c0949905bfe8e148bde04600223cf88d19f26fdbeba1d6e6fa0f88",
            "0x0268dd9743c862d80ab02cb1d0228036cfe172522850eb96be60cfee14b31fb8",
        );

        let applied = apply_reveal(&op, NumberingMode::Sequence, &conn, &ctx).unwrap();
        assert_eq!(applied.number, 0);
        let (coinbase_height, rarity, mime_type, output): (u64, String, String, String) = conn
            .query_row(
                "SELECT sat_coinbase_height, sat_rarity, mime_type, output FROM inscriptions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(coinbase_height, 25069);
        assert_eq!(rarity, "common");
        assert_eq!(mime_type, "text/plain");
        assert_eq!(
            output,
            "0268dd9743c862d80ab02cb1d0228036cfe172522850eb96be60cfee14b31fb8:0"
        );

        rollback_reveal(&op, &conn, &ctx).unwrap();
        assert_eq!(get_db_stats(&conn).unwrap(), DbStats::default());
    }

    #[test]
    fn duplicate_reveal_is_a_conflict() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx).unwrap();
        assert!(matches!(
            apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx),
            Err(OrdviewError::Conflict(_))
        ));
    }

    #[test]
    fn sequence_numbers_are_never_reused() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        let first = apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx).unwrap();
        rollback_reveal(&reveal(), &conn, &ctx).unwrap();
        let second = apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx).unwrap();
        assert_eq!(first.number, 0);
        assert_eq!(second.number, 1);
    }

    #[test]
    fn upstream_numbers_come_from_the_payload() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        let applied = apply_reveal(&reveal(), NumberingMode::Upstream, &conn, &ctx).unwrap();
        assert_eq!(applied.number, 7);

        let mut other = reveal();
        other.genesis_id.index = 1;
        assert!(matches!(
            apply_reveal(&other, NumberingMode::Upstream, &conn, &ctx),
            Err(OrdviewError::Conflict(_))
        ));
    }

    #[test]
    fn transfer_updates_current_location_and_rollback_restores_it() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx).unwrap();
        let genesis_location = current_location(&conn);

        let applied = apply_transfer(&first_transfer(), &conn, &ctx).unwrap();
        assert!(applied.linked);
        assert_eq!(
            current_location(&conn),
            (
                Some("bc1qcf3dgqgvylmd5ayl4njm4ephqfdazy93ssu28j".to_string()),
                format!("{TX_1}:0"),
                0,
                Some(9000)
            )
        );

        rollback_transfer(&first_transfer(), &conn, &ctx).unwrap();
        assert_eq!(current_location(&conn), genesis_location);
        let stats = get_db_stats(&conn).unwrap();
        assert_eq!(stats.inscriptions, 1);
        assert_eq!(stats.locations, 1);
    }

    #[test]
    fn transfers_before_genesis_are_linked_by_the_reveal() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();

        assert!(!apply_transfer(&first_transfer(), &conn, &ctx).unwrap().linked);
        assert!(!apply_transfer(&second_transfer(), &conn, &ctx).unwrap().linked);
        assert_eq!(linked_flags(&conn), vec![false, false]);

        let applied = apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx).unwrap();
        assert_eq!(applied.linked_locations, 2);
        assert_eq!(linked_flags(&conn), vec![true, true, true]);
        assert_eq!(
            current_location(&conn),
            (
                Some("bc1qnewowner".to_string()),
                format!("{TX_2}:1"),
                250,
                Some(8000)
            )
        );
        let inscription_row_id = find_inscription_row_id(&genesis_id(), &conn)
            .unwrap()
            .unwrap();
        assert_eq!(
            verify_location_chain(inscription_row_id, &genesis_id(), &conn, &ctx).unwrap(),
            0
        );
    }

    #[test]
    fn reveal_rollback_unlinks_later_transfers() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx).unwrap();
        apply_transfer(&first_transfer(), &conn, &ctx).unwrap();
        apply_transfer(&second_transfer(), &conn, &ctx).unwrap();

        let rolled_back = rollback_reveal(&reveal(), &conn, &ctx).unwrap();
        assert_eq!(rolled_back.unlinked_locations, 2);
        assert_eq!(linked_flags(&conn), vec![false, false]);
        let stats = get_db_stats(&conn).unwrap();
        assert_eq!(stats.inscriptions, 0);
        assert_eq!(stats.unlinked_locations, 2);

        apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx).unwrap();
        assert_eq!(linked_flags(&conn), vec![true, true, true]);
    }

    #[test]
    fn rollbacks_log_what_they_delete() {
        let (ctx, lines) = get_capturing_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx).unwrap();
        apply_transfer(&first_transfer(), &conn, &ctx).unwrap();
        apply_transfer(&second_transfer(), &conn, &ctx).unwrap();
        lines.lock().unwrap().clear();

        rollback_transfer(&second_transfer(), &conn, &ctx).unwrap();
        rollback_reveal(&reveal(), &conn, &ctx).unwrap();
        rollback_transfer(&first_transfer(), &conn, &ctx).unwrap();

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.starts_with("DEBG")));
        assert!(lines[0].contains("current location recomputed"));
        assert!(lines[1].contains(&format!("Deleted inscription {}", genesis_id())));
        assert!(lines[1].contains("1 location(s) left unlinked"));
        assert!(lines[2].contains("Deleted unlinked location"));
    }

    #[test]
    fn rollback_transfer_removes_only_its_own_row() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx).unwrap();
        apply_transfer(&first_transfer(), &conn, &ctx).unwrap();
        apply_transfer(&second_transfer(), &conn, &ctx).unwrap();

        rollback_transfer(&second_transfer(), &conn, &ctx).unwrap();
        assert_eq!(get_db_stats(&conn).unwrap().locations, 2);
        assert_eq!(current_location(&conn).1, format!("{TX_1}:0"));
    }

    #[test]
    fn rollback_of_unlinked_transfer_works() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        apply_transfer(&first_transfer(), &conn, &ctx).unwrap();
        rollback_transfer(&first_transfer(), &conn, &ctx).unwrap();
        assert_eq!(get_db_stats(&conn).unwrap(), DbStats::default());
    }

    #[test]
    fn redelivered_rollbacks_are_not_found() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        let error = rollback_reveal(&reveal(), &conn, &ctx).unwrap_err();
        assert!(matches!(error, OrdviewError::NotFound(_)));
        assert!(!error.is_fatal());
        assert!(matches!(
            rollback_transfer(&first_transfer(), &conn, &ctx),
            Err(OrdviewError::NotFound(_))
        ));
    }

    #[test]
    fn reveal_rollback_from_another_block_is_not_found() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx).unwrap();
        let mut stale = reveal();
        stale.block.hash = HASH_B.to_string();
        assert!(matches!(
            rollback_reveal(&stale, &conn, &ctx),
            Err(OrdviewError::NotFound(_))
        ));
        assert_eq!(get_db_stats(&conn).unwrap().inscriptions, 1);
    }

    #[test]
    fn chain_breaks_are_reported_but_not_fatal() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        apply_reveal(&reveal(), NumberingMode::Sequence, &conn, &ctx).unwrap();
        // skips the first hop
        apply_transfer(&second_transfer(), &conn, &ctx).unwrap();
        let inscription_row_id = find_inscription_row_id(&genesis_id(), &conn)
            .unwrap()
            .unwrap();
        assert_eq!(
            verify_location_chain(inscription_row_id, &genesis_id(), &conn, &ctx).unwrap(),
            1
        );
    }

    #[test]
    fn recursive_content_is_flagged() {
        let ctx = get_test_ctx();
        let conn = initialize_ordview_db(None, &ctx).unwrap();
        let content = format!("/content/{}", genesis_id());
        let op = reveal_operation(
            RevealBuilder::new()
                .inscription_id(&format!("{TX_1}i0"))
                .satpoint(&format!("{TX_1}:0:0"))
                .content_bytes(&format!("0x{}", hex::encode(content)))
                .build(),
            775619,
            HASH_A,
            TX_1,
        );
        apply_reveal(&op, NumberingMode::Sequence, &conn, &ctx).unwrap();
        let (recursive, refs): (bool, String) = conn
            .query_row(
                "SELECT recursive, recursion_refs FROM inscriptions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert!(recursive);
        assert_eq!(refs, format!("[\"{}\"]", genesis_id()));
    }
}
