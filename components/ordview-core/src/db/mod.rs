pub mod projection;
pub mod queries;

use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags};

use crate::{try_error, try_info, try_warn, utils::Context, OrdviewError};

const DB_FILE_NAME: &str = "ordview.sqlite";

const SCHEMA: &[(&str, &str)] = &[
    (
        "table inscriptions",
        "CREATE TABLE IF NOT EXISTS inscriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            genesis_id TEXT NOT NULL UNIQUE,
            number INTEGER NOT NULL UNIQUE,
            sat_ordinal INTEGER NOT NULL,
            sat_rarity TEXT NOT NULL,
            sat_coinbase_height INTEGER NOT NULL,
            mime_type TEXT NOT NULL,
            content_type TEXT NOT NULL,
            content_length INTEGER NOT NULL,
            fee INTEGER NOT NULL,
            recursive INTEGER NOT NULL DEFAULT 0,
            recursion_refs TEXT,
            genesis_block_height INTEGER NOT NULL,
            genesis_block_hash TEXT NOT NULL,
            genesis_tx_id TEXT NOT NULL,
            genesis_address TEXT,
            genesis_timestamp INTEGER NOT NULL,
            address TEXT,
            tx_id TEXT NOT NULL,
            output TEXT NOT NULL,
            output_offset INTEGER NOT NULL,
            value INTEGER,
            timestamp INTEGER NOT NULL,
            location_block_height INTEGER NOT NULL
        )",
    ),
    (
        "index inscriptions_on_sat_ordinal",
        "CREATE INDEX IF NOT EXISTS inscriptions_on_sat_ordinal ON inscriptions(sat_ordinal)",
    ),
    (
        "index inscriptions_on_genesis_block_height",
        "CREATE INDEX IF NOT EXISTS inscriptions_on_genesis_block_height ON inscriptions(genesis_block_height)",
    ),
    (
        "index inscriptions_on_address",
        "CREATE INDEX IF NOT EXISTS inscriptions_on_address ON inscriptions(address)",
    ),
    (
        "table locations",
        "CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            inscription_id INTEGER REFERENCES inscriptions(id),
            genesis_id TEXT NOT NULL,
            block_height INTEGER NOT NULL,
            block_hash TEXT NOT NULL,
            tx_id TEXT NOT NULL,
            tx_index INTEGER NOT NULL,
            address TEXT,
            output TEXT NOT NULL,
            output_offset INTEGER NOT NULL,
            value INTEGER,
            timestamp INTEGER NOT NULL,
            pre_satpoint TEXT,
            post_satpoint TEXT NOT NULL,
            is_genesis INTEGER NOT NULL DEFAULT 0
        )",
    ),
    (
        "index locations_on_genesis_id",
        "CREATE INDEX IF NOT EXISTS locations_on_genesis_id ON locations(genesis_id, block_height, tx_index)",
    ),
    (
        "index locations_on_inscription_id",
        "CREATE INDEX IF NOT EXISTS locations_on_inscription_id ON locations(inscription_id)",
    ),
];

pub fn get_default_ordview_db_file_path(base_dir: &PathBuf) -> PathBuf {
    let mut destination_path = base_dir.clone();
    destination_path.push(DB_FILE_NAME);
    destination_path
}

/// Opens (creating if needed) the database under `base_dir` and makes sure the
/// schema exists. `None` yields a private in-memory database.
pub fn initialize_ordview_db(
    base_dir: Option<&PathBuf>,
    ctx: &Context,
) -> Result<Connection, String> {
    let conn = create_or_open_readwrite_db(base_dir, ctx)?;
    for (name, statement) in SCHEMA.iter() {
        if let Err(e) = conn.execute(statement, []) {
            try_error!(ctx, "Unable to create {}: {}", name, e.to_string());
            return Err(format!("unable to create {name}: {e}"));
        }
    }
    Ok(conn)
}

pub fn open_readwrite_ordview_db_conn(
    base_dir: &PathBuf,
    ctx: &Context,
) -> Result<Connection, String> {
    create_or_open_readwrite_db(Some(base_dir), ctx)
}

pub fn open_readonly_ordview_db_conn(
    base_dir: &PathBuf,
    ctx: &Context,
) -> Result<Connection, String> {
    let path = get_default_ordview_db_file_path(base_dir);
    open_existing_readonly_db(&path, ctx)
}

pub fn create_or_open_readwrite_db(
    base_dir: Option<&PathBuf>,
    ctx: &Context,
) -> Result<Connection, String> {
    let conn = match base_dir {
        None => Connection::open_in_memory().map_err(|e| e.to_string())?,
        Some(base_dir) => {
            let path = get_default_ordview_db_file_path(base_dir);
            let open_flags = match std::fs::metadata(&path) {
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        // need to create
                        if let Some(dirp) = PathBuf::from(&path).parent() {
                            std::fs::create_dir_all(dirp).map_err(|e| {
                                format!("unable to create {}: {}", dirp.display(), e)
                            })?;
                        }
                        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
                    } else {
                        return Err(format!("could not stat {}: {}", path.display(), e));
                    }
                }
                Ok(_md) => OpenFlags::SQLITE_OPEN_READ_WRITE,
            };
            let conn = Connection::open_with_flags(&path, open_flags).map_err(|e| {
                try_error!(ctx, "Unable to open {}: {}", path.display(), e.to_string());
                format!("unable to open {}: {}", path.display(), e)
            })?;
            let journal_mode: String = conn
                .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
                .map_err(|e| format!("unable to enable WAL: {e}"))?;
            if !journal_mode.eq_ignore_ascii_case("wal") {
                try_warn!(ctx, "SQLite journal mode is {} instead of wal", journal_mode);
            }
            conn
        }
    };
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(|e| format!("unable to enable foreign keys: {e}"))?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(|e| e.to_string())?;
    Ok(conn)
}

fn open_existing_readonly_db(path: &PathBuf, ctx: &Context) -> Result<Connection, String> {
    if let Err(e) = std::fs::metadata(path) {
        return Err(if e.kind() == std::io::ErrorKind::NotFound {
            format!("could not find {}", path.display())
        } else {
            format!("could not stat {}: {}", path.display(), e)
        });
    }
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|e| {
        try_warn!(ctx, "Unable to open {}: {}", path.display(), e.to_string());
        format!("unable to open {}: {}", path.display(), e)
    })?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(|e| e.to_string())?;
    Ok(conn)
}

pub fn delete_ordview_db(base_dir: &PathBuf, ctx: &Context) -> Result<(), String> {
    let path = get_default_ordview_db_file_path(base_dir);
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let file = PathBuf::from(file);
        if file.exists() {
            std::fs::remove_file(&file)
                .map_err(|e| format!("unable to remove {}: {}", file.display(), e))?;
            try_info!(ctx, "Removed {}", file.display());
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DbStats {
    pub inscriptions: u64,
    pub locations: u64,
    pub linked_locations: u64,
    pub unlinked_locations: u64,
}

pub fn get_db_stats(conn: &Connection) -> Result<DbStats, OrdviewError> {
    let inscriptions: u64 =
        conn.query_row("SELECT COUNT(*) FROM inscriptions", [], |row| row.get(0))?;
    let (locations, linked_locations): (u64, u64) = conn.query_row(
        "SELECT COUNT(*), COUNT(inscription_id) FROM locations",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(DbStats {
        inscriptions,
        locations,
        linked_locations,
        unlinked_locations: locations - linked_locations,
    })
}
