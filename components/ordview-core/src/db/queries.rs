use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, ToSql};

use crate::OrdviewError;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 60;

const INSCRIPTION_COLUMNS: &str = "genesis_id, number, address, genesis_address,
    genesis_block_height, genesis_block_hash, genesis_tx_id, fee, genesis_timestamp, tx_id,
    output, value, output_offset, sat_ordinal, sat_rarity, sat_coinbase_height, mime_type,
    content_type, content_length, timestamp, recursive, recursion_refs";

const LOCATION_COLUMNS: &str =
    "block_height, block_hash, address, tx_id, output, value, output_offset, timestamp";

/// Inscription as served by the read API. Timestamps are milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InscriptionResponse {
    pub id: String,
    pub number: i64,
    pub address: Option<String>,
    pub genesis_address: Option<String>,
    pub genesis_block_height: u64,
    pub genesis_block_hash: String,
    pub genesis_tx_id: String,
    pub genesis_fee: String,
    pub genesis_timestamp: i64,
    pub tx_id: String,
    pub location: String,
    pub output: String,
    pub value: Option<String>,
    pub offset: Option<String>,
    pub sat_ordinal: String,
    pub sat_rarity: String,
    pub sat_coinbase_height: u64,
    pub mime_type: String,
    pub content_type: String,
    pub content_length: u64,
    pub timestamp: i64,
    pub recursive: bool,
    pub recursion_refs: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationResponse {
    pub block_height: u64,
    pub block_hash: String,
    pub address: Option<String>,
    pub tx_id: String,
    pub location: String,
    pub output: String,
    pub value: Option<String>,
    pub offset: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub limit: u32,
    pub offset: u32,
    pub total: u64,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Pagination {
        Pagination {
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(None, None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InscriptionFilters {
    pub genesis_id: Vec<String>,
    pub number: Vec<i64>,
    pub genesis_block_height_from: Option<u64>,
    pub genesis_block_height_to: Option<u64>,
    pub mime_type: Vec<String>,
    pub rarity: Vec<String>,
    pub address: Vec<String>,
}

impl InscriptionFilters {
    fn to_where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut clauses = vec![];
        let mut values: Vec<Box<dyn ToSql>> = vec![];

        fn any_of<T: ToSql + Clone + 'static>(
            column: &str,
            items: &[T],
            clauses: &mut Vec<String>,
            values: &mut Vec<Box<dyn ToSql>>,
        ) {
            if items.is_empty() {
                return;
            }
            let placeholders = vec!["?"; items.len()].join(", ");
            clauses.push(format!("{column} IN ({placeholders})"));
            for item in items.iter() {
                values.push(Box::new(item.clone()));
            }
        }

        any_of("genesis_id", &self.genesis_id, &mut clauses, &mut values);
        any_of("number", &self.number, &mut clauses, &mut values);
        any_of("mime_type", &self.mime_type, &mut clauses, &mut values);
        any_of("sat_rarity", &self.rarity, &mut clauses, &mut values);
        any_of("address", &self.address, &mut clauses, &mut values);
        if let Some(from) = self.genesis_block_height_from {
            clauses.push("genesis_block_height >= ?".to_string());
            values.push(Box::new(from));
        }
        if let Some(to) = self.genesis_block_height_to {
            clauses.push("genesis_block_height <= ?".to_string());
            values.push(Box::new(to));
        }

        match clauses.is_empty() {
            true => (String::new(), values),
            false => (format!("WHERE {}", clauses.join(" AND ")), values),
        }
    }
}

fn optional_string(value: Option<u64>) -> Option<String> {
    value.map(|v| v.to_string())
}

fn inscription_from_row(row: &Row) -> rusqlite::Result<InscriptionResponse> {
    let output: String = row.get(10)?;
    let offset: Option<u64> = row.get(12)?;
    let sat_ordinal: u64 = row.get(13)?;
    let fee: u64 = row.get(7)?;
    let genesis_timestamp: i64 = row.get(8)?;
    let timestamp: i64 = row.get(19)?;
    let recursion_refs: Option<String> = row.get(21)?;
    Ok(InscriptionResponse {
        id: row.get(0)?,
        number: row.get(1)?,
        address: row.get(2)?,
        genesis_address: row.get(3)?,
        genesis_block_height: row.get(4)?,
        genesis_block_hash: row.get(5)?,
        genesis_tx_id: row.get(6)?,
        genesis_fee: fee.to_string(),
        genesis_timestamp: genesis_timestamp * 1000,
        tx_id: row.get(9)?,
        location: format!("{}:{}", output, offset.unwrap_or(0)),
        output,
        value: optional_string(row.get(11)?),
        offset: optional_string(offset),
        sat_ordinal: sat_ordinal.to_string(),
        sat_rarity: row.get(14)?,
        sat_coinbase_height: row.get(15)?,
        mime_type: row.get(16)?,
        content_type: row.get(17)?,
        content_length: row.get(18)?,
        timestamp: timestamp * 1000,
        recursive: row.get(20)?,
        recursion_refs: recursion_refs.and_then(|refs| serde_json::from_str(&refs).ok()),
    })
}

fn location_from_row(row: &Row) -> rusqlite::Result<LocationResponse> {
    let output: String = row.get(4)?;
    let offset: Option<u64> = row.get(6)?;
    let timestamp: i64 = row.get(7)?;
    Ok(LocationResponse {
        block_height: row.get(0)?,
        block_hash: row.get(1)?,
        address: row.get(2)?,
        tx_id: row.get(3)?,
        location: format!("{}:{}", output, offset.unwrap_or(0)),
        output,
        value: optional_string(row.get(5)?),
        offset: optional_string(offset),
        timestamp: timestamp * 1000,
    })
}

pub fn get_inscription(
    genesis_id: &str,
    conn: &Connection,
) -> Result<Option<InscriptionResponse>, OrdviewError> {
    let query = format!("SELECT {INSCRIPTION_COLUMNS} FROM inscriptions WHERE genesis_id = ?");
    let inscription = conn
        .query_row(&query, params![genesis_id], inscription_from_row)
        .optional()?;
    Ok(inscription)
}

pub fn get_inscriptions(
    pagination: &Pagination,
    filters: &InscriptionFilters,
    conn: &Connection,
) -> Result<PaginatedResponse<InscriptionResponse>, OrdviewError> {
    let (where_clause, values) = filters.to_where_clause();

    let total: u64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM inscriptions {where_clause}"),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    let query = format!(
        "SELECT {INSCRIPTION_COLUMNS} FROM inscriptions {where_clause} ORDER BY number DESC LIMIT {} OFFSET {}",
        pagination.limit, pagination.offset
    );
    let mut stmt = conn.prepare(&query)?;
    let results = stmt
        .query_map(params_from_iter(values.iter()), inscription_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PaginatedResponse {
        limit: pagination.limit,
        offset: pagination.offset,
        total,
        results,
    })
}

/// Linked locations of an inscription, newest first. Unlinked locations are not
/// transfers of anything yet, so an unrevealed inscription has none.
pub fn get_transfers(
    genesis_id: &str,
    pagination: &Pagination,
    conn: &Connection,
) -> Result<PaginatedResponse<LocationResponse>, OrdviewError> {
    let total: u64 = conn.query_row(
        "SELECT COUNT(*) FROM locations
        WHERE inscription_id = (SELECT id FROM inscriptions WHERE genesis_id = ?)",
        params![genesis_id],
        |row| row.get(0),
    )?;

    let query = format!(
        "SELECT {LOCATION_COLUMNS} FROM locations
        WHERE inscription_id = (SELECT id FROM inscriptions WHERE genesis_id = ?)
        ORDER BY block_height DESC, tx_index DESC, is_genesis ASC, id DESC
        LIMIT {} OFFSET {}",
        pagination.limit, pagination.offset
    );
    let mut stmt = conn.prepare(&query)?;
    let results = stmt
        .query_map(params![genesis_id], location_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PaginatedResponse {
        limit: pagination.limit,
        offset: pagination.offset,
        total,
        results,
    })
}

pub fn count_unlinked_locations(genesis_id: &str, conn: &Connection) -> Result<u64, OrdviewError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM locations WHERE genesis_id = ? AND inscription_id IS NULL",
        params![genesis_id],
        |row| row.get(0),
    )?;
    Ok(count)
}
