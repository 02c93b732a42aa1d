//! SQLite implementation of the BlockStore trait.
//!
//! This is the primary storage backend for the Star Notary. It uses rusqlite
//! with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use star_notary_core::{Block, BlockBody, BlockHash, Star};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{next_height, BlockStore};

const BLOCK_COLUMNS: &str = "height, hash, previous_hash, time, address,
    star_ra, star_dec, star_story, star_magnitude, star_constellation";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path.as_ref())?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.as_ref().display(), journal_mode = %mode, "opened block store");
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await?
    }
}

fn hash_column(bytes: Vec<u8>, index: usize, name: &str) -> rusqlite::Result<BlockHash> {
    let bytes: [u8; 32] = bytes
        .try_into()
        .map_err(|_| rusqlite::Error::InvalidColumnType(index, name.into(), Type::Blob))?;
    Ok(BlockHash::from_bytes(bytes))
}

fn row_to_block(row: &rusqlite::Row<'_>) -> rusqlite::Result<Block> {
    let height: i64 = row.get("height")?;
    let hash = hash_column(row.get("hash")?, 1, "hash")?;
    let previous_block_hash = row
        .get::<_, Option<Vec<u8>>>("previous_hash")?
        .map(|b| hash_column(b, 2, "previous_hash"))
        .transpose()?;

    let body = match row.get::<_, Option<String>>("address")? {
        Some(address) => Some(BlockBody {
            address,
            star: Star {
                ra: row.get("star_ra")?,
                dec: row.get("star_dec")?,
                story: row.get("star_story")?,
                magnitude: row.get("star_magnitude")?,
                constellation: row.get("star_constellation")?,
            },
        }),
        None => None,
    };

    Ok(Block {
        height: height as u64,
        time: row.get("time")?,
        previous_block_hash,
        body,
        hash,
    })
}

fn query_blocks(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Block>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM blocks {} ORDER BY height",
        BLOCK_COLUMNS, filter
    ))?;
    let blocks = stmt
        .query_map(params, row_to_block)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(blocks)
}

fn head_height(conn: &Connection) -> Result<Option<u64>> {
    let head: Option<i64> = conn.query_row("SELECT MAX(height) FROM blocks", [], |row| row.get(0))?;
    Ok(head.map(|h| h as u64))
}

#[async_trait]
impl BlockStore for SqliteStore {
    async fn append(&self, block: &Block) -> Result<()> {
        let block = block.clone();

        self.run(move |conn| {
            // IMMEDIATE takes the write lock up front, so the head read below
            // cannot go stale before the insert.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let expected = next_height(head_height(&tx)?);
            if block.height != expected {
                return Err(StoreError::HeightConflict {
                    expected,
                    got: block.height,
                });
            }

            let duplicate: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM blocks WHERE hash = ?1)",
                params![block.hash.as_bytes().as_slice()],
                |row| row.get(0),
            )?;
            if duplicate {
                return Err(StoreError::InvalidData(format!(
                    "duplicate block hash {}",
                    block.hash
                )));
            }

            let star = block.star();
            tx.execute(
                "INSERT INTO blocks (
                    height, hash, previous_hash, time, address,
                    star_ra, star_dec, star_story, star_magnitude, star_constellation
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    block.height as i64,
                    block.hash.as_bytes().as_slice(),
                    block.previous_block_hash.as_ref().map(|h| h.as_bytes().as_slice()),
                    block.time,
                    block.address(),
                    star.map(|s| s.ra.as_str()),
                    star.map(|s| s.dec.as_str()),
                    star.map(|s| s.story.as_str()),
                    star.and_then(|s| s.magnitude.as_deref()),
                    star.and_then(|s| s.constellation.as_deref()),
                ],
            )?;

            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_by_height(&self, height: u64) -> Result<Block> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM blocks WHERE height = ?1", BLOCK_COLUMNS),
                params![height as i64],
                row_to_block,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("height {}", height)))
        })
        .await
    }

    async fn get_by_hash(&self, hash: &BlockHash) -> Result<Block> {
        let hash = *hash;
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM blocks WHERE hash = ?1", BLOCK_COLUMNS),
                params![hash.as_bytes().as_slice()],
                row_to_block,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("hash {}", hash)))
        })
        .await
    }

    async fn get_by_address(&self, address: &str) -> Result<Vec<Block>> {
        let address = address.to_string();
        self.run(move |conn| query_blocks(conn, "WHERE address = ?1", params![address]))
            .await
    }

    async fn head_height(&self) -> Result<Option<u64>> {
        self.run(|conn| head_height(conn)).await
    }

    async fn blocks_range(&self, start: u64, end: u64) -> Result<Vec<Block>> {
        // Heights beyond i64 cannot be stored, so clamp rather than wrap.
        let start = i64::try_from(start).unwrap_or(i64::MAX);
        let end = i64::try_from(end).unwrap_or(i64::MAX);
        self.run(move |conn| {
            query_blocks(conn, "WHERE height >= ?1 AND height <= ?2", params![start, end])
        })
        .await
    }
}
