//! SQLite-backed ledger grid for single-host deployments.
//!
//! This module is feature-gated behind `sqlite-persistence`. The grid lives
//! in one table of cells keyed by `(row_no, col_no)`; rows are provisioned by
//! operators (or [`SqliteRowStore::provision_row`]) before the service starts.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::error::LedgerError;
use super::store::{check_coordinates, last_header_column, RowStore};

fn map_read_err(prefix: &str, err: impl std::fmt::Display) -> LedgerError {
    LedgerError::Unavailable(format!("{prefix}: {err}"))
}

fn map_write_err(prefix: &str, err: impl std::fmt::Display) -> LedgerError {
    LedgerError::Write(format!("{prefix}: {err}"))
}

#[derive(Clone)]
pub struct SqliteRowStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRowStore {
    pub fn new(db_path: &str) -> Result<Self, LedgerError> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| map_read_err("create parent dir", e))?;
            }
        }
        let conn = Connection::open(db_path).map_err(|e| map_read_err("open sqlite ledger", e))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| map_read_err("set journal_mode", e))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let conn =
            Connection::open_in_memory().map_err(|e| map_read_err("open sqlite ledger", e))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, LedgerError> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::unavailable("sqlite ledger lock poisoned"))
    }

    fn ensure_schema(&self) -> Result<(), LedgerError> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS ledger_cells (
              row_no INTEGER NOT NULL,
              col_no INTEGER NOT NULL,
              value TEXT NOT NULL,
              PRIMARY KEY (row_no, col_no)
            );
            "#,
        )
        .map_err(|e| map_read_err("init sqlite ledger schema", e))?;
        Ok(())
    }

    fn max_row(conn: &Connection) -> Result<usize, LedgerError> {
        let max: i64 = conn
            .query_row("SELECT COALESCE(MAX(row_no), 0) FROM ledger_cells", [], |r| {
                r.get(0)
            })
            .map_err(|e| map_read_err("read ledger height", e))?;
        Ok(max as usize)
    }

    /// Appends a data row (or the header, on an empty ledger) after the last
    /// occupied row and returns its 1-based row number. Provisioning helper;
    /// the service itself never adds rows.
    pub fn provision_row(&self, values: &[&str]) -> Result<usize, LedgerError> {
        if values.is_empty() {
            return Err(LedgerError::write("provisioned row needs at least one cell"));
        }
        let mut conn = self.lock()?;
        let row_no = Self::max_row(&conn)? + 1;
        let tx = conn
            .transaction()
            .map_err(|e| map_write_err("begin tx", e))?;
        for (idx, value) in values.iter().enumerate() {
            tx.execute(
                "INSERT INTO ledger_cells (row_no, col_no, value) VALUES (?1, ?2, ?3)",
                params![row_no as i64, (idx + 1) as i64, value],
            )
            .map_err(|e| map_write_err("insert provisioned cell", e))?;
        }
        tx.commit().map_err(|e| map_write_err("commit tx", e))?;
        Ok(row_no)
    }

    /// Runs `op` against the connection on tokio's blocking pool.
    async fn blocking<T, F>(&self, op: F) -> Result<T, LedgerError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, LedgerError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| LedgerError::unavailable("sqlite ledger lock poisoned"))?;
            op(&guard)
        })
        .await
        .map_err(|e| map_read_err("sqlite ledger task", e))?
    }
}

fn read_grid(conn: &Connection) -> Result<Vec<Vec<String>>, LedgerError> {
    let height = SqliteRowStore::max_row(conn)?;
    let mut grid: Vec<Vec<String>> = vec![Vec::new(); height];
    let mut stmt = conn
        .prepare("SELECT row_no, col_no, value FROM ledger_cells ORDER BY row_no, col_no")
        .map_err(|e| map_read_err("prepare read grid", e))?;
    let cells = stmt
        .query_map([], |r| {
            Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?, r.get::<_, String>(2)?))
        })
        .map_err(|e| map_read_err("query grid", e))?;
    for cell in cells {
        let (row_no, col_no, value) = cell.map_err(|e| map_read_err("decode cell", e))?;
        if row_no < 1 || col_no < 1 {
            continue;
        }
        let row = &mut grid[row_no as usize - 1];
        let col = col_no as usize;
        if row.len() < col {
            row.resize(col, String::new());
        }
        row[col - 1] = value;
    }
    Ok(grid)
}

fn read_header_cells(conn: &Connection) -> Result<Vec<String>, LedgerError> {
    let mut stmt = conn
        .prepare("SELECT col_no, value FROM ledger_cells WHERE row_no = 1 ORDER BY col_no")
        .map_err(|e| map_read_err("prepare read header", e))?;
    let mut header: Vec<String> = Vec::new();
    let cells = stmt
        .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))
        .map_err(|e| map_read_err("query header", e))?;
    for cell in cells {
        let (col_no, value) = cell.map_err(|e| map_read_err("decode header cell", e))?;
        if col_no < 1 {
            continue;
        }
        let col = col_no as usize;
        if header.len() < col {
            header.resize(col, String::new());
        }
        header[col - 1] = value;
    }
    Ok(header)
}

#[async_trait]
impl RowStore for SqliteRowStore {
    async fn read_all_rows(&self) -> Result<Vec<Vec<String>>, LedgerError> {
        self.blocking(read_grid).await
    }

    async fn read_header(&self) -> Result<Vec<String>, LedgerError> {
        self.blocking(read_header_cells).await
    }

    async fn read_cell(&self, row: usize, col: usize) -> Result<String, LedgerError> {
        check_coordinates(row, col)?;
        self.blocking(move |conn| {
            let value: Option<String> = conn
                .query_row(
                    "SELECT value FROM ledger_cells WHERE row_no = ?1 AND col_no = ?2",
                    params![row as i64, col as i64],
                    |r| r.get(0),
                )
                .optional()
                .map_err(|e| map_read_err("read cell", e))?;
            Ok(value.unwrap_or_default())
        })
        .await
    }

    async fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<(), LedgerError> {
        check_coordinates(row, col)?;
        let value = value.to_string();
        self.blocking(move |conn| {
            if row > Self::max_row(conn)? {
                return Err(LedgerError::InvalidCell { row, col });
            }
            conn.execute(
                "INSERT INTO ledger_cells (row_no, col_no, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT (row_no, col_no) DO UPDATE SET value = excluded.value",
                params![row as i64, col as i64, value],
            )
            .map_err(|e| map_write_err("update cell", e))?;
            Ok(())
        })
        .await
    }

    async fn append_column(&self, name: &str) -> Result<usize, LedgerError> {
        let name = name.to_string();
        self.blocking(move |conn| {
            let col = last_header_column(&read_header_cells(conn)?) + 1;
            conn.execute(
                "INSERT INTO ledger_cells (row_no, col_no, value) VALUES (1, ?1, ?2)
                 ON CONFLICT (row_no, col_no) DO UPDATE SET value = excluded.value",
                params![col as i64, name],
            )
            .map_err(|e| map_write_err("append header column", e))?;
            Ok(col)
        })
        .await
    }
}
