//! Query history store
//!
//! Every query request writes one row into the `metadata` table of the
//! metadata store before the target query runs. The row carries the stamp
//! that also names the query's archive directory.

use crate::dialect::Dialect;
use crate::error::Result;
use crate::executor::QueryExecutor;
use sqldesk_core::{ConnectionAddress, QueryResult, SqlValue};
use std::sync::{Arc, Mutex, MutexGuard};

/// Timestamp of one query, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueryStamp {
    /// Unix seconds
    pub ts: i64,
    /// Position among queries stamped in the same second
    pub seq: u32,
}

impl QueryStamp {
    /// Archive directory name: `query_<ts>`, or `query_<ts>_<seq>` after the
    /// first query of a second
    pub fn archive_name(&self) -> String {
        if self.seq == 0 {
            format!("query_{}", self.ts)
        } else {
            format!("query_{}_{}", self.ts, self.seq)
        }
    }

    /// Inverse of [`QueryStamp::archive_name`]
    pub fn from_archive_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix("query_")?;
        let (ts, seq) = match rest.split_once('_') {
            Some((ts, seq)) => (ts, seq.parse().ok()?),
            None => (rest, 0),
        };
        Some(Self {
            ts: ts.parse().ok()?,
            seq,
        })
    }
}

/// Hands out strictly increasing stamps
#[derive(Debug, Default)]
pub struct StampClock {
    last: Mutex<Option<QueryStamp>>,
}

impl StampClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp for the current wall-clock second
    pub fn next(&self) -> QueryStamp {
        self.next_at(chrono::Utc::now().timestamp())
    }

    /// Stamp for second `now`; never goes backwards even if the clock does
    pub fn next_at(&self, now: i64) -> QueryStamp {
        let mut last = self.lock();

        let stamp = match *last {
            Some(prev) if now <= prev.ts => QueryStamp {
                ts: prev.ts,
                seq: prev.seq + 1,
            },
            _ => QueryStamp { ts: now, seq: 0 },
        };
        *last = Some(stamp);
        stamp
    }

    /// Make every later stamp sort after `stamp`
    pub fn observe(&self, stamp: QueryStamp) {
        let mut last = self.lock();
        if last.map_or(true, |prev| stamp > prev) {
            *last = Some(stamp);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<QueryStamp>> {
        match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Writes and reads query history through the executor's metadata address
#[derive(Debug)]
pub struct MetadataRecorder {
    executor: Arc<QueryExecutor>,
    dialect: Dialect,
    clock: StampClock,
}

impl MetadataRecorder {
    /// Create a recorder; fails if the metadata address has no driver
    pub fn new(executor: Arc<QueryExecutor>) -> Result<Self> {
        let dialect = executor.metadata_dialect()?;
        Ok(Self {
            executor,
            dialect,
            clock: StampClock::new(),
        })
    }

    /// Continue stamping after `stamp`, e.g. the newest archive left by an
    /// earlier run
    pub fn resume_after(&self, stamp: QueryStamp) {
        self.clock.observe(stamp);
    }

    /// Create the `metadata` table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        self.executor
            .execute_metadata_query(&self.dialect.create_metadata_table_sql(), &[])
            .await?;
        tracing::info!(
            "✓ Metadata store ready at {}",
            self.executor.registry().metadata()
        );
        Ok(())
    }

    /// Record one query attempt against `target` and return its stamp
    pub async fn record_query(&self, target: &ConnectionAddress, query: &str) -> Result<QueryStamp> {
        let stamp = self.clock.next();
        let sql = format!(
            "INSERT INTO metadata (query, ts, {}, archive) VALUES ({}, {}, {}, {})",
            self.dialect.quote_ident("connectionUrl"),
            self.dialect.placeholder(1),
            self.dialect.placeholder(2),
            self.dialect.placeholder(3),
            self.dialect.placeholder(4),
        );
        let params = [
            SqlValue::from(query),
            SqlValue::Integer(stamp.ts),
            SqlValue::from(target.as_str()),
            SqlValue::Text(stamp.archive_name()),
        ];

        self.executor.execute_metadata_query(&sql, &params).await?;
        tracing::debug!("Recorded query {} for {}", stamp.archive_name(), target);
        Ok(stamp)
    }

    /// History rows for `target`, newest first
    ///
    /// Columns are `id, query, ts, connectionUrl, archive`.
    pub async fn history(&self, target: &ConnectionAddress) -> Result<QueryResult> {
        let url = self.dialect.quote_ident("connectionUrl");
        let sql = format!(
            "SELECT id, query, ts, {url}, archive FROM metadata \
             WHERE {url} = {} ORDER BY ts DESC, id DESC",
            self.dialect.placeholder(1),
            url = url
        );
        self.executor
            .execute_metadata_query(&sql, &[SqlValue::from(target.as_str())])
            .await
    }
}
