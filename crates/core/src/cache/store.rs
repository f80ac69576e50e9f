//! Named response stores.
//!
//! A [`Store`] is a cheap handle: opening one performs no I/O and the backing
//! row is created on the first write. Deleting a store removes every entry it
//! holds through the `ON DELETE CASCADE` foreign key.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::{Error, Request, Response};

/// Name and size of a persisted store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub name: String,
    pub entries: u64,
}

/// Handle on one named store.
#[derive(Clone, Debug)]
pub struct Store {
    db: CacheDb,
    name: Arc<str>,
}

impl CacheDb {
    /// Open a store by name.
    ///
    /// The store becomes durable (and visible to [`CacheDb::store_names`]) on
    /// its first write.
    pub fn open_store(&self, name: &str) -> Store {
        Store { db: self.clone(), name: Arc::from(name) }
    }

    /// Names of all persisted stores, sorted.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Persisted stores with their entry counts, sorted by name.
    pub async fn store_summaries(&self) -> Result<Vec<StoreSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.name, COUNT(e.key_hash)
                     FROM stores s LEFT JOIN entries e ON e.store_name = s.name
                     GROUP BY s.name ORDER BY s.name",
                )?;
                let summaries = stmt
                    .query_map([], |row| {
                        Ok(StoreSummary { name: row.get(0)?, entries: row.get::<_, i64>(1)? as u64 })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries.
    ///
    /// Returns false when no store with that name existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

impl Store {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Most recently written response for the request's target, if any.
    pub async fn get(&self, request: &Request) -> Result<Option<Response>, Error> {
        let name = self.name.to_string();
        let key = compute_request_key(request.target());
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<(u16, String, Vec<u8>)>, Error> {
                let result = conn.query_row(
                    "SELECT status, headers_json, body FROM entries WHERE store_name = ?1 AND key_hash = ?2",
                    params![name, key],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((status, headers_json, body)) = row else {
            return Ok(None);
        };

        let pairs: Vec<(String, Vec<u8>)> =
            serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;

        Response::from_parts(status, &pairs, body).map(Some)
    }

    /// Write a response for the request's target, replacing any previous entry.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        let name = self.name.to_string();
        let key = compute_request_key(request.target());
        let url = request.target().to_string();
        let status = response.status().as_u16();
        let headers_json =
            serde_json::to_string(&response.header_pairs()).map_err(|e| Error::CorruptEntry(e.to_string()))?;
        let body = response.body().to_vec();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![&name, &now],
                )?;
                tx.execute(
                    "INSERT INTO entries (store_name, key_hash, url, status, headers_json, body, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(store_name, key_hash) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![&name, &key, &url, status, &headers_json, &body, &now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> Result<u64, Error> {
        let name = self.name.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store_name = ?1", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}
