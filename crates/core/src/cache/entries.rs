//! Stored response entries and bucket operations.
//!
//! An entry is one cached HTTP response, addressed by (bucket, key) where
//! the key is derived from the request (see [`super::hash`]). Buckets are
//! plain strings like `static-v6`; the storage layer applies no policy of
//! its own. Which responses get stored, and into which bucket, is decided
//! entirely by the caller.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use crate::error::Error;

/// A cached HTTP response as held in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResponse {
    /// HTTP status code of the stored response.
    pub status: u16,
    /// Response headers as ordered name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Raw response body bytes.
    pub body: Vec<u8>,
    /// RFC 3339 timestamp of when the response was stored.
    pub stored_at: String,
}

impl StoredResponse {
    /// Build a stored response stamped with the current time.
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn headers_to_json(headers: &[(String, String)]) -> Result<String, Error> {
    serde_json::to_string(headers).map_err(|e| Error::InvalidInput(format!("unserializable headers: {e}")))
}

fn headers_from_json(json: &str) -> Result<Vec<(String, String)>, Error> {
    serde_json::from_str(json).map_err(|e| Error::InvalidInput(format!("corrupt stored headers: {e}")))
}

impl CacheDb {
    /// Insert or update one entry in a bucket.
    ///
    /// Uses UPSERT semantics: re-storing an existing (bucket, key) pair
    /// updates the row in place, keeping its original insertion position.
    /// Eviction order is therefore by first insertion, not most recent
    /// update.
    pub async fn put_entry(
        &self,
        bucket: &str,
        key: &str,
        method: &str,
        url: &str,
        response: &StoredResponse,
    ) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        let method = method.to_string();
        let url = url.to_string();
        let headers_json = headers_to_json(&response.headers)?;
        let status = response.status;
        let body = response.body.clone();
        let stored_at = response.stored_at.clone();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        bucket, key, method, url, status, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(bucket, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![bucket, key, method, url, status, headers_json, body, stored_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert a batch of entries into a bucket in one transaction.
    ///
    /// Either every entry lands or none does. Used by precaching, where a
    /// partially populated bucket must never be observable.
    pub async fn put_all(
        &self,
        bucket: &str,
        entries: Vec<(String, String, String, StoredResponse)>,
    ) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let mut rows = Vec::with_capacity(entries.len());
        for (key, method, url, response) in entries {
            let headers_json = headers_to_json(&response.headers)?;
            rows.push((key, method, url, response.status, headers_json, response.body, response.stored_at));
        }

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for (key, method, url, status, headers_json, body, stored_at) in rows {
                    tx.execute(
                        "INSERT INTO entries (
                            bucket, key, method, url, status, headers_json, body, stored_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                        ON CONFLICT(bucket, key) DO UPDATE SET
                            method = excluded.method,
                            url = excluded.url,
                            status = excluded.status,
                            headers_json = excluded.headers_json,
                            body = excluded.body,
                            stored_at = excluded.stored_at",
                        params![bucket, key, method, url, status, headers_json, body, stored_at],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get one entry by bucket and key.
    ///
    /// Returns None on a miss.
    pub async fn match_entry(&self, bucket: &str, key: &str) -> Result<Option<StoredResponse>, Error> {
        let bucket = bucket.to_string();
        let key = key.to_string();

        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let result = conn.query_row(
                    "SELECT status, headers_json, body, stored_at
                     FROM entries WHERE bucket = ?1 AND key = ?2",
                    params![bucket, key],
                    |row| {
                        Ok((
                            row.get::<_, u16>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Vec<u8>>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                );

                match result {
                    Ok((status, headers_json, body, stored_at)) => Ok(Some(StoredResponse {
                        status,
                        headers: headers_from_json(&headers_json)?,
                        body,
                        stored_at,
                    })),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look a key up across several buckets, in the given order.
    ///
    /// Returns the first hit. Used for fallback lookups where a response
    /// may live in any of the current version's buckets.
    pub async fn match_any(&self, buckets: &[String], key: &str) -> Result<Option<StoredResponse>, Error> {
        for bucket in buckets {
            if let Some(found) = self.match_entry(bucket, key).await? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// List entry keys in a bucket, oldest first.
    pub async fn entry_keys(&self, bucket: &str) -> Result<Vec<String>, Error> {
        let bucket = bucket.to_string();

        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT key FROM entries WHERE bucket = ?1 ORDER BY id ASC")?;
                let keys = stmt
                    .query_map(params![bucket], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Count entries in a bucket.
    pub async fn count_entries(&self, bucket: &str) -> Result<u64, Error> {
        let bucket = bucket.to_string();

        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE bucket = ?1",
                    params![bucket],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry. Returns whether a row was removed.
    pub async fn delete_entry(&self, bucket: &str, key: &str) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        let key = key.to_string();

        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let changed = conn.execute(
                    "DELETE FROM entries WHERE bucket = ?1 AND key = ?2",
                    params![bucket, key],
                )?;
                Ok(changed > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List every bucket name that currently holds at least one entry.
    pub async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT bucket FROM entries ORDER BY bucket")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a whole bucket. Returns the number of entries removed.
    pub async fn delete_bucket(&self, bucket: &str) -> Result<u64, Error> {
        let bucket = bucket.to_string();

        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let removed = conn.execute("DELETE FROM entries WHERE bucket = ?1", params![bucket])?;
                Ok(removed as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Trim a bucket down to `cap` entries, evicting the oldest first.
    ///
    /// Returns the number of entries evicted. Age is insertion order, so
    /// an entry refreshed by re-storing keeps its original position in the
    /// eviction queue.
    pub async fn trim_bucket(&self, bucket: &str, cap: u64) -> Result<u64, Error> {
        let bucket = bucket.to_string();

        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE bucket = ?1",
                    params![bucket],
                    |row| row.get(0),
                )?;
                let excess = count - cap as i64;
                if excess <= 0 {
                    return Ok(0);
                }

                let evicted = conn.execute(
                    "DELETE FROM entries WHERE id IN (
                        SELECT id FROM entries WHERE bucket = ?1 ORDER BY id ASC LIMIT ?2
                    )",
                    params![bucket, excess],
                )?;
                Ok(evicted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
