// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis key-value store adapter.
//!
//! This module provides a bounded pool of blocking Redis connections. Each
//! checked-out [`PooledConnection`] implements [`KeyStore`] and goes back to
//! the pool when dropped.

use crate::domain::{ConfmgrError, KeyKind, RedisSettings, Result};
use crate::ports::{KeyStore, StoreProvider};
use redis::{Client, Commands, Connection, ConnectionLike, RedisError};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

const BACKEND: &str = "redis";

/// Idle connections older than this are pinged before reuse.
const PING_AFTER_IDLE: Duration = Duration::from_secs(60);

/// Maps a Redis error onto the crate's error type.
///
/// I/O failures, refused or dropped connections and timeouts are connectivity
/// failures; everything else is an ordinary backend error.
fn redis_error(op: &str, key: &str, err: RedisError) -> ConfmgrError {
    let message = format!("{} {} failed: {}", op, key, err);
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        ConfmgrError::unavailable(BACKEND, message, err)
    } else {
        ConfmgrError::backend(BACKEND, message, err)
    }
}

fn poisoned() -> ConfmgrError {
    ConfmgrError::Backend {
        backend: BACKEND.to_string(),
        message: "Connection pool lock poisoned".to_string(),
        source: None,
    }
}

struct IdleConnection {
    conn: Connection,
    since: Instant,
}

#[derive(Default)]
struct PoolSlots {
    idle: Vec<IdleConnection>,
    // checked-out connections plus connections being opened
    active: usize,
}

struct PoolInner {
    client: Client,
    settings: RedisSettings,
    slots: Mutex<PoolSlots>,
    available: Condvar,
}

impl PoolInner {
    fn lock_slots(&self) -> Result<MutexGuard<'_, PoolSlots>> {
        self.slots.lock().map_err(|_| poisoned())
    }

    fn connect(&self) -> Result<Connection> {
        let timeout = Duration::from_millis(self.settings.connect_timeout_ms);
        self.client
            .get_connection_with_timeout(timeout)
            .map_err(|e| redis_error("CONNECT", &self.settings.url, e))
    }

    /// Returns an idle connection if it is still fit for use.
    fn revive(&self, idle: IdleConnection) -> Option<Connection> {
        let IdleConnection { mut conn, since } = idle;
        let idle_for = since.elapsed();

        if idle_for >= Duration::from_secs(self.settings.idle_timeout_secs) || !conn.is_open() {
            return None;
        }
        if idle_for >= PING_AFTER_IDLE {
            if let Err(e) = redis::cmd("PING").query::<String>(&mut conn) {
                tracing::debug!("Discarding idle Redis connection: {}", e);
                return None;
            }
        }
        Some(conn)
    }

    /// Gives back a slot without returning a connection.
    fn release_slot(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.active = slots.active.saturating_sub(1);
        drop(slots);
        self.available.notify_one();
    }

    fn give_back(&self, conn: Connection) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.active = slots.active.saturating_sub(1);
        if conn.is_open() && slots.idle.len() < self.settings.max_idle {
            slots.idle.push(IdleConnection {
                conn,
                since: Instant::now(),
            });
        }
        drop(slots);
        self.available.notify_one();
    }
}

/// A bounded pool of blocking Redis connections.
///
/// At most `max_active` connections are open at once, and up to `max_idle` of
/// them are kept for reuse. When the pool is exhausted, `checkout` either
/// blocks (optionally up to `wait_timeout_ms`) or fails with
/// [`ConfmgrError::PoolExhausted`], depending on `wait`.
///
/// # Examples
///
/// ```rust,no_run
/// use confmgr::adapters::RedisPool;
/// use confmgr::domain::RedisSettings;
/// use confmgr::ports::{KeyStore, StoreProvider};
///
/// # fn main() -> confmgr::domain::Result<()> {
/// let pool = RedisPool::new(&RedisSettings::default())?;
/// let mut store = pool.checkout()?;
/// let kind = store.probe_kind("cfg:default:db")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisPool {
    inner: Arc<PoolInner>,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("url", &self.inner.settings.url)
            .field("max_active", &self.inner.settings.max_active)
            .field("max_idle", &self.inner.settings.max_idle)
            .finish()
    }
}

impl RedisPool {
    /// Creates a pool for the configured URL.
    ///
    /// No connection is opened until the first checkout.
    pub fn new(settings: &RedisSettings) -> Result<Self> {
        let client = Client::open(settings.url.as_str()).map_err(|e| ConfmgrError::Backend {
            backend: BACKEND.to_string(),
            message: format!("Failed to create Redis client: {}", e),
            source: Some(Box::new(e)),
        })?;

        tracing::info!(
            "Setting up Redis pool for {} (max_active={}, max_idle={})",
            settings.url,
            settings.max_active,
            settings.max_idle
        );

        Ok(Self {
            inner: Arc::new(PoolInner {
                client,
                settings: settings.clone(),
                slots: Mutex::new(PoolSlots::default()),
                available: Condvar::new(),
            }),
        })
    }

    /// Checks out a connection and pings the server.
    pub fn check(&self) -> Result<()> {
        let mut store = self.checkout()?;
        store.ping()
    }

    /// Returns the number of idle connections currently held.
    pub fn idle_count(&self) -> usize {
        self.inner
            .slots
            .lock()
            .map(|slots| slots.idle.len())
            .unwrap_or(0)
    }
}

impl StoreProvider for RedisPool {
    type Store = PooledConnection;

    fn checkout(&self) -> Result<Self::Store> {
        let settings = &self.inner.settings;
        let deadline = settings
            .wait_timeout_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        let mut slots = self.inner.lock_slots()?;

        loop {
            if let Some(idle) = slots.idle.pop() {
                slots.active += 1;
                drop(slots);
                if let Some(conn) = self.inner.revive(idle) {
                    return Ok(PooledConnection::new(conn, Arc::clone(&self.inner)));
                }
                self.inner.release_slot();
                slots = self.inner.lock_slots()?;
                continue;
            }

            if slots.active < settings.max_active {
                slots.active += 1;
                drop(slots);
                return match self.inner.connect() {
                    Ok(conn) => Ok(PooledConnection::new(conn, Arc::clone(&self.inner))),
                    Err(e) => {
                        self.inner.release_slot();
                        Err(e)
                    }
                };
            }

            if !settings.wait {
                return Err(ConfmgrError::PoolExhausted {
                    max_active: settings.max_active,
                });
            }

            slots = match deadline {
                None => self.inner.available.wait(slots).map_err(|_| poisoned())?,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(ConfmgrError::PoolExhausted {
                            max_active: settings.max_active,
                        });
                    }
                    let (guard, _) = self
                        .inner
                        .available
                        .wait_timeout(slots, deadline - now)
                        .map_err(|_| poisoned())?;
                    guard
                }
            };
        }
    }
}

/// A Redis connection checked out of a [`RedisPool`].
///
/// The connection returns to the pool when this value is dropped.
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
}

impl PooledConnection {
    fn new(conn: Connection, pool: Arc<PoolInner>) -> Self {
        Self {
            conn: Some(conn),
            pool,
        }
    }

    fn conn(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or_else(|| ConfmgrError::BackendUnavailable {
            backend: BACKEND.to_string(),
            message: "Connection already returned to the pool".to_string(),
            source: None,
        })
    }

    /// Sends `PING` to the server.
    pub fn ping(&mut self) -> Result<()> {
        let conn = self.conn()?;
        redis::cmd("PING")
            .query::<String>(conn)
            .map(|_| ())
            .map_err(|e| redis_error("PING", "", e))
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        match self.conn.take() {
            Some(conn) => self.pool.give_back(conn),
            None => self.pool.release_slot(),
        }
    }
}

impl KeyStore for PooledConnection {
    fn name(&self) -> &str {
        BACKEND
    }

    fn probe_kind(&mut self, key: &str) -> Result<KeyKind> {
        let conn = self.conn()?;
        let kind: String = redis::cmd("TYPE")
            .arg(key)
            .query(conn)
            .map_err(|e| redis_error("TYPE", key, e))?;

        kind.parse().map_err(|_| ConfmgrError::UnsupportedKeyType {
            key: key.to_string(),
            kind,
        })
    }

    fn exists(&mut self, key: &str) -> Result<bool> {
        self.conn()?
            .exists(key)
            .map_err(|e| redis_error("EXISTS", key, e))
    }

    fn get_scalar(&mut self, key: &str) -> Result<String> {
        self.conn()?.get(key).map_err(|e| redis_error("GET", key, e))
    }

    fn set_scalar(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn()?
            .set(key, value)
            .map_err(|e| redis_error("SET", key, e))
    }

    fn get_hash(&mut self, key: &str) -> Result<HashMap<String, String>> {
        self.conn()?
            .hgetall(key)
            .map_err(|e| redis_error("HGETALL", key, e))
    }

    fn set_hash(&mut self, key: &str, fields: &HashMap<String, String>) -> Result<()> {
        let conn = self.conn()?;
        let items: Vec<(&str, &str)> = fields
            .iter()
            .map(|(f, v)| (f.as_str(), v.as_str()))
            .collect();

        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if !items.is_empty() {
            pipe.hset_multiple(key, &items[..]).ignore();
        }
        pipe.query(conn).map_err(|e| redis_error("HSET", key, e))
    }

    fn get_hash_field(&mut self, key: &str, field: &str) -> Result<String> {
        self.conn()?
            .hget(key, field)
            .map_err(|e| redis_error("HGET", key, e))
    }

    fn set_hash_field(&mut self, key: &str, field: &str, value: &str) -> Result<()> {
        match self.probe_kind(key)? {
            KeyKind::NotFound | KeyKind::Hash => self
                .conn()?
                .hset(key, field, value)
                .map_err(|e| redis_error("HSET", key, e)),
            other => Err(ConfmgrError::Backend {
                backend: BACKEND.to_string(),
                message: format!("Cannot set field {} on {} key {}", field, other, key),
                source: None,
            }),
        }
    }

    fn hash_field_exists(&mut self, key: &str, field: &str) -> Result<bool> {
        self.conn()?
            .hexists(key, field)
            .map_err(|e| redis_error("HEXISTS", key, e))
    }

    fn get_list(&mut self, key: &str) -> Result<Vec<String>> {
        self.conn()?
            .lrange(key, 0, -1)
            .map_err(|e| redis_error("LRANGE", key, e))
    }

    fn set_list(&mut self, key: &str, entries: &[String]) -> Result<()> {
        let conn = self.conn()?;
        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        if !entries.is_empty() {
            pipe.rpush(key, entries.to_vec()).ignore();
        }
        pipe.query(conn).map_err(|e| redis_error("RPUSH", key, e))
    }

    fn append_list(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn()?
            .rpush(key, value)
            .map_err(|e| redis_error("RPUSH", key, e))
    }

    fn delete_key(&mut self, key: &str) -> Result<()> {
        self.conn()?.del(key).map_err(|e| redis_error("DEL", key, e))
    }

    fn list_keys(&mut self, filter: &str) -> Result<Vec<String>> {
        let filter = if filter.is_empty() { "*" } else { filter };
        let mut keys: Vec<String> = self
            .conn()?
            .keys(filter)
            .map_err(|e| redis_error("KEYS", filter, e))?;
        keys.sort();
        Ok(keys)
    }
}
