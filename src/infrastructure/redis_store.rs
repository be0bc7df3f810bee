use std::time::Duration;

use redis::Commands;

use crate::db::RedisPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::EphemeralStore;

impl From<redis::RedisError> for DomainError {
    fn from(e: redis::RedisError) -> Self {
        DomainError::Internal(format!("redis: {e}"))
    }
}

/// Ephemeral store on a shared Redis. Parties and carts outlive a restart and are visible to
/// every instance behind the same Redis.
pub struct RedisEphemeralStore {
    pool: RedisPool,
}

impl RedisEphemeralStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

/// Redis rejects a zero expiry, so sub-millisecond lifetimes round up.
fn millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl EphemeralStore for RedisEphemeralStore {
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        match ttl {
            Some(ttl) => redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("PX")
                .arg(millis(ttl))
                .query::<()>(&mut *conn)?,
            None => conn.set::<_, _, ()>(key, value)?,
        }
        Ok(())
    }

    fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(millis(ttl));
        }
        // Nil reply when the key already exists.
        let reply: Option<String> = cmd.query(&mut *conn)?;
        Ok(reply.is_some())
    }

    fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(conn.get(key)?)
    }

    fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let removed: usize = conn.del(key)?;
        Ok(removed > 0)
    }

    fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(conn.exists(key)?)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let applied: bool = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(millis(ttl))
            .query(&mut *conn)?;
        Ok(applied)
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let mut conn = self.pool.get()?;
        // -2 for a missing key, -1 for a key without expiry.
        let remaining: i64 = redis::cmd("PTTL").arg(key).query(&mut *conn)?;
        Ok(u64::try_from(remaining).ok().map(Duration::from_millis))
    }

    fn list_push(&self, key: &str, value: String) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(conn.rpush(key, value)?)
    }

    fn list_range(&self, key: &str) -> Result<Vec<String>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(conn.lrange(key, 0, -1)?)
    }

    fn list_remove(&self, key: &str, value: &str, count: usize) -> Result<usize, DomainError> {
        // LREM treats a count of 0 as "every occurrence".
        if count == 0 {
            return Ok(0);
        }
        let mut conn = self.pool.get()?;
        let count = isize::try_from(count).unwrap_or(isize::MAX);
        Ok(conn.lrem(key, count, value)?)
    }

    fn list_len(&self, key: &str) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(conn.llen(key)?)
    }
}
