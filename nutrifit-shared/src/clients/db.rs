use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};

use crate::errors::{AppError, ErrorCode};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Builds the connection pool and opens the first connections eagerly.
pub fn create_pool(database_url: &str, max_size: u32) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .min_idle(Some(max_size.min(2)))
        .test_on_check_out(true)
        .build(manager)?;

    tracing::info!(max_size, "database connection pool created");
    Ok(pool)
}

/// Builds a pool without connecting; connections are opened on first checkout.
pub fn create_lazy_pool(database_url: &str, max_size: u32, timeout: Duration) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size)
        .min_idle(Some(0))
        .connection_timeout(timeout)
        .build_unchecked(manager)
}

/// Checks a connection out of the pool. A pool that cannot hand one out answers 503.
pub fn conn(pool: &DbPool) -> Result<DbConn, AppError> {
    pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::new(ErrorCode::ServiceUnavailable, "database unavailable")
    })
}

/// Escapes `%`, `_` and the backslash so user input matches literally in
/// `LIKE`/`ILIKE`, whose default escape character is the backslash.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `ILIKE` pattern matching `term` anywhere in the column.
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(escape_like("100%_legs"), "100\\%\\_legs");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("squat"), "squat");
    }

    #[test]
    fn contains_pattern_wraps_escaped_term() {
        assert_eq!(contains_pattern("%"), "%\\%%");
        assert_eq!(contains_pattern("press"), "%press%");
    }
}
