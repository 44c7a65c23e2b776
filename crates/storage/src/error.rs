//! SQLx-to-domain error mapping.
//!
//! | SQLx error | PostgreSQL code | DomainError | Scenario |
//! |------------|-----------------|-------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate sku, email, application, or cart line |
//! | Database (foreign key violation) | `23503` | `Consistency` | Referenced row missing (account or product deleted underneath) |
//! | Database (check constraint violation) | `23514` | `Consistency` | Negative quantity/counter slipped past domain validation |
//! | Database (other) | any | `Consistency` | Other database errors |
//! | PoolClosed | n/a | `Consistency` | Connection pool was shut down |
//! | RowNotFound | n/a | `Consistency` | Unexpected empty result (queries use fetch_optional/fetch_all) |
//! | Other | n/a | `Consistency` | Network errors, connection failures, etc. |

use mercora_core::DomainError;

/// Map SQLx errors to `DomainError`.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            if let Some(code) = db_err.code() {
                match code.as_ref() {
                    "23505" => DomainError::conflict(msg),
                    "23503" => DomainError::consistency(msg),
                    "23514" => DomainError::consistency(msg),
                    _ => DomainError::consistency(msg),
                }
            } else {
                DomainError::consistency(msg)
            }
        }
        sqlx::Error::PoolClosed => {
            DomainError::consistency(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::RowNotFound => {
            DomainError::consistency(format!("unexpected row not found in {}", operation))
        }
        _ => DomainError::consistency(format!("sqlx error in {}: {}", operation, err)),
    }
}
