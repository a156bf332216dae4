//! Error taxonomy shared by every engine operation.

use chrono::{DateTime, Utc};
use common::{ProductId, ReserveId};
use thiserror::Error;

/// Errors reported by order, reservation, refund and timeout operations.
///
/// Validation and state-guard failures fail fast with the precise reason.
/// `Internal` covers persistence or collaborator failures with no recovery;
/// degraded-mode collaborator fallbacks never surface here.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Missing or invalid input, correctable by the caller.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The caller does not own the record it is operating on.
    #[error("user {user_id} may not operate on {entity} {id}")]
    Forbidden {
        entity: &'static str,
        id: String,
        user_id: i64,
    },

    /// A state guard rejected the transition: the record has already moved
    /// past the status the operation expected.
    #[error("cannot {action}: current status is {current}")]
    Conflict {
        action: &'static str,
        current: String,
    },

    /// The synchronous stock check failed or reported not enough stock.
    #[error("insufficient stock for product {product_id} (requested {requested})")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
    },

    /// The reservation's expiry passed before it could be confirmed.
    #[error("reservation {reserve_id} expired at {expired_at}")]
    Expired {
        reserve_id: ReserveId,
        expired_at: DateTime<Utc>,
    },

    /// Persistence or collaborator failure with no recovery.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OrderError {
    pub fn validation(message: impl Into<String>) -> Self {
        OrderError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        OrderError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn forbidden(entity: &'static str, id: impl ToString, user_id: common::UserId) -> Self {
        OrderError::Forbidden {
            entity,
            id: id.to_string(),
            user_id: user_id.value(),
        }
    }

    pub fn conflict(action: &'static str, current: impl ToString) -> Self {
        OrderError::Conflict {
            action,
            current: current.to_string(),
        }
    }

    pub fn internal(message: impl ToString) -> Self {
        OrderError::Internal(message.to_string())
    }
}

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserId;

    #[test]
    fn test_messages_carry_the_precise_reason() {
        let err = OrderError::not_found("order", "ORD1");
        assert_eq!(err.to_string(), "order ORD1 not found");

        let err = OrderError::conflict("pay order", "cancelled");
        assert_eq!(err.to_string(), "cannot pay order: current status is cancelled");

        let err = OrderError::forbidden("order", "ORD1", UserId::new(9));
        assert_eq!(err.to_string(), "user 9 may not operate on order ORD1");
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = OrderError::InsufficientStock {
            product_id: ProductId::new(7),
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for product 7 (requested 5)"
        );
    }
}
