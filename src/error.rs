//! Error types for book reconstruction and depth streaming.
//!
//! Clean error handling using `thiserror` for ergonomic error definitions.
//! Every error is reported synchronously from the failing call; the library
//! performs no internal retry and no partial rollback, so a failed apply
//! leaves book state as of the last successfully applied action.

use thiserror::Error;

use crate::types::Side;

/// Result type alias for book operations.
pub type Result<T> = std::result::Result<T, BookError>;

/// Main error type for book and registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    /// Add carried an order ID that is already resting in the book.
    #[error("received duplicated order ID {0}")]
    DuplicateOrderId(u64),

    /// Cancel/Modify referenced an order ID absent from the addressed level.
    #[error("no order with ID {0}")]
    UnknownOrder(u64),

    /// Cancel referenced a price with no live level on that side.
    #[error("received event for unknown {side} level at price {price}")]
    UnknownLevel { side: Side, price: i64 },

    /// Cancel size exceeded the order's resting size.
    #[error("tried to cancel {cancel} of {resting} resting for order ID {order_id}")]
    OverCancel {
        order_id: u64,
        resting: u32,
        cancel: u32,
    },

    /// Modify attempted to move an order to the opposite side.
    #[error("order {0} changed side")]
    SideMismatch(u64),

    /// Raw action byte did not map to a known action.
    #[error("unknown action: {0:#04x}")]
    UnrecognizedAction(u8),

    /// Event side is neither bid nor ask where a direction is required.
    #[error("invalid side: {0:#04x}")]
    InvalidSide(u8),

    /// Query for an (instrument, publisher) pair that has never been seen.
    #[error("no book for instrument ID {instrument_id}, publisher ID {publisher_id}")]
    NoBookForSource {
        instrument_id: u32,
        publisher_id: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BookError::DuplicateOrderId(12345);
        assert_eq!(err.to_string(), "received duplicated order ID 12345");

        let err = BookError::UnknownLevel {
            side: Side::Bid,
            price: 100_000_000_000,
        };
        assert_eq!(
            err.to_string(),
            "received event for unknown bid level at price 100000000000"
        );

        let err = BookError::OverCancel {
            order_id: 7,
            resting: 10,
            cancel: 25,
        };
        assert_eq!(
            err.to_string(),
            "tried to cancel 25 of 10 resting for order ID 7"
        );
    }

    #[test]
    fn test_result_type() {
        let result: Result<i32> = Err(BookError::UnknownOrder(99));
        assert!(result.is_err());
    }
}
