//! Order lifecycle and compensation engine.
//!
//! Four services cooperate over the record stores without any cross-store
//! transaction:
//!
//! - [`OrderLifecycle`] owns order state transitions and totals;
//! - [`ReservationTracker`] manages time-bounded stock holds;
//! - [`TimeoutDispatcher`] replays compensating actions for due timeout
//!   tasks handed in by an external scheduler;
//! - [`RefundWorkflow`] layers the apply/approve/reject flow on top of
//!   paid orders.
//!
//! Consistency comes from conditional status transitions at the store
//! layer: every mutation names the statuses it expects and loses cleanly
//! with `Conflict` once the record has moved on. Fire-and-forget side
//! effects (reservation creation, timeout scheduling and cleanup) go
//! through the [`TaskSpawner`] seam and never fail their parent operation.

pub mod background;
pub mod clients;
pub mod config;
pub mod ids;
pub mod lifecycle;
pub mod refund;
pub mod reservation;
pub mod timeout;

pub use background::{BoxedTask, QueuedSpawner, TaskSpawner, TokioSpawner};
pub use clients::{
    ClientError, InMemoryProductCatalog, InMemoryUserDirectory, ProductCatalog, ProductInfo,
    UserDirectory, UserInfo,
};
pub use config::EngineConfig;
pub use lifecycle::{NewOrder, NewOrderItem, OrderDetail, OrderLifecycle, OrderReceipt, OrderStats};
pub use refund::{RefundDecision, RefundWorkflow};
pub use reservation::ReservationTracker;
pub use timeout::{TimeoutDispatcher, TimeoutReport};

use domain::OrderError;
use store::StoreError;

/// Maps a store failure from a conditional transition into the engine
/// taxonomy, naming the operation that lost.
pub(crate) fn map_transition_err(
    err: StoreError,
    action: &'static str,
    entity: &'static str,
    id: &str,
) -> OrderError {
    match err {
        StoreError::NotFound(_) => OrderError::not_found(entity, id),
        StoreError::StaleStatus { actual, .. } => OrderError::conflict(action, actual),
        StoreError::Duplicate(key) => OrderError::internal(format!("duplicate key: {key}")),
    }
}
