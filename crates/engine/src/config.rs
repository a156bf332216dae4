//! Engine tuning knobs.

/// Timeouts and endpoints used by the engine services.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long an order may stay unpaid before the compensation task is
    /// due (seconds).
    pub unpaid_order_ttl_secs: i64,

    /// Default stock reservation hold (seconds), used when the caller does
    /// not supply one.
    pub reservation_ttl_secs: i64,

    /// Base URL the payment link is built on.
    pub payment_base_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unpaid_order_ttl_secs: 30 * 60,
            reservation_ttl_secs: 15 * 60,
            payment_base_url: "https://pay.example.com/pay".to_string(),
        }
    }
}
