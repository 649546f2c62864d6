//! Remote ledger seam used by the dividend query flow.
//!
//! A [`LedgerConnector`] is shared process-wide and hands every request its own
//! [`RemoteLedgerClient`]. The client owns its connection exclusively for the
//! lifetime of the request and must be closed before the request returns.

use async_trait::async_trait;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 1 TAO = 10^9 RAO
pub const RAO_PER_TAO: u64 = 1_000_000_000;

pub fn rao_to_tao(rao: u64) -> f64 {
    rao as f64 / RAO_PER_TAO as f64
}

/// Every failure of a ledger query (transport, protocol, decode, timeout)
/// collapses into this one kind. The underlying cause is kept for diagnostics.
#[derive(Debug, Error)]
#[error("Error querying TaoDividendsPerSubnet: {cause}")]
pub struct LedgerQueryFailed {
    #[source]
    cause: BoxError,
}

impl LedgerQueryFailed {
    pub fn new(cause: impl Into<BoxError>) -> Self {
        Self {
            cause: cause.into(),
        }
    }

    pub fn timed_out(after: std::time::Duration) -> Self {
        Self::new(format!("ledger query timed out after {}ms", after.as_millis()))
    }

    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }
}

#[async_trait]
pub trait RemoteLedgerClient: Send {
    /// Dividends in TAO for `hotkey` on subnet `netuid`.
    ///
    /// `Ok(None)` means there is no dividend data for the pair (the hotkey is
    /// not an account the ledger can key on). That is a valid outcome, not a failure.
    async fn query_dividends(
        &mut self,
        netuid: u16,
        hotkey: &str,
    ) -> Result<Option<f64>, LedgerQueryFailed>;

    /// Tears down the connection. The next query establishes a fresh one.
    async fn close(&mut self);
}

pub trait LedgerConnector: Send + Sync {
    fn client(&self) -> Box<dyn RemoteLedgerClient>;
}
