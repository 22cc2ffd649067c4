//! Contracts for the engine's external collaborators and their concrete
//! adapters.

pub mod telegram;
pub mod yahoo;

use crate::error::{DeliveryError, FetchError};
use crate::monitor::types::{PriceSeries, SamplingInterval, Symbol};
use async_trait::async_trait;

/// Supplies a short price series for one symbol per tick.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Must fail on network errors, empty results and series with fewer than
    /// two samples.
    async fn fetch(
        &self,
        symbol: &Symbol,
        interval: SamplingInterval,
    ) -> Result<PriceSeries, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    Plain,
    /// HTML markup understood by the channel.
    Rich,
}

/// Single outbound notification channel.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, text: &str, format: MessageFormat) -> Result<(), DeliveryError>;

    /// Connectivity check run once when the engine starts.
    async fn self_test(&self) -> Result<(), DeliveryError>;
}
