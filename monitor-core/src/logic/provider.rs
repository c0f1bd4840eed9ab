//! State Provider - The external source of snapshots
//!
//! The engine only consumes this trait; where the numbers come from is the
//! caller's business.

use async_trait::async_trait;

use crate::logic::error::ProviderError;
use crate::logic::state::StateVector;

#[async_trait]
pub trait StateProvider: Send + Sync {
    /// Produce the current snapshot. The dimension set must stay the same
    /// for the whole session.
    async fn get_current_state(&self) -> Result<StateVector, ProviderError>;
}

/// Adapter turning a synchronous closure into a provider
pub struct FnProvider<F> {
    f: F,
}

impl<F> FnProvider<F>
where
    F: Fn() -> Result<StateVector, ProviderError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> StateProvider for FnProvider<F>
where
    F: Fn() -> Result<StateVector, ProviderError> + Send + Sync,
{
    async fn get_current_state(&self) -> Result<StateVector, ProviderError> {
        (self.f)()
    }
}
