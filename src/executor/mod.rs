mod models;
mod runner;

use async_trait::async_trait;

pub use models::{ApiRequest, ApiResponse, TransportError};
pub use runner::{parse_body, ExecutorOptions, HttpExecutor};

/// Performs exactly one call per invocation.
///
/// Implementations return `Ok` for every HTTP response, 4xx and 5xx
/// included, and reserve `Err` for calls that never produced a response.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[async_trait]
impl<T: RequestExecutor + ?Sized> RequestExecutor for &T {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).execute(request).await
    }
}
