//! Per-call request/response hooks installed by capabilities.

use crate::error::BoxError;
use crate::transport::{HttpRequest, HttpResponse};

/// Hook run around every transport exchange.
///
/// Interceptors run in installation order on the way out and in the same
/// order on the way back. An error aborts the call.
pub trait Interceptor: Send + Sync + 'static {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Inspect or modify the outbound request.
    fn on_request(&self, _request: &mut HttpRequest) -> Result<(), BoxError> {
        Ok(())
    }

    /// Inspect the inbound response.
    fn on_response(&self, _response: &HttpResponse) -> Result<(), BoxError> {
        Ok(())
    }
}
