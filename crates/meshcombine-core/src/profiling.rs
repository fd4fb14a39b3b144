//! Profiling utilities based on the `puffin` crate.
//!
//! With the `profiling` feature disabled, [`profile_function!`] and
//! [`profile_scope!`] expand to nothing and [`init_profiling`] only logs.

#[cfg(feature = "profiling")]
use std::sync::OnceLock;

#[cfg(feature = "profiling")]
pub use puffin::{profile_function, profile_scope};

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_function {
    () => {};
    ($data:expr) => {};
}

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {};
    ($name:expr, $data:expr) => {};
}

#[cfg(not(feature = "profiling"))]
pub use crate::{profile_function, profile_scope};

/// Default address for the puffin HTTP server.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8585";

#[cfg(feature = "profiling")]
static PROFILING_SERVER: OnceLock<puffin_http::Server> = OnceLock::new();

/// Enable puffin scopes and start the HTTP server on `addr`.
///
/// # Example
/// ```no_run
/// use meshcombine_core::profiling::{init_profiling, DEFAULT_SERVER_ADDR};
///
/// init_profiling(DEFAULT_SERVER_ADDR);
/// ```
#[cfg(feature = "profiling")]
pub fn init_profiling(addr: &str) {
    puffin::set_scopes_on(true);

    match puffin_http::Server::new(addr) {
        Ok(server) => {
            tracing::info!("Puffin profiler server started on http://{}", addr);
            let _ = PROFILING_SERVER.set(server);
        }
        Err(e) => {
            tracing::error!("Failed to start puffin server: {}", e);
        }
    }
}

#[cfg(not(feature = "profiling"))]
pub fn init_profiling(addr: &str) {
    tracing::warn!("Profiling requested on {} but the `profiling` feature is disabled", addr);
}

/// Mark the start of a new profiling frame.
///
/// Call once per host frame, before driving any combine steps.
#[inline]
pub fn new_frame() {
    #[cfg(feature = "profiling")]
    puffin::GlobalProfiler::lock().new_frame();
}
