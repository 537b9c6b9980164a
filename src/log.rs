//! Logging shims for graph construction and rendering.
//!
//! With the `tracing` feature these are the `tracing` macros. Without it,
//! `debug!` and `warn!` swallow their arguments and compile to nothing, so
//! call sites never need their own `cfg` guards.

#[cfg(feature = "tracing")]
pub use tracing::{debug, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! __graph_debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! __graph_warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub use crate::{__graph_debug as debug, __graph_warn as warn};
