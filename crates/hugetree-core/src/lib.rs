//! Core systems for hugetree.
//!
//! This crate provides the ambient infrastructure shared by the hugetree
//! engine:
//!
//! - **Errors**: the [`Error`] enum and [`Result`] alias for the few
//!   operations that can be rejected up front
//! - **Logging**: tracing targets, perf spans and tree dump formatting options
//! - **Signal/Slot System**: direct-dispatch change notifications
//!
//! # Signal/Slot Example
//!
//! ```
//! use hugetree_core::Signal;
//!
//! // Announce which row was toggled
//! let row_toggled = Signal::<u32>::new();
//!
//! let conn_id = row_toggled.connect(|row| {
//!     println!("Row toggled: {}", row);
//! });
//!
//! row_toggled.emit(42);
//! row_toggled.disconnect(conn_id);
//! ```

pub mod error;
pub mod logging;
pub mod signal;

pub use error::{Error, Result};
pub use logging::{PerfSpan, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
