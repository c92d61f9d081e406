//! # auto-refresh
//!
//! Periodic re-fetch controller for the garage management desktop app.
//!
//! Views such as an open invoice or a customer card keep their data fresh by
//! handing an async fetch operation to an [`AutoRefresh`] controller and
//! pointing it at whatever identifier is on screen. The controller fires the
//! fetch immediately on start, then once per interval, for as long as it is
//! running.
//!
//! # Features
//!
//! - **Immediate first tick**: a target set before `start` is fetched at once
//! - **Mutable target**: `set_target` takes effect on the next tick
//! - **Wall-clock schedule**: a slow fetch never delays the next tick; fetches
//!   may overlap
//! - **Scoped lifetime**: `stop` or drop guarantees no further ticks
//! - **Sync facade**: [`BlockingAutoRefresh`] for hosts without a runtime
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use auto_refresh::{AutoRefresh, FetchError, RefreshConfig};
//!
//! let mut refresh = AutoRefresh::new(
//!     move |invoice_id: u64| {
//!         let store = store.clone();
//!         async move { store.reload(invoice_id).await.map_err(FetchError::failed) }
//!     },
//!     RefreshConfig::default(),
//! )?;
//!
//! refresh.set_target(1042);
//! refresh.start()?;
//!
//! // The invoice list selects another row
//! refresh.handle().set_target(1043);
//!
//! // View closed
//! refresh.stop().await?;
//! ```

pub mod blocking;
pub mod config;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod handle;
pub mod logging;
pub mod stats;
pub mod target;

pub use blocking::BlockingAutoRefresh;
pub use config::{MissedTick, RefreshConfig, DEFAULT_INTERVAL};
pub use controller::AutoRefresh;
pub use error::{FetchError, RefreshError, Result};
pub use fetch::FetchOperation;
pub use handle::RefreshHandle;
pub use stats::RefreshStats;
pub use target::TargetSlot;
