//! Component wiring and lifecycle.
//!
//! ```no_run
//! use ethpulse_core::{config::AppConfig, runtime::EthpulseRuntime};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let runtime = EthpulseRuntime::builder().with_config(config).build().await?;
//!
//! let pending = runtime.components().pending().pop_n(Some(5));
//! println!("{pending:?}");
//!
//! runtime.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod components;
pub mod lifecycle;

pub use builder::{EthpulseRuntimeBuilder, RuntimeError};
pub use components::EthpulseComponents;
pub use lifecycle::EthpulseRuntime;
