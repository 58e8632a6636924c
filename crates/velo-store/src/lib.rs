//! Cart persistence for VeloCart.
//!
//! The engine persists one cart snapshot per session through the narrow
//! [`CartStore`] contract; whether that lands in memory, device storage,
//! or a remote endpoint is opaque to the core. The bundled
//! [`MemoryCartStore`] is the reference backend used in tests and
//! short-lived sessions.

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryCartStore;
pub use store::CartStore;
