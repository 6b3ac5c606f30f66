//! Adapters for the domain ports: the marketplace HTTP API, the Stripe
//! processor, and the credential stores.

pub mod file_store;
pub mod http;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod stripe;
