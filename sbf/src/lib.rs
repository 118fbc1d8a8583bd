//! A scalable bloom filter whose bits live entirely in a remote key/value
//! store (see `Store`). This crate owns the binary layout, the frame
//! geometry arithmetic, the growth protocol and the hash-to-bit mapping;
//! the store itself — persistence, replication, connection management,
//! wire framing — is someone else's problem, reached through the `Store`
//! trait.
//!
//! ```ignore
//! use sbf::Filter;
//!
//! let mut store = MyStore::connect("127.0.0.1:7878")?;
//! let mut filter = Filter::create(&mut store, "my-filter", 0.5, 10, 65536)?;
//! filter.add(&mut store, b"some-element");
//! assert!(filter.check(&mut store, b"some-element"));
//! ```

pub mod error;
pub mod filter;
pub mod frame;
pub mod hasher;
pub mod header;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, SbfResult};
pub use filter::Filter;
pub use header::Header;
pub use store::{Store, StoreError, StoreResult};
