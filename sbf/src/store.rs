//! The boundary between the filter core and whatever remote key/value
//! service actually holds the bits.
//!
//! Everything in this crate other than this trait is pure arithmetic and
//! in-memory bookkeeping. Connection management, wire framing and retrying
//! against the real service are the implementor's problem (see the
//! `sbf-skytable` crate for one such implementation).

use std::error::Error as StdError;

/// Any failure surfaced by the underlying store, boxed so this crate does
/// not need to know which client library produced it.
pub type StoreError = Box<dyn StdError + Send + Sync + 'static>;

pub type StoreResult<T> = Result<T, StoreError>;

/// The operations the filter core issues against the store: range reads and
/// writes for the header, bit-level reads and writes for frame data, plain
/// get/set/incr for fill counters and the advisory lock, and existence/
/// delete/expire for lifecycle management.
///
/// Two methods are explicitly *batched*: [`Store::get_bits`] and
/// [`Store::set_bits_and_incr`] must be issued as a single atomic group
/// against the backing service (a `MULTI`/`EXEC` pair, or equivalent) — a
/// `Check` must never observe some but not all of a concurrent `Add`'s bits.
pub trait Store {
    /// `EXISTS key`
    fn exists(&mut self, key: &str) -> StoreResult<bool>;

    /// `GETRANGE key start end_inclusive`, returning the raw bytes. An
    /// absent key yields an empty vector (never an error).
    fn get_range(&mut self, key: &str, start: u32, end_inclusive: u32) -> StoreResult<Vec<u8>>;

    /// `SETRANGE key offset bytes`
    fn set_range(&mut self, key: &str, offset: u32, bytes: &[u8]) -> StoreResult<()>;

    /// `MULTI` + `SETBIT key last_bit 0` + `SET counter_key 0` + `EXEC`,
    /// the batch that forces the store to allocate a frame's byte range and
    /// zeroes its fill counter in one atomic step.
    fn allocate_frame(&mut self, key: &str, last_bit_offset: u64, counter_key: &str) -> StoreResult<()>;

    /// Test `k` bits as a single atomic batch (`MULTI` + `GETBIT` × k +
    /// `EXEC`). Order of the result matches `bit_offsets`.
    fn get_bits(&mut self, key: &str, bit_offsets: &[u64]) -> StoreResult<Vec<bool>>;

    /// Set `k` bits to 1 and increment `counter_key` as a single atomic
    /// batch (`MULTI` + `SETBIT` × k + `INCR` + `EXEC`).
    fn set_bits_and_incr(
        &mut self,
        key: &str,
        bit_offsets: &[u64],
        counter_key: &str,
    ) -> StoreResult<()>;

    /// `GET counter_key`, parsed as an unsigned integer. Absent key is
    /// `Ok(None)`, not an error.
    fn get_counter(&mut self, key: &str) -> StoreResult<Option<u64>>;

    /// `DEL key`. Deleting an absent key is not an error.
    fn del(&mut self, key: &str) -> StoreResult<()>;

    /// `EXPIRE key seconds`
    fn expire(&mut self, key: &str, seconds: u64) -> StoreResult<()>;
}
