//! The 18-byte header prefix and the weak, advisory `bump_count`
//! coordination protocol.

use crate::{
    error::{Error, SbfResult},
    store::Store,
};
use std::{thread::sleep, time::Duration};

pub const HEADER_SIZE: u32 = 18;
pub const MAGIC: &[u8; 3] = b"SBF";
pub const VERSION: &[u8; 5] = b"1.0.0";
pub const FRAME_LIMIT: u16 = 1024;

const LOCK_POLL_ATTEMPTS: u32 = 10;
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(500);
const LOCK_TTL_SECONDS: u64 = 5;

#[derive(Clone, Debug)]
pub struct Header {
    pub count: u16,
    pub full_rate: u16,
    pub slice_count: u16,
    pub slice_size: u32,
}

fn lock_key(refer: &str) -> String {
    format!("lock:SBF:count:{refer}")
}

impl Header {
    pub fn full_ratio(&self) -> f64 {
        self.full_rate as f64 / 10000.0
    }

    /// Validates `(full_ratio, k, m)` and writes a fresh header to `refer`.
    /// Does not check whether `refer` already holds a filter — that guard
    /// lives in `Filter::create`, which needs an `Exists` check anyway.
    pub fn create<S: Store>(
        store: &mut S,
        refer: &str,
        full_ratio: f64,
        slice_count: u16,
        slice_size: u32,
    ) -> SbfResult<Self> {
        if slice_size % 8 != 0 {
            return Err(Error::InvalidParameter(format!(
                "slice_size {slice_size} is not a multiple of 8"
            )));
        }
        let header = Header {
            count: 1,
            full_rate: (full_ratio * 10000.0).round() as u16,
            slice_count,
            slice_size,
        };
        header.write_back(store, refer)?;
        Ok(header)
    }

    /// Reads and validates the 18-byte prefix at `refer`.
    pub fn load<S: Store>(store: &mut S, refer: &str) -> SbfResult<Self> {
        let raw = store.get_range(refer, 0, HEADER_SIZE - 1)?;
        if raw.is_empty() {
            return Err(Error::NotFound);
        }
        if raw.len() < HEADER_SIZE as usize {
            return Err(Error::Corrupt);
        }
        if &raw[0..3] != MAGIC.as_slice() {
            return Err(Error::Corrupt);
        }
        if raw[3..8] > VERSION.as_slice() {
            return Err(Error::UnsupportedVersion);
        }
        let count = u16::from_le_bytes(raw[8..10].try_into().unwrap());
        let full_rate = u16::from_le_bytes(raw[10..12].try_into().unwrap());
        let slice_count = u16::from_le_bytes(raw[12..14].try_into().unwrap());
        let slice_size = u32::from_le_bytes(raw[14..18].try_into().unwrap());
        Ok(Header {
            count,
            full_rate,
            slice_count,
            slice_size,
        })
    }

    fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let mut buf = [0u8; HEADER_SIZE as usize];
        buf[0..3].copy_from_slice(MAGIC.as_slice());
        buf[3..8].copy_from_slice(VERSION.as_slice());
        buf[8..10].copy_from_slice(&self.count.to_le_bytes());
        buf[10..12].copy_from_slice(&self.full_rate.to_le_bytes());
        buf[12..14].copy_from_slice(&self.slice_count.to_le_bytes());
        buf[14..18].copy_from_slice(&self.slice_size.to_le_bytes());
        buf
    }

    /// Rewrites the 18-byte prefix in place.
    pub fn write_back<S: Store>(&self, store: &mut S, refer: &str) -> SbfResult<()> {
        store.set_range(refer, 0, &self.encode())?;
        Ok(())
    }

    /// Advances `count` by one, coordinating with other handles through a
    /// TTL-only advisory lock. This never upgrades to a real mutex: the
    /// lock body is never explicitly acquired or released, only given a
    /// TTL, so two racing callers may
    /// both pass the poll loop and both attempt the increment. The
    /// observable guarantee this preserves is that `count` only ever moves
    /// forward and a late bumper adopts whatever it finds instead of
    /// clobbering it.
    pub fn bump_count<S: Store>(&mut self, store: &mut S, refer: &str) -> SbfResult<()> {
        let lock = lock_key(refer);
        for _ in 0..LOCK_POLL_ATTEMPTS {
            match store.get_counter(&lock)? {
                Some(v) if v > 0 => sleep(LOCK_POLL_INTERVAL),
                _ => break,
            }
        }
        store.expire(&lock, LOCK_TTL_SECONDS)?;

        let raw = store.get_range(refer, 8, 9)?;
        if raw.len() < 2 {
            return Err(Error::Corrupt);
        }
        let stored_count = u16::from_le_bytes(raw[0..2].try_into().unwrap());
        if stored_count == self.count {
            self.count += 1;
            self.write_back(store, refer)?;
        } else if stored_count > self.count {
            // another handle already grew the filter; adopt it
            self.count = stored_count;
        }
        // stored_count < self.count: a stale read, ignore it
        Ok(())
    }
}
