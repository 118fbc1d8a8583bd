//! An in-memory [`Store`] used only by this crate's own unit tests. It
//! mirrors the store's observable contract (bit-addressable byte strings,
//! absent keys read as empty/`None`, atomic batches) without talking to any
//! real service — there is no stand-in for a running store in this corpus,
//! so this is written the way a plain test double for a storage trait is
//! written elsewhere in the pack: a `HashMap`-backed fake with the same
//! method signatures as the real thing.

use crate::store::{Store, StoreResult};
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryStore {
    blobs: HashMap<String, Vec<u8>>,
    counters: HashMap<String, u64>,
}

fn ensure_len(buf: &mut Vec<u8>, bytes: usize) {
    if buf.len() < bytes {
        buf.resize(bytes, 0);
    }
}

fn set_bit(buf: &mut Vec<u8>, bit_offset: u64, value: bool) {
    let byte = (bit_offset / 8) as usize;
    let bit = 7 - (bit_offset % 8) as u8;
    ensure_len(buf, byte + 1);
    if value {
        buf[byte] |= 1 << bit;
    } else {
        buf[byte] &= !(1 << bit);
    }
}

fn get_bit(buf: &[u8], bit_offset: u64) -> bool {
    let byte = (bit_offset / 8) as usize;
    let bit = 7 - (bit_offset % 8) as u8;
    buf.get(byte).map(|b| b & (1 << bit) != 0).unwrap_or(false)
}

impl Store for MemoryStore {
    fn exists(&mut self, key: &str) -> StoreResult<bool> {
        Ok(self.blobs.contains_key(key))
    }

    fn get_range(&mut self, key: &str, start: u32, end_inclusive: u32) -> StoreResult<Vec<u8>> {
        let Some(buf) = self.blobs.get(key) else {
            return Ok(Vec::new());
        };
        let start = start as usize;
        let end = (end_inclusive as usize + 1).min(buf.len());
        if start >= buf.len() || start >= end {
            return Ok(Vec::new());
        }
        Ok(buf[start..end].to_vec())
    }

    fn set_range(&mut self, key: &str, offset: u32, bytes: &[u8]) -> StoreResult<()> {
        let buf = self.blobs.entry(key.to_owned()).or_default();
        ensure_len(buf, offset as usize + bytes.len());
        buf[offset as usize..offset as usize + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn allocate_frame(
        &mut self,
        key: &str,
        last_bit_offset: u64,
        counter_key: &str,
    ) -> StoreResult<()> {
        let buf = self.blobs.entry(key.to_owned()).or_default();
        set_bit(buf, last_bit_offset, false);
        self.counters.insert(counter_key.to_owned(), 0);
        Ok(())
    }

    fn get_bits(&mut self, key: &str, bit_offsets: &[u64]) -> StoreResult<Vec<bool>> {
        let buf = self.blobs.entry(key.to_owned()).or_default();
        Ok(bit_offsets.iter().map(|&o| get_bit(buf, o)).collect())
    }

    fn set_bits_and_incr(
        &mut self,
        key: &str,
        bit_offsets: &[u64],
        counter_key: &str,
    ) -> StoreResult<()> {
        let buf = self.blobs.entry(key.to_owned()).or_default();
        for &o in bit_offsets {
            set_bit(buf, o, true);
        }
        *self.counters.entry(counter_key.to_owned()).or_insert(0) += 1;
        Ok(())
    }

    fn get_counter(&mut self, key: &str) -> StoreResult<Option<u64>> {
        Ok(self.counters.get(key).copied())
    }

    fn del(&mut self, key: &str) -> StoreResult<()> {
        self.blobs.remove(key);
        self.counters.remove(key);
        Ok(())
    }

    fn expire(&mut self, _key: &str, _seconds: u64) -> StoreResult<()> {
        Ok(())
    }
}
