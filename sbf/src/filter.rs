//! Orchestrates `add`/`check` across frames and drives the growth protocol.

use crate::{
    error::{Error, SbfResult},
    frame::Frame,
    header::{Header, FRAME_LIMIT},
    store::Store,
};
use rand::Rng;

/// A handle to one scalable bloom filter. Cheap to clone the `refer`
/// around; the handle itself only caches the header, never branching on it
/// for a safety-relevant decision — re-read when the decision must be
/// correct, which is exactly what `bump_count` does internally.
pub struct Filter {
    refer: String,
    header: Header,
}

fn fill_counter_key(refer: &str, id: u16) -> String {
    format!("SBF:count:{refer}:{id}")
}

impl Filter {
    pub fn refer(&self) -> &str {
        &self.refer
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Creates a new filter at `refer`. Fails with [`Error::AlreadyExists`]
    /// if a value is already stored there.
    pub fn create<S: Store>(
        store: &mut S,
        refer: &str,
        full_ratio: f64,
        slice_count: u16,
        slice_size: u32,
    ) -> SbfResult<Self> {
        if store.exists(refer)? {
            return Err(Error::AlreadyExists);
        }
        let header = Header::create(store, refer, full_ratio, slice_count, slice_size)?;
        Frame::create(store, &header, refer, 1)?;
        Ok(Filter {
            refer: refer.to_owned(),
            header,
        })
    }

    /// Loads an existing filter's header. Frames are loaded lazily as
    /// `add`/`check` need them.
    pub fn load<S: Store>(store: &mut S, refer: &str) -> SbfResult<Self> {
        let header = Header::load(store, refer)?;
        Ok(Filter {
            refer: refer.to_owned(),
            header,
        })
    }

    /// Deletes every per-frame counter and the main byte-string, then
    /// recreates frame 1. Counter keys `0..count` are deleted inclusive of
    /// `0` to also clean up any filter written by an off-by-one historical
    /// writer.
    pub fn truncate<S: Store>(store: &mut S, refer: &str) -> SbfResult<Self> {
        let header = Header::load(store, refer)?;
        for i in 0..header.count {
            let _ = store.del(&fill_counter_key(refer, i));
        }
        store.del(refer)?;
        let header = Header::create(store, refer, header.full_ratio(), header.slice_count, header.slice_size)?;
        Frame::create(store, &header, refer, 1)?;
        Ok(Filter {
            refer: refer.to_owned(),
            header,
        })
    }

    /// Adds `element`, growing the filter if its latest frame is full and
    /// falling back to random-frame reuse once `FRAME_LIMIT` is reached.
    ///
    /// Total like [`Filter::check`]: a store failure anywhere in the
    /// growth/add path is caught here and reported as `false` rather than
    /// propagated, and leaves the filter's in-memory state unchanged since
    /// the underlying batch that would have mutated it never committed.
    pub fn add<S: Store>(&mut self, store: &mut S, element: &[u8]) -> bool {
        match self.try_add(store, element) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("sbf: add to '{}' failed: {}", self.refer, e);
                false
            }
        }
    }

    fn try_add<S: Store>(&mut self, store: &mut S, element: &[u8]) -> SbfResult<()> {
        let mut frame = Frame::load(store, &self.header, &self.refer, self.header.count)?;
        if frame.is_full() {
            if self.header.count < FRAME_LIMIT {
                self.header.bump_count(store, &self.refer)?;
                frame = match Frame::create(store, &self.header, &self.refer, self.header.count) {
                    Ok(f) => f,
                    Err(_) => Frame::load(store, &self.header, &self.refer, self.header.count)?,
                };
                log::info!(
                    "sbf: grew filter {} to {} frames",
                    self.refer,
                    self.header.count
                );
            } else {
                let id = rand::thread_rng().gen_range(0..self.header.count);
                log::warn!(
                    "sbf: filter {} reached the frame cap ({}); reusing frame {}",
                    self.refer,
                    FRAME_LIMIT,
                    id
                );
                frame = Frame::load(store, &self.header, &self.refer, id)?;
            }
        }
        frame.add(store, &self.refer, element)
    }

    /// Tests `element` against every frame `1..=count`, returning `true` on
    /// the first hit. Total: never raises, only ever returns `true`/`false`;
    /// a store failure degrades to `false`.
    pub fn check<S: Store>(&self, store: &mut S, element: &[u8]) -> bool {
        for id in 1..=self.header.count {
            let frame = match Frame::load(store, &self.header, &self.refer, id) {
                Ok(f) => f,
                Err(_) => continue,
            };
            match frame.check(store, &self.refer, element) {
                Ok(true) => return true,
                _ => continue,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;

    #[test]
    fn create_fails_if_refer_exists() {
        let mut store = MemoryStore::default();
        Filter::create(&mut store, "test", 0.5, 10, 65536).unwrap();
        let err = Filter::create(&mut store, "test", 0.5, 10, 65536).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists));
    }

    #[test]
    fn invalid_slice_size_is_rejected() {
        let mut store = MemoryStore::default();
        let err = Filter::create(&mut store, "x", 0.5, 10, 65537).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn add_then_check_never_false_negatives() {
        let mut store = MemoryStore::default();
        let mut filter = Filter::create(&mut store, "test", 0.5, 10, 65536).unwrap();
        for i in 0..2000 {
            let key = i.to_string();
            assert!(filter.add(&mut store, key.as_bytes()));
        }
        for i in 0..2000 {
            let key = i.to_string();
            assert!(filter.check(&mut store, key.as_bytes()));
        }
    }

    #[test]
    fn growth_advances_count_and_does_not_lose_membership() {
        // a tiny slice size forces growth quickly
        let mut store = MemoryStore::default();
        let mut filter = Filter::create(&mut store, "test", 0.1, 2, 8).unwrap();
        for i in 0..500 {
            let key = format!("item-{i}");
            assert!(filter.add(&mut store, key.as_bytes()));
        }
        assert!(filter.header().count > 1);
        assert!(filter.header().count <= FRAME_LIMIT);
        for i in 0..500 {
            let key = format!("item-{i}");
            assert!(filter.check(&mut store, key.as_bytes()));
        }
    }

    #[test]
    fn truncate_resets_to_one_frame() {
        let mut store = MemoryStore::default();
        let mut filter = Filter::create(&mut store, "test", 0.1, 2, 8).unwrap();
        for i in 0..200 {
            assert!(filter.add(&mut store, format!("x{i}").as_bytes()));
        }
        assert!(filter.header().count > 1);
        let filter = Filter::truncate(&mut store, "test").unwrap();
        assert_eq!(filter.header().count, 1);
        assert!(!filter.check(&mut store, b"x0"));
    }

    #[test]
    fn truncate_is_idempotent() {
        let mut store = MemoryStore::default();
        Filter::create(&mut store, "test", 0.5, 10, 65536).unwrap();
        let a = Filter::truncate(&mut store, "test").unwrap();
        let b = Filter::truncate(&mut store, "test").unwrap();
        assert_eq!(a.header().count, b.header().count);
    }

    #[test]
    fn check_on_missing_filter_returns_false_rather_than_panicking() {
        let mut store = MemoryStore::default();
        let err = Filter::load(&mut store, "does-not-exist").unwrap_err();
        assert!(matches!(err, Error::NotFound));
    }
}
