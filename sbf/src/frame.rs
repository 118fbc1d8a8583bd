//! Frame geometry and per-frame bit operations.

use crate::{
    error::SbfResult,
    hasher,
    header::{Header, HEADER_SIZE},
    store::Store,
};

pub const FRAME_HEADER: u32 = 6;
pub const FRAME_PADDING: u32 = 1;
const SHRINK: f64 = 0.5;
const GROWTH: f64 = 2.0;

fn fill_counter_key(refer: &str, id: u16) -> String {
    format!("SBF:count:{refer}:{id}")
}

/// A frame's derived geometry: `k_i` slices of `m_i` bits each, occupying
/// absolute bit range `[start_i, end_i)` including its reserved header and
/// trailing padding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub slice_count: u16,
    pub slice_size: u32,
    pub start: u64,
    pub end: u64,
}

/// Computed by iterative accumulation `i = 1..=id`, not a closed form,
/// because `slice_size` rounds down to a multiple of 8 at every step.
pub fn geometry(header: &Header, id: u16) -> Geometry {
    let mut slice_count = 0u16;
    let mut slice_size = 0u32;
    let mut end: u64 = 0;
    let frame_overhead_bits = ((FRAME_HEADER + FRAME_PADDING) * 8) as u64;

    for i in 1..=id {
        let k = (header.slice_count as f64 + (i as f64 - 1.0) * (1.0 / SHRINK).log2()).ceil();
        slice_count = k as u16;
        let m = ((header.slice_size as f64) * GROWTH.powi(i as i32 - 1)) as u64;
        slice_size = ((m >> 3) << 3) as u32;
        end += slice_size as u64 * slice_count as u64 + frame_overhead_bits;
    }
    end += (HEADER_SIZE * 8) as u64;
    let start = end - slice_size as u64 * slice_count as u64 - frame_overhead_bits;

    Geometry {
        slice_count,
        slice_size,
        start,
        end,
    }
}

pub struct Frame {
    pub id: u16,
    pub geometry: Geometry,
    pub full_rate: u16,
    pub fill: u64,
}

impl Frame {
    /// Allocates frame `id`'s byte range on the store and zeroes its fill
    /// counter, as a single atomic batch.
    pub fn create<S: Store>(
        store: &mut S,
        header: &Header,
        refer: &str,
        id: u16,
    ) -> SbfResult<Self> {
        let geom = geometry(header, id);
        store.allocate_frame(refer, geom.end - 1, &fill_counter_key(refer, id))?;
        Ok(Frame {
            id,
            geometry: geom,
            full_rate: header.full_rate,
            fill: 0,
        })
    }

    /// Loads frame `id`'s geometry (pure arithmetic) and its fill counter
    /// (a store round-trip; absent means `fill = 0`).
    pub fn load<S: Store>(store: &mut S, header: &Header, refer: &str, id: u16) -> SbfResult<Self> {
        let geom = geometry(header, id);
        let fill = store.get_counter(&fill_counter_key(refer, id))?.unwrap_or(0);
        Ok(Frame {
            id,
            geometry: geom,
            full_rate: header.full_rate,
            fill,
        })
    }

    /// `fill >= full_rate * slice_size`. Note this uses the first-frame
    /// occupancy ratio against *this* frame's, possibly larger, `slice_size`
    /// — every frame inherits the same ratio.
    pub fn is_full(&self) -> bool {
        let threshold = (self.full_rate as f64 / 10000.0) * self.geometry.slice_size as f64;
        self.fill as f64 >= threshold
    }

    fn absolute_positions(&self, element: &[u8]) -> Vec<u64> {
        let positions = hasher::positions(element, self.geometry.slice_count, self.geometry.slice_size);
        let frame_header_bits = (FRAME_HEADER * 8) as u64;
        positions
            .into_iter()
            .enumerate()
            .map(|(slice_index, pos)| {
                self.geometry.start
                    + frame_header_bits
                    + slice_index as u64 * self.geometry.slice_size as u64
                    + pos as u64
            })
            .collect()
    }

    /// Sets this frame's `k` bits for `element` and bumps its fill counter,
    /// all as one atomic batch. Returns the store result so `Filter::add`
    /// decides what a failure means; on success the in-memory fill counter
    /// is advanced.
    pub fn add<S: Store>(&mut self, store: &mut S, refer: &str, element: &[u8]) -> SbfResult<()> {
        let positions = self.absolute_positions(element);
        store.set_bits_and_incr(refer, &positions, &fill_counter_key(refer, self.id))?;
        self.fill += 1;
        Ok(())
    }

    /// Tests this frame's `k` bits for `element` as one atomic batch;
    /// `true` iff every bit is set.
    pub fn check<S: Store>(&self, store: &mut S, refer: &str, element: &[u8]) -> SbfResult<bool> {
        let positions = self.absolute_positions(element);
        let bits = store.get_bits(refer, &positions)?;
        Ok(bits.into_iter().all(|b| b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;

    fn small_header() -> Header {
        Header {
            count: 1,
            full_rate: 5000,
            slice_count: 10,
            slice_size: 65536,
        }
    }

    #[test]
    fn frame_one_geometry_matches_header() {
        let header = small_header();
        let geom = geometry(&header, 1);
        assert_eq!(geom.slice_count, 10);
        assert_eq!(geom.slice_size, 65536);
        let frame_overhead_bits = ((FRAME_HEADER + FRAME_PADDING) * 8) as u64;
        let expected_end = (HEADER_SIZE * 8) as u64
            + 65536u64 * 10
            + frame_overhead_bits;
        assert_eq!(geom.end, expected_end);
        assert_eq!(geom.start, expected_end - 65536 * 10 - frame_overhead_bits);
    }

    #[test]
    fn geometry_grows_additively_in_k_and_geometrically_in_m() {
        let header = small_header();
        let g1 = geometry(&header, 1);
        let g2 = geometry(&header, 2);
        assert_eq!(g2.slice_count, g1.slice_count + 1);
        assert_eq!(g2.slice_size, g1.slice_size * 2);
    }

    #[test]
    fn frame_regions_are_disjoint_and_monotonic() {
        let header = small_header();
        let g1 = geometry(&header, 1);
        let g2 = geometry(&header, 2);
        let g3 = geometry(&header, 3);
        assert!(g1.end < g2.start || g1.end == g2.start);
        assert!(g1.end <= g2.start);
        assert!(g2.end <= g3.start);
    }

    #[test]
    fn add_then_check_is_true() {
        let mut store = MemoryStore::default();
        let header = small_header();
        let mut frame = Frame::create(&mut store, &header, "test", 1).unwrap();
        frame.add(&mut store, "test", b"element-1").unwrap();
        assert!(frame.check(&mut store, "test", b"element-1").unwrap());
        assert_eq!(frame.fill, 1);
    }

    #[test]
    fn is_full_uses_slice_size_and_full_rate() {
        let mut store = MemoryStore::default();
        let header = Header {
            count: 1,
            full_rate: 5000,
            slice_count: 2,
            slice_size: 8,
        };
        let mut frame = Frame::create(&mut store, &header, "test", 1).unwrap();
        assert!(!frame.is_full());
        frame.fill = 4;
        assert!(frame.is_full());
    }
}
