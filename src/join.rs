//! Single- and multi-threaded leaf hashing.
//!
//! `Hasher::update` and `Hasher::update_rayon` share one code path,
//! parameterized by a `Join` implementation. `SerialJoin` runs both halves on
//! the calling thread. `RayonJoin` (behind the `rayon` feature) hands them to
//! [`rayon_core::join`]. Leaf chaining values only depend on their own bytes
//! and chunk index, so workers write into disjoint slots of an output buffer
//! and the caller pushes the results into the CV stack in input order
//! afterwards.
//!
//! [`rayon_core::join`]: https://docs.rs/rayon-core/1.12.1/rayon_core/fn.join.html

use crate::{portable, CVBytes, CVWords, CHUNK_END, CHUNK_LEN, CHUNK_START};
use arrayref::array_ref;

/// Abstracts over serial and parallel execution of two closures. A copy of
/// the `rayon::join` signature.
pub trait Join {
    fn join<A, B, RA, RB>(oper_a: A, oper_b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send;
}

/// Runs the left side, then the right side, on the calling thread.
pub enum SerialJoin {}

impl Join for SerialJoin {
    #[inline]
    fn join<A, B, RA, RB>(oper_a: A, oper_b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        (oper_a(), oper_b())
    }
}

/// Runs both sides on the Rayon thread pool, potentially in parallel.
#[cfg(feature = "rayon")]
pub enum RayonJoin {}

#[cfg(feature = "rayon")]
impl Join for RayonJoin {
    #[inline]
    fn join<A, B, RA, RB>(oper_a: A, oper_b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        rayon_core::join(oper_a, oper_b)
    }
}

// Below this many chunks, splitting further costs more than it saves.
const MIN_CHUNKS_PER_TASK: usize = 4;

/// Hash whole chunks into `out`, one chaining value per chunk, with
/// `out[i]` holding the CV of the chunk with index `chunk_counter + i`.
/// None of these chunks may be the root.
pub(crate) fn compress_chunks<J: Join>(
    input: &[u8],
    key: &CVWords,
    chunk_counter: u64,
    flags: u8,
    out: &mut [CVBytes],
) {
    debug_assert_eq!(input.len(), out.len() * CHUNK_LEN, "whole chunks only");

    if out.len() <= MIN_CHUNKS_PER_TASK {
        for (i, (chunk, cv)) in input.chunks_exact(CHUNK_LEN).zip(out.iter_mut()).enumerate() {
            *cv = portable::hash1(
                array_ref!(chunk, 0, CHUNK_LEN),
                key,
                chunk_counter + i as u64,
                flags,
                CHUNK_START,
                CHUNK_END,
            );
        }
        return;
    }

    let mid = out.len() / 2;
    let (left_in, right_in) = input.split_at(mid * CHUNK_LEN);
    let (left_out, right_out) = out.split_at_mut(mid);
    J::join(
        || compress_chunks::<J>(left_in, key, chunk_counter, flags, left_out),
        || compress_chunks::<J>(right_in, key, chunk_counter + mid as u64, flags, right_out),
    );
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chunk::ChunkState;
    use crate::test::paint_test_input;
    use crate::IV;

    #[test]
    fn test_serial_join() {
        let oper_a = || 1 + 1;
        let oper_b = || 2 + 2;
        assert_eq!((2, 4), SerialJoin::join(oper_a, oper_b));
    }

    #[test]
    #[cfg(feature = "rayon")]
    fn test_rayon_join() {
        let oper_a = || 1 + 1;
        let oper_b = || 2 + 2;
        assert_eq!((2, 4), RayonJoin::join(oper_a, oper_b));
    }

    fn check_compress_chunks<J: Join>() {
        const N: usize = 13;
        let mut input = [0; N * CHUNK_LEN];
        paint_test_input(&mut input);
        let counter = u32::MAX as u64 - 5;
        let mut out = [[0; 32]; N];
        compress_chunks::<J>(&input, IV, counter, 0, &mut out);

        for (i, cv) in out.iter().enumerate() {
            let expected = ChunkState::new(IV, counter + i as u64, 0)
                .update(&input[i * CHUNK_LEN..][..CHUNK_LEN])
                .output()
                .chaining_value();
            assert_eq!(*cv, expected, "chunk {}", i);
        }
    }

    #[test]
    fn test_compress_chunks_serial() {
        check_compress_chunks::<SerialJoin>();
    }

    #[test]
    #[cfg(feature = "rayon")]
    fn test_compress_chunks_rayon() {
        check_compress_chunks::<RayonJoin>();
    }
}
