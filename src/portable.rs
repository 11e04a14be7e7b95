//! The compression function, written in plain Rust with no platform-specific
//! intrinsics. Everything else in the crate is built on `compress_in_place` and
//! `compress_xof`.

use crate::{counter_high, counter_low, CVBytes, CVWords, BLOCK_LEN, IV};
use arrayref::{array_mut_ref, array_ref};

/// The number of mixing rounds per compression.
pub const ROUNDS: usize = 7;

/// Message word order for each round. Row `r` is row `r - 1` put through
/// `MSG_PERMUTATION`.
pub(crate) const MSG_SCHEDULE: [[usize; 16]; ROUNDS] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [2, 6, 3, 10, 7, 0, 4, 13, 1, 11, 12, 5, 9, 14, 15, 8],
    [3, 4, 10, 12, 13, 2, 7, 14, 6, 5, 9, 0, 11, 15, 8, 1],
    [10, 7, 12, 9, 14, 3, 13, 15, 4, 0, 11, 2, 5, 8, 1, 6],
    [12, 13, 9, 11, 15, 10, 14, 8, 7, 2, 5, 3, 0, 1, 6, 4],
    [9, 14, 11, 5, 8, 12, 15, 1, 13, 3, 0, 10, 2, 6, 4, 7],
    [11, 15, 5, 0, 1, 9, 8, 6, 14, 10, 2, 12, 3, 4, 7, 13],
];

#[cfg(test)]
pub(crate) const MSG_PERMUTATION: [usize; 16] = [2, 6, 3, 10, 7, 0, 4, 13, 1, 11, 12, 5, 9, 14, 15, 8];

// (a, b, c, d) state indices for the four column steps followed by the four
// diagonal steps of one round.
const MIX_LANES: [[usize; 4]; 8] = [
    [0, 4, 8, 12],
    [1, 5, 9, 13],
    [2, 6, 10, 14],
    [3, 7, 11, 15],
    [0, 5, 10, 15],
    [1, 6, 11, 12],
    [2, 7, 8, 13],
    [3, 4, 9, 14],
];

#[inline(always)]
fn g(state: &mut [u32; 16], [a, b, c, d]: [usize; 4], x: u32, y: u32) {
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(x);
    state[d] = (state[d] ^ state[a]).rotate_right(16);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(12);
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(y);
    state[d] = (state[d] ^ state[a]).rotate_right(8);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(7);
}

#[inline(always)]
fn round(state: &mut [u32; 16], msg: &[u32; 16], schedule: &[usize; 16]) {
    for (step, &lanes) in MIX_LANES.iter().enumerate() {
        g(
            state,
            lanes,
            msg[schedule[2 * step]],
            msg[schedule[2 * step + 1]],
        );
    }
}

// Run all rounds and return the raw 16-word state, before the output
// feed-forward.
#[inline(always)]
fn permute_state(
    cv: &CVWords,
    block: &[u8; BLOCK_LEN],
    block_len: u8,
    counter: u64,
    flags: u8,
) -> [u32; 16] {
    let msg = words_from_le_bytes_64(block);
    let mut state = [0u32; 16];
    state[..8].copy_from_slice(cv);
    state[8..12].copy_from_slice(&IV[..4]);
    state[12] = counter_low(counter);
    state[13] = counter_high(counter);
    state[14] = block_len as u32;
    state[15] = flags as u32;

    for schedule in MSG_SCHEDULE.iter() {
        round(&mut state, &msg, schedule);
    }
    state
}

/// Compress one block and overwrite `cv` with the resulting chaining value.
///
/// `block` must be zero-padded past `block_len`.
pub fn compress_in_place(
    cv: &mut CVWords,
    block: &[u8; BLOCK_LEN],
    block_len: u8,
    counter: u64,
    flags: u8,
) {
    let state = permute_state(cv, block, block_len, counter, flags);
    for i in 0..8 {
        cv[i] = state[i] ^ state[i + 8];
    }
}

/// Compress one block and return the full 64-byte output. The first 32 bytes
/// equal what `compress_in_place` would produce.
pub fn compress_xof(
    cv: &CVWords,
    block: &[u8; BLOCK_LEN],
    block_len: u8,
    counter: u64,
    flags: u8,
) -> [u8; BLOCK_LEN] {
    let mut state = permute_state(cv, block, block_len, counter, flags);
    for i in 0..8 {
        state[i] ^= state[i + 8];
        state[i + 8] ^= cv[i];
    }
    le_bytes_from_words_64(&state)
}

/// Hash one whole chunk (or any whole number of blocks) into a chaining
/// value. `flags_start` goes on the first block and `flags_end` on the last.
pub fn hash1<const N: usize>(
    input: &[u8; N],
    key: &CVWords,
    counter: u64,
    flags: u8,
    flags_start: u8,
    flags_end: u8,
) -> CVBytes {
    debug_assert_eq!(N % BLOCK_LEN, 0, "uneven blocks");
    debug_assert!(N > 0);
    let mut cv = *key;
    let last = N / BLOCK_LEN - 1;
    for (i, block) in input.chunks_exact(BLOCK_LEN).enumerate() {
        let mut block_flags = flags;
        if i == 0 {
            block_flags |= flags_start;
        }
        if i == last {
            block_flags |= flags_end;
        }
        compress_in_place(
            &mut cv,
            array_ref!(block, 0, BLOCK_LEN),
            BLOCK_LEN as u8,
            counter,
            block_flags,
        );
    }
    le_bytes_from_words_32(&cv)
}

#[inline(always)]
pub fn words_from_le_bytes_32(bytes: &[u8; 32]) -> CVWords {
    let mut out = [0; 8];
    for (word, src) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes(*array_ref!(src, 0, 4));
    }
    out
}

#[inline(always)]
pub fn words_from_le_bytes_64(bytes: &[u8; 64]) -> [u32; 16] {
    let mut out = [0; 16];
    for (word, src) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes(*array_ref!(src, 0, 4));
    }
    out
}

#[inline(always)]
pub fn le_bytes_from_words_32(words: &CVWords) -> CVBytes {
    let mut out = [0; 32];
    for (i, word) in words.iter().enumerate() {
        *array_mut_ref!(out, 4 * i, 4) = word.to_le_bytes();
    }
    out
}

#[inline(always)]
pub fn le_bytes_from_words_64(words: &[u32; 16]) -> [u8; 64] {
    let mut out = [0; 64];
    for (i, word) in words.iter().enumerate() {
        *array_mut_ref!(out, 4 * i, 4) = word.to_le_bytes();
    }
    out
}
