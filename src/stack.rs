//! The tree reducer.
//!
//! Completed subtrees wait on a stack until a sibling of the same size shows
//! up. Sizes always decrease from the bottom of the stack to the top, and they
//! spell out the binary representation of the number of chunks pushed so far:
//! after 11 chunks (0b1011) the stack holds subtrees of 8, 2 and 1 chunks.
//! Merging eagerly on every push keeps that shape no matter how the input was
//! split between calls to `update`.

use crate::output::Output;
use crate::{CVBytes, CVWords, MAX_DEPTH};
use arrayvec::ArrayVec;
use core::fmt;

#[derive(Clone, Copy)]
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize))]
pub(crate) struct Subtree {
    pub(crate) cv: CVBytes,
    /// Number of chunks under this subtree, always a power of two.
    pub(crate) chunks: u64,
}

#[derive(Clone)]
pub(crate) struct CvStack {
    entries: ArrayVec<Subtree, MAX_DEPTH>,
}

impl CvStack {
    pub(crate) fn new() -> Self {
        Self {
            entries: ArrayVec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Total number of chunks held by the stack.
    pub(crate) fn chunks(&self) -> u64 {
        self.entries.iter().map(|s| s.chunks).sum()
    }

    /// Push the chaining value of a sealed chunk, then merge equal-sized
    /// neighbours off the top. The caller must know more input follows the
    /// chunk, since none of these merges can be the root.
    pub(crate) fn push_chunk(&mut self, cv: &CVBytes, key: &CVWords, flags: u8) {
        self.entries.push(Subtree { cv: *cv, chunks: 1 });
        while self.top_pair_mergeable() {
            // Both pops are guaranteed by top_pair_mergeable().
            let (Some(right), Some(left)) = (self.entries.pop(), self.entries.pop()) else {
                unreachable!("mergeable pair vanished");
            };
            let parent = Output::parent(&left.cv, &right.cv, key, flags);
            self.entries.push(Subtree {
                cv: parent.chaining_value(),
                chunks: left.chunks + right.chunks,
            });
        }
    }

    fn top_pair_mergeable(&self) -> bool {
        match self.entries.as_slice() {
            [.., left, right] => left.chunks == right.chunks,
            _ => false,
        }
    }

    /// Fold every waiting subtree into the final chunk, right to left, and
    /// return the root node. With an empty stack the chunk is the root.
    pub(crate) fn root_output(&self, last_chunk: Output, key: &CVWords, flags: u8) -> Output {
        self.entries.iter().rev().fold(last_chunk, |right, left| {
            Output::parent(&left.cv, &right.chaining_value(), key, flags)
        })
    }

    #[cfg(test)]
    pub(crate) fn sizes(&self) -> ArrayVec<u64, MAX_DEPTH> {
        self.entries.iter().map(|s| s.chunks).collect()
    }
}

#[cfg(feature = "zeroize")]
impl zeroize::Zeroize for CvStack {
    fn zeroize(&mut self) {
        use zeroize::Zeroize;
        for entry in self.entries.iter_mut() {
            entry.zeroize();
        }
        self.entries.clear();
    }
}

// Don't derive(Debug), because the state may be secret.
impl fmt::Debug for CvStack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CvStack")
            .field("len", &self.entries.len())
            .field("chunks", &self.chunks())
            .finish()
    }
}
