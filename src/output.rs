use crate::{portable, CVBytes, CVWords, Hash, BLOCK_LEN, OUT_LEN, PARENT, ROOT};
use core::{cmp, fmt};

// Every chunk or parent node can produce either a 32-byte chaining value or,
// with the ROOT flag set, any number of output bytes. An Output holds the
// inputs to that last compression before the choice is made.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize))]
pub(crate) struct Output {
    pub(crate) input_chaining_value: CVWords,
    pub(crate) block: [u8; BLOCK_LEN],
    pub(crate) block_len: u8,
    pub(crate) counter: u64,
    pub(crate) flags: u8,
}

impl Output {
    /// The node over two child chaining values.
    pub(crate) fn parent(
        left_child: &CVBytes,
        right_child: &CVBytes,
        key: &CVWords,
        flags: u8,
    ) -> Self {
        let mut block = [0; BLOCK_LEN];
        block[..OUT_LEN].copy_from_slice(left_child);
        block[OUT_LEN..].copy_from_slice(right_child);
        Self {
            input_chaining_value: *key,
            block,
            block_len: BLOCK_LEN as u8,
            counter: 0,
            flags: flags | PARENT,
        }
    }

    pub(crate) fn chaining_value(&self) -> CVBytes {
        let mut cv = self.input_chaining_value;
        portable::compress_in_place(
            &mut cv,
            &self.block,
            self.block_len,
            self.counter,
            self.flags,
        );
        portable::le_bytes_from_words_32(&cv)
    }

    pub(crate) fn root_hash(&self) -> Hash {
        debug_assert_eq!(self.counter, 0);
        let mut cv = self.input_chaining_value;
        portable::compress_in_place(&mut cv, &self.block, self.block_len, 0, self.flags | ROOT);
        Hash::from_bytes(portable::le_bytes_from_words_32(&cv))
    }

    /// Output block number `block_index` of the root's extended output. The
    /// root of a one-chunk input carries its chunk index (always 0) in
    /// `counter`, so the block index replaces it outright.
    pub(crate) fn root_output_block(&self, block_index: u64) -> [u8; BLOCK_LEN] {
        portable::compress_xof(
            &self.input_chaining_value,
            &self.block,
            self.block_len,
            block_index,
            self.flags | ROOT,
        )
    }
}

/// An incremental reader for extended output, returned by
/// [`Hasher::finalize_xof`](crate::Hasher::finalize_xof).
///
/// Shorter outputs are prefixes of longer ones, so explicitly requesting a
/// short output is the same as truncating a long one. The first 32 bytes are
/// always the [`Hash`] that [`Hasher::finalize`](crate::Hasher::finalize)
/// returns.
///
/// The reader holds nothing but the root node and a byte position. Output
/// bytes are never buffered, and any position can be served without
/// generating what comes before it. [`read_at`](OutputReader::read_at) takes
/// `&self`, so one reader can be shared between threads that each read a
/// different range.
///
/// # Security notes
///
/// Outputs shorter than 32 bytes provide less security. An N-bit output is
/// intended to provide N bits of preimage resistance and N/2 bits of collision
/// resistance, for any N up to 256. Longer outputs don't add security.
///
/// Don't rely on the secrecy of the output offset. Anyone who knows the message
/// and key can recover it.
#[derive(Clone)]
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize))]
pub struct OutputReader {
    root: Output,
    position: u64,
}

impl OutputReader {
    pub(crate) fn new(root: Output) -> Self {
        Self { root, position: 0 }
    }

    /// Write output bytes starting at an absolute `position` into `buf`,
    /// without touching the reader's own position.
    ///
    /// The maximum output size is 2<sup>64</sup>-1 bytes. Reading past that
    /// wraps around to the start of the stream.
    pub fn read_at(&self, position: u64, mut buf: &mut [u8]) {
        let mut block_index = position / BLOCK_LEN as u64;
        let mut offset = (position % BLOCK_LEN as u64) as usize;
        while !buf.is_empty() {
            let block = self.root.root_output_block(block_index);
            let take = cmp::min(buf.len(), BLOCK_LEN - offset);
            buf[..take].copy_from_slice(&block[offset..][..take]);
            buf = &mut buf[take..];
            block_index = block_index.wrapping_add(1);
            offset = 0;
        }
    }

    /// Fill a buffer with output bytes and advance the position. This is the
    /// same as [`Read::read`](std::io::Read::read) but infallible. The whole
    /// buffer is always filled.
    ///
    /// Because nothing is buffered internally, calling `fill` repeatedly with
    /// short or odd-length slices repeats compressions. Prefer slice lengths
    /// that are a multiple of 64 when reading in a loop.
    pub fn fill(&mut self, buf: &mut [u8]) {
        self.read_at(self.position, buf);
        self.position = self.position.wrapping_add(buf.len() as u64);
    }

    /// The current read position. A new reader starts at 0.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Seek to an absolute position in the output stream.
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }
}

// Don't derive(Debug), because the state may be secret.
impl fmt::Debug for OutputReader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OutputReader")
            .field("position", &self.position)
            .finish()
    }
}

#[cfg(feature = "std")]
impl std::io::Read for OutputReader {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.fill(buf);
        Ok(buf.len())
    }
}

#[cfg(feature = "std")]
impl std::io::Seek for OutputReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        let target: i128 = match pos {
            std::io::SeekFrom::Start(x) => x as i128,
            std::io::SeekFrom::Current(x) => self.position as i128 + x as i128,
            std::io::SeekFrom::End(_) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "seek from end not supported",
                ));
            }
        };
        if target < 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek before start",
            ));
        }
        self.position = cmp::min(target, u64::MAX as i128) as u64;
        Ok(self.position)
    }
}
