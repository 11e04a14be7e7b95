use crate::output::Output;
use crate::{portable, CVWords, BLOCK_LEN, CHUNK_END, CHUNK_LEN, CHUNK_START};
use arrayref::array_ref;
use core::{cmp, fmt};

/// The leaf accumulator. Buffers at most one block and carries the chaining
/// value across the blocks of a single chunk.
#[derive(Clone)]
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize))]
pub(crate) struct ChunkState {
    pub(crate) cv: CVWords,
    pub(crate) chunk_counter: u64,
    pub(crate) buf: [u8; BLOCK_LEN],
    pub(crate) buf_len: u8,
    pub(crate) blocks_compressed: u8,
    pub(crate) flags: u8,
}

impl ChunkState {
    pub(crate) fn new(key: &CVWords, chunk_counter: u64, flags: u8) -> Self {
        Self {
            cv: *key,
            chunk_counter,
            buf: [0; BLOCK_LEN],
            buf_len: 0,
            blocks_compressed: 0,
            flags,
        }
    }

    /// Bytes absorbed into this chunk so far, compressed or buffered.
    pub(crate) fn len(&self) -> usize {
        BLOCK_LEN * self.blocks_compressed as usize + self.buf_len as usize
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len() == CHUNK_LEN
    }

    fn start_flag(&self) -> u8 {
        if self.blocks_compressed == 0 {
            CHUNK_START
        } else {
            0
        }
    }

    fn compress_block(&mut self, block: &[u8; BLOCK_LEN]) {
        let block_flags = self.flags | self.start_flag();
        portable::compress_in_place(
            &mut self.cv,
            block,
            BLOCK_LEN as u8,
            self.chunk_counter,
            block_flags,
        );
        self.blocks_compressed += 1;
    }

    fn fill_buf(&mut self, input: &mut &[u8]) {
        let take = cmp::min(BLOCK_LEN - self.buf_len as usize, input.len());
        self.buf[self.buf_len as usize..][..take].copy_from_slice(&input[..take]);
        self.buf_len += take as u8;
        *input = &input[take..];
    }

    /// Absorb input. The caller guarantees it fits in what remains of the
    /// chunk. A full block is only compressed once more input follows it, so
    /// the final block is always still buffered when `output` is called.
    pub(crate) fn update(&mut self, mut input: &[u8]) -> &mut Self {
        debug_assert!(self.len() + input.len() <= CHUNK_LEN, "chunk overflow");

        if self.buf_len > 0 {
            self.fill_buf(&mut input);
            if input.is_empty() {
                return self;
            }
            let block = self.buf;
            self.compress_block(&block);
            self.buf = [0; BLOCK_LEN];
            self.buf_len = 0;
        }

        // Compress straight out of the caller's slice while a block is
        // followed by at least one more byte.
        while input.len() > BLOCK_LEN {
            self.compress_block(array_ref!(input, 0, BLOCK_LEN));
            input = &input[BLOCK_LEN..];
        }

        self.fill_buf(&mut input);
        debug_assert!(input.is_empty());
        self
    }

    /// The node for this chunk, with the end flag on the buffered block. For
    /// the empty input this is a zero-length block with both start and end.
    pub(crate) fn output(&self) -> Output {
        Output {
            input_chaining_value: self.cv,
            block: self.buf,
            block_len: self.buf_len,
            counter: self.chunk_counter,
            flags: self.flags | self.start_flag() | CHUNK_END,
        }
    }
}

// Don't derive(Debug), because the state may be secret.
impl fmt::Debug for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ChunkState")
            .field("len", &self.len())
            .field("chunk_counter", &self.chunk_counter)
            .field("flags", &self.flags)
            .finish()
    }
}
