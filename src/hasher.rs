use crate::chunk::ChunkState;
use crate::error::Error;
use crate::join::{self, Join};
use crate::output::{Output, OutputReader};
use crate::stack::CvStack;
use crate::{
    portable, CVBytes, CVWords, Hash, CHUNK_LEN, DERIVE_KEY_CONTEXT, DERIVE_KEY_MATERIAL, IV,
    KEYED_HASH, KEY_LEN,
};
use core::{cmp, fmt};

// How many leaf chaining values one round of compress_chunks() produces
// before they are pushed into the CV stack. 256 chunks is 256 KiB of input
// and 8 KiB of stack space.
const CV_BATCH: usize = 256;

/// The three ways a [`Hasher`] can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// The regular hash function, [`hash`](crate::hash).
    Hash,
    /// The keyed hash function, [`keyed_hash`](crate::keyed_hash).
    KeyedHash,
    /// The key derivation function, [`derive_key`](crate::derive_key).
    DeriveKey,
}

impl Mode {
    fn from_flags(flags: u8) -> Self {
        if flags & KEYED_HASH != 0 {
            Mode::KeyedHash
        } else if flags & DERIVE_KEY_MATERIAL != 0 {
            Mode::DeriveKey
        } else {
            Mode::Hash
        }
    }
}

/// An incremental hash state that can accept any number of writes.
///
/// Any way of splitting the same bytes across calls to
/// [`update`](Hasher::update) gives the same result. Finalizing doesn't
/// consume the hasher, so more input can be added and the hasher finalized
/// again.
///
/// When the `rayon` Cargo feature is enabled, the
/// [`update_rayon`](Hasher::update_rayon) method is available for
/// multithreaded hashing.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Hash an input incrementally.
/// let mut hasher = b3engine::Hasher::new();
/// hasher.update(b"foo");
/// hasher.update(b"bar");
/// hasher.update(b"baz");
/// assert_eq!(hasher.finalize(), b3engine::hash(b"foobarbaz"));
///
/// // Extended output. OutputReader also implements Read and Seek.
/// let mut output = [0; 1000];
/// let mut output_reader = hasher.finalize_xof();
/// output_reader.fill(&mut output);
/// assert_eq!(&output[..32], b3engine::hash(b"foobarbaz").as_bytes());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Hasher {
    key: CVWords,
    chunk_state: ChunkState,
    cv_stack: CvStack,
}

impl Hasher {
    fn new_internal(key: &CVWords, flags: u8) -> Self {
        Self {
            key: *key,
            chunk_state: ChunkState::new(key, 0, flags),
            cv_stack: CvStack::new(),
        }
    }

    /// Construct a new `Hasher` for the regular hash function.
    pub fn new() -> Self {
        Self::new_internal(IV, 0)
    }

    /// Construct a new `Hasher` for the keyed hash function. See
    /// [`keyed_hash`](crate::keyed_hash).
    pub fn new_keyed(key: &[u8; KEY_LEN]) -> Self {
        let key_words = portable::words_from_le_bytes_32(key);
        Self::new_internal(&key_words, KEYED_HASH)
    }

    /// Like [`new_keyed`](Hasher::new_keyed), for keys whose length is only
    /// known at runtime.
    ///
    /// Returns [`Error::InvalidKeyLength`] unless `key` is exactly 32 bytes.
    pub fn new_keyed_from_slice(key: &[u8]) -> Result<Self, Error> {
        let key: &[u8; KEY_LEN] = key
            .try_into()
            .map_err(|_| Error::InvalidKeyLength(key.len()))?;
        Ok(Self::new_keyed(key))
    }

    /// Construct a new `Hasher` for the key derivation function. See
    /// [`derive_key`](crate::derive_key). The context string should be
    /// hardcoded, globally unique, and application-specific.
    pub fn new_derive_key(context: &str) -> Self {
        let context_key = context_key_words(context);
        Self::new_internal(&context_key, DERIVE_KEY_MATERIAL)
    }

    /// The mode this hasher was constructed for.
    pub fn mode(&self) -> Mode {
        Mode::from_flags(self.chunk_state.flags)
    }

    /// Reset the `Hasher` to its initial state.
    ///
    /// This is the same as overwriting the `Hasher` with a new one, using the
    /// same key or context string if any.
    pub fn reset(&mut self) -> &mut Self {
        self.chunk_state = ChunkState::new(&self.key, 0, self.chunk_state.flags);
        self.cv_stack.clear();
        self
    }

    /// Add input bytes to the hash state. You can call this any number of
    /// times.
    ///
    /// This method is always single-threaded. For multithreading support, see
    /// [`update_rayon`](Hasher::update_rayon) (enabled with the `rayon` Cargo
    /// feature).
    pub fn update(&mut self, input: &[u8]) -> &mut Self {
        self.update_with_join::<join::SerialJoin>(input)
    }

    /// Identical to [`update`](Hasher::update), but hashing whole chunks on
    /// the Rayon thread pool.
    ///
    /// To get any benefit from multithreading, the input buffer needs to be
    /// large. As a rule of thumb, `update_rayon` is _slower_ than `update` for
    /// inputs under 128 KiB. Benchmark your use case.
    #[cfg(feature = "rayon")]
    pub fn update_rayon(&mut self, input: &[u8]) -> &mut Self {
        self.update_with_join::<join::RayonJoin>(input)
    }

    // A chunk is only sealed once input beyond it arrives, so the chunk that
    // ends the input is always sitting in chunk_state at finalization and
    // nothing on the CV stack can turn out to be the root.
    fn update_with_join<J: Join>(&mut self, mut input: &[u8]) -> &mut Self {
        // Top up a partially filled chunk first.
        if self.chunk_state.len() > 0 {
            let take = cmp::min(CHUNK_LEN - self.chunk_state.len(), input.len());
            self.chunk_state.update(&input[..take]);
            input = &input[take..];
            if input.is_empty() {
                return self;
            }
            self.seal_chunk();
        }

        if input.len() > CHUNK_LEN {
            self.push_whole_chunks::<J>(&mut input);
        }

        // What remains is between 1 and CHUNK_LEN bytes, or nothing if input
        // was empty to begin with, and chunk_state is empty.
        if !input.is_empty() {
            self.chunk_state.update(input);
        }
        self
    }

    // Hash every whole chunk that is followed by at least one more byte.
    // These are independent of each other and of everything hashed before.
    fn push_whole_chunks<J: Join>(&mut self, input: &mut &[u8]) {
        let mut cvs: [CVBytes; CV_BATCH] = [[0; 32]; CV_BATCH];
        while input.len() > CHUNK_LEN {
            let whole_chunks = cmp::min((input.len() - 1) / CHUNK_LEN, CV_BATCH);
            let remaining: &[u8] = *input;
            let (chunks, rest) = remaining.split_at(whole_chunks * CHUNK_LEN);
            let out = &mut cvs[..whole_chunks];
            join::compress_chunks::<J>(
                chunks,
                &self.key,
                self.chunk_state.chunk_counter,
                self.chunk_state.flags,
                out,
            );
            for cv in out.iter() {
                self.cv_stack
                    .push_chunk(cv, &self.key, self.chunk_state.flags);
            }
            self.chunk_state.chunk_counter += whole_chunks as u64;
            *input = rest;
        }
    }

    fn seal_chunk(&mut self) {
        debug_assert!(self.chunk_state.is_full());
        let chunk_cv = self.chunk_state.output().chaining_value();
        self.cv_stack
            .push_chunk(&chunk_cv, &self.key, self.chunk_state.flags);
        self.chunk_state = ChunkState::new(
            &self.key,
            self.chunk_state.chunk_counter + 1,
            self.chunk_state.flags,
        );
    }

    fn final_output(&self) -> Output {
        debug_assert_eq!(self.cv_stack.chunks(), self.chunk_state.chunk_counter);
        self.cv_stack.root_output(
            self.chunk_state.output(),
            &self.key,
            self.chunk_state.flags,
        )
    }

    /// Finalize the hash state and return the [`Hash`] of the input.
    ///
    /// This method is idempotent. Calling it twice will give the same result.
    /// You can also add more input and finalize again.
    pub fn finalize(&self) -> Hash {
        self.final_output().root_hash()
    }

    /// Finalize the hash state and return an [`OutputReader`], which can
    /// supply any number of output bytes.
    ///
    /// This method is idempotent. Calling it twice will give the same result.
    /// You can also add more input and finalize again.
    pub fn finalize_xof(&self) -> OutputReader {
        OutputReader::new(self.final_output())
    }

    /// Return the total number of bytes hashed so far.
    pub fn count(&self) -> u64 {
        self.chunk_state.chunk_counter * CHUNK_LEN as u64 + self.chunk_state.len() as u64
    }

    /// Read from `reader` until EOF, feeding everything into the hasher.
    /// `Interrupted` errors are retried; any other error is returned, with
    /// the bytes read before it already hashed.
    #[cfg(feature = "std")]
    pub fn update_reader(&mut self, reader: impl std::io::Read) -> std::io::Result<&mut Self> {
        crate::io::copy_wide(reader, self)?;
        Ok(self)
    }
}

// The key for derive-key mode: the context string hashed from the IV under
// its own domain flag.
pub(crate) fn context_key_words(context: &str) -> CVWords {
    let context_key = Hasher::new_internal(IV, DERIVE_KEY_CONTEXT)
        .update(context.as_bytes())
        .finalize();
    portable::words_from_le_bytes_32(context_key.as_bytes())
}

// Don't derive(Debug), because the state may be secret.
impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Hasher")
            .field("mode", &self.mode())
            .field("count", &self.count())
            .field("cv_stack", &self.cv_stack)
            .finish()
    }
}

impl Default for Hasher {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "zeroize")]
impl zeroize::Zeroize for Hasher {
    fn zeroize(&mut self) {
        use zeroize::Zeroize;
        self.key.zeroize();
        self.chunk_state.zeroize();
        self.cv_stack.zeroize();
    }
}

#[cfg(feature = "std")]
impl std::io::Write for Hasher {
    /// This is equivalent to [`update`](Hasher::update).
    #[inline]
    fn write(&mut self, input: &[u8]) -> std::io::Result<usize> {
        self.update(input);
        Ok(input.len())
    }

    #[inline]
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
