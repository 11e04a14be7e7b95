//! An incremental implementation of the [BLAKE3] cryptographic hash function,
//! with keyed hashing, key derivation, and extendable output.
//!
//! Input is split into 1 KiB chunks, each chunk is hashed into a chaining
//! value, and chaining values are merged pairwise up a binary tree. The root
//! of that tree can produce a 32-byte [`Hash`] or, through an
//! [`OutputReader`], any number of output bytes.
//!
//! # Examples
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Hash an input all at once.
//! let hash1 = b3engine::hash(b"foobarbaz");
//!
//! // Hash an input incrementally.
//! let mut hasher = b3engine::Hasher::new();
//! hasher.update(b"foo");
//! hasher.update(b"bar");
//! hasher.update(b"baz");
//! let hash2 = hasher.finalize();
//! assert_eq!(hash1, hash2);
//!
//! // Extended output.
//! let mut output = [0; 1000];
//! let mut output_reader = hasher.finalize_xof();
//! output_reader.fill(&mut output);
//! assert_eq!(hash1, output[..32]);
//!
//! // Print a hash as hex, and parse it back.
//! let hex = hash1.to_hex();
//! assert_eq!(b3engine::Hash::from_hex(hex.as_str())?, hash1);
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo Features
//!
//! The `std` feature (the only feature enabled by default) is required for
//! the [`Write`], [`Read`] and [`Seek`] implementations,
//! [`Hasher::update_reader`], and the C ABI in [`ffi`].
//!
//! The `rayon` feature adds [`Hasher::update_rayon`], for multithreaded
//! hashing. All other APIs remain single-threaded.
//!
//! The `traits-preview` feature implements traits from the RustCrypto
//! [`digest`] crate and re-exports it as `traits::digest`. Those traits aren't
//! stable, and this crate makes no SemVer guarantees for this feature.
//!
//! The `zeroize` feature implements `Zeroize` for [`Hash`], [`Hasher`] and
//! [`OutputReader`]. The `serde` feature implements `Serialize` and
//! `Deserialize` for [`Hash`].
//!
//! [BLAKE3]: https://github.com/BLAKE3-team/BLAKE3-specs/blob/master/blake3.pdf
//! [`Write`]: https://doc.rust-lang.org/std/io/trait.Write.html
//! [`Read`]: https://doc.rust-lang.org/std/io/trait.Read.html
//! [`Seek`]: https://doc.rust-lang.org/std/io/trait.Seek.html
//! [`digest`]: https://crates.io/crates/digest

#![cfg_attr(not(any(feature = "std", test)), no_std)]


mod chunk;
mod error;
mod hasher;
mod join;
mod output;
mod stack;

/// The compression function. Undocumented and unstable, for benchmarks only.
#[doc(hidden)]
pub mod portable;

#[cfg(feature = "std")]
pub mod ffi;
#[cfg(feature = "std")]
mod io;

#[cfg(feature = "traits-preview")]
pub mod traits;

pub use error::{Error, HexError};
pub use hasher::{Hasher, Mode};
pub use output::OutputReader;

use arrayvec::ArrayString;
use core::fmt;
use error::HexErrorInner;

/// The number of bytes in a [`Hash`], 32.
pub const OUT_LEN: usize = 32;

/// The number of bytes in a key, 32.
pub const KEY_LEN: usize = 32;

/// The number of bytes in a block, the unit of one compression.
pub const BLOCK_LEN: usize = 64;

/// The number of bytes in a chunk, a leaf of the tree.
pub const CHUNK_LEN: usize = 1024;

const MAX_DEPTH: usize = 54; // 2^54 * CHUNK_LEN = 2^64

// Chaining values are words while they're carried across the blocks of a
// chunk, and bytes once they're handed to the tree.
type CVWords = [u32; 8];
type CVBytes = [u8; 32]; // little-endian

const IV: &CVWords = &[
    0x6A09E667, 0xBB67AE85, 0x3C6EF372, 0xA54FF53A, 0x510E527F, 0x9B05688C, 0x1F83D9AB, 0x5BE0CD19,
];

// Domain separation flags, or'ed into the last word of the compression state.
const CHUNK_START: u8 = 1 << 0;
const CHUNK_END: u8 = 1 << 1;
const PARENT: u8 = 1 << 2;
const ROOT: u8 = 1 << 3;
const KEYED_HASH: u8 = 1 << 4;
const DERIVE_KEY_CONTEXT: u8 = 1 << 5;
const DERIVE_KEY_MATERIAL: u8 = 1 << 6;

#[inline]
fn counter_low(counter: u64) -> u32 {
    counter as u32
}

#[inline]
fn counter_high(counter: u64) -> u32 {
    (counter >> 32) as u32
}

/// A 32-byte output with constant-time equality checking.
///
/// `Hash` converts to and from `[u8; 32]` with [`From`], and explicitly with
/// [`from_bytes`](Hash::from_bytes) and [`as_bytes`](Hash::as_bytes). Byte
/// arrays don't compare in constant time, which is often a security
/// requirement when comparing MACs, so `Hash` doesn't implement `Deref` or
/// `AsRef`, to keep that property from being lost by an implicit conversion.
///
/// [`to_hex`](Hash::to_hex) and [`from_hex`](Hash::from_hex) convert to and
/// from hexadecimal. `Hash` also implements `Display` and `FromStr`.
#[derive(Clone, Copy, Hash)]
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize))]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Hash([u8; OUT_LEN]);

impl Hash {
    /// The raw bytes of the `Hash`. Byte arrays don't provide constant-time
    /// equality checking, so prefer comparing `Hash` values.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; OUT_LEN] {
        &self.0
    }

    /// Create a `Hash` from its raw bytes representation.
    pub const fn from_bytes(bytes: [u8; OUT_LEN]) -> Self {
        Self(bytes)
    }

    /// Encode in lowercase hexadecimal, without allocating.
    pub fn to_hex(&self) -> ArrayString<{ 2 * OUT_LEN }> {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";
        let mut s = ArrayString::new();
        for &b in self.0.iter() {
            s.push(DIGITS[(b >> 4) as usize] as char);
            s.push(DIGITS[(b & 0xf) as usize] as char);
        }
        s
    }

    /// Decode from exactly 64 hexadecimal characters, upper or lower case.
    /// `"...".parse()` does the same through `FromStr`.
    pub fn from_hex(hex: impl AsRef<[u8]>) -> Result<Self, HexError> {
        fn nibble(byte: u8) -> Result<u8, HexError> {
            match byte {
                b'0'..=b'9' => Ok(byte - b'0'),
                b'a'..=b'f' => Ok(byte - b'a' + 10),
                b'A'..=b'F' => Ok(byte - b'A' + 10),
                _ => Err(HexError(HexErrorInner::InvalidByte(byte))),
            }
        }
        let hex = hex.as_ref();
        if hex.len() != 2 * OUT_LEN {
            return Err(HexError(HexErrorInner::InvalidLen(hex.len())));
        }
        let mut bytes = [0; OUT_LEN];
        for (out, pair) in bytes.iter_mut().zip(hex.chunks_exact(2)) {
            *out = (nibble(pair[0])? << 4) | nibble(pair[1])?;
        }
        Ok(Self(bytes))
    }
}

impl From<[u8; OUT_LEN]> for Hash {
    #[inline]
    fn from(bytes: [u8; OUT_LEN]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Hash> for [u8; OUT_LEN] {
    #[inline]
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl core::str::FromStr for Hash {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

/// This implementation is constant-time.
impl PartialEq for Hash {
    #[inline]
    fn eq(&self, other: &Hash) -> bool {
        constant_time_eq::constant_time_eq_32(&self.0, &other.0)
    }
}

/// This implementation is constant-time.
impl PartialEq<[u8; OUT_LEN]> for Hash {
    #[inline]
    fn eq(&self, other: &[u8; OUT_LEN]) -> bool {
        constant_time_eq::constant_time_eq_32(&self.0, other)
    }
}

/// This implementation is constant-time if the target is 32 bytes long.
impl PartialEq<[u8]> for Hash {
    #[inline]
    fn eq(&self, other: &[u8]) -> bool {
        constant_time_eq::constant_time_eq(&self.0, other)
    }
}

impl Eq for Hash {}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.to_hex().as_str())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Hash").field(&self.to_hex().as_str()).finish()
    }
}

/// The default hash function.
///
/// For incremental input see [`Hasher::update`], and for output sizes other
/// than 32 bytes see [`Hasher::finalize_xof`].
pub fn hash(input: &[u8]) -> Hash {
    Hasher::new().update(input).finalize()
}

/// The keyed hash function.
///
/// Suitable as a message authentication code, for example in place of HMAC.
/// In that use the constant-time equality of [`Hash`] is almost always a
/// security requirement, so don't compare MACs as raw bytes.
pub fn keyed_hash(key: &[u8; KEY_LEN], input: &[u8]) -> Hash {
    Hasher::new_keyed(key).update(input).finalize()
}

/// The key derivation function.
///
/// Given key material of any length and a context string, outputs a 32-byte
/// derived subkey. **The context string should be hardcoded, globally unique,
/// and application-specific.** A good format is `"[application] [commit
/// timestamp] [purpose]"`, e.g. `"example.com 2019-12-25 16:18:03 session
/// tokens v1"`.
///
/// This is not a password hash. **`derive_key` should never be used with
/// passwords.** Use a dedicated password hash like Argon2 instead.
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; OUT_LEN] {
    Hasher::new_derive_key(context)
        .update(key_material)
        .finalize()
        .into()
}
