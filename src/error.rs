use core::fmt;

/// The errors the engine can report. None of them are fatal, and the state
/// of the hasher or reader involved is never changed by a failed call.
#[derive(Clone, Debug)]
pub enum Error {
    /// A keyed construction received key material of the wrong size. Holds
    /// the length that was supplied.
    InvalidKeyLength(usize),
    /// A null buffer with a nonzero length crossed the C boundary.
    NullInput,
    /// A string wasn't exactly 64 hex characters.
    InvalidHexEncoding(HexError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidKeyLength(len) => {
                write!(f, "expected a {}-byte key, received {}", crate::KEY_LEN, len)
            }
            Error::NullInput => f.write_str("null input buffer with nonzero length"),
            Error::InvalidHexEncoding(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl From<HexError> for Error {
    fn from(e: HexError) -> Self {
        Error::InvalidHexEncoding(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidHexEncoding(e) => Some(e),
            _ => None,
        }
    }
}

/// The error type for [`Hash::from_hex`](crate::Hash::from_hex).
///
/// The `.to_string()` representation distinguishes bad lengths from bad
/// characters. That helps with logging, but it isn't a stable API detail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexError(pub(crate) HexErrorInner);

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum HexErrorInner {
    InvalidByte(u8),
    InvalidLen(usize),
}

impl fmt::Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            HexErrorInner::InvalidByte(byte) if byte < 128 => {
                write!(f, "invalid hex character: {:?}", byte as char)
            }
            HexErrorInner::InvalidByte(byte) => write!(f, "invalid hex character: 0x{:x}", byte),
            HexErrorInner::InvalidLen(len) => {
                write!(f, "expected 64 hex bytes, received {}", len)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HexError {}
