//! A C ABI over [`Hasher`] and [`OutputReader`].
//!
//! Handles are heap allocations owned by the caller, who must release each
//! one exactly once with the matching `b3_free_*` function. Functions that can
//! fail return a null pointer on success, or an owned, NUL-terminated message
//! to be released with [`b3_free_char_pointer`]. A rejected call never
//! changes the hasher or reader it was given. Every rejection is reported as a
//! `tracing` debug event before it is returned.

use crate::{Error, Hash, Hasher, OutputReader, KEY_LEN, OUT_LEN};
use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::c_char;
use std::ptr;
use std::slice;
use tracing::debug;

fn error_string(call: &str, err: impl fmt::Display) -> *mut c_char {
    let message = err.to_string();
    debug!(call, %message, "rejected");
    CString::new(message)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

// A (pointer, length) pair from C, as a slice. A null pointer is only
// accepted together with a zero length.
unsafe fn input_slice<'a>(buf: *const u8, len: usize) -> Result<&'a [u8], Error> {
    if buf.is_null() {
        return if len == 0 { Ok(&[]) } else { Err(Error::NullInput) };
    }
    Ok(slice::from_raw_parts(buf, len))
}

/// A new default-mode hasher.
#[no_mangle]
pub extern "C" fn b3_hasher_new() -> *mut Hasher {
    Box::into_raw(Box::new(Hasher::new()))
}

/// A new keyed hasher, or null if `key` is null.
///
/// # Safety
///
/// `key` must be null or point to 32 readable bytes.
#[no_mangle]
pub unsafe extern "C" fn b3_hasher_new_keyed(key: *const [u8; KEY_LEN]) -> *mut Hasher {
    match key.as_ref() {
        Some(key) => Box::into_raw(Box::new(Hasher::new_keyed(key))),
        None => {
            debug!(call = "b3_hasher_new_keyed", "null key");
            ptr::null_mut()
        }
    }
}

/// A new key-derivation hasher for a NUL-terminated, UTF-8 context string.
///
/// On failure returns null and, if `err` isn't null, stores a message in
/// `*err`.
///
/// # Safety
///
/// `context` must be null or a valid NUL-terminated string, and `err` must
/// be null or writable.
#[no_mangle]
pub unsafe extern "C" fn b3_hasher_new_derive_key(
    context: *const c_char,
    err: *mut *mut c_char,
) -> *mut Hasher {
    let result = if context.is_null() {
        Err(error_string("b3_hasher_new_derive_key", Error::NullInput))
    } else {
        CStr::from_ptr(context)
            .to_str()
            .map_err(|e| error_string("b3_hasher_new_derive_key", e))
    };
    match result {
        Ok(context) => Box::into_raw(Box::new(Hasher::new_derive_key(context))),
        Err(message) => {
            match err.as_mut() {
                Some(err) => *err = message,
                None => b3_free_char_pointer(message),
            }
            ptr::null_mut()
        }
    }
}

/// Feed `len` bytes at `buf` into the hasher.
///
/// # Safety
///
/// `hasher` must be a live handle from this module. `buf` must be null, or
/// valid for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn b3_hasher_update(
    hasher: *mut Hasher,
    buf: *const u8,
    len: usize,
) -> *mut c_char {
    let Some(hasher) = hasher.as_mut() else {
        return error_string("b3_hasher_update", Error::NullInput);
    };
    match input_slice(buf, len) {
        Ok(input) => {
            hasher.update(input);
            ptr::null_mut()
        }
        Err(e) => error_string("b3_hasher_update", e),
    }
}

/// Write the 32-byte digest to `out`. Does nothing if either pointer is null.
///
/// # Safety
///
/// `hasher` must be null or a live handle, and `out` must be null or
/// writable for 32 bytes.
#[no_mangle]
pub unsafe extern "C" fn b3_hasher_finalize(hasher: *const Hasher, out: *mut [u8; OUT_LEN]) {
    if let (Some(hasher), Some(out)) = (hasher.as_ref(), out.as_mut()) {
        *out = hasher.finalize().into();
    }
}

/// An output reader positioned at 0, or null if `hasher` is null.
///
/// # Safety
///
/// `hasher` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn b3_hasher_finalize_xof(hasher: *const Hasher) -> *mut OutputReader {
    match hasher.as_ref() {
        Some(hasher) => Box::into_raw(Box::new(hasher.finalize_xof())),
        None => ptr::null_mut(),
    }
}

/// # Safety
///
/// `reader` must be null or a live handle, and `buf` must be null or writable
/// for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn b3_output_reader_fill(reader: *mut OutputReader, buf: *mut u8, len: usize) {
    let Some(reader) = reader.as_mut() else {
        return;
    };
    if buf.is_null() {
        if len > 0 {
            debug!(call = "b3_output_reader_fill", len, "null output buffer");
        }
        return;
    }
    reader.fill(slice::from_raw_parts_mut(buf, len));
}

/// # Safety
///
/// `hasher` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn b3_hasher_reset(hasher: *mut Hasher) {
    if let Some(hasher) = hasher.as_mut() {
        hasher.reset();
    }
}

/// Total bytes hashed so far, 0 for a null handle.
///
/// # Safety
///
/// `hasher` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn b3_hasher_count(hasher: *const Hasher) -> u64 {
    hasher.as_ref().map_or(0, Hasher::count)
}

/// The lowercase hex encoding of a 32-byte hash, or null if `hash` is null.
///
/// # Safety
///
/// `hash` must be null or point to 32 readable bytes.
#[no_mangle]
pub unsafe extern "C" fn b3_hash_to_hex(hash: *const [u8; OUT_LEN]) -> *mut c_char {
    let Some(bytes) = hash.as_ref() else {
        return ptr::null_mut();
    };
    CString::new(Hash::from_bytes(*bytes).to_hex().as_str())
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

/// Parse 64 hex characters into `out`. Leaves `out` untouched on failure.
///
/// # Safety
///
/// `hex` must be null or a valid NUL-terminated string, and `out` must be
/// null or writable for 32 bytes.
#[no_mangle]
pub unsafe extern "C" fn b3_hex_to_hash(hex: *const c_char, out: *mut [u8; OUT_LEN]) -> *mut c_char {
    if hex.is_null() || out.is_null() {
        return error_string("b3_hex_to_hash", Error::NullInput);
    }
    match Hash::from_hex(CStr::from_ptr(hex).to_bytes()) {
        Ok(hash) => {
            *out = hash.into();
            ptr::null_mut()
        }
        Err(e) => error_string("b3_hex_to_hash", Error::from(e)),
    }
}

/// Hash `size` bytes starting at `begin` in one shot, writing the 32-byte
/// digest to `out`.
///
/// # Safety
///
/// `begin` must be null or valid for `size` bytes, and `out` must be null or
/// writable for 32 bytes.
#[no_mangle]
pub unsafe extern "C" fn b3_apply_shim(
    begin: *const c_char,
    size: u32,
    out: *mut u8,
) -> *mut c_char {
    if out.is_null() {
        return error_string("b3_apply_shim", Error::NullInput);
    }
    match input_slice(begin.cast(), size as usize) {
        Ok(input) => {
            let hash = crate::hash(input);
            ptr::copy_nonoverlapping(hash.as_bytes().as_ptr(), out, OUT_LEN);
            ptr::null_mut()
        }
        Err(e) => error_string("b3_apply_shim", e),
    }
}

/// # Safety
///
/// `ptr_to_free` must be null or a handle from this module not yet freed.
#[no_mangle]
pub unsafe extern "C" fn b3_free_hasher(ptr_to_free: *mut Hasher) {
    if !ptr_to_free.is_null() {
        drop(Box::from_raw(ptr_to_free));
    }
}

/// # Safety
///
/// `ptr_to_free` must be null or a handle from this module not yet freed.
#[no_mangle]
pub unsafe extern "C" fn b3_free_output_reader(ptr_to_free: *mut OutputReader) {
    if !ptr_to_free.is_null() {
        drop(Box::from_raw(ptr_to_free));
    }
}

/// # Safety
///
/// `ptr_to_free` must be null or a string returned by this module, not yet
/// freed.
#[no_mangle]
pub unsafe extern "C" fn b3_free_char_pointer(ptr_to_free: *mut c_char) {
    if !ptr_to_free.is_null() {
        drop(CString::from_raw(ptr_to_free));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::{paint_test_input, TEST_KEY};

    unsafe fn take_message(message: *mut c_char) -> Option<String> {
        if message.is_null() {
            return None;
        }
        let text = CStr::from_ptr(message).to_string_lossy().into_owned();
        b3_free_char_pointer(message);
        Some(text)
    }

    #[test]
    fn test_hasher_lifecycle() {
        let mut input = [0; 3000];
        paint_test_input(&mut input);
        unsafe {
            let hasher = b3_hasher_new();
            assert!(take_message(b3_hasher_update(hasher, input.as_ptr(), 1000)).is_none());
            assert!(take_message(b3_hasher_update(hasher, input[1000..].as_ptr(), 2000)).is_none());
            assert_eq!(b3_hasher_count(hasher), 3000);

            let mut out = [0; 32];
            b3_hasher_finalize(hasher, &mut out);
            assert_eq!(crate::hash(&input), out);

            let reader = b3_hasher_finalize_xof(hasher);
            let mut xof = [0; 100];
            b3_output_reader_fill(reader, xof.as_mut_ptr(), 40);
            b3_output_reader_fill(reader, xof[40..].as_mut_ptr(), 60);
            assert_eq!(&xof[..32], &out[..]);
            let mut expected = [0; 100];
            crate::Hasher::new().update(&input).finalize_xof().fill(&mut expected);
            assert_eq!(xof, expected);
            b3_free_output_reader(reader);

            b3_hasher_reset(hasher);
            assert_eq!(b3_hasher_count(hasher), 0);
            b3_hasher_finalize(hasher, &mut out);
            assert_eq!(crate::hash(b""), out);
            b3_free_hasher(hasher);
        }
    }

    #[test]
    fn test_null_input_rejected() {
        unsafe {
            let hasher = b3_hasher_new();
            b3_hasher_update(hasher, b"abc".as_ptr(), 3);
            let message = take_message(b3_hasher_update(hasher, ptr::null(), 5));
            assert_eq!(message.as_deref(), Some("null input buffer with nonzero length"));
            // The failed call left the state alone, and an empty null update is fine.
            assert!(take_message(b3_hasher_update(hasher, ptr::null(), 0)).is_none());
            assert_eq!(b3_hasher_count(hasher), 3);
            let mut out = [0; 32];
            b3_hasher_finalize(hasher, &mut out);
            assert_eq!(crate::hash(b"abc"), out);
            b3_free_hasher(hasher);
        }
    }

    #[test]
    fn test_keyed_and_derive_key() {
        unsafe {
            assert!(b3_hasher_new_keyed(ptr::null()).is_null());

            let keyed = b3_hasher_new_keyed(&TEST_KEY);
            b3_hasher_update(keyed, b"mac me".as_ptr(), 6);
            let mut out = [0; 32];
            b3_hasher_finalize(keyed, &mut out);
            assert_eq!(crate::keyed_hash(&TEST_KEY, b"mac me"), out);
            b3_free_hasher(keyed);

            let mut err: *mut c_char = ptr::null_mut();
            let kdf = b3_hasher_new_derive_key(c"ffi context".as_ptr(), &mut err);
            assert!(err.is_null());
            b3_hasher_update(kdf, b"material".as_ptr(), 8);
            b3_hasher_finalize(kdf, &mut out);
            assert_eq!(crate::derive_key("ffi context", b"material"), out);
            b3_free_hasher(kdf);

            let invalid_utf8 = c"\xff\xfe";
            let kdf = b3_hasher_new_derive_key(invalid_utf8.as_ptr(), &mut err);
            assert!(kdf.is_null());
            assert!(take_message(err).is_some());
        }
    }

    #[test]
    fn test_hex_round_trip() {
        let digest_str = c"04e0bb39f30b1a3feb89f536c93be15055482df748674b00d26e5a75777702e9";
        unsafe {
            let mut out = [0; 32];
            assert!(take_message(b3_hex_to_hash(digest_str.as_ptr(), &mut out)).is_none());
            assert_eq!(crate::hash(b"foo"), out);

            let hex = take_message(b3_hash_to_hex(&out));
            assert_eq!(hex.as_deref(), digest_str.to_str().ok());

            let mut untouched = [7; 32];
            let message = take_message(b3_hex_to_hash(c"abc".as_ptr(), &mut untouched));
            assert_eq!(message.as_deref(), Some("expected 64 hex bytes, received 3"));
            assert_eq!(untouched, [7; 32]);
        }
    }

    #[test]
    fn test_apply_shim() {
        let input = b"one shot through the shim";
        let mut out = [0; 32];
        unsafe {
            let message = b3_apply_shim(input.as_ptr().cast(), input.len() as u32, out.as_mut_ptr());
            assert!(take_message(message).is_none());
            assert_eq!(crate::hash(input), out);

            assert!(take_message(b3_apply_shim(ptr::null(), 4, out.as_mut_ptr())).is_some());
            assert!(take_message(b3_apply_shim(ptr::null(), 0, out.as_mut_ptr())).is_none());
            assert_eq!(crate::hash(b""), out);
        }
    }

    #[test]
    fn test_free_null_is_noop() {
        unsafe {
            b3_free_hasher(ptr::null_mut());
            b3_free_output_reader(ptr::null_mut());
            b3_free_char_pointer(ptr::null_mut());
            assert!(b3_hasher_finalize_xof(ptr::null()).is_null());
            assert_eq!(b3_hasher_count(ptr::null()), 0);
        }
    }
}
