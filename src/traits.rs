//! `Digest`, `Mac` and XOF trait implementations from the
//! [`digest`](https://crates.io/crates/digest) crate. `Hasher` is both a
//! fixed-output hash with a 64-byte block, for use inside generic code like
//! `hmac::SimpleHmac`, and a MAC keyed with a 32-byte key.

pub use digest;

use crate::{Hasher, OutputReader, KEY_LEN};
use digest::crypto_common;
use digest::generic_array::{typenum::U32, typenum::U64, GenericArray};

impl digest::HashMarker for Hasher {}
impl digest::MacMarker for Hasher {}

impl digest::Update for Hasher {
    #[inline]
    fn update(&mut self, data: &[u8]) {
        Hasher::update(self, data);
    }
}

impl digest::Reset for Hasher {
    #[inline]
    fn reset(&mut self) {
        Hasher::reset(self);
    }
}

impl digest::OutputSizeUser for Hasher {
    type OutputSize = U32;
}

impl crypto_common::BlockSizeUser for Hasher {
    type BlockSize = U64;
}

impl crypto_common::KeySizeUser for Hasher {
    type KeySize = U32;
}

impl digest::FixedOutput for Hasher {
    #[inline]
    fn finalize_into(self, out: &mut GenericArray<u8, Self::OutputSize>) {
        out.copy_from_slice(Hasher::finalize(&self).as_bytes());
    }
}

impl digest::FixedOutputReset for Hasher {
    #[inline]
    fn finalize_into_reset(&mut self, out: &mut GenericArray<u8, Self::OutputSize>) {
        out.copy_from_slice(Hasher::finalize(self).as_bytes());
        Hasher::reset(self);
    }
}

impl digest::ExtendableOutput for Hasher {
    type Reader = OutputReader;

    #[inline]
    fn finalize_xof(self) -> Self::Reader {
        Hasher::finalize_xof(&self)
    }
}

impl digest::ExtendableOutputReset for Hasher {
    #[inline]
    fn finalize_xof_reset(&mut self) -> Self::Reader {
        let reader = Hasher::finalize_xof(self);
        Hasher::reset(self);
        reader
    }
}

impl digest::XofReader for OutputReader {
    #[inline]
    fn read(&mut self, buffer: &mut [u8]) {
        self.fill(buffer);
    }
}

impl digest::KeyInit for Hasher {
    #[inline]
    fn new(key: &digest::Key<Self>) -> Self {
        let key_bytes: [u8; KEY_LEN] = (*key).into();
        Hasher::new_keyed(&key_bytes)
    }

    fn new_from_slice(key: &[u8]) -> Result<Self, digest::InvalidLength> {
        Hasher::new_keyed_from_slice(key).map_err(|_| digest::InvalidLength)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::{paint_test_input, TEST_KEY};

    #[test]
    fn test_digest_matches_inherent() {
        let mut expected_xof = [0; 301];
        crate::Hasher::new()
            .update(b"foobarbaz")
            .finalize_xof()
            .fill(&mut expected_xof);

        let mut hasher: crate::Hasher = digest::Digest::new();
        digest::Digest::update(&mut hasher, b"discarded");
        digest::Digest::reset(&mut hasher);
        digest::Digest::update(&mut hasher, b"foo");
        digest::Digest::update(&mut hasher, b"barbaz");
        let out = digest::Digest::finalize(hasher.clone());
        assert_eq!(crate::hash(b"foobarbaz").as_bytes(), &out[..]);

        let mut xof = [0; 301];
        digest::XofReader::read(
            &mut digest::ExtendableOutput::finalize_xof(hasher),
            &mut xof,
        );
        assert_eq!(expected_xof[..], xof[..]);
    }

    #[test]
    fn test_resetting_variants() {
        let expected = crate::hash(b"twice");
        let mut hasher = crate::Hasher::new();
        for _ in 0..2 {
            digest::Update::update(&mut hasher, b"twice");
            let mut out = [0; 32];
            digest::FixedOutputReset::finalize_into_reset(
                &mut hasher,
                GenericArray::from_mut_slice(&mut out),
            );
            assert_eq!(expected, out);
            assert_eq!(hasher.count(), 0);
        }

        digest::Update::update(&mut hasher, b"twice");
        let mut xof = [0; 32];
        digest::XofReader::read(
            &mut digest::ExtendableOutputReset::finalize_xof_reset(&mut hasher),
            &mut xof,
        );
        assert_eq!(expected, xof);
        assert_eq!(hasher.count(), 0);
    }

    #[test]
    fn test_mac_trait() {
        let expected = crate::keyed_hash(&TEST_KEY, b"authenticated");

        let mut mac: crate::Hasher = digest::Mac::new(&TEST_KEY.into());
        digest::Mac::update(&mut mac, b"discarded");
        digest::Mac::reset(&mut mac);
        digest::Mac::update(&mut mac, b"authenticated");
        assert!(digest::Mac::verify_slice(mac.clone(), expected.as_bytes()).is_ok());
        assert!(digest::Mac::verify_slice(mac.clone(), &[0; 32]).is_err());
        let out = digest::Mac::finalize(mac);
        assert_eq!(expected.as_bytes(), out.into_bytes().as_slice());
    }

    #[test]
    fn test_key_init_from_slice() {
        let hasher = <crate::Hasher as digest::KeyInit>::new_from_slice(&TEST_KEY).unwrap();
        assert_eq!(hasher.mode(), crate::Mode::KeyedHash);
        assert!(<crate::Hasher as digest::KeyInit>::new_from_slice(&TEST_KEY[..31]).is_err());
    }

    fn expected_hmac(key: &[u8], input: &[u8]) -> [u8; 32] {
        // HMAC over a 64-byte block, as in RFC 2104.
        let key_hash;
        let key_prime = if key.len() <= 64 {
            key
        } else {
            key_hash = *crate::hash(key).as_bytes();
            &key_hash
        };
        let mut ipad = [0x36; 64];
        let mut opad = [0x5c; 64];
        for (i, k) in key_prime.iter().enumerate() {
            ipad[i] ^= k;
            opad[i] ^= k;
        }
        let inner = crate::Hasher::new().update(&ipad).update(input).finalize();
        crate::Hasher::new()
            .update(&opad)
            .update(inner.as_bytes())
            .finalize()
            .into()
    }

    #[test]
    fn test_hmac_compatibility() {
        use hmac::{Mac, SimpleHmac};

        let mut input_bytes = vec![0; 4 * crate::CHUNK_LEN + 1];
        paint_test_input(&mut input_bytes);
        for input_len in [0, 1, 63, 64, 65, 1024, 1025, 4 * crate::CHUNK_LEN + 1] {
            let input = &input_bytes[..input_len];
            let mut x = SimpleHmac::<Hasher>::new_from_slice(input).unwrap();
            hmac::digest::Update::update(&mut x, input);
            let output = x.finalize().into_bytes();
            assert_eq!(expected_hmac(input, input), output.as_ref(), "{}", input_len);
        }
    }
}
