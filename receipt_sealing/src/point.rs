// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! SEC1 encodings of P-256 public keys.
//!
//! - compressed: `0x02 | 0x03` (parity of y) followed by the 32-byte x
//! - uncompressed: `0x04` followed by the 32-byte x and the 32-byte y
//!
//! Decompression solves the curve equation for y and keeps the root whose
//! parity matches the tag. An x with no root is not on the curve.

use p256::{
    elliptic_curve::{point::DecompressPoint, sec1::ToEncodedPoint, subtle::Choice},
    AffinePoint, FieldBytes, PublicKey,
};

use crate::PointError;

pub const COMPRESSED_LEN: usize = 33;
pub const UNCOMPRESSED_LEN: usize = 65;

pub const TAG_EVEN: u8 = 0x02;
pub const TAG_ODD: u8 = 0x03;
pub const TAG_UNCOMPRESSED: u8 = 0x04;

const COORDINATE_LEN: usize = 32;

pub fn to_uncompressed(key: &PublicKey) -> [u8; UNCOMPRESSED_LEN] {
    let mut out = [0u8; UNCOMPRESSED_LEN];
    // A public key is never the identity, so this is always the full form.
    out.copy_from_slice(key.to_encoded_point(false).as_bytes());
    out
}

pub fn compress(key: &PublicKey) -> [u8; COMPRESSED_LEN] {
    let uncompressed = to_uncompressed(key);
    let y_is_odd = uncompressed[UNCOMPRESSED_LEN - 1] & 1 == 1;

    let mut out = [0u8; COMPRESSED_LEN];
    out[0] = if y_is_odd { TAG_ODD } else { TAG_EVEN };
    out[1..].copy_from_slice(&uncompressed[1..=COORDINATE_LEN]);
    out
}

pub fn decompress(bytes: &[u8]) -> Result<PublicKey, PointError> {
    if bytes.len() != COMPRESSED_LEN {
        return Err(PointError::InvalidLength {
            expected: COMPRESSED_LEN,
            actual: bytes.len(),
        });
    }
    let y_is_odd = match bytes[0] {
        TAG_EVEN => Choice::from(0),
        TAG_ODD => Choice::from(1),
        tag => return Err(PointError::InvalidTag(tag)),
    };

    let mut x = FieldBytes::default();
    x.copy_from_slice(&bytes[1..]);
    let point: Option<AffinePoint> = AffinePoint::decompress(&x, y_is_odd).into();
    let point = point.ok_or(PointError::NotOnCurve)?;
    PublicKey::from_affine(point).map_err(|_| PointError::NotOnCurve)
}

pub fn from_uncompressed(bytes: &[u8]) -> Result<PublicKey, PointError> {
    if bytes.len() != UNCOMPRESSED_LEN {
        return Err(PointError::InvalidLength {
            expected: UNCOMPRESSED_LEN,
            actual: bytes.len(),
        });
    }
    if bytes[0] != TAG_UNCOMPRESSED {
        return Err(PointError::InvalidTag(bytes[0]));
    }
    PublicKey::from_sec1_bytes(bytes).map_err(|_| PointError::NotOnCurve)
}

#[cfg(test)]
mod tests {
    use p256::SecretKey;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::*;

    use super::*;

    fn public_keys(count: u64) -> Vec<PublicKey> {
        let mut rng = StdRng::seed_from_u64(42);
        (0..count)
            .map(|_| SecretKey::random(&mut rng).public_key())
            .collect()
    }

    #[test]
    fn compress_then_decompress() {
        for key in public_keys(32) {
            let compressed = compress(&key);
            assert_eq!(compressed.len(), COMPRESSED_LEN);
            assert!(compressed[0] == TAG_EVEN || compressed[0] == TAG_ODD);
            assert_eq!(decompress(&compressed).unwrap(), key);
        }
    }

    #[test]
    fn parity_tag_follows_y() {
        for key in public_keys(32) {
            let uncompressed = to_uncompressed(&key);
            let expected = if uncompressed[64] % 2 == 0 {
                TAG_EVEN
            } else {
                TAG_ODD
            };
            assert_eq!(compress(&key)[0], expected);
        }
    }

    #[test]
    fn matches_sec1_encoding() {
        for key in public_keys(8) {
            assert_eq!(&compress(&key)[..], key.to_encoded_point(true).as_bytes());
        }
    }

    #[test]
    fn uncompressed_round_trip() {
        for key in public_keys(8) {
            let bytes = to_uncompressed(&key);
            assert_eq!(bytes[0], TAG_UNCOMPRESSED);
            assert_eq!(from_uncompressed(&bytes).unwrap(), key);
        }
    }

    #[test]
    fn flipping_the_tag_gives_the_negated_point() {
        let key = public_keys(1).remove(0);
        let mut compressed = compress(&key);
        compressed[0] ^= 0x01;
        let other = decompress(&compressed).unwrap();
        assert_ne!(other, key);
        assert_eq!(&compress(&other)[1..], &compress(&key)[1..]);
    }

    #[rstest]
    #[case::empty(vec![], PointError::InvalidLength { expected: 33, actual: 0 })]
    #[case::too_long(vec![0x02; 34], PointError::InvalidLength { expected: 33, actual: 34 })]
    #[case::uncompressed_tag(vec![0x04; 33], PointError::InvalidTag(0x04))]
    #[case::zero_tag([vec![0x00], vec![0x01; 32]].concat(), PointError::InvalidTag(0x00))]
    // x = p, outside the field
    #[case::x_not_reduced(
        [vec![0x02], vec![0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01], vec![0x00; 12], vec![0xff; 12]].concat(),
        PointError::NotOnCurve
    )]
    fn malformed_compressed_points(#[case] bytes: Vec<u8>, #[case] expected: PointError) {
        assert_eq!(decompress(&bytes).unwrap_err(), expected);
    }

    #[test]
    fn some_x_values_have_no_point() {
        // Roughly half of all x coordinates are not on the curve.
        let rejected = (1u8..=32)
            .filter(|i| {
                let mut bytes = [*i; COMPRESSED_LEN];
                bytes[0] = TAG_EVEN;
                decompress(&bytes) == Err(PointError::NotOnCurve)
            })
            .count();
        assert!(rejected > 0);
    }

    #[test]
    fn malformed_uncompressed_points() {
        let key = public_keys(1).remove(0);
        let mut bytes = to_uncompressed(&key);

        assert_eq!(
            from_uncompressed(&bytes[..64]),
            Err(PointError::InvalidLength {
                expected: 65,
                actual: 64
            })
        );

        bytes[0] = TAG_EVEN;
        assert_eq!(from_uncompressed(&bytes), Err(PointError::InvalidTag(TAG_EVEN)));

        bytes[0] = TAG_UNCOMPRESSED;
        bytes[64] ^= 0x01;
        assert_eq!(from_uncompressed(&bytes), Err(PointError::NotOnCurve));
    }
}
