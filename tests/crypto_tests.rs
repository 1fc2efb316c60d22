// tests/crypto_tests.rs
use std::io::{self, Cursor};

use crypta_vault::consts::{CHUNK_SIZE, NONCE_SIZE, STREAM_MAGIC, TAG_SIZE};
use crypta_vault::core::crypto::*;
use crypta_vault::error::CoreError;
use crypta_vault::{generate_key, key_from_hex, key_from_slice, ContainerFormat, SecureConversionsExt};

mod common;
mod support;
use support::{chunk_lengths, fixed_key};

fn stream_encode(cipher: &Cipher, plaintext: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    encode_stream(cipher, Cursor::new(plaintext), &mut out).unwrap();
    out
}

fn decode_any(cipher: &Cipher, container: &[u8]) -> Result<Vec<u8>, CoreError> {
    let mut out = Vec::new();
    decode_container(cipher, Cursor::new(container), &mut out)?;
    Ok(out)
}

#[test]
fn test_generate_key_is_random_and_32_bytes() {
    common::setup();
    let key1 = generate_key();
    let key2 = generate_key();
    assert_eq!(key1.expose_secret().len(), 32);
    assert_ne!(
        key1.expose_secret().as_slice(),
        key2.expose_secret().as_slice()
    );
}

#[test]
fn test_key_from_slice_rejects_wrong_lengths() {
    assert!(matches!(
        key_from_slice(&[0u8; 31]),
        Err(CoreError::InvalidKey { len: 31 })
    ));
    assert!(matches!(
        key_from_slice(&[]),
        Err(CoreError::InvalidKey { len: 0 })
    ));
    assert!(key_from_slice(&[0u8; 32]).is_ok());
}

#[test]
fn test_key_from_hex_roundtrips_through_to_hex() {
    let key = fixed_key(0xAB);
    let parsed = key_from_hex(&key.expose_secret().to_hex()).unwrap();
    assert_eq!(parsed.expose_secret(), key.expose_secret());
    assert!(key_from_hex("abcd").is_err());
    assert!(key_from_hex("not hex at all").is_err());
}

#[test]
fn test_single_shot_layout_is_nonce_then_sealed_bytes() {
    common::setup();
    let cipher = Cipher::from_master_key(&fixed_key(1));
    let container = encode_single_shot(&cipher, b"hello").unwrap();

    assert_eq!(container.len(), NONCE_SIZE + 5 + TAG_SIZE);
    assert_ne!(&container[..4], STREAM_MAGIC);

    let nonce: NonceBytes = container[..NONCE_SIZE].try_into().unwrap();
    let opened = cipher.open(&nonce, &container[NONCE_SIZE..]).unwrap();
    assert_eq!(opened, b"hello");
}

#[test]
fn test_roundtrip_both_forms_including_empty() {
    common::setup();
    let cipher = Cipher::from_master_key(&generate_key());
    let inputs: [&[u8]; 4] = [b"", b"x", b"Attack at dawn!", &[0x5A; CHUNK_SIZE * 2 + 17]];

    for plaintext in inputs {
        let single = encode_single_shot(&cipher, plaintext).unwrap();
        let opened = decode_single_shot(&cipher, &single).unwrap();
        assert_eq!(opened.expose_secret().as_slice(), plaintext);

        let streamed = stream_encode(&cipher, plaintext);
        assert_eq!(decode_any(&cipher, &streamed).unwrap(), plaintext);
    }
}

#[test]
fn test_empty_stream_is_bare_header() {
    let cipher = Cipher::from_master_key(&fixed_key(2));
    let mut out = Vec::new();
    let summary = encode_stream(&cipher, io::empty(), &mut out).unwrap();

    assert_eq!(out, STREAM_MAGIC);
    assert_eq!(summary, StreamSummary::default());

    let decoded = decode_container(&cipher, Cursor::new(&out), io::sink()).unwrap();
    assert_eq!(decoded.format, ContainerFormat::Streaming);
    assert_eq!(decoded.plaintext_bytes, 0);
}

#[test]
fn test_stream_splits_into_64k_chunks() {
    let cipher = Cipher::from_master_key(&fixed_key(3));
    let plaintext = vec![7u8; CHUNK_SIZE * 3 + 100];
    let mut out = Vec::new();
    let summary = encode_stream(&cipher, Cursor::new(&plaintext), &mut out).unwrap();

    assert_eq!(summary.chunks, 4);
    assert_eq!(summary.plaintext_bytes, plaintext.len() as u64);
    assert_eq!(
        chunk_lengths(&out),
        vec![
            CHUNK_SIZE + TAG_SIZE,
            CHUNK_SIZE + TAG_SIZE,
            CHUNK_SIZE + TAG_SIZE,
            100 + TAG_SIZE
        ]
    );
}

#[test]
fn test_exact_multiple_of_chunk_size_has_no_trailing_empty_chunk() {
    let cipher = Cipher::from_master_key(&fixed_key(4));
    let out = stream_encode(&cipher, &vec![1u8; CHUNK_SIZE * 2]);
    assert_eq!(chunk_lengths(&out).len(), 2);
}

#[test]
fn test_decode_trusts_length_prefix_not_chunk_size() {
    // Hand-framed stream with odd chunk sizes no encoder here would choose
    let key = [9u8; 32];
    let cipher = Cipher::new(&key).unwrap();
    let mut framed = STREAM_MAGIC.to_vec();
    for part in [&b"abc"[..], &b""[..], &b"defghij"[..]] {
        let nonce = generate_nonce();
        let sealed = seal(&key, &nonce, part).unwrap();
        framed.extend_from_slice(&(sealed.len() as u32).to_le_bytes());
        framed.extend_from_slice(&nonce);
        framed.extend_from_slice(&sealed);
    }

    let mut out = Vec::new();
    let summary = decode_stream(&cipher, Cursor::new(&framed[4..]), &mut out).unwrap();
    assert_eq!(out, b"abcdefghij");
    assert_eq!(summary.chunks, 3);
}

#[test]
fn test_format_dispatch_by_header() {
    assert_eq!(ContainerFormat::sniff(b"EV1\0rest"), ContainerFormat::Streaming);
    assert_eq!(ContainerFormat::sniff(b"EV1\x01"), ContainerFormat::SingleShot);
    assert_eq!(ContainerFormat::sniff(b"EV1"), ContainerFormat::SingleShot);
    assert_eq!(ContainerFormat::sniff(b""), ContainerFormat::SingleShot);

    let cipher = Cipher::from_master_key(&fixed_key(5));
    let single = encode_single_shot(&cipher, b"payload").unwrap();
    let streamed = stream_encode(&cipher, b"payload");

    let d1 = decode_container(&cipher, Cursor::new(&single), io::sink()).unwrap();
    let d2 = decode_container(&cipher, Cursor::new(&streamed), io::sink()).unwrap();
    assert_eq!(d1.format, ContainerFormat::SingleShot);
    assert_eq!(d2.format, ContainerFormat::Streaming);
}

#[test]
fn test_short_non_magic_input_is_too_short() {
    let cipher = Cipher::from_master_key(&fixed_key(6));
    for len in [0, 1, 3, 4, NONCE_SIZE - 1] {
        let junk = vec![0xEEu8; len];
        assert!(
            matches!(decode_any(&cipher, &junk), Err(CoreError::TooShort { len: l }) if l == len),
            "length {len}"
        );
    }
    // Exactly one nonce and nothing else fails authentication instead
    assert!(matches!(
        decode_any(&cipher, &[0xEE; NONCE_SIZE]),
        Err(CoreError::Authentication)
    ));
}

#[test]
fn test_key_mismatch_never_returns_plaintext() {
    let k1 = fixed_key(0x10);
    let k2 = fixed_key(0x11);
    let c1 = Cipher::from_master_key(&k1);
    let c2 = Cipher::from_master_key(&k2);

    let single = encrypt_to_vec(b"secret", &k1).unwrap();
    assert!(matches!(
        decrypt_to_vec(&single, &k2),
        Err(CoreError::Authentication)
    ));

    let streamed = stream_encode(&c1, &vec![3u8; CHUNK_SIZE + 1]);
    let mut sink = Vec::new();
    let err = decode_container(&c2, Cursor::new(&streamed), &mut sink).unwrap_err();
    assert!(matches!(err, CoreError::Authentication));
    assert!(sink.is_empty(), "no chunk may be released under the wrong key");
}

#[test]
fn test_every_bit_flip_is_detected_single_shot() {
    let cipher = Cipher::from_master_key(&fixed_key(0x20));
    let container = encode_single_shot(&cipher, b"five!").unwrap();

    for bit in 0..container.len() * 8 {
        let mut tampered = container.clone();
        tampered[bit / 8] ^= 1 << (bit % 8);
        let err = decode_any(&cipher, &tampered).unwrap_err();
        assert!(err.is_integrity_failure(), "bit {bit}: {err}");
    }
}

#[test]
fn test_every_bit_flip_is_detected_streaming() {
    let cipher = Cipher::from_master_key(&fixed_key(0x21));
    let container = stream_encode(&cipher, &[0xC3u8; 100]);

    for bit in 0..container.len() * 8 {
        let mut tampered = container.clone();
        tampered[bit / 8] ^= 1 << (bit % 8);
        let err = decode_any(&cipher, &tampered).unwrap_err();
        assert!(err.is_integrity_failure(), "bit {bit}: {err}");
    }
}

#[test]
fn test_truncated_stream_is_corrupt_framing() {
    let cipher = Cipher::from_master_key(&fixed_key(0x30));
    let container = stream_encode(&cipher, &vec![1u8; CHUNK_SIZE + 50]);
    let first_chunk_end = 4 + 4 + NONCE_SIZE + CHUNK_SIZE + TAG_SIZE;

    // Cut inside the second chunk's length prefix, nonce, and body
    for cut in [first_chunk_end + 2, first_chunk_end + 4 + 5, container.len() - 1] {
        let err = decode_any(&cipher, &container[..cut]).unwrap_err();
        assert!(matches!(err, CoreError::CorruptFraming(_)), "cut {cut}: {err}");
    }

    // Dropping a whole trailing chunk still decodes (no chunk count in the format)
    let out = decode_any(&cipher, &container[..first_chunk_end]).unwrap();
    assert_eq!(out.len(), CHUNK_SIZE);
}

#[test]
fn test_streaming_and_single_shot_agree() {
    let key = generate_key();
    let cipher = Cipher::from_master_key(&key);
    let plaintext: Vec<u8> = (0..CHUNK_SIZE * 2 + 999).map(|i| (i % 251) as u8).collect();

    let single = encrypt_to_vec(&plaintext, &key).unwrap();
    let streamed = stream_encode(&cipher, &plaintext);
    assert_ne!(single.len(), streamed.len());

    let a = decrypt_to_vec(&single, &key).unwrap();
    let b = decrypt_to_vec(&streamed, &key).unwrap();
    assert_eq!(a.expose_secret(), b.expose_secret());
    assert_eq!(a.expose_secret().as_slice(), plaintext.as_slice());
}
