// src/core/crypto/codec.rs
//! Chunked codec: frames plaintext into independently sealed chunks
//!
//! Container forms (binary):
//! ```text
//! single-shot: [12 bytes: nonce][N + 16 bytes: ciphertext‖tag]
//! streaming:   "EV1\0" { [4 bytes: len, u32 LE][12 bytes: nonce][len bytes: ciphertext‖tag] }* EOF
//! ```
//!
//! Encode fixes the 64 KiB block size; decode trusts only the length
//! prefixes, so any block size written by any encoder decodes.

use std::io::{ErrorKind, Read, Write};

use crate::aliases::{MasterKey32, PlainText};
use crate::consts::{
    CHUNK_SIZE, LENGTH_PREFIX_SIZE, MAGIC_SIZE, NONCE_SIZE, STREAM_MAGIC, TAG_SIZE,
};
use crate::enums::ContainerFormat;
use crate::error::{CoreError, IoStage, Result};

use super::aead::{generate_nonce, Cipher, NonceBytes};

/// Chunk and byte counts for one streamed encode or decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub chunks: u64,
    pub plaintext_bytes: u64,
}

/// Outcome of decoding a container of either form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub format: ContainerFormat,
    pub plaintext_bytes: u64,
}

/// Seal the whole plaintext once: `nonce ‖ ciphertext‖tag`, no header
pub fn encode_single_shot(cipher: &Cipher, plaintext: &[u8]) -> Result<Vec<u8>> {
    let nonce = single_shot_nonce();
    let ciphertext = cipher.seal(&nonce, plaintext)?;
    let mut container = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    container.extend_from_slice(&nonce);
    container.extend_from_slice(&ciphertext);
    Ok(container)
}

/// Fresh nonce that cannot be mistaken for the streaming header
pub fn single_shot_nonce() -> NonceBytes {
    draw_nonce_without_magic(generate_nonce)
}

fn draw_nonce_without_magic(mut draw: impl FnMut() -> NonceBytes) -> NonceBytes {
    loop {
        let nonce = draw();
        if !nonce.starts_with(STREAM_MAGIC) {
            return nonce;
        }
    }
}

pub fn decode_single_shot(cipher: &Cipher, container: &[u8]) -> Result<PlainText> {
    if container.len() < NONCE_SIZE {
        return Err(CoreError::TooShort {
            len: container.len(),
        });
    }
    let (nonce, ciphertext) = container.split_at(NONCE_SIZE);
    let nonce: NonceBytes = nonce.try_into().map_err(|_| CoreError::TooShort {
        len: container.len(),
    })?;
    Ok(PlainText::new(cipher.open(&nonce, ciphertext)?))
}

/// Write the magic header, then one sealed chunk per 64 KiB plaintext block
///
/// An empty source yields the bare header: a valid, empty object.
pub fn encode_stream<R: Read, W: Write>(
    cipher: &Cipher,
    mut reader: R,
    mut writer: W,
) -> Result<StreamSummary> {
    writer
        .write_all(STREAM_MAGIC)
        .stage("writing stream header")?;

    let mut block = vec![0u8; CHUNK_SIZE];
    let mut summary = StreamSummary::default();
    loop {
        let filled = fill(&mut reader, &mut block).stage("reading plaintext")?;
        if filled == 0 {
            break;
        }
        write_chunk(cipher, &block[..filled], &mut writer)?;
        summary.chunks += 1;
        summary.plaintext_bytes += filled as u64;
        if filled < CHUNK_SIZE {
            break;
        }
    }

    writer.flush().stage("flushing sealed chunks")?;
    Ok(summary)
}

fn write_chunk<W: Write>(cipher: &Cipher, plaintext: &[u8], writer: &mut W) -> Result<()> {
    let (nonce, ciphertext) = cipher.seal_fresh(plaintext)?;
    let len = u32::try_from(ciphertext.len()).map_err(|_| CoreError::Encryption)?;
    writer
        .write_all(&len.to_le_bytes())
        .stage("writing chunk length")?;
    writer.write_all(&nonce).stage("writing chunk nonce")?;
    writer
        .write_all(&ciphertext)
        .stage("writing chunk ciphertext")?;
    Ok(())
}

/// Open sealed chunks until input runs out, writing each plaintext chunk as it opens
///
/// The reader must already be positioned past the magic header.
pub fn decode_stream<R: Read, W: Write>(
    cipher: &Cipher,
    mut reader: R,
    mut writer: W,
) -> Result<StreamSummary> {
    let mut summary = StreamSummary::default();
    while let Some(len) = read_length_prefix(&mut reader, summary.chunks)? {
        if (len as usize) < TAG_SIZE {
            return Err(CoreError::CorruptFraming(format!(
                "chunk {}: length {len} is shorter than the authentication tag",
                summary.chunks
            )));
        }

        let mut nonce: NonceBytes = [0u8; NONCE_SIZE];
        let got = fill(&mut reader, &mut nonce).stage("reading chunk nonce")?;
        if got != NONCE_SIZE {
            return Err(CoreError::CorruptFraming(format!(
                "chunk {}: truncated nonce ({got} of {NONCE_SIZE} bytes)",
                summary.chunks
            )));
        }

        let ciphertext = read_body(&mut reader, len, summary.chunks)?;
        let plaintext = PlainText::new(cipher.open(&nonce, &ciphertext)?);
        writer
            .write_all(plaintext.expose_secret())
            .stage("writing plaintext chunk")?;

        summary.chunks += 1;
        summary.plaintext_bytes += plaintext.expose_secret().len() as u64;
    }

    writer.flush().stage("flushing plaintext")?;
    Ok(summary)
}

/// `None` on a clean end of input; a partial prefix is corrupt framing
fn read_length_prefix<R: Read>(reader: &mut R, index: u64) -> Result<Option<u32>> {
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    match fill(reader, &mut prefix).stage("reading chunk length")? {
        0 => Ok(None),
        LENGTH_PREFIX_SIZE => Ok(Some(u32::from_le_bytes(prefix))),
        got => Err(CoreError::CorruptFraming(format!(
            "chunk {index}: truncated length prefix ({got} of {LENGTH_PREFIX_SIZE} bytes)"
        ))),
    }
}

// `take` keeps a forged length from allocating more than the input holds
fn read_body<R: Read>(reader: &mut R, len: u32, index: u64) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    reader
        .by_ref()
        .take(u64::from(len))
        .read_to_end(&mut body)
        .stage("reading chunk ciphertext")?;
    if body.len() != len as usize {
        return Err(CoreError::CorruptFraming(format!(
            "chunk {index}: expected {len} ciphertext bytes, found {}",
            body.len()
        )));
    }
    Ok(body)
}

/// Read until `buf` is full or the reader is exhausted
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Peek the header of any container and decode it through the matching path
pub fn decode_container<R: Read, W: Write>(
    cipher: &Cipher,
    mut reader: R,
    mut writer: W,
) -> Result<Decoded> {
    let mut header = [0u8; MAGIC_SIZE];
    let peeked = fill(&mut reader, &mut header).stage("reading container header")?;

    match ContainerFormat::sniff(&header[..peeked]) {
        ContainerFormat::Streaming => {
            let summary = decode_stream(cipher, reader, writer)?;
            Ok(Decoded {
                format: ContainerFormat::Streaming,
                plaintext_bytes: summary.plaintext_bytes,
            })
        }
        ContainerFormat::SingleShot => {
            let mut container = header[..peeked].to_vec();
            reader
                .read_to_end(&mut container)
                .stage("reading single-shot container")?;
            let plaintext = decode_single_shot(cipher, &container)?;
            writer
                .write_all(plaintext.expose_secret())
                .stage("writing plaintext")?;
            writer.flush().stage("flushing plaintext")?;
            Ok(Decoded {
                format: ContainerFormat::SingleShot,
                plaintext_bytes: plaintext.expose_secret().len() as u64,
            })
        }
    }
}

/// Encrypt plaintext in memory → single-shot container
pub fn encrypt_to_vec(plaintext: &[u8], key: &MasterKey32) -> Result<Vec<u8>> {
    encode_single_shot(&Cipher::from_master_key(key), plaintext)
}

/// Decrypt a container of either form in memory
pub fn decrypt_to_vec(container: &[u8], key: &MasterKey32) -> Result<PlainText> {
    let mut out = Vec::new();
    decode_container(&Cipher::from_master_key(key), container, &mut out)?;
    Ok(PlainText::new(out))
}
