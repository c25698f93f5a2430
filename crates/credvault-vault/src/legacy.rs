// SPDX-FileCopyrightText: 2026 Credvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read compatibility for nonce fields written by older clients.
//!
//! An earlier client persisted the base64 *text* of each nonce instead of the
//! raw nonce bytes. Such rows still decrypt once the nonce is decoded one more
//! time. Everything here is a compatibility shim: once no such rows remain,
//! this module and its single call site in the lifecycle can be removed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use credvault_core::VaultError;

/// How a stored nonce field was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceEncoding {
    /// The field holds the nonce itself.
    Raw,
    /// The field holds padded standard-alphabet base64 text of the nonce.
    Base64Text,
}

/// Length of padded base64 text for `raw_len` bytes.
pub const fn base64_text_len(raw_len: usize) -> usize {
    raw_len.div_ceil(3) * 4
}

fn is_base64_alphabet(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

/// Recover a raw nonce of `expected_len` bytes from a stored field.
///
/// Returns the raw nonce and the encoding it was found in. A field that is
/// neither the raw length nor decodable base64 text of that length is rejected.
pub fn normalize_nonce(
    stored: &[u8],
    expected_len: usize,
) -> Result<(Vec<u8>, NonceEncoding), VaultError> {
    if stored.len() == expected_len {
        return Ok((stored.to_vec(), NonceEncoding::Raw));
    }

    if stored.len() == base64_text_len(expected_len)
        && is_base64_alphabet(stored)
        && let Ok(decoded) = STANDARD.decode(stored)
        && decoded.len() == expected_len
    {
        return Ok((decoded, NonceEncoding::Base64Text));
    }

    Err(VaultError::MalformedCiphertext(format!(
        "stored nonce is {} bytes, expected {expected_len} raw or {} base64",
        stored.len(),
        base64_text_len(expected_len)
    )))
}
