//! Signature block carried in the payload of a signature section
//!
//! ```text
//! 0x00  length          u32
//! 0x04  signature type  u32
//! 0x08  key name        64 bytes, NUL padded
//! 0x48  key hash        32 bytes
//! 0x68  signature       to the end of the section
//! ```

use crate::error::{Result, TftfError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{Cursor, Read, Write};
use std::str::FromStr;

pub const TFTF_SIGNATURE_KEY_NAME_LENGTH: usize = 64;
pub const TFTF_SIGNATURE_KEY_HASH_LENGTH: usize = 32;

/// Offset of the signature bytes, i.e. the size of the fixed part
pub const TFTF_SIGNATURE_OFF_KEY_SIGNATURE: usize = 0x68;

/// Signature algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureType {
    #[default]
    Unknown = 0x00,
    Rsa2048Sha256 = 0x01,
}

impl TryFrom<u32> for SignatureType {
    type Error = ();

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Unknown),
            0x01 => Ok(Self::Rsa2048Sha256),
            _ => Err(()),
        }
    }
}

impl FromStr for SignatureType {
    type Err = TftfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rsa2048-sha256" => Ok(Self::Rsa2048Sha256),
            _ => Err(TftfError::unsupported_signature_type(s)),
        }
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Rsa2048Sha256 => "rsa2048-sha256",
        };
        write!(f, "{}", name)
    }
}

/// Parsed signature block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBlock {
    /// Length of the whole block, signature bytes included
    pub length: u32,
    pub signature_type: SignatureType,
    /// Name of the signing key
    pub key_name: String,
    /// Hash identifying the public key
    pub key_hash: [u8; TFTF_SIGNATURE_KEY_HASH_LENGTH],
    pub signature: Vec<u8>,
}

impl SignatureBlock {
    /// Wrap a signature produced by an external signer
    pub fn new(
        signature_type: SignatureType,
        key_name: impl Into<String>,
        key_hash: [u8; TFTF_SIGNATURE_KEY_HASH_LENGTH],
        signature: Vec<u8>,
    ) -> Result<Self> {
        let key_name = key_name.into();
        if key_name.len() > TFTF_SIGNATURE_KEY_NAME_LENGTH {
            return Err(TftfError::invalid_signature_block(format!(
                "key name is {} bytes (max {})",
                key_name.len(),
                TFTF_SIGNATURE_KEY_NAME_LENGTH
            )));
        }
        let length = u32::try_from(TFTF_SIGNATURE_OFF_KEY_SIGNATURE + signature.len())
            .map_err(|_| TftfError::invalid_signature_block("signature too large"))?;

        Ok(Self {
            length,
            signature_type,
            key_name,
            key_hash,
            signature,
        })
    }

    /// Serialize the block to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer =
            Vec::with_capacity(TFTF_SIGNATURE_OFF_KEY_SIGNATURE + self.signature.len());
        buffer.write_u32::<LittleEndian>(self.length)?;
        buffer.write_u32::<LittleEndian>(self.signature_type as u32)?;

        let name_bytes = self.key_name.as_bytes();
        let name_len = name_bytes.len().min(TFTF_SIGNATURE_KEY_NAME_LENGTH);
        buffer.write_all(&name_bytes[..name_len])?;
        buffer.write_all(&vec![0u8; TFTF_SIGNATURE_KEY_NAME_LENGTH - name_len])?;

        buffer.write_all(&self.key_hash)?;
        buffer.write_all(&self.signature)?;
        Ok(buffer)
    }

    /// Parse a signature section payload
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < TFTF_SIGNATURE_OFF_KEY_SIGNATURE {
            return Err(TftfError::invalid_signature_block(format!(
                "{} bytes is shorter than the fixed part ({} bytes)",
                data.len(),
                TFTF_SIGNATURE_OFF_KEY_SIGNATURE
            )));
        }

        let mut cursor = Cursor::new(data);
        let length = cursor.read_u32::<LittleEndian>()?;
        let raw_type = cursor.read_u32::<LittleEndian>()?;
        let signature_type = SignatureType::try_from(raw_type).map_err(|_| {
            TftfError::invalid_signature_block(format!("unknown signature type {}", raw_type))
        })?;

        let mut name_bytes = [0u8; TFTF_SIGNATURE_KEY_NAME_LENGTH];
        cursor.read_exact(&mut name_bytes)?;
        let name_len = name_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(TFTF_SIGNATURE_KEY_NAME_LENGTH);
        let key_name = String::from_utf8_lossy(&name_bytes[..name_len]).into_owned();

        let mut key_hash = [0u8; TFTF_SIGNATURE_KEY_HASH_LENGTH];
        cursor.read_exact(&mut key_hash)?;

        Ok(Self {
            length,
            signature_type,
            key_name,
            key_hash,
            signature: data[TFTF_SIGNATURE_OFF_KEY_SIGNATURE..].to_vec(),
        })
    }
}
