//! Section type definitions and classification

use crate::error::{Result, TftfError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// TFTF section types
///
/// The set is fixed by the format, so unknown codes are rejected at decode
/// time instead of being carried around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    /// Reserved, never produced by the tools
    Reserved = 0x00,
    /// Uncompressed code block
    #[serde(alias = "code")]
    RawCode = 0x01,
    /// Uncompressed data block
    #[serde(alias = "data")]
    RawData = 0x02,
    /// Compressed code block
    CompressedCode = 0x03,
    /// Compressed data block
    CompressedData = 0x04,
    /// Manifest block
    Manifest = 0x05,
    /// Signature block (see [`crate::SignatureBlock`])
    Signature = 0x80,
    /// Certificate block
    #[serde(alias = "cert")]
    Certificate = 0x81,
    /// Terminates the section table
    EndOfDescriptors = 0xfe,
}

impl SectionType {
    /// All valid section types, in code order
    pub const ALL: [SectionType; 9] = [
        Self::Reserved,
        Self::RawCode,
        Self::RawData,
        Self::CompressedCode,
        Self::CompressedData,
        Self::Manifest,
        Self::Signature,
        Self::Certificate,
        Self::EndOfDescriptors,
    ];

    /// Raw on-disk code
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Whether `code` names one of the valid section types
    pub fn is_valid_code(code: u32) -> bool {
        Self::try_from(code).is_ok()
    }

    /// Countable sections contribute to load/expanded length and get a
    /// copy offset assigned during layout.
    pub fn is_countable(self) -> bool {
        matches!(
            self,
            Self::RawCode
                | Self::RawData
                | Self::CompressedCode
                | Self::CompressedData
                | Self::Manifest
                | Self::Certificate
        )
    }

    /// Layout, length aggregation and collision analysis stop at these.
    pub fn ends_layout(self) -> bool {
        matches!(self, Self::Signature | Self::EndOfDescriptors)
    }

    /// Human readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::Reserved => "Reserved",
            Self::RawCode => "Code",
            Self::RawData => "Data",
            Self::CompressedCode => "Compressed code",
            Self::CompressedData => "Compressed data",
            Self::Manifest => "Manifest",
            Self::Signature => "Signature",
            Self::Certificate => "Certificate",
            Self::EndOfDescriptors => "End of descriptors",
        }
    }

    /// Name for a raw type code; unknown codes map to `"?"`.
    pub fn name_of(code: u32) -> &'static str {
        Self::try_from(code).map(Self::name).unwrap_or("?")
    }
}

impl TryFrom<u32> for SectionType {
    type Error = ();

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Reserved),
            0x01 => Ok(Self::RawCode),
            0x02 => Ok(Self::RawData),
            0x03 => Ok(Self::CompressedCode),
            0x04 => Ok(Self::CompressedData),
            0x05 => Ok(Self::Manifest),
            0x80 => Ok(Self::Signature),
            0x81 => Ok(Self::Certificate),
            0xfe => Ok(Self::EndOfDescriptors),
            _ => Err(()),
        }
    }
}

impl FromStr for SectionType {
    type Err = TftfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "reserved" => Ok(Self::Reserved),
            "code" | "raw_code" => Ok(Self::RawCode),
            "data" | "raw_data" => Ok(Self::RawData),
            "compressed_code" => Ok(Self::CompressedCode),
            "compressed_data" => Ok(Self::CompressedData),
            "manifest" => Ok(Self::Manifest),
            "signature" => Ok(Self::Signature),
            "certificate" | "cert" => Ok(Self::Certificate),
            "end" | "end_of_descriptors" => Ok(Self::EndOfDescriptors),
            _ => Err(TftfError::unsupported_section_type(s)),
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
