//! Error types for TFTF handling

use std::path::PathBuf;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, TftfError>;

/// Errors raised while decoding, editing or writing TFTF containers
#[derive(thiserror::Error, Debug)]
pub enum TftfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid sentinel: expected {expected:?}, found {found:?}")]
    InvalidSentinel { expected: String, found: String },

    #[error("Invalid section type 0x{value:02x} at [{index}]")]
    InvalidSectionType { value: u32, index: usize },

    #[error("Section table has no end-of-descriptors entry")]
    MissingEndOfDescriptors,

    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    #[error("Section index {index} out of range (table holds {len} entries)")]
    SectionIndexOutOfRange { index: usize, len: usize },

    #[error("Section table full ({max} entries)")]
    TableFull { max: usize },

    #[error("{} has wrong length: expected {expected} bytes, wrote {actual}", path.display())]
    LengthMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("{count} section collision(s) found")]
    Collisions { count: usize },

    #[error("Unsupported section type: {0}")]
    UnsupportedSectionType(String),

    #[error("Unsupported signature type: {0}")]
    UnsupportedSignatureType(String),

    #[error("Invalid signature block: {0}")]
    InvalidSignatureBlock(String),
}

impl TftfError {
    pub fn invalid_sentinel(found: &[u8]) -> Self {
        Self::InvalidSentinel {
            expected: String::from_utf8_lossy(&crate::TFTF_SENTINEL).into_owned(),
            found: String::from_utf8_lossy(found).into_owned(),
        }
    }

    pub fn invalid_image_data(msg: impl Into<String>) -> Self {
        Self::InvalidImageData(msg.into())
    }

    pub fn unsupported_section_type(name: impl Into<String>) -> Self {
        Self::UnsupportedSectionType(name.into())
    }

    pub fn unsupported_signature_type(name: impl Into<String>) -> Self {
        Self::UnsupportedSignatureType(name.into())
    }

    pub fn invalid_signature_block(msg: impl Into<String>) -> Self {
        Self::InvalidSignatureBlock(msg.into())
    }

    /// True for the structural errors describing a malformed container
    pub fn is_invalid_format(&self) -> bool {
        matches!(
            self,
            Self::InvalidSentinel { .. }
                | Self::InvalidSectionType { .. }
                | Self::MissingEndOfDescriptors
                | Self::InvalidImageData(_)
                | Self::SectionIndexOutOfRange { .. }
        )
    }
}
