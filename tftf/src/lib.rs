//! # tftf
//!
//! Tools for the Trusted Firmware Transfer Format (TFTF), a fixed-layout
//! container used to ship firmware components to an embedded bootloader.
//!
//! A TFTF blob is a 512-byte header holding a table of up to 25 section
//! descriptors, followed by the raw bytes of every section. This crate
//! decodes and encodes that header, derives section placement, detects
//! overlapping sections and extracts the exact byte ranges a signer needs.
//!
//! ## Example
//!
//! ```rust
//! use tftf::{SectionType, TftfBuilder, Validity};
//!
//! let tftf = TftfBuilder::new()
//!     .name("bootrom")
//!     .load_base(0x1000_0000)
//!     .section(SectionType::RawCode, vec![0u8; 100])
//!     .section(SectionType::RawData, vec![0u8; 100])
//!     .build()?;
//!
//! assert_eq!(tftf.validity(), Validity::Valid);
//! assert_eq!(tftf.sections()[1].copy_offset, 100);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[macro_use]
extern crate log;

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod file;
pub mod header;
pub mod section;
pub mod section_types;
pub mod signature;

// Re-export main types for convenience
pub use builder::TftfBuilder;
pub use error::{Result, TftfError};
pub use header::{TftfHeader, Validity};
pub use section::Section;
pub use section_types::SectionType;
pub use signature::{SignatureBlock, SignatureType};

/// Current version of the tftf implementation
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sentinel tag at the start of every TFTF header
pub const TFTF_SENTINEL: [u8; 4] = *b"TFTF";

/// Total length of the fixed header, section table included
pub const TFTF_HDR_LENGTH: usize = 512;

/// Offset of the section descriptor table within the header
pub const TFTF_HDR_OFF_SECTIONS: usize = 0x64;

/// Length of one section descriptor
pub const TFTF_SECTION_HDR_LENGTH: usize = 16;

/// Maximum number of section descriptors, end-of-descriptors marker included
pub const TFTF_MAX_SECTIONS: usize = 25;

/// Length of the ASCII timestamp field
pub const TFTF_TIMESTAMP_LENGTH: usize = 16;

/// Length of the firmware package name field
pub const TFTF_FW_PKG_NAME_LENGTH: usize = 48;

/// Unused bytes between the end of the section table and the payload
pub const TFTF_PADDING: usize = 12;

/// Extension appended to output files named without one
pub const TFTF_FILE_EXTENSION: &str = ".bin";

const _: () = assert!(
    TFTF_HDR_OFF_SECTIONS + TFTF_MAX_SECTIONS * TFTF_SECTION_HDR_LENGTH + TFTF_PADDING
        == TFTF_HDR_LENGTH
);
