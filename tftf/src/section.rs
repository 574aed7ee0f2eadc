//! TFTF section descriptors

use crate::error::{Result, TftfError};
use crate::section_types::SectionType;
use crate::{TFTF_HDR_OFF_SECTIONS, TFTF_SECTION_HDR_LENGTH};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::Cursor;

/// One entry of the section descriptor table
///
/// Stored on disk as four little-endian `u32` values in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Bytes occupied by the payload inside the container
    pub section_length: u32,
    /// Bytes occupied once the payload is expanded on the target
    pub expanded_length: u32,
    /// Placement relative to the load base; 0 means unassigned for
    /// countable types and not applicable for the rest
    pub copy_offset: u32,
    /// Type of the section
    pub section_type: SectionType,
}

impl Section {
    /// Create a section descriptor
    pub fn new(
        section_type: SectionType,
        section_length: u32,
        expanded_length: u32,
        copy_offset: u32,
    ) -> Self {
        Self {
            section_length,
            expanded_length,
            copy_offset,
            section_type,
        }
    }

    /// Descriptor for an uncompressed payload of `length` bytes
    pub fn uncompressed(section_type: SectionType, length: u32, copy_offset: u32) -> Self {
        Self::new(section_type, length, length, copy_offset)
    }

    /// The table terminator
    pub fn end_of_descriptors() -> Self {
        Self::new(SectionType::EndOfDescriptors, 0, 0, 0)
    }

    /// Decode the descriptor stored at `offset` in `buf`
    ///
    /// An unknown type code yields [`TftfError::InvalidSectionType`], which
    /// table scans treat as the end of the usable table.
    pub fn decode(buf: &[u8], offset: usize) -> Result<Self> {
        let end = offset + TFTF_SECTION_HDR_LENGTH;
        if buf.len() < end {
            return Err(TftfError::invalid_image_data(format!(
                "Section descriptor at 0x{:x} runs past the end of the buffer ({} bytes)",
                offset,
                buf.len()
            )));
        }

        let mut cursor = Cursor::new(&buf[offset..end]);
        let section_length = cursor.read_u32::<LittleEndian>()?;
        let expanded_length = cursor.read_u32::<LittleEndian>()?;
        let copy_offset = cursor.read_u32::<LittleEndian>()?;
        let raw_type = cursor.read_u32::<LittleEndian>()?;

        let section_type =
            SectionType::try_from(raw_type).map_err(|_| TftfError::InvalidSectionType {
                value: raw_type,
                index: offset.saturating_sub(TFTF_HDR_OFF_SECTIONS) / TFTF_SECTION_HDR_LENGTH,
            })?;

        Ok(Self::new(
            section_type,
            section_length,
            expanded_length,
            copy_offset,
        ))
    }

    /// Encode the descriptor at `offset` in `buf`, returning the offset of
    /// the next descriptor slot.
    pub fn encode(&self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let end = offset + TFTF_SECTION_HDR_LENGTH;
        if buf.len() < end {
            return Err(TftfError::invalid_image_data(format!(
                "No room for a section descriptor at 0x{:x}",
                offset
            )));
        }

        let mut cursor = Cursor::new(&mut buf[offset..end]);
        cursor.write_u32::<LittleEndian>(self.section_length)?;
        cursor.write_u32::<LittleEndian>(self.expanded_length)?;
        cursor.write_u32::<LittleEndian>(self.copy_offset)?;
        cursor.write_u32::<LittleEndian>(self.section_type.code())?;

        Ok(end)
    }

    /// Fill in the copy offset from the running layout cursor
    ///
    /// Countable sections without an explicit offset are placed at
    /// `running_offset`; non-countable sections are forced to 0. Returns the
    /// first byte past this section's placement.
    pub fn derive_placement(&mut self, running_offset: u32) -> u32 {
        if self.section_type.is_countable() {
            if self.copy_offset == 0 {
                self.copy_offset = running_offset;
            }
        } else {
            self.copy_offset = 0;
        }

        self.copy_offset.saturating_add(self.expanded_length)
    }

    /// Exclusive end of the placement range
    pub fn end(&self) -> u64 {
        self.copy_offset as u64 + self.expanded_length as u64
    }

    /// Whether the half-open placement ranges of two sections intersect
    pub fn collides_with(&self, other: &Section) -> bool {
        (self.copy_offset as u64) < other.end() && (other.copy_offset as u64) < self.end()
    }

    pub fn is_countable(&self) -> bool {
        self.section_type.is_countable()
    }

    /// Human readable type name
    pub fn name(&self) -> &'static str {
        self.section_type.name()
    }
}
