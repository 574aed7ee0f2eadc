//! TFTF header: the fixed fields, the section table and the payload buffer

use crate::error::{Result, TftfError};
use crate::section::Section;
use crate::section_types::SectionType;
use crate::{
    TFTF_FW_PKG_NAME_LENGTH, TFTF_HDR_LENGTH, TFTF_HDR_OFF_SECTIONS, TFTF_MAX_SECTIONS,
    TFTF_SECTION_HDR_LENGTH, TFTF_SENTINEL, TFTF_TIMESTAMP_LENGTH,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::io::{Cursor, Read, Write};

/// Offset of the first 32-bit field (`load_length`)
const TFTF_HDR_OFF_LENGTH: usize = 0x44;

/// Timestamp layout, "YYYYMMDD HHMMSS" in UTC
const TIMESTAMP_FORMAT: &str = "%Y%m%d %H%M%S";

/// Outcome of the header sniff test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Valid,
    Invalid,
    ValidWithCollisions,
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::ValidWithCollisions => "valid with collisions",
        };
        write!(f, "{}", name)
    }
}

/// A TFTF container
///
/// Owns the decoded header fields, the ordered section table and the byte
/// buffer holding the encoded header followed by every payload. Field edits
/// are only written into the buffer by [`TftfHeader::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TftfHeader {
    /// Sentinel tag, must equal [`TFTF_SENTINEL`]
    pub sentinel: [u8; 4],
    /// ASCII build timestamp, NUL padded
    pub timestamp: [u8; TFTF_TIMESTAMP_LENGTH],
    /// ASCII firmware package name, NUL padded
    pub package_name: [u8; TFTF_FW_PKG_NAME_LENGTH],
    /// Extent of the countable payload inside the container
    pub load_length: u32,
    /// Load address on the target
    pub load_base: u32,
    /// Extent of the countable payload once expanded on the target
    pub expanded_length: u32,
    /// Entry point
    pub start_location: u32,
    pub unipro_mfg_id: u32,
    pub unipro_product_id: u32,
    pub ara_vendor_id: u32,
    pub ara_product_id: u32,

    sections: Vec<Section>,
    buf: Vec<u8>,
    collisions: Vec<Vec<usize>>,
    validity: Validity,
}

impl Default for TftfHeader {
    fn default() -> Self {
        Self {
            sentinel: [0; 4],
            timestamp: [0; TFTF_TIMESTAMP_LENGTH],
            package_name: [0; TFTF_FW_PKG_NAME_LENGTH],
            load_length: 0,
            load_base: 0,
            expanded_length: 0,
            start_location: 0,
            unipro_mfg_id: 0,
            unipro_product_id: 0,
            ara_vendor_id: 0,
            ara_product_id: 0,
            sections: vec![Section::end_of_descriptors()],
            buf: vec![0; TFTF_HDR_LENGTH],
            collisions: Vec::new(),
            validity: Validity::Invalid,
        }
    }
}

impl TftfHeader {
    /// Create an empty container holding only the end-of-descriptors entry
    ///
    /// The sentinel is left blank, so the container stays
    /// [`Validity::Invalid`] until [`TftfHeader::post_process`] runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a complete TFTF blob
    ///
    /// Fails on truncated data and on a malformed section table. A bad
    /// sentinel is not an error here; it shows up as [`Validity::Invalid`].
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let (header, error) = Self::from_bytes_partial(data)?;
        match error {
            Some(err) => Err(err),
            None => Ok(header),
        }
    }

    /// Decode a TFTF blob, keeping whatever could be parsed
    ///
    /// Returns the container together with the section table error, if any.
    /// A container returned with an error is always [`Validity::Invalid`]
    /// but can still be inspected.
    pub fn from_bytes_partial(data: Vec<u8>) -> Result<(Self, Option<TftfError>)> {
        if data.len() < TFTF_HDR_LENGTH {
            return Err(TftfError::invalid_image_data(format!(
                "Header data too short: {} bytes (expected at least {})",
                data.len(),
                TFTF_HDR_LENGTH
            )));
        }

        let mut header = Self {
            buf: data,
            ..Self::default()
        };
        let error = header.decode().err();
        Ok((header, error))
    }

    /// Re-parse the header fields and the section table from the buffer
    ///
    /// Replaces the section list. The scan stops after the end-of-descriptors
    /// entry or before the first unknown section type; validity is
    /// recomputed either way.
    pub fn decode(&mut self) -> Result<()> {
        if self.buf.len() < TFTF_HDR_LENGTH {
            return Err(TftfError::invalid_image_data(format!(
                "Header data too short: {} bytes (expected at least {})",
                self.buf.len(),
                TFTF_HDR_LENGTH
            )));
        }

        let mut cursor = Cursor::new(&self.buf[..TFTF_HDR_OFF_SECTIONS]);
        cursor.read_exact(&mut self.sentinel)?;
        cursor.read_exact(&mut self.timestamp)?;
        cursor.read_exact(&mut self.package_name)?;
        self.load_length = cursor.read_u32::<LittleEndian>()?;
        self.load_base = cursor.read_u32::<LittleEndian>()?;
        self.expanded_length = cursor.read_u32::<LittleEndian>()?;
        self.start_location = cursor.read_u32::<LittleEndian>()?;
        self.unipro_mfg_id = cursor.read_u32::<LittleEndian>()?;
        self.unipro_product_id = cursor.read_u32::<LittleEndian>()?;
        self.ara_vendor_id = cursor.read_u32::<LittleEndian>()?;
        self.ara_product_id = cursor.read_u32::<LittleEndian>()?;

        self.sections.clear();
        let mut scan_error = None;
        let mut terminated = false;
        let mut offset = TFTF_HDR_OFF_SECTIONS;
        for _ in 0..TFTF_MAX_SECTIONS {
            match Section::decode(&self.buf, offset) {
                Ok(section) => {
                    self.sections.push(section);
                    offset += TFTF_SECTION_HDR_LENGTH;
                    if section.section_type == SectionType::EndOfDescriptors {
                        terminated = true;
                        break;
                    }
                }
                Err(err) => {
                    warn!("{}", err);
                    scan_error = Some(err);
                    break;
                }
            }
        }
        if scan_error.is_none() && !terminated {
            warn!("Section table is not terminated");
            scan_error = Some(TftfError::MissingEndOfDescriptors);
        }
        debug!("Decoded {} section descriptor(s)", self.sections.len());

        self.sniff_test();
        match scan_error {
            Some(err) => {
                self.validity = Validity::Invalid;
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Write the header fields and the section table into the buffer
    ///
    /// Only the header region is touched; payload bytes are left alone.
    pub fn encode(&mut self) -> Result<()> {
        let mut cursor = Cursor::new(&mut self.buf[..TFTF_HDR_OFF_SECTIONS]);
        cursor.write_all(&self.sentinel)?;
        cursor.write_all(&self.timestamp)?;
        cursor.write_all(&self.package_name)?;
        debug_assert_eq!(cursor.position() as usize, TFTF_HDR_OFF_LENGTH);
        cursor.write_u32::<LittleEndian>(self.load_length)?;
        cursor.write_u32::<LittleEndian>(self.load_base)?;
        cursor.write_u32::<LittleEndian>(self.expanded_length)?;
        cursor.write_u32::<LittleEndian>(self.start_location)?;
        cursor.write_u32::<LittleEndian>(self.unipro_mfg_id)?;
        cursor.write_u32::<LittleEndian>(self.unipro_product_id)?;
        cursor.write_u32::<LittleEndian>(self.ara_vendor_id)?;
        cursor.write_u32::<LittleEndian>(self.ara_product_id)?;

        let mut offset = TFTF_HDR_OFF_SECTIONS;
        for section in &self.sections {
            offset = section.encode(&mut self.buf, offset)?;
        }

        Ok(())
    }

    /// Encode and return a copy of the whole container
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.encode()?;
        Ok(self.buf.clone())
    }

    /// The buffer as last encoded or decoded
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Length of the whole blob; larger than `load_length`, which only
    /// covers the countable payload.
    pub fn total_length(&self) -> usize {
        self.buf.len()
    }

    /// Total length implied by the section table
    pub fn expected_total_length(&self) -> usize {
        TFTF_HDR_LENGTH
            + self
                .sections
                .iter()
                .map(|s| s.section_length as usize)
                .sum::<usize>()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Collision lists from the last collision pass, one per analysed section
    pub fn collisions(&self) -> &[Vec<usize>] {
        &self.collisions
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// Go/no-go decision: anything but [`Validity::Invalid`]
    pub fn is_good(&self) -> bool {
        self.validity != Validity::Invalid
    }

    /// Fail unless the container passed the sniff test
    pub fn validate(&self) -> Result<()> {
        if self.sentinel != TFTF_SENTINEL {
            return Err(TftfError::invalid_sentinel(&self.sentinel));
        }
        if self.validity == Validity::Invalid {
            return Err(TftfError::invalid_image_data(
                "Container failed the validity check",
            ));
        }
        Ok(())
    }

    /// Quick validity check: sentinel first, then collisions
    pub fn sniff_test(&mut self) -> Validity {
        self.validity = if self.sentinel != TFTF_SENTINEL {
            self.collisions.clear();
            Validity::Invalid
        } else if self.check_for_collisions() {
            Validity::ValidWithCollisions
        } else {
            Validity::Valid
        };
        self.validity
    }

    /// Number of leading sections that take part in layout and collision
    /// analysis: everything before the first signature or end marker.
    fn layout_extent(&self) -> usize {
        self.sections
            .iter()
            .position(|s| s.section_type.ends_layout())
            .unwrap_or(self.sections.len())
    }

    /// Rebuild the collision lists and report whether any section overlaps
    /// another.
    pub fn check_for_collisions(&mut self) -> bool {
        let considered = &self.sections[..self.layout_extent()];
        let collisions: Vec<Vec<usize>> = considered
            .iter()
            .enumerate()
            .map(|(a, section_a)| {
                considered
                    .iter()
                    .enumerate()
                    .filter(|&(b, section_b)| a != b && section_a.collides_with(section_b))
                    .map(|(b, _)| b)
                    .collect()
            })
            .collect();

        let mut found = false;
        for (index, peers) in collisions.iter().enumerate() {
            if !peers.is_empty() {
                found = true;
                let section = &considered[index];
                warn!(
                    "Section {} (0x{:08x}-0x{:08x}) collides with section(s) {:?}",
                    index,
                    section.copy_offset,
                    section.end(),
                    peers
                );
            }
        }

        self.collisions = collisions;
        found
    }

    /// Assign missing copy offsets and recompute the length fields
    ///
    /// Countable sections are laid out contiguously in table order; other
    /// sections never move the cursor. Each countable section extends the
    /// length fields from the cursor position it was reached at, whatever
    /// its copy offset. The walk stops at the first signature or
    /// end-of-descriptors entry.
    pub fn update_section_table_offsets(&mut self) {
        self.load_length = 0;
        self.expanded_length = 0;

        let mut cursor = 0u32;
        for section in self.sections.iter_mut() {
            let start = cursor;
            let next = section.derive_placement(cursor);
            if section.section_type.ends_layout() {
                break;
            }

            if section.is_countable() {
                cursor = next;
                self.load_length = self
                    .load_length
                    .max(start.saturating_add(section.section_length));
                self.expanded_length = self
                    .expanded_length
                    .max(start.saturating_add(section.expanded_length));
            }
        }

        debug!(
            "Layout: load_length 0x{:08x}, expanded_length 0x{:08x}",
            self.load_length, self.expanded_length
        );
    }

    /// Append a section just before the end-of-descriptors entry
    ///
    /// The payload is appended to the buffer. Layout and collision detection
    /// are left to the caller so a batch of additions costs one pass.
    pub fn add_section(
        &mut self,
        section_type: SectionType,
        data: &[u8],
        copy_offset: u32,
    ) -> Result<()> {
        if self.sections.len() >= TFTF_MAX_SECTIONS {
            warn!("Section table full");
            return Err(TftfError::TableFull {
                max: TFTF_MAX_SECTIONS,
            });
        }
        if section_type == SectionType::EndOfDescriptors {
            return Err(TftfError::unsupported_section_type(
                "end of descriptors cannot be added",
            ));
        }
        let length = u32::try_from(data.len()).map_err(|_| {
            TftfError::invalid_image_data(format!("Section too large: {} bytes", data.len()))
        })?;

        let at = self
            .sections
            .iter()
            .position(|s| s.section_type == SectionType::EndOfDescriptors)
            .unwrap_or(self.sections.len());
        self.sections
            .insert(at, Section::uncompressed(section_type, length, copy_offset));
        self.buf.extend_from_slice(data);

        debug!(
            "Added {} section [{}]: {} bytes, offset 0x{:08x}",
            section_type, at, length, copy_offset
        );
        Ok(())
    }

    /// Finish a freshly assembled container
    ///
    /// Sets the sentinel, stamps the current time if no timestamp was set,
    /// derives the layout and runs the sniff test.
    pub fn post_process(&mut self) -> Validity {
        self.sentinel = TFTF_SENTINEL;
        if self.timestamp.iter().all(|&b| b == 0) {
            self.set_timestamp(Utc::now());
        }
        self.update_section_table_offsets();
        self.sniff_test()
    }

    /// Index of the first section of `section_type`
    ///
    /// Falls back to the index of the end-of-descriptors entry, then to the
    /// table length.
    pub fn find_first_section(&self, section_type: SectionType) -> usize {
        self.sections
            .iter()
            .position(|s| {
                s.section_type == section_type || s.section_type == SectionType::EndOfDescriptors
            })
            .unwrap_or(self.sections.len())
    }

    fn check_index(&self, section_index: usize) -> Result<()> {
        if section_index > self.sections.len() {
            return Err(TftfError::SectionIndexOutOfRange {
                index: section_index,
                len: self.sections.len(),
            });
        }
        Ok(())
    }

    /// Header bytes up to the `section_index`-th descriptor slot
    ///
    /// First half of the signing input. Pending field edits are encoded
    /// first.
    pub fn header_prefix(&mut self, section_index: usize) -> Result<&[u8]> {
        self.check_index(section_index)?;
        self.encode()?;
        let end = TFTF_HDR_OFF_SECTIONS + section_index * TFTF_SECTION_HDR_LENGTH;
        Ok(&self.buf[..end])
    }

    /// Payload bytes of the first `section_index` sections
    ///
    /// Second half of the signing input.
    pub fn payload_prefix(&mut self, section_index: usize) -> Result<&[u8]> {
        self.check_index(section_index)?;
        self.encode()?;
        let end = TFTF_HDR_LENGTH
            + self.sections[..section_index]
                .iter()
                .map(|s| s.section_length as usize)
                .sum::<usize>();
        if end > self.buf.len() {
            return Err(TftfError::invalid_image_data(format!(
                "Payload truncated: sections need {} bytes, buffer holds {}",
                end,
                self.buf.len()
            )));
        }
        Ok(&self.buf[TFTF_HDR_LENGTH..end])
    }

    /// Everything a signature placed at `section_index` covers: the header
    /// prefix followed by the payload prefix.
    pub fn signing_input(&mut self, section_index: usize) -> Result<Vec<u8>> {
        let mut input = self.header_prefix(section_index)?.to_vec();
        input.extend_from_slice(self.payload_prefix(section_index)?);
        Ok(input)
    }

    /// Payload bytes of a single section
    pub fn section_data(&self, section_index: usize) -> Result<&[u8]> {
        if section_index >= self.sections.len() {
            return Err(TftfError::SectionIndexOutOfRange {
                index: section_index,
                len: self.sections.len(),
            });
        }
        let start = TFTF_HDR_LENGTH
            + self.sections[..section_index]
                .iter()
                .map(|s| s.section_length as usize)
                .sum::<usize>();
        let end = start + self.sections[section_index].section_length as usize;
        self.buf.get(start..end).ok_or_else(|| {
            TftfError::invalid_image_data(format!(
                "Section {} payload (0x{:x}-0x{:x}) lies outside the {}-byte blob",
                section_index,
                start,
                end,
                self.buf.len()
            ))
        })
    }

    /// Set the package name, truncated to the field width
    pub fn set_package_name(&mut self, name: &str) {
        let mut len = name.len().min(TFTF_FW_PKG_NAME_LENGTH);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        self.package_name = [0; TFTF_FW_PKG_NAME_LENGTH];
        self.package_name[..len].copy_from_slice(&name.as_bytes()[..len]);
    }

    pub fn package_name_str(&self) -> String {
        c_string(&self.package_name)
    }

    pub fn sentinel_str(&self) -> String {
        c_string(&self.sentinel)
    }

    /// Stamp the header with `timestamp`
    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        let text = timestamp.format(TIMESTAMP_FORMAT).to_string();
        let len = text.len().min(TFTF_TIMESTAMP_LENGTH);
        self.timestamp = [0; TFTF_TIMESTAMP_LENGTH];
        self.timestamp[..len].copy_from_slice(&text.as_bytes()[..len]);
    }

    pub fn timestamp_str(&self) -> String {
        c_string(&self.timestamp)
    }

    /// The timestamp field as a date, if it holds one
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.timestamp_str(), TIMESTAMP_FORMAT)
            .ok()
            .map(|t| t.and_utc())
    }

    /// Get a summary of the header information
    pub fn summary(&self) -> String {
        format!(
            "TFTF: {} ({})\n\
             Sentinel: '{}' Timestamp: '{}'\n\
             Load Base: 0x{:08x} Start Location: 0x{:08x}\n\
             Load Length: 0x{:08x} Expanded Length: 0x{:08x}\n\
             UniPro MFG/PID: 0x{:08x}/0x{:08x} Ara VID/PID: 0x{:08x}/0x{:08x}\n\
             Sections: {} of {} Size: {} bytes",
            self.package_name_str(),
            self.validity,
            self.sentinel_str(),
            self.timestamp_str(),
            self.load_base,
            self.start_location,
            self.load_length,
            self.expanded_length,
            self.unipro_mfg_id,
            self.unipro_product_id,
            self.ara_vendor_id,
            self.ara_product_id,
            self.sections.len(),
            TFTF_MAX_SECTIONS,
            self.total_length()
        )
    }
}

/// Text of a NUL-padded ASCII field
fn c_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn two_data_sections(second_offset: u32) -> TftfHeader {
        let mut tftf = TftfHeader::new();
        tftf.sentinel = TFTF_SENTINEL;
        tftf.add_section(SectionType::RawData, &[1u8; 100], 0).unwrap();
        tftf.add_section(SectionType::RawData, &[2u8; 100], second_offset)
            .unwrap();
        tftf.update_section_table_offsets();
        tftf.sniff_test();
        tftf
    }

    #[test]
    fn test_empty_container() {
        let mut tftf = TftfHeader::new();
        assert_eq!(tftf.sections().len(), 1);
        assert_eq!(tftf.sections()[0].section_type, SectionType::EndOfDescriptors);
        assert_eq!(tftf.total_length(), TFTF_HDR_LENGTH);

        tftf.update_section_table_offsets();
        assert_eq!(tftf.load_length, 0);
        assert_eq!(tftf.sniff_test(), Validity::Invalid);
        assert!(!tftf.is_good());

        tftf.sentinel = TFTF_SENTINEL;
        assert_eq!(tftf.sniff_test(), Validity::Valid);
        assert!(tftf.validate().is_ok());
    }

    #[test]
    fn test_field_offsets() {
        let mut tftf = TftfHeader::new();
        tftf.sentinel = TFTF_SENTINEL;
        tftf.set_package_name("pkg");
        tftf.load_length = 0x11;
        tftf.load_base = 0x22;
        tftf.expanded_length = 0x33;
        tftf.start_location = 0x44;
        tftf.unipro_mfg_id = 0x55;
        tftf.unipro_product_id = 0x66;
        tftf.ara_vendor_id = 0x77;
        tftf.ara_product_id = 0x88;

        let bytes = tftf.to_bytes().unwrap();
        assert_eq!(&bytes[0x00..0x04], b"TFTF");
        assert_eq!(&bytes[0x14..0x17], b"pkg");
        for (offset, value) in [
            (0x44, 0x11u8),
            (0x48, 0x22),
            (0x4c, 0x33),
            (0x50, 0x44),
            (0x54, 0x55),
            (0x58, 0x66),
            (0x5c, 0x77),
            (0x60, 0x88),
        ] {
            assert_eq!(bytes[offset], value, "field at 0x{:x}", offset);
        }
        // End-of-descriptors type code in the first table slot
        assert_eq!(bytes[0x64 + 12], 0xfe);
    }

    #[test]
    fn test_round_trip() {
        let mut tftf = two_data_sections(0);
        tftf.set_package_name("round trip");
        tftf.set_timestamp(Utc.with_ymd_and_hms(2015, 6, 1, 12, 30, 0).unwrap());
        tftf.start_location = 0x1000_0000;
        tftf.unipro_mfg_id = 0x126;

        let bytes = tftf.to_bytes().unwrap();
        let parsed = TftfHeader::from_bytes(bytes.clone()).unwrap();

        assert_eq!(parsed, tftf);
        assert_eq!(parsed.as_bytes(), &bytes[..]);
        assert_eq!(parsed.package_name_str(), "round trip");
        assert_eq!(parsed.timestamp_str(), "20150601 123000");
    }

    #[test]
    fn test_encode_idempotent() {
        let mut tftf = two_data_sections(0);
        let first = tftf.to_bytes().unwrap();
        let second = tftf.to_bytes().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_too_short() {
        assert!(TftfHeader::from_bytes(vec![0; 100]).is_err());
    }

    #[test]
    fn test_decode_bad_sentinel() {
        let mut tftf = two_data_sections(0);
        tftf.sentinel = *b"FFFF";
        let bytes = tftf.to_bytes().unwrap();

        let parsed = TftfHeader::from_bytes(bytes).unwrap();
        assert_eq!(parsed.validity(), Validity::Invalid);
        assert!(parsed.validate().is_err());
        assert_eq!(parsed.sections().len(), 3);
    }

    #[test]
    fn test_decode_unknown_section_type() {
        let mut tftf = two_data_sections(0);
        let mut bytes = tftf.to_bytes().unwrap();
        // Corrupt the type of the second descriptor
        bytes[TFTF_HDR_OFF_SECTIONS + TFTF_SECTION_HDR_LENGTH + 12] = 0x42;

        let err = TftfHeader::from_bytes(bytes.clone()).unwrap_err();
        assert!(err.is_invalid_format());

        let (partial, err) = TftfHeader::from_bytes_partial(bytes).unwrap();
        assert!(matches!(
            err,
            Some(TftfError::InvalidSectionType { value: 0x42, index: 1 })
        ));
        assert_eq!(partial.sections().len(), 1);
        assert_eq!(partial.validity(), Validity::Invalid);
    }

    #[test]
    fn test_decode_unterminated_table() {
        let mut bytes = vec![0u8; TFTF_HDR_LENGTH];
        bytes[..4].copy_from_slice(&TFTF_SENTINEL);
        // Every slot decodes as a reserved section, no terminator
        let (partial, err) = TftfHeader::from_bytes_partial(bytes).unwrap();
        assert!(matches!(err, Some(TftfError::MissingEndOfDescriptors)));
        assert_eq!(partial.sections().len(), TFTF_MAX_SECTIONS);
        assert!(!partial.is_good());
    }

    #[test]
    fn test_add_section_keeps_terminator_last() {
        let mut tftf = TftfHeader::new();
        tftf.add_section(SectionType::RawCode, b"code", 0).unwrap();
        tftf.add_section(SectionType::Manifest, b"manifest", 0).unwrap();

        let types: Vec<_> = tftf.sections().iter().map(|s| s.section_type).collect();
        assert_eq!(
            types,
            vec![
                SectionType::RawCode,
                SectionType::Manifest,
                SectionType::EndOfDescriptors
            ]
        );
        assert_eq!(tftf.total_length(), TFTF_HDR_LENGTH + 12);
        assert_eq!(tftf.section_data(1).unwrap(), b"manifest");
    }

    #[test]
    fn test_add_section_rejects_terminator() {
        let mut tftf = TftfHeader::new();
        assert!(
            tftf.add_section(SectionType::EndOfDescriptors, &[], 0)
                .is_err()
        );
        assert_eq!(tftf.sections().len(), 1);
    }

    #[test]
    fn test_table_full() {
        let mut tftf = TftfHeader::new();
        for _ in 0..TFTF_MAX_SECTIONS - 1 {
            tftf.add_section(SectionType::RawData, &[0u8; 4], 0).unwrap();
        }
        assert_eq!(tftf.sections().len(), TFTF_MAX_SECTIONS);

        let before = tftf.clone();
        let err = tftf.add_section(SectionType::RawData, &[0u8; 4], 0);
        assert!(matches!(err, Err(TftfError::TableFull { max: 25 })));
        assert_eq!(tftf, before);

        // A full table still fits in the header
        tftf.sentinel = TFTF_SENTINEL;
        let bytes = tftf.to_bytes().unwrap();
        let parsed = TftfHeader::from_bytes(bytes).unwrap();
        assert_eq!(parsed.sections().len(), TFTF_MAX_SECTIONS);
    }

    #[test]
    fn test_contiguous_layout() {
        let tftf = two_data_sections(0);
        assert_eq!(tftf.sections()[0].copy_offset, 0);
        assert_eq!(tftf.sections()[1].copy_offset, 100);
        assert_eq!(tftf.load_length, 200);
        assert_eq!(tftf.expanded_length, 200);
        assert_eq!(tftf.validity(), Validity::Valid);
        assert_eq!(tftf.collisions(), &[Vec::<usize>::new(), Vec::new()]);
    }

    #[test]
    fn test_layout_idempotent() {
        let mut tftf = two_data_sections(0);
        let first = tftf.clone();
        tftf.update_section_table_offsets();
        assert_eq!(tftf.load_length, first.load_length);
        assert_eq!(tftf.expanded_length, first.expanded_length);
        assert_eq!(tftf.sections(), first.sections());
    }

    #[test]
    fn test_explicit_offset_collision() {
        let tftf = two_data_sections(50);
        assert_eq!(tftf.sections()[1].copy_offset, 50);
        assert_eq!(tftf.validity(), Validity::ValidWithCollisions);
        assert_eq!(tftf.collisions()[0], vec![1]);
        assert_eq!(tftf.collisions()[1], vec![0]);
        assert!(tftf.is_good());
    }

    #[test]
    fn test_explicit_offset_lengths_start_at_cursor() {
        // Below the cursor
        let tftf = two_data_sections(50);
        assert_eq!(tftf.sections()[1].copy_offset, 50);
        assert_eq!(tftf.load_length, 200);
        assert_eq!(tftf.expanded_length, 200);

        // Above the cursor
        let tftf = two_data_sections(0x8000);
        assert_eq!(tftf.sections()[1].copy_offset, 0x8000);
        assert_eq!(tftf.load_length, 200);
        assert_eq!(tftf.expanded_length, 200);
        assert_eq!(tftf.validity(), Validity::Valid);

        // The encoded header carries the same values
        let mut tftf = two_data_sections(50);
        let bytes = tftf.to_bytes().unwrap();
        assert_eq!(&bytes[0x44..0x48], &200u32.to_le_bytes());
        assert_eq!(&bytes[0x4c..0x50], &200u32.to_le_bytes());
    }

    #[test]
    fn test_padding_closes_header() {
        assert_eq!(
            TFTF_HDR_OFF_SECTIONS
                + TFTF_MAX_SECTIONS * TFTF_SECTION_HDR_LENGTH
                + crate::TFTF_PADDING,
            TFTF_HDR_LENGTH
        );
    }

    #[test]
    fn test_non_countable_does_not_shift_layout() {
        let mut tftf = TftfHeader::new();
        tftf.sentinel = TFTF_SENTINEL;
        tftf.add_section(SectionType::RawCode, &[0u8; 100], 0).unwrap();
        tftf.add_section(SectionType::Reserved, &[0u8; 50], 0x40).unwrap();
        tftf.add_section(SectionType::RawData, &[0u8; 100], 0).unwrap();
        tftf.update_section_table_offsets();

        assert_eq!(tftf.sections()[1].copy_offset, 0);
        assert_eq!(tftf.sections()[2].copy_offset, 100);
        assert_eq!(tftf.load_length, 200);
    }

    #[test]
    fn test_signature_ends_layout() {
        let mut tftf = TftfHeader::new();
        tftf.sentinel = TFTF_SENTINEL;
        tftf.add_section(SectionType::RawCode, &[0u8; 100], 0).unwrap();
        tftf.add_section(SectionType::Signature, &[0u8; 40], 0).unwrap();
        tftf.add_section(SectionType::Certificate, &[0u8; 30], 0).unwrap();
        tftf.update_section_table_offsets();

        assert_eq!(tftf.load_length, 100);
        assert_eq!(tftf.sections()[1].copy_offset, 0);
        // Past the signature nothing is placed
        assert_eq!(tftf.sections()[2].copy_offset, 0);

        // Only the code section is analysed, and it collides with nothing
        assert!(!tftf.check_for_collisions());
        assert_eq!(tftf.collisions().len(), 1);
    }

    #[test]
    fn test_certificate_before_signature_is_counted() {
        let mut tftf = TftfHeader::new();
        tftf.add_section(SectionType::RawCode, &[0u8; 100], 0).unwrap();
        tftf.add_section(SectionType::Certificate, &[0u8; 30], 0).unwrap();
        tftf.update_section_table_offsets();

        assert_eq!(tftf.sections()[1].copy_offset, 100);
        assert_eq!(tftf.load_length, 130);
    }

    #[test]
    fn test_collision_symmetry() {
        let mut tftf = TftfHeader::new();
        tftf.sentinel = TFTF_SENTINEL;
        tftf.add_section(SectionType::RawCode, &[0u8; 0x100], 0x1000).unwrap();
        tftf.add_section(SectionType::RawData, &[0u8; 0x100], 0x1080).unwrap();
        tftf.add_section(SectionType::RawData, &[0u8; 0x10], 0x3000).unwrap();
        tftf.add_section(SectionType::Manifest, &[0u8; 0x200], 0x0f00).unwrap();
        tftf.update_section_table_offsets();
        tftf.sniff_test();

        let collisions = tftf.collisions();
        for (i, peers) in collisions.iter().enumerate() {
            for &j in peers {
                assert!(collisions[j].contains(&i), "{} -> {} not mirrored", i, j);
            }
        }
        assert_eq!(collisions[2], Vec::<usize>::new());
        assert_eq!(collisions[3], vec![0, 1]);
    }

    #[test]
    fn test_find_first_section() {
        let mut tftf = two_data_sections(0);
        assert_eq!(tftf.find_first_section(SectionType::RawData), 0);
        // Not present: index of the end marker
        assert_eq!(tftf.find_first_section(SectionType::Signature), 2);

        tftf.add_section(SectionType::Signature, &[0u8; 8], 0).unwrap();
        assert_eq!(tftf.find_first_section(SectionType::Signature), 2);
    }

    #[test]
    fn test_boundary_extraction() {
        let mut tftf = two_data_sections(0);
        for k in 0..=tftf.sections().len() {
            let header = tftf.header_prefix(k).unwrap().len();
            assert_eq!(header, TFTF_HDR_OFF_SECTIONS + k * TFTF_SECTION_HDR_LENGTH);
        }

        assert_eq!(tftf.payload_prefix(0).unwrap().len(), 0);
        assert_eq!(tftf.payload_prefix(1).unwrap(), &[1u8; 100][..]);
        let payload = tftf.payload_prefix(2).unwrap();
        assert_eq!(payload.len(), 200);
        assert_eq!(payload[100], 2);

        assert!(matches!(
            tftf.header_prefix(4),
            Err(TftfError::SectionIndexOutOfRange { index: 4, len: 3 })
        ));
        assert!(tftf.payload_prefix(4).is_err());
    }

    #[test]
    fn test_header_prefix_flushes_edits() {
        let mut tftf = two_data_sections(0);
        tftf.load_base = 0xdead_beef;
        let prefix = tftf.header_prefix(0).unwrap();
        assert_eq!(&prefix[0x48..0x4c], &0xdead_beefu32.to_le_bytes());
    }

    #[test]
    fn test_signing_input_unchanged_by_signature() {
        let mut tftf = two_data_sections(0);
        let index = tftf.find_first_section(SectionType::Signature);
        let before = tftf.signing_input(index).unwrap();

        tftf.add_section(SectionType::Signature, &[9u8; 64], 0).unwrap();
        tftf.update_section_table_offsets();
        tftf.sniff_test();
        let after = tftf.signing_input(index).unwrap();

        assert_eq!(before, after);
        assert_eq!(
            before.len(),
            TFTF_HDR_OFF_SECTIONS + 2 * TFTF_SECTION_HDR_LENGTH + 200
        );
    }

    #[test]
    fn test_post_process() {
        let mut tftf = TftfHeader::new();
        tftf.add_section(SectionType::RawCode, &[0u8; 16], 0).unwrap();
        assert_eq!(tftf.post_process(), Validity::Valid);
        assert_eq!(tftf.sentinel, TFTF_SENTINEL);
        assert!(tftf.timestamp().is_some());
        assert_eq!(tftf.load_length, 16);

        // An existing timestamp is kept
        let stamp = Utc.with_ymd_and_hms(2016, 2, 29, 1, 2, 3).unwrap();
        tftf.set_timestamp(stamp);
        tftf.post_process();
        assert_eq!(tftf.timestamp(), Some(stamp));
    }

    #[test]
    fn test_package_name_truncated() {
        let mut tftf = TftfHeader::new();
        tftf.set_package_name(&"A".repeat(TFTF_FW_PKG_NAME_LENGTH + 10));
        assert_eq!(tftf.package_name_str(), "A".repeat(TFTF_FW_PKG_NAME_LENGTH));
    }

    #[test]
    fn test_summary() {
        let mut tftf = TftfHeader::new();
        tftf.set_package_name("Test Package");
        tftf.post_process();
        let summary = tftf.summary();
        assert!(summary.contains("Test Package"));
        assert!(summary.contains("TFTF"));
        assert!(summary.contains("valid"));
    }
}
