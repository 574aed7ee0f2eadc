//! Builder for assembling TFTF containers

use crate::error::{Result, TftfError};
use crate::header::TftfHeader;
use crate::section_types::SectionType;
use crate::TFTF_MAX_SECTIONS;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Default load address when none is given
pub const DEFAULT_LOAD_BASE: u32 = 0x1000_0000;

/// A section waiting to be added
#[derive(Debug, Clone)]
struct PendingSection {
    section_type: SectionType,
    data: Vec<u8>,
    copy_offset: u32,
}

/// Builder for creating TFTF containers
///
/// Collects header settings and section payloads, then adds every section
/// in one batch and post-processes the result: sentinel, timestamp, layout
/// and collision check.
#[derive(Debug, Clone)]
pub struct TftfBuilder {
    name: String,
    timestamp: Option<DateTime<Utc>>,
    load_base: u32,
    start_location: Option<u32>,
    unipro_mfg_id: u32,
    unipro_product_id: u32,
    ara_vendor_id: u32,
    ara_product_id: u32,
    sections: Vec<PendingSection>,
}

impl Default for TftfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TftfBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            name: String::new(),
            timestamp: None,
            load_base: DEFAULT_LOAD_BASE,
            start_location: None,
            unipro_mfg_id: 0,
            unipro_product_id: 0,
            ara_vendor_id: 0,
            ara_product_id: 0,
            sections: Vec::new(),
        }
    }

    /// Set the firmware package name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Use a fixed timestamp instead of the build time
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the load address
    pub fn load_base(mut self, addr: u32) -> Self {
        self.load_base = addr;
        self
    }

    /// Set the entry point; defaults to the load address
    pub fn start_location(mut self, addr: u32) -> Self {
        self.start_location = Some(addr);
        self
    }

    pub fn unipro_mfg_id(mut self, id: u32) -> Self {
        self.unipro_mfg_id = id;
        self
    }

    pub fn unipro_product_id(mut self, id: u32) -> Self {
        self.unipro_product_id = id;
        self
    }

    pub fn ara_vendor_id(mut self, id: u32) -> Self {
        self.ara_vendor_id = id;
        self
    }

    pub fn ara_product_id(mut self, id: u32) -> Self {
        self.ara_product_id = id;
        self
    }

    /// Add a section placed right after the previous one
    pub fn section(self, section_type: SectionType, data: impl Into<Vec<u8>>) -> Self {
        self.section_at(section_type, data, 0)
    }

    /// Add a section at an explicit copy offset (0 means "next free")
    pub fn section_at(
        mut self,
        section_type: SectionType,
        data: impl Into<Vec<u8>>,
        copy_offset: u32,
    ) -> Self {
        self.sections.push(PendingSection {
            section_type,
            data: data.into(),
            copy_offset,
        });
        self
    }

    /// Add a section read from a file
    pub fn section_from_file<P: AsRef<Path>>(
        self,
        section_type: SectionType,
        path: P,
        copy_offset: u32,
    ) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(self.section_at(section_type, data, copy_offset))
    }

    /// Number of sections added so far
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Build the container
    ///
    /// Collisions are not an error here; check
    /// [`TftfHeader::validity`] on the result.
    pub fn build(&self) -> Result<TftfHeader> {
        // One slot is taken by the end-of-descriptors entry
        if self.sections.len() >= TFTF_MAX_SECTIONS {
            return Err(TftfError::TableFull {
                max: TFTF_MAX_SECTIONS,
            });
        }

        let mut tftf = TftfHeader::new();
        tftf.set_package_name(&self.name);
        if let Some(timestamp) = self.timestamp {
            tftf.set_timestamp(timestamp);
        }
        tftf.load_base = self.load_base;
        tftf.start_location = self.start_location.unwrap_or(self.load_base);
        tftf.unipro_mfg_id = self.unipro_mfg_id;
        tftf.unipro_product_id = self.unipro_product_id;
        tftf.ara_vendor_id = self.ara_vendor_id;
        tftf.ara_product_id = self.ara_product_id;

        for section in &self.sections {
            tftf.add_section(section.section_type, &section.data, section.copy_offset)?;
        }

        tftf.post_process();
        tftf.encode()?;
        Ok(tftf)
    }

    /// Build the container and write it to a file, returning the path
    /// actually written
    pub fn build_to_file<P: AsRef<Path>>(&self, path: P) -> Result<std::path::PathBuf> {
        let mut tftf = self.build()?;
        tftf.write_to_file(path)
    }
}
