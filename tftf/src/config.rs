//! TOML package description for `tftf create --config`
//!
//! ```toml
//! name = "bootrom"
//! load_base = 0x1000_0000
//! unipro_mfg_id = 0x126
//!
//! [[section]]
//! type = "code"
//! file = "build/code.bin"
//!
//! [[section]]
//! type = "data"
//! file = "build/data.bin"
//! offset = 0x8000
//! ```

use crate::builder::TftfBuilder;
use crate::error::Result;
use crate::section_types::SectionType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    pub name: Option<String>,
    pub load_base: Option<u32>,
    pub start_location: Option<u32>,
    pub unipro_mfg_id: Option<u32>,
    pub unipro_product_id: Option<u32>,
    pub ara_vendor_id: Option<u32>,
    pub ara_product_id: Option<u32>,
    #[serde(rename = "section")]
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SectionConfig {
    #[serde(rename = "type")]
    pub section_type: SectionType,
    /// Payload file; relative paths resolve against the config file
    pub file: PathBuf,
    /// Explicit copy offset, 0 for "next free"
    #[serde(default)]
    pub offset: u32,
}

impl PackageConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file, resolving section paths against its directory
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::from_toml(&fs::read_to_string(path)?)?;

        let base = path.parent().unwrap_or(Path::new(""));
        for section in &mut config.sections {
            if section.file.is_relative() {
                section.file = base.join(&section.file);
            }
        }
        debug!(
            "Loaded {} with {} section(s)",
            path.display(),
            config.sections.len()
        );
        Ok(config)
    }

    /// Apply the header settings and read every section into `builder`
    pub fn apply(&self, mut builder: TftfBuilder) -> Result<TftfBuilder> {
        if let Some(name) = &self.name {
            builder = builder.name(name);
        }
        if let Some(addr) = self.load_base {
            builder = builder.load_base(addr);
        }
        if let Some(addr) = self.start_location {
            builder = builder.start_location(addr);
        }
        if let Some(id) = self.unipro_mfg_id {
            builder = builder.unipro_mfg_id(id);
        }
        if let Some(id) = self.unipro_product_id {
            builder = builder.unipro_product_id(id);
        }
        if let Some(id) = self.ara_vendor_id {
            builder = builder.ara_vendor_id(id);
        }
        if let Some(id) = self.ara_product_id {
            builder = builder.ara_product_id(id);
        }

        for section in &self.sections {
            builder =
                builder.section_from_file(section.section_type, &section.file, section.offset)?;
        }
        Ok(builder)
    }
}
