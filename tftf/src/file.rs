//! Reading and writing TFTF files

use crate::error::{Result, TftfError};
use crate::header::TftfHeader;
use crate::section_types::SectionType;
use crate::{TFTF_FILE_EXTENSION, TFTF_MAX_SECTIONS};
use std::fs;
use std::path::{Path, PathBuf};

/// Append the default extension when `path` has none
pub fn with_default_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(TFTF_FILE_EXTENSION);
        PathBuf::from(name)
    }
}

/// Locate an input file, trying `path` as given and then with the default
/// extension appended.
pub fn find_input(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    let mut name = path.as_os_str().to_owned();
    name.push(TFTF_FILE_EXTENSION);
    let with_ext = PathBuf::from(name);
    if with_ext.is_file() {
        return Ok(with_ext);
    }

    Err(TftfError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("can't find TFTF file {}", path.display()),
    )))
}

impl TftfHeader {
    /// Load and decode a TFTF file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = find_input(path.as_ref())?;
        debug!("Reading TFTF file {}", path.display());
        Self::from_bytes(fs::read(&path)?)
    }

    /// Load a TFTF file, keeping a partially decoded container on a bad
    /// section table
    pub fn from_file_partial<P: AsRef<Path>>(path: P) -> Result<(Self, Option<TftfError>)> {
        let path = find_input(path.as_ref())?;
        Self::from_bytes_partial(fs::read(&path)?)
    }

    /// Read a section payload from a file and add it to the table
    pub fn add_section_from_file<P: AsRef<Path>>(
        &mut self,
        section_type: SectionType,
        path: P,
        copy_offset: u32,
    ) -> Result<()> {
        if self.sections().len() >= TFTF_MAX_SECTIONS {
            warn!("Section table full");
            return Err(TftfError::TableFull {
                max: TFTF_MAX_SECTIONS,
            });
        }

        let data = fs::read(path.as_ref())?;
        debug!(
            "Loaded {} bytes from {}",
            data.len(),
            path.as_ref().display()
        );
        self.add_section(section_type, &data, copy_offset)
    }

    /// Encode and write the container
    ///
    /// Appends the default extension if `path` has none, then checks the
    /// size of the written file. Returns the path actually written.
    pub fn write_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<PathBuf> {
        self.encode()?;
        let path = with_default_extension(path.as_ref());

        fs::write(&path, self.as_bytes())?;

        let expected = self.total_length() as u64;
        let actual = fs::metadata(&path)?.len();
        if actual != expected {
            return Err(TftfError::LengthMismatch {
                path,
                expected,
                actual,
            });
        }

        info!("Wrote {} ({} bytes)", path.display(), actual);
        Ok(path)
    }
}
