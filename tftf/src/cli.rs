//! Command line interface for tftf

use crate::config::PackageConfig;
use crate::file::find_input;
use crate::header::{TftfHeader, Validity};
use crate::section::Section;
use crate::section_types::SectionType;
use crate::signature::{SignatureBlock, SignatureType, TFTF_SIGNATURE_KEY_HASH_LENGTH};
use crate::{TFTF_MAX_SECTIONS, TFTF_SENTINEL, TftfBuilder, TftfError, VERSION};
use anyhow::{Context, Result, bail};
use clap::{ArgGroup, ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Bytes per line of a payload dump
const DUMP_WIDTH: usize = 16;

/// Command line arguments for tftf
#[derive(Parser, Debug)]
#[command(name = "tftf")]
#[command(version = VERSION)]
#[command(about = "Create, inspect and prepare TFTF firmware containers", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - only output errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a TFTF container
    Create(CreateArgs),
    /// Show the header and section table of a TFTF file
    Display(DisplayArgs),
    /// Append a signature or certificate section
    Append(AppendArgs),
    /// Write the bytes a signature section has to cover
    SignInput(SignInputArgs),
    /// Check a TFTF file for consistency
    Verify(VerifyArgs),
}

/// A section payload given as `FILE[@OFFSET]`
#[derive(Debug, Clone, PartialEq)]
pub struct SectionArg {
    pub file: PathBuf,
    pub offset: u32,
}

/// Arguments for creating a container
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// TOML package description
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Firmware package name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Load address
    #[arg(short = 'l', long = "load", value_parser = parse_hex_u32)]
    pub load_base: Option<u32>,

    /// Entry point, defaults to the load address
    #[arg(short = 's', long = "start", value_parser = parse_hex_u32)]
    pub start_location: Option<u32>,

    /// UniPro manufacturer ID
    #[arg(long = "unipro-mfg", value_parser = parse_hex_u32)]
    pub unipro_mfg_id: Option<u32>,

    /// UniPro product ID
    #[arg(long = "unipro-pid", value_parser = parse_hex_u32)]
    pub unipro_product_id: Option<u32>,

    /// Ara vendor ID
    #[arg(long = "ara-vid", value_parser = parse_hex_u32)]
    pub ara_vendor_id: Option<u32>,

    /// Ara product ID
    #[arg(long = "ara-pid", value_parser = parse_hex_u32)]
    pub ara_product_id: Option<u32>,

    /// Code section, FILE[@OFFSET]
    #[arg(long, value_name = "FILE[@OFFSET]", value_parser = parse_section_arg)]
    pub code: Vec<SectionArg>,

    /// Data section, FILE[@OFFSET]
    #[arg(long, value_name = "FILE[@OFFSET]", value_parser = parse_section_arg)]
    pub data: Vec<SectionArg>,

    /// Manifest section, FILE[@OFFSET]
    #[arg(long, value_name = "FILE[@OFFSET]", value_parser = parse_section_arg)]
    pub manifest: Vec<SectionArg>,

    /// Certificate section, FILE[@OFFSET]
    #[arg(long, value_name = "FILE[@OFFSET]", value_parser = parse_section_arg)]
    pub certificate: Vec<SectionArg>,

    /// Output file; ".bin" is appended when it has no extension
    #[arg(short, long)]
    pub output: PathBuf,

    /// Fail instead of warning when sections overlap
    #[arg(long)]
    pub reject_collisions: bool,

    /// Print the container after creation
    #[arg(long)]
    pub print_info: bool,

    /// Command-line order of the section flags, filled by
    /// [`Args::from_matches`]
    #[arg(skip)]
    pub order: Vec<(SectionType, usize)>,
}

/// Arguments for displaying a container
#[derive(Parser, Debug)]
pub struct DisplayArgs {
    /// TFTF file to examine
    pub file: PathBuf,

    /// Dump section payloads
    #[arg(long)]
    pub data: bool,

    /// Print in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for appending a signature or certificate
#[derive(Parser, Debug)]
#[command(group(
    ArgGroup::new("payload")
        .required(true)
        .args(["signature", "certificate"])
))]
pub struct AppendArgs {
    /// TFTF file to extend
    pub file: PathBuf,

    /// Raw signature produced by the signer
    #[arg(long, requires = "key_name")]
    pub signature: Option<PathBuf>,

    /// Name of the signing key
    #[arg(long)]
    pub key_name: Option<String>,

    /// Hash of the public key, hex encoded
    #[arg(long, value_parser = parse_key_hash)]
    pub key_hash: Option<[u8; TFTF_SIGNATURE_KEY_HASH_LENGTH]>,

    /// Signature algorithm
    #[arg(long, default_value = "rsa2048-sha256")]
    pub sig_type: SignatureType,

    /// Certificate to append
    #[arg(long)]
    pub certificate: Option<PathBuf>,

    /// Output file, defaults to rewriting the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for extracting the signing input
#[derive(Parser, Debug)]
pub struct SignInputArgs {
    /// TFTF file to sign
    pub file: PathBuf,

    /// Section the signature will occupy
    #[arg(long, default_value = "signature")]
    pub section_type: SectionType,

    /// Where to write the bytes to sign
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Arguments for verifying a container
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// TFTF file to verify
    pub file: PathBuf,

    /// Accept overlapping sections
    #[arg(long)]
    pub allow_collisions: bool,
}

impl Args {
    /// Parse the process arguments
    pub fn parse_ordered() -> Self {
        let matches = Self::command().get_matches();
        match Self::from_matches(&matches) {
            Ok(args) => args,
            Err(err) => err.exit(),
        }
    }

    /// Parse `args`, like [`Parser::try_parse_from`]
    pub fn try_parse_ordered_from<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        Self::from_matches(&matches)
    }

    /// Build the arguments and record the order of the section flags,
    /// which derive parsing alone loses across separate flags
    pub fn from_matches(matches: &ArgMatches) -> std::result::Result<Self, clap::Error> {
        let mut args = Self::from_arg_matches(matches)?;
        if let (Commands::Create(create), Some(("create", sub))) =
            (&mut args.command, matches.subcommand())
        {
            create.order = section_order(sub);
        }
        Ok(args)
    }
}

/// Flag name and section type of every section flag of `create`
const SECTION_FLAGS: [(&str, SectionType); 4] = [
    ("code", SectionType::RawCode),
    ("data", SectionType::RawData),
    ("manifest", SectionType::Manifest),
    ("certificate", SectionType::Certificate),
];

fn section_order(matches: &ArgMatches) -> Vec<(SectionType, usize)> {
    let mut order: Vec<(usize, SectionType, usize)> = Vec::new();
    for (id, section_type) in SECTION_FLAGS {
        if let Some(indices) = matches.indices_of(id) {
            order.extend(
                indices
                    .enumerate()
                    .map(|(nth, position)| (position, section_type, nth)),
            );
        }
    }
    order.sort_by_key(|&(position, _, _)| position);
    order
        .into_iter()
        .map(|(_, section_type, nth)| (section_type, nth))
        .collect()
}

impl CreateArgs {
    fn sections_of(&self, section_type: SectionType) -> &[SectionArg] {
        match section_type {
            SectionType::RawCode => &self.code,
            SectionType::RawData => &self.data,
            SectionType::Manifest => &self.manifest,
            SectionType::Certificate => &self.certificate,
            _ => &[],
        }
    }

    /// Sections from the command line, in the order they were given
    pub fn ordered_sections(&self) -> Vec<(SectionType, &SectionArg)> {
        if self.order.is_empty() {
            return SECTION_FLAGS
                .iter()
                .flat_map(|&(_, ty)| self.sections_of(ty).iter().map(move |s| (ty, s)))
                .collect();
        }
        self.order
            .iter()
            .filter_map(|&(ty, nth)| self.sections_of(ty).get(nth).map(|s| (ty, s)))
            .collect()
    }
}

/// Parse a decimal or `0x` prefixed hexadecimal string to u32
pub fn parse_hex_u32(s: &str) -> std::result::Result<u32, std::num::ParseIntError> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse::<u32>()
    }
}

/// Parse `FILE[@OFFSET]`
pub fn parse_section_arg(s: &str) -> std::result::Result<SectionArg, String> {
    match s.rsplit_once('@') {
        Some((file, offset)) if !file.is_empty() => {
            let offset = parse_hex_u32(offset)
                .map_err(|e| format!("invalid offset '{}': {}", offset, e))?;
            Ok(SectionArg {
                file: PathBuf::from(file),
                offset,
            })
        }
        _ => Ok(SectionArg {
            file: PathBuf::from(s),
            offset: 0,
        }),
    }
}

fn parse_key_hash(
    s: &str,
) -> std::result::Result<[u8; TFTF_SIGNATURE_KEY_HASH_LENGTH], String> {
    let bytes = hex::decode(s).map_err(|e| e.to_string())?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        format!(
            "key hash is {} bytes, expected {}",
            bytes.len(),
            TFTF_SIGNATURE_KEY_HASH_LENGTH
        )
    })
}

/// Main CLI handler
pub fn run_cli(args: Args) -> Result<()> {
    let quiet = args.quiet;

    match args.command {
        Commands::Create(create_args) => handle_create(create_args, quiet),
        Commands::Display(display_args) => handle_display(display_args),
        Commands::Append(append_args) => handle_append(append_args, quiet),
        Commands::SignInput(sign_input_args) => handle_sign_input(sign_input_args, quiet),
        Commands::Verify(verify_args) => handle_verify(verify_args, quiet),
    }
}

fn collision_count(tftf: &TftfHeader) -> usize {
    tftf.collisions()
        .iter()
        .filter(|peers| !peers.is_empty())
        .count()
}

fn handle_create(args: CreateArgs, quiet: bool) -> Result<()> {
    let mut builder = TftfBuilder::new();

    if let Some(path) = &args.config {
        let config = PackageConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        builder = config.apply(builder)?;
    }

    if let Some(name) = &args.name {
        builder = builder.name(name);
    }
    if let Some(addr) = args.load_base {
        builder = builder.load_base(addr);
    }
    if let Some(addr) = args.start_location {
        builder = builder.start_location(addr);
    }
    if let Some(id) = args.unipro_mfg_id {
        builder = builder.unipro_mfg_id(id);
    }
    if let Some(id) = args.unipro_product_id {
        builder = builder.unipro_product_id(id);
    }
    if let Some(id) = args.ara_vendor_id {
        builder = builder.ara_vendor_id(id);
    }
    if let Some(id) = args.ara_product_id {
        builder = builder.ara_product_id(id);
    }

    for (section_type, section) in args.ordered_sections() {
        builder = builder
            .section_from_file(section_type, &section.file, section.offset)
            .with_context(|| format!("Failed to read {}", section.file.display()))?;
    }

    if builder.section_count() == 0 {
        warn!("No sections given, creating a container with an empty table");
    }

    let mut tftf = builder.build()?;

    if tftf.validity() == Validity::ValidWithCollisions {
        let count = collision_count(&tftf);
        if args.reject_collisions {
            return Err(TftfError::Collisions { count }.into());
        }
        if !quiet {
            eprintln!(
                "{} {} section(s) overlap another section",
                "Warning:".yellow().bold(),
                count
            );
        }
    }

    let path = tftf.write_to_file(&args.output)?;

    if !quiet {
        eprintln!("TFTF created successfully: {}", path.display());
        eprintln!("TFTF size: {} bytes", tftf.total_length());
    }

    if args.print_info && !quiet {
        println!();
        print_header(&path, &tftf);
    }

    Ok(())
}

fn handle_display(args: DisplayArgs) -> Result<()> {
    let path = find_input(&args.file)?;
    let (tftf, error) = TftfHeader::from_file_partial(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if args.json {
        let report = Report::new(&path, &tftf, error.as_ref());
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_header(&path, &tftf);
        if args.data {
            print_section_data(&tftf);
        }
    }

    match error {
        Some(err) => Err(err).context("Section table is malformed"),
        None => Ok(()),
    }
}

fn handle_append(args: AppendArgs, quiet: bool) -> Result<()> {
    let path = find_input(&args.file)?;
    let mut tftf = TftfHeader::from_file(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    tftf.validate()?;

    if tftf.total_length() != tftf.expected_total_length() {
        bail!(
            "{} is {} bytes but its sections need {}; refusing to append",
            path.display(),
            tftf.total_length(),
            tftf.expected_total_length()
        );
    }

    let (section_type, payload) = match (&args.signature, &args.certificate) {
        (Some(signature), _) => {
            let raw = fs::read(signature)
                .with_context(|| format!("Failed to read {}", signature.display()))?;
            let block = SignatureBlock::new(
                args.sig_type,
                args.key_name.clone().unwrap_or_default(),
                args.key_hash.unwrap_or([0; TFTF_SIGNATURE_KEY_HASH_LENGTH]),
                raw,
            )?;
            (SectionType::Signature, block.to_bytes()?)
        }
        (None, Some(certificate)) => {
            let raw = fs::read(certificate)
                .with_context(|| format!("Failed to read {}", certificate.display()))?;
            (SectionType::Certificate, raw)
        }
        (None, None) => bail!("Nothing to append"),
    };

    tftf.add_section(section_type, &payload, 0)?;
    tftf.update_section_table_offsets();
    if tftf.sniff_test() == Validity::ValidWithCollisions && !quiet {
        eprintln!(
            "{} {} section(s) overlap another section",
            "Warning:".yellow().bold(),
            collision_count(&tftf)
        );
    }

    let output = args.output.unwrap_or(path);
    let written = tftf.write_to_file(&output)?;

    if !quiet {
        eprintln!(
            "Appended {} section ({} bytes) to {}",
            section_type,
            payload.len(),
            written.display()
        );
    }
    Ok(())
}

fn handle_sign_input(args: SignInputArgs, quiet: bool) -> Result<()> {
    let mut tftf = TftfHeader::from_file(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    tftf.validate()?;

    let index = tftf.find_first_section(args.section_type);
    let input = tftf.signing_input(index)?;
    fs::write(&args.output, &input)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if !quiet {
        eprintln!(
            "Signing input for section [{}]: {} bytes written to {}",
            index,
            input.len(),
            args.output.display()
        );
    }
    Ok(())
}

fn handle_verify(args: VerifyArgs, quiet: bool) -> Result<()> {
    let tftf = TftfHeader::from_file(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    if tftf.sentinel != TFTF_SENTINEL {
        return Err(TftfError::invalid_sentinel(&tftf.sentinel).into());
    }
    if !quiet {
        eprintln!("Sentinel: '{}' - OK", tftf.sentinel_str());
    }

    if tftf.total_length() != tftf.expected_total_length() {
        bail!(
            "Length mismatch: file is {} bytes, sections need {}",
            tftf.total_length(),
            tftf.expected_total_length()
        );
    }

    for (index, section) in tftf.sections().iter().enumerate() {
        if section.section_type != SectionType::Signature {
            continue;
        }
        let block = SignatureBlock::from_bytes(tftf.section_data(index)?)
            .with_context(|| format!("Bad signature block in section [{}]", index))?;
        if block.length != section.section_length {
            bail!(
                "Signature block [{}] claims {} bytes, section holds {}",
                index,
                block.length,
                section.section_length
            );
        }
    }

    if tftf.validity() == Validity::ValidWithCollisions {
        let count = collision_count(&tftf);
        if !args.allow_collisions {
            return Err(TftfError::Collisions { count }.into());
        }
        if !quiet {
            eprintln!("{} {} colliding section(s) allowed", "Warning:".yellow().bold(), count);
        }
    }

    if !quiet {
        eprintln!("TFTF verification successful");
    }
    Ok(())
}

/// JSON view of a container
#[derive(Serialize)]
struct Report<'a> {
    file: String,
    sentinel: String,
    timestamp: String,
    package_name: String,
    validity: Validity,
    load_base: String,
    load_length: u32,
    expanded_length: u32,
    start_location: String,
    unipro_mfg_id: String,
    unipro_product_id: String,
    ara_vendor_id: String,
    ara_product_id: String,
    total_length: usize,
    sections: Vec<SectionReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct SectionReport<'a> {
    index: usize,
    #[serde(flatten)]
    section: &'a Section,
    collisions: &'a [usize],
}

impl<'a> Report<'a> {
    fn new(path: &Path, tftf: &'a TftfHeader, error: Option<&TftfError>) -> Self {
        let sections = tftf
            .sections()
            .iter()
            .enumerate()
            .map(|(index, section)| SectionReport {
                index,
                section,
                collisions: tftf
                    .collisions()
                    .get(index)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]),
            })
            .collect();

        Self {
            file: path.display().to_string(),
            sentinel: tftf.sentinel_str(),
            timestamp: tftf.timestamp_str(),
            package_name: tftf.package_name_str(),
            validity: tftf.validity(),
            load_base: format!("0x{:08x}", tftf.load_base),
            load_length: tftf.load_length,
            expanded_length: tftf.expanded_length,
            start_location: format!("0x{:08x}", tftf.start_location),
            unipro_mfg_id: format!("0x{:08x}", tftf.unipro_mfg_id),
            unipro_product_id: format!("0x{:08x}", tftf.unipro_product_id),
            ara_vendor_id: format!("0x{:08x}", tftf.ara_vendor_id),
            ara_product_id: format!("0x{:08x}", tftf.ara_product_id),
            total_length: tftf.total_length(),
            sections,
            error: error.map(ToString::to_string),
        }
    }
}

fn print_header(path: &Path, tftf: &TftfHeader) {
    let validity = match tftf.validity() {
        Validity::Valid => "valid".green(),
        Validity::ValidWithCollisions => "valid with collisions".yellow(),
        Validity::Invalid => "INVALID".red().bold(),
    };

    println!("{} {} ({})", "TFTF Header for".bold(), path.display(), validity);
    println!("  Sentinel:              '{}'", tftf.sentinel_str());
    println!("  Timestamp:             '{}'", tftf.timestamp_str());
    println!("  Firmware package name: '{}'", tftf.package_name_str());
    println!("  Load base:             0x{:08x}", tftf.load_base);
    println!("  Load length:           0x{:08x}", tftf.load_length);
    println!("  Expanded length:       0x{:08x}", tftf.expanded_length);
    println!("  Start location:        0x{:08x}", tftf.start_location);
    println!("  UniPro mfg ID:         0x{:08x}", tftf.unipro_mfg_id);
    println!("  UniPro product ID:     0x{:08x}", tftf.unipro_product_id);
    println!("  Ara vendor ID:         0x{:08x}", tftf.ara_vendor_id);
    println!("  Ara product ID:        0x{:08x}", tftf.ara_product_id);
    println!("  Total length:          {} bytes", tftf.total_length());

    println!("  Section table:");
    println!("        Length     ExpLength  CopyOffset Type");
    for (index, section) in tftf.sections().iter().enumerate() {
        println!(
            "    {:2} 0x{:08x} 0x{:08x} 0x{:08x} 0x{:02x} ({})",
            index,
            section.section_length,
            section.expanded_length,
            section.copy_offset,
            section.section_type.code(),
            section.section_type
        );
        if let Some(peers) = tftf.collisions().get(index) {
            if !peers.is_empty() {
                println!("       {} {:?}", "collides with".red(), peers);
            }
        }
    }

    let used = tftf.sections().len();
    if used < TFTF_MAX_SECTIONS {
        println!(
            "    {:2}..{:2} (unused)",
            used,
            TFTF_MAX_SECTIONS - 1
        );
    }
}

fn print_section_data(tftf: &TftfHeader) {
    for (index, section) in tftf.sections().iter().enumerate() {
        if section.section_type == SectionType::EndOfDescriptors {
            break;
        }

        println!();
        println!(
            "{}",
            format!("Section [{}] {} ({} bytes):", index, section.section_type, section.section_length)
                .bold()
        );

        let data = match tftf.section_data(index) {
            Ok(data) => data,
            Err(err) => {
                println!("  {}", err.to_string().red());
                continue;
            }
        };

        if section.section_type == SectionType::Signature {
            match SignatureBlock::from_bytes(data) {
                Ok(block) => {
                    println!("  Length:         0x{:08x}", block.length);
                    println!("  Signature type: {}", block.signature_type);
                    println!("  Key name:       '{}'", block.key_name);
                    println!("  Key hash:       {}", hex::encode(block.key_hash));
                    println!("  Signature:");
                    hex_dump(&block.signature);
                }
                Err(err) => {
                    println!("  {}", err.to_string().red());
                    hex_dump(data);
                }
            }
        } else {
            hex_dump(data);
        }
    }
}

fn hex_dump(data: &[u8]) {
    for (line, chunk) in data.chunks(DUMP_WIDTH).enumerate() {
        println!("    {:08x}: {}", line * DUMP_WIDTH, hex::encode(chunk));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x1000").unwrap(), 4096);
        assert_eq!(parse_hex_u32("0X1000").unwrap(), 4096);
        assert_eq!(parse_hex_u32("1000").unwrap(), 1000);
        assert!(parse_hex_u32("0xzz").is_err());
    }

    #[test]
    fn test_parse_section_arg() {
        assert_eq!(
            parse_section_arg("code.bin").unwrap(),
            SectionArg {
                file: PathBuf::from("code.bin"),
                offset: 0
            }
        );
        assert_eq!(
            parse_section_arg("build/data.bin@0x8000").unwrap(),
            SectionArg {
                file: PathBuf::from("build/data.bin"),
                offset: 0x8000
            }
        );
        assert!(parse_section_arg("data.bin@later").is_err());
    }

    #[test]
    fn test_parse_key_hash() {
        let hash = parse_key_hash(&"ab".repeat(32)).unwrap();
        assert_eq!(hash, [0xab; 32]);
        assert!(parse_key_hash("abcd").is_err());
        assert!(parse_key_hash("not hex").is_err());
    }

    #[test]
    fn test_args_parsing() {
        let args = Args::try_parse_ordered_from([
            "tftf", "create", "-n", "Test", "--load", "0x2000", "-o", "out.bin",
        ])
        .unwrap();

        if let Commands::Create(create_args) = args.command {
            assert_eq!(create_args.name.as_deref(), Some("Test"));
            assert_eq!(create_args.load_base, Some(0x2000));
            assert_eq!(create_args.start_location, None);
            assert_eq!(create_args.output, PathBuf::from("out.bin"));
        } else {
            panic!("Expected Create command");
        }
    }

    #[test]
    fn test_section_order_preserved() {
        let args = Args::try_parse_ordered_from([
            "tftf",
            "create",
            "--data",
            "d0",
            "--code",
            "c0@0x100",
            "--data",
            "d1",
            "--manifest",
            "m0",
            "-o",
            "out",
        ])
        .unwrap();

        let Commands::Create(create_args) = args.command else {
            panic!("Expected Create command");
        };
        let order: Vec<_> = create_args
            .ordered_sections()
            .into_iter()
            .map(|(ty, s)| (ty, s.file.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(
            order,
            vec![
                (SectionType::RawData, "d0".to_string()),
                (SectionType::RawCode, "c0".to_string()),
                (SectionType::RawData, "d1".to_string()),
                (SectionType::Manifest, "m0".to_string()),
            ]
        );
    }

    #[test]
    fn test_append_requires_payload() {
        assert!(Args::try_parse_ordered_from(["tftf", "append", "fw.bin"]).is_err());
        assert!(
            Args::try_parse_ordered_from(["tftf", "append", "fw.bin", "--signature", "sig"])
                .is_err()
        );
        let args = Args::try_parse_ordered_from([
            "tftf",
            "append",
            "fw.bin",
            "--signature",
            "sig",
            "--key-name",
            "s2fsk",
        ])
        .unwrap();
        let Commands::Append(append_args) = args.command else {
            panic!("Expected Append command");
        };
        assert_eq!(append_args.sig_type, SignatureType::Rsa2048Sha256);
    }

    #[test]
    fn test_sign_input_defaults() {
        let args =
            Args::try_parse_ordered_from(["tftf", "sign-input", "fw.bin", "-o", "in.bin"]).unwrap();
        let Commands::SignInput(sign_args) = args.command else {
            panic!("Expected SignInput command");
        };
        assert_eq!(sign_args.section_type, SectionType::Signature);
    }
}
