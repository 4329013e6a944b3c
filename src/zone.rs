//! Zone record model and configuration loading.
//!
//! A zone is described in a TOML configuration file naming its record
//! sources and nameservers; each `file` source contributes records from its
//! own TOML record file. Sources are applied in order, so a later source
//! replaces an earlier record with the same `(name, type)` identity.
//!
//! ```toml
//! [zones."example.com."]
//! sources = ["production"]
//! nameservers = ["ns1.example.com", "10.0.0.53"]
//!
//! [sources.production]
//! type = "file"
//! path = "zones/example.com.toml"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hickory_resolver::proto::rr::RecordType as WireRecordType;
use serde::Deserialize;
use strum_macros::{Display as DisplayMacro, EnumString};

use crate::error::CheckError;

/// DNS record types the checker understands.
///
/// String forms are the uppercase mnemonics; ordering follows the mnemonic's
/// lexicographic order so sorted record sets are diff-stable.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    DisplayMacro,
    EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record.
    A,
    /// IPv6 address record.
    Aaaa,
    /// Canonical-name alias.
    Cname,
    /// Mail exchange record.
    Mx,
    /// Nameserver delegation record.
    Ns,
    /// Reverse-lookup pointer record.
    Ptr,
    /// Service locator record.
    Srv,
    /// Free-form text record.
    Txt,
}

impl From<RecordType> for WireRecordType {
    fn from(rtype: RecordType) -> Self {
        match rtype {
            RecordType::A => WireRecordType::A,
            RecordType::Aaaa => WireRecordType::AAAA,
            RecordType::Cname => WireRecordType::CNAME,
            RecordType::Mx => WireRecordType::MX,
            RecordType::Ns => WireRecordType::NS,
            RecordType::Ptr => WireRecordType::PTR,
            RecordType::Srv => WireRecordType::SRV,
            RecordType::Txt => WireRecordType::TXT,
        }
    }
}

/// One configured DNS resource record, immutable for the lifetime of a run.
///
/// `values` is non-empty for every type except NS, where an empty set is
/// permitted (delegations are often verified by the servers themselves).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Fully-qualified, lowercased name with trailing dot.
    pub fqdn: String,
    /// The record's type.
    pub rtype: RecordType,
    /// Configured time-to-live, printed in the report.
    pub ttl: u32,
    /// Configured values, as written in the record source.
    pub values: Vec<String>,
}

impl Record {
    /// Identity used for sorting and source-merge replacement.
    pub fn identity(&self) -> (&str, RecordType) {
        (&self.fqdn, self.rtype)
    }
}

/// Canonical fully-qualified zone name: lowercased, trailing dot appended
/// when missing.
pub fn canonical_zone(name: &str) -> String {
    let name = name.trim().to_lowercase();
    if name.ends_with('.') {
        name
    } else {
        format!("{name}.")
    }
}

/// Parsed contents of the `--config-file` TOML.
#[derive(Debug, Deserialize)]
pub struct ZoneSetConfig {
    #[serde(default)]
    zones: BTreeMap<String, ZoneEntry>,
    #[serde(default)]
    sources: BTreeMap<String, SourceEntry>,
    /// Directory the config file lives in; source paths resolve against it.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ZoneEntry {
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    nameservers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    path: Option<PathBuf>,
}

impl ZoneSetConfig {
    /// Loads and parses the zone configuration file.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::ConfigRead` if the file cannot be read and
    /// `CheckError::ConfigParse` if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, CheckError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CheckError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: ZoneSetConfig =
            toml::from_str(&raw).map_err(|source| CheckError::ConfigParse {
                path: path.display().to_string(),
                source,
            })?;
        config.base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        Ok(config)
    }

    /// The nameserver identifiers configured for `zone`, in order.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::UnknownZone` for an unconfigured zone and
    /// `CheckError::NoNameservers` when the zone's list is empty.
    pub fn nameservers(&self, zone: &str) -> Result<Vec<String>, CheckError> {
        let entry = self.zone_entry(zone)?;
        if entry.nameservers.is_empty() {
            return Err(CheckError::NoNameservers {
                zone: zone.to_string(),
            });
        }
        Ok(entry.nameservers.clone())
    }

    /// Populates the full record set for `zone` from its configured sources,
    /// sorted by `(name, type)`.
    ///
    /// # Errors
    ///
    /// Any undefined zone or source, unsupported source type, unreadable or
    /// invalid record file, or empty non-NS record aborts before queries are
    /// issued.
    pub fn populate(&self, zone: &str) -> Result<Vec<Record>, CheckError> {
        let entry = self.zone_entry(zone)?;
        let mut records: BTreeMap<(String, RecordType), Record> = BTreeMap::new();
        for source_name in &entry.sources {
            let source =
                self.sources
                    .get(source_name)
                    .ok_or_else(|| CheckError::UnknownSource {
                        zone: zone.to_string(),
                        source_name: source_name.clone(),
                    })?;
            if source.kind != "file" {
                return Err(CheckError::UnknownSourceKind {
                    source_name: source_name.clone(),
                    kind: source.kind.clone(),
                });
            }
            let path = source
                .path
                .as_ref()
                .ok_or_else(|| CheckError::SourceMissingPath {
                    source_name: source_name.clone(),
                })?;
            for record in load_record_file(&self.base_dir.join(path), zone)? {
                records.insert((record.fqdn.clone(), record.rtype), record);
            }
        }
        Ok(records.into_values().collect())
    }

    fn zone_entry(&self, zone: &str) -> Result<&ZoneEntry, CheckError> {
        self.zones
            .get(zone)
            .ok_or_else(|| CheckError::UnknownZone(zone.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct RecordFile {
    #[serde(default)]
    records: Vec<RecordEntry>,
}

/// One record as written in a record source file.
#[derive(Debug, Deserialize)]
struct RecordEntry {
    /// Name relative to the zone; empty or "@" for the apex.
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    rtype: RecordType,
    ttl: u32,
    /// Single-value shorthand.
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    values: Option<Vec<String>>,
}

impl RecordEntry {
    fn into_record(self, zone: &str) -> Result<Record, CheckError> {
        let values = match (self.values, self.value) {
            (Some(values), _) => values,
            (None, Some(value)) => vec![value],
            (None, None) => Vec::new(),
        };
        if values.is_empty() && self.rtype != RecordType::Ns {
            return Err(CheckError::EmptyRecord {
                fqdn: join_fqdn(&self.name, zone),
                rtype: self.rtype.to_string(),
            });
        }
        Ok(Record {
            fqdn: join_fqdn(&self.name, zone),
            rtype: self.rtype,
            ttl: self.ttl,
            values,
        })
    }
}

/// Joins a zone-relative name with its zone into a lowercased fqdn.
fn join_fqdn(name: &str, zone: &str) -> String {
    let name = name.trim().to_lowercase();
    if name.is_empty() || name == "@" {
        zone.to_string()
    } else {
        format!("{name}.{zone}")
    }
}

fn load_record_file(path: &Path, zone: &str) -> Result<Vec<Record>, CheckError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CheckError::ConfigRead {
        path: path.display().to_string(),
        source,
    })?;
    let file: RecordFile = toml::from_str(&raw).map_err(|source| CheckError::ConfigParse {
        path: path.display().to_string(),
        source,
    })?;
    file.records
        .into_iter()
        .map(|entry| entry.into_record(zone))
        .collect()
}
