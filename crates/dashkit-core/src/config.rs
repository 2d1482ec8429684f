//! Configuration types for dashkit
//!
//! A [`ReconcileConfig`] names a record provider, the records to reconcile
//! with their target values, and reconciler settings. It is plain serde data
//! and is usually loaded from a JSON file.

use crate::matcher::SENTINEL;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;

/// Main reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Record provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Records to reconcile
    pub records: Vec<RecordConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ReconcileConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            provider: ProviderConfig::default(),
            records: Vec::new(),
            engine: EngineConfig::default(),
        }
    }

    /// Add a record to the configuration
    pub fn with_record(mut self, record: RecordConfig) -> Self {
        self.records.push(record);
        self
    }

    /// Parse a configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.records.is_empty() {
            return Err(crate::Error::config("No records configured"));
        }

        let mut seen = HashSet::new();
        for record in &self.records {
            record.validate()?;
            if !seen.insert(record.key()) {
                return Err(crate::Error::config(format!(
                    "Record {} is configured more than once",
                    record.key()
                )));
            }
        }

        self.provider.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    /// Canonical name
    Cname,
    /// Mail exchanger
    Mx,
    /// Name server
    Ns,
    /// Free-form text
    Txt,
}

impl RecordType {
    /// The conventional upper-case name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Txt => "TXT",
        }
    }

    /// Check that a value has the shape this record type expects
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            RecordType::A => value.parse::<Ipv4Addr>().is_ok(),
            RecordType::Aaaa => value.parse::<Ipv6Addr>().is_ok(),
            RecordType::Cname | RecordType::Ns => is_valid_domain_name(value),
            RecordType::Mx | RecordType::Txt => !value.trim().is_empty(),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a record set: its name and type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// Record name (e.g., "example.com")
    pub name: String,
    /// Record type
    pub record_type: RecordType,
}

impl RecordKey {
    /// Create a record key
    pub fn new(name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            record_type,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.record_type)
    }
}

/// Record provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// In-memory provider, seeded with the values it starts out with
    Memory {
        /// Initial record values
        #[serde(default)]
        seed: Vec<RecordSeed>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Memory { seed } => {
                for entry in seed {
                    if entry.name.is_empty() {
                        return Err(crate::Error::config("Seed record name cannot be empty"));
                    }
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Memory { .. } => "memory",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Memory { seed: Vec::new() }
    }
}

/// Initial values for one record of the in-memory provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSeed {
    /// Record name
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Values the record starts with (duplicates and order are kept)
    #[serde(default)]
    pub values: Vec<String>,
}

impl RecordSeed {
    /// The key this seed populates
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.name.clone(), self.record_type)
    }
}

/// Record reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// DNS record name (e.g., "example.com" or "sub.example.com")
    pub name: String,

    /// Record type
    pub record_type: RecordType,

    /// Values the record should end up with, in display order
    #[serde(default)]
    pub target: Vec<String>,

    /// Whether this record is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl RecordConfig {
    /// Create a new record configuration
    pub fn new(name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            record_type,
            target: Vec::new(),
            enabled: true,
        }
    }

    /// Set the target values
    pub fn with_target<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = values.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable the record
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The key of the record set this entry manages
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.name.clone(), self.record_type)
    }

    /// Validate the record name and its target values
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !is_valid_domain_name(&self.name) {
            return Err(crate::Error::config(format!(
                "Invalid record name: '{}'",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for value in &self.target {
            if !seen.insert(value.as_str()) {
                return Err(crate::Error::config(format!(
                    "Record {} target lists '{}' more than once",
                    self.key(),
                    value
                )));
            }
            if value == SENTINEL {
                return Err(crate::Error::config(format!(
                    "Record {} target cannot contain the placeholder '{}'",
                    self.key(),
                    SENTINEL
                )));
            }
            if !self.record_type.accepts(value) {
                return Err(crate::Error::config(format!(
                    "Record {} target '{}' is not a valid {} value",
                    self.key(),
                    value,
                    self.record_type
                )));
            }
        }

        Ok(())
    }
}

/// Basic RFC 1035 domain name check
///
/// Not comprehensive: labels are 1-63 alphanumeric/hyphen characters that do
/// not start or end with a hyphen, total length at most 253. A single
/// trailing dot and a leading `_` label (service records) are tolerated.
pub fn is_valid_domain_name(domain: &str) -> bool {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }

    domain.split('.').all(|label| {
        let label = label.strip_prefix('_').unwrap_or(label);
        !label.is_empty()
            && label.len() <= 63
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    })
}

fn default_enabled() -> bool {
    true
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of retry attempts for a failed change
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay between retry attempts (in milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Compute plans without applying them
    #[serde(default)]
    pub dry_run: bool,

    /// Capacity of the event channel
    ///
    /// When full, new events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate engine settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if self.max_retries > 10 {
            return Err(crate::Error::config(format!(
                "max_retries must be between 0 and 10. Got: {}",
                self.max_retries
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            dry_run: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_max_retries() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_event_channel_capacity() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "provider": {
            "type": "memory",
            "seed": [
                { "name": "example.com", "record_type": "NS", "values": ["ns1.other.com"] }
            ]
        },
        "records": [
            {
                "name": "example.com",
                "record_type": "NS",
                "target": ["ns1.wordpress.com", "ns2.wordpress.com"]
            }
        ]
    }"#;

    #[test]
    fn parses_json_with_defaults() {
        let config = ReconcileConfig::from_json_str(SAMPLE).unwrap();

        assert_eq!(config.provider.type_name(), "memory");
        assert_eq!(config.records.len(), 1);
        assert!(config.records[0].enabled);
        assert_eq!(config.engine.max_retries, 3);
        assert_eq!(config.engine.retry_delay_ms, 500);
        assert!(!config.engine.dry_run);
        config.validate().unwrap();
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = ReconcileConfig::from_file(file.path()).unwrap();
        assert_eq!(config.records[0].key(), RecordKey::new("example.com", RecordType::Ns));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ReconcileConfig::from_file("/nonexistent/dashkit.json").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn empty_records_rejected() {
        assert!(ReconcileConfig::new().validate().is_err());
    }

    #[test]
    fn duplicate_records_rejected() {
        let record = RecordConfig::new("example.com", RecordType::A).with_target(["192.0.78.24"]);
        let config = ReconcileConfig::new()
            .with_record(record.clone())
            .with_record(record);

        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn target_values_must_fit_record_type() {
        let bad_a = RecordConfig::new("example.com", RecordType::A).with_target(["ns1.wordpress.com"]);
        assert!(bad_a.validate().is_err());

        let bad_ns = RecordConfig::new("example.com", RecordType::Ns).with_target(["-"]);
        assert!(bad_ns.validate().is_err());

        let good = RecordConfig::new("example.com", RecordType::Aaaa).with_target(["2001:db8::1"]);
        assert!(good.validate().is_ok());

        let repeated = RecordConfig::new("example.com", RecordType::A)
            .with_target(["192.0.78.24", "192.0.78.24"]);
        assert!(matches!(repeated.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn domain_name_rules() {
        assert!(is_valid_domain_name("example.com"));
        assert!(is_valid_domain_name("example.com."));
        assert!(is_valid_domain_name("_dmarc.example.com"));
        assert!(!is_valid_domain_name(""));
        assert!(!is_valid_domain_name("-bad.example.com"));
        assert!(!is_valid_domain_name("a..b"));
        assert!(!is_valid_domain_name(&"a".repeat(64)));
    }

    #[test]
    fn record_type_serializes_upper_case() {
        let json = serde_json::to_value(RecordType::Aaaa).unwrap();
        assert_eq!(json, serde_json::json!("AAAA"));
        assert_eq!(RecordKey::new("example.com", RecordType::Mx).to_string(), "example.com/MX");
    }
}
