//! Translator configuration
//!
//! Everything the translator needs to know about a logical connection is
//! resolved once into a [`TranslatorConfig`] and passed by reference into
//! every call. Nothing in here changes while frames are flowing.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::frame::{format_mac, is_group_addr, mac_serde, MacAddr};
use crate::{Result, XlatError};

/// Role of the local interface on the wireless medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkRole {
    AccessPoint,
    IndependentBss,
    #[default]
    Station,
    /// Never translated
    Monitor,
}

/// Frame format exchanged with the host side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Host sends and expects 802.11 headers (without QoS control)
    NativeWifi,
    /// Host sends and expects Ethernet-II / 802.3 headers
    #[default]
    Ethernet,
}

/// Per-connection translator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Network role of the local interface
    pub role: NetworkRole,
    /// Local interface address, the BSSID when acting as AP or IBSS
    #[serde(with = "mac_serde")]
    pub own_addr: MacAddr,
    /// Host side frame format
    pub wire_format: WireFormat,
    /// Insert and remove LLC/SNAP headers in software
    pub sw_llc_processing: bool,
    /// Set the protected frame bit in software for frames to be encrypted
    pub sw_protected_frame: bool,
    /// Hardware delivers the 802.11 header only with the first A-MSDU subframe
    pub subframe_header_recovery: bool,
}

/// Configuration validation result
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether configuration is valid
    pub valid: bool,
    /// Validation errors
    pub errors: Vec<String>,
    /// Validation warnings
    pub warnings: Vec<String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            role: NetworkRole::Station,
            own_addr: [0; 6],
            wire_format: WireFormat::Ethernet,
            sw_llc_processing: true,
            sw_protected_frame: false,
            subframe_header_recovery: true,
        }
    }
}

impl TranslatorConfig {
    /// Create configuration with default switches
    pub fn new(role: NetworkRole, own_addr: MacAddr) -> Self {
        Self {
            role,
            own_addr,
            ..Self::default()
        }
    }

    pub fn with_wire_format(mut self, wire_format: WireFormat) -> Self {
        self.wire_format = wire_format;
        self
    }

    pub fn with_llc_processing(mut self, enabled: bool) -> Self {
        self.sw_llc_processing = enabled;
        self
    }

    pub fn with_protected_frames(mut self, enabled: bool) -> Self {
        self.sw_protected_frame = enabled;
        self
    }

    pub fn with_header_recovery(mut self, enabled: bool) -> Self {
        self.subframe_header_recovery = enabled;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.role == NetworkRole::Monitor {
            errors.push("Monitor role does not translate frames".to_string());
        }

        if is_group_addr(&self.own_addr) {
            errors.push(format!(
                "Own address {} is a group address",
                format_mac(&self.own_addr)
            ));
        } else if self.own_addr == [0; 6] {
            warnings.push("Own address is not set".to_string());
        }

        if self.wire_format == WireFormat::NativeWifi && !self.sw_llc_processing {
            warnings.push("LLC processing switch has no effect for native wifi".to_string());
        }

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Load configuration from a JSON, TOML or YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| XlatError::Config(format!("Failed to read config file: {}", e)))?;

        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| XlatError::Config(format!("Failed to parse JSON config: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| XlatError::Config(format!("Failed to parse TOML config: {}", e)))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| XlatError::Config(format!("Failed to parse YAML config: {}", e)))?,
            _ => return Err(XlatError::Config("Unsupported config file format".to_string())),
        };

        log::debug!("Loaded translator config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a JSON, TOML or YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => self.to_json()?,
            Some("toml") => self.to_toml()?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)
                .map_err(|e| XlatError::Config(format!("Failed to serialize YAML config: {}", e)))?,
            _ => return Err(XlatError::Config("Unsupported config file format".to_string())),
        };

        fs::write(path, content)
            .map_err(|e| XlatError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Export configuration as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| XlatError::Config(format!("Failed to serialize JSON config: {}", e)))
    }

    /// Export configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| XlatError::Config(format!("Failed to serialize TOML config: {}", e)))
    }
}
