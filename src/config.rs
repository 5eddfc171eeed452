use crate::command::TABLE_MAX_LEVEL;
use crate::model::{ColorCode, GroupId, IntensityLevel, ZoneId};
use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "MOSAIC_PANEL_CONFIG";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub target_ip: String,
    pub target_port: u16,
    pub bind_address: String,
    /// QLab machine receiving OSC cues for scenes and sound.
    pub qlab_ip: String,
    pub qlab_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            target_ip: "192.168.1.10".to_string(),
            target_port: 33,
            bind_address: "0.0.0.0:0".to_string(),
            qlab_ip: "192.168.0.160".to_string(),
            qlab_port: 53000,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GroupConfig {
    pub id: GroupId,
    pub name: String,
    pub prefix: String,
    #[serde(default)]
    pub zone: Option<ZoneId>,
    #[serde(default = "default_max_intensity")]
    pub max_intensity: IntensityLevel,
    #[serde(default = "default_color")]
    pub color: ColorCode,
    #[serde(default = "default_intensity")]
    pub intensity: IntensityLevel,
    #[serde(default = "default_true")]
    pub color_selectable: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_max_intensity() -> IntensityLevel {
    5
}

fn default_color() -> ColorCode {
    ColorCode::White
}

fn default_intensity() -> IntensityLevel {
    3
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    1000
}

impl GroupConfig {
    fn ring(id: GroupId, name: &str, prefix: &str, zone: ZoneId) -> Self {
        Self {
            id,
            name: name.to_string(),
            prefix: prefix.to_string(),
            zone: Some(zone),
            max_intensity: default_max_intensity(),
            color: default_color(),
            intensity: default_intensity(),
            color_selectable: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ZoneConfig {
    pub id: ZoneId,
    pub name: String,
    #[serde(default = "default_max_intensity")]
    pub master_max: IntensityLevel,
    #[serde(default = "default_intensity")]
    pub initial_master: IntensityLevel,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PanelConfig {
    pub network: NetworkConfig,
    pub zones: Vec<ZoneConfig>,
    pub groups: Vec<GroupConfig>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        use ZoneId::{Exterior, Interior};

        let mut groups = vec![
            GroupConfig::ring(1, "Ring Group 1", "LZ1", Exterior),
            GroupConfig::ring(2, "Ring Group 2", "LZ2", Exterior),
            GroupConfig::ring(3, "Top Ring [Outside]", "LZ3", Exterior),
            GroupConfig::ring(4, "Middle Ring [Outside]", "LZ4", Exterior),
            GroupConfig::ring(5, "Bottom Ring [Outside]", "LZ5", Exterior),
            GroupConfig::ring(6, "UFO Beam", "LZ6", Exterior),
            GroupConfig::ring(7, "UFO Ring", "LZ7", Exterior),
            GroupConfig::ring(8, "Puck Lights", "LZ8", Exterior),
            GroupConfig::ring(9, "Top Ring [Inside]", "IZ1", Interior),
            GroupConfig::ring(10, "Middle Ring [Inside]", "IZ2", Interior),
            GroupConfig::ring(11, "Bottom Ring [Inside]", "IZ3", Interior),
        ];

        // The beam is white only and starts dark.
        if let Some(beam) = groups.iter_mut().find(|g| g.id == 6) {
            beam.intensity = 0;
            beam.color_selectable = false;
        }

        groups.push(GroupConfig {
            id: 12,
            name: "LED Signs".to_string(),
            prefix: "LED".to_string(),
            zone: None,
            max_intensity: 5,
            color: ColorCode::White,
            intensity: 3,
            color_selectable: true,
            debounce_ms: 500,
        });

        Self {
            network: NetworkConfig::default(),
            zones: vec![
                ZoneConfig {
                    id: Exterior,
                    name: "Exterior Lights".to_string(),
                    master_max: 5,
                    initial_master: 3,
                },
                ZoneConfig {
                    id: Interior,
                    name: "Interior Lights".to_string(),
                    master_max: 5,
                    initial_master: 3,
                },
            ],
            groups,
        }
    }
}

impl PanelConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PanelConfig =
            serde_json::from_str(json).context("Failed to parse panel config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {:?}", path))?;
        Self::from_json(&json).with_context(|| format!("Invalid config at {:?}", path))
    }

    /// Load `path` if present; any failure falls back to the built-in table.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("[CONFIG] No config at {:?}, using built-in defaults", path);
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                info!(
                    "[CONFIG] Loaded {} groups, {} zones from {:?}",
                    config.groups.len(),
                    config.zones.len(),
                    path
                );
                config
            }
            Err(e) => {
                warn!("[CONFIG] {:#}. Falling back to built-in defaults", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for group in &self.groups {
            if !ids.insert(group.id) {
                bail!("duplicate group id {}", group.id);
            }
            if group.prefix.trim().is_empty() {
                bail!("group {} ({}) has an empty prefix", group.id, group.name);
            }
            if group.max_intensity > TABLE_MAX_LEVEL {
                bail!(
                    "group {} ({}) max_intensity {} exceeds the command table ({})",
                    group.id,
                    group.name,
                    group.max_intensity,
                    TABLE_MAX_LEVEL
                );
            }
        }

        let mut zones = HashSet::new();
        for zone in &self.zones {
            if !zones.insert(zone.id) {
                bail!("zone {} configured twice", zone.id);
            }
        }
        Ok(())
    }
}

pub fn user_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("MosaicPanel")
                .join("panel.json");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(base) = std::env::var_os("APPDATA") {
            return PathBuf::from(base).join("MosaicPanel").join("panel.json");
        }
    }

    // Linux / fallback: XDG or ~/.config
    if let Ok(base) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(base).join("mosaic-panel").join("panel.json")
    } else if let Some(home) = home::home_dir() {
        home.join(".config").join("mosaic-panel").join("panel.json")
    } else {
        PathBuf::from("panel.json")
    }
}
