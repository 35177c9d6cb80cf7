//! Persisted configuration and application data.
//!
//! Both documents are plain JSON written by the backend. The frontend reads
//! them once per session and writes them back through a [`crate::Store`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::row::{MasterServer, Quake3Server};

// =============================================================================
// Config
// =============================================================================

/// A game client executable registered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Q3Executable {
    pub name: String,
    pub exe_path: String,
    pub parent_path: String,
    pub gamename: String,
    #[serde(default)]
    pub extra_launch_args: String,
    #[serde(default)]
    pub active: bool,
}

/// User-facing launcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub path: String,
    pub welcome_message: bool,
    pub server_browser_threads: usize,
    /// Server query timeout in milliseconds.
    pub server_timeout: u16,
    pub show_unreachable: bool,
    pub manage_q3_instance: bool,
    pub refresh_by_mod: bool,
    pub show_trashed_servers: bool,
    pub autoclose_demo: bool,
    pub loop_demo: bool,
    pub get_full_demo_data: bool,
    pub demo_path: Option<String>,
    pub fs_homepath: Option<String>,
    pub q3_clients: Vec<Q3Executable>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: String::new(),
            welcome_message: true,
            server_browser_threads: 50,
            server_timeout: 400,
            show_unreachable: false,
            manage_q3_instance: true,
            refresh_by_mod: false,
            show_trashed_servers: true,
            autoclose_demo: true,
            loop_demo: false,
            get_full_demo_data: true,
            demo_path: None,
            fs_homepath: None,
            q3_clients: Vec::new(),
        }
    }
}

// =============================================================================
// App Data
// =============================================================================

/// The address lists kept in [`AppData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppDataList {
    Custom,
    Pinned,
    Trash,
    TrashIp,
}

impl FromStr for AppDataList {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custom" => Ok(AppDataList::Custom),
            "pinned" => Ok(AppDataList::Pinned),
            "trash" => Ok(AppDataList::Trash),
            "trash_ip" => Ok(AppDataList::TrashIp),
            other => Err(ConfigError::UnknownList(other.to_string())),
        }
    }
}

/// Application state that outlives a session: pinned/custom/trashed
/// servers, the saved server password and the master server list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppData {
    pub path: String,
    pub pinned: HashSet<String>,
    pub custom: HashSet<String>,
    pub trash: HashSet<String>,
    pub trash_ip: HashSet<String>,
    pub server_password: String,
    pub masters: Vec<MasterServer>,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            path: String::new(),
            pinned: HashSet::new(),
            custom: HashSet::new(),
            trash: HashSet::new(),
            trash_ip: HashSet::new(),
            server_password: String::new(),
            masters: MasterServer::initial_masters(),
        }
    }
}

impl AppData {
    fn list(&self, list: AppDataList) -> &HashSet<String> {
        match list {
            AppDataList::Custom => &self.custom,
            AppDataList::Pinned => &self.pinned,
            AppDataList::Trash => &self.trash,
            AppDataList::TrashIp => &self.trash_ip,
        }
    }

    fn list_mut(&mut self, list: AppDataList) -> &mut HashSet<String> {
        match list {
            AppDataList::Custom => &mut self.custom,
            AppDataList::Pinned => &mut self.pinned,
            AppDataList::Trash => &mut self.trash,
            AppDataList::TrashIp => &mut self.trash_ip,
        }
    }

    /// Add an address to a list. Returns `false` if it was already there.
    pub fn add(&mut self, list: AppDataList, address: impl Into<String>) -> bool {
        self.list_mut(list).insert(address.into())
    }

    /// Remove an address from a list. Returns `false` if it was absent.
    pub fn remove(&mut self, list: AppDataList, address: &str) -> bool {
        self.list_mut(list).remove(address)
    }

    pub fn contains(&self, list: AppDataList, address: &str) -> bool {
        self.list(list).contains(address)
    }

    /// Number of `servers` shown in the pinned section above the browser.
    pub fn pinned_count(&self, servers: &[Quake3Server]) -> usize {
        servers
            .iter()
            .filter(|s| self.pinned.contains(&s.address))
            .count()
    }
}

// =============================================================================
// Paths
// =============================================================================

/// Get the config directory path.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sarge"))
}

/// Get the data directory path.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("sarge"))
}
