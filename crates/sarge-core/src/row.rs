//! Row descriptors shown in the launcher's list panels.
//!
//! These are the already-shaped records the backend hands to the frontend:
//! servers from the browser, demo files, and level (map) entries. The list
//! core never mutates them, it only counts and slices them.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

// =============================================================================
// Servers
// =============================================================================

/// A master server that is queried for game server lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MasterServer {
    pub name: String,
    pub address: String,
    pub game: String,
    pub active: bool,
    pub unreachable: bool,
}

impl MasterServer {
    /// Create an active, reachable master.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        game: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            game: game.into(),
            active: true,
            unreachable: false,
        }
    }

    /// Masters a fresh installation starts with.
    pub fn initial_masters() -> Vec<MasterServer> {
        vec![
            Self::new("master.quake3arena.com", "master.quake3arena.com:27950", "Quake 3"),
            Self::new("master.ioquake3.org", "master.ioquake3.org:27950", "Quake 3"),
            Self::new("dpmaster.deathmask.net", "dpmaster.deathmask.net:27950", "Quake 3"),
            Self::new("master.urbanterror.info", "master.urbanterror.info:27900", "Urban Terror"),
            Self::new("master.ioquake3.org", "master.ioquake3.org:27950", "OpenArena"),
            Self::new("dpmaster.deathmask.net", "dpmaster.deathmask.net:27950", "OpenArena"),
            Self::new("bloodrun master", "164.90.203.227:27950", "Bloodrun"),
        ]
    }
}

/// A player currently connected to a server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerPlayer {
    pub name: String,
    pub namecolored: String,
    pub frags: i32,
    pub ping: i32,
}

/// A game server as reported by a status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quake3Server {
    pub master: Option<MasterServer>,
    pub ip: String,
    pub port: String,
    pub address: String,
    pub protocol: Option<u8>,
    pub ping: u16,
    pub errormessage: String,
    pub host: String,
    pub hostcolored: String,
    pub game: String,
    pub playersconnected: u8,
    pub maxclients: String,
    pub bots: u8,
    pub map: String,
    #[serde(default)]
    pub othersettings: HashMap<String, String>,
    pub players: Option<Vec<ServerPlayer>>,
    /// Which list the server belongs to ("main", "pinned", ...).
    pub list: String,
    pub custom: bool,
    pub version: String,
}

impl Quake3Server {
    /// Create an unqueried server in the main list.
    pub fn new(ip: impl Into<String>, port: impl Into<String>) -> Self {
        let ip = ip.into();
        let port = port.into();
        Self {
            master: None,
            address: format!("{ip}:{port}"),
            ip,
            port,
            protocol: None,
            ping: 0,
            errormessage: String::new(),
            host: String::new(),
            hostcolored: String::new(),
            game: String::new(),
            playersconnected: 0,
            maxclients: "0".to_string(),
            bots: 0,
            map: String::new(),
            othersettings: HashMap::new(),
            players: None,
            list: "main".to_string(),
            custom: false,
            version: String::new(),
        }
    }

    /// A user-entered server. Custom servers always live in the pinned list.
    ///
    /// Returns `None` if `address` has no `ip:port` split.
    pub fn custom(address: &str) -> Option<Self> {
        let (ip, port) = address.split_once(':')?;
        let mut server = Self::new(ip, port);
        server.address = address.to_string();
        server.list = "pinned".to_string();
        server.custom = true;
        Some(server)
    }
}

// =============================================================================
// Demos
// =============================================================================

/// The recording player or a participant in a demo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemoPlayer {
    pub name: String,
    pub namecolored: String,
}

/// Metadata parsed from a recorded demo file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demo {
    pub file_name: String,
    pub path: String,
    pub protocol: u8,
    pub gamename: String,
    pub mapname: String,
    pub g_gametype: String,
    pub player_pov: DemoPlayer,
    pub snapshots: usize,
    pub sv_hostname: String,
    pub sv_hostname_color: String,
    pub players: Option<Vec<DemoPlayer>>,
    #[serde(default)]
    pub server_info: HashMap<String, String>,
    #[serde(default)]
    pub system_info: HashMap<String, String>,
    /// Config strings by index. Keys are JSON strings on the wire.
    #[serde(default, deserialize_with = "command_index_keys")]
    pub server_commands: HashMap<i32, String>,
    pub duration: usize,
    pub df_time: f32,
    pub issue: Option<String>,
    pub version: String,
}

/// Read integer map keys from their string form.
///
/// `serde_json` only converts string keys to integers when it drives the
/// map directly, not when the map sits inside the buffered content of the
/// tagged [`Row`] enum.
fn command_index_keys<'de, D>(deserializer: D) -> Result<HashMap<i32, String>, D::Error>
where
    D: Deserializer<'de>,
{
    HashMap::<String, String>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, value)| {
            key.parse::<i32>()
                .map(|index| (index, value))
                .map_err(|e| serde::de::Error::custom(format!("command index {key:?}: {e}")))
        })
        .collect()
}

/// Two demos are the same recording if they share file name and path.
impl PartialEq for Demo {
    fn eq(&self, other: &Self) -> bool {
        self.file_name == other.file_name && self.path == other.path
    }
}

impl Eq for Demo {}

// =============================================================================
// Levels
// =============================================================================

/// A level found inside a pk3 archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub pk3_name: String,
    pub level_name: String,
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub gametype: Vec<String>,
    #[serde(default)]
    pub author: String,
    pub path: String,
    pub parent_path: String,
    #[serde(default)]
    pub is_defrag: bool,
    #[serde(default)]
    pub year_created: u16,
}

// =============================================================================
// Row
// =============================================================================

/// Kind of list a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Server,
    Demo,
    Level,
}

/// Any row a list panel can display and select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Row {
    Server(Quake3Server),
    Demo(Demo),
    Level(Level),
}

impl Row {
    pub fn kind(&self) -> RowKind {
        match self {
            Row::Server(_) => RowKind::Server,
            Row::Demo(_) => RowKind::Demo,
            Row::Level(_) => RowKind::Level,
        }
    }

    /// Short identifying text, used in logs.
    pub fn label(&self) -> &str {
        match self {
            Row::Server(server) => &server.address,
            Row::Demo(demo) => &demo.file_name,
            Row::Level(level) => &level.level_name,
        }
    }
}

impl From<Quake3Server> for Row {
    fn from(server: Quake3Server) -> Self {
        Row::Server(server)
    }
}

impl From<Demo> for Row {
    fn from(demo: Demo) -> Self {
        Row::Demo(demo)
    }
}

impl From<Level> for Row {
    fn from(level: Level) -> Self {
        Row::Level(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_new_builds_address() {
        let server = Quake3Server::new("10.0.0.1", "27960");
        assert_eq!(server.address, "10.0.0.1:27960");
        assert_eq!(server.list, "main");
        assert!(!server.custom);
    }

    #[test]
    fn test_custom_server_is_pinned() {
        let server = Quake3Server::custom("play.example.org:27960").unwrap();
        assert_eq!(server.ip, "play.example.org");
        assert_eq!(server.port, "27960");
        assert_eq!(server.list, "pinned");
        assert!(server.custom);

        assert!(Quake3Server::custom("no-port").is_none());
    }

    #[test]
    fn test_row_kind_and_label() {
        let row = Row::from(Quake3Server::new("1.2.3.4", "27960"));
        assert_eq!(row.kind(), RowKind::Server);
        assert_eq!(row.label(), "1.2.3.4:27960");
    }

    #[test]
    fn test_row_serializes_with_kind_tag() {
        let row = Row::Level(Level {
            pk3_name: "pak0.pk3".to_string(),
            level_name: "q3dm17".to_string(),
            long_name: "The Longest Yard".to_string(),
            gametype: vec!["ffa".to_string()],
            author: String::new(),
            path: "/q3/baseq3/pak0.pk3".to_string(),
            parent_path: "/q3/baseq3".to_string(),
            is_defrag: false,
            year_created: 1999,
        });
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["kind"], "level");
        assert_eq!(json["level_name"], "q3dm17");
    }

    fn demo_with_commands() -> Demo {
        Demo {
            file_name: "run.dm_68".to_string(),
            path: "/q3/defrag/demos/run.dm_68".to_string(),
            protocol: 68,
            gamename: "defrag".to_string(),
            mapname: "st1".to_string(),
            g_gametype: "0".to_string(),
            player_pov: DemoPlayer::default(),
            snapshots: 120,
            sv_hostname: String::new(),
            sv_hostname_color: String::new(),
            players: None,
            server_info: HashMap::new(),
            system_info: HashMap::new(),
            server_commands: HashMap::from([(5, "cs".to_string()), (-1, "print".to_string())]),
            duration: 6000,
            df_time: 5.9,
            issue: None,
            version: "1.32".to_string(),
        }
    }

    #[test]
    fn test_demo_row_with_server_commands_reads_back() {
        let row = Row::from(demo_with_commands());
        let json = serde_json::to_string(&row).unwrap();

        let Row::Demo(demo) = serde_json::from_str::<Row>(&json).unwrap() else {
            panic!("expected a demo row");
        };
        assert_eq!(demo.server_commands, demo_with_commands().server_commands);
        assert_eq!(demo.snapshots, 120);
    }

    #[test]
    fn test_demo_rejects_non_numeric_command_index() {
        let mut json = serde_json::to_value(Row::from(demo_with_commands())).unwrap();
        json["server_commands"] = serde_json::json!({ "five": "cs" });
        assert!(serde_json::from_value::<Row>(json).is_err());
    }

    #[test]
    fn test_initial_masters() {
        let masters = MasterServer::initial_masters();
        assert_eq!(masters.len(), 7);
        assert!(masters.iter().all(|m| m.active && !m.unreachable));
    }
}
