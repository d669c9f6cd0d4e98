use serde::Deserialize;

use crate::directory::DirectoryUser;

/// Top-level configuration settings for the relay.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub storage: StorageSettings,
    pub dispatch: DispatchSettings,
    pub notifier: NotifierSettings,
    pub logging: LoggingSettings,
    pub directory: DirectorySettings,
}

/// Defines the host and port the WebSocket server will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    /// Connections beyond this are closed right after accept.
    pub max_connections: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// Directory of the sled database.
    pub path: String,
    /// Cap on stored broadcast and alert history entries.
    pub max_history: Option<usize>,
}

/// Limits for background side effects (store writes, email).
#[derive(Debug, Deserialize, Clone)]
pub struct DispatchSettings {
    pub max_in_flight: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifierSettings {
    /// Mail relay endpoint. Emails are only logged when unset.
    pub webhook_url: Option<String>,
    pub from: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DirectorySettings {
    pub users: Vec<DirectoryUser>,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub storage: Option<PartialStorageSettings>,
    pub dispatch: Option<PartialDispatchSettings>,
    pub notifier: Option<PartialNotifierSettings>,
    pub logging: Option<PartialLoggingSettings>,
    pub directory: Option<PartialDirectorySettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialBrokerSettings {
    pub max_connections: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialStorageSettings {
    pub path: Option<String>,
    pub max_history: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialDispatchSettings {
    pub max_in_flight: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialNotifierSettings {
    pub webhook_url: Option<String>,
    pub from: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialDirectorySettings {
    pub users: Option<Vec<DirectoryUser>>,
}

impl PartialSettings {
    /// Fills every missing value from `default`.
    pub fn merge(self, default: Settings) -> Settings {
        let server = self.server.unwrap_or_default();
        let broker = self.broker.unwrap_or_default();
        let storage = self.storage.unwrap_or_default();
        let dispatch = self.dispatch.unwrap_or_default();
        let notifier = self.notifier.unwrap_or_default();
        let logging = self.logging.unwrap_or_default();
        let directory = self.directory.unwrap_or_default();

        Settings {
            server: ServerSettings {
                host: server.host.unwrap_or(default.server.host),
                port: server.port.unwrap_or(default.server.port),
            },
            broker: BrokerSettings {
                max_connections: broker
                    .max_connections
                    .unwrap_or(default.broker.max_connections),
            },
            storage: StorageSettings {
                path: storage.path.unwrap_or(default.storage.path),
                max_history: storage.max_history.or(default.storage.max_history),
            },
            dispatch: DispatchSettings {
                max_in_flight: dispatch
                    .max_in_flight
                    .unwrap_or(default.dispatch.max_in_flight),
                timeout_secs: dispatch
                    .timeout_secs
                    .unwrap_or(default.dispatch.timeout_secs),
            },
            notifier: NotifierSettings {
                webhook_url: notifier
                    .webhook_url
                    .filter(|url| !url.trim().is_empty())
                    .or(default.notifier.webhook_url),
                from: notifier.from.unwrap_or(default.notifier.from),
            },
            logging: LoggingSettings {
                level: logging.level.unwrap_or(default.logging.level),
            },
            directory: DirectorySettings {
                users: directory.users.unwrap_or(default.directory.users),
            },
        }
    }
}

/// Provides default values for `Settings`.
///
/// Ensures the relay has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            broker: BrokerSettings {
                max_connections: 1000,
            },
            storage: StorageSettings {
                path: "campus_relay_db".to_string(),
                max_history: Some(1000),
            },
            dispatch: DispatchSettings {
                max_in_flight: 256,
                timeout_secs: 30,
            },
            notifier: NotifierSettings {
                webhook_url: None,
                from: "noreply@campus.local".to_string(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
            directory: DirectorySettings::default(),
        }
    }
}
