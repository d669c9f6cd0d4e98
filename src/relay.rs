//! Wiring of the registry, dispatchers and collaborators into one cloneable
//! handle shared by every connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{info, warn};

use crate::broker::TopicRegistry;
use crate::client::SessionManager;
use crate::config::Settings;
use crate::directory::{MemoryDirectory, UserDirectory};
use crate::dispatch::{AlertDispatcher, Background, BroadcastDispatcher, LocationFanout};
use crate::model::LastKnownLocation;
use crate::notifier::{LogNotifier, Notifier, webhook::WebhookNotifier};
use crate::persistence::{AlertArchive, BroadcastStore, LocationStore, Persistence};
use crate::utils::error::{StartupError, StoreError};

/// Storage, directory and mail collaborators the relay runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub locations: Arc<dyn LocationStore>,
    pub broadcasts: Arc<dyn BroadcastStore>,
    pub alerts: Option<Arc<dyn AlertArchive>>,
    pub directory: Arc<dyn UserDirectory>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Clone)]
pub struct Relay {
    pub sessions: SessionManager,
    pub locations: LocationFanout,
    pub alerts: AlertDispatcher,
    pub broadcasts: BroadcastDispatcher,
    location_store: Arc<dyn LocationStore>,
    background: Background,
    persistence: Option<Arc<Persistence>>,
    connections: Arc<Semaphore>,
    max_connections: usize,
}

impl Relay {
    pub fn new(collaborators: Collaborators, background: Background, max_connections: usize) -> Self {
        let registry = Arc::new(TopicRegistry::new());
        let Collaborators {
            locations,
            broadcasts,
            alerts,
            directory,
            notifier,
        } = collaborators;

        let mut alert_dispatcher = AlertDispatcher::new(registry.clone(), background.clone())
            .with_email(directory.clone(), notifier.clone());
        if let Some(archive) = alerts {
            alert_dispatcher = alert_dispatcher.with_archive(archive);
        }

        Self {
            sessions: SessionManager::new(registry.clone()),
            locations: LocationFanout::new(registry.clone(), locations.clone(), background.clone()),
            alerts: alert_dispatcher,
            broadcasts: BroadcastDispatcher::new(
                registry,
                broadcasts,
                directory,
                notifier,
                background.clone(),
            ),
            location_store: locations,
            background,
            persistence: None,
            connections: Arc::new(Semaphore::new(max_connections.min(Semaphore::MAX_PERMITS))),
            max_connections,
        }
    }

    /// Opens the sled store, picks the notifier and loads the directory
    /// described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, StartupError> {
        let store = Arc::new(Persistence::open(
            &settings.storage.path,
            settings.storage.max_history,
        )?);
        let timeout = Duration::from_secs(settings.dispatch.timeout_secs);

        let notifier: Arc<dyn Notifier> = match &settings.notifier.webhook_url {
            Some(url) => {
                info!(endpoint = %url, "emails go through the webhook notifier");
                Arc::new(WebhookNotifier::new(
                    url.clone(),
                    settings.notifier.from.clone(),
                    timeout,
                )?)
            }
            None => {
                warn!("no notifier.webhook_url configured, emails are only logged");
                Arc::new(LogNotifier)
            }
        };

        let directory = MemoryDirectory::new(settings.directory.users.clone());
        let collaborators = Collaborators {
            locations: store.clone(),
            broadcasts: store.clone(),
            alerts: Some(store.clone()),
            directory: Arc::new(directory),
            notifier,
        };

        let mut relay = Self::new(
            collaborators,
            Background::new(settings.dispatch.max_in_flight, timeout),
            settings.broker.max_connections,
        );
        relay.persistence = Some(store);
        Ok(relay)
    }

    /// Reserves a connection slot for an accepted socket. The slot is held
    /// from accept until the connection task ends, handshake included.
    /// Returns `None` once `broker.max_connections` sockets are open.
    pub fn admit(&self) -> Option<OwnedSemaphorePermit> {
        self.connections.clone().try_acquire_owned().ok()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Last stored position of `driver_id`, for clients that join mid-trip.
    pub async fn last_location(
        &self,
        driver_id: &str,
    ) -> Result<Option<LastKnownLocation>, StoreError> {
        self.location_store.get_last_location(driver_id.trim()).await
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Waits for in-flight side effects, then flushes the store.
    pub async fn shutdown(&self) {
        info!(in_flight = self.background.in_flight(), "draining side effects");
        self.background.drain().await;
        if let Some(store) = &self.persistence {
            if let Err(e) = store.flush().await {
                warn!(error = %e, "failed to flush store on shutdown");
            }
        }
    }
}
