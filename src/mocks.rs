//! Mock collaborators for tests.
//!
//! In-memory stand-ins for the entry store, check-in hub, and mailer. Each
//! records its calls so tests can assert on call counts and captured
//! arguments, and each can be scripted to fail.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::email::{Confirmation, EmailError, Mailer};
use crate::hub::{CheckinHub, HubEntryResponse, HubError, HubRegistration};
use crate::store::{Entry, EntryStore, NewEntry, StoreError};

/// In-memory [`EntryStore`].
#[derive(Debug, Default)]
pub struct MockEntryStore {
    entries: Mutex<Vec<Entry>>,
    insert_calls: AtomicUsize,
    /// When `false`, every insert fails.
    pub insert_succeeds: bool,
    /// When `false`, every hub-registration update fails.
    pub attach_succeeds: bool,
}

impl MockEntryStore {
    /// A store that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            insert_calls: AtomicUsize::new(0),
            insert_succeeds: true,
            attach_succeeds: true,
        }
    }

    /// A store whose inserts always fail.
    #[must_use]
    pub fn failing_inserts() -> Self {
        Self {
            insert_succeeds: false,
            ..Self::new()
        }
    }

    /// A store whose hub-registration updates always fail.
    #[must_use]
    pub fn failing_attach() -> Self {
        Self {
            attach_succeeds: false,
            ..Self::new()
        }
    }

    /// Snapshot of the stored entries, newest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn entries(&self) -> Vec<Entry> {
        let mut entries = self.entries.lock().unwrap().clone();
        entries.reverse();
        entries
    }

    /// How many inserts were attempted.
    #[must_use]
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl EntryStore for MockEntryStore {
    async fn insert(&self, entry: &NewEntry) -> Result<Uuid, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if !self.insert_succeeds {
            return Err(StoreError::Query("insert refused by mock".to_string()));
        }
        let id = Uuid::new_v4();
        self.entries.lock().unwrap().push(Entry {
            id,
            first_name: entry.first_name.clone(),
            last_name: entry.last_name.clone(),
            email: entry.email.clone(),
            terms_accepted: entry.terms_accepted,
            created_at: Utc::now(),
            hub_entry_id: None,
            source_data: None,
        });
        Ok(id)
    }

    async fn attach_hub_registration(
        &self,
        id: Uuid,
        hub_entry_id: &str,
        source_data: &serde_json::Value,
    ) -> Result<(), StoreError> {
        if !self.attach_succeeds {
            return Err(StoreError::Query("update refused by mock".to_string()));
        }
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.iter_mut().find(|entry| entry.id == id) else {
            return Err(StoreError::EntryNotFound(id));
        };
        entry.hub_entry_id = Some(hub_entry_id.to_string());
        entry.source_data = Some(source_data.clone());
        Ok(())
    }

    async fn list_entries(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(self.entries())
    }
}

/// Scripted [`CheckinHub`].
#[derive(Debug)]
pub struct MockHub {
    /// Whether to simulate success or failure.
    pub should_succeed: bool,
    /// Response returned on the success path.
    pub response: HubEntryResponse,
    registrations: Mutex<Vec<HubRegistration>>,
}

impl MockHub {
    /// A hub that mints `entry_id` and hands back `qr_payload`.
    #[must_use]
    pub fn new(entry_id: &str, qr_payload: Option<&str>) -> Self {
        Self {
            should_succeed: true,
            response: HubEntryResponse {
                entry_id: entry_id.to_string(),
                qr_payload: qr_payload.map(ToString::to_string),
                qr_url: None,
                existing: None,
                refreshed: None,
            },
            registrations: Mutex::new(Vec::new()),
        }
    }

    /// A hub that rejects every registration.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            should_succeed: false,
            ..Self::new("unused", None)
        }
    }

    /// Registrations received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn registrations(&self) -> Vec<HubRegistration> {
        self.registrations.lock().unwrap().clone()
    }

    /// How many registrations were attempted.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.registrations().len()
    }
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl CheckinHub for MockHub {
    async fn register_entry(
        &self,
        registration: HubRegistration,
    ) -> Result<HubEntryResponse, HubError> {
        self.registrations.lock().unwrap().push(registration);
        if self.should_succeed {
            Ok(self.response.clone())
        } else {
            Err(HubError::Rejected {
                status: 503,
                message: "hub unavailable".to_string(),
            })
        }
    }
}

/// Recording [`Mailer`].
#[derive(Debug, Default)]
pub struct MockMailer {
    /// Whether to simulate success or failure.
    pub should_succeed: bool,
    sent: Mutex<Vec<Confirmation>>,
}

impl MockMailer {
    /// A mailer that accepts every send.
    #[must_use]
    pub fn new() -> Self {
        Self {
            should_succeed: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// A mailer that fails every send.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            should_succeed: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Confirmations attempted so far, successful or not.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn sent(&self) -> Vec<Confirmation> {
        self.sent.lock().unwrap().clone()
    }

    /// How many sends were attempted.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.sent().len()
    }
}

#[async_trait]
#[allow(clippy::unwrap_used)]
impl Mailer for MockMailer {
    async fn send_confirmation(&self, confirmation: &Confirmation) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(confirmation.clone());
        if self.should_succeed {
            Ok(())
        } else {
            Err(EmailError::Rejected {
                status: 500,
                message: "send refused by mock".to_string(),
            })
        }
    }
}
