use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use presupro_core::{Aggregate, AggregateId, AggregateRoot, DomainError, UserId};
use presupro_events::Event;

/// Client identifier (account-scoped via `user_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub AggregateId);

impl ClientId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ClientId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Client status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Active,
    Archived,
}

/// Contact information for a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Aggregate root: Client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    id: ClientId,
    user_id: Option<UserId>,
    name: String,
    contact: ContactInfo,
    notes: Option<String>,
    status: ClientStatus,
    version: u64,
    created: bool,
}

impl Client {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ClientId) -> Self {
        Self {
            id,
            user_id: None,
            name: String::new(),
            contact: ContactInfo::default(),
            notes: None,
            status: ClientStatus::Active,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ClientId {
        self.id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn status(&self) -> ClientStatus {
        self.status
    }

    /// Invariant helper: whether new quotes may be addressed to this client.
    ///
    /// Archived clients cannot receive new quotes.
    pub fn can_be_quoted(&self) -> bool {
        self.status == ClientStatus::Active
    }
}

impl AggregateRoot for Client {
    type Id = ClientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterClient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterClient {
    pub user_id: UserId,
    pub client_id: ClientId,
    pub name: String,
    pub contact: Option<ContactInfo>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateClientDetails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateClientDetails {
    pub user_id: UserId,
    pub client_id: ClientId,
    /// Optional new name (if None, keep existing).
    pub name: Option<String>,
    /// Optional new contact info (if None, keep existing).
    pub contact: Option<ContactInfo>,
    /// Optional new notes (if None, keep existing).
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ArchiveClient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveClient {
    pub user_id: UserId,
    pub client_id: ClientId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientCommand {
    RegisterClient(RegisterClient),
    UpdateClientDetails(UpdateClientDetails),
    ArchiveClient(ArchiveClient),
}

/// Event: ClientRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRegistered {
    pub user_id: UserId,
    pub client_id: ClientId,
    pub name: String,
    pub contact: ContactInfo,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ClientUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUpdated {
    pub user_id: UserId,
    pub client_id: ClientId,
    pub name: String,
    pub contact: ContactInfo,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ClientArchived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientArchived {
    pub user_id: UserId,
    pub client_id: ClientId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientEvent {
    ClientRegistered(ClientRegistered),
    ClientUpdated(ClientUpdated),
    ClientArchived(ClientArchived),
}

impl Event for ClientEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::ClientRegistered(_) => "clients.client.registered",
            ClientEvent::ClientUpdated(_) => "clients.client.updated",
            ClientEvent::ClientArchived(_) => "clients.client.archived",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ClientEvent::ClientRegistered(e) => e.occurred_at,
            ClientEvent::ClientUpdated(e) => e.occurred_at,
            ClientEvent::ClientArchived(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Client {
    type Command = ClientCommand;
    type Event = ClientEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ClientEvent::ClientRegistered(e) => {
                self.id = e.client_id;
                self.user_id = Some(e.user_id);
                self.name = e.name.clone();
                self.contact = e.contact.clone();
                self.notes = e.notes.clone();
                self.status = ClientStatus::Active;
                self.created = true;
            }
            ClientEvent::ClientUpdated(e) => {
                self.name = e.name.clone();
                self.contact = e.contact.clone();
                self.notes = e.notes.clone();
            }
            ClientEvent::ClientArchived(_) => {
                self.status = ClientStatus::Archived;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ClientCommand::RegisterClient(cmd) => self.handle_register(cmd),
            ClientCommand::UpdateClientDetails(cmd) => self.handle_update(cmd),
            ClientCommand::ArchiveClient(cmd) => self.handle_archive(cmd),
        }
    }
}

impl Client {
    fn ensure_owner(&self, user_id: UserId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.user_id != Some(user_id) {
            return Err(DomainError::invariant("user_id mismatch"));
        }
        Ok(())
    }

    fn ensure_client_id(&self, client_id: ClientId) -> Result<(), DomainError> {
        if self.id != client_id {
            return Err(DomainError::invariant("client_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterClient) -> Result<Vec<ClientEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("client already exists"));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let contact = cmd.contact.clone().unwrap_or_default();

        Ok(vec![ClientEvent::ClientRegistered(ClientRegistered {
            user_id: cmd.user_id,
            client_id: cmd.client_id,
            name: cmd.name.clone(),
            contact,
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateClientDetails) -> Result<Vec<ClientEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.user_id)?;
        self.ensure_client_id(cmd.client_id)?;

        let new_name = cmd.name.clone().unwrap_or_else(|| self.name.clone());
        if new_name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let new_contact = cmd.contact.clone().unwrap_or_else(|| self.contact.clone());
        let new_notes = cmd.notes.clone().or_else(|| self.notes.clone());

        Ok(vec![ClientEvent::ClientUpdated(ClientUpdated {
            user_id: cmd.user_id,
            client_id: cmd.client_id,
            name: new_name,
            contact: new_contact,
            notes: new_notes,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_archive(&self, cmd: &ArchiveClient) -> Result<Vec<ClientEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.user_id)?;
        self.ensure_client_id(cmd.client_id)?;

        if self.status == ClientStatus::Archived {
            return Err(DomainError::conflict("client is already archived"));
        }

        Ok(vec![ClientEvent::ClientArchived(ClientArchived {
            user_id: cmd.user_id,
            client_id: cmd.client_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presupro_core::AggregateId;

    fn test_user_id() -> UserId {
        UserId::new()
    }

    fn test_client_id() -> ClientId {
        ClientId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn register_client_emits_client_registered_event() {
        let client = Client::empty(test_client_id());
        let user_id = test_user_id();
        let client_id = test_client_id();
        let contact = ContactInfo {
            email: Some("taller@example.com".to_string()),
            phone: Some("+34123456789".to_string()),
            address: Some("Calle Mayor 1".to_string()),
        };
        let cmd = RegisterClient {
            user_id,
            client_id,
            name: "Taller Gomez".to_string(),
            contact: Some(contact.clone()),
            notes: None,
            occurred_at: test_time(),
        };

        let events = client.handle(&ClientCommand::RegisterClient(cmd)).unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            ClientEvent::ClientRegistered(e) => {
                assert_eq!(e.user_id, user_id);
                assert_eq!(e.client_id, client_id);
                assert_eq!(e.name, "Taller Gomez");
                assert_eq!(e.contact, contact);
            }
            _ => panic!("Expected ClientRegistered event"),
        }
    }

    #[test]
    fn register_client_rejects_empty_name() {
        let client = Client::empty(test_client_id());
        let cmd = RegisterClient {
            user_id: test_user_id(),
            client_id: test_client_id(),
            name: "   ".to_string(),
            contact: None,
            notes: None,
            occurred_at: test_time(),
        };

        let err = client.handle(&ClientCommand::RegisterClient(cmd)).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }

    #[test]
    fn register_client_rejects_duplicate_creation() {
        let mut client = Client::empty(test_client_id());
        let cmd = RegisterClient {
            user_id: test_user_id(),
            client_id: test_client_id(),
            name: "Taller Gomez".to_string(),
            contact: None,
            notes: None,
            occurred_at: test_time(),
        };

        let events = client
            .handle(&ClientCommand::RegisterClient(cmd.clone()))
            .unwrap();
        client.apply(&events[0]);

        let err = client.handle(&ClientCommand::RegisterClient(cmd)).unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict error for duplicate creation"),
        }
    }

    #[test]
    fn update_details_updates_name_contact_and_notes() {
        let mut client = Client::empty(test_client_id());
        let user_id = test_user_id();
        let client_id = test_client_id();

        let register_cmd = RegisterClient {
            user_id,
            client_id,
            name: "Old Name".to_string(),
            contact: None,
            notes: None,
            occurred_at: test_time(),
        };
        let events = client
            .handle(&ClientCommand::RegisterClient(register_cmd))
            .unwrap();
        client.apply(&events[0]);

        let new_contact = ContactInfo {
            email: Some("nuevo@example.com".to_string()),
            phone: Some("+34987654321".to_string()),
            address: None,
        };
        let update_cmd = UpdateClientDetails {
            user_id,
            client_id,
            name: Some("New Name".to_string()),
            contact: Some(new_contact.clone()),
            notes: Some("prefers morning visits".to_string()),
            occurred_at: test_time(),
        };

        let events = client
            .handle(&ClientCommand::UpdateClientDetails(update_cmd))
            .unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            ClientEvent::ClientUpdated(e) => {
                assert_eq!(e.name, "New Name");
                assert_eq!(e.contact, new_contact);
                assert_eq!(e.notes.as_deref(), Some("prefers morning visits"));
            }
            _ => panic!("Expected ClientUpdated event"),
        }
    }

    #[test]
    fn update_details_requires_existing_client() {
        let client = Client::empty(test_client_id());
        let cmd = UpdateClientDetails {
            user_id: test_user_id(),
            client_id: test_client_id(),
            name: Some("New Name".to_string()),
            contact: None,
            notes: None,
            occurred_at: test_time(),
        };

        let err = client
            .handle(&ClientCommand::UpdateClientDetails(cmd))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn update_details_rejects_foreign_owner() {
        let mut client = Client::empty(test_client_id());
        let client_id = test_client_id();

        let register_cmd = RegisterClient {
            user_id: test_user_id(),
            client_id,
            name: "Taller Gomez".to_string(),
            contact: None,
            notes: None,
            occurred_at: test_time(),
        };
        let events = client
            .handle(&ClientCommand::RegisterClient(register_cmd))
            .unwrap();
        client.apply(&events[0]);

        let cmd = UpdateClientDetails {
            user_id: test_user_id(),
            client_id,
            name: Some("New Name".to_string()),
            contact: None,
            notes: None,
            occurred_at: test_time(),
        };

        let err = client
            .handle(&ClientCommand::UpdateClientDetails(cmd))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation for foreign owner"),
        }
    }

    #[test]
    fn archive_client_emits_event_and_blocks_new_quotes() {
        let mut client = Client::empty(test_client_id());
        let user_id = test_user_id();
        let client_id = test_client_id();

        let register_cmd = RegisterClient {
            user_id,
            client_id,
            name: "Taller Gomez".to_string(),
            contact: None,
            notes: None,
            occurred_at: test_time(),
        };
        let events = client
            .handle(&ClientCommand::RegisterClient(register_cmd))
            .unwrap();
        client.apply(&events[0]);
        assert!(client.can_be_quoted());

        let archive_cmd = ArchiveClient {
            user_id,
            client_id,
            occurred_at: test_time(),
        };
        let events = client
            .handle(&ClientCommand::ArchiveClient(archive_cmd.clone()))
            .unwrap();
        assert_eq!(events.len(), 1);
        client.apply(&events[0]);

        assert_eq!(client.status(), ClientStatus::Archived);
        assert!(!client.can_be_quoted());

        // Archiving twice is a conflict.
        let err = client
            .handle(&ClientCommand::ArchiveClient(archive_cmd))
            .unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict error for double archive"),
        }
    }

    #[test]
    fn version_increments_once_per_applied_event() {
        let mut client = Client::empty(test_client_id());
        let user_id = test_user_id();
        let client_id = test_client_id();

        assert_eq!(client.version(), 0);

        let register_cmd = RegisterClient {
            user_id,
            client_id,
            name: "Taller Gomez".to_string(),
            contact: None,
            notes: None,
            occurred_at: test_time(),
        };
        let events = client
            .handle(&ClientCommand::RegisterClient(register_cmd))
            .unwrap();
        client.apply(&events[0]);
        assert_eq!(client.version(), 1);

        let archive_cmd = ArchiveClient {
            user_id,
            client_id,
            occurred_at: test_time(),
        };
        let events = client
            .handle(&ClientCommand::ArchiveClient(archive_cmd))
            .unwrap();
        client.apply(&events[0]);
        assert_eq!(client.version(), 2);
    }
}
