use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use presupro_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Money, UserId};
use presupro_events::Event;

/// Saved item identifier (account-scoped via `user_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedItemId(pub AggregateId);

impl SavedItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SavedItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Line item category. Shared by saved items and quote lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Material,
    Labor,
    Other,
}

/// Aggregate root: SavedItem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedItem {
    id: SavedItemId,
    user_id: Option<UserId>,
    name: String,
    category: ItemCategory,
    default_price: Money,
    unit: String,
    archived: bool,
    version: u64,
    created: bool,
}

impl SavedItem {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: SavedItemId) -> Self {
        Self {
            id,
            user_id: None,
            name: String::new(),
            category: ItemCategory::Other,
            default_price: Money::ZERO,
            unit: String::new(),
            archived: false,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> SavedItemId {
        self.id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> ItemCategory {
        self.category
    }

    pub fn default_price(&self) -> Money {
        self.default_price
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }
}

impl AggregateRoot for SavedItem {
    type Id = SavedItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateSavedItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSavedItem {
    pub user_id: UserId,
    pub item_id: SavedItemId,
    pub name: String,
    pub category: ItemCategory,
    pub default_price: Money,
    pub unit: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateSavedItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSavedItem {
    pub user_id: UserId,
    pub item_id: SavedItemId,
    /// Optional new name (if None, keep existing).
    pub name: Option<String>,
    /// Optional new category (if None, keep existing).
    pub category: Option<ItemCategory>,
    /// Optional new default price (if None, keep existing).
    pub default_price: Option<Money>,
    /// Optional new unit (if None, keep existing).
    pub unit: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ArchiveSavedItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSavedItem {
    pub user_id: UserId,
    pub item_id: SavedItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavedItemCommand {
    CreateSavedItem(CreateSavedItem),
    UpdateSavedItem(UpdateSavedItem),
    ArchiveSavedItem(ArchiveSavedItem),
}

/// Event: SavedItemCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedItemCreated {
    pub user_id: UserId,
    pub item_id: SavedItemId,
    pub name: String,
    pub category: ItemCategory,
    pub default_price: Money,
    pub unit: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SavedItemUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedItemUpdated {
    pub user_id: UserId,
    pub item_id: SavedItemId,
    pub name: String,
    pub category: ItemCategory,
    pub default_price: Money,
    pub unit: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SavedItemArchived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedItemArchived {
    pub user_id: UserId,
    pub item_id: SavedItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavedItemEvent {
    SavedItemCreated(SavedItemCreated),
    SavedItemUpdated(SavedItemUpdated),
    SavedItemArchived(SavedItemArchived),
}

impl Event for SavedItemEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SavedItemEvent::SavedItemCreated(_) => "catalog.saved_item.created",
            SavedItemEvent::SavedItemUpdated(_) => "catalog.saved_item.updated",
            SavedItemEvent::SavedItemArchived(_) => "catalog.saved_item.archived",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SavedItemEvent::SavedItemCreated(e) => e.occurred_at,
            SavedItemEvent::SavedItemUpdated(e) => e.occurred_at,
            SavedItemEvent::SavedItemArchived(e) => e.occurred_at,
        }
    }
}

impl Aggregate for SavedItem {
    type Command = SavedItemCommand;
    type Event = SavedItemEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SavedItemEvent::SavedItemCreated(e) => {
                self.id = e.item_id;
                self.user_id = Some(e.user_id);
                self.name = e.name.clone();
                self.category = e.category;
                self.default_price = e.default_price;
                self.unit = e.unit.clone();
                self.archived = false;
                self.created = true;
            }
            SavedItemEvent::SavedItemUpdated(e) => {
                self.name = e.name.clone();
                self.category = e.category;
                self.default_price = e.default_price;
                self.unit = e.unit.clone();
            }
            SavedItemEvent::SavedItemArchived(_) => {
                self.archived = true;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SavedItemCommand::CreateSavedItem(cmd) => self.handle_create(cmd),
            SavedItemCommand::UpdateSavedItem(cmd) => self.handle_update(cmd),
            SavedItemCommand::ArchiveSavedItem(cmd) => self.handle_archive(cmd),
        }
    }
}

impl SavedItem {
    fn ensure_owner(&self, user_id: UserId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.user_id != Some(user_id) {
            return Err(DomainError::invariant("user_id mismatch"));
        }
        Ok(())
    }

    fn ensure_item_id(&self, item_id: SavedItemId) -> Result<(), DomainError> {
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateSavedItem) -> Result<Vec<SavedItemEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("saved item already exists"));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if cmd.default_price.is_negative() {
            return Err(DomainError::validation("default_price cannot be negative"));
        }
        if cmd.unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }

        Ok(vec![SavedItemEvent::SavedItemCreated(SavedItemCreated {
            user_id: cmd.user_id,
            item_id: cmd.item_id,
            name: cmd.name.clone(),
            category: cmd.category,
            default_price: cmd.default_price,
            unit: cmd.unit.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateSavedItem) -> Result<Vec<SavedItemEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.user_id)?;
        self.ensure_item_id(cmd.item_id)?;

        if self.archived {
            return Err(DomainError::conflict("saved item is archived"));
        }

        let new_name = cmd.name.clone().unwrap_or_else(|| self.name.clone());
        if new_name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let new_price = cmd.default_price.unwrap_or(self.default_price);
        if new_price.is_negative() {
            return Err(DomainError::validation("default_price cannot be negative"));
        }

        let new_unit = cmd.unit.clone().unwrap_or_else(|| self.unit.clone());
        if new_unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }

        Ok(vec![SavedItemEvent::SavedItemUpdated(SavedItemUpdated {
            user_id: cmd.user_id,
            item_id: cmd.item_id,
            name: new_name,
            category: cmd.category.unwrap_or(self.category),
            default_price: new_price,
            unit: new_unit,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_archive(&self, cmd: &ArchiveSavedItem) -> Result<Vec<SavedItemEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.user_id)?;
        self.ensure_item_id(cmd.item_id)?;

        if self.archived {
            return Err(DomainError::conflict("saved item is already archived"));
        }

        Ok(vec![SavedItemEvent::SavedItemArchived(SavedItemArchived {
            user_id: cmd.user_id,
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
