//! Clients domain module (the people quotes are addressed to, event-sourced).
//!
//! This crate contains business rules for clients, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod client;

pub use client::{
    ArchiveClient, Client, ClientArchived, ClientCommand, ClientEvent, ClientId,
    ClientRegistered, ClientStatus, ClientUpdated, ContactInfo, RegisterClient,
    UpdateClientDetails,
};
