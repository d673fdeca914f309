//! Profiles domain module (business identity, plan and quota, event-sourced).
//!
//! One profile per account: who the tradesperson is, which currency their
//! quotes are in, where quote numbering starts, and what their plan allows.

pub mod plan;
pub mod profile;

pub use plan::{Plan, PlanLimits};
pub use profile::{
    BusinessInfoUpdated, ChangePlan, CreateProfile, CurrencyChanged, MonthlyCounterReset,
    NumberOffsetChanged, PlanChanged, Profile, ProfileCommand, ProfileCreated, ProfileEvent,
    QuoteIssueRecorded, RecordQuoteIssued, ResetMonthlyCounter, SetCurrency, SetNumberOffset,
    UpdateBusinessInfo,
};
