use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use presupro_core::{Aggregate, AggregateRoot, Currency, DomainError, UserId};
use presupro_events::Event;

use crate::plan::Plan;

/// Aggregate root: Profile.
///
/// One per account, keyed directly by the owner's [`UserId`]. Carries the
/// business identity shown on quotes plus the plan, currency and numbering
/// settings the rest of the domain consults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    user_id: UserId,
    business_name: String,
    owner_name: String,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    trade: String,
    logo_url: Option<String>,
    currency: String,
    plan: Plan,
    quotes_this_month: u32,
    quote_number_offset: u32,
    version: u64,
    created: bool,
}

impl Profile {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            business_name: String::new(),
            owner_name: String::new(),
            phone: None,
            address: None,
            city: None,
            trade: String::new(),
            logo_url: None,
            currency: String::new(),
            plan: Plan::Free,
            quotes_this_month: 0,
            quote_number_offset: 0,
            version: 0,
            created: false,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn business_name(&self) -> &str {
        &self.business_name
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn trade(&self) -> &str {
        &self.trade
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo_url.as_deref()
    }

    /// ISO code of the display currency, resolved against the registry.
    pub fn currency(&self) -> &'static Currency {
        Currency::get(&self.currency)
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    pub fn quotes_this_month(&self) -> u32 {
        self.quotes_this_month
    }

    pub fn quote_number_offset(&self) -> u32 {
        self.quote_number_offset
    }

    /// Invariant helper: whether the plan's monthly quota leaves room for
    /// another quote.
    pub fn can_create_quote(&self) -> bool {
        match self.plan.limits().quotes_per_month {
            None => true,
            Some(quota) => self.quotes_this_month < quota,
        }
    }

    /// Whether exported PDFs must carry the watermark (free plan only).
    pub fn watermark(&self) -> bool {
        self.plan.limits().watermark
    }
}

impl AggregateRoot for Profile {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.user_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProfile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProfile {
    pub user_id: UserId,
    pub business_name: String,
    pub owner_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub trade: String,
    pub logo_url: Option<String>,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateBusinessInfo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBusinessInfo {
    pub user_id: UserId,
    /// Optional new business name (if None, keep existing).
    pub business_name: Option<String>,
    /// Optional new owner name (if None, keep existing).
    pub owner_name: Option<String>,
    /// Optional new phone (if None, keep existing).
    pub phone: Option<String>,
    /// Optional new address (if None, keep existing).
    pub address: Option<String>,
    /// Optional new city (if None, keep existing).
    pub city: Option<String>,
    /// Optional new trade (if None, keep existing).
    pub trade: Option<String>,
    /// Optional new logo URL (if None, keep existing).
    pub logo_url: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetCurrency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCurrency {
    pub user_id: UserId,
    /// ISO code; must exist in the currency registry.
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetNumberOffset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetNumberOffset {
    pub user_id: UserId,
    /// Quote numbering starts at `offset + 1`.
    pub offset: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangePlan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePlan {
    pub user_id: UserId,
    pub plan: Plan,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordQuoteIssued.
///
/// Issued by the application whenever a quote is created, so the monthly
/// quota can be enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuoteIssued {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ResetMonthlyCounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetMonthlyCounter {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileCommand {
    CreateProfile(CreateProfile),
    UpdateBusinessInfo(UpdateBusinessInfo),
    SetCurrency(SetCurrency),
    SetNumberOffset(SetNumberOffset),
    ChangePlan(ChangePlan),
    RecordQuoteIssued(RecordQuoteIssued),
    ResetMonthlyCounter(ResetMonthlyCounter),
}

/// Event: ProfileCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCreated {
    pub user_id: UserId,
    pub business_name: String,
    pub owner_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub trade: String,
    pub logo_url: Option<String>,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BusinessInfoUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessInfoUpdated {
    pub user_id: UserId,
    pub business_name: String,
    pub owner_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub trade: String,
    pub logo_url: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CurrencyChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyChanged {
    pub user_id: UserId,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: NumberOffsetChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberOffsetChanged {
    pub user_id: UserId,
    pub offset: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PlanChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanChanged {
    pub user_id: UserId,
    pub plan: Plan,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuoteIssueRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteIssueRecorded {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MonthlyCounterReset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCounterReset {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileEvent {
    ProfileCreated(ProfileCreated),
    BusinessInfoUpdated(BusinessInfoUpdated),
    CurrencyChanged(CurrencyChanged),
    NumberOffsetChanged(NumberOffsetChanged),
    PlanChanged(PlanChanged),
    QuoteIssueRecorded(QuoteIssueRecorded),
    MonthlyCounterReset(MonthlyCounterReset),
}

impl Event for ProfileEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProfileEvent::ProfileCreated(_) => "profiles.profile.created",
            ProfileEvent::BusinessInfoUpdated(_) => "profiles.profile.business_info_updated",
            ProfileEvent::CurrencyChanged(_) => "profiles.profile.currency_changed",
            ProfileEvent::NumberOffsetChanged(_) => "profiles.profile.number_offset_changed",
            ProfileEvent::PlanChanged(_) => "profiles.profile.plan_changed",
            ProfileEvent::QuoteIssueRecorded(_) => "profiles.profile.quote_issue_recorded",
            ProfileEvent::MonthlyCounterReset(_) => "profiles.profile.monthly_counter_reset",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProfileEvent::ProfileCreated(e) => e.occurred_at,
            ProfileEvent::BusinessInfoUpdated(e) => e.occurred_at,
            ProfileEvent::CurrencyChanged(e) => e.occurred_at,
            ProfileEvent::NumberOffsetChanged(e) => e.occurred_at,
            ProfileEvent::PlanChanged(e) => e.occurred_at,
            ProfileEvent::QuoteIssueRecorded(e) => e.occurred_at,
            ProfileEvent::MonthlyCounterReset(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Profile {
    type Command = ProfileCommand;
    type Event = ProfileEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProfileEvent::ProfileCreated(e) => {
                self.user_id = e.user_id;
                self.business_name = e.business_name.clone();
                self.owner_name = e.owner_name.clone();
                self.phone = e.phone.clone();
                self.address = e.address.clone();
                self.city = e.city.clone();
                self.trade = e.trade.clone();
                self.logo_url = e.logo_url.clone();
                self.currency = e.currency.clone();
                self.plan = Plan::Free;
                self.quotes_this_month = 0;
                self.quote_number_offset = 0;
                self.created = true;
            }
            ProfileEvent::BusinessInfoUpdated(e) => {
                self.business_name = e.business_name.clone();
                self.owner_name = e.owner_name.clone();
                self.phone = e.phone.clone();
                self.address = e.address.clone();
                self.city = e.city.clone();
                self.trade = e.trade.clone();
                self.logo_url = e.logo_url.clone();
            }
            ProfileEvent::CurrencyChanged(e) => {
                self.currency = e.currency.clone();
            }
            ProfileEvent::NumberOffsetChanged(e) => {
                self.quote_number_offset = e.offset;
            }
            ProfileEvent::PlanChanged(e) => {
                self.plan = e.plan;
            }
            ProfileEvent::QuoteIssueRecorded(_) => {
                self.quotes_this_month = self.quotes_this_month.saturating_add(1);
            }
            ProfileEvent::MonthlyCounterReset(_) => {
                self.quotes_this_month = 0;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProfileCommand::CreateProfile(cmd) => self.handle_create(cmd),
            ProfileCommand::UpdateBusinessInfo(cmd) => self.handle_update_info(cmd),
            ProfileCommand::SetCurrency(cmd) => self.handle_set_currency(cmd),
            ProfileCommand::SetNumberOffset(cmd) => self.handle_set_offset(cmd),
            ProfileCommand::ChangePlan(cmd) => self.handle_change_plan(cmd),
            ProfileCommand::RecordQuoteIssued(cmd) => self.handle_record_quote(cmd),
            ProfileCommand::ResetMonthlyCounter(cmd) => self.handle_reset_counter(cmd),
        }
    }
}

impl Profile {
    fn ensure_owner(&self, user_id: UserId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.user_id != user_id {
            return Err(DomainError::invariant("user_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProfile) -> Result<Vec<ProfileEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("profile already exists"));
        }

        if cmd.business_name.trim().is_empty() {
            return Err(DomainError::validation("business_name cannot be empty"));
        }
        if cmd.trade.trim().is_empty() {
            return Err(DomainError::validation("trade cannot be empty"));
        }
        if Currency::find(&cmd.currency).is_none() {
            return Err(DomainError::validation(format!(
                "unknown currency code: {}",
                cmd.currency
            )));
        }

        Ok(vec![ProfileEvent::ProfileCreated(ProfileCreated {
            user_id: cmd.user_id,
            business_name: cmd.business_name.clone(),
            owner_name: cmd.owner_name.clone(),
            phone: cmd.phone.clone(),
            address: cmd.address.clone(),
            city: cmd.city.clone(),
            trade: cmd.trade.clone(),
            logo_url: cmd.logo_url.clone(),
            currency: cmd.currency.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_info(&self, cmd: &UpdateBusinessInfo) -> Result<Vec<ProfileEvent>, DomainError> {
        self.ensure_owner(cmd.user_id)?;

        let business_name = cmd
            .business_name
            .clone()
            .unwrap_or_else(|| self.business_name.clone());
        if business_name.trim().is_empty() {
            return Err(DomainError::validation("business_name cannot be empty"));
        }

        let trade = cmd.trade.clone().unwrap_or_else(|| self.trade.clone());
        if trade.trim().is_empty() {
            return Err(DomainError::validation("trade cannot be empty"));
        }

        Ok(vec![ProfileEvent::BusinessInfoUpdated(BusinessInfoUpdated {
            user_id: cmd.user_id,
            business_name,
            owner_name: cmd
                .owner_name
                .clone()
                .unwrap_or_else(|| self.owner_name.clone()),
            phone: cmd.phone.clone().or_else(|| self.phone.clone()),
            address: cmd.address.clone().or_else(|| self.address.clone()),
            city: cmd.city.clone().or_else(|| self.city.clone()),
            trade,
            logo_url: cmd.logo_url.clone().or_else(|| self.logo_url.clone()),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_currency(&self, cmd: &SetCurrency) -> Result<Vec<ProfileEvent>, DomainError> {
        self.ensure_owner(cmd.user_id)?;

        if Currency::find(&cmd.currency).is_none() {
            return Err(DomainError::validation(format!(
                "unknown currency code: {}",
                cmd.currency
            )));
        }

        Ok(vec![ProfileEvent::CurrencyChanged(CurrencyChanged {
            user_id: cmd.user_id,
            currency: cmd.currency.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_offset(&self, cmd: &SetNumberOffset) -> Result<Vec<ProfileEvent>, DomainError> {
        self.ensure_owner(cmd.user_id)?;

        Ok(vec![ProfileEvent::NumberOffsetChanged(NumberOffsetChanged {
            user_id: cmd.user_id,
            offset: cmd.offset,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_plan(&self, cmd: &ChangePlan) -> Result<Vec<ProfileEvent>, DomainError> {
        self.ensure_owner(cmd.user_id)?;

        if cmd.plan == self.plan {
            return Err(DomainError::conflict("plan unchanged"));
        }

        Ok(vec![ProfileEvent::PlanChanged(PlanChanged {
            user_id: cmd.user_id,
            plan: cmd.plan,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_quote(&self, cmd: &RecordQuoteIssued) -> Result<Vec<ProfileEvent>, DomainError> {
        self.ensure_owner(cmd.user_id)?;

        if !self.can_create_quote() {
            return Err(DomainError::invariant(
                "monthly quote limit reached for current plan",
            ));
        }

        Ok(vec![ProfileEvent::QuoteIssueRecorded(QuoteIssueRecorded {
            user_id: cmd.user_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reset_counter(&self, cmd: &ResetMonthlyCounter) -> Result<Vec<ProfileEvent>, DomainError> {
        self.ensure_owner(cmd.user_id)?;

        Ok(vec![ProfileEvent::MonthlyCounterReset(MonthlyCounterReset {
            user_id: cmd.user_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
