use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use presupro_catalog::ItemCategory;
use presupro_clients::ClientId;
use presupro_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, Money, Percent, Quantity,
    UserId,
};
use presupro_events::Event;

use crate::status::QuoteStatus;
use crate::totals::{compute_totals, QuoteLine, Totals};

/// Quote identifier (account-scoped via `user_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub AggregateId);

impl QuoteId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: Quote.
///
/// Lines and adjustment percentages are editable only while the quote is in
/// `draft`. Derived totals are not stored; [`Quote::totals`] recomputes them
/// from current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    id: QuoteId,
    user_id: Option<UserId>,
    client_id: Option<ClientId>,
    quote_number: u32,
    title: String,
    vehicle_info: Option<String>,
    notes: Option<String>,
    valid_until: Option<DateTime<Utc>>,
    status: QuoteStatus,
    lines: Vec<QuoteLine>,
    discount_percent: Percent,
    tax_percent: Percent,
    sent_at: Option<DateTime<Utc>>,
    accepted_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Quote {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: QuoteId) -> Self {
        Self {
            id,
            user_id: None,
            client_id: None,
            quote_number: 0,
            title: String::new(),
            vehicle_info: None,
            notes: None,
            valid_until: None,
            status: QuoteStatus::Draft,
            lines: Vec::new(),
            discount_percent: Percent::ZERO,
            tax_percent: Percent::ZERO,
            sent_at: None,
            accepted_at: None,
            paid_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> QuoteId {
        self.id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn quote_number(&self) -> u32 {
        self.quote_number
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn vehicle_info(&self) -> Option<&str> {
        self.vehicle_info.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.valid_until
    }

    pub fn status(&self) -> QuoteStatus {
        self.status
    }

    pub fn lines(&self) -> &[QuoteLine] {
        &self.lines
    }

    pub fn discount_percent(&self) -> Percent {
        self.discount_percent
    }

    pub fn tax_percent(&self) -> Percent {
        self.tax_percent
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    pub fn accepted_at(&self) -> Option<DateTime<Utc>> {
        self.accepted_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn is_modifiable(&self) -> bool {
        self.status.is_editable()
    }

    /// Recompute the derived monetary fields from current lines and rates.
    pub fn totals(&self) -> DomainResult<Totals> {
        compute_totals(&self.lines, self.discount_percent, self.tax_percent)
    }
}

impl AggregateRoot for Quote {
    type Id = QuoteId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateQuote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateQuote {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub client_id: Option<ClientId>,
    /// Assigned by the caller via [`crate::numbering::next_quote_number`].
    pub quote_number: u32,
    pub title: String,
    pub vehicle_info: Option<String>,
    pub notes: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub name: String,
    pub category: ItemCategory,
    pub quantity: Quantity,
    pub unit: String,
    pub unit_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveLine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLine {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub line_no: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetDiscount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDiscount {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    /// Must not exceed 100%.
    pub discount_percent: Percent,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetTax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTax {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub tax_percent: Percent,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdvanceStatus.
///
/// Moves one step along the forward chain. From a terminal status this is a
/// no-op: no events, no error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceStatus {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectQuote.
///
/// Legal only from `sent`. Rejecting an already-rejected quote is an
/// idempotent no-op; rejecting from any other status is a domain error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectQuote {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteCommand {
    CreateQuote(CreateQuote),
    AddLine(AddLine),
    RemoveLine(RemoveLine),
    SetDiscount(SetDiscount),
    SetTax(SetTax),
    AdvanceStatus(AdvanceStatus),
    RejectQuote(RejectQuote),
}

/// Event: QuoteCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteCreated {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub client_id: Option<ClientId>,
    pub quote_number: u32,
    pub title: String,
    pub vehicle_info: Option<String>,
    pub notes: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAdded {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub line_no: u32,
    pub name: String,
    pub category: ItemCategory,
    pub quantity: Quantity,
    pub unit: String,
    pub unit_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRemoved {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub line_no: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DiscountChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountChanged {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub discount_percent: Percent,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TaxChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxChanged {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub tax_percent: Percent,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusAdvanced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAdvanced {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub from: QuoteStatus,
    pub to: QuoteStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuoteRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRejected {
    pub user_id: UserId,
    pub quote_id: QuoteId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteEvent {
    QuoteCreated(QuoteCreated),
    LineAdded(LineAdded),
    LineRemoved(LineRemoved),
    DiscountChanged(DiscountChanged),
    TaxChanged(TaxChanged),
    StatusAdvanced(StatusAdvanced),
    QuoteRejected(QuoteRejected),
}

impl Event for QuoteEvent {
    fn event_type(&self) -> &'static str {
        match self {
            QuoteEvent::QuoteCreated(_) => "quotes.quote.created",
            QuoteEvent::LineAdded(_) => "quotes.quote.line_added",
            QuoteEvent::LineRemoved(_) => "quotes.quote.line_removed",
            QuoteEvent::DiscountChanged(_) => "quotes.quote.discount_changed",
            QuoteEvent::TaxChanged(_) => "quotes.quote.tax_changed",
            QuoteEvent::StatusAdvanced(_) => "quotes.quote.status_advanced",
            QuoteEvent::QuoteRejected(_) => "quotes.quote.rejected",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            QuoteEvent::QuoteCreated(e) => e.occurred_at,
            QuoteEvent::LineAdded(e) => e.occurred_at,
            QuoteEvent::LineRemoved(e) => e.occurred_at,
            QuoteEvent::DiscountChanged(e) => e.occurred_at,
            QuoteEvent::TaxChanged(e) => e.occurred_at,
            QuoteEvent::StatusAdvanced(e) => e.occurred_at,
            QuoteEvent::QuoteRejected(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Quote {
    type Command = QuoteCommand;
    type Event = QuoteEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            QuoteEvent::QuoteCreated(e) => {
                self.id = e.quote_id;
                self.user_id = Some(e.user_id);
                self.client_id = e.client_id;
                self.quote_number = e.quote_number;
                self.title = e.title.clone();
                self.vehicle_info = e.vehicle_info.clone();
                self.notes = e.notes.clone();
                self.valid_until = e.valid_until;
                self.status = QuoteStatus::Draft;
                self.lines.clear();
                self.discount_percent = Percent::ZERO;
                self.tax_percent = Percent::ZERO;
                self.created = true;
            }
            QuoteEvent::LineAdded(e) => {
                self.lines.push(QuoteLine {
                    line_no: e.line_no,
                    name: e.name.clone(),
                    category: e.category,
                    quantity: e.quantity,
                    unit: e.unit.clone(),
                    unit_price: e.unit_price,
                });
            }
            QuoteEvent::LineRemoved(e) => {
                self.lines.retain(|line| line.line_no != e.line_no);
            }
            QuoteEvent::DiscountChanged(e) => {
                self.discount_percent = e.discount_percent;
            }
            QuoteEvent::TaxChanged(e) => {
                self.tax_percent = e.tax_percent;
            }
            QuoteEvent::StatusAdvanced(e) => {
                self.status = e.to;
                // Stamps are written once and never overwritten.
                match e.to {
                    QuoteStatus::Sent => {
                        self.sent_at.get_or_insert(e.occurred_at);
                    }
                    QuoteStatus::Accepted => {
                        self.accepted_at.get_or_insert(e.occurred_at);
                    }
                    QuoteStatus::Paid => {
                        self.paid_at.get_or_insert(e.occurred_at);
                    }
                    _ => {}
                }
            }
            QuoteEvent::QuoteRejected(_) => {
                self.status = QuoteStatus::Rejected;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            QuoteCommand::CreateQuote(cmd) => self.handle_create(cmd),
            QuoteCommand::AddLine(cmd) => self.handle_add_line(cmd),
            QuoteCommand::RemoveLine(cmd) => self.handle_remove_line(cmd),
            QuoteCommand::SetDiscount(cmd) => self.handle_set_discount(cmd),
            QuoteCommand::SetTax(cmd) => self.handle_set_tax(cmd),
            QuoteCommand::AdvanceStatus(cmd) => self.handle_advance(cmd),
            QuoteCommand::RejectQuote(cmd) => self.handle_reject(cmd),
        }
    }
}

impl Quote {
    fn ensure_owner(&self, user_id: UserId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.user_id != Some(user_id) {
            return Err(DomainError::invariant("user_id mismatch"));
        }
        Ok(())
    }

    fn ensure_quote_id(&self, quote_id: QuoteId) -> Result<(), DomainError> {
        if self.id != quote_id {
            return Err(DomainError::invariant("quote_id mismatch"));
        }
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), DomainError> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant(
                "cannot modify a quote once it has been sent",
            ));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateQuote) -> Result<Vec<QuoteEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("quote already exists"));
        }

        if cmd.title.trim().is_empty() {
            return Err(DomainError::validation("title cannot be empty"));
        }
        if cmd.quote_number == 0 {
            return Err(DomainError::validation("quote_number must be positive"));
        }

        Ok(vec![QuoteEvent::QuoteCreated(QuoteCreated {
            user_id: cmd.user_id,
            quote_id: cmd.quote_id,
            client_id: cmd.client_id,
            quote_number: cmd.quote_number,
            title: cmd.title.clone(),
            vehicle_info: cmd.vehicle_info.clone(),
            notes: cmd.notes.clone(),
            valid_until: cmd.valid_until,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddLine) -> Result<Vec<QuoteEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.user_id)?;
        self.ensure_quote_id(cmd.quote_id)?;
        self.ensure_editable()?;

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("line name cannot be empty"));
        }
        if !cmd.quantity.is_positive() {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if cmd.unit_price.is_negative() {
            return Err(DomainError::validation("unit_price cannot be negative"));
        }
        if cmd.unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }

        // Reject lines whose total cannot be represented.
        cmd.unit_price.times(cmd.quantity)?;

        // Line numbers never repeat, even after removals.
        let next_line_no = self
            .lines
            .iter()
            .map(|line| line.line_no)
            .max()
            .unwrap_or(0)
            + 1;

        Ok(vec![QuoteEvent::LineAdded(LineAdded {
            user_id: cmd.user_id,
            quote_id: cmd.quote_id,
            line_no: next_line_no,
            name: cmd.name.clone(),
            category: cmd.category,
            quantity: cmd.quantity,
            unit: cmd.unit.clone(),
            unit_price: cmd.unit_price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_line(&self, cmd: &RemoveLine) -> Result<Vec<QuoteEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.user_id)?;
        self.ensure_quote_id(cmd.quote_id)?;
        self.ensure_editable()?;

        if !self.lines.iter().any(|line| line.line_no == cmd.line_no) {
            return Err(DomainError::validation(format!(
                "line {} does not exist",
                cmd.line_no
            )));
        }

        Ok(vec![QuoteEvent::LineRemoved(LineRemoved {
            user_id: cmd.user_id,
            quote_id: cmd.quote_id,
            line_no: cmd.line_no,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_discount(&self, cmd: &SetDiscount) -> Result<Vec<QuoteEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.user_id)?;
        self.ensure_quote_id(cmd.quote_id)?;
        self.ensure_editable()?;

        if cmd.discount_percent > Percent::ONE_HUNDRED {
            return Err(DomainError::validation(
                "discount_percent cannot exceed 100%",
            ));
        }

        Ok(vec![QuoteEvent::DiscountChanged(DiscountChanged {
            user_id: cmd.user_id,
            quote_id: cmd.quote_id,
            discount_percent: cmd.discount_percent,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_tax(&self, cmd: &SetTax) -> Result<Vec<QuoteEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.user_id)?;
        self.ensure_quote_id(cmd.quote_id)?;
        self.ensure_editable()?;

        Ok(vec![QuoteEvent::TaxChanged(TaxChanged {
            user_id: cmd.user_id,
            quote_id: cmd.quote_id,
            tax_percent: cmd.tax_percent,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_advance(&self, cmd: &AdvanceStatus) -> Result<Vec<QuoteEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.user_id)?;
        self.ensure_quote_id(cmd.quote_id)?;

        // Terminal quotes ignore further advances.
        let Some(next) = self.status.next() else {
            return Ok(vec![]);
        };

        Ok(vec![QuoteEvent::StatusAdvanced(StatusAdvanced {
            user_id: cmd.user_id,
            quote_id: cmd.quote_id,
            from: self.status,
            to: next,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectQuote) -> Result<Vec<QuoteEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.user_id)?;
        self.ensure_quote_id(cmd.quote_id)?;

        // Rejecting an already-rejected quote is idempotent.
        if self.status == QuoteStatus::Rejected {
            return Ok(vec![]);
        }

        if !self.status.can_reject() {
            return Err(DomainError::invariant(
                "only a sent quote can be rejected",
            ));
        }

        Ok(vec![QuoteEvent::QuoteRejected(QuoteRejected {
            user_id: cmd.user_id,
            quote_id: cmd.quote_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presupro_events::execute;

    fn test_user_id() -> UserId {
        UserId::new()
    }

    fn test_quote_id() -> QuoteId {
        QuoteId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn created_quote(user_id: UserId, quote_id: QuoteId) -> Quote {
        let mut quote = Quote::empty(quote_id);
        let cmd = CreateQuote {
            user_id,
            quote_id,
            client_id: None,
            quote_number: 1,
            title: "Reparación frenos".to_string(),
            vehicle_info: Some("Ford Fiesta 2012".to_string()),
            notes: None,
            valid_until: None,
            occurred_at: test_time(),
        };
        execute(&mut quote, &QuoteCommand::CreateQuote(cmd)).unwrap();
        quote
    }

    fn add_line(quote: &mut Quote, quantity: Quantity, unit_price: Money) {
        let cmd = AddLine {
            user_id: quote.user_id().unwrap(),
            quote_id: quote.id_typed(),
            name: "item".to_string(),
            category: ItemCategory::Material,
            quantity,
            unit: "unidad".to_string(),
            unit_price,
            occurred_at: test_time(),
        };
        execute(quote, &QuoteCommand::AddLine(cmd)).unwrap();
    }

    fn advance(quote: &mut Quote) -> Vec<QuoteEvent> {
        let cmd = AdvanceStatus {
            user_id: quote.user_id().unwrap(),
            quote_id: quote.id_typed(),
            occurred_at: test_time(),
        };
        execute(quote, &QuoteCommand::AdvanceStatus(cmd)).unwrap()
    }

    #[test]
    fn create_quote_emits_quote_created_event() {
        let quote = Quote::empty(test_quote_id());
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let cmd = CreateQuote {
            user_id,
            quote_id,
            client_id: None,
            quote_number: 42,
            title: "Instalación eléctrica".to_string(),
            vehicle_info: None,
            notes: Some("dos visitas".to_string()),
            valid_until: None,
            occurred_at: test_time(),
        };

        let events = quote.handle(&QuoteCommand::CreateQuote(cmd)).unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            QuoteEvent::QuoteCreated(e) => {
                assert_eq!(e.user_id, user_id);
                assert_eq!(e.quote_id, quote_id);
                assert_eq!(e.quote_number, 42);
                assert_eq!(e.title, "Instalación eléctrica");
                assert_eq!(e.notes.as_deref(), Some("dos visitas"));
            }
            _ => panic!("Expected QuoteCreated event"),
        }
    }

    #[test]
    fn create_quote_rejects_empty_title_and_zero_number() {
        let quote = Quote::empty(test_quote_id());
        let base = CreateQuote {
            user_id: test_user_id(),
            quote_id: test_quote_id(),
            client_id: None,
            quote_number: 1,
            title: "  ".to_string(),
            vehicle_info: None,
            notes: None,
            valid_until: None,
            occurred_at: test_time(),
        };

        let err = quote
            .handle(&QuoteCommand::CreateQuote(base.clone()))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for empty title"),
        }

        let mut cmd = base;
        cmd.title = "Valid".to_string();
        cmd.quote_number = 0;
        let err = quote.handle(&QuoteCommand::CreateQuote(cmd)).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for zero quote_number"),
        }
    }

    #[test]
    fn add_line_validates_quantity_and_price() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let quote = created_quote(user_id, quote_id);

        let base = AddLine {
            user_id,
            quote_id,
            name: "Pastillas".to_string(),
            category: ItemCategory::Material,
            quantity: Quantity::ZERO,
            unit: "unidad".to_string(),
            unit_price: Money::from_minor_units(100),
            occurred_at: test_time(),
        };

        let err = quote.handle(&QuoteCommand::AddLine(base.clone())).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for zero quantity"),
        }

        let mut cmd = base;
        cmd.quantity = Quantity::ONE;
        cmd.unit_price = Money::from_minor_units(-5);
        let err = quote.handle(&QuoteCommand::AddLine(cmd)).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for negative price"),
        }
    }

    #[test]
    fn zero_price_lines_are_allowed() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let mut quote = created_quote(user_id, quote_id);

        add_line(&mut quote, Quantity::ONE, Money::ZERO);
        assert_eq!(quote.lines().len(), 1);
        assert_eq!(quote.totals().unwrap().total, Money::ZERO);
    }

    #[test]
    fn line_numbers_never_repeat_after_removal() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let mut quote = created_quote(user_id, quote_id);

        add_line(&mut quote, Quantity::ONE, Money::from_minor_units(100));
        add_line(&mut quote, Quantity::ONE, Money::from_minor_units(200));
        add_line(&mut quote, Quantity::ONE, Money::from_minor_units(300));

        let remove = RemoveLine {
            user_id,
            quote_id,
            line_no: 2,
            occurred_at: test_time(),
        };
        let events = quote.handle(&QuoteCommand::RemoveLine(remove)).unwrap();
        quote.apply(&events[0]);

        let line_nos: Vec<u32> = quote.lines().iter().map(|l| l.line_no).collect();
        assert_eq!(line_nos, vec![1, 3]);

        add_line(&mut quote, Quantity::ONE, Money::from_minor_units(400));
        let line_nos: Vec<u32> = quote.lines().iter().map(|l| l.line_no).collect();
        assert_eq!(line_nos, vec![1, 3, 4]);
    }

    #[test]
    fn remove_line_requires_existing_line() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let quote = created_quote(user_id, quote_id);

        let err = quote
            .handle(&QuoteCommand::RemoveLine(RemoveLine {
                user_id,
                quote_id,
                line_no: 7,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for missing line"),
        }
    }

    #[test]
    fn totals_match_reference_scenario() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let mut quote = created_quote(user_id, quote_id);

        add_line(&mut quote, Quantity::from_whole(2), Money::from_minor_units(100_000));
        add_line(&mut quote, Quantity::from_whole(1), Money::from_minor_units(50_000));

        let events = quote
            .handle(&QuoteCommand::SetDiscount(SetDiscount {
                user_id,
                quote_id,
                discount_percent: Percent::from_whole(10),
                occurred_at: test_time(),
            }))
            .unwrap();
        quote.apply(&events[0]);

        let events = quote
            .handle(&QuoteCommand::SetTax(SetTax {
                user_id,
                quote_id,
                tax_percent: Percent::from_whole(21),
                occurred_at: test_time(),
            }))
            .unwrap();
        quote.apply(&events[0]);

        let totals = quote.totals().unwrap();
        assert_eq!(totals.subtotal, Money::from_minor_units(250_000));
        assert_eq!(totals.discount_amount, Money::from_minor_units(25_000));
        assert_eq!(totals.taxable, Money::from_minor_units(225_000));
        assert_eq!(totals.tax_amount, Money::from_minor_units(47_250));
        assert_eq!(totals.total, Money::from_minor_units(272_250));
    }

    #[test]
    fn set_discount_rejects_rates_over_one_hundred() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let quote = created_quote(user_id, quote_id);

        let err = quote
            .handle(&QuoteCommand::SetDiscount(SetDiscount {
                user_id,
                quote_id,
                discount_percent: Percent::from_basis_points(10_001),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for discount over 100%"),
        }
    }

    #[test]
    fn edits_are_rejected_once_sent() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let mut quote = created_quote(user_id, quote_id);

        add_line(&mut quote, Quantity::ONE, Money::from_minor_units(100));
        advance(&mut quote);
        assert_eq!(quote.status(), QuoteStatus::Sent);

        let err = quote
            .handle(&QuoteCommand::AddLine(AddLine {
                user_id,
                quote_id,
                name: "extra".to_string(),
                category: ItemCategory::Other,
                quantity: Quantity::ONE,
                unit: "unidad".to_string(),
                unit_price: Money::from_minor_units(100),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation for edit after send"),
        }

        let err = quote
            .handle(&QuoteCommand::SetTax(SetTax {
                user_id,
                quote_id,
                tax_percent: Percent::from_whole(21),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation for edit after send"),
        }
    }

    #[test]
    fn advance_walks_the_chain_and_stamps_once() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let mut quote = created_quote(user_id, quote_id);

        advance(&mut quote);
        assert_eq!(quote.status(), QuoteStatus::Sent);
        let sent_at = quote.sent_at().expect("sent_at stamped");

        advance(&mut quote);
        assert_eq!(quote.status(), QuoteStatus::Accepted);
        let accepted_at = quote.accepted_at().expect("accepted_at stamped");

        advance(&mut quote);
        assert_eq!(quote.status(), QuoteStatus::InProgress);
        // Advancing past accepted does not touch the accepted stamp.
        assert_eq!(quote.accepted_at(), Some(accepted_at));

        advance(&mut quote);
        assert_eq!(quote.status(), QuoteStatus::Completed);

        advance(&mut quote);
        assert_eq!(quote.status(), QuoteStatus::Paid);
        assert!(quote.paid_at().is_some());
        assert_eq!(quote.sent_at(), Some(sent_at));
    }

    #[test]
    fn advance_from_terminal_is_a_no_op() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let mut quote = created_quote(user_id, quote_id);

        for _ in 0..5 {
            advance(&mut quote);
        }
        assert_eq!(quote.status(), QuoteStatus::Paid);

        let before = quote.clone();
        let events = advance(&mut quote);
        assert!(events.is_empty());
        assert_eq!(quote, before);
    }

    #[test]
    fn reject_is_only_legal_from_sent() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let mut quote = created_quote(user_id, quote_id);

        // Draft quotes cannot be rejected.
        let err = quote
            .handle(&QuoteCommand::RejectQuote(RejectQuote {
                user_id,
                quote_id,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation for reject from draft"),
        }

        advance(&mut quote);
        assert_eq!(quote.status(), QuoteStatus::Sent);

        let events = quote
            .handle(&QuoteCommand::RejectQuote(RejectQuote {
                user_id,
                quote_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(events.len(), 1);
        quote.apply(&events[0]);
        assert_eq!(quote.status(), QuoteStatus::Rejected);

        // Rejecting again is an idempotent no-op.
        let before = quote.clone();
        let events = quote
            .handle(&QuoteCommand::RejectQuote(RejectQuote {
                user_id,
                quote_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert!(events.is_empty());
        assert_eq!(quote, before);

        // And a rejected quote ignores advances.
        let events = advance(&mut quote);
        assert!(events.is_empty());
        assert_eq!(quote.status(), QuoteStatus::Rejected);
    }

    #[test]
    fn stamp_survives_replayed_event() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let mut quote = created_quote(user_id, quote_id);

        let first = DateTime::parse_from_rfc3339("2026-01-10T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let later = DateTime::parse_from_rfc3339("2026-02-20T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let event = QuoteEvent::StatusAdvanced(StatusAdvanced {
            user_id,
            quote_id,
            from: QuoteStatus::Draft,
            to: QuoteStatus::Sent,
            occurred_at: first,
        });
        quote.apply(&event);
        assert_eq!(quote.sent_at(), Some(first));

        let replay = QuoteEvent::StatusAdvanced(StatusAdvanced {
            user_id,
            quote_id,
            from: QuoteStatus::Draft,
            to: QuoteStatus::Sent,
            occurred_at: later,
        });
        quote.apply(&replay);
        assert_eq!(quote.sent_at(), Some(first));
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let user_id = test_user_id();
        let quote_id = test_quote_id();
        let mut quote = created_quote(user_id, quote_id);
        add_line(&mut quote, Quantity::ONE, Money::from_minor_units(100));

        let before = quote.clone();
        let _ = quote.handle(&QuoteCommand::AdvanceStatus(AdvanceStatus {
            user_id,
            quote_id,
            occurred_at: test_time(),
        }));
        let _ = quote.handle(&QuoteCommand::SetTax(SetTax {
            user_id,
            quote_id,
            tax_percent: Percent::from_whole(21),
            occurred_at: test_time(),
        }));
        assert_eq!(quote, before);
    }

    #[test]
    fn foreign_owner_cannot_advance() {
        let quote_id = test_quote_id();
        let mut quote = created_quote(test_user_id(), quote_id);
        add_line(&mut quote, Quantity::ONE, Money::from_minor_units(100));

        let err = quote
            .handle(&QuoteCommand::AdvanceStatus(AdvanceStatus {
                user_id: test_user_id(),
                quote_id,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation for foreign owner"),
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: any number of advances lands on the chain, capped at paid.
            #[test]
            fn repeated_advance_caps_at_paid(count in 0usize..12) {
                let user_id = test_user_id();
                let quote_id = test_quote_id();
                let mut quote = created_quote(user_id, quote_id);

                for _ in 0..count {
                    advance(&mut quote);
                }

                let expected = match count {
                    0 => QuoteStatus::Draft,
                    1 => QuoteStatus::Sent,
                    2 => QuoteStatus::Accepted,
                    3 => QuoteStatus::InProgress,
                    4 => QuoteStatus::Completed,
                    _ => QuoteStatus::Paid,
                };
                prop_assert_eq!(quote.status(), expected);
            }

            /// Property: totals stay consistent through arbitrary line edits.
            #[test]
            fn totals_identity_survives_line_edits(
                prices in prop::collection::vec(0i64..1_000_000, 1..6),
                discount_bp in 0u32..=10_000,
                tax_bp in 0u32..=30_000,
            ) {
                let user_id = test_user_id();
                let quote_id = test_quote_id();
                let mut quote = created_quote(user_id, quote_id);

                for price in &prices {
                    add_line(&mut quote, Quantity::ONE, Money::from_minor_units(*price));
                }

                let events = quote.handle(&QuoteCommand::SetDiscount(SetDiscount {
                    user_id,
                    quote_id,
                    discount_percent: Percent::from_basis_points(discount_bp),
                    occurred_at: test_time(),
                })).unwrap();
                quote.apply(&events[0]);

                let events = quote.handle(&QuoteCommand::SetTax(SetTax {
                    user_id,
                    quote_id,
                    tax_percent: Percent::from_basis_points(tax_bp),
                    occurred_at: test_time(),
                })).unwrap();
                quote.apply(&events[0]);

                let totals = quote.totals().unwrap();
                let expected = totals
                    .subtotal
                    .checked_sub(totals.discount_amount)
                    .and_then(|taxable| taxable.checked_add(totals.tax_amount))
                    .unwrap();
                prop_assert_eq!(totals.total, expected);
            }
        }
    }
}
