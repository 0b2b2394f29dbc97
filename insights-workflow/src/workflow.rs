//! The insights view as a state machine.
//!
//! Operations never perform I/O. They return [`Effect`]s for the caller to
//! run (see [`crate::dispatch`]) and the resulting [`Outcome`]s are folded
//! back in with [`InsightsWorkflow::apply`], which may ask for follow-up
//! effects.

use crate::chat::{ChatSession, ComposeAction, SubmitRejected};
use crate::effect::{Effect, Outcome};
use crate::history::HistoryPanel;
use crate::render::CardExpansion;
use crate::ticket::{Ticket, TicketIssuer};
use chrono::{DateTime, Utc};
use insights_core::{
    GenerateRequest, GenerationHistory, GenerationReceipt, InsightGroups, PeriodDays, Scope,
    StatsSummary,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Which generation the displayed insights belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Latest,
    Run(String),
}

/// The insight set currently on screen. Stats are always derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedInsights {
    pub selection: Selection,
    pub groups: InsightGroups,
    pub generated_at: Option<DateTime<Utc>>,
    /// Backend explanation shown when the set is empty.
    pub empty_message: Option<String>,
}

impl DisplayedInsights {
    pub fn stats(&self) -> StatsSummary {
        self.groups.stats()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationPhase {
    Idle,
    Generating {
        ticket: Ticket,
        request: GenerateRequest,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationForm {
    pub scope: Scope,
    pub period: PeriodDays,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateRejected {
    #[error("a generation is already in progress")]
    InFlight,

    #[error("the view has been closed")]
    Closed,
}

#[derive(Debug)]
pub struct InsightsWorkflow {
    tickets: TicketIssuer,
    closed: bool,
    display: Option<DisplayedInsights>,
    /// Only the most recently requested display load may land.
    display_ticket: Option<(Ticket, Selection)>,
    phase: GenerationPhase,
    form: GenerationForm,
    history: HistoryPanel,
    error_banner: Option<String>,
    notice: Option<GenerationReceipt>,
    chat: ChatSession,
    cards: CardExpansion,
}

impl Default for InsightsWorkflow {
    fn default() -> Self {
        Self::new(GenerationForm::default())
    }
}

impl InsightsWorkflow {
    pub fn new(form: GenerationForm) -> Self {
        Self {
            tickets: TicketIssuer::new(),
            closed: false,
            display: None,
            display_ticket: None,
            phase: GenerationPhase::Idle,
            form,
            history: HistoryPanel::new(),
            error_banner: None,
            notice: None,
            chat: ChatSession::new(),
            cards: CardExpansion::default(),
        }
    }

    /// Initial effects when the view appears.
    pub fn mount(&mut self) -> Vec<Effect> {
        self.load_latest().into_iter().collect()
    }

    // ---- accessors ----

    pub fn display(&self) -> Option<&DisplayedInsights> {
        self.display.as_ref()
    }

    pub fn stats(&self) -> StatsSummary {
        self.display.as_ref().map(|d| d.stats()).unwrap_or_default()
    }

    pub fn selection(&self) -> Selection {
        self.display
            .as_ref()
            .map(|d| d.selection.clone())
            .unwrap_or(Selection::Latest)
    }

    /// The selection a pending display load will switch to, if any.
    pub fn pending_selection(&self) -> Option<&Selection> {
        self.display_ticket.as_ref().map(|(_, selection)| selection)
    }

    /// What the view is heading to: the pending selection if a load is in
    /// flight, else the displayed one.
    pub fn target_selection(&self) -> Selection {
        self.pending_selection()
            .cloned()
            .unwrap_or_else(|| self.selection())
    }

    pub fn phase(&self) -> &GenerationPhase {
        &self.phase
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.phase, GenerationPhase::Generating { .. })
    }

    pub fn form(&self) -> &GenerationForm {
        &self.form
    }

    pub fn error_banner(&self) -> Option<&str> {
        self.error_banner.as_deref()
    }

    pub fn notice(&self) -> Option<&GenerationReceipt> {
        self.notice.as_ref()
    }

    pub fn history_visible(&self) -> bool {
        self.history.is_visible()
    }

    pub fn history_loading(&self) -> bool {
        self.history.is_loading()
    }

    pub fn history(&self) -> Option<&GenerationHistory> {
        self.history.current()
    }

    /// Scope choices for the form; the current scope is always included.
    pub fn scope_options(&self) -> Vec<Scope> {
        let mut scopes = self
            .history
            .current()
            .map(GenerationHistory::scopes)
            .unwrap_or_else(|| vec![Scope::All]);
        if !scopes.contains(&self.form.scope) {
            scopes.push(self.form.scope.clone());
        }
        scopes
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn cards(&self) -> &CardExpansion {
        &self.cards
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ---- operations ----

    pub fn set_scope(&mut self, scope: Scope) {
        self.form.scope = scope;
    }

    pub fn set_period(&mut self, period: PeriodDays) {
        self.form.period = period;
    }

    /// Fetches the unscoped current insight set.
    pub fn load_latest(&mut self) -> Option<Effect> {
        let ticket = self.issue_display(Selection::Latest)?;
        Some(Effect::LoadLatest { ticket })
    }

    /// Fetches one historical generation for display.
    pub fn load_run(&mut self, generation_id: impl Into<String>) -> Option<Effect> {
        let generation_id = generation_id.into();
        let ticket = self.issue_display(Selection::Run(generation_id.clone()))?;
        Some(Effect::LoadRun {
            ticket,
            generation_id,
        })
    }

    /// Drops the run selection and refetches the latest set. A latest load
    /// already in flight is reused rather than issued again.
    pub fn view_latest(&mut self) -> Option<Effect> {
        if self.pending_selection() == Some(&Selection::Latest) {
            debug!("Latest insights already loading");
            return None;
        }
        self.load_latest()
    }

    /// Starts a generation with the form's scope and period.
    pub fn generate(&mut self) -> Result<Effect, GenerateRejected> {
        let (scope, period) = (self.form.scope.clone(), self.form.period);
        self.generate_with(&scope, period)
    }

    pub fn generate_with(
        &mut self,
        scope: &Scope,
        period: PeriodDays,
    ) -> Result<Effect, GenerateRejected> {
        if self.closed {
            return Err(GenerateRejected::Closed);
        }
        if self.is_generating() {
            warn!("Ignoring generate request: a generation is already in progress");
            return Err(GenerateRejected::InFlight);
        }

        self.error_banner = None;
        self.notice = None;

        let request = GenerateRequest::new(scope, period);
        let ticket = self.tickets.issue();
        self.phase = GenerationPhase::Generating {
            ticket,
            request: request.clone(),
        };
        info!("Generating insights for {} over {} days", scope, period.days());
        Ok(Effect::Generate { ticket, request })
    }

    pub fn toggle_history(&mut self) -> Option<Effect> {
        if self.closed {
            return None;
        }
        self.history.toggle(&mut self.tickets)
    }

    pub fn toggle_card(&mut self, insight_id: &str) {
        self.cards.toggle(insight_id);
    }

    pub fn set_chat_draft(&mut self, text: impl Into<String>) {
        self.chat.set_draft(text);
    }

    pub fn submit_chat(&mut self) -> Result<Effect, SubmitRejected> {
        if self.closed {
            return Err(SubmitRejected::Closed);
        }
        self.chat.submit(&mut self.tickets)
    }

    /// Handles Enter in the composer: either submits or adds a line break.
    pub fn chat_key(&mut self, action: ComposeAction) -> Option<Effect> {
        match action {
            ComposeAction::Newline => {
                self.chat.insert_newline();
                None
            }
            ComposeAction::Submit => match self.submit_chat() {
                Ok(effect) => Some(effect),
                Err(rejected) => {
                    debug!("Chat submit ignored: {}", rejected);
                    None
                }
            },
        }
    }

    /// Cancels everything in flight. Late responses become no-ops and no
    /// further requests are issued.
    pub fn teardown(&mut self) {
        if !self.closed {
            debug!("Tearing down insights workflow");
        }
        self.closed = true;
        self.tickets.cancel_all();
    }

    /// Folds a backend answer into the view state.
    pub fn apply(&mut self, outcome: Outcome) -> Vec<Effect> {
        if self.closed || !self.tickets.is_live(outcome.ticket()) {
            debug!("Dropping response that arrived after cancellation");
            return Vec::new();
        }

        match outcome {
            Outcome::Latest { ticket, result } => {
                if self.take_display_ticket(ticket) {
                    match result {
                        Ok(current) => self.replace_display(DisplayedInsights {
                            selection: Selection::Latest,
                            groups: current.groups,
                            generated_at: current.generated_at,
                            empty_message: current.message,
                        }),
                        Err(failure) => {
                            warn!("Keeping previous insights; latest load failed: {}", failure)
                        }
                    }
                }
                Vec::new()
            }
            Outcome::Run {
                ticket,
                generation_id,
                result,
            } => {
                if self.take_display_ticket(ticket) {
                    match result {
                        Ok(run) => self.replace_display(DisplayedInsights {
                            selection: Selection::Run(run.generation_id),
                            groups: run.groups,
                            generated_at: run.generated_at,
                            empty_message: None,
                        }),
                        Err(failure) => warn!(
                            "Keeping previous insights; generation {} failed to load: {}",
                            generation_id, failure
                        ),
                    }
                }
                Vec::new()
            }
            Outcome::History { ticket, result } => {
                self.history.apply(ticket, result);
                Vec::new()
            }
            Outcome::Generated { ticket, result } => self.finish_generation(ticket, result),
            Outcome::ChatReply { ticket, result } => {
                self.chat.apply_reply(ticket, result);
                Vec::new()
            }
        }
    }

    fn finish_generation(
        &mut self,
        ticket: Ticket,
        result: crate::effect::Fetched<GenerationReceipt>,
    ) -> Vec<Effect> {
        match &self.phase {
            GenerationPhase::Generating { ticket: pending, .. } if *pending == ticket => {}
            _ => {
                debug!("Dropping superseded generation response");
                return Vec::new();
            }
        }
        self.phase = GenerationPhase::Idle;

        match result {
            Ok(receipt) => {
                let mut effects = Vec::new();
                match receipt.generation_id.clone() {
                    Some(id) => effects.extend(self.load_run(id)),
                    None => {
                        debug!("Generation returned no id; reloading latest insights");
                        effects.extend(self.load_latest());
                    }
                }
                effects.extend(self.history.invalidate(&mut self.tickets));
                self.notice = Some(receipt);
                effects
            }
            Err(failure) => {
                self.error_banner = Some(failure.message);
                Vec::new()
            }
        }
    }

    fn issue_display(&mut self, selection: Selection) -> Option<Ticket> {
        if self.closed {
            return None;
        }
        let ticket = self.tickets.issue();
        self.display_ticket = Some((ticket, selection));
        Some(ticket)
    }

    fn take_display_ticket(&mut self, ticket: Ticket) -> bool {
        match &self.display_ticket {
            Some((pending, _)) if *pending == ticket => {
                self.display_ticket = None;
                true
            }
            _ => {
                debug!("Dropping superseded display response");
                false
            }
        }
    }

    fn replace_display(&mut self, shown: DisplayedInsights) {
        debug!(
            "Displaying {} insights ({:?})",
            shown.groups.len(),
            shown.selection
        );
        self.cards.clear();
        self.display = Some(shown);
    }
}
