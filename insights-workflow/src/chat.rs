use crate::effect::{Effect, Fetched};
use crate::ticket::{Ticket, TicketIssuer};
use insights_core::{ChatRequest, ChatTurn};
use thiserror::Error;
use tracing::{debug, warn};

/// Shown in place of the assistant's reply when a turn fails or comes back empty.
pub const CHAT_FALLBACK_REPLY: &str =
    "Sorry, I encountered an error processing your request. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAction {
    Submit,
    Newline,
}

/// Enter submits; Shift+Enter inserts a line break.
pub fn compose_action(shift_held: bool) -> ComposeAction {
    if shift_held {
        ComposeAction::Newline
    } else {
        ComposeAction::Submit
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("a reply is still pending")]
    Busy,

    #[error("message is empty")]
    Empty,

    #[error("the view has been closed")]
    Closed,
}

/// Turn-alternating chat over the insight corpus. At most one turn is in
/// flight; the transcript is append-only and lives only in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSession {
    transcript: Vec<ChatTurn>,
    draft: String,
    pending: Option<Ticket>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Input is frozen while a reply is pending.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        if self.pending.is_none() {
            self.draft = text.into();
        }
    }

    pub fn insert_newline(&mut self) {
        if self.pending.is_none() {
            self.draft.push('\n');
        }
    }

    /// Appends the user turn right away and returns the request to send.
    pub fn submit(&mut self, tickets: &mut TicketIssuer) -> Result<Effect, SubmitRejected> {
        if self.pending.is_some() {
            return Err(SubmitRejected::Busy);
        }

        let message = self.draft.trim();
        if message.is_empty() {
            return Err(SubmitRejected::Empty);
        }
        let message = message.to_string();

        let request = ChatRequest {
            message: message.clone(),
            history: self.transcript.clone(),
        };
        self.transcript.push(ChatTurn::user(message));
        self.draft.clear();

        let ticket = tickets.issue();
        self.pending = Some(ticket);
        debug!(
            "Chat turn submitted ({} turns in transcript)",
            self.transcript.len()
        );
        Ok(Effect::Chat { ticket, request })
    }

    /// Appends exactly one assistant turn for the pending request.
    pub fn apply_reply(&mut self, ticket: Ticket, result: Fetched<String>) -> bool {
        if self.pending != Some(ticket) {
            debug!("Dropping chat reply for a request that is no longer pending");
            return false;
        }
        self.pending = None;

        let reply = match result {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Chat service returned an empty reply");
                CHAT_FALLBACK_REPLY.to_string()
            }
            Err(failure) => {
                warn!("Chat turn failed: {}", failure);
                CHAT_FALLBACK_REPLY.to_string()
            }
        };
        self.transcript.push(ChatTurn::assistant(reply));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::{ChatRole, Failure};

    fn submit_ticket(chat: &mut ChatSession, tickets: &mut TicketIssuer) -> (Ticket, ChatRequest) {
        match chat.submit(tickets) {
            Ok(Effect::Chat { ticket, request }) => (ticket, request),
            other => panic!("Expected a chat effect, got {other:?}"),
        }
    }

    #[test]
    fn test_compose_action() {
        assert_eq!(compose_action(false), ComposeAction::Submit);
        assert_eq!(compose_action(true), ComposeAction::Newline);
    }

    #[test]
    fn test_blank_input_is_not_submitted() {
        let mut tickets = TicketIssuer::new();
        let mut chat = ChatSession::new();

        assert_eq!(chat.submit(&mut tickets), Err(SubmitRejected::Empty));
        chat.set_draft("   \n\t ");
        assert_eq!(chat.submit(&mut tickets), Err(SubmitRejected::Empty));
        assert!(chat.transcript().is_empty());
        assert!(!chat.is_pending());
    }

    #[test]
    fn test_submit_is_optimistic_and_carries_prior_history() {
        let mut tickets = TicketIssuer::new();
        let mut chat = ChatSession::new();

        chat.set_draft("  What hurts most?  ");
        let (ticket, request) = submit_ticket(&mut chat, &mut tickets);
        assert_eq!(request.message, "What hurts most?");
        assert!(request.history.is_empty());
        assert_eq!(chat.transcript().len(), 1);
        assert_eq!(chat.draft(), "");

        assert!(chat.apply_reply(ticket, Ok("Slow publishing.".to_string())));

        chat.set_draft("Why?");
        let (_, request) = submit_ticket(&mut chat, &mut tickets);
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.history[1].role, ChatRole::Assistant);
        assert_eq!(request.message, "Why?");
    }

    #[test]
    fn test_second_submit_while_pending_is_rejected() {
        let mut tickets = TicketIssuer::new();
        let mut chat = ChatSession::new();

        chat.set_draft("first");
        submit_ticket(&mut chat, &mut tickets);

        chat.set_draft("second");
        assert_eq!(chat.draft(), "");
        chat.insert_newline();
        assert_eq!(chat.draft(), "");
        assert_eq!(chat.submit(&mut tickets), Err(SubmitRejected::Busy));
        assert_eq!(chat.transcript().len(), 1);
    }

    #[test]
    fn test_failures_and_empty_replies_become_apology() {
        let mut tickets = TicketIssuer::new();
        let mut chat = ChatSession::new();

        chat.set_draft("one");
        let (ticket, _) = submit_ticket(&mut chat, &mut tickets);
        chat.apply_reply(ticket, Err(Failure::new("NETWORK", "connection reset")));

        chat.set_draft("two");
        let (ticket, _) = submit_ticket(&mut chat, &mut tickets);
        chat.apply_reply(ticket, Ok("  ".to_string()));

        let transcript = chat.transcript();
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[1].content, CHAT_FALLBACK_REPLY);
        assert_eq!(transcript[3].content, CHAT_FALLBACK_REPLY);
        assert!(!transcript[1].content.contains("connection reset"));
    }

    #[test]
    fn test_unknown_ticket_is_ignored() {
        let mut tickets = TicketIssuer::new();
        let mut chat = ChatSession::new();
        let stray = tickets.issue();

        chat.set_draft("hello");
        let (ticket, _) = submit_ticket(&mut chat, &mut tickets);

        assert!(!chat.apply_reply(stray, Ok("wrong".to_string())));
        assert!(chat.is_pending());
        assert!(chat.apply_reply(ticket, Ok("right".to_string())));
        assert!(!chat.apply_reply(ticket, Ok("again".to_string())));
        assert_eq!(chat.transcript().len(), 2);
    }

    #[test]
    fn test_newline_is_inserted_into_draft() {
        let mut chat = ChatSession::new();
        chat.set_draft("line one");
        chat.insert_newline();
        assert_eq!(chat.draft(), "line one\n");
    }
}
