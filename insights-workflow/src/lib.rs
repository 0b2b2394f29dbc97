//! Client-side workflow for the community insights panel: loading the
//! latest or a historical insight set, triggering generations, browsing
//! history and chatting over the corpus.

pub mod chat;
pub mod effect;
pub mod history;
pub mod render;
pub mod ticket;
pub mod workflow;

pub use chat::{compose_action, ChatSession, ComposeAction, SubmitRejected, CHAT_FALLBACK_REPLY};
pub use effect::{dispatch, Effect, Fetched, Outcome};
pub use history::HistoryPanel;
pub use render::{priority_tone, CardExpansion, Tone};
pub use ticket::{Ticket, TicketIssuer};
pub use workflow::{
    DisplayedInsights, GenerateRejected, GenerationForm, GenerationPhase, InsightsWorkflow,
    Selection,
};
