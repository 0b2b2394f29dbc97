use crate::ticket::Ticket;
use insights_client::InsightsBackend;
use insights_core::{
    ChatRequest, CoreError, CurrentInsights, ErrorReporter, Failure, GenerateRequest,
    GenerationHistory, GenerationReceipt, RunInsights,
};
use tracing::debug;

/// Success-with-data or failure-with-reason, as seen by the view.
pub type Fetched<T> = Result<T, Failure>;

/// A backend call the workflow wants performed.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadLatest {
        ticket: Ticket,
    },
    LoadHistory {
        ticket: Ticket,
    },
    LoadRun {
        ticket: Ticket,
        generation_id: String,
    },
    Generate {
        ticket: Ticket,
        request: GenerateRequest,
    },
    Chat {
        ticket: Ticket,
        request: ChatRequest,
    },
}

impl Effect {
    pub fn ticket(&self) -> Ticket {
        match self {
            Effect::LoadLatest { ticket }
            | Effect::LoadHistory { ticket }
            | Effect::LoadRun { ticket, .. }
            | Effect::Generate { ticket, .. }
            | Effect::Chat { ticket, .. } => *ticket,
        }
    }
}

/// The answer to an [`Effect`], carrying the same ticket.
#[derive(Debug, Clone)]
pub enum Outcome {
    Latest {
        ticket: Ticket,
        result: Fetched<CurrentInsights>,
    },
    History {
        ticket: Ticket,
        result: Fetched<GenerationHistory>,
    },
    Run {
        ticket: Ticket,
        generation_id: String,
        result: Fetched<RunInsights>,
    },
    Generated {
        ticket: Ticket,
        result: Fetched<GenerationReceipt>,
    },
    ChatReply {
        ticket: Ticket,
        result: Fetched<String>,
    },
}

impl Outcome {
    pub fn ticket(&self) -> Ticket {
        match self {
            Outcome::Latest { ticket, .. }
            | Outcome::History { ticket, .. }
            | Outcome::Run { ticket, .. }
            | Outcome::Generated { ticket, .. }
            | Outcome::ChatReply { ticket, .. } => *ticket,
        }
    }
}

/// Performs one effect against the backend.
///
/// Failures on read calls are only logged as warnings; generation and chat
/// failures are logged as errors. Either way the view receives a [`Failure`].
pub async fn dispatch<B: InsightsBackend>(backend: &B, effect: Effect) -> Outcome {
    debug!("Dispatching {:?}", effect);
    let reporter = ErrorReporter::new();
    let read_failure = |e: CoreError| {
        reporter.report_warning(&e);
        Failure::from(&e)
    };
    let write_failure = |e: CoreError| {
        reporter.report_error(&e);
        Failure::from(&e)
    };

    match effect {
        Effect::LoadLatest { ticket } => Outcome::Latest {
            ticket,
            result: backend.fetch_current().await.map_err(read_failure),
        },
        Effect::LoadHistory { ticket } => Outcome::History {
            ticket,
            result: backend.fetch_history().await.map_err(read_failure),
        },
        Effect::LoadRun {
            ticket,
            generation_id,
        } => {
            let result = backend.fetch_run(&generation_id).await.map_err(read_failure);
            Outcome::Run {
                ticket,
                generation_id,
                result,
            }
        }
        Effect::Generate { ticket, request } => Outcome::Generated {
            ticket,
            result: backend.generate(&request).await.map_err(write_failure),
        },
        Effect::Chat { ticket, request } => Outcome::ChatReply {
            ticket,
            result: backend.chat(&request).await.map_err(write_failure),
        },
    }
}
