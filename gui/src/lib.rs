mod view;

use iced::keyboard::Modifiers;
use iced::{event, keyboard, Command, Element, Event, Subscription, Theme};
use insights_client::HttpInsightsClient;
use insights_core::{PeriodDays, Scope};
use insights_workflow::{
    compose_action, dispatch, Effect, GenerationForm, InsightsWorkflow, Outcome,
};
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
pub enum Message {
    Backend(Outcome),
    ScopeSelected(Scope),
    PeriodSelected(PeriodDays),
    GeneratePressed,
    ViewLatest,
    ToggleHistory,
    RunSelected(String),
    ToggleCard(String),
    OpenEvidence(String),
    ChatInputChanged(String),
    /// Enter pressed in the composer; Shift decides submit vs newline.
    ChatEnter,
    ChatSend,
    ModifiersChanged(Modifiers),
}

pub struct App {
    client: HttpInsightsClient,
    workflow: InsightsWorkflow,
    shift_held: bool,
}

impl App {
    pub fn new(client: HttpInsightsClient, form: GenerationForm) -> (Self, Command<Message>) {
        let mut app = Self {
            client,
            workflow: InsightsWorkflow::new(form),
            shift_held: false,
        };
        let effects = app.workflow.mount();
        let command = app.perform(effects);
        (app, command)
    }

    pub fn workflow(&self) -> &InsightsWorkflow {
        &self.workflow
    }

    pub fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::Backend(outcome) => {
                let follow_up = self.workflow.apply(outcome);
                self.perform(follow_up)
            }
            Message::ScopeSelected(scope) => {
                self.workflow.set_scope(scope);
                Command::none()
            }
            Message::PeriodSelected(period) => {
                self.workflow.set_period(period);
                Command::none()
            }
            Message::GeneratePressed => match self.workflow.generate() {
                Ok(effect) => self.perform([effect]),
                Err(rejected) => {
                    debug!("Generate ignored: {}", rejected);
                    Command::none()
                }
            },
            Message::ViewLatest => {
                let effect = self.workflow.view_latest();
                self.perform(effect)
            }
            Message::ToggleHistory => {
                let effect = self.workflow.toggle_history();
                self.perform(effect)
            }
            Message::RunSelected(generation_id) => {
                let effect = self.workflow.load_run(generation_id);
                self.perform(effect)
            }
            Message::ToggleCard(insight_id) => {
                self.workflow.toggle_card(&insight_id);
                Command::none()
            }
            Message::OpenEvidence(url) => {
                if let Err(e) = open::that(&url) {
                    error!("Failed to open {}: {}", url, e);
                }
                Command::none()
            }
            Message::ChatInputChanged(text) => {
                self.workflow.set_chat_draft(text);
                Command::none()
            }
            Message::ChatEnter => {
                let effect = self.workflow.chat_key(compose_action(self.shift_held));
                self.perform(effect)
            }
            Message::ChatSend => match self.workflow.submit_chat() {
                Ok(effect) => self.perform([effect]),
                Err(rejected) => {
                    debug!("Chat submit ignored: {}", rejected);
                    Command::none()
                }
            },
            Message::ModifiersChanged(modifiers) => {
                self.shift_held = modifiers.shift();
                Command::none()
            }
        }
    }

    pub fn view(&self) -> Element<Message, Theme> {
        view::render(&self.workflow)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status| match event {
            Event::Keyboard(keyboard::Event::ModifiersChanged(modifiers)) => {
                Some(Message::ModifiersChanged(modifiers))
            }
            _ => None,
        })
    }

    /// Runs effects on the executor; each answer comes back as `Message::Backend`.
    fn perform(&self, effects: impl IntoIterator<Item = Effect>) -> Command<Message> {
        let commands: Vec<Command<Message>> = effects
            .into_iter()
            .map(|effect| {
                let client = self.client.clone();
                Command::perform(
                    async move { dispatch(&client, effect).await },
                    Message::Backend,
                )
            })
            .collect();

        if commands.is_empty() {
            Command::none()
        } else {
            Command::batch(commands)
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if self.workflow.is_generating() {
            warn!("Closing while a generation is still running; its result will be discarded");
        }
        self.workflow.teardown();
        self.client.log_metrics_summary();
    }
}
