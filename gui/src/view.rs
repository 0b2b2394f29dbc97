use crate::Message;
use iced::widget::{
    button, column, container, pick_list, row, scrollable, text, text_input, Column, Row, Space,
};
use iced::{Color, Element, Length, Theme};
use insights_core::{ChatRole, InsightItem, PeriodDays, Priority};
use insights_workflow::render::{
    evidence_attribution, evidence_label, generation_summary, run_label,
};
use insights_workflow::{priority_tone, InsightsWorkflow, Selection, Tone};

const MUTED: Color = Color::from_rgb(0.42, 0.45, 0.5);

pub(crate) fn tone_color(tone: Tone) -> Color {
    let (r, g, b) = tone.rgb();
    Color::from_rgb8(r, g, b)
}

pub(crate) fn render(workflow: &InsightsWorkflow) -> Element<Message, Theme> {
    let mut page = Column::new()
        .spacing(16)
        .padding(20)
        .push(text("Community Insights").size(24))
        .push(controls(workflow));

    if let Some(banner) = workflow.error_banner() {
        page = page.push(text(banner).style(tone_color(Tone::Red)));
    }
    if let Some(receipt) = workflow.notice() {
        page = page.push(text(generation_summary(receipt)).style(MUTED));
    }
    if workflow.history_visible() {
        page = page.push(history_panel(workflow));
    }

    page = page
        .push(stats_row(workflow))
        .push(insight_sections(workflow))
        .push(chat_panel(workflow));

    scrollable(page).height(Length::Fill).into()
}

fn controls(workflow: &InsightsWorkflow) -> Element<Message, Theme> {
    let form = workflow.form();

    let scope_picker = pick_list(
        workflow.scope_options(),
        Some(form.scope.clone()),
        Message::ScopeSelected,
    );
    let period_picker = pick_list(
        PeriodDays::ALL.to_vec(),
        Some(form.period),
        Message::PeriodSelected,
    );

    let generate_label = if workflow.is_generating() {
        "Generating..."
    } else {
        "Generate Insights"
    };
    let mut generate = button(text(generate_label));
    if !workflow.is_generating() {
        generate = generate.on_press(Message::GeneratePressed);
    }

    let history_label = if workflow.history_visible() {
        "Hide History"
    } else {
        "History"
    };

    let mut bar = row![scope_picker, period_picker, generate]
        .spacing(10)
        .push(Space::with_width(Length::Fill))
        .push(button(text(history_label)).on_press(Message::ToggleHistory));

    if let Selection::Run(_) = workflow.target_selection() {
        bar = bar.push(button(text("View Latest")).on_press(Message::ViewLatest));
    }

    bar.into()
}

fn history_panel(workflow: &InsightsWorkflow) -> Element<Message, Theme> {
    let content: Element<Message, Theme> = match workflow.history() {
        _ if workflow.history_loading() => text("Loading history...").style(MUTED).into(),
        None => text("History unavailable").style(MUTED).into(),
        Some(history) if history.generations.is_empty() => {
            text("No previous generations").style(MUTED).into()
        }
        Some(history) => {
            let selected = match workflow.target_selection() {
                Selection::Run(id) => Some(id),
                Selection::Latest => None,
            };
            let mut list = Column::new().spacing(6);
            for run in &history.generations {
                let marker = if selected.as_deref() == Some(run.id.as_str()) {
                    "> "
                } else {
                    ""
                };
                list = list.push(
                    button(text(format!("{marker}{}", run_label(run))).size(14))
                        .on_press(Message::RunSelected(run.id.clone()))
                        .width(Length::Fill),
                );
            }
            list.into()
        }
    };

    container(column![text("Generation History").size(18), content].spacing(8))
        .padding(12)
        .width(Length::Fill)
        .into()
}

fn stats_row(workflow: &InsightsWorkflow) -> Element<Message, Theme> {
    let stats = workflow.stats();
    let mut stats_bar = Row::new()
        .spacing(24)
        .push(text(format!("{} total", stats.total)).size(16));

    for priority in [Priority::High, Priority::Medium, Priority::Low] {
        stats_bar = stats_bar.push(
            text(format!("{} {}", stats.count(priority), priority.label()))
                .size(16)
                .style(tone_color(priority_tone(priority))),
        );
    }
    stats_bar.into()
}

fn insight_sections(workflow: &InsightsWorkflow) -> Element<Message, Theme> {
    let Some(display) = workflow.display() else {
        return text("Loading insights...").style(MUTED).into();
    };

    if display.groups.is_empty() {
        let message = display
            .empty_message
            .as_deref()
            .unwrap_or("No insights yet. Generate a run to get started.");
        return text(message).style(MUTED).into();
    }

    let mut sections = Column::new().spacing(18);
    if let Some(generated_at) = display.generated_at {
        sections = sections.push(
            text(format!(
                "Generated {}",
                generated_at.format("%Y-%m-%d %H:%M UTC")
            ))
            .size(13)
            .style(MUTED),
        );
    }

    for (kind, items) in display.groups.sections() {
        let mut section = Column::new()
            .spacing(8)
            .push(text(format!("{} ({})", kind.section_title(), items.len())).size(18));
        for item in items {
            section = section.push(insight_card(workflow, item));
        }
        sections = sections.push(section);
    }
    sections.into()
}

fn insight_card<'a>(workflow: &InsightsWorkflow, item: &'a InsightItem) -> Element<'a, Message, Theme> {
    let badge = text(item.priority.label())
        .size(13)
        .style(tone_color(priority_tone(item.priority)));

    let header = row![
        text(&item.title).size(16),
        Space::with_width(Length::Fill),
        badge
    ]
    .spacing(10);

    let mut card = Column::new()
        .spacing(6)
        .push(
            button(header)
                .on_press(Message::ToggleCard(item.id.clone()))
                .width(Length::Fill),
        )
        .push(text(&item.description).size(14));

    if workflow.cards().evidence_visible(item) {
        for evidence in &item.evidence {
            let mut line = Row::new().spacing(8).push(
                button(text(evidence_label(evidence)).size(13))
                    .on_press(Message::OpenEvidence(evidence.url.clone())),
            );
            if let Some(attribution) = evidence_attribution(evidence) {
                line = line.push(text(attribution).size(12).style(MUTED));
            }
            card = card.push(line);
        }
    } else if workflow.cards().is_expanded(&item.id) {
        card = card.push(text("No linked sources").size(12).style(MUTED));
    }

    container(card).padding(10).width(Length::Fill).into()
}

fn chat_panel(workflow: &InsightsWorkflow) -> Element<Message, Theme> {
    let chat = workflow.chat();

    let mut transcript = Column::new().spacing(8);
    for turn in chat.transcript() {
        let speaker = match turn.role {
            ChatRole::User => "You",
            ChatRole::Assistant => "Assistant",
        };
        transcript = transcript.push(
            column![
                text(speaker).size(12).style(MUTED),
                text(&turn.content).size(14)
            ]
            .spacing(2),
        );
    }
    if chat.is_pending() {
        transcript = transcript.push(text("Thinking...").size(13).style(MUTED));
    }

    let mut input = text_input("Ask about these insights...", chat.draft());
    let mut send = button(text("Send"));
    if !chat.is_pending() {
        input = input
            .on_input(Message::ChatInputChanged)
            .on_submit(Message::ChatEnter);
        if !chat.draft().trim().is_empty() {
            send = send.on_press(Message::ChatSend);
        }
    }

    column![
        text("Ask the Insights").size(18),
        transcript,
        row![input, send].spacing(8)
    ]
    .spacing(10)
    .into()
}
