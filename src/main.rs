use anyhow::Context;
use gui::App;
use iced::{Application, Settings};
use insights_client::HttpInsightsClient;
use insights_core::{DashboardConfig, Scope};
use insights_workflow::GenerationForm;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = DashboardConfig::load().context("failed to load dashboard configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Insights Dashboard against {}", config.api_base_url);

    let client = HttpInsightsClient::new(&config).context("failed to build API client")?;
    let form = GenerationForm {
        scope: Scope::All,
        period: config.default_period,
    };

    let settings = Settings {
        window: iced::window::Settings {
            size: iced::Size::new(1200.0, 860.0),
            min_size: Some(iced::Size::new(800.0, 600.0)),
            ..Default::default()
        },
        ..Settings::with_flags((client, form))
    };

    DashboardApp::run(settings).context("GUI error")
}

struct DashboardApp {
    app: App,
}

impl Application for DashboardApp {
    type Message = gui::Message;
    type Theme = iced::Theme;
    type Executor = iced::executor::Default;
    type Flags = (HttpInsightsClient, GenerationForm);

    fn new((client, form): Self::Flags) -> (Self, iced::Command<Self::Message>) {
        tracing::info!("Initializing application");
        let (app, command) = App::new(client, form);
        (Self { app }, command)
    }

    fn title(&self) -> String {
        "Community Insights".to_string()
    }

    fn update(&mut self, message: Self::Message) -> iced::Command<Self::Message> {
        self.app.update(message)
    }

    fn view(&self) -> iced::Element<Self::Message> {
        self.app.view()
    }

    fn subscription(&self) -> iced::Subscription<Self::Message> {
        self.app.subscription()
    }
}
