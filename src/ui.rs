use crate::api::RagClient;
use crate::config::{ApiConfig, DEFAULT_API_URL};
use crate::views::{ConversationView, LandingView};
use dioxus::prelude::*;

const MAIN_CSS: Asset = asset!("/assets/main.css");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Conversation,
}

#[component]
pub fn App() -> Element {
    let screen = use_signal(|| Screen::Landing);
    use_context_provider(|| RagClient::new(load_api_config()));

    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        if screen() == Screen::Landing {
            LandingView { screen }
        } else {
            ConversationView {}
        }
    }
}

fn load_api_config() -> ApiConfig {
    match ApiConfig::from_env() {
        Ok(config) => {
            tracing::info!(base_url = config.base_url(), "backend configured");
            config
        }
        Err(err) => {
            tracing::error!("{err:#}; falling back to {DEFAULT_API_URL}");
            ApiConfig::default()
        }
    }
}
