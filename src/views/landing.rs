use crate::landing::{TYPING_DELAY, Typewriter};
use crate::ticker::repeat_every;
use crate::ui::Screen;
use dioxus::prelude::*;

#[component]
pub fn LandingView(screen: Signal<Screen>) -> Element {
    let mut screen = screen;
    let writer = use_signal(Typewriter::default);

    // Component-scoped, so unmounting cancels the remaining ticks.
    use_future(move || async move {
        let mut writer = writer;
        repeat_every(TYPING_DELAY, move || writer.with_mut(|w| w.advance())).await;
    });

    let banner = writer.read().visible_text().to_string();
    let typing = writer.read().is_typing();

    rsx! {
        div { class: "landing",
            div { class: "landing-card",
                h1 {
                    class: if typing { "banner typing" } else { "banner" },
                    "{banner}"
                }
                p { class: "text-muted",
                    "Upload PDF documents, then ask questions answered from their contents."
                }
                // Never disabled: leaving mid-animation is allowed.
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    onclick: move |_| screen.set(Screen::Conversation),
                    "Get started"
                }
            }
        }
    }
}
