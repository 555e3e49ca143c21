use crate::api::RagClient;
use crate::conversation::{
    ConversationState, Notice, NoticeLevel, run_query, run_rebuild, run_upload,
};
use crate::format::{
    format_elapsed, format_turn_timestamp, markdown_to_html, scroll_to_bottom_script,
    source_label,
};
use crate::types::{ChatTurn, SelectedFile};
use dioxus::events::Key;
use dioxus::prelude::*;
use std::path::Path;

const CHAT_LIST_ID: &str = "chat-list";
const CLIPBOARD_AVAILABLE: bool = cfg!(any(feature = "web", feature = "desktop", feature = "mobile"));

fn send_query(state: Signal<ConversationState>, client: RagClient) {
    spawn(async move {
        run_query(state, &client).await;
    });
}

fn display_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
        .to_string()
}

#[component]
pub fn ConversationView() -> Element {
    let client = use_context::<RagClient>();
    let mut state = use_signal(ConversationState::new);

    let turns = state.read().transcript().to_vec();
    let notices = state.read().notices().to_vec();
    let input = state.read().input().to_string();
    let querying = state.read().is_querying();
    let uploading = state.read().is_uploading();
    let rebuilding = state.read().is_rebuilding_index();
    let progress = state.read().upload_progress();
    let can_send = state.read().can_send();
    let can_upload = state.read().can_upload();
    let selected_name = state.read().selected_file().map(|file| file.name.clone());

    // New turns (the question, then its answer) pull the list to the bottom.
    let turn_count = use_memo(move || state.read().transcript().len());
    use_effect(move || {
        if turn_count() > 0 {
            let _ = document::eval(&scroll_to_bottom_script(CHAT_LIST_ID));
        }
    });

    rsx! {
        div { class: "main-container",
            div { class: "header",
                h2 { class: "header-title", "PDF Question Answering" }
                div { class: "header-actions",
                    button {
                        class: "btn", r#type: "button",
                        disabled: rebuilding,
                        onclick: {
                            let client = client.clone();
                            move |_| {
                                let client = client.clone();
                                spawn(async move {
                                    run_rebuild(state, &client).await;
                                });
                            }
                        },
                        if rebuilding { "Rebuilding…" } else { "Rebuild index" }
                    }
                    button {
                        class: "btn btn-ghost", r#type: "button",
                        disabled: turns.is_empty(),
                        onclick: move |_| state.with_mut(|s| s.clear_chat()),
                        "Clear chat"
                    }
                }
            }

            div { class: "upload-panel",
                input {
                    r#type: "file",
                    accept: ".pdf,application/pdf",
                    disabled: uploading,
                    onchange: move |evt: FormEvent| async move {
                        let mut state = state;
                        let Some(engine) = evt.files() else {
                            return;
                        };
                        let Some(path) = engine.files().into_iter().next() else {
                            return;
                        };
                        let name = display_file_name(&path);
                        let Some(bytes) = engine.read_file(&path).await else {
                            tracing::warn!(file = %name, "picked file could not be read");
                            state.with_mut(|s| s.reject_unreadable(name));
                            return;
                        };
                        let file = SelectedFile::new(name, None, bytes);
                        if let Err(err) = state.with_mut(|s| s.select_file(file)) {
                            tracing::debug!("rejected selection: {err}");
                        }
                    },
                }
                if let Some(name) = selected_name {
                    span { class: "selected-file", "{name}" }
                }
                button {
                    class: "btn btn-primary", r#type: "button",
                    disabled: !can_upload,
                    onclick: {
                        let client = client.clone();
                        move |_| {
                            let client = client.clone();
                            spawn(async move {
                                run_upload(state, &client).await;
                            });
                        }
                    },
                    if uploading { "Uploading…" } else { "Upload" }
                }
                if uploading || progress > 0 {
                    div { class: "progress",
                        div { class: "progress-fill", style: "width: {progress}%;" }
                    }
                }
            }

            div { class: "chat-wrap",
                div { id: CHAT_LIST_ID, class: "chat-list",
                    if turns.is_empty() {
                        p { class: "text-muted empty-chat",
                            "Ask a question about your uploaded documents."
                        }
                    }
                    for (i, turn) in turns.iter().enumerate() {
                        TurnRow { key: "{i}", turn: turn.clone() }
                    }
                    if querying {
                        div { class: "message-row assistant",
                            div { class: "shimmer-line",
                                span { class: "shimmer-text", "Searching documents…" }
                            }
                        }
                    }
                }
            }

            form { class: "composer no-divider",
                div { class: "composer-inner",
                    div { class: "hstack", style: "gap: 0.5rem; width: 100%; align-items: flex-end;",
                        textarea {
                            rows: "1", placeholder: "Ask a question about your documents",
                            value: "{input}",
                            oninput: move |ev| state.with_mut(|s| s.set_input(ev.value())),
                            onkeydown: {
                                let client = client.clone();
                                move |ev: KeyboardEvent| {
                                    if ev.key() == Key::Enter && !ev.modifiers().shift() {
                                        ev.prevent_default();
                                        send_query(state, client.clone());
                                    }
                                }
                            },
                            disabled: querying, autofocus: true,
                        }
                        button {
                            class: "btn btn-primary", r#type: "button",
                            disabled: !can_send,
                            onclick: {
                                let client = client.clone();
                                move |_| send_query(state, client.clone())
                            },
                            "Send"
                        }
                    }
                }
            }

            div { class: "toast-stack",
                for notice in notices.iter() {
                    Toast { key: "{notice.id}", notice: notice.clone(), state }
                }
            }
        }
    }
}

#[component]
fn TurnRow(turn: ChatTurn) -> Element {
    let side = if turn.is_from_user { "user" } else { "assistant" };
    let timestamp = format_turn_timestamp(turn.timestamp);
    let elapsed = turn.elapsed_ms.map(format_elapsed);

    rsx! {
        div { class: "message-row {side}",
            div { class: "message-stack",
                div { class: "bubble {side}",
                    if turn.is_from_user {
                        "{turn.text}"
                    } else {
                        AnswerBubble { text: turn.text.clone() }
                    }
                }
                if !turn.sources.is_empty() {
                    details { class: "sources",
                        summary { "Sources ({turn.sources.len()})" }
                        ul {
                            for source in turn.sources.iter() {
                                li { class: "source-item",
                                    span { class: "source-label", "{source_label(source)}" }
                                    if let Some(preview) = source.content_preview.as_ref() {
                                        p { class: "source-preview", "{preview}" }
                                    }
                                }
                            }
                        }
                    }
                }
                div { class: if turn.is_from_user { "message-meta align-end" } else { "message-meta align-start" },
                    if let Some(ts) = timestamp {
                        span { class: "message-timestamp", "{ts}" }
                    }
                    if let Some(elapsed) = elapsed {
                        span { class: "message-metrics", "{elapsed}" }
                    }
                }
            }
        }
    }
}

#[component]
fn AnswerBubble(text: String) -> Element {
    let content_html = markdown_to_html(&text);
    let copy_payload = text.clone();
    let on_copy = move |_| {
        spawn(copy_to_clipboard(copy_payload.clone()));
    };

    rsx! {
        if CLIPBOARD_AVAILABLE {
            div { class: "bubble-controls",
                button { class: "action-btn", title: "Copy answer", onclick: on_copy, "Copy" }
            }
        }
        div { class: "md", dangerous_inner_html: "{content_html}" }
    }
}

#[cfg(any(feature = "desktop", feature = "mobile"))]
async fn copy_to_clipboard(text: String) {
    match arboard::Clipboard::new() {
        Ok(mut cb) => {
            if let Err(err) = cb.set_text(text) {
                tracing::warn!("clipboard write failed: {err}");
            }
        }
        Err(err) => tracing::warn!("clipboard unavailable: {err}"),
    }
}

#[cfg(not(any(feature = "desktop", feature = "mobile")))]
async fn copy_to_clipboard(text: String) {
    let script = crate::format::clipboard_script(&text);
    if let Err(err) = document::eval(&script).await {
        tracing::warn!("clipboard write failed: {err}");
    }
}

#[component]
fn Toast(notice: Notice, state: Signal<ConversationState>) -> Element {
    let mut state = state;
    let id = notice.id;
    let duration = notice.duration;
    use_hook(move || {
        spawn(async move {
            let mut state = state;
            tokio::time::sleep(duration).await;
            state.with_mut(|s| s.dismiss_notice(id));
        })
    });

    let level = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "success",
        NoticeLevel::Error => "error",
    };

    rsx! {
        div { class: "toast {level}", role: "status",
            span { class: "toast-message", "{notice.message}" }
            button {
                class: "action-btn", r#type: "button",
                onclick: move |_| state.with_mut(|s| s.dismiss_notice(id)),
                "Close"
            }
        }
    }
}
