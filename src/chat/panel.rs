use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use super::history::{HistorySubscription, HistoryUpdate};
use super::message::{
    is_hidden_prompt, reconcile, ChatMessage, ChatRole, DeliveryState, DisplayMessage,
    MessageComponent, PendingMessage,
};
use super::stream::{read_events, StreamEvent};
use crate::api;
use crate::charts::{ChartData, DynamicChart};
use crate::Session;

const DEFAULT_CHAT_ID: &str = "default";
const SIGN_IN_NOTICE: &str = "You must be signed in to chat.";

#[derive(Debug, PartialEq, Eq)]
pub enum SendBlock {
    EmptyMessage,
    NotSignedIn,
}

/// Send preconditions, applied before anything touches local state or the
/// network. Returns the trimmed message on success.
pub fn validate_send(input: &str, signed_in: bool) -> Result<String, SendBlock> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SendBlock::EmptyMessage);
    }
    if !signed_in {
        return Err(SendBlock::NotSignedIn);
    }
    Ok(trimmed.to_string())
}

#[derive(Clone, PartialEq)]
struct SendRequest {
    text: String,
    hidden: bool,
    /// client_ref of a failed entry this send replaces (retry)
    replace: Option<String>,
}

#[derive(Properties, PartialEq)]
pub struct ChatPanelProps {
    /// Sent once, hidden, after mount — used by the tool runner to seed
    /// the analysis conversation.
    #[prop_or_default]
    pub seed_prompt: Option<String>,
    /// Prefills the input without sending (e.g. "Run Loan Calculator").
    #[prop_or_default]
    pub initial_input: Option<String>,
    /// Receives side-channel stream events such as "expense_added".
    #[prop_or_default]
    pub on_action: Option<Callback<String>>,
    /// Compact header variant used inside the tool runner.
    #[prop_or(false)]
    pub compact: bool,
}

#[function_component(ChatPanel)]
pub fn chat_panel(props: &ChatPanelProps) -> Html {
    let session = use_context::<UseStateHandle<Session>>();
    let token = session.as_ref().and_then(|s| s.token.clone());
    let signed_in = token.is_some();

    let seeded = props.seed_prompt.is_some();
    let chat_id = use_state(|| {
        if seeded {
            Uuid::new_v4().to_string()
        } else {
            DEFAULT_CHAT_ID.to_string()
        }
    });
    let history = use_state(Vec::<ChatMessage>::new);
    let history_error = use_state(|| None::<String>);
    let pending = use_state(Vec::<PendingMessage>::new);
    let input = use_state(String::new);
    let sending = use_state(|| false);
    let status_log = use_state(|| None::<String>);
    let inline_error = use_state(|| None::<String>);
    // conversation id the panel currently owns; in-flight sends compare
    // their tag against this before touching shared state
    let active_session = use_mut_ref(|| (*chat_id).clone());
    let seed_sent = use_mut_ref(|| false);
    // cleared on unmount so an in-flight stream stops reading
    let alive = use_mut_ref(|| true);

    {
        let alive = alive.clone();
        use_effect_with_deps(
            move |_| {
                *alive.borrow_mut() = true;
                move || *alive.borrow_mut() = false
            },
            (),
        );
    }

    // live history subscription, re-established whenever the credential or
    // the conversation changes; the old handle is dropped by the cleanup
    {
        let history = history.clone();
        let history_error = history_error.clone();
        use_effect_with_deps(
            move |(token, chat_id): &(Option<String>, String)| {
                history.set(Vec::new());
                history_error.set(None);
                let subscription = token.as_ref().map(|token| {
                    let history = history.clone();
                    let history_error = history_error.clone();
                    HistorySubscription::open(
                        token,
                        chat_id,
                        Callback::from(move |update| match update {
                            HistoryUpdate::Snapshot(messages) => {
                                history_error.set(None);
                                history.set(messages);
                            }
                            HistoryUpdate::Failed(message) => history_error.set(Some(message)),
                        }),
                    )
                });
                move || drop(subscription)
            },
            (token.clone(), (*chat_id).clone()),
        );
    }

    let do_send = {
        let pending = pending.clone();
        let sending = sending.clone();
        let status_log = status_log.clone();
        let inline_error = inline_error.clone();
        let chat_id = chat_id.clone();
        let active_session = active_session.clone();
        let alive = alive.clone();
        let on_action = props.on_action.clone();
        Callback::from(move |req: SendRequest| {
            if *sending {
                return;
            }
            let text = match validate_send(&req.text, api::load_token().is_some()) {
                Ok(text) => text,
                Err(SendBlock::EmptyMessage) => return,
                Err(SendBlock::NotSignedIn) => {
                    inline_error.set(Some(SIGN_IN_NOTICE.to_string()));
                    return;
                }
            };
            inline_error.set(None);

            let entry = PendingMessage::user(text.clone());
            let client_ref = entry.client_ref.clone();
            if !req.hidden {
                let mut next = (*pending).clone();
                if let Some(replace) = &req.replace {
                    next.retain(|p| p.client_ref != *replace);
                }
                next.push(entry);
                pending.set(next);
            }
            sending.set(true);
            status_log.set(Some(
                if req.hidden {
                    "Analyzing results..."
                } else {
                    "Thinking..."
                }
                .to_string(),
            ));

            let tag = (*chat_id).clone();
            let hidden = req.hidden;
            let pending = pending.clone();
            let sending = sending.clone();
            let status_log = status_log.clone();
            let inline_error = inline_error.clone();
            let active_session = active_session.clone();
            let alive = alive.clone();
            let on_action = on_action.clone();
            spawn_local(async move {
                let still_active = || *alive.borrow() && *active_session.borrow() == tag;
                match api::send_chat(&text, &tag, &client_ref).await {
                    Ok(resp) => {
                        let outcome = read_events(
                            &resp,
                            |event| {
                                if !still_active() {
                                    return;
                                }
                                match event {
                                    StreamEvent::Log { content } => {
                                        status_log.set(Some(content));
                                    }
                                    StreamEvent::Event { content } => {
                                        if let Some(on_action) = &on_action {
                                            on_action.emit(content);
                                        }
                                    }
                                    StreamEvent::Error { content } => {
                                        inline_error.set(Some(content));
                                    }
                                    StreamEvent::Response { content } => {
                                        // final content arrives through the
                                        // history subscription
                                        log::debug!("stream response: {} chars", content.len());
                                    }
                                }
                            },
                            || !still_active(),
                        )
                        .await;
                        if let Err(err) = outcome {
                            log::error!("chat stream failed: {}", err);
                            if still_active() && !hidden {
                                mark_failed(&pending, &client_ref);
                            }
                        }
                    }
                    Err(err) => {
                        log::error!("chat request failed: {}", err);
                        if still_active() && !hidden {
                            mark_failed(&pending, &client_ref);
                        }
                    }
                }
                // stale streams must not clear the new conversation's state
                if still_active() {
                    sending.set(false);
                    status_log.set(None);
                }
            });
        })
    };

    // seed the analysis prompt once, hidden, as soon as a credential is up
    {
        let do_send = do_send.clone();
        let seed_sent = seed_sent.clone();
        use_effect_with_deps(
            move |(seed, signed_in): &(Option<String>, bool)| {
                if let Some(prompt) = seed {
                    if *signed_in && !*seed_sent.borrow() {
                        *seed_sent.borrow_mut() = true;
                        do_send.emit(SendRequest {
                            text: prompt.clone(),
                            hidden: true,
                            replace: None,
                        });
                    }
                }
                || ()
            },
            (props.seed_prompt.clone(), signed_in),
        );
    }

    {
        let input = input.clone();
        use_effect_with_deps(
            move |initial: &Option<String>| {
                if let Some(text) = initial {
                    input.set(text.clone());
                }
                || ()
            },
            props.initial_input.clone(),
        );
    }

    let on_new_chat = {
        let chat_id = chat_id.clone();
        let pending = pending.clone();
        let status_log = status_log.clone();
        let sending = sending.clone();
        let inline_error = inline_error.clone();
        let active_session = active_session.clone();
        Callback::from(move |_| {
            let fresh = Uuid::new_v4().to_string();
            *active_session.borrow_mut() = fresh.clone();
            chat_id.set(fresh);
            pending.set(Vec::new());
            status_log.set(None);
            sending.set(false);
            inline_error.set(None);
        })
    };

    let on_retry = {
        let pending = pending.clone();
        let do_send = do_send.clone();
        Callback::from(move |client_ref: String| {
            if let Some(entry) = pending.iter().find(|p| p.client_ref == client_ref) {
                do_send.emit(SendRequest {
                    text: entry.content.clone(),
                    hidden: false,
                    replace: Some(client_ref),
                });
            }
        })
    };

    let on_dismiss = {
        let pending = pending.clone();
        Callback::from(move |client_ref: String| {
            let mut next = (*pending).clone();
            next.retain(|p| p.client_ref != client_ref);
            pending.set(next);
        })
    };

    let on_submit = {
        let input = input.clone();
        let do_send = do_send.clone();
        let inline_error = inline_error.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            match validate_send(input.as_str(), signed_in) {
                Ok(text) => {
                    input.set(String::new());
                    do_send.emit(SendRequest {
                        text,
                        hidden: false,
                        replace: None,
                    });
                }
                Err(SendBlock::EmptyMessage) => {}
                Err(SendBlock::NotSignedIn) => {
                    inline_error.set(Some(SIGN_IN_NOTICE.to_string()));
                }
            }
        })
    };

    let displayed: Vec<DisplayMessage> = {
        let visible: Vec<ChatMessage> = history
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .cloned()
            .collect();
        reconcile(&visible, &pending)
            .into_iter()
            .filter(|entry| !is_hidden_prompt(&entry.message.content))
            .collect()
    };

    let (title, new_chat_label, placeholder) = if props.compact {
        ("AI Analysis & Chat", "Reset", "Ask a follow-up question...")
    } else {
        ("Finance Assistant", "New Chat", "Type a message...")
    };

    html! {
        <div class="bg-card border border-border rounded-2xl shadow-md flex flex-col h-full overflow-hidden">
            <div class="px-4 py-3 border-b border-border flex items-center justify-between">
                <h3 class="font-bold text-foreground text-sm flex items-center gap-2">
                    <span>{"🤖"}</span>
                    { title }
                </h3>
                <button onclick={on_new_chat} class="text-xs font-semibold text-muted-foreground hover:text-primary transition-colors">
                    { new_chat_label }
                </button>
            </div>

            {
                if let Some(message) = &*history_error {
                    html! { <p class="px-4 py-2 text-xs text-red-500 bg-red-50 border-b border-border">{ message.clone() }</p> }
                } else {
                    html! {}
                }
            }

            <div class="flex-1 overflow-y-auto space-y-4 p-4">
                {
                    if displayed.is_empty() && !*sending {
                        html! {
                            <div class="flex flex-col items-center justify-center h-full text-muted-foreground space-y-2 opacity-60">
                                <span class="text-4xl">{"💬"}</span>
                                <p class="text-sm">{"Ask me anything about your finances!"}</p>
                                {
                                    if *chat_id != DEFAULT_CHAT_ID {
                                        html! { <p class="text-xs">{ format!("Chat {}...", &chat_id[..8.min(chat_id.len())]) }</p> }
                                    } else {
                                        html! {}
                                    }
                                }
                            </div>
                        }
                    } else {
                        html! {}
                    }
                }
                { for displayed.iter().map(|entry| message_bubble(entry, &on_retry, &on_dismiss)) }
                {
                    if *sending {
                        html! {
                            <div class="flex justify-start animate-pulse">
                                <div class="bg-muted rounded-2xl rounded-bl-none px-4 py-3 text-sm text-muted-foreground">
                                    { (*status_log).clone().unwrap_or_else(|| "Thinking...".to_string()) }
                                </div>
                            </div>
                        }
                    } else {
                        html! {}
                    }
                }
            </div>

            <div class="p-3 border-t border-border">
                {
                    if let Some(message) = &*inline_error {
                        html! { <p class="text-xs text-red-500 mb-2">{ message.clone() }</p> }
                    } else {
                        html! {}
                    }
                }
                <form onsubmit={on_submit} class="flex gap-2">
                    <input
                        value={(*input).clone()}
                        oninput={{
                            let input = input.clone();
                            Callback::from(move |e: InputEvent| {
                                let field: HtmlInputElement = e.target_unchecked_into();
                                input.set(field.value());
                            })
                        }}
                        placeholder={placeholder}
                        disabled={*sending}
                        class="flex-1 bg-[#f1f4f9] border-none rounded-xl px-4 py-2 text-sm text-foreground outline-none disabled:opacity-50"
                    />
                    <button
                        type="submit"
                        disabled={*sending}
                        class="bg-primary text-primary-foreground w-10 rounded-xl font-bold disabled:opacity-50"
                        aria-label="Send message"
                    >
                        {"➤"}
                    </button>
                </form>
            </div>
        </div>
    }
}

fn mark_failed(pending: &UseStateHandle<Vec<PendingMessage>>, client_ref: &str) {
    let mut next = (**pending).clone();
    if let Some(entry) = next.iter_mut().find(|p| p.client_ref == client_ref) {
        entry.state = DeliveryState::Failed;
    }
    pending.set(next);
}

fn message_bubble(
    entry: &DisplayMessage,
    on_retry: &Callback<String>,
    on_dismiss: &Callback<String>,
) -> Html {
    let message = &entry.message;
    let component = message
        .component
        .as_ref()
        .and_then(MessageComponent::from_value);
    // avoid rendering empty bubbles
    if message.content.is_empty() && component.is_none() {
        return html! {};
    }

    let is_user = message.role == ChatRole::User;
    let wrapper = if is_user {
        "flex justify-end"
    } else {
        "flex justify-start"
    };
    let bubble = if is_user {
        "max-w-[85%] rounded-2xl rounded-br-none px-4 py-3 text-sm shadow-sm bg-primary text-primary-foreground"
    } else {
        "max-w-[85%] rounded-2xl rounded-bl-none px-4 py-3 text-sm shadow-sm bg-muted text-foreground"
    };

    html! {
        <div class={wrapper}>
            <div class={bubble}>
                {
                    if !message.content.is_empty() {
                        html! { <p class="whitespace-pre-wrap break-words">{ message.content.clone() }</p> }
                    } else {
                        html! {}
                    }
                }
                {
                    match &component {
                        Some(component) if component.kind == "chart" => html! {
                            <div class="mt-3 pt-3 border-t border-border/50">
                                <DynamicChart data={ChartData::from_value(&component.data)} />
                            </div>
                        },
                        Some(component) => html! {
                            <p class="text-sm text-muted-foreground italic">
                                { format!("[Unsupported component: {}]", component.kind) }
                            </p>
                        },
                        None => html! {},
                    }
                }
                {
                    if entry.delivery == Some(DeliveryState::Failed) {
                        let client_ref = message.client_ref.clone().unwrap_or_default();
                        let retry_ref = client_ref.clone();
                        let on_retry = on_retry.clone();
                        let on_dismiss = on_dismiss.clone();
                        html! {
                            <div class="mt-2 pt-2 border-t border-white/20 text-xs flex items-center gap-3">
                                <span class="opacity-80">{"Not delivered"}</span>
                                <button type="button" class="font-bold underline" onclick={Callback::from(move |_| on_retry.emit(retry_ref.clone()))}>
                                    {"Retry"}
                                </button>
                                <button type="button" class="font-bold underline opacity-80" onclick={Callback::from(move |_| on_dismiss.emit(client_ref.clone()))}>
                                    {"Dismiss"}
                                </button>
                            </div>
                        }
                    } else {
                        html! {}
                    }
                }
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_message_is_rejected() {
        assert_eq!(validate_send("   \n\t ", true), Err(SendBlock::EmptyMessage));
        assert_eq!(validate_send("", true), Err(SendBlock::EmptyMessage));
    }

    #[test]
    fn unauthenticated_send_is_suppressed() {
        assert_eq!(
            validate_send("Show me my expenses pie chart", false),
            Err(SendBlock::NotSignedIn)
        );
    }

    #[test]
    fn valid_message_is_trimmed() {
        assert_eq!(
            validate_send("  what's my balance?  ", true),
            Ok("what's my balance?".to_string())
        );
    }
}
