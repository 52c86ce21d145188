use yew::prelude::*;

use crate::chat::ChatPanel;

#[derive(Properties, PartialEq)]
pub struct ChatPageProps {
    /// Prefilled input, e.g. "Run Budget Auditor" when an agent card was
    /// selected on the tools page.
    #[prop_or_default]
    pub initial_input: Option<String>,
}

#[function_component(ChatPage)]
pub fn chat_page(props: &ChatPageProps) -> Html {
    html! {
        <div class="p-6 max-w-5xl mx-auto h-[85vh] flex flex-col">
            <div class="flex items-center justify-between pb-4 border-b border-border mb-5">
                <h1 class="text-2xl font-bold text-foreground">{"Assistant"}</h1>
            </div>
            <div class="flex-1 min-h-0">
                <ChatPanel initial_input={props.initial_input.clone()} />
            </div>
        </div>
    }
}
