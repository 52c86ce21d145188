use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::{self, Tool};
use crate::tools::schema::{format_title, has_inputs};
use crate::{page_shell, Page};

#[derive(Properties, PartialEq)]
pub struct ToolsPageProps {
    pub on_navigate: Callback<Page>,
}

#[function_component(ToolsPage)]
pub fn tools_page(props: &ToolsPageProps) -> Html {
    let tools = use_state(Vec::<Tool>::new);
    let loading = use_state(|| true);
    let load_error = use_state(|| None::<String>);

    {
        let tools = tools.clone();
        let loading = loading.clone();
        let load_error = load_error.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    match api::fetch_tools().await {
                        Ok(list) => tools.set(list),
                        Err(err) => {
                            log::error!("failed to fetch tools: {}", err);
                            load_error.set(Some("Tools could not be loaded.".to_string()));
                        }
                    }
                    loading.set(false);
                });
                || ()
            },
            (),
        );
    }

    // tools with input fields get the generated form; the rest are agents
    // that run straight from the chat
    let (agents, interactive): (Vec<Tool>, Vec<Tool>) = tools
        .iter()
        .cloned()
        .partition(|tool| !has_inputs(&tool.json_schema));

    let select = {
        let on_navigate = props.on_navigate.clone();
        Callback::from(move |tool: Tool| {
            if has_inputs(&tool.json_schema) {
                on_navigate.emit(Page::ToolRun(tool.name.clone()));
            } else {
                let title = tool.title.clone().unwrap_or_else(|| format_title(&tool.name));
                on_navigate.emit(Page::Chat(Some(format!("Run {}", title))));
            }
        })
    };

    html! {
        { page_shell(
            "Tools & Agents",
            html! {},
            html! {
                <>
                    {
                        if let Some(message) = &*load_error {
                            html! { <p class="text-sm text-red-500">{ message.clone() }</p> }
                        } else if *loading {
                            html! { <p class="text-sm text-muted-foreground">{"Loading tools..."}</p> }
                        } else if tools.is_empty() {
                            html! { <p class="text-sm text-muted-foreground">{"No tools available yet."}</p> }
                        } else {
                            html! {}
                        }
                    }
                    {
                        if !agents.is_empty() {
                            html! {
                                <section class="space-y-4">
                                    <div class="border-b border-border pb-3">
                                        <h2 class="text-xl font-bold text-foreground">{"Specialized Agents"}</h2>
                                        <p class="text-sm text-muted-foreground mt-1">{"AI agents that run automated tasks directly in the chat."}</p>
                                    </div>
                                    <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-6">
                                        { for agents.iter().map(|tool| tool_card(tool, "Chat", &select)) }
                                    </div>
                                </section>
                            }
                        } else {
                            html! {}
                        }
                    }
                    {
                        if !interactive.is_empty() {
                            html! {
                                <section class="space-y-4">
                                    <div class="border-b border-border pb-3 mt-4">
                                        <h2 class="text-xl font-bold text-foreground">{"Interactive Tools"}</h2>
                                        <p class="text-sm text-muted-foreground mt-1">{"Calculators with dedicated interfaces for complex inputs."}</p>
                                    </div>
                                    <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-6">
                                        { for interactive.iter().map(|tool| tool_card(tool, "Open", &select)) }
                                    </div>
                                </section>
                            }
                        } else {
                            html! {}
                        }
                    }
                </>
            }
        ) }
    }
}

fn tool_card(tool: &Tool, action: &'static str, select: &Callback<Tool>) -> Html {
    let title = tool.title.clone().unwrap_or_else(|| format_title(&tool.name));
    let onclick = {
        let select = select.clone();
        let tool = tool.clone();
        Callback::from(move |_| select.emit(tool.clone()))
    };
    let card_class = if tool.is_saved() {
        "group bg-card rounded-[10px] p-5 border border-primary/50 bg-primary/5 hover:shadow-md transition-all cursor-pointer flex flex-col h-full"
    } else {
        "group bg-card rounded-[10px] p-5 border border-border hover:border-primary/50 hover:shadow-md transition-all cursor-pointer flex flex-col h-full"
    };
    html! {
        <div class={card_class} {onclick}>
            <div class="flex justify-between items-start gap-3 mb-2">
                <h3 class="text-lg font-semibold text-foreground leading-tight">{ title }</h3>
                {
                    if tool.is_saved() {
                        html! { <span class="bg-primary text-primary-foreground rounded-full px-2 py-0.5 text-[10px] font-bold shrink-0">{"Saved"}</span> }
                    } else {
                        html! {}
                    }
                }
            </div>
            <p class="text-muted-foreground text-sm flex-1 mb-4">
                { tool.description.clone().unwrap_or_default() }
            </p>
            <div class="flex items-center justify-between mt-auto pt-3 border-t border-border/50">
                <span class="text-xs text-muted-foreground font-mono bg-secondary/50 px-1.5 py-1 rounded truncate max-w-[150px]">{ tool.name.clone() }</span>
                <span class="text-primary opacity-0 group-hover:opacity-100 transition-opacity text-xs font-semibold uppercase tracking-wider">{ action }</span>
            </div>
        </div>
    }
}
