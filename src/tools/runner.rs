use serde_json::Value;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use super::schema::{format_title, parse_fields, FieldKind, ToolField};
use crate::api::{self, Tool, ToolRunResult};
use crate::charts::{ChartData, DynamicChart};
use crate::chat::ChatPanel;

/// The hidden prompt that seeds the analysis chat after a run. Kept in one
/// place so the display filter and the seeding agree on its wording.
pub fn analysis_prompt(title: &str, inputs: &Value, result: &ToolRunResult) -> String {
    let payload = serde_json::json!({
        "inputs": inputs,
        "output": result.output,
        "visualization_summary": if result.visualization.is_some() {
            "A chart was generated."
        } else {
            "No chart."
        },
    });
    format!(
        "Here is the financial data from the '{}' calculation: \n```json\n{}\n```\n\n\
         Please analyze this data. As a Financial Advisor, provide a clear, human-readable \
         explanation of what this means. Do NOT show the raw JSON. Use Markdown for formatting.",
        title, payload
    )
}

#[derive(Properties, PartialEq)]
pub struct ToolRunnerPageProps {
    pub name: String,
    pub on_back: Callback<()>,
}

#[function_component(ToolRunnerPage)]
pub fn tool_runner_page(props: &ToolRunnerPageProps) -> Html {
    let tool = use_state(|| None::<Tool>);
    let load_error = use_state(|| None::<String>);

    {
        let tool = tool.clone();
        let load_error = load_error.clone();
        use_effect_with_deps(
            move |name: &String| {
                let name = name.clone();
                spawn_local(async move {
                    match api::fetch_tool(&name).await {
                        Ok(loaded) => tool.set(Some(loaded)),
                        Err(err) => {
                            log::error!("failed to load tool {}: {}", name, err);
                            load_error.set(Some("This tool could not be loaded.".to_string()));
                        }
                    }
                });
                || ()
            },
            props.name.clone(),
        );
    }

    let on_back = {
        let on_back = props.on_back.clone();
        Callback::from(move |_| on_back.emit(()))
    };

    html! {
        <div class="p-6 max-w-7xl mx-auto space-y-6">
            <div class="flex items-center gap-3 pb-4 border-b border-border">
                <button onclick={on_back} class="text-muted-foreground hover:text-foreground font-bold">{"‹ Back"}</button>
                <h1 class="text-2xl font-bold text-foreground">
                    {
                        match &*tool {
                            Some(tool) => format!("Run Tool: {}", display_title(tool)),
                            None => "Run Tool".to_string(),
                        }
                    }
                </h1>
            </div>
            {
                if let Some(message) = &*load_error {
                    html! { <p class="text-sm text-red-500">{ message.clone() }</p> }
                } else if let Some(tool) = &*tool {
                    html! { <ToolRunner tool={tool.clone()} /> }
                } else {
                    html! { <p class="text-sm text-muted-foreground">{"Loading tool..."}</p> }
                }
            }
        </div>
    }
}

fn display_title(tool: &Tool) -> String {
    tool.title
        .clone()
        .unwrap_or_else(|| format_title(&tool.name))
}

#[derive(Properties, PartialEq)]
struct ToolRunnerProps {
    tool: Tool,
}

#[function_component(ToolRunner)]
fn tool_runner(props: &ToolRunnerProps) -> Html {
    let tool = &props.tool;
    let fields = match parse_fields(&tool.json_schema) {
        Ok(fields) => fields,
        Err(err) => {
            log::warn!("failed to parse schema for {}: {}", tool.name, err);
            Vec::new()
        }
    };

    let values = use_state(serde_json::Map::new);
    let running = use_state(|| false);
    let result = use_state(|| None::<ToolRunResult>);
    let run_inputs = use_state(|| Value::Null);
    let run_error = use_state(|| None::<String>);
    let saved = use_state(|| props.tool.is_saved());
    let saving = use_state(|| false);

    let on_change = {
        let values = values.clone();
        Callback::from(move |(name, value): (String, Option<Value>)| {
            let mut next = (*values).clone();
            match value {
                Some(value) => {
                    next.insert(name, value);
                }
                None => {
                    next.remove(&name);
                }
            }
            values.set(next);
        })
    };

    let on_execute = {
        let values = values.clone();
        let running = running.clone();
        let result = result.clone();
        let run_inputs = run_inputs.clone();
        let run_error = run_error.clone();
        let name = tool.name.clone();
        Callback::from(move |_| {
            if *running {
                return;
            }
            if api::load_token().is_none() {
                run_error.set(Some("You must be signed in to run tools.".to_string()));
                return;
            }
            running.set(true);
            run_error.set(None);
            result.set(None);

            let args = Value::Object((*values).clone());
            let name = name.clone();
            let running = running.clone();
            let result = result.clone();
            let run_inputs = run_inputs.clone();
            let run_error = run_error.clone();
            spawn_local(async move {
                match api::execute_tool(&name, &args).await {
                    Ok(outcome) => {
                        run_inputs.set(args);
                        result.set(Some(outcome));
                    }
                    Err(err) => {
                        log::error!("tool {} failed: {}", name, err);
                        run_error.set(Some(err.to_string()));
                    }
                }
                running.set(false);
            });
        })
    };

    let on_save = {
        let saved = saved.clone();
        let saving = saving.clone();
        let name = tool.name.clone();
        Callback::from(move |_| {
            if *saving {
                return;
            }
            saving.set(true);
            let name = name.clone();
            let saved = saved.clone();
            let saving = saving.clone();
            spawn_local(async move {
                match api::save_tool(&name).await {
                    Ok(()) => saved.set(true),
                    Err(err) => log::error!("failed to save tool {}: {}", name, err),
                }
                saving.set(false);
            });
        })
    };

    html! {
        <div class="grid grid-cols-1 lg:grid-cols-12 gap-6 items-start">
            <div class="lg:col-span-4 space-y-4">
                <div class="flex items-center justify-between">
                    <h2 class="text-xl font-bold text-foreground">{ display_title(tool) }</h2>
                    {
                        if *saved {
                            html! { <span class="text-xs font-bold text-green-600">{"✓ Saved"}</span> }
                        } else {
                            html! {
                                <button onclick={on_save} disabled={*saving} class="text-xs font-bold border border-border rounded-lg px-3 py-1.5 hover:bg-muted transition-colors">
                                    { if *saving { "Saving..." } else { "Save Tool" } }
                                </button>
                            }
                        }
                    }
                </div>
                {
                    if let Some(description) = &tool.description {
                        html! { <p class="text-sm text-muted-foreground">{ description.clone() }</p> }
                    } else {
                        html! {}
                    }
                }

                <div class="bg-card rounded-[10px] p-5 border border-border space-y-4">
                    <AutoForm fields={fields} values={(*values).clone()} on_change={on_change} />
                    <button
                        onclick={on_execute}
                        disabled={*running}
                        class="w-full bg-primary text-primary-foreground py-2 rounded-[10px] text-sm font-bold disabled:opacity-50"
                    >
                        { if *running { "Running..." } else { "Execute Tool" } }
                    </button>
                </div>

                {
                    if let Some(run) = &*result {
                        if run.logs.is_empty() {
                            html! {}
                        } else {
                            html! {
                                <div class="bg-muted/40 rounded-lg p-4 font-mono text-xs text-muted-foreground max-h-40 overflow-y-auto space-y-1">
                                    <p class="font-semibold">{"Execution Logs:"}</p>
                                    { for run.logs.iter().map(|line| html! { <p>{ line.clone() }</p> }) }
                                </div>
                            }
                        }
                    } else {
                        html! {}
                    }
                }
            </div>

            <div class="lg:col-span-8 space-y-4">
                {
                    if let Some(message) = &*run_error {
                        html! {
                            <div class="bg-red-50 text-red-600 p-4 rounded-lg text-sm">
                                <p class="font-bold">{"Execution Failed"}</p>
                                <p>{ message.clone() }</p>
                            </div>
                        }
                    } else {
                        html! {}
                    }
                }
                {
                    if let Some(run) = &*result {
                        let seed = analysis_prompt(&display_title(tool), &*run_inputs, run);
                        html! {
                            <div class="bg-card rounded-[10px] border border-border p-5 space-y-4">
                                <h3 class="text-lg font-bold text-foreground">{"Result"}</h3>
                                {
                                    if let Some(visualization) = &run.visualization {
                                        html! { <DynamicChart data={ChartData::from_value(visualization)} /> }
                                    } else {
                                        html! {}
                                    }
                                }
                                <pre class="bg-muted/40 rounded-lg p-4 text-xs overflow-x-auto">
                                    { serde_json::to_string_pretty(&run.output).unwrap_or_else(|_| "{}".to_string()) }
                                </pre>
                                <div class="h-[420px]">
                                    <ChatPanel seed_prompt={Some(seed)} compact={true} />
                                </div>
                            </div>
                        }
                    } else if *running {
                        html! {
                            <div class="border border-dashed border-border rounded-xl min-h-[300px] flex items-center justify-center text-muted-foreground animate-pulse">
                                {"Running tool..."}
                            </div>
                        }
                    } else {
                        html! {
                            <div class="border border-dashed border-border rounded-xl min-h-[300px] flex items-center justify-center text-muted-foreground text-sm text-center">
                                <p>{"Configure parameters and run the tool"}<br/>{"to see results here."}</p>
                            </div>
                        }
                    }
                }
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct AutoFormProps {
    fields: Vec<ToolField>,
    values: serde_json::Map<String, Value>,
    on_change: Callback<(String, Option<Value>)>,
}

#[function_component(AutoForm)]
fn auto_form(props: &AutoFormProps) -> Html {
    if props.fields.is_empty() {
        return html! { <p class="text-sm text-muted-foreground italic">{"No parameters required."}</p> };
    }

    html! {
        <div class="space-y-4">
            { for props.fields.iter().map(|field| {
                let label = html! {
                    <label class="text-[12px] font-bold text-muted-foreground">
                        { field.title.clone() }
                        { if field.required { html! { <span class="text-red-500">{" *"}</span> } } else { html!{} } }
                    </label>
                };
                let description = match &field.description {
                    Some(text) => html! { <p class="text-xs text-muted-foreground">{ text.clone() }</p> },
                    None => html! {},
                };
                let control = field_control(field, &props.values, &props.on_change);
                html! {
                    <div class="space-y-1">
                        { label }
                        { description }
                        { control }
                    </div>
                }
            }) }
        </div>
    }
}

const FIELD_CLASS: &str =
    "w-full bg-[#f1f4f9] border-none rounded-[10px] px-3 py-2 text-sm text-foreground outline-none";

fn field_control(
    field: &ToolField,
    values: &serde_json::Map<String, Value>,
    on_change: &Callback<(String, Option<Value>)>,
) -> Html {
    let name = field.name.clone();
    match &field.kind {
        FieldKind::Text => {
            let value = values
                .get(&field.name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let on_change = on_change.clone();
            html! {
                <input
                    type="text"
                    class={FIELD_CLASS}
                    value={value}
                    placeholder={format!("Enter {}...", field.title)}
                    oninput={Callback::from(move |e: InputEvent| {
                        let input: HtmlInputElement = e.target_unchecked_into();
                        let text = input.value();
                        let next = if text.is_empty() { None } else { Some(Value::String(text)) };
                        on_change.emit((name.clone(), next));
                    })}
                />
            }
        }
        FieldKind::Number => {
            let value = values
                .get(&field.name)
                .and_then(Value::as_f64)
                .map(|v| v.to_string())
                .unwrap_or_default();
            let on_change = on_change.clone();
            html! {
                <input
                    type="number"
                    class={FIELD_CLASS}
                    value={value}
                    placeholder="0.00"
                    oninput={Callback::from(move |e: InputEvent| {
                        let input: HtmlInputElement = e.target_unchecked_into();
                        let next = input
                            .value()
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map(Value::Number);
                        on_change.emit((name.clone(), next));
                    })}
                />
            }
        }
        FieldKind::Bool => {
            let checked = values
                .get(&field.name)
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let on_change = on_change.clone();
            html! {
                <div class="flex items-center gap-2">
                    <input
                        type="checkbox"
                        checked={checked}
                        onchange={Callback::from(move |e: Event| {
                            let input: HtmlInputElement = e.target_unchecked_into();
                            on_change.emit((name.clone(), Some(Value::Bool(input.checked()))));
                        })}
                    />
                    <span class="text-sm text-muted-foreground">{"Yes"}</span>
                </div>
            }
        }
        FieldKind::Choice(options) => {
            let selected = values
                .get(&field.name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let on_change = on_change.clone();
            html! {
                <select
                    class={FIELD_CLASS}
                    value={selected.clone()}
                    onchange={Callback::from(move |e: Event| {
                        let select: HtmlSelectElement = e.target_unchecked_into();
                        let choice = select.value();
                        let next = if choice.is_empty() { None } else { Some(Value::String(choice)) };
                        on_change.emit((name.clone(), next));
                    })}
                >
                    <option value="" disabled=true selected={selected.is_empty()}>{"Select option..."}</option>
                    { for options.iter().map(|option| html! {
                        <option value={option.clone()} selected={*option == selected}>{ option.clone() }</option>
                    }) }
                </select>
            }
        }
        FieldKind::Unsupported(kind) => html! {
            <p class="text-sm text-muted-foreground italic">
                { format!("[Unsupported field kind: {}]", kind) }
            </p>
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::is_hidden_prompt;

    fn sample_result(with_chart: bool) -> ToolRunResult {
        ToolRunResult {
            output: serde_json::json!({ "monthly_payment": 1266.71 }),
            visualization: with_chart.then(|| serde_json::json!({ "type": "bar", "data": [] })),
            logs: Vec::new(),
        }
    }

    #[test]
    fn analysis_prompt_is_filtered_from_display() {
        let prompt = analysis_prompt(
            "Loan Calculator",
            &serde_json::json!({ "amount": 250000 }),
            &sample_result(true),
        );
        assert!(is_hidden_prompt(&prompt));
    }

    #[test]
    fn analysis_prompt_carries_inputs_output_and_chart_summary() {
        let prompt = analysis_prompt(
            "Loan Calculator",
            &serde_json::json!({ "amount": 250000 }),
            &sample_result(false),
        );
        assert!(prompt.contains("'Loan Calculator'"));
        assert!(prompt.contains("monthly_payment"));
        assert!(prompt.contains("No chart."));
    }
}
