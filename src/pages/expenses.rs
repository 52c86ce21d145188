use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::api::{self, Expense, ExpenseCreate};
use crate::{format_amount, page_shell, use_currency_symbol};

const CATEGORY_SUGGESTIONS: [&str; 5] = ["Food", "Transport", "Shopping", "Bills", "Entertainment"];

pub fn display_date(date: &Option<String>) -> String {
    match date {
        Some(date) => date.chars().take(10).collect(),
        None => "—".to_string(),
    }
}

#[derive(Properties, PartialEq)]
pub struct ExpenseFormProps {
    #[prop_or_default]
    pub on_saved: Callback<()>,
}

#[function_component(ExpenseForm)]
pub fn expense_form(props: &ExpenseFormProps) -> Html {
    let symbol = use_currency_symbol();
    let form_amount = use_state(|| "".to_string());
    let form_category = use_state(|| "".to_string());
    let form_description = use_state(|| "".to_string());
    let form_date = use_state(|| "".to_string());
    let form_error = use_state(|| None::<String>);
    let saving = use_state(|| false);

    let on_submit = {
        let form_amount = form_amount.clone();
        let form_category = form_category.clone();
        let form_description = form_description.clone();
        let form_date = form_date.clone();
        let form_error = form_error.clone();
        let saving = saving.clone();
        let on_saved = props.on_saved.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let amount = form_amount.trim().parse::<f64>().unwrap_or(0.0);
            let category = form_category.trim().to_string();

            if amount <= 0.0 {
                form_error.set(Some("Amount must be a positive number.".to_string()));
                return;
            }
            if category.is_empty() {
                form_error.set(Some("Please pick a category.".to_string()));
                return;
            }

            form_error.set(None);
            saving.set(true);

            let description = form_description.trim().to_string();
            let date = form_date.trim().to_string();
            let payload = ExpenseCreate {
                amount,
                category,
                description: if description.is_empty() {
                    None
                } else {
                    Some(description)
                },
                date: if date.is_empty() { None } else { Some(date) },
            };

            let form_amount = form_amount.clone();
            let form_category = form_category.clone();
            let form_description = form_description.clone();
            let form_date = form_date.clone();
            let form_error = form_error.clone();
            let saving = saving.clone();
            let on_saved = on_saved.clone();
            spawn_local(async move {
                match api::create_expense(&payload).await {
                    Ok(_) => {
                        form_amount.set("".to_string());
                        form_category.set("".to_string());
                        form_description.set("".to_string());
                        form_date.set("".to_string());
                        on_saved.emit(());
                    }
                    Err(err) => {
                        log::error!("failed to add expense: {}", err);
                        form_error.set(Some("Failed to add expense. Please try again.".to_string()));
                    }
                }
                saving.set(false);
            });
        })
    };

    html! {
        <form onsubmit={on_submit} class="space-y-3">
            <div class="grid grid-cols-2 gap-3">
                <div class="space-y-1">
                    <label class="text-[12px] font-bold text-muted-foreground">{ format!("Amount ({})", symbol) }</label>
                    <input type="number" step="0.01" placeholder="0.00" value={(*form_amount).clone()} oninput={{
                        let form_amount = form_amount.clone();
                        Callback::from(move |e: InputEvent| {
                            let input: HtmlInputElement = e.target_unchecked_into();
                            form_amount.set(input.value());
                        })
                    }} class="w-full bg-[#f1f4f9] border-none rounded-[10px] px-3 py-2 text-sm text-foreground outline-none" />
                </div>
                <div class="space-y-1">
                    <label class="text-[12px] font-bold text-muted-foreground">{"Category"}</label>
                    <input placeholder="e.g. Food" list="expense-categories" value={(*form_category).clone()} oninput={{
                        let form_category = form_category.clone();
                        Callback::from(move |e: InputEvent| {
                            let input: HtmlInputElement = e.target_unchecked_into();
                            form_category.set(input.value());
                        })
                    }} class="w-full bg-[#f1f4f9] border-none rounded-[10px] px-3 py-2 text-sm text-foreground outline-none" />
                    <datalist id="expense-categories">
                        { for CATEGORY_SUGGESTIONS.iter().map(|category| html! { <option value={*category} /> }) }
                    </datalist>
                </div>
            </div>
            <div class="grid grid-cols-2 gap-3">
                <div class="space-y-1">
                    <label class="text-[12px] font-bold text-muted-foreground">{"Description"}</label>
                    <input type="text" placeholder="What did you buy?" value={(*form_description).clone()} oninput={{
                        let form_description = form_description.clone();
                        Callback::from(move |e: InputEvent| {
                            let input: HtmlInputElement = e.target_unchecked_into();
                            form_description.set(input.value());
                        })
                    }} class="w-full bg-[#f1f4f9] border-none rounded-[10px] px-3 py-2 text-sm text-foreground outline-none" />
                </div>
                <div class="space-y-1">
                    <label class="text-[12px] font-bold text-muted-foreground">{"Date"}</label>
                    <input type="date" value={(*form_date).clone()} oninput={{
                        let form_date = form_date.clone();
                        Callback::from(move |e: InputEvent| {
                            let input: HtmlInputElement = e.target_unchecked_into();
                            form_date.set(input.value());
                        })
                    }} class="w-full bg-[#f1f4f9] border-none rounded-[10px] px-3 py-2 text-sm text-foreground outline-none" />
                </div>
            </div>
            <button type="submit" disabled={*saving} class="w-full bg-primary text-primary-foreground py-2 rounded-[10px] text-sm font-bold disabled:opacity-50">
                { if *saving { "Adding..." } else { "Add Expense" } }
            </button>
            {
                if let Some(msg) = &*form_error {
                    html! { <p class="text-sm text-red-500 text-center">{ msg.clone() }</p> }
                } else {
                    html! {}
                }
            }
        </form>
    }
}

#[derive(Properties, PartialEq)]
pub struct ExpenseListProps {
    pub expenses: Vec<Expense>,
    #[prop_or(false)]
    pub loading: bool,
}

#[function_component(ExpenseList)]
pub fn expense_list(props: &ExpenseListProps) -> Html {
    let symbol = use_currency_symbol();
    html! {
        <div class="bg-card rounded-[10px] shadow-sm border border-border overflow-hidden">
            <div class="p-5 border-b border-border">
                <h3 class="font-bold text-lg text-foreground">{"Recent Expenses"}</h3>
            </div>
            <div class="overflow-x-auto">
                <table class="w-full text-left border-collapse">
                    <thead>
                        <tr class="bg-muted text-muted-foreground text-[10px] uppercase tracking-widest">
                            <th class="px-8 py-4 font-bold">{"Date"}</th>
                            <th class="px-8 py-4 font-bold">{"Description"}</th>
                            <th class="px-8 py-4 font-bold">{"Category"}</th>
                            <th class="px-8 py-4 font-bold text-right">{"Amount"}</th>
                        </tr>
                    </thead>
                    <tbody class="divide-y divide-border">
                        { if props.loading {
                            html! { <tr><td colspan="4" class="px-8 py-6 text-center text-muted-foreground">{"Loading..."}</td></tr> }
                        } else if props.expenses.is_empty() {
                            html! { <tr><td colspan="4" class="px-8 py-6 text-center text-muted-foreground">{"No expenses recorded yet."}</td></tr> }
                        } else {
                            html! {
                                <>
                                    { for props.expenses.iter().map(|expense| html! {
                                        <tr key={expense.id} class="text-sm hover:bg-muted/40 transition-colors">
                                            <td class="px-8 py-4 text-muted-foreground">{ display_date(&expense.date) }</td>
                                            <td class="px-8 py-4 text-foreground">{ expense.description.clone().unwrap_or_default() }</td>
                                            <td class="px-8 py-4">
                                                <span class="bg-secondary text-secondary-foreground px-3 py-1 rounded-full text-[10px] font-bold">{ expense.category.clone() }</span>
                                            </td>
                                            <td class="px-8 py-4 text-right font-semibold text-foreground">{ format_amount(expense.amount, &symbol) }</td>
                                        </tr>
                                    }) }
                                </>
                            }
                        }}
                    </tbody>
                </table>
            </div>
        </div>
    }
}

#[function_component(ExpensesPage)]
pub fn expenses_page() -> Html {
    let expenses = use_state(Vec::<Expense>::new);
    let loading = use_state(|| true);
    let show_form = use_state(|| false);
    let reload = use_state(|| 0u32);

    {
        let expenses = expenses.clone();
        let loading = loading.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    match api::fetch_expenses(0, 100).await {
                        Ok(list) => expenses.set(list),
                        Err(err) => log::error!("failed to fetch expenses: {}", err),
                    }
                    loading.set(false);
                });
                || ()
            },
            *reload,
        );
    }

    let on_toggle = {
        let show_form = show_form.clone();
        Callback::from(move |_| show_form.set(!*show_form))
    };

    let on_saved = {
        let reload = reload.clone();
        let show_form = show_form.clone();
        Callback::from(move |_| {
            show_form.set(false);
            reload.set(*reload + 1);
        })
    };

    html! {
        { page_shell(
            "Expenses",
            html! {
                <button onclick={on_toggle} class="flex items-center gap-2 bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm hover:opacity-90 transition-all">
                    { if *show_form { "Close Form" } else { "Add Expense" } }
                </button>
            },
            html! {
                <>
                    {
                        if *show_form {
                            html! {
                                <div class="bg-card rounded-[10px] p-6 border border-border">
                                    <h4 class="text-foreground font-bold text-[15px] mb-3">{"Add New Expense"}</h4>
                                    <ExpenseForm on_saved={on_saved} />
                                </div>
                            }
                        } else {
                            html! {}
                        }
                    }
                    <ExpenseList expenses={(*expenses).clone()} loading={*loading} />
                </>
            }
        ) }
    }
}
