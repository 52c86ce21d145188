use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::{self, CategoryTotal, Expense};
use crate::charts::{ChartData, DynamicChart};
use crate::chat::ChatPanel;
use crate::pages::expenses::{ExpenseForm, ExpenseList};
use crate::{format_amount, icon_arrow_up_right, icon_credit_card, icon_wallet, page_shell, use_currency_symbol};

#[derive(Clone, Copy, PartialEq)]
enum StatIcon {
    UpRight,
    CreditCard,
    Wallet,
}

#[derive(Properties, PartialEq)]
struct StatCardProps {
    title: &'static str,
    value: String,
    icon: StatIcon,
}

#[function_component(StatCard)]
fn stat_card(props: &StatCardProps) -> Html {
    html! {
        <div class="bg-card p-6 rounded-[10px] shadow-sm border border-border flex justify-between items-start">
            <div>
                <p class="text-muted-foreground text-[10px] font-bold mb-1 tracking-widest">{ props.title }</p>
                <h3 class="text-2xl font-bold text-[#1D617A] tracking-tight">{ props.value.clone() }</h3>
            </div>
            <div class="p-3 bg-[#eef4f9] rounded-[10px]">
                {
                    match props.icon {
                        StatIcon::UpRight => icon_arrow_up_right(),
                        StatIcon::CreditCard => icon_credit_card(),
                        StatIcon::Wallet => icon_wallet(),
                    }
                }
            </div>
        </div>
    }
}

pub fn report_csv(expenses: &[Expense]) -> String {
    let mut csv = String::from("Date,Category,Amount,Description\n");
    for expense in expenses {
        csv.push_str(&format!(
            "{},{},{},\"{}\"\n",
            expense.date.clone().unwrap_or_default(),
            expense.category,
            expense.amount,
            expense
                .description
                .clone()
                .unwrap_or_default()
                .replace('"', "\"\"")
        ));
    }
    csv
}

fn download_report(expenses: &[Expense]) {
    let csv = report_csv(expenses);
    let window = match web_sys::window() {
        Some(window) => window,
        None => return,
    };
    let document = match window.document() {
        Some(document) => document,
        None => return,
    };
    let parts = js_sys::Array::new();
    parts.push(&wasm_bindgen::JsValue::from_str(&csv));
    let blob = match web_sys::Blob::new_with_str_sequence(&parts) {
        Ok(blob) => blob,
        Err(_) => return,
    };
    let href = match web_sys::Url::create_object_url_with_blob(&blob) {
        Ok(href) => href,
        Err(_) => return,
    };
    if let Ok(element) = document.create_element("a") {
        let anchor: web_sys::HtmlAnchorElement = element.unchecked_into();
        anchor.set_href(&href);
        let stamp = String::from(js_sys::Date::new_0().to_iso_string());
        anchor.set_download(&format!(
            "expenses_report_{}.csv",
            stamp.chars().take(10).collect::<String>()
        ));
        anchor.click();
    }
    let _ = web_sys::Url::revoke_object_url(&href);
}

#[function_component(DashboardPage)]
pub fn dashboard_page() -> Html {
    let symbol = use_currency_symbol();
    let expenses = use_state(Vec::<Expense>::new);
    let allocation = use_state(Vec::<CategoryTotal>::new);
    let cashflow = use_state(Vec::<CategoryTotal>::new);
    let loading = use_state(|| true);
    let reload = use_state(|| 0u32);

    {
        let expenses = expenses.clone();
        let allocation = allocation.clone();
        let cashflow = cashflow.clone();
        let loading = loading.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    match api::fetch_expenses(0, 100).await {
                        Ok(list) => expenses.set(list),
                        Err(err) => log::error!("failed to fetch expenses: {}", err),
                    }
                    match api::fetch_allocation().await {
                        Ok(rows) => allocation.set(rows),
                        Err(err) => log::warn!("failed to fetch allocation: {}", err),
                    }
                    match api::fetch_cashflow().await {
                        Ok(rows) => cashflow.set(rows),
                        Err(err) => log::warn!("failed to fetch cashflow: {}", err),
                    }
                    loading.set(false);
                });
                || ()
            },
            *reload,
        );
    }

    let refresh = {
        let reload = reload.clone();
        Callback::from(move |_: ()| reload.set(*reload + 1))
    };

    // "expense_added" arrives on the stream's side channel when the
    // assistant records an expense for the user
    let on_chat_action = {
        let refresh = refresh.clone();
        Callback::from(move |action: String| {
            if action == "expense_added" {
                refresh.emit(());
            } else {
                log::debug!("unhandled chat action: {}", action);
            }
        })
    };

    let on_expense_saved = {
        let refresh = refresh.clone();
        Callback::from(move |_| refresh.emit(()))
    };

    let on_download = {
        let expenses = expenses.clone();
        Callback::from(move |_| download_report(&expenses))
    };

    let total_spending: f64 = expenses.iter().map(|e| e.amount).sum();
    let top_category = allocation
        .iter()
        .max_by(|a, b| a.value.total_cmp(&b.value))
        .map(|row| row.name.clone())
        .unwrap_or_else(|| "—".to_string());

    html! {
        { page_shell(
            "Overview",
            html! {
                <button onclick={on_download} class="bg-secondary text-secondary-foreground px-4 py-2 rounded-xl font-bold text-sm hover:opacity-80 transition-all">
                    {"Download Report"}
                </button>
            },
            html! {
                <>
                    <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
                        <StatCard title="Total Spending" value={format_amount(total_spending, &symbol)} icon={StatIcon::CreditCard} />
                        <StatCard title="Expenses Recorded" value={expenses.len().to_string()} icon={StatIcon::Wallet} />
                        <StatCard title="Top Category" value={top_category} icon={StatIcon::UpRight} />
                    </div>

                    <div class="grid grid-cols-1 xl:grid-cols-3 gap-6 items-start">
                        <div class="xl:col-span-2 space-y-6">
                            <div class="grid grid-cols-1 lg:grid-cols-2 gap-6">
                                <div class="bg-card rounded-[10px] p-6 border border-border">
                                    <h3 class="font-bold text-foreground text-lg mb-4">{"Spending by Category"}</h3>
                                    {
                                        if *loading {
                                            html! { <p class="text-sm text-muted-foreground">{"Loading..."}</p> }
                                        } else {
                                            html! { <DynamicChart data={ChartData::from_totals("pie", "", &allocation)} /> }
                                        }
                                    }
                                </div>
                                <div class="bg-card rounded-[10px] p-6 border border-border">
                                    <h3 class="font-bold text-foreground text-lg mb-4">{"Monthly Cashflow"}</h3>
                                    {
                                        if *loading {
                                            html! { <p class="text-sm text-muted-foreground">{"Loading..."}</p> }
                                        } else {
                                            html! { <DynamicChart data={ChartData::from_totals("bar", "", &cashflow)} /> }
                                        }
                                    }
                                </div>
                            </div>

                            <div class="bg-card rounded-[10px] p-6 border border-border">
                                <h4 class="text-foreground font-bold text-[15px] mb-3">{"Add New Expense"}</h4>
                                <ExpenseForm on_saved={on_expense_saved} />
                            </div>

                            <ExpenseList expenses={(*expenses).clone()} loading={*loading} />
                        </div>

                        <div class="xl:col-span-1 h-[600px] sticky top-6">
                            <ChatPanel on_action={Some(on_chat_action)} />
                        </div>
                    </div>
                </>
            }
        ) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(date: Option<&str>, category: &str, amount: f64, description: Option<&str>) -> Expense {
        Expense {
            id: 1,
            amount,
            category: category.to_string(),
            description: description.map(String::from),
            date: date.map(String::from),
        }
    }

    #[test]
    fn report_has_header_and_one_row_per_expense() {
        let rows = vec![
            expense(Some("2025-03-01"), "Food", 12.5, Some("lunch")),
            expense(None, "Bills", 80.0, None),
        ];
        let csv = report_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Date,Category,Amount,Description");
        assert_eq!(lines[1], "2025-03-01,Food,12.5,\"lunch\"");
        assert_eq!(lines[2], ",Bills,80,\"\"");
    }

    #[test]
    fn quotes_in_descriptions_are_escaped() {
        let rows = vec![expense(
            Some("2025-03-02"),
            "Shopping",
            5.0,
            Some("\"fancy\" socks"),
        )];
        let csv = report_csv(&rows);
        assert!(csv.contains("\"\"\"fancy\"\" socks\""));
    }
}
