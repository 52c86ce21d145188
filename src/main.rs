use serde::{Deserialize, Serialize};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

mod api;
mod charts;
mod chat;
mod pages;
mod tools;

use api::UserProfile;
use pages::chat::ChatPage;
use pages::dashboard::DashboardPage;
use pages::expenses::ExpensesPage;
use pages::settings::SettingsPage;
use pages::tools::ToolsPage;
use tools::runner::ToolRunnerPage;

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub currency_code: String,
    pub currency_symbol: String,
}

fn default_settings() -> AppSettings {
    AppSettings {
        currency_code: "USD".to_string(),
        currency_symbol: "$".to_string(),
    }
}

fn load_settings() -> AppSettings {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            if let Ok(Some(raw)) = storage.get_item("settings") {
                if let Ok(settings) = serde_json::from_str::<AppSettings>(&raw) {
                    return settings;
                }
            }
        }
    }
    default_settings()
}

pub fn save_settings(settings: &AppSettings) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            if let Ok(raw) = serde_json::to_string(settings) {
                let _ = storage.set_item("settings", &raw);
            }
        }
    }
}

pub fn currency_symbol_for(code: &str) -> &'static str {
    match code {
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "PHP" => "₱",
        _ => "$",
    }
}

#[hook]
pub fn use_currency_symbol() -> String {
    let settings = use_context::<UseStateHandle<AppSettings>>();
    settings
        .as_ref()
        .map(|s| s.currency_symbol.clone())
        .unwrap_or_else(|| "$".to_string())
}

/// Signed-in user state shared through context. `token` present means a
/// credential is stored; `profile` fills in once `/users/me` answers.
#[derive(Clone, PartialEq, Default)]
pub struct Session {
    pub token: Option<String>,
    pub profile: Option<UserProfile>,
}

#[derive(Clone, Copy, PartialEq)]
enum AuthStatus {
    Checking,
    Authenticated,
    Unauthenticated,
}

#[derive(Clone, PartialEq)]
pub enum Page {
    Dashboard,
    Expenses,
    Chat(Option<String>),
    Tools,
    ToolRun(String),
    Settings,
}

fn nav_active(current: &Page, target: &Page) -> bool {
    match (current, target) {
        (Page::Chat(_), Page::Chat(_)) => true,
        (Page::ToolRun(_), Page::Tools) => true,
        _ => current == target,
    }
}

pub fn format_with_commas(value: i64) -> String {
    let is_negative = value < 0;
    let s = value.abs().to_string().chars().rev().collect::<Vec<char>>();
    let mut out = Vec::new();
    for (i, ch) in s.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    let formatted: String = out.into_iter().rev().collect();
    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

pub fn format_amount(amount: f64, symbol: &str) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();
    let mut whole = abs.trunc() as i64;
    let mut cents = ((abs - abs.trunc()) * 100.0).round() as i64;
    if cents == 100 {
        whole += 1;
        cents = 0;
    }
    format!(
        "{}{}{}.{:02}",
        sign,
        symbol,
        format_with_commas(whole),
        cents
    )
}

struct NavItem {
    label: &'static str,
    target: Page,
    icon: fn() -> Html,
}

#[derive(Properties, PartialEq)]
struct LayoutProps {
    children: Children,
    active_page: Page,
    on_select: Callback<Page>,
}

#[function_component(Layout)]
fn layout(props: &LayoutProps) -> Html {
    html! {
        <div class="flex h-screen bg-background">
            <div class="hidden md:flex">
                <Sidebar active_page={props.active_page.clone()} on_select={props.on_select.clone()} />
            </div>

            <div class="flex-1 flex flex-col overflow-hidden">
                <Header />
                <main class="flex-1 overflow-y-auto">
                    { for props.children.iter() }
                </main>
            </div>
        </div>
    }
}

#[function_component(Header)]
fn header() -> Html {
    let session = use_context::<UseStateHandle<Session>>();
    let user_name = session
        .as_ref()
        .and_then(|s| s.profile.as_ref())
        .map(|profile| {
            profile
                .full_name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| {
                    profile
                        .email
                        .split('@')
                        .next()
                        .unwrap_or("Guest")
                        .to_string()
                })
        })
        .unwrap_or_else(|| "Guest".to_string());

    let hour = js_sys::Date::new_0().get_hours();
    let greeting = if hour < 12 {
        "Good Morning"
    } else if hour < 18 {
        "Good Afternoon"
    } else {
        "Good Evening"
    };

    html! {
        <header class="bg-[#D8E1E8] border-b border-border h-16 flex items-center justify-between px-6">
            <div>
                <h2 class="text-foreground font-bold">{ format!("{}, {}", greeting, user_name) }</h2>
                <p class="text-xs text-muted-foreground">{"Here's your financial overview today."}</p>
            </div>
        </header>
    }
}

#[derive(Properties, PartialEq)]
struct SidebarProps {
    active_page: Page,
    on_select: Callback<Page>,
}

#[function_component(Sidebar)]
fn sidebar(props: &SidebarProps) -> Html {
    let nav_items = vec![
        NavItem {
            label: "Dashboard",
            target: Page::Dashboard,
            icon: icon_layout_grid,
        },
        NavItem {
            label: "Expenses",
            target: Page::Expenses,
            icon: icon_credit_card,
        },
        NavItem {
            label: "Assistant",
            target: Page::Chat(None),
            icon: icon_message_square,
        },
        NavItem {
            label: "Tools",
            target: Page::Tools,
            icon: icon_wrench,
        },
        NavItem {
            label: "Settings",
            target: Page::Settings,
            icon: icon_settings,
        },
    ];

    let on_logout = Callback::from(move |_| {
        api::clear_token();
        if let Some(window) = web_sys::window() {
            let _ = window.location().reload();
        }
    });

    html! {
        <div class="w-[220px] h-screen bg-[#D8E1E8] p-4 flex flex-col">
            <div class="flex items-center gap-3 px-2 mb-8">
                <div class="w-10 h-10 bg-[#173E63] rounded-full flex items-center justify-center text-white font-black">
                    {"F"}
                </div>
                <span class="text-[#173E63] text-2xl font-black tracking-tight">{"Finance"}</span>
            </div>

            <div class="flex-1 bg-[#173E63] rounded-[24px] flex flex-col py-6 px-3 shadow-lg">
                <nav class="flex-1 space-y-2">
                    { for nav_items.iter().map(|item| {
                        let is_active = nav_active(&props.active_page, &item.target);
                        let class_name = if is_active {
                            "flex items-center gap-3 px-4 py-3 rounded-xl transition-all text-[13px] font-medium bg-[#B2CBDE] text-[#173E63] w-full"
                        } else {
                            "flex items-center gap-3 px-4 py-3 rounded-xl transition-all text-[13px] font-medium text-slate-300 hover:bg-white/5 hover:text-white w-full"
                        };
                        let on_select = props.on_select.clone();
                        let target = item.target.clone();

                        html! {
                            <button type="button" class={class_name} onclick={Callback::from(move |_| on_select.emit(target.clone()))}>
                                <span class="shrink-0">{ (item.icon)() }</span>
                                <span class="truncate whitespace-nowrap text-left">{ item.label }</span>
                            </button>
                        }
                    }) }
                </nav>

                <div class="mt-auto pt-4">
                    <button onclick={on_logout} class="flex items-center gap-3 w-full px-4 py-3 rounded-xl hover:bg-white/10 transition-colors text-[13px] font-medium text-slate-300">
                        { icon_log_out() }
                        <span>{"Log Out"}</span>
                    </button>
                </div>
            </div>
        </div>
    }
}

pub fn page_shell(title: &'static str, actions: Html, children: Html) -> Html {
    html! {
        <div class="p-6 max-w-7xl mx-auto">
            <div class="flex items-center justify-between pb-4 border-b border-border">
                <h1 class="text-2xl font-bold text-foreground">{ title }</h1>
                { actions }
            </div>
            <div class="pt-5 space-y-6">
                { children }
            </div>
        </div>
    }
}

#[function_component(App)]
fn app() -> Html {
    let active_page = use_state(|| Page::Dashboard);
    let auth_status = use_state(|| AuthStatus::Checking);
    let settings = use_state(load_settings);
    let session = use_state(Session::default);

    let on_select = {
        let active_page = active_page.clone();
        Callback::from(move |page: Page| active_page.set(page))
    };

    {
        let auth_status = auth_status.clone();
        let session = session.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    match api::load_token() {
                        None => auth_status.set(AuthStatus::Unauthenticated),
                        Some(token) => match api::fetch_profile().await {
                            Ok(profile) => {
                                session.set(Session {
                                    token: Some(token),
                                    profile: Some(profile),
                                });
                                auth_status.set(AuthStatus::Authenticated);
                            }
                            Err(api::ApiError::Status(401)) | Err(api::ApiError::Status(403)) => {
                                api::clear_token();
                                auth_status.set(AuthStatus::Unauthenticated);
                            }
                            Err(err) => {
                                // keep the stored token so a flaky backend
                                // doesn't sign the user out on refresh
                                log::warn!("profile fetch failed: {}", err);
                                session.set(Session {
                                    token: Some(token),
                                    profile: None,
                                });
                                auth_status.set(AuthStatus::Authenticated);
                            }
                        },
                    }
                });
                || ()
            },
            (),
        );
    }

    let on_authenticated = {
        let auth_status = auth_status.clone();
        let session = session.clone();
        Callback::from(move |_| {
            session.set(Session {
                token: api::load_token(),
                profile: None,
            });
            auth_status.set(AuthStatus::Authenticated);
            let session = session.clone();
            spawn_local(async move {
                match api::fetch_profile().await {
                    Ok(profile) => session.set(Session {
                        token: api::load_token(),
                        profile: Some(profile),
                    }),
                    Err(err) => log::warn!("profile fetch failed: {}", err),
                }
            });
        })
    };

    if *auth_status == AuthStatus::Checking {
        return html! {
            <div class="min-h-screen flex items-center justify-center bg-background text-muted-foreground">
                {"Checking session..."}
            </div>
        };
    }

    if *auth_status == AuthStatus::Unauthenticated {
        return html! { <AuthScreen on_authenticated={on_authenticated} /> };
    }

    let on_back_to_tools = {
        let on_select = on_select.clone();
        Callback::from(move |_| on_select.emit(Page::Tools))
    };

    let content = match &*active_page {
        Page::Dashboard => html! { <DashboardPage /> },
        Page::Expenses => html! { <ExpensesPage /> },
        Page::Chat(initial) => html! { <ChatPage initial_input={initial.clone()} /> },
        Page::Tools => html! { <ToolsPage on_navigate={on_select.clone()} /> },
        Page::ToolRun(name) => {
            html! { <ToolRunnerPage name={name.clone()} on_back={on_back_to_tools} /> }
        }
        Page::Settings => html! { <SettingsPage /> },
    };

    html! {
        <ContextProvider<UseStateHandle<AppSettings>> context={settings}>
            <ContextProvider<UseStateHandle<Session>> context={session}>
                <Layout active_page={(*active_page).clone()} on_select={on_select}>
                    { content }
                </Layout>
            </ContextProvider<UseStateHandle<Session>>>
        </ContextProvider<UseStateHandle<AppSettings>>>
    }
}

#[derive(Properties, PartialEq)]
struct AuthScreenProps {
    on_authenticated: Callback<()>,
}

#[function_component(AuthScreen)]
fn auth_screen(props: &AuthScreenProps) -> Html {
    let is_login = use_state(|| true);
    let email = use_state(|| "".to_string());
    let password = use_state(|| "".to_string());
    let confirm_password = use_state(|| "".to_string());
    let error = use_state(|| None::<String>);
    let loading = use_state(|| false);

    let on_submit = {
        let is_login = is_login.clone();
        let email = email.clone();
        let password = password.clone();
        let confirm_password = confirm_password.clone();
        let error = error.clone();
        let loading = loading.clone();
        let on_authenticated = props.on_authenticated.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let email_val = (*email).clone();
            let password_val = (*password).clone();
            let confirm_val = (*confirm_password).clone();
            let on_authenticated = on_authenticated.clone();

            if email_val.is_empty() || password_val.is_empty() {
                error.set(Some("Email and password are required".to_string()));
                return;
            }

            if password_val.len() < 8 {
                error.set(Some("Password must be at least 8 characters".to_string()));
                return;
            }

            if !*is_login && password_val != confirm_val {
                error.set(Some("Passwords do not match".to_string()));
                return;
            }

            loading.set(true);
            error.set(None);

            let is_login_now = *is_login;
            let error_async = error.clone();
            let loading_async = loading.clone();
            spawn_local(async move {
                let outcome = if is_login_now {
                    api::login(&email_val, &password_val).await
                } else {
                    api::register(&email_val, &password_val).await
                };

                match outcome {
                    Ok(token) => {
                        api::store_token(&token);
                        on_authenticated.emit(());
                    }
                    Err(api::ApiError::Backend(message)) => {
                        error_async.set(Some(message));
                    }
                    Err(err) => {
                        log::error!("sign in failed: {}", err);
                        error_async.set(Some("Network error".to_string()));
                    }
                }
                loading_async.set(false);
            });
        })
    };

    let toggle_mode = {
        let is_login = is_login.clone();
        Callback::from(move |_| is_login.set(!*is_login))
    };

    html! {
        <div class="min-h-screen flex items-center justify-center bg-background">
            <div class="w-full max-w-md bg-card border border-border rounded-2xl shadow-lg p-8">
                <div class="text-center mb-6">
                    <h1 class="text-2xl font-bold text-foreground">{ if *is_login { "Welcome back" } else { "Create account" } }</h1>
                    <p class="text-sm text-muted-foreground mt-2">
                        { if *is_login { "Sign in to continue." } else { "Start managing your finances." } }
                    </p>
                </div>

                <form class="space-y-4" onsubmit={on_submit}>
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-foreground">{"Email"}</label>
                        <input
                            type="email"
                            class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                            value={(*email).clone()}
                            oninput={{
                                let email = email.clone();
                                Callback::from(move |e: InputEvent| {
                                    let input: HtmlInputElement = e.target_unchecked_into();
                                    email.set(input.value());
                                })
                            }}
                        />
                    </div>
                    <div class="space-y-1">
                        <label class="text-sm font-medium text-foreground">{"Password"}</label>
                        <input
                            type="password"
                            class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                            value={(*password).clone()}
                            oninput={{
                                let password = password.clone();
                                Callback::from(move |e: InputEvent| {
                                    let input: HtmlInputElement = e.target_unchecked_into();
                                    password.set(input.value());
                                })
                            }}
                        />
                    </div>

                    if !*is_login {
                        <div class="space-y-1">
                            <label class="text-sm font-medium text-foreground">{"Confirm Password"}</label>
                            <input
                                type="password"
                                class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                                value={(*confirm_password).clone()}
                                oninput={{
                                    let confirm_password = confirm_password.clone();
                                    Callback::from(move |e: InputEvent| {
                                        let input: HtmlInputElement = e.target_unchecked_into();
                                        confirm_password.set(input.value());
                                    })
                                }}
                            />
                        </div>
                    }

                    if let Some(msg) = &*error {
                        <div class="text-sm text-red-500">{ msg.clone() }</div>
                    }

                    <button
                        type="submit"
                        class="w-full bg-primary text-primary-foreground py-2 rounded-lg font-semibold hover:opacity-90 transition-opacity"
                        disabled={*loading}
                    >
                        { if *loading { "Please wait..." } else if *is_login { "Login" } else { "Sign up" } }
                    </button>
                </form>

                <div class="mt-6 text-center text-sm text-muted-foreground">
                    { if *is_login { "No account?" } else { "Already have an account?" } }
                    <button class="ml-2 text-primary font-semibold" onclick={toggle_mode}>
                        { if *is_login { "Sign up" } else { "Login" } }
                    </button>
                </div>
            </div>
        </div>
    }
}

fn icon_base(path: &'static str) -> Html {
    html! {
        <svg width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="text-foreground">
            <path d={path}></path>
        </svg>
    }
}

fn icon_layout_grid() -> Html {
    icon_base("M3 3h8v8H3zM13 3h8v8h-8zM3 13h8v8H3zM13 13h8v8h-8z")
}
pub fn icon_wallet() -> Html {
    icon_base("M3 7h18v10H3zM16 7V5H5v2")
}
pub fn icon_credit_card() -> Html {
    icon_base("M3 7h18v10H3zM3 11h18")
}
fn icon_message_square() -> Html {
    icon_base("M21 15a2 2 0 01-2 2H7l-4 4V5a2 2 0 012-2h14a2 2 0 012 2z")
}
fn icon_wrench() -> Html {
    icon_base("M14.7 6.3a1 1 0 000 1.4l1.6 1.6a1 1 0 001.4 0l3.77-3.77a6 6 0 01-7.94 7.94l-6.91 6.91a2.12 2.12 0 01-3-3l6.91-6.91a6 6 0 017.94-7.94l-3.76 3.76z")
}
fn icon_settings() -> Html {
    icon_base("M12 1v3M12 20v3M4.2 4.2l2.1 2.1M17.7 17.7l2.1 2.1M1 12h3M20 12h3M4.2 19.8l2.1-2.1M17.7 6.3l2.1-2.1")
}
fn icon_log_out() -> Html {
    icon_base("M9 21H5a2 2 0 01-2-2V5a2 2 0 012-2h4M16 17l5-5-5-5M21 12H9")
}
pub fn icon_arrow_up_right() -> Html {
    icon_base("M7 17L17 7M7 7h10v10")
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commas_group_thousands() {
        assert_eq!(format_with_commas(0), "0");
        assert_eq!(format_with_commas(999), "999");
        assert_eq!(format_with_commas(1_000), "1,000");
        assert_eq!(format_with_commas(1_234_567), "1,234,567");
        assert_eq!(format_with_commas(-45_000), "-45,000");
    }

    #[test]
    fn amounts_format_with_symbol_and_cents() {
        assert_eq!(format_amount(0.0, "$"), "$0.00");
        assert_eq!(format_amount(1234.5, "$"), "$1,234.50");
        assert_eq!(format_amount(-12.5, "€"), "-€12.50");
        assert_eq!(format_amount(45.99, "$"), "$45.99");
        assert_eq!(format_amount(999.999, "$"), "$1,000.00");
    }

    #[test]
    fn chat_and_tool_variants_highlight_their_nav_entries() {
        assert!(nav_active(
            &Page::Chat(Some("Run Budget Auditor".to_string())),
            &Page::Chat(None)
        ));
        assert!(nav_active(
            &Page::ToolRun("loan_calculator".to_string()),
            &Page::Tools
        ));
        assert!(nav_active(&Page::Settings, &Page::Settings));
        assert!(!nav_active(&Page::Expenses, &Page::Dashboard));
    }
}
