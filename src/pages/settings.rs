use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::api;
use crate::{currency_symbol_for, page_shell, save_settings, AppSettings, Session};

#[function_component(SettingsPage)]
pub fn settings_page() -> Html {
    let settings = use_context::<UseStateHandle<AppSettings>>();
    let session = use_context::<UseStateHandle<Session>>();

    let current_currency = settings
        .as_ref()
        .map(|s| s.currency_code.clone())
        .unwrap_or_else(|| "USD".to_string());

    let on_currency_change = {
        let settings = settings.clone();
        Callback::from(move |e: Event| {
            if let Some(settings) = settings.as_ref() {
                let input: HtmlSelectElement = e.target_unchecked_into();
                let code = input.value();
                let symbol = currency_symbol_for(&code).to_string();
                let next = AppSettings {
                    currency_code: code,
                    currency_symbol: symbol,
                };
                save_settings(&next);
                settings.set(next);
            }
        })
    };

    let full_name = use_state(|| "".to_string());
    let profile_notice = use_state(|| None::<String>);
    let profile_saving = use_state(|| false);

    // fill the form once the profile is in
    {
        let full_name = full_name.clone();
        let current = session
            .as_ref()
            .and_then(|s| s.profile.as_ref())
            .and_then(|p| p.full_name.clone());
        use_effect_with_deps(
            move |name: &Option<String>| {
                if let Some(name) = name {
                    full_name.set(name.clone());
                }
                || ()
            },
            current,
        );
    }

    let on_save_profile = {
        let full_name = full_name.clone();
        let profile_notice = profile_notice.clone();
        let profile_saving = profile_saving.clone();
        let session = session.clone();
        Callback::from(move |_| {
            if *profile_saving {
                return;
            }
            profile_saving.set(true);
            profile_notice.set(None);
            let name = full_name.trim().to_string();
            let profile_notice = profile_notice.clone();
            let profile_saving = profile_saving.clone();
            let session = session.clone();
            spawn_local(async move {
                match api::update_profile(&name).await {
                    Ok(profile) => {
                        if let Some(session) = session.as_ref() {
                            session.set(Session {
                                token: api::load_token(),
                                profile: Some(profile),
                            });
                        }
                        profile_notice.set(Some("Profile updated.".to_string()));
                    }
                    Err(err) => {
                        log::error!("failed to update profile: {}", err);
                        profile_notice.set(Some("Could not update your profile.".to_string()));
                    }
                }
                profile_saving.set(false);
            });
        })
    };

    let clear_notice = use_state(|| None::<String>);
    let on_clear_data = {
        let clear_notice = clear_notice.clone();
        Callback::from(move |_| {
            let confirmed = web_sys::window()
                .and_then(|w| {
                    w.confirm_with_message(
                        "Are you sure you want to clear all data? This action cannot be undone.",
                    )
                    .ok()
                })
                .unwrap_or(false);
            if !confirmed {
                return;
            }
            let clear_notice = clear_notice.clone();
            spawn_local(async move {
                match api::clear_account_data().await {
                    Ok(()) => clear_notice.set(Some("All data cleared.".to_string())),
                    Err(err) => {
                        log::error!("failed to clear data: {}", err);
                        clear_notice.set(Some("Could not clear your data.".to_string()));
                    }
                }
            });
        })
    };

    let email = session
        .as_ref()
        .and_then(|s| s.profile.as_ref())
        .map(|p| p.email.clone())
        .unwrap_or_default();

    html! {
        { page_shell(
            "Settings",
            html! {},
            html! {
                <>
                    <div class="grid grid-cols-1 md:grid-cols-2 gap-6">
                        <div class="bg-card rounded-lg p-6 border border-border">
                            <h2 class="text-xl font-bold text-foreground mb-6">{"Preferences"}</h2>
                            <div class="space-y-4">
                                <div>
                                    <label class="block text-sm font-medium text-foreground mb-2">{"Currency"}</label>
                                    <select value={current_currency} onchange={on_currency_change} class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary">
                                        <option value="USD">{"USD ($)"}</option>
                                        <option value="EUR">{"EUR (€)"}</option>
                                        <option value="GBP">{"GBP (£)"}</option>
                                        <option value="JPY">{"JPY (¥)"}</option>
                                        <option value="PHP">{"PHP (₱)"}</option>
                                    </select>
                                    <p class="text-xs text-muted-foreground mt-2">{"Currency updates are applied across the dashboard and reports."}</p>
                                </div>
                            </div>
                        </div>

                        <div class="bg-card rounded-lg p-6 border border-border">
                            <h2 class="text-xl font-bold text-foreground mb-6">{"Profile"}</h2>
                            <div class="space-y-4">
                                <div>
                                    <label class="block text-sm font-medium text-foreground mb-2">{"Email"}</label>
                                    <div class="p-2 border border-border rounded-md bg-muted text-muted-foreground text-sm">
                                        { if email.is_empty() { "—".to_string() } else { email } }
                                    </div>
                                </div>
                                <div>
                                    <label class="block text-sm font-medium text-foreground mb-2">{"Display Name"}</label>
                                    <input
                                        type="text"
                                        value={(*full_name).clone()}
                                        oninput={{
                                            let full_name = full_name.clone();
                                            Callback::from(move |e: InputEvent| {
                                                let input: HtmlInputElement = e.target_unchecked_into();
                                                full_name.set(input.value());
                                            })
                                        }}
                                        class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary"
                                    />
                                </div>
                                <button onclick={on_save_profile} disabled={*profile_saving} class="bg-primary text-primary-foreground px-4 py-2 rounded-lg font-semibold text-sm disabled:opacity-50">
                                    { if *profile_saving { "Saving..." } else { "Save Profile" } }
                                </button>
                                {
                                    if let Some(notice) = &*profile_notice {
                                        html! { <p class="text-sm text-muted-foreground">{ notice.clone() }</p> }
                                    } else {
                                        html! {}
                                    }
                                }
                            </div>
                        </div>
                    </div>

                    <div class="bg-card rounded-lg p-6 border border-border">
                        <h2 class="text-xl font-bold text-foreground mb-6">{"Data Management"}</h2>
                        <div class="flex items-center justify-between">
                            <div>
                                <h3 class="font-medium text-foreground">{"Clear Data"}</h3>
                                <p class="text-sm text-muted-foreground">{"Remove all expenses and reset your account."}</p>
                            </div>
                            <button onclick={on_clear_data} class="bg-red-600 text-white px-4 py-2 rounded-lg font-semibold text-sm hover:opacity-90">
                                {"Clear All Data"}
                            </button>
                        </div>
                        {
                            if let Some(notice) = &*clear_notice {
                                html! { <p class="text-sm text-muted-foreground mt-3">{ notice.clone() }</p> }
                            } else {
                                html! {}
                            }
                        }
                    </div>
                </>
            }
        ) }
    }
}
