use gloo_net::http::{Request, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const TOKEN_KEY: &str = "access_token";

pub fn api_base() -> &'static str {
    option_env!("FINANCE_API_URL").unwrap_or(DEFAULT_API_URL)
}

/// Websocket base derived from the HTTP base by swapping the scheme.
pub fn ws_base() -> String {
    let base = api_base();
    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        format!("ws://{}", base)
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not signed in")]
    Unauthenticated,
    #[error("request failed: {0}")]
    Network(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("{0}")]
    Backend(String),
}

impl From<gloo_net::Error> for ApiError {
    fn from(err: gloo_net::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

fn decode_err(err: gloo_net::Error) -> ApiError {
    ApiError::Decode(err.to_string())
}

pub fn load_token() -> Option<String> {
    let window = web_sys::window()?;
    let storage = window.local_storage().ok()??;
    storage
        .get_item(TOKEN_KEY)
        .ok()?
        .filter(|token| !token.is_empty())
}

pub fn store_token(token: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.set_item(TOKEN_KEY, token);
        }
    }
}

pub fn clear_token() {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.remove_item(TOKEN_KEY);
        }
    }
}

fn authorized(builder: RequestBuilder) -> RequestBuilder {
    match load_token() {
        Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
        None => builder,
    }
}

fn require_token() -> Result<(), ApiError> {
    if load_token().is_none() {
        return Err(ApiError::Unauthenticated);
    }
    Ok(())
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCreate {
    pub amount: f64,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserProfile {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct CategoryTotal {
    pub name: String,
    pub value: f64,
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct Tool {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub json_schema: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl Tool {
    pub fn is_saved(&self) -> bool {
        self.status.as_deref() == Some("saved")
    }
}

#[derive(Clone, PartialEq, Deserialize)]
pub struct ToolRunResult {
    #[serde(default)]
    pub output: serde_json::Value,
    #[serde(default)]
    pub visualization: Option<serde_json::Value>,
    #[serde(default)]
    pub logs: Vec<String>,
}

pub async fn fetch_expenses(skip: u32, limit: u32) -> Result<Vec<Expense>, ApiError> {
    let url = format!("{}/expenses/?skip={}&limit={}", api_base(), skip, limit);
    let resp = authorized(Request::get(&url)).send().await?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    resp.json().await.map_err(decode_err)
}

pub async fn create_expense(expense: &ExpenseCreate) -> Result<Expense, ApiError> {
    require_token()?;
    let url = format!("{}/expenses/", api_base());
    let resp = authorized(Request::post(&url)).json(expense)?.send().await?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    resp.json().await.map_err(decode_err)
}

pub async fn fetch_profile() -> Result<UserProfile, ApiError> {
    require_token()?;
    let url = format!("{}/users/me", api_base());
    let resp = authorized(Request::get(&url)).send().await?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    resp.json().await.map_err(decode_err)
}

pub async fn update_profile(full_name: &str) -> Result<UserProfile, ApiError> {
    require_token()?;
    let url = format!("{}/users/me", api_base());
    let body = serde_json::json!({ "full_name": full_name });
    let resp = authorized(Request::put(&url)).json(&body)?.send().await?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    resp.json().await.map_err(decode_err)
}

pub async fn clear_account_data() -> Result<(), ApiError> {
    require_token()?;
    let url = format!("{}/users/me/data", api_base());
    let resp = authorized(Request::delete(&url)).send().await?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    Ok(())
}

pub async fn fetch_allocation() -> Result<Vec<CategoryTotal>, ApiError> {
    require_token()?;
    let url = format!("{}/analytics/allocation", api_base());
    let resp = authorized(Request::get(&url)).send().await?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    resp.json().await.map_err(decode_err)
}

pub async fn fetch_cashflow() -> Result<Vec<CategoryTotal>, ApiError> {
    require_token()?;
    let url = format!("{}/analytics/cashflow", api_base());
    let resp = authorized(Request::get(&url)).send().await?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    resp.json().await.map_err(decode_err)
}

/// Saved tools sort first, then newest, matching the listing the backend
/// serves unordered.
pub async fn fetch_tools() -> Result<Vec<Tool>, ApiError> {
    require_token()?;
    let url = format!("{}/tools", api_base());
    let resp = authorized(Request::get(&url)).send().await?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    let mut tools: Vec<Tool> = resp.json().await.map_err(decode_err)?;
    sort_tools(&mut tools);
    Ok(tools)
}

fn sort_tools(tools: &mut [Tool]) {
    tools.sort_by(|a, b| {
        b.is_saved()
            .cmp(&a.is_saved())
            .then_with(|| b.id.cmp(&a.id))
    });
}

pub async fn fetch_tool(name: &str) -> Result<Tool, ApiError> {
    let url = format!("{}/tools/{}", api_base(), name);
    let resp = authorized(Request::get(&url)).send().await?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    resp.json().await.map_err(decode_err)
}

pub async fn execute_tool(
    name: &str,
    args: &serde_json::Value,
) -> Result<ToolRunResult, ApiError> {
    require_token()?;
    let url = format!("{}/tools/{}/execute", api_base(), name);
    let body = serde_json::json!({ "args": args });
    let resp = authorized(Request::post(&url)).json(&body)?.send().await?;
    if !resp.ok() {
        // the backend reports tool failures as {"detail": "..."}
        let detail = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            .unwrap_or_else(|| "Execution failed".to_string());
        return Err(ApiError::Backend(detail));
    }
    resp.json().await.map_err(decode_err)
}

pub async fn save_tool(name: &str) -> Result<(), ApiError> {
    require_token()?;
    let url = format!("{}/tools/{}/save", api_base(), name);
    let resp = authorized(Request::post(&url)).send().await?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    Ok(())
}

pub async fn login(email: &str, password: &str) -> Result<String, ApiError> {
    auth_request("login", email, password).await
}

pub async fn register(email: &str, password: &str) -> Result<String, ApiError> {
    auth_request("register", email, password).await
}

async fn auth_request(endpoint: &str, email: &str, password: &str) -> Result<String, ApiError> {
    let url = format!("{}/auth/{}", api_base(), endpoint);
    let body = serde_json::json!({ "email": email, "password": password });
    let resp = Request::post(&url).json(&body)?.send().await?;
    if !resp.ok() {
        let message = resp
            .text()
            .await
            .unwrap_or_else(|_| "Sign in failed".to_string());
        return Err(ApiError::Backend(message));
    }
    let json: serde_json::Value = resp.json().await.map_err(decode_err)?;
    json.get("access_token")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| ApiError::Decode("missing access_token".to_string()))
}

/// The chat endpoint takes its inputs as query parameters; `client_ref`
/// is the correlation id echoed back on the persisted record.
pub fn chat_url(message: &str, chat_id: &str, client_ref: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("message", message)
        .append_pair("chat_id", chat_id)
        .append_pair("client_ref", client_ref)
        .finish();
    format!("{}/chat?{}", api_base(), query)
}

/// Issues the chat request and hands back the open response so the caller
/// can consume the NDJSON body incrementally. Refuses to touch the network
/// without a credential.
pub async fn send_chat(
    message: &str,
    chat_id: &str,
    client_ref: &str,
) -> Result<Response, ApiError> {
    require_token()?;
    let url = chat_url(message, chat_id, client_ref);
    let resp = authorized(Request::post(&url)).send().await?;
    if !resp.ok() {
        return Err(ApiError::Status(resp.status()));
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_url_encodes_query_values() {
        let url = chat_url("Show me a pie chart & totals", "default", "ref-1");
        assert!(url.starts_with(&format!("{}/chat?", api_base())));
        assert!(url.contains("message=Show+me+a+pie+chart+%26+totals"));
        assert!(url.contains("chat_id=default"));
        assert!(url.contains("client_ref=ref-1"));
    }

    #[test]
    fn ws_base_swaps_scheme() {
        let ws = ws_base();
        assert!(ws.starts_with("ws://") || ws.starts_with("wss://"));
        assert!(!ws.contains("http://"));
    }

    #[test]
    fn saved_tools_sort_first_then_newest() {
        let mut tools = vec![
            Tool {
                id: 3,
                name: "c".into(),
                title: None,
                description: None,
                json_schema: String::new(),
                status: None,
            },
            Tool {
                id: 1,
                name: "a".into(),
                title: None,
                description: None,
                json_schema: String::new(),
                status: Some("saved".into()),
            },
            Tool {
                id: 2,
                name: "b".into(),
                title: None,
                description: None,
                json_schema: String::new(),
                status: None,
            },
        ];
        sort_tools(&mut tools);
        let order: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
    }
}
