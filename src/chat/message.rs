use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// One chat message. `id` and `timestamp` are assigned by the backend once
/// the message is persisted; optimistic entries carry neither. `client_ref`
/// is the correlation id generated at send time and echoed back on the
/// persisted record.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
}

/// Rich attachment carried by assistant messages. Older records nest the
/// kind under `component` instead of `type`, so this is read out of the raw
/// value rather than derived.
#[derive(Clone, PartialEq, Debug)]
pub struct MessageComponent {
    pub kind: String,
    pub data: serde_json::Value,
}

impl MessageComponent {
    pub fn from_value(raw: &serde_json::Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let kind = obj
            .get("type")
            .or_else(|| obj.get("component"))?
            .as_str()?
            .to_string();
        let data = obj.get("data").cloned().unwrap_or(serde_json::Value::Null);
        Some(Self { kind, data })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeliveryState {
    Sending,
    Failed,
}

/// A locally-sent message not yet confirmed by the history subscription.
#[derive(Clone, PartialEq, Debug)]
pub struct PendingMessage {
    pub client_ref: String,
    pub role: ChatRole,
    pub content: String,
    pub state: DeliveryState,
}

impl PendingMessage {
    pub fn user(content: String) -> Self {
        Self {
            client_ref: Uuid::new_v4().to_string(),
            role: ChatRole::User,
            content,
            state: DeliveryState::Sending,
        }
    }
}

/// Entry in the merged display list. `delivery` is `None` for persisted
/// messages and carries the pending state otherwise.
#[derive(Clone, PartialEq, Debug)]
pub struct DisplayMessage {
    pub message: ChatMessage,
    pub delivery: Option<DeliveryState>,
}

/// Merges the authoritative remote sequence with the optimistic buffer:
/// remote messages first, in their order, then every pending entry the
/// remote side has not confirmed. A remote record confirms a pending entry
/// by echoing its correlation ref; records without one fall back to a
/// (role, content) match, which conflates identical back-to-back sends.
pub fn reconcile(remote: &[ChatMessage], pending: &[PendingMessage]) -> Vec<DisplayMessage> {
    let mut merged: Vec<DisplayMessage> = remote
        .iter()
        .cloned()
        .map(|message| DisplayMessage {
            message,
            delivery: None,
        })
        .collect();

    for entry in pending {
        let confirmed = remote.iter().any(|message| match &message.client_ref {
            Some(echoed) => *echoed == entry.client_ref,
            None => message.role == entry.role && message.content == entry.content,
        });
        if !confirmed {
            merged.push(DisplayMessage {
                message: ChatMessage {
                    id: None,
                    role: entry.role,
                    content: entry.content.clone(),
                    component: None,
                    timestamp: None,
                    client_ref: Some(entry.client_ref.clone()),
                },
                delivery: Some(entry.state),
            });
        }
    }

    merged
}

/// Prompts seeded by the tool runner are persisted like any other user
/// message but must never show up as something the user typed.
pub fn is_hidden_prompt(content: &str) -> bool {
    content.contains("Here is the financial data") || content.contains("I just ran the tool")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persisted(role: ChatRole, content: &str) -> ChatMessage {
        ChatMessage {
            id: Some(format!("doc-{}", content.len())),
            role,
            content: content.to_string(),
            component: None,
            timestamp: Some(1_700_000_000.0),
            client_ref: None,
        }
    }

    fn pending_user(content: &str) -> PendingMessage {
        PendingMessage::user(content.to_string())
    }

    #[test]
    fn remote_order_is_preserved_and_unconfirmed_pending_appended() {
        let remote = vec![
            persisted(ChatRole::User, "what did I spend on food?"),
            persisted(ChatRole::Assistant, "You spent $120 on food."),
        ];
        let pending = vec![pending_user("and on transport?")];

        let merged = reconcile(&remote, &pending);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].message.content, "what did I spend on food?");
        assert_eq!(merged[1].message.content, "You spent $120 on food.");
        assert_eq!(merged[2].message.content, "and on transport?");
        assert_eq!(merged[2].delivery, Some(DeliveryState::Sending));
    }

    #[test]
    fn pending_confirmed_by_content_match_is_dropped() {
        let remote = vec![persisted(ChatRole::User, "hello")];
        let pending = vec![pending_user("hello")];

        let merged = reconcile(&remote, &pending);

        assert_eq!(merged.len(), 1);
        assert!(merged[0].delivery.is_none());
    }

    #[test]
    fn content_match_does_not_cross_roles() {
        let remote = vec![persisted(ChatRole::Assistant, "hello")];
        let pending = vec![pending_user("hello")];

        let merged = reconcile(&remote, &pending);

        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn echoed_ref_confirms_exactly_one_entry() {
        // two identical sends: the remote record echoes the first ref, so
        // only the first pending entry is considered confirmed
        let first = pending_user("pay rent");
        let second = pending_user("pay rent");
        let mut confirmed = persisted(ChatRole::User, "pay rent");
        confirmed.client_ref = Some(first.client_ref.clone());

        let merged = reconcile(&[confirmed], &[first, second.clone()]);

        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged[1].message.client_ref.as_deref(),
            Some(second.client_ref.as_str())
        );
    }

    #[test]
    fn empty_pending_yields_remote_as_is() {
        let remote = vec![
            persisted(ChatRole::User, "a"),
            persisted(ChatRole::Assistant, "b"),
        ];
        let merged = reconcile(&remote, &[]);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|m| m.delivery.is_none()));
    }

    #[test]
    fn failed_entries_stay_visible_with_their_state() {
        let mut entry = pending_user("did not make it");
        entry.state = DeliveryState::Failed;

        let merged = reconcile(&[], &[entry]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].delivery, Some(DeliveryState::Failed));
    }

    #[test]
    fn hidden_prompts_are_detected() {
        assert!(is_hidden_prompt(
            "Here is the financial data from the 'Loan Calculator' calculation: {}"
        ));
        assert!(is_hidden_prompt("I just ran the tool and got this back"));
        assert!(!is_hidden_prompt("what is my balance?"));
    }

    #[test]
    fn legacy_component_key_is_recognized() {
        let modern = serde_json::json!({ "type": "chart", "data": { "title": "t" } });
        let legacy = serde_json::json!({ "component": "chart", "data": {} });
        assert_eq!(
            MessageComponent::from_value(&modern).map(|c| c.kind),
            Some("chart".to_string())
        );
        assert_eq!(
            MessageComponent::from_value(&legacy).map(|c| c.kind),
            Some("chart".to_string())
        );
        assert!(MessageComponent::from_value(&serde_json::json!("chart")).is_none());
    }
}
