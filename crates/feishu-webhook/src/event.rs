//! Subscription events
//!
//! `Event::decode` maps the event's `type` tag to a variant. Tags without a
//! variant decode to `Event::Unsupported` with the raw body kept.

use std::collections::HashMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// `app_ticket`: pushed to public apps roughly every hour.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppTicket {
    pub app_id: String,
    pub app_ticket: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserRef {
    pub open_id: String,
    pub user_id: String,
}

/// `app_open`: a tenant enabled the app for the first time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppOpen {
    pub app_id: String,
    pub tenant_key: String,
    pub applicants: Vec<UserRef>,
    pub installer: UserRef,
}

/// `app_status_change`: a tenant started or stopped the app.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppStatusChange {
    pub app_id: String,
    pub tenant_key: String,
    pub status: String,
}

/// `order_paid`: a tenant bought a plan in the app store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderPaid {
    pub app_id: String,
    pub tenant_key: String,
    pub order_id: String,
    pub price_plan_id: String,
    pub price_plan_type: String,
    pub seats: i64,
    pub buy_count: i64,
    pub create_time: String,
    pub pay_time: String,
    pub buy_type: String,
    pub src_order_id: String,
    pub order_pay_price: u64,
}

/// `app_uninstalled`: a tenant removed the app.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppUninstalled {
    pub app_id: String,
    pub tenant_key: String,
}

/// `add_bot` / `remove_bot`: the bot joined or left a group chat.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BotMembership {
    pub app_id: String,
    pub tenant_key: String,
    pub chat_i18n_names: HashMap<String, String>,
    pub chat_name: String,
    pub chat_owner_employee_id: String,
    pub chat_owner_name: String,
    pub chat_owner_open_id: String,
    pub open_chat_id: String,
    pub operator_employee_id: String,
    pub operator_name: String,
    pub operator_open_id: String,
    pub owner_is_bot: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatUser {
    pub name: String,
    pub open_id: String,
    pub user_id: String,
}

/// `p2p_chat_create`: a user opened a direct chat with the bot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct P2pChatCreate {
    pub app_id: String,
    pub tenant_key: String,
    pub chat_id: String,
    pub operator: UserRef,
    pub user: ChatUser,
}

/// `message`: a message sent to the bot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Message {
    pub app_id: String,
    pub tenant_key: String,
    pub root_id: String,
    pub parent_id: String,
    pub open_chat_id: String,
    pub chat_type: String,
    pub msg_type: String,
    pub open_id: String,
    pub open_message_id: String,
    pub is_mention: bool,
    pub text: String,
    pub text_without_at_bot: String,
    pub title: String,
    pub image_keys: Vec<String>,
    pub image_height: String,
    pub image_width: String,
    pub image_key: String,
    pub file_key: String,
}

/// `message_read`: a user read messages sent by the bot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageRead {
    pub app_id: String,
    pub tenant_key: String,
    pub open_chat_id: String,
    pub open_id: String,
    pub open_message_ids: Vec<String>,
}

/// A decoded subscription event.
#[derive(Debug, Clone)]
pub enum Event {
    AppTicket(AppTicket),
    AppOpen(AppOpen),
    AppStatusChange(AppStatusChange),
    OrderPaid(OrderPaid),
    AppUninstalled(AppUninstalled),
    AddBot(BotMembership),
    RemoveBot(BotMembership),
    P2pChatCreate(P2pChatCreate),
    Message(Message),
    MessageRead(MessageRead),
    Unsupported { kind: String, raw: Value },
}

impl Event {
    /// Decode an `event` body by its `type` tag.
    pub fn decode(raw: &Value) -> Result<Self> {
        let kind = raw.get("type").and_then(Value::as_str).unwrap_or_default();
        let event = match kind {
            "app_ticket" => Event::AppTicket(parse(kind, raw)?),
            "app_open" => Event::AppOpen(parse(kind, raw)?),
            "app_status_change" => Event::AppStatusChange(parse(kind, raw)?),
            "order_paid" => Event::OrderPaid(parse(kind, raw)?),
            "app_uninstalled" => Event::AppUninstalled(parse(kind, raw)?),
            "add_bot" => Event::AddBot(parse(kind, raw)?),
            "remove_bot" => Event::RemoveBot(parse(kind, raw)?),
            "p2p_chat_create" => Event::P2pChatCreate(parse(kind, raw)?),
            "message" => Event::Message(parse(kind, raw)?),
            "message_read" => Event::MessageRead(parse(kind, raw)?),
            other => Event::Unsupported {
                kind: other.to_owned(),
                raw: raw.clone(),
            },
        };
        Ok(event)
    }

    /// The `type` tag this event was decoded from.
    pub fn kind(&self) -> &str {
        match self {
            Event::AppTicket(_) => "app_ticket",
            Event::AppOpen(_) => "app_open",
            Event::AppStatusChange(_) => "app_status_change",
            Event::OrderPaid(_) => "order_paid",
            Event::AppUninstalled(_) => "app_uninstalled",
            Event::AddBot(_) => "add_bot",
            Event::RemoveBot(_) => "remove_bot",
            Event::P2pChatCreate(_) => "p2p_chat_create",
            Event::Message(_) => "message",
            Event::MessageRead(_) => "message_read",
            Event::Unsupported { kind, .. } => kind.as_str(),
        }
    }
}

fn parse<T: DeserializeOwned>(kind: &str, raw: &Value) -> Result<T> {
    T::deserialize(raw).map_err(|e| Error::MalformedPayload(format!("{kind} event: {e}")))
}
