//! Authorization gate evaluated once per update, before dispatch.

use pollbot_core::{config::Config, domain::ChatId};
use pollbot_telegram::Update;

/// Outcome of the gate. A denial names the chat that receives `message`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authorization {
    Allow,
    Deny { chat_id: ChatId, message: String },
}

pub trait Authorizer: Send + Sync {
    fn authorize(&self, update: &Update) -> Authorization;
}

impl<F> Authorizer for F
where
    F: Fn(&Update) -> Authorization + Send + Sync,
{
    fn authorize(&self, update: &Update) -> Authorization {
        self(update)
    }
}

/// The default gate.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _update: &Update) -> Authorization {
        Authorization::Allow
    }
}

/// Allows updates whose sender is on a fixed list of user ids.
///
/// An empty list allows everyone. Denials go to the update's chat, or to the
/// sender's private chat when the payload has no chat.
#[derive(Clone, Debug)]
pub struct AllowedUsers {
    users: Vec<i64>,
    message: String,
}

impl AllowedUsers {
    pub fn new(users: Vec<i64>, message: impl Into<String>) -> Self {
        Self {
            users,
            message: message.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.allowed_users.clone(), cfg.unauthorized_message.clone())
    }

    pub fn is_allowed(&self, user_id: i64) -> bool {
        self.users.contains(&user_id)
    }
}

impl Authorizer for AllowedUsers {
    fn authorize(&self, update: &Update) -> Authorization {
        if self.users.is_empty() {
            return Authorization::Allow;
        }
        let sender = update.sender();
        if sender.is_some_and(|u| self.is_allowed(u.id.0)) {
            return Authorization::Allow;
        }
        let chat_id = update
            .chat_id()
            .or_else(|| sender.map(|u| ChatId::from(u.id)))
            .unwrap_or_default();
        Authorization::Deny {
            chat_id,
            message: self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_from(user: i64, chat: i64) -> Update {
        serde_json::from_value(json!({
            "update_id": 1,
            "message": {
                "message_id": 1,
                "from": {"id": user, "is_bot": false, "first_name": "u"},
                "chat": {"id": chat, "type": "group"},
                "text": "hi"
            }
        }))
        .unwrap()
    }

    #[test]
    fn allow_all_allows_everything() {
        assert_eq!(AllowAll.authorize(&Update::default()), Authorization::Allow);
    }

    #[test]
    fn listed_user_is_allowed() {
        let gate = AllowedUsers::new(vec![10, 11], "nope");
        assert_eq!(gate.authorize(&message_from(11, -100)), Authorization::Allow);
    }

    #[test]
    fn unlisted_user_is_denied_at_the_chat() {
        let gate = AllowedUsers::new(vec![10], "nope");
        assert_eq!(
            gate.authorize(&message_from(99, -100)),
            Authorization::Deny {
                chat_id: ChatId(-100),
                message: "nope".into()
            }
        );
    }

    #[test]
    fn chatless_payload_is_denied_at_the_sender() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 2,
            "inline_query": {"id": "q", "from": {"id": 99, "first_name": "u"}, "query": "x", "offset": ""}
        }))
        .unwrap();
        let gate = AllowedUsers::new(vec![10], "nope");
        assert!(matches!(
            gate.authorize(&update),
            Authorization::Deny { chat_id: ChatId(99), .. }
        ));
    }

    #[test]
    fn empty_list_allows_everyone() {
        let gate = AllowedUsers::new(Vec::new(), "nope");
        assert_eq!(gate.authorize(&message_from(99, 1)), Authorization::Allow);
    }

    #[test]
    fn closures_are_authorizers() {
        let gate = |u: &Update| {
            if u.update_id % 2 == 0 {
                Authorization::Allow
            } else {
                Authorization::Deny {
                    chat_id: ChatId(1),
                    message: "odd".into(),
                }
            }
        };
        let mut u = Update::default();
        u.update_id = 4;
        assert_eq!(gate.authorize(&u), Authorization::Allow);
        u.update_id = 5;
        assert!(matches!(gate.authorize(&u), Authorization::Deny { .. }));
    }
}
