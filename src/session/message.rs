use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::MessageId;
use crate::listing::PropertyListing;

const PREVIEW_ELLIPSIS: &str = "...";

/// Role of a participant in the conversation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    role: Role,
    text: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    listings: Option<Vec<PropertyListing>>,
}

impl Message {
    fn new(role: Role, text: impl Into<String>, listings: Option<Vec<PropertyListing>>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
            listings,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text, None)
    }

    /// An assistant reply carrying the listings returned with it.
    pub fn assistant(text: impl Into<String>, listings: Vec<PropertyListing>) -> Self {
        Self::new(Role::Assistant, text, Some(listings))
    }

    /// An assistant message with no listings attached, used for error notices.
    pub fn notice(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text, None)
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn listings(&self) -> &[PropertyListing] {
        self.listings.as_deref().unwrap_or_default()
    }

    pub fn has_listings(&self) -> bool {
        !self.listings().is_empty()
    }

    /// Short label for history lists: the first `max_chars` characters
    /// followed by an ellipsis.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.text.chars().take(max_chars).collect();
        preview.push_str(PREVIEW_ELLIPSIS);
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_roles() {
        let user = Message::user("hello");
        assert!(user.is_user());
        assert!(!user.has_listings());

        let reply = Message::assistant("hi", vec![PropertyListing::default()]);
        assert_eq!(reply.role(), Role::Assistant);
        assert_eq!(reply.listings().len(), 1);

        let notice = Message::notice("oops");
        assert_eq!(notice.role(), Role::Assistant);
        assert!(notice.listings().is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let a = Message::user("a");
        let b = Message::user("a");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let msg = Message::user("Show me 2-bedroom apartments in Dubai Marina please");
        assert_eq!(msg.preview(40), "Show me 2-bedroom apartments in Dubai Ma...");
        let arabic = Message::user("شقة في دبي");
        assert_eq!(arabic.preview(3), "شقة...");
        assert_eq!(Message::user("hi").preview(40), "hi...");
    }
}
