// models/chatmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Clone, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub participant_one_id: Uuid,
    pub participant_two_id: Uuid,
    pub job_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participant_one_id == user_id || self.participant_two_id == user_id
    }

    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if self.participant_one_id == user_id {
            self.participant_two_id
        } else {
            self.participant_one_id
        }
    }
}

/// Participants are stored in a canonical order so one pair maps to one row.
pub fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Conversation list row, joined with the other participant and the last message.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub job_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub other_user_id: Uuid,
    pub other_user_name: String,
    pub other_user_avatar_path: Option<String>,
    pub last_message: Option<String>,
    pub unread_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_order_is_stable() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(ordered_pair(a, b), ordered_pair(b, a));
    }

    #[test]
    fn other_participant_is_the_one_that_is_not_me() {
        let (one, two) = ordered_pair(Uuid::new_v4(), Uuid::new_v4());
        let conversation = Conversation {
            id: Uuid::new_v4(),
            participant_one_id: one,
            participant_two_id: two,
            job_id: None,
            booking_id: None,
            last_message_at: None,
            created_at: Utc::now(),
        };

        assert_eq!(conversation.other_participant(one), two);
        assert_eq!(conversation.other_participant(two), one);
        assert!(conversation.has_participant(one));
        assert!(!conversation.has_participant(Uuid::new_v4()));
    }
}
