// db/chatdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::chatmodels::*;

const CONVERSATION_COLUMNS: &str =
    "id, participant_one_id, participant_two_id, job_id, booking_id, last_message_at, created_at";

const MESSAGE_COLUMNS: &str = "id, conversation_id, sender_id, content, is_read, read_at, created_at";

#[async_trait]
pub trait ChatExt {
    /// One conversation per pair; a later call only fills in missing job/booking links.
    async fn get_or_create_conversation(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        job_id: Option<Uuid>,
        booking_id: Option<Uuid>,
    ) -> Result<Conversation, sqlx::Error>;

    async fn get_conversation(&self, conversation_id: Uuid) -> Result<Option<Conversation>, sqlx::Error>;

    async fn get_user_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>, sqlx::Error>;

    async fn get_messages(
        &self,
        conversation_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Message>, i64), sqlx::Error>;

    async fn create_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
    ) -> Result<Message, sqlx::Error>;

    /// Marks the other participant's messages as read.
    async fn mark_messages_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64, sqlx::Error>;

    async fn get_unread_message_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;
}

#[async_trait]
impl ChatExt for DBClient {
    async fn get_or_create_conversation(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        job_id: Option<Uuid>,
        booking_id: Option<Uuid>,
    ) -> Result<Conversation, sqlx::Error> {
        let (one, two) = ordered_pair(user_a, user_b);

        sqlx::query_as::<_, Conversation>(&format!(
            r#"
            INSERT INTO conversations (participant_one_id, participant_two_id, job_id, booking_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (participant_one_id, participant_two_id) DO UPDATE
            SET job_id = COALESCE(conversations.job_id, EXCLUDED.job_id),
                booking_id = COALESCE(conversations.booking_id, EXCLUDED.booking_id)
            RETURNING {}
            "#,
            CONVERSATION_COLUMNS
        ))
        .bind(one)
        .bind(two)
        .bind(job_id)
        .bind(booking_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_conversation(&self, conversation_id: Uuid) -> Result<Option<Conversation>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {} FROM conversations WHERE id = $1",
            CONVERSATION_COLUMNS
        ))
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>, sqlx::Error> {
        sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT c.id, c.job_id, c.booking_id, c.last_message_at,
                   u.id AS other_user_id, u.name AS other_user_name,
                   u.avatar_path AS other_user_avatar_path,
                   (SELECT m.content FROM messages m
                    WHERE m.conversation_id = c.id
                    ORDER BY m.created_at DESC LIMIT 1) AS last_message,
                   (SELECT COUNT(*) FROM messages m
                    WHERE m.conversation_id = c.id AND m.sender_id <> $1 AND NOT m.is_read) AS unread_count
            FROM conversations c
            JOIN users u ON u.id = CASE WHEN c.participant_one_id = $1
                                        THEN c.participant_two_id
                                        ELSE c.participant_one_id END
            WHERE c.participant_one_id = $1 OR c.participant_two_id = $1
            ORDER BY c.last_message_at DESC NULLS LAST, c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_messages(
        &self,
        conversation_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Message>, i64), sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;

        let messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {} FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(conversation_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((messages, total))
    }

    async fn create_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
    ) -> Result<Message, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let message = sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (conversation_id, sender_id, content)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET last_message_at = $2 WHERE id = $1")
            .bind(conversation_id)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(message)
    }

    async fn mark_messages_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET is_read = true, read_at = NOW()
            WHERE conversation_id = $1 AND sender_id <> $2 AND NOT is_read
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_unread_message_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE (c.participant_one_id = $1 OR c.participant_two_id = $1)
              AND m.sender_id <> $1
              AND NOT m.is_read
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}
