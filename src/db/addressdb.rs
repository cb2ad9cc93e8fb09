use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::{dtos::userdtos::AddressDto, models::addressmodel::Address};

const ADDRESS_COLUMNS: &str =
    "id, user_id, label, street, city, region, postal_code, is_default, created_at, updated_at";

#[async_trait]
pub trait AddressExt {
    async fn get_addresses(&self, user_id: Uuid) -> Result<Vec<Address>, sqlx::Error>;

    async fn get_address(&self, address_id: Uuid) -> Result<Option<Address>, sqlx::Error>;

    /// The user's first address becomes the default regardless of the flag.
    async fn create_address(&self, user_id: Uuid, dto: AddressDto) -> Result<Address, sqlx::Error>;

    async fn update_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        dto: AddressDto,
    ) -> Result<Option<Address>, sqlx::Error>;

    async fn delete_address(&self, user_id: Uuid, address_id: Uuid) -> Result<bool, sqlx::Error>;

    async fn set_default_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<Option<Address>, sqlx::Error>;
}

#[async_trait]
impl AddressExt for DBClient {
    async fn get_addresses(&self, user_id: Uuid) -> Result<Vec<Address>, sqlx::Error> {
        sqlx::query_as::<_, Address>(&format!(
            "SELECT {} FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, created_at ASC",
            ADDRESS_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_address(&self, address_id: Uuid) -> Result<Option<Address>, sqlx::Error> {
        sqlx::query_as::<_, Address>(&format!(
            "SELECT {} FROM addresses WHERE id = $1",
            ADDRESS_COLUMNS
        ))
        .bind(address_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_address(&self, user_id: Uuid, dto: AddressDto) -> Result<Address, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM addresses WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        let is_default = dto.is_default || existing == 0;

        if is_default {
            sqlx::query("UPDATE addresses SET is_default = false WHERE user_id = $1 AND is_default")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            r#"
            INSERT INTO addresses (user_id, label, street, city, region, postal_code, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        ))
        .bind(user_id)
        .bind(dto.label)
        .bind(dto.street)
        .bind(dto.city)
        .bind(dto.region)
        .bind(dto.postal_code)
        .bind(is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(address)
    }

    async fn update_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        dto: AddressDto,
    ) -> Result<Option<Address>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        if dto.is_default {
            sqlx::query("UPDATE addresses SET is_default = false WHERE user_id = $1 AND id <> $2 AND is_default")
                .bind(user_id)
                .bind(address_id)
                .execute(&mut *tx)
                .await?;
        }

        // Clearing the flag on the current default is ignored; use set-default on another address.
        let address = sqlx::query_as::<_, Address>(&format!(
            r#"
            UPDATE addresses
            SET label = $3, street = $4, city = $5, region = $6, postal_code = $7,
                is_default = is_default OR $8,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        ))
        .bind(address_id)
        .bind(user_id)
        .bind(dto.label)
        .bind(dto.street)
        .bind(dto.city)
        .bind(dto.region)
        .bind(dto.postal_code)
        .bind(dto.is_default)
        .fetch_optional(&mut *tx)
        .await?;

        if address.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(address)
    }

    async fn delete_address(&self, user_id: Uuid, address_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let deleted: Option<bool> = sqlx::query_scalar(
            "DELETE FROM addresses WHERE id = $1 AND user_id = $2 RETURNING is_default",
        )
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(was_default) = deleted else {
            tx.rollback().await?;
            return Ok(false);
        };

        // Promote the oldest remaining address so the user keeps a default.
        if was_default {
            sqlx::query(
                r#"
                UPDATE addresses SET is_default = true, updated_at = NOW()
                WHERE id = (
                    SELECT id FROM addresses WHERE user_id = $1
                    ORDER BY created_at ASC LIMIT 1
                )
                "#,
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn set_default_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<Option<Address>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE addresses SET is_default = false WHERE user_id = $1 AND id <> $2 AND is_default")
            .bind(user_id)
            .bind(address_id)
            .execute(&mut *tx)
            .await?;

        let address = sqlx::query_as::<_, Address>(&format!(
            r#"
            UPDATE addresses SET is_default = true, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        ))
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if address.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(address)
    }
}
