use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub street: String,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_is_by_user_id() {
        let owner = Uuid::new_v4();
        let address = Address {
            id: Uuid::new_v4(),
            user_id: owner,
            label: "Home".to_string(),
            street: "12 Rue Ibn Battouta".to_string(),
            city: "Tangier".to_string(),
            region: None,
            postal_code: Some("90000".to_string()),
            is_default: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(address.is_owned_by(owner));
        assert!(!address.is_owned_by(Uuid::new_v4()));
    }
}
