use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Expense category a loan or transaction is filed under.
///
/// A category without an owner is a shared default, usable by any user;
/// an owned category is private to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub created_at: NaiveDateTime,
}

impl Category {
    pub fn is_available_to(&self, user_id: &str) -> bool {
        match &self.user_id {
            None => true,
            Some(owner) => owner == user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn category(user_id: Option<&str>) -> Category {
        Category {
            id: "cat-1".to_string(),
            user_id: user_id.map(|s| s.to_string()),
            name: "Família".to_string(),
            created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_shared_category_is_available_to_everyone() {
        assert!(category(None).is_available_to("anyone"));
    }

    #[test]
    fn test_owned_category_is_private() {
        let owned = category(Some("user-a"));
        assert!(owned.is_available_to("user-a"));
        assert!(!owned.is_available_to("user-b"));
    }
}
