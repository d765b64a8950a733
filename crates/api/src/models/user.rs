//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopvely_core::{Email, UserId};

/// A registered customer or staff member.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name, unique across the store.
    pub username: String,
    /// Contact email, if the user gave one.
    pub email: Option<Email>,
    pub first_name: String,
    pub last_name: String,
    /// Administrators may edit the catalog and move orders through their lifecycle.
    pub is_staff: bool,
    /// When the account was created.
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Name to greet the user with: full name if set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: UserId::new(1),
            username: "asha".to_owned(),
            email: None,
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            is_staff: false,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user("Asha", "Rao").display_name(), "Asha Rao");
        assert_eq!(user("Asha", "").display_name(), "Asha");
        assert_eq!(user("", "").display_name(), "asha");
    }
}
