use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The contact lookup table: user id → user.
pub type Users = IndexMap<String, User>;

/// A contact that tasks can be assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "givenName", default)]
    pub given_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "userPhone", default)]
    pub user_phone: String,
}

impl User {
    /// Up to two uppercase initials from the given name, used on cards.
    pub fn initials(&self) -> String {
        self.given_name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_from_given_name() {
        let user: User =
            serde_json::from_str(r#"{"email":"a@b.c","givenName":"anna maria lee"}"#).unwrap();
        assert_eq!(user.initials(), "AM");
        assert_eq!(user.user_phone, "");
    }
}
