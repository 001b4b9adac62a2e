//! Identity API response types and display name rules.

use serde::Deserialize;

/// User record returned by the identity API. Unknown fields are ignored and
/// any field may be `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityUser {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email_addresses: Option<Vec<IdentityEmail>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityEmail {
    #[serde(default)]
    pub email_address: Option<String>,
}

impl IdentityUser {
    /// Picks the display name for `user_id`.
    ///
    /// Precedence: full name, first email address, username, then
    /// `"User <id>"`. A first email entry without an address counts as no
    /// email.
    pub fn display_name(&self, user_id: &str) -> String {
        let full_name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let full_name = full_name.trim();
        if !full_name.is_empty() {
            return full_name.to_string();
        }

        let first_email = self
            .email_addresses
            .iter()
            .flatten()
            .next()
            .and_then(|email| email.email_address.as_deref());
        if let Some(email) = first_email.filter(|email| !email.is_empty()) {
            return email.to_string();
        }

        match self.username.as_deref() {
            Some(username) if !username.is_empty() => username.to_string(),
            _ => format!("User {}", user_id),
        }
    }
}

/// Placeholder written when a user cannot be resolved.
pub fn unknown_user_label(user_id: &str) -> String {
    format!("Unknown User ({})", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn parse(json: &str) -> IdentityUser {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_full_name_trimmed() {
        let user = parse(r#"{"first_name": " Ada", "last_name": "Lovelace "}"#);
        assert_eq!(user.display_name("user_1"), "Ada Lovelace");

        let user = parse(r#"{"first_name": "Ada", "last_name": ""}"#);
        assert_eq!(user.display_name("user_1"), "Ada");

        let user = parse(r#"{"first_name": null, "last_name": "Lovelace"}"#);
        assert_eq!(user.display_name("user_1"), "Lovelace");
    }

    #[test]
    fn test_email_when_no_name() {
        let user = parse(
            r#"{
                "first_name": " ",
                "last_name": null,
                "username": "ada",
                "email_addresses": [
                    {"email_address": "ada@example.com"},
                    {"email_address": "other@example.com"}
                ]
            }"#,
        );
        assert_eq!(user.display_name("user_1"), "ada@example.com");

        let user = fixtures::user(None, Some(" "), &["grace@example.com"]);
        assert_eq!(user.display_name("user_2"), "grace@example.com");
    }

    #[test]
    fn test_username_when_no_name_or_email() {
        let user = parse(r#"{"username": "ada", "email_addresses": []}"#);
        assert_eq!(user.display_name("user_1"), "ada");
    }

    #[test]
    fn test_null_email_fields_fall_through() {
        let user = parse(r#"{"username": "ada", "email_addresses": null}"#);
        assert_eq!(user.display_name("user_1"), "ada");

        let user = parse(r#"{"username": "ada", "email_addresses": [{"email_address": null}]}"#);
        assert_eq!(user.display_name("user_1"), "ada");

        let user = parse(r#"{"email_addresses": [{"id": "idn_1"}]}"#);
        assert_eq!(user.display_name("user_1"), "User user_1");
    }

    #[test]
    fn test_fallback_label() {
        let user = parse(r#"{"id": "user_1", "username": ""}"#);
        assert_eq!(user.display_name("user_1"), "User user_1");

        let user = parse("{}");
        assert_eq!(user.display_name("user_2"), "User user_2");
    }

    #[test]
    fn test_unknown_user_label() {
        assert_eq!(unknown_user_label("user_9"), "Unknown User (user_9)");
    }
}
