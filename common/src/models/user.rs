use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub display_name: String,
    /// Empty when the token is not allowed to see e-mail addresses.
    #[serde(default)]
    pub email: String,
}

impl User {
    pub fn new(id: u64, username: impl Into<String>) -> Self {
        let username: String = username.into();
        Self {
            id,
            display_name: username.clone(),
            username,
            email: String::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}
