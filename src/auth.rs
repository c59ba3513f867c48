use crate::error::AuthError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Roles a signed-in user can have; each maps to one dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Staff,
    Nutritionist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Staff => "staff",
            Role::Nutritionist => "nutritionist",
        }
    }

    /// Dashboard title, matching the screen names of the app.
    pub fn dashboard_title(&self) -> &'static str {
        match self {
            Role::Admin => "Admin Dashboard",
            Role::User => "User Dashboard",
            Role::Staff => "Image Taker",
            Role::Nutritionist => "Nutritionist Dashboard",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One account in the mock directory.
#[derive(Debug, Clone)]
struct Account {
    username: String,
    password: String,
    role: Role,
}

/// An authenticated session; dropped on logout.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub started_at: DateTime<Utc>,
}

/// In-memory directory of demo accounts.
///
/// Mock by design: exact string matching, no hashing, no persistence.
/// Real authentication is explicitly out of scope.
pub struct UserDirectory {
    accounts: Vec<Account>,
}

impl UserDirectory {
    /// Directory with one demo account per role.
    pub fn with_demo_accounts() -> Self {
        let accounts = [
            ("admin", "admin123", Role::Admin),
            ("user", "user123", Role::User),
            ("staff", "staff123", Role::Staff),
            ("nutri", "nutri123", Role::Nutritionist),
        ]
        .into_iter()
        .map(|(username, password, role)| Account {
            username: username.to_string(),
            password: password.to_string(),
            role,
        })
        .collect();

        Self { accounts }
    }

    /// Check credentials against the directory.
    ///
    /// Failure is uniform: the caller cannot tell an unknown username from
    /// a wrong password.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> std::result::Result<Session, AuthError> {
        let matched = self
            .accounts
            .iter()
            .find(|account| account.username == username && account.password == password);

        match matched {
            Some(account) => {
                info!("{} signed in as {}", account.username, account.role);
                Ok(Session {
                    username: account.username.clone(),
                    role: account.role,
                    started_at: Utc::now(),
                })
            }
            None => {
                warn!("Failed sign-in attempt for {:?}", username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Demo usernames for the login prompt.
    pub fn usernames(&self) -> Vec<&str> {
        self.accounts
            .iter()
            .map(|account| account.username.as_str())
            .collect()
    }
}
