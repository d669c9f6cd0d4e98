//! The `directory` module resolves an audience to email addresses.
//!
//! Account records are owned by the surrounding record-management system; the
//! relay only asks it for recipient lists. `MemoryDirectory` serves the
//! accounts listed in configuration.

use async_trait::async_trait;
use serde::Deserialize;

use crate::model::Audience;
use crate::utils::error::DirectoryError;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Addresses of the accounts in `audience`. With `approved_only`, accounts
    /// still pending approval are left out.
    async fn resolve_recipients(
        &self,
        audience: &Audience,
        approved_only: bool,
    ) -> Result<Vec<String>, DirectoryError>;
}

/// An account as the directory sees it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DirectoryUser {
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub approved: bool,
    /// Teacher whose class the account belongs to.
    #[serde(default)]
    pub class_teacher_id: Option<String>,
    /// Driver whose bus the account rides.
    #[serde(default)]
    pub driver_id: Option<String>,
}

impl DirectoryUser {
    fn in_audience(&self, audience: &Audience) -> bool {
        match audience {
            Audience::All => true,
            Audience::Role(role) => self.role == *role,
            Audience::Class(teacher) => {
                self.role == "student" && self.class_teacher_id.as_deref() == Some(teacher)
            }
            Audience::Trip(driver) => self.driver_id.as_deref() == Some(driver),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    users: Vec<DirectoryUser>,
}

impl MemoryDirectory {
    pub fn new(users: Vec<DirectoryUser>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn resolve_recipients(
        &self,
        audience: &Audience,
        approved_only: bool,
    ) -> Result<Vec<String>, DirectoryError> {
        Ok(self
            .users
            .iter()
            .filter(|u| !approved_only || u.approved)
            .filter(|u| u.in_audience(audience))
            .map(|u| u.email.trim())
            .filter(|email| !email.is_empty())
            .map(str::to_string)
            .collect())
    }
}
