//! Contact form validation and the storage seam used by the HTTP handlers

use crate::db::{ContactEntry, Database, DbError, NewContact};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Raw contact form body. Every field is optional so that missing fields
/// surface as a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name, email, and message are required")]
    MissingFields,
    #[error("Invalid email format")]
    InvalidEmail,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

impl ContactSubmission {
    /// Check presence of all fields and the email shape
    pub fn validate(self) -> Result<NewContact, ValidationError> {
        let (Some(name), Some(email), Some(message)) = (
            non_empty(self.name),
            non_empty(self.email),
            non_empty(self.message),
        ) else {
            return Err(ValidationError::MissingFields);
        };

        if !email_pattern().is_match(&email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(NewContact {
            name,
            email,
            message,
        })
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

/// Storage for contact entries
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Append an entry
    async fn insert(&self, entry: NewContact) -> Result<ContactEntry, DbError>;

    /// All entries, newest first
    async fn list(&self) -> Result<Vec<ContactEntry>, DbError>;
}

#[async_trait]
impl ContactStore for Database {
    async fn insert(&self, entry: NewContact) -> Result<ContactEntry, DbError> {
        self.add_entry(&entry)
    }

    async fn list(&self) -> Result<Vec<ContactEntry>, DbError> {
        self.list_entries()
    }
}

#[async_trait]
impl<T: ContactStore + ?Sized> ContactStore for Arc<T> {
    async fn insert(&self, entry: NewContact) -> Result<ContactEntry, DbError> {
        (**self).insert(entry).await
    }

    async fn list(&self) -> Result<Vec<ContactEntry>, DbError> {
        (**self).list().await
    }
}
