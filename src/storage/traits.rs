//! Abstract storage interfaces for pluggable backends
//!
//! The service only talks to storage through these traits; backends are
//! injected at construction time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::role::{Role, RoleSet};
use crate::error::Result;
use crate::roster::student::{Student, StudentFields};

/// Stored user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub username: String,
    pub password_digest: String,
    pub display_name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Identity fields supplied at registration
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub password_digest: String,
    pub display_name: String,
    pub email: Option<String>,
}

/// Identity and role assignment storage
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Case-sensitive exact username lookup
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>>;

    /// All roles assigned to an identity
    async fn roles_of(&self, identity_id: u64) -> Result<RoleSet>;

    /// Persist an identity together with its first role assignment.
    ///
    /// Must fail with `DuplicateUsername` when the username is taken, and
    /// must leave nothing behind on failure.
    async fn create(&self, identity: NewIdentity, role: Role) -> Result<Identity>;

    /// Whether any identity uses this username
    async fn username_exists(&self, username: &str) -> Result<bool>;

    /// Number of stored identities
    async fn identity_count(&self) -> Result<usize>;
}

/// Filter and paging for roster listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StudentQuery {
    /// Case-insensitive substring of the student name
    pub search: Option<String>,
    /// 1-based page number
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// One page of students ordered by id
#[derive(Debug, Clone, Serialize)]
pub struct StudentPage {
    pub items: Vec<Student>,
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_count: usize,
    pub search: Option<String>,
}

/// Student record storage
#[async_trait]
pub trait StudentStorage: Send + Sync {
    /// Matching students ordered by id, skipping `offset` and taking `limit`,
    /// together with the total number of matches
    async fn list_students(
        &self,
        search: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Student>, usize)>;

    /// Get student by id
    async fn get_student(&self, id: u64) -> Result<Option<Student>>;

    /// Insert a validated student; the store assigns the id and timestamps
    async fn insert_student(&self, fields: StudentFields, now: DateTime<Utc>) -> Result<Student>;

    /// Overwrite the editable fields of an existing student
    async fn update_student(
        &self,
        id: u64,
        fields: StudentFields,
        now: DateTime<Utc>,
    ) -> Result<Option<Student>>;

    /// Remove a student, returning whether one existed
    async fn delete_student(&self, id: u64) -> Result<bool>;
}
