//! In-memory storage implementation for development and testing
//!
//! Keeps all data in process memory behind async read/write locks. Every
//! multi-record write happens under a single write guard, which is what makes
//! username uniqueness and the identity+role insert atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::*;
use crate::auth::role::{Role, RoleSet};
use crate::error::{Result, RosterError};
use crate::roster::student::{Student, StudentFields};

#[derive(Default)]
struct CredentialState {
    identities: HashMap<String, Identity>,
    assignments: HashMap<u64, RoleSet>, // identity_id -> roles
    next_id: u64,
}

/// In-memory identity and role storage
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    state: Arc<RwLock<CredentialState>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>> {
        Ok(self.state.read().await.identities.get(username).cloned())
    }

    async fn roles_of(&self, identity_id: u64) -> Result<RoleSet> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .get(&identity_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create(&self, identity: NewIdentity, role: Role) -> Result<Identity> {
        let mut state = self.state.write().await;

        if state.identities.contains_key(&identity.username) {
            return Err(RosterError::DuplicateUsername(identity.username));
        }

        state.next_id += 1;
        let stored = Identity {
            id: state.next_id,
            username: identity.username,
            password_digest: identity.password_digest,
            display_name: identity.display_name,
            email: identity.email,
            created_at: Utc::now(),
        };

        state
            .assignments
            .insert(stored.id, RoleSet::from([role]));
        state
            .identities
            .insert(stored.username.clone(), stored.clone());

        Ok(stored)
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.state.read().await.identities.contains_key(username))
    }

    async fn identity_count(&self) -> Result<usize> {
        Ok(self.state.read().await.identities.len())
    }
}

#[derive(Default)]
struct StudentState {
    students: BTreeMap<u64, Student>, // ordered by id
    next_id: u64,
}

/// In-memory student storage
#[derive(Clone, Default)]
pub struct MemoryStudentStorage {
    state: Arc<RwLock<StudentState>>,
}

impl MemoryStudentStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StudentStorage for MemoryStudentStorage {
    async fn list_students(
        &self,
        search: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Student>, usize)> {
        let state = self.state.read().await;
        let needle = search.map(str::to_lowercase);

        let matches: Vec<&Student> = state
            .students
            .values()
            .filter(|student| match needle {
                Some(ref needle) => student.name.to_lowercase().contains(needle),
                None => true,
            })
            .collect();

        let total = matches.len();
        let page = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn get_student(&self, id: u64) -> Result<Option<Student>> {
        Ok(self.state.read().await.students.get(&id).cloned())
    }

    async fn insert_student(&self, fields: StudentFields, now: DateTime<Utc>) -> Result<Student> {
        let mut state = self.state.write().await;
        state.next_id += 1;

        let student = Student::from_fields(state.next_id, fields, now);
        state.students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn update_student(
        &self,
        id: u64,
        fields: StudentFields,
        now: DateTime<Utc>,
    ) -> Result<Option<Student>> {
        let mut state = self.state.write().await;

        Ok(state.students.get_mut(&id).map(|student| {
            student.apply(fields, now);
            student.clone()
        }))
    }

    async fn delete_student(&self, id: u64) -> Result<bool> {
        Ok(self.state.write().await.students.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_identity(username: &str) -> NewIdentity {
        NewIdentity {
            username: username.to_string(),
            password_digest: "digest".to_string(),
            display_name: username.to_uppercase(),
            email: None,
        }
    }

    fn fields(name: &str) -> StudentFields {
        StudentFields {
            name: name.to_string(),
            age: 12,
            email: None,
            gender: None,
            class: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_single_role() {
        let store = MemoryCredentialStore::new();
        let identity = store.create(new_identity("alice"), Role::Teacher).await.unwrap();

        assert_eq!(store.roles_of(identity.id).await.unwrap(), RoleSet::from([Role::Teacher]));
        assert!(store.username_exists("alice").await.unwrap());
        assert!(!store.username_exists("Alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_create_leaves_store_untouched() {
        let store = MemoryCredentialStore::new();
        let first = store.create(new_identity("bob"), Role::Student).await.unwrap();

        let err = store.create(new_identity("bob"), Role::Admin).await.unwrap_err();
        assert_eq!(err, RosterError::DuplicateUsername("bob".to_string()));
        assert_eq!(store.identity_count().await.unwrap(), 1);
        assert_eq!(store.roles_of(first.id).await.unwrap(), RoleSet::from([Role::Student]));
    }

    #[tokio::test]
    async fn test_student_paging_and_search() {
        let storage = MemoryStudentStorage::new();
        for name in ["Amy", "Ben", "Amelia", "Carl"] {
            storage.insert_student(fields(name), Utc::now()).await.unwrap();
        }

        let (page, total) = storage.list_students(Some("am"), 0, 10).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), ["Amy", "Amelia"]);

        let (page, total) = storage.list_students(None, 2, 2).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(page.iter().map(|s| s.id).collect::<Vec<_>>(), [3, 4]);
    }

    #[tokio::test]
    async fn test_student_update_and_delete() {
        let storage = MemoryStudentStorage::new();
        let created = storage.insert_student(fields("Amy"), Utc::now()).await.unwrap();

        let updated = storage
            .update_student(created.id, fields("Amy B"), Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Amy B");
        assert_eq!(updated.created_at, created.created_at);

        assert!(storage.update_student(42, fields("x"), Utc::now()).await.unwrap().is_none());
        assert!(storage.delete_student(created.id).await.unwrap());
        assert!(!storage.delete_student(created.id).await.unwrap());
    }
}
