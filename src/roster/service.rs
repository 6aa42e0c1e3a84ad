//! Student roster operations
//!
//! Role checks happen in the routing layer before these are called.

use chrono::Utc;
use std::sync::Arc;

use crate::constants::MAX_PAGE_SIZE;
use crate::error::{Result, RosterError};
use crate::roster::student::{Student, StudentForm};
use crate::storage::traits::{StudentPage, StudentQuery, StudentStorage};

pub struct RosterService {
    storage: Arc<dyn StudentStorage>,
    default_page_size: usize,
}

impl RosterService {
    pub fn new(storage: Arc<dyn StudentStorage>, default_page_size: usize) -> Self {
        Self {
            storage,
            default_page_size: default_page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Paginated listing with optional name search
    pub async fn list(&self, query: StudentQuery) -> Result<StudentPage> {
        let page = query.page.unwrap_or(1).max(1);
        let page_size = query
            .page_size
            .unwrap_or(self.default_page_size)
            .clamp(1, MAX_PAGE_SIZE);
        let search = query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let offset = (page - 1).saturating_mul(page_size);
        let (items, total_count) = self
            .storage
            .list_students(search.as_deref(), offset, page_size)
            .await?;

        Ok(StudentPage {
            items,
            current_page: page,
            page_size,
            total_pages: total_count.div_ceil(page_size),
            total_count,
            search,
        })
    }

    pub async fn details(&self, id: u64) -> Result<Student> {
        self.storage
            .get_student(id)
            .await?
            .ok_or(RosterError::StudentNotFound(id))
    }

    pub async fn create(&self, form: StudentForm) -> Result<Student> {
        let fields = form.validate()?;
        let student = self.storage.insert_student(fields, Utc::now()).await?;
        log::info!("Student {} created", student.id);
        Ok(student)
    }

    pub async fn update(&self, id: u64, form: StudentForm) -> Result<Student> {
        let fields = form.validate()?;
        let student = self
            .storage
            .update_student(id, fields, Utc::now())
            .await?
            .ok_or(RosterError::StudentNotFound(id))?;
        log::info!("Student {} updated", id);
        Ok(student)
    }

    /// Deleting an id that does not exist is not an error
    pub async fn delete(&self, id: u64) -> Result<bool> {
        let removed = self.storage.delete_student(id).await?;
        if removed {
            log::info!("Student {} deleted", id);
        } else {
            log::debug!("Delete of unknown student {} ignored", id);
        }
        Ok(removed)
    }
}
