//! Memory registry
//!
//! Will be destroyed on system shutdown; also the test vehicle for the
//! handler lifecycle

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::languages::LanguageId;
use crate::mappings::ContentRef;
use crate::mappings::Mapping;
use crate::mappings::MappingStatus;

use super::Error;
use super::InsertMappingValues;
use super::InsertOutcome;
use super::MappingFilter;
use super::Registry;
use super::Result;

/// An in-memory registry
///
/// Every operation runs under one lock, which is what makes the composed
/// retire-and-insert step atomic here
#[derive(Clone, Default)]
pub struct Memory {
    /// All mapping records
    records: Arc<Mutex<HashMap<Uuid, Mapping>>>,
}

impl Memory {
    /// Create a new empty memory registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Build the record for an insert
fn new_mapping(values: &InsertMappingValues<'_>) -> Mapping {
    Mapping {
        id: Uuid::new_v4(),
        uri: values.uri.to_string(),
        language_id: values.language_id,
        content_type: values.content.content_type,
        content_id: values.content.content_id,
        query_fragment: values.query_fragment.map(ToString::to_string),
        status: MappingStatus::Active,
        created_at: Utc::now().naive_utc(),
    }
}

/// The active holder of a uri, if any
fn active_holder<'a>(
    records: &'a HashMap<Uuid, Mapping>,
    uri: &str,
    language_id: LanguageId,
) -> Option<&'a Mapping> {
    records
        .values()
        .find(|mapping| mapping.uri == uri && mapping.language_id == language_id && mapping.is_active())
}

/// Insert against the locked record set
///
/// Split out so `insert` and `replace` share the uniqueness handling under
/// whichever guard the caller already holds
fn insert_locked(
    records: &mut HashMap<Uuid, Mapping>,
    values: &InsertMappingValues<'_>,
) -> Result<InsertOutcome> {
    if let Some(holder) = active_holder(records, values.uri, values.language_id) {
        if holder.content_ref() == values.content {
            return Ok(InsertOutcome::Unchanged(holder.clone()));
        }

        return Err(Error::Collision {
            uri: values.uri.to_string(),
            language_id: values.language_id,
        });
    }

    let mapping = new_mapping(values);
    records.insert(mapping.id, mapping.clone());

    Ok(InsertOutcome::Inserted(mapping))
}

/// Retire against the locked record set
fn retire_locked(records: &mut HashMap<Uuid, Mapping>, uri: &str, language_id: LanguageId) {
    let id = active_holder(records, uri, language_id).map(|mapping| mapping.id);

    if let Some(id) = id {
        if let Some(mapping) = records.get_mut(&id) {
            mapping.status = MappingStatus::Historical;
        }
    }
}

#[async_trait]
impl Registry for Memory {
    async fn find_active(
        &self,
        content: ContentRef,
        language_id: LanguageId,
    ) -> Result<Option<Mapping>> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|mapping| {
                mapping.content_ref() == content
                    && mapping.language_id == language_id
                    && mapping.is_active()
            })
            .cloned())
    }

    async fn find_by_uri(&self, uri: &str, language_id: LanguageId) -> Result<Option<Mapping>> {
        let records = self.records.lock().await;

        if let Some(active) = active_holder(&records, uri, language_id) {
            return Ok(Some(active.clone()));
        }

        Ok(records
            .values()
            .filter(|mapping| mapping.uri == uri && mapping.language_id == language_id)
            .max_by_key(|mapping| mapping.created_at)
            .cloned())
    }

    async fn insert(&self, values: &InsertMappingValues<'_>) -> Result<InsertOutcome> {
        let mut records = self.records.lock().await;

        insert_locked(&mut records, values)
    }

    async fn retire(&self, uri: &str, language_id: LanguageId) -> Result<()> {
        let mut records = self.records.lock().await;

        retire_locked(&mut records, uri, language_id);

        Ok(())
    }

    async fn replace(
        &self,
        previous: Option<&str>,
        values: &InsertMappingValues<'_>,
    ) -> Result<InsertOutcome> {
        let mut records = self.records.lock().await;

        // uniqueness first: a collision must leave the previous mapping
        // untouched, so nothing is retired until the insert is known to win
        if let Some(holder) = active_holder(&records, values.uri, values.language_id) {
            if holder.content_ref() == values.content {
                return Ok(InsertOutcome::Unchanged(holder.clone()));
            }

            return Err(Error::Collision {
                uri: values.uri.to_string(),
                language_id: values.language_id,
            });
        }

        if let Some(previous) = previous {
            retire_locked(&mut records, previous, values.language_id);
        }

        insert_locked(&mut records, values)
    }

    async fn delete_all(&self, content: ContentRef) -> Result<u64> {
        let mut records = self.records.lock().await;

        let before = records.len();
        records.retain(|_, mapping| mapping.content_ref() != content);

        Ok((before - records.len()) as u64)
    }

    async fn list(&self, filter: &MappingFilter) -> Result<Vec<Mapping>> {
        let mut mappings: Vec<Mapping> = self
            .records
            .lock()
            .await
            .values()
            .filter(|mapping| filter.matches(mapping))
            .cloned()
            .collect();

        mappings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(mappings)
    }
}
