//! Create-or-update keyed by a secondary uniqueness field.
//!
//! Lookup-then-branch is not atomic. Two concurrent creates with the same key
//! both miss the lookup; the store's unique index rejects the second insert
//! and the loser gets [`ResourceError::Conflict`] rather than a duplicate.

use serde_json::Value;

use crate::document::validate::{validate, Mode, Reason, ValidationErrors};
use crate::document::Document;
use crate::resource::{ResourceError, ResourceResult, ResourceService};
use crate::store::Filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

impl ResourceService {
    fn key_field(&self) -> ResourceResult<&'static str> {
        self.schema.unique_key.ok_or_else(|| {
            ResourceError::BadInput(format!("{} has no unique key", self.schema.label))
        })
    }

    /// Insert `payload`, or replace the content of the document already
    /// holding its key. `_id` and `createdAt` survive a replace.
    pub async fn create_or_update(&self, payload: &Value) -> ResourceResult<(Document, UpsertOutcome)> {
        let key = self.key_field()?;
        let mut fields = validate(&self.schema.fields, payload, Mode::Create)?;

        let Some(key_value) = fields.get(key).filter(|v| !v.is_null()).cloned() else {
            return Err(ValidationErrors::single(key, Reason::Required).into());
        };

        let existing = self
            .store
            .find_one(self.collection(), &Filter::new().eq(key, key_value.clone()))
            .await?;

        self.assign_sub_ids(&mut fields, existing.as_ref());

        match existing {
            Some(current) => {
                let doc = self
                    .store
                    .replace(self.collection(), &current.id, fields)
                    .await?
                    .ok_or_else(|| self.not_found())?;
                tracing::info!(collection = self.collection(), id = %doc.id, %key_value, "keyed document replaced");
                Ok((doc, UpsertOutcome::Replaced))
            }
            None => {
                let doc = self.store.insert(self.collection(), fields).await?;
                tracing::info!(collection = self.collection(), id = %doc.id, %key_value, "keyed document created");
                Ok((doc, UpsertOutcome::Created))
            }
        }
    }

    pub async fn get_by_key(&self, value: &str) -> ResourceResult<Document> {
        let key = self.key_field()?;
        self.store
            .find_one(self.collection(), &Filter::new().eq(key, value))
            .await?
            .ok_or_else(|| self.not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::test_support::{field, service};
    use serde_json::json;

    #[tokio::test]
    async fn second_upsert_replaces_single_document() {
        let svc = service("content").await;
        let (first, outcome) = svc
            .create_or_update(&json!({
                "sectionType": "mission",
                "title": "Our Mission",
                "content": "Skills for every learner.",
                "order": 2
            }))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Created);
        assert_eq!(field(&first, "sectionType"), "mission");

        let (second, outcome) = svc
            .create_or_update(&json!({
                "sectionType": "mission",
                "title": "Our Renewed Mission",
                "content": "Skills for every learner."
            }))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Replaced);
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(field(&second, "title"), "Our Renewed Mission");
        // Replacement, not merge: the order falls back to its default.
        assert_eq!(field(&second, "order"), 0);

        let all = svc.list_ordered(&Filter::new()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(svc.get_by_key("mission").await.unwrap().id, first.id);
    }

    #[tokio::test]
    async fn missing_key_is_validation_failure() {
        let svc = service("content").await;
        let err = svc
            .create_or_update(&json!({"title": "No key", "content": "x"}))
            .await
            .unwrap_err();
        let ResourceError::Validation(errors) = err else {
            panic!("expected validation failure");
        };
        assert!(errors.violations().iter().any(|v| v.field == "sectionType"));
    }

    #[tokio::test]
    async fn plain_create_with_taken_key_conflicts() {
        let svc = service("content").await;
        let payload = json!({"sectionType": "vision", "title": "Vision", "content": "x"});
        svc.create_or_update(&payload).await.unwrap();

        let err = svc.create(&payload).await.unwrap_err();
        assert!(matches!(err, ResourceError::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_upserts_leave_one_document() {
        let svc = service("content").await;
        let payload = json!({"sectionType": "about", "title": "About us", "content": "x"});

        let (a, b) = tokio::join!(
            tokio::spawn({
                let (svc, payload) = (svc.clone(), payload.clone());
                async move { svc.create_or_update(&payload).await }
            }),
            tokio::spawn({
                let (svc, payload) = (svc.clone(), payload.clone());
                async move { svc.create_or_update(&payload).await }
            }),
        );
        let results = [a.unwrap(), b.unwrap()];

        let created = results
            .iter()
            .filter(|r| matches!(r, Ok((_, UpsertOutcome::Created))))
            .count();
        assert_eq!(created, 1);
        for result in &results {
            assert!(matches!(
                result,
                Ok((_, UpsertOutcome::Created | UpsertOutcome::Replaced)) | Err(ResourceError::Conflict(_))
            ));
        }

        let all = svc.list_ordered(&Filter::new()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let svc = service("content").await;
        let err = svc.get_by_key("history").await.unwrap_err();
        assert_eq!(err.to_string(), "Content section not found");
    }

    #[tokio::test]
    async fn unkeyed_resource_rejects_upsert() {
        let svc = service("faq").await;
        assert!(matches!(
            svc.create_or_update(&json!({})).await,
            Err(ResourceError::BadInput(_))
        ));
    }
}
