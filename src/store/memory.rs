use std::sync::atomic::{AtomicBool, Ordering};

use axum::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Collection, DeleteOutcome, Document, DocumentStore, Filter, InsertOutcome, StoreError, Update,
    UpdateOutcome, ID_FIELD,
};

/// In-process store used by the handler tests. Documents keep insertion order so
/// "first match" means the same thing it does in Postgres.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<(Collection, Document)>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        self.check_open()?;
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .find(|(c, d)| *c == collection && filter.matches(d))
            .map(|(_, d)| d.clone()))
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        self.check_open()?;
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .filter(|(c, d)| *c == collection && filter.matches(d))
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn insert_one(
        &self,
        collection: Collection,
        mut doc: Document,
    ) -> Result<InsertOutcome, StoreError> {
        self.check_open()?;
        let id = Uuid::new_v4();
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        self.docs.write().await.push((collection, doc));
        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateOutcome, StoreError> {
        self.check_open()?;
        let mut docs = self.docs.write().await;
        let Some((_, doc)) = docs
            .iter_mut()
            .find(|(c, d)| *c == collection && filter.matches(d))
        else {
            return Ok(UpdateOutcome {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
            });
        };

        let before = doc.clone();
        match update {
            Update::Set(fields) => {
                for (k, v) in fields {
                    doc.insert(k.clone(), v.clone());
                }
            }
            Update::Inc { field, by } => {
                let current = match doc.get(field) {
                    None | Some(Value::Null) => 0,
                    Some(Value::Number(n)) => n.as_i64().ok_or_else(|| StoreError::NotAnInteger {
                        field: field.clone(),
                    })?,
                    Some(Value::String(s)) => {
                        s.trim().parse::<i64>().map_err(|_| StoreError::NotAnInteger {
                            field: field.clone(),
                        })?
                    }
                    Some(_) => {
                        return Err(StoreError::NotAnInteger {
                            field: field.clone(),
                        })
                    }
                };
                let next = current.checked_add(*by).ok_or_else(|| StoreError::NotAnInteger {
                    field: field.clone(),
                })?;
                doc.insert(field.clone(), Value::from(next));
            }
        }

        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(*doc != before),
        })
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteOutcome, StoreError> {
        self.check_open()?;
        let mut docs = self.docs.write().await;
        let position = docs
            .iter()
            .position(|(c, d)| *c == collection && filter.matches(d));
        let deleted_count = match position {
            Some(i) => {
                docs.remove(i);
                1
            }
            None => 0,
        };
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_open()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().expect("object")
    }

    #[tokio::test]
    async fn insert_assigns_id_and_find_one_returns_it() {
        let store = MemoryStore::new();
        let out = store
            .insert_one(Collection::Jobs, doc(json!({"title": "Rust dev", "_id": "spoofed"})))
            .await
            .unwrap();
        let found = store
            .find_one(Collection::Jobs, &Filter::by_id(out.inserted_id))
            .await
            .unwrap()
            .expect("inserted job");
        assert_eq!(found["title"], "Rust dev");
        assert_eq!(found["_id"], out.inserted_id.to_string());
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = MemoryStore::new();
        store
            .insert_one(Collection::Users, doc(json!({"email": "a@x.com"})))
            .await
            .unwrap();
        let jobs = store.find(Collection::Jobs, &Filter::all()).await.unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn inc_counts_from_zero_and_rejects_non_numeric() {
        let store = MemoryStore::new();
        let id = store
            .insert_one(Collection::Jobs, doc(json!({"title": "t"})))
            .await
            .unwrap()
            .inserted_id;
        let inc = Update::Inc {
            field: "applicantsNumber".into(),
            by: 1,
        };
        store
            .update_one(Collection::Jobs, &Filter::by_id(id), &inc)
            .await
            .unwrap();
        store
            .update_one(Collection::Jobs, &Filter::by_id(id), &inc)
            .await
            .unwrap();
        let job = store
            .find_one(Collection::Jobs, &Filter::by_id(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job["applicantsNumber"], 2);

        let bad = store
            .insert_one(Collection::Jobs, doc(json!({"applicantsNumber": "many"})))
            .await
            .unwrap()
            .inserted_id;
        let err = store
            .update_one(Collection::Jobs, &Filter::by_id(bad), &inc)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotAnInteger { .. }));
    }

    #[tokio::test]
    async fn inc_reads_numeric_strings_and_rejects_fractions() {
        let store = MemoryStore::new();
        let inc = Update::Inc {
            field: "applicantsNumber".into(),
            by: 1,
        };
        for (stored, expected) in [(json!(" 5"), Some(6)), (json!(null), Some(1)), (json!(2.5), None)] {
            let id = store
                .insert_one(Collection::Jobs, doc(json!({"applicantsNumber": stored.clone()})))
                .await
                .unwrap()
                .inserted_id;
            let res = store.update_one(Collection::Jobs, &Filter::by_id(id), &inc).await;
            match expected {
                Some(n) => {
                    assert_eq!(res.unwrap().modified_count, 1);
                    let job = store
                        .find_one(Collection::Jobs, &Filter::by_id(id))
                        .await
                        .unwrap()
                        .unwrap();
                    assert_eq!(job["applicantsNumber"], n, "stored {stored}");
                }
                None => assert!(
                    matches!(res, Err(StoreError::NotAnInteger { .. })),
                    "stored {stored}"
                ),
            }
        }
    }

    #[tokio::test]
    async fn set_reports_unmodified_when_nothing_changes() {
        let store = MemoryStore::new();
        let id = store
            .insert_one(Collection::Jobs, doc(json!({"title": "same"})))
            .await
            .unwrap()
            .inserted_id;
        let out = store
            .update_one(
                Collection::Jobs,
                &Filter::by_id(id),
                &Update::Set(doc(json!({"title": "same"}))),
            )
            .await
            .unwrap();
        assert_eq!(out.matched_count, 1);
        assert_eq!(out.modified_count, 0);
    }

    #[tokio::test]
    async fn closed_store_fails_every_call() {
        let store = MemoryStore::new();
        store.close().await;
        assert!(store.ping().await.is_err());
        assert!(store.find(Collection::Jobs, &Filter::all()).await.is_err());
    }
}
