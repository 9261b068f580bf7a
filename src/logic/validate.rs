use anyhow::Result;
use itertools::Itertools;
use serde_json::Value;
use std::fmt;

use crate::model::{Collection, Document, Id, Role};
use crate::store::traits::{EntityStore, EntityStoreExt};

/// A reference field and the collection its ids must exist in
#[derive(Debug, Clone, Copy)]
pub struct ReferenceField {
    pub path: &'static str,
    /// How the referenced record is named in error messages, e.g. "canton"
    pub label: &'static str,
    pub collection: Collection,
}

impl ReferenceField {
    pub const fn new(path: &'static str, label: &'static str, collection: Collection) -> Self {
        Self {
            path,
            label,
            collection,
        }
    }
}

/// Labels of the references that could not be resolved, in field order.
///
/// Displays as e.g. "Person not found and canton not found".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingReferences {
    labels: Vec<&'static str>,
}

impl MissingReferences {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }
}

impl fmt::Display for MissingReferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self
            .labels
            .iter()
            .map(|label| format!("{} not found", label))
            .join(" and ");
        let mut chars = message.chars();
        match chars.next() {
            Some(first) => write!(f, "{}{}", first.to_uppercase(), chars.as_str()),
            None => Ok(()),
        }
    }
}

/// Check that every listed reference of `document` points at an existing record.
/// A missing or malformed reference value counts as not found.
pub async fn missing_references<S: EntityStore>(
    store: &S,
    document: &Document,
    fields: &[ReferenceField],
) -> Result<MissingReferences> {
    let mut missing = MissingReferences::default();

    for field in fields {
        let found = match document.get(field.path) {
            Some(Value::String(id)) => store.exists(field.collection, id).await?,
            Some(Value::Array(items)) => {
                let mut all_found = true;
                for item in items {
                    let exists = match item.as_str() {
                        Some(id) => store.exists(field.collection, id).await?,
                        None => false,
                    };
                    if !exists {
                        all_found = false;
                        break;
                    }
                }
                all_found
            }
            _ => false,
        };

        if !found {
            missing.labels.push(field.label);
        }
    }

    Ok(missing)
}

/// What a post-insert role check found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleCheck {
    Confirmed,
    PersonMissing(Id),
    /// `role` is `None` when the person's role is absent or not a known role
    Mismatch { person_id: Id, role: Option<Role> },
}

/// Check that each person exists and holds `expected` role; stops at the first failure.
/// Only the `role` field is read, so otherwise incomplete person records still check.
pub async fn verify_roles<S: EntityStore>(
    store: &S,
    person_ids: &[Id],
    expected: Role,
) -> Result<RoleCheck> {
    for person_id in person_ids {
        let Some(person) = store.find_by_id(Collection::People, person_id).await? else {
            return Ok(RoleCheck::PersonMissing(person_id.clone()));
        };
        let role = person
            .get("role")
            .and_then(|role| serde_json::from_value::<Role>(role.clone()).ok());
        if role != Some(expected) {
            return Ok(RoleCheck::Mismatch {
                person_id: person_id.clone(),
                role,
            });
        }
    }
    Ok(RoleCheck::Confirmed)
}

/// Result of [`insert_with_role_check`]
#[derive(Debug, Clone, PartialEq)]
pub enum VerifiedInsert {
    Stored(Document),
    /// The record was inserted, failed the role check, and was deleted again
    RolledBack(RoleCheck),
}

/// Insert a record, then confirm the people it extends or references have the expected
/// role. On failure the just-inserted record is deleted again.
///
/// The store offers no multi-collection transaction, so the check runs after the write
/// and is compensated rather than guarded up front. Concurrent writers to the same id are
/// not protected against.
pub async fn insert_with_role_check<S: EntityStore>(
    store: &S,
    collection: Collection,
    document: Document,
    person_ids: &[Id],
    expected: Role,
) -> Result<VerifiedInsert> {
    let stored = store.insert(collection, document).await?;
    let id = stored.id().unwrap_or_default().to_string();

    let check = match verify_roles(store, person_ids, expected).await {
        Ok(check) => check,
        Err(err) => {
            log::warn!(
                "Role check errored for new {} '{}', removing it: {:#}",
                collection,
                id,
                err
            );
            store.delete_one(collection, &id).await?;
            return Err(err);
        }
    };

    match check {
        RoleCheck::Confirmed => {
            log::info!("Created {} '{}'", collection, id);
            Ok(VerifiedInsert::Stored(stored))
        }
        failed => {
            log::warn!(
                "Role check failed for new {} '{}' ({:?}), removing it",
                collection,
                id,
                failed
            );
            store.delete_one(collection, &id).await?;
            Ok(VerifiedInsert::RolledBack(failed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;

    const ASSISTANT_REFERENCES: &[ReferenceField] = &[
        ReferenceField::new("_id", "person", Collection::People),
        ReferenceField::new("cantonId", "canton", Collection::Cantons),
    ];

    fn doc(value: Value) -> Document {
        serde_json::from_value(value).unwrap()
    }

    async fn seed(store: &InMemoryStore) {
        let address = json!({
            "postCode": 2800, "city": "Delémont", "streetName": "Rue", "streetNumber": 1
        });
        for (id, role) in [("kid", "child"), ("helper", "assistant")] {
            store
                .insert(
                    Collection::People,
                    doc(json!({
                        "_id": id, "firstName": "A", "lastName": "B", "email": "a@b.ch",
                        "phoneNumber": "000", "address": address, "role": role
                    })),
                )
                .await
                .unwrap();
        }
        store
            .insert(
                Collection::Cantons,
                doc(json!({"_id": "jura", "name": "Jura", "address": address})),
            )
            .await
            .unwrap();
    }

    #[test]
    fn messages_compose_in_field_order() {
        let missing = MissingReferences {
            labels: vec!["person", "canton"],
        };
        assert_eq!(missing.to_string(), "Person not found and canton not found");

        let missing = MissingReferences {
            labels: vec!["child for absence"],
        };
        assert_eq!(missing.to_string(), "Child for absence not found");
    }

    #[tokio::test]
    async fn reports_absent_and_dangling_references() {
        let store = InMemoryStore::new();
        seed(&store).await;

        let assistant = doc(json!({"_id": "helper", "cantonId": "jura"}));
        let ok = missing_references(&store, &assistant, ASSISTANT_REFERENCES)
            .await
            .unwrap();
        assert!(ok.is_empty());

        let both = missing_references(&store, &doc(json!({"_id": "ghost"})), ASSISTANT_REFERENCES)
            .await
            .unwrap();
        assert_eq!(both.labels(), &["person", "canton"]);

        let absence = [ReferenceField::new("absence", "child for absence", Collection::People)];
        let course = doc(json!({"absence": ["kid", "ghost"]}));
        let partial = missing_references(&store, &course, &absence)
            .await
            .unwrap();
        assert_eq!(partial.labels(), &["child for absence"]);
    }

    #[tokio::test]
    async fn wrong_role_is_rolled_back() {
        let store = InMemoryStore::new();
        seed(&store).await;

        let outcome = insert_with_role_check(
            &store,
            Collection::Assistants,
            doc(json!({"_id": "kid", "cantonId": "jura"})),
            &["kid".to_string()],
            Role::Assistant,
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            VerifiedInsert::RolledBack(RoleCheck::Mismatch {
                person_id: "kid".to_string(),
                role: Some(Role::Child),
            })
        );
        assert_eq!(store.count(Collection::Assistants), 0);
    }

    #[tokio::test]
    async fn matching_role_is_kept() {
        let store = InMemoryStore::new();
        seed(&store).await;

        let outcome = insert_with_role_check(
            &store,
            Collection::Assistants,
            doc(json!({"_id": "helper", "cantonId": "jura"})),
            &["helper".to_string()],
            Role::Assistant,
        )
        .await
        .unwrap();

        assert!(matches!(
            outcome,
            VerifiedInsert::Stored(ref stored) if stored.id() == Some("helper")
        ));
        assert_eq!(store.count(Collection::Assistants), 1);
    }

    #[tokio::test]
    async fn role_is_read_from_incomplete_people() {
        let store = InMemoryStore::new();
        seed(&store).await;
        store
            .insert(Collection::People, doc(json!({"_id": "sparse", "role": "child"})))
            .await
            .unwrap();

        let outcome = insert_with_role_check(
            &store,
            Collection::Assistants,
            doc(json!({"_id": "sparse", "cantonId": "jura"})),
            &["sparse".to_string()],
            Role::Assistant,
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            VerifiedInsert::RolledBack(RoleCheck::Mismatch {
                person_id: "sparse".to_string(),
                role: Some(Role::Child),
            })
        );
        assert_eq!(store.count(Collection::Assistants), 0);
    }

    /// Delegates to an in-memory store but cannot read people
    struct PeopleUnavailable(InMemoryStore);

    #[async_trait::async_trait]
    impl EntityStore for PeopleUnavailable {
        async fn find_many(
            &self,
            collection: Collection,
            filter: &crate::model::FilterExpr,
        ) -> Result<Vec<Document>> {
            self.0.find_many(collection, filter).await
        }

        async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
            if collection == Collection::People {
                anyhow::bail!("connection reset");
            }
            self.0.find_by_id(collection, id).await
        }

        async fn insert(&self, collection: Collection, document: Document) -> Result<Document> {
            self.0.insert(collection, document).await
        }

        async fn update_one(
            &self,
            collection: Collection,
            id: &str,
            updates: &[crate::model::FieldUpdate],
        ) -> Result<crate::model::UpdateResult> {
            self.0.update_one(collection, id, updates).await
        }

        async fn delete_one(
            &self,
            collection: Collection,
            id: &str,
        ) -> Result<crate::model::DeleteResult> {
            self.0.delete_one(collection, id).await
        }
    }

    #[tokio::test]
    async fn failed_role_lookup_still_removes_the_record() {
        let inner = InMemoryStore::new();
        seed(&inner).await;
        let store = PeopleUnavailable(inner);

        let outcome = insert_with_role_check(
            &store,
            Collection::Assistants,
            doc(json!({"_id": "helper", "cantonId": "jura"})),
            &["helper".to_string()],
            Role::Assistant,
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(store.0.count(Collection::Assistants), 0);
    }
}
