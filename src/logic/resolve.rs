use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::{Collection, FilterExpr, Id};
use crate::store::traits::{EntityStore, EntityStoreExt};

/// Translates human-facing query values (names, titles, periods, dates) into sets of ids
/// usable as filters on another collection.
///
/// Every resolver is a chain of dependent store reads: each hop's filter is built from the
/// ids returned by the previous hop, so hops run strictly in sequence. Independent
/// resolvers can run concurrently.
pub struct QueryResolver<'a, S: EntityStore> {
    store: &'a S,
}

impl<'a, S: EntityStore> QueryResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// People whose first or last name matches the query, case-insensitively.
    ///
    /// A query with exactly one space is split in two tokens, and a person matches when
    /// either token matches either name field (a union, not a first/last pairing).
    /// Any other query is matched whole.
    pub async fn people_by_name(&self, query: &str) -> Result<Vec<Id>> {
        let tokens: Vec<&str> = query.split(' ').collect();
        let terms = if tokens.len() == 2 { tokens } else { vec![query] };

        let mut predicates = Vec::with_capacity(terms.len() * 2);
        for term in terms {
            predicates.push(FilterExpr::matches_ignore_case("lastName", term));
            predicates.push(FilterExpr::matches_ignore_case("firstName", term));
        }

        let ids = self
            .store
            .find_ids(Collection::People, &FilterExpr::any(predicates))
            .await?;
        log::debug!("name '{}' resolved to {} people", query, ids.len());
        Ok(ids)
    }

    /// Cantons whose name is one of `names`
    pub async fn cantons_by_name(&self, names: &[String]) -> Result<Vec<Id>> {
        let names = names.iter().cloned().map(Value::String).collect();
        self.store
            .find_ids(Collection::Cantons, &FilterExpr::is_in("name", names))
            .await
    }

    /// Classes belonging to any of the given cantons
    pub async fn classes_by_cantons(&self, canton_ids: &[Id]) -> Result<Vec<Id>> {
        self.store
            .find_ids(Collection::Classes, &FilterExpr::ref_in("cantonId", canton_ids))
            .await
    }

    /// Classes of the cantons named `names`
    pub async fn classes_by_canton_name(&self, names: Vec<String>) -> Result<Vec<Id>> {
        let canton_ids = self.cantons_by_name(&names).await?;
        let class_ids = self.classes_by_cantons(&canton_ids).await?;
        log::debug!(
            "canton {:?} resolved to {} cantons, {} classes",
            names,
            canton_ids.len(),
            class_ids.len()
        );
        Ok(class_ids)
    }

    /// Assistants attached to the named cantons followed by the children of those cantons'
    /// classes. The result mixes both kinds of person id.
    pub async fn people_by_canton(&self, names: Vec<String>) -> Result<Vec<Id>> {
        let canton_ids = self.cantons_by_name(&names).await?;

        let mut ids = self
            .store
            .find_ids(Collection::Assistants, &FilterExpr::ref_in("cantonId", &canton_ids))
            .await?;
        let assistants = ids.len();

        let class_ids = self.classes_by_cantons(&canton_ids).await?;
        let children = self
            .store
            .find_ids(Collection::Children, &FilterExpr::ref_in("classId", &class_ids))
            .await?;
        ids.extend(children);

        log::debug!(
            "canton {:?} resolved to {} assistants, {} children",
            names,
            assistants,
            ids.len() - assistants
        );
        Ok(ids)
    }

    /// Themes whose title matches `title` (case-sensitive, unanchored)
    pub async fn themes_by_title(&self, title: &str) -> Result<Vec<Id>> {
        self.store
            .find_ids(Collection::Themes, &FilterExpr::matches("title", title))
            .await
    }

    /// Courses on any theme whose title matches `title`
    pub async fn courses_by_theme_title(&self, title: &str) -> Result<Vec<Id>> {
        let theme_ids = self.themes_by_title(title).await?;
        let course_ids = self
            .store
            .find_ids(Collection::Courses, &FilterExpr::ref_in("themeId", &theme_ids))
            .await?;
        log::debug!(
            "theme '{}' resolved to {} themes, {} courses",
            title,
            theme_ids.len(),
            course_ids.len()
        );
        Ok(course_ids)
    }

    /// Courses held exactly at `date`
    pub async fn courses_by_date(&self, date: DateTime<Utc>) -> Result<Vec<Id>> {
        self.store
            .find_ids(Collection::Courses, &date_filter(date))
            .await
    }

    /// Classes held in the given period. The value is passed through as is; an unknown
    /// period simply matches nothing.
    pub async fn classes_by_period(&self, period: &str) -> Result<Vec<Id>> {
        self.store
            .find_ids(Collection::Classes, &FilterExpr::eq("periode", period))
            .await
    }

    /// Children whose class is held in the given period
    pub async fn children_by_period(&self, period: &str) -> Result<Vec<Id>> {
        let class_ids = self.classes_by_period(period).await?;
        self.store
            .find_ids(Collection::Children, &FilterExpr::ref_in("classId", &class_ids))
            .await
    }

    /// Courses given to the classes of the named cantons
    pub async fn courses_by_canton_name(&self, names: Vec<String>) -> Result<Vec<Id>> {
        let class_ids = self.classes_by_canton_name(names).await?;
        self.store
            .find_ids(Collection::Courses, &FilterExpr::ref_in("classId", &class_ids))
            .await
    }
}

/// Exact-match filter on a course date, using the stored representation
pub fn date_filter(date: DateTime<Utc>) -> FilterExpr {
    FilterExpr::eq("date", serde_json::to_value(date).unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse_date, Document};
    use crate::store::InMemoryStore;
    use serde_json::json;

    async fn put(store: &InMemoryStore, collection: Collection, value: Value) -> Id {
        let document: Document = serde_json::from_value(value).unwrap();
        let stored = store.insert(collection, document).await.unwrap();
        stored.id().unwrap().to_string()
    }

    async fn person(store: &InMemoryStore, first: &str, last: &str, role: &str) -> Id {
        put(
            store,
            Collection::People,
            json!({"firstName": first, "lastName": last, "role": role}),
        )
        .await
    }

    /// Jura (morning and afternoon classes) and Vaud (morning class), an assistant and a
    /// child in each, and two courses on 2021-02-21.
    struct Fixture {
        store: InMemoryStore,
        jura_classes: Vec<Id>,
        jura_assistant: Id,
        jura_child: Id,
        vaud_child: Id,
        gmail_course: Id,
        word_course: Id,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let jura = put(&store, Collection::Cantons, json!({"name": "Jura"})).await;
        let vaud = put(&store, Collection::Cantons, json!({"name": "Vaud"})).await;

        let class = |canton: &str, period: &str| json!({"cantonId": canton, "periode": period});
        let jura_morning = put(&store, Collection::Classes, class(&jura, "morning")).await;
        let jura_afternoon = put(&store, Collection::Classes, class(&jura, "afternoon")).await;
        let vaud_morning = put(&store, Collection::Classes, class(&vaud, "morning")).await;

        let jura_assistant = person(&store, "Jean", "Marais", "assistant").await;
        put(&store, Collection::Assistants, json!({"_id": jura_assistant, "cantonId": jura})).await;
        let vaud_assistant = person(&store, "Luc", "Favre", "assistant").await;
        put(&store, Collection::Assistants, json!({"_id": vaud_assistant, "cantonId": vaud})).await;

        let jura_child = person(&store, "Marie", "Dupond", "child").await;
        let child = json!({"_id": jura_child, "classId": jura_afternoon});
        put(&store, Collection::Children, child).await;
        let vaud_child = person(&store, "Paul", "Curie", "child").await;
        let child = json!({"_id": vaud_child, "classId": vaud_morning});
        put(&store, Collection::Children, child).await;

        let gmail = put(&store, Collection::Themes, json!({"title": "Gmail basics"})).await;
        let word = put(&store, Collection::Themes, json!({"title": "Word"})).await;

        let gmail_course = put(
            &store,
            Collection::Courses,
            json!({"themeId": gmail, "classId": jura_morning, "date": "2021-02-21T00:00:00Z"}),
        )
        .await;
        let word_course = put(
            &store,
            Collection::Courses,
            json!({"themeId": word, "classId": vaud_morning, "date": "2021-02-21T00:00:00Z"}),
        )
        .await;

        Fixture {
            store,
            jura_classes: vec![jura_morning, jura_afternoon],
            jura_assistant,
            jura_child,
            vaud_child,
            gmail_course,
            word_course,
        }
    }

    #[tokio::test]
    async fn two_token_names_match_either_token() {
        let f = fixture().await;
        let resolver = QueryResolver::new(&f.store);

        // Union semantics: "Marie" alone is enough to match Marie Dupond
        let ids = resolver.people_by_name("Marie Skłodowska").await.unwrap();
        assert_eq!(ids, vec![f.jura_child.clone()]);

        let ids = resolver.people_by_name("Marie Curie").await.unwrap();
        assert_eq!(ids, vec![f.jura_child.clone(), f.vaud_child.clone()]);
    }

    #[tokio::test]
    async fn single_token_names_are_case_insensitive() {
        let f = fixture().await;
        let resolver = QueryResolver::new(&f.store);

        assert_eq!(resolver.people_by_name("dupond").await.unwrap(), vec![f.jura_child.clone()]);
        assert!(resolver.people_by_name("Nobody").await.unwrap().is_empty());
        // Two spaces: matched whole, which nobody's single name field contains
        assert!(resolver.people_by_name("Marie  Dupond").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn canton_to_classes_is_exact() {
        let f = fixture().await;
        let resolver = QueryResolver::new(&f.store);

        let jura = resolver.cantons_by_name(&["Jura".to_string()]).await.unwrap();
        assert_eq!(resolver.classes_by_cantons(&jura).await.unwrap(), f.jura_classes);
        assert!(resolver.classes_by_cantons(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn canton_people_lists_assistants_then_children() {
        let f = fixture().await;
        let resolver = QueryResolver::new(&f.store);

        let ids = resolver.people_by_canton(vec!["Jura".to_string()]).await.unwrap();
        assert_eq!(ids, vec![f.jura_assistant.clone(), f.jura_child.clone()]);

        let none = resolver.people_by_canton(vec!["Genève".to_string()]).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn theme_title_is_case_sensitive() {
        let f = fixture().await;
        let resolver = QueryResolver::new(&f.store);

        assert_eq!(
            resolver.courses_by_theme_title("Gmail").await.unwrap(),
            vec![f.gmail_course.clone()]
        );
        assert!(resolver.courses_by_theme_title("gmail").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn date_and_period_and_canton_courses() {
        let f = fixture().await;
        let resolver = QueryResolver::new(&f.store);

        let date = parse_date("2021-02-21").unwrap();
        assert_eq!(
            resolver.courses_by_date(date).await.unwrap(),
            vec![f.gmail_course.clone(), f.word_course.clone()]
        );
        assert!(resolver
            .courses_by_date(parse_date("2021-02-22").unwrap())
            .await
            .unwrap()
            .is_empty());

        assert_eq!(
            resolver.children_by_period("morning").await.unwrap(),
            vec![f.vaud_child.clone()]
        );
        assert!(resolver.children_by_period("evening").await.unwrap().is_empty());

        assert_eq!(
            resolver.courses_by_canton_name(vec!["Vaud".to_string()]).await.unwrap(),
            vec![f.word_course.clone()]
        );
    }
}
