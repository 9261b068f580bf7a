use anyhow::{Context, Result};
use serde::Serialize;

use crate::model::{
    parse_date, Address, Collection, Document, Id, NewAssistant, NewCanton, NewChild, NewClass,
    NewCourse, NewPerson, NewTeaching, NewTheme, Period, Role,
};
use crate::store::traits::EntityStore;

async fn put<S: EntityStore, T: Serialize>(
    store: &S,
    collection: Collection,
    entity: &T,
) -> Result<Id> {
    let stored = store
        .insert(collection, Document::from_entity(entity)?)
        .await
        .with_context(|| format!("Failed to seed {}", collection))?;
    Ok(stored.id().unwrap_or_default().to_string())
}

fn address(post_code: u32, city: &str, street_name: &str, street_number: u32) -> Address {
    Address {
        post_code,
        city: city.to_string(),
        street_name: street_name.to_string(),
        street_number,
    }
}

async fn person<S: EntityStore>(
    store: &S,
    first_name: &str,
    last_name: &str,
    role: Role,
    home: Address,
) -> Result<Id> {
    let email = format!(
        "{}.{}@mail.com",
        first_name.to_lowercase(),
        last_name.to_lowercase()
    );
    put(
        store,
        Collection::People,
        &NewPerson {
            last_name: last_name.to_string(),
            first_name: first_name.to_string(),
            email,
            phone_number: "+41 78 888 88 88".to_string(),
            address: home,
            role,
        },
    )
    .await
}

async fn class<S: EntityStore>(store: &S, canton_id: &Id, period: Period) -> Result<Id> {
    put(
        store,
        Collection::Classes,
        &NewClass {
            canton_id: Some(canton_id.clone()),
            period,
        },
    )
    .await
}

async fn course<S: EntityStore>(
    store: &S,
    theme_id: &Id,
    class_id: &Id,
    date: &str,
    absence: Vec<Id>,
) -> Result<Id> {
    let date = parse_date(date).with_context(|| format!("Invalid seed date {}", date))?;
    put(
        store,
        Collection::Courses,
        &NewCourse {
            theme_id: Some(theme_id.clone()),
            class_id: Some(class_id.clone()),
            date,
            cost: 120.0,
            absence,
        },
    )
    .await
}

/// Load a small demonstration program: the cantons of Jura and Vaud with their classes,
/// themes, people, assistants, children, courses and teachings
pub async fn load_seed_data<S: EntityStore>(store: &S) -> Result<()> {
    let jura = put(
        store,
        Collection::Cantons,
        &NewCanton {
            name: "Jura".to_string(),
            budget: 25_000.0,
            address: address(2800, "Delémont", "Rue de la Préfecture", 12),
        },
    )
    .await?;
    let vaud = put(
        store,
        Collection::Cantons,
        &NewCanton {
            name: "Vaud".to_string(),
            budget: 40_000.0,
            address: address(1014, "Lausanne", "Place du Château", 1),
        },
    )
    .await?;

    let jura_morning = class(store, &jura, Period::Morning).await?;
    let jura_afternoon = class(store, &jura, Period::Afternoon).await?;
    let vaud_morning = class(store, &vaud, Period::Morning).await?;

    let gmail = put(
        store,
        Collection::Themes,
        &NewTheme {
            title: "Gmail".to_string(),
            description: Some("Sending and organising email".to_string()),
        },
    )
    .await?;
    let word = put(
        store,
        Collection::Themes,
        &NewTheme {
            title: "Word".to_string(),
            description: Some("Writing and formatting letters".to_string()),
        },
    )
    .await?;

    let longs_champs = address(2800, "Delémont", "Longs-Champs", 14);
    person(store, "Olivier", "Dupond", Role::Boss, longs_champs.clone()).await?;

    let stand = address(2800, "Delémont", "Rue du Stand", 3);
    let jean = person(store, "Jean", "Marais", Role::Assistant, stand).await?;
    let france = address(1004, "Lausanne", "Avenue de France", 8);
    let luc = person(store, "Luc", "Favre", Role::Assistant, france).await?;
    for (assistant, canton) in [(&jean, &jura), (&luc, &vaud)] {
        put(
            store,
            Collection::Assistants,
            &NewAssistant {
                id: Some(assistant.clone()),
                canton_id: Some(canton.clone()),
                salary: 24.0,
            },
        )
        .await?;
    }

    let marie = person(store, "Marie", "Dupond", Role::Child, longs_champs).await?;
    let geneve = address(1004, "Lausanne", "Rue de Genève", 21);
    let paul = person(store, "Paul", "Curie", Role::Child, geneve).await?;
    for (child, class_id) in [(&marie, &jura_afternoon), (&paul, &vaud_morning)] {
        put(
            store,
            Collection::Children,
            &NewChild {
                id: Some(child.clone()),
                class_id: Some(class_id.clone()),
                parental_statement: true,
                allergy: "None".to_string(),
            },
        )
        .await?;
    }

    let gmail_jura = course(store, &gmail, &jura_morning, "2021-02-21", Vec::new()).await?;
    let word_vaud = course(store, &word, &vaud_morning, "2021-02-21", vec![paul.clone()]).await?;
    let word_jura = course(store, &word, &jura_afternoon, "2021-03-07", Vec::new()).await?;

    for (assistant, course_id) in [(&jean, &gmail_jura), (&jean, &word_jura), (&luc, &word_vaud)] {
        put(
            store,
            Collection::Teachings,
            &NewTeaching {
                assistant_id: Some(assistant.clone()),
                course_id: Some(course_id.clone()),
            },
        )
        .await?;
    }

    log::info!(
        "Seed data loaded: 2 cantons, 3 classes, 2 themes, 5 people, 3 courses, 3 teachings"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn seed_fills_every_collection() {
        let store = InMemoryStore::new();
        load_seed_data(&store).await.unwrap();

        assert_eq!(store.count(Collection::Cantons), 2);
        assert_eq!(store.count(Collection::Classes), 3);
        assert_eq!(store.count(Collection::People), 5);
        assert_eq!(store.count(Collection::Assistants), 2);
        assert_eq!(store.count(Collection::Children), 2);
        assert_eq!(store.count(Collection::Courses), 3);
        assert_eq!(store.count(Collection::Teachings), 3);
    }
}
