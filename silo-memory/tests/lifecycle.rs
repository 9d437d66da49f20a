#[cfg(test)]
mod tests {
    use indoc::indoc;
    use log::LevelFilter;
    use silo::{
        AsValue, Behavior, ConnectOptions, Connection, EntityType, Registry, Schema, Value, future,
        pipe, task,
    };
    use silo_memory::MemoryEngine;
    use std::{
        env,
        sync::{
            Arc,
            atomic::{AtomicU32, Ordering},
        },
    };

    fn init_logs() {
        let mut logger = env_logger::builder();
        logger
            .is_test(true)
            .format_file(true)
            .format_line_number(true);
        if env::var("RUST_LOG").is_err() {
            logger.filter_level(LevelFilter::Warn);
        }
        let _ = logger.try_init();
    }

    async fn create_notes(connection: &Connection<MemoryEngine>) {
        connection
            .execute(
                indoc! {"
                    CREATE TABLE notes(
                    id INTEGER PRIMARY KEY,
                    title TEXT,
                    done BOOLEAN
                    )
                "},
                &[],
            )
            .await
            .expect("Could not create the notes table");
    }

    async fn notes_class() -> (Registry<MemoryEngine>, Arc<EntityType<MemoryEngine>>) {
        init_logs();
        let registry = Registry::new();
        let connection = registry.open(None).await.unwrap();
        create_notes(&connection).await;
        let class = registry
            .define(Schema::new("notes", ["title", "done"]), Behavior::new())
            .await
            .unwrap();
        (registry, class)
    }

    #[tokio::test]
    async fn save_assigns_the_engine_generated_key() {
        let (_registry, class) = notes_class().await;
        let mut note = class.blank();
        note.set("title", "first").set("done", false);
        assert!(!note.is_saved());
        note.save().await.unwrap();
        assert!(note.is_saved());
        assert_eq!(note.get("id"), Some(&Value::Integer(1)));
        let mut second = class.blank();
        second.set("title", "second");
        second.save().await.unwrap();
        assert_eq!(second.get("id"), Some(&Value::Integer(2)));
    }

    #[tokio::test]
    async fn save_with_the_key_listed_in_columns() {
        init_logs();
        let registry = Registry::<MemoryEngine>::new();
        let connection = registry.open(None).await.unwrap();
        connection
            .execute(
                "CREATE TABLE books(id INTEGER PRIMARY KEY, title TEXT)",
                &[],
            )
            .await
            .unwrap();
        // The key column appears in the INSERT as NULL and the engine still
        // assigns it.
        let class = registry
            .define(Schema::new("books", ["id", "title"]), Behavior::new())
            .await
            .unwrap();
        let mut book = class.blank();
        book.set("title", "Dune");
        book.save().await.unwrap();
        assert_eq!(book.get("id"), Some(&Value::Integer(1)));
        let found = class.find_all().await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("title"), Some(&Value::Text("Dune".into())));
    }

    #[tokio::test]
    async fn saving_twice_updates_in_place() {
        let (_registry, class) = notes_class().await;
        let mut note = class.blank();
        note.set("title", "draft").set("done", false);
        note.save().await.unwrap();
        note.set("title", "revised");
        note.save().await.unwrap();
        let found = class.find_all().await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("title"), Some(&Value::Text("revised".into())));
        assert_eq!(found[0].get("id"), note.get("id"));
    }

    #[tokio::test]
    async fn saved_booleans_come_back_as_integers() {
        let (_registry, class) = notes_class().await;
        let mut note = class.blank();
        note.set("title", "persisted").set("done", true);
        note.save().await.unwrap();
        let found = class.find_all().await.unwrap();
        // One field per table column comes back.
        assert_eq!(found[0].fields().len(), 3);
        assert_eq!(found[0].get("done"), Some(&Value::Integer(1)));
        assert!(bool::try_from_value(found[0].get("done").cloned().unwrap()).unwrap());
        // A column never set goes out as NULL.
        let mut bare = class.blank();
        bare.set("title", "no flag");
        bare.save().await.unwrap();
        let found = class
            .find("WHERE done IS NULL", &[])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("title"), Some(&Value::Text("no flag".into())));
    }

    #[tokio::test]
    async fn a_present_key_always_updates() {
        init_logs();
        let registry = Registry::<MemoryEngine>::new();
        let connection = registry.open(None).await.unwrap();
        connection
            .execute("CREATE TABLE codes(code TEXT PRIMARY KEY, label TEXT)", &[])
            .await
            .unwrap();
        let class = registry
            .define(
                Schema::new("codes", ["code", "label"]).primary_key("code"),
                Behavior::new(),
            )
            .await
            .unwrap();
        let mut code = class.blank();
        code.set("code", "alpha").set("label", "first");
        // A hand-set key counts as a saved identity, so save issues an
        // UPDATE, which silently touches nothing here.
        assert!(code.is_saved());
        code.save().await.unwrap();
        assert!(class.find_all().await.unwrap().is_empty());
        // Zero keys count as present, empty text and NULL do not.
        code.set("code", 0);
        assert!(code.is_saved());
        code.set("code", "");
        assert!(!code.is_saved());
        code.set("code", Value::Null);
        assert!(!code.is_saved());
    }

    #[tokio::test]
    async fn a_zero_integer_key_updates_instead_of_inserting() {
        let (_registry, class) = notes_class().await;
        let mut note = class.blank();
        note.set("id", 0).set("title", "zero").set("done", false);
        assert!(note.is_saved());
        note.save().await.unwrap();
        // The UPDATE matches no row and nothing gets inserted.
        assert!(class.find_all().await.unwrap().is_empty());
        assert_eq!(note.get("id"), Some(&Value::Integer(0)));
    }

    #[tokio::test]
    async fn destroy_clears_identity_and_row() {
        let (_registry, class) = notes_class().await;
        let mut note = class.blank();
        note.set("title", "doomed").set("done", false);
        note.save().await.unwrap();
        note.destroy().await.unwrap();
        assert!(!note.is_saved());
        assert_eq!(note.get("id"), None);
        assert!(class.find_all().await.unwrap().is_empty());
        // The instance can be saved again and becomes a fresh row.
        note.save().await.unwrap();
        assert_eq!(note.get("id"), Some(&Value::Integer(2)));
    }

    #[tokio::test]
    async fn destroy_of_an_unsaved_instance_issues_no_statement() {
        let (_registry, class) = notes_class().await;
        let executed = class.connection().engine().executed_statements();
        let mut note = class.blank();
        note.set("title", "never persisted");
        note.destroy().await.unwrap();
        assert!(!note.is_saved());
        assert_eq!(
            note.get("title"),
            Some(&Value::Text("never persisted".into()))
        );
        assert_eq!(class.connection().engine().executed_statements(), executed);
    }

    #[tokio::test]
    async fn find_filters_rows_preserving_insertion_order() {
        let (_registry, class) = notes_class().await;
        for (title, done) in [
            ("alpha", false),
            ("bravo", true),
            ("charlie", false),
            ("delta", true),
        ] {
            let mut note = class.blank();
            note.set("title", title).set("done", done);
            note.save().await.unwrap();
        }
        let found = class
            .find("WHERE done=?", &[Value::Boolean(true)])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].get("title"), Some(&Value::Text("bravo".into())));
        assert_eq!(found[1].get("title"), Some(&Value::Text("delta".into())));
        // The stored 1/0 matches an integer parameter just as well.
        let found = class
            .find("WHERE done=?", &[Value::Integer(1)])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        let found = class
            .find("WHERE done=? ORDER BY title DESC", &[Value::Integer(0)])
            .await
            .unwrap();
        assert_eq!(found[0].get("title"), Some(&Value::Text("charlie".into())));
        assert_eq!(found[1].get("title"), Some(&Value::Text("alpha".into())));
        assert_eq!(class.find_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn a_failed_save_leaves_the_instance_unchanged() {
        init_logs();
        let registry = Registry::<MemoryEngine>::new();
        // No table is ever created for this entity.
        let class = registry
            .define(Schema::new("ghosts", ["title"]), Behavior::new())
            .await
            .unwrap();
        let mut ghost = class.blank();
        ghost.set("title", "boo");
        assert!(ghost.save().await.is_err());
        assert!(!ghost.is_saved());
        assert_eq!(ghost.get("id"), None);
        assert_eq!(ghost.get("title"), Some(&Value::Text("boo".into())));
    }

    #[tokio::test]
    async fn is_equal_requires_type_and_saved_identity() {
        let (registry, class) = notes_class().await;
        let mut note = class.blank();
        note.set("title", "shared").set("done", false);
        note.save().await.unwrap();
        let first = class.find_all().await.unwrap();
        let second = class.find_all().await.unwrap();
        // Two loads of the same row are independent instances of the same
        // entity type with the same identity.
        assert!(Arc::ptr_eq(first[0].class(), second[0].class()));
        assert!(first[0].is_equal(&second[0]));
        assert!(first[0].is_equal(&note));
        let blank = class.blank();
        assert!(!blank.is_equal(&blank));
        assert!(!blank.is_equal(&note));
        // Same key on a different entity type is a different identity.
        let connection = registry.open(None).await.unwrap();
        connection
            .execute("CREATE TABLE tags(id INTEGER PRIMARY KEY, label TEXT)", &[])
            .await
            .unwrap();
        let tags = registry
            .define(Schema::new("tags", ["label"]), Behavior::new())
            .await
            .unwrap();
        let mut tag = tags.blank();
        tag.set("label", "misc");
        tag.save().await.unwrap();
        assert_eq!(tag.get("id"), note.get("id"));
        assert!(!tag.is_equal(&note));
    }

    #[tokio::test]
    async fn registry_memoizes_the_default_connection() {
        init_logs();
        let registry = Registry::<MemoryEngine>::new();
        let first = registry.open(None).await.unwrap();
        let second = registry.open(None).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        let side = registry
            .open(Some(ConnectOptions::new().name("side")))
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &side));
        // The explicit open did not displace the default.
        let third = registry.open(None).await.unwrap();
        assert!(Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn redefining_an_entity_name_is_an_error() {
        let (registry, _class) = notes_class().await;
        let error = registry
            .define(Schema::new("notes", ["title", "done"]), Behavior::new())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("already defined"));
        // A different logical name on the same table is fine.
        registry
            .define(
                Schema::new("notes", ["title", "done"]).named("Note"),
                Behavior::new(),
            )
            .await
            .unwrap();
        assert!(registry.entity_type("Note").await.is_some());
        assert!(registry.entity_type("notes").await.is_some());
        assert!(registry.entity_type("missing").await.is_none());
        // Malformed schemas are refused outright.
        assert!(
            registry
                .define(Schema::new("", ["title"]), Behavior::new())
                .await
                .is_err()
        );
        assert!(
            registry
                .define(Schema::new("empty", Vec::<String>::new()), Behavior::new())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn blank_instances_carry_defaults() {
        init_logs();
        let registry = Registry::<MemoryEngine>::new();
        let fixed = registry
            .define(
                Schema::new("posts", ["title", "draft"]).defaults([("draft", true)]),
                Behavior::new(),
            )
            .await
            .unwrap();
        let post = fixed.blank();
        assert_eq!(post.get("draft"), Some(&Value::Boolean(true)));
        assert_eq!(post.get("title"), None);
        let counter = Arc::new(AtomicU32::new(0));
        let producer_counter = counter.clone();
        let produced = registry
            .define(
                Schema::new("drafts", ["title", "revision"]).defaults_with(move || {
                    let revision = producer_counter.fetch_add(1, Ordering::SeqCst);
                    vec![("revision".into(), Value::Integer(revision as i64))]
                }),
                Behavior::new(),
            )
            .await
            .unwrap();
        // The producer runs once per blank instance.
        assert_eq!(produced.blank().get("revision"), Some(&Value::Integer(0)));
        assert_eq!(produced.blank().get("revision"), Some(&Value::Integer(1)));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn admit_hook_vetoes_rows() {
        init_logs();
        let registry = Registry::new();
        let connection = registry.open(None).await.unwrap();
        create_notes(&connection).await;
        let behavior = Behavior::new().admit(|columns| {
            !columns
                .iter()
                .any(|(column, value)| column == "title" && value == &Value::Text("secret".into()))
        });
        let class = registry
            .define(Schema::new("notes", ["title", "done"]), behavior)
            .await
            .unwrap();
        for title in ["public", "secret", "also public"] {
            connection
                .execute("INSERT INTO notes(title) VALUES (?)", &[title.into()])
                .await
                .unwrap();
        }
        let found = class.find_all().await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].get("title"), Some(&Value::Text("public".into())));
        assert_eq!(
            found[1].get("title"),
            Some(&Value::Text("also public".into()))
        );
        // The factory applies the same veto.
        assert!(
            class
                .entity(vec![("title".to_string(), "secret".into())])
                .is_none()
        );
        assert!(
            class
                .entity(vec![("title".to_string(), "fine".into())])
                .is_some()
        );
    }

    #[tokio::test]
    async fn operations_run_against_the_instance() {
        init_logs();
        let registry = Registry::new();
        let connection = registry.open(None).await.unwrap();
        create_notes(&connection).await;
        let behavior = Behavior::new().operation("toggle", |entity, _args| {
            let done = matches!(
                entity.get("done"),
                Some(Value::Boolean(true)) | Some(Value::Integer(1))
            );
            entity.set("done", !done);
            Ok(Value::Boolean(!done))
        });
        let class = registry
            .define(Schema::new("notes", ["title", "done"]), behavior)
            .await
            .unwrap();
        let mut note = class.blank();
        note.set("title", "flip me").set("done", false);
        assert_eq!(note.invoke("toggle", &[]).unwrap(), Value::Boolean(true));
        assert_eq!(note.get("done"), Some(&Value::Boolean(true)));
        assert_eq!(note.invoke("toggle", &[]).unwrap(), Value::Boolean(false));
        let error = note.invoke("vanish", &[]).unwrap_err();
        assert!(error.to_string().contains("no operation named `vanish`"));
    }

    #[tokio::test]
    async fn concurrent_finds_share_the_connection() {
        let (_registry, class) = notes_class().await;
        for title in ["alpha", "bravo", "charlie"] {
            let mut note = class.blank();
            note.set("title", title).set("done", false);
            note.save().await.unwrap();
        }
        // Every find is an independent future; the engine serializes them
        // internally and each one sees the full table.
        let loads = future::try_join_all((0..4).map(|_| class.find_all()))
            .await
            .unwrap();
        assert_eq!(loads.len(), 4);
        for found in loads {
            assert_eq!(found.len(), 3);
            assert_eq!(found[0].get("title"), Some(&Value::Text("alpha".into())));
        }
    }

    #[tokio::test]
    async fn pipe_sequences_entity_work() {
        let (_registry, class) = notes_class().await;
        let tasks = ["one", "two", "three"].map(|title| {
            let class = class.clone();
            task(move || async move {
                let mut note = class.blank();
                note.set("title", title).set("done", false);
                note.save().await?;
                Ok(note.get("id").cloned().unwrap_or_default())
            })
        });
        let last = pipe(tasks).await.unwrap();
        assert_eq!(last, Some(Value::Integer(3)));
        let found = class.find_all().await.unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].get("title"), Some(&Value::Text("one".into())));
        assert_eq!(found[2].get("title"), Some(&Value::Text("three".into())));
    }
}
