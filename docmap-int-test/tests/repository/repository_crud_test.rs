use docmap::common::Value;
use docmap::errors::ErrorKind;
use docmap::repository::{Entity, RepositoryProvider};
use docmap::store::{StoreClient, StoreValue};
use docmap_int_test::entities::{Account, User};
use docmap_int_test::test_util::{create_test_context, run_test};

#[tokio::test]
async fn test_create_generates_id() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        assert_eq!(users.collection_path(), "users");

        let created = users.create(&User::new("Ann", 34)).await?;
        let id = created.id().unwrap_or_default().to_string();
        assert!(!id.is_empty());
        assert_eq!(created.name, "Ann");
        assert_eq!(ctx.store().document_count("users"), 1);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_create_then_find_by_id() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let user = User::new("Ann", 34).with_tags(&["admin"]).living_in("Oslo");
        let created = users.create(&user).await?;

        let found = users.find_by_id(created.id().unwrap_or_default()).await?;
        let found = found.expect("user should exist");
        assert_eq!(found, created);
        assert_eq!(found.address.as_ref().map(|a| a.city.as_str()), Some("Oslo"));
        assert_eq!(found.tags, vec!["admin".to_string()]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_create_keeps_existing_id() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let mut user = User::new("Ann", 34);
        user.id = Some("ann".to_string());
        let created = users.create(&user).await?;
        assert_eq!(created.id.as_deref(), Some("ann"));
        assert!(users.find_by_id("ann").await?.is_some());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_empty_id_counts_as_absent() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let mut user = User::new("Ann", 34);
        user.id = Some(String::new());
        let created = users.create(&user).await?;
        assert!(created.id.as_deref().is_some_and(|id| !id.is_empty()));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_id_is_not_stored_as_field() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let created = users.create(&User::new("Ann", 34)).await?;
        let id = created.id().unwrap_or_default().to_string();

        let raw = ctx.store().get_document("users", &id).await?;
        assert!(!raw.fields.contains_key("id"));
        assert_eq!(raw.fields.get("name"), Some(&StoreValue::String("Ann".into())));
        assert_eq!(raw.path, format!("users/{}", id));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_find_missing_is_none() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        assert!(users.find_by_id("does-not-exist").await?.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_overwrites() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let mut user = users.create(&User::new("Ann", 34).living_in("Oslo")).await?;
        user.age = 35;
        user.address = None;
        let updated = users.update(&user).await?;
        assert_eq!(updated.age, 35);

        let found = users.find_by_id(user.id().unwrap_or_default()).await?;
        let found = found.expect("user should exist");
        assert_eq!(found.age, 35);
        assert_eq!(found.address, None);
        assert_eq!(ctx.store().document_count("users"), 1);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_without_id_fails() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let err = users.update(&User::new("Ann", 34)).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
        assert_eq!(ctx.store().operation_count(), 0);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    run_test(create_test_context, |ctx| async move {
        let places = ctx.repository_at::<docmap::common::Document>("places")?;
        let err = places
            .update(&docmap::doc! { id: "ghost", name: "x" })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NotFound);
        assert_eq!(ctx.store().document_count("places"), 0);

        let users = ctx.repository::<User>()?;
        let mut user = User::new("Ann", 34);
        user.id = Some("ann".to_string());
        let err = users.update(&user).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(users.find_by_id("ann").await?.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let created = users.create(&User::new("Ann", 34)).await?;
        let id = created.id().unwrap_or_default().to_string();

        users.delete(&id).await?;
        assert!(users.find_by_id(&id).await?.is_none());
        users.delete(&id).await?;
        assert_eq!(ctx.store().document_count("users"), 0);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_custom_id_field() {
    run_test(create_test_context, |ctx| async move {
        let accounts = ctx.repository::<Account>()?;
        assert_eq!(accounts.collection_path(), "ledger");
        assert_eq!(Account::id_field(), "number");

        accounts.create(&Account::new("acc-1", "Ann", 100)).await?;
        let raw = ctx.store().get_document("ledger", "acc-1").await?;
        assert!(!raw.fields.contains_key("number"));

        let found = accounts.find_by_id("acc-1").await?.expect("account should exist");
        assert_eq!(found, Account::new("acc-1", "Ann", 100));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_unregistered_entity() {
    run_test(create_test_context, |ctx| async move {
        let err = ctx.repository::<docmap::common::Document>().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnregisteredCollection);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_document_repository_at_path() {
    run_test(create_test_context, |ctx| async move {
        let logs = ctx.repository_at::<docmap::common::Document>("audit")?;
        let created = logs.create(&docmap::doc! { action: "login", count: 3 }).await?;
        let id = created.id().unwrap_or_default().to_string();

        let found = logs.find_by_id(&id).await?.expect("log should exist");
        assert_eq!(found.get("action"), Value::from("login"));
        assert_eq!(found.get("count"), Value::from(3));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_invalid_collection_path() {
    run_test(create_test_context, |ctx| async move {
        let err = ctx.repository_at::<User>("users/u1").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
        let err = ctx.repository_at::<User>("").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
        Ok(())
    })
    .await
}
