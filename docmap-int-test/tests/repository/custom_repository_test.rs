use docmap::errors::ErrorKind;
use docmap::metadata::{EntityType, RepositoryType};
use docmap::repository::RepositoryProvider;
use docmap_int_test::entities::{OtherUserRepository, User, UserRepository};
use docmap_int_test::test_util::{create_test_context, insert_sample_users, run_test};

#[tokio::test]
async fn test_custom_repository_queries() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.custom_repository::<UserRepository>()?;
        insert_sample_users(users.repository()).await?;

        let adults = users.find_adults().await?;
        let names: Vec<&str> = adults.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Dee", "Ann", "Eve", "Cid"]);

        let eve = users.find_by_name("Eve").await?;
        assert_eq!(eve.map(|u| u.age), Some(41));
        assert!(users.find_by_name("Zed").await?.is_none());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_registered_custom_repository() {
    run_test(create_test_context, |ctx| async move {
        ctx.storage().register_custom_repository_for::<UserRepository>();

        let users = ctx.custom_repository::<UserRepository>()?;
        assert_eq!(
            users.repository().descriptor().custom_repository,
            Some(RepositoryType::of::<UserRepository>())
        );

        let err = ctx.custom_repository::<OtherUserRepository>().err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::MetadataError));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_custom_repository_needs_registered_entity() {
    run_test(create_test_context, |ctx| async move {
        let storage = ctx.storage();
        storage.reset();
        storage.set_store(std::sync::Arc::new(ctx.store()));
        assert!(!storage.is_registered(&EntityType::of::<User>()));

        let err = ctx.custom_repository::<UserRepository>().err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::UnregisteredCollection));
        Ok(())
    })
    .await
}
