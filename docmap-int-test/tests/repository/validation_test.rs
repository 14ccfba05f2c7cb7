use docmap::errors::ErrorKind;
use docmap::metadata::MetadataStorageConfig;
use docmap::repository::{Entity, RepositoryProvider};
use docmap_int_test::entities::{Account, User};
use docmap_int_test::test_util::{
    create_context_with, create_validating_context, run_test, user_validator,
};

#[tokio::test]
async fn test_valid_entity_is_written() {
    run_test(create_validating_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let created = users.create(&User::new("Ann", 34)).await?;
        assert!(created.id().is_some());
        assert!(users.validate(&created)?.is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_invalid_entity_is_rejected() {
    run_test(create_validating_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let err = users.create(&User::new("", -1)).await.unwrap_err();
        let violations = err.violations().expect("violations should be reported");
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "age"]);
        assert!(matches!(err.kind(), ErrorKind::ValidationFailure(_)));

        // nothing reaches the store
        assert_eq!(ctx.store().operation_count(), 0);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_update_is_validated() {
    run_test(create_validating_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let mut user = users.create(&User::new("Ann", 34)).await?;
        user.name = String::new();
        let err = users.update(&user).await.unwrap_err();
        assert_eq!(err.violations().map(|v| v.len()), Some(1));

        let stored = users
            .find_by_id(user.id().unwrap_or_default())
            .await?
            .expect("user should exist");
        assert_eq!(stored.name, "Ann");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_validate_reports_without_writing() {
    run_test(create_validating_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let violations = users.validate(&User::new("", 5))?;
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].constraint, "not_empty");
        assert_eq!(ctx.store().operation_count(), 0);

        // the validator only knows users
        let accounts = ctx.repository::<Account>()?;
        assert!(accounts.validate(&Account::new("a", "", -5))?.is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_missing_validator_is_a_setup_error() {
    run_test(
        || create_context_with(MetadataStorageConfig::new(), None),
        |ctx| async move {
            let users = ctx.repository::<User>()?;
            let err = users.create(&User::new("Ann", 34)).await.unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationSetup);
            assert!(err.violations().is_none());

            let err = users.validate(&User::new("Ann", 34)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationSetup);
            Ok(())
        },
    )
    .await
}

#[tokio::test]
async fn test_disabled_validation_skips_validator() {
    run_test(
        || {
            create_context_with(
                MetadataStorageConfig::new().validate_models(false),
                Some(user_validator()),
            )
        },
        |ctx| async move {
            let users = ctx.repository::<User>()?;
            users.create(&User::new("", -1)).await?;
            // an explicit validate still runs the validator
            assert_eq!(users.validate(&User::new("", -1))?.len(), 2);
            Ok(())
        },
    )
    .await
}

#[tokio::test]
async fn test_disabled_validation_without_validator() {
    run_test(
        || create_context_with(MetadataStorageConfig::new().validate_models(false), None),
        |ctx| async move {
            let users = ctx.repository::<User>()?;
            assert!(users.validate(&User::new("", -1))?.is_empty());
            Ok(())
        },
    )
    .await
}
