use docmap::errors::ErrorKind;
use docmap::metadata::{get_metadata_storage, MetadataStorageConfig};
use docmap::repository::{get_custom_repository, get_repository, get_repository_at, RepositoryProvider};
use docmap::transaction::{begin_transaction, run_transaction};
use docmap_int_test::entities::{Comment, Post, User, UserRepository};
use docmap_int_test::test_util::{date, initialize_global, GLOBAL_REGISTRY_LOCK};

#[tokio::test]
async fn test_uninitialized_store() {
    let _guard = GLOBAL_REGISTRY_LOCK.lock().await;
    let storage = get_metadata_storage();
    storage.reset();
    storage.register_entity::<User>().unwrap();

    let err = get_repository::<User>().unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UninitializedStore);
    let err = begin_transaction().await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UninitializedStore);
}

#[tokio::test]
async fn test_user_scenario() {
    let _guard = GLOBAL_REGISTRY_LOCK.lock().await;
    let store = initialize_global(MetadataStorageConfig::new().validate_models(false)).unwrap();

    let users = get_repository::<User>().unwrap();
    let ann = users.create(&User::new("Ann", 34)).await.unwrap();
    users.create(&User::new("Bob", 17)).await.unwrap();

    let adults = users.where_greater_or_equal_than("age", 18).find().await.unwrap();
    assert_eq!(adults.len(), 1);
    assert_eq!(adults[0], ann);
    assert_eq!(store.document_count("users"), 2);

    let custom = get_custom_repository::<UserRepository>().unwrap();
    assert_eq!(custom.find_by_name("Bob").await.unwrap().map(|u| u.age), Some(17));
}

#[tokio::test]
async fn test_post_scenario() {
    let _guard = GLOBAL_REGISTRY_LOCK.lock().await;
    let store = initialize_global(MetadataStorageConfig::new().validate_models(false)).unwrap();

    let posts = get_repository::<Post>().unwrap();
    let post = posts.create(&Post::new("Hello", date(2024, 5, 1))).await.unwrap();
    let post_id = post.id.clone().unwrap_or_default();
    post.comments
        .repository()
        .unwrap()
        .create(&Comment::new("ann", "First!", 2))
        .await
        .unwrap();

    let path = format!("posts/{}/comments", post_id);
    assert_eq!(store.document_count(&path), 1);

    let comments = get_repository_at::<Comment>(&path).unwrap();
    let found = comments.find().await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].text, "First!");
}

#[tokio::test]
async fn test_global_transaction() {
    let _guard = GLOBAL_REGISTRY_LOCK.lock().await;
    let store = initialize_global(MetadataStorageConfig::new().validate_models(false)).unwrap();

    let created = run_transaction(|tx| async move {
        let users = tx.repository::<User>()?;
        users.create(&User::new("Ann", 34)).await
    })
    .await
    .unwrap();
    assert!(created.id.is_some());
    assert_eq!(store.document_count("users"), 1);
}
