use docmap::errors::{DocMapError, DocMapResult, ErrorKind};
use docmap::repository::{Entity, RepositoryProvider};
use docmap::transaction::Transaction;
use docmap_int_test::entities::{Account, Comment, Post, User, UserRepository};
use docmap_int_test::test_util::{create_test_context, date, run_test, TestContext};

async fn transfer(tx: &Transaction, from: &str, to: &str, amount: i64) -> DocMapResult<()> {
    let accounts = tx.repository::<Account>()?;
    let mut source = accounts
        .find_by_id(from)
        .await?
        .ok_or_else(|| DocMapError::new("missing source", ErrorKind::NotFound))?;
    let mut target = accounts
        .find_by_id(to)
        .await?
        .ok_or_else(|| DocMapError::new("missing target", ErrorKind::NotFound))?;

    if source.balance < amount {
        return Err(DocMapError::new("insufficient funds", ErrorKind::InvalidArgument));
    }
    source.balance -= amount;
    target.balance += amount;
    accounts.update(&source).await?;
    accounts.update(&target).await?;
    Ok(())
}

async fn open_accounts(ctx: &TestContext) -> DocMapResult<()> {
    let accounts = ctx.repository::<Account>()?;
    accounts.create(&Account::new("a", "Ann", 100)).await?;
    accounts.create(&Account::new("b", "Bob", 20)).await?;
    Ok(())
}

async fn balance(ctx: &TestContext, number: &str) -> DocMapResult<i64> {
    let account = ctx.repository::<Account>()?.find_by_id(number).await?;
    Ok(account.map(|a| a.balance).unwrap_or_default())
}

#[tokio::test]
async fn test_commit_makes_writes_visible() {
    run_test(create_test_context, |ctx| async move {
        let tx = ctx.begin_transaction().await?;
        let users = tx.repository::<User>()?;
        assert!(users.is_transactional());

        let created = users.create(&User::new("Ann", 34)).await?;
        let id = created.id().unwrap_or_default().to_string();

        // visible inside, not outside
        assert!(users.find_by_id(&id).await?.is_some());
        assert!(ctx.repository::<User>()?.find_by_id(&id).await?.is_none());

        tx.commit().await?;
        assert!(!tx.is_active());
        assert!(ctx.repository::<User>()?.find_by_id(&id).await?.is_some());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_rollback_discards_writes() {
    run_test(create_test_context, |ctx| async move {
        let tx = ctx.begin_transaction().await?;
        tx.repository::<User>()?.create(&User::new("Ann", 34)).await?;
        tx.rollback().await?;

        assert_eq!(ctx.store().document_count("users"), 0);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_sub_collections_stay_in_transaction() {
    run_test(create_test_context, |ctx| async move {
        let tx = ctx.begin_transaction().await?;
        let post = tx
            .repository::<Post>()?
            .create(&Post::new("Hello", date(2024, 5, 1)))
            .await?;

        let comments = post.comments.repository()?;
        assert!(comments.is_transactional());
        comments.create(&Comment::new("ann", "First!", 1)).await?;

        let path = format!("posts/{}/comments", post.id().unwrap_or_default());
        assert_eq!(comments.find().await?.len(), 1);
        assert_eq!(ctx.store().document_count(&path), 0);

        tx.commit().await?;
        assert_eq!(ctx.store().document_count(&path), 1);
        assert_eq!(ctx.store().document_count("posts"), 1);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_completed_transaction_rejects_use() {
    run_test(create_test_context, |ctx| async move {
        let tx = ctx.begin_transaction().await?;
        let users = tx.repository::<User>()?;
        tx.commit().await?;

        let err = users.create(&User::new("Ann", 34)).await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TransactionError);
        let err = users.find().await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TransactionError);
        assert!(tx.commit().await.is_err());
        assert_eq!(ctx.store().document_count("users"), 0);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_transfer_commits() {
    run_test(create_test_context, |ctx| async move {
        open_accounts(&ctx).await?;

        Transaction::run(ctx.storage(), |tx| async move { transfer(&tx, "a", "b", 30).await })
            .await?;

        assert_eq!(balance(&ctx, "a").await?, 70);
        assert_eq!(balance(&ctx, "b").await?, 50);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_failed_transfer_rolls_back() {
    run_test(create_test_context, |ctx| async move {
        open_accounts(&ctx).await?;

        let err = Transaction::run(ctx.storage(), |tx| async move {
            transfer(&tx, "b", "a", 10).await?;
            transfer(&tx, "b", "a", 500).await
        })
        .await
        .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);

        assert_eq!(balance(&ctx, "a").await?, 100);
        assert_eq!(balance(&ctx, "b").await?, 20);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_custom_repository_in_transaction() {
    run_test(create_test_context, |ctx| async move {
        let found = Transaction::run(ctx.storage(), |tx| async move {
            let users = tx.custom_repository::<UserRepository>()?;
            users.repository().create(&User::new("Ann", 34)).await?;
            users.find_by_name("Ann").await
        })
        .await?;

        assert_eq!(found.map(|u| u.age), Some(34));
        assert_eq!(ctx.store().document_count("users"), 1);
        Ok(())
    })
    .await
}
