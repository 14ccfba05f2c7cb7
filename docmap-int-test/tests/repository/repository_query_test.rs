use docmap::errors::ErrorKind;
use docmap::field;
use docmap::query::{Direction, QueryOperator};
use docmap::repository::Entity;
use docmap_int_test::entities::User;
use docmap_int_test::test_util::{create_test_context, insert_sample_users, is_sorted, run_test};

fn names(users: &[User]) -> Vec<&str> {
    let mut names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_find_all() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        assert!(users.find().await?.is_empty());
        assert!(users.find_one().await?.is_none());

        insert_sample_users(&users).await?;
        assert_eq!(users.find().await?.len(), 5);
        assert!(users.find_one().await?.is_some());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_where_operators() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        insert_sample_users(&users).await?;

        let found = users.where_equal_to(field!(User, name), "Ann").find().await?;
        assert_eq!(names(&found), vec!["Ann"]);

        let found = users.where_greater_than("age", 34).find().await?;
        assert_eq!(names(&found), vec!["Cid", "Eve"]);

        let found = users.where_greater_or_equal_than("age", 34).find().await?;
        assert_eq!(names(&found), vec!["Ann", "Cid", "Eve"]);

        let found = users.where_less_than("age", 25).find().await?;
        assert_eq!(names(&found), vec!["Bob"]);

        let found = users.where_less_or_equal_than("age", 25).find().await?;
        assert_eq!(names(&found), vec!["Bob", "Dee"]);

        let found = users.where_array_contains("tags", "admin").find().await?;
        assert_eq!(names(&found), vec!["Ann", "Eve"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_nested_field_filter() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        insert_sample_users(&users).await?;

        let found = users
            .where_equal_to("address.city", "Oslo")
            .find()
            .await?;
        assert_eq!(names(&found), vec!["Ann", "Cid"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_filters_combine() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        insert_sample_users(&users).await?;

        let found = users
            .where_array_contains("tags", "staff")
            .where_greater_or_equal_than("age", 18)
            .find()
            .await?;
        assert_eq!(names(&found), vec!["Ann"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_independent_filters_commute() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        insert_sample_users(&users).await?;

        let first = users
            .where_greater_than("age", 20)
            .where_equal_to("address.city", "Oslo")
            .find()
            .await?;
        let second = users
            .where_equal_to("address.city", "Oslo")
            .where_greater_than("age", 20)
            .find()
            .await?;
        assert_eq!(names(&first), names(&second));
        assert_eq!(names(&first), vec!["Ann", "Cid"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_order_by() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        insert_sample_users(&users).await?;

        let ascending = users.order_by_ascending("age").find().await?;
        let ages: Vec<i64> = ascending.iter().map(|u| u.age).collect();
        assert_eq!(ages, vec![17, 25, 34, 41, 52]);

        let descending = users.order_by_descending("age").find().await?;
        let ages: Vec<i64> = descending.iter().map(|u| u.age).collect();
        assert!(is_sorted(&ages, false));

        let oldest = users.order_by_descending("age").find_one().await?;
        assert_eq!(oldest.map(|u| u.name), Some("Cid".to_string()));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_order_by_excludes_missing_field() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        insert_sample_users(&users).await?;

        let with_city = users.order_by_ascending("address.city").find().await?;
        let cities: Vec<String> = with_city
            .iter()
            .filter_map(|u| u.address.as_ref().map(|a| a.city.clone()))
            .collect();
        assert_eq!(with_city.len(), 4);
        assert_eq!(cities, vec!["Bergen", "Oslo", "Oslo", "Tromso"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_multi_key_order() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        insert_sample_users(&users).await?;

        let found = users
            .order_by_ascending("address.city")
            .order_by_descending("age")
            .find()
            .await?;
        let order: Vec<&str> = found.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(order, vec!["Bob", "Cid", "Ann", "Eve"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_limit() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        insert_sample_users(&users).await?;

        assert_eq!(users.limit(2)?.find().await?.len(), 2);
        assert_eq!(users.limit(0)?.find().await?.len(), 0);
        assert_eq!(users.limit(100)?.find().await?.len(), 5);

        let youngest = users.order_by_ascending("age").limit(2)?.find().await?;
        let ages: Vec<i64> = youngest.iter().map(|u| u.age).collect();
        assert_eq!(ages, vec![17, 25]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_limit_is_monotonic() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        insert_sample_users(&users).await?;

        let base = users.where_greater_than("age", 18).order_by_ascending("age");
        let mut previous = 0;
        for limit in 0..6 {
            let count = base.limit(limit)?.find().await?.len();
            assert!(count >= previous);
            assert!(count as i64 <= limit);
            previous = count;
        }
        assert_eq!(previous, 4);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_negative_limit_fails_before_store() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let before = ctx.store().operation_count();

        let err = users.where_equal_to("name", "Ann").limit(-1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
        assert_eq!(ctx.store().operation_count(), before);
        assert!(ctx.store().executed_queries().is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_find_one_requests_single_document() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        insert_sample_users(&users).await?;

        let found = users.where_greater_than("age", 18).find_one().await?;
        assert!(found.is_some_and(|u| u.age > 18));

        let queries = ctx.store().executed_queries();
        let (path, query) = queries.last().expect("a query should have run");
        assert_eq!(path, "users");
        assert_eq!(query.limit, Some(1));
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].operator, QueryOperator::GreaterThan);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_builder_is_reusable() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        insert_sample_users(&users).await?;

        let adults = users.where_greater_or_equal_than("age", 18);
        let in_oslo = adults.where_equal_to("address.city", "Oslo");
        let admins = adults.where_array_contains("tags", "admin");

        assert_eq!(adults.spec().lines.len(), 1);
        assert_eq!(names(&adults.find().await?), vec!["Ann", "Cid", "Dee", "Eve"]);
        assert_eq!(names(&in_oslo.find().await?), vec!["Ann", "Cid"]);
        assert_eq!(names(&admins.find().await?), vec!["Ann", "Eve"]);

        // same chain, same spec
        let again = users.where_greater_or_equal_than("age", 18);
        assert_eq!(again.spec(), adults.spec());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_query_spec_records_clauses() {
    run_test(create_test_context, |ctx| async move {
        let users = ctx.repository::<User>()?;
        let query = users
            .where_equal_to("name", "Ann")
            .order_by_descending("age")
            .limit(3)?
            .limit(4)?;
        let spec = query.spec();
        assert_eq!(spec.limit, Some(4));
        assert_eq!(spec.order_by.len(), 1);
        assert_eq!(spec.order_by[0].direction, Direction::Descending);
        assert_eq!(spec.lines[0].field.as_str(), "name");
        assert_eq!(User::entity_name(), "User");
        Ok(())
    })
    .await
}
