use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use docmap::common::{from_value, Convertible, Document, DocumentReference, GeoPoint, Value};
use docmap::metadata::MetadataStorageConfig;
use docmap::repository::{Entity, RepositoryProvider};
use docmap::store::{StoreClient, StoreFields, StoreValue};
use docmap_derive::{Convertible, Entity};
use docmap_int_test::entities::{Post, User};
use docmap_int_test::test_util::{create_context_with, create_test_context, date, run_test};

#[derive(Debug, Clone, Default, PartialEq, Convertible)]
pub enum Visibility {
    #[default]
    Public,
    Restricted {
        groups: Vec<String>,
    },
    Embargoed(DateTime<Utc>),
}

#[derive(Debug, Clone, Default, PartialEq, Entity, Convertible)]
#[entity(name = "Place")]
#[converter(ignored = "distance")]
pub struct Place {
    pub id: Option<String>,
    pub name: String,
    pub location: Option<GeoPoint>,
    pub visibility: Option<Visibility>,
    pub ratings: BTreeMap<String, f64>,
    pub photo: Vec<u8>,
    pub distance: f64,
}

#[tokio::test]
async fn test_datetime_round_trip_in_milliseconds() {
    run_test(create_test_context, |ctx| async move {
        let posts = ctx.repository::<Post>()?;
        let published = date(2024, 5, 1) + Duration::nanoseconds(123_456_789);
        let created = posts.create(&Post::new("Hello", published)).await?;

        let expected = date(2024, 5, 1) + Duration::milliseconds(123);
        assert_eq!(created.published, expected);

        let raw = ctx
            .store()
            .get_document("posts", created.id().unwrap_or_default())
            .await?;
        match raw.fields.get("published") {
            Some(StoreValue::Timestamp(ts)) => assert_eq!(ts.nanos(), 123_000_000),
            other => panic!("expected a timestamp, got {:?}", other),
        }

        let loaded = posts
            .find_by_id(created.id().unwrap_or_default())
            .await?
            .expect("post should exist");
        assert_eq!(loaded.published, expected);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_datetime_round_trip_in_nanoseconds() {
    run_test(
        || {
            create_context_with(
                MetadataStorageConfig::new()
                    .validate_models(false)
                    .timestamps_in_milliseconds(false),
                None,
            )
        },
        |ctx| async move {
            let posts = ctx.repository::<Post>()?;
            let published = date(2024, 5, 1) + Duration::nanoseconds(123_456_789);
            let created = posts.create(&Post::new("Hello", published)).await?;
            let loaded = posts
                .find_by_id(created.id().unwrap_or_default())
                .await?
                .expect("post should exist");
            assert_eq!(loaded.published, published);
            Ok(())
        },
    )
    .await
}

#[tokio::test]
async fn test_datetime_filters() {
    run_test(create_test_context, |ctx| async move {
        let posts = ctx.repository::<Post>()?;
        posts.create(&Post::new("Old", date(2020, 1, 1))).await?;
        posts.create(&Post::new("New", date(2024, 1, 1))).await?;

        let recent = posts
            .where_greater_than("published", date(2022, 1, 1))
            .find()
            .await?;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "New");

        let newest_first = posts.order_by_descending("published").find().await?;
        let titles: Vec<&str> = newest_first.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Old"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_rich_values_round_trip() {
    run_test(create_test_context, |ctx| async move {
        let places = ctx.repository_at::<Place>("places")?;
        let mut ratings = BTreeMap::new();
        ratings.insert("food".to_string(), 4.5);
        ratings.insert("view".to_string(), 5.0);

        let place = Place {
            name: "Harbour".to_string(),
            location: Some(GeoPoint::new(59.9, 10.7)?),
            visibility: Some(Visibility::Restricted {
                groups: vec!["crew".to_string()],
            }),
            ratings,
            photo: vec![1, 2, 3],
            distance: 12.5,
            ..Default::default()
        };
        let created = places.create(&place).await?;
        let loaded = places
            .find_by_id(created.id().unwrap_or_default())
            .await?
            .expect("place should exist");

        assert_eq!(loaded.name, "Harbour");
        assert_eq!(loaded.location, place.location);
        assert_eq!(loaded.visibility, place.visibility);
        assert_eq!(loaded.ratings, place.ratings);
        assert_eq!(loaded.photo, vec![1, 2, 3]);
        // ignored by the converter
        assert_eq!(loaded.distance, 0.0);
        assert_eq!(Place::entity_name(), "Place");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_foreign_values_are_stored_natively() {
    run_test(create_test_context, |ctx| async move {
        let places = ctx.repository_at::<Place>("places")?;
        let location = GeoPoint::new(1.0, 2.0)?;
        let created = places
            .create(&Place {
                name: "Dock".to_string(),
                location: Some(location),
                ..Default::default()
            })
            .await?;

        let raw = ctx
            .store()
            .get_document("places", created.id().unwrap_or_default())
            .await?;
        let stored = raw.fields.get("location");
        assert_eq!(stored.map(StoreValue::type_name), Some("geopoint"));
        assert_eq!(stored, Some(&StoreValue::GeoPoint(location)));

        let logs = ctx.repository_at::<Document>("audit")?;
        let author = DocumentReference::new("ann", "users/ann");
        let entry = logs
            .create(&docmap::doc! { author: (author.clone()) })
            .await?;
        let raw = ctx
            .store()
            .get_document("audit", entry.id().unwrap_or_default())
            .await?;
        assert_eq!(raw.fields.get("author"), Some(&StoreValue::Reference(author.clone())));
        assert_eq!(entry.get("author").as_reference(), Some(author));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_store_geo_points_read_as_plain_maps() {
    run_test(create_test_context, |ctx| async move {
        let mut fields = StoreFields::new();
        fields.insert("name".into(), StoreValue::String("Pier".into()));
        fields.insert(
            "location".into(),
            StoreValue::GeoPoint(GeoPoint::new(60.0, 5.0)?),
        );
        ctx.store().set_document("places", "pier", fields).await?;

        let places = ctx.repository_at::<Place>("places")?;
        let pier = places.find_by_id("pier").await?.expect("place should exist");
        assert_eq!(pier.location, Some(GeoPoint::new(60.0, 5.0)?));
        assert_eq!(pier.visibility, None);
        assert!(pier.ratings.is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_missing_fields_decode_as_absent() {
    run_test(create_test_context, |ctx| async move {
        let mut fields = StoreFields::new();
        fields.insert("name".into(), StoreValue::String("Ann".into()));
        fields.insert("age".into(), StoreValue::Integer(34));
        fields.insert("tags".into(), StoreValue::Array(vec![]));
        ctx.store().set_document("users", "legacy", fields).await?;

        let users = ctx.repository::<User>()?;
        let legacy = users.find_by_id("legacy").await?.expect("user should exist");
        assert_eq!(legacy.email, None);
        assert_eq!(legacy.address, None);
        assert_eq!(legacy.id.as_deref(), Some("legacy"));
        Ok(())
    })
    .await
}

#[test]
fn test_enum_variants_convert() {
    let variants = vec![
        Visibility::Public,
        Visibility::Restricted {
            groups: vec!["a".to_string(), "b".to_string()],
        },
        Visibility::Embargoed(date(2030, 1, 1)),
    ];
    for variant in variants {
        let value = variant.to_value().unwrap();
        assert_eq!(from_value::<Visibility>(&value).unwrap(), variant);
    }

    let unknown = docmap::doc! { variant: "Secret" };
    assert!(Visibility::from_value(&Value::Document(unknown)).is_err());
    assert!(Visibility::from_value(&Value::from("Public")).is_err());
}
