use chrono::{DateTime, Utc};
use docmap::errors::DocMapResult;
use docmap::repository::{CustomRepository, Repository, SubCollection};
use docmap_derive::{Convertible, Entity};

#[derive(Debug, Clone, Default, PartialEq, Convertible)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Entity, Convertible)]
pub struct User {
    pub id: Option<String>,
    pub name: String,
    pub age: i64,
    pub email: Option<String>,
    pub tags: Vec<String>,
    pub address: Option<Address>,
}

impl User {
    pub fn new(name: &str, age: i64) -> Self {
        User {
            name: name.to_string(),
            age,
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn living_in(mut self, city: &str) -> Self {
        self.address = Some(Address {
            street: "Main Street 1".to_string(),
            city: city.to_string(),
            zip: None,
        });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Entity, Convertible)]
pub struct Post {
    pub id: Option<String>,
    pub title: String,
    pub published: DateTime<Utc>,
    pub comments: SubCollection<Comment>,
}

impl Post {
    pub fn new(title: &str, published: DateTime<Utc>) -> Self {
        Post {
            title: title.to_string(),
            published,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Entity, Convertible)]
pub struct Comment {
    pub id: Option<String>,
    pub author: String,
    pub text: String,
    pub likes: i64,
    #[sub_collection(name = "replies")]
    pub answers: SubCollection<Reply>,
}

impl Comment {
    pub fn new(author: &str, text: &str, likes: i64) -> Self {
        Comment {
            author: author.to_string(),
            text: text.to_string(),
            likes,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Entity, Convertible)]
pub struct Reply {
    pub id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Entity, Convertible)]
#[entity(collection = "ledger", id = "number")]
pub struct Account {
    pub number: String,
    pub owner: String,
    pub balance: i64,
}

impl Account {
    pub fn new(number: &str, owner: &str, balance: i64) -> Self {
        Account {
            number: number.to_string(),
            owner: owner.to_string(),
            balance,
        }
    }
}

/// Application-level queries over users.
pub struct UserRepository {
    repository: Repository<User>,
}

impl CustomRepository for UserRepository {
    type Entity = User;

    fn from_repository(repository: Repository<User>) -> Self {
        UserRepository { repository }
    }
}

impl UserRepository {
    pub fn repository(&self) -> &Repository<User> {
        &self.repository
    }

    pub async fn find_adults(&self) -> DocMapResult<Vec<User>> {
        self.repository
            .where_greater_or_equal_than("age", 18)
            .order_by_ascending("age")
            .find()
            .await
    }

    pub async fn find_by_name(&self, name: &str) -> DocMapResult<Option<User>> {
        self.repository.where_equal_to("name", name).find_one().await
    }
}

/// Registered for nothing; used to check custom repository mismatches.
pub struct OtherUserRepository;

impl CustomRepository for OtherUserRepository {
    type Entity = User;

    fn from_repository(_repository: Repository<User>) -> Self {
        OtherUserRepository
    }
}
