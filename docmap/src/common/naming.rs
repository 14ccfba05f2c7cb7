use convert_case::{Case, Casing};
use inflector::string::pluralize::to_plural;
use itertools::Itertools;

use crate::common::PATH_SEPARATOR;
use crate::errors::{DocMapError, DocMapResult, ErrorKind};

/// Derives the default collection name of an entity: the lower camel case
/// plural of its type name (`User` -> `users`, `BlogPost` -> `blogPosts`,
/// `Category` -> `categories`).
pub fn collection_name_for(entity_name: &str) -> String {
    pluralize(entity_name)
}

/// English pluralization of the last word of an identifier, returned in
/// lower camel case.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let words = word.to_case(Case::Lower);
    let plural = match words.rsplit_once(' ') {
        Some((head, last)) => format!("{} {}", head, to_plural(last)),
        None => to_plural(&words),
    };
    plural.to_case(Case::Camel)
}

/// Joins collection path segments with `/`, skipping empty ones.
pub fn join_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .join(PATH_SEPARATOR)
}

/// Path of a sub-collection under one parent document.
pub fn sub_collection_path(parent_path: &str, parent_id: &str, name: &str) -> String {
    join_path(&[parent_path, parent_id, name])
}

/// Last segment of a collection path (`posts/1/comments` -> `comments`).
pub fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit(PATH_SEPARATOR)
        .next()
        .unwrap_or(path)
}

/// A collection path has an odd number of non-empty segments.
pub fn validate_collection_path(path: &str) -> DocMapResult<()> {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    if path.is_empty() || segments.iter().any(|s| s.is_empty()) || segments.len() % 2 == 0 {
        log::error!("'{}' is not a valid collection path", path);
        return Err(DocMapError::new(
            &format!("'{}' is not a valid collection path", path),
            ErrorKind::InvalidArgument,
        ));
    }
    Ok(())
}
