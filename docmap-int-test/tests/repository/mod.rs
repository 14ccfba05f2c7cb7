mod custom_repository_test;
mod global_registry_test;
mod repository_crud_test;
mod repository_query_test;
mod value_mapping_test;
mod validation_test;
