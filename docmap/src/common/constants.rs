/// Separator between the segments of a dotted field path (`address.city`).
pub const FIELD_SEPARATOR: &str = ".";

/// Separator between the segments of a collection path (`posts/1/comments`).
pub const PATH_SEPARATOR: &str = "/";

/// Default name of the identifier field on an entity.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Field names of the plain structure a geo-point decodes to.
pub const GEO_LATITUDE: &str = "latitude";
pub const GEO_LONGITUDE: &str = "longitude";

/// Field names of the plain structure a document reference decodes to.
pub const REFERENCE_ID: &str = "id";
pub const REFERENCE_PATH: &str = "path";
