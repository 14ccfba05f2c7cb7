use chrono::{DateTime, Utc};

use crate::common::{
    Convertible, Document, Value, GEO_LATITUDE, GEO_LONGITUDE, REFERENCE_ID, REFERENCE_PATH,
};
use crate::errors::{DocMapError, DocMapResult, ErrorKind};

/// A store-native point in time: whole seconds since the Unix epoch plus a
/// nanosecond adjustment in `0..1_000_000_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: u32) -> DocMapResult<Self> {
        if nanos >= 1_000_000_000 {
            log::error!("Timestamp nanos {} out of range", nanos);
            return Err(DocMapError::new(
                &format!("Timestamp nanos {} out of range", nanos),
                ErrorKind::InvalidArgument,
            ));
        }
        Ok(Timestamp { seconds, nanos })
    }

    pub fn from_date_time(date_time: &DateTime<Utc>) -> Self {
        Timestamp {
            seconds: date_time.timestamp(),
            nanos: date_time.timestamp_subsec_nanos(),
        }
    }

    /// Converts to a date-time. `nanos` is always in range, so this only
    /// fails for seconds outside chrono's representable range.
    pub fn to_date_time(&self) -> DocMapResult<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos).ok_or_else(|| {
            log::error!("Timestamp {}s is out of the representable range", self.seconds);
            DocMapError::new(
                &format!("Timestamp {}s is out of the representable range", self.seconds),
                ErrorKind::ObjectMappingError,
            )
        })
    }

    /// Drops sub-millisecond precision.
    pub fn truncate_to_millis(&self) -> Self {
        Timestamp {
            seconds: self.seconds,
            nanos: self.nanos - self.nanos % 1_000_000,
        }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    pub fn millis(&self) -> i64 {
        self.seconds * 1000 + (self.nanos / 1_000_000) as i64
    }
}

/// A geographic point. Latitude is in `[-90, 90]`, longitude in `[-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> DocMapResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            log::error!("Latitude {} must be within [-90, 90]", latitude);
            return Err(DocMapError::new(
                &format!("Latitude {} must be within [-90, 90]", latitude),
                ErrorKind::InvalidArgument,
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            log::error!("Longitude {} must be within [-180, 180]", longitude);
            return Err(DocMapError::new(
                &format!("Longitude {} must be within [-180, 180]", longitude),
                ErrorKind::InvalidArgument,
            ));
        }
        Ok(GeoPoint {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// The plain `{latitude, longitude}` structure entities see.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.put(GEO_LATITUDE, self.latitude).ok();
        doc.put(GEO_LONGITUDE, self.longitude).ok();
        doc
    }

    /// Reads a `{latitude, longitude}` document. `None` when a coordinate is
    /// missing or out of range.
    pub fn from_document(doc: &Document) -> Option<GeoPoint> {
        match (doc.get(GEO_LATITUDE).as_f64(), doc.get(GEO_LONGITUDE).as_f64()) {
            (Some(latitude), Some(longitude)) => GeoPoint::new(latitude, longitude).ok(),
            _ => None,
        }
    }
}

impl Convertible for GeoPoint {
    type Output = GeoPoint;

    fn to_value(&self) -> DocMapResult<Value> {
        Ok(Value::GeoPoint(*self))
    }

    fn from_value(value: &Value) -> DocMapResult<Self::Output> {
        value.as_geo_point().ok_or_else(|| {
            log::error!("Value of type {} is not a geo-point", value.type_name());
            DocMapError::new("Value is not a geo-point", ErrorKind::ObjectMappingError)
        })
    }
}

/// A pointer to another document: its id plus its full slash-separated path
/// (`users/abc`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentReference {
    id: String,
    path: String,
}

impl DocumentReference {
    pub fn new(id: &str, path: &str) -> Self {
        DocumentReference {
            id: id.to_string(),
            path: path.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The plain `{id, path}` structure entities see.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.put(REFERENCE_ID, self.id.as_str()).ok();
        doc.put(REFERENCE_PATH, self.path.as_str()).ok();
        doc
    }

    pub fn from_document(doc: &Document) -> Option<DocumentReference> {
        match (doc.get(REFERENCE_ID).as_str(), doc.get(REFERENCE_PATH).as_str()) {
            (Some(id), Some(path)) => Some(DocumentReference::new(id, path)),
            _ => None,
        }
    }
}

impl Convertible for DocumentReference {
    type Output = DocumentReference;

    fn to_value(&self) -> DocMapResult<Value> {
        Ok(Value::Reference(self.clone()))
    }

    fn from_value(value: &Value) -> DocMapResult<Self::Output> {
        value.as_reference().ok_or_else(|| {
            log::error!("Value of type {} is not a document reference", value.type_name());
            DocMapError::new(
                "Value is not a document reference",
                ErrorKind::ObjectMappingError,
            )
        })
    }
}
