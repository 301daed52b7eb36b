use chrono::{DateTime, Utc};
use serde::Serialize;

mod advertisement;
mod listing;
mod request;

pub use advertisement::{AdStatus, Advertisement, NewAdvertisement};
pub use listing::{Listing, ListingKind, ListingStatus, NewListing, DEFAULT_TENURE};
pub use request::{
    NewPropertyRequest, PropertyRequest, RequestFilter, RequestStats, RequestStatus,
    StatusUpdate, HOUSE_SALE, LAND_SALE,
};

/// Something stored in a collection, addressable by id.
pub trait Record {
    fn id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

/// Returns a v4 id that no record in `records` already uses.
pub fn fresh_id<T: Record>(records: &[T]) -> String {
    loop {
        let id = uuid::Uuid::new_v4().to_string();
        if !records.iter().any(|r| r.id() == id) {
            return id;
        }
    }
}

/// Sorts newest first. The sort is stable, so equal timestamps keep
/// their stored order.
pub fn newest_first<T: Record>(records: &mut [T]) {
    records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

/// Outcome of a status change on any record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange<S, T> {
    pub old_status: S,
    pub new_status: S,
    pub data: T,
}

/// A filtered view of a collection plus the size of the whole collection.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub total: usize,
    pub data: Vec<T>,
}

/// Takes a required text field, noting its name in `missing` when it is
/// absent or empty.
pub(crate) fn required(
    missing: &mut Vec<&'static str>,
    field: &'static str,
    value: Option<String>,
) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            missing.push(field);
            String::new()
        }
    }
}
