//! Request lifecycle: submission, review, status transitions and the
//! promotion of accepted requests into the house and land collections.
//!
//! Promotion writes two documents. The requests document is committed
//! first, then the destination collection. If the process dies or the
//! second write fails in between, the request stays accepted with no
//! listing; that gap is logged and surfaced to the caller, never hidden.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Local, Utc};
use log::{error, info};
use regex::Regex;
use serde::Serialize;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    fresh_id, newest_first, required, Listing, ListingKind, ListingStatus, NewPropertyRequest,
    Page, PropertyRequest, RequestFilter, RequestStats, RequestStatus, StatusUpdate, HOUSE_SALE,
    LAND_SALE,
};
use crate::store::{Collection, Store};

const ENTITY: &str = "request";

fn mobile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // ASCII digits, Arabic-Indic digits, whitespace and hyphens
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9\x{0660}-\x{0669}\s-]+$").expect("mobile pattern is valid")
    })
}

pub fn is_valid_mobile(mobile: &str) -> bool {
    mobile_pattern().is_match(mobile)
}

/// Result of [`RequestService::transition`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub old_status: RequestStatus,
    pub new_status: RequestStatus,
    pub data: PropertyRequest,
    /// Listing created by this transition, if it promoted the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<Listing>,
}

#[derive(Clone)]
pub struct RequestService {
    requests: Arc<Collection<PropertyRequest>>,
    houses: Arc<Collection<Listing>>,
    lands: Arc<Collection<Listing>>,
}

impl RequestService {
    pub fn new(store: &Store) -> Self {
        Self {
            requests: store.requests.clone(),
            houses: store.houses.clone(),
            lands: store.lands.clone(),
        }
    }

    fn destination(&self, kind: ListingKind) -> &Collection<Listing> {
        match kind {
            ListingKind::House => &self.houses,
            ListingKind::Land => &self.lands,
        }
    }

    /// Lists requests newest first, optionally narrowed by exact status
    /// and type.
    pub async fn list(&self, filter: &RequestFilter) -> ServiceResult<Page<PropertyRequest>> {
        let records = self.requests.load().await?;
        let total = records.len();

        let status = filter.status.as_deref().filter(|s| !s.is_empty());
        let kind = filter.kind.as_deref().filter(|k| !k.is_empty());

        let mut data: Vec<_> = records
            .into_iter()
            .filter(|r| status.map_or(true, |s| r.status.as_str() == s))
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .collect();
        newest_first(&mut data);

        Ok(Page { total, data })
    }

    pub async fn submit(&self, input: NewPropertyRequest) -> ServiceResult<PropertyRequest> {
        let mut missing = Vec::new();
        let name = required(&mut missing, "name", input.name);
        let mobile = required(&mut missing, "mobile", input.mobile);
        let kind = required(&mut missing, "type", input.kind);
        if !missing.is_empty() {
            return Err(ServiceError::MissingFields(missing));
        }
        if !is_valid_mobile(&mobile) {
            return Err(ServiceError::InvalidFormat { field: "mobile" });
        }

        let mut batch = self.requests.begin().await?;
        let request = PropertyRequest {
            id: fresh_id(&batch.records),
            name,
            mobile,
            kind,
            location: input.location.unwrap_or_default(),
            size: input.size.unwrap_or_default(),
            price: input.price.unwrap_or_default(),
            sale_type: input.sale_type.unwrap_or_default(),
            additional_info: input.additional_info.unwrap_or_default(),
            notes: String::new(),
            status: RequestStatus::New,
            viewed: false,
            viewed_at: None,
            processed: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        batch.records.insert(0, request.clone());
        batch.commit().await?;

        info!(
            "New request {}: {} - {} - {}",
            request.id, request.name, request.kind, request.mobile
        );
        Ok(request)
    }

    /// Fetches one request, marking it viewed the first time.
    pub async fn view(&self, id: &str) -> ServiceResult<PropertyRequest> {
        let mut batch = self.requests.begin().await?;
        let index = batch
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))?;

        if batch.records[index].viewed {
            return Ok(batch.records[index].clone());
        }

        let record = &mut batch.records[index];
        record.viewed = true;
        record.viewed_at = Some(Utc::now());
        let viewed = record.clone();
        batch.commit().await?;

        info!("Request {} viewed", id);
        Ok(viewed)
    }

    /// Moves a request to `processing`, `accepted` or `rejected`.
    ///
    /// Every move into `accepted` promotes a request whose type is one of
    /// the sale labels, including a repeated acceptance, which adds a
    /// second listing.
    pub async fn transition(&self, id: &str, update: StatusUpdate) -> ServiceResult<Transition> {
        let new_status = update
            .status
            .as_deref()
            .and_then(|s| s.parse::<RequestStatus>().ok())
            .filter(|s| *s != RequestStatus::New)
            .ok_or_else(|| {
                ServiceError::Validation(
                    "status must be one of accepted, rejected, processing".to_string(),
                )
            })?;

        let mut batch = self.requests.begin().await?;
        let index = batch
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))?;

        let record = &mut batch.records[index];
        let old_status = record.status;
        record.status = new_status;
        record.updated_at = Some(Utc::now());
        record.processed = true;
        if let Some(notes) = update.notes.filter(|n| !n.is_empty()) {
            record.notes = notes;
        }
        let request = record.clone();

        let destination = match new_status {
            RequestStatus::Accepted => ListingKind::for_request_type(&request.kind),
            _ => None,
        };
        let Some(kind) = destination else {
            batch.commit().await?;
            info!("Request {} status: {} -> {}", id, old_status, new_status);
            return Ok(Transition {
                old_status,
                new_status,
                data: request,
                listing: None,
            });
        };

        // requests lock is already held; destination is always taken second
        let mut listings = self.destination(kind).begin().await?;
        batch.commit().await?;
        info!("Request {} status: {} -> {}", id, old_status, new_status);

        let listing = promote(&request, kind, &listings.records);
        listings.records.insert(0, listing.clone());
        if let Err(e) = listings.commit().await {
            error!(
                "Request {} is accepted but its {} listing was not saved: {}",
                id,
                kind.entity(),
                e
            );
            return Err(e.into());
        }
        info!(
            "New {} {} promoted from request {}: {} - {}",
            kind.entity(),
            listing.id,
            id,
            listing.owner,
            listing.location
        );

        Ok(Transition {
            old_status,
            new_status,
            data: request,
            listing: Some(listing),
        })
    }

    /// Removes a request. Listings promoted from it are left alone.
    pub async fn delete(&self, id: &str, authorized: bool) -> ServiceResult<PropertyRequest> {
        if !authorized {
            return Err(ServiceError::Unauthorized("delete requests"));
        }

        let mut batch = self.requests.begin().await?;
        let index = batch
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))?;
        let removed = batch.records.remove(index);
        batch.commit().await?;

        info!("Deleted request {}: {}", removed.id, removed.name);
        Ok(removed)
    }

    pub async fn stats(&self) -> ServiceResult<RequestStats> {
        let records = self.requests.load().await?;
        Ok(tally(&records, start_of_today()))
    }
}

fn promote(request: &PropertyRequest, kind: ListingKind, existing: &[Listing]) -> Listing {
    let now = Utc::now();
    let sale_type = (!request.sale_type.is_empty()).then_some(request.sale_type.as_str());

    Listing {
        id: fresh_id(existing),
        owner: request.name.clone(),
        mobile: request.mobile.clone(),
        location: request.location.clone(),
        tenure: kind.tenure(sale_type),
        size: request.size.clone(),
        price: request.price.clone(),
        status: ListingStatus::Available,
        request_id: Some(request.id.clone()),
        notes: request.notes.clone(),
        created_at: now,
        updated_at: Some(now),
    }
}

/// Local midnight of the current day, in UTC.
fn start_of_today() -> Option<DateTime<Utc>> {
    Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .map(|midnight| midnight.with_timezone(&Utc))
}

fn tally(records: &[PropertyRequest], today: Option<DateTime<Utc>>) -> RequestStats {
    let mut stats = RequestStats {
        total: records.len(),
        ..RequestStats::default()
    };

    for r in records {
        match r.status {
            RequestStatus::New => stats.new += 1,
            RequestStatus::Processing => stats.processing += 1,
            RequestStatus::Accepted => stats.accepted += 1,
            RequestStatus::Rejected => stats.rejected += 1,
        }
        match r.kind.as_str() {
            HOUSE_SALE => stats.houses += 1,
            LAND_SALE => stats.lands += 1,
            _ => {}
        }
        if today.is_some_and(|t| r.created_at >= t) {
            stats.today += 1;
        }
        if r.viewed {
            stats.viewed += 1;
        } else {
            stats.unviewed += 1;
        }
    }

    stats
}
