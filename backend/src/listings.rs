use std::sync::Arc;

use chrono::Utc;
use log::info;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    fresh_id, newest_first, required, Listing, ListingKind, ListingStatus, NewListing,
    StatusChange,
};
use crate::store::{Collection, Store};

/// The houses or the lands collection.
#[derive(Clone)]
pub struct ListingService {
    kind: ListingKind,
    listings: Arc<Collection<Listing>>,
}

impl ListingService {
    pub fn new(store: &Store, kind: ListingKind) -> Self {
        let listings = match kind {
            ListingKind::House => store.houses.clone(),
            ListingKind::Land => store.lands.clone(),
        };
        Self { kind, listings }
    }

    pub fn kind(&self) -> ListingKind {
        self.kind
    }

    pub async fn list(&self) -> ServiceResult<Vec<Listing>> {
        let mut listings = self.listings.load().await?;
        newest_first(&mut listings);
        Ok(listings)
    }

    pub async fn create(&self, input: NewListing) -> ServiceResult<Listing> {
        let mut missing = Vec::new();
        let owner = required(&mut missing, "owner", input.owner);
        let location = required(&mut missing, "location", input.location);
        let price = required(&mut missing, "price", input.price);
        if !missing.is_empty() {
            return Err(ServiceError::MissingFields(missing));
        }
        let status = match input.status.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => parse_status(s)?,
            None => ListingStatus::Available,
        };
        let tenure = input.tenure.as_deref().filter(|t| !t.is_empty());

        let mut batch = self.listings.begin().await?;
        let now = Utc::now();
        let listing = Listing {
            id: fresh_id(&batch.records),
            owner,
            mobile: input.mobile.unwrap_or_default(),
            location,
            tenure: self.kind.tenure(tenure),
            size: input.size.unwrap_or_default(),
            price,
            status,
            request_id: input.request_id.filter(|id| !id.is_empty()),
            notes: input.notes.unwrap_or_default(),
            created_at: now,
            updated_at: Some(now),
        };
        batch.records.insert(0, listing.clone());
        batch.commit().await?;

        info!(
            "New {} {}: {} - {}",
            self.kind.entity(),
            listing.id,
            listing.owner,
            listing.location
        );
        Ok(listing)
    }

    pub async fn set_status(
        &self,
        id: &str,
        status: Option<&str>,
    ) -> ServiceResult<StatusChange<ListingStatus, Listing>> {
        let new_status = parse_status(status.unwrap_or_default())?;

        let mut batch = self.listings.begin().await?;
        let listing = batch
            .records
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| ServiceError::not_found(self.kind.entity(), id))?;

        let old_status = listing.status;
        listing.status = new_status;
        listing.updated_at = Some(Utc::now());
        let data = listing.clone();
        batch.commit().await?;

        info!("{} {} status: {} -> {}", self.kind.entity(), id, old_status, new_status);
        Ok(StatusChange {
            old_status,
            new_status,
            data,
        })
    }
}

fn parse_status(s: &str) -> ServiceResult<ListingStatus> {
    s.parse().map_err(|_| {
        ServiceError::Validation("status must be one of available, sold, reserved".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_TENURE;
    use chrono::Duration;
    use tempfile::TempDir;

    fn setup(kind: ListingKind) -> (TempDir, Store, ListingService) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path());
        let service = ListingService::new(&store, kind);
        (dir, store, service)
    }

    fn house(owner: &str) -> NewListing {
        NewListing {
            owner: Some(owner.to_string()),
            location: Some("Bakhtiari".to_string()),
            price: Some("250,000$".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let (_dir, _store, houses) = setup(ListingKind::House);

        let created = houses.create(house("Aram")).await.unwrap();

        assert_eq!(created.status, ListingStatus::Available);
        assert_eq!(created.tenure.as_deref(), Some(DEFAULT_TENURE));
        assert_eq!(created.request_id, None);
        assert_eq!(created.mobile, "");
        assert_eq!(Some(created.created_at), created.updated_at);
    }

    #[tokio::test]
    async fn lands_have_no_tenure() {
        let (_dir, store, lands) = setup(ListingKind::Land);
        let mut input = house("Aram");
        input.tenure = Some("ignored".to_string());

        let created = lands.create(input).await.unwrap();

        assert_eq!(created.tenure, None);
        assert_eq!(store.lands.load().await.unwrap(), vec![created]);
        assert!(store.houses.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_requires_owner_location_price() {
        let (_dir, store, houses) = setup(ListingKind::House);

        let err = houses
            .create(NewListing {
                location: Some("Bakhtiari".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        match err {
            ServiceError::MissingFields(fields) => assert_eq!(fields, vec!["owner", "price"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.houses.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_unknown_status() {
        let (_dir, _store, houses) = setup(ListingKind::House);
        let mut input = house("Aram");
        input.status = Some("rented".to_string());

        assert!(matches!(
            houses.create(input).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (_dir, store, houses) = setup(ListingKind::House);
        let mut older = houses.create(house("first")).await.unwrap();
        older.created_at -= Duration::minutes(1);
        let newer = houses.create(house("second")).await.unwrap();
        // reverse the stored order; list must still sort by createdAt
        store.houses.save(&[older.clone(), newer.clone()]).await.unwrap();

        let listed = houses.list().await.unwrap();

        assert_eq!(listed, vec![newer, older]);
    }

    #[tokio::test]
    async fn loads_records_without_update_time_or_notes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("lands.json"),
            r#"[{
                "id": "1",
                "owner": "نمونە",
                "mobile": "٠٧٧٠ ٢٢٢ ٣٣٣٣",
                "location": "کوێستان",
                "size": "500 م²",
                "price": "٥٠,٠٠٠,٠٠٠ دینار",
                "status": "available",
                "requestId": "2",
                "createdAt": "2024-05-01T09:30:00.000Z"
            }]"#,
        )
        .unwrap();
        let store = Store::new(dir.path());
        let lands = ListingService::new(&store, ListingKind::Land);

        let listed = lands.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].updated_at, None);
        assert_eq!(listed[0].notes, "");
        assert_eq!(listed[0].request_id.as_deref(), Some("2"));

        let change = lands.set_status("1", Some("reserved")).await.unwrap();
        assert!(change.data.updated_at.is_some());
        assert_eq!(store.lands.load().await.unwrap(), vec![change.data]);
    }

    #[tokio::test]
    async fn set_status_reports_old_and_new() {
        let (_dir, _store, houses) = setup(ListingKind::House);
        let created = houses.create(house("Aram")).await.unwrap();

        let change = houses.set_status(&created.id, Some("sold")).await.unwrap();

        assert_eq!(change.old_status, ListingStatus::Available);
        assert_eq!(change.new_status, ListingStatus::Sold);
        assert_eq!(change.data.status, ListingStatus::Sold);
        assert!(change.data.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn set_status_errors() {
        let (_dir, _store, lands) = setup(ListingKind::Land);
        let created = lands.create(house("Aram")).await.unwrap();

        assert!(matches!(
            lands.set_status(&created.id, Some("gone")).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            lands.set_status(&created.id, None).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            lands.set_status("missing", Some("sold")).await.unwrap_err(),
            ServiceError::NotFound { entity: "land", .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_status_changes_both_persist() {
        let (_dir, store, houses) = setup(ListingKind::House);
        let a = houses.create(house("a")).await.unwrap();
        let b = houses.create(house("b")).await.unwrap();

        let (left, right) = tokio::join!(
            tokio::spawn({
                let houses = houses.clone();
                let id = a.id.clone();
                async move { houses.set_status(&id, Some("sold")).await }
            }),
            tokio::spawn({
                let houses = houses.clone();
                let id = b.id.clone();
                async move { houses.set_status(&id, Some("reserved")).await }
            }),
        );
        left.unwrap().unwrap();
        right.unwrap().unwrap();

        let stored = store.houses.load().await.unwrap();
        let status_of = |id: &str| stored.iter().find(|l| l.id == id).unwrap().status;
        assert_eq!(status_of(&a.id), ListingStatus::Sold);
        assert_eq!(status_of(&b.id), ListingStatus::Reserved);
    }
}
