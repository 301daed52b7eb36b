use std::sync::Arc;

use chrono::Utc;
use log::info;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    fresh_id, newest_first, AdStatus, Advertisement, NewAdvertisement, Page, StatusChange,
};
use crate::store::{Collection, Store};

const ENTITY: &str = "advertisement";
const MIN_TITLE_CHARS: usize = 3;

#[derive(Debug, Clone, Copy)]
enum Counter {
    Views,
    Clicks,
}

#[derive(Clone)]
pub struct AdService {
    ads: Arc<Collection<Advertisement>>,
}

impl AdService {
    pub fn new(store: &Store) -> Self {
        Self {
            ads: store.advertisements.clone(),
        }
    }

    /// Lists advertisements newest first. Without a status filter only
    /// active ones are returned.
    pub async fn list(&self, status: Option<&str>) -> ServiceResult<Page<Advertisement>> {
        let ads = self.ads.load().await?;
        let total = ads.len();
        let wanted = status
            .filter(|s| !s.is_empty())
            .unwrap_or(AdStatus::Active.as_str());

        let mut data: Vec<_> = ads
            .into_iter()
            .filter(|ad| ad.status.as_str() == wanted)
            .collect();
        newest_first(&mut data);

        Ok(Page { total, data })
    }

    /// `image` is the public path handed back by the upload step.
    pub async fn create(
        &self,
        input: NewAdvertisement,
        image: Option<String>,
    ) -> ServiceResult<Advertisement> {
        let title = input.title.as_deref().map(str::trim).unwrap_or_default();
        if title.chars().count() < MIN_TITLE_CHARS {
            return Err(ServiceError::Validation(format!(
                "title is required and must be at least {MIN_TITLE_CHARS} characters"
            )));
        }
        let status = match input.status.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => parse_status(s)?,
            None => AdStatus::Active,
        };

        let mut batch = self.ads.begin().await?;
        let now = Utc::now();
        let ad = Advertisement {
            id: fresh_id(&batch.records),
            title: title.to_string(),
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            image,
            link: input
                .link
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
            status,
            views: 0,
            clicks: 0,
            created_at: now,
            updated_at: Some(now),
        };
        batch.records.insert(0, ad.clone());
        batch.commit().await?;

        info!("New advertisement {}: {}", ad.id, ad.title);
        Ok(ad)
    }

    pub async fn record_view(&self, id: &str) -> ServiceResult<Advertisement> {
        self.bump(id, Counter::Views).await
    }

    pub async fn record_click(&self, id: &str) -> ServiceResult<Advertisement> {
        self.bump(id, Counter::Clicks).await
    }

    async fn bump(&self, id: &str, counter: Counter) -> ServiceResult<Advertisement> {
        let mut batch = self.ads.begin().await?;
        let ad = batch
            .records
            .iter_mut()
            .find(|ad| ad.id == id)
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))?;

        let (label, count) = match counter {
            Counter::Views => ("views", &mut ad.views),
            Counter::Clicks => ("clicks", &mut ad.clicks),
        };
        *count = count.saturating_add(1);
        let total = *count;
        ad.updated_at = Some(Utc::now());
        let data = ad.clone();
        batch.commit().await?;

        info!("Advertisement {} {}: {}", id, label, total);
        Ok(data)
    }

    pub async fn set_status(
        &self,
        id: &str,
        status: Option<&str>,
    ) -> ServiceResult<StatusChange<AdStatus, Advertisement>> {
        let new_status = parse_status(status.unwrap_or_default())?;

        let mut batch = self.ads.begin().await?;
        let ad = batch
            .records
            .iter_mut()
            .find(|ad| ad.id == id)
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))?;

        let old_status = ad.status;
        ad.status = new_status;
        ad.updated_at = Some(Utc::now());
        let data = ad.clone();
        batch.commit().await?;

        info!("Advertisement {} status: {} -> {}", id, old_status, new_status);
        Ok(StatusChange {
            old_status,
            new_status,
            data,
        })
    }

    pub async fn delete(&self, id: &str, authorized: bool) -> ServiceResult<Advertisement> {
        if !authorized {
            return Err(ServiceError::Unauthorized("delete advertisements"));
        }

        let mut batch = self.ads.begin().await?;
        let index = batch
            .records
            .iter()
            .position(|ad| ad.id == id)
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))?;
        let removed = batch.records.remove(index);
        batch.commit().await?;

        info!("Deleted advertisement {}: {}", removed.id, removed.title);
        Ok(removed)
    }
}

fn parse_status(s: &str) -> ServiceResult<AdStatus> {
    s.parse()
        .map_err(|_| ServiceError::Validation("status must be one of active, inactive".to_string()))
}
