use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Record, HOUSE_SALE, LAND_SALE};

/// Tenure recorded on a house when none was given.
pub const DEFAULT_TENURE: &str = "تاپۆ";

/// Which public collection a listing belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    House,
    Land,
}

impl ListingKind {
    /// Routes a request `type` to its destination collection. Anything
    /// other than the two sale labels has no destination.
    pub fn for_request_type(kind: &str) -> Option<Self> {
        match kind {
            HOUSE_SALE => Some(Self::House),
            LAND_SALE => Some(Self::Land),
            _ => None,
        }
    }

    pub fn entity(self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Land => "land",
        }
    }

    /// Houses carry a tenure `type`; lands never do.
    pub fn tenure(self, given: Option<&str>) -> Option<String> {
        match self {
            Self::House => Some(given.unwrap_or(DEFAULT_TENURE).to_string()),
            Self::Land => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Available,
    Sold,
    Reserved,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Sold => "sold",
            Self::Reserved => "reserved",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "sold" => Ok(Self::Sold),
            "reserved" => Ok(Self::Reserved),
            _ => Err(()),
        }
    }
}

/// A house or a plot of land on public offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub owner: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tenure: Option<String>,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub status: ListingStatus,
    /// Request this listing was promoted from, if any. Informational only.
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Listing {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub owner: Option<String>,
    pub mobile: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub tenure: Option<String>,
    pub size: Option<String>,
    pub price: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub request_id: Option<String>,
}
