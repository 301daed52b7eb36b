use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// `type` label of a request to sell a house.
pub const HOUSE_SALE: &str = "فرۆشتنی خانوو";
/// `type` label of a request to sell a plot of land.
pub const LAND_SALE: &str = "فرۆشتنی زەوی";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    New,
    Processing,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "processing" => Ok(Self::Processing),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(()),
        }
    }
}

/// A seller's submission, reviewed by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRequest {
    pub id: String,
    pub name: String,
    pub mobile: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub sale_type: String,
    #[serde(default)]
    pub additional_info: String,
    #[serde(default)]
    pub notes: String,
    pub status: RequestStatus,
    #[serde(default)]
    pub viewed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for PropertyRequest {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Body of a submission. Every field is optional on the wire so that
/// missing required fields can be reported together.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPropertyRequest {
    pub name: Option<String>,
    pub mobile: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub location: Option<String>,
    pub size: Option<String>,
    pub price: Option<String>,
    pub sale_type: Option<String>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// Exact-match filters for listing requests.
#[derive(Debug, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RequestStats {
    pub total: usize,
    pub new: usize,
    pub processing: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub houses: usize,
    pub lands: usize,
    pub today: usize,
    pub viewed: usize,
    pub unviewed: usize,
}
