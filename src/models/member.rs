//! Member (borrower) model

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::loan::LoanRecordView;

pub type MemberId = i64;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9. ()-]{7,15}$").expect("valid phone pattern"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn from_request(id: MemberId, request: &CreateMember, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            address: request.address.clone(),
            created_at: now,
            updated_at: None,
        }
    }

    pub fn apply(&mut self, changes: &UpdateMember, now: DateTime<Utc>) {
        if let Some(ref name) = changes.name {
            self.name = name.clone();
        }
        if let Some(ref email) = changes.email {
            self.email = email.clone();
        }
        if let Some(ref phone) = changes.phone {
            self.phone = phone.clone();
        }
        if changes.address.is_some() {
            self.address = changes.address.clone();
        }
        self.updated_at = Some(now);
    }
}

/// Create member request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMember {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number format"))]
    pub phone: String,
    #[validate(length(max = 255, message = "Address must be at most 255 characters"))]
    pub address: Option<String>,
}

/// Update member request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMember {
    #[validate(length(min = 2, max = 50))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(regex(path = *PHONE_RE))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

/// Member with open loans, for detail views
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberDetails {
    #[serde(flatten)]
    pub member: Member,
    pub open_loans: Vec<LoanRecordView>,
}
