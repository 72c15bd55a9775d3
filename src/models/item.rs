//! Item (catalog entry) model and related types.
//!
//! One item is one physical unit: it is either on the shelf (`available`)
//! or on loan to exactly one member.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub type ItemId = i64;

static ISBN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(97(8|9))?\d{9}(\d|X)$").expect("valid ISBN pattern"));

/// Catalog item as stored by the item directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub isbn: String,
    pub genre: String,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    /// False while an open loan references this item
    pub available: bool,
    pub description: Option<String>,
    pub page_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Build a new, available item from a creation request
    pub fn from_request(id: ItemId, request: &CreateItem, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: request.title.clone(),
            author: request.author.clone(),
            publication_year: request.publication_year,
            isbn: request.isbn.clone(),
            genre: request.genre.clone(),
            price: request.price,
            available: true,
            description: request.description.clone(),
            page_count: request.page_count,
            created_at: now,
            updated_at: None,
        }
    }

    /// Apply descriptive changes. Availability is never touched here.
    pub fn apply(&mut self, changes: &UpdateItem, now: DateTime<Utc>) {
        if let Some(ref title) = changes.title {
            self.title = title.clone();
        }
        if let Some(ref author) = changes.author {
            self.author = author.clone();
        }
        if let Some(year) = changes.publication_year {
            self.publication_year = year;
        }
        if let Some(ref genre) = changes.genre {
            self.genre = genre.clone();
        }
        if changes.price.is_some() {
            self.price = changes.price;
        }
        if changes.description.is_some() {
            self.description = changes.description.clone();
        }
        if let Some(pages) = changes.page_count {
            self.page_count = pages;
        }
        self.updated_at = Some(now);
    }
}

/// Create item request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateItem {
    #[validate(length(min = 1, max = 100, message = "Title must be 1 to 100 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Author must be 1 to 100 characters"))]
    pub author: String,
    #[validate(range(min = 1500, max = 2100, message = "Publication year must be between 1500 and 2100"))]
    pub publication_year: i32,
    #[validate(regex(path = *ISBN_RE, message = "Invalid ISBN format"))]
    pub isbn: String,
    #[validate(length(min = 1, max = 50, message = "Genre must be 1 to 50 characters"))]
    pub genre: String,
    #[validate(custom(function = "non_negative_price"))]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Page count must be at least 1"))]
    pub page_count: i32,
}

/// Update item request (ISBN and availability are not editable)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItem {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub author: Option<String>,
    #[validate(range(min = 1500, max = 2100))]
    pub publication_year: Option<i32>,
    #[validate(length(min = 1, max = 50))]
    pub genre: Option<String>,
    #[validate(custom(function = "non_negative_price"))]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub page_count: Option<i32>,
}

/// Item with its current loan status, for detail views
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemDetails {
    #[serde(flatten)]
    pub item: Item,
    pub currently_borrowed: bool,
}

fn non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        let mut err = ValidationError::new("price");
        err.message = Some("Price cannot be negative".into());
        return Err(err);
    }
    Ok(())
}
