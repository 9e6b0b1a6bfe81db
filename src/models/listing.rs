// src/models/listing.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::{Validate, ValidationError};

use crate::utils::html::{clean_html, strip_tags};

/// Maximum number of images a listing may carry. The first one is the cover.
pub const MAX_IMAGES: usize = 6;

/// Transaction category of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Rent,
    Sale,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Rent => "rent",
            ListingType::Sale => "sale",
        }
    }
}

#[derive(Debug)]
pub struct UnknownListingType(pub String);

impl fmt::Display for UnknownListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown listing type '{}'", self.0)
    }
}

impl std::error::Error for UnknownListingType {}

impl TryFrom<String> for ListingType {
    type Error = UnknownListingType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "rent" => Ok(ListingType::Rent),
            "sale" => Ok(ListingType::Sale),
            _ => Err(UnknownListingType(value)),
        }
    }
}

/// Represents the 'listings' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub description: String,
    pub address: String,

    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub listing_type: ListingType,

    pub parking: bool,
    pub furnished: bool,
    pub offer: bool,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub regular_price: i64,
    /// Only meaningful while `offer` is set.
    pub discount_price: i64,

    /// Ordered image URLs; the first one is the cover.
    pub image_urls: Vec<String>,

    /// Id of the user who created the listing.
    pub user_ref: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Listing {
    /// Projects the mutable fields back into an input, e.g. to seed an edit form.
    pub fn to_input(&self) -> ListingInput {
        ListingInput {
            name: self.name.clone(),
            description: self.description.clone(),
            address: self.address.clone(),
            listing_type: self.listing_type,
            parking: self.parking,
            furnished: self.furnished,
            offer: self.offer,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            regular_price: self.regular_price,
            discount_price: self.discount_price,
            image_urls: self.image_urls.clone(),
        }
    }
}

/// Mutable listing fields, used for both create and full-replace update.
///
/// These rules are shared by the request handlers and the client form
/// controller, so both tiers reject exactly the same inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_prices))]
pub struct ListingInput {
    #[validate(length(
        min = 5,
        max = 62,
        message = "Name length must be between 5 and 62 characters."
    ))]
    pub name: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required."))]
    pub description: String,

    #[validate(length(min = 1, max = 300, message = "Address is required."))]
    pub address: String,

    #[serde(rename = "type")]
    pub listing_type: ListingType,

    #[serde(default)]
    pub parking: bool,
    #[serde(default)]
    pub furnished: bool,
    #[serde(default)]
    pub offer: bool,

    #[validate(range(min = 1, max = 10, message = "Bedrooms must be between 1 and 10."))]
    pub bedrooms: i32,

    #[validate(range(min = 1, max = 10, message = "Bathrooms must be between 1 and 10."))]
    pub bathrooms: i32,

    #[validate(range(
        min = 500,
        max = 10000,
        message = "Regular price must be between 500 and 10000."
    ))]
    pub regular_price: i64,

    #[serde(default)]
    #[validate(range(min = 0, max = 5000, message = "Discount price must be between 0 and 5000."))]
    pub discount_price: i64,

    #[validate(
        length(min = 1, max = 6, message = "A listing needs between 1 and 6 images."),
        custom(function = validate_image_urls)
    )]
    pub image_urls: Vec<String>,
}

impl ListingInput {
    /// Returns a copy with unsafe markup removed from the free-text fields.
    /// The description keeps safe formatting; name and address become plain text.
    ///
    /// Validate the result, not the raw input: cleaning can shorten a field.
    pub fn sanitized(mut self) -> Self {
        self.name = strip_tags(&self.name);
        self.description = clean_html(&self.description);
        self.address = strip_tags(&self.address);
        self
    }
}

impl Default for ListingInput {
    /// Starting values of a blank listing form.
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            address: String::new(),
            listing_type: ListingType::Rent,
            parking: false,
            furnished: false,
            offer: false,
            bedrooms: 1,
            bathrooms: 1,
            regular_price: 500,
            discount_price: 0,
            image_urls: Vec::new(),
        }
    }
}

/// Discount price must stay strictly below the regular price.
fn validate_prices(input: &ListingInput) -> Result<(), ValidationError> {
    if input.discount_price >= input.regular_price {
        let mut err = ValidationError::new("discount_not_below_regular");
        err.message = Some("Discount price must be lower than regular price.".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a collection of image URLs, ensuring each meets length and format requirements.
fn validate_image_urls(urls: &[String]) -> Result<(), ValidationError> {
    for url in urls {
        if url.len() > 500 {
            return Err(ValidationError::new("url_too_long"));
        }
        if Url::parse(url).is_err() {
            return Err(ValidationError::new("invalid_url"));
        }
    }
    Ok(())
}
