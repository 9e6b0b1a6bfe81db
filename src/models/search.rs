// src/models/search.rs

//! Listing search parameters and their resolution into a store query.
//!
//! Every parameter is optional and parsed on its own. A missing or malformed
//! value falls back to its default instead of failing the request, so an
//! empty query string resolves to "everything, newest first, first page".

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::listing::{Listing, ListingType};

pub const DEFAULT_LIMIT: i64 = 9;
pub const MAX_LIMIT: i64 = 100;

/// Raw query parameters of `GET /api/listing/get`, exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furnished: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<String>,
}

impl SearchParams {
    /// Parses a URL query string (without the leading `?`).
    pub fn from_query_string(query: &str) -> Self {
        let mut params = SearchParams::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "searchTerm" => params.search_term = value,
                "type" => params.listing_type = value,
                "parking" => params.parking = value,
                "furnished" => params.furnished = value,
                "offer" => params.offer = value,
                "sort" => params.sort = value,
                "order" => params.order = value,
                "limit" => params.limit = value,
                "startIndex" => params.start_index = value,
                _ => {}
            }
        }
        params
    }

    /// Encodes the present parameters as a URL query string.
    pub fn to_query_string(&self) -> String {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        let pairs = [
            ("searchTerm", &self.search_term),
            ("type", &self.listing_type),
            ("parking", &self.parking),
            ("furnished", &self.furnished),
            ("offer", &self.offer),
            ("sort", &self.sort),
            ("order", &self.order),
            ("limit", &self.limit),
            ("startIndex", &self.start_index),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                out.append_pair(key, value);
            }
        }
        out.finish()
    }
}

/// Allow-listed sort keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    RegularPrice,
    DiscountPrice,
}

impl SortField {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "created_at" | "createdAt" => Some(SortField::CreatedAt),
            "updated_at" | "updatedAt" => Some(SortField::UpdatedAt),
            "regularPrice" | "regular_price" => Some(SortField::RegularPrice),
            "discountPrice" | "discount_price" => Some(SortField::DiscountPrice),
            _ => None,
        }
    }

    /// Column name; safe to splice into SQL because the set is closed.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::RegularPrice => "regular_price",
            SortField::DiscountPrice => "discount_price",
        }
    }

    /// Wire spelling, as the client sends it.
    pub fn param(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::RegularPrice => "regularPrice",
            SortField::DiscountPrice => "discountPrice",
        }
    }

    fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::RegularPrice => a.regular_price.cmp(&b.regular_price),
            SortField::DiscountPrice => a.discount_price.cmp(&b.discount_price),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn param(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Conjunction of the active filters. The default value matches every listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Case-insensitive substring of the name; empty matches all.
    pub search_term: String,
    /// `None` means both categories.
    pub listing_type: Option<ListingType>,
    pub parking: bool,
    pub furnished: bool,
    pub offer: bool,
}

impl ListingFilter {
    pub fn matches(&self, listing: &Listing) -> bool {
        (self.search_term.is_empty()
            || listing
                .name
                .to_lowercase()
                .contains(&self.search_term.to_lowercase()))
            && self.listing_type.is_none_or(|t| listing.listing_type == t)
            && (!self.parking || listing.parking)
            && (!self.furnished || listing.furnished)
            && (!self.offer || listing.offer)
    }
}

/// A fully resolved search: predicate, ordering and page window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub filter: ListingFilter,
    pub sort: SortField,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            filter: ListingFilter::default(),
            sort: SortField::default(),
            order: SortOrder::default(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl ListingQuery {
    pub fn resolve(params: &SearchParams) -> Self {
        let listing_type = match params.listing_type.as_deref() {
            Some("rent") => Some(ListingType::Rent),
            Some("sale") | Some("sell") => Some(ListingType::Sale),
            _ => None,
        };

        let limit = params
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v > 0)
            .map(|v| v.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT);

        let offset = params
            .start_index
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v >= 0)
            .unwrap_or(0);

        Self {
            filter: ListingFilter {
                search_term: params.search_term.clone().unwrap_or_default(),
                listing_type,
                parking: flag(&params.parking),
                furnished: flag(&params.furnished),
                offer: flag(&params.offer),
            },
            sort: params
                .sort
                .as_deref()
                .and_then(SortField::parse)
                .unwrap_or_default(),
            order: params
                .order
                .as_deref()
                .and_then(SortOrder::parse)
                .unwrap_or_default(),
            limit,
            offset,
        }
    }

    /// Inverse of [`ListingQuery::resolve`]; emits every parameter explicitly.
    pub fn to_params(&self) -> SearchParams {
        SearchParams {
            search_term: Some(self.filter.search_term.clone()),
            listing_type: Some(
                self.filter
                    .listing_type
                    .map(|t| t.as_str())
                    .unwrap_or("all")
                    .to_string(),
            ),
            parking: Some(self.filter.parking.to_string()),
            furnished: Some(self.filter.furnished.to_string()),
            offer: Some(self.filter.offer.to_string()),
            sort: Some(self.sort.param().to_string()),
            order: Some(self.order.param().to_string()),
            limit: Some(self.limit.to_string()),
            start_index: Some(self.offset.to_string()),
        }
    }

    /// Ordering of two listings under this query, with the id as tie-breaker
    /// so that consecutive pages never overlap.
    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let ord = self.sort.compare(a, b).then_with(|| a.id.cmp(&b.id));
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }

    /// Whether a returned page suggests that another page may exist.
    pub fn may_have_more(&self, page_len: usize) -> bool {
        page_len as i64 >= self.limit
    }
}

/// Only the literal `true` switches a boolean filter on.
fn flag(raw: &Option<String>) -> bool {
    raw.as_deref() == Some("true")
}
