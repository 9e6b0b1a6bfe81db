// src/client/search.rs

//! Search page state kept in sync with the location query string.

use super::{ApiClient, ClientError};
use crate::models::{
    listing::Listing,
    search::{ListingQuery, SearchParams},
};

pub struct SearchController {
    api: ApiClient,
    query: ListingQuery,
    listings: Vec<Listing>,
    show_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl SearchController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            query: ListingQuery::default(),
            listings: Vec::new(),
            show_more: false,
            loading: false,
            error: None,
        }
    }

    /// Starts from the query string of the current location.
    pub fn from_location(api: ApiClient, query_string: &str) -> Self {
        let mut controller = Self::new(api);
        controller.apply_location(query_string);
        controller
    }

    /// Replaces the filter state with what the location says.
    pub fn apply_location(&mut self, query_string: &str) {
        let query_string = query_string.trim_start_matches('?');
        self.query = ListingQuery::resolve(&SearchParams::from_query_string(query_string));
    }

    /// Query string to push to the location when the filters are submitted.
    /// The page window is left out; every submit starts at the first page.
    pub fn location(&self) -> String {
        let mut params = self.query.to_params();
        params.start_index = None;
        params.limit = None;
        params.to_query_string()
    }

    pub fn query(&self) -> &ListingQuery {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut ListingQuery {
        &mut self.query
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    /// Whether the "show more" control should be offered.
    pub fn has_more(&self) -> bool {
        self.show_more
    }

    /// Fetches the first page and replaces the result list.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        self.query.offset = 0;
        self.loading = true;
        self.show_more = false;

        let result = self.api.search(&self.query.to_params()).await;
        self.loading = false;
        match result {
            Ok(page) => {
                self.show_more = self.query.may_have_more(page.len());
                self.listings = page;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Fetches the page after the listings already held and appends it.
    pub async fn show_more(&mut self) -> Result<(), ClientError> {
        self.query.offset = self.listings.len() as i64;

        let result = self.api.search(&self.query.to_params()).await;
        match result {
            Ok(page) => {
                self.show_more = self.query.may_have_more(page.len());
                self.listings.extend(page);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{listing::ListingType, search::SortField};

    fn controller(location: &str) -> SearchController {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        SearchController::from_location(api, location)
    }

    #[test]
    fn location_seeds_filters() {
        let c = controller("?searchTerm=loft&type=rent&parking=true&sort=regularPrice&order=asc");
        let q = c.query();
        assert_eq!(q.filter.search_term, "loft");
        assert_eq!(q.filter.listing_type, Some(ListingType::Rent));
        assert!(q.filter.parking);
        assert_eq!(q.sort, SortField::RegularPrice);
    }

    #[test]
    fn location_round_trips_filter_state() {
        let mut c = controller("");
        c.query_mut().filter.search_term = "sea view".into();
        c.query_mut().filter.offer = true;
        c.query_mut().offset = 18;

        let location = c.location();
        assert!(!location.contains("startIndex"));

        let back = controller(&location);
        assert_eq!(back.query().filter, c.query().filter);
        assert_eq!(back.query().offset, 0);
    }

    #[test]
    fn fresh_controller_offers_no_more() {
        let c = controller("");
        assert!(!c.has_more());
        assert!(c.listings().is_empty());
    }
}
