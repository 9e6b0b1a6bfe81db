// src/store/memory.rs

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{ListingStore, UserStore};
use crate::{
    error::AppError,
    models::{
        listing::{Listing, ListingInput},
        search::ListingQuery,
        user::{NewUser, User, UserPatch},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    listings: Vec<Listing>,
    next_user_id: i64,
    next_listing_id: i64,
}

/// In-process store with the same observable semantics as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".to_string()))
    }
}

impl Tables {
    fn ensure_unique(&self, id: Option<i64>, username: &str, email: &str) -> Result<(), AppError> {
        let clash = self
            .users
            .iter()
            .filter(|u| Some(u.id) != id)
            .any(|u| u.username == username || u.email == email);
        if clash {
            return Err(AppError::Conflict(
                "Username or email already in use".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.write()?;
        tables.ensure_unique(None, &user.username, &user.email)?;

        tables.next_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: tables.next_user_id,
            username: user.username,
            email: user.email,
            password: user.password_hash,
            avatar: user.avatar,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<Option<User>, AppError> {
        let mut tables = self.write()?;
        let Some(current) = tables.users.iter().find(|u| u.id == id).cloned() else {
            return Ok(None);
        };

        let username = patch.username.unwrap_or(current.username);
        let email = patch.email.unwrap_or(current.email);
        tables.ensure_unique(Some(id), &username, &email)?;

        let updated = User {
            username,
            email,
            password: patch.password_hash.unwrap_or(current.password),
            avatar: patch.avatar.unwrap_or(current.avatar),
            updated_at: Utc::now(),
            ..current
        };
        if let Some(slot) = tables.users.iter_mut().find(|u| u.id == id) {
            *slot = updated.clone();
        }
        Ok(Some(updated))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        let removed = tables.users.len() != before;
        if removed {
            tables.listings.retain(|l| l.user_ref != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn create_listing(&self, owner: i64, input: ListingInput) -> Result<Listing, AppError> {
        let mut tables = self.write()?;
        if !tables.users.iter().any(|u| u.id == owner) {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        tables.next_listing_id += 1;
        let now = Utc::now();
        let listing = Listing {
            id: tables.next_listing_id,
            name: input.name,
            description: input.description,
            address: input.address,
            listing_type: input.listing_type,
            parking: input.parking,
            furnished: input.furnished,
            offer: input.offer,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            regular_price: input.regular_price,
            discount_price: input.discount_price,
            image_urls: input.image_urls,
            user_ref: owner,
            created_at: now,
            updated_at: now,
        };
        tables.listings.push(listing.clone());
        Ok(listing)
    }

    async fn find_listing(&self, id: i64) -> Result<Option<Listing>, AppError> {
        Ok(self.read()?.listings.iter().find(|l| l.id == id).cloned())
    }

    async fn replace_listing(
        &self,
        id: i64,
        input: ListingInput,
    ) -> Result<Option<Listing>, AppError> {
        let mut tables = self.write()?;
        let Some(slot) = tables.listings.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };

        slot.name = input.name;
        slot.description = input.description;
        slot.address = input.address;
        slot.listing_type = input.listing_type;
        slot.parking = input.parking;
        slot.furnished = input.furnished;
        slot.offer = input.offer;
        slot.bedrooms = input.bedrooms;
        slot.bathrooms = input.bathrooms;
        slot.regular_price = input.regular_price;
        slot.discount_price = input.discount_price;
        slot.image_urls = input.image_urls;
        slot.updated_at = Utc::now();
        Ok(Some(slot.clone()))
    }

    async fn delete_listing(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        let before = tables.listings.len();
        tables.listings.retain(|l| l.id != id);
        Ok(tables.listings.len() != before)
    }

    async fn listings_by_owner(&self, owner: i64) -> Result<Vec<Listing>, AppError> {
        let mut listings: Vec<Listing> = self
            .read()?
            .listings
            .iter()
            .filter(|l| l.user_ref == owner)
            .cloned()
            .collect();
        listings.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(listings)
    }

    async fn search_listings(&self, query: &ListingQuery) -> Result<Vec<Listing>, AppError> {
        let mut matched: Vec<Listing> = self
            .read()?
            .listings
            .iter()
            .filter(|l| query.filter.matches(l))
            .cloned()
            .collect();
        matched.sort_by(|a, b| query.compare(a, b));

        Ok(matched
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        listing::ListingType,
        search::{SearchParams, SortField, SortOrder},
    };

    async fn store_with_owner() -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                username: "owner".into(),
                email: "owner@example.com".into(),
                password_hash: "hash".into(),
                avatar: "https://img.example.com/a.png".into(),
            })
            .await
            .unwrap();
        (store, user.id)
    }

    fn input(name: &str, listing_type: ListingType, price: i64) -> ListingInput {
        ListingInput {
            name: name.into(),
            description: "desc".into(),
            address: "addr".into(),
            listing_type,
            regular_price: price,
            image_urls: vec!["https://img.example.com/1.jpg".into()],
            ..ListingInput::default()
        }
    }

    fn resolve(query: &str) -> ListingQuery {
        ListingQuery::resolve(&SearchParams::from_query_string(query))
    }

    #[tokio::test]
    async fn loft_scenario_returns_two_rent_matches() {
        let (store, owner) = store_with_owner().await;
        for (name, t) in [
            ("Loft A", ListingType::Rent),
            ("Loft B", ListingType::Rent),
            ("Sale Loft", ListingType::Rent),
            ("Loft C", ListingType::Sale),
        ] {
            store.create_listing(owner, input(name, t, 1000)).await.unwrap();
        }

        let page = store
            .search_listings(&resolve("searchTerm=Loft&type=rent&limit=2&startIndex=0"))
            .await
            .unwrap();

        assert_eq!(page.len(), 2);
        assert!(page.iter().all(|l| l.listing_type == ListingType::Rent));
        assert!(page.iter().all(|l| l.name.contains("Loft")));
        assert!(page.iter().all(|l| l.name != "Loft C"));
    }

    #[tokio::test]
    async fn empty_query_matches_everything() {
        let (store, owner) = store_with_owner().await;
        let mut parked = input("Parked house", ListingType::Sale, 900);
        parked.parking = true;
        store.create_listing(owner, parked).await.unwrap();
        store
            .create_listing(owner, input("Plain house", ListingType::Rent, 800))
            .await
            .unwrap();

        let all = store.search_listings(&ListingQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let parked_only = store.search_listings(&resolve("parking=true")).await.unwrap();
        assert_eq!(parked_only.len(), 1);
        assert!(parked_only[0].parking);
    }

    #[tokio::test]
    async fn price_sort_is_monotonic_and_pages_are_disjoint() {
        let (store, owner) = store_with_owner().await;
        for (i, price) in [1200, 700, 3000, 700, 950].into_iter().enumerate() {
            store
                .create_listing(owner, input(&format!("House {i}"), ListingType::Rent, price))
                .await
                .unwrap();
        }

        let mut query = resolve("sort=regularPrice&order=desc&limit=3");
        assert_eq!(query.sort, SortField::RegularPrice);
        assert_eq!(query.order, SortOrder::Desc);

        let first = store.search_listings(&query).await.unwrap();
        assert_eq!(first.len(), 3);
        assert!(first.windows(2).all(|w| w[0].regular_price >= w[1].regular_price));

        query.offset = first.len() as i64;
        let second = store.search_listings(&query).await.unwrap();
        assert_eq!(second.len(), 2);
        assert!(second.iter().all(|l| first.iter().all(|f| f.id != l.id)));
        assert!(first.last().unwrap().regular_price >= second[0].regular_price);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_listings() {
        let (store, owner) = store_with_owner().await;
        store
            .create_listing(owner, input("Doomed flat", ListingType::Rent, 600))
            .await
            .unwrap();

        assert!(store.delete_user(owner).await.unwrap());
        assert!(store.listings_by_owner(owner).await.unwrap().is_empty());
        assert!(store.search_listings(&ListingQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (store, _) = store_with_owner().await;
        let err = store
            .create_user(NewUser {
                username: "other".into(),
                email: "owner@example.com".into(),
                password_hash: "hash".into(),
                avatar: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
