// src/store/mod.rs

//! Persistence seams for users and listings.
//!
//! Handlers only see these traits; `PgStore` backs production and
//! `MemoryStore` backs tests and database-less local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        listing::{Listing, ListingInput},
        search::ListingQuery,
        user::{NewUser, User, UserPatch},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Applies the present fields of `patch`. Returns `None` if the user does not exist.
    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<Option<User>, AppError>;

    /// Removes the user and every listing they own. Returns whether a row was removed.
    async fn delete_user(&self, id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn create_listing(&self, owner: i64, input: ListingInput) -> Result<Listing, AppError>;

    async fn find_listing(&self, id: i64) -> Result<Option<Listing>, AppError>;

    /// Replaces every mutable field; the owner and creation time are kept.
    async fn replace_listing(&self, id: i64, input: ListingInput)
    -> Result<Option<Listing>, AppError>;

    async fn delete_listing(&self, id: i64) -> Result<bool, AppError>;

    /// All listings of one owner, newest first.
    async fn listings_by_owner(&self, owner: i64) -> Result<Vec<Listing>, AppError>;

    /// Executes a resolved search and returns one page in query order.
    async fn search_listings(&self, query: &ListingQuery) -> Result<Vec<Listing>, AppError>;
}
