// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{ListingStore, UserStore};
use crate::{
    error::AppError,
    models::{
        listing::{Listing, ListingInput},
        search::ListingQuery,
        user::{NewUser, User, UserPatch},
    },
};

const USER_COLUMNS: &str = "id, username, email, password, avatar, created_at, updated_at";

const LISTING_COLUMNS: &str = "id, name, description, address, listing_type, parking, furnished, \
     offer, bedrooms, bathrooms, regular_price, discount_price, image_urls, user_ref, \
     created_at, updated_at";

/// Postgres-backed store for both users and listings.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Escapes LIKE wildcards so the search term is matched literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password, avatar)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($1, username),
                email = COALESCE($2, email),
                password = COALESCE($3, password),
                avatar = COALESCE($4, avatar),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(patch.username)
        .bind(patch.email)
        .bind(patch.password_hash)
        .bind(patch.avatar)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        // listings.user_ref cascades
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ListingStore for PgStore {
    async fn create_listing(&self, owner: i64, input: ListingInput) -> Result<Listing, AppError> {
        let listing = sqlx::query_as::<_, Listing>(&format!(
            r#"
            INSERT INTO listings (
                name, description, address, listing_type, parking, furnished, offer,
                bedrooms, bathrooms, regular_price, discount_price, image_urls, user_ref
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.address)
        .bind(input.listing_type.as_str())
        .bind(input.parking)
        .bind(input.furnished)
        .bind(input.offer)
        .bind(input.bedrooms)
        .bind(input.bathrooms)
        .bind(input.regular_price)
        .bind(input.discount_price)
        .bind(&input.image_urls)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn find_listing(&self, id: i64) -> Result<Option<Listing>, AppError> {
        let listing = sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn replace_listing(
        &self,
        id: i64,
        input: ListingInput,
    ) -> Result<Option<Listing>, AppError> {
        let listing = sqlx::query_as::<_, Listing>(&format!(
            r#"
            UPDATE listings SET
                name = $1, description = $2, address = $3, listing_type = $4,
                parking = $5, furnished = $6, offer = $7,
                bedrooms = $8, bathrooms = $9,
                regular_price = $10, discount_price = $11, image_urls = $12,
                updated_at = NOW()
            WHERE id = $13
            RETURNING {LISTING_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.address)
        .bind(input.listing_type.as_str())
        .bind(input.parking)
        .bind(input.furnished)
        .bind(input.offer)
        .bind(input.bedrooms)
        .bind(input.bathrooms)
        .bind(input.regular_price)
        .bind(input.discount_price)
        .bind(&input.image_urls)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn delete_listing(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn listings_by_owner(&self, owner: i64) -> Result<Vec<Listing>, AppError> {
        let listings = sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE user_ref = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    async fn search_listings(&self, query: &ListingQuery) -> Result<Vec<Listing>, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {LISTING_COLUMNS} FROM listings WHERE TRUE"));

        let filter = &query.filter;
        if !filter.search_term.is_empty() {
            qb.push(" AND name ILIKE ")
                .push_bind(format!("%{}%", escape_like(&filter.search_term)));
        }
        if let Some(listing_type) = filter.listing_type {
            qb.push(" AND listing_type = ")
                .push_bind(listing_type.as_str());
        }
        if filter.parking {
            qb.push(" AND parking");
        }
        if filter.furnished {
            qb.push(" AND furnished");
        }
        if filter.offer {
            qb.push(" AND offer");
        }

        let direction = query.order.keyword();
        qb.push(format!(
            " ORDER BY {} {direction}, id {direction}",
            query.sort.column()
        ));
        qb.push(" LIMIT ").push_bind(query.limit);
        qb.push(" OFFSET ").push_bind(query.offset);

        let listings = qb
            .build_query_as::<Listing>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("Failed to search listings: {:?}", e))?;

        Ok(listings)
    }
}
