//! Persistence seam for the catalog. `PgBookStore` backs the real server;
//! `MemBookStore` backs tests.

use axum::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Book, NewBook};

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Newest first.
    async fn list_books(&self) -> Result<Vec<Book>, ApiError>;

    /// Case-insensitive substring match on the author name, newest first.
    async fn search_by_author(&self, author: &str) -> Result<Vec<Book>, ApiError>;

    async fn add_book(&self, new: NewBook) -> Result<Book, ApiError>;
}

#[derive(Clone)]
pub struct PgBookStore {
    pool: Pool<Postgres>,
}

impl PgBookStore {
    /// Connects and applies pending migrations. Failures here are fatal to
    /// startup.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = Pool::<Postgres>::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(PgBookStore { pool })
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        let books =
            sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(books)
    }

    async fn search_by_author(&self, author: &str) -> Result<Vec<Book>, ApiError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE author ILIKE '%' || $1 || '%'
             ORDER BY created_at DESC",
        )
        .bind(author)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn add_book(&self, new: NewBook) -> Result<Book, ApiError> {
        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (id, title, author, price)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.author)
        .bind(new.price)
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }
}

/// Books in insertion order; reads walk the list backwards so ordering does
/// not depend on timestamp resolution.
#[derive(Default)]
pub struct MemBookStore {
    books: RwLock<Vec<Book>>,
}

impl MemBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemBookStore {
    async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        let books = self.books.read().await;
        Ok(books.iter().rev().cloned().collect())
    }

    async fn search_by_author(&self, author: &str) -> Result<Vec<Book>, ApiError> {
        let needle = author.to_lowercase();
        let books = self.books.read().await;
        Ok(books
            .iter()
            .rev()
            .filter(|book| book.author.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn add_book(&self, new: NewBook) -> Result<Book, ApiError> {
        let book = Book {
            id: Uuid::new_v4(),
            title: new.title,
            author: new.author,
            price: new.price,
            created_at: Utc::now(),
        };
        self.books.write().await.push(book.clone());
        Ok(book)
    }
}
