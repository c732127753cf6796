//! Repository traits and shared query types

use async_trait::async_trait;
use pilot_core::pagination::PaginationParams;
use pilot_core::traits::Id;
use pilot_core::PilotError;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: Id },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value no longer maps onto the model (e.g. an unknown enum string)
    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: Id) -> Self {
        RepositoryError::NotFound { entity, id }
    }

    /// Map constraint violations on writes to conflicts, keep the rest as is
    pub fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.code().as_deref() {
                Some("23505") => {
                    return RepositoryError::Conflict(format!("{} already exists", what));
                }
                Some("23503") => {
                    return RepositoryError::Conflict(format!(
                        "{} is still referenced by other records",
                        what
                    ));
                }
                _ => {}
            }
        }
        RepositoryError::Database(err)
    }
}

impl From<RepositoryError> for PilotError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => PilotError::not_found(entity, id),
            RepositoryError::Conflict(message) => PilotError::Conflict { message },
            RepositoryError::Database(e) => PilotError::Database(e.to_string()),
            RepositoryError::Decode(message) => PilotError::Internal(message),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Parse a TEXT column into one of the model enums
pub(crate) fn decode<T>(value: &str) -> RepositoryResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| RepositoryError::Decode(e.to_string()))
}

/// Base repository trait for CRUD operations.
///
/// Models come in already validated by the service layer; `create` and
/// `update` return the stored row as read back from the database.
#[async_trait]
pub trait Repository<T>: Send + Sync {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<T>>;

    async fn find_all(&self, pagination: Pagination) -> RepositoryResult<PaginatedResult<T>>;

    async fn count(&self) -> RepositoryResult<i64>;

    async fn create(&self, entity: &T) -> RepositoryResult<T>;

    async fn update(&self, entity: &T) -> RepositoryResult<T>;

    async fn delete(&self, id: Id) -> RepositoryResult<()>;

    async fn exists(&self, id: Id) -> RepositoryResult<bool>;
}

/// LIMIT/OFFSET pair for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }
}

impl From<&PaginationParams> for Pagination {
    fn from(params: &PaginationParams) -> Self {
        let params = params.normalized();
        Self {
            limit: params.limit(),
            offset: params.offset,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            limit: pagination.limit,
            offset: pagination.offset,
        }
    }

    pub fn map<U, F>(self, f: F) -> PaginatedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }

    pub fn try_map<U, F>(self, f: F) -> RepositoryResult<PaginatedResult<U>>
    where
        F: FnMut(T) -> RepositoryResult<U>,
    {
        Ok(PaginatedResult {
            items: self.items.into_iter().map(f).collect::<RepositoryResult<_>>()?,
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        })
    }

    pub fn has_next(&self) -> bool {
        self.offset + self.limit < self.total
    }
}
