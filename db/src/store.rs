//! Storage seams consumed by the subscription core.
//!
//! The Postgres implementation delegates to the query functions in
//! [`crate::user`] and [`crate::email`]. An in-memory implementation is
//! available under the `test-store` feature.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::Res;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::User;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, user_id: Uuid) -> Res<Option<User>>;

    /// Persists the subscription columns of `user`.
    async fn save(&self, user: &User) -> Res<()>;
}

#[async_trait]
pub trait EmailStore: Send + Sync {
    /// Emails created by the user in `[start, end)`.
    async fn count_by_user_in_window(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Res<i64>;

    async fn count_revisions(&self, email_id: Uuid) -> Res<i64>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_id(&self, user_id: Uuid) -> Res<Option<User>> {
        crate::user::get_user_by_id(self.pool(), user_id).await
    }

    async fn save(&self, user: &User) -> Res<()> {
        crate::user::update_subscription(self.pool(), user.id, &user.subscription).await
    }
}

#[async_trait]
impl EmailStore for PgStore {
    async fn count_by_user_in_window(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Res<i64> {
        crate::email::count_by_user_in_window(self.pool(), user_id, start, end).await
    }

    async fn count_revisions(&self, email_id: Uuid) -> Res<i64> {
        crate::email::count_revisions(self.pool(), email_id).await
    }
}

#[cfg(any(test, feature = "test-store"))]
pub mod memory {
    use std::{
        collections::HashMap,
        sync::{
            RwLock,
            atomic::{AtomicBool, AtomicUsize, Ordering},
        },
    };

    use common::error::AppError;

    use super::*;
    use crate::models::user::SubscriptionState;

    /// Store backed by maps, for tests.
    #[derive(Default)]
    pub struct InMemoryStore {
        users: RwLock<HashMap<Uuid, User>>,
        email_times: RwLock<Vec<(Uuid, DateTime<Utc>)>>,
        revisions: RwLock<HashMap<Uuid, i64>>,
        saves: AtomicUsize,
        fail_writes: AtomicBool,
    }

    impl InMemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert_user(&self, user: User) {
            self.users.write().unwrap().insert(user.id, user);
        }

        pub fn user(&self, user_id: Uuid) -> Option<User> {
            self.users.read().unwrap().get(&user_id).cloned()
        }

        pub fn add_email(&self, user_id: Uuid, created_at: DateTime<Utc>) {
            self.email_times.write().unwrap().push((user_id, created_at));
        }

        pub fn set_revisions(&self, email_id: Uuid, count: i64) {
            self.revisions.write().unwrap().insert(email_id, count);
        }

        /// Number of successful `save` calls.
        pub fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }
    }

    /// A user with the given subscription and fixed identity fields.
    pub fn user_with(subscription: SubscriptionState) -> User {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        User {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            username: "someone".to_string(),
            created_at: epoch,
            updated_at: epoch,
            subscription,
        }
    }

    #[async_trait]
    impl UserStore for InMemoryStore {
        async fn find_user_by_id(&self, user_id: Uuid) -> Res<Option<User>> {
            Ok(self.user(user_id))
        }

        async fn save(&self, user: &User) -> Res<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Database(sqlx::Error::PoolTimedOut));
            }
            self.users.write().unwrap().insert(user.id, user.clone());
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl EmailStore for InMemoryStore {
        async fn count_by_user_in_window(
            &self,
            user_id: Uuid,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Res<i64> {
            let count = self
                .email_times
                .read()
                .unwrap()
                .iter()
                .filter(|(owner, at)| *owner == user_id && *at >= start && *at < end)
                .count();
            Ok(count as i64)
        }

        async fn count_revisions(&self, email_id: Uuid) -> Res<i64> {
            Ok(self
                .revisions
                .read()
                .unwrap()
                .get(&email_id)
                .copied()
                .unwrap_or(0))
        }
    }
}
