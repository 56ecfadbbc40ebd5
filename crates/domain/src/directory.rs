//! User directory: accounts, credentials, sessions.

use chrono::Utc;
use common::UserId;
use store::{MarketStore, Session, StoreError, User, UserPatch};

use crate::error::DomainError;
use crate::password;

/// Input for registering a new user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// Service for user accounts and authentication.
///
/// Pure CRUD over the store plus the email/username uniqueness invariant;
/// passwords are stored only as argon2 hashes.
pub struct UserDirectory<S> {
    store: S,
}

impl<S: MarketStore> UserDirectory<S> {
    /// Creates a new directory over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new user account.
    ///
    /// Fails with [`DomainError::AlreadyExists`] when the email or username
    /// is taken. The pre-check keeps the common case cheap; the store's
    /// unique constraint still catches a concurrent registration.
    #[tracing::instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: NewUser) -> Result<User, DomainError> {
        if self.store.find_user_by_email(&input.email).await?.is_some()
            || self
                .store
                .find_user_by_username(&input.username)
                .await?
                .is_some()
        {
            return Err(DomainError::AlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: input.username,
            email: input.email,
            password_hash: password::hash(&input.password)?,
            full_name: input.full_name,
            phone: input.phone,
            address: None,
            profile_image: None,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_user(&user).await {
            Ok(()) => {
                metrics::counter!("users_registered_total").increment(1);
                Ok(user)
            }
            Err(StoreError::Duplicate { .. }) => Err(DomainError::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Looks up a user by id.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.store.find_user(id).await?)
    }

    /// Looks up a user by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self.store.find_user_by_email(email).await?)
    }

    /// Checks a user's credentials.
    ///
    /// An unknown email and a wrong password both come back as `None`;
    /// callers cannot tell the two apart.
    #[tracing::instrument(skip(self, email, password))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            return Ok(None);
        };
        if password::verify(&user.password_hash, password)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Applies the present fields of `patch` to the user's profile.
    ///
    /// Returns `None` if the id is unknown.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update(&self, id: UserId, patch: &UserPatch) -> Result<Option<User>, DomainError> {
        Ok(self.store.update_user(id, patch).await?)
    }

    /// Opens a login session for `user` and returns it.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn open_session(&self, user: &User) -> Result<Session, DomainError> {
        let session = Session::open(user.id);
        self.store.insert_session(&session).await?;
        Ok(session)
    }

    /// Resolves a session token back to its user.
    ///
    /// Returns `None` for unknown tokens and for sessions whose user no
    /// longer resolves.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<User>, DomainError> {
        let Some(session) = self.store.find_session(token).await? else {
            return Ok(None);
        };
        Ok(self.store.find_user(session.user_id).await?)
    }
}
