//! User directory: registration, authentication and account management

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::error::ErrorKind;
use crate::clock::Clock;
use crate::credentials::{
    EmailPolicy, HashError, hash_password, is_long_enough, verify_password, verify_without_account,
};
use crate::models::{NewUser, Role, User, UserCandidate, UserId};
use crate::repositories::{
    RepositoryError, USERS_EMAIL_KEY, USERS_PHONE_NO_KEY, UserRepository,
};
use crate::validation::{
    DateError, MAX_EMAIL_LENGTH, MAX_PERSON_NAME_LENGTH, MAX_PHONE_LENGTH, TooLong,
    is_ten_digit_phone, parse_past_date, present, within,
};

/// Failures of user directory operations; `Display` is the user-facing message
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,

    #[error("Email already exists")]
    EmailTaken,

    #[error("Phone number already exists")]
    PhoneTaken,

    #[error("Phone number must be a 10-digit number")]
    InvalidPhone,

    #[error("Invalid date format for Date of Birth")]
    InvalidBirthDate,

    #[error("Date of birth cannot be in the future")]
    FutureBirthDate,

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error(transparent)]
    TooLong(#[from] TooLong),

    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    NotFound(UserId),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DirectoryError::MissingFields
            | DirectoryError::InvalidEmail
            | DirectoryError::PasswordTooShort
            | DirectoryError::InvalidPhone
            | DirectoryError::InvalidBirthDate
            | DirectoryError::FutureBirthDate
            | DirectoryError::InvalidRole(_)
            | DirectoryError::TooLong(_)
            | DirectoryError::MissingCredentials => ErrorKind::Validation,
            DirectoryError::EmailTaken | DirectoryError::PhoneTaken => ErrorKind::Conflict,
            DirectoryError::InvalidCredentials => ErrorKind::Authentication,
            DirectoryError::NotFound(_) => ErrorKind::NotFound,
            DirectoryError::Hash(_) | DirectoryError::Repository(_) => ErrorKind::Internal,
        }
    }

    /// Translate a storage-level unique violation into the matching conflict
    fn from_insert(e: RepositoryError) -> Self {
        match e.unique_constraint() {
            Some(USERS_EMAIL_KEY) => DirectoryError::EmailTaken,
            Some(USERS_PHONE_NO_KEY) => DirectoryError::PhoneTaken,
            _ => DirectoryError::Repository(e),
        }
    }
}

impl From<DateError> for DirectoryError {
    fn from(e: DateError) -> Self {
        match e {
            DateError::Malformed => DirectoryError::InvalidBirthDate,
            DateError::InFuture => DirectoryError::FutureBirthDate,
        }
    }
}

fn fit_columns(first_name: &str, last_name: &str, phone_no: &str, email: &str) -> Result<(), TooLong> {
    within("First name", first_name, MAX_PERSON_NAME_LENGTH)?;
    within("Last name", last_name, MAX_PERSON_NAME_LENGTH)?;
    within("Phone number", phone_no, MAX_PHONE_LENGTH)?;
    within("Email", email, MAX_EMAIL_LENGTH)
}

/// User directory service
#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UserRepository>,
    emails: EmailPolicy,
    clock: Arc<dyn Clock>,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserRepository>, emails: EmailPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            emails,
            clock,
        }
    }

    /// Self-registration.
    ///
    /// Checks run in a fixed order and the first failure wins: required
    /// fields, email format, password length, email uniqueness, phone
    /// uniqueness, then the optional date of birth. The submitted role must be
    /// present but the account is always created with [`Role::User`].
    pub async fn register(&self, candidate: UserCandidate) -> Result<UserId, DirectoryError> {
        let (Some(first_name), Some(last_name), Some(phone_no), Some(email), Some(_), Some(password)) = (
            present(&candidate.first_name),
            present(&candidate.last_name),
            present(&candidate.phone_no),
            present(&candidate.email),
            present(&candidate.role),
            present(&candidate.password),
        ) else {
            warn!("Registration failed: missing fields");
            return Err(DirectoryError::MissingFields);
        };

        if !self.emails.is_valid_email(email) {
            warn!("Registration failed: invalid email {}", email);
            return Err(DirectoryError::InvalidEmail);
        }

        if !is_long_enough(password) {
            warn!("Registration failed: password too short for {}", email);
            return Err(DirectoryError::PasswordTooShort);
        }

        self.ensure_unique(email, phone_no).await?;

        let dob = match present(&candidate.dob) {
            Some(raw) => Some(parse_past_date(raw, self.clock.today())?),
            None => None,
        };

        fit_columns(first_name, last_name, phone_no, email)
            .inspect_err(|e| warn!("Registration failed: {}", e))?;

        let user = self
            .users
            .insert(NewUser {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                dob,
                phone_no: phone_no.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password)?,
                role: Role::User,
            })
            .await
            .map_err(DirectoryError::from_insert)?;

        info!("User registered successfully: {}", user.email);
        Ok(user.id)
    }

    /// Account creation by an administrator.
    ///
    /// Order: required fields, email format, email uniqueness, phone
    /// uniqueness, password length, ten-digit phone, date of birth (defaults
    /// to today), role (defaults to `user`).
    pub async fn administrator_add(&self, candidate: UserCandidate) -> Result<UserId, DirectoryError> {
        let (Some(first_name), Some(last_name), Some(phone_no), Some(email), Some(password)) = (
            present(&candidate.first_name),
            present(&candidate.last_name),
            present(&candidate.phone_no),
            present(&candidate.email),
            present(&candidate.password),
        ) else {
            warn!("Add user failed: missing fields");
            return Err(DirectoryError::MissingFields);
        };

        if !self.emails.is_valid_email(email) {
            warn!("Add user failed: invalid email {}", email);
            return Err(DirectoryError::InvalidEmail);
        }

        self.ensure_unique(email, phone_no).await?;

        if !is_long_enough(password) {
            warn!("Add user failed: password too short");
            return Err(DirectoryError::PasswordTooShort);
        }

        if !is_ten_digit_phone(phone_no) {
            warn!("Add user failed: invalid phone number");
            return Err(DirectoryError::InvalidPhone);
        }

        let today = self.clock.today();
        let dob = match present(&candidate.dob) {
            Some(raw) => parse_past_date(raw, today).inspect_err(|e| {
                warn!("Add user failed: date of birth rejected: {}", e);
            })?,
            None => today,
        };

        let role = match present(&candidate.role) {
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|e| DirectoryError::InvalidRole(e.0))?,
            None => Role::User,
        };

        fit_columns(first_name, last_name, phone_no, email)
            .inspect_err(|e| warn!("Add user failed: {}", e))?;

        let user = self
            .users
            .insert(NewUser {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                dob: Some(dob),
                phone_no: phone_no.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password)?,
                role,
            })
            .await
            .map_err(DirectoryError::from_insert)?;

        info!("User added successfully: {} ({})", user.email, user.role);
        Ok(user.id)
    }

    /// Check credentials. Does not start a session.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, DirectoryError> {
        if email.is_empty() || password.is_empty() {
            warn!("Login failed: email and password are required");
            return Err(DirectoryError::MissingCredentials);
        }

        let user = self.users.find_by_email(email).await?;
        let verified = match &user {
            Some(user) => verify_password(password, &user.password_hash),
            None => verify_without_account(password),
        };

        match user {
            Some(user) if verified => {
                info!("User authenticated: {}", user.email);
                Ok(user)
            }
            _ => {
                warn!("Login failed: invalid email or password for email {}", email);
                Err(DirectoryError::InvalidCredentials)
            }
        }
    }

    /// Create the account unless one with the same email already exists.
    ///
    /// Returns the id of the created account, or `None` when it already existed.
    pub async fn ensure_account(
        &self,
        candidate: UserCandidate,
    ) -> Result<Option<UserId>, DirectoryError> {
        if let Some(email) = present(&candidate.email) {
            if self.users.find_by_email(email).await?.is_some() {
                return Ok(None);
            }
        }
        self.administrator_add(candidate).await.map(Some)
    }

    pub async fn find(&self, id: UserId) -> Result<User, DirectoryError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(DirectoryError::NotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<User>, DirectoryError> {
        Ok(self.users.list().await?)
    }

    /// Delete a user; items it held become unassigned.
    pub async fn delete(&self, id: UserId) -> Result<(), DirectoryError> {
        if self.users.delete(id).await? {
            info!("User deleted successfully: {}", id);
            Ok(())
        } else {
            warn!("Delete user failed: user {} not found", id);
            Err(DirectoryError::NotFound(id))
        }
    }

    async fn ensure_unique(&self, email: &str, phone_no: &str) -> Result<(), DirectoryError> {
        if self.users.find_by_email(email).await?.is_some() {
            warn!("Email already exists: {}", email);
            return Err(DirectoryError::EmailTaken);
        }
        if self.users.find_by_phone(phone_no).await?.is_some() {
            warn!("Phone number already exists: {}", phone_no);
            return Err(DirectoryError::PhoneTaken);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::repositories::MemoryStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::time::{Duration, Instant};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn directory_over(users: Arc<dyn UserRepository>) -> UserDirectory {
        UserDirectory::new(
            users,
            EmailPolicy::new("corp.com").unwrap(),
            Arc::new(FixedClock(today())),
        )
    }

    fn directory() -> (UserDirectory, MemoryStore) {
        let store = MemoryStore::new();
        (directory_over(Arc::new(store.clone())), store)
    }

    fn candidate(email: &str, phone: &str, password: &str) -> UserCandidate {
        UserCandidate {
            first_name: Some("Alice".to_string()),
            last_name: Some("Smith".to_string()),
            dob: None,
            phone_no: Some(phone.to_string()),
            email: Some(email.to_string()),
            role: Some("user".to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let (directory, _) = directory();
        let id = directory
            .register(candidate("alice@corp.com", "1111111111", "secret1"))
            .await
            .unwrap();

        let user = directory.authenticate("alice@corp.com", "secret1").await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn test_register_never_grants_admin() {
        let (directory, _) = directory();
        let mut form = candidate("alice@corp.com", "1111111111", "secret1");
        form.role = Some("admin".to_string());

        let id = directory.register(form).await.unwrap();
        assert_eq!(directory.find(id).await.unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn test_register_short_password_persists_nothing() {
        let (directory, store) = directory();
        let err = directory
            .register(candidate("alice@corp.com", "1111111111", "abc"))
            .await
            .unwrap_err();

        assert!(matches!(err, DirectoryError::PasswordTooShort));
        assert_eq!(err.to_string(), "Password must be at least 6 characters long");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicates_conflict() {
        let (directory, _) = directory();
        directory
            .register(candidate("alice@corp.com", "1111111111", "secret1"))
            .await
            .unwrap();

        let err = directory
            .register(candidate("alice@corp.com", "2222222222", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::EmailTaken));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = directory
            .register(candidate("bob@corp.com", "1111111111", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::PhoneTaken));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_register_precedence() {
        let (directory, _) = directory();
        directory
            .register(candidate("alice@corp.com", "1111111111", "secret1"))
            .await
            .unwrap();

        // missing fields beat everything else
        let mut form = candidate("bad", "1111111111", "abc");
        form.role = None;
        assert!(matches!(
            directory.register(form).await,
            Err(DirectoryError::MissingFields)
        ));

        // email format is checked before password length
        assert!(matches!(
            directory.register(candidate("bad@other.com", "9", "abc")).await,
            Err(DirectoryError::InvalidEmail)
        ));

        // password length is checked before uniqueness
        assert!(matches!(
            directory.register(candidate("alice@corp.com", "1111111111", "abc")).await,
            Err(DirectoryError::PasswordTooShort)
        ));

        // email uniqueness is checked before phone uniqueness
        assert!(matches!(
            directory.register(candidate("alice@corp.com", "1111111111", "secret1")).await,
            Err(DirectoryError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_future_birth_date() {
        let (directory, _) = directory();
        let mut form = candidate("alice@corp.com", "1111111111", "secret1");
        form.dob = Some("2024-06-16".to_string());

        assert!(matches!(
            directory.register(form).await,
            Err(DirectoryError::FutureBirthDate)
        ));
    }

    #[tokio::test]
    async fn test_administrator_add_precedence() {
        let (directory, _) = directory();
        directory
            .register(candidate("alice@corp.com", "1111111111", "secret1"))
            .await
            .unwrap();

        // uniqueness is checked before password length here
        assert!(matches!(
            directory
                .administrator_add(candidate("alice@corp.com", "2222222222", "abc"))
                .await,
            Err(DirectoryError::EmailTaken)
        ));
        assert!(matches!(
            directory
                .administrator_add(candidate("bob@corp.com", "1111111111", "abc"))
                .await,
            Err(DirectoryError::PhoneTaken)
        ));

        // password length before phone format
        assert!(matches!(
            directory
                .administrator_add(candidate("bob@corp.com", "12ab", "abc"))
                .await,
            Err(DirectoryError::PasswordTooShort)
        ));
        assert!(matches!(
            directory
                .administrator_add(candidate("bob@corp.com", "12ab", "secret1"))
                .await,
            Err(DirectoryError::InvalidPhone)
        ));

        let mut form = candidate("bob@corp.com", "2222222222", "secret1");
        form.dob = Some("02/02/1990".to_string());
        assert!(matches!(
            directory.administrator_add(form).await,
            Err(DirectoryError::InvalidBirthDate)
        ));

        let mut form = candidate("bob@corp.com", "2222222222", "secret1");
        form.role = Some("root".to_string());
        assert!(matches!(
            directory.administrator_add(form).await,
            Err(DirectoryError::InvalidRole(role)) if role == "root"
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_values_wider_than_their_columns() {
        let (directory, store) = directory();

        let err = directory
            .register(candidate("alice@corp.com", &"1".repeat(16), "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::TooLong(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Phone number must be at most 15 characters long");

        let mut form = candidate("alice@corp.com", "1111111111", "secret1");
        form.first_name = Some("A".repeat(51));
        assert!(matches!(
            directory.register(form).await,
            Err(DirectoryError::TooLong(TooLong { field: "First name", .. }))
        ));

        let long_email = format!("{}@corp.com", "a".repeat(100 - "@corp.com".len() + 1));
        assert!(matches!(
            directory.register(candidate(&long_email, "1111111111", "secret1")).await,
            Err(DirectoryError::TooLong(TooLong { field: "Email", .. }))
        ));
        assert!(store.list().await.unwrap().is_empty());

        // exactly at the limits is fine
        let mut form = candidate("alice@corp.com", &"1".repeat(15), "secret1");
        form.last_name = Some("S".repeat(50));
        directory.register(form).await.unwrap();
    }

    #[tokio::test]
    async fn test_administrator_add_rejects_long_names() {
        let (directory, _) = directory();
        let mut form = candidate("bob@corp.com", "2222222222", "secret1");
        form.last_name = Some("J".repeat(51));
        assert!(matches!(
            directory.administrator_add(form).await,
            Err(DirectoryError::TooLong(TooLong { field: "Last name", .. }))
        ));
    }

    #[tokio::test]
    async fn test_administrator_add_defaults() {
        let (directory, _) = directory();
        let mut form = candidate("bob@corp.com", "2222222222", "secret1");
        form.role = None;

        let id = directory.administrator_add(form).await.unwrap();
        let user = directory.find(id).await.unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.dob, Some(today()));
    }

    #[tokio::test]
    async fn test_administrator_add_admin_role() {
        let (directory, _) = directory();
        let mut form = candidate("boss@corp.com", "2222222222", "secret1");
        form.role = Some("admin".to_string());
        form.dob = Some("1980-01-01".to_string());

        let id = directory.administrator_add(form).await.unwrap();
        let user = directory.find(id).await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.dob, NaiveDate::from_ymd_opt(1980, 1, 1));
    }

    #[tokio::test]
    async fn test_authenticate_failures_share_a_message() {
        let (directory, _) = directory();
        directory
            .register(candidate("alice@corp.com", "1111111111", "secret1"))
            .await
            .unwrap();

        let unknown = directory
            .authenticate("nobody@corp.com", "secret1")
            .await
            .unwrap_err();
        let wrong = directory
            .authenticate("alice@corp.com", "wrong-password")
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), "Invalid email or password");
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(wrong.kind(), ErrorKind::Authentication);

        assert!(matches!(
            directory.authenticate("", "").await,
            Err(DirectoryError::MissingCredentials)
        ));
    }

    #[tokio::test]
    async fn test_unknown_email_costs_a_password_check() {
        let (directory, _) = directory();
        directory
            .register(candidate("alice@corp.com", "1111111111", "secret1"))
            .await
            .unwrap();

        // first call also derives the dummy hash
        let _ = directory.authenticate("nobody@corp.com", "secret1").await;

        let mut known = Duration::MAX;
        let mut unknown = Duration::MAX;
        for _ in 0..3 {
            let start = Instant::now();
            let _ = directory.authenticate("alice@corp.com", "wrong-password").await;
            known = known.min(start.elapsed());

            let start = Instant::now();
            let _ = directory.authenticate("nobody@corp.com", "wrong-password").await;
            unknown = unknown.min(start.elapsed());
        }

        assert!(
            unknown * 5 > known,
            "unknown email took {unknown:?}, known email took {known:?}"
        );
    }

    #[tokio::test]
    async fn test_ensure_account_is_idempotent() {
        let (directory, store) = directory();
        let mut form = candidate("admin@corp.com", "0987654321", "adminpassword");
        form.role = Some("admin".to_string());

        assert!(directory.ensure_account(form.clone()).await.unwrap().is_some());
        assert!(directory.ensure_account(form).await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let (directory, _) = directory();
        let err = directory.delete(UserId(7)).await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(UserId(7))));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    /// Store whose lookups never see existing rows, so only the storage
    /// constraint can catch a duplicate.
    struct RacingStore(MemoryStore);

    #[async_trait]
    impl UserRepository for RacingStore {
        async fn insert(&self, user: NewUser) -> crate::repositories::RepoResult<User> {
            UserRepository::insert(&self.0, user).await
        }
        async fn find_by_id(&self, id: UserId) -> crate::repositories::RepoResult<Option<User>> {
            UserRepository::find_by_id(&self.0, id).await
        }
        async fn find_by_email(&self, _: &str) -> crate::repositories::RepoResult<Option<User>> {
            Ok(None)
        }
        async fn find_by_phone(&self, _: &str) -> crate::repositories::RepoResult<Option<User>> {
            Ok(None)
        }
        async fn list(&self) -> crate::repositories::RepoResult<Vec<User>> {
            UserRepository::list(&self.0).await
        }
        async fn delete(&self, id: UserId) -> crate::repositories::RepoResult<bool> {
            UserRepository::delete(&self.0, id).await
        }
    }

    #[tokio::test]
    async fn test_storage_constraint_backstops_the_precheck() {
        let directory = directory_over(Arc::new(RacingStore(MemoryStore::new())));
        directory
            .register(candidate("alice@corp.com", "1111111111", "secret1"))
            .await
            .unwrap();

        let err = directory
            .register(candidate("alice@corp.com", "2222222222", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::EmailTaken));
    }
}
