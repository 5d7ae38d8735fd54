use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{UserCreate, UserUpdate};
use super::repo::{UniqueViolation, UserRepository};
use super::repo_types::{NewUser, User, UserChanges};
use crate::{
    auth::password::{hash_password, verify_password},
    config::SuperuserConfig,
    error::AppError,
};

pub const NAME_MAX_LEN: usize = 32;
const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 40;

pub const NAME_TAKEN: &str = "User with this name already exists";
pub const EMAIL_TAKEN: &str = "User with this email already exists";

/// Names shadowed by fixed `/users/...` routes.
const RESERVED_NAMES: [&str; 2] = ["me", "signup"];

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name", "name must not be empty"));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(AppError::validation(
            "name",
            format!("name must be at most {NAME_MAX_LEN} characters"),
        ));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(AppError::validation("name", format!("name '{name}' is reserved")));
    }
    Ok(())
}

/// Emails are stored trimmed and lowercased so one mailbox maps to one account.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn validate_email(email: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::validation("email", "value is not a valid email address"));
    }
    Ok(())
}

pub(crate) fn validate_password(field: &str, password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(AppError::validation(
            field,
            format!(
                "password must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"
            ),
        ));
    }
    Ok(())
}

/// Rejects a name or email already held by a row other than `except`.
/// Check-then-act: the table's unique constraints catch what slips between the check and the write.
pub async fn ensure_unique(
    repo: &dyn UserRepository,
    name: Option<&str>,
    email: Option<&str>,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    if let Some(name) = name {
        if let Some(existing) = repo.find_by_name(name).await? {
            if Some(existing.id) != except {
                warn!(%name, "name already taken");
                return Err(AppError::Conflict(NAME_TAKEN.into()));
            }
        }
    }
    if let Some(email) = email {
        if let Some(existing) = repo.find_by_email(email).await? {
            if Some(existing.id) != except {
                warn!(%email, "email already taken");
                return Err(AppError::Conflict(EMAIL_TAKEN.into()));
            }
        }
    }
    Ok(())
}

fn conflict_or_internal(e: anyhow::Error) -> AppError {
    match e.downcast_ref::<UniqueViolation>() {
        Some(UniqueViolation("name")) => AppError::Conflict(NAME_TAKEN.into()),
        Some(UniqueViolation(_)) => AppError::Conflict(EMAIL_TAKEN.into()),
        None => AppError::Internal(e),
    }
}

pub async fn create_user(repo: &dyn UserRepository, input: UserCreate) -> Result<User, AppError> {
    let name = input.name.trim().to_string();
    let email = normalize_email(&input.email);
    validate_name(&name)?;
    validate_email(&email)?;
    validate_password("password", &input.password)?;

    ensure_unique(repo, Some(&name), Some(&email), None).await?;

    let password_hash = hash_password(&input.password)?;
    let user = repo
        .create(NewUser {
            name,
            email,
            password_hash,
            is_active: input.is_active,
            is_superuser: input.is_superuser,
        })
        .await
        .map_err(conflict_or_internal)?;

    info!(user_id = %user.id, name = %user.name, superuser = user.is_superuser, "user created");
    Ok(user)
}

/// Applies a partial update to `user`, rehashing the password when one is given.
pub async fn update_user(
    repo: &dyn UserRepository,
    user: &User,
    input: UserUpdate,
) -> Result<User, AppError> {
    let name = input.name.map(|n| n.trim().to_string());
    let email = input.email.as_deref().map(normalize_email);
    if let Some(name) = &name {
        validate_name(name)?;
    }
    if let Some(email) = &email {
        validate_email(email)?;
    }
    if let Some(password) = &input.password {
        validate_password("password", password)?;
    }

    // email is checked before name here, unlike creation
    ensure_unique(repo, None, email.as_deref(), Some(user.id)).await?;
    ensure_unique(repo, name.as_deref(), None, Some(user.id)).await?;

    let password_hash = input.password.as_deref().map(hash_password).transpose()?;
    let changes = UserChanges {
        name,
        email,
        password_hash,
        is_active: input.is_active,
        is_superuser: input.is_superuser,
    };
    if changes.is_empty() {
        return Ok(user.clone());
    }

    let updated = repo
        .update(user.id, changes)
        .await
        .map_err(conflict_or_internal)?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!(user_id = %updated.id, "user updated");
    Ok(updated)
}

pub async fn change_password(
    repo: &dyn UserRepository,
    user: &User,
    current_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    validate_password("new_password", new_password)?;
    if !verify_password(current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(AppError::BadRequest("Incorrect password".into()));
    }
    if current_password == new_password {
        return Err(AppError::BadRequest(
            "New password cannot be the same as the current one".into(),
        ));
    }

    let changes = UserChanges {
        password_hash: Some(hash_password(new_password)?),
        ..Default::default()
    };
    repo.update(user.id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!(user_id = %user.id, "password changed");
    Ok(())
}

/// Returns the user when `name` exists and `password` matches its hash.
pub async fn authenticate(
    repo: &dyn UserRepository,
    name: &str,
    password: &str,
) -> anyhow::Result<Option<User>> {
    let Some(user) = repo.find_by_name(name).await? else {
        return Ok(None);
    };
    if !verify_password(password, &user.password_hash)? {
        return Ok(None);
    }
    Ok(Some(user))
}

pub async fn delete_user(
    repo: &dyn UserRepository,
    actor: &User,
    target: &User,
) -> Result<(), AppError> {
    if target.is_superuser && actor.id == target.id {
        warn!(user_id = %actor.id, "superuser tried to delete themselves");
        return Err(AppError::Forbidden(
            "Super users are not allowed to delete themselves".into(),
        ));
    }
    if !repo.delete(target.id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(user_id = %target.id, by = %actor.id, "user deleted");
    Ok(())
}

/// Creates the configured superuser unless a user with that name exists.
pub async fn ensure_first_superuser(
    repo: &dyn UserRepository,
    cfg: &SuperuserConfig,
) -> anyhow::Result<()> {
    if repo.find_by_name(&cfg.name).await?.is_some() {
        return Ok(());
    }
    let input = UserCreate {
        name: cfg.name.clone(),
        email: cfg.email.clone(),
        password: cfg.password.clone(),
        is_active: true,
        is_superuser: true,
    };
    create_user(repo, input)
        .await
        .with_context(|| format!("bootstrap superuser {}", cfg.name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::MemoryUserRepository;

    fn input(name: &str, email: &str) -> UserCreate {
        UserCreate {
            name: name.into(),
            email: email.into(),
            password: "changethis123".into(),
            is_active: true,
            is_superuser: false,
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("kiana@st-freya.edu"));
        assert!(!is_valid_email("kiana"));
        assert!(!is_valid_email("kiana@localhost"));
        assert!(!is_valid_email("ki ana@x.io"));
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("mei").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(NAME_MAX_LEN + 1)).is_err());
        assert!(matches!(validate_name("me"), Err(AppError::Validation { .. })));
        assert!(matches!(validate_name("signup"), Err(AppError::Validation { .. })));
        assert!(validate_name("meiko").is_ok());
    }

    #[tokio::test]
    async fn email_is_stored_lowercased() {
        let repo = MemoryUserRepository::default();
        let user = create_user(&repo, input("kiana", "  Kiana@Example.COM ")).await.unwrap();
        assert_eq!(user.email, "kiana@example.com");
    }

    #[tokio::test]
    async fn email_differing_only_in_case_conflicts() {
        let repo = MemoryUserRepository::default();
        create_user(&repo, input("kiana", "kiana@example.com")).await.unwrap();
        let err = create_user(&repo, input("kiana2", "KIANA@EXAMPLE.COM")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == EMAIL_TAKEN));

        let other = create_user(&repo, input("mei", "mei@example.com")).await.unwrap();
        let update = UserUpdate {
            email: Some("Kiana@Example.com".into()),
            ..Default::default()
        };
        let err = update_user(&repo, &other, update).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == EMAIL_TAKEN));
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn create_hashes_password() {
        let repo = MemoryUserRepository::default();
        let user = create_user(&repo, input("mei", "mei@x.io")).await.unwrap();
        assert_ne!(user.password_hash, "changethis123");
        assert!(verify_password("changethis123", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_name_or_email_conflicts_without_new_row() {
        let repo = MemoryUserRepository::default();
        create_user(&repo, input("mei", "mei@x.io")).await.unwrap();

        let err = create_user(&repo, input("mei", "other@x.io")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == NAME_TAKEN));

        let err = create_user(&repo, input("bronya", "mei@x.io")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == EMAIL_TAKEN));

        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn store_level_violation_maps_to_conflict() {
        let repo = MemoryUserRepository::default();
        create_user(&repo, input("mei", "mei@x.io")).await.unwrap();
        let raced = repo
            .create(NewUser {
                name: "mei".into(),
                email: "fresh@x.io".into(),
                password_hash: "h".into(),
                is_active: true,
                is_superuser: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            conflict_or_internal(raced),
            AppError::Conflict(ref m) if m == NAME_TAKEN
        ));
    }

    #[tokio::test]
    async fn update_allows_keeping_own_name_and_email() {
        let repo = MemoryUserRepository::default();
        let user = create_user(&repo, input("mei", "mei@x.io")).await.unwrap();
        let update = UserUpdate {
            name: Some("mei".into()),
            email: Some("mei@x.io".into()),
            ..Default::default()
        };
        let updated = update_user(&repo, &user, update).await.unwrap();
        assert_eq!(updated.name, "mei");
    }

    #[tokio::test]
    async fn update_rejects_taken_email() {
        let repo = MemoryUserRepository::default();
        let user = create_user(&repo, input("mei", "mei@x.io")).await.unwrap();
        create_user(&repo, input("bronya", "bronya@x.io")).await.unwrap();
        let update = UserUpdate {
            email: Some("bronya@x.io".into()),
            ..Default::default()
        };
        let err = update_user(&repo, &user, update).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == EMAIL_TAKEN));
    }

    #[tokio::test]
    async fn password_update_rehashes() {
        let repo = MemoryUserRepository::default();
        let user = create_user(&repo, input("mei", "mei@x.io")).await.unwrap();
        let update = UserUpdate {
            password: Some("brand-new-pass".into()),
            ..Default::default()
        };
        update_user(&repo, &user, update).await.unwrap();

        assert!(authenticate(&repo, "mei", "brand-new-pass").await.unwrap().is_some());
        assert!(authenticate(&repo, "mei", "changethis123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn change_password_checks_current_and_difference() {
        let repo = MemoryUserRepository::default();
        let user = create_user(&repo, input("mei", "mei@x.io")).await.unwrap();

        let err = change_password(&repo, &user, "wrong-password", "brand-new-pass")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Incorrect password"));

        let err = change_password(&repo, &user, "changethis123", "changethis123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        change_password(&repo, &user, "changethis123", "brand-new-pass").await.unwrap();
        assert!(authenticate(&repo, "mei", "brand-new-pass").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn short_new_password_fails_validation_before_current_check() {
        let repo = MemoryUserRepository::default();
        let user = create_user(&repo, input("mei", "mei@x.io")).await.unwrap();

        let err = change_password(&repo, &user, "wrong-password", "x").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "new_password"));
        assert!(authenticate(&repo, "mei", "changethis123").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn superuser_cannot_delete_self() {
        let repo = MemoryUserRepository::default();
        let mut admin_in = input("admin", "admin@x.io");
        admin_in.is_superuser = true;
        let admin = create_user(&repo, admin_in).await.unwrap();
        let other = create_user(&repo, input("mei", "mei@x.io")).await.unwrap();

        let err = delete_user(&repo, &admin, &admin).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        delete_user(&repo, &admin, &other).await.unwrap();
        assert!(repo.find_by_name("mei").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let repo = MemoryUserRepository::default();
        let cfg = SuperuserConfig {
            name: "admin".into(),
            email: "admin@x.io".into(),
            password: "changethis123".into(),
        };
        ensure_first_superuser(&repo, &cfg).await.unwrap();
        ensure_first_superuser(&repo, &cfg).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.find_by_name("admin").await.unwrap().unwrap().is_superuser);
    }

    #[tokio::test]
    async fn bootstrap_failure_keeps_source_chain() {
        let repo = MemoryUserRepository::default();
        let cfg = SuperuserConfig {
            name: "admin".into(),
            email: "not-an-email".into(),
            password: "changethis123".into(),
        };
        let err = ensure_first_superuser(&repo, &cfg).await.unwrap_err();
        assert_eq!(err.to_string(), "bootstrap superuser admin");
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::Validation { field, .. }) if field == "email"
        ));
    }
}
