//! User store. All account creation goes through here so password hashing
//! is never bypassed.

use diesel::prelude::*;

use crate::auth::hash_password;
use crate::models::{NewUser, User};
use crate::schema::users;

#[derive(Debug)]
pub enum CreateUserError {
    EmptyEmail,
    DuplicateEmail,
    Hashing,
    Database(diesel::result::Error),
}

/// Lowercase the domain part of an email address, leaving the local part as
/// submitted.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Create a user with default flags (active, not staff, not superuser).
pub fn create_user(
    conn: &mut PgConnection,
    email: &str,
    password: &str,
    name: &str,
) -> Result<User, CreateUserError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CreateUserError::EmptyEmail);
    }
    let email = normalize_email(email);

    let password_hash = hash_password(password).map_err(|_| CreateUserError::Hashing)?;

    diesel::insert_into(users::table)
        .values(&NewUser {
            email: &email,
            name,
            password_hash: &password_hash,
        })
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(|e| match e {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => CreateUserError::DuplicateEmail,
            other => CreateUserError::Database(other),
        })
}

/// Create a user with is_staff and is_superuser set to true.
pub fn create_superuser(
    conn: &mut PgConnection,
    email: &str,
    password: &str,
) -> Result<User, CreateUserError> {
    let user = create_user(conn, email, password, "")?;

    diesel::update(users::table.find(user.id))
        .set((users::is_staff.eq(true), users::is_superuser.eq(true)))
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(CreateUserError::Database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_lowercases_domain() {
        assert_eq!(normalize_email("test@TEST.COM"), "test@test.com");
    }

    #[test]
    fn test_normalize_email_keeps_local_part() {
        assert_eq!(normalize_email("Test@Example.Com"), "Test@example.com");
    }

    #[test]
    fn test_normalize_email_without_at_sign() {
        assert_eq!(normalize_email("not-an-email"), "not-an-email");
    }
}
