/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 access and refresh tokens
/// - [`middleware`]: Bearer-token authentication and the `AuthContext` extractor
///
/// Authorization (who may touch which project) is a separate concern and
/// lives in `crate::permission`.
///
/// # Example
///
/// ```
/// use tasklane_shared::auth::jwt::{issue_token_pair, validate_access_token};
/// use tasklane_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let secret = "a-secret-of-at-least-thirty-two-bytes!!";
/// let tokens = issue_token_pair(Uuid::new_v4(), secret)?;
/// validate_access_token(&tokens.access_token, secret)?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
