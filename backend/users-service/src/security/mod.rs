pub mod jwt;
pub mod password;

pub use jwt::{password_version, Claims, JwtManager, TokenError};
pub use password::{hash_password, verify_password, PasswordError};
