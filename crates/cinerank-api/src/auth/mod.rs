//! Authentication and authorization module
//!
//! - Token generation and validation
//! - Password hashing with Argon2
//! - Stored-session revocation
//! - Middleware for request authentication
//! - Auth cookies
//! - Authentication service for registration, login, refresh and logout

pub mod cookies;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;
pub mod session;

pub use jwt::{Claims, IdentityClaims, JwtError, TokenPair, TokenService};
pub use middleware::{auth_middleware, AuthError, AuthenticatedUser};
pub use password::{hash_password_with_config, verify_password, PasswordConfig, PasswordError};
pub use service::{AuthService, LoginRequest, LoginResponse, RegisterRequest};
pub use session::SessionStore;
