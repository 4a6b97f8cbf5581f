/// Authentication module
///
/// Password hashing, access/refresh token issuing, the session lifecycle
/// and the gate that resolves an access token to an account.

mod claims;
mod gate;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::{Claims, TokenKind};
pub use gate::{select_access_token, AuthGate, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use jwt::TokenIssuer;
pub use password::{hash_password, verify_password, PASSWORD_HASH_COST};
pub use refresh_token::{hash_token, matches_stored};
pub use session::{
    Credentials, LoginOutcome, Registration, RegistrationInput, SessionManager, TokenPair,
};
