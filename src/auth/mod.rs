pub mod google;
pub mod jwt;

pub use google::{GoogleProfile, GoogleVerifier};
pub use jwt::JwtService;
