pub mod order;
pub mod question;
pub mod screenshot;
pub mod user;

pub use order::*;
pub use question::*;
pub use screenshot::*;
pub use user::*;
