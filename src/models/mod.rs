mod livestream;
mod user;

pub use livestream::*;
pub use user::*;
