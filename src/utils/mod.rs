pub mod code;
pub mod jwt;

pub use code::*;
pub use jwt::*;
