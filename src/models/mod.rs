pub mod caller;
pub mod common;
pub mod discount;
pub mod pagination;
pub mod promotion;
pub mod promotion_detail;
pub mod promotion_usage;
pub mod validation;

pub use caller::*;
pub use common::*;
pub use discount::*;
pub use pagination::*;
pub use promotion::*;
pub use promotion_detail::*;
pub use promotion_usage::*;
pub use validation::*;
