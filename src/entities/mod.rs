pub mod promotion_details;
pub mod promotion_usage;
pub mod promotions;

pub use promotion_details as promotion_detail_entity;
pub use promotion_usage as promotion_usage_entity;
pub use promotions as promotion_entity;
pub use promotions::{DiscountType, PromotionStatus, PromotionType};
