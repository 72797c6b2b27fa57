pub mod promotion;
pub mod promotion_detail;
pub mod promotion_usage;

pub use promotion::promotion_config;
pub use promotion_detail::promotion_detail_config;
pub use promotion_usage::promotion_usage_config;
