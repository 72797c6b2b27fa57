pub mod detail_resolver;
pub mod discount_calculator;
pub mod promotion_detail_service;
pub mod promotion_service;
pub mod promotion_usage_service;
pub mod redemption_ledger;
pub mod validation_engine;

pub use detail_resolver::*;
pub use discount_calculator::*;
pub use promotion_detail_service::*;
pub use promotion_service::*;
pub use promotion_usage_service::*;
pub use redemption_ledger::*;
pub use validation_engine::*;
