pub mod payment;
pub mod referral_code;
pub mod user;

pub use payment::CommissionStatus;
pub use referral_code::DiscountType;
pub use user::UserRole;
