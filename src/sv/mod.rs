pub mod payment;
pub mod referral;
#[cfg(test)]
pub mod test_utils;
pub mod user;

pub use payment::Payment;
pub use referral::Referral;
pub use user::User;
