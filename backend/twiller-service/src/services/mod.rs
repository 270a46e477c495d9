pub mod device_access;
pub mod email;
pub mod tokens;

pub use email::EmailService;
