//! Configuration module

mod site;

pub use site::ContactConfig;
pub use site::RateLimitConfig;
pub use site::ServerConfig;
pub use site::SiteConfig;
