//! Configuration module

mod site;

pub use site::ApiConfig;
pub use site::DetailConfig;
pub use site::ListingConfig;
pub use site::SiteConfig;
pub use site::DEFAULT_REVALIDATE;
