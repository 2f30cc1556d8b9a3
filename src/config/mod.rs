//! Configuration module

mod site;

pub use site::Fallback;
pub use site::HighlightConfig;
pub use site::SiteConfig;
