//! Configuration module

mod site;

pub use site::ContactConfig;
pub use site::Experience;
pub use site::HomeConfig;
pub use site::LinkItem;
pub use site::SiteConfig;
