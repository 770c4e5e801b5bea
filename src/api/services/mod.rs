pub mod analytics;
pub mod health;
pub mod redirect;
pub mod shorten;

pub use analytics::{get_analytics, get_click_history};
pub use health::{healthz, readyz};
pub use redirect::redirect;
pub use shorten::shorten;
