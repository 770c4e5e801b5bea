pub mod url;
pub mod url_click;

pub use url::Entity as UrlEntity;
pub use url_click::Entity as UrlClickEntity;
