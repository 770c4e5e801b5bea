pub mod code_generator;
pub mod ip;
pub mod url_validator;

pub use code_generator::{ALPHABET, CodeGenerator, RandomCodeGenerator};
pub use ip::client_ip;
pub use url_validator::{UrlValidationError, validate_url};
