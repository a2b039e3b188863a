mod base_url_extractor;
mod validation_extractor;

pub use base_url_extractor::*;
pub use validation_extractor::*;
