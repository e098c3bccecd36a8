mod property_chunked;
pub(crate) mod utils;
