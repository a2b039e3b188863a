pub mod header_utils;
pub mod m3u_utils;
pub mod merge_utils;
pub mod rewrite_utils;
