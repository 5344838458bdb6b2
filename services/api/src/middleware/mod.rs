pub mod api_key;
pub mod rate_limit;
