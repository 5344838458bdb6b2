mod auth_test;
mod channel_auth_test;
mod helpers;
mod rate_limit_test;
mod router_test;
mod users_test;
