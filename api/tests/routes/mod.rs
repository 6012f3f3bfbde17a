mod analysis_test;
mod auth_test;
mod health_test;
mod sessions_test;
