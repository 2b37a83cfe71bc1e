//! End-to-end tests running the real router and the real relational adapter
//! against throwaway in-memory SQLite databases.

mod client_scenarios;
mod task_api;
mod test_util;
mod user_api;
