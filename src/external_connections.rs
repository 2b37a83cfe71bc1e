use sqlx::SqliteConnection;

/// Access to the external systems an operation may need to touch. Business logic
/// receives one of these rather than a concrete pool or client so driven adapters
/// can be swapped without the domain noticing
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
    fn http_client(&self) -> &reqwest_middleware::ClientWithMiddleware;
}

/// A handle which can lend out an active database connection
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut SqliteConnection;
}
