pub mod blob_driven_ports;
pub mod db_task_driven_ports;
pub mod db_user_driven_ports;
pub mod rest_driven_ports;

use crate::external_connections;
use crate::external_connections::ConnectionHandle;
use anyhow::{Context, anyhow};
use reqwest_middleware::ClientBuilder;
use reqwest_tracing::TracingMiddleware;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

/// Data structure which owns clients for connecting to external systems.
/// Allows business logic to be agnostic of the external systems it communicates with
/// so driven adapters can easily be swapped out for other implementations
#[derive(Clone)]
pub struct ExternalConnectivity {
    db: Option<SqlitePool>,
    http_client: reqwest_middleware::ClientWithMiddleware,
}

impl ExternalConnectivity {
    /// Constructs connectivity backed by the given database pool plus an outbound HTTP client
    pub fn new(db: SqlitePool) -> Self {
        ExternalConnectivity {
            db: Some(db),
            http_client: build_http_client(),
        }
    }

    /// Connectivity for backends which never touch the local database (the hosted API
    /// and in-memory adapters). Asking it for a database connection is an error.
    pub fn without_database() -> Self {
        ExternalConnectivity {
            db: None,
            http_client: build_http_client(),
        }
    }

    /// Releases the database pool, letting in-flight statements finish first
    pub async fn close(&self) {
        if let Some(ref db) = self.db {
            db.close().await;
        }
    }
}

fn build_http_client() -> reqwest_middleware::ClientWithMiddleware {
    let base_client = reqwest::Client::builder()
        .use_rustls_tls()
        .build()
        .expect("default reqwest client failed to construct");
    ClientBuilder::new(base_client)
        .with(TracingMiddleware::default())
        .build()
}

/// A handle from ExternalConnectivity which can connect to a database
pub struct PoolConnectionHandle {
    active_connection: PoolConnection<Sqlite>,
}

impl ConnectionHandle for PoolConnectionHandle {
    fn borrow_connection(&mut self) -> &mut SqliteConnection {
        &mut self.active_connection
    }
}

impl external_connections::ExternalConnectivity for ExternalConnectivity {
    type DbHandle<'cxn_borrow> = PoolConnectionHandle;

    async fn database_cxn(&mut self) -> Result<PoolConnectionHandle, anyhow::Error> {
        let pool = self
            .db
            .as_ref()
            .ok_or_else(|| anyhow!("this backend is not configured with a database"))?;
        let handle = PoolConnectionHandle {
            active_connection: pool.acquire().await.context("acquiring a pool connection")?,
        };

        Ok(handle)
    }

    fn http_client(&self) -> &reqwest_middleware::ClientWithMiddleware {
        &self.http_client
    }
}
