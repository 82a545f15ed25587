//! Connection setup for one side of the migration.

use std::time::{Duration, Instant};

use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{MigrateError, Result, Side};

/// Open a single connection and verify it answers a ping, all within
/// `timeout`.
pub async fn connect(config: &DatabaseConfig, side: Side, timeout: Duration) -> Result<Conn> {
    let opts = OptsBuilder::default()
        .ip_or_hostname(config.host.clone())
        .tcp_port(config.port)
        .user(Some(config.username.clone()))
        .pass(Some(config.password.clone()))
        .db_name(Some(config.database.clone()))
        .init(vec!["SET NAMES utf8mb4"]);

    let setup = async {
        let mut conn = Conn::new(opts)
            .await
            .map_err(|e| MigrateError::connection(side, e))?;
        conn.ping()
            .await
            .map_err(|e| MigrateError::connection(side, format!("ping failed: {}", e)))?;
        Ok::<_, MigrateError>(conn)
    };

    let conn = tokio::time::timeout(timeout, setup).await.map_err(|_| {
        MigrateError::connection(
            side,
            format!(
                "no connection to {} within {}s",
                config.display_target(),
                timeout.as_secs()
            ),
        )
    })??;

    let target = config.display_target();
    info!("Connected to {} database: {}", side, target);
    Ok(conn)
}

/// Outcome of probing one side.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConnectionProbe {
    pub connected: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Connect, ping and disconnect, recording latency instead of failing.
pub async fn probe(config: &DatabaseConfig, side: Side, timeout: Duration) -> ConnectionProbe {
    let start = Instant::now();
    let result = match connect(config, side, timeout).await {
        Ok(mut conn) => {
            let ping = conn.query_drop("SELECT 1").await;
            let _ = conn.disconnect().await;
            ping.map_err(|e| MigrateError::connection(side, e))
        }
        Err(e) => Err(e),
    };
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => ConnectionProbe {
            connected: true,
            latency_ms,
            error: None,
        },
        Err(e) => ConnectionProbe {
            connected: false,
            latency_ms,
            error: Some(e.to_string()),
        },
    }
}
