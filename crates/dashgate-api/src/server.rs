// Dashgate
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! HTTP server implementation using Hyper

use crate::auth::{Argon2Hasher, PasswordHasher};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::router::{AppState, Router};
use crate::user_management::{MemoryUserStore, UserStore};
use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// API server using Hyper
pub struct ApiServer {
    bind_address: SocketAddr,
    router: Router,
}

impl ApiServer {
    /// Create a new API server backed by the in-memory store
    pub async fn new(config: Config) -> ApiResult<Self> {
        Self::with_store(config, Arc::new(MemoryUserStore::new())).await
    }

    /// Create a new API server over the given credential store
    pub async fn with_store(config: Config, store: Arc<dyn UserStore>) -> ApiResult<Self> {
        // Parse bind address
        let bind_address: SocketAddr = config.bind_address.parse().map_err(|e| ApiError::Configuration {
            message: format!("Invalid bind address: {}", e),
        })?;

        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new(config.hash_cost)?);
        let seed_admin = config.seed_admin.clone();

        let state = Arc::new(AppState::new(config, store, hasher)?);

        if let Some(seed) = seed_admin {
            match state.users.seed_super_admin(&seed.email, &seed.password, seed.name.as_deref()).await? {
                Some(user) => info!("Created initial super_admin {}", user.email),
                None => info!("Users already exist, skipping super_admin seed"),
            }
        } else if state.store.count().await? == 0 {
            warn!("Credential store is empty and no seed admin is configured; nobody can log in");
        }

        info!("API server created successfully");

        Ok(Self {
            bind_address,
            router: Router::new(state),
        })
    }

    /// Get the bind address
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Start the server
    pub async fn run(self) -> ApiResult<()> {
        let listener = TcpListener::bind(self.bind_address).await?;

        info!("Dashgate API listening on http://{}", self.bind_address);

        // Accept connections
        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let io = TokioIo::new(stream);
            let router = self.router.clone();

            // Spawn a task to handle the connection
            tokio::task::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let router = router.clone();
                    async move { Ok::<_, Infallible>(router.route(req, Some(remote_addr)).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}
