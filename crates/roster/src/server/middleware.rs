//! Request logging middleware.

use std::time::Instant;

use tide::{Middleware, Next, Request};
use tracing::info;

/// Logs method, path, status and elapsed time for every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogger;

#[async_trait::async_trait]
impl<S: Clone + Send + Sync + 'static> Middleware<S> for RequestLogger {
    async fn handle(&self, req: Request<S>, next: Next<'_, S>) -> tide::Result {
        let method = req.method();
        let path = req.url().path().to_string();
        let start = Instant::now();

        let res = next.run(req).await;

        info!(
            method = %method,
            path = %path,
            status = u16::from(res.status()),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request"
        );
        Ok(res)
    }
}
