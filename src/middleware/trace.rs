//! Per-request access logging.

use std::time::Instant;

use tracing::info;

use super::{Middleware, Next};
use crate::handler::ReplyFuture;
use crate::request::Request;
use crate::response::Reply;

/// Emits one `info` event per request with method, path, status and latency.
///
/// Errors are logged with the status they will be answered with; the cause
/// of a server-side failure is logged separately by the app.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> ReplyFuture<'a> {
        Box::pin(async move {
            let method = req.method().clone();
            let path = req.path().to_owned();
            let started = Instant::now();

            let result = next.run(req).await;

            let status = match &result {
                Ok(Reply::Finished(res)) => res.status_code(),
                Ok(Reply::Negotiable(neg)) => neg.status_code(),
                Err(err) => err.status(),
            };
            let latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            info!(%method, %path, status = status.as_u16(), latency_us, "request");
            result
        })
    }
}
