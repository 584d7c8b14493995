//! Receive task
//!
//! One task per live connection reads raw chunks from the read half,
//! frames them into lines, and hands each line to the router before
//! resuming reads, so correlation always sees lines in receipt order.

use crate::client::Inner;
use crate::router;
use cvx_core::LineSplitter;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::watch;

/// Run the receive loop for one connection.
///
/// Terminates on a zero-length read (peer closed), a read error, or a
/// stop signal from `close()`. On exit it tears down the connection slot
/// so the next command reconnects lazily, unless a newer connection
/// (higher generation) has already replaced this one.
pub(crate) async fn receive_loop(
    inner: Arc<Inner>,
    mut read_half: OwnedReadHalf,
    mut stop: watch::Receiver<bool>,
    generation: u64,
) {
    let mut buf = [0u8; 1024];
    let mut splitter = LineSplitter::new();

    loop {
        tokio::select! {
            result = read_half.read(&mut buf) => match result {
                Ok(0) => {
                    log::debug!("peer closed the connection");
                    break;
                }
                Ok(n) => {
                    for line in splitter.feed(&buf[..n]) {
                        router::route_line(&inner, line);
                    }
                }
                Err(e) => {
                    log::error!("read failed: {e}");
                    break;
                }
            },
            _ = stop.changed() => break,
        }
    }

    inner.teardown(generation).await;
}
