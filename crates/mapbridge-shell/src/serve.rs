// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON-lines call loop: one envelope per input line, one result per output
// line. Calls run concurrently, so results may come back out of order.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use mapbridge_core::types::CallResult;

use crate::shell::HostShell;

/// Pump envelopes from `input` through `shell` until EOF, then drain pending
/// calls. Stops reading early once `output` fails.
pub async fn serve<R, W>(shell: Arc<HostShell>, input: R, output: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<CallResult>();
    let writer = tokio::spawn(write_results(rx, output));

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if tx.is_closed() {
            warn!("result writer stopped; no longer reading calls");
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let shell = Arc::clone(&shell);
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = shell.handle_line(&line).await;
            // Only fails once the writer is gone, which `serve` reports.
            let _ = tx.send(result);
        });
    }
    drop(tx);

    info!("input closed; waiting for pending calls");
    writer
        .await
        .map_err(|e| io::Error::other(format!("writer task failed: {e}")))?
}

async fn write_results<W>(mut rx: mpsc::UnboundedReceiver<CallResult>, mut output: W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(result) = rx.recv().await {
        let mut line = match serde_json::to_string(&result) {
            Ok(line) => line,
            Err(e) => {
                error!(callback = %result.callback_id, "cannot encode result: {e}");
                continue;
            }
        };
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use mapbridge_core::BridgeConfig;
    use mapbridge_plugin::SdkBootstrap;
    use mapbridge_webview::stub::HeadlessBridge;
    use tokio::io::BufReader;

    fn shell() -> Arc<HostShell> {
        Arc::new(HostShell::start_with(
            BridgeConfig::default(),
            Arc::new(HeadlessBridge::new()),
            Arc::new(SdkBootstrap::new()),
        ))
    }

    const LOCATION_CALL: &str =
        r#"{"callbackId":"c1","pluginId":"KakaoMapPlugin","methodName":"getCurrentLocation"}"#;

    /// Output that refuses every write.
    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn answers_each_line_until_eof() {
        let input = format!("{LOCATION_CALL}\n\nnot json\n");
        let (output, mut read_back) = tokio::io::duplex(4096);

        serve(shell(), BufReader::new(input.as_bytes()), output)
            .await
            .expect("serve");

        let mut lines = BufReader::new(&mut read_back).lines();
        let mut results = Vec::new();
        while let Some(line) = lines.next_line().await.expect("read") {
            results.push(serde_json::from_str::<CallResult>(&line).expect("result"));
        }
        assert_eq!(results.len(), 2);
        let location = results.iter().find(|r| r.callback_id == "c1").expect("c1");
        assert!(location.success);
        assert!(results.iter().any(|r| !r.success && r.callback_id.is_empty()));
    }

    #[tokio::test]
    async fn stops_reading_when_output_fails() {
        let (mut feed, input) = tokio::io::duplex(4096);
        let task = tokio::spawn(serve(shell(), BufReader::new(input), BrokenPipe));

        // The input stays open; only the failed writer can end the loop.
        let stopped = tokio::time::timeout(Duration::from_secs(5), async {
            while !task.is_finished() {
                let line = format!("{LOCATION_CALL}\n");
                if feed.write_all(line.as_bytes()).await.is_err() {
                    // serve returned and dropped its end of the input.
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(stopped.is_ok(), "serve kept reading after the writer died");

        let err = task.await.expect("join").expect_err("writer error surfaces");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
