//! Remote structured-log sink.
//!
//! Records are queued on a bounded channel and POSTed one by one to the
//! configured endpoint by a background task, so the request path never
//! waits on log delivery. When the queue is full the record is dropped and
//! the write reports [`SinkError::QueueFull`].

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use url::Url;

use crate::logging::sink::{LogSink, SinkError};

/// HTTP sink that ships each record as a JSON request body.
pub struct RemoteSink {
    sender: mpsc::Sender<String>,
}

impl RemoteSink {
    /// Create the sink and spawn its delivery task on the current runtime.
    ///
    /// The task ends once every `RemoteSink` clone is dropped and the queue
    /// has drained.
    pub fn spawn(endpoint: Url, queue: usize, client: Client) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<String>(queue.max(1));

        let handle = tokio::spawn(async move {
            while let Some(line) = receiver.recv().await {
                let result = client
                    .post(endpoint.clone())
                    .header(CONTENT_TYPE, "application/json")
                    .body(line)
                    .send()
                    .await;

                match result {
                    Ok(resp) if !resp.status().is_success() => {
                        tracing::warn!(
                            endpoint = %endpoint,
                            status = %resp.status(),
                            "Remote log sink rejected record"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(endpoint = %endpoint, error = %e, "Remote log delivery failed");
                    }
                }
            }
            tracing::debug!(endpoint = %endpoint, "Remote log sink stopped");
        });

        (Self { sender }, handle)
    }
}

/// Wait for a delivery task to flush its queue.
///
/// Every `RemoteSink` feeding the task must already be dropped, otherwise
/// the task keeps waiting for records until `timeout`. Returns `false` if
/// the queue did not drain in time; the undelivered records are lost.
pub async fn drain(handle: JoinHandle<()>, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(())) => {
            tracing::info!("Remote log sink drained");
            true
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Remote log sink task failed");
            false
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Timed out draining remote log sink, queued records dropped"
            );
            false
        }
    }
}

impl LogSink for RemoteSink {
    fn write(&self, line: &str) -> Result<(), SinkError> {
        self.sender.try_send(line.to_string()).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::QueueFull,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_remote_sink_posts_record() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                if text.contains("\r\n\r\n") && text.ends_with('}') {
                    break;
                }
            }
            let _ = seen_tx.send(String::from_utf8_lossy(&buf).into_owned());
            let _ = socket
                .write_all(b"HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n")
                .await;
        });

        let endpoint: Url = format!("http://{}/ingest", addr).parse().unwrap();
        let (sink, _handle) = RemoteSink::spawn(endpoint, 8, Client::new());
        sink.write(r#"{"log_type":"REQUEST"}"#).unwrap();

        let raw = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(raw.starts_with("POST /ingest"));
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.ends_with(r#"{"log_type":"REQUEST"}"#));
    }

    #[tokio::test]
    async fn test_drain_delivers_queued_records() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    let text = String::from_utf8_lossy(&buf);
                    if text.contains("\r\n\r\n") && text.ends_with('}') {
                        break;
                    }
                }
                let _ = seen_tx.send(String::from_utf8_lossy(&buf).into_owned());
                let _ = socket
                    .write_all(b"HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n")
                    .await;
            }
        });

        let endpoint: Url = format!("http://{}/ingest", addr).parse().unwrap();
        let client = Client::builder().no_proxy().build().unwrap();
        let (sink, handle) = RemoteSink::spawn(endpoint, 8, client);
        for n in 0..3 {
            sink.write(&format!(r#"{{"n":{}}}"#, n)).unwrap();
        }
        drop(sink);

        assert!(drain(handle, Duration::from_secs(5)).await);
        for n in 0..3 {
            let raw = seen_rx.try_recv().unwrap();
            assert!(raw.ends_with(&format!(r#"{{"n":{}}}"#, n)));
        }
    }

    #[tokio::test]
    async fn test_drain_times_out_while_sink_is_alive() {
        let endpoint: Url = "http://127.0.0.1:9/".parse().unwrap();
        let (_sink, handle) = RemoteSink::spawn(endpoint, 1, Client::new());

        assert!(!drain(handle, Duration::from_millis(50)).await);
    }

    #[tokio::test]
    async fn test_write_after_task_exit_reports_closed() {
        let endpoint: Url = "http://127.0.0.1:9/".parse().unwrap();
        let (sink, handle) = RemoteSink::spawn(endpoint, 1, Client::new());
        handle.abort();
        let _ = handle.await;

        assert!(matches!(sink.write("{}"), Err(SinkError::Closed)));
    }
}
