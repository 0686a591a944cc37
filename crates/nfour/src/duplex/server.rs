//! Duplex server (C6): one accept loop plus, per connection, a reader task
//! that decodes frames and dispatches work, and a writer task that serializes
//! responses back onto the socket. Grounded on `duplex/srv.go`'s
//! `Startup`/`handleConnection`/`readConn`/`writeConn`.

use std::sync::Arc;

use gocc::{CountdownLatch, Semaphore, TokioSemaphore};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::error::NFourError;
use crate::framing::{read_header, read_payload, write_frame};

/// Boxed handler error, analogous to the source's plain `error` interface.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The request body handler: receives a decoded payload, returns the
/// response body or an error. Grounded on `nfour.Working`.
pub type Working = Arc<dyn Fn(Vec<u8>) -> Result<Vec<u8>, HandlerError> + Send + Sync>;

/// Maps a handler (or transport) error onto the bytes written back to the
/// peer. Grounded on `nfour.HandleError`.
pub type ErrorHandler = Arc<dyn Fn(&HandlerError) -> Vec<u8> + Send + Sync>;

struct WriteMsg {
    /// Mirrors `result.quickFailed`: true when the response was produced
    /// without ever acquiring a permit (an `ExceedConcurrent` reply), so
    /// the writer must not release one either.
    quick_failed: bool,
    seq_id: u64,
    body: Vec<u8>,
}

/// A running duplex server: owns the admission semaphore and the
/// request/error handlers shared by every accepted connection.
pub struct Server {
    config: ServerConfig,
    semaphore: Arc<TokioSemaphore>,
    working: Working,
    err_handle: ErrorHandler,
}

impl Server {
    pub fn new(working: Working, err_handle: ErrorHandler, config: ServerConfig) -> Arc<Self> {
        let semaphore = Arc::new(TokioSemaphore::new(config.concurrency));
        Arc::new(Self {
            config,
            semaphore,
            working,
            err_handle,
        })
    }

    /// Binds `addr` and accepts connections until the listener errors.
    pub async fn serve<A: ToSocketAddrs>(self: Arc<Self>, addr: A) -> Result<(), NFourError> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener).await
    }

    /// Accepts connections on an already-bound listener until it errors.
    /// Split out from `serve` so callers that need the ephemeral port a
    /// `:0` bind picked (tests, mainly) can read it before handing the
    /// listener off.
    pub async fn serve_listener(self: Arc<Self>, listener: TcpListener) -> Result<(), NFourError> {
        tracing::info!("listening, ready to accept connections");
        loop {
            let (stream, _peer) = listener.accept().await?;
            let server = self.clone();
            tokio::spawn(async move { server.handle_connection(stream).await });
        }
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream) {
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();
        let (tx, rx) = mpsc::channel::<WriteMsg>(self.config.concurrency as usize);
        let close = Arc::new(CountdownLatch::new(1));

        let reader = self.clone();
        let reader_close = close.clone();
        tokio::spawn(async move { reader.read_loop(read_half, tx, reader_close).await });

        let writer = self.clone();
        tokio::spawn(async move { writer.write_loop(write_half, rx, close).await });
    }

    async fn read_loop(
        &self,
        mut reader: OwnedReadHalf,
        tx: mpsc::Sender<WriteMsg>,
        close: Arc<CountdownLatch>,
    ) {
        tracing::debug!("start to read header info");
        loop {
            let header = match read_header(&mut reader, self.config.idle_timeout).await {
                Ok(h) => h,
                Err(NFourError::IdleTimeout) => continue,
                Err(e) => {
                    tracing::info!(error = %e, "read header error");
                    close.down();
                    break;
                }
            };

            let body =
                match read_payload(&mut reader, header.payload_len, self.config.read_timeout).await
                {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::info!(error = %e, need = header.payload_len, "read payload error");
                        close.down();
                        break;
                    }
                };

            if !self
                .semaphore
                .acquire_timeout(self.config.sema_wait_time)
                .await
            {
                let err: HandlerError = Box::new(NFourError::ExceedConcurrent);
                let body = (self.err_handle)(&err);
                if tx
                    .send(WriteMsg {
                        quick_failed: true,
                        seq_id: header.seq_id,
                        body,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
                continue;
            }

            let working = self.working.clone();
            let err_handle = self.err_handle.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                // `Working` is a plain sync closure that may block (the
                // source's handlers ran on their own goroutine); run it on
                // the blocking pool rather than tying up an async worker.
                let body = match tokio::task::spawn_blocking(move || working(body)).await {
                    Ok(Ok(b)) => b,
                    Ok(Err(e)) => err_handle(&e),
                    Err(_join_err) => {
                        let panicked: HandlerError = "handler panicked".into();
                        err_handle(&panicked)
                    }
                };
                let _ = tx
                    .send(WriteMsg {
                        quick_failed: false,
                        seq_id: header.seq_id,
                        body,
                    })
                    .await;
            });
        }
    }

    /// Writer owns the socket's close decision: it releases the permit a
    /// completed task held, once its response has actually been flushed.
    async fn write_loop(
        &self,
        mut writer: OwnedWriteHalf,
        mut rx: mpsc::Receiver<WriteMsg>,
        close: Arc<CountdownLatch>,
    ) {
        let mut write_failed = false;
        loop {
            tokio::select! {
                _ = close.wait() => {
                    break;
                }
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    if write_frame(&mut writer, msg.seq_id, &msg.body, self.config.write_timeout)
                        .await
                        .is_err()
                    {
                        write_failed = true;
                        close.down();
                        continue;
                    }
                    if !msg.quick_failed {
                        self.semaphore.release();
                    }
                }
            }
        }
        if !write_failed {
            let _ = tokio::io::AsyncWriteExt::shutdown(&mut writer).await;
        }
    }
}
