//! Duplex client transport (C7): a single TCP connection shared by every
//! caller, with a sender task that serializes writes and a reader task that
//! demultiplexes responses back to their waiting caller by sequence id.
//! Grounded on `duplex/trans.go`'s `Trans`/`asyncSender`/`asyncReader`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use gocc::{CountdownLatch, Semaphore, TokioSemaphore};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, Mutex, Notify};

use crate::config::{ReqTimeout, TransportConfig};
use crate::error::NFourError;
use crate::framing::{read_header, read_payload, write_frame};

struct SendingTask {
    seq_id: u64,
    payload: Vec<u8>,
    write_timeout: Duration,
}

/// A single in-flight request's completion slot, local to this module the
/// way the source's file-private `future` struct is local to `trans.go` —
/// distinct from `gocc::Future`, which is bound to `GoccError` rather than
/// this transport's own error type.
struct PendingRequest {
    notify: Notify,
    done: AtomicBool,
    slot: Mutex<Option<Result<Vec<u8>, NFourError>>>,
}

impl PendingRequest {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            notify: Notify::new(),
            done: AtomicBool::new(false),
            slot: Mutex::new(None),
        })
    }

    async fn accept(&self, result: Result<Vec<u8>, NFourError>) {
        if self
            .done
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            *self.slot.lock().await = Some(result);
            self.notify.notify_waiters();
        }
    }

    async fn get(&self, timeout: Duration) -> Result<Vec<u8>, NFourError> {
        let notified = self.notify.notified();
        if self.done.load(Ordering::SeqCst) {
            return self.slot.lock().await.take().expect("accept populates slot");
        }
        match tokio::time::timeout(timeout, notified).await {
            Ok(_) => self.slot.lock().await.take().expect("accept populates slot"),
            Err(_) => Err(NFourError::TaskTimeout),
        }
    }
}

/// A connected duplex client transport: one TCP connection, one sender
/// task, one reader task, demultiplexing on sequence id.
pub struct Transport {
    conf: TransportConfig,
    name: String,
    semaphore: Arc<TokioSemaphore>,
    send_tx: mpsc::Sender<(SendingTask, Arc<PendingRequest>)>,
    shutdown_latch: Arc<CountdownLatch>,
    shutdown_triggered: AtomicBool,
    cache: Arc<DashMap<u64, Arc<PendingRequest>>>,
    id_gen: AtomicU64,
}

impl Transport {
    /// Dials `addr` and starts the sender/reader tasks. `name` is carried
    /// into every log line this transport emits, to make it easy to tell
    /// connections apart.
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        conf: TransportConfig,
        name: impl Into<String>,
    ) -> Result<Arc<Self>, NFourError> {
        let stream = TcpStream::connect(addr).await?;
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();
        let (send_tx, send_rx) = mpsc::channel(conf.concurrency as usize);
        let semaphore = Arc::new(TokioSemaphore::new(conf.concurrency));

        let transport = Arc::new(Self {
            conf,
            name: name.into(),
            semaphore,
            send_tx,
            shutdown_latch: Arc::new(CountdownLatch::new(1)),
            shutdown_triggered: AtomicBool::new(false),
            cache: Arc::new(DashMap::new()),
            id_gen: AtomicU64::new(0),
        });

        let sender = transport.clone();
        tokio::spawn(async move { sender.async_sender(write_half, send_rx).await });
        let reader = transport.clone();
        tokio::spawn(async move { reader.async_reader(read_half).await });

        Ok(transport)
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_triggered.load(Ordering::SeqCst)
    }

    /// First caller to observe `false` here wins; logs and fires the
    /// shutdown latch exactly once, mirroring the source's
    /// `atomic.CompareAndSwapInt32` gate.
    fn trigger_shutdown(&self, source: &str) {
        if self
            .shutdown_triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            tracing::info!(source, name = %self.name, "trigger shutdown");
            self.shutdown_latch.down();
        }
    }

    /// Sends `req` and waits for its matching response. `req_timeout`
    /// overrides this transport's defaults per-call; a zero field falls
    /// back to the transport's configured value.
    pub async fn send_payload(
        &self,
        req: Vec<u8>,
        req_timeout: ReqTimeout,
    ) -> Result<Vec<u8>, NFourError> {
        if self.is_shutdown() {
            return Err(NFourError::TransShutdown);
        }
        if !self
            .semaphore
            .acquire_timeout(req_timeout.wait_concurrent)
            .await
        {
            return Err(NFourError::ExceedConcurrent);
        }
        let write_timeout = if req_timeout.write_timeout.is_zero() {
            self.conf.write_timeout
        } else {
            req_timeout.write_timeout
        };
        let read_timeout = if req_timeout.read_timeout.is_zero() {
            self.conf.read_timeout
        } else {
            req_timeout.read_timeout
        };
        if self.is_shutdown() {
            return Err(NFourError::TransShutdown);
        }

        let seq_id = self.id_gen.fetch_add(1, Ordering::Relaxed);
        let pending = PendingRequest::new();
        self.cache.insert(seq_id, pending.clone());

        let task = SendingTask {
            seq_id,
            payload: req,
            write_timeout,
        };
        if self.send_tx.send((task, pending.clone())).await.is_err() {
            self.cache.remove(&seq_id);
            return Err(NFourError::TransShutdown);
        }

        pending.get(read_timeout).await
    }

    async fn async_sender(
        &self,
        mut writer: OwnedWriteHalf,
        mut send_rx: mpsc::Receiver<(SendingTask, Arc<PendingRequest>)>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_latch.wait() => {
                    break;
                }
                next = send_rx.recv() => {
                    let Some((task, pending)) = next else { break };
                    if write_frame(&mut writer, task.seq_id, &task.payload, task.write_timeout)
                        .await
                        .is_err()
                    {
                        tracing::info!(name = %self.name, "write err, will shutdown");
                        let owned = self.cache.remove(&task.seq_id).is_some();
                        pending.accept(Err(NFourError::TransShutdown)).await;
                        if owned {
                            self.semaphore.release();
                        }
                        self.trigger_shutdown("sender");
                        break;
                    }
                    tracing::debug!(name = %self.name, "send success");
                }
                _ = tokio::time::sleep(self.conf.idle_timeout) => {
                    tracing::info!(name = %self.name, "wait send task timeout");
                }
            }
        }
        let _ = writer.shutdown().await;

        let mut released = 0;
        while let Ok((task, pending)) = send_rx.try_recv() {
            let owned = self.cache.remove(&task.seq_id).is_some();
            pending.accept(Err(NFourError::TransShutdown)).await;
            if owned {
                self.semaphore.release();
            }
            released += 1;
        }
        tracing::info!(name = %self.name, released, "send release not sent tasks");
    }

    async fn async_reader(&self, mut reader: OwnedReadHalf) {
        loop {
            if self.is_shutdown() {
                break;
            }
            let header = match read_header(&mut reader, self.conf.idle_timeout).await {
                Ok(h) => h,
                Err(NFourError::IdleTimeout) => continue,
                Err(e) => {
                    tracing::info!(name = %self.name, error = %e, "read header error");
                    self.trigger_shutdown("reader");
                    break;
                }
            };

            let body = match read_payload(&mut reader, header.payload_len, self.conf.read_timeout)
                .await
            {
                Ok(b) => b,
                Err(e) => {
                    tracing::info!(name = %self.name, error = %e, need = header.payload_len, "read payload error");
                    self.trigger_shutdown("reader");
                    break;
                }
            };

            // Mirrors the source: look the entry up first, recheck shutdown,
            // and only then remove it. If shutdown wins the race the entry
            // is left in the cache for the post-loop sweep to resolve with
            // `TransShutdown` rather than silently dropped.
            let Some(pending) = self.cache.get(&header.seq_id).map(|e| e.clone()) else {
                tracing::info!(name = %self.name, seq_id = header.seq_id, "lost seqId with read result");
                continue;
            };
            if self.is_shutdown() {
                break;
            }
            self.cache.remove(&header.seq_id);
            pending.accept(Ok(body)).await;
            self.semaphore.release();
        }

        tracing::info!(name = %self.name, "async reader release futures");
        let mut released = 0;
        for entry in self.cache.iter() {
            let seq_id = *entry.key();
            let pending = entry.value().clone();
            drop(entry);
            let owned = self.cache.remove(&seq_id).is_some();
            pending.accept(Err(NFourError::TransShutdown)).await;
            if owned {
                self.semaphore.release();
            }
            released += 1;
        }
        tracing::info!(name = %self.name, released, "async reader release futures");
    }

    /// Closes the transport: no new requests are admitted, and every
    /// request still waiting for a response fails with `TransShutdown`.
    pub fn shutdown(&self) {
        self.trigger_shutdown("caller");
    }
}
