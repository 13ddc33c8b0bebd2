// ── Blocking connection pool ──
//
// Firebird connections are synchronous. Each pooled connection lives on
// its own OS thread and never leaves it; async callers push boxed jobs
// onto a shared flume queue and await the reply on a one-slot channel
// bounded by a per-query deadline.

use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, Sender};
use rsfbclient::prelude::Queryable;
use rsfbclient::{Charset, FbError, Row};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Minimal query surface a job may use.
pub(crate) trait Session {
    fn rows(&mut self, sql: &str, arg: Option<i64>) -> Result<Vec<Row>, FbError>;
}

impl<C: Queryable> Session for C {
    fn rows(&mut self, sql: &str, arg: Option<i64>) -> Result<Vec<Row>, FbError> {
        match arg {
            Some(value) => self.query(sql, (value,)),
            None => self.query(sql, ()),
        }
    }
}

type Job = Box<dyn FnOnce(&mut dyn Session) + Send>;

/// Opens one connection; called once on each worker thread.
type Connect = Arc<dyn Fn() -> Result<Box<dyn Session>, StoreError> + Send + Sync>;

/// Where and as whom to connect.
pub(crate) struct ConnectTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub charset: Charset,
}

impl ConnectTarget {
    /// Open a fresh connection to `path` on this server.
    pub(crate) fn open(&self, path: &str) -> Result<impl Queryable + use<>, FbError> {
        let mut builder = rsfbclient::builder_pure_rust();
        builder
            .host(self.host.as_str())
            .port(self.port)
            .db_name(path)
            .user(self.user.as_str())
            .pass(self.password.expose_secret())
            .charset(self.charset.clone());
        builder.connect()
    }

    /// Run one statement on a short-lived connection to another database
    /// file on the same server, off the async runtime.
    pub(crate) async fn query_once(
        self: &Arc<Self>,
        operation: &'static str,
        path: String,
        sql: &'static str,
        arg: i64,
        timeout: Duration,
    ) -> Result<Vec<Row>, StoreError> {
        let target = Arc::clone(self);
        let task = tokio::task::spawn_blocking(move || {
            let mut conn = target
                .open(&path)
                .map_err(|e| StoreError::Connection(format!("{path}: {e}")))?;
            conn.rows(sql, Some(arg))
                .map_err(|e| StoreError::Query(e.to_string()))
        });

        match tokio::time::timeout(timeout, task).await {
            Err(_) => Err(StoreError::Timeout { operation, timeout }),
            Ok(Err(_)) => Err(StoreError::Unavailable),
            Ok(Ok(result)) => result,
        }
    }
}

/// A fixed set of worker threads sharing one job queue.
pub(crate) struct Pool {
    jobs: Sender<Job>,
}

impl Pool {
    /// Spawn `size` workers, each opening its own connection to `path`.
    pub(crate) async fn open(
        target: Arc<ConnectTarget>,
        path: &str,
        size: usize,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let path = path.to_owned();
        let connect: Connect = Arc::new(move || {
            let conn = target
                .open(&path)
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            Ok(Box::new(conn) as Box<dyn Session>)
        });
        Self::start(connect, size, timeout).await
    }

    /// Fails if any worker cannot connect within `timeout`; workers that
    /// did connect exit once the queue sender is dropped.
    async fn start(connect: Connect, size: usize, timeout: Duration) -> Result<Self, StoreError> {
        let (tx, rx) = flume::unbounded::<Job>();

        for index in 0..size.max(1) {
            let (ready_tx, ready_rx) = flume::bounded(1);
            spawn_worker(index, Arc::clone(&connect), rx.clone(), ready_tx)?;

            match tokio::time::timeout(timeout, ready_rx.recv_async()).await {
                Err(_) => {
                    return Err(StoreError::Timeout {
                        operation: "connect",
                        timeout,
                    });
                }
                Ok(Err(_)) => return Err(StoreError::Unavailable),
                Ok(Ok(Err(e))) => return Err(e),
                Ok(Ok(Ok(()))) => {}
            }
        }

        Ok(Self { jobs: tx })
    }

    /// Run `work` on the next free connection, waiting at most `timeout`.
    ///
    /// A job that misses its deadline still finishes on its worker; only
    /// the reply is discarded.
    pub(crate) async fn call<T, F>(
        &self,
        operation: &'static str,
        timeout: Duration,
        work: F,
    ) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Session) -> Result<T, FbError> + Send + 'static,
    {
        let (reply_tx, reply_rx) = flume::bounded(1);
        let job: Job = Box::new(move |session| {
            let _ = reply_tx.send(work(session));
        });
        self.jobs
            .send_async(job)
            .await
            .map_err(|_| StoreError::Unavailable)?;

        match tokio::time::timeout(timeout, reply_rx.recv_async()).await {
            Err(_) => Err(StoreError::Timeout { operation, timeout }),
            Ok(Err(_)) => Err(StoreError::Unavailable),
            Ok(Ok(result)) => result.map_err(|e| StoreError::Query(e.to_string())),
        }
    }
}

fn spawn_worker(
    index: usize,
    connect: Connect,
    jobs: Receiver<Job>,
    ready: Sender<Result<(), StoreError>>,
) -> Result<(), StoreError> {
    std::thread::Builder::new()
        .name(format!("firedesk-db-{index}"))
        .spawn(move || {
            let mut conn = match connect() {
                Ok(conn) => {
                    let _ = ready.send(Ok(()));
                    conn
                }
                Err(e) => {
                    warn!(worker = index, error = %e, "database connection failed");
                    let _ = ready.send(Err(e));
                    return;
                }
            };
            debug!(worker = index, "database worker connected");

            while let Ok(job) = jobs.recv() {
                job(&mut *conn);
            }

            debug!(worker = index, "database worker stopped");
        })
        .map(drop)
        .map_err(|e| StoreError::Connection(format!("cannot spawn database worker: {e}")))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    use super::*;

    /// Answers every statement with no rows; counts drops.
    struct Blank {
        closed: Arc<AtomicUsize>,
    }

    impl Session for Blank {
        fn rows(&mut self, _sql: &str, _arg: Option<i64>) -> Result<Vec<Row>, FbError> {
            Ok(Vec::new())
        }
    }

    impl Drop for Blank {
        fn drop(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn blank_sessions(opened: &Arc<AtomicUsize>, closed: &Arc<AtomicUsize>) -> Connect {
        let opened = Arc::clone(opened);
        let closed = Arc::clone(closed);
        Arc::new(move || {
            opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Blank {
                closed: Arc::clone(&closed),
            }) as Box<dyn Session>)
        })
    }

    const DEADLINE: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn every_worker_takes_jobs_from_the_shared_queue() {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let pool = Pool::start(blank_sessions(&opened, &closed), 3, DEADLINE)
            .await
            .unwrap();
        assert_eq!(opened.load(Ordering::SeqCst), 3);

        // Each job parks until all three run at once, so this only
        // finishes when three distinct workers picked them up.
        let barrier = Arc::new(Barrier::new(3));
        let job = |barrier: Arc<Barrier>| {
            move |s: &mut dyn Session| {
                barrier.wait();
                s.rows("SELECT 1 FROM RDB$DATABASE", None).map(|rows| rows.len())
            }
        };
        let (a, b, c) = tokio::join!(
            pool.call("a", DEADLINE, job(Arc::clone(&barrier))),
            pool.call("b", DEADLINE, job(Arc::clone(&barrier))),
            pool.call("c", DEADLINE, job(Arc::clone(&barrier))),
        );
        assert_eq!(a.unwrap() + b.unwrap() + c.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_connect_fails_the_whole_pool() {
        let connect: Connect =
            Arc::new(|| Err(StoreError::Connection("connection refused".into())));
        let result = Pool::start(connect, 2, DEADLINE).await;
        assert!(matches!(result, Err(StoreError::Connection(_))));
    }

    #[tokio::test]
    async fn late_reply_times_out_and_the_worker_carries_on() {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let pool = Pool::start(blank_sessions(&opened, &closed), 1, DEADLINE)
            .await
            .unwrap();

        let slow = pool
            .call("slow", Duration::from_millis(20), |_| {
                std::thread::sleep(Duration::from_millis(200));
                Ok(())
            })
            .await;
        assert!(matches!(
            slow,
            Err(StoreError::Timeout {
                operation: "slow",
                ..
            })
        ));

        let next = pool.call("next", DEADLINE, |s| s.rows("SELECT 1", Some(7))).await;
        assert!(next.unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_errors_map_to_query_failures() {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let pool = Pool::start(blank_sessions(&opened, &closed), 1, DEADLINE)
            .await
            .unwrap();

        let result: Result<(), _> = pool
            .call("broken", DEADLINE, |_| {
                Err(FbError::Other("table unknown".into()))
            })
            .await;
        assert!(matches!(result, Err(StoreError::Query(msg)) if msg.contains("table unknown")));
    }

    #[tokio::test]
    async fn dropping_the_pool_closes_every_connection() {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let pool = Pool::start(blank_sessions(&opened, &closed), 2, DEADLINE)
            .await
            .unwrap();
        drop(pool);

        for _ in 0..100 {
            if closed.load(Ordering::SeqCst) == 2 {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(closed.load(Ordering::SeqCst), 2);
    }
}
