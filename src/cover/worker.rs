use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::debug;

use super::fetch::{CoverFetcher, CoverMeta};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CoverStatus {
    /// No cover requested, or the last request was cancelled.
    #[default]
    Idle,
    Loading { url: String },
    Ready { url: String, meta: CoverMeta },
    Failed { url: String, reason: String },
}

/// Latest cover state shared with the UI.
#[derive(Debug, Clone, Default)]
struct CoverInfo {
    /// Generation of the newest request; results for older ones are dropped.
    generation: u64,
    status: CoverStatus,
}

type CoverHandle = Arc<Mutex<CoverInfo>>;

enum CoverCmd {
    Fetch { generation: u64, url: String },
    Quit,
}

pub struct CoverProbe {
    tx: Sender<CoverCmd>,
    info: CoverHandle,
    generation: u64,
    join: Option<JoinHandle<()>>,
}

impl CoverProbe {
    pub fn spawn<F: CoverFetcher>(fetcher: F) -> Self {
        let (tx, rx) = mpsc::channel::<CoverCmd>();
        let info: CoverHandle = Arc::new(Mutex::new(CoverInfo::default()));
        let join = spawn_cover_thread(fetcher, rx, info.clone());
        Self {
            tx,
            info,
            generation: 0,
            join: Some(join),
        }
    }

    /// Start probing `url`, superseding any request still in flight.
    pub fn request(&mut self, url: &str) {
        self.generation += 1;
        self.publish(CoverStatus::Loading {
            url: url.to_string(),
        });
        let _ = self.tx.send(CoverCmd::Fetch {
            generation: self.generation,
            url: url.to_string(),
        });
    }

    /// Forget the current request; a late result is discarded.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.publish(CoverStatus::Idle);
    }

    pub fn status(&self) -> CoverStatus {
        self.info
            .lock()
            .map(|info| info.status.clone())
            .unwrap_or_default()
    }

    /// Stop the worker. A fetch in progress finishes (bounded by the request
    /// timeout) before the thread exits.
    pub fn shutdown(&mut self) {
        let _ = self.tx.send(CoverCmd::Quit);
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }

    fn publish(&self, status: CoverStatus) {
        if let Ok(mut info) = self.info.lock() {
            info.generation = self.generation;
            info.status = status;
        }
    }
}

impl Drop for CoverProbe {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_cover_thread<F: CoverFetcher>(
    fetcher: F,
    rx: Receiver<CoverCmd>,
    info: CoverHandle,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = rx.recv() {
            let (mut generation, mut url) = match cmd {
                CoverCmd::Fetch { generation, url } => (generation, url),
                CoverCmd::Quit => break,
            };

            // Skip straight to the newest queued request.
            let mut quit = false;
            while let Ok(next) = rx.try_recv() {
                match next {
                    CoverCmd::Fetch {
                        generation: g,
                        url: u,
                    } => {
                        generation = g;
                        url = u;
                    }
                    CoverCmd::Quit => quit = true,
                }
            }
            if quit {
                break;
            }

            if !is_current(&info, generation) {
                continue;
            }

            debug!("probing cover {url}");
            let status = match fetcher.fetch(&url) {
                Ok(meta) => CoverStatus::Ready { url, meta },
                Err(reason) => {
                    debug!("cover probe failed: {reason}");
                    CoverStatus::Failed { url, reason }
                }
            };

            if let Ok(mut current) = info.lock() {
                if current.generation == generation {
                    current.status = status;
                }
            }
        }
    })
}

fn is_current(info: &CoverHandle, generation: u64) -> bool {
    info.lock()
        .map(|i| i.generation == generation)
        .unwrap_or(false)
}
