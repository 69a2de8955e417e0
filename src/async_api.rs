use crate::{cdp, InspectConfig, Inspection, PageInspector};
use crate::{Error, Result};
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Inspect(String, oneshot::Sender<Result<Inspection>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly inspector backed by a dedicated worker thread.
///
/// The worker thread owns a synchronous `CdpInspector` and executes commands
/// sent from async tasks, so callers can await a page load without the
/// browser handle having to move across threads.
#[derive(Clone)]
pub struct Inspector {
    cmd_tx: Sender<Command>,
}

impl Inspector {
    /// Create a new inspector (spawns a background thread that owns the browser).
    pub async fn new(config: Option<InspectConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            let mut inspector = match cdp::CdpInspector::new(config) {
                Ok(i) => i,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            // Command loop
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Inspect(url, resp) => {
                        let res = inspector.inspect(&url);
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let res = inspector.close();
                        let _ = resp.send(res);
                        break;
                    }
                }
            }
        });

        // Wait for the worker to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Load `url` and resolve once the load event fired and the report was read
    pub async fn inspect(&self, url: &str) -> Result<Inspection> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Inspect(url.to_string(), tx))
            .map_err(|_| Error::Other("Inspector worker has stopped".into()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Inspect canceled: {}", e)))?
    }

    /// Shutdown the background worker and close the browser.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}
