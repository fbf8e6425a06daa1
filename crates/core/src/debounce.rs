use std::time::Duration;

use tokio::sync::{broadcast, watch};

/// Holds the raw search text and derives its debounced form.
///
/// Every write restarts the quiet timer. Once `quiet` passes without a
/// write, the current text is copied into the stabilized value, so at most
/// one stabilized update happens per quiet window however fast writes come.
/// Settling on the value already stabilized emits nothing.
pub struct DebouncedInput {
    query: watch::Sender<String>,
    stabilized: watch::Sender<String>,
    quiet: Duration,
}

impl DebouncedInput {
    pub fn new(quiet: Duration) -> Self {
        let (query, _) = watch::channel(String::new());
        let (stabilized, _) = watch::channel(String::new());
        Self {
            query,
            stabilized,
            quiet,
        }
    }

    pub fn set_query(&self, value: impl Into<String>) {
        let value = value.into();
        self.query.send_if_modified(|current| replace_if_changed(current, value));
    }

    pub fn query(&self) -> String {
        self.query.borrow().clone()
    }

    pub fn stabilized(&self) -> watch::Receiver<String> {
        self.stabilized.subscribe()
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Drive the quiet timer until `shutdown` fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut raw = self.query.subscribe();
        if *raw.borrow() != *self.stabilized.borrow() {
            // Written before the driver started.
            raw.mark_changed();
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => return,
                changed = raw.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }

            loop {
                tokio::select! {
                    _ = shutdown.recv() => return,
                    _ = tokio::time::sleep(self.quiet) => break,
                    changed = raw.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            let settled = raw.borrow_and_update().clone();
            tracing::debug!(query = %settled, "Query settled");
            self.stabilized
                .send_if_modified(|current| replace_if_changed(current, settled));
        }
    }
}

fn replace_if_changed(current: &mut String, value: String) -> bool {
    if *current == value {
        false
    } else {
        *current = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::time::sleep;

    use super::*;

    const QUIET: Duration = Duration::from_millis(500);

    struct Harness {
        input: Arc<DebouncedInput>,
        emitted: Arc<Mutex<Vec<String>>>,
        shutdown: broadcast::Sender<()>,
        driver: tokio::task::JoinHandle<()>,
    }

    fn start() -> Harness {
        let input = Arc::new(DebouncedInput::new(QUIET));
        let (shutdown, shutdown_rx) = broadcast::channel(1);

        let emitted = Arc::new(Mutex::new(Vec::new()));
        let mut stabilized = input.stabilized();
        let sink = Arc::clone(&emitted);
        tokio::spawn(async move {
            while stabilized.changed().await.is_ok() {
                let value = stabilized.borrow_and_update().clone();
                sink.lock().unwrap().push(value);
            }
        });

        let driver_input = Arc::clone(&input);
        let driver = tokio::spawn(async move { driver_input.run(shutdown_rx).await });

        Harness {
            input,
            emitted,
            shutdown,
            driver,
        }
    }

    fn stabilized_now(input: &DebouncedInput) -> String {
        input.stabilized().borrow().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn fast_typing_settles_once_on_final_value() {
        let h = start();

        for prefix in ["b", "ba", "bat", "batm", "batma", "batman"] {
            h.input.set_query(prefix);
            assert_eq!(h.input.query(), prefix);
            sleep(Duration::from_millis(100)).await;
            assert_eq!(stabilized_now(&h.input), "");
        }

        sleep(Duration::from_millis(399)).await;
        assert_eq!(stabilized_now(&h.input), "");

        sleep(Duration::from_millis(2)).await;
        assert_eq!(stabilized_now(&h.input), "batman");

        sleep(Duration::from_secs(2)).await;
        assert_eq!(*h.emitted.lock().unwrap(), vec!["batman".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_pauses_settle_separately() {
        let h = start();

        h.input.set_query("heat");
        sleep(Duration::from_millis(600)).await;
        h.input.set_query("heat 1995");
        sleep(Duration::from_millis(600)).await;

        assert_eq!(
            *h.emitted.lock().unwrap(),
            vec!["heat".to_string(), "heat 1995".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn returning_to_settled_value_emits_nothing() {
        let h = start();

        h.input.set_query("x");
        sleep(Duration::from_millis(200)).await;
        h.input.set_query("");
        sleep(Duration::from_secs(1)).await;

        assert!(h.emitted.lock().unwrap().is_empty());
        assert_eq!(stabilized_now(&h.input), "");
    }

    #[tokio::test(start_paused = true)]
    async fn write_before_driver_starts_still_settles() {
        let input = Arc::new(DebouncedInput::new(QUIET));
        input.set_query("alien");

        let (_shutdown, shutdown_rx) = broadcast::channel(1);
        let driver_input = Arc::clone(&input);
        tokio::spawn(async move { driver_input.run(shutdown_rx).await });

        sleep(Duration::from_millis(600)).await;
        assert_eq!(stabilized_now(&input), "alien");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_driver() {
        let h = start();
        h.input.set_query("dune");
        h.shutdown.send(()).unwrap();

        h.driver.await.unwrap();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(stabilized_now(&h.input), "");
    }
}
