use meshroom_core::ServerSignal;
use tokio::sync::mpsc;

/// Timeout for a single expected signal (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 2000;

/// How long to wait before concluding that nothing more will arrive (ms).
pub const QUIET_PERIOD_MS: u64 = 100;

/// Wait for the next signal, failing the test on timeout or a closed channel.
pub async fn next_signal(rx: &mut mpsc::UnboundedReceiver<ServerSignal>) -> ServerSignal {
    match tokio::time::timeout(std::time::Duration::from_millis(SIGNAL_TIMEOUT_MS), rx.recv()).await
    {
        Ok(Some(signal)) => signal,
        Ok(None) => panic!("Signal channel closed"),
        Err(_) => panic!("Timeout waiting for signal"),
    }
}

/// Collect whatever arrives until the channel stays quiet.
pub async fn drain_signals(rx: &mut mpsc::UnboundedReceiver<ServerSignal>) -> Vec<ServerSignal> {
    let mut signals = Vec::new();
    while let Ok(Some(signal)) =
        tokio::time::timeout(std::time::Duration::from_millis(QUIET_PERIOD_MS), rx.recv()).await
    {
        signals.push(signal);
    }
    signals
}
