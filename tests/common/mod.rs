use blackbird::core::task::{TaskEvent, TaskMessage};
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio::time::timeout;

/// Receives events until a terminal one arrives, failing the test if that
/// takes longer than `limit`.
pub async fn collect_until_terminal(rx: &mut Receiver<TaskMessage>, limit: Duration) -> Vec<TaskEvent> {
    let mut events = Vec::new();
    loop {
        let message = timeout(limit, rx.recv())
            .await
            .expect("timed out waiting for task events")
            .expect("event channel closed");
        let terminal = message.event.is_terminal();
        events.push(message.event);
        if terminal {
            return events;
        }
    }
}

pub fn progress_values(events: &[TaskEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|event| match event {
            TaskEvent::Progress { done, .. } => Some(*done),
            _ => None,
        })
        .collect()
}
