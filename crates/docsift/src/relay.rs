//! Fragment relay between the generator and a caller-provided sink.
//!
//! The relay is single-pass and forward-only: each fragment is forwarded
//! the moment it arrives, in producer order, with no buffering beyond the
//! fragment in hand. Capacity is reserved on the sink *before* the next
//! fragment is pulled, so a closed sink (caller disconnected, request
//! cancelled) stops the relay without asking the generator for anything
//! further.

use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::generate::{FragmentStream, GenerateError};

/// Forward `fragments` to `sink` and return their concatenation.
///
/// Completion is signaled by the stream ending; the returned string is
/// the full response for non-streaming callers. A mid-stream generator
/// failure stops the relay and propagates the error — fragments already
/// relayed are not retracted. When the sink's receiver is dropped, the
/// relay stops pulling immediately and returns what was relayed so far.
pub async fn relay(
    mut fragments: FragmentStream,
    sink: mpsc::Sender<String>,
) -> Result<String, GenerateError> {
    let mut assembled = String::new();

    loop {
        // Reserve before pulling: cancellation must prevent the next
        // fragment from ever being generated.
        let permit = match sink.reserve().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let Some(next) = fragments.next().await else {
            break;
        };
        let fragment = next?;
        assembled.push_str(&fragment);
        permit.send(fragment);
    }

    Ok(assembled)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures_util::stream;
    use futures_util::StreamExt;
    use tokio::sync::mpsc;

    use super::*;
    use crate::generate::GenerateError;

    /// A lazily-polled stream over scripted fragments that counts how many
    /// have been pulled.
    fn counting_stream(
        fragments: Vec<Result<String, GenerateError>>,
        pulled: Arc<AtomicUsize>,
    ) -> FragmentStream {
        stream::iter(fragments)
            .map(move |f| {
                pulled.fetch_add(1, Ordering::SeqCst);
                f
            })
            .boxed()
    }

    fn ok_fragments(parts: &[&str]) -> Vec<Result<String, GenerateError>> {
        parts.iter().map(|p| Ok(p.to_string())).collect()
    }

    #[tokio::test]
    async fn relays_fragments_in_producer_order() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let fragments = counting_stream(ok_fragments(&["A", "B", "C"]), pulled.clone());

        let (tx, mut rx) = mpsc::channel(8);
        let collector = tokio::spawn(async move {
            let mut received = Vec::new();
            while let Some(f) = rx.recv().await {
                received.push(f);
            }
            received
        });

        let assembled = relay(fragments, tx).await.unwrap();
        assert_eq!(assembled, "ABC");
        assert_eq!(collector.await.unwrap(), vec!["A", "B", "C"]);
        assert_eq!(pulled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cancellation_stops_pulling_from_generator() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let fragments = counting_stream(ok_fragments(&["A", "B", "C"]), pulled.clone());

        // Capacity 1 so the relay must wait for the receiver between
        // fragments; on the current-thread test runtime the recv + drop
        // below happen before the relay can reserve again.
        let (tx, mut rx) = mpsc::channel(1);
        let relay_task = tokio::spawn(relay(fragments, tx));

        let first = rx.recv().await.unwrap();
        assert_eq!(first, "A");
        drop(rx);

        let assembled = relay_task.await.unwrap().unwrap();
        assert_eq!(assembled, "A");
        assert_eq!(
            pulled.load(Ordering::SeqCst),
            1,
            "generator was polled past the cancellation point"
        );
    }

    #[tokio::test]
    async fn failure_before_first_fragment_relays_nothing() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let fragments = counting_stream(
            vec![Err(GenerateError::Connect("refused".to_string()))],
            pulled.clone(),
        );

        let (tx, mut rx) = mpsc::channel(8);
        let result = relay(fragments, tx).await;
        assert!(matches!(result, Err(GenerateError::Connect(_))));
        assert!(rx.recv().await.is_none(), "a fragment was relayed");
    }

    #[tokio::test]
    async fn mid_stream_failure_keeps_relayed_fragments() {
        let fragments = stream::iter(vec![
            Ok("partial ".to_string()),
            Err(GenerateError::Stream("connection reset".to_string())),
            Ok("never".to_string()),
        ])
        .boxed();

        let (tx, mut rx) = mpsc::channel(8);
        let result = relay(fragments, tx).await;
        assert!(matches!(result, Err(GenerateError::Stream(_))));
        // The fragment relayed before the failure is observable and not
        // retracted.
        assert_eq!(rx.recv().await.as_deref(), Some("partial "));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn empty_stream_assembles_empty_answer() {
        let (tx, _rx) = mpsc::channel(8);
        let assembled = relay(stream::iter(vec![]).boxed(), tx).await.unwrap();
        assert_eq!(assembled, "");
    }
}
