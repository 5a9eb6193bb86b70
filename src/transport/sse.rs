//! Server-sent events carrying protocol events.

use std::fmt::Display;

use eventsource_stream::{EventStreamError, Eventsource};
use futures::{Stream, StreamExt};

use crate::error::ClientError;
use crate::types::Event;

const DONE: &str = "[DONE]";

/// Turn a byte stream carrying SSE into protocol events.
///
/// Only the `data` field is read; `event`, `id` and `retry` are ignored.
/// A transport or framing error ends the stream after being yielded once.
pub fn decode_events<S, B, E>(bytes: S) -> impl Stream<Item = Result<Event, ClientError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<ClientError> + Display + Send + 'static,
{
    async_stream::stream! {
        let events = bytes.eventsource();
        futures::pin_mut!(events);

        while let Some(item) = events.next().await {
            match item {
                Ok(sse) => {
                    if let Some(event) = decode_data(&sse.data) {
                        yield Ok(event);
                    }
                }
                Err(err) => {
                    yield Err(stream_error(err));
                    return;
                }
            }
        }
    }
}

fn decode_data(data: &str) -> Option<Event> {
    let data = data.trim();
    if data.is_empty() || data == DONE {
        return None;
    }
    Some(Event::decode(data).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "SSE payload is not JSON");
        Event::Unrecognized {
            event_type: String::new(),
            reason: format!("payload is not JSON: {err}"),
        }
    }))
}

fn stream_error<E>(err: EventStreamError<E>) -> ClientError
where
    E: Into<ClientError> + Display,
{
    match err {
        EventStreamError::Transport(err) => err.into(),
        other => ClientError::Transport(format!("malformed event stream: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventType;
    use pretty_assertions::assert_eq;

    async fn decode(chunks: Vec<&'static str>) -> Vec<Result<Event, ClientError>> {
        let chunks: Vec<Result<&'static [u8], ClientError>> =
            chunks.into_iter().map(|c| Ok(c.as_bytes())).collect();
        decode_events(futures::stream::iter(chunks)).collect().await
    }

    fn content(delta: &str) -> Event {
        Event::TextMessageContent {
            message_id: "m".into(),
            delta: delta.into(),
        }
    }

    const HELLO: &str = r#"{"type":"TEXT_MESSAGE_CONTENT","messageId":"m","delta":"hello"}"#;

    #[tokio::test]
    async fn accepts_lf_crlf_and_cr_line_endings() {
        for terminator in ["\n\n", "\r\n\r\n", "\r\r"] {
            let body: &'static str = format!("data: {HELLO}{terminator}: ping\n").leak();
            let events = decode(vec![body]).await;
            assert_eq!(events.len(), 1, "terminator {terminator:?}");
            assert_eq!(events[0].as_ref().unwrap(), &content("hello"));
        }
    }

    #[tokio::test]
    async fn reassembles_events_split_across_chunks() {
        let events = decode(vec![
            ": keep-alive\n\ndata: {\"type\":\"TEXT_MESSAGE_CONTENT\",",
            "\"messageId\":\"m\",\"delta\":\"hel",
            "lo\"}\n",
            "\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), &content("hello"));
    }

    #[tokio::test]
    async fn skips_done_sentinel_and_other_fields() {
        let body: &'static str =
            format!("event: message\nid: 4\ndata: {HELLO}\n\ndata: [DONE]\n\n").leak();
        let events = decode(vec![body]).await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn handles_utf8_split_across_chunks() {
        let body = "data: {\"type\":\"TEXT_MESSAGE_CONTENT\",\"messageId\":\"m\",\"delta\":\"é\"}\n\n";
        let bytes = body.as_bytes();
        let split = body.find('é').unwrap() + 1;
        let chunks: Vec<Result<Vec<u8>, ClientError>> =
            vec![Ok(bytes[..split].to_vec()), Ok(bytes[split..].to_vec())];

        let events: Vec<_> = decode_events(futures::stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), &content("é"));
    }

    #[tokio::test]
    async fn non_json_payload_is_unrecognized_not_fatal() {
        let events = decode(vec!["data: oops\n\n"]).await;
        assert_eq!(
            events[0].as_ref().unwrap().event_type(),
            EventType::Unrecognized
        );
    }

    #[tokio::test]
    async fn transport_error_ends_the_stream() {
        let body: &'static str = format!("data: {HELLO}\n\n").leak();
        let chunks: Vec<Result<&'static [u8], ClientError>> = vec![
            Ok(body.as_bytes()),
            Err(ClientError::transport("connection reset")),
            Ok(body.as_bytes()),
        ];
        let events: Vec<_> = decode_events(futures::stream::iter(chunks)).collect().await;

        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(events[1], Err(ClientError::Transport(_))));
    }
}
