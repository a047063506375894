use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{EventSource, MessageEvent};

use smartcenter_shared::{INITIAL_STATUS_EVENT, STATUS_UPDATE_EVENT, StatusMap, StatusUpdate};

pub const EVENTS_URL: &str = "/api/events";

/// Messages the viewer cares about, decoded from the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Initial(StatusMap),
    Update(StatusUpdate),
}

impl FeedMessage {
    pub fn decode(event: &str, data: &str) -> Result<Self, String> {
        match event {
            INITIAL_STATUS_EVENT => serde_json::from_str(data)
                .map(FeedMessage::Initial)
                .map_err(|e| format!("bad {INITIAL_STATUS_EVENT} payload: {e}")),
            STATUS_UPDATE_EVENT => serde_json::from_str(data)
                .map(FeedMessage::Update)
                .map_err(|e| format!("bad {STATUS_UPDATE_EVENT} payload: {e}")),
            other => Err(format!("unexpected event type {other:?}")),
        }
    }
}

/// Open `EventSource` plus the handlers registered on it. Dropping the feed
/// unregisters everything and closes the connection.
pub struct StatusFeed {
    source: EventSource,
    _on_error: Closure<dyn Fn()>,
    handlers: Vec<(&'static str, Closure<dyn Fn(MessageEvent)>)>,
}

impl StatusFeed {
    /// Connect and route every decoded message to `on_message`. The browser
    /// reconnects on its own after errors and the server replays the full
    /// status first, so nothing is resynced here.
    pub fn connect(on_message: impl Fn(FeedMessage) + Clone + 'static) -> Result<Self, JsValue> {
        let source = EventSource::new(EVENTS_URL)?;

        let handlers: Vec<_> = [INITIAL_STATUS_EVENT, STATUS_UPDATE_EVENT]
            .into_iter()
            .map(|event| {
                let on_message = on_message.clone();
                let handler = Closure::<dyn Fn(MessageEvent)>::new(move |e: MessageEvent| {
                    let Some(data) = e.data().as_string() else {
                        return;
                    };
                    match FeedMessage::decode(event, &data) {
                        Ok(message) => on_message(message),
                        Err(err) => web_sys::console::warn_1(&err.into()),
                    }
                });
                (event, handler)
            })
            .collect();
        for (event, handler) in &handlers {
            source.add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())?;
        }

        let on_error = Closure::<dyn Fn()>::new(|| {
            web_sys::console::warn_1(&"status feed interrupted; browser will reconnect".into());
        });
        source.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        Ok(Self {
            source,
            _on_error: on_error,
            handlers,
        })
    }
}

impl Drop for StatusFeed {
    fn drop(&mut self) {
        self.source.set_onerror(None);
        for (event, handler) in &self.handlers {
            let _ = self
                .source
                .remove_event_listener_with_callback(event, handler.as_ref().unchecked_ref());
        }
        self.source.close();
    }
}

#[cfg(test)]
mod tests {
    use smartcenter_shared::{DistrictStatus, WARNING_COLOR};

    use super::FeedMessage;

    #[test]
    fn decodes_initial_status_map() {
        let message = FeedMessage::decode(
            "initial_status",
            r##"{"A":{"status":"normal","color":"#5698c3"},"B":{"status":"warning","color":"#ffc107"}}"##,
        )
        .expect("valid payload");
        let FeedMessage::Initial(map) = message else {
            panic!("expected initial status");
        };
        assert_eq!(map.len(), 2);
        assert_eq!(map["B"].status, DistrictStatus::Warning);
    }

    #[test]
    fn decodes_status_update() {
        let message = FeedMessage::decode(
            "status_update",
            r##"{"district":"C","status":"warning","color":"#ffc107"}"##,
        )
        .expect("valid payload");
        let FeedMessage::Update(update) = message else {
            panic!("expected update");
        };
        assert_eq!(update.district, "C");
        assert_eq!(update.color, WARNING_COLOR.to_hex());
    }

    #[test]
    fn rejects_unknown_events_and_bad_json() {
        assert!(FeedMessage::decode("keep-alive", "{}").is_err());
        assert!(FeedMessage::decode("status_update", "{\"district\":1}").is_err());
    }
}
