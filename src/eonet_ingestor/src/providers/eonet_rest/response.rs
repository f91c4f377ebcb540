use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level document of the events endpoint.
///
/// Individual events stay as raw JSON; the flattener reads them leniently so
/// one malformed record cannot fail the whole pull.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub events: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_default_to_empty() {
        let response: EventsResponse = serde_json::from_str(r#"{"title": "EONET Events"}"#).unwrap();
        assert!(response.events.is_empty());
        assert_eq!(response.title.as_deref(), Some("EONET Events"));
    }

    #[test]
    fn events_are_kept_verbatim() {
        let response: EventsResponse =
            serde_json::from_str(r#"{"events": [{"id": "EONET_1"}, 42]}"#).unwrap();
        assert_eq!(response.events.len(), 2);
        assert_eq!(response.events[1], Value::from(42));
    }
}
