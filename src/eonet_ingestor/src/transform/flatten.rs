//! Turns one events payload into event rows and occurrence rows.
//!
//! Events are read as raw JSON so a single odd record never fails the pass:
//! missing or mistyped fields become null/empty and are reported as warnings.
//! The only record that is dropped is one that is not an object or carries no
//! id, because without an id it cannot be keyed.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    errors::Warning,
    models::{event::Event, occurrence::Occurrence, timestamp::parse_timestamp},
    providers::EventsResponse,
};

/// Output of [`flatten_events`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flattened {
    pub events: Vec<Event>,
    pub occurrences: Vec<Occurrence>,
    pub warnings: Vec<Warning>,
}

/// Reads `id` fields that may arrive as strings or numbers.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Per-event reader that records what it had to default.
struct RecordReader<'a> {
    record: &'a serde_json::Map<String, Value>,
    event_id: &'a str,
    warnings: &'a mut Vec<Warning>,
    index: usize,
}

impl<'a> RecordReader<'a> {
    fn malformed(&mut self, reason: String) {
        self.warnings.push(Warning::MalformedRecord {
            index: self.index,
            reason: format!("{}: {reason}", self.event_id),
        });
    }

    fn string(&mut self, field: &str) -> Option<String> {
        match self.record.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.malformed(format!("`{field}` is {}, expected a string", type_name(other)));
                None
            }
        }
    }

    fn array(&mut self, field: &str) -> &'a [Value] {
        let record = self.record;
        match record.get(field) {
            None | Some(Value::Null) => &[],
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => {
                self.malformed(format!("`{field}` is {}, expected an array", type_name(other)));
                &[]
            }
        }
    }

    fn timestamp(&mut self, field: &'static str, raw: Option<&Value>) -> Option<DateTime<Utc>> {
        match raw {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => {
                let parsed = parse_timestamp(s);
                if parsed.is_none() {
                    self.warnings.push(Warning::Parse {
                        event_id: self.event_id.to_string(),
                        field,
                        value: s.clone(),
                    });
                }
                parsed
            }
            Some(other) => {
                self.warnings.push(Warning::Parse {
                    event_id: self.event_id.to_string(),
                    field,
                    value: other.to_string(),
                });
                None
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Longitude/latitude of a geometry's `coordinates`.
///
/// A point uses its first two components. A polygon (nested arrays) uses the
/// vertex mean of its outer ring, ignoring the closing vertex. Anything else
/// yields nulls.
pub fn representative_point(coordinates: &Value) -> (Option<f64>, Option<f64>) {
    let Some(items) = coordinates.as_array() else {
        return (None, None);
    };
    match items.first() {
        Some(Value::Array(_)) => ring_centroid(items),
        Some(_) => (
            items.first().and_then(Value::as_f64),
            items.get(1).and_then(Value::as_f64),
        ),
        None => (None, None),
    }
}

fn ring_centroid(items: &[Value]) -> (Option<f64>, Option<f64>) {
    // Polygon: [[ [lon, lat], ... ], holes...]; a bare ring is accepted too.
    let ring = match items.first().and_then(Value::as_array) {
        Some(first) if first.first().is_some_and(Value::is_array) => first.as_slice(),
        _ => items,
    };
    let mut vertices: Vec<(f64, f64)> = ring
        .iter()
        .filter_map(|v| {
            let pair = v.as_array()?;
            Some((pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
        })
        .collect();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    if vertices.is_empty() {
        return (None, None);
    }
    let n = vertices.len() as f64;
    let (sum_lon, sum_lat) = vertices
        .iter()
        .fold((0.0, 0.0), |(lon, lat), (x, y)| (lon + x, lat + y));
    (Some(sum_lon / n), Some(sum_lat / n))
}

fn flatten_one(index: usize, raw: &Value, out: &mut Flattened) {
    let Some(record) = raw.as_object() else {
        out.warnings.push(Warning::MalformedRecord {
            index,
            reason: format!("event is {}, expected an object", type_name(raw)),
        });
        return;
    };
    let Some(event_id) = record.get("id").and_then(id_string) else {
        out.warnings.push(Warning::MalformedRecord {
            index,
            reason: "event has no usable `id`".to_string(),
        });
        return;
    };

    let mut reader = RecordReader {
        record,
        event_id: &event_id,
        warnings: &mut out.warnings,
        index,
    };

    let title = reader.string("title").unwrap_or_default();
    let description = reader.string("description");
    let link = reader.string("link").unwrap_or_default();
    let closed = reader.timestamp("closed", record.get("closed"));
    let status = reader
        .string("status")
        .or_else(|| Some(if closed.is_some() { "closed" } else { "open" }.to_string()));

    let (mut category_ids, mut categories) = (Vec::new(), Vec::new());
    for category in reader.array("categories") {
        category_ids.push(category.get("id").and_then(id_string).unwrap_or_default());
        categories.push(
            category
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        );
    }
    let sources: Vec<String> = reader
        .array("sources")
        .iter()
        .filter_map(|s| s.get("id").and_then(id_string))
        .collect();

    let joined_ids = category_ids.join(",");
    let joined_titles = categories.join(",");
    let template = Occurrence::bare(&event_id, &title, joined_ids, joined_titles);

    let geometry = reader.array("geometry");
    if geometry.is_empty() {
        out.occurrences.push(template.clone());
    }
    for (g, entry) in geometry.iter().enumerate() {
        let mut row = template.clone();
        if !entry.is_object() {
            reader.malformed(format!("geometry[{g}] is {}, expected an object", type_name(entry)));
            out.occurrences.push(row);
            continue;
        }
        row.set_date(reader.timestamp("date", entry.get("date")));
        row.occurrence_type = entry.get("type").and_then(Value::as_str).map(String::from);
        let (longitude, latitude) = entry
            .get("coordinates")
            .map(representative_point)
            .unwrap_or((None, None));
        row.longitude = longitude;
        row.latitude = latitude;
        out.occurrences.push(row);
    }

    let mut event = Event::new(event_id, title);
    event.description = description;
    event.link = link;
    event.closed = closed;
    event.status = status;
    event.categories = categories;
    event.category_ids = category_ids;
    event.sources = sources;
    out.events.push(event);
}

/// Flattens a payload into one [`Event`] per event and one [`Occurrence`] per
/// geometry entry (a single all-null occurrence for events without geometry).
pub fn flatten_events(payload: &EventsResponse) -> Flattened {
    let mut out = Flattened::default();
    for (index, raw) in payload.events.iter().enumerate() {
        flatten_one(index, raw, &mut out);
    }
    for warning in &out.warnings {
        debug!(%warning, "Flattening warning");
    }
    info!(
        events = out.events.len(),
        occurrences = out.occurrences.len(),
        warnings = out.warnings.len(),
        "Flattened payload"
    );
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn payload(events: Value) -> EventsResponse {
        serde_json::from_value(json!({ "title": "EONET Events", "events": events })).unwrap()
    }

    #[test]
    fn one_row_per_geometry_and_one_for_none() {
        let flat = flatten_events(&payload(json!([
            {
                "id": "EONET_1",
                "title": "Wildfire A",
                "categories": [{"id": "wildfires", "title": "Wildfires"}],
                "sources": [{"id": "InciWeb", "url": "https://example.org"}],
                "geometry": [
                    {"date": "2024-03-01T00:00:00Z", "type": "Point", "coordinates": [-74.0, 40.7]},
                    {"date": "2024-03-02T00:00:00Z", "type": "Point", "coordinates": [-74.1, 40.8]},
                    {"date": "2024-03-03T00:00:00Z", "type": "Point", "coordinates": [-74.2, 40.9]}
                ]
            },
            {
                "id": "EONET_2",
                "title": "Iceberg B",
                "categories": [{"id": 15, "title": "Sea and Lake Ice"}],
                "geometry": []
            }
        ])));

        assert_eq!(flat.events.len(), 2);
        assert_eq!(flat.occurrences.len(), 4);
        assert!(flat.warnings.is_empty(), "{:?}", flat.warnings);

        let first = &flat.occurrences[0];
        assert_eq!(first.longitude, Some(-74.0));
        assert_eq!(first.latitude, Some(40.7));
        assert_eq!(first.occurrence_type.as_deref(), Some("Point"));
        assert_eq!(first.date, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        assert_eq!((first.year, first.month, first.day), (Some(2024), Some(3), Some(1)));

        let bare = &flat.occurrences[3];
        assert_eq!(bare.event_id, "EONET_2");
        assert_eq!(bare.category_ids, "15");
        assert_eq!(bare.date, None);
        assert_eq!(bare.longitude, None);
        assert_eq!(bare.occurrence_type, None);

        assert_eq!(flat.events[0].sources, vec!["InciWeb"]);
        assert_eq!(flat.events[0].status.as_deref(), Some("open"));
        assert_eq!(flat.events[1].category_ids, vec!["15"]);
    }

    #[test]
    fn categories_are_joined_in_order() {
        let flat = flatten_events(&payload(json!([{
            "id": "EONET_3",
            "title": "Storm",
            "categories": [
                {"id": "severeStorms", "title": "Severe Storms"},
                {"id": "floods", "title": "Floods"}
            ]
        }])));
        let row = &flat.occurrences[0];
        assert_eq!(row.category_ids, "severeStorms,floods");
        assert_eq!(row.category_titles, "Severe Storms,Floods");
        assert_eq!(flat.events[0].categories, vec!["Severe Storms", "Floods"]);
    }

    #[test]
    fn polygon_uses_outer_ring_vertex_mean() {
        let coordinates = json!([[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]);
        assert_eq!(representative_point(&coordinates), (Some(1.0), Some(1.0)));
    }

    #[test]
    fn short_or_odd_coordinates_become_null() {
        assert_eq!(representative_point(&json!([12.5])), (Some(12.5), None));
        assert_eq!(representative_point(&json!([])), (None, None));
        assert_eq!(representative_point(&json!("nope")), (None, None));
        assert_eq!(representative_point(&json!(["a", "b"])), (None, None));
    }

    #[test]
    fn malformed_records_are_reported_not_fatal() {
        let flat = flatten_events(&payload(json!([
            "not an event",
            {"title": "no id"},
            {
                "id": "EONET_4",
                "title": 7,
                "closed": "2024-04-01T00:00:00Z",
                "categories": "wildfires",
                "geometry": [
                    {"date": "yesterday-ish", "type": "Point", "coordinates": [10.0, 20.0]},
                    null
                ]
            }
        ])));

        assert_eq!(flat.events.len(), 1);
        assert_eq!(flat.occurrences.len(), 2);

        let event = &flat.events[0];
        assert_eq!(event.title, "");
        assert!(event.categories.is_empty());
        assert_eq!(event.status.as_deref(), Some("closed"));

        assert_eq!(flat.occurrences[0].date, None);
        assert_eq!(flat.occurrences[0].latitude, Some(20.0));
        assert_eq!(flat.occurrences[1].latitude, None);

        let parse = flat
            .warnings
            .iter()
            .filter(|w| matches!(w, Warning::Parse { .. }))
            .count();
        let malformed = flat
            .warnings
            .iter()
            .filter(|w| matches!(w, Warning::MalformedRecord { .. }))
            .count();
        assert_eq!(parse, 1);
        // non-object, missing id, numeric title, string categories, null geometry entry
        assert_eq!(malformed, 5);
    }

    #[test]
    fn only_unkeyable_events_are_skipped() {
        let flat = flatten_events(&payload(json!([
            {"id": "   ", "title": "blank id", "geometry": []},
            {"id": null, "title": "null id"},
            {"id": ["EONET_9"], "title": "array id"},
            {"id": 42, "title": "numeric id"}
        ])));

        assert_eq!(flat.events.len(), 1);
        assert_eq!(flat.events[0].event_id, "42");
        assert_eq!(flat.occurrences.len(), 1);
        assert!(flat.occurrences[0].is_placeholder());

        let skipped: Vec<usize> = flat
            .warnings
            .iter()
            .filter_map(|w| match w {
                Warning::MalformedRecord { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(skipped, vec![0, 1, 2]);
    }

    #[test]
    fn empty_payload_flattens_to_nothing() {
        let flat = flatten_events(&EventsResponse::default());
        assert_eq!(flat, Flattened::default());
    }
}
