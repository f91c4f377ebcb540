use crate::models::events_request::EventsRequest;

/// Query string for `GET /events`.
pub fn construct_params(request: &EventsRequest) -> Vec<(String, String)> {
    let mut query = vec![
        ("start".to_string(), request.range.start_param()),
        ("end".to_string(), request.range.end_param()),
    ];
    if let Some(status) = request.status {
        query.push(("status".to_string(), status.as_str().to_string()));
    }
    if let Some(limit) = request.limit {
        query.push(("limit".to_string(), limit.to_string()));
    }
    let categories: Vec<&str> = request
        .categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if !categories.is_empty() {
        query.push(("category".to_string(), categories.join(",")));
    }
    query
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{date_range::DateRange, events_request::EventStatus};

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn only_range_by_default() {
        let params = construct_params(&EventsRequest::for_range(range()));
        assert_eq!(
            params,
            vec![
                ("start".to_string(), "2024-03-01".to_string()),
                ("end".to_string(), "2024-03-05".to_string()),
            ]
        );
    }

    #[test]
    fn optional_filters_are_appended() {
        let request = EventsRequest {
            range: range(),
            status: Some(EventStatus::Open),
            limit: Some(50),
            categories: vec!["wildfires".into(), " ".into(), "volcanoes".into()],
        };
        let params = construct_params(&request);
        assert!(params.contains(&("status".into(), "open".into())));
        assert!(params.contains(&("limit".into(), "50".into())));
        assert!(params.contains(&("category".into(), "wildfires,volcanoes".into())));
    }
}
