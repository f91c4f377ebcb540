//! Copies each event's earliest occurrence onto the event row.

use std::collections::HashMap;

use crate::models::{event::Event, occurrence::Occurrence};

/// Picks the first occurrence of every event.
///
/// Rows are ordered by date ascending with null dates last; ties keep input
/// order. The stand-in row of a geometry-less event is not an occurrence, so
/// such an event has no first occurrence.
pub fn first_occurrences(occurrences: &[Occurrence]) -> HashMap<&str, &Occurrence> {
    let mut ordered: Vec<&Occurrence> = occurrences
        .iter()
        .filter(|row| !row.is_placeholder())
        .collect();
    ordered.sort_by_key(|row| (row.date.is_none(), row.date));

    let mut firsts: HashMap<&str, &Occurrence> = HashMap::new();
    for row in ordered {
        firsts.entry(row.event_id.as_str()).or_insert(row);
    }
    firsts
}

/// Sets the derived fields of every event from `occurrences`. Events without
/// an occurrence get all-null derived fields.
pub fn apply_first_occurrences(events: &mut [Event], occurrences: &[Occurrence]) {
    let firsts = first_occurrences(occurrences);
    for event in events.iter_mut() {
        event.clear_first_occurrence();
        let Some(first) = firsts.get(event.event_id.as_str()) else {
            continue;
        };
        event.date = first.date;
        event.longitude = first.longitude;
        event.latitude = first.latitude;
        event.continent = first.continent;
        event.country = first.country.clone();
        event.category_titles = Some(first.category_titles.clone());
        event.year = first.year;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::models::continent::Continent;

    fn at(day: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap())
    }

    fn occ(id: &str, date: Option<DateTime<Utc>>, lat: f64) -> Occurrence {
        let mut row = Occurrence::bare(id, "t", "wildfires", "Wildfires");
        row.set_date(date);
        row.latitude = Some(lat);
        row.longitude = Some(-100.0);
        row
    }

    #[test]
    fn earliest_dated_row_wins_over_undated() {
        let rows = vec![
            occ("A", None, 1.0),
            occ("A", at(5), 5.0),
            occ("A", at(1), 10.0),
            occ("A", at(1), 11.0),
        ];
        let firsts = first_occurrences(&rows);
        assert_eq!(firsts["A"].latitude, Some(10.0));
    }

    #[test]
    fn undated_row_with_coordinates_is_still_a_first_occurrence() {
        let mut only = occ("A", None, 40.7);
        only.longitude = Some(-74.0);
        only.continent = Some(Continent::NorthAmerica);
        let mut events = vec![Event::new("A", "a")];

        apply_first_occurrences(&mut events, &[only]);

        let a = &events[0];
        assert_eq!(a.date, None);
        assert_eq!(a.latitude, Some(40.7));
        assert_eq!(a.longitude, Some(-74.0));
        assert_eq!(a.continent, Some(Continent::NorthAmerica));
        assert_eq!(a.category_titles.as_deref(), Some("Wildfires"));
        assert_eq!(a.year, None);
    }

    #[test]
    fn derived_fields_are_copied_or_cleared() {
        let mut first = occ("A", at(2), 40.7);
        first.continent = Some(Continent::NorthAmerica);
        first.country = Some("United States".into());
        let occurrences = vec![
            first,
            Occurrence::bare("B", "b", "seaLakeIce", "Sea and Lake Ice"),
        ];

        let mut stale = Event::new("C", "stale");
        stale.date = at(9);
        stale.country = Some("Nowhere".into());
        let mut events = vec![Event::new("A", "a"), Event::new("B", "b"), stale];

        apply_first_occurrences(&mut events, &occurrences);

        let a = &events[0];
        assert_eq!(a.date, at(2));
        assert_eq!(a.latitude, Some(40.7));
        assert_eq!(a.continent, Some(Continent::NorthAmerica));
        assert_eq!(a.country.as_deref(), Some("United States"));
        assert_eq!(a.category_titles.as_deref(), Some("Wildfires"));
        assert_eq!(a.year, Some(2024));

        for event in &events[1..] {
            assert_eq!(event.date, None);
            assert_eq!(event.latitude, None);
            assert_eq!(event.country, None);
            assert_eq!(event.category_titles, None);
        }
    }
}
