//! Aggregates computed over rows already loaded from the database.
//!
//! All averages are rounded to one decimal place and are `0` when there is
//! nothing to average.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::naive::NaiveDate;
use serde_derive::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::models::{Beer, Event, Review};

/// Brewery group used for beers that name no brewery at all.
pub const UNKNOWN_BREWERY: &str = "Unknown";

pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn rounded_mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        0.0
    } else {
        round_tenth(sum / count as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub avg_rating: f64,
    pub review_count: usize,
}

impl RatingSummary {
    pub fn from_reviews<'a, I>(reviews: I) -> RatingSummary
    where
        I: IntoIterator<Item = &'a Review>,
    {
        let ratings: Vec<f64> = reviews.into_iter().map(|r| f64::from(r.rating)).collect();

        RatingSummary {
            review_count: ratings.len(),
            avg_rating: rounded_mean(ratings),
        }
    }
}

/// Rating summaries keyed by beer id. Beers without reviews are absent.
pub fn summarize_by_beer(reviews: &[Review]) -> HashMap<i32, RatingSummary> {
    let mut grouped: HashMap<i32, Vec<&Review>> = HashMap::new();
    for review in reviews {
        grouped.entry(review.beer_id).or_default().push(review);
    }

    grouped
        .into_iter()
        .map(|(beer_id, reviews)| (beer_id, RatingSummary::from_reviews(reviews)))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub beer_count: usize,
    pub review_count: usize,
    pub avg_abv: f64,
    pub avg_rating: f64,
}

impl EventStats {
    /// `reviews` are the reviews of `beers`. The rating average is taken over
    /// every review, not over the per-beer averages.
    pub fn compute(beers: &[&Beer], reviews: &[&Review]) -> EventStats {
        EventStats {
            beer_count: beers.len(),
            review_count: reviews.len(),
            avg_abv: rounded_mean(beers.iter().map(|b| b.abv)),
            avg_rating: rounded_mean(reviews.iter().map(|r| f64::from(r.rating))),
        }
    }
}

/// Stats for each event, keyed by event id.
pub fn stats_by_event(events: &[Event], beers: &[Beer], reviews: &[Review]) -> HashMap<i32, EventStats> {
    let mut beers_by_event: HashMap<i32, Vec<&Beer>> = HashMap::new();
    for beer in beers {
        beers_by_event.entry(beer.event_id).or_default().push(beer);
    }

    let mut reviews_by_beer: HashMap<i32, Vec<&Review>> = HashMap::new();
    for review in reviews {
        reviews_by_beer.entry(review.beer_id).or_default().push(review);
    }

    events
        .iter()
        .map(|event| {
            let beers = beers_by_event.remove(&event.id).unwrap_or_default();
            let reviews: Vec<&Review> = beers
                .iter()
                .filter_map(|beer| reviews_by_beer.get(&beer.id))
                .flatten()
                .copied()
                .collect();

            (event.id, EventStats::compute(&beers, &reviews))
        })
        .collect()
}

/// The event title, or "Month Year" of its date when it has none.
pub fn display_title(title: Option<&str>, date: NaiveDate) -> String {
    match title.map(str::trim) {
        Some(title) if !title.is_empty() => title.to_owned(),
        _ => date.format("%B %Y").to_string(),
    }
}

pub fn event_display_title(event: &Event) -> String {
    display_title(event.title.as_deref(), event.date)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryBeer {
    pub id: i32,
    pub name: String,
    pub style: String,
    pub abv: f64,
    pub avg_rating: f64,
    pub review_count: usize,
    pub event_title: String,
    pub event_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreweryGroup {
    pub name: String,
    pub beer_count: usize,
    pub beers: Vec<DirectoryBeer>,
}

/// Names a beer is filed under: its brewery list, else the single legacy
/// brewery, else [`UNKNOWN_BREWERY`].
pub fn filed_brewery_names(beer: &Beer) -> Vec<&str> {
    if !beer.breweries.is_empty() {
        beer.breweries.iter().map(String::as_str).collect()
    } else if !beer.brewery.trim().is_empty() {
        vec![beer.brewery.as_str()]
    } else {
        vec![UNKNOWN_BREWERY]
    }
}

/// Sort key ordering names alphabetically regardless of case and accents,
/// so "Étoile" sorts between "Alpha" and "Zeta".
pub fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Groups every beer under each brewery it names.
///
/// Groups are keyed by lowercased name, ordered by [`collation_key`] and
/// shown with the first spelling met while walking `beers` in order. Within a group, beers are
/// ordered by average rating, best first, ties keeping `beers` order.
pub fn brewery_directory(beers: &[Beer], reviews: &[Review], events: &[Event]) -> Vec<BreweryGroup> {
    let ratings = summarize_by_beer(reviews);
    let events: HashMap<i32, &Event> = events.iter().map(|e| (e.id, e)).collect();

    let mut groups: HashMap<String, BreweryGroup> = HashMap::new();

    for beer in beers {
        let summary = ratings.get(&beer.id).copied().unwrap_or_default();
        let entry = DirectoryBeer {
            id: beer.id,
            name: beer.name.clone(),
            style: beer.style.clone(),
            abv: beer.abv,
            avg_rating: summary.avg_rating,
            review_count: summary.review_count,
            event_title: events
                .get(&beer.event_id)
                .map(|event| event_display_title(event))
                .unwrap_or_default(),
            event_id: beer.event_id,
        };

        let mut seen = HashSet::new();
        for name in filed_brewery_names(beer) {
            let key = name.to_lowercase();
            if !seen.insert(key.clone()) {
                continue;
            }

            groups
                .entry(key)
                .or_insert_with(|| BreweryGroup {
                    name: name.to_owned(),
                    beer_count: 0,
                    beers: Vec::new(),
                })
                .beers
                .push(entry.clone());
        }
    }

    let mut groups: Vec<(String, BreweryGroup)> = groups.into_iter().collect();
    groups.sort_by_cached_key(|(key, _)| (collation_key(key), key.clone()));

    groups
        .into_iter()
        .map(|(_, mut group)| {
            group
                .beers
                .sort_by(|a, b| b.avg_rating.partial_cmp(&a.avg_rating).unwrap_or(Ordering::Equal));
            group.beer_count = group.beers.len();
            group
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(id: i32, title: Option<&str>, date: (i32, u32, u32)) -> Event {
        Event {
            id,
            title: title.map(str::to_owned),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            chooser: None,
            notes: None,
            created_by: "host@example.com".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn beer(id: i32, event_id: i32, name: &str, breweries: &[&str], abv: f64) -> Beer {
        Beer {
            id,
            event_id,
            name: name.into(),
            brewery: breweries.join(", "),
            breweries: breweries.iter().map(|b| b.to_string()).collect(),
            style: "IPA".into(),
            abv,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn review(id: i32, beer_id: i32, event_id: i32, rating: i16) -> Review {
        Review {
            id,
            beer_id,
            event_id,
            user_email: format!("user{}@example.com", id),
            user_name: String::new(),
            rating,
            description: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round_tenth(3.3333), 3.3);
        assert_eq!(round_tenth(3.25), 3.3);
        assert_eq!(round_tenth(4.0), 4.0);
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(rounded_mean(Vec::<f64>::new()), 0.0);
        assert_eq!(RatingSummary::from_reviews(&Vec::<Review>::new()), RatingSummary::default());
    }

    #[test]
    fn beer_summary_averages_ratings() {
        let reviews = vec![review(1, 7, 1, 5), review(2, 7, 1, 4), review(3, 7, 1, 4)];
        let summary = RatingSummary::from_reviews(&reviews);
        assert_eq!(summary.review_count, 3);
        assert_eq!(summary.avg_rating, 4.3);
    }

    #[test]
    fn event_rating_averages_all_reviews() {
        let events = vec![event(1, None, (2025, 3, 14)), event(2, None, (2025, 4, 1))];
        let beers = vec![beer(10, 1, "Punk IPA", &["BrewDog"], 5.4), beer(11, 1, "Stout", &[], 7.0)];
        // One beer rated 5 once, the other rated 1 and 2: mean of all reviews is 8 / 3.
        let reviews = vec![review(1, 10, 1, 5), review(2, 11, 1, 1), review(3, 11, 1, 2)];

        let stats = stats_by_event(&events, &beers, &reviews);

        let first = stats[&1];
        assert_eq!(first.beer_count, 2);
        assert_eq!(first.review_count, 3);
        assert_eq!(first.avg_abv, 6.2);
        assert_eq!(first.avg_rating, 2.7);

        assert_eq!(stats[&2], EventStats::default());
    }

    #[test]
    fn untitled_events_use_month_and_year() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(display_title(None, date), "March 2025");
        assert_eq!(display_title(Some("   "), date), "March 2025");
        assert_eq!(display_title(Some("Stout Night"), date), "Stout Night");
    }

    #[test]
    fn directory_groups_case_insensitively() {
        let events = vec![event(1, Some("Hop Night"), (2025, 1, 10))];
        let beers = vec![
            beer(1, 1, "Elvis Juice", &["BrewDog"], 6.5),
            beer(2, 1, "Collab", &["brewdog", "Stone"], 7.2),
            beer(3, 1, "Mystery", &[], 4.0),
        ];
        let reviews = vec![review(1, 1, 1, 3), review(2, 2, 1, 5)];

        let directory = brewery_directory(&beers, &reviews, &events);

        let names: Vec<&str> = directory.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["BrewDog", "Stone", "Unknown"]);

        let brewdog = &directory[0];
        assert_eq!(brewdog.beer_count, 2);
        assert_eq!(brewdog.beers[0].name, "Collab");
        assert_eq!(brewdog.beers[0].avg_rating, 5.0);
        assert_eq!(brewdog.beers[1].name, "Elvis Juice");
        assert_eq!(brewdog.beers[1].event_title, "Hop Night");

        let unknown = &directory[2];
        assert_eq!(unknown.beers[0].review_count, 0);
        assert_eq!(unknown.beers[0].avg_rating, 0.0);
    }

    #[test]
    fn legacy_brewery_field_is_a_fallback() {
        let mut legacy = beer(1, 1, "Old Row", &[], 5.0);
        legacy.brewery = "Anchor".into();

        assert_eq!(filed_brewery_names(&legacy), vec!["Anchor"]);
        assert_eq!(filed_brewery_names(&beer(2, 1, "None", &[], 5.0)), vec![UNKNOWN_BREWERY]);
    }

    #[test]
    fn directory_ties_keep_beer_order() {
        let beers = vec![
            beer(1, 99, "First", &["Same"], 5.0),
            beer(2, 99, "Second", &["Same"], 5.0),
        ];

        let directory = brewery_directory(&beers, &[], &[]);

        let names: Vec<&str> = directory[0].beers.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert_eq!(directory[0].beers[0].event_title, "");
    }

    #[test]
    fn accented_breweries_sort_alphabetically() {
        let beers = vec![
            beer(1, 1, "Zed", &["Zeta"], 5.0),
            beer(2, 1, "Saison", &["Étoile"], 5.0),
            beer(3, 1, "Ale", &["Alpha"], 5.0),
            beer(4, 1, "Lager", &["eagle"], 5.0),
        ];

        let directory = brewery_directory(&beers, &[], &[]);

        let names: Vec<&str> = directory.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "eagle", "Étoile", "Zeta"]);
    }

    #[test]
    fn collation_key_folds_case_and_accents() {
        assert_eq!(collation_key("Étoile"), "etoile");
        assert_eq!(collation_key("Brauerei Löwenbräu"), "brauerei lowenbrau");
        assert_eq!(collation_key("STONE"), "stone");
    }
}
