use std::{convert::Infallible, str::FromStr};

use rand::seq::SliceRandom;

use crate::models::quotes::Quote;

pub const ALL_CATEGORIES: &str = "all";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() || s == ALL_CATEGORIES {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Only(s.to_string()))
        }
    }
}

impl From<Option<String>> for CategoryFilter {
    fn from(category: Option<String>) -> Self {
        match category {
            Some(category) => category.parse().unwrap_or_default(),
            None => CategoryFilter::All,
        }
    }
}

/// Quotes whose category matches exactly (case-sensitive), or all of them.
pub fn filter_by_category<'a>(quotes: &'a [Quote], filter: &CategoryFilter) -> Vec<&'a Quote> {
    match filter {
        CategoryFilter::All => quotes.iter().collect(),
        CategoryFilter::Only(category) => quotes
            .iter()
            .filter(|quote| &quote.category == category)
            .collect(),
    }
}

pub fn select_random<T>(pool: &[T]) -> Option<&T> {
    pool.choose(&mut rand::thread_rng())
}

/// Distinct categories in the order they first appear.
pub fn categories(quotes: &[Quote]) -> Vec<String> {
    let mut seen = Vec::new();

    for quote in quotes {
        if !seen.contains(&quote.category) {
            seen.push(quote.category.clone());
        }
    }

    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Quote> {
        vec![
            Quote::new("a", "Life"),
            Quote::new("b", "Motivation"),
            Quote::new("c", "Life"),
            Quote::new("d", "life"),
        ]
    }

    #[test]
    fn parses_all_sentinel() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!("".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(CategoryFilter::from(None), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from(Some(" Life ".to_string())),
            CategoryFilter::Only("Life".to_string())
        );
    }

    #[test]
    fn all_sentinel_is_case_sensitive() {
        assert_eq!(
            "All".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only("All".to_string())
        );
        assert_eq!(
            "ALL".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only("ALL".to_string())
        );

        let quotes = vec![Quote::new("a", "All"), Quote::new("b", "Life")];
        let filtered = filter_by_category(&quotes, &"All".parse().unwrap());

        assert_eq!(filtered, vec![&Quote::new("a", "All")]);
    }

    #[test]
    fn all_returns_everything() {
        let quotes = sample();
        let filtered = filter_by_category(&quotes, &CategoryFilter::All);

        assert_eq!(filtered.len(), quotes.len());
    }

    #[test]
    fn category_match_is_exact() {
        let quotes = sample();
        let filtered = filter_by_category(&quotes, &CategoryFilter::Only("Life".into()));

        assert_eq!(
            filtered,
            vec![&Quote::new("a", "Life"), &Quote::new("c", "Life")]
        );
    }

    #[test]
    fn unknown_category_is_empty() {
        let quotes = sample();

        assert!(filter_by_category(&quotes, &CategoryFilter::Only("Nope".into())).is_empty());
    }

    #[test]
    fn random_pick_is_a_member_of_the_pool() {
        let quotes = sample();

        for _ in 0..100 {
            let picked = select_random(&quotes).unwrap();
            assert!(quotes.contains(picked));
        }
    }

    #[test]
    fn random_pick_from_empty_pool_is_none() {
        let empty: Vec<Quote> = vec![];

        assert!(select_random(&empty).is_none());
    }

    #[test]
    fn random_pick_reaches_every_member() {
        let quotes = sample();
        let mut seen = std::collections::HashSet::new();

        for _ in 0..1000 {
            seen.insert(select_random(&quotes).unwrap().text.clone());
        }

        assert_eq!(seen.len(), quotes.len());
    }

    #[test]
    fn categories_are_distinct_in_first_seen_order() {
        assert_eq!(categories(&sample()), vec!["Life", "Motivation", "life"]);
    }
}
