//! Favorites search, category filter and shuffle.
//!
//! The displayed list is always derived from the favorites list; the filter
//! only keeps the query, the active category set and an optional shuffled
//! order of ids.
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeSet, HashSet};

use crate::model::{Category, Fact};

/// Favorites matching `query` (case-insensitive substring of title, summary
/// or details) whose category is in `categories`. An empty query or an empty
/// category set does not restrict; whitespace is matched literally. Order
/// follows `favorites`.
pub fn filter_favorites<'a>(
    favorites: &'a [Fact],
    query: &str,
    categories: &BTreeSet<Category>,
) -> Vec<&'a Fact> {
    let query = query.to_lowercase();
    favorites
        .iter()
        .filter(|f| categories.is_empty() || categories.contains(&f.category))
        .filter(|f| f.matches_query(&query))
        .collect()
}

#[derive(Debug, Default, Clone)]
pub struct FavoritesFilter {
    query: String,
    categories: BTreeSet<Category>,
    /// Ids in shuffled display order, dropped whenever the criteria change.
    shuffled: Option<Vec<String>>,
}

impl FavoritesFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn categories(&self) -> &BTreeSet<Category> {
        &self.categories
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled.is_some()
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.query {
            self.query = query;
            self.shuffled = None;
        }
    }

    pub fn push_query_char(&mut self, c: char) {
        let mut query = self.query.clone();
        query.push(c);
        self.set_query(query);
    }

    pub fn pop_query_char(&mut self) {
        let mut query = self.query.clone();
        if query.pop().is_some() {
            self.set_query(query);
        }
    }

    /// Add the category to the active set, or remove it if present.
    pub fn toggle_category(&mut self, category: Category) {
        if !self.categories.remove(&category) {
            self.categories.insert(category);
        }
        self.shuffled = None;
    }

    /// Back to "all categories".
    pub fn clear_categories(&mut self) {
        if !self.categories.is_empty() {
            self.categories.clear();
            self.shuffled = None;
        }
    }

    pub fn matches<'a>(&self, favorites: &'a [Fact]) -> Vec<&'a Fact> {
        filter_favorites(favorites, &self.query, &self.categories)
    }

    pub fn match_count(&self, favorites: &[Fact]) -> usize {
        self.matches(favorites).len()
    }

    pub fn can_shuffle(&self, favorites: &[Fact]) -> bool {
        self.match_count(favorites) > 1
    }

    /// The list to show.
    ///
    /// Without a shuffle this is the filtered list. With one, the shuffled
    /// order is kept for facts that still match, and facts that started
    /// matching since are appended in favorites order.
    pub fn displayed<'a>(&self, favorites: &'a [Fact]) -> Vec<&'a Fact> {
        let matches = self.matches(favorites);
        let Some(order) = &self.shuffled else {
            return matches;
        };

        let mut out = Vec::with_capacity(matches.len());
        let mut placed = HashSet::with_capacity(matches.len());
        for id in order {
            if let Some(fact) = matches.iter().find(|f| &f.id == id) {
                out.push(*fact);
                placed.insert(fact.id.as_str());
            }
        }
        for fact in &matches {
            if !placed.contains(fact.id.as_str()) {
                out.push(*fact);
            }
        }
        out
    }

    pub fn shuffle(&mut self, favorites: &[Fact]) {
        self.shuffle_with(favorites, &mut rand::rng());
    }

    /// Shuffle the currently displayed sequence.
    pub fn shuffle_with<R: Rng>(&mut self, favorites: &[Fact], rng: &mut R) {
        let mut ids: Vec<String> = self
            .displayed(favorites)
            .into_iter()
            .map(|f| f.id.clone())
            .collect();
        if ids.len() < 2 {
            return;
        }
        ids.shuffle(rng);
        self.shuffled = Some(ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn fact(id: &str, title: &str, category: Category) -> Fact {
        Fact {
            id: id.to_string(),
            title: title.to_string(),
            summary: format!("{title} summary"),
            details: format!("{title} details"),
            category,
            video_url: String::new(),
            image_url: None,
        }
    }

    fn sample() -> Vec<Fact> {
        vec![
            fact("a", "Haunted Lighthouse", Category::Ghost),
            fact("b", "Phoenix Lights", Category::Ufo),
            fact("c", "Grey Lady", Category::Ghost),
        ]
    }

    fn ids<'a>(facts: &[&'a Fact]) -> Vec<&'a str> {
        facts.iter().map(|f| f.id.as_str()).collect()
    }

    fn set(categories: &[Category]) -> BTreeSet<Category> {
        categories.iter().copied().collect()
    }

    #[test]
    fn test_empty_criteria_returns_everything() {
        let favs = sample();
        assert_eq!(ids(&filter_favorites(&favs, "", &set(&[]))), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_whitespace_query_matches_literally() {
        let mut favs = sample();
        favs.push(Fact {
            summary: "Roswell".to_string(),
            details: "1947".to_string(),
            ..fact("d", "Roswell", Category::Ufo)
        });

        assert_eq!(ids(&filter_favorites(&favs, " ", &set(&[]))), vec!["a", "b", "c"]);
        assert!(filter_favorites(&favs, "   ", &set(&[])).is_empty());
    }

    #[test]
    fn test_category_filter() {
        let favs = sample();
        assert_eq!(
            ids(&filter_favorites(&favs, "", &set(&[Category::Ghost]))),
            vec!["a", "c"]
        );
        assert_eq!(
            ids(&filter_favorites(&favs, "", &set(&[Category::Ghost, Category::Ufo]))),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_query_is_case_insensitive_over_all_text() {
        let favs = sample();
        assert_eq!(ids(&filter_favorites(&favs, "LIGHT", &set(&[]))), vec!["a", "b"]);
        assert_eq!(ids(&filter_favorites(&favs, "lady details", &set(&[]))), vec!["c"]);
        assert!(filter_favorites(&favs, "vampire", &set(&[])).is_empty());
    }

    #[test]
    fn test_query_and_category_combine() {
        let favs = sample();
        assert_eq!(
            ids(&filter_favorites(&favs, "light", &set(&[Category::Ghost]))),
            vec!["a"]
        );
    }

    #[test]
    fn test_toggle_category_twice_restores() {
        let mut filter = FavoritesFilter::new();
        filter.toggle_category(Category::Ghost);
        assert!(filter.categories().contains(&Category::Ghost));
        filter.toggle_category(Category::Ghost);
        assert!(filter.categories().is_empty());
    }

    #[test]
    fn test_can_shuffle_needs_two_matches() {
        let favs = sample();
        let mut filter = FavoritesFilter::new();
        assert!(filter.can_shuffle(&favs));
        filter.set_query("phoenix");
        assert!(!filter.can_shuffle(&favs));
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let favs = sample();
        let mut filter = FavoritesFilter::new();
        filter.shuffle_with(&favs, &mut StdRng::seed_from_u64(7));
        assert!(filter.is_shuffled());

        let mut shown = ids(&filter.displayed(&favs));
        shown.sort_unstable();
        assert_eq!(shown, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_shuffle_with_single_match_is_noop() {
        let favs = sample();
        let mut filter = FavoritesFilter::new();
        filter.set_query("phoenix");
        filter.shuffle_with(&favs, &mut StdRng::seed_from_u64(1));
        assert!(!filter.is_shuffled());
    }

    #[test]
    fn test_criteria_change_drops_shuffle() {
        let favs = sample();
        let mut filter = FavoritesFilter::new();
        filter.shuffle_with(&favs, &mut StdRng::seed_from_u64(3));
        filter.set_query("l");
        assert!(!filter.is_shuffled());
        assert_eq!(ids(&filter.displayed(&favs)), ids(&filter.matches(&favs)));

        filter.shuffle_with(&favs, &mut StdRng::seed_from_u64(3));
        filter.toggle_category(Category::Ghost);
        assert!(!filter.is_shuffled());
    }

    #[test]
    fn test_unchanged_query_keeps_shuffle() {
        let favs = sample();
        let mut filter = FavoritesFilter::new();
        filter.set_query("l");
        filter.shuffle_with(&favs, &mut StdRng::seed_from_u64(3));
        filter.set_query("l");
        assert!(filter.is_shuffled());
        filter.clear_categories();
        assert!(filter.is_shuffled());
    }

    #[test]
    fn test_shuffled_order_survives_favorites_change() {
        let mut favs = sample();
        let mut filter = FavoritesFilter::new();
        filter.shuffle_with(&favs, &mut StdRng::seed_from_u64(11));
        let before: Vec<String> = filter
            .displayed(&favs)
            .iter()
            .map(|f| f.id.clone())
            .collect();

        // Remove one, add one: remaining order kept, newcomer appended.
        let removed = before[1].clone();
        favs.retain(|f| f.id != removed);
        favs.push(fact("d", "Black Shuck", Category::Cryptid));

        let after: Vec<String> = filter
            .displayed(&favs)
            .iter()
            .map(|f| f.id.clone())
            .collect();
        let mut expected: Vec<String> = before.into_iter().filter(|id| *id != removed).collect();
        expected.push("d".to_string());
        assert_eq!(after, expected);
    }

    #[test]
    fn test_push_and_pop_query_chars() {
        let mut filter = FavoritesFilter::new();
        filter.push_query_char('g');
        filter.push_query_char('r');
        assert_eq!(filter.query(), "gr");
        filter.pop_query_char();
        assert_eq!(filter.query(), "g");
        filter.pop_query_char();
        filter.pop_query_char();
        assert_eq!(filter.query(), "");
    }

    proptest! {
        #[test]
        fn prop_filtered_is_ordered_subset(query in "[a-z ]{0,4}", ghost in any::<bool>(), ufo in any::<bool>()) {
            let favs = sample();
            let mut cats = BTreeSet::new();
            if ghost { cats.insert(Category::Ghost); }
            if ufo { cats.insert(Category::Ufo); }

            let result = filter_favorites(&favs, &query, &cats);
            let positions: Vec<usize> = result
                .iter()
                .map(|r| favs.iter().position(|f| f.id == r.id).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            for f in result {
                prop_assert!(cats.is_empty() || cats.contains(&f.category));
            }
        }

        #[test]
        fn prop_shuffle_preserves_membership(seed in any::<u64>()) {
            let favs = sample();
            let mut filter = FavoritesFilter::new();
            filter.shuffle_with(&favs, &mut StdRng::seed_from_u64(seed));
            let mut shown: Vec<String> = filter.displayed(&favs).iter().map(|f| f.id.clone()).collect();
            shown.sort();
            prop_assert_eq!(shown, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        }
    }
}
