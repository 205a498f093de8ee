use crate::error::Result;
use crate::models::Rating;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Per-device rating aggregates
pub trait RatingStore: Send + Sync {
    /// Add one score and return the updated aggregate
    fn add(&self, device_id: &str, score: f64) -> Result<Rating>;
}

/// All devices share one lock
#[derive(Debug, Default)]
pub struct InMemoryRatingStore {
    ratings: Mutex<HashMap<String, Rating>>,
}

impl InMemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RatingStore for InMemoryRatingStore {
    fn add(&self, device_id: &str, score: f64) -> Result<Rating> {
        let mut ratings = self.ratings.lock();
        match ratings.get_mut(device_id) {
            Some(rating) => {
                rating.add(score)?;
                Ok(*rating)
            }
            None => {
                let rating = Rating::first(score);
                ratings.insert(device_id.to_string(), rating);
                Ok(rating)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_add_upserts() {
        let store = InMemoryRatingStore::new();

        let first = store.add("a", 8.0).unwrap();
        assert_eq!(first, Rating { count: 1, sum: 8.0 });

        let second = store.add("a", 7.5).unwrap();
        assert_eq!(second, Rating { count: 2, sum: 15.5 });

        let other = store.add("b", 3.0).unwrap();
        assert_eq!(other.count, 1);
    }

    #[test]
    fn test_full_rating_rejects_more_scores() {
        let store = InMemoryRatingStore::new();
        store.ratings.lock().insert(
            "a".to_string(),
            Rating {
                count: u32::MAX,
                sum: 10.0,
            },
        );

        let err = store.add("a", 5.0).unwrap_err();
        assert!(matches!(err, crate::error::CatalogError::ResourceLimit(_)));
        assert_eq!(store.ratings.lock()["a"].count, u32::MAX);
    }

    #[test]
    fn test_concurrent_adds_are_all_counted() {
        let store = Arc::new(InMemoryRatingStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.add("device", 1.0).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let rating = store.add("device", 0.0).unwrap();
        assert_eq!(rating.count, 801);
        assert_eq!(rating.sum, 800.0);
    }
}
