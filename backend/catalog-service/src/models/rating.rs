use crate::error::{CatalogError, Result};

/// Running rating aggregate for one device
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rating {
    pub count: u32,
    pub sum: f64,
}

impl Rating {
    pub fn first(score: f64) -> Self {
        Self {
            count: 1,
            sum: score,
        }
    }

    /// Count one more score; the aggregate is left untouched once `count` is full
    pub fn add(&mut self, score: f64) -> Result<()> {
        self.count = self.count.checked_add(1).ok_or_else(|| {
            CatalogError::ResourceLimit("device has reached the maximum number of ratings".into())
        })?;
        self.sum += score;
        Ok(())
    }

    /// Mean score; 0 when nothing has been rated
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / f64::from(self.count)
    }
}
