use std::collections::HashMap;
use crate::iterator::EstimatorId;

/// Lower/upper score-bound inputs per estimator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundAccumulators {
    lower: HashMap<EstimatorId, u64>,
    upper: HashMap<EstimatorId, u64>,
}

impl BoundAccumulators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: EstimatorId, lower: u64, upper: u64) {
        self.lower.insert(id, lower);
        self.upper.insert(id, upper);
    }

    pub fn lower(&self, id: EstimatorId) -> Option<u64> {
        self.lower.get(&id).copied()
    }

    pub fn upper(&self, id: EstimatorId) -> Option<u64> {
        self.upper.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }
}

/// Evaluation context shared by every cursor compiled for one query
#[derive(Debug, Default)]
pub struct ScoringContext {
    bounds: Option<BoundAccumulators>,
    next_estimator: u64,
}

impl ScoringContext {
    /// Context without bound accumulation
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds() -> Self {
        ScoringContext {
            bounds: Some(BoundAccumulators::new()),
            next_estimator: 0,
        }
    }

    pub fn supports_bounds(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn bounds(&self) -> Option<&BoundAccumulators> {
        self.bounds.as_ref()
    }

    pub fn bounds_mut(&mut self) -> Option<&mut BoundAccumulators> {
        self.bounds.as_mut()
    }

    pub(crate) fn allocate_estimator(&mut self) -> EstimatorId {
        let id = EstimatorId(self.next_estimator);
        self.next_estimator += 1;
        id
    }
}
