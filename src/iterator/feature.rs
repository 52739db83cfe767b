use crate::core::error::{Error, Result};
use crate::core::types::DocId;
use crate::iterator::{require, Capabilities, Cursor, CursorRef, EstimatorId};

/// Scoring wrapper over one counting child.
///
/// The wrapper only iterates and exposes the child's counts to a scorer;
/// it takes part in bound estimation under its [`EstimatorId`].
pub struct FeatureCursor {
    key: String,
    child: CursorRef,
    id: EstimatorId,
    scorer: String,
}

impl FeatureCursor {
    pub fn new(
        key: impl Into<String>,
        mut children: Vec<CursorRef>,
        id: EstimatorId,
        scorer: impl Into<String>,
    ) -> Result<Self> {
        if children.len() != 1 {
            return Err(Error::unsupported_node(format!(
                "#feature takes exactly one child, got {}", children.len()
            )));
        }
        require(&children, Capabilities::COUNT, "feature")?;
        Ok(FeatureCursor {
            key: key.into(),
            child: children.remove(0),
            id,
            scorer: scorer.into(),
        })
    }

    pub fn scorer(&self) -> &str {
        &self.scorer
    }

    /// Count the wrapped child reports for `candidate`, 0 when it has none
    pub fn child_count(&self, candidate: DocId) -> Result<u32> {
        let child = self.child.borrow();
        if !child.is_done() && child.current_candidate()? == candidate && child.has_match(candidate) {
            child.count()
        } else {
            Ok(0)
        }
    }
}

impl Cursor for FeatureCursor {
    fn capabilities(&self) -> Capabilities {
        Capabilities::ESTIMATOR
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn is_done(&self) -> bool {
        self.child.borrow().is_done()
    }

    fn current_candidate(&self) -> Result<DocId> {
        self.child.borrow().current_candidate()
    }

    fn has_match(&self, candidate: DocId) -> bool {
        self.child.borrow().has_match(candidate)
    }

    fn move_to(&mut self, candidate: DocId) -> Result<()> {
        self.child.borrow_mut().move_to(candidate)
    }

    fn exhaust(&mut self) {
        self.child.borrow_mut().exhaust();
    }

    fn estimator_id(&self) -> Option<EstimatorId> {
        Some(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::iterator::testing::VecCursor;

    #[test]
    fn wraps_child_counts_without_counting_itself() {
        let child = VecCursor::positions("a", &[(2, &[0, 1]), (5, &[3])]);
        let mut feature = FeatureCursor::new("#feature( a )", vec![child], EstimatorId(7), "bm25").unwrap();

        assert_eq!(feature.estimator_id(), Some(EstimatorId(7)));
        assert_eq!(feature.scorer(), "bm25");
        assert_eq!(feature.child_count(DocId(2)).unwrap(), 2);
        assert_eq!(feature.child_count(DocId(3)).unwrap(), 0);
        assert_eq!(feature.count().unwrap_err().kind(), ErrorKind::UnsupportedNode);

        feature.move_past(DocId(2)).unwrap();
        assert_eq!(feature.current_candidate().unwrap(), DocId(5));
        feature.move_past(DocId(5)).unwrap();
        assert!(feature.is_done());
    }

    #[test]
    fn needs_exactly_one_child() {
        let a = VecCursor::positions("a", &[(1, &[0])]);
        let b = VecCursor::positions("b", &[(1, &[0])]);
        let err = FeatureCursor::new("f", vec![a, b], EstimatorId(0), "bm25").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnsupportedNode);
    }
}
