use super::classify::CheckPolarity;
use crate::block::ProgramPoint;
use crate::vars::VarId;
use serde::{Deserialize, Serialize};

/// One confirmed check-after-dereference occurrence: the pointer was
/// dereferenced on every path reaching `check`, then null-tested there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub var: VarId,
    pub deref: ProgramPoint,
    pub check: ProgramPoint,
    pub polarity: CheckPolarity,
}

/// Reporting collaborator. Invoked once per distinct finding; owns all
/// presentation decisions.
pub trait DerefCheckHandler {
    fn check_after_deref(&mut self, finding: &Finding);
}

/// Handler that keeps findings in report order.
#[derive(Debug, Default, Clone)]
pub struct CollectFindings {
    pub findings: Vec<Finding>,
}

impl CollectFindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

impl DerefCheckHandler for CollectFindings {
    fn check_after_deref(&mut self, finding: &Finding) {
        self.findings.push(finding.clone());
    }
}
