//! Access stage: the "must be authenticated" gate.

use async_trait::async_trait;

use crate::chain::{InboundRequest, Reply, SecurityStage, StageOutcome};
use crate::{AccessPolicy, RequestContext};

pub struct AccessStage {
    policy: AccessPolicy,
}

impl AccessStage {
    pub fn new(policy: AccessPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl SecurityStage for AccessStage {
    fn name(&self) -> &'static str {
        "access"
    }

    async fn apply(&self, request: &InboundRequest, context: &mut RequestContext) -> StageOutcome {
        if context.is_authenticated() || self.policy.is_public(request.method, &request.path) {
            return StageOutcome::Continue;
        }

        tracing::debug!(path = %request.path, "anonymous request to protected resource");
        StageOutcome::Halt(Reply::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;

    use super::*;
    use crate::chain::Method;
    use crate::{Principal, Role};

    #[tokio::test]
    async fn anonymous_protected_request_halts() {
        let stage = AccessStage::new(AccessPolicy::default());
        let mut ctx = RequestContext::new();
        let req = InboundRequest::new(Method::Delete, "/api/schedules/1", Utc::now());

        assert_eq!(
            stage.apply(&req, &mut ctx).await,
            StageOutcome::Halt(Reply::Unauthorized)
        );
    }

    #[tokio::test]
    async fn bound_principal_passes() {
        let stage = AccessStage::new(AccessPolicy::deny_all());
        let mut ctx = RequestContext::new();
        ctx.set(Principal::new("alice", BTreeSet::from([Role::USER])))
            .unwrap();
        let req = InboundRequest::new(Method::Delete, "/api/schedules/1", Utc::now());

        assert_eq!(stage.apply(&req, &mut ctx).await, StageOutcome::Continue);
    }
}
