//! [`ActionDescriptor`] binds a [`PlanAction`] (the planning-time
//! preconditions/effects/weight) to a live `execute` body against the
//! game server. Modeled as a single capability per Design Notes §9 rather
//! than a base-class hierarchy: shared behavior (movement validation,
//! search helpers, result formatting) lives in free functions in
//! `support.rs`, composed by whichever descriptor needs them.

use crate::context::ActionContext;
use crate::result::ActionResult;
use agent_client::GameClient;
use agent_planning::PlanAction;
use async_trait::async_trait;

#[async_trait]
pub trait ActionDescriptor: PlanAction {
    async fn execute(&self, client: &dyn GameClient, ctx: &mut ActionContext) -> ActionResult;
}
