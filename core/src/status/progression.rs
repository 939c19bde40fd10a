//! `StatusProgressionService`: the single chokepoint that decides "what is
//! next", so cascade detection stays oblivious to concrete status names.
//! Shaped after a stateless validator — a struct of associated functions over
//! data tables rather than per-instance state.

use crate::models::ContainerType;
use crate::status::flow::{default_flows, select_flow, Flow, FlowPath};
use crate::status::role::{is_role_at_or_beyond as role_is_at_or_beyond, Role};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// A task whose dependency on the advancing entity is not yet satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blocker {
    pub task_id: Uuid,
    pub title: String,
}

/// The result of asking "what should this container's next status be?"
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextStatusRecommendation {
    /// A successor exists and every prerequisite is satisfied.
    Ready {
        recommended_status: &'static str,
        active_flow: &'static str,
        role: Role,
    },
    /// A successor exists but prerequisites (unsatisfied blockers) remain.
    Blocked { reason: String, blockers: Vec<Blocker> },
    /// `currentStatus` is already a terminal status of its flow.
    AtTerminal,
    /// No flow matches this container type/tags, or `currentStatus` is not
    /// present in the active flow's sequence.
    NoFlow,
}

pub struct StatusProgressionService {
    flows: Vec<Flow>,
}

impl Default for StatusProgressionService {
    fn default() -> Self {
        Self::new(default_flows())
    }
}

impl StatusProgressionService {
    pub fn new(flows: Vec<Flow>) -> Self {
        Self { flows }
    }

    /// Resolves the active flow for a container + tags. `current_status` is
    /// accepted for signature symmetry but does not affect flow selection,
    /// only callers' subsequent lookups into it.
    pub fn get_flow_path(
        &self,
        container_type: ContainerType,
        tags: &[String],
        _current_status: &str,
    ) -> Option<FlowPath> {
        let flow = select_flow(&self.flows, container_type, tags)?;
        Some(FlowPath {
            flow_sequence: flow.sequence.to_vec(),
            terminal_statuses: flow.terminal_statuses.iter().copied().collect::<HashSet<_>>(),
            active_flow: flow.name,
        })
    }

    /// Looks up the role override table of the active flow; an unmapped
    /// status yields a `Role::Custom` of its own name rather than guessing a
    /// named role.
    pub fn get_role_for_status(
        &self,
        status: &str,
        container_type: ContainerType,
        tags: &[String],
    ) -> Role {
        match select_flow(&self.flows, container_type, tags) {
            Some(flow) => flow
                .role_overrides
                .iter()
                .find(|(s, _)| *s == status)
                .map(|(_, role)| role.clone())
                .unwrap_or_else(|| Role::Custom(status.to_string())),
            None => Role::Custom(status.to_string()),
        }
    }

    /// Alias for the C1 helper, kept on this service so flow-local role
    /// mappings can override it in the future without moving call sites.
    pub fn is_role_at_or_beyond(&self, role: &Role, threshold: &Role) -> bool {
        role_is_at_or_beyond(role, threshold)
    }

    /// `blockers` is the caller-resolved set of unsatisfied prerequisites for
    /// the *successor* transition (empty when there are none); computing
    /// that set is `StatusValidator`'s job
    /// (rule 3), not this service's — this keeps progression pure status-flow
    /// arithmetic.
    pub fn get_next_status(
        &self,
        current_status: &str,
        container_type: ContainerType,
        tags: &[String],
        blockers: &[Blocker],
    ) -> NextStatusRecommendation {
        let Some(path) = self.get_flow_path(container_type, tags, current_status) else {
            return NextStatusRecommendation::NoFlow;
        };
        if path.is_terminal(current_status) {
            return NextStatusRecommendation::AtTerminal;
        }
        if !path.contains(current_status) {
            return NextStatusRecommendation::NoFlow;
        }
        let Some(successor) = path.successor_of(current_status) else {
            return NextStatusRecommendation::NoFlow;
        };
        if !blockers.is_empty() {
            return NextStatusRecommendation::Blocked {
                reason: format!(
                    "{} task(s) must satisfy their required role before advancing to '{successor}'",
                    blockers.len()
                ),
                blockers: blockers.to_vec(),
            };
        }
        let role = self.get_role_for_status(successor, container_type, tags);
        NextStatusRecommendation::Ready {
            recommended_status: successor,
            active_flow: path.active_flow,
            role,
        }
    }
}
