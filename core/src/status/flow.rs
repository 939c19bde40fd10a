//! Flow tables: an ordered sequence of statuses plus a terminal set, selected
//! per container type and tags. A direct generalization of a fixed
//! transition-legality match table into data, because tag-selected flows mean
//! the graph is no longer a single hardcoded set of edges.

use crate::models::ContainerType;
use crate::status::role::Role;
use std::collections::HashSet;

/// One named, ordered status sequence for a container type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    pub name: &'static str,
    pub container_type: ContainerType,
    /// Tags that select this flow. An empty slice marks the default flow for
    /// the container type.
    pub selector_tags: &'static [&'static str],
    pub sequence: &'static [&'static str],
    pub terminal_statuses: &'static [&'static str],
    pub role_overrides: &'static [(&'static str, Role)],
}

/// The resolved flow for a specific entity, returned by
/// `StatusProgressionService::get_flow_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowPath {
    pub flow_sequence: Vec<&'static str>,
    pub terminal_statuses: HashSet<&'static str>,
    pub active_flow: &'static str,
}

impl FlowPath {
    pub fn is_terminal(&self, status: &str) -> bool {
        self.terminal_statuses.contains(status)
    }

    /// The first element of the sequence is the entry status.
    pub fn is_first(&self, status: &str) -> bool {
        self.flow_sequence.first().map(|s| *s == status).unwrap_or(false)
    }

    /// The element following `status` in the sequence, or `None` if `status`
    /// is not in the sequence or is the last element.
    pub fn successor_of(&self, status: &str) -> Option<&'static str> {
        let idx = self.flow_sequence.iter().position(|s| *s == status)?;
        self.flow_sequence.get(idx + 1).copied()
    }

    /// The element preceding `status` in the sequence.
    pub fn predecessor_of(&self, status: &str) -> Option<&'static str> {
        let idx = self.flow_sequence.iter().position(|s| *s == status)?;
        idx.checked_sub(1).and_then(|i| self.flow_sequence.get(i).copied())
    }

    pub fn contains(&self, status: &str) -> bool {
        self.flow_sequence.iter().any(|s| *s == status)
    }
}

fn project_default() -> Flow {
    Flow {
        name: "default",
        container_type: ContainerType::Project,
        selector_tags: &[],
        sequence: &["planning", "in-development", "completed"],
        terminal_statuses: &["completed", "archived"],
        role_overrides: &[
            ("planning", Role::Planning),
            ("in-development", Role::Work),
            ("completed", Role::Terminal),
            ("archived", Role::Terminal),
        ],
    }
}

fn feature_default() -> Flow {
    Flow {
        name: "default",
        container_type: ContainerType::Feature,
        selector_tags: &[],
        sequence: &["planning", "in-development", "completed"],
        terminal_statuses: &["completed", "archived"],
        role_overrides: &[
            ("planning", Role::Planning),
            ("in-development", Role::Work),
            ("completed", Role::Terminal),
            ("archived", Role::Terminal),
        ],
    }
}

fn task_default() -> Flow {
    Flow {
        name: "default",
        container_type: ContainerType::Task,
        selector_tags: &[],
        sequence: &["pending", "in-progress", "completed"],
        terminal_statuses: &["completed", "cancelled", "deferred"],
        role_overrides: &[
            ("pending", Role::Planning),
            ("in-progress", Role::Work),
            ("completed", Role::Terminal),
            ("cancelled", Role::Terminal),
            ("deferred", Role::Terminal),
        ],
    }
}

/// Review flow for tasks tagged `review`: inserts an explicit review step
/// ahead of completion.
fn task_review_flow() -> Flow {
    Flow {
        name: "review",
        container_type: ContainerType::Task,
        selector_tags: &["review"],
        sequence: &["pending", "in-progress", "review", "completed"],
        terminal_statuses: &["completed", "cancelled", "deferred"],
        role_overrides: &[
            ("pending", Role::Planning),
            ("in-progress", Role::Work),
            ("review", Role::Review),
            ("completed", Role::Terminal),
            ("cancelled", Role::Terminal),
            ("deferred", Role::Terminal),
        ],
    }
}

/// All flows known to the engine. New flows are added here; nothing else in
/// the engine hardcodes a status graph.
pub fn default_flows() -> Vec<Flow> {
    vec![
        project_default(),
        feature_default(),
        task_default(),
        task_review_flow(),
    ]
}

/// Selects the active flow for a container type given its tags.
///
/// Selection order: exact tag match first, then the default (empty-selector)
/// flow. Deterministic tie-break: lexicographic on flow name when more than
/// one tagged flow matches.
pub fn select_flow<'a>(flows: &'a [Flow], container_type: ContainerType, tags: &[String]) -> Option<&'a Flow> {
    let candidates: Vec<&Flow> = flows
        .iter()
        .filter(|f| f.container_type == container_type)
        .collect();

    let mut tagged: Vec<&Flow> = candidates
        .iter()
        .filter(|f| {
            !f.selector_tags.is_empty()
                && f.selector_tags.iter().any(|sel| tags.iter().any(|t| t == sel))
        })
        .copied()
        .collect();
    tagged.sort_by_key(|f| f.name);
    if let Some(first) = tagged.into_iter().next() {
        return Some(first);
    }

    candidates.into_iter().find(|f| f.selector_tags.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flow_selected_when_no_tags_match() {
        let flows = default_flows();
        let flow = select_flow(&flows, ContainerType::Task, &[]).unwrap();
        assert_eq!(flow.name, "default");
    }

    #[test]
    fn tagged_flow_preferred_over_default() {
        let flows = default_flows();
        let tags = vec!["review".to_string()];
        let flow = select_flow(&flows, ContainerType::Task, &tags).unwrap();
        assert_eq!(flow.name, "review");
    }

    #[test]
    fn flow_path_successor_and_predecessor() {
        let path = FlowPath {
            flow_sequence: vec!["pending", "in-progress", "completed"],
            terminal_statuses: ["completed", "cancelled", "deferred"].into_iter().collect(),
            active_flow: "default",
        };
        assert_eq!(path.successor_of("pending"), Some("in-progress"));
        assert_eq!(path.predecessor_of("in-progress"), Some("pending"));
        assert_eq!(path.successor_of("completed"), None);
        assert!(path.is_first("pending"));
        assert!(path.is_terminal("cancelled"));
    }
}
