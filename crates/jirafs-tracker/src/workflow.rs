//! Workflow graph for one issue type and the bounded shortest-path search
//! used to move an issue between two statuses.

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One `(from, transition, to)` triple as reported by the tracker.
pub struct WorkflowEdge {
    pub from: String,
    pub transition: String,
    pub to: String,
}

impl WorkflowEdge {
    pub fn new(from: &str, transition: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            transition: transition.to_string(),
            to: to.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStep {
    pub transition: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("no workflow path from '{from}' to '{to}' within {max_steps} steps")]
    NoPathFound {
        from: String,
        to: String,
        max_steps: usize,
    },
}

#[derive(Debug, Clone, Default)]
/// Directed graph of statuses. Outgoing steps keep the order the tracker
/// returned them in, which makes `path` deterministic.
pub struct WorkflowGraph {
    statuses: Vec<String>,
    steps: HashMap<String, Vec<WorkflowStep>>,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: impl IntoIterator<Item = WorkflowEdge>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_edge(&edge.from, &edge.transition, &edge.to);
        }
        graph
    }

    pub fn add_edge(&mut self, from: &str, transition: &str, to: &str) {
        self.note_status(from);
        self.note_status(to);
        self.steps
            .entry(from.to_string())
            .or_default()
            .push(WorkflowStep {
                transition: transition.to_string(),
                target: to.to_string(),
            });
    }

    fn note_status(&mut self, status: &str) {
        if !self.statuses.iter().any(|known| known == status) {
            self.statuses.push(status.to_string());
        }
    }

    pub fn steps_from(&self, status: &str) -> &[WorkflowStep] {
        self.steps.get(status).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Breadth-first search for the transition names leading from `from` to
    /// `to` in at most `max_steps` transitions.
    pub fn path(
        &self,
        from: &str,
        to: &str,
        max_steps: usize,
    ) -> Result<Vec<String>, WorkflowError> {
        if from == to {
            return Ok(Vec::new());
        }

        let mut visited = HashSet::from([from.to_string()]);
        let mut queue = VecDeque::from([(from.to_string(), Vec::<String>::new())]);
        while let Some((status, path)) = queue.pop_front() {
            if path.len() >= max_steps {
                continue;
            }
            for step in self.steps_from(&status) {
                if visited.contains(&step.target) {
                    continue;
                }
                let mut next = path.clone();
                next.push(step.transition.clone());
                if step.target == to {
                    return Ok(next);
                }
                visited.insert(step.target.clone());
                queue.push_back((step.target.clone(), next));
            }
        }

        Err(WorkflowError::NoPathFound {
            from: from.to_string(),
            to: to.to_string(),
            max_steps,
        })
    }

    /// Renders one edge per line for diagnostics.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for status in &self.statuses {
            for step in self.steps_from(status) {
                out.push_str(&format!(
                    "{status} --{}--> {}\n",
                    step.transition, step.target
                ));
            }
        }
        out
    }
}
