//! Element hierarchy graph and cycle detection
//!
//! `parent` and `children` fields link elements into a hierarchy that must be
//! a forest. The graph stores child → parent edges.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Element identifier
pub type NodeId = String;

/// Child → parent graph over defined elements
#[derive(Debug, Clone, Default)]
pub struct HierarchyGraph {
    graph: DiGraph<NodeId, ()>,

    /// Map of identifier to its node index in the graph
    node_indices: HashMap<NodeId, NodeIndex>,
}

impl HierarchyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `child` sits under `parent`
    pub fn add_edge(&mut self, child: impl Into<NodeId>, parent: impl Into<NodeId>) {
        let child = self.node(child.into());
        let parent = self.node(parent.into());
        self.graph.update_edge(child, parent, ());
    }

    fn node(&mut self, id: NodeId) -> NodeIndex {
        if let Some(index) = self.node_indices.get(&id) {
            return *index;
        }
        let index = self.graph.add_node(id.clone());
        self.node_indices.insert(id, index);
        index
    }

    /// Every elementary cycle, each rotated to start at its smallest node
    ///
    /// Cycles are searched per strongly connected component. Within one,
    /// each start node only looks for circuits through nodes that sort after
    /// it, so every cycle is found exactly once. Output is sorted.
    pub fn cycles(&self) -> Vec<Vec<NodeId>> {
        let mut found = BTreeSet::new();

        for component in tarjan_scc(&self.graph) {
            let is_loop = component.len() == 1
                && self.graph.contains_edge(component[0], component[0]);
            if component.len() < 2 && !is_loop {
                continue;
            }

            let mut members: Vec<NodeIndex> = component;
            members.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

            for (position, start) in members.iter().enumerate() {
                let allowed: HashSet<NodeIndex> = members[position..].iter().copied().collect();
                let mut search = CircuitSearch {
                    graph: &self.graph,
                    allowed,
                    start: *start,
                    blocked: HashSet::new(),
                    blocked_by: HashMap::new(),
                    stack: Vec::new(),
                    found: &mut found,
                };
                search.circuit(*start);
            }
        }

        found.into_iter().collect()
    }
}

/// Johnson's circuit search from one start node
struct CircuitSearch<'a> {
    graph: &'a DiGraph<NodeId, ()>,
    allowed: HashSet<NodeIndex>,
    start: NodeIndex,
    blocked: HashSet<NodeIndex>,
    blocked_by: HashMap<NodeIndex, HashSet<NodeIndex>>,
    stack: Vec<NodeIndex>,
    found: &'a mut BTreeSet<Vec<NodeId>>,
}

impl CircuitSearch<'_> {
    fn circuit(&mut self, node: NodeIndex) -> bool {
        let mut closed = false;
        self.stack.push(node);
        self.blocked.insert(node);

        for next in self.successors(node) {
            if next == self.start {
                let cycle: Vec<NodeId> = self.stack.iter().map(|n| self.graph[*n].clone()).collect();
                self.found.insert(cycle);
                closed = true;
            } else if !self.blocked.contains(&next) && self.circuit(next) {
                closed = true;
            }
        }

        if closed {
            self.unblock(node);
        } else {
            for next in self.successors(node) {
                self.blocked_by.entry(next).or_default().insert(node);
            }
        }

        self.stack.pop();
        closed
    }

    fn unblock(&mut self, node: NodeIndex) {
        self.blocked.remove(&node);
        if let Some(waiting) = self.blocked_by.remove(&node) {
            for other in waiting {
                if self.blocked.contains(&other) {
                    self.unblock(other);
                }
            }
        }
    }

    fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = self
            .graph
            .neighbors(node)
            .filter(|n| self.allowed.contains(n))
            .collect();
        next.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        next.dedup();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tree_has_no_cycles() {
        let mut graph = HierarchyGraph::new();
        graph.add_edge("CAP00002", "CAP00001");
        graph.add_edge("CAP00003", "CAP00001");
        graph.add_edge("CAP00004", "CAP00002");
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn finds_cycle_once() {
        let mut graph = HierarchyGraph::new();
        graph.add_edge("CAP00003", "CAP00001");
        graph.add_edge("CAP00001", "CAP00002");
        graph.add_edge("CAP00002", "CAP00003");
        graph.add_edge("CAP00004", "CAP00003");

        let cycles = graph.cycles();
        assert_eq!(cycles, vec![vec!["CAP00001", "CAP00002", "CAP00003"]]);
    }

    #[test]
    fn cycles_sharing_an_edge_are_each_reported() {
        let mut graph = HierarchyGraph::new();
        graph.add_edge("A", "B");
        graph.add_edge("A", "C");
        graph.add_edge("B", "D");
        graph.add_edge("C", "D");
        graph.add_edge("D", "A");

        assert_eq!(
            graph.cycles(),
            vec![vec!["A", "B", "D"], vec!["A", "C", "D"]]
        );
    }

    #[test]
    fn overlapping_cycles_in_one_component() {
        let mut graph = HierarchyGraph::new();
        graph.add_edge("A", "B");
        graph.add_edge("B", "A");
        graph.add_edge("B", "C");
        graph.add_edge("C", "B");

        assert_eq!(graph.cycles(), vec![vec!["A", "B"], vec!["B", "C"]]);
    }

    #[test]
    fn self_parent_is_cycle() {
        let mut graph = HierarchyGraph::new();
        graph.add_edge("CAP00001", "CAP00001");
        assert_eq!(graph.cycles(), vec![vec!["CAP00001"]]);
    }

    #[test]
    fn repeated_edges_do_not_repeat_cycles() {
        let mut graph = HierarchyGraph::new();
        graph.add_edge("X00001", "X00002");
        graph.add_edge("X00001", "X00002");
        graph.add_edge("X00002", "X00001");
        assert_eq!(graph.cycles().len(), 1);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut a = HierarchyGraph::new();
        a.add_edge("X00001", "X00002");
        a.add_edge("X00002", "X00001");
        let mut b = HierarchyGraph::new();
        b.add_edge("X00002", "X00001");
        b.add_edge("X00001", "X00002");
        assert_eq!(a.cycles(), b.cycles());
    }
}
