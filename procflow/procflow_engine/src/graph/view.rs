//! A borrowed, adjacency-indexed view of one schema's graph.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use procflow_core::error::Result;
use procflow_core::id::{ElementId, SchemaId};

use crate::model::{Connection, Element, ElementType};
use crate::store::GraphTables;

/// Elements and connections of a single schema with adjacency lists.
///
/// Connections whose endpoints are not both present are kept out of the
/// adjacency lists, so traversals never see dangling edges.
#[derive(Debug, Clone)]
pub struct SchemaGraph<'a> {
    elements: BTreeMap<ElementId, &'a Element>,
    order: Vec<ElementId>,
    connection_count: usize,
    outgoing: BTreeMap<ElementId, Vec<&'a Connection>>,
    incoming: BTreeMap<ElementId, Vec<&'a Connection>>,
}

impl<'a> SchemaGraph<'a> {
    /// Build the view of a stored schema.
    pub fn build(tables: &'a GraphTables, schema_id: &SchemaId) -> Result<Self> {
        tables.schema(schema_id)?;
        Ok(Self::from_parts(
            tables.elements_of(schema_id),
            tables.connections_of(schema_id),
        ))
    }

    pub fn from_parts(elements: Vec<&'a Element>, connections: Vec<&'a Connection>) -> Self {
        let order: Vec<ElementId> = elements.iter().map(|e| e.id).collect();
        let elements: BTreeMap<ElementId, &'a Element> =
            elements.into_iter().map(|e| (e.id, e)).collect();

        let mut outgoing: BTreeMap<ElementId, Vec<&'a Connection>> = BTreeMap::new();
        let mut incoming: BTreeMap<ElementId, Vec<&'a Connection>> = BTreeMap::new();
        let connection_count = connections.len();
        for connection in connections {
            if !elements.contains_key(&connection.source_id)
                || !elements.contains_key(&connection.target_id)
            {
                continue;
            }
            outgoing
                .entry(connection.source_id)
                .or_default()
                .push(connection);
            incoming
                .entry(connection.target_id)
                .or_default()
                .push(connection);
        }

        Self {
            elements,
            order,
            connection_count,
            outgoing,
            incoming,
        }
    }

    pub fn element(&self, id: &ElementId) -> Option<&'a Element> {
        self.elements.get(id).copied()
    }

    /// Elements in creation order.
    pub fn elements(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.order.iter().filter_map(|id| self.elements.get(id).copied())
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of stored connections, dangling ones included.
    pub fn connection_count(&self) -> usize {
        self.connection_count
    }

    pub fn of_type(&self, kind: ElementType) -> Vec<&'a Element> {
        self.elements().filter(|e| e.element_type == kind).collect()
    }

    pub fn outgoing(&self, id: &ElementId) -> &[&'a Connection] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn incoming(&self, id: &ElementId) -> &[&'a Connection] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Distinct targets of `id`'s outgoing edges, parallel edges collapsed.
    pub fn successors(&self, id: &ElementId) -> Vec<&'a Element> {
        self.distinct(self.outgoing(id).iter().map(|c| &c.target_id))
    }

    /// Distinct sources of `id`'s incoming edges, parallel edges collapsed.
    pub fn predecessors(&self, id: &ElementId) -> Vec<&'a Element> {
        self.distinct(self.incoming(id).iter().map(|c| &c.source_id))
    }

    fn distinct<'i>(&self, ids: impl Iterator<Item = &'i ElementId>) -> Vec<&'a Element> {
        let mut seen = BTreeSet::new();
        ids.filter(|id| seen.insert(**id))
            .filter_map(|id| self.element(id))
            .collect()
    }

    /// Ids of elements that are an endpoint of at least one connection.
    pub fn touched(&self) -> BTreeSet<ElementId> {
        self.outgoing
            .keys()
            .chain(self.incoming.keys())
            .copied()
            .collect()
    }

    /// Everything reachable from the given sources, sources included.
    pub fn reachable_from(&self, sources: &[ElementId]) -> BTreeSet<ElementId> {
        let mut visited: BTreeSet<ElementId> = BTreeSet::new();
        let mut queue: VecDeque<ElementId> = VecDeque::new();
        for source in sources {
            if visited.insert(*source) {
                queue.push_back(*source);
            }
        }

        while let Some(node) = queue.pop_front() {
            for connection in self.outgoing(&node) {
                if visited.insert(connection.target_id) {
                    queue.push_back(connection.target_id);
                }
            }
        }
        visited
    }

    /// Every element upstream of `id`, nearest first, `id` itself excluded.
    pub fn ancestors(&self, id: &ElementId) -> Vec<&'a Element> {
        let mut seen: BTreeSet<ElementId> = BTreeSet::from([*id]);
        let mut queue: VecDeque<ElementId> = VecDeque::from([*id]);
        let mut found = Vec::new();

        while let Some(node) = queue.pop_front() {
            for connection in self.incoming(&node) {
                if seen.insert(connection.source_id) {
                    if let Some(element) = self.element(&connection.source_id) {
                        found.push(element);
                    }
                    queue.push_back(connection.source_id);
                }
            }
        }
        found
    }

    /// Whether any directed cycle exists, searching from every element.
    pub fn has_cycle(&self) -> bool {
        let mut visited = HashSet::new();
        let mut in_stack = HashSet::new();

        self.order
            .iter()
            .any(|id| !visited.contains(id) && self.has_cycle_from(*id, &mut visited, &mut in_stack))
    }

    /// Depth-first search with an explicit stack of (node, next edge index).
    fn has_cycle_from(
        &self,
        root: ElementId,
        visited: &mut HashSet<ElementId>,
        in_stack: &mut HashSet<ElementId>,
    ) -> bool {
        visited.insert(root);
        in_stack.insert(root);
        let mut stack: Vec<(ElementId, usize)> = vec![(root, 0)];

        while let Some(&(node, next)) = stack.last() {
            match self.outgoing(&node).get(next) {
                Some(connection) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    let target = connection.target_id;
                    if in_stack.contains(&target) {
                        return true;
                    }
                    if visited.insert(target) {
                        in_stack.insert(target);
                        stack.push((target, 0));
                    }
                }
                None => {
                    in_stack.remove(&node);
                    stack.pop();
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn elements(schema: SchemaId, kinds: &[ElementType]) -> Vec<Element> {
        let base = Utc::now();
        kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let mut e = Element::new(schema, *kind, format!("e{}", i));
                e.created_at = base + Duration::seconds(i as i64);
                e
            })
            .collect()
    }

    fn edge(schema: SchemaId, a: &Element, b: &Element) -> Connection {
        Connection::sequence(schema, a.id, b.id)
    }

    #[test]
    fn test_dangling_edges_are_ignored() {
        let schema = SchemaId::new();
        let e = elements(schema, &[ElementType::Start, ElementType::End]);
        let ghost = Element::new(schema, ElementType::Process, "ghost");
        let connections = vec![edge(schema, &e[0], &e[1]), edge(schema, &e[0], &ghost)];

        let graph = SchemaGraph::from_parts(e.iter().collect(), connections.iter().collect());
        assert_eq!(graph.connection_count(), 2);
        assert_eq!(graph.successors(&e[0].id).len(), 1);
        assert_eq!(graph.touched().len(), 2);
    }

    #[test]
    fn test_reachability_and_ancestors() {
        use ElementType::*;
        let schema = SchemaId::new();
        let e = elements(schema, &[Start, Process, Decision, Process, End]);
        let connections = vec![
            edge(schema, &e[0], &e[1]),
            edge(schema, &e[1], &e[2]),
            edge(schema, &e[2], &e[3]),
        ];
        let graph = SchemaGraph::from_parts(e.iter().collect(), connections.iter().collect());

        let reached = graph.reachable_from(&[e[0].id]);
        assert!(reached.contains(&e[3].id));
        assert!(!reached.contains(&e[4].id));

        let names: Vec<&str> = graph.ancestors(&e[3].id).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["e2", "e1", "e0"]);
    }

    #[test]
    fn test_cycle_detection() {
        use ElementType::*;
        let schema = SchemaId::new();
        let e = elements(schema, &[Process, Decision, Process]);
        let mut connections = vec![edge(schema, &e[0], &e[1]), edge(schema, &e[1], &e[2])];
        {
            let graph = SchemaGraph::from_parts(e.iter().collect(), connections.iter().collect());
            assert!(!graph.has_cycle());
        }

        connections.push(edge(schema, &e[1], &e[0]));
        let graph = SchemaGraph::from_parts(e.iter().collect(), connections.iter().collect());
        assert!(graph.has_cycle());
    }

    #[test]
    fn test_parallel_edges_collapse() {
        use ElementType::*;
        let schema = SchemaId::new();
        let e = elements(schema, &[Process, Decision]);
        let connections = vec![edge(schema, &e[0], &e[1]), edge(schema, &e[0], &e[1])];
        let graph = SchemaGraph::from_parts(e.iter().collect(), connections.iter().collect());

        assert_eq!(graph.outgoing(&e[0].id).len(), 2);
        assert_eq!(graph.successors(&e[0].id).len(), 1);
        assert_eq!(graph.predecessors(&e[1].id).len(), 1);
    }

    #[test]
    fn test_long_chain_cycle_search() {
        use ElementType::*;
        let schema = SchemaId::new();
        let kinds: Vec<ElementType> = (0..100_000)
            .map(|i| if i % 2 == 0 { Process } else { Decision })
            .collect();
        let e = elements(schema, &kinds);
        let mut connections: Vec<Connection> =
            e.windows(2).map(|pair| edge(schema, &pair[0], &pair[1])).collect();
        {
            let graph = SchemaGraph::from_parts(e.iter().collect(), connections.iter().collect());
            assert!(!graph.has_cycle());
        }

        connections.push(edge(schema, &e[e.len() - 1], &e[0]));
        let graph = SchemaGraph::from_parts(e.iter().collect(), connections.iter().collect());
        assert!(graph.has_cycle());
    }
}
