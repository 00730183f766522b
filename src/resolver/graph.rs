//! Project reference graph of one solution.
//!
//! Nodes are the loaded projects of a solution in declaration order; an edge
//! `a -> b` means project `a` references project `b`, either through a
//! `ProjectReference` or through a `PackageReference` naming a project of the
//! same solution.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::core::project::Project;
use crate::util::names_match;

/// How one project references another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Project,
    Package,
}

/// Reference graph over the projects of one solution.
#[derive(Debug)]
pub struct ProjectGraph {
    graph: DiGraph<Project, EdgeKind>,
    by_path: HashMap<PathBuf, NodeIndex>,
}

impl ProjectGraph {
    /// Build the graph. Node indices follow the order of `projects`.
    pub fn new(projects: Vec<Project>) -> Self {
        let mut graph = DiGraph::with_capacity(projects.len(), projects.len());
        let mut by_path = HashMap::new();
        for project in projects {
            let path = project.absolute_path().to_path_buf();
            let node = graph.add_node(project);
            by_path.entry(path).or_insert(node);
        }

        let mut this = ProjectGraph { graph, by_path };
        this.link();
        this
    }

    fn link(&mut self) {
        let mut edges = Vec::new();

        for from in self.graph.node_indices() {
            let project = &self.graph[from];
            for reference in project.project_references() {
                let target = self
                    .by_path
                    .get(&reference.path)
                    .copied()
                    .or_else(|| self.find(&reference.name));
                match target {
                    Some(to) => edges.push((from, to, EdgeKind::Project)),
                    None => tracing::debug!(
                        "{} references {} outside its solution",
                        project.name(),
                        reference.path.display()
                    ),
                }
            }
            for package in project.package_references() {
                if let Some(to) = self.find(&package.name) {
                    edges.push((from, to, EdgeKind::Package));
                }
            }
        }

        for (from, to, kind) in edges {
            if from != to && !self.graph.contains_edge(from, to) {
                self.graph.add_edge(from, to, kind);
            }
        }
    }

    /// First project named `name` (case-insensitive).
    fn find(&self, name: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&n| names_match(self.graph[n].name(), name))
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The project at `node`.
    pub fn project(&self, node: NodeIndex) -> &Project {
        &self.graph[node]
    }

    /// All nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Every project named `name` (case-insensitive).
    pub fn named(&self, name: &str) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&n| names_match(self.graph[n].name(), name))
            .collect()
    }

    /// Projects `node` references directly.
    pub fn references(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<_> = self.graph.neighbors(node).collect();
        out.sort();
        out
    }

    /// How `from` references `to` directly, if it does.
    pub fn edge_kind(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeKind> {
        self.graph
            .find_edge(from, to)
            .map(|e| self.graph[e])
    }

    /// Projects that reach any of `sources` through references, directly or
    /// transitively, in declaration order. The sources are never included.
    pub fn consumers_of(&self, sources: &[NodeIndex]) -> Vec<NodeIndex> {
        let mut visited: HashSet<NodeIndex> = sources.iter().copied().collect();
        let mut queue: VecDeque<NodeIndex> = sources.iter().copied().collect();
        let mut consumers = Vec::new();

        while let Some(node) = queue.pop_front() {
            for dependent in self.graph.neighbors_directed(node, Direction::Incoming) {
                if visited.insert(dependent) {
                    consumers.push(dependent);
                    queue.push_back(dependent);
                }
            }
        }

        consumers.sort();
        consumers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn project(name: &str, refs: &[&str], packages: &[&str]) -> Project {
        let mut xml = String::from("<Project><ItemGroup>");
        for r in refs {
            xml.push_str(&format!(r#"<ProjectReference Include="..\{r}\{r}.csproj" />"#));
        }
        for p in packages {
            xml.push_str(&format!(r#"<PackageReference Include="{p}" Version="1.0.0" />"#));
        }
        xml.push_str("</ItemGroup></Project>");

        let path = PathBuf::from(format!("/w/{name}/{name}.csproj"));
        Project::parse(&xml, &path, Path::new("/w/W.sln")).unwrap()
    }

    fn names(graph: &ProjectGraph, nodes: &[NodeIndex]) -> Vec<String> {
        nodes
            .iter()
            .map(|&n| graph.project(n).name().to_string())
            .collect()
    }

    #[test]
    fn test_transitive_consumers() {
        let graph = ProjectGraph::new(vec![
            project("Core", &[], &[]),
            project("Ui", &["Core"], &[]),
            project("App", &["Ui"], &[]),
            project("Tool", &[], &[]),
        ]);

        let core = graph.named("core");
        assert_eq!(names(&graph, &graph.consumers_of(&core)), vec!["Ui", "App"]);
        assert_eq!(graph.edge_kind(NodeIndex::new(1), NodeIndex::new(0)), Some(EdgeKind::Project));
    }

    #[test]
    fn test_cycles_terminate() {
        let graph = ProjectGraph::new(vec![
            project("A", &["B"], &[]),
            project("B", &["A"], &[]),
        ]);

        let a = graph.named("A");
        assert_eq!(names(&graph, &graph.consumers_of(&a)), vec!["B"]);
        let b = graph.named("B");
        assert_eq!(names(&graph, &graph.consumers_of(&b)), vec!["A"]);
    }

    #[test]
    fn test_self_reference_is_not_a_consumer() {
        let graph = ProjectGraph::new(vec![project("Core", &["Core"], &["Core"])]);
        let core = graph.named("Core");
        assert!(graph.consumers_of(&core).is_empty());
        assert!(graph.references(core[0]).is_empty());
    }

    #[test]
    fn test_package_reference_to_sibling_is_an_edge() {
        let graph = ProjectGraph::new(vec![
            project("Core", &[], &[]),
            project("App", &[], &["core", "Newtonsoft.Json"]),
        ]);

        let core = graph.named("Core");
        assert_eq!(names(&graph, &graph.consumers_of(&core)), vec!["App"]);
        assert_eq!(
            graph.edge_kind(NodeIndex::new(1), NodeIndex::new(0)),
            Some(EdgeKind::Package)
        );
        assert_eq!(graph.references(NodeIndex::new(1)), vec![NodeIndex::new(0)]);
    }

    #[test]
    fn test_reference_outside_solution_is_ignored() {
        let graph = ProjectGraph::new(vec![project("App", &["Elsewhere"], &[])]);
        assert_eq!(graph.len(), 1);
        assert!(graph.references(NodeIndex::new(0)).is_empty());
    }
}
