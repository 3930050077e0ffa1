//! Cross-template dependency graph and depth-first topological sort.
//!
//! An Element whose name is not a host tag is an edge to the template of
//! that name (if one is declared). Templates must be compiled after the
//! templates they reference, so cycles are fatal.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::ast::{Node, Template};
use crate::error::{Result, StacheError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    pub id: String,
    /// Referenced names in first-seen order.
    pub afters: Vec<String>,
}

/// Vertices in template declaration order; edge order follows discovery order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    vertices: IndexMap<String, Vertex>,
}

/// Result of a topological sort: dependencies come before dependents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    pub sorted: Vec<String>,
    /// Names found on a cycle; excluded from `sorted`.
    pub cyclic: BTreeSet<String>,
}

impl DependencyGraph {
    pub fn build(templates: &[Template], externs: &BTreeSet<String>) -> Result<Self> {
        let mut vertices = IndexMap::with_capacity(templates.len());
        for template in templates {
            if vertices.contains_key(&template.name) {
                return Err(StacheError::DuplicateTemplate {
                    name: template.name.clone(),
                });
            }
            let afters = dependencies(&template.roots, externs);
            vertices.insert(
                template.name.clone(),
                Vertex {
                    id: template.name.clone(),
                    afters,
                },
            );
        }
        Ok(Self { vertices })
    }

    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn sort(&self) -> SortOrder {
        let mut state = SortState::default();
        for id in self.vertices.keys() {
            let mut ancestors = Vec::new();
            self.visit(id, &mut ancestors, &mut state);
        }
        let SortState {
            emitted, cyclic, ..
        } = state;
        SortOrder {
            sorted: emitted.into_iter().filter(|id| !cyclic.contains(id)).collect(),
            cyclic,
        }
    }

    fn visit<'a>(&'a self, id: &'a str, ancestors: &mut Vec<&'a str>, state: &mut SortState<'a>) {
        if state.visited.contains(id) {
            return;
        }
        // Names without a vertex are host tags, registry components or unknown.
        let Some(vertex) = self.vertices.get(id) else {
            return;
        };
        state.visited.insert(id);
        ancestors.push(id);
        for after in &vertex.afters {
            if ancestors.contains(&after.as_str()) {
                state.cyclic.insert(id.to_string());
                state.cyclic.insert(after.clone());
            } else {
                self.visit(after, ancestors, state);
            }
        }
        ancestors.pop();
        // Post-order: every dependency is emitted before this vertex.
        state.emitted.push(id.to_string());
    }
}

#[derive(Default)]
struct SortState<'a> {
    visited: HashSet<&'a str>,
    emitted: Vec<String>,
    cyclic: BTreeSet<String>,
}

/// Names a node list depends on, deduplicated in first-seen order.
pub fn dependencies(nodes: &[Node], externs: &BTreeSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut deps = Vec::new();
    for root in nodes {
        root.walk(&mut |node| {
            if let Node::Element { name, .. } = node {
                if !externs.contains(name) && seen.insert(name.as_str()) {
                    deps.push(name.clone());
                }
            }
        });
    }
    deps
}

/// Order templates so each comes after everything it references.
pub fn build_order<'a>(
    templates: &'a [Template],
    externs: &BTreeSet<String>,
) -> Result<Vec<&'a Template>> {
    let graph = DependencyGraph::build(templates, externs)?;
    let SortOrder { sorted, cyclic } = graph.sort();
    if !cyclic.is_empty() {
        warn!(names = ?cyclic, "cyclic template references");
        return Err(StacheError::cyclic(cyclic));
    }
    debug!(order = ?sorted, "computed template compile order");
    let by_name: IndexMap<&str, &Template> =
        templates.iter().map(|t| (t.name.as_str(), t)).collect();
    Ok(sorted
        .iter()
        .filter_map(|name| by_name.get(name.as_str()).copied())
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn el(name: &str, children: Vec<Node>) -> Node {
        Node::element(name, IndexMap::new(), children)
    }

    fn names(order: &[&Template]) -> Vec<String> {
        order.iter().map(|t| t.name.clone()).collect()
    }

    fn externs(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn dependencies_come_first() {
        let templates = vec![
            Template::new("qux", vec![]),
            Template::new("foo", vec![Node::leaf("bar")]),
            Template::new("bar", vec![Node::leaf("qux")]),
        ];
        let order = build_order(&templates, &BTreeSet::new()).unwrap();
        assert_eq!(names(&order), vec!["qux", "bar", "foo"]);
    }

    #[test]
    fn nested_dependency_graph() {
        let templates = vec![
            Template::new(
                "bar",
                vec![Node::leaf("bar-1"), el("qux", vec![Node::leaf("foo")])],
            ),
            Template::new(
                "foo",
                vec![el(
                    "foo-1",
                    vec![
                        Node::leaf("foo-11"),
                        Node::comment("hi"),
                        Node::leaf("foo-12"),
                        Node::inverted_section(
                            "foo-13",
                            vec![
                                Node::text("x"),
                                el(
                                    "foo-131",
                                    vec![Node::section(
                                        "y",
                                        vec![Node::variable("test"), Node::leaf("foo-1311")],
                                    )],
                                ),
                            ],
                        ),
                    ],
                )],
            ),
            Template::new("qux", vec![]),
        ];
        let graph = DependencyGraph::build(&templates, &BTreeSet::new()).unwrap();
        assert_eq!(graph.vertex("bar").unwrap().afters, vec!["bar-1", "qux", "foo"]);
        assert_eq!(
            graph.vertex("foo").unwrap().afters,
            vec!["foo-1", "foo-11", "foo-12", "foo-131", "foo-1311"]
        );
        let order = build_order(&templates, &BTreeSet::new()).unwrap();
        assert_eq!(names(&order), vec!["qux", "foo", "bar"]);
    }

    #[test]
    fn host_tags_are_not_dependencies() {
        let nodes = vec![el("div", vec![Node::leaf("card"), Node::leaf("span")])];
        assert_eq!(dependencies(&nodes, &externs(&["div", "span"])), vec!["card"]);
    }

    #[test]
    fn dependencies_are_deduplicated() {
        let nodes = vec![Node::leaf("a"), Node::leaf("b"), el("a", vec![Node::leaf("b")])];
        assert_eq!(dependencies(&nodes, &BTreeSet::new()), vec!["a", "b"]);
    }

    #[test]
    fn cycles_are_reported_and_excluded() {
        let templates = vec![
            Template::new("a", vec![Node::leaf("b")]),
            Template::new("b", vec![Node::leaf("a")]),
            Template::new("c", vec![]),
        ];
        let graph = DependencyGraph::build(&templates, &BTreeSet::new()).unwrap();
        let order = graph.sort();
        assert_eq!(order.sorted, vec!["c"]);
        assert_eq!(order.cyclic, externs(&["a", "b"]));

        let err = build_order(&templates, &BTreeSet::new()).unwrap_err();
        assert_eq!(
            err,
            StacheError::CyclicDependency {
                names: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let templates = vec![Template::new("a", vec![el("div", vec![Node::leaf("a")])])];
        let err = build_order(&templates, &externs(&["div"])).unwrap_err();
        assert_eq!(err, StacheError::cyclic(["a"]));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let templates = vec![Template::new("a", vec![]), Template::new("a", vec![])];
        let err = DependencyGraph::build(&templates, &BTreeSet::new()).unwrap_err();
        assert_eq!(err, StacheError::DuplicateTemplate { name: "a".into() });
    }

    #[test]
    fn independent_templates_keep_declaration_order() {
        let templates = vec![
            Template::new("x", vec![]),
            Template::new("y", vec![]),
            Template::new("z", vec![]),
        ];
        let order = build_order(&templates, &BTreeSet::new()).unwrap();
        assert_eq!(names(&order), vec!["x", "y", "z"]);
    }
}
