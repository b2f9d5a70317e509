//! Parameter dependency graph
//!
//! Edges run from a parameter to every other parameter its expression names.
//! Identifiers that are not parameters (constants, typos) are left out here
//! and reported by the evaluator instead.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::env::ParamEnv;
use crate::error::CycleError;
use crate::parser::parse;

/// name -> names it depends on
pub type DependencyGraph = BTreeMap<String, BTreeSet<String>>;

/// Build the dependency graph of every parameter in `env`.
///
/// A parameter whose expression does not parse has no outgoing edges.
pub fn build_dependency_graph(env: &ParamEnv) -> DependencyGraph {
    let names: BTreeSet<&str> = env.iter().map(|p| p.name.as_str()).collect();

    env.iter()
        .map(|param| {
            let deps = match parse(&param.expression) {
                Ok(expr) => expr
                    .identifiers()
                    .into_iter()
                    .filter(|id| names.contains(id))
                    .map(str::to_string)
                    .collect(),
                Err(_) => BTreeSet::new(),
            };
            (param.name.clone(), deps)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

/// Order nodes so every node comes after the nodes it depends on.
///
/// Fails as a whole on the first cycle; no partial order is returned.
pub fn topological_sort(graph: &DependencyGraph) -> Result<Vec<String>, CycleError> {
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut order = Vec::with_capacity(graph.len());

    for root in graph.keys() {
        if marks.contains_key(root.as_str()) {
            continue;
        }

        marks.insert(root, Mark::Visiting);
        let mut stack = vec![(root.as_str(), dependencies(graph, root))];

        while let Some((node, deps)) = stack.last_mut() {
            match deps.next() {
                Some(dep) => match marks.get(dep) {
                    Some(Mark::Visiting) => return Err(CycleError(dep.to_string())),
                    Some(Mark::Visited) => {}
                    None => {
                        marks.insert(dep, Mark::Visiting);
                        stack.push((dep, dependencies(graph, dep)));
                    }
                },
                None => {
                    let done = *node;
                    marks.insert(done, Mark::Visited);
                    order.push(done.to_string());
                    stack.pop();
                }
            }
        }
    }

    Ok(order)
}

fn dependencies<'g>(
    graph: &'g DependencyGraph,
    node: &str,
) -> impl Iterator<Item = &'g str> + use<'g> {
    graph
        .get(node)
        .into_iter()
        .flatten()
        .map(String::as_str)
        .filter(move |dep| graph.contains_key(*dep))
}

/// Find one cycle in `env`'s dependency graph.
///
/// The path starts and ends at the repeated node: `["a", "b", "a"]`.
pub fn detect_cycles(env: &ParamEnv) -> Option<Vec<String>> {
    let graph = build_dependency_graph(env);
    let mut marks: HashMap<&str, Mark> = HashMap::new();

    for root in graph.keys() {
        if marks.contains_key(root.as_str()) {
            continue;
        }

        marks.insert(root, Mark::Visiting);
        let mut stack = vec![(root.as_str(), dependencies(&graph, root))];

        while let Some((node, deps)) = stack.last_mut() {
            match deps.next() {
                Some(dep) => match marks.get(dep) {
                    Some(Mark::Visiting) => {
                        let start = stack.iter().position(|(n, _)| *n == dep).unwrap_or(0);
                        let mut path: Vec<String> =
                            stack[start..].iter().map(|(n, _)| n.to_string()).collect();
                        path.push(dep.to_string());
                        return Some(path);
                    }
                    Some(Mark::Visited) => {}
                    None => {
                        marks.insert(dep, Mark::Visiting);
                        stack.push((dep, dependencies(&graph, dep)));
                    }
                },
                None => {
                    marks.insert(*node, Mark::Visited);
                    stack.pop();
                }
            }
        }
    }

    None
}

/// Human-readable cycle: `a -> b -> a`
pub fn format_cycle(path: &[String]) -> String {
    path.join(" -> ")
}

/// Every parameter that transitively depends on `name`.
pub fn get_dependents(env: &ParamEnv, name: &str) -> BTreeSet<String> {
    let graph = build_dependency_graph(env);

    let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
    for (node, deps) in &graph {
        for dep in deps {
            reverse.entry(dep.as_str()).or_default().push(node.as_str());
        }
    }

    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([name]);
    while let Some(current) = queue.pop_front() {
        for &dependent in reverse.get(current).into_iter().flatten() {
            if dependent != name && seen.insert(dependent.to_string()) {
                queue.push_back(dependent);
            }
        }
    }

    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> ParamEnv {
        ParamEnv::from_expressions(pairs.iter().copied())
    }

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        edges
            .iter()
            .map(|(n, deps)| (n.to_string(), deps.iter().map(|d| d.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_build_drops_unknown_identifiers() {
        let env = env(&[("a", "1"), ("b", "a * PI + missing")]);
        let graph = build_dependency_graph(&env);
        assert!(graph["a"].is_empty());
        assert_eq!(graph["b"], BTreeSet::from(["a".to_string()]));
    }

    #[test]
    fn test_build_unparsable_has_no_edges() {
        let env = env(&[("a", "1"), ("b", "a +")]);
        assert!(build_dependency_graph(&env)["b"].is_empty());
    }

    #[test]
    fn test_topological_sort_orders_dependencies_first() {
        let g = graph(&[("c", &["b"]), ("b", &["a"]), ("a", &[])]);
        assert_eq!(topological_sort(&g).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_topological_sort_diamond() {
        let g = graph(&[("d", &["b", "c"]), ("b", &["a"]), ("c", &["a"]), ("a", &[])]);
        let order = topological_sort(&g).unwrap();
        let pos = |n: &str| order.iter().position(|o| o == n).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("a") < pos("c"));
        assert!(pos("c") < pos("d"));
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_topological_sort_fails_on_cycle() {
        let g = graph(&[("x", &["y"]), ("y", &["x"]), ("z", &[])]);
        assert!(topological_sort(&g).is_err());
    }

    #[test]
    fn test_detect_cycle_path() {
        let env = env(&[("base", "1"), ("a", "c + base"), ("b", "a"), ("c", "b * 2")]);
        let path = detect_cycles(&env).unwrap();
        assert_eq!(path.first(), path.last());
        assert_eq!(path.len(), 4);
        assert!(!path.contains(&"base".to_string()));
        assert_eq!(format_cycle(&path), "a -> c -> b -> a");
    }

    #[test]
    fn test_detect_self_reference() {
        let env = env(&[("a", "a + 1")]);
        assert_eq!(detect_cycles(&env).unwrap(), vec!["a", "a"]);
    }

    #[test]
    fn test_no_cycle() {
        let env = env(&[("a", "1"), ("b", "a + 1")]);
        assert!(detect_cycles(&env).is_none());
    }

    #[test]
    fn test_dependents_are_transitive() {
        let env = env(&[
            ("a", "1"),
            ("b", "a + 1"),
            ("c", "b * 2"),
            ("d", "7"),
        ]);
        let deps = get_dependents(&env, "a");
        assert_eq!(deps, BTreeSet::from(["b".to_string(), "c".to_string()]));
        assert!(get_dependents(&env, "c").is_empty());
    }
}
