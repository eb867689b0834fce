use crate::{Synapse, ValidationError};
use std::collections::{HashMap, HashSet};

/// Validate the structural integrity of a synapse.
///
/// Runs once at load time; the executor assumes a validated input. Checks,
/// in order: non-empty name, at least one neuron, no duplicate names (first
/// repeat wins, insertion-order scan), no dangling `depends_on` references,
/// no dependency cycles.
pub fn validate(synapse: &Synapse) -> Result<(), ValidationError> {
    if synapse.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if synapse.neurons.is_empty() {
        return Err(ValidationError::NoNeurons);
    }

    let mut seen = HashSet::new();
    for neuron in &synapse.neurons {
        if !seen.insert(neuron.name.as_str()) {
            return Err(ValidationError::DuplicateNeuron(neuron.name.clone()));
        }
    }

    for neuron in &synapse.neurons {
        for dep in &neuron.depends_on {
            if !seen.contains(dep.as_str()) {
                return Err(ValidationError::DanglingDependency {
                    neuron: neuron.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    let adjacency: Vec<(&str, &[String])> = synapse
        .neurons
        .iter()
        .map(|n| (n.name.as_str(), n.depends_on.as_slice()))
        .collect();
    if let Some(cycle) = detect_cycle(&adjacency) {
        return Err(ValidationError::CircularDependency { cycle });
    }

    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    Unvisited,
    Visiting,
    Visited,
}

/// Find a dependency cycle in an adjacency view (node, dependencies).
///
/// Three-color depth-first search, O(V+E). Nodes are visited in declaration
/// order so the reported cycle is deterministic for a fixed input. Unknown
/// dependency names are ignored (the dangling check runs first). Returns the
/// cycle path, closed with its first node repeated at the end.
pub fn detect_cycle(adjacency: &[(&str, &[String])]) -> Option<Vec<String>> {
    let index: HashMap<&str, usize> = adjacency
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (*name, i))
        .collect();
    let mut colors = vec![Color::Unvisited; adjacency.len()];
    let mut stack = Vec::new();

    for start in 0..adjacency.len() {
        if colors[start] == Color::Unvisited {
            if let Some(cycle) = visit(start, adjacency, &index, &mut colors, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    node: usize,
    adjacency: &[(&str, &[String])],
    index: &HashMap<&str, usize>,
    colors: &mut Vec<Color>,
    stack: &mut Vec<usize>,
) -> Option<Vec<String>> {
    colors[node] = Color::Visiting;
    stack.push(node);

    for dep in adjacency[node].1 {
        let Some(&next) = index.get(dep.as_str()) else {
            continue;
        };
        match colors[next] {
            Color::Visiting => {
                // Back edge: the cycle is the stack suffix starting at `next`.
                let from = stack.iter().position(|&n| n == next).unwrap_or(0);
                let mut cycle: Vec<String> = stack[from..]
                    .iter()
                    .map(|&n| adjacency[n].0.to_string())
                    .collect();
                cycle.push(adjacency[next].0.to_string());
                return Some(cycle);
            }
            Color::Unvisited => {
                if let Some(cycle) = visit(next, adjacency, index, colors, stack) {
                    return Some(cycle);
                }
            }
            Color::Visited => {}
        }
    }

    stack.pop();
    colors[node] = Color::Visited;
    None
}
