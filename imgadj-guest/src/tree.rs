//! In-memory configuration tree with augeas-style addressing.
//!
//! Supports the path subset the adjusters use: absolute paths of `/`-separated
//! labels, each optionally followed by `[N]` (1-based position among siblings
//! with the same label) or `[last()]`.

use imgadj_core::{AdjusterError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub label: String,
    pub value: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }

    fn same_label(&self, label: &str) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, child)| child.label == label)
            .map(|(i, _)| i)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Predicate {
    Any,
    Index(usize),
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    label: String,
    predicate: Predicate,
}

impl Step {
    fn select(&self, node: &Node) -> Vec<usize> {
        let same = node.same_label(&self.label);
        match self.predicate {
            Predicate::Any => same,
            Predicate::Index(n) => same.get(n - 1).copied().into_iter().collect(),
            Predicate::Last => same.last().copied().into_iter().collect(),
        }
    }

    /// Whether a missing node addressed by this step may be created.
    fn creatable(&self, existing: usize) -> bool {
        match self.predicate {
            Predicate::Any => existing == 0,
            Predicate::Index(n) => n == existing + 1,
            Predicate::Last => existing == 0,
        }
    }
}

fn parse(path: &str) -> Result<Vec<Step>> {
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| AdjusterError::tree(path, "path must be absolute"))?;

    let mut steps = Vec::new();
    for segment in rest.split('/') {
        if segment.is_empty() {
            return Err(AdjusterError::tree(path, "empty path segment"));
        }

        let step = match segment.find('[') {
            Some(open) if segment.ends_with(']') => {
                let label = &segment[..open];
                let inner = &segment[open + 1..segment.len() - 1];
                let predicate = if inner == "last()" {
                    Predicate::Last
                } else {
                    match inner.parse::<usize>() {
                        Ok(n) if n >= 1 => Predicate::Index(n),
                        _ => {
                            return Err(AdjusterError::tree(
                                path,
                                format!("unsupported predicate [{inner}]"),
                            ));
                        }
                    }
                };
                Step {
                    label: label.to_string(),
                    predicate,
                }
            }
            Some(_) => return Err(AdjusterError::tree(path, "unterminated predicate")),
            None => Step {
                label: segment.to_string(),
                predicate: Predicate::Any,
            },
        };
        steps.push(step);
    }
    Ok(steps)
}

#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    root: Node,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, pos: &[usize]) -> &Node {
        pos.iter().fold(&self.root, |node, &i| &node.children[i])
    }

    fn node_mut(&mut self, pos: &[usize]) -> &mut Node {
        pos.iter().fold(&mut self.root, |node, &i| &mut node.children[i])
    }

    fn resolve(&self, steps: &[Step]) -> Vec<Vec<usize>> {
        let mut current: Vec<Vec<usize>> = vec![Vec::new()];
        for step in steps {
            let mut next = Vec::new();
            for pos in &current {
                for i in step.select(self.node(pos)) {
                    let mut child = pos.clone();
                    child.push(i);
                    next.push(child);
                }
            }
            current = next;
        }
        current
    }

    /// Canonical path of a node: an index is added only where siblings share a label.
    fn render(&self, pos: &[usize]) -> String {
        let mut out = String::new();
        let mut node = &self.root;
        for &i in pos {
            let child = &node.children[i];
            let same = node.same_label(&child.label);
            out.push('/');
            out.push_str(&child.label);
            if same.len() > 1 {
                let nth = same.iter().position(|&j| j == i).unwrap_or(0) + 1;
                out.push_str(&format!("[{nth}]"));
            }
            node = child;
        }
        out
    }

    fn single(&self, path: &str) -> Result<Option<Vec<usize>>> {
        let found = self.resolve(&parse(path)?);
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.into_iter().next()),
            n => Err(AdjusterError::tree(path, format!("{n} nodes match"))),
        }
    }

    fn create(&mut self, path: &str) -> Result<Vec<usize>> {
        let steps = parse(path)?;
        let mut pos = Vec::new();
        for step in &steps {
            let node = self.node(&pos);
            let selected = step.select(node);
            match selected.len() {
                1 => pos.push(selected[0]),
                0 => {
                    let existing = node.same_label(&step.label).len();
                    if !step.creatable(existing) {
                        return Err(AdjusterError::tree(
                            path,
                            format!("cannot create '{}'", step.label),
                        ));
                    }
                    let parent = self.node_mut(&pos);
                    parent.children.push(Node::new(&step.label));
                    pos.push(parent.children.len() - 1);
                }
                n => {
                    return Err(AdjusterError::tree(
                        path,
                        format!("{n} nodes match '{}'", step.label),
                    ));
                }
            }
        }
        Ok(pos)
    }

    pub fn matches(&self, path: &str) -> Result<Vec<String>> {
        let steps = parse(path)?;
        Ok(self
            .resolve(&steps)
            .iter()
            .map(|pos| self.render(pos))
            .collect())
    }

    pub fn get(&self, path: &str) -> Result<Option<String>> {
        Ok(self
            .single(path)?
            .and_then(|pos| self.node(&pos).value.clone()))
    }

    pub fn set(&mut self, path: &str, value: Option<&str>) -> Result<()> {
        let pos = match self.single(path)? {
            Some(pos) => pos,
            None => self.create(path)?,
        };
        self.node_mut(&pos).value = value.map(str::to_string);
        Ok(())
    }

    pub fn insert(&mut self, path: &str, label: &str, before: bool) -> Result<()> {
        let pos = self
            .single(path)?
            .ok_or_else(|| AdjusterError::tree(path, "no node to insert next to"))?;
        let (index, parent) = pos
            .split_last()
            .ok_or_else(|| AdjusterError::tree(path, "cannot insert next to the root"))?;
        let at = if before { *index } else { index + 1 };
        self.node_mut(parent).children.insert(at, Node::new(label));
        Ok(())
    }

    /// Removes every matching node; returns how many nodes went, descendants included.
    pub fn remove(&mut self, path: &str) -> Result<usize> {
        let mut found = self.resolve(&parse(path)?);
        found.sort();
        let mut removed = 0;
        for pos in found.iter().rev() {
            if let Some((index, parent)) = pos.split_last() {
                removed += self.node_mut(parent).children.remove(*index).size();
            }
        }
        Ok(removed)
    }
}
