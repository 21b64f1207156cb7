//! Parses a "#Central / -Branch / *Sub-branch" outline into a labelled tree
//! and lays it out radially around the central node.

use serde::Serialize;

use crate::text::truncate_words;

/// Words kept from a central line.
const CENTRAL_WORDS: usize = 1;
/// Words kept from a branch line.
const BRANCH_WORDS: usize = 2;
/// Words kept from a sub-branch line.
const SUB_BRANCH_WORDS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Central,
    Branch,
    SubBranch,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MindmapNode {
    pub label: String,
    pub kind: NodeKind,
    /// Parent of the first declaration; see the edges for later parents.
    pub parent_label: Option<String>,
    pub position: (f64, f64),
}

impl MindmapNode {
    fn new(label: String, kind: NodeKind, parent_label: Option<String>) -> Self {
        Self {
            label,
            kind,
            parent_label,
            position: (0.0, 0.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MindmapEdge {
    pub from: String,
    pub to: String,
}

/// Parsed mindmap. `nodes` holds every non-central node in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Mindmap {
    pub central: Option<MindmapNode>,
    pub nodes: Vec<MindmapNode>,
    pub edges: Vec<MindmapEdge>,
}

impl Mindmap {
    pub fn is_empty(&self) -> bool {
        self.central.is_none()
    }

    /// Angle, in degrees, between two consecutive non-central nodes.
    pub fn angle_step(&self) -> f64 {
        360.0 / self.nodes.len().max(1) as f64
    }

    fn node(&self, label: &str) -> Option<&MindmapNode> {
        self.central
            .iter()
            .chain(self.nodes.iter())
            .find(|node| node.label == label)
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if !self.edges.iter().any(|e| e.from == from && e.to == to) {
            self.edges.push(MindmapEdge {
                from: from.to_owned(),
                to: to.to_owned(),
            });
        }
    }

    /// Adds `label` below `parent`, merging with an existing node of the same
    /// label and kind. A merged node keeps the `parent_label` of its first
    /// declaration; every later parent only gains an edge to it. Returns
    /// false when the label belongs to a node of another tier.
    fn attach(&mut self, label: String, kind: NodeKind, parent: &str) -> bool {
        match self.node(&label).map(|existing| existing.kind) {
            Some(existing) if existing != kind => return false,
            Some(_) => {}
            None => self
                .nodes
                .push(MindmapNode::new(label.clone(), kind, Some(parent.to_owned()))),
        }
        self.add_edge(parent, &label);
        true
    }
}

/// Ring radii of the radial layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub branch_radius: f64,
    pub sub_branch_radius: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            branch_radius: 2.0,
            sub_branch_radius: 3.5,
        }
    }
}

enum MindmapLine {
    Node(NodeKind, String),
    Other,
}

fn classify(line: &str) -> MindmapLine {
    let (kind, rest, words) = if line.starts_with('#') {
        (NodeKind::Central, line.trim_start_matches('#'), CENTRAL_WORDS)
    } else if let Some(rest) = line.strip_prefix('-') {
        (NodeKind::Branch, rest, BRANCH_WORDS)
    } else if let Some(rest) = line.strip_prefix('*') {
        (NodeKind::SubBranch, rest, SUB_BRANCH_WORDS)
    } else {
        return MindmapLine::Other;
    };

    let label = truncate_words(rest, words);
    if label.is_empty() {
        MindmapLine::Other
    } else {
        MindmapLine::Node(kind, label)
    }
}

enum State {
    Seeking,
    InCentral(Mindmap),
    InBranchScope(Mindmap, String),
}

fn add_branch(mut map: Mindmap, label: String, anchor: Option<String>) -> State {
    let central = map
        .central
        .as_ref()
        .map(|c| c.label.clone())
        .unwrap_or_default();

    if map.attach(label.clone(), NodeKind::Branch, &central) {
        return State::InBranchScope(map, label);
    }

    match anchor {
        Some(anchor) => State::InBranchScope(map, anchor),
        None => State::InCentral(map),
    }
}

/// Parses the outline with the default ring radii.
pub fn parse_mindmap(raw_text: &str) -> Mindmap {
    parse_mindmap_with(raw_text, &LayoutConfig::default())
}

/// Parses the outline and positions every node.
///
/// The first `#` line names the central node; later ones are ignored.
/// Branch lines before it and sub-branch lines before any branch are
/// discarded. Sub-branches hang off the most recently declared branch.
/// Returns an empty mindmap when no central node was found.
pub fn parse_mindmap_with(raw_text: &str, layout: &LayoutConfig) -> Mindmap {
    let mut state = State::Seeking;

    for line in raw_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        state = match (state, classify(line)) {
            (State::Seeking, MindmapLine::Node(NodeKind::Central, label)) => {
                State::InCentral(Mindmap {
                    central: Some(MindmapNode::new(label, NodeKind::Central, None)),
                    ..Default::default()
                })
            }
            (State::InCentral(map), MindmapLine::Node(NodeKind::Branch, label)) => {
                add_branch(map, label, None)
            }
            (State::InBranchScope(map, anchor), MindmapLine::Node(NodeKind::Branch, label)) => {
                add_branch(map, label, Some(anchor))
            }
            (
                State::InBranchScope(mut map, anchor),
                MindmapLine::Node(NodeKind::SubBranch, label),
            ) => {
                map.attach(label, NodeKind::SubBranch, &anchor);
                State::InBranchScope(map, anchor)
            }
            (state, _) => state,
        };
    }

    match state {
        State::Seeking => Mindmap::default(),
        State::InCentral(mut map) | State::InBranchScope(mut map, _) => {
            layout_radial(&mut map, layout);
            map
        }
    }
}

/// Pins the central node at the origin and spreads the other nodes evenly
/// over a full turn, in insertion order, on a ring chosen by tier.
fn layout_radial(map: &mut Mindmap, layout: &LayoutConfig) {
    let step = map.angle_step();

    if let Some(central) = map.central.as_mut() {
        central.position = (0.0, 0.0);
    }

    for (i, node) in map.nodes.iter_mut().enumerate() {
        let radius = match node.kind {
            NodeKind::SubBranch => layout.sub_branch_radius,
            NodeKind::Branch | NodeKind::Central => layout.branch_radius,
        };
        let angle = (step * i as f64).to_radians();
        node.position = (radius * angle.cos(), radius * angle.sin());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectral::prelude::*;

    fn edge(from: &str, to: &str) -> MindmapEdge {
        MindmapEdge {
            from: from.to_owned(),
            to: to.to_owned(),
        }
    }

    #[test]
    fn builds_tree_with_sequential_attachment() {
        let map = parse_mindmap("# Topic\n- BranchA\n* SubA1\n- BranchB");

        let central = map.central.clone().expect("central node");
        assert_that(&central.label.as_str()).is_equal_to("Topic");
        assert_that(&central.parent_label).is_none();

        let labels: Vec<_> = map.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_that(&labels).is_equal_to(vec!["BranchA", "SubA1", "BranchB"]);
        assert_that(&map.nodes[1].kind).is_equal_to(NodeKind::SubBranch);
        assert_that(&map.nodes[1].parent_label).is_equal_to(Some("BranchA".to_owned()));
        assert_that(&map.edges).is_equal_to(vec![
            edge("Topic", "BranchA"),
            edge("BranchA", "SubA1"),
            edge("Topic", "BranchB"),
        ]);
    }

    #[test]
    fn no_central_line_yields_empty_map() {
        let map = parse_mindmap("- Branch\n* Sub\n");

        assert_that(&map.is_empty()).is_true();
        assert_that(&map.nodes).is_empty();
        assert_that(&map.edges).is_empty();
    }

    #[test]
    fn labels_are_truncated_by_tier() {
        let map = parse_mindmap("## Solar System facts\n- Inner rocky planets\n* Mercury is hot today");

        assert_that(&map.central.map(|c| c.label)).is_equal_to(Some("Solar".to_owned()));
        assert_that(&map.nodes[0].label.as_str()).is_equal_to("Inner rocky");
        assert_that(&map.nodes[1].label.as_str()).is_equal_to("Mercury is hot");
    }

    #[test]
    fn colliding_labels_merge() {
        let map = parse_mindmap("# T\n- Same name one\n- Same name two\n* Leaf");

        assert_that(&map.nodes).has_length(2);
        assert_that(&map.edges).has_length(2);
        assert_that(&map.nodes[1].parent_label).is_equal_to(Some("Same name".to_owned()));
    }

    #[test]
    fn shared_sub_branch_keeps_first_parent() {
        let map = parse_mindmap("# T\n- A\n* X\n- B\n* X");
        let shared: Vec<&MindmapNode> = map.nodes.iter().filter(|n| n.label == "X").collect();
        let parents: Vec<&str> = map
            .edges
            .iter()
            .filter(|e| e.to == "X")
            .map(|e| e.from.as_str())
            .collect();

        assert_that(&shared).has_length(1);
        assert_that(&shared[0].parent_label.as_deref()).is_equal_to(Some("A"));
        assert_that(&parents).is_equal_to(vec!["A", "B"]);
    }

    #[test]
    fn sub_branch_before_any_branch_is_dropped() {
        let map = parse_mindmap("# T\n* Orphan\n- B");

        assert_that(&map.nodes).has_length(1);
        assert_that(&map.nodes[0].kind).is_equal_to(NodeKind::Branch);
    }

    #[test]
    fn later_central_lines_are_ignored() {
        let map = parse_mindmap("# First\n# Second\n- B");

        assert_that(&map.central.map(|c| c.label)).is_equal_to(Some("First".to_owned()));
        assert_that(&map.nodes).has_length(1);
    }

    #[test]
    fn radial_positions_follow_insertion_order() {
        let layout = LayoutConfig::default();
        let map = parse_mindmap("# T\n- A\n* A1\n- B\n- C");

        assert_that(&map.angle_step()).is_close_to(90.0, 1e-9);
        let central = map.central.clone().expect("central node");
        assert_that(&central.position).is_equal_to((0.0, 0.0));

        for (i, node) in map.nodes.iter().enumerate() {
            let radius = if node.kind == NodeKind::SubBranch {
                layout.sub_branch_radius
            } else {
                layout.branch_radius
            };
            let (x, y) = node.position;
            assert_that(&x.hypot(y)).is_close_to(radius, 1e-9);
            let angle = y.atan2(x).to_degrees().rem_euclid(360.0);
            assert_that(&angle).is_close_to(90.0 * i as f64, 1e-6);
        }
    }

    #[test]
    fn parsing_is_repeatable() {
        let text = "# T\n- A\n* A1\n- B";
        assert_that(&parse_mindmap(text)).is_equal_to(parse_mindmap(text));
    }
}
