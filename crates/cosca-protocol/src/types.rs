use serde::{Deserialize, Serialize};

use crate::identity::MemberId;

/// Flat, serializable description of a single member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: MemberId,
    pub age: u32,
    pub level: u32,
    pub superior: Option<MemberId>,
    pub subordinates: Vec<MemberId>,
    /// Member promoted into this one's position while it is jailed.
    pub alternate: Option<MemberId>,
}

/// A node of the organization chart, rooted at the godfather.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartNode {
    pub id: MemberId,
    pub age: u32,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subordinates: Vec<ChartNode>,
}

impl ChartNode {
    /// Number of nodes in this chart, including itself.
    pub fn size(&self) -> usize {
        1 + self.subordinates.iter().map(ChartNode::size).sum::<usize>()
    }

    /// Depth of the deepest node below this one (0 for a leaf).
    pub fn depth(&self) -> u32 {
        self.subordinates
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Find a node by id anywhere in this chart.
    pub fn find(&self, id: MemberId) -> Option<&ChartNode> {
        if self.id == id {
            return Some(self);
        }
        self.subordinates.iter().find_map(|child| child.find(id))
    }
}
