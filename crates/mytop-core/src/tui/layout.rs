//! Declarative screen layouts built from named regions.

use ratatui::layout::{Constraint, Layout, Rect};

/// Named screen areas widgets write into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Header,
    Status,
    /// Sel/Ins/Upd/Del rates.
    RateBars,
    /// QPS sparkline.
    QpsTrend,
    Main,
    /// Input line or error line.
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Main list with status panel and graphs.
    Dashboard,
    /// Session drill-down under a status panel.
    Drilldown,
    /// Main panel only (help, server-wide views).
    FullScreen,
}

enum Node {
    Leaf(Region),
    Column(&'static [(Constraint, Node)]),
    Row(&'static [(Constraint, Node)]),
}

const DASHBOARD: Node = Node::Column(&[
    (Constraint::Length(1), Node::Leaf(Region::Header)),
    (
        Constraint::Length(8),
        Node::Row(&[
            (Constraint::Percentage(60), Node::Leaf(Region::Status)),
            (Constraint::Percentage(20), Node::Leaf(Region::RateBars)),
            (Constraint::Percentage(20), Node::Leaf(Region::QpsTrend)),
        ]),
    ),
    (Constraint::Min(3), Node::Leaf(Region::Main)),
    (Constraint::Length(1), Node::Leaf(Region::Bottom)),
]);

const DRILLDOWN: Node = Node::Column(&[
    (Constraint::Length(1), Node::Leaf(Region::Header)),
    (Constraint::Length(8), Node::Leaf(Region::Status)),
    (Constraint::Min(3), Node::Leaf(Region::Main)),
    (Constraint::Length(1), Node::Leaf(Region::Bottom)),
]);

const FULL_SCREEN: Node = Node::Column(&[
    (Constraint::Length(1), Node::Leaf(Region::Header)),
    (Constraint::Min(3), Node::Leaf(Region::Main)),
    (Constraint::Length(1), Node::Leaf(Region::Bottom)),
]);

impl LayoutKind {
    fn tree(self) -> &'static Node {
        match self {
            LayoutKind::Dashboard => &DASHBOARD,
            LayoutKind::Drilldown => &DRILLDOWN,
            LayoutKind::FullScreen => &FULL_SCREEN,
        }
    }

    /// Regions present in this layout, top to bottom, left to right.
    pub fn regions(self) -> Vec<Region> {
        let mut out = Vec::new();
        collect(self.tree(), &mut out);
        out
    }

    pub fn contains(self, region: Region) -> bool {
        self.regions().contains(&region)
    }

    /// Splits `area` into this layout's regions.
    pub fn resolve(self, area: Rect) -> Vec<(Region, Rect)> {
        let mut out = Vec::new();
        split(self.tree(), area, &mut out);
        out
    }
}

fn collect(node: &Node, out: &mut Vec<Region>) {
    match node {
        Node::Leaf(region) => out.push(*region),
        Node::Column(children) | Node::Row(children) => {
            children.iter().for_each(|(_, child)| collect(child, out));
        }
    }
}

fn split(node: &Node, area: Rect, out: &mut Vec<(Region, Rect)>) {
    let (children, layout) = match node {
        Node::Leaf(region) => {
            out.push((*region, area));
            return;
        }
        Node::Column(children) => (children, Layout::vertical(children.iter().map(|(c, _)| *c))),
        Node::Row(children) => (children, Layout::horizontal(children.iter().map(|(c, _)| *c))),
    };
    for ((_, child), rect) in children.iter().zip(layout.split(area).iter()) {
        split(child, *rect, out);
    }
}
