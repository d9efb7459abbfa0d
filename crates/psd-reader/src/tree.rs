/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Folding the flat record list back into a group tree.
//!
//! Records arrive bottom-to-top. A bounding divider (type 3) marks where
//! a group's contents *begin* in stored order, the matching open divider
//! (type 1 or 2) sits above the contents and carries the group's real
//! name, bounds, blend mode and opacity. The walk therefore keeps a stack
//! of frames: type 3 pushes an empty frame, type 1/2 pops it into a group
//! node, anything else is a leaf in the current frame.

use crate::channels::ChannelPlane;
use crate::constants::{BlendMode, DividerKind};
use crate::errors::PsdDecodeErrors;
use crate::layers::{Bounds, LayerRecord};

/// A node of the reconstructed layer tree.
#[derive(Clone, Debug)]
pub struct LayerNode {
    pub name:       String,
    pub bounds:     Bounds,
    pub blend_mode: BlendMode,
    pub opacity:    u8,
    pub visible:    bool,
    pub kind:       NodeKind
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A group owning its children outright, bottom-to-top order.
    Group(Vec<LayerNode>),
    /// A paintable layer with its decoded `(channel id, plane)` pairs.
    Layer(Vec<(i16, ChannelPlane)>)
}

impl LayerNode {
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    /// Children of a group, empty for leaves.
    pub fn children(&self) -> &[LayerNode] {
        match &self.kind {
            NodeKind::Group(children) => children,
            NodeKind::Layer(_) => &[]
        }
    }

    /// Decoded planes of a leaf, `None` for groups.
    pub fn planes(&self) -> Option<&[(i16, ChannelPlane)]> {
        match &self.kind {
            NodeKind::Group(_) => None,
            NodeKind::Layer(planes) => Some(planes)
        }
    }

    fn from_record(record: LayerRecord, kind: NodeKind) -> LayerNode {
        LayerNode {
            name: record.name,
            bounds: record.bounds,
            blend_mode: record.blend_mode,
            opacity: record.opacity,
            visible: record.flags & crate::constants::FLAG_HIDDEN == 0,
            kind
        }
    }
}

/// Build the tree out of the flat bottom-to-top record list.
///
/// Children lists come out in bottom-to-top order per group, the
/// canonical rendering order.
pub(crate) fn build_tree(records: Vec<LayerRecord>) -> Result<Vec<LayerNode>, PsdDecodeErrors> {
    // frame 0 is the document root
    let mut stack: Vec<Vec<LayerNode>> = vec![Vec::new()];

    for record in records {
        let divider_kind = record.divider.map(|d| d.kind);
        match divider_kind {
            Some(DividerKind::BoundingSection) => {
                stack.push(Vec::new());
            }
            Some(DividerKind::OpenFolder) | Some(DividerKind::ClosedFolder) => {
                let children = match stack.pop() {
                    // popping the root frame means an opener without
                    // a matching bounding marker below it
                    Some(frame) if !stack.is_empty() => frame,
                    _ => return Err(PsdDecodeErrors::UnbalancedGroupMarkers)
                };
                let group = LayerNode::from_record(record, NodeKind::Group(children));
                // stack is non-empty, checked above
                if let Some(top) = stack.last_mut() {
                    top.push(group);
                }
            }
            Some(DividerKind::Other) | None => {
                let planes = record.planes.clone();
                let leaf = LayerNode::from_record(record, NodeKind::Layer(planes));
                if let Some(top) = stack.last_mut() {
                    top.push(leaf);
                }
            }
        }
    }

    if stack.len() != 1 {
        return Err(PsdDecodeErrors::UnbalancedGroupMarkers);
    }
    Ok(stack.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::SectionDivider;

    fn record(name: &str, divider: Option<DividerKind>) -> LayerRecord {
        LayerRecord {
            name: name.to_string(),
            divider: divider.map(|kind| SectionDivider {
                kind,
                sub_type: None
            }),
            ..LayerRecord::default()
        }
    }

    #[test]
    fn flat_list_stays_flat() {
        let records = vec![record("a", None), record("b", None)];
        let tree = build_tree(records).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "a");
        assert_eq!(tree[1].name, "b");
        assert!(!tree[0].is_group());
    }

    #[test]
    fn groups_nest_and_keep_bottom_up_order() {
        // stored bottom-to-top: base, </group>, inner1, inner2, group
        let records = vec![
            record("base", None),
            record("</group>", Some(DividerKind::BoundingSection)),
            record("inner1", None),
            record("inner2", None),
            record("group", Some(DividerKind::OpenFolder)),
        ];
        let tree = build_tree(records).unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "base");
        assert_eq!(tree[1].name, "group");
        assert!(tree[1].is_group());

        let children: Vec<&str> = tree[1].children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(children, vec!["inner1", "inner2"]);
    }

    #[test]
    fn collapsed_groups_build_the_same_tree() {
        let records = vec![
            record("</group>", Some(DividerKind::BoundingSection)),
            record("inner", None),
            record("group", Some(DividerKind::ClosedFolder)),
        ];
        let tree = build_tree(records).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children().len(), 1);
    }

    #[test]
    fn unmatched_opener_is_an_error() {
        let records = vec![record("group", Some(DividerKind::OpenFolder))];
        assert!(matches!(
            build_tree(records),
            Err(PsdDecodeErrors::UnbalancedGroupMarkers)
        ));
    }

    #[test]
    fn unmatched_bounding_marker_is_an_error() {
        let records = vec![
            record("</group>", Some(DividerKind::BoundingSection)),
            record("leaf", None),
        ];
        assert!(matches!(
            build_tree(records),
            Err(PsdDecodeErrors::UnbalancedGroupMarkers)
        ));
    }

    #[test]
    fn type_zero_divider_is_an_ordinary_layer() {
        let records = vec![record("plain", Some(DividerKind::Other))];
        let tree = build_tree(records).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(!tree[0].is_group());
    }
}
