use thiserror::Error;

use crate::model::{NodeKind, StructureNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Block {
    Heading { layer: u8, text: String },
    Body(String),
}

struct Slot {
    node: StructureNode,
    children: Vec<usize>,
}

pub(crate) fn assemble(blocks: Vec<Block>) -> Vec<StructureNode> {
    let mut arena = Vec::<Slot>::new();
    let mut roots = Vec::<usize>::new();
    let mut open = Vec::<(u8, usize)>::new();

    for block in blocks {
        match block {
            Block::Heading { layer, text } => {
                while open.last().is_some_and(|(open_layer, _)| *open_layer >= layer) {
                    open.pop();
                }

                let index = arena.len();
                arena.push(Slot {
                    node: StructureNode::heading(layer, &text),
                    children: Vec::new(),
                });
                match open.last() {
                    Some((_, parent)) => arena[*parent].children.push(index),
                    None => roots.push(index),
                }
                open.push((layer, index));
            }
            Block::Body(text) => {
                let target = match open.last() {
                    Some((_, index)) => Some(*index),
                    None => roots
                        .last()
                        .copied()
                        .filter(|index| arena[*index].node.kind == NodeKind::SimpleText),
                };

                match target {
                    Some(index) => append_body(&mut arena[index].node, &text),
                    None => {
                        roots.push(arena.len());
                        arena.push(Slot {
                            node: StructureNode::simple_text(&text),
                            children: Vec::new(),
                        });
                    }
                }
            }
        }
    }

    roots
        .into_iter()
        .map(|index| materialize(&mut arena, index))
        .collect()
}

fn append_body(node: &mut StructureNode, text: &str) {
    match node.body.as_mut() {
        Some(body) => {
            body.push(' ');
            body.push_str(text);
        }
        None => node.body = Some(text.to_string()),
    }
}

fn materialize(arena: &mut [Slot], index: usize) -> StructureNode {
    let children = std::mem::take(&mut arena[index].children);
    let mut node = std::mem::replace(&mut arena[index].node, StructureNode::simple_text(""));
    node.children = children
        .into_iter()
        .map(|child| materialize(arena, child))
        .collect();
    node
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("heading {heading:?} at layer {parent_layer} contains a node at layer {child_layer}")]
pub struct LayerViolation {
    pub heading: String,
    pub parent_layer: u8,
    pub child_layer: u8,
}

pub fn validate_layers(nodes: &[StructureNode]) -> Result<(), LayerViolation> {
    for node in nodes {
        for child in &node.children {
            if node.is_heading() && child.layer <= node.layer {
                return Err(LayerViolation {
                    heading: node.heading.clone().unwrap_or_default(),
                    parent_layer: node.layer,
                    child_layer: child.layer,
                });
            }
        }
        validate_layers(&node.children)?;
    }
    Ok(())
}
