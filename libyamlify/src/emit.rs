//! Canonical emitter
//!
//! Renders a `Node` back into the block subset with two-space indentation.
//! Reading the output yields the same tree for every tree the reader can
//! produce, except that an empty sequence under a key reads back as an
//! empty mapping.

use crate::node::{Node, SCALAR_KEY};

const INDENT: usize = 2;

/// Render `node` as a document.
pub fn emit(node: &Node) -> String {
    let mut out = String::new();
    match node {
        Node::Scalar(text) => {
            out.push_str(text);
            out.push('\n');
        }
        _ => emit_block(node, 0, &mut out),
    }
    out
}

fn emit_block(node: &Node, indent: usize, out: &mut String) {
    match node {
        Node::Scalar(text) => push_line(out, indent, &format!("- {}", text)),
        Node::Mapping(mapping) => {
            for (key, value) in mapping.iter() {
                match value {
                    Node::Scalar(text) if key == SCALAR_KEY => {
                        push_line(out, indent, &format!("- {}", text))
                    }
                    Node::Scalar(text) => push_line(out, indent, &format!("{}: {}", key, text)),
                    child => {
                        push_line(out, indent, &format!("{}:", key));
                        emit_block(child, indent + INDENT, out);
                    }
                }
            }
        }
        Node::Sequence(items) => {
            for item in items {
                match item {
                    Node::Scalar(text) => push_line(out, indent, &format!("- {}", text)),
                    child => {
                        push_line(out, indent, "-");
                        emit_block(child, indent + INDENT, out);
                    }
                }
            }
        }
    }
}

fn push_line(out: &mut String, indent: usize, text: &str) {
    out.extend(std::iter::repeat(' ').take(indent));
    out.push_str(text);
    out.push('\n');
}
