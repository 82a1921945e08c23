//! Skeleton topology file (.skel)
//!
//! Grammar:
//!
//! ```text
//! b <head.x> <head.y> <head.z> <tail.x> <tail.y> <tail.z>
//!
//! p <parent> <child>
//! ```
//!
//! Bone records come first in bone-index order, then a blank separator line,
//! then one edge record per parented bone. Coordinates are armature-space,
//! pre-scaled, six decimals. The reader skips blank lines and `#` comments so
//! annotated files from older exporters still load. Edge order carries no
//! meaning; consumers treat the edge records as a set.

use anyhow::{Result, bail};
use std::io::{BufRead, Write};
use thiserror::Error;

/// One bone segment: head and tail in armature space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkelBone {
    pub head: [f32; 3],
    pub tail: [f32; 3],
}

/// Parsed skeleton file contents.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSkel {
    pub bones: Vec<SkelBone>,
    /// `(parent, child)` bone index pairs
    pub edges: Vec<(u32, u32)>,
}

/// Errors produced when parsing a skeleton file.
#[derive(Debug, Error)]
pub enum SkelError {
    #[error("i/o error reading skeleton: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed bone record at line {line}: {text:?}")]
    MalformedBone { line: usize, text: String },
    #[error("malformed edge record at line {line}: {text:?}")]
    MalformedEdge { line: usize, text: String },
    #[error("edge references bone {index} but only {bone_count} bones are defined")]
    EdgeOutOfRange { index: u32, bone_count: usize },
}

/// Write a skeleton file.
///
/// Every edge must reference defined bones and may not link a bone to
/// itself; violations are writer bugs and fail before anything is emitted.
pub fn write_skel<W: Write>(writer: &mut W, bones: &[SkelBone], edges: &[(u32, u32)]) -> Result<()> {
    for (parent, child) in edges {
        if *parent as usize >= bones.len() || *child as usize >= bones.len() {
            bail!(
                "skel edge ({}, {}) references a bone outside 0..{}",
                parent,
                child,
                bones.len()
            );
        }
        if parent == child {
            bail!("skel edge ({}, {}) links a bone to itself", parent, child);
        }
    }

    for bone in bones {
        writeln!(
            writer,
            "b {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
            bone.head[0], bone.head[1], bone.head[2], bone.tail[0], bone.tail[1], bone.tail[2]
        )?;
    }
    writeln!(writer)?;
    for (parent, child) in edges {
        writeln!(writer, "p {} {}", parent, child)?;
    }
    Ok(())
}

/// Read a skeleton file.
pub fn read_skel<R: BufRead>(reader: R) -> Result<ParsedSkel, SkelError> {
    let mut bones = Vec::new();
    let mut edges = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let mut fields = text.split_whitespace();
        match fields.next() {
            Some("b") => {
                let mut values = [0.0f32; 6];
                for value in &mut values {
                    *value = fields.next().and_then(|t| t.parse().ok()).ok_or_else(|| {
                        SkelError::MalformedBone {
                            line: line_no,
                            text: text.to_string(),
                        }
                    })?;
                }
                if fields.next().is_some() {
                    return Err(SkelError::MalformedBone {
                        line: line_no,
                        text: text.to_string(),
                    });
                }
                bones.push(SkelBone {
                    head: [values[0], values[1], values[2]],
                    tail: [values[3], values[4], values[5]],
                });
            }
            Some("p") => {
                let mut next_index = || {
                    fields.next().and_then(|t| t.parse::<u32>().ok()).ok_or_else(
                        || SkelError::MalformedEdge {
                            line: line_no,
                            text: text.to_string(),
                        },
                    )
                };
                let parent = next_index()?;
                let child = next_index()?;
                if fields.next().is_some() {
                    return Err(SkelError::MalformedEdge {
                        line: line_no,
                        text: text.to_string(),
                    });
                }
                edges.push((parent, child));
            }
            // Unknown records are ignored, matching the viewer's loader
            _ => {}
        }
    }

    for &(parent, child) in &edges {
        if parent as usize >= bones.len() || child as usize >= bones.len() {
            let index = if parent as usize >= bones.len() {
                parent
            } else {
                child
            };
            return Err(SkelError::EdgeOutOfRange {
                index,
                bone_count: bones.len(),
            });
        }
    }

    Ok(ParsedSkel { bones, edges })
}
