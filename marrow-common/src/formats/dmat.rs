//! DMAT numeric stream format
//!
//! A DMAT file is a self-describing plain-text value matrix:
//!
//! ```text
//! <dimension> <count>
//! <value>
//! <value>
//! ...
//! ```
//!
//! The body holds `dimension * count` values, one per line, grouped by
//! component and never interleaved: a dimension-4 quaternion stream stores
//! all x values, then all y, then all z, then all w. Float bodies use fixed
//! six-decimal formatting; the bone binding stream (dimension 1) uses plain
//! integers. A `<dimension> 0` header with no body is the well-defined
//! absence marker.

use anyhow::{Result, bail};
use std::io::{BufRead, Write};
use thiserror::Error;

/// Parsed DMAT stream: one value array per component.
#[derive(Debug, Clone, PartialEq)]
pub struct Dmat {
    /// Values per element (1, 3, or 4 for exported rig streams)
    pub dimension: u32,
    /// Elements per component
    pub count: usize,
    /// Component arrays in declared order, each `count` long
    pub components: Vec<Vec<f32>>,
}

/// Errors produced when parsing a DMAT stream.
#[derive(Debug, Error)]
pub enum DmatError {
    #[error("i/o error reading dmat: {0}")]
    Io(#[from] std::io::Error),
    #[error("dmat stream is missing its header line")]
    MissingHeader,
    #[error("malformed dmat header: {0:?}")]
    MalformedHeader(String),
    #[error("dmat dimension must be at least 1")]
    ZeroDimension,
    #[error("malformed dmat value at line {line}: {text:?}")]
    MalformedValue { line: usize, text: String },
    #[error("dmat body ended early: expected {expected} values, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("unexpected trailing content at line {0}")]
    TrailingContent(usize),
}

/// Write a float DMAT stream.
///
/// `components` must hold exactly `dimension` arrays of equal length. Values
/// are emitted grouped by component in declared order, six decimals each.
pub fn write_dmat<W: Write>(writer: &mut W, dimension: u32, components: &[&[f32]]) -> Result<()> {
    if dimension == 0 {
        bail!("dmat dimension must be at least 1");
    }
    if components.len() != dimension as usize {
        bail!(
            "dmat dimension {} does not match component count {}",
            dimension,
            components.len()
        );
    }
    let count = components.first().map_or(0, |c| c.len());
    for (i, component) in components.iter().enumerate() {
        if component.len() != count {
            bail!(
                "dmat component {} has {} values, expected {}",
                i,
                component.len(),
                count
            );
        }
    }

    writeln!(writer, "{} {}", dimension, count)?;
    for component in components {
        for value in *component {
            writeln!(writer, "{:.6}", value)?;
        }
    }
    Ok(())
}

/// Write a bone binding DMAT stream (dimension 1, integer body).
///
/// Passing an empty slice produces the `1 0` absence marker.
pub fn write_index_dmat<W: Write>(writer: &mut W, indices: &[i32]) -> Result<()> {
    writeln!(writer, "1 {}", indices.len())?;
    for index in indices {
        writeln!(writer, "{}", index)?;
    }
    Ok(())
}

/// Read a DMAT stream back into component arrays.
///
/// The header fixes the exact body length; short bodies and trailing content
/// are both rejected. Integer bodies parse as floats.
pub fn read_dmat<R: BufRead>(reader: R) -> Result<Dmat, DmatError> {
    let mut lines = reader.lines();

    let header = lines.next().ok_or(DmatError::MissingHeader)??;
    let mut fields = header.split_whitespace();
    let dimension: u32 = fields
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| DmatError::MalformedHeader(header.clone()))?;
    let count: usize = fields
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| DmatError::MalformedHeader(header.clone()))?;
    if fields.next().is_some() {
        return Err(DmatError::MalformedHeader(header.clone()));
    }
    if dimension == 0 {
        return Err(DmatError::ZeroDimension);
    }

    let expected = dimension as usize * count;
    let mut values = Vec::with_capacity(expected);
    let mut line_no = 1usize;
    for line in lines {
        let line = line?;
        line_no += 1;
        if values.len() == expected {
            return Err(DmatError::TrailingContent(line_no));
        }
        let text = line.trim();
        let value: f32 = text.parse().map_err(|_| DmatError::MalformedValue {
            line: line_no,
            text: text.to_string(),
        })?;
        values.push(value);
    }
    if values.len() < expected {
        return Err(DmatError::Truncated {
            expected,
            found: values.len(),
        });
    }

    let components = if count == 0 {
        vec![Vec::new(); dimension as usize]
    } else {
        values.chunks_exact(count).map(<[f32]>::to_vec).collect()
    };

    Ok(Dmat {
        dimension,
        count,
        components,
    })
}
