//! `Ref` path notation
//!
//! A ref target is addressed by its path over the whole schema: the root
//! aggregate name followed by each nested member name, separated by `/`.
//! The XML notation writes the same path with a `ref-to:` prefix, which is
//! accepted and dropped.
//!
//! Examples:
//! - `Customer`
//! - `Order/Lines`
//! - `ref-to:Order/Lines/Discount`

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::char as pchar,
    combinator::{all_consuming, opt},
    multi::separated_list1,
    sequence::preceded,
    IResult,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::Name;

pub const REF_TO_PREFIX: &str = "ref-to:";
pub const PATH_SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefPath {
    segments: Vec<Name>,
}

impl RefPath {
    pub fn new(segments: Vec<Name>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Name] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl std::fmt::Display for RefPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefPathError {
    #[error("ref path is empty")]
    Empty,
    #[error("malformed ref path `{text}`: {message}")]
    Malformed { text: String, message: String },
}

fn is_segment_char(c: char) -> bool {
    c != PATH_SEPARATOR && !c.is_whitespace()
}

fn segment(input: &str) -> IResult<&str, &str> {
    take_while1(is_segment_char)(input)
}

fn path(input: &str) -> IResult<&str, Vec<&str>> {
    preceded(
        opt(tag(REF_TO_PREFIX)),
        separated_list1(pchar(PATH_SEPARATOR), segment),
    )(input)
}

pub fn parse_ref_path(text: &str) -> Result<RefPath, RefPathError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == REF_TO_PREFIX {
        return Err(RefPathError::Empty);
    }

    match all_consuming(path)(trimmed) {
        Ok((_, segments)) => Ok(RefPath::new(
            segments.into_iter().map(str::to_string).collect(),
        )),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(RefPathError::Malformed {
            text: text.to_string(),
            message: if e.input.is_empty() {
                "path ends with a separator".to_string()
            } else {
                format!("unexpected input at `{}`", e.input)
            },
        }),
        Err(nom::Err::Incomplete(_)) => Err(RefPathError::Malformed {
            text: text.to_string(),
            message: "incomplete path".to_string(),
        }),
    }
}
