//! Text grammar of redirection operators.
//!
//! `\d*>{1,2}` for plain output redirection and `\d*>&\d*` for merging one
//! descriptor into another. A missing digit group is reported as `None`.

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::digit0;
use nom::combinator::{all_consuming, map_res};
use nom::sequence::{pair, separated_pair};
use nom::IResult;
use std::num::ParseIntError;

fn descriptor(input: &str) -> IResult<&str, Option<i64>> {
    map_res(digit0, |digits: &str| -> Result<Option<i64>, ParseIntError> {
        if digits.is_empty() {
            Ok(None)
        } else {
            digits.parse().map(Some)
        }
    })(input)
}

fn arrows(input: &str) -> IResult<&str, &str> {
    alt((tag(">>"), tag(">")))(input)
}

/// Parses `2>` or `>>`; returns the descriptor and whether it appends.
pub fn output_operator(text: &str) -> Option<(Option<i64>, bool)> {
    all_consuming(pair(descriptor, arrows))(text)
        .ok()
        .map(|(_, (fd, arrows))| (fd, arrows.len() == 2))
}

/// Parses `2>&1`; returns the source and destination descriptors.
pub fn stream_operator(text: &str) -> Option<(Option<i64>, Option<i64>)> {
    all_consuming(separated_pair(descriptor, tag(">&"), descriptor))(text)
        .ok()
        .map(|(_, descriptors)| descriptors)
}
