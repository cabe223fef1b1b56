//! Parser for the command annotations embedded in PGN comments,
//! e.g. `{ [%eval 0.17] [%clk 0:03:00] }`.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{char, digit1, space0, space1},
    combinator::{map, map_res, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use std::fmt;

/// Engine evaluation attached to a move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Eval {
    /// Score in pawns from white's point of view.
    Pawns(f32),
    /// Forced mate in n moves, negative when black mates.
    Mate(i32),
}

impl fmt::Display for Eval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eval::Pawns(p) => write!(f, "{:+.2}", p),
            Eval::Mate(n) => write!(f, "#{}", n),
        }
    }
}

/// Remaining clock time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clock {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Clock {
    pub fn as_seconds(&self) -> u32 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommentContent {
    Eval(Eval),
    Clock(Clock),
    Text(String),
}

/// Annotations collected for a single move.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Annotations {
    pub eval: Option<Eval>,
    pub clock: Option<Clock>,
    pub text: Option<String>,
}

impl Annotations {
    pub fn is_empty(&self) -> bool {
        self.eval.is_none() && self.clock.is_none() && self.text.is_none()
    }

    /// Merge one raw comment into the annotations. Unparsable input is ignored.
    pub fn absorb(&mut self, comment: &str) {
        let Ok((_, parsed)) = parse_comments(comment) else {
            return;
        };
        for content in parsed {
            match content {
                CommentContent::Eval(eval) => self.eval = Some(eval),
                CommentContent::Clock(clock) => self.clock = Some(clock),
                CommentContent::Text(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    match &mut self.text {
                        Some(existing) => {
                            existing.push(' ');
                            existing.push_str(text);
                        }
                        None => self.text = Some(text.to_string()),
                    }
                }
            }
        }
    }
}

impl fmt::Display for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(2);
        if let Some(eval) = self.eval {
            parts.push(format!("eval {}", eval));
        }
        if let Some(clock) = self.clock {
            parts.push(format!("clk {}", clock));
        }
        write!(f, "{}", parts.join(", "))
    }
}

pub fn parse_comments(input: &str) -> IResult<&str, Vec<CommentContent>> {
    many0(alt((
        command,
        // an unknown command is kept as text so the rest still parses
        map(recognize(pair(tag("[%"), opt(is_not("]")))), |s: &str| {
            CommentContent::Text(s.to_string())
        }),
        map(text, |s| CommentContent::Text(s.to_string())),
    )))
    .parse(input)
}

/// `[%eval ...]` or `[%clk ...]`
fn command(input: &str) -> IResult<&str, CommentContent> {
    delimited(
        pair(tag("[%"), space0),
        alt((
            map(preceded(pair(tag("eval"), space1), eval_value), CommentContent::Eval),
            map(preceded(pair(tag("clk"), space1), clock_value), CommentContent::Clock),
        )),
        pair(space0, char(']')),
    )
    .parse(input)
}

fn eval_value(input: &str) -> IResult<&str, Eval> {
    alt((
        map(preceded(char('#'), signed_integer), Eval::Mate),
        map(signed_number, Eval::Pawns),
    ))
    .parse(input)
}

fn signed_integer(input: &str) -> IResult<&str, i32> {
    map_res(
        recognize(pair(opt(alt((char('+'), char('-')))), digit1)),
        |s: &str| s.trim_start_matches('+').parse::<i32>(),
    )
    .parse(input)
}

fn signed_number(input: &str) -> IResult<&str, f32> {
    map_res(
        recognize((
            opt(alt((char('+'), char('-')))),
            digit1,
            opt(preceded(char('.'), digit1)),
        )),
        |s: &str| s.trim_start_matches('+').parse::<f32>(),
    )
    .parse(input)
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>()).parse(input)
}

/// `h:mm:ss`, fractional seconds are dropped
fn clock_value(input: &str) -> IResult<&str, Clock> {
    map(
        (
            number,
            char(':'),
            number,
            char(':'),
            number,
            opt(preceded(char('.'), digit1)),
        ),
        |(hours, _, minutes, _, seconds, _)| Clock {
            hours,
            minutes,
            seconds,
        },
    )
    .parse(input)
}

/// Anything up to the next command.
fn text(input: &str) -> IResult<&str, &str> {
    alt((is_not("["), tag("["))).parse(input)
}
