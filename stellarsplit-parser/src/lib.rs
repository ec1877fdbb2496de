#![warn(clippy::uninlined_format_args)]

//! Parser for plain-text ledger scripts.
//!
//! ```text
//! MEMBERS alice bob carol
//! alice paid 90 for alice bob carol
//! bob paid 60            # no `for`: split among everyone
//! JOIN dave by alice
//! LEAVE dave by bob
//! UNDO by bob
//! BALANCES
//! SETTLE
//! ```
//!
//! Amounts are kept as the raw decimal text; converting them to smallest
//! currency units is the caller's job.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag_no_case, take_while1},
    character::complete::{char, digit1, satisfy, space0, space1},
    combinator::{not, opt, recognize},
    multi::separated_list1,
    sequence::{preceded, terminated},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseLine<'a> {
    pub payer: &'a str,
    pub amount: &'a str,
    /// `None` splits among the whole current roster.
    pub split_among: Option<Vec<&'a str>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Balances,
    Settle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement<'a> {
    Expense(ExpenseLine<'a>),
    Join { member: &'a str, by: &'a str },
    Leave { member: &'a str, by: &'a str },
    Undo { by: &'a str },
    Command(Command),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementWithLine<'a> {
    pub line: usize,
    pub statement: Statement<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program<'a> {
    pub members: Vec<&'a str>,
    pub statements: Vec<StatementWithLine<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Script is empty; expected `MEMBERS ...` on the first line.")]
    EmptyProgram,
    #[error("Line {line}: statement before the `MEMBERS` declaration.")]
    MissingMembersDeclaration { line: usize },
    #[error("Line {line}: `MEMBERS` may only be declared once.")]
    DuplicateMembersDeclaration { line: usize },
    #[error("Line {line}: Syntax error - {detail}")]
    SyntaxError { line: usize, detail: String },
}

enum Line<'a> {
    Members(Vec<&'a str>),
    Statement(Statement<'a>),
}

fn is_member_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn keyword<'a>(
    word: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(tag_no_case(word), not(satisfy(is_member_char)))
}

fn member(input: &str) -> IResult<&str, &str> {
    take_while1(is_member_char).parse(input)
}

fn member_separator(input: &str) -> IResult<&str, ()> {
    alt(((space0, char(','), space0).map(|_| ()), space1.map(|_| ()))).parse(input)
}

fn member_list(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(member_separator, member).parse(input)
}

fn amount(input: &str) -> IResult<&str, &str> {
    recognize((digit1, opt((char('.'), digit1)))).parse(input)
}

fn members_declaration(input: &str) -> IResult<&str, Vec<&str>> {
    (keyword("MEMBERS"), space1, member_list)
        .map(|(_, _, members)| members)
        .parse(input)
}

// {payer} paid {amount} [for {members}]
fn expense(input: &str) -> IResult<&str, ExpenseLine<'_>> {
    (
        member,
        space1,
        keyword("paid"),
        space1,
        amount,
        opt(preceded((space1, keyword("for"), space1), member_list)),
    )
        .map(|(payer, _, _, _, amount, split_among)| ExpenseLine {
            payer,
            amount,
            split_among,
        })
        .parse(input)
}

fn join(input: &str) -> IResult<&str, Statement<'_>> {
    (
        keyword("JOIN"),
        space1,
        member,
        space1,
        keyword("by"),
        space1,
        member,
    )
        .map(|(_, _, member, _, _, _, by)| Statement::Join { member, by })
        .parse(input)
}

fn leave(input: &str) -> IResult<&str, Statement<'_>> {
    (
        keyword("LEAVE"),
        space1,
        member,
        space1,
        keyword("by"),
        space1,
        member,
    )
        .map(|(_, _, member, _, _, _, by)| Statement::Leave { member, by })
        .parse(input)
}

fn undo(input: &str) -> IResult<&str, Statement<'_>> {
    (keyword("UNDO"), space1, keyword("by"), space1, member)
        .map(|(_, _, _, _, by)| Statement::Undo { by })
        .parse(input)
}

fn command(input: &str) -> IResult<&str, Command> {
    alt((
        keyword("BALANCES").map(|_| Command::Balances),
        keyword("SETTLE").map(|_| Command::Settle),
    ))
    .parse(input)
}

fn line(input: &str) -> IResult<&str, Line<'_>> {
    alt((
        members_declaration.map(Line::Members),
        join.map(Line::Statement),
        leave.map(Line::Statement),
        undo.map(Line::Statement),
        command.map(|cmd| Line::Statement(Statement::Command(cmd))),
        expense.map(|expense| Line::Statement(Statement::Expense(expense))),
    ))
    .parse(input)
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(code, _)| code)
}

fn syntax_error_detail(err: nom::Err<nom::error::Error<&str>>) -> String {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) if e.input.is_empty() => {
            "unexpected end of line".to_string()
        }
        nom::Err::Error(e) | nom::Err::Failure(e) => format!("unexpected input: {}", e.input),
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
    }
}

pub fn parse_program(input: &str) -> Result<Program<'_>, ParseError> {
    let mut members: Option<Vec<&str>> = None;
    let mut statements = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let content = strip_comment(raw).trim();
        if content.is_empty() {
            continue;
        }

        let (rest, parsed) = line(content).map_err(|err| ParseError::SyntaxError {
            line: line_no,
            detail: syntax_error_detail(err),
        })?;
        if !rest.trim().is_empty() {
            return Err(ParseError::SyntaxError {
                line: line_no,
                detail: format!("unparsed input: {}", rest.trim()),
            });
        }

        match parsed {
            Line::Members(list) => {
                if members.is_some() {
                    return Err(ParseError::DuplicateMembersDeclaration { line: line_no });
                }
                members = Some(list);
            }
            Line::Statement(statement) => {
                if members.is_none() {
                    return Err(ParseError::MissingMembersDeclaration { line: line_no });
                }
                statements.push(StatementWithLine {
                    line: line_no,
                    statement,
                });
            }
        }
    }

    let members = members.ok_or(ParseError::EmptyProgram)?;
    Ok(Program {
        members,
        statements,
    })
}
