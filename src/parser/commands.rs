//! Argument grammar shared by the `stop` and `clear` commands:
//!
//! ```text
//! [[in] ROUTINE] [[at] (LINE [LINE...] | METHOD)] [if (COND | error [ID] | warning [ID]
//!                                                     | caught error [ID] | interrupt | naninf)]
//! ```

use super::types::{
    BreakpointArgs, CommandArg, CommandKind, EventCategory, EventClause, LineMap,
};
use crate::error::{BreakpointError, Result};
use std::fmt;

/// Clause introduced by an explicit or implied keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    In,
    At,
    If,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::In => f.write_str("in"),
            Clause::At => f.write_str("at"),
            Clause::If => f.write_str("if"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrammarState {
    Start,
    SawIn,
    SawAt,
    SawIf,
    Done,
}

/// Integer prefix of a token, `0` if there is none.
fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let value = digits
        .chars()
        .take_while(char::is_ascii_digit)
        .fold(0i64, |acc, c| {
            acc.saturating_mul(10)
                .saturating_add(i64::from(c as u8 - b'0'))
        });
    if negative {
        -value
    } else {
        value
    }
}

fn positive_line(s: &str) -> Option<u32> {
    let n = leading_int(s);
    (n > 0).then(|| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Explicit keywords are consumed. Otherwise a positive integer implies
/// `at` and anything else implies `in`.
fn classify(arg: &CommandArg) -> (Clause, bool) {
    match arg {
        CommandArg::Text(s) => match s.as_str() {
            "in" => (Clause::In, true),
            "at" => (Clause::At, true),
            "if" => (Clause::If, true),
            s if leading_int(s) > 0 => (Clause::At, false),
            _ => (Clause::In, false),
        },
        CommandArg::Lines(_) => (Clause::At, false),
    }
}

fn describe(arg: &CommandArg) -> String {
    match arg {
        CommandArg::Text(s) => s.clone(),
        CommandArg::Lines(lines) => format!("{lines:?}"),
    }
}

fn shell_words(who: CommandKind, text: &str) -> Result<Vec<CommandArg>> {
    shlex::split(text)
        .map(|words| words.into_iter().map(CommandArg::Text).collect())
        .ok_or_else(|| BreakpointError::syntax(who, format!("unbalanced quotes in '{text}'")))
}

/// Byte range of the first unquoted `if` word.
fn find_if_word(line: &str) -> Option<(usize, usize)> {
    let mut quote = None;
    let mut escaped = false;
    let mut word_start = None;

    for (i, c) in line.char_indices().chain([(line.len(), ' ')]) {
        if escaped {
            escaped = false;
            continue;
        }
        if let Some(q) = quote {
            if c == q {
                quote = None;
            } else if c == '\\' && q == '"' {
                escaped = true;
            }
            continue;
        }
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                if &line[start..i] == "if" {
                    return Some((start, i));
                }
            }
        } else {
            word_start.get_or_insert(i);
            match c {
                '\'' | '"' => quote = Some(c),
                '\\' => escaped = true,
                _ => {}
            }
        }
    }
    None
}

/// Split a raw command line into arguments.
///
/// Words before `if` follow shell quoting. When a routine or line comes
/// first, the text after `if` is a condition in the script language and is
/// passed on untouched as a single argument, since its quotes are string
/// literals and transposes. An event clause (`if error ID`) is split like
/// the rest.
pub fn split_command_line(who: CommandKind, line: &str) -> Result<Vec<CommandArg>> {
    let Some((if_start, if_end)) = find_if_word(line) else {
        return shell_words(who, line);
    };

    let mut args = shell_words(who, &line[..if_start])?;
    let rest = line[if_end..].trim();
    let event_clause = args.is_empty();
    args.push(CommandArg::text("if"));
    if event_clause {
        args.extend(shell_words(who, rest)?);
    } else if !rest.is_empty() {
        args.push(CommandArg::text(rest));
    }
    Ok(args)
}

/// Parse the arguments of a `stop`/`clear` command.
///
/// `active_routine` names the routine the interpreter is suspended in, if
/// any; it supplies the routine when a line number is given without one.
pub fn parse_breakpoint_args(
    who: CommandKind,
    args: &[CommandArg],
    active_routine: Option<&str>,
) -> Result<BreakpointArgs> {
    if args.first().and_then(CommandArg::as_text).is_none() {
        return Err(BreakpointError::syntax(
            who,
            "expected a routine name, line number or 'if' clause",
        ));
    }

    let mut out = BreakpointArgs::default();
    let mut state = GrammarState::Start;
    let mut pos = 0;

    while pos < args.len() {
        let (clause, explicit) = classify(&args[pos]);
        if explicit {
            pos += 1;
        }
        if pos >= args.len() {
            return Err(BreakpointError::syntax(
                who,
                format!("'{clause}' missing argument"),
            ));
        }

        match clause {
            Clause::In => {
                let name = args[pos].as_text().ok_or_else(|| {
                    BreakpointError::syntax(who, "routine name must be a string")
                })?;
                match state {
                    GrammarState::Start => {}
                    GrammarState::SawIn | GrammarState::SawAt => {
                        return Err(BreakpointError::syntax(
                            who,
                            format!("Too many function names specified -- {name}"),
                        ))
                    }
                    GrammarState::SawIf | GrammarState::Done => {
                        return Err(BreakpointError::syntax(
                            who,
                            "function name must come before line number and 'if'",
                        ))
                    }
                }
                out.routine = Some(name.to_string());
                state = GrammarState::SawIn;
                pos += 1;
            }
            Clause::At => {
                match state {
                    GrammarState::SawAt => {
                        return Err(BreakpointError::syntax(
                            who,
                            format!(
                                "Only one 'at' clause is allowed -- {}",
                                describe(&args[pos])
                            ),
                        ))
                    }
                    GrammarState::SawIf | GrammarState::Done => {
                        return Err(BreakpointError::syntax(
                            who,
                            "line number must come before 'if' clause",
                        ))
                    }
                    GrammarState::SawIn => {
                        state = GrammarState::SawAt;
                        // a non-numeric word after a name is a method of that class
                        if let Some(method) = args[pos].as_text() {
                            if leading_int(method) == 0 {
                                out.class = out.routine.take();
                                out.routine = Some(method.to_string());
                                pos += 1;
                                continue;
                            }
                        }
                    }
                    GrammarState::Start => {
                        let name = active_routine.ok_or_else(|| {
                            BreakpointError::syntax(
                                who,
                                "function name must come before line number and 'if'",
                            )
                        })?;
                        out.routine = Some(name.to_string());
                        state = GrammarState::SawAt;
                    }
                }
                pos = collect_lines(args, pos, &mut out.lines);
            }
            Clause::If => {
                state = GrammarState::SawIf;
                let rest = &args[pos..];
                if out.routine.is_some() {
                    out.condition = join_condition(who, rest)?;
                } else {
                    out.event = Some(parse_event_clause(who, rest)?);
                }
                pos = args.len();
            }
        }
    }

    if state == GrammarState::SawIf {
        state = GrammarState::Done;
    }
    tracing::trace!(?state, ?out, "parsed {who} arguments");
    Ok(out)
}

/// Read line numbers until a token that is not one (an `if`, or a word
/// that will be rejected by the next clause).
fn collect_lines(args: &[CommandArg], mut pos: usize, lines: &mut LineMap) -> usize {
    while pos < args.len() {
        match &args[pos] {
            CommandArg::Text(s) => match positive_line(s) {
                Some(line) => {
                    lines.insert(lines.len(), line);
                }
                None => break,
            },
            CommandArg::Lines(values) => {
                for &line in values {
                    lines.insert(lines.len(), line);
                }
            }
        }
        pos += 1;
    }
    pos
}

fn join_condition(who: CommandKind, rest: &[CommandArg]) -> Result<String> {
    let words = rest
        .iter()
        .map(|arg| {
            arg.as_text().ok_or_else(|| {
                BreakpointError::syntax(who, "arguments to 'if' must all be strings")
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(words.join(" "))
}

fn parse_event_clause(who: CommandKind, rest: &[CommandArg]) -> Result<EventClause> {
    let word = rest[0]
        .as_text()
        .ok_or_else(|| BreakpointError::syntax(who, "arguments to 'if' must all be strings"))?;

    let (category, extra) = match word {
        "error" => (EventCategory::Error, &rest[1..]),
        "warning" => (EventCategory::Warning, &rest[1..]),
        "caught" if rest.get(1).and_then(CommandArg::as_text) == Some("error") => {
            (EventCategory::CaughtError, &rest[2..])
        }
        "interrupt" => (EventCategory::Interrupt, &rest[1..]),
        "naninf" => (EventCategory::NanInf, &rest[1..]),
        other => {
            return Err(BreakpointError::UnknownEventCategory {
                who,
                category: other.to_string(),
            })
        }
    };

    let id = match (category, extra) {
        (_, []) => None,
        (EventCategory::Interrupt | EventCategory::NanInf, _) => {
            return Err(BreakpointError::syntax(
                who,
                format!("'{category}' does not take an identifier"),
            ))
        }
        (_, [CommandArg::Text(id)]) => Some(id.clone()),
        _ => return Err(BreakpointError::syntax(who, "ID must be a single string")),
    };

    Ok(EventClause { category, id })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<CommandArg> {
        words.iter().map(|w| CommandArg::text(*w)).collect()
    }

    fn parse(words: &[&str]) -> Result<BreakpointArgs> {
        parse_breakpoint_args(CommandKind::Stop, &args(words), None)
    }

    fn syntax_message(err: BreakpointError) -> String {
        match err {
            BreakpointError::CommandSyntax { message, .. } => message,
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn implicit_in_and_at() {
        let parsed = parse(&["F", "60", "75"]).unwrap();
        assert_eq!(parsed.routine.as_deref(), Some("F"));
        assert_eq!(parsed.lines, LineMap::from([(0, 60), (1, 75)]));
        assert!(parsed.condition.is_empty());
    }

    #[test]
    fn explicit_keywords_with_condition() {
        let parsed = parse(&["in", "F", "at", "60", "if", "x", "==", "3"]).unwrap();
        assert_eq!(parsed.routine.as_deref(), Some("F"));
        assert_eq!(parsed.lines, LineMap::from([(0, 60)]));
        assert_eq!(parsed.condition, "x == 3");
        assert!(parsed.event.is_none());
    }

    #[test]
    fn class_and_method() {
        let parsed = parse(&["in", "Account", "at", "deposit"]).unwrap();
        assert_eq!(parsed.class.as_deref(), Some("Account"));
        assert_eq!(parsed.routine.as_deref(), Some("deposit"));
        assert!(parsed.lines.is_empty());
    }

    #[test]
    fn numeric_line_vector() {
        let input = vec![CommandArg::text("F"), CommandArg::Lines(vec![3, 9])];
        let parsed = parse_breakpoint_args(CommandKind::Stop, &input, None).unwrap();
        assert_eq!(parsed.lines, LineMap::from([(0, 3), (1, 9)]));
    }

    #[test]
    fn second_routine_name_is_rejected() {
        let message = syntax_message(parse(&["F", "G"]).unwrap_err());
        assert_eq!(message, "Too many function names specified -- G");
    }

    #[test]
    fn routine_after_lines_is_rejected() {
        let message = syntax_message(parse(&["F", "60", "G"]).unwrap_err());
        assert!(message.starts_with("Too many function names"), "{message}");
    }

    #[test]
    fn line_without_routine_needs_active_session() {
        let message = syntax_message(parse(&["60"]).unwrap_err());
        assert_eq!(
            message,
            "function name must come before line number and 'if'"
        );

        let parsed =
            parse_breakpoint_args(CommandKind::Stop, &args(&["at", "60"]), Some("F")).unwrap();
        assert_eq!(parsed.routine.as_deref(), Some("F"));
        assert_eq!(parsed.lines, LineMap::from([(0, 60)]));
    }

    #[test]
    fn second_at_clause_is_rejected() {
        let message = syntax_message(parse(&["in", "C", "at", "m", "12"]).unwrap_err());
        assert_eq!(message, "Only one 'at' clause is allowed -- 12");
    }

    #[test]
    fn dangling_keyword() {
        let message = syntax_message(parse(&["in", "F", "at"]).unwrap_err());
        assert_eq!(message, "'at' missing argument");
    }

    #[test]
    fn event_clauses() {
        let cases = [
            (&["if", "error"][..], EventCategory::Error, None),
            (&["if", "error", "X:bad"][..], EventCategory::Error, Some("X:bad")),
            (&["if", "warning", "W:id"][..], EventCategory::Warning, Some("W:id")),
            (&["if", "caught", "error"][..], EventCategory::CaughtError, None),
            (&["if", "caught", "error", "C:id"][..], EventCategory::CaughtError, Some("C:id")),
            (&["if", "interrupt"][..], EventCategory::Interrupt, None),
            (&["if", "naninf"][..], EventCategory::NanInf, None),
        ];
        for (words, category, id) in cases {
            let parsed = parse(words).unwrap();
            assert_eq!(
                parsed.event,
                Some(EventClause {
                    category,
                    id: id.map(str::to_string),
                }),
                "{words:?}"
            );
        }
    }

    #[test]
    fn event_id_must_be_single() {
        let message = syntax_message(parse(&["if", "error", "A:x", "B:y"]).unwrap_err());
        assert_eq!(message, "ID must be a single string");
    }

    #[test]
    fn unknown_event_category() {
        let err = parse(&["if", "exception"]).unwrap_err();
        assert!(matches!(
            err,
            BreakpointError::UnknownEventCategory { ref category, .. } if category == "exception"
        ));
    }

    #[test]
    fn condition_text_is_kept_verbatim() {
        let words = split_command_line(CommandKind::Stop, "F 10 if s == 'a b'").unwrap();
        assert_eq!(words, args(&["F", "10", "if", "s == 'a b'"]));

        let words = split_command_line(CommandKind::Stop, "in F at 11 if x' > 0").unwrap();
        assert_eq!(words, args(&["in", "F", "at", "11", "if", "x' > 0"]));
    }

    #[test]
    fn event_clause_is_shell_split() {
        let words = split_command_line(CommandKind::Stop, r#"if error "My:id""#).unwrap();
        assert_eq!(words, args(&["if", "error", "My:id"]));
    }

    #[test]
    fn quoted_if_is_not_a_keyword() {
        let words = split_command_line(CommandKind::Stop, r#""if" 10"#).unwrap();
        assert_eq!(words, args(&["if", "10"]));
        assert!(find_if_word("stiff 10").is_none());
    }

    #[test]
    fn unbalanced_quotes_before_if() {
        assert!(split_command_line(CommandKind::Stop, "'F 10 if x").is_err());
    }

    #[test]
    fn leading_int_matches_prefix() {
        assert_eq!(leading_int("60abc"), 60);
        assert_eq!(leading_int("abc"), 0);
        assert_eq!(leading_int("-4"), -4);
    }
}
