//! Picks the expectation answering an actual call.

use crate::arguments::{ArgsDiff, Arguments};
use crate::call::Call;
use crate::notice::{Notice, CALL_NOT_FOUND, UNEXPECTED_CALL};

/// A rejected expectation and how far its pattern is from the actual call.
struct Candidate<'a> {
    call: &'a Call,
    diff: ArgsDiff,
}

/// Selects the expectation for `method` called with `args`.
///
/// The first expectation, in registration order, whose pattern matches and
/// that may be called again wins. Proxy-backed expectations without a
/// pattern come second. Otherwise the closest expectation is described in
/// the returned notice.
pub(crate) fn select(expected: &[Call], method: &str, args: &Arguments) -> Result<Call, Notice> {
    let named: Vec<&Call> = expected.iter().filter(|c| c.method() == method).collect();

    for call in &named {
        if call.can_call().is_err() {
            continue;
        }
        let matched = if call.accepts_any() {
            !call.is_proxy()
        } else {
            call.pattern().is_some_and(|p| p.diff(args).is_match())
        };
        if matched {
            return Ok((*call).clone());
        }
    }

    for call in &named {
        if call.is_proxy() && call.accepts_any() && call.can_call().is_ok() {
            return Ok((*call).clone());
        }
    }

    let mut closest: Option<Candidate<'_>> = None;
    for call in named {
        let diff = match call.pattern() {
            Some(p) => p.diff(args),
            None => ArgsDiff::default(),
        };
        closest = better(closest, Candidate { call, diff });
    }

    Err(match closest {
        Some(c) => match c.call.can_call() {
            Err(too_many) if c.diff.is_match() => too_many,
            _ => Notice::new(UNEXPECTED_CALL)
                .append("method", actual_signature(method, args))
                .append("closest", c.call.signature())
                .append("created at", c.call.location())
                .append("diff", c.diff.text()),
        },
        None => Notice::new(CALL_NOT_FOUND)
            .append("method", actual_signature(method, args))
            .append("args", render(args)),
    })
}

/// Keeps the current candidate unless `next` has the same name and fewer
/// argument differences.
fn better<'a>(current: Option<Candidate<'a>>, next: Candidate<'a>) -> Option<Candidate<'a>> {
    match current {
        None => Some(next),
        Some(cur) => {
            if cur.call.method() == next.call.method() && next.diff.failures < cur.diff.failures {
                Some(next)
            } else {
                Some(cur)
            }
        }
    }
}

pub(crate) fn actual_signature(method: &str, args: &Arguments) -> String {
    format!("{method}({})", args.type_names().join(", "))
}

fn render(args: &Arguments) -> String {
    if args.is_empty() {
        return "(none)".to_string();
    }
    args.iter()
        .enumerate()
        .map(|(i, v)| format!("{i}: {}", v.render()))
        .collect::<Vec<_>>()
        .join("\n")
}
