//! Trac wiki markup to GitHub markdown.
//!
//! The conversion is a fixed sequence of substitutions; each one operates on
//! the output of the previous:
//!
//! 1. ticket references (`#12`, `refs 12`, `refs #12`) become issue references,
//! 2. `#!CommitTicketReference ... rev=<rev>` lines collapse to the revision,
//! 3. `{{{` / `}}}` blocks become fenced code blocks,
//! 4. `[[BR]]` becomes a line break,
//! 5. `[changeset:"<rev>/<path>"]` becomes `changeset <rev>`.

use crate::identity::ReferenceResolver;
use regex::Regex;
use std::sync::LazyLock;

static TICKET_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:refs #?|#)([0-9]+)").expect("valid ticket reference regex"));

static COMMIT_TICKET_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#!CommitTicketReference.*rev=([^\s]+)\n").expect("valid commit reference regex")
});

static CHANGESET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[changeset:"([^"/]+?)(?:/[^"]+)?"\]"#).expect("valid changeset regex")
});

static LINE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^").expect("valid line start regex"));

/// Converts Trac markup to GitHub markdown, resolving ticket references
/// relative to `current_repo`.
#[must_use]
pub fn rewrite(markup: &str, current_repo: &str, resolver: &ReferenceResolver<'_>) -> String {
    rewrite_with(markup, |id| {
        resolver.resolve_ticket_reference(id, current_repo)
    })
}

/// Converts Trac markup to GitHub markdown using `resolve` for ticket references.
#[must_use]
pub fn rewrite_with(markup: &str, resolve: impl Fn(u64) -> String) -> String {
    let markup = replace_ticket_references(markup, resolve);
    let markup = COMMIT_TICKET_REFERENCE.replace_all(&markup, "${1}");

    let markup = markup
        .replace("{{{\n", "\n```text\n")
        .replace("{{{", "```")
        .replace("}}}", "```")
        .replace("[[BR]]", "\n");

    CHANGESET.replace_all(&markup, "changeset ${1}").into_owned()
}

/// Prefixes every line of `text` with `> `.
#[must_use]
pub fn make_blockquote(text: &str) -> String {
    LINE_START.replace_all(text, "> ").into_owned()
}

/// Replaces standalone ticket references.
///
/// A reference glued to a preceding word or entity (`abc#12`, `&#123;`) or
/// followed by a word character (`#12a`) is left as is.
fn replace_ticket_references(markup: &str, resolve: impl Fn(u64) -> String) -> String {
    let mut output = String::with_capacity(markup.len());
    let mut copied = 0;
    let mut search_from = 0;

    while let Some(captures) = TICKET_REFERENCE.captures_at(markup, search_from) {
        let (Some(whole), Some(digits)) = (captures.get(0), captures.get(1)) else {
            break;
        };

        let id = digits.as_str().parse::<u64>().ok();
        match id.filter(|_| is_standalone(markup, whole.start(), whole.end())) {
            Some(id) => {
                output.push_str(&markup[copied..whole.start()]);
                output.push_str(&resolve(id));
                copied = whole.end();
                search_from = whole.end();
            }
            None => {
                // Retry from the next character so `xrefs #12` still sees `#12`.
                let step = markup[whole.start()..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                search_from = whole.start() + step;
            }
        }
    }

    output.push_str(&markup[copied..]);
    output
}

fn is_standalone(markup: &str, start: usize, end: usize) -> bool {
    let glued_before = markup[..start]
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '&');
    let glued_after = markup[end..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_');

    !glued_before && !glued_after
}
