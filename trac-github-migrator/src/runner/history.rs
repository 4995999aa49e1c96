//! Renders a Trac change log as GitHub comments.

use crate::markup::make_blockquote;
use crate::templates::{TemplateError, TemplateRenderer};
use crate::trac::ChangeLogEntry;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Format of the timestamp in each update comment.
const UPDATE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// One comment to post: every change a Trac user made at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Update {
    pub time: NaiveDateTime,
    pub author: String,
    pub body: String,
}

/// Groups change log entries by `(time, author)` and renders one update per
/// group, ordered by time then author. Entries keep their change log order
/// within a group; empty comments are dropped.
pub(crate) fn render_updates(
    entries: &[ChangeLogEntry],
    renderer: &TemplateRenderer,
    rewrite: impl Fn(&str) -> String,
) -> Result<Vec<Update>, TemplateError> {
    let mut groups: BTreeMap<(NaiveDateTime, &str), Vec<String>> = BTreeMap::new();

    for entry in entries {
        let Some(text) = render_entry(entry, renderer, &rewrite)? else {
            continue;
        };
        groups
            .entry((entry.time, entry.author.as_str()))
            .or_default()
            .push(text);
    }

    groups
        .into_iter()
        .map(|((time, author), texts)| {
            let update = match texts.as_slice() {
                [single] => single.clone(),
                many => format!("\n* {}", many.join("\n* ")),
            };
            Ok(Update {
                time,
                author: author.to_string(),
                body: renderer.render_update(&time.format(UPDATE_TIME_FORMAT).to_string(), &update)?,
            })
        })
        .collect()
}

fn render_entry(
    entry: &ChangeLogEntry,
    renderer: &TemplateRenderer,
    rewrite: &impl Fn(&str) -> String,
) -> Result<Option<String>, TemplateError> {
    if entry.is_comment() {
        if entry.new_value.is_empty() {
            return Ok(None);
        }
        return renderer
            .render_comment(&entry.author, &rewrite(&entry.new_value))
            .map(Some);
    }

    let rendered = if entry.old_value.contains('\n') || entry.new_value.contains('\n') {
        renderer.render_block_change(
            &entry.author,
            &entry.field,
            &make_blockquote(&entry.old_value),
            &make_blockquote(&entry.new_value),
        )?
    } else {
        renderer.render_inline_change(
            &entry.author,
            &entry.field,
            &entry.old_value,
            &entry.new_value,
        )?
    };
    Ok(Some(rendered))
}
