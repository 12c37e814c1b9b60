use std::collections::HashMap;

mod scanner;

use scanner::next_placeholder;

use crate::codec::ValueCodec;
use crate::error::SqlMapperError;
use crate::types::{Bindings, RowValues};

/// Substitute every `:name` placeholder in `template` with the rendered value bound
/// to `name`.
///
/// Placeholders are found by a plain left-to-right scan: a name starts after `:` and
/// runs up to the next space, comma, CR, LF, parenthesis, quote, backtick, `=` or `!`.
/// Quoted literals are not skipped, so templates must not contain a bare `:` that is
/// not meant as a placeholder. Each distinct name is looked up and rendered once; if
/// `bindings` holds the same name twice the first pair wins.
///
/// ```rust
/// use sql_mapper::prelude::*;
/// use sql_mapper::codec::ValueCodec;
/// use sql_mapper::template::compile;
///
/// let sql = compile(
///     "select * from t where a = :a and b in (:b)",
///     &bindings! { "b" => vec![1, 2], "a" => "x" },
///     &ValueCodec::default(),
/// )?;
/// assert_eq!(sql, "select * from t where a = 'x' and b in (1,2)");
/// # Ok::<(), SqlMapperError>(())
/// ```
///
/// # Errors
/// Returns `SqlMapperError::MissingParameter` when a placeholder has no binding and
/// `SqlMapperError::UnsupportedValueType` when a bound value cannot be rendered.
pub fn compile(
    template: &str,
    bindings: &Bindings<'_>,
    codec: &ValueCodec,
) -> Result<String, SqlMapperError> {
    let mut out = String::with_capacity(template.len());
    let mut rendered: HashMap<&str, String> = HashMap::new();
    let mut rest = template;

    while let Some((literal, name, tail)) = next_placeholder(rest) {
        out.push_str(literal);
        if !rendered.contains_key(name) {
            let value = lookup(bindings, name).ok_or_else(|| SqlMapperError::MissingParameter {
                name: name.to_string(),
                template: template.to_string(),
            })?;
            rendered.insert(name, codec.render(value)?);
        }
        if let Some(text) = rendered.get(name) {
            out.push_str(text);
        }
        rest = tail;
    }
    out.push_str(rest);

    Ok(out)
}

/// Distinct placeholder names in order of first appearance.
#[must_use]
pub fn placeholder_names(template: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    let mut rest = template;
    while let Some((_, name, tail)) = next_placeholder(rest) {
        if !names.contains(&name) {
            names.push(name);
        }
        rest = tail;
    }
    names
}

fn lookup<'b>(bindings: &'b Bindings<'_>, name: &str) -> Option<&'b RowValues> {
    bindings
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
