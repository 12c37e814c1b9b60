//! Named query texts with per-dialect variants.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use crate::error::SqlMapperError;

/// Typed access to the query texts of one area of an application.
///
/// A `TransactionManager` builds each accessor type once, for its engine's variant,
/// and hands the cached instance to `execute_with` closures.
/// ```rust
/// use std::sync::{Arc, LazyLock};
/// use sql_mapper::prelude::*;
///
/// static USER_TEXTS: LazyLock<Arc<QueryTexts>> = LazyLock::new(|| {
///     Arc::new(
///         QueryTexts::new()
///             .with("byId", "select id, name from users where id = :id")
///             .with_variant("mysql", "byId", "select id, name from `users` where id = :id"),
///     )
/// });
///
/// struct UserQueries(VariantTexts);
///
/// impl QueryAccessor for UserQueries {
///     fn create(variant: &str) -> Result<Self, SqlMapperError> {
///         Ok(UserQueries(VariantTexts::new(Arc::clone(&USER_TEXTS), variant)))
///     }
/// }
///
/// impl UserQueries {
///     fn by_id(&self) -> &str {
///         self.0.get("byId")
///     }
/// }
///
/// let q = UserQueries::create("mysql")?;
/// assert_eq!(q.by_id(), "select id, name from `users` where id = :id");
/// # Ok::<(), SqlMapperError>(())
/// ```
pub trait QueryAccessor: Send + Sync + Sized + 'static {
    /// # Errors
    /// Returns `SqlMapperError::ConfigError` if the texts for `variant` cannot be loaded.
    fn create(variant: &str) -> Result<Self, SqlMapperError>;
}

/// Immutable key → template table with optional per-variant overrides.
///
/// Lookups try the variant table, then the default table, and finally fall back to
/// the key itself.
#[derive(Debug, Clone, Default)]
pub struct QueryTexts {
    default: HashMap<String, String>,
    variants: HashMap<String, HashMap<String, String>>,
}

impl QueryTexts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the default table from properties text; see [`parse_properties`].
    ///
    /// # Errors
    /// Returns `SqlMapperError::ConfigError` on a malformed line.
    pub fn parse(source: &str) -> Result<Self, SqlMapperError> {
        Ok(Self {
            default: parse_properties(source)?,
            variants: HashMap::new(),
        })
    }

    /// Add (or extend) the table of `variant` from properties text.
    ///
    /// # Errors
    /// Returns `SqlMapperError::ConfigError` on a malformed line.
    pub fn parse_variant(mut self, variant: &str, source: &str) -> Result<Self, SqlMapperError> {
        let parsed = parse_properties(source)?;
        self.variants
            .entry(variant.trim().to_string())
            .or_default()
            .extend(parsed);
        Ok(self)
    }

    #[must_use]
    pub fn with(mut self, key: &str, template: &str) -> Self {
        self.default.insert(key.to_string(), template.to_string());
        self
    }

    #[must_use]
    pub fn with_variant(mut self, variant: &str, key: &str, template: &str) -> Self {
        self.variants
            .entry(variant.trim().to_string())
            .or_default()
            .insert(key.to_string(), template.to_string());
        self
    }

    #[must_use]
    pub fn has_variant(&self, variant: &str) -> bool {
        self.variants.contains_key(variant.trim())
    }

    /// Resolve `key` for `variant`. A blank variant reads the default table only.
    #[must_use]
    pub fn get<'a>(&'a self, key: &'a str, variant: &str) -> &'a str {
        let variant = variant.trim();
        if !variant.is_empty()
            && let Some(text) = self.variants.get(variant).and_then(|table| table.get(key))
        {
            return text;
        }
        self.default.get(key).map_or(key, String::as_str)
    }

    /// Resolve `key` and substitute `{0}`, `{1}`, ... with `args`. Indexes without a
    /// matching argument are left as they are.
    #[must_use]
    pub fn format(&self, key: &str, variant: &str, args: &[&dyn Display]) -> String {
        substitute_positional(self.get(key, variant), args)
    }
}

/// `QueryTexts` pinned to one variant, the usual payload of a `QueryAccessor`.
#[derive(Debug, Clone)]
pub struct VariantTexts {
    texts: Arc<QueryTexts>,
    variant: String,
}

impl VariantTexts {
    #[must_use]
    pub fn new(texts: Arc<QueryTexts>, variant: &str) -> Self {
        Self {
            texts,
            variant: variant.to_string(),
        }
    }

    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }

    #[must_use]
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.texts.get(key, &self.variant)
    }

    #[must_use]
    pub fn format(&self, key: &str, args: &[&dyn Display]) -> String {
        self.texts.format(key, &self.variant, args)
    }
}

/// Parse `key = value` lines.
///
/// Supported: `#` and `!` comment lines, blank lines, `=` or `:` (or whitespace) as
/// the separator after the key, and a trailing backslash to continue a value on the
/// next line. Other escape sequences are kept verbatim.
///
/// # Errors
/// Returns `SqlMapperError::ConfigError` for a line with an empty key.
pub fn parse_properties(source: &str) -> Result<HashMap<String, String>, SqlMapperError> {
    let mut table = HashMap::new();
    let mut lines = source.lines().enumerate();

    while let Some((line_no, raw)) = lines.next() {
        let line = raw.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = line.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some((_, next)) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let key_end = logical
            .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
            .unwrap_or(logical.len());
        if key_end == 0 {
            return Err(SqlMapperError::ConfigError(format!(
                "line {}: missing key in `{}`",
                line_no + 1,
                raw.trim()
            )));
        }
        let key = logical[..key_end].to_string();
        let mut rest = logical[key_end..].trim_start();
        if let Some(stripped) = rest.strip_prefix(['=', ':']) {
            rest = stripped.trim_start();
        }
        table.insert(key, rest.to_string());
    }

    Ok(table)
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn substitute_positional(template: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let idx: usize = after[..close].parse().ok()?;
            let arg = args.get(idx)?;
            Some((arg.to_string(), close))
        });
        match replaced {
            Some((text, close)) => {
                out.push_str(&text);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_SRC: &str = "\
# user queries
byId = select * from users where id = :id
byName: select * from users \\
    where name = :name
count=select count(*) from {0}
";

    #[test]
    fn parses_properties() {
        let texts = QueryTexts::parse(DEFAULT_SRC).unwrap();
        assert_eq!(texts.get("byId", ""), "select * from users where id = :id");
        assert_eq!(texts.get("byName", ""), "select * from users where name = :name");
    }

    #[test]
    fn variant_falls_back_to_default_then_key() {
        let texts = QueryTexts::parse(DEFAULT_SRC)
            .unwrap()
            .parse_variant("mysql", "byId = select * from `users` where id = :id")
            .unwrap();
        assert!(texts.has_variant("mysql"));
        assert_eq!(texts.get("byId", "mysql"), "select * from `users` where id = :id");
        assert_eq!(texts.get("byId", " mysql "), "select * from `users` where id = :id");
        assert_eq!(texts.get("byName", "mysql"), "select * from users where name = :name");
        assert_eq!(texts.get("byId", "oracle"), "select * from users where id = :id");
        assert_eq!(texts.get("unknownKey", "mysql"), "unknownKey");
    }

    #[test]
    fn formats_positional_arguments() {
        let texts = QueryTexts::parse(DEFAULT_SRC).unwrap();
        assert_eq!(texts.format("count", "", &[&"users"]), "select count(*) from users");
        assert_eq!(substitute_positional("{1}{0}{x}{5}", &[&1, &2]), "21{x}{5}");
    }

    #[test]
    fn rejects_missing_key() {
        let err = QueryTexts::parse("= select 1").unwrap_err();
        assert!(matches!(err, SqlMapperError::ConfigError(_)));
    }

    #[test]
    fn variant_texts_pins_variant() {
        let texts = Arc::new(QueryTexts::new().with("k", "a").with_variant("mysql", "k", "b"));
        assert_eq!(VariantTexts::new(Arc::clone(&texts), "mysql").get("k"), "b");
        assert_eq!(VariantTexts::new(texts, "").get("k"), "a");
    }
}
