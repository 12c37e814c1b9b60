/// Build a named parameter list for `Engine::build_query` and the `Storage` methods.
///
/// Each value goes through `RowValues::from`, so plain Rust values can be used:
/// ```rust
/// use sql_mapper::prelude::*;
///
/// let b = bindings! { "id" => 7, "tags" => vec!["a", "b"], "note" => None::<String> };
/// assert_eq!(b[0], ("id", RowValues::Int(7)));
/// assert_eq!(b[2].1, RowValues::Null);
/// ```
#[macro_export]
macro_rules! bindings {
    () => {{
        let empty: [(&str, $crate::RowValues); 0] = [];
        empty
    }};
    ($($name:expr => $value:expr),+ $(,)?) => {
        [$(($name, $crate::RowValues::from($value))),+]
    };
}
