/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Arrays become lists, braces become dicts and parentheses become tuples.
/// Anything else goes through `Value::from`.
///
/// ```rust
/// use firepickle::{value, Value};
///
/// let record = value!({
///     "level": "error",
///     "args": (1, 2),
///     "tags": ["db", null]
/// });
///
/// let dict = record.as_dict().unwrap();
/// assert!(dict.get("args").unwrap().is_tuple());
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::List(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::List(vec![$($crate::value!($elem)),*])
    };

    (()) => {
        $crate::Value::Tuple(vec![])
    };

    // A one-element tuple needs the trailing comma, as in Rust.
    (( $elem:tt , )) => {
        $crate::Value::Tuple(vec![$crate::value!($elem)])
    };

    (( $first:tt $(, $rest:tt)+ $(,)? )) => {
        $crate::Value::Tuple(vec![$crate::value!($first) $(, $crate::value!($rest))+])
    };

    ({}) => {
        $crate::Value::Dict($crate::Map::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut dict = $crate::Map::new();
        $(
            dict.insert($key, $crate::value!($value));
        )*
        $crate::Value::Dict(dict)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
