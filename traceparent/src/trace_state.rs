//! The companion `tracestate` header.
//!
//! Entries are checked against the W3C list grammar and kept in order. The
//! values are vendor specific and are never interpreted here.
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of list members allowed in a `tracestate` header.
const MAX_LIST_MEMBERS: usize = 32;

/// TraceState carries system-specific configuration data, represented as a list
/// of key-value pairs. TraceState allows multiple tracing systems to
/// participate in the same trace.
///
/// Please review the [W3C specification] for details on this field.
///
/// [W3C specification]: https://www.w3.org/TR/trace-context/#tracestate-header
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct TraceState(Vec<(String, String)>);

impl TraceState {
    /// The empty `TraceState`, as a constant
    pub const NONE: TraceState = TraceState(Vec::new());

    /// Validates that the given `TraceState` list-member key is valid per the [W3 Spec].
    ///
    /// [W3 Spec]: https://www.w3.org/TR/trace-context/#key
    fn valid_key(key: &str) -> bool {
        if key.is_empty() || key.len() > 256 {
            return false;
        }

        let allowed_special = |b: u8| (b == b'_' || b == b'-' || b == b'*' || b == b'/');
        let mut vendor_start = None;
        for (i, &b) in key.as_bytes().iter().enumerate() {
            if !(b.is_ascii_lowercase() || b.is_ascii_digit() || allowed_special(b) || b == b'@') {
                return false;
            }

            if i == 0 && (!b.is_ascii_lowercase() && !b.is_ascii_digit()) {
                return false;
            } else if b == b'@' {
                if vendor_start.is_some() || i + 14 < key.len() {
                    return false;
                }
                vendor_start = Some(i);
            } else if let Some(start) = vendor_start {
                if i == start + 1 && !(b.is_ascii_lowercase() || b.is_ascii_digit()) {
                    return false;
                }
            }
        }

        true
    }

    /// Validates that the given `TraceState` list-member value is valid per the [W3 Spec].
    ///
    /// [W3 Spec]: https://www.w3.org/TR/trace-context/#value
    fn valid_value(value: &str) -> bool {
        if value.len() > 256 {
            return false;
        }

        !(value.contains(',') || value.contains('=') || value.chars().any(|c| c.is_control()))
    }

    /// Creates a new `TraceState` from the given key-value collection.
    ///
    /// # Examples
    ///
    /// ```
    /// use traceparent::TraceState;
    ///
    /// let kvs = vec![("foo", "bar"), ("apple", "banana")];
    /// let trace_state = TraceState::from_key_value(kvs);
    ///
    /// assert!(trace_state.is_ok());
    /// assert_eq!(trace_state.unwrap().header(), String::from("foo=bar,apple=banana"))
    /// ```
    pub fn from_key_value<T, K, V>(trace_state: T) -> Result<Self, TraceStateError>
    where
        T: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString,
    {
        let entries = trace_state
            .into_iter()
            .map(|(key, value)| {
                let (key, value) = (key.to_string(), value.to_string());
                if !TraceState::valid_key(key.as_str()) {
                    return Err(TraceStateError::Key(key));
                }
                if !TraceState::valid_value(value.as_str()) {
                    return Err(TraceStateError::Value(value));
                }

                Ok((key, value))
            })
            .collect::<Result<Vec<_>, TraceStateError>>()?;

        if entries.len() > MAX_LIST_MEMBERS {
            return Err(TraceStateError::TooManyMembers(entries.len()));
        }

        Ok(TraceState(entries))
    }

    /// Retrieves a value for a given key from the `TraceState` if it exists.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over the entries in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of list members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no list members.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Creates a new `TraceState` header string, delimiting each key and value with a `=` and each
    /// entry with a `,`.
    pub fn header(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<String>>()
            .join(",")
    }
}

impl FromStr for TraceState {
    type Err = TraceStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut key_value_pairs: Vec<(&str, &str)> = Vec::new();

        // Empty list members are allowed and carry nothing.
        for list_member in s
            .split(',')
            .map(|member| member.trim_matches(|c| c == ' ' || c == '\t'))
            .filter(|member| !member.is_empty())
        {
            match list_member.split_once('=') {
                None => return Err(TraceStateError::List(list_member.to_string())),
                Some((key, value)) => key_value_pairs.push((key, value)),
            }
        }

        TraceState::from_key_value(key_value_pairs)
    }
}

/// Error returned when a `tracestate` header cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TraceStateError {
    /// The key is invalid.
    ///
    /// See <https://www.w3.org/TR/trace-context/#key> for requirement for keys.
    #[error("{0} is not a valid key in TraceState, see https://www.w3.org/TR/trace-context/#key for more details")]
    Key(String),

    /// The value is invalid.
    ///
    /// See <https://www.w3.org/TR/trace-context/#value> for requirement for values.
    #[error("{0} is not a valid value in TraceState, see https://www.w3.org/TR/trace-context/#value for more details")]
    Value(String),

    /// The list is invalid.
    ///
    /// See <https://www.w3.org/TR/trace-context/#list> for requirement for list members.
    #[error("{0} is not a valid list member in TraceState, see https://www.w3.org/TR/trace-context/#list for more details")]
    List(String),

    /// The list has more members than allowed.
    #[error("TraceState has {0} list members, at most 32 are allowed")]
    TooManyMembers(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    fn trace_state_test_data() -> Vec<(&'static str, &'static str, usize)> {
        vec![
            ("", "", 0),
            ("foo=bar", "foo=bar", 1),
            ("foo=,apple=banana", "foo=,apple=banana", 2),
            ("foo=bar , apple=banana", "foo=bar,apple=banana", 2),
            ("foo=bar,,apple=banana", "foo=bar,apple=banana", 2),
            ("rojo=00f067aa0ba902b7,congo=t61rcWkgMzE", "rojo=00f067aa0ba902b7,congo=t61rcWkgMzE", 2),
            ("tenant@vendor=value", "tenant@vendor=value", 1),
        ]
    }

    #[test]
    fn parse_and_render() {
        for (input, header, len) in trace_state_test_data() {
            let trace_state = TraceState::from_str(input).unwrap();
            assert_eq!(trace_state.header(), header, "input: {input:?}");
            assert_eq!(trace_state.len(), len, "input: {input:?}");
        }
    }

    #[test]
    fn test_trace_state_key() {
        let test_data: Vec<(&'static str, bool)> = vec![
            ("123", true),
            ("bar", true),
            ("foo@bar", true),
            ("foo@0123456789abcdef", false),
            ("foo@012345678", true),
            ("FOO@BAR", false),
            ("", false),
            ("你好", false),
        ];

        for (key, expected) in test_data {
            assert_eq!(TraceState::valid_key(key), expected, "test key: {:?}", key);
        }
    }

    #[test]
    fn rejects_malformed_lists() {
        assert_eq!(
            TraceState::from_str("foo=bar,malformed"),
            Err(TraceStateError::List("malformed".to_string()))
        );
        assert_eq!(
            TraceState::from_str("=value"),
            Err(TraceStateError::Key(String::new()))
        );
        assert_eq!(
            TraceState::from_str("Foo=bar"),
            Err(TraceStateError::Key("Foo".to_string()))
        );
        assert_eq!(
            TraceState::from_str("foo=b=r"),
            Err(TraceStateError::Value("b=r".to_string()))
        );

        let too_many = (0..33)
            .map(|i| format!("k{i}=v"))
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(
            TraceState::from_str(&too_many),
            Err(TraceStateError::TooManyMembers(33))
        );
    }

    #[test]
    fn get_returns_first_match() {
        let trace_state = TraceState::from_str("foo=bar,apple=banana").unwrap();
        assert_eq!(trace_state.get("apple"), Some("banana"));
        assert_eq!(trace_state.get("missing"), None);
        assert_eq!(
            trace_state.iter().collect::<Vec<_>>(),
            vec![("foo", "bar"), ("apple", "banana")]
        );
    }
}
