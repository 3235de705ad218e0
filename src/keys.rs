//! Physical key derivation.
//!
//! A value stored for user `123` under `password` lives at the physical key
//! `123_password`. Namespaces are never registered anywhere, they exist only
//! as the shared `{namespace}{separator}` prefix of their keys.

use std::fmt;

use crate::error::{Result, VaultError};

pub(crate) const ACCEPTED_TYPES: &str = "string or integer";

/// A namespace id or key name: a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ident
{
    Str(String),
    Int(i128),
}

impl fmt::Display for Ident
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Ident::Str(s) => f.write_str(s),
            Ident::Int(i) => write!(f, "{i}"),
        }
    }
}

/// Conversion of caller supplied arguments into an [`Ident`].
///
/// `param` names the argument in the error raised for unsupported
/// values.
pub trait IdentArg
{
    fn to_ident(&self, param: &'static str) -> Result<Ident>;
}

impl IdentArg for Ident
{
    fn to_ident(&self, _param: &'static str) -> Result<Ident>
    {
        Ok(self.clone())
    }
}

impl IdentArg for str
{
    fn to_ident(&self, _param: &'static str) -> Result<Ident>
    {
        Ok(Ident::Str(self.to_string()))
    }
}

impl IdentArg for String
{
    fn to_ident(&self, _param: &'static str) -> Result<Ident>
    {
        Ok(Ident::Str(self.clone()))
    }
}

impl<T: IdentArg + ?Sized> IdentArg for &T
{
    fn to_ident(&self, param: &'static str) -> Result<Ident>
    {
        (**self).to_ident(param)
    }
}

macro_rules! int_ident_arg {
    ($($t:ty),*) => {
        $(
            impl IdentArg for $t
            {
                fn to_ident(&self, _param: &'static str) -> Result<Ident>
                {
                    Ok(Ident::Int(i128::from(*self)))
                }
            }
        )*
    };
}

int_ident_arg!(i8, i16, i32, i64, u8, u16, u32, u64);

impl IdentArg for usize
{
    fn to_ident(&self, _param: &'static str) -> Result<Ident>
    {
        Ok(Ident::Int(*self as i128))
    }
}

impl IdentArg for isize
{
    fn to_ident(&self, _param: &'static str) -> Result<Ident>
    {
        Ok(Ident::Int(*self as i128))
    }
}

// Dynamically typed arguments, e.g. ids decoded from a request body.
impl IdentArg for serde_json::Value
{
    fn to_ident(&self, param: &'static str) -> Result<Ident>
    {
        use serde_json::Value;

        let found = match self {
            Value::String(s) => return Ok(Ident::Str(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Ident::Int(i128::from(i)));
                }
                if let Some(u) = n.as_u64() {
                    return Ok(Ident::Int(i128::from(u)));
                }
                "float"
            },
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        };
        Err(VaultError::InvalidType { param, accepted: ACCEPTED_TYPES, found })
    }
}

/// Maps `(namespace, key_name)` pairs to physical keys and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyComposer
{
    separator: String,
}

impl KeyComposer
{
    pub fn new(separator: impl Into<String>) -> Self
    {
        KeyComposer { separator: separator.into() }
    }

    pub fn separator(&self) -> &str
    {
        &self.separator
    }

    /// Accepts a namespace id only if the first separator in its prefix
    /// starts right after the id. Otherwise `("12", "a_b")` and
    /// `("12_a", "b")` would share a physical key, as would `("a", ":b")`
    /// and `("a:", "b")` with a `::` separator.
    pub fn check_namespace(&self, namespace: &Ident) -> Result<()>
    {
        let rendered = namespace.to_string();
        let prefix = std::format!("{}{}", rendered, self.separator);
        if prefix.find(self.separator.as_str()) != Some(rendered.len()) {
            return Err(VaultError::InvalidNamespace {
                namespace: rendered,
                separator: self.separator.clone(),
            });
        }
        Ok(())
    }

    pub fn namespace_prefix(&self, namespace: &Ident) -> String
    {
        std::format!("{}{}", namespace, self.separator)
    }

    pub fn compose(&self, namespace: &Ident, key_name: &Ident) -> String
    {
        std::format!("{}{}{}", namespace, self.separator, key_name)
    }

    pub fn belongs_to(&self, physical_key: &str, namespace: &Ident) -> bool
    {
        physical_key.starts_with(&self.namespace_prefix(namespace))
    }

    /// Removes the namespace prefix once. `None` if the key is foreign.
    pub fn strip_prefix<'a>(&self, physical_key: &'a str, namespace: &Ident)
        -> Option<&'a str>
    {
        physical_key.strip_prefix(self.namespace_prefix(namespace).as_str())
    }
}

impl Default for KeyComposer
{
    fn default() -> Self
    {
        KeyComposer::new(crate::config::DEFAULT_SEPARATOR)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use serde_json::json;

    fn ident(v: impl IdentArg) -> Ident
    {
        v.to_ident("test").unwrap()
    }

    #[test]
    fn test_compose()
    {
        let kc = KeyComposer::default();
        assert_eq!(kc.compose(&ident(123), &ident("password")), "123_password");
        assert_eq!(kc.compose(&ident("sess"), &ident(7u8)), "sess_7");
        assert_eq!(kc.compose(&ident(-4), &ident("x")), "-4_x");
    }

    #[test]
    fn test_belongs_to_requires_full_prefix()
    {
        let kc = KeyComposer::default();
        assert!(kc.belongs_to("12_a", &ident(12)));
        assert!(!kc.belongs_to("123_a", &ident(12)));
        assert!(!kc.belongs_to("12", &ident(12)));
    }

    #[test]
    fn test_strip_prefix_once()
    {
        let kc = KeyComposer::default();
        let ns = ident(12);
        assert_eq!(kc.strip_prefix("12_12_x", &ns), Some("12_x"));
        assert_eq!(kc.strip_prefix("12_", &ns), Some(""));
        assert_eq!(kc.strip_prefix("123_x", &ns), None);
    }

    #[test]
    fn test_namespace_with_separator_rejected()
    {
        let kc = KeyComposer::default();
        let err = kc.check_namespace(&ident("12_a")).unwrap_err();
        assert!(matches!(err, VaultError::InvalidNamespace { .. }));
        kc.check_namespace(&ident(-12)).unwrap();

        let kc = KeyComposer::new("::");
        kc.check_namespace(&ident("12_a")).unwrap();
        assert!(kc.check_namespace(&ident("a::b")).is_err());
    }

    #[test]
    fn test_namespace_overlapping_separator_rejected()
    {
        let kc = KeyComposer::new("::");
        // "a:" + "::" + "b" == "a" + "::" + ":b"
        assert_eq!(kc.compose(&ident("a:"), &ident("b")),
                   kc.compose(&ident("a"), &ident(":b")));
        let err = kc.check_namespace(&ident("a:")).unwrap_err();
        assert!(matches!(err, VaultError::InvalidNamespace { .. }));
        kc.check_namespace(&ident("a")).unwrap();
        kc.check_namespace(&ident(":a")).unwrap();

        let kc = KeyComposer::new("aba");
        assert!(kc.check_namespace(&ident("xab")).is_err());
        kc.check_namespace(&ident("xb")).unwrap();
    }

    #[test]
    fn test_json_idents()
    {
        assert_eq!(json!("abc").to_ident("key_name").unwrap(),
                   Ident::Str("abc".into()));
        assert_eq!(json!(42).to_ident("key_name").unwrap(), Ident::Int(42));
        assert_eq!(json!(u64::MAX).to_ident("key_name").unwrap(),
                   Ident::Int(u64::MAX as i128));
    }

    #[test]
    fn test_structured_idents_rejected()
    {
        for (value, kind) in [(json!([1, 2]), "array"),
                              (json!({"a": 1}), "object"),
                              (json!(1.5), "float"),
                              (json!(true), "boolean"),
                              (json!(null), "null")] {
            match value.to_ident("namespace_id") {
                Err(VaultError::InvalidType { param, accepted, found }) => {
                    assert_eq!(param, "namespace_id");
                    assert_eq!(accepted, ACCEPTED_TYPES);
                    assert_eq!(found, kind);
                },
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_int_and_string_forms_share_keys()
    {
        // Same as the original str() based scheme.
        let kc = KeyComposer::default();
        assert_eq!(kc.compose(&ident(123), &ident("k")),
                   kc.compose(&ident("123"), &ident("k")));
    }
}
