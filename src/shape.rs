use std::any::type_name;

/// Marshalling metadata for a record type.
///
/// Implement this for every type that goes through [`Xml`](crate::Xml). All
/// methods have defaults, so the minimal implementation is empty:
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use xml_marshal::Shape;
///
/// #[derive(Serialize, Deserialize)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// impl Shape for Person {}
///
/// // With no declared name, elements are named after the type,
/// // lower-camel-cased.
/// assert_eq!(Person::element_name(), "person");
/// ```
///
/// Declare an explicit element name to override the derived one:
///
/// ```
/// # use serde::{Deserialize, Serialize};
/// # use xml_marshal::Shape;
/// # #[derive(Serialize, Deserialize)]
/// # struct Invoice { total: f64 }
/// impl Shape for Invoice {
///     fn declared_name() -> Option<&'static str> {
///         Some("Invoice")
///     }
/// }
/// assert_eq!(Invoice::element_name(), "Invoice");
/// ```
pub trait Shape {
    /// The explicitly declared root/element name for this shape, if any.
    fn declared_name() -> Option<&'static str>
    where
        Self: Sized,
    {
        None
    }

    /// The bare type name, without module path or generic arguments.
    fn type_label() -> &'static str
    where
        Self: Sized,
    {
        simple_name(type_name::<Self>())
    }

    /// The element name used when encoding records of this shape: the
    /// declared name when present, otherwise the lower-camel-cased type name.
    fn element_name() -> String
    where
        Self: Sized,
    {
        match Self::declared_name() {
            Some(name) => name.to_string(),
            None => decapitalize(Self::type_label()),
        }
    }
}

fn simple_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Lower-camel-cases a type name: the leading character is lowered unless the
/// second character is also uppercase ("XmlPojo" -> "xmlPojo", "URL" -> "URL").
pub(crate) fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let rest = chars.as_str();
    let second_upper = rest.chars().next().is_some_and(char::is_uppercase);
    if first.is_uppercase() && !second_upper {
        first.to_lowercase().chain(rest.chars()).collect()
    } else {
        name.to_string()
    }
}
