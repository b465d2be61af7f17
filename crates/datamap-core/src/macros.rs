/// Builds a [`Record`](crate::Record) from `key => value` pairs, preserving
/// the order in which the fields are written.
///
/// ```
/// use datamap_core::{record, Value};
///
/// let record = record! { "id" => 7, "name" => "Ada" };
/// assert_eq!(record.get("name"), Some(&Value::from("Ada")));
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    (
        $( $key:expr => $value:expr ),+ $(,)?
    ) => {{
        let mut record = $crate::Record::new();
        $( record.insert($key, $value); )+
        record
    }};
}
