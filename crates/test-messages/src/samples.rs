//! Sample messages sitting on the numeric boundaries of each field type.

use crate::{Proto2Message, Proto3Message};

/// Smallest positive subnormal double (Java's `Double.MIN_VALUE`).
pub const MIN_POSITIVE_SUBNORMAL: f64 = 4.9e-324;

/// Build a proto2 message from its four fields.
pub fn proto2(text: &str, flag: bool, int: i64, dbl: f64) -> Proto2Message {
    let mut message = Proto2Message::new();
    message.str = Some(text.to_string());
    message.boolean = Some(flag);
    message.int = Some(int);
    message.dbl = Some(dbl);
    message
}

/// Build a proto3 message from its four fields.
pub fn proto3(text: &str, flag: bool, int: i64, dbl: f64) -> Proto3Message {
    let mut message = Proto3Message::new();
    message.str = text.to_string();
    message.boolean = flag;
    message.int = int;
    message.dbl = dbl;
    message
}

/// `"Hello World"`, `true`, `i64::MIN`, smallest positive subnormal.
pub fn hello_world() -> Proto2Message {
    proto2("Hello World", true, i64::MIN, MIN_POSITIVE_SUBNORMAL)
}

/// `"Goodbye World"`, `false`, `i64::MAX`, `f64::MAX`.
pub fn goodbye_world() -> Proto3Message {
    proto3("Goodbye World", false, i64::MAX, f64::MAX)
}
