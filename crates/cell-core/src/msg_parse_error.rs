#[derive(Debug, PartialEq, Eq)]
pub enum MsgParseErr {
    InvalidProtocolDiscriminator { found: u64 },
    InvalidMsgType { expected: u64, found: u64 },
    UnknownMsgType { pd: u64, found: u64 },
    BufferEnded { field: Option<&'static str> },
    InvalidValue { field: &'static str, value: u64 },
    InconsistentLength { expected: usize, found: usize },
    TrailingData { remaining: usize },
    FieldTooLong { field: &'static str, len: usize },
}

/// Checks whether a message type value matches the expected value. If not, returns MsgParseErr::InvalidMsgType
#[macro_export]
macro_rules! expect_msg_type {
    ($value:expr, $expected:expr) => {{
        let raw_expected = $expected.into_raw();
        if $value == raw_expected {
            Ok(())
        } else {
            Err(MsgParseErr::InvalidMsgType {
                expected: raw_expected as u64,
                found: $value,
            })
        }
    }};
}

/// Checks whether a value matches an expected value. If not, returns MsgParseErr::InvalidValue
#[macro_export]
macro_rules! expect_value {
    ($value:ident, $expected:expr) => {
        $crate::expect_value!(@inner $value, $expected, stringify!($value))
    };
    ($value:expr, $expected:expr, $field:expr) => {
        $crate::expect_value!(@inner $value, $expected, $field)
    };

    (@inner $value:expr, $expected:expr, $field:expr) => {{
        let val = $value;
        if val == $expected {
            Ok(())
        } else {
            Err(MsgParseErr::InvalidValue {
                field: $field,
                value: val.into(),
            })
        }
    }};
}

/// Reads a field of the given width into a variable of the same name
#[macro_export]
macro_rules! let_field {
    ($buf:expr, $ident:ident, $bits:expr) => {
        let $ident = $buf.read_field($bits, stringify!($ident))?;
    };
}

/// Reads a field and converts it into an enum through `TryFrom<u64>`, failing with InvalidValue
#[macro_export]
macro_rules! let_enum_field {
    ($buf:expr, $ident:ident, $ty:ty, $bits:expr) => {
        let raw = $buf.read_field($bits, stringify!($ident))?;
        let $ident = <$ty>::try_from(raw).map_err(|_| MsgParseErr::InvalidValue {
            field: stringify!($ident),
            value: raw,
        })?;
    };
}
