//! Top-level shape of a destination structure.
//!
//! Responsibilities:
//! - Tell records (serde structs) apart from maps, sequences and scalars
//!   without serializing the whole value.
//!
//! Invariants:
//! - Newtype wrappers are transparent: `Wrapper(BTreeMap<..>)` is a map.
//! - Unit structs are records.
//! - Structs using `#[serde(flatten)]` serialize as maps and are reported
//!   as `map`.

use std::fmt;

use serde::Serialize;
use serde::ser::{self, Impossible, Serializer};

use super::error::ConfigError;

/// Short-circuits serialization as soon as the shape is known.
#[derive(Debug)]
enum Stop {
    Found(&'static str),
    Custom(String),
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(kind) => write!(f, "found {}", kind),
            Self::Custom(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for Stop {}

impl ser::Error for Stop {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

struct ShapeSerializer;

type Never = Impossible<&'static str, Stop>;

impl Serializer for ShapeSerializer {
    type Ok = &'static str;
    type Error = Stop;
    type SerializeSeq = Never;
    type SerializeTuple = Never;
    type SerializeTupleStruct = Never;
    type SerializeTupleVariant = Never;
    type SerializeMap = Never;
    type SerializeStruct = Never;
    type SerializeStructVariant = Never;

    fn serialize_bool(self, _: bool) -> Result<Self::Ok, Stop> {
        Ok("bool")
    }

    fn serialize_i8(self, _: i8) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_i16(self, _: i16) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_i32(self, _: i32) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_i64(self, _: i64) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_i128(self, _: i128) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_u8(self, _: u8) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_u16(self, _: u16) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_u32(self, _: u32) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_u64(self, _: u64) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_u128(self, _: u128) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_f32(self, _: f32) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_f64(self, _: f64) -> Result<Self::Ok, Stop> {
        Ok("number")
    }

    fn serialize_char(self, _: char) -> Result<Self::Ok, Stop> {
        Ok("string")
    }

    fn serialize_str(self, _: &str) -> Result<Self::Ok, Stop> {
        Ok("string")
    }

    fn serialize_bytes(self, _: &[u8]) -> Result<Self::Ok, Stop> {
        Ok("bytes")
    }

    fn serialize_none(self) -> Result<Self::Ok, Stop> {
        Ok("null")
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _: &T) -> Result<Self::Ok, Stop> {
        Ok("option")
    }

    fn serialize_unit(self) -> Result<Self::Ok, Stop> {
        Ok("null")
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<Self::Ok, Stop> {
        Ok("struct")
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<Self::Ok, Stop> {
        Ok("enum")
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<Self::Ok, Stop> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<Self::Ok, Stop> {
        Ok("enum")
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Never, Stop> {
        Err(Stop::Found("sequence"))
    }

    fn serialize_tuple(self, _: usize) -> Result<Never, Stop> {
        Err(Stop::Found("sequence"))
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Never, Stop> {
        Err(Stop::Found("sequence"))
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Never, Stop> {
        Err(Stop::Found("enum"))
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Never, Stop> {
        Err(Stop::Found("map"))
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Never, Stop> {
        Err(Stop::Found("struct"))
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Never, Stop> {
        Err(Stop::Found("enum"))
    }
}

/// The serde shape of `value`: `struct`, `map`, `sequence`, `enum`,
/// `option`, `null`, `bool`, `number`, `string` or `bytes`.
pub(crate) fn destination_kind<T: ?Sized + Serialize>(value: &T) -> Result<&'static str, ConfigError> {
    match value.serialize(ShapeSerializer) {
        Ok(kind) | Err(Stop::Found(kind)) => Ok(kind),
        Err(Stop::Custom(message)) => Err(ConfigError::KeyDiscovery { message }),
    }
}
