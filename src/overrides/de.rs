use std::str::FromStr;

use serde::de::{self, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, forward_to_deserialize_any};

use super::error::DeserializeError;

pub type Result<T> = std::result::Result<T, DeserializeError>;

/// Deserialize `key=value` lines into a struct or map.
pub fn from_str<'de, T>(input: &'de str) -> Result<T>
where
    T: Deserialize<'de>,
{
    T::deserialize(Entries::new(input))
}

/// One entry per line. Blank lines and `#` comments are skipped.
struct Entries<'de> {
    lines: std::str::Lines<'de>,
    value: &'de str,
}

impl<'de> Entries<'de> {
    fn new(input: &'de str) -> Self {
        Self {
            lines: input.lines(),
            value: "",
        }
    }
}

impl<'de> de::Deserializer<'de> for Entries<'de> {
    type Error = DeserializeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_map(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

impl<'de> MapAccess<'de> for Entries<'de> {
    type Error = DeserializeError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        for line in self.lines.by_ref() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| DeserializeError::ExpectedEquals(line.to_string()))?;
            self.value = value.trim();
            return seed.deserialize(Value(key.trim())).map(Some);
        }
        Ok(None)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        seed.deserialize(Value(std::mem::take(&mut self.value)))
    }
}

/// A single value, or one item of a comma-separated list.
#[derive(Debug, Clone, Copy)]
struct Value<'de>(&'de str);

impl<'de> Value<'de> {
    fn parse<T: FromStr>(self, error: fn(String) -> DeserializeError) -> Result<T> {
        self.0.parse().map_err(|_| error(self.0.to_string()))
    }

    fn unquote(self) -> &'de str {
        self.0
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(self.0)
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident($ty:ty, $error:ident)),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: Visitor<'de>,
            {
                visitor.$visit(self.parse::<$ty>(DeserializeError::$error)?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for Value<'de> {
    type Error = DeserializeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.unquote())
    }

    forward_to_deserialize_any! {
        i128 u128 char bytes byte_buf unit unit_struct
        tuple tuple_struct map struct ignored_any
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8(i8, ExpectedInteger),
        deserialize_i16 => visit_i16(i16, ExpectedInteger),
        deserialize_i32 => visit_i32(i32, ExpectedInteger),
        deserialize_i64 => visit_i64(i64, ExpectedInteger),
        deserialize_u8 => visit_u8(u8, ExpectedInteger),
        deserialize_u16 => visit_u16(u16, ExpectedInteger),
        deserialize_u32 => visit_u32(u32, ExpectedInteger),
        deserialize_u64 => visit_u64(u64, ExpectedInteger),
        deserialize_f32 => visit_f32(f32, ExpectedFloat),
        deserialize_f64 => visit_f64(f64, ExpectedFloat),
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.0 {
            "1" | "true" | "True" => visitor.visit_bool(true),
            "0" | "false" | "False" => visitor.visit_bool(false),
            _ => Err(DeserializeError::ExpectedBool(self.0.to_string())),
        }
    }

    /// An empty value is `None`.
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.0.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.unquote())
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_seq(Items(self.0.split(',')))
    }

    /// Only unit variants, written by name.
    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_enum(self.unquote().into_deserializer())
    }
}

struct Items<'de>(std::str::Split<'de, char>);

impl<'de> SeqAccess<'de> for Items<'de> {
    type Error = DeserializeError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        self.0
            .next()
            .map(|item| seed.deserialize(Value(item.trim())))
            .transpose()
    }
}
