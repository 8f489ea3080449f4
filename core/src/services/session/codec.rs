//! Value encoding for the key-value store

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Scalar types readable straight from the store
pub trait CacheScalar: Sized {
    fn encode(&self) -> Vec<u8>;
    fn decode(bytes: &[u8]) -> Result<Self, String>;
}

fn as_utf8(bytes: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|e| e.to_string())
}

impl CacheScalar for String {
    fn encode(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self, String> {
        as_utf8(bytes).map(str::to_string)
    }
}

impl CacheScalar for Vec<u8> {
    fn encode(&self) -> Vec<u8> {
        self.clone()
    }

    fn decode(bytes: &[u8]) -> Result<Self, String> {
        Ok(bytes.to_vec())
    }
}

impl CacheScalar for i64 {
    fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, String> {
        as_utf8(bytes)?.parse().map_err(|e: std::num::ParseIntError| e.to_string())
    }
}

impl CacheScalar for f64 {
    fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<Self, String> {
        as_utf8(bytes)?.parse().map_err(|e: std::num::ParseFloatError| e.to_string())
    }
}

impl CacheScalar for bool {
    fn encode(&self) -> Vec<u8> {
        if *self { b"1".to_vec() } else { b"0".to_vec() }
    }

    fn decode(bytes: &[u8]) -> Result<Self, String> {
        match as_utf8(bytes)? {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            other => Err(format!("not a boolean: {}", other)),
        }
    }
}

/// Converts memoized values to and from stored bytes
pub trait Marshaler<T>: Send + Sync {
    fn marshal(&self, value: &T) -> Result<Vec<u8>, String>;
    fn unmarshal(&self, bytes: &[u8]) -> Result<T, String>;
}

/// JSON encoding via serde
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshaler;

impl<T: Serialize + DeserializeOwned> Marshaler<T> for JsonMarshaler {
    fn marshal(&self, value: &T) -> Result<Vec<u8>, String> {
        serde_json::to_vec(value).map_err(|e| e.to_string())
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<T, String> {
        serde_json::from_slice(bytes).map_err(|e| e.to_string())
    }
}

/// Plain-text encoding for [`CacheScalar`] values
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarMarshaler;

impl<T: CacheScalar> Marshaler<T> for ScalarMarshaler {
    fn marshal(&self, value: &T) -> Result<Vec<u8>, String> {
        Ok(value.encode())
    }

    fn unmarshal(&self, bytes: &[u8]) -> Result<T, String> {
        T::decode(bytes)
    }
}
