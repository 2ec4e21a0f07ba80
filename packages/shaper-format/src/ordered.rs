use std::{fmt, marker::PhantomData};

use serde::{
	Deserialize, Deserializer, Serialize, Serializer,
	de::{MapAccess, Visitor},
	ser::SerializeMap,
};

/// A JSON object whose entries keep the order in which they were read.
///
/// Iteration order is the wire order, independent of how `serde_json` was compiled.
#[derive(Clone, Debug, PartialEq)]
pub struct Ordered<V>(Vec<(String, V)>);
impl<V> Ordered<V> {
	pub fn new() -> Self {
		Self(Vec::new())
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, key: &str) -> Option<&V> {
		self.0.iter().find(|(name, _)| name == key).map(|(_, value)| value)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value))
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|(name, _)| name.as_str())
	}

	/// Replaces the value in place when the key already exists, otherwise appends.
	pub fn insert(&mut self, key: impl Into<String>, value: V) {
		let key = key.into();

		match self.0.iter_mut().find(|(name, _)| *name == key) {
			Some((_, slot)) => *slot = value,
			None => self.0.push((key, value)),
		}
	}
}
impl<V> Default for Ordered<V> {
	fn default() -> Self {
		Self::new()
	}
}
impl<K, V> FromIterator<(K, V)> for Ordered<V>
where
	K: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		let mut out = Self::new();

		for (key, value) in iter {
			out.insert(key, value);
		}

		out
	}
}
impl<V> Serialize for Ordered<V>
where
	V: Serialize,
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.0.len()))?;

		for (key, value) in &self.0 {
			map.serialize_entry(key, value)?;
		}

		map.end()
	}
}
impl<'de, V> Deserialize<'de> for Ordered<V>
where
	V: Deserialize<'de>,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_map(OrderedVisitor(PhantomData))
	}
}

struct OrderedVisitor<V>(PhantomData<V>);
impl<'de, V> Visitor<'de> for OrderedVisitor<V>
where
	V: Deserialize<'de>,
{
	type Value = Ordered<V>;

	fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str("a JSON object")
	}

	fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
	where
		A: MapAccess<'de>,
	{
		let mut out = Ordered(Vec::with_capacity(access.size_hint().unwrap_or(0)));

		while let Some((key, value)) = access.next_entry::<String, V>()? {
			out.insert(key, value);
		}

		Ok(out)
	}
}
