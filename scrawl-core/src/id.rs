//! # IDs
//! Elements and history groups need opaque identifiers that stay unique even when documents are
//! merged from elsewhere. This is implemented in this module via the `Id<T>` type, a random (v4)
//! UUID namespaced by the marker type `T`. Ids carry no ordering meaning.
//!
//! To get a fresh ID, use `Id<YourNamespaceTy>`'s `Default` impl. To eagerly acquire many ids,
//! use `Id::many`.

/// Random identifier, namespaced by `T`.
/// IDs with different namespaces may share a value but cannot be compared.
pub struct Id<T: std::any::Any> {
    uuid: uuid::Uuid,
    // Namespace marker
    _phantom: std::marker::PhantomData<T>,
}
impl<T: std::any::Any> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for Id<T> {}
impl<T: std::any::Any> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}
impl<T: std::any::Any> Eq for Id<T> {}

// Safety - just a uuid. The marker is never stored, so `T`'s auto traits
// should not leak into the ID.
unsafe impl<T: std::any::Any> Send for Id<T> {}
unsafe impl<T: std::any::Any> Sync for Id<T> {}

impl<T: std::any::Any> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<T: std::any::Any> Id<T> {
    /// Wrap an existing uuid, e.g. one read back from an external record.
    #[must_use]
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self {
            uuid,
            _phantom: std::marker::PhantomData,
        }
    }
    #[must_use]
    pub fn uuid(&self) -> uuid::Uuid {
        self.uuid
    }
    /// Allocate many IDs at once.
    pub fn many(count: usize) -> impl ExactSizeIterator<Item = Self> {
        (0..count).map(|_| Self::from_uuid(uuid::Uuid::new_v4()))
    }
}
impl<T: std::any::Any> Default for Id<T> {
    fn default() -> Self {
        Self::from_uuid(uuid::Uuid::new_v4())
    }
}
impl<T: std::any::Any> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form is plenty for logs.
        let simple = self.uuid.simple().to_string();
        write!(
            f,
            "{}#{}",
            std::any::type_name::<T>().rsplit("::").next().unwrap_or("?"),
            &simple[..8]
        )
    }
}
impl<T: std::any::Any> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Id<T> as std::fmt::Display>::fmt(self, f)
    }
}
impl<T: std::any::Any> serde::Serialize for Id<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.uuid.serialize(serializer)
    }
}
impl<'de, T: std::any::Any> serde::Deserialize<'de> for Id<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        uuid::Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

#[cfg(test)]
mod test {
    use super::Id;

    #[test]
    fn many_ids_unique() {
        struct Namespace;
        type TestID = Id<Namespace>;

        let mut v: Vec<_> = TestID::many(1024).map(|id| id.uuid()).collect();
        let length_before = v.len();
        v.sort_unstable();
        v.dedup();

        assert_eq!(length_before, v.len(), "had duplicate ids");
    }
    #[test]
    fn none_ids() {
        struct Namespace;
        assert_eq!(Id::<Namespace>::many(0).len(), 0);
    }
    #[test]
    fn display_is_namespaced() {
        struct Marker;
        let id = Id::<Marker>::default();
        assert!(format!("{id}").starts_with("Marker#"));
    }
}
