use std::sync::Mutex;

use once_cell::sync::Lazy;
use prost::{bytes::Buf, Message};
use prost_types::FileDescriptorProto;

use crate::{DescriptorError, DescriptorPool};

/// The well-known `google.protobuf` types, compiled at build time.
pub(crate) const WELL_KNOWN_TYPES_BYTES: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/well_known_types.bin"));

static INSTANCE: Lazy<Mutex<DescriptorPool>> = Lazy::new(|| {
    Mutex::new(
        DescriptorPool::decode(WELL_KNOWN_TYPES_BYTES)
            .expect("bundled well-known types are valid"),
    )
});

impl DescriptorPool {
    /// Gets a copy of the global descriptor pool. By default, this contains
    /// the `google.protobuf` well-known types.
    ///
    /// The global pool is used to resolve `Any` payload types when no
    /// explicit resolver is configured, and as the home of descriptors for
    /// [`ReflectMessage`][crate::ReflectMessage] implementations on generated
    /// types.
    ///
    /// The returned pool is a snapshot: modifying it does not affect the
    /// global pool. Use
    /// [`decode_global_file_descriptor_set`](DescriptorPool::decode_global_file_descriptor_set) or
    /// [`add_global_file_descriptor_proto`](DescriptorPool::add_global_file_descriptor_proto)
    /// to register types globally. Registration is append-only; descriptors
    /// obtained from any snapshot remain valid forever.
    pub fn global() -> DescriptorPool {
        INSTANCE.lock().unwrap().clone()
    }

    /// Decodes and adds a set of file descriptors to the global pool.
    ///
    /// See [`DescriptorPool::decode`] for more details.
    pub fn decode_global_file_descriptor_set<B>(bytes: B) -> Result<(), DescriptorError>
    where
        B: Buf,
    {
        let files = prost_types::FileDescriptorSet::decode(bytes)
            .map_err(DescriptorError::decode_file_descriptor_set)?;
        let mut instance = INSTANCE.lock().unwrap();
        instance.add_file_descriptor_set(files)
    }

    /// Adds a single file descriptor to the global pool.
    ///
    /// See [`DescriptorPool::add_file_descriptor_proto`] for more details.
    pub fn add_global_file_descriptor_proto(
        file: FileDescriptorProto,
    ) -> Result<(), DescriptorError> {
        let mut instance = INSTANCE.lock().unwrap();
        instance.add_file_descriptor_proto(file)
    }
}
