use std::{env, error::Error, fs, path::PathBuf};

/// The well-known type definitions bundled with protox. They are compiled to
/// a file descriptor set at build time and baked into the default registry.
const WELL_KNOWN_TYPES: &[&str] = &[
    "google/protobuf/any.proto",
    "google/protobuf/api.proto",
    "google/protobuf/descriptor.proto",
    "google/protobuf/duration.proto",
    "google/protobuf/empty.proto",
    "google/protobuf/field_mask.proto",
    "google/protobuf/source_context.proto",
    "google/protobuf/struct.proto",
    "google/protobuf/timestamp.proto",
    "google/protobuf/type.proto",
    "google/protobuf/wrappers.proto",
];

fn main() -> Result<(), Box<dyn Error>> {
    let mut wkt_path =
        PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR environment variable not set"));
    wkt_path.push("well_known_types.bin");

    let mut compiler = protox::Compiler::new(&[] as &[&str])?;
    compiler.include_imports(true);
    for file in WELL_KNOWN_TYPES {
        compiler.open_file(file)?;
    }

    fs::write(&wkt_path, compiler.encode_file_descriptor_set())?;
    Ok(())
}
