/// Builds the gRPC client and server code for the `mcpi.proto` definition
/// using `tonic-prost-build`.
///
/// # Files and Paths
///
/// - Proto file: `proto/mcpi.proto`
/// - Includes: `proto/`
/// - Descriptor set: `OUT_DIR/mcpi_descriptor.bin`, served by the worker's
///   reflection endpoint.
///
/// # Panics
///
/// Panics if code generation fails, for example when `protoc` is missing.
///
/// # Output
///
/// Generated code will be accessible in Rust via:
///
/// ```rust,ignore
/// tonic::include_proto!("mcpi");
/// ```
use std::env;
use std::path::PathBuf;
fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("mcpi_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/mcpi.proto"], &["proto"])
        .unwrap();
}
