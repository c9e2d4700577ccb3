//! Compiles the gRPC bindings for `proto/computation.proto` with
//! `tonic-build`. A file descriptor set is emitted alongside the
//! generated code for gRPC server reflection.

use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    tonic_build::configure()
        .file_descriptor_set_path(out_dir.join("computation_descriptor.bin"))
        .compile_protos(&["proto/computation.proto"], &["proto"])?;

    Ok(())
}
