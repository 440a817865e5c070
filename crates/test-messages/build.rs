fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let proto_dir = std::path::PathBuf::from(&manifest_dir).join("proto");

    let proto_paths = ["proto2_message.proto", "proto3_message.proto"]
        .iter()
        .map(|filename| proto_dir.join(filename))
        .collect::<Vec<_>>();

    for path in &proto_paths {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    // Pure-Rust parser so the build does not need a protoc binary
    protobuf_codegen::Codegen::new()
        .pure()
        .includes([&proto_dir])
        .inputs(&proto_paths)
        .cargo_out_dir("protos")
        .run_from_script();
}
