fn main() {
    println!("cargo:rerun-if-changed=proto/filewhisperer.proto");
    tonic_build::configure()
        .compile(&["proto/filewhisperer.proto"], &["proto"])
        .expect("failed to compile filewhisperer.proto");
}
