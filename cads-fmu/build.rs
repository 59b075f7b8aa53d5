fn main() {
    cc::Build::new()
        .file("src/fmi2/logger.c")
        .compile("cads_fmi2_logger");
    println!("cargo:rerun-if-changed=src/fmi2/logger.c");
}
