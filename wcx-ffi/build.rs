use cbindgen::Builder;
use std::env;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => dir,
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR unavailable: {}", e);
            return;
        }
    };

    // Generate C header file for the exported plugin functions
    match Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("WCX_BA2_H")
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file("wcx_ba2.h");
        }
        Err(e) => println!("cargo:warning=Unable to generate wcx_ba2.h: {}", e),
    }
}
