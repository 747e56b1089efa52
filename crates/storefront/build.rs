//! Build script for the storefront crate.
//!
//! Fingerprints `static/css/main.css` so templates can append `?v=<hash>` and
//! browsers drop stale stylesheets after a deploy.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:rustc-env=CSS_HASH=dev");
        return;
    };
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", css_path.display());

    let hash = fs::read(&css_path).map_or_else(
        |e| {
            println!("cargo:warning=Could not read main.css: {e}");
            "dev".to_owned()
        },
        |content| {
            let digest = format!("{:x}", Sha256::digest(&content));
            digest.chars().take(8).collect()
        },
    );

    println!("cargo:rustc-env=CSS_HASH={hash}");
}
