//! `approvetap bundle`: packs the interceptor's wasm-bindgen output into the
//! script the browser session injects.

use std::path::Path;

use anyhow::Result;
use approvetap_browser::EngineBundle;

pub async fn run(pkg_dir: &Path, out: &Path) -> Result<()> {
    let bundle = EngineBundle::load(pkg_dir).await?;
    bundle.write(out).await?;
    println!("Wrote {}", out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approvetap_browser::bundle::{GLUE_FILE, WASM_FILE};

    #[tokio::test]
    async fn writes_bundle_to_inject_script_path() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        std::fs::create_dir(&pkg).unwrap();
        std::fs::write(pkg.join(GLUE_FILE), "let wasm_bindgen;\n").unwrap();
        std::fs::write(pkg.join(WASM_FILE), b"\0asm\x01\0\0\0").unwrap();

        let out = dir.path().join("dist/approvetap.js");
        run(&pkg, &out).await.unwrap();
        let script = std::fs::read_to_string(&out).unwrap();
        assert!(script.contains("wasm_bindgen.install(settings);"));
    }

    #[tokio::test]
    async fn empty_pkg_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &dir.path().join("out.js")).await.is_err());
    }
}
