//! Packs the interceptor's `wasm-bindgen --target no-modules` output into
//! the single script the injector evaluates.
//!
//! The glue defines a `wasm_bindgen` global initializer; the module bytes
//! are inlined as base64 so the page needs no extra requests. The produced
//! script runs with `settings` in scope and ends by calling
//! `wasm_bindgen.install(settings)`.
//!
//! ```text
//! cargo build -p approvetap-interceptor --features web --target wasm32-unknown-unknown --release
//! wasm-bindgen --target no-modules --out-dir target/pkg \
//!     target/wasm32-unknown-unknown/release/approvetap_interceptor.wasm
//! approvetap bundle target/pkg          # writes browser.injectScript
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::info;

/// Glue file written by `wasm-bindgen` for the interceptor crate.
pub const GLUE_FILE: &str = "approvetap_interceptor.js";
pub const WASM_FILE: &str = "approvetap_interceptor_bg.wasm";

const WASM_MAGIC: &[u8] = b"\0asm";

#[derive(Debug, Clone)]
pub struct EngineBundle {
    glue: String,
    wasm: Vec<u8>,
}

impl EngineBundle {
    pub fn new(glue: String, wasm: Vec<u8>) -> Result<Self> {
        if !glue.contains("wasm_bindgen") {
            bail!("glue does not define `wasm_bindgen`; build it with `wasm-bindgen --target no-modules`");
        }
        if !wasm.starts_with(WASM_MAGIC) {
            bail!("{WASM_FILE} is not a WebAssembly module");
        }
        Ok(Self { glue, wasm })
    }

    /// Read `GLUE_FILE` and `WASM_FILE` from a `wasm-bindgen` output directory.
    pub async fn load(pkg_dir: &Path) -> Result<Self> {
        let glue_path = pkg_dir.join(GLUE_FILE);
        let wasm_path = pkg_dir.join(WASM_FILE);
        let glue = tokio::fs::read_to_string(&glue_path)
            .await
            .with_context(|| format!("Failed to read {}", glue_path.display()))?;
        let wasm = tokio::fs::read(&wasm_path)
            .await
            .with_context(|| format!("Failed to read {}", wasm_path.display()))?;
        Self::new(glue, wasm)
    }

    pub fn script(&self) -> String {
        let encoded = STANDARD.encode(&self.wasm);
        format!(
            r#"{glue}
  const approvetapWasm = Uint8Array.from(atob("{encoded}"), (c) => c.charCodeAt(0));
  await wasm_bindgen({{ module_or_path: approvetapWasm }});
  wasm_bindgen.install(settings);
"#,
            glue = self.glue.trim_end(),
        )
    }

    pub async fn write(&self, out: &Path) -> Result<()> {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let script = self.script();
        tokio::fs::write(out, &script)
            .await
            .with_context(|| format!("Failed to write {}", out.display()))?;
        info!(path = %out.display(), bytes = script.len(), "Wrote interceptor bundle");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const GLUE: &str = "let wasm_bindgen;\n(function() { wasm_bindgen = function() {}; })();\n";
    pub(crate) const WASM: &[u8] = b"\0asm\x01\0\0\0";

    pub(crate) fn write_pkg(dir: &Path) {
        std::fs::write(dir.join(GLUE_FILE), GLUE).unwrap();
        std::fs::write(dir.join(WASM_FILE), WASM).unwrap();
    }

    #[test]
    fn script_inlines_module_and_installs() {
        let bundle = EngineBundle::new(GLUE.into(), WASM.to_vec()).unwrap();
        let script = bundle.script();
        assert!(script.starts_with("let wasm_bindgen;"));
        assert!(script.contains(r#"atob("AGFzbQEAAAA=")"#));
        let init = script.find("await wasm_bindgen(").unwrap();
        let install = script.find("wasm_bindgen.install(settings);").unwrap();
        assert!(init < install);
    }

    #[test]
    fn rejects_wrong_artifacts() {
        assert!(EngineBundle::new("export default function init() {}".into(), WASM.to_vec()).is_err());
        assert!(EngineBundle::new(GLUE.into(), b"not wasm".to_vec()).is_err());
    }

    #[tokio::test]
    async fn loads_and_writes_from_pkg_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_pkg(dir.path());
        let bundle = EngineBundle::load(dir.path()).await.unwrap();
        let out = dir.path().join("dist").join("approvetap.js");
        bundle.write(&out).await.unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written, bundle.script());
    }

    #[tokio::test]
    async fn missing_artifacts_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineBundle::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains(GLUE_FILE));
    }
}
