use masgent_core::{MasgentError, MasgentResult};
use std::path::{Path, PathBuf};

/// A local VASP pseudopotential library laid out as `<root>/<symbol>/POTCAR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotcarLibrary {
    root: PathBuf,
}

impl PotcarLibrary {
    /// A library rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Library directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Concatenates the POTCARs for `symbols` in order.
    pub fn assemble(&self, symbols: &[String]) -> MasgentResult<String> {
        let mut out = String::new();
        for symbol in symbols {
            let path = self.root.join(symbol).join("POTCAR");
            let text = std::fs::read_to_string(&path).map_err(|e| {
                MasgentError::Structure(format!("POTCAR for {symbol} not found at {}: {e}", path.display()))
            })?;
            out.push_str(&text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
        }
        Ok(out)
    }
}

/// Assembles POTCAR text, failing when no library is configured.
pub fn potcar_for(library: Option<&PotcarLibrary>, symbols: &[String]) -> MasgentResult<String> {
    match library {
        Some(lib) => lib.assemble(symbols),
        None => Err(MasgentError::Config(
            "no POTCAR library configured (set [vasp] potcar_dir)".to_string(),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for (sym, body) in [("Na_pv", "PAW Na_pv"), ("Cl", "PAW Cl\n")] {
            std::fs::create_dir_all(dir.path().join(sym)).unwrap();
            std::fs::write(dir.path().join(sym).join("POTCAR"), body).unwrap();
        }
        let lib = PotcarLibrary::new(dir.path());
        let text = lib.assemble(&["Na_pv".into(), "Cl".into()]).unwrap();
        assert_eq!(text, "PAW Na_pv\nPAW Cl\n");
    }

    #[test]
    fn test_missing_library_fails() {
        let err = potcar_for(None, &["Si".into()]).unwrap_err();
        assert!(err.to_string().contains("POTCAR"));
    }

    #[test]
    fn test_missing_symbol_fails() {
        let dir = tempfile::tempdir().unwrap();
        let lib = PotcarLibrary::new(dir.path());
        assert!(lib.assemble(&["Si".into()]).is_err());
    }
}
