use crate::element::Element;
use masgent_core::{MasgentError, MasgentResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"([A-Z][a-z]?)(\d*)").expect("formula token pattern is valid")
    })
}

/// A parsed chemical formula such as `NaCl` or `Fe2O3`.
///
/// Element order is preserved as written; repeated symbols (`CH3COOH`) are merged
/// into the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    raw: String,
    composition: Vec<(Element, u32)>,
}

impl Formula {
    /// Parses `input`, requiring the tokens to cover the whole trimmed string.
    pub fn parse(input: &str) -> MasgentResult<Self> {
        let trimmed = input.trim();
        let invalid = || MasgentError::Validation(format!("Invalid chemical formula: {input}"));
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let mut composition: Vec<(Element, u32)> = Vec::new();
        let mut consumed = 0;
        for caps in token_pattern().captures_iter(trimmed) {
            let whole = caps.get(0).ok_or_else(invalid)?;
            if whole.start() != consumed {
                return Err(invalid());
            }
            consumed = whole.end();

            let element = Element::from_symbol(&caps[1]).ok_or_else(invalid)?;
            let count = match &caps[2] {
                "" => 1,
                digits => digits.parse::<u32>().map_err(|_| invalid())?,
            };
            if count == 0 {
                return Err(invalid());
            }

            match composition.iter_mut().find(|(e, _)| *e == element) {
                Some((_, n)) => *n += count,
                None => composition.push((element, count)),
            }
        }

        if consumed != trimmed.len() || composition.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            raw: trimmed.to_string(),
            composition,
        })
    }

    /// The formula as the user wrote it (trimmed).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `(element, count)` pairs in written order.
    pub fn composition(&self) -> &[(Element, u32)] {
        &self.composition
    }

    /// The distinct elements in written order.
    pub fn elements(&self) -> Vec<Element> {
        self.composition.iter().map(|(e, _)| *e).collect()
    }

    /// Total atom count of one formula unit.
    pub fn atom_count(&self) -> u32 {
        self.composition.iter().map(|(_, n)| n).sum()
    }

    /// The formula with counts divided by their greatest common divisor, e.g. `Na2Cl2` → `NaCl`.
    pub fn reduced(&self) -> String {
        let divisor = self
            .composition
            .iter()
            .map(|(_, n)| *n)
            .fold(0, gcd)
            .max(1);
        self.composition
            .iter()
            .map(|(e, n)| match n / divisor {
                1 => e.symbol().to_string(),
                k => format!("{}{k}", e.symbol()),
            })
            .collect()
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_formulas() {
        let f = Formula::parse("NaCl").unwrap();
        assert_eq!(f.atom_count(), 2);
        assert_eq!(f.elements()[0].symbol(), "Na");

        let f = Formula::parse(" Fe2O3 ").unwrap();
        assert_eq!(f.as_str(), "Fe2O3");
        assert_eq!(f.composition()[1].1, 3);
    }

    #[test]
    fn test_repeated_symbols_merge() {
        let f = Formula::parse("CH3COOH").unwrap();
        assert_eq!(f.elements().len(), 3);
        assert_eq!(f.atom_count(), 8);
    }

    #[test]
    fn test_invalid_formulas_name_the_input() {
        for bad in ["Xx2", "nacl", "", "Na-Cl", "Cu0", "123"] {
            let err = Formula::parse(bad).unwrap_err();
            assert!(
                err.to_string().contains(&format!("Invalid chemical formula: {bad}")),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn test_reduced() {
        assert_eq!(Formula::parse("Na2Cl2").unwrap().reduced(), "NaCl");
        assert_eq!(Formula::parse("Fe4O6").unwrap().reduced(), "Fe2O3");
    }
}
