//! Recognising explicit confirmations.

/// Replies that count as an explicit yes.
const AFFIRMATIVES: &[&str] = &[
    "y", "yes", "yeah", "yep", "sure", "ok", "okay", "proceed", "confirm", "go ahead", "do it",
];

/// Whether `input` is an explicit affirmative. Case and trailing punctuation
/// are ignored; anything longer than a bare affirmative is not one.
pub fn is_affirmative(input: &str) -> bool {
    let normalized = input
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim()
        .to_lowercase();
    AFFIRMATIVES.contains(&normalized.as_str())
}

/// Whether an assistant turn asked for confirmation.
pub fn is_confirmation_prompt(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("Proceed") && text.ends_with('?')
}

/// `Proceed using <tool> with <summary>?`
pub fn confirmation_prompt(tool: &str, summary: &str) -> String {
    if summary.is_empty() {
        format!("Proceed using {tool}?")
    } else {
        format!("Proceed using {tool} with {summary}?")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmatives() {
        for answer in ["y", "Yes", "yes!", " OK. ", "go ahead", "Do it!", "sure"] {
            assert!(is_affirmative(answer), "{answer}");
        }
    }

    #[test]
    fn test_non_affirmatives() {
        for answer in ["", "no", "n", "yes but use 5 angstrom", "maybe", "not yet", "nope"] {
            assert!(!is_affirmative(answer), "{answer}");
        }
    }

    #[test]
    fn test_confirmation_prompt_detection() {
        let prompt = confirmation_prompt("generate_vasp_poscar", "formula=NaCl");
        assert_eq!(prompt, "Proceed using generate_vasp_poscar with formula=NaCl?");
        assert!(is_confirmation_prompt(&prompt));
        assert!(is_confirmation_prompt("Proceed using the defaults? "));
        assert!(!is_confirmation_prompt("Do you want to provide formula?"));
        assert!(!is_confirmation_prompt("Proceed using defaults."));
        assert_eq!(confirmation_prompt("tool", ""), "Proceed using tool?");
    }
}
