//! The structured-mode command table.

/// One numbered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    /// What the user types.
    pub code: &'static str,
    /// Menu text, also used as the parameter prompt prefix.
    pub description: &'static str,
    /// Tool dispatched by the command; `None` for group headings.
    pub tool: Option<&'static str>,
}

/// Exact-match lookup from codes to commands.
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
}

const fn group(code: &'static str, description: &'static str) -> CommandEntry {
    CommandEntry {
        code,
        description,
        tool: None,
    }
}

const fn tool(code: &'static str, description: &'static str, tool: &'static str) -> CommandEntry {
    CommandEntry {
        code,
        description,
        tool: Some(tool),
    }
}

impl CommandTable {
    /// The DFT command group.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                group("0", "Density Functional Theory (DFT) Simulations"),
                tool("00", "Generate VASP POSCAR from chemical formula", "generate_vasp_poscar"),
                tool("01", "Generate simple bulk POSCAR from an element", "generate_simple_poscar"),
                tool(
                    "02",
                    "Prepare VASP input files (INCAR, KPOINTS, POTCAR, POSCAR)",
                    "generate_vasp_inputs_from_poscar",
                ),
                tool(
                    "03",
                    "Customize VASP KPOINTS with accuracy level",
                    "customize_vasp_kpoints_with_accuracy",
                ),
                tool("04", "Convert structure file format", "convert_structure_format"),
                tool(
                    "05",
                    "Convert POSCAR between direct and Cartesian coordinates",
                    "convert_poscar_coordinates",
                ),
            ],
        }
    }

    /// Exact match on the code.
    pub fn lookup(&self, code: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    /// Every entry in menu order.
    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    /// Commands under a group heading, e.g. `0` → `00`..`05`.
    pub fn group_members(&self, code: &str) -> Vec<&CommandEntry> {
        self.entries
            .iter()
            .filter(|e| e.tool.is_some() && e.code.len() > code.len() && e.code.starts_with(code))
            .collect()
    }

    /// Two-column listing of every code.
    pub fn render(&self) -> String {
        render_rows(self.entries.iter())
    }
}

pub(crate) fn render_rows<'a>(entries: impl Iterator<Item = &'a CommandEntry>) -> String {
    let mut out = String::from("  Code  Description\n");
    for entry in entries {
        let indent = if entry.tool.is_some() { "  " } else { "" };
        out.push_str(&format!("  {:<4}  {indent}{}\n", entry.code, entry.description));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_exact() {
        let table = CommandTable::standard();
        assert_eq!(table.lookup("00").and_then(|e| e.tool), Some("generate_vasp_poscar"));
        assert!(table.lookup("0").is_some_and(|e| e.tool.is_none()));
        assert!(table.lookup("000").is_none());
        assert!(table.lookup(" 00").is_none());
    }

    #[test]
    fn test_group_members() {
        let table = CommandTable::standard();
        let codes: Vec<_> = table.group_members("0").iter().map(|e| e.code).collect();
        assert_eq!(codes, ["00", "01", "02", "03", "04", "05"]);
    }

    #[test]
    fn test_every_tool_is_distinct() {
        let table = CommandTable::standard();
        let mut tools: Vec<_> = table.entries().iter().filter_map(|e| e.tool).collect();
        tools.sort_unstable();
        tools.dedup();
        assert_eq!(tools.len(), 6);
    }

    #[test]
    fn test_render_lists_codes() {
        let text = CommandTable::standard().render();
        assert!(text.contains("03"));
        assert!(text.contains("Convert structure file format"));
    }
}
