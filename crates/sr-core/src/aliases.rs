//! Command alias table
//!
//! Maps the short user-facing command names typed into the console to the
//! real shell commands. Names that are not in the table pass through
//! unchanged.

/// Built-in aliases, in display order
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("buscar", "grep"),
    ("encontrar", "find"),
    ("localizar", "locate"),
    ("editor", "nano"),
    ("final", "tail"),
    ("inicio", "head"),
    ("descargar", "wget"),
    ("crar", "touch"),
    ("crdir", "mkdir"),
    ("listar", "ls"),
    ("cd", "cd"),
    ("diract", "pwd"),
];

/// Ordered alias → command lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
}

impl AliasTable {
    /// Build a table from alias/command pairs; later duplicates are ignored
    pub fn new<I, A, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: Into<String>,
    {
        let mut table = Self { entries: vec![] };
        for (alias, command) in entries {
            let alias = alias.into();
            if !table.is_reserved(&alias) {
                table.entries.push((alias, command.into()));
            }
        }
        table
    }

    /// Real command for `name`, or `name` itself when it is not an alias
    pub fn translate<'a>(&'a self, name: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(alias, _)| alias == name)
            .map(|(_, command)| command.as_str())
            .unwrap_or(name)
    }

    /// Whether `name` is one of the aliases
    pub fn is_reserved(&self, name: &str) -> bool {
        self.entries.iter().any(|(alias, _)| alias == name)
    }

    /// Iterate over alias/command pairs in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(alias, command)| (alias.as_str(), command.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::new(DEFAULT_ALIASES.iter().copied())
    }
}
