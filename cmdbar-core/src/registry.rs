//! Command registry fetched from the backend.
//!
//! Maps command name to its declared arguments, signature help and
//! description. Insertion order is the iteration order used for candidate
//! listing. A registry is immutable once built; a refetch replaces it whole.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Metadata describing a backend command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Unique command name, e.g. "set".
    pub name: String,
    /// Declared argument names in order.
    pub argument_names: Vec<String>,
    /// Short signature text, e.g. "set option value -> None".
    pub signature_help: Option<String>,
    /// One-line description.
    pub description: Option<String>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument_names: Vec::new(),
            signature_help: None,
            description: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argument_names = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_signature_help(mut self, help: impl Into<String>) -> Self {
        self.signature_help = Some(help.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ordered, immutable mapping from command name to [`CommandSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandRegistry {
    commands: Vec<CommandSpec>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from specs. A repeated name replaces the earlier spec
    /// but keeps its original position.
    pub fn from_specs<I: IntoIterator<Item = CommandSpec>>(specs: I) -> Self {
        let mut commands: Vec<CommandSpec> = Vec::new();
        for spec in specs {
            match commands.iter_mut().find(|c| c.name == spec.name) {
                Some(existing) => *existing = spec,
                None => commands.push(spec),
            }
        }
        Self { commands }
    }

    /// Look up a command by exact name.
    pub fn spec(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|cmd| cmd.name == name)
    }

    /// Command names in registry order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|cmd| cmd.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Generate an operator-facing listing of every command.
    pub fn help_text(&self) -> String {
        let mut output = String::from("\nAvailable commands:\n");
        if self.commands.is_empty() {
            output.push_str("  (none)\n");
            return output;
        }

        for cmd in &self.commands {
            let usage = std::iter::once(cmd.name.as_str())
                .chain(cmd.argument_names.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            let description = cmd.description.as_deref().unwrap_or("");
            output.push_str(&format!("  {:<32} {}\n", usage, description));
        }
        output
    }

    /// Suggest the closest command for an unknown name using edit distance.
    pub fn suggest(&self, input: &str) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;

        for name in self.names() {
            let dist = edit_distance(input, name);
            if dist <= 3 && best.is_none_or(|(_, best_dist)| dist < best_dist) {
                best = Some((name, dist));
            }
        }

        best.map(|(name, _)| name)
    }
}

impl FromIterator<CommandSpec> for CommandRegistry {
    fn from_iter<I: IntoIterator<Item = CommandSpec>>(iter: I) -> Self {
        Self::from_specs(iter)
    }
}

/// Body of `GET /commands`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandListing {
    pub commands: CommandRegistry,
}

/// Per-command entry as it appears on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct WireSpec {
    #[serde(default)]
    args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature_help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Serialize for CommandRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.commands.len()))?;
        for cmd in &self.commands {
            let wire = WireSpec {
                args: cmd.argument_names.clone(),
                signature_help: cmd.signature_help.clone(),
                description: cmd.description.clone(),
            };
            map.serialize_entry(&cmd.name, &wire)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CommandRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RegistryVisitor)
    }
}

// Visits the JSON object entry by entry so key order survives.
struct RegistryVisitor;

impl<'de> Visitor<'de> for RegistryVisitor {
    type Value = CommandRegistry;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of command name to command spec")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut specs = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((name, wire)) = map.next_entry::<String, WireSpec>()? {
            specs.push(CommandSpec {
                name,
                argument_names: wire.args,
                signature_help: wire.signature_help,
                description: wire.description,
            });
        }
        Ok(CommandRegistry::from_specs(specs))
    }
}

/// Simple Levenshtein edit distance for command suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();

    let mut prev = (0..=b_len).collect::<Vec<_>>();
    let mut curr = vec![0; b_len + 1];

    for i in 1..=a_chars.len() {
        curr[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}
