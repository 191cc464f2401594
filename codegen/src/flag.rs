//! Normalized flag spellings.
//!
//! Declared flags are loose: `--dry-run`, `dry-run` and `---dry-run` all
//! register the same long name, and an empty primary flag falls back to
//! the member name. Emission and duplicate detection both go through
//! [`FlagSpelling`], so two flags collide exactly when they would register
//! the same name on the generated command.

use std::fmt;

use optforge_core::OptionDescriptor;

/// A flag as the generated parser registers it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlagSpelling {
    Long(String),
    Short(char),
}

impl FlagSpelling {
    /// `--name` is long, `-x` is short; anything else is treated as a long
    /// name with its leading dashes removed. Returns `None` when nothing is
    /// left after the dashes.
    ///
    /// # Examples
    ///
    /// ```
    /// use optforge_codegen::flag::FlagSpelling;
    ///
    /// assert_eq!(FlagSpelling::parse("-o"), Some(FlagSpelling::Short('o')));
    /// assert_eq!(FlagSpelling::parse("dry-run"), FlagSpelling::parse("--dry-run"));
    /// assert_eq!(FlagSpelling::parse("--"), None);
    /// ```
    pub fn parse(flag: &str) -> Option<Self> {
        let name = flag.trim_start_matches('-');
        if name.is_empty() {
            return None;
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if flag.len() - name.len() == 1 => Some(Self::Short(c)),
            _ => Some(Self::Long(name.to_string())),
        }
    }
}

impl fmt::Display for FlagSpelling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long(name) => write!(f, "--{name}"),
            Self::Short(c) => write!(f, "-{c}"),
        }
    }
}

/// Spelling of the primary flag, falling back to `--member-name`.
pub fn primary_spelling(option: &OptionDescriptor) -> FlagSpelling {
    FlagSpelling::parse(&option.primary_flag)
        .unwrap_or_else(|| FlagSpelling::Long(option.member.replace('_', "-")))
}

/// Spellings of the aliases that register anything, in declared order.
pub fn alias_spellings(option: &OptionDescriptor) -> impl Iterator<Item = FlagSpelling> + '_ {
    option.aliases.iter().filter_map(|alias| FlagSpelling::parse(alias))
}

/// Every name `option` registers: primary first, then aliases.
pub fn registered_spellings(option: &OptionDescriptor) -> impl Iterator<Item = FlagSpelling> + '_ {
    std::iter::once(primary_spelling(option)).chain(alias_spellings(option))
}
