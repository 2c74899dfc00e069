//! Content matchers.
//!
//! A [`Matcher`] gates a single listener on the textual content of the
//! event. Each listener carries an ordered list of matchers; before the
//! listener runs, every matcher is applied in order:
//!
//! - on a miss, the matcher returns [`ListenerSkipped`] and only this
//!   listener is skipped, sibling listeners still see the event;
//! - on a hit, the matcher injects its result into the listener's
//!   [`DispatchContext`], both by type ([`MatchResult`]) and by name
//!   (`"text"`), from one single computation.
//!
//! | Matcher | Hits when | Residual text |
//! |---------|-----------|---------------|
//! | [`Prefix`](Matcher::Prefix) | text starts with any prefix, first in list order wins | after the prefix, leading whitespace trimmed |
//! | [`Suffix`](Matcher::Suffix) | text ends with any suffix | before the suffix, trailing whitespace trimmed |
//! | [`Keyword`](Matcher::Keyword) | keyword occurs anywhere | the text, unchanged |
//! | [`Command`](Matcher::Command) | trimmed text is `/cmd` or starts with `/cmd ` | the arguments, trimmed |
//! | [`SubCommand`](Matcher::SubCommand) | trimmed text starts with the command | see [`SubCommandMatch::parse`] |
//!
//! Events without content are matched against the empty string.

use crate::context::DispatchContext;
use crate::error::ListenerSkipped;
use crate::extractor::Text;

/// Name under which a [`CommandResult`] is also bound.
pub const RESULT_NAME: &str = "result";

/// The residual text left by a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub text: String,
}

// ============================================================================
// Matcher
// ============================================================================

/// A predicate and transform over an event's textual content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Prefix(Vec<String>),
    Suffix(Vec<String>),
    Keyword(String),
    /// Stored without the leading `/`.
    Command(String),
    SubCommand(SubCommandMatch),
}

impl Matcher {
    pub fn prefix<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Prefix(prefixes.into_iter().map(Into::into).collect())
    }

    pub fn suffix<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Suffix(suffixes.into_iter().map(Into::into).collect())
    }

    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self::Keyword(keyword.into())
    }

    /// A `/command` matcher. A leading `/` in `command` is optional.
    pub fn command(command: impl Into<String>) -> Self {
        let command = command.into();
        Self::Command(command.trim_start_matches('/').to_string())
    }

    pub fn sub_command(matcher: SubCommandMatch) -> Self {
        Self::SubCommand(matcher)
    }

    /// Checks `text`, returning the residual on a hit.
    pub fn check(&self, text: &str) -> Option<MatchResult> {
        let residual = match self {
            Self::Prefix(prefixes) => prefixes
                .iter()
                .find_map(|p| text.strip_prefix(p.as_str()))
                .map(str::trim_start)?,
            Self::Suffix(suffixes) => suffixes
                .iter()
                .find_map(|s| text.strip_suffix(s.as_str()))
                .map(str::trim_end)?,
            Self::Keyword(keyword) => text.contains(keyword.as_str()).then_some(text)?,
            Self::Command(command) => {
                let rest = text.trim().strip_prefix('/')?.strip_prefix(command.as_str())?;
                if rest.is_empty() {
                    rest
                } else {
                    rest.strip_prefix(' ')?.trim()
                }
            }
            Self::SubCommand(saw) => {
                return saw.parse(text).map(|result| MatchResult { text: result.text });
            }
        };
        Some(MatchResult {
            text: residual.to_string(),
        })
    }

    /// Applies this matcher to the listener's context.
    ///
    /// On a hit, binds [`MatchResult`] by type and its text as `"text"`.
    /// Sub-command matchers additionally bind their [`CommandResult`] by type
    /// and as `"result"`.
    pub fn apply(&self, ctx: &DispatchContext) -> Result<(), ListenerSkipped> {
        let text = ctx.text();
        let result = match self {
            Self::SubCommand(saw) => {
                let parsed = saw.parse(text).ok_or(ListenerSkipped)?;
                let result = MatchResult {
                    text: parsed.text.clone(),
                };
                ctx.insert_named(RESULT_NAME, parsed.clone());
                ctx.insert(parsed);
                result
            }
            _ => self.check(text).ok_or(ListenerSkipped)?,
        };
        ctx.insert_named(Text::NAME, result.text.clone());
        ctx.insert(result);
        Ok(())
    }
}

// ============================================================================
// Sub-commands
// ============================================================================

/// A sub-command declared on a [`SubCommandMatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCommand {
    pub name: String,
    /// Carried for callers to validate; the parser does not enforce it.
    pub required: bool,
}

/// A command followed by optional named sub-commands.
///
/// ```rust,ignore
/// let saw = SubCommandMatch::new("/task").sub("list", true).sub("add", false);
/// let parsed = saw.parse("/task list foo").unwrap();
/// assert_eq!(parsed.sub_command.as_deref(), Some("list"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCommandMatch {
    pub command: String,
    pub subcommands: Vec<SubCommand>,
}

/// The parsed form of a sub-command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub command: String,
    pub sub_command: Option<String>,
    pub args: Vec<String>,
    pub text: String,
}

impl SubCommandMatch {
    /// The command is matched literally, including any leading `/`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            subcommands: Vec::new(),
        }
    }

    /// Declares a sub-command. Declaration order is match order.
    pub fn sub(mut self, name: impl Into<String>, required: bool) -> Self {
        self.subcommands.push(SubCommand {
            name: name.into(),
            required,
        });
        self
    }

    /// Parses `content`.
    ///
    /// The trimmed content must start with the command; it need not be
    /// followed by a space. The first sub-command the remainder starts with
    /// is selected. When none does, the whole remainder becomes the
    /// arguments and no sub-command is selected.
    pub fn parse(&self, content: &str) -> Option<CommandResult> {
        let remaining = content.trim().strip_prefix(self.command.as_str())?.trim();

        let (sub_command, text) = self
            .subcommands
            .iter()
            .find_map(|sub| {
                remaining
                    .strip_prefix(sub.name.as_str())
                    .map(|rest| (Some(sub.name.clone()), rest.trim()))
            })
            .unwrap_or((None, remaining));

        Some(CommandResult {
            command: self.command.clone(),
            sub_command,
            args: text.split_whitespace().map(str::to_string).collect(),
            text: text.to_string(),
        })
    }
}

impl From<SubCommandMatch> for Matcher {
    fn from(matcher: SubCommandMatch) -> Self {
        Self::SubCommand(matcher)
    }
}
