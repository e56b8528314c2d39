//! Directive parser.
//!
//! Directive recognition is a whitelist, not a grammar: the lines of the test
//! block are matched against the [`DIRECTIVES`] table in order and every
//! unrecognized line is ignored. New directive kinds are added by extending
//! the table and [`ParseState::apply`] without touching existing handlers.

use std::path::Path;

use tracing::debug;

use crate::filters::FilterSet;
use crate::instructions::{
    Classification, CleanStep, CompileStep, Instructions, RunInvocation, Step,
};

/// Token that marks a block comment as a test description.
pub const TEST_MARKER: &str = "@test";

/// Extension of fixture source files.
pub const SOURCE_EXTENSION: &str = "java";

/// Modifier that flips the expected result of a directive.
const FAIL_MODIFIER: &str = "fail";

/// Prefix of compiler and runtime option tokens.
const OPTION_PREFIX: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectiveKind {
    Run,
    Compile,
    Clean,
    Library,
}

/// Recognized directive keywords, matched in order.
const DIRECTIVES: &[(&str, DirectiveKind)] = &[
    ("@run", DirectiveKind::Run),
    ("@compile", DirectiveKind::Compile),
    ("@clean", DirectiveKind::Clean),
    ("@library", DirectiveKind::Library),
];

/// Compiler options that consume the following token as their value.
const VALUE_OPTIONS: &[&str] = &[
    "-d",
    "-s",
    "-h",
    "-cp",
    "-classpath",
    "-sourcepath",
    "-bootclasspath",
    "-extdirs",
    "-endorseddirs",
    "-processorpath",
    "-processor",
    "-encoding",
    "-source",
    "-target",
    "-Xmaxerrs",
    "-Xmaxwarns",
];

// ============================================================================
// PARSER
// ============================================================================

/// Extracts [`Instructions`] from fixture text.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveParser<'f> {
    filters: &'f FilterSet,
}

impl<'f> DirectiveParser<'f> {
    /// Create a parser that applies the given blacklist.
    pub fn new(filters: &'f FilterSet) -> Self {
        Self { filters }
    }

    /// Parse a fixture file.
    ///
    /// The file stem is used as the entry point of a bare `@run main`.
    /// Unreadable files are not applicable.
    pub fn parse_file(&self, path: &Path) -> Option<Instructions> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(fixture = %path.display(), error = %err, "cannot read fixture");
                return None;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        let primary_type = path.file_stem().and_then(|stem| stem.to_str());

        let instructions = self.parse_source(&content, primary_type);
        if instructions.is_none() {
            debug!(fixture = %path.display(), "not applicable");
        }
        instructions
    }

    /// Parse fixture text.
    ///
    /// # Arguments
    /// * `content` - Raw fixture text
    /// * `primary_type` - Type name used when `@run main` names no entry point
    ///
    /// # Returns
    /// * `Option<Instructions>` - `None` when the fixture is not applicable
    pub fn parse_source(&self, content: &str, primary_type: Option<&str>) -> Option<Instructions> {
        if self.filters.is_blacklisted(content) {
            return None;
        }

        let block = find_test_block(content)?;
        let mut state = ParseState::default();
        for line in block.lines() {
            if let Some((kind, rest)) = match_directive(normalize_line(line)) {
                state.apply(kind, rest, primary_type);
            }
        }
        state.finish()
    }
}

/// Find the first `/* ... */` span containing [`TEST_MARKER`] as a
/// whitespace-delimited token.
fn find_test_block(content: &str) -> Option<&str> {
    let mut offset = 0;
    while let Some(found) = content[offset..].find("/*") {
        let start = offset + found;
        let end = start + 2 + content[start + 2..].find("*/")? + 2;
        let block = &content[start..end];
        if block.split_whitespace().any(|token| token == TEST_MARKER) {
            return Some(block);
        }
        offset = end;
    }
    None
}

/// Strip comment delimiters and the `*` continuation prefix.
fn normalize_line(line: &str) -> &str {
    let line = line.trim();
    let line = line.strip_suffix("*/").unwrap_or(line);
    let line = line.strip_prefix("/*").unwrap_or(line);
    line.trim_start_matches('*').trim()
}

/// Match a line against the directive table.
///
/// A keyword only matches when followed by a modifier, whitespace, or the end
/// of the line.
fn match_directive(line: &str) -> Option<(DirectiveKind, &str)> {
    DIRECTIVES.iter().find_map(|&(keyword, kind)| {
        let rest = line.strip_prefix(keyword)?;
        match rest.chars().next() {
            None => Some((kind, rest)),
            Some(c) if c == '/' || c.is_whitespace() => Some((kind, rest)),
            Some(_) => None,
        }
    })
}

/// Split `/mod1/mod2 tail` into its modifiers and the remaining text.
fn split_modifiers(rest: &str) -> (Vec<&str>, &str) {
    match rest.strip_prefix('/') {
        Some(tail) => {
            let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
            let modifiers = tail[..end].split('/').filter(|m| !m.is_empty()).collect();
            (modifiers, &tail[end..])
        }
        None => (Vec::new(), rest),
    }
}

fn is_source_file(token: &str) -> bool {
    Path::new(token)
        .extension()
        .is_some_and(|ext| ext == SOURCE_EXTENSION)
}

// ============================================================================
// PARSE STATE
// ============================================================================

#[derive(Debug, Default)]
struct ParseState {
    steps: Vec<Step>,
    runs: Vec<RunInvocation>,
    library_paths: Vec<String>,
    saw_compile: bool,
    negative: bool,
}

impl ParseState {
    fn apply(&mut self, kind: DirectiveKind, rest: &str, primary_type: Option<&str>) {
        match kind {
            DirectiveKind::Run => self.run(rest, primary_type),
            DirectiveKind::Compile => {
                let (modifiers, tail) = split_modifiers(rest);
                let tokens: Vec<&str> = tail.split_whitespace().collect();
                self.compile(&modifiers, &tokens);
            }
            DirectiveKind::Clean => {
                let (_, tail) = split_modifiers(rest);
                let tokens: Vec<&str> = tail.split_whitespace().collect();
                self.clean(&tokens);
            }
            DirectiveKind::Library => {
                let (_, tail) = split_modifiers(rest);
                self.library_paths
                    .extend(tail.split_whitespace().map(str::to_string));
            }
        }
    }

    /// `@run <mode>[/modifiers] ...`
    ///
    /// `main` is executed; `compile` and `clean` behave like their standalone
    /// directives; any other mode is ignored.
    fn run(&mut self, rest: &str, primary_type: Option<&str>) {
        let mut tokens = rest.split_whitespace();
        let Some(mode_token) = tokens.next() else {
            return;
        };
        let mut parts = mode_token.split('/');
        let mode = parts.next().unwrap_or_default();
        let modifiers: Vec<&str> = parts.filter(|m| !m.is_empty()).collect();
        let tokens: Vec<&str> = tokens.collect();

        match mode {
            "main" => self.run_main(&modifiers, &tokens, primary_type),
            "compile" => self.compile(&modifiers, &tokens),
            "clean" => self.clean(&tokens),
            other => debug!(mode = other, "ignoring unsupported run mode"),
        }
    }

    fn run_main(&mut self, modifiers: &[&str], tokens: &[&str], primary_type: Option<&str>) {
        // Runtime flags are not forwarded to the runtime under test.
        let mut tokens = tokens
            .iter()
            .skip_while(|token| token.starts_with(OPTION_PREFIX));
        let entry_point = match (tokens.next(), primary_type) {
            (Some(entry), _) => entry.to_string(),
            (None, Some(primary)) => primary.to_string(),
            (None, None) => return,
        };

        self.runs.push(RunInvocation {
            entry_point,
            args: tokens.map(|token| token.to_string()).collect(),
            expect_failure: modifiers.contains(&FAIL_MODIFIER),
        });
    }

    fn compile(&mut self, modifiers: &[&str], tokens: &[&str]) {
        self.saw_compile = true;
        if modifiers.contains(&FAIL_MODIFIER) {
            self.negative = true;
            return;
        }
        // `/ref=<file>` names golden output; only exit codes are checked.

        let mut files = Vec::new();
        let mut tokens = tokens.iter();
        while let Some(token) = tokens.next() {
            if token.starts_with(OPTION_PREFIX) {
                if VALUE_OPTIONS.contains(token) {
                    tokens.next();
                }
                continue;
            }
            if is_source_file(token) {
                files.push(token.to_string());
            } else {
                debug!(token = *token, "ignoring non-source compile operand");
            }
        }
        self.steps.push(Step::Compile(CompileStep { files }));
    }

    fn clean(&mut self, tokens: &[&str]) {
        self.steps.push(Step::Clean(CleanStep {
            types: tokens.iter().map(|token| token.to_string()).collect(),
        }));
    }

    fn finish(self) -> Option<Instructions> {
        if self.negative || (!self.saw_compile && self.runs.is_empty()) {
            return None;
        }
        let classification = if self.runs.is_empty() {
            Classification::Compile
        } else {
            Classification::Run
        };
        Some(Instructions {
            steps: self.steps,
            runs: self.runs,
            library_paths: self.library_paths,
            classification,
        })
    }
}
