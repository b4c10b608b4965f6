//! Profiles, ordered profile sets, and profile expressions.
//!
//! A profile is a named configuration variant. Documents can scope
//! themselves to profiles using plain names or small boolean expressions:
//!
//! - `prod` - active when `prod` is active
//! - `!prod` - active when `prod` is not
//! - `prod & eu` / `prod | staging` - conjunction and disjunction
//! - `(prod & eu) | staging` - parentheses group; `&` and `|` may not be
//!   mixed without them

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{AutowireError, Result};

/// A named profile.
///
/// Identity is by name only: a default profile and an explicitly activated
/// profile with the same name are equal.
#[derive(Debug, Clone, Eq)]
pub struct Profile {
    name: String,
    default: bool,
}

impl Profile {
    /// Create an explicitly requested profile.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: false,
        }
    }

    /// Create a profile that is only active because nothing else is.
    pub fn default_profile(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: true,
        }
    }

    /// Profile name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this profile came from the environment's default profiles.
    pub fn is_default(&self) -> bool {
        self.default
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Insertion-ordered set of profiles.
///
/// # Example
///
/// ```
/// use autowire::config::{Profile, ProfileSet};
///
/// let mut set = ProfileSet::new();
/// assert!(set.insert(Profile::new("dev")));
/// assert!(!set.insert(Profile::new("dev")));
/// set.insert(Profile::new("local"));
///
/// assert_eq!(set.names(), vec!["dev", "local"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSet {
    profiles: Vec<Profile>,
}

impl ProfileSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set of explicitly requested profiles from names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for name in names {
            set.insert(Profile::new(name));
        }
        set
    }

    /// Insert a profile, returning `false` if one with that name is present.
    pub fn insert(&mut self, profile: Profile) -> bool {
        if self.contains(profile.name()) {
            return false;
        }
        self.profiles.push(profile);
        true
    }

    /// Check whether a profile with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.iter().any(|p| p.name() == name)
    }

    /// Profile names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(Profile::name).collect()
    }

    /// Iterate over profiles in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Profile> {
        self.profiles.iter()
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProfileSet {
    type Item = &'a Profile;
    type IntoIter = std::slice::Iter<'a, Profile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}

impl fmt::Display for ProfileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}

/// A parsed profile expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileExpression {
    /// A single profile name.
    Name(String),
    /// Negation: `!expr`.
    Not(Box<ProfileExpression>),
    /// Conjunction: `a & b & ...`.
    And(Vec<ProfileExpression>),
    /// Disjunction: `a | b | ...`.
    Or(Vec<ProfileExpression>),
}

impl ProfileExpression {
    /// Parse a single expression.
    pub fn parse(expression: &str) -> Result<Self> {
        let tokens = tokenize(expression);
        if tokens.is_empty() {
            return Err(malformed(expression, "expression is empty"));
        }
        let mut parser = Parser {
            source: expression,
            tokens,
            pos: 0,
        };
        let parsed = parser.expression()?;
        if parser.pos != parser.tokens.len() {
            return Err(malformed(expression, "unexpected trailing input"));
        }
        Ok(parsed)
    }

    /// Evaluate against a predicate answering "is this name active?".
    pub fn matches(&self, is_active: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Self::Name(name) => is_active(name),
            Self::Not(inner) => !inner.matches(is_active),
            Self::And(parts) => parts.iter().all(|p| p.matches(is_active)),
            Self::Or(parts) => parts.iter().any(|p| p.matches(is_active)),
        }
    }
}

/// A list of profile expressions; matches when any one of them does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profiles {
    expressions: Vec<ProfileExpression>,
}

impl Profiles {
    /// Parse each entry as a profile expression.
    pub fn of<S: AsRef<str>>(expressions: &[S]) -> Result<Self> {
        let expressions = expressions
            .iter()
            .map(|e| ProfileExpression::parse(e.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { expressions })
    }

    /// Check whether any expression matches.
    pub fn matches(&self, is_active: &dyn Fn(&str) -> bool) -> bool {
        self.expressions.iter().any(|e| e.matches(is_active))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut name = String::new();

    let flush = |name: &mut String, tokens: &mut Vec<Token>| {
        if !name.is_empty() {
            tokens.push(Token::Name(std::mem::take(name)));
        }
    };

    for c in input.chars() {
        let token = match c {
            '!' => Some(Token::Not),
            '&' => Some(Token::And),
            '|' => Some(Token::Or),
            '(' => Some(Token::Open),
            ')' => Some(Token::Close),
            c if c.is_whitespace() => None,
            c => {
                name.push(c);
                continue;
            }
        };
        flush(&mut name, &mut tokens);
        if let Some(token) = token {
            tokens.push(token);
        }
    }
    flush(&mut name, &mut tokens);

    tokens
}

fn malformed(expression: &str, message: &str) -> AutowireError {
    AutowireError::InvalidProfileExpression {
        expression: expression.to_string(),
        message: message.to_string(),
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    // expression := unary (('&' | '|') unary)*, operators not mixed
    fn expression(&mut self) -> Result<ProfileExpression> {
        let first = self.unary()?;
        let mut operator: Option<Token> = None;
        let mut operands = vec![first];

        while let Some(token) = self.peek() {
            match token {
                Token::And | Token::Or => {
                    let token = token.clone();
                    if operator.as_ref().is_some_and(|op| *op != token) {
                        return Err(malformed(
                            self.source,
                            "'&' and '|' must not be mixed without parentheses",
                        ));
                    }
                    operator = Some(token);
                    self.pos += 1;
                    operands.push(self.unary()?);
                }
                _ => break,
            }
        }

        Ok(match operator {
            None => operands.remove(0),
            Some(Token::And) => ProfileExpression::And(operands),
            Some(_) => ProfileExpression::Or(operands),
        })
    }

    fn unary(&mut self) -> Result<ProfileExpression> {
        match self.next() {
            Some(Token::Not) => Ok(ProfileExpression::Not(Box::new(self.unary()?))),
            Some(Token::Open) => {
                let inner = self.expression()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(malformed(self.source, "missing closing parenthesis")),
                }
            }
            Some(Token::Name(name)) => Ok(ProfileExpression::Name(name)),
            Some(_) => Err(malformed(self.source, "expected a profile name")),
            None => Err(malformed(self.source, "unexpected end of expression")),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active<'a>(names: &'a [&'a str]) -> impl Fn(&str) -> bool + 'a {
        move |name| names.contains(&name)
    }

    #[test]
    fn profiles_compare_by_name() {
        assert_eq!(Profile::new("dev"), Profile::default_profile("dev"));
        assert_ne!(Profile::new("dev"), Profile::new("prod"));
    }

    #[test]
    fn profile_set_rejects_duplicates() {
        let mut set = ProfileSet::from_names(["a", "b"]);
        assert!(!set.insert(Profile::default_profile("a")));
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "[a, b]");
    }

    #[test]
    fn plain_name_matches_when_active() {
        let expr = ProfileExpression::parse("dev").unwrap();
        assert!(expr.matches(&active(&["dev"])));
        assert!(!expr.matches(&active(&["prod"])));
    }

    #[test]
    fn negation() {
        let expr = ProfileExpression::parse("!dev").unwrap();
        assert!(!expr.matches(&active(&["dev"])));
        assert!(expr.matches(&active(&[])));
    }

    #[test]
    fn conjunction_and_disjunction() {
        let and = ProfileExpression::parse("prod & eu").unwrap();
        assert!(and.matches(&active(&["prod", "eu"])));
        assert!(!and.matches(&active(&["prod"])));

        let or = ProfileExpression::parse("prod | staging").unwrap();
        assert!(or.matches(&active(&["staging"])));
        assert!(!or.matches(&active(&["dev"])));
    }

    #[test]
    fn parentheses_group() {
        let expr = ProfileExpression::parse("(prod & eu) | !(staging)").unwrap();
        assert!(expr.matches(&active(&["prod", "eu", "staging"])));
        assert!(expr.matches(&active(&[])));
        assert!(!expr.matches(&active(&["staging"])));
    }

    #[test]
    fn mixing_operators_is_rejected() {
        let err = ProfileExpression::parse("a & b | c").unwrap_err();
        assert!(matches!(
            err,
            AutowireError::InvalidProfileExpression { .. }
        ));
    }

    #[test]
    fn unbalanced_parentheses_are_rejected() {
        assert!(ProfileExpression::parse("(a & b").is_err());
        assert!(ProfileExpression::parse("a)").is_err());
        assert!(ProfileExpression::parse("").is_err());
        assert!(ProfileExpression::parse("a &").is_err());
    }

    #[test]
    fn profiles_match_any_expression() {
        let profiles = Profiles::of(&["prod", "!dev & local"]).unwrap();
        assert!(profiles.matches(&active(&["prod"])));
        assert!(profiles.matches(&active(&["local"])));
        assert!(!profiles.matches(&active(&["dev", "local"])));
    }
}
