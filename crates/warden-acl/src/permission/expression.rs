//! Permission expressions: `post.view`, `post.view|post.edit`, `create&delete`

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AclError, Result};

const OR_DELIMITER: char = '|';
const AND_DELIMITERS: [char; 2] = ['&', ','];

/// Boolean operator joining the atoms of a compound expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
    Or,
}

impl FromStr for Operator {
    type Err = AclError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "and" => Ok(Operator::And),
            "or" => Ok(Operator::Or),
            _ => Err(AclError::InvalidOperator(s.to_string())),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::And => write!(f, "and"),
            Operator::Or => write!(f, "or"),
        }
    }
}

/// How the atoms of a parsed expression are reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// One atom, checked directly
    Single,
    And,
    Or,
}

impl From<Operator> for Combinator {
    fn from(op: Operator) -> Self {
        match op {
            Operator::And => Combinator::And,
            Operator::Or => Combinator::Or,
        }
    }
}

/// Raw query as supplied by a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionQuery {
    /// Possibly delimited string
    Text(String),
    /// Pre-split permission names
    List(Vec<String>),
}

impl From<&str> for PermissionQuery {
    fn from(s: &str) -> Self {
        PermissionQuery::Text(s.to_string())
    }
}

impl From<String> for PermissionQuery {
    fn from(s: String) -> Self {
        PermissionQuery::Text(s)
    }
}

impl From<&String> for PermissionQuery {
    fn from(s: &String) -> Self {
        PermissionQuery::Text(s.clone())
    }
}

impl From<Vec<String>> for PermissionQuery {
    fn from(list: Vec<String>) -> Self {
        PermissionQuery::List(list)
    }
}

impl From<Vec<&str>> for PermissionQuery {
    fn from(list: Vec<&str>) -> Self {
        PermissionQuery::List(list.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for PermissionQuery {
    fn from(list: &[&str]) -> Self {
        PermissionQuery::List(list.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PermissionQuery {
    fn from(list: [&str; N]) -> Self {
        PermissionQuery::List(list.iter().map(|s| s.to_string()).collect())
    }
}

/// A parsed permission expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    atoms: Vec<String>,
    combinator: Combinator,
}

impl Expression {
    /// Parse a query, optionally forcing the operator.
    ///
    /// `|` infers OR, `&` or `,` infers AND, and the first delimiter found
    /// decides. A list with several entries defaults to AND. An explicit
    /// operator overrides the inferred one and must be `and` or `or` when the
    /// expression has more than one atom; for a single atom it is ignored.
    pub fn parse(
        query: impl Into<PermissionQuery>,
        explicit_operator: Option<&str>,
    ) -> Result<Self> {
        let (atoms, inferred) = match query.into() {
            PermissionQuery::Text(text) => split_text(&text),
            PermissionQuery::List(list) => (clean_atoms(list), Operator::And),
        };

        if atoms.len() <= 1 {
            return Ok(Self {
                atoms,
                combinator: Combinator::Single,
            });
        }

        let operator = match explicit_operator {
            Some(op) => op.parse::<Operator>()?,
            None => inferred,
        };

        Ok(Self {
            atoms,
            combinator: operator.into(),
        })
    }

    /// Atoms in the order they were written
    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn is_compound(&self) -> bool {
        self.combinator != Combinator::Single
    }
}

fn clean_atoms<I, S>(atoms: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    atoms
        .into_iter()
        .map(|atom| atom.as_ref().trim().to_string())
        .filter(|atom| !atom.is_empty())
        .collect()
}

fn split_text(text: &str) -> (Vec<String>, Operator) {
    let inferred = text
        .chars()
        .find(|c| *c == OR_DELIMITER || AND_DELIMITERS.contains(c))
        .map(|c| if c == OR_DELIMITER { Operator::Or } else { Operator::And })
        .unwrap_or(Operator::And);

    let atoms = clean_atoms(
        text.split(|c: char| c == OR_DELIMITER || AND_DELIMITERS.contains(&c)),
    );
    (atoms, inferred)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_atom() {
        let expr = Expression::parse("post.view", None).unwrap();
        assert_eq!(expr.atoms(), ["post.view"]);
        assert_eq!(expr.combinator(), Combinator::Single);
        assert!(!expr.is_compound());
    }

    #[test]
    fn test_pipe_infers_or() {
        let expr = Expression::parse("post.view|post.delete", None).unwrap();
        assert_eq!(expr.atoms(), ["post.view", "post.delete"]);
        assert_eq!(expr.combinator(), Combinator::Or);
    }

    #[test]
    fn test_ampersand_and_comma_infer_and() {
        let expr = Expression::parse("post.view&post.delete", None).unwrap();
        assert_eq!(expr.combinator(), Combinator::And);

        let expr = Expression::parse("post.view, post.delete", None).unwrap();
        assert_eq!(expr.atoms(), ["post.view", "post.delete"]);
        assert_eq!(expr.combinator(), Combinator::And);
    }

    #[test]
    fn test_first_delimiter_decides() {
        let expr = Expression::parse("a|b&c", None).unwrap();
        assert_eq!(expr.atoms(), ["a", "b", "c"]);
        assert_eq!(expr.combinator(), Combinator::Or);
    }

    #[test]
    fn test_explicit_operator_overrides() {
        let expr = Expression::parse("a|b", Some("and")).unwrap();
        assert_eq!(expr.combinator(), Combinator::And);

        let expr = Expression::parse("a&b", Some("or")).unwrap();
        assert_eq!(expr.combinator(), Combinator::Or);
    }

    #[test]
    fn test_operator_is_case_sensitive() {
        let err = Expression::parse("a&b", Some("OR")).unwrap_err();
        assert!(matches!(err, AclError::InvalidOperator(ref op) if op == "OR"));
        assert!(Expression::parse(["a", "b"], Some("And")).is_err());

        // A single atom never looks at the operator
        assert!(Expression::parse("a", Some("OR")).is_ok());
    }

    #[test]
    fn test_list_is_verbatim_and_defaults_to_and() {
        let expr = Expression::parse(["publish", "edit"], None).unwrap();
        assert_eq!(expr.atoms(), ["publish", "edit"]);
        assert_eq!(expr.combinator(), Combinator::And);

        let expr = Expression::parse(vec!["edit"], Some("or")).unwrap();
        assert_eq!(expr.combinator(), Combinator::Single);
    }

    #[test]
    fn test_invalid_operator_on_compound() {
        let err = Expression::parse(["edit", "publish"], Some("xor")).unwrap_err();
        assert!(matches!(err, AclError::InvalidOperator(op) if op == "xor"));
    }

    #[test]
    fn test_operator_ignored_for_single_atom() {
        let expr = Expression::parse("create.view", Some("xor")).unwrap();
        assert_eq!(expr.combinator(), Combinator::Single);
    }

    #[test]
    fn test_empty_atoms_are_dropped() {
        let expr = Expression::parse("a||b|", None).unwrap();
        assert_eq!(expr.atoms(), ["a", "b"]);

        let expr = Expression::parse("", None).unwrap();
        assert!(expr.atoms().is_empty());
    }

    #[test]
    fn test_operator_round_trip_display() {
        assert_eq!("and".parse::<Operator>().unwrap().to_string(), "and");
        assert_eq!("or".parse::<Operator>().unwrap(), Operator::Or);
        assert!("xor".parse::<Operator>().is_err());
        assert!(" Or ".parse::<Operator>().is_err());
        assert!(" or".parse::<Operator>().is_err());
        assert!("AND".parse::<Operator>().is_err());
    }
}
